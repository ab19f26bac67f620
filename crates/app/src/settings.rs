use config::{Config, ConfigError, Environment, File};
use meridian_core::config::AppConfig;

/// 默认配置文件名 (不含扩展名)，不存在时忽略
const CONFIG_FILE: &str = "meridian";

/// # Summary
/// 加载应用配置。
///
/// # Logic
/// 1. 以 `AppConfig::default()` 为底。
/// 2. 叠加可选的 `meridian.toml` (或 `path` 指定的文件)。
/// 3. 叠加 `MERIDIAN__` 前缀的环境变量，层级以 `__` 分隔，例如 `MERIDIAN__ANALYTICS__ATR_PERIOD=10`。
///
/// # Returns
/// 文件格式错误、字段类型不符或时区名未知时返回 `ConfigError`。
pub fn load(path: Option<&str>) -> Result<AppConfig, ConfigError> {
    let defaults = Config::try_from(&AppConfig::default())?;
    let file = match path {
        Some(p) => File::with_name(p),
        None => File::with_name(CONFIG_FILE).required(false),
    };
    Config::builder()
        .add_source(defaults)
        .add_source(file)
        .add_source(
            Environment::with_prefix("MERIDIAN")
                .prefix_separator("__")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("data.symbols")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize()
}

use meridian_core::config::LoggingConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, prelude::*};

/// # Summary
/// 初始化全局日志。
///
/// # Logic
/// 1. `RUST_LOG` 优先，否则使用配置中的级别。
/// 2. 始终输出到标准错误，标准输出留给 KPI 报告。
/// 3. 配置了 `dir` 时额外写入按天滚动的日志文件。
///
/// # Returns
/// 文件日志的写入守卫，调用方必须持有到进程结束，否则缓冲中的日志会丢失。
pub fn init(config: &LoggingConfig) -> Result<Option<WorkerGuard>, Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.level))?;
    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    match &config.dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "meridian.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let file_layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .with(file_layer)
                .try_init()?;
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .try_init()?;
            Ok(None)
        }
    }
}

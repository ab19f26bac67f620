//! 数值转换辅助。集中处理 `as` 强转，避免在算法代码中散落 lint 豁免。

/// 计数转浮点。序列长度远小于 2^52，不会损失精度。
#[allow(clippy::cast_precision_loss)]
pub(crate) fn count_f64(n: usize) -> f64 {
    n as f64
}

/// 浮点毫秒时间戳转整数，非有限或越界时返回 None。
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn millis_from_f64(ts: f64) -> Option<i64> {
    if !ts.is_finite() {
        return None;
    }
    let rounded = ts.round();
    // i64::MAX 无法精确表示为 f64，取严格小于
    if rounded < -9.2e18 || rounded > 9.2e18 {
        return None;
    }
    Some(rounded as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_millis_from_f64() {
        assert_eq!(millis_from_f64(1_700_000_000_000.4), Some(1_700_000_000_000));
        assert_eq!(millis_from_f64(f64::NAN), None);
        assert_eq!(millis_from_f64(f64::INFINITY), None);
        assert_eq!(millis_from_f64(1e30), None);
    }
}

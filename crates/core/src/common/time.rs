use chrono::{DateTime, Utc};
use std::sync::RwLock;

/// # Summary
/// 时间供给器接口，用于隔离物理系统时钟。
/// 会话 VWAP 与月初锚点依赖的“当前时刻”必须通过此接口获取，再以普通参数传入计算内核。
pub trait TimeProvider: Send + Sync {
    /// 获取当前挂载的时间
    fn now(&self) -> DateTime<Utc>;
}

/// # Summary
/// 正常运行使用的真实时钟，直接返回操作系统当前时间。
pub struct RealTimeProvider;

impl TimeProvider for RealTimeProvider {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// # Summary
/// 测试与历史重放专用的虚拟时钟，允许主动拨动时间。
///
/// # Invariants
/// - 并发安全：内部利用 `RwLock` 提供多线程安全的读写。
/// - 锁中毒时沿用中毒前的值，不向调用方传播 panic。
pub struct FakeClockProvider {
    current_time: RwLock<DateTime<Utc>>,
}

impl FakeClockProvider {
    /// 使用指定的初始时间创建虚拟时钟
    pub fn new(initial_time: DateTime<Utc>) -> Self {
        Self {
            current_time: RwLock::new(initial_time),
        }
    }

    /// 强制修改时钟的当前时间
    pub fn set_time(&self, new_time: DateTime<Utc>) {
        let mut time = self.current_time.write().unwrap_or_else(|e| e.into_inner());
        *time = new_time;
    }
}

impl TimeProvider for FakeClockProvider {
    fn now(&self) -> DateTime<Utc> {
        *self.current_time.read().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_fake_clock_set_time() {
        let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 14, 30, 0).unwrap();
        let clock = FakeClockProvider::new(t0);
        assert_eq!(clock.now(), t0);

        let t1 = Utc.with_ymd_and_hms(2024, 3, 2, 14, 30, 0).unwrap();
        clock.set_time(t1);
        assert_eq!(clock.now(), t1);
    }
}

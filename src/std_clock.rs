use embedded_timers::clock::Clock;

/// 基于std的标准时钟
///
/// 测量触发后的等待策略依赖注入的[`Clock`]实现，
/// 真机上用本时钟，测试里换成零等待的假时钟
pub struct StdClock;

impl StdClock {
    pub fn new() -> Self {
        Self
    }
}

impl Default for StdClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for StdClock {
    type Instant = std::time::Instant;

    fn now(&self) -> Self::Instant {
        std::time::Instant::now()
    }

    fn elapsed(&self, instant: Self::Instant) -> std::time::Duration {
        instant.elapsed()
    }
}

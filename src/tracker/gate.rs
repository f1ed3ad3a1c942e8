use std::time::{Duration, Instant};

use crate::config::GateConfig;

/// 最小間隔より短い間隔で届いたフレームを捨てるレートリミッタ
///
/// キューではないので、拒否したフレームは後から処理されない。
pub struct FrameGate {
    min_interval: Duration,
    last_processed: Option<Instant>,
}

impl FrameGate {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_processed: None,
        }
    }

    pub fn from_config(config: &GateConfig) -> Self {
        Self::new(config.min_interval())
    }

    /// 処理してよければ true を返して時刻を記録する
    pub fn admit(&mut self, now: Instant) -> bool {
        if let Some(last) = self.last_processed {
            if now.saturating_duration_since(last) < self.min_interval {
                return false;
            }
        }
        self.last_processed = Some(now);
        true
    }

    pub fn last_processed(&self) -> Option<Instant> {
        self.last_processed
    }
}

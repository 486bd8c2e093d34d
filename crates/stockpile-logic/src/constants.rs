//! Default timings and capacities.
//!
//! Configuration is authored in seconds; the model schedules in whole
//! milliseconds so repeated waits never drift.

/// Timings in seconds
pub mod timing {
    /// Wait between production passes
    pub const CYCLE_INTERVAL: f32 = 3.0;
    /// Wait after a pass that found no supplies
    pub const SUPPLY_POLL_INTERVAL: f32 = 0.1;
    /// How long a placed item stays in transit
    pub const SETTLE_TIME: f32 = 1.0;
    /// Wait between two transfer attempts of a session
    pub const TRANSFER_INTERVAL: f32 = 0.5;
}

pub mod capacity {
    pub const SUPPLY: usize = 5;
    pub const PRODUCTION: usize = 3;
    pub const BACKPACK: usize = 5;
}

/// Seconds → whole milliseconds (negative values clamp to 0).
pub fn secs_to_ms(secs: f32) -> u64 {
    (secs.max(0.0) * 1000.0).round() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secs_to_ms_rounds() {
        assert_eq!(secs_to_ms(0.1), 100);
        assert_eq!(secs_to_ms(timing::CYCLE_INTERVAL), 3000);
        assert_eq!(secs_to_ms(0.0004), 0);
        assert_eq!(secs_to_ms(-2.0), 0);
    }

    #[test]
    fn test_poll_is_shorter_than_cycle() {
        assert!(timing::SUPPLY_POLL_INTERVAL < timing::CYCLE_INTERVAL);
    }
}

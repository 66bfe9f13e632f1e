//! Timers that pace contract maintenance.
use core::future::Future;

use crate::config::Config;

/// The timer trait to implement by the user application.
pub trait Timer {
    /// Expire after the specified number of milliseconds.
    fn after_millis(milliseconds: u64) -> impl Future<Output = ()>;
}

/// Types of timers that are used for contract maintenance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimerType {
    /// Fires once after contract establishment, before the first request.
    MaintenanceStart,
    /// Fires between two requests.
    MaintenancePeriod,
}

impl TimerType {
    /// Create a new timer for a given type.
    ///
    /// Times out after a duration that is given by the configuration.
    pub fn new<TIMER: Timer>(timer_type: TimerType, config: &Config) -> impl Future<Output = ()> {
        match timer_type {
            TimerType::MaintenanceStart => TIMER::after_millis(config.start_delay_ms),
            TimerType::MaintenancePeriod => TIMER::after_millis(config.period_ms),
        }
    }
}

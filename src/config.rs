//! Configuration of contract maintenance.
use uom::si::electric_current::milliampere;
use uom::si::electric_potential::millivolt;

use crate::sink::SupplyType;
use crate::units::{ElectricCurrent, ElectricPotential};

/// Policy settings for keeping a contract alive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    /// The supply type to request.
    pub supply_type: SupplyType,
    /// The current that is requested with every voltage.
    pub default_current: ElectricCurrent,
    /// The voltage to start from, and to return to after reaching the ceiling.
    pub baseline_voltage: ElectricPotential,
    /// The voltage increment per tick.
    pub step: ElectricPotential,
    /// Time between two requests in milliseconds.
    ///
    /// Adjustable contracts must be re-requested within 10 s.
    pub period_ms: u64,
    /// Delay before the first request after contract establishment in milliseconds.
    pub start_delay_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            supply_type: SupplyType::Pps,
            default_current: ElectricCurrent::new::<milliampere>(900),
            baseline_voltage: ElectricPotential::new::<millivolt>(5000),
            step: ElectricPotential::new::<millivolt>(100),
            period_ms: 10_000,
            start_delay_ms: 1_000,
        }
    }
}

impl Config {
    /// Set the supply type.
    pub fn with_supply_type(mut self, supply_type: SupplyType) -> Self {
        self.supply_type = supply_type;
        self
    }

    /// Set the requested current.
    pub fn with_default_current(mut self, current: ElectricCurrent) -> Self {
        self.default_current = current;
        self
    }

    /// Set the baseline voltage.
    pub fn with_baseline_voltage(mut self, voltage: ElectricPotential) -> Self {
        self.baseline_voltage = voltage;
        self
    }

    /// Set the voltage step.
    pub fn with_step(mut self, step: ElectricPotential) -> Self {
        self.step = step;
        self
    }

    /// Set the request period.
    pub fn with_period_ms(mut self, period_ms: u64) -> Self {
        self.period_ms = period_ms;
        self
    }

    /// Set the start delay.
    pub fn with_start_delay_ms(mut self, start_delay_ms: u64) -> Self {
        self.start_delay_ms = start_delay_ms;
        self
    }
}

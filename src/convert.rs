//! Conversions between external quantities and the fixed-point units of data objects.
//!
//! All capability matching happens in a shared scale of 50 mV (voltage) and 10 mA (current).
//! Power is derived in 250 mW units. Augmented objects use coarser scales that are converted
//! into the shared scale before comparison, and request objects use their own output scales.
//!
//! | Quantity | External | Matching | Request object       |
//! |----------|----------|----------|----------------------|
//! | voltage  | mV       | 50 mV    | 20 mV (PPS), 25 mV (AVS) |
//! | current  | mA       | 10 mA    | 50 mA                |
//! | power    | -        | 250 mW   | 250 mW               |
use uom::si::electric_current::milliampere;
use uom::si::electric_potential::millivolt;

use crate::units::{ElectricCurrent, ElectricPotential};

/// Millivolts per raw matching voltage unit.
const MILLIVOLTS_PER_RAW: u32 = 50;

/// Milliamperes per raw matching current unit.
const MILLIAMPERES_PER_RAW: u32 = 10;

/// Product of raw voltage and raw current (0.5 mW) per 250 mW.
const RAW_PRODUCT_PER_POWER_UNIT: u32 = 500;

/// 9 V in 50 mV units, the lower bound of the SPR AVS range.
pub const VSAFE_9V_RAW: u16 = 180;

/// 15 V in 50 mV units, the boundary between the SPR AVS current tiers.
pub const VSAFE_15V_RAW: u16 = 300;

/// 20 V in 50 mV units, the upper bound of the SPR AVS range.
pub const VSAFE_20V_RAW: u16 = 400;

/// Convert a voltage to 50 mV units, truncating.
pub fn voltage_to_raw(voltage: ElectricPotential) -> u16 {
    u16::try_from(voltage.get::<millivolt>() / MILLIVOLTS_PER_RAW).unwrap_or(u16::MAX)
}

/// Convert a current to 10 mA units, truncating.
pub fn current_to_raw(current: ElectricCurrent) -> u16 {
    u16::try_from(current.get::<milliampere>() / MILLIAMPERES_PER_RAW).unwrap_or(u16::MAX)
}

/// Convert a voltage in 50 mV units back to a quantity.
pub fn raw_to_voltage(raw_voltage: u16) -> ElectricPotential {
    ElectricPotential::new::<millivolt>(u32::from(raw_voltage) * MILLIVOLTS_PER_RAW)
}

/// Convert a current in 10 mA units back to a quantity.
pub fn raw_to_current(raw_current: u16) -> ElectricCurrent {
    ElectricCurrent::new::<milliampere>(u32::from(raw_current) * MILLIAMPERES_PER_RAW)
}

/// Scale an augmented object voltage from 100 mV to 50 mV units.
pub const fn decivolts_to_raw(raw_decivolts: u16) -> u16 {
    raw_decivolts * 2
}

/// Scale an augmented object current from 50 mA to 10 mA units.
pub const fn fifty_milliamperes_to_raw(raw_current: u16) -> u16 {
    raw_current * 5
}

/// Scale a power delivery power from 1 W to 250 mW units.
pub const fn watts_to_raw_power(raw_watts: u16) -> u32 {
    raw_watts as u32 * 4
}

/// Power in 250 mW units for a voltage (50 mV) and current (10 mA), rounded up.
pub const fn raw_power(raw_voltage: u16, raw_current: u16) -> u32 {
    (raw_voltage as u32 * raw_current as u32).div_ceil(RAW_PRODUCT_PER_POWER_UNIT)
}

/// Convert a voltage in 50 mV units to the 20 mV units of a PPS request, truncating.
pub const fn raw_to_20_millivolts(raw_voltage: u16) -> u32 {
    (raw_voltage as u32 * 25) / 10
}

/// Convert a voltage in 50 mV units to the 25 mV units of an AVS request.
pub const fn raw_to_25_millivolts(raw_voltage: u16) -> u32 {
    raw_voltage as u32 * 2
}

/// Convert a current in 10 mA units to the 50 mA units of an augmented request, truncating.
pub const fn raw_to_50_milliamperes(raw_current: u16) -> u16 {
    raw_current / 5
}

#[cfg(test)]
mod tests {
    use uom::si::electric_current::milliampere;
    use uom::si::electric_potential::millivolt;

    use super::*;

    #[test]
    fn test_external_to_raw() {
        assert_eq!(voltage_to_raw(ElectricPotential::new::<millivolt>(5000)), 100);
        assert_eq!(voltage_to_raw(ElectricPotential::new::<millivolt>(5049)), 100);
        assert_eq!(current_to_raw(ElectricCurrent::new::<milliampere>(900)), 90);
        assert_eq!(current_to_raw(ElectricCurrent::new::<milliampere>(909)), 90);

        assert_eq!(raw_to_voltage(220).get::<millivolt>(), 11000);
        assert_eq!(raw_to_current(300).get::<milliampere>(), 3000);
    }

    #[test]
    fn test_pps_request_voltage() {
        let raw = voltage_to_raw(ElectricPotential::new::<millivolt>(5000));
        assert_eq!(raw_to_20_millivolts(raw), 250);

        // 5.05 V is not a multiple of 20 mV and truncates.
        assert_eq!(raw_to_20_millivolts(101), 252);
    }

    #[test]
    fn test_augmented_scales() {
        assert_eq!(decivolts_to_raw(110), 220);
        assert_eq!(fifty_milliamperes_to_raw(60), 300);
        assert_eq!(watts_to_raw_power(140), 560);
        assert_eq!(raw_to_25_millivolts(560), 1120);
        assert_eq!(raw_to_25_millivolts(u16::MAX), 131_070);
        assert_eq!(raw_to_20_millivolts(u16::MAX), 163_837);
        assert_eq!(raw_to_50_milliamperes(94), 18);
    }

    #[test]
    fn test_power_rounds_up() {
        // 5 V at 900 mA is exactly 4.5 W.
        assert_eq!(raw_power(100, 90), 18);
        // 5.05 V at 900 mA is 4.545 W.
        assert_eq!(raw_power(101, 90), 19);
        assert_eq!(raw_power(0, 500), 0);
    }
}

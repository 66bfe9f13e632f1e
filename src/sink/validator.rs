//! Validation of requests against the local sink capabilities.
//!
//! A request is only forwarded to the source if the sink itself can operate at the requested voltage
//! and current. Voltages are in 50 mV units, currents in 10 mA units.
use crate::convert::{
    VSAFE_9V_RAW, VSAFE_15V_RAW, VSAFE_20V_RAW, decivolts_to_raw, fifty_milliamperes_to_raw, raw_power,
    watts_to_raw_power,
};
use crate::message::sink_capabilities::{SinkAugmented, SinkCapabilities, SinkPowerDataObject};

/// Whether a raw voltage lies within a raw range (inclusive).
pub(crate) fn in_range(raw_voltage: u16, raw_min_voltage: u16, raw_max_voltage: u16) -> bool {
    raw_min_voltage <= raw_voltage && raw_voltage <= raw_max_voltage
}

/// The current limit of an SPR AVS at a given voltage.
///
/// Outside of 9 V to 20 V, there is no limit that covers the request.
pub(crate) fn spr_avs_current_limit(raw_voltage: u16, raw_current_15v: u16, raw_current_20v: u16) -> Option<u16> {
    if in_range(raw_voltage, VSAFE_9V_RAW, VSAFE_15V_RAW) {
        Some(raw_current_15v)
    } else if VSAFE_15V_RAW < raw_voltage && raw_voltage <= VSAFE_20V_RAW {
        Some(raw_current_20v)
    } else {
        None
    }
}

/// Whether a single sink PDO covers the request.
fn covers(pdo: &SinkPowerDataObject, raw_voltage: u16, raw_current: u16) -> bool {
    match pdo {
        SinkPowerDataObject::FixedSupply(fixed) => {
            raw_voltage == fixed.raw_voltage() && raw_current <= fixed.raw_operational_current()
        }
        SinkPowerDataObject::VariableSupply(variable) => {
            in_range(raw_voltage, variable.raw_min_voltage(), variable.raw_max_voltage())
                && raw_current <= variable.raw_operational_current()
        }
        SinkPowerDataObject::Battery(battery) => {
            in_range(raw_voltage, battery.raw_min_voltage(), battery.raw_max_voltage())
                && raw_power(raw_voltage, raw_current) <= u32::from(battery.raw_operational_power())
        }
        SinkPowerDataObject::Augmented(SinkAugmented::Pps(pps)) => {
            in_range(
                raw_voltage,
                decivolts_to_raw(pps.raw_min_voltage().into()),
                decivolts_to_raw(pps.raw_max_voltage().into()),
            ) && raw_current <= fifty_milliamperes_to_raw(pps.raw_operational_current().into())
        }
        SinkPowerDataObject::Augmented(SinkAugmented::EprAvs(avs)) => {
            in_range(
                raw_voltage,
                decivolts_to_raw(avs.raw_min_voltage().into()),
                decivolts_to_raw(avs.raw_max_voltage()),
            ) && raw_power(raw_voltage, raw_current) <= watts_to_raw_power(avs.raw_pd_power().into())
        }
        SinkPowerDataObject::Augmented(SinkAugmented::SprAvs(avs)) => {
            spr_avs_current_limit(
                raw_voltage,
                avs.raw_operational_current_15v(),
                avs.raw_operational_current_20v(),
            )
            .is_some_and(|limit| raw_current <= limit)
        }
        SinkPowerDataObject::Augmented(SinkAugmented::Unknown(_)) => false,
    }
}

/// Check whether a request is covered by any of the sink's capabilities.
///
/// The EPR sink capabilities are only considered while EPR mode is active. The scan stops at the first PDO
/// that covers the request.
pub fn is_request_valid(
    sink_capabilities: &SinkCapabilities,
    epr_active: bool,
    raw_voltage: u16,
    raw_current: u16,
) -> bool {
    let epr_active = cfg!(feature = "epr") && epr_active;

    let valid = sink_capabilities
        .pdos(epr_active)
        .any(|pdo| covers(pdo, raw_voltage, raw_current));

    if !valid {
        trace!("No sink PDO covers {} x 50 mV at {} x 10 mA", raw_voltage, raw_current);
    }

    valid
}

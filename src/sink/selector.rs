//! Selection of a source PDO that can supply a request.
//!
//! Voltages are in 50 mV units, currents in 10 mA units.
use super::SupplyType;
use super::validator::{in_range, spr_avs_current_limit};
use crate::convert::{decivolts_to_raw, fifty_milliamperes_to_raw, raw_power, watts_to_raw_power};
use crate::message::source_capabilities::{Augmented, PowerDataObject, SourceCapabilities};
use crate::units::ElectricPotential;

/// A source PDO that can supply the request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Selection {
    /// The 1-based object position of the PDO.
    pub position: u8,
    /// The maximum voltage of the selected programmable power supply.
    ///
    /// This is the ceiling for adjusting the voltage within the contract.
    pub adjustable_max_voltage: Option<ElectricPotential>,
    /// The minimum voltage of the selected programmable power supply.
    pub adjustable_min_voltage: Option<ElectricPotential>,
}

/// Whether a PDO has the kind and subtype of the requested supply type.
fn matches_supply_type(pdo: &PowerDataObject, supply_type: SupplyType) -> bool {
    match pdo {
        PowerDataObject::FixedSupply(_) => supply_type == SupplyType::Fixed,
        PowerDataObject::Battery(_) => supply_type == SupplyType::Battery,
        PowerDataObject::VariableSupply(_) => supply_type == SupplyType::Variable,
        PowerDataObject::Augmented(augmented) => match augmented {
            Augmented::Pps(_) => supply_type == SupplyType::Pps,
            Augmented::EprAvs(_) => supply_type == SupplyType::EprAvs,
            Augmented::SprAvs(_) => supply_type == SupplyType::SprAvs,
            Augmented::Unknown(_) => false,
        },
    }
}

/// Whether a single source PDO can supply the request.
fn supplies(pdo: &PowerDataObject, raw_voltage: u16, raw_current: u16) -> bool {
    match pdo {
        PowerDataObject::FixedSupply(fixed) => {
            raw_voltage == fixed.raw_voltage() && raw_current <= fixed.raw_max_current()
        }
        PowerDataObject::VariableSupply(variable) => {
            in_range(raw_voltage, variable.raw_min_voltage(), variable.raw_max_voltage())
                && raw_current <= variable.raw_max_current()
        }
        PowerDataObject::Battery(battery) => {
            in_range(raw_voltage, battery.raw_min_voltage(), battery.raw_max_voltage())
                && raw_power(raw_voltage, raw_current) <= u32::from(battery.raw_max_power())
        }
        PowerDataObject::Augmented(Augmented::Pps(pps)) => {
            in_range(
                raw_voltage,
                decivolts_to_raw(pps.raw_min_voltage().into()),
                decivolts_to_raw(pps.raw_max_voltage().into()),
            ) && raw_current <= fifty_milliamperes_to_raw(pps.raw_max_current().into())
        }
        PowerDataObject::Augmented(Augmented::EprAvs(avs)) => {
            in_range(
                raw_voltage,
                decivolts_to_raw(avs.raw_min_voltage().into()),
                decivolts_to_raw(avs.raw_max_voltage()),
            ) && raw_power(raw_voltage, raw_current) <= watts_to_raw_power(avs.raw_pd_power().into())
        }
        PowerDataObject::Augmented(Augmented::SprAvs(avs)) => {
            spr_avs_current_limit(raw_voltage, avs.raw_max_current_15v(), avs.raw_max_current_20v())
                .is_some_and(|limit| raw_current <= limit)
        }
        PowerDataObject::Augmented(Augmented::Unknown(_)) => false,
    }
}

/// Find the source PDO that supplies a request of the given supply type.
///
/// All PDOs are scanned. If several of them qualify, the last one in the list wins.
/// Returns `None` if no PDO qualifies.
pub fn select_source_pdo(
    source_capabilities: &SourceCapabilities,
    supply_type: SupplyType,
    raw_voltage: u16,
    raw_current: u16,
) -> Option<Selection> {
    let mut selection = None;

    for (index, pdo) in source_capabilities.pdos().iter().enumerate() {
        if pdo.is_zero_padding() || !matches_supply_type(pdo, supply_type) {
            continue;
        }

        if !supplies(pdo, raw_voltage, raw_current) {
            trace!("Skip PDO, request not covered. {:?}", pdo);
            continue;
        }

        let (adjustable_min_voltage, adjustable_max_voltage) = match pdo {
            PowerDataObject::Augmented(Augmented::Pps(pps)) => (Some(pps.min_voltage()), Some(pps.max_voltage())),
            _ => (None, None),
        };

        // Object positions are limited to 1..=13 by the list length.
        selection = Some(Selection {
            position: index as u8 + 1,
            adjustable_max_voltage,
            adjustable_min_voltage,
        });
    }

    selection
}

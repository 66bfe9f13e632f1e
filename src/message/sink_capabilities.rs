//! Definitions of sink capabilities.
//!
//! Sink capabilities describe what power levels the local sink can operate at. In EPR mode, the standard
//! list is extended by a second list of EPR power data objects.
use heapless::Vec;
use proc_bitfield::bitfield;
use uom::si::electric_current::centiampere;
use uom::si::electric_potential::decivolt;
use uom::si::power::watt;

use super::{MAX_EPR_OBJECTS, MAX_SPR_OBJECTS, ParseError, words_from_bytes};
use crate::_50milliamperes_mod::_50milliamperes;
use crate::_50millivolts_mod::_50millivolts;
use crate::_250milliwatts_mod::_250milliwatts;
use crate::units::{ElectricCurrent, ElectricPotential, Power};

bitfield! {
    /// A Sink Fixed Supply PDO.
    ///
    /// Different from Source Fixed Supply PDO in bits 28-20.
    #[derive(Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct SinkFixedSupply(pub u32): Debug, FromStorage, IntoStorage {
        /// Fixed supply (00b)
        pub kind: u8 @ 30..=31,
        /// Dual-Role Power - set if Dual-Role Power supported
        pub dual_role_power: bool @ 29,
        /// Higher Capability - set if sink needs more than vSafe5V for full functionality
        pub higher_capability: bool @ 28,
        /// Unconstrained Power - set if external power source is available
        pub unconstrained_power: bool @ 27,
        /// USB Communications Capable
        pub usb_communications_capable: bool @ 26,
        /// Dual-Role Data
        pub dual_role_data: bool @ 25,
        /// Fast Role Swap required USB Type-C Current (bits 24:23)
        pub raw_fast_role_swap: u8 @ 23..=24,
        /// Voltage in 50 mV units
        pub raw_voltage: u16 @ 10..=19,
        /// Operational Current in 10 mA units
        pub raw_operational_current: u16 @ 0..=9,
    }
}

#[allow(clippy::derivable_impls)]
impl Default for SinkFixedSupply {
    fn default() -> Self {
        Self(0)
    }
}

impl SinkFixedSupply {
    /// Create a new SinkFixedSupply PDO at a specific voltage.
    pub fn new(voltage_50mv: u16, operational_current_10ma: u16) -> Self {
        Self::default()
            .with_raw_voltage(voltage_50mv)
            .with_raw_operational_current(operational_current_10ma)
    }

    /// Get the voltage in standard units.
    pub fn voltage(&self) -> ElectricPotential {
        ElectricPotential::new::<_50millivolts>(self.raw_voltage().into())
    }

    /// Get the operational current in standard units.
    pub fn operational_current(&self) -> ElectricCurrent {
        ElectricCurrent::new::<centiampere>(self.raw_operational_current().into())
    }
}

bitfield! {
    /// A Sink Battery Supply PDO.
    #[derive(Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct SinkBattery(pub u32): Debug, FromStorage, IntoStorage {
        /// Battery (01b)
        pub kind: u8 @ 30..=31,
        /// Maximum Voltage in 50 mV units
        pub raw_max_voltage: u16 @ 20..=29,
        /// Minimum Voltage in 50 mV units
        pub raw_min_voltage: u16 @ 10..=19,
        /// Operational Power in 250 mW units
        pub raw_operational_power: u16 @ 0..=9,
    }
}

impl SinkBattery {
    /// Create a new SinkBattery PDO.
    pub fn new(min_voltage_50mv: u16, max_voltage_50mv: u16, operational_power_250mw: u16) -> Self {
        Self(0)
            .with_kind(0b01)
            .with_raw_min_voltage(min_voltage_50mv)
            .with_raw_max_voltage(max_voltage_50mv)
            .with_raw_operational_power(operational_power_250mw)
    }

    /// Get the maximum voltage in standard units.
    pub fn max_voltage(&self) -> ElectricPotential {
        ElectricPotential::new::<_50millivolts>(self.raw_max_voltage().into())
    }

    /// Get the minimum voltage in standard units.
    pub fn min_voltage(&self) -> ElectricPotential {
        ElectricPotential::new::<_50millivolts>(self.raw_min_voltage().into())
    }

    /// Get the operational power in standard units.
    pub fn operational_power(&self) -> Power {
        Power::new::<_250milliwatts>(self.raw_operational_power().into())
    }
}

bitfield! {
    /// A Sink Variable Supply PDO.
    #[derive(Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct SinkVariableSupply(pub u32): Debug, FromStorage, IntoStorage {
        /// Variable supply (10b)
        pub kind: u8 @ 30..=31,
        /// Maximum Voltage in 50mV units
        pub raw_max_voltage: u16 @ 20..=29,
        /// Minimum Voltage in 50mV units
        pub raw_min_voltage: u16 @ 10..=19,
        /// Operational current in 10mA units
        pub raw_operational_current: u16 @ 0..=9,
    }
}

impl SinkVariableSupply {
    /// Create a new SinkVariableSupply PDO.
    pub fn new(min_voltage_50mv: u16, max_voltage_50mv: u16, operational_current_10ma: u16) -> Self {
        Self(0)
            .with_kind(0b10)
            .with_raw_min_voltage(min_voltage_50mv)
            .with_raw_max_voltage(max_voltage_50mv)
            .with_raw_operational_current(operational_current_10ma)
    }

    /// Get the maximum voltage in standard units.
    pub fn max_voltage(&self) -> ElectricPotential {
        ElectricPotential::new::<_50millivolts>(self.raw_max_voltage().into())
    }

    /// Get the minimum voltage in standard units.
    pub fn min_voltage(&self) -> ElectricPotential {
        ElectricPotential::new::<_50millivolts>(self.raw_min_voltage().into())
    }

    /// Get the operational current in standard units.
    pub fn operational_current(&self) -> ElectricCurrent {
        ElectricCurrent::new::<centiampere>(self.raw_operational_current().into())
    }
}

bitfield! {
    /// A Sink SPR Programmable Power Supply APDO.
    #[derive(Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct SinkProgrammablePowerSupply(pub u32): Debug, FromStorage, IntoStorage {
        /// Augmented power data object (11b)
        pub kind: u8 @ 30..=31,
        /// SPR programmable power supply (00b)
        pub supply: u8 @ 28..=29,
        /// Maximum voltage in 100 mV units
        pub raw_max_voltage: u8 @ 17..=24,
        /// Minimum voltage in 100 mV units
        pub raw_min_voltage: u8 @ 8..=15,
        /// Operational current in 50 mA units
        pub raw_operational_current: u8 @ 0..=6,
    }
}

impl SinkProgrammablePowerSupply {
    /// Create a new sink PPS APDO.
    pub fn new(min_voltage_100mv: u8, max_voltage_100mv: u8, operational_current_50ma: u8) -> Self {
        Self(0)
            .with_kind(0b11)
            .with_supply(0b00)
            .with_raw_min_voltage(min_voltage_100mv)
            .with_raw_max_voltage(max_voltage_100mv)
            .with_raw_operational_current(operational_current_50ma)
    }

    /// Get the maximum voltage in standard units.
    pub fn max_voltage(&self) -> ElectricPotential {
        ElectricPotential::new::<decivolt>(self.raw_max_voltage().into())
    }

    /// Get the minimum voltage in standard units.
    pub fn min_voltage(&self) -> ElectricPotential {
        ElectricPotential::new::<decivolt>(self.raw_min_voltage().into())
    }

    /// Get the operational current in standard units.
    pub fn operational_current(&self) -> ElectricCurrent {
        ElectricCurrent::new::<_50milliamperes>(self.raw_operational_current().into())
    }
}

bitfield! {
    /// A Sink EPR Adjustable Voltage Supply APDO.
    #[derive(Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct SinkEprAdjustableVoltageSupply(pub u32): Debug, FromStorage, IntoStorage {
        /// Augmented power data object (11b)
        pub kind: u8 @ 30..=31,
        /// EPR adjustable voltage supply (01b)
        pub supply: u8 @ 28..=29,
        /// Maximum voltage in 100 mV units
        pub raw_max_voltage: u16 @ 17..=25,
        /// Minimum voltage in 100 mV units
        pub raw_min_voltage: u8 @ 8..=15,
        /// PDP in 1 W units
        pub raw_pd_power: u8 @ 0..=7,
    }
}

impl SinkEprAdjustableVoltageSupply {
    /// Create a new sink EPR AVS APDO.
    pub fn new(min_voltage_100mv: u8, max_voltage_100mv: u16, pd_power_1w: u8) -> Self {
        Self(0)
            .with_kind(0b11)
            .with_supply(0b01)
            .with_raw_min_voltage(min_voltage_100mv)
            .with_raw_max_voltage(max_voltage_100mv)
            .with_raw_pd_power(pd_power_1w)
    }

    /// Get the maximum voltage in standard units.
    pub fn max_voltage(&self) -> ElectricPotential {
        ElectricPotential::new::<decivolt>(self.raw_max_voltage().into())
    }

    /// Get the minimum voltage in standard units.
    pub fn min_voltage(&self) -> ElectricPotential {
        ElectricPotential::new::<decivolt>(self.raw_min_voltage().into())
    }

    /// Get the PDP in standard units.
    pub fn pd_power(&self) -> Power {
        Power::new::<watt>(self.raw_pd_power().into())
    }
}

bitfield! {
    /// A Sink SPR Adjustable Voltage Supply APDO.
    ///
    /// The sink operates between 9 V and 20 V with one current limit per voltage tier.
    #[derive(Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct SinkSprAdjustableVoltageSupply(pub u32): Debug, FromStorage, IntoStorage {
        /// Augmented power data object (11b)
        pub kind: u8 @ 30..=31,
        /// SPR adjustable voltage supply (10b)
        pub supply: u8 @ 28..=29,
        /// Operational current for 9 V to 15 V in 10 mA units
        pub raw_operational_current_15v: u16 @ 10..=19,
        /// Operational current for 15 V to 20 V in 10 mA units
        pub raw_operational_current_20v: u16 @ 0..=9,
    }
}

impl SinkSprAdjustableVoltageSupply {
    /// Create a new sink SPR AVS APDO.
    pub fn new(operational_current_15v_10ma: u16, operational_current_20v_10ma: u16) -> Self {
        Self(0)
            .with_kind(0b11)
            .with_supply(0b10)
            .with_raw_operational_current_15v(operational_current_15v_10ma)
            .with_raw_operational_current_20v(operational_current_20v_10ma)
    }
}

/// Augmented sink power data objects.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SinkAugmented {
    /// SPR programmable power supply.
    Pps(SinkProgrammablePowerSupply),
    /// EPR adjustable voltage supply.
    EprAvs(SinkEprAdjustableVoltageSupply),
    /// SPR adjustable voltage supply.
    SprAvs(SinkSprAdjustableVoltageSupply),
    /// Reserved subtype.
    Unknown(u32),
}

/// A Sink Power Data Object.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SinkPowerDataObject {
    /// Fixed voltage supply requirement.
    FixedSupply(SinkFixedSupply),
    /// Battery supply requirement.
    Battery(SinkBattery),
    /// Variable voltage supply requirement.
    VariableSupply(SinkVariableSupply),
    /// Augmented supply requirement.
    Augmented(SinkAugmented),
}

impl SinkPowerDataObject {
    /// Parse a raw sink PDO.
    pub fn from_raw(raw: u32) -> Self {
        match raw >> 30 {
            0b00 => Self::FixedSupply(SinkFixedSupply(raw)),
            0b01 => Self::Battery(SinkBattery(raw)),
            0b10 => Self::VariableSupply(SinkVariableSupply(raw)),
            _ => Self::Augmented(match (raw >> 28) & 0b11 {
                0b00 => SinkAugmented::Pps(SinkProgrammablePowerSupply(raw)),
                0b01 => SinkAugmented::EprAvs(SinkEprAdjustableVoltageSupply(raw)),
                0b10 => SinkAugmented::SprAvs(SinkSprAdjustableVoltageSupply(raw)),
                x => {
                    warn!("Unknown sink AugmentedPowerDataObject supply {}", x);
                    SinkAugmented::Unknown(raw)
                }
            }),
        }
    }

    /// Convert the PDO to its raw u32 representation.
    pub fn to_raw(&self) -> u32 {
        match self {
            SinkPowerDataObject::FixedSupply(f) => f.0,
            SinkPowerDataObject::Battery(b) => b.0,
            SinkPowerDataObject::VariableSupply(v) => v.0,
            SinkPowerDataObject::Augmented(SinkAugmented::Pps(p)) => p.0,
            SinkPowerDataObject::Augmented(SinkAugmented::EprAvs(a)) => a.0,
            SinkPowerDataObject::Augmented(SinkAugmented::SprAvs(a)) => a.0,
            SinkPowerDataObject::Augmented(SinkAugmented::Unknown(raw)) => *raw,
        }
    }
}

/// Sink capabilities.
///
/// Holds the standard list (up to 7 PDOs, the first one at vSafe5V) and the EPR extension that is only
/// considered while EPR mode is active.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SinkCapabilities {
    spr: Vec<SinkPowerDataObject, MAX_SPR_OBJECTS>,
    epr: Vec<SinkPowerDataObject, MAX_EPR_OBJECTS>,
}

impl SinkCapabilities {
    /// Create sink capabilities from standard and EPR raw data objects.
    pub fn from_raw(spr: &[u32], epr: &[u32]) -> Result<Self, ParseError> {
        Ok(Self {
            spr: collect_pdos(spr)?,
            epr: collect_pdos(epr)?,
        })
    }

    /// Parse sink capabilities from little-endian message payloads (without header).
    pub fn from_bytes(spr: &[u8], epr: &[u8]) -> Result<Self, ParseError> {
        let spr: Vec<u32, MAX_SPR_OBJECTS> = words_from_bytes(spr)?;
        let epr: Vec<u32, MAX_EPR_OBJECTS> = words_from_bytes(epr)?;
        Self::from_raw(&spr, &epr)
    }

    /// The standard power range PDOs.
    pub fn spr_pdos(&self) -> &[SinkPowerDataObject] {
        &self.spr
    }

    /// The extended power range PDOs.
    pub fn epr_pdos(&self) -> &[SinkPowerDataObject] {
        &self.epr
    }

    /// All PDOs to evaluate, skipping zero padding.
    ///
    /// The EPR extension is only included if `epr_active` is set.
    pub fn pdos(&self, epr_active: bool) -> impl Iterator<Item = &SinkPowerDataObject> {
        let epr: &[SinkPowerDataObject] = if epr_active { &self.epr } else { &[] };

        self.spr.iter().chain(epr.iter()).filter(|pdo| pdo.to_raw() != 0)
    }
}

fn collect_pdos<const N: usize>(raw: &[u32]) -> Result<Vec<SinkPowerDataObject, N>, ParseError> {
    if raw.len() > N {
        return Err(ParseError::TooManyObjects {
            capacity: N,
            found: raw.len(),
        });
    }

    Ok(raw.iter().copied().map(SinkPowerDataObject::from_raw).collect())
}

#[cfg(test)]
mod tests {
    use uom::si::electric_current::milliampere;
    use uom::si::electric_potential::millivolt;
    use uom::si::power::milliwatt;

    use super::*;

    #[test]
    fn test_parse_sink_pdos() {
        let fixed = SinkFixedSupply::new(100, 300);
        let battery = SinkBattery::new(180, 300, 60);
        let variable = SinkVariableSupply::new(100, 400, 150);
        let pps = SinkProgrammablePowerSupply::new(33, 110, 60);
        let epr_avs = SinkEprAdjustableVoltageSupply::new(150, 480, 140);
        let spr_avs = SinkSprAdjustableVoltageSupply::new(300, 225);

        let capabilities = SinkCapabilities::from_raw(
            &[fixed.0, battery.0, variable.0, pps.0, spr_avs.0],
            &[epr_avs.0],
        )
        .unwrap();

        assert_eq!(
            capabilities.spr_pdos(),
            &[
                SinkPowerDataObject::FixedSupply(fixed),
                SinkPowerDataObject::Battery(battery),
                SinkPowerDataObject::VariableSupply(variable),
                SinkPowerDataObject::Augmented(SinkAugmented::Pps(pps)),
                SinkPowerDataObject::Augmented(SinkAugmented::SprAvs(spr_avs)),
            ]
        );
        assert_eq!(
            capabilities.epr_pdos(),
            &[SinkPowerDataObject::Augmented(SinkAugmented::EprAvs(epr_avs))]
        );

        assert_eq!(fixed.voltage().get::<millivolt>(), 5000);
        assert_eq!(fixed.operational_current().get::<milliampere>(), 3000);
        assert_eq!(battery.operational_power().get::<milliwatt>(), 15000);
        assert_eq!(variable.max_voltage().get::<millivolt>(), 20000);
        assert_eq!(pps.max_voltage().get::<millivolt>(), 11000);
        assert_eq!(pps.operational_current().get::<milliampere>(), 3000);
        assert_eq!(epr_avs.pd_power().get::<milliwatt>(), 140_000);
    }

    #[test]
    fn test_epr_extension_and_padding() {
        let fixed = SinkFixedSupply::new(100, 300);
        let epr_fixed = SinkFixedSupply::new(560, 500);

        let capabilities = SinkCapabilities::from_raw(&[fixed.0, 0, 0], &[epr_fixed.0]).unwrap();

        assert_eq!(capabilities.pdos(false).count(), 1);
        assert_eq!(
            capabilities.pdos(true).copied().collect::<std::vec::Vec<_>>(),
            [
                SinkPowerDataObject::FixedSupply(fixed),
                SinkPowerDataObject::FixedSupply(epr_fixed)
            ]
        );

        let capabilities = SinkCapabilities::from_bytes(&[0x2c, 0x91, 0x01, 0x00], &[]).unwrap();
        assert_eq!(
            capabilities.spr_pdos(),
            &[SinkPowerDataObject::FixedSupply(SinkFixedSupply::new(100, 300))]
        );

        assert!(matches!(
            SinkCapabilities::from_raw(&[0; 8], &[]),
            Err(ParseError::TooManyObjects { capacity: 7, found: 8 })
        ));
    }
}

//! Definitions of source capabilities, as advertised by the port partner.
use heapless::Vec;
use proc_bitfield::bitfield;
use uom::si::electric_current::centiampere;
use uom::si::electric_potential::decivolt;
use uom::si::power::watt;

use super::{MAX_SPR_OBJECTS, ParseError, words_from_bytes};
use crate::_50milliamperes_mod::_50milliamperes;
use crate::_50millivolts_mod::_50millivolts;
use crate::_250milliwatts_mod::_250milliwatts;
use crate::units::{ElectricCurrent, ElectricPotential, Power};

/// The maximum number of source power data objects (SPR and EPR, with padding).
pub const MAX_SOURCE_OBJECTS: usize = 16;

/// A power data object holds information about one type of source capability.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PowerDataObject {
    /// Fixed voltage supply.
    FixedSupply(FixedSupply),
    /// Battery supply.
    Battery(Battery),
    /// Variable voltage supply.
    VariableSupply(VariableSupply),
    /// Augmented supply.
    Augmented(Augmented),
}

impl PowerDataObject {
    /// The raw 32 bit representation, as received.
    pub fn to_raw(&self) -> u32 {
        match self {
            PowerDataObject::FixedSupply(f) => f.0,
            PowerDataObject::Battery(b) => b.0,
            PowerDataObject::VariableSupply(v) => v.0,
            PowerDataObject::Augmented(a) => a.to_raw(),
        }
    }

    /// Check if this PDO is zero-padding (unused SPR positions in EPR capabilities).
    pub fn is_zero_padding(&self) -> bool {
        self.to_raw() == 0
    }
}

bitfield! {
    /// A raw power data object, used to determine its kind.
    #[derive(Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct RawPowerDataObject(pub u32): Debug, FromStorage, IntoStorage {
        /// The kind of power data object.
        pub kind: u8 @ 30..=31,
    }
}

bitfield! {
    /// A fixed voltage supply PDO.
    #[derive(Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct FixedSupply(pub u32): Debug, FromStorage, IntoStorage {
        /// Fixed supply
        pub kind: u8 @ 30..=31,
        /// Dual-role power
        pub dual_role_power: bool @ 29,
        /// USB suspend supported
        pub usb_suspend_supported: bool @ 28,
        /// Unconstrained power
        pub unconstrained_power: bool @ 27,
        /// USB communications capable
        pub usb_communications_capable: bool @ 26,
        /// Dual-role data
        pub dual_role_data: bool @ 25,
        /// Unchunked extended messages supported
        pub unchunked_extended_messages_supported: bool @ 24,
        /// EPR mode capable
        pub epr_mode_capable: bool @ 23,
        /// Peak current
        pub peak_current: u8 @ 20..=21,
        /// Voltage in 50 mV units
        pub raw_voltage: u16 @ 10..=19,
        /// Maximum current in 10 mA units
        pub raw_max_current: u16 @ 0..=9,
    }
}

#[allow(clippy::derivable_impls)]
impl Default for FixedSupply {
    fn default() -> Self {
        Self(0)
    }
}

impl FixedSupply {
    /// The fixed output voltage.
    pub fn voltage(&self) -> ElectricPotential {
        ElectricPotential::new::<_50millivolts>(self.raw_voltage().into())
    }

    /// The maximum current at the fixed voltage.
    pub fn max_current(&self) -> ElectricCurrent {
        ElectricCurrent::new::<centiampere>(self.raw_max_current().into())
    }
}

bitfield! {
    /// A battery supply PDO.
    #[derive(Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct Battery(pub u32): Debug, FromStorage, IntoStorage {
        /// Battery
        pub kind: u8 @ 30..=31,
        /// Maximum Voltage in 50 mV units
        pub raw_max_voltage: u16 @ 20..=29,
        /// Minimum Voltage in 50 mV units
        pub raw_min_voltage: u16 @ 10..=19,
        /// Maximum Allowable Power in 250 mW units
        pub raw_max_power: u16 @ 0..=9,
    }
}

impl Default for Battery {
    fn default() -> Self {
        Self(0).with_kind(0b01)
    }
}

impl Battery {
    /// The maximum output voltage.
    pub fn max_voltage(&self) -> ElectricPotential {
        ElectricPotential::new::<_50millivolts>(self.raw_max_voltage().into())
    }

    /// The minimum output voltage.
    pub fn min_voltage(&self) -> ElectricPotential {
        ElectricPotential::new::<_50millivolts>(self.raw_min_voltage().into())
    }

    /// The maximum allowable power.
    pub fn max_power(&self) -> Power {
        Power::new::<_250milliwatts>(self.raw_max_power().into())
    }
}

bitfield! {
    /// A variable supply (non-battery) PDO.
    #[derive(Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct VariableSupply(pub u32): Debug, FromStorage, IntoStorage {
        /// Variable supply (non-battery)
        pub kind: u8 @ 30..=31,
        /// Maximum Voltage in 50mV units
        pub raw_max_voltage: u16 @ 20..=29,
        /// Minimum Voltage in 50mV units
        pub raw_min_voltage: u16 @ 10..=19,
        /// Maximum current in 10mA units
        pub raw_max_current: u16 @ 0..=9,
    }
}

impl Default for VariableSupply {
    fn default() -> Self {
        Self(0).with_kind(0b10)
    }
}

impl VariableSupply {
    /// The maximum output voltage.
    pub fn max_voltage(&self) -> ElectricPotential {
        ElectricPotential::new::<_50millivolts>(self.raw_max_voltage().into())
    }

    /// The minimum output voltage.
    pub fn min_voltage(&self) -> ElectricPotential {
        ElectricPotential::new::<_50millivolts>(self.raw_min_voltage().into())
    }

    /// The maximum current.
    pub fn max_current(&self) -> ElectricCurrent {
        ElectricCurrent::new::<centiampere>(self.raw_max_current().into())
    }
}

/// Augmented power data objects, distinguished by their supply subtype.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Augmented {
    /// SPR programmable power supply.
    Pps(SprProgrammablePowerSupply),
    /// EPR adjustable voltage supply.
    EprAvs(EprAdjustableVoltageSupply),
    /// SPR adjustable voltage supply.
    SprAvs(SprAdjustableVoltageSupply),
    /// Reserved subtype.
    Unknown(u32),
}

impl Augmented {
    /// The raw 32 bit representation.
    pub fn to_raw(&self) -> u32 {
        match self {
            Augmented::Pps(p) => p.0,
            Augmented::EprAvs(a) => a.0,
            Augmented::SprAvs(a) => a.0,
            Augmented::Unknown(u) => *u,
        }
    }
}

bitfield! {
    /// A raw augmented power data object, used to determine its supply subtype.
    #[derive(Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct AugmentedRaw(pub u32): Debug, FromStorage, IntoStorage {
        /// Augmented power data object
        pub kind: u8 @ 30..=31,
        /// Augmented supply subtype
        pub supply: u8 @ 28..=29,
        /// Subtype specific power capabilities
        pub power_capabilities: u32 @ 0..=27,
    }
}

bitfield! {
    /// An SPR programmable power supply APDO.
    #[derive(Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct SprProgrammablePowerSupply(pub u32): Debug, FromStorage, IntoStorage {
        /// Augmented power data object
        pub kind: u8 @ 30..=31,
        /// SPR programmable power supply
        pub supply: u8 @ 28..=29,
        /// PPS power limited
        pub pps_power_limited: bool @ 27,
        /// Maximum voltage in 100mV increments
        pub raw_max_voltage: u8 @ 17..=24,
        /// Minimum Voltage in 100mV increments
        pub raw_min_voltage: u8 @ 8..=15,
        /// Maximum Current in 50mA increments
        pub raw_max_current: u8 @ 0..=6,
    }
}

impl Default for SprProgrammablePowerSupply {
    fn default() -> Self {
        Self(0).with_kind(0b11).with_supply(0b00)
    }
}

impl SprProgrammablePowerSupply {
    /// The maximum output voltage, the ceiling for voltage adjustments.
    pub fn max_voltage(&self) -> ElectricPotential {
        ElectricPotential::new::<decivolt>(self.raw_max_voltage().into())
    }

    /// The minimum output voltage.
    pub fn min_voltage(&self) -> ElectricPotential {
        ElectricPotential::new::<decivolt>(self.raw_min_voltage().into())
    }

    /// The maximum current over the whole voltage range.
    pub fn max_current(&self) -> ElectricCurrent {
        ElectricCurrent::new::<_50milliamperes>(self.raw_max_current().into())
    }
}

bitfield! {
    /// An EPR adjustable voltage supply APDO.
    #[derive(Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct EprAdjustableVoltageSupply(pub u32): Debug, FromStorage, IntoStorage {
        /// Augmented power data object
        pub kind: u8 @ 30..=31,
        /// EPR adjustable voltage supply
        pub supply: u8 @ 28..=29,
        /// Peak current capability
        pub peak_current: u8 @ 26..=27,
        /// Maximum voltage in 100mV increments
        pub raw_max_voltage: u16 @ 17..=25,
        /// Minimum Voltage in 100mV increments
        pub raw_min_voltage: u8 @ 8..=15,
        /// PDP in 1W increments
        pub raw_pd_power: u8 @ 0..=7,
    }
}

impl Default for EprAdjustableVoltageSupply {
    fn default() -> Self {
        Self(0).with_kind(0b11).with_supply(0b01)
    }
}

impl EprAdjustableVoltageSupply {
    /// The maximum output voltage.
    pub fn max_voltage(&self) -> ElectricPotential {
        ElectricPotential::new::<decivolt>(self.raw_max_voltage().into())
    }

    /// The minimum output voltage.
    pub fn min_voltage(&self) -> ElectricPotential {
        ElectricPotential::new::<decivolt>(self.raw_min_voltage().into())
    }

    /// The power delivery power, the limit over the whole voltage range.
    pub fn pd_power(&self) -> Power {
        Power::new::<watt>(self.raw_pd_power().into())
    }
}

bitfield! {
    /// An SPR adjustable voltage supply APDO.
    ///
    /// Covers 9 V to 20 V, with separate current limits up to 15 V and above.
    #[derive(Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct SprAdjustableVoltageSupply(pub u32): Debug, FromStorage, IntoStorage {
        /// Augmented power data object
        pub kind: u8 @ 30..=31,
        /// SPR adjustable voltage supply
        pub supply: u8 @ 28..=29,
        /// Peak current capability
        pub peak_current: u8 @ 26..=27,
        /// Maximum current for 9 V to 15 V in 10mA increments
        pub raw_max_current_15v: u16 @ 10..=19,
        /// Maximum current for 15 V to 20 V in 10mA increments
        pub raw_max_current_20v: u16 @ 0..=9,
    }
}

impl Default for SprAdjustableVoltageSupply {
    fn default() -> Self {
        Self(0).with_kind(0b11).with_supply(0b10)
    }
}

impl SprAdjustableVoltageSupply {
    /// The maximum current from 9 V up to 15 V.
    pub fn max_current_15v(&self) -> ElectricCurrent {
        ElectricCurrent::new::<centiampere>(self.raw_max_current_15v().into())
    }

    /// The maximum current above 15 V, up to 20 V.
    pub fn max_current_20v(&self) -> ElectricCurrent {
        ElectricCurrent::new::<centiampere>(self.raw_max_current_20v().into())
    }
}

/// Parse a raw PDO into a typed power data object.
pub fn parse_raw_pdo(raw: u32) -> PowerDataObject {
    let pdo = RawPowerDataObject(raw);
    match pdo.kind() {
        0b00 => PowerDataObject::FixedSupply(FixedSupply(raw)),
        0b01 => PowerDataObject::Battery(Battery(raw)),
        0b10 => PowerDataObject::VariableSupply(VariableSupply(raw)),
        _ => PowerDataObject::Augmented(match AugmentedRaw(raw).supply() {
            0b00 => Augmented::Pps(SprProgrammablePowerSupply(raw)),
            0b01 => Augmented::EprAvs(EprAdjustableVoltageSupply(raw)),
            0b10 => Augmented::SprAvs(SprAdjustableVoltageSupply(raw)),
            x => {
                warn!("Unknown AugmentedPowerDataObject supply {}", x);
                Augmented::Unknown(raw)
            }
        }),
    }
}

/// Source capabilities of the port partner.
///
/// A read-only snapshot that is valid for the current contract only.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SourceCapabilities(pub(crate) Vec<PowerDataObject, MAX_SOURCE_OBJECTS>);

impl SourceCapabilities {
    /// Create source capabilities from raw data objects.
    pub fn from_raw(raw: &[u32]) -> Result<Self, ParseError> {
        if raw.len() > MAX_SOURCE_OBJECTS {
            return Err(ParseError::TooManyObjects {
                capacity: MAX_SOURCE_OBJECTS,
                found: raw.len(),
            });
        }

        Ok(Self(raw.iter().copied().map(parse_raw_pdo).collect()))
    }

    /// Parse source capabilities from a little-endian message payload (without header).
    pub fn from_bytes(payload: &[u8]) -> Result<Self, ParseError> {
        let words: Vec<u32, MAX_SOURCE_OBJECTS> = words_from_bytes(payload)?;
        Self::from_raw(&words)
    }

    /// The first PDO, which is always the vSafe5V fixed supply.
    pub fn vsafe_5v(&self) -> Option<&FixedSupply> {
        self.0.first().and_then(|supply| {
            if let PowerDataObject::FixedSupply(supply) = supply {
                Some(supply)
            } else {
                None
            }
        })
    }

    /// Determine, whether the source is EPR mode capable.
    pub fn epr_mode_capable(&self) -> bool {
        self.vsafe_5v().map(FixedSupply::epr_mode_capable).unwrap_or_default()
    }

    /// Get power data objects (PDOs) from the source.
    pub fn pdos(&self) -> &[PowerDataObject] {
        &self.0
    }

    /// Get the PDO at a 1-based object position.
    pub fn pdo_at_object_position(&self, position: u8) -> Option<&PowerDataObject> {
        self.0.get(usize::from(position).checked_sub(1)?)
    }

    /// Check if this is an EPR capabilities list (has PDOs at position 8+).
    pub fn is_epr_capabilities(&self) -> bool {
        self.0.len() > MAX_SPR_OBJECTS
    }
}

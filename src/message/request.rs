//! Definitions of request message content.
//!
//! A request data object (RDO) references a source PDO by its object position and carries the operating
//! point for that supply. Positions 1..=7 address the standard list, positions 8..=13 the EPR extension.
use byteorder::{ByteOrder, LittleEndian};
use heapless::Vec;
use proc_bitfield::bitfield;
use uom::si::electric_current::centiampere;

use super::ParseError;
use crate::_20millivolts_mod::_20millivolts;
use crate::_25millivolts_mod::_25millivolts;
use crate::_50milliamperes_mod::_50milliamperes;
use crate::_250milliwatts_mod::_250milliwatts;
use crate::RequestKind;
use crate::units::{ElectricCurrent, ElectricPotential, Power};

/// The highest object position that fits into the three low position bits.
const MAX_SPR_OBJECT_POSITION: u8 = 0b111;

bitfield! {
    /// Fields that all request data objects share.
    #[derive(Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct RawDataObject(pub u32): Debug, FromStorage, IntoStorage {
        /// Set for object positions beyond the standard list
        pub epr_object_position: bool @ 31,
        /// Low three bits of the object position
        pub raw_object_position: u8 @ 28..=30,
        /// GiveBack flag
        pub giveback_flag: bool @ 27,
        /// Capability mismatch
        pub capability_mismatch: bool @ 26,
        /// USB communications capable
        pub usb_communications_capable: bool @ 25,
        /// No USB Suspend
        pub no_usb_suspend: bool @ 24,
        /// Unchunked extended messages supported
        pub unchunked_extended_messages_supported: bool @ 23,
        /// EPR mode capable
        pub epr_mode_capable: bool @ 22,
    }
}

impl RawDataObject {
    /// The object position that this request refers to.
    ///
    /// Reassembled from the EPR bit and the low position bits.
    pub fn object_position(&self) -> u8 {
        if self.epr_object_position() {
            self.raw_object_position() | (MAX_SPR_OBJECT_POSITION + 1)
        } else {
            self.raw_object_position()
        }
    }

    /// Encode an object position.
    ///
    /// Positions above 7 set the EPR bit and keep the three low bits.
    pub fn with_object_position(self, object_position: u8) -> Self {
        self.with_epr_object_position(object_position > MAX_SPR_OBJECT_POSITION)
            .with_raw_object_position(object_position & MAX_SPR_OBJECT_POSITION)
    }
}

bitfield! {
    /// Request for a fixed or variable supply.
    #[derive(Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct FixedVariableSupply(pub u32): Debug, FromStorage, IntoStorage {
        /// Operating current in 10mA units
        pub raw_operating_current: u16 @ 10..=19,
        /// Maximum operating current in 10mA units
        pub raw_max_operating_current: u16 @ 0..=9,
    }
}

impl FixedVariableSupply {
    /// Get the operating current in standard units.
    pub fn operating_current(&self) -> ElectricCurrent {
        ElectricCurrent::new::<centiampere>(self.raw_operating_current().into())
    }

    /// Get the maximum operating current in standard units.
    pub fn max_operating_current(&self) -> ElectricCurrent {
        ElectricCurrent::new::<centiampere>(self.raw_max_operating_current().into())
    }
}

bitfield! {
    /// Request for a battery supply.
    #[derive(Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct Battery(pub u32): Debug, FromStorage, IntoStorage {
        /// Operating power in 250mW units
        pub raw_operating_power: u16 @ 10..=19,
        /// Maximum operating power in 250mW units
        pub raw_max_operating_power: u16 @ 0..=9,
    }
}

impl Battery {
    /// Get the operating power in standard units.
    pub fn operating_power(&self) -> Power {
        Power::new::<_250milliwatts>(self.raw_operating_power().into())
    }

    /// Get the maximum operating power in standard units.
    pub fn max_operating_power(&self) -> Power {
        Power::new::<_250milliwatts>(self.raw_max_operating_power().into())
    }
}

bitfield!(
    /// Request for a programmable power supply.
    #[derive(Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct Pps(pub u32): Debug, FromStorage, IntoStorage {
        /// Output voltage in 20mV units
        pub raw_output_voltage: u16 @ 9..=20,
        /// Operating current in 50mA units
        pub raw_operating_current: u16 @ 0..=6,
    }
);

impl Pps {
    /// Get the output voltage in standard units.
    pub fn output_voltage(&self) -> ElectricPotential {
        ElectricPotential::new::<_20millivolts>(self.raw_output_voltage().into())
    }

    /// Get the operating current in standard units.
    pub fn operating_current(&self) -> ElectricCurrent {
        ElectricCurrent::new::<_50milliamperes>(self.raw_operating_current().into())
    }
}

bitfield!(
    /// Request for an adjustable voltage supply.
    #[derive(Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct Avs(pub u32): Debug, FromStorage, IntoStorage {
        /// Output voltage in 25mV units
        pub raw_output_voltage: u16 @ 9..=20,
        /// Operating current in 50mA units
        pub raw_operating_current: u16 @ 0..=6,
    }
);

impl Avs {
    /// Get the output voltage in standard units.
    pub fn output_voltage(&self) -> ElectricPotential {
        ElectricPotential::new::<_25millivolts>(self.raw_output_voltage().into())
    }

    /// Get the operating current in standard units.
    pub fn operating_current(&self) -> ElectricCurrent {
        ElectricCurrent::new::<_50milliamperes>(self.raw_operating_current().into())
    }
}

/// A request data object, by the kind of supply that it requests from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RequestDataObject {
    /// Fixed or variable supply.
    FixedVariableSupply(FixedVariableSupply),
    /// Battery supply.
    Battery(Battery),
    /// Programmable power supply.
    Pps(Pps),
    /// Adjustable voltage supply, SPR or EPR.
    Avs(Avs),
}

impl RequestDataObject {
    /// Convert the RDO to its raw u32 representation.
    pub fn to_raw(&self) -> u32 {
        match self {
            RequestDataObject::FixedVariableSupply(rdo) => rdo.0,
            RequestDataObject::Battery(rdo) => rdo.0,
            RequestDataObject::Pps(rdo) => rdo.0,
            RequestDataObject::Avs(rdo) => rdo.0,
        }
    }

    /// The shared fields of this RDO.
    pub fn common(&self) -> RawDataObject {
        RawDataObject(self.to_raw())
    }

    /// The object position that this RDO refers to.
    pub fn object_position(&self) -> u8 {
        self.common().object_position()
    }
}

/// A request, ready for submission to the protocol engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Request {
    /// A standard request, carrying only the RDO.
    Standard(RequestDataObject),
    /// An EPR request, carrying the RDO and a copy of the selected source PDO.
    Epr {
        /// The request data object.
        rdo: RequestDataObject,
        /// The raw source PDO that the RDO refers to.
        pdo: u32,
    },
}

impl Request {
    /// The request data object.
    pub fn rdo(&self) -> &RequestDataObject {
        match self {
            Request::Standard(rdo) => rdo,
            Request::Epr { rdo, .. } => rdo,
        }
    }

    /// The message kind to submit this request as.
    pub fn kind(&self) -> RequestKind {
        match self {
            Request::Standard(_) => RequestKind::Request,
            Request::Epr { .. } => RequestKind::EprRequest,
        }
    }

    /// The raw data objects of the message payload.
    pub fn data_objects(&self) -> Vec<u32, 2> {
        let mut data_objects = Vec::new();

        // Capacity fits both request kinds.
        let _ = data_objects.push(self.rdo().to_raw());
        if let Request::Epr { pdo, .. } = self {
            let _ = data_objects.push(*pdo);
        }

        data_objects
    }

    /// Serialize the payload to little-endian bytes.
    ///
    /// Returns the number of bytes written.
    pub fn to_bytes(&self, buf: &mut [u8]) -> Result<usize, ParseError> {
        let data_objects = self.data_objects();
        let size = data_objects.len() * 4;

        if buf.len() < size {
            return Err(ParseError::InvalidLength {
                expected: size,
                found: buf.len(),
            });
        }

        for (chunk, data_object) in buf.chunks_exact_mut(4).zip(data_objects.iter()) {
            LittleEndian::write_u32(chunk, *data_object);
        }

        Ok(size)
    }
}

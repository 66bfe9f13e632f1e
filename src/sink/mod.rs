//! The sink implementation.
//!
//! A negotiation runs through the [`validator`], the [`selector`] and the [`builder`], before the
//! [`contract`] submits the request to the protocol engine. The [`maintenance`] task repeats negotiations
//! periodically, to keep adjustable voltage contracts alive.
pub mod builder;
pub mod contract;
pub mod maintenance;
pub mod selector;
pub mod validator;

pub use builder::{NegotiationContext, build_request};
pub use contract::{ContractState, Outcome};
pub use maintenance::{ExercisePolicy, Maintenance, Ramp, StopSignal, Sweep};
pub use selector::{Selection, select_source_pdo};
pub use validator::is_request_valid;

use crate::SubmitError;

/// The kind of supply to request from the source.
///
/// The low nibble holds the power data object kind, the high nibble the augmented subtype.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum SupplyType {
    /// Fixed supply.
    Fixed = 0x00,
    /// Battery supply.
    Battery = 0x01,
    /// Variable supply.
    Variable = 0x02,
    /// SPR programmable power supply.
    Pps = 0x03,
    /// EPR adjustable voltage supply.
    EprAvs = 0x13,
    /// SPR adjustable voltage supply.
    SprAvs = 0x23,
}

impl SupplyType {
    /// The power data object kind (bits 31..30 of a PDO).
    pub const fn kind(self) -> u8 {
        self as u8 & 0x0f
    }

    /// The augmented subtype (bits 29..28 of an APDO).
    ///
    /// Only meaningful for augmented supply types.
    pub const fn augmented_subtype(self) -> u8 {
        self as u8 >> 4
    }

    /// Whether this is an augmented supply type.
    pub const fn is_augmented(self) -> bool {
        self.kind() == 0b11
    }

    /// Whether contracts for this supply type have an adjustable voltage.
    ///
    /// These contracts are re-requested, even if the voltage did not change.
    pub const fn is_adjustable(self) -> bool {
        self.is_augmented()
    }
}

impl TryFrom<u8> for SupplyType {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(SupplyType::Fixed),
            0x01 => Ok(SupplyType::Battery),
            0x02 => Ok(SupplyType::Variable),
            0x03 => Ok(SupplyType::Pps),
            0x13 => Ok(SupplyType::EprAvs),
            0x23 => Ok(SupplyType::SprAvs),
            x => Err(x),
        }
    }
}

/// Reasons for a negotiation attempt to fail.
///
/// None of them are fatal. The contract state stays untouched, so that a later attempt can retry.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// No local sink capability covers the request.
    #[error("no sink capability covers the request")]
    Validation,
    /// No source capability covers the request.
    #[error("no source capability covers the request")]
    Selection,
    /// The protocol engine did not accept the request for submission.
    #[error("request submission failed: {0:?}")]
    Submission(SubmitError),
}

impl From<SubmitError> for Error {
    fn from(error: SubmitError) -> Self {
        Error::Submission(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supply_type_mask() {
        assert_eq!(SupplyType::Pps.kind(), 0b11);
        assert_eq!(SupplyType::Pps.augmented_subtype(), 0b00);
        assert_eq!(SupplyType::EprAvs.augmented_subtype(), 0b01);
        assert_eq!(SupplyType::SprAvs.augmented_subtype(), 0b10);
        assert_eq!(SupplyType::Variable.kind(), 0b10);

        assert!(SupplyType::SprAvs.is_adjustable());
        assert!(!SupplyType::Fixed.is_adjustable());
        assert!(!SupplyType::Battery.is_adjustable());

        assert_eq!(SupplyType::try_from(0x13), Ok(SupplyType::EprAvs));
        assert_eq!(SupplyType::try_from(0x33), Err(0x33));
    }
}

//! Definitions of power data objects and request data objects.
//!
//! See [6.4.1] and [6.4.2].
pub mod request;
pub mod sink_capabilities;

pub mod source_capabilities;

use byteorder::{ByteOrder, LittleEndian};
use heapless::Vec;

/// The number of power data objects that fit into a standard power range message.
pub const MAX_SPR_OBJECTS: usize = 7;

/// The number of additional power data objects in the extended power range.
pub const MAX_EPR_OBJECTS: usize = 6;

/// Errors that can occur during parsing of data objects.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// The input buffer has an invalid length.
    /// * `expected` - The expected length.
    /// * `found` - The actual length found.
    #[error("invalid input buffer length (expected {expected:?}, found {found:?})")]
    InvalidLength {
        /// The expected length.
        expected: usize,
        /// The actual length found.
        found: usize,
    },
    /// More data objects than a capabilities list can hold.
    #[error("too many data objects (capacity {capacity:?}, found {found:?})")]
    TooManyObjects {
        /// The capacity of the list.
        capacity: usize,
        /// The number of objects found.
        found: usize,
    },
}

/// Split a little-endian payload into 32 bit data objects.
pub(crate) fn words_from_bytes<const N: usize>(payload: &[u8]) -> Result<Vec<u32, N>, ParseError> {
    if payload.len() % 4 != 0 {
        return Err(ParseError::InvalidLength {
            expected: payload.len() - payload.len() % 4,
            found: payload.len(),
        });
    }

    let found = payload.len() / 4;
    if found > N {
        return Err(ParseError::TooManyObjects { capacity: N, found });
    }

    Ok(payload.chunks_exact(4).map(LittleEndian::read_u32).collect())
}

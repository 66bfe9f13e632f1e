//! Contract negotiation for USB PD sinks with programmable (adjustable voltage) supplies.
//!
//! Matches a requested voltage and current against the local sink capabilities and the port partner's
//! source capabilities, encodes a request data object for the selected supply and keeps an adjustable
//! voltage contract alive by periodic re-requests.
//!
//! The USB PD protocol engine itself is not part of this crate. It is accessed through the
//! [`ProtocolEngine`] trait.
#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]

// This must go first, so that all other modules see its macros.
mod fmt;

#[macro_use]
extern crate uom;

pub mod config;
pub mod convert;
pub mod message;
pub mod sink;
pub mod timers;

#[cfg(test)]
mod dummy;

pub use usbpd_pps_traits::{ProtocolEngine, RequestKind, SinkStatus, SpecificationRevision, SubmitError};

/// Quantities with integer storage, based on millivolts, milliamperes and microwatts.
#[allow(missing_docs)]
pub mod units {
    ISQ!(
        uom::si,
        u32,
        (millimeter, kilogram, second, milliampere, kelvin, mole, candela)
    );
}

#[allow(missing_docs)]
pub mod _20millivolts_mod {
    unit! {
        system: uom::si;
        quantity: uom::si::electric_potential;

        @_20millivolts: 0.02; "_20mV", "_20millivolts", "_20millivolts";
    }
}

#[allow(missing_docs)]
pub mod _25millivolts_mod {
    unit! {
        system: uom::si;
        quantity: uom::si::electric_potential;

        @_25millivolts: 0.025; "_25mV", "_25millivolts", "_25millivolts";
    }
}

#[allow(missing_docs)]
pub mod _50millivolts_mod {
    unit! {
        system: uom::si;
        quantity: uom::si::electric_potential;

        @_50millivolts: 0.05; "_50mV", "_50millivolts", "_50millivolts";
    }
}

#[allow(missing_docs)]
pub mod _50milliamperes_mod {
    unit! {
        system: uom::si;
        quantity: uom::si::electric_current;

        @_50milliamperes: 0.05; "_50mA", "_50milliamperes", "_50milliamperes";
    }
}

#[allow(missing_docs)]
pub mod _250milliwatts_mod {
    unit! {
        system: uom::si;
        quantity: uom::si::power;

        @_250milliwatts: 0.25; "_250mW", "_250milliwatts", "_250milliwatts";
    }
}

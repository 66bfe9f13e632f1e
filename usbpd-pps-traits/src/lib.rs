//! USB PD programmable power sink traits.
//!
//! Provides the interface that a USB PD protocol engine exposes to the contract negotiation logic.
//! The engine owns framing, retries and the attach state machine; the sink logic only reads the
//! current capability lists and hands over encoded request objects.
#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]

/// The specification revision that was negotiated with the port partner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SpecificationRevision {
    /// Version 1.0.
    R1_0,
    /// Version 2.0.
    R2_0,
    /// Version 3.x.
    R3_X,
}

/// The kind of request message to submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RequestKind {
    /// A standard `Request` with a single request data object.
    Request,
    /// An `EPR_Request`, carrying the request data object and a copy of the selected source PDO.
    EprRequest,
}

/// Local sink status that is mirrored into request data objects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SinkStatus {
    /// The sink does not require USB suspend.
    pub no_usb_suspend: bool,
    /// The sink has USB communications capability.
    pub usb_communications_capable: bool,
}

/// Submission Error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SubmitError {
    /// Another message sequence is in progress.
    Busy,
    /// No explicit contract, or the port partner is not attached.
    NotReady,
    /// The request could not be delivered.
    Failed,
}

/// Protocol engine trait, through which the sink logic reads capabilities and submits requests.
pub trait ProtocolEngine {
    /// Raw sink power data objects in the standard power range (up to 7).
    fn sink_capabilities(&self) -> &[u32];

    /// Raw sink power data objects in the extended power range.
    ///
    /// Only consulted while EPR mode is active.
    fn epr_sink_capabilities(&self) -> &[u32] {
        &[]
    }

    /// Raw power data objects, as advertised by the port partner.
    ///
    /// In EPR mode, positions 1..=7 hold the (zero-padded) SPR objects, EPR objects start at position 8.
    fn source_capabilities(&self) -> &[u32];

    /// The specification revision in use on SOP.
    fn specification_revision(&self) -> SpecificationRevision;

    /// Whether EPR mode is currently active.
    fn epr_active(&self) -> bool {
        false
    }

    /// Whether the sink advertises EPR mode capability.
    fn epr_sink_enabled(&self) -> bool {
        false
    }

    /// Current local sink status.
    fn sink_status(&self) -> SinkStatus;

    /// Submit a request message to the port partner.
    ///
    /// `data_objects` holds one word for [`RequestKind::Request`], and two for [`RequestKind::EprRequest`].
    fn submit_request(&mut self, kind: RequestKind, data_objects: &[u32]) -> Result<(), SubmitError>;
}

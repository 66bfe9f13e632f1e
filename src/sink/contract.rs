//! Negotiation of contracts with the port partner.
//!
//! A negotiation validates the request against the local sink capabilities, selects a suitable source PDO,
//! and submits the encoded request to the protocol engine. The [`ContractState`] of the port is only
//! updated after a successful submission.
use super::builder::{NegotiationContext, build_request};
use super::selector::select_source_pdo;
use super::validator::is_request_valid;
use super::{Error, SupplyType};
use crate::ProtocolEngine;
use crate::convert::{current_to_raw, voltage_to_raw};
use crate::message::request::Request;
use crate::message::sink_capabilities::SinkCapabilities;
use crate::message::source_capabilities::SourceCapabilities;
use crate::units::{ElectricCurrent, ElectricPotential};

/// The result of a negotiation that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Outcome {
    /// The request was submitted to the protocol engine.
    Requested(Request),
    /// The voltage did not change, and the supply type does not need re-requests.
    Unchanged,
}

/// Contract state of a single port.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ContractState {
    /// The voltage of the last successfully submitted request.
    pub last_requested_voltage: Option<ElectricPotential>,
    /// The maximum voltage of the programmable power supply that was last requested from.
    ///
    /// Serves as the ceiling for voltage adjustments.
    pub max_adjustable_voltage: Option<ElectricPotential>,
    /// The minimum voltage of the programmable power supply that was last requested from.
    ///
    /// Serves as the floor for voltage adjustments.
    pub min_adjustable_voltage: Option<ElectricPotential>,
}

impl ContractState {
    /// Create an empty contract state.
    pub const fn new() -> Self {
        Self {
            last_requested_voltage: None,
            max_adjustable_voltage: None,
            min_adjustable_voltage: None,
        }
    }

    /// Forget all cached values, e.g. after the port partner was detached.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Whether a new request is required for the given voltage and supply type.
    ///
    /// Adjustable contracts are re-requested even if the voltage is unchanged, otherwise the source
    /// falls back to a default voltage.
    pub fn needs_request(&self, supply_type: SupplyType, voltage: ElectricPotential) -> bool {
        supply_type.is_adjustable() || self.last_requested_voltage != Some(voltage)
    }

    /// Negotiate a contract at the given voltage and current.
    ///
    /// The contract state is left untouched on failure.
    pub fn negotiate<E: ProtocolEngine>(
        &mut self,
        engine: &mut E,
        supply_type: SupplyType,
        voltage: ElectricPotential,
        current: ElectricCurrent,
    ) -> Result<Outcome, Error> {
        if !self.needs_request(supply_type, voltage) {
            trace!("Voltage unchanged, skip request");
            return Ok(Outcome::Unchanged);
        }

        let raw_voltage = voltage_to_raw(voltage);
        let raw_current = current_to_raw(current);
        debug!(
            "Negotiate {:?}: {} x 50 mV at {} x 10 mA",
            supply_type, raw_voltage, raw_current
        );

        let epr_active = engine.epr_active();

        let sink_capabilities = SinkCapabilities::from_raw(engine.sink_capabilities(), engine.epr_sink_capabilities())
            .map_err(|_e| {
                warn!("Invalid sink capabilities: {:?}", _e);
                Error::Validation
            })?;

        if !is_request_valid(&sink_capabilities, epr_active, raw_voltage, raw_current) {
            debug!("Request is not covered by sink capabilities");
            return Err(Error::Validation);
        }

        let source_capabilities = SourceCapabilities::from_raw(engine.source_capabilities()).map_err(|_e| {
            warn!("Invalid source capabilities: {:?}", _e);
            Error::Selection
        })?;

        let Some(selection) = select_source_pdo(&source_capabilities, supply_type, raw_voltage, raw_current) else {
            debug!("Request is not covered by source capabilities");
            return Err(Error::Selection);
        };
        trace!("Selected object position {}", selection.position);

        let context = NegotiationContext {
            revision: engine.specification_revision(),
            epr_active,
            epr_sink_enabled: engine.epr_sink_enabled(),
        };

        let request = source_capabilities
            .pdo_at_object_position(selection.position)
            .and_then(|pdo| {
                build_request(
                    selection.position,
                    pdo,
                    raw_voltage,
                    raw_current,
                    engine.sink_status(),
                    context,
                )
            })
            .ok_or(Error::Selection)?;

        engine
            .submit_request(request.kind(), &request.data_objects())
            .inspect_err(|_e| warn!("Request submission failed: {:?}", _e))?;

        self.last_requested_voltage = Some(voltage);
        if selection.adjustable_max_voltage.is_some() {
            self.max_adjustable_voltage = selection.adjustable_max_voltage;
            self.min_adjustable_voltage = selection.adjustable_min_voltage;
        }

        Ok(Outcome::Requested(request))
    }
}

//! Encoding of request data objects for a selected source PDO.
use crate::convert::{raw_power, raw_to_20_millivolts, raw_to_25_millivolts, raw_to_50_milliamperes};
use crate::message::request::{Avs, Battery, FixedVariableSupply, Pps, RawDataObject, Request, RequestDataObject};
use crate::message::source_capabilities::{Augmented, PowerDataObject};
use crate::{SinkStatus, SpecificationRevision};

/// Largest value of the 10 bit current and power fields.
const MAX_RAW_FIELD: u16 = 0x3ff;

/// Largest value of the 7 bit augmented current field.
const MAX_RAW_AUGMENTED_CURRENT: u16 = 0x7f;

/// Largest value of the 12 bit augmented output voltage field.
const MAX_RAW_OUTPUT_VOLTAGE: u16 = 0xfff;

/// Properties of the current negotiation that affect the request encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NegotiationContext {
    /// The specification revision in use.
    pub revision: SpecificationRevision,
    /// Whether EPR mode is active.
    pub epr_active: bool,
    /// Whether the sink advertises EPR mode capability.
    pub epr_sink_enabled: bool,
}

fn clamp_field(value: u32, max: u16, name: &str) -> u16 {
    match u16::try_from(value) {
        Ok(value) if value <= max => value,
        _ => {
            error!("Clamping invalid {}: {}", name, value);
            max
        }
    }
}

/// Build a request for the PDO at `object_position`.
///
/// Voltage is in 50 mV units, current in 10 mA units. Returns `None` for PDOs of unknown type.
pub fn build_request(
    object_position: u8,
    pdo: &PowerDataObject,
    raw_voltage: u16,
    raw_current: u16,
    sink_status: SinkStatus,
    context: NegotiationContext,
) -> Option<Request> {
    let epr = cfg!(feature = "epr");
    let revision_3 = context.revision >= SpecificationRevision::R3_X;

    let common = RawDataObject(0)
        .with_object_position(object_position)
        .with_giveback_flag(false)
        .with_capability_mismatch(false)
        .with_no_usb_suspend(sink_status.no_usb_suspend)
        .with_usb_communications_capable(sink_status.usb_communications_capable)
        .with_unchunked_extended_messages_supported(revision_3)
        .with_epr_mode_capable(epr && revision_3 && context.epr_sink_enabled);

    let rdo = match pdo {
        PowerDataObject::FixedSupply(_) | PowerDataObject::VariableSupply(_) => {
            let current = clamp_field(raw_current.into(), MAX_RAW_FIELD, "current");

            RequestDataObject::FixedVariableSupply(
                FixedVariableSupply(common.0)
                    .with_raw_operating_current(current)
                    .with_raw_max_operating_current(current),
            )
        }
        PowerDataObject::Battery(_) => {
            let power = clamp_field(raw_power(raw_voltage, raw_current), MAX_RAW_FIELD, "power");

            RequestDataObject::Battery(
                Battery(common.0)
                    .with_raw_operating_power(power)
                    .with_raw_max_operating_power(power),
            )
        }
        PowerDataObject::Augmented(Augmented::EprAvs(_) | Augmented::SprAvs(_)) => RequestDataObject::Avs(
            Avs(common.0)
                .with_raw_output_voltage(clamp_field(
                    raw_to_25_millivolts(raw_voltage),
                    MAX_RAW_OUTPUT_VOLTAGE,
                    "output voltage",
                ))
                .with_raw_operating_current(clamp_field(
                    raw_to_50_milliamperes(raw_current).into(),
                    MAX_RAW_AUGMENTED_CURRENT,
                    "current",
                )),
        ),
        PowerDataObject::Augmented(Augmented::Pps(_)) => RequestDataObject::Pps(
            Pps(common.0)
                .with_raw_output_voltage(clamp_field(
                    raw_to_20_millivolts(raw_voltage),
                    MAX_RAW_OUTPUT_VOLTAGE,
                    "output voltage",
                ))
                .with_raw_operating_current(clamp_field(
                    raw_to_50_milliamperes(raw_current).into(),
                    MAX_RAW_AUGMENTED_CURRENT,
                    "current",
                )),
        ),
        PowerDataObject::Augmented(Augmented::Unknown(_)) => return None,
    };

    Some(if epr && context.epr_active {
        Request::Epr { rdo, pdo: pdo.to_raw() }
    } else {
        Request::Standard(rdo)
    })
}

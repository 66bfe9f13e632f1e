//! Implements a dummy protocol engine and timer for testing.
use std::cell::RefCell;
use std::collections::VecDeque;
use std::future::poll_fn;
use std::rc::Rc;
use std::task::Poll;
use std::vec::Vec;

use crate::message::sink_capabilities::SinkCapabilities;
use crate::message::source_capabilities::{
    Augmented, FixedSupply, PowerDataObject, SourceCapabilities, SprProgrammablePowerSupply,
};
use crate::timers::Timer;
use crate::{ProtocolEngine, RequestKind, SinkStatus, SpecificationRevision, SubmitError};

/// A request that was submitted to the dummy engine.
pub type Submission = (RequestKind, Vec<u32>);

/// A shared log of submitted requests.
pub type SubmissionLog = Rc<RefCell<Vec<Submission>>>;

/// A dummy timer for testing.
///
/// Expires on the next poll, regardless of the duration.
pub struct DummyTimer {}

impl Timer for DummyTimer {
    async fn after_millis(_milliseconds: u64) {
        tokio::task::yield_now().await
    }
}

/// A dummy protocol engine for testing.
///
/// Serves fixed capability lists, and records all submitted requests.
pub struct DummyEngine {
    sink_capabilities: Vec<u32>,
    epr_sink_capabilities: Vec<u32>,
    source_capabilities: Vec<u32>,
    revision: SpecificationRevision,
    epr_active: bool,
    epr_sink_enabled: bool,
    sink_status: SinkStatus,
    failures: VecDeque<SubmitError>,
    log: SubmissionLog,
}

impl DummyEngine {
    /// Create a new dummy engine with the given sink capabilities.
    ///
    /// The source offers the `DUMMY_CAPABILITIES`.
    pub fn new(sink_capabilities: &[u32]) -> Self {
        Self {
            sink_capabilities: sink_capabilities.to_vec(),
            epr_sink_capabilities: Vec::new(),
            source_capabilities: get_dummy_source_capabilities().pdos().iter().map(|pdo| pdo.to_raw()).collect(),
            revision: SpecificationRevision::R3_X,
            epr_active: false,
            epr_sink_enabled: false,
            sink_status: SinkStatus::default(),
            failures: VecDeque::new(),
            log: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Replace the source capabilities.
    pub fn with_source_capabilities(mut self, source_capabilities: &[u32]) -> Self {
        self.source_capabilities = source_capabilities.to_vec();
        self
    }

    /// Set the EPR sink capabilities.
    pub fn with_epr_sink_capabilities(mut self, epr_sink_capabilities: &[u32]) -> Self {
        self.epr_sink_capabilities = epr_sink_capabilities.to_vec();
        self
    }

    /// Set whether EPR mode is active.
    pub fn with_epr_active(mut self, epr_active: bool) -> Self {
        self.epr_active = epr_active;
        self
    }

    /// Set whether the sink advertises EPR mode capability.
    pub fn with_epr_sink_enabled(mut self, epr_sink_enabled: bool) -> Self {
        self.epr_sink_enabled = epr_sink_enabled;
        self
    }

    /// Let the next submission fail with `error`.
    ///
    /// Failures queue up, if called repeatedly.
    pub fn fail_next_submission(&mut self, error: SubmitError) {
        self.failures.push_back(error);
    }

    /// All requests that were submitted so far.
    pub fn submitted(&self) -> Vec<Submission> {
        self.log.borrow().clone()
    }

    /// Probe the oldest submitted request, and remove it.
    pub fn probe_submitted_request(&mut self) -> Submission {
        self.log.borrow_mut().remove(0)
    }

    /// A handle to the submission log, that stays readable while the engine is borrowed.
    pub fn submission_log(&self) -> SubmissionLog {
        self.log.clone()
    }
}

impl ProtocolEngine for DummyEngine {
    fn sink_capabilities(&self) -> &[u32] {
        &self.sink_capabilities
    }

    fn epr_sink_capabilities(&self) -> &[u32] {
        &self.epr_sink_capabilities
    }

    fn source_capabilities(&self) -> &[u32] {
        &self.source_capabilities
    }

    fn specification_revision(&self) -> SpecificationRevision {
        self.revision
    }

    fn epr_active(&self) -> bool {
        self.epr_active
    }

    fn epr_sink_enabled(&self) -> bool {
        self.epr_sink_enabled
    }

    fn sink_status(&self) -> SinkStatus {
        self.sink_status
    }

    fn submit_request(&mut self, kind: RequestKind, data_objects: &[u32]) -> Result<(), SubmitError> {
        if let Some(error) = self.failures.pop_front() {
            return Err(error);
        }

        self.log.borrow_mut().push((kind, data_objects.to_vec()));
        Ok(())
    }
}

/// Resolves as soon as `log` holds at least `count` submissions.
pub async fn submissions_reach(log: &SubmissionLog, count: usize) {
    poll_fn(|cx| {
        if log.borrow().len() >= count {
            Poll::Ready(())
        } else {
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    })
    .await
}

/// Build sink capabilities from raw standard power range PDOs.
pub fn sink_capabilities(spr: &[u32]) -> SinkCapabilities {
    sink_capabilities_with_epr(spr, &[])
}

/// Build sink capabilities from raw standard and extended power range PDOs.
pub fn sink_capabilities_with_epr(spr: &[u32], epr: &[u32]) -> SinkCapabilities {
    SinkCapabilities::from_raw(spr, epr).unwrap()
}

/// Build source capabilities from raw PDOs.
pub fn source_capabilities(raw: &[u32]) -> SourceCapabilities {
    SourceCapabilities::from_raw(raw).unwrap()
}

/// Dummy capabilities to deserialize.
///
/// - Fixed 5 V at 3 A
/// - Fixed 9 V at 3 A
/// - Fixed 15 V at 3 A
/// - Fixed 20 V at 2.25 A
/// - PPS 3.3-11 V at 5 A
/// - PPS 3.3-16 V at 3 A
/// - PPS 3.3-21 V at 2.25 A
pub const DUMMY_CAPABILITIES: [u8; 28] = [
    0x2c, // +
    0x91, // | Fixed 5V @ 3A
    0x01, // |
    0x08, // +
    0x2c, // +
    0xD1, // |
    0x02, // | Fixed 9V @ 3A
    0x00, // +
    0x2C, // +
    0xB1, // |
    0x04, // | Fixed 15V @ 3A
    0x00, // +
    0xE1, // +
    0x40, // |
    0x06, // | Fixed 20V @ 2.25A
    0x00, // +
    0x64, // +
    0x21, // |
    0xDC, // | PPS 3.3-11V @ 5A
    0xC8, // +
    0x3C, // +
    0x21, // |
    0x40, // | PPS 3.3-16V @ 3A
    0xC9, // +
    0x2D, // +
    0x21, // |
    0xA4, // | PPS 3.3-21V @ 2.25A
    0xC9, // +
];

/// Get dummy source capabilities for testing.
///
/// Corresponds to the `DUMMY_CAPABILITIES` above.
pub fn get_dummy_source_capabilities() -> SourceCapabilities {
    let mut pdos: heapless::Vec<PowerDataObject, 16> = heapless::Vec::new();
    pdos.push(PowerDataObject::FixedSupply(
        FixedSupply::default()
            .with_raw_voltage(100)
            .with_raw_max_current(300)
            .with_unconstrained_power(true),
    ))
    .unwrap();

    pdos.push(PowerDataObject::FixedSupply(
        FixedSupply::default().with_raw_voltage(180).with_raw_max_current(300),
    ))
    .unwrap();

    pdos.push(PowerDataObject::FixedSupply(
        FixedSupply::default().with_raw_voltage(300).with_raw_max_current(300),
    ))
    .unwrap();

    pdos.push(PowerDataObject::FixedSupply(
        FixedSupply::default().with_raw_voltage(400).with_raw_max_current(225),
    ))
    .unwrap();

    pdos.push(PowerDataObject::Augmented(Augmented::Pps(
        SprProgrammablePowerSupply::default()
            .with_raw_max_current(100)
            .with_raw_min_voltage(33)
            .with_raw_max_voltage(110)
            .with_pps_power_limited(true),
    )))
    .unwrap();

    pdos.push(PowerDataObject::Augmented(Augmented::Pps(
        SprProgrammablePowerSupply::default()
            .with_raw_max_current(60)
            .with_raw_min_voltage(33)
            .with_raw_max_voltage(160)
            .with_pps_power_limited(true),
    )))
    .unwrap();

    pdos.push(PowerDataObject::Augmented(Augmented::Pps(
        SprProgrammablePowerSupply::default()
            .with_raw_max_current(45)
            .with_raw_min_voltage(33)
            .with_raw_max_voltage(210)
            .with_pps_power_limited(true),
    )))
    .unwrap();

    SourceCapabilities(pdos)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submit() {
        let mut engine = DummyEngine::new(&[]);
        assert_eq!(engine.source_capabilities().len(), 7);

        engine.fail_next_submission(SubmitError::Failed);
        assert_eq!(
            engine.submit_request(RequestKind::Request, &[1]),
            Err(SubmitError::Failed)
        );

        engine.submit_request(RequestKind::EprRequest, &[2, 3]).unwrap();
        assert_eq!(engine.submitted(), [(RequestKind::EprRequest, std::vec![2, 3])]);

        assert_eq!(engine.probe_submitted_request(), (RequestKind::EprRequest, std::vec![2, 3]));
        assert!(engine.submitted().is_empty());
    }
}

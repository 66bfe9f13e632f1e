//! Periodic maintenance of adjustable voltage contracts.
//!
//! Programmable power supplies fall back to a default voltage, unless the sink re-requests its contract
//! periodically. The maintenance task repeats negotiations at a fixed period, and exercises the
//! adjustable range with a voltage pattern that is given by an [`ExercisePolicy`].
use core::future::Future;
use core::marker::PhantomData;
use core::sync::atomic::{AtomicBool, Ordering};

use embassy_futures::select::{Either, select};
use uom::si::electric_potential::millivolt;

use super::contract::{ContractState, Outcome};
use super::Error;
use crate::ProtocolEngine;
use crate::config::Config;
use crate::timers::{Timer, TimerType};
use crate::units::ElectricPotential;

/// Chooses the voltage of the next maintenance request.
pub trait ExercisePolicy {
    /// The voltage to request on the next tick.
    ///
    /// `state` holds the ceiling that was advertised by the source, if any.
    fn next_voltage(&mut self, state: &ContractState, config: &Config) -> ElectricPotential;

    /// Start over, e.g. after the port partner was detached.
    fn reset(&mut self);
}

/// A sawtooth from the baseline voltage up to the ceiling.
///
/// Requests the baseline voltage until a ceiling is known. Afterwards, every tick adds one step. A voltage
/// above the ceiling is never requested, the ramp restarts at the baseline instead.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Ramp {
    voltage: Option<ElectricPotential>,
}

impl Ramp {
    /// Create a new ramp.
    pub const fn new() -> Self {
        Self { voltage: None }
    }
}

impl ExercisePolicy for Ramp {
    fn next_voltage(&mut self, state: &ContractState, config: &Config) -> ElectricPotential {
        let voltage = match (state.max_adjustable_voltage, self.voltage) {
            (Some(ceiling), Some(voltage)) => {
                let next = voltage + config.step;

                if next > ceiling { config.baseline_voltage } else { next }
            }
            _ => config.baseline_voltage,
        };

        self.voltage = Some(voltage);
        voltage
    }

    fn reset(&mut self) {
        self.voltage = None;
    }
}

/// A triangle between the floor and the ceiling of the adjustable supply.
///
/// Starts at the baseline voltage, which is also the floor while the minimum voltage of the supply is unknown.
/// Steps up until the ceiling is reached, then down until the floor is reached. Steps are clamped to the
/// range, so both ends are requested exactly once per turn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sweep {
    voltage: Option<ElectricPotential>,
    rising: bool,
}

impl Default for Sweep {
    fn default() -> Self {
        Self::new()
    }
}

impl Sweep {
    /// Create a new sweep, starting upwards.
    pub const fn new() -> Self {
        Self {
            voltage: None,
            rising: true,
        }
    }

    /// Whether the sweep currently steps upwards.
    pub fn rising(&self) -> bool {
        self.rising
    }
}

impl ExercisePolicy for Sweep {
    fn next_voltage(&mut self, state: &ContractState, config: &Config) -> ElectricPotential {
        let floor = state.min_adjustable_voltage.unwrap_or(config.baseline_voltage);

        let voltage = match (state.max_adjustable_voltage, self.voltage) {
            (Some(ceiling), Some(voltage)) if ceiling > floor => {
                if self.rising && voltage >= ceiling {
                    self.rising = false;
                } else if !self.rising && voltage <= floor {
                    self.rising = true;
                }

                if self.rising {
                    let next = voltage + config.step;
                    if next > ceiling { ceiling } else { next }
                } else if voltage > floor + config.step {
                    voltage - config.step
                } else {
                    floor
                }
            }
            _ => config.baseline_voltage,
        };

        self.voltage = Some(voltage);
        voltage
    }

    fn reset(&mut self) {
        *self = Self::new();
    }
}

/// Stops a running maintenance task.
///
/// Can be placed in a `static`, and raised from another task.
#[derive(Debug, Default)]
pub struct StopSignal {
    raised: AtomicBool,
}

impl StopSignal {
    /// Create a new signal that is not raised.
    pub const fn new() -> Self {
        Self {
            raised: AtomicBool::new(false),
        }
    }

    /// Request the task to stop.
    ///
    /// The task stops before its next request.
    pub fn raise(&self) {
        self.raised.store(true, Ordering::Release);
    }

    /// Allow the task to run again.
    pub fn clear(&self) {
        self.raised.store(false, Ordering::Release);
    }

    /// Whether a stop was requested.
    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::Acquire)
    }
}

/// Maintenance task for the contract of a single port.
#[derive(Debug)]
pub struct Maintenance<TIMER: Timer, P: ExercisePolicy> {
    state: ContractState,
    policy: P,
    config: Config,

    _timer: PhantomData<TIMER>,
}

impl<TIMER: Timer, P: ExercisePolicy> Maintenance<TIMER, P> {
    /// Create a new maintenance task with an empty contract state.
    pub fn new(policy: P, config: Config) -> Self {
        Self {
            state: ContractState::new(),
            policy,
            config,
            _timer: PhantomData,
        }
    }

    /// The contract state of the port.
    pub fn state(&self) -> &ContractState {
        &self.state
    }

    /// The exercise policy.
    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// The configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Forget the contract state and restart the policy.
    pub fn reset(&mut self) {
        self.state.reset();
        self.policy.reset();
    }

    /// Perform a single maintenance request.
    ///
    /// Failures are reported, but leave the task operational. The next tick retries.
    pub fn tick<E: ProtocolEngine>(&mut self, engine: &mut E) -> Result<Outcome, Error> {
        let voltage = self.policy.next_voltage(&self.state, &self.config);
        info!("Maintenance request at {} mV", voltage.get::<millivolt>());

        let result = self
            .state
            .negotiate(engine, self.config.supply_type, voltage, self.config.default_current);

        if let Err(_e) = &result {
            debug!("Maintenance request failed: {:?}", _e);
        }

        result
    }

    /// Run maintenance until `stop` is raised.
    ///
    /// Waits for the start delay once, then requests periodically.
    pub async fn run<E: ProtocolEngine>(&mut self, engine: &mut E, stop: &StopSignal) {
        TimerType::new::<TIMER>(TimerType::MaintenanceStart, &self.config).await;

        while !stop.is_raised() {
            let _ = self.tick(engine);
            TimerType::new::<TIMER>(TimerType::MaintenancePeriod, &self.config).await;
        }

        trace!("Maintenance stopped");
    }

    /// Run maintenance until the `stop` future resolves, e.g. on detach.
    ///
    /// Returns the output of `stop`.
    pub async fn run_until<E: ProtocolEngine, F: Future>(&mut self, engine: &mut E, stop: F) -> F::Output {
        let never = StopSignal::new();

        match select(self.run(engine, &never), stop).await {
            Either::First(()) => core::future::pending().await,
            Either::Second(output) => output,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::vec::Vec;

    use embassy_futures::join::join;
    use uom::si::electric_current::milliampere;

    use super::*;
    use crate::SubmitError;
    use crate::dummy::{DummyEngine, DummyTimer, submissions_reach};
    use crate::message::request::{Request, RequestDataObject};
    use crate::message::sink_capabilities::{SinkFixedSupply, SinkProgrammablePowerSupply};
    use crate::message::source_capabilities::{FixedSupply, SprProgrammablePowerSupply};
    use crate::units::ElectricCurrent;

    fn millivolts(voltage: u32) -> ElectricPotential {
        ElectricPotential::new::<millivolt>(voltage)
    }

    fn with_ceiling(voltage: u32) -> ContractState {
        ContractState {
            last_requested_voltage: None,
            max_adjustable_voltage: Some(millivolts(voltage)),
            min_adjustable_voltage: None,
        }
    }

    /// A sink and source with a single 3.3-11 V PPS.
    fn pps_11v_engine() -> DummyEngine {
        let pps = SprProgrammablePowerSupply::default()
            .with_raw_min_voltage(33)
            .with_raw_max_voltage(110)
            .with_raw_max_current(60);

        DummyEngine::new(&[
            SinkFixedSupply::new(100, 300).0,
            SinkProgrammablePowerSupply::new(33, 210, 60).0,
        ])
        .with_source_capabilities(&[
            FixedSupply::default().with_raw_voltage(100).with_raw_max_current(300).0,
            pps.0,
        ])
    }

    fn pps_voltage(request: &Request) -> u32 {
        let RequestDataObject::Pps(rdo) = request.rdo() else {
            panic!("Expected a PPS request");
        };
        rdo.output_voltage().get::<millivolt>()
    }

    #[test]
    fn test_ramp_sequence() {
        let config = Config::default();
        let mut ramp = Ramp::new();

        // No ceiling is known yet.
        assert_eq!(ramp.next_voltage(&ContractState::new(), &config), millivolts(5000));
        assert_eq!(ramp.next_voltage(&ContractState::new(), &config), millivolts(5000));

        let state = with_ceiling(11000);
        let mut sequence = Vec::new();
        for _ in 0..62 {
            sequence.push(ramp.next_voltage(&state, &config).get::<millivolt>());
        }

        let expected: Vec<u32> = (5100..=11000).step_by(100).chain([5000, 5100]).collect();
        assert_eq!(sequence, expected);
    }

    #[test]
    fn test_sweep_sequence() {
        let config = Config::default();
        let mut sweep = Sweep::new();
        let state = with_ceiling(5350);

        let mut sequence = Vec::new();
        for _ in 0..10 {
            sequence.push(sweep.next_voltage(&state, &config).get::<millivolt>());
        }

        assert_eq!(
            sequence,
            [5000, 5100, 5200, 5300, 5350, 5250, 5150, 5050, 5000, 5100]
        );
        assert!(sweep.rising());

        // A ceiling below the baseline holds the baseline.
        sweep.reset();
        for _ in 0..3 {
            assert_eq!(sweep.next_voltage(&with_ceiling(4000), &config), millivolts(5000));
        }
    }

    #[test]
    fn test_sweep_ticks_down_to_supply_minimum() {
        let pps = SprProgrammablePowerSupply::default()
            .with_raw_min_voltage(33)
            .with_raw_max_voltage(55)
            .with_raw_max_current(60);
        let mut engine = DummyEngine::new(&[
            SinkFixedSupply::new(100, 300).0,
            SinkProgrammablePowerSupply::new(33, 210, 60).0,
        ])
        .with_source_capabilities(&[
            FixedSupply::default().with_raw_voltage(100).with_raw_max_current(300).0,
            pps.0,
        ]);
        let mut maintenance: Maintenance<DummyTimer, _> = Maintenance::new(Sweep::new(), Config::default());

        let mut voltages = Vec::new();
        for _ in 0..30 {
            let Ok(Outcome::Requested(request)) = maintenance.tick(&mut engine) else {
                panic!("Expected a request");
            };
            voltages.push(pps_voltage(&request));
        }

        // Starts at the baseline, then turns at 5.5 V and at 3.3 V.
        let expected: Vec<u32> = (5000..=5500)
            .step_by(100)
            .chain((3300..=5400).rev().step_by(100))
            .chain([3400, 3500])
            .collect();
        assert_eq!(voltages, expected);
        assert_eq!(maintenance.state().min_adjustable_voltage, Some(millivolts(3300)));
        assert_eq!(maintenance.state().max_adjustable_voltage, Some(millivolts(5500)));
        assert!(maintenance.policy().rising());
    }

    #[test]
    fn test_ramp_ticks() {
        let mut engine = pps_11v_engine();
        let mut maintenance: Maintenance<DummyTimer, _> = Maintenance::new(Ramp::new(), Config::default());

        let mut voltages = Vec::new();
        for _ in 0..62 {
            let Ok(Outcome::Requested(request)) = maintenance.tick(&mut engine) else {
                panic!("Expected a request");
            };
            voltages.push(pps_voltage(&request));
        }

        // The first request learns the ceiling of 11 V.
        let expected: Vec<u32> = (5000..=11000).step_by(100).chain([5000]).collect();
        assert_eq!(voltages, expected);
        assert_eq!(maintenance.state().max_adjustable_voltage, Some(millivolts(11000)));
        assert_eq!(engine.submitted().len(), 62);
    }

    #[test]
    fn test_tick_tolerates_failures() {
        let mut engine = pps_11v_engine();
        let mut maintenance: Maintenance<DummyTimer, _> = Maintenance::new(Ramp::new(), Config::default());

        engine.fail_next_submission(SubmitError::NotReady);
        assert_eq!(
            maintenance.tick(&mut engine),
            Err(Error::Submission(SubmitError::NotReady))
        );
        assert_eq!(*maintenance.state(), ContractState::new());

        assert!(matches!(maintenance.tick(&mut engine), Ok(Outcome::Requested(_))));
        assert_eq!(maintenance.state().last_requested_voltage, Some(millivolts(5000)));

        // 3.5 A is not covered by the sink, but later ticks go on.
        let config = Config::default().with_default_current(ElectricCurrent::new::<milliampere>(3500));
        let mut maintenance: Maintenance<DummyTimer, _> = Maintenance::new(Ramp::new(), config);
        assert_eq!(maintenance.tick(&mut engine), Err(Error::Validation));
        assert_eq!(maintenance.tick(&mut engine), Err(Error::Validation));

        maintenance.reset();
        assert_eq!(*maintenance.state(), ContractState::new());
        assert_eq!(*maintenance.policy(), Ramp::new());
    }

    #[tokio::test]
    async fn test_run_until_stop_signal() {
        static STOP: StopSignal = StopSignal::new();

        let mut engine = pps_11v_engine();
        let log = engine.submission_log();
        let mut maintenance: Maintenance<DummyTimer, _> = Maintenance::new(Ramp::new(), Config::default());

        join(maintenance.run(&mut engine, &STOP), async {
            submissions_reach(&log, 3).await;
            STOP.raise();
        })
        .await;

        assert!(STOP.is_raised());
        assert_eq!(engine.submitted().len(), 3);
        assert_eq!(maintenance.state().last_requested_voltage, Some(millivolts(5200)));

        // A raised signal prevents any request.
        let mut maintenance: Maintenance<DummyTimer, _> = Maintenance::new(Sweep::new(), Config::default());
        maintenance.run(&mut engine, &STOP).await;
        assert_eq!(engine.submitted().len(), 3);
        STOP.clear();
    }

    #[tokio::test]
    async fn test_run_until_detached() {
        let mut engine = pps_11v_engine();
        let log = engine.submission_log();
        let mut maintenance: Maintenance<DummyTimer, _> = Maintenance::new(Sweep::new(), Config::default());

        let detached = async {
            submissions_reach(&log, 4).await;
            "detached"
        };
        assert_eq!(maintenance.run_until(&mut engine, detached).await, "detached");

        let voltages: Vec<u32> = engine
            .submitted()
            .iter()
            .map(|(_, data_objects)| {
                let rdo = crate::message::request::Pps(data_objects[0]);
                rdo.output_voltage().get::<millivolt>()
            })
            .collect();
        assert_eq!(voltages, [5000, 5100, 5200, 5300]);
    }
}

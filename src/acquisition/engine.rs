use statig::blocking::IntoStateMachineExt as _;

use super::{
    machine::{AcquisitionMachine, TickEffects, TickInput},
    shared::{AcquisitionShared, AcquisitionState},
    Sample,
};

/// One scalar reading per call. Implementations must not block beyond the
/// conversion itself; the engine calls this from the tick context.
pub trait SampleSource {
    fn read(&mut self) -> Sample;
}

/// The states observed around one tick, for logging and counters at the
/// call site.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickSummary {
    pub before: AcquisitionState,
    pub after: AcquisitionState,
}

impl TickSummary {
    pub fn armed(self) -> bool {
        self.before == AcquisitionState::Idle && self.after == AcquisitionState::Arming
    }

    pub fn triggered(self) -> bool {
        self.before == AcquisitionState::Arming && self.after == AcquisitionState::Capturing
    }

    pub fn completed(self) -> bool {
        self.before == AcquisitionState::Capturing && self.after == AcquisitionState::Idle
    }
}

/// Tick-context owner of the acquisition state machine.
///
/// Exactly one engine drives a given shared store; the foreground goes
/// through the store's control surface and never through the engine. Every
/// tick is O(1): at most one sample read, a machine dispatch and a handful
/// of atomic stores.
pub struct AcquisitionEngine<'a, const PRE: usize, const CAP: usize> {
    shared: &'a AcquisitionShared<PRE, CAP>,
    machine: statig::blocking::StateMachine<AcquisitionMachine>,
}

impl<'a, const PRE: usize, const CAP: usize> AcquisitionEngine<'a, PRE, CAP> {
    pub fn new(shared: &'a AcquisitionShared<PRE, CAP>) -> Self {
        let machine = AcquisitionMachine::default().state_machine();
        shared.publish_state(machine.inner().published);
        Self { shared, machine }
    }

    pub fn state(&self) -> AcquisitionState {
        self.machine.inner().published
    }

    /// Runs one tick. The source is read only in `Arming`, and in
    /// `Capturing` while the record still has room; `Idle` ticks and the
    /// completion tick never touch it.
    pub fn tick(&mut self, source: &mut impl SampleSource) -> TickSummary {
        let before = self.state();
        let capture_full = self.shared.capture_complete();
        let sample = match before {
            AcquisitionState::Idle => None,
            AcquisitionState::Arming => Some(source.read()),
            AcquisitionState::Capturing if capture_full => None,
            AcquisitionState::Capturing => Some(source.read()),
        };

        let input = TickInput {
            sample,
            arm_pending: self.shared.arm_pending(),
            band: self.shared.band(),
            capture_full,
        };
        let mut effects = TickEffects::default();
        self.machine.handle_with_context(&input, &mut effects);

        if effects.consume_arm {
            self.shared.clear_arm_request();
        }
        if effects.rewind_ring {
            self.shared.ring.rewind();
        }
        if let Some(sample) = effects.ring_push {
            self.shared.ring.push(sample);
        }
        if let Some(sample) = effects.begin_capture {
            self.shared.capture.reset();
            self.shared.capture.push(sample);
        }
        if let Some(sample) = effects.capture_push {
            self.shared.capture.push(sample);
        }

        let after = self.machine.inner().published;
        self.shared.publish_state(after);
        TickSummary { before, after }
    }
}

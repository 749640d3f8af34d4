use statig::prelude::*;

use super::{shared::AcquisitionState, trigger::TriggerBand, Sample};

/// Everything one tick needs, assembled by the engine before dispatch: the
/// sample taken this tick (if the current state takes one), the arm request
/// and trigger band as read from the shared store, and whether the capture
/// record is already full.
#[derive(Clone, Copy, Debug)]
pub(crate) struct TickInput {
    pub(crate) sample: Option<Sample>,
    pub(crate) arm_pending: bool,
    pub(crate) band: TriggerBand,
    pub(crate) capture_full: bool,
}

/// Buffer and flag updates decided during dispatch. The engine applies them
/// to the shared store afterwards, which keeps the machine itself free of
/// store references.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct TickEffects {
    pub(crate) consume_arm: bool,
    pub(crate) rewind_ring: bool,
    pub(crate) ring_push: Option<Sample>,
    pub(crate) begin_capture: Option<Sample>,
    pub(crate) capture_push: Option<Sample>,
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct AcquisitionMachine {
    /// Mirror of the statig state, published to the shared store after
    /// every dispatch.
    pub(crate) published: AcquisitionState,
}

impl Default for AcquisitionMachine {
    fn default() -> Self {
        Self {
            published: AcquisitionState::Idle,
        }
    }
}

#[state_machine(initial = "State::idle()")]
impl AcquisitionMachine {
    #[state]
    fn idle(&mut self, context: &mut TickEffects, event: &TickInput) -> Outcome<State> {
        if event.arm_pending {
            context.consume_arm = true;
            context.rewind_ring = true;
            self.published = AcquisitionState::Arming;
            Transition(State::arming())
        } else {
            Handled
        }
    }

    #[state]
    fn arming(&mut self, context: &mut TickEffects, event: &TickInput) -> Outcome<State> {
        let Some(sample) = event.sample else {
            return Handled;
        };
        if event.band.fires(sample) {
            // The triggering sample is the first entry of the record.
            context.begin_capture = Some(sample);
            self.published = AcquisitionState::Capturing;
            Transition(State::capturing())
        } else {
            context.ring_push = Some(sample);
            Handled
        }
    }

    #[state]
    fn capturing(&mut self, context: &mut TickEffects, event: &TickInput) -> Outcome<State> {
        if event.capture_full {
            self.published = AcquisitionState::Idle;
            return Transition(State::idle());
        }
        if let Some(sample) = event.sample {
            context.capture_push = Some(sample);
        }
        Handled
    }
}

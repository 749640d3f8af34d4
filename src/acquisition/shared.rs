use core::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};

use super::{capture::CaptureBuffer, ring::PreTriggerRing, trigger::TriggerBand, Sample};

/// Where the acquisition engine currently is.
///
/// Published by the tick context after every tick. A completed capture is
/// reported as `Idle` again — indistinguishable from "never armed" — so a
/// caller infers completion by having observed `Arming`/`Capturing` first
/// and then polling back to `Idle`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AcquisitionState {
    Idle,
    Arming,
    Capturing,
}

impl AcquisitionState {
    pub(crate) const fn as_u8(self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::Arming => 1,
            Self::Capturing => 2,
        }
    }

    pub(crate) fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Idle),
            1 => Some(Self::Arming),
            2 => Some(Self::Capturing),
            _ => None,
        }
    }
}

/// State shared between the tick context and the foreground control context.
///
/// Ownership is split per field and never crosses over: the tick context
/// (through [`AcquisitionEngine`](super::AcquisitionEngine)) is the only
/// writer of the buffers and the published state; the foreground is the
/// only writer of the trigger band and the arm request. Every scalar that
/// crosses contexts is one machine-word atomic, so there is no lock, no
/// blocking handoff and nothing a preemption can tear.
pub struct AcquisitionShared<const PRE: usize, const CAP: usize> {
    state: AtomicU8,
    arm_request: AtomicBool,
    band: AtomicU32,
    pub(crate) ring: PreTriggerRing<PRE>,
    pub(crate) capture: CaptureBuffer<CAP>,
}

impl<const PRE: usize, const CAP: usize> AcquisitionShared<PRE, CAP> {
    pub const fn new(band: TriggerBand) -> Self {
        Self {
            state: AtomicU8::new(AcquisitionState::Idle.as_u8()),
            arm_request: AtomicBool::new(false),
            band: AtomicU32::new(band.packed()),
            ring: PreTriggerRing::new(),
            capture: CaptureBuffer::new(),
        }
    }

    // Foreground control surface.

    /// Requests a new capture episode. Honored only while `Idle`; arming
    /// during a running episode is ignored rather than queued.
    pub fn request_arm(&self) {
        if self.state() == AcquisitionState::Idle {
            self.arm_request.store(true, Ordering::Release);
        }
    }

    pub fn state(&self) -> AcquisitionState {
        AcquisitionState::from_u8(self.state.load(Ordering::Acquire))
            .unwrap_or(AcquisitionState::Idle)
    }

    /// Replaces the trigger band. Any pair is accepted, inverted or not.
    pub fn set_band(&self, band: TriggerBand) {
        self.band.store(band.packed(), Ordering::Release);
    }

    pub fn band(&self) -> TriggerBand {
        TriggerBand::from_packed(self.band.load(Ordering::Acquire))
    }

    /// The pre-trigger window, oldest sample first.
    pub fn pretrigger_snapshot(&self) -> [Sample; PRE] {
        self.ring.snapshot_chronological()
    }

    /// Raw capture contents. Meaningful once an episode has been observed
    /// to run to completion; stale or partial otherwise.
    pub fn capture_snapshot(&self) -> [Sample; CAP] {
        self.capture.snapshot()
    }

    pub fn capture_len(&self) -> usize {
        self.capture.len()
    }

    // Tick-side surface, driven by exactly one engine.

    pub(crate) fn publish_state(&self, state: AcquisitionState) {
        self.state.store(state.as_u8(), Ordering::Release);
    }

    pub(crate) fn arm_pending(&self) -> bool {
        self.arm_request.load(Ordering::Acquire)
    }

    pub(crate) fn clear_arm_request(&self) {
        self.arm_request.store(false, Ordering::Release);
    }

    pub(crate) fn capture_complete(&self) -> bool {
        self.capture.is_complete()
    }
}

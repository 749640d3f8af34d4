//! Triggered single-channel acquisition.
//!
//! A periodic tick context samples the sensor, watches the signal against a
//! two-sided trigger band and, on an excursion, records a fixed-length
//! waveform around the crossing. A foreground control context arms the
//! engine, adjusts the band and reads the buffers back. The two contexts
//! share nothing but machine-word atomics; see [`shared::AcquisitionShared`]
//! for the ownership contract.

pub mod capture;
pub mod engine;
mod machine;
pub mod ring;
pub mod shared;
#[cfg(test)]
mod tests;
pub mod trigger;

pub use capture::CaptureBuffer;
pub use engine::{AcquisitionEngine, SampleSource, TickSummary};
pub use ring::PreTriggerRing;
pub use shared::{AcquisitionShared, AcquisitionState};
pub use trigger::TriggerBand;

/// One reading from the sample source, in the sensor's native resolution.
pub type Sample = u16;

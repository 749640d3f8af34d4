use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, channel::Channel};
use wavetrap::acquisition::{AcquisitionShared, TriggerBand};

/// Samples retained ahead of the trigger crossing.
pub(crate) const PRE_TRIGGER_DEPTH: usize = 32;
/// Samples recorded from the trigger crossing onwards.
pub(crate) const CAPTURE_DEPTH: usize = 256;
/// Nominal sampling period; no jitter or drift guarantees.
pub(crate) const SAMPLE_PERIOD_MICROS: u64 = 1_000;
pub(crate) const DEFAULT_TRIGGER_LOW: u16 = 18_000;
pub(crate) const DEFAULT_TRIGGER_HIGH: u16 = 24_000;
pub(crate) const DEFAULT_TRIGGER_BAND: TriggerBand =
    TriggerBand::new(DEFAULT_TRIGGER_LOW, DEFAULT_TRIGGER_HIGH);
pub(crate) const HEARTBEAT_INTERVAL_SECONDS: u64 = 60;
#[cfg(feature = "control-http")]
pub(crate) const CONTROL_HTTP_PORT: u16 = 80;
pub(crate) const BAND_STORE_MAGIC: u32 = 0x444E_4142; // "BAND"
pub(crate) const BAND_STORE_VERSION: u8 = 1;
pub(crate) const BAND_STORE_RECORD_LEN: usize = 12;

/// The one store both execution contexts share; the sampler task is its
/// only tick-side driver.
pub(crate) static ACQUISITION: AcquisitionShared<PRE_TRIGGER_DEPTH, CAPTURE_DEPTH> =
    AcquisitionShared::new(DEFAULT_TRIGGER_BAND);

/// Band values the foreground wants persisted; drained by the store task so
/// flash writes never happen inside a request handler.
pub(crate) static BAND_SAVES: Channel<CriticalSectionRawMutex, TriggerBand, 2> = Channel::new();

use embassy_time::{Duration, Ticker};
use esp_println::println;
use wavetrap::acquisition::AcquisitionEngine;

use super::{
    adc::AdcSampleSource,
    config::{ACQUISITION, SAMPLE_PERIOD_MICROS},
    telemetry,
};

/// The tick context: owns the engine and the ADC, runs one engine tick per
/// nominal period. Nothing else writes the buffers or the published state.
#[embassy_executor::task]
pub(crate) async fn sampler_task(mut source: AdcSampleSource) {
    let mut engine = AcquisitionEngine::new(&ACQUISITION);
    let mut ticker = Ticker::every(Duration::from_micros(SAMPLE_PERIOD_MICROS));

    loop {
        ticker.next().await;
        let summary = engine.tick(&mut source);
        telemetry::record_tick(summary);

        if summary.triggered() {
            println!("acquisition: trigger fired, recording");
        } else if summary.completed() {
            println!("acquisition: capture complete");
        }
    }
}

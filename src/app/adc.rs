use esp_hal::{
    analog::adc::{Adc, AdcConfig, AdcPin, Attenuation},
    Blocking,
};
use wavetrap::acquisition::{Sample, SampleSource};

use super::types::{AdcInstance, SensePin};

/// Oneshot ADC reader for the monitored channel. Full-scale attenuation so
/// the usable input range covers the sensor's output swing.
pub(crate) struct AdcSampleSource {
    adc: Adc<'static, AdcInstance, Blocking>,
    pin: AdcPin<SensePin, AdcInstance>,
}

impl AdcSampleSource {
    pub(crate) fn new(adc: AdcInstance, pin: SensePin) -> Self {
        let mut config = AdcConfig::new();
        let pin = config.enable_pin(pin, Attenuation::_11dB);
        let adc = Adc::new(adc, config);
        Self { adc, pin }
    }
}

impl SampleSource for AdcSampleSource {
    fn read(&mut self) -> Sample {
        // A oneshot conversion settles within a few microseconds; spin on
        // WouldBlock until it lands.
        loop {
            if let Ok(raw) = self.adc.read_oneshot(&mut self.pin) {
                return raw;
            }
        }
    }
}

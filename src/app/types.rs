use wavetrap::acquisition::AcquisitionState;

pub(crate) type AdcInstance = esp_hal::peripherals::ADC1<'static>;
pub(crate) type SensePin = esp_hal::peripherals::GPIO32<'static>;

pub(crate) fn state_label(state: AcquisitionState) -> &'static str {
    match state {
        AcquisitionState::Idle => "idle",
        AcquisitionState::Arming => "arming",
        AcquisitionState::Capturing => "capturing",
    }
}

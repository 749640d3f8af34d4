mod adc;
pub(crate) mod config;
#[cfg(feature = "control-http")]
mod control_http;
mod sampler;
pub(crate) mod store;
pub(crate) mod telemetry;
pub(crate) mod types;

use embassy_time::{Duration, Ticker};
use esp_hal::timer::timg::TimerGroup;
use esp_println::println;

use self::{
    adc::AdcSampleSource,
    config::{ACQUISITION, HEARTBEAT_INTERVAL_SECONDS},
    store::BandStore,
    types::state_label,
};

pub(crate) fn run() -> ! {
    let peripherals = esp_hal::init(esp_hal::Config::default());
    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    let source = AdcSampleSource::new(peripherals.ADC1, peripherals.GPIO32);

    let mut band_store = BandStore::new(peripherals.FLASH);
    match band_store.load_band() {
        Some(band) => {
            ACQUISITION.set_band(band);
            println!("store: restored trigger band low={} high={}", band.low, band.high);
        }
        None => {
            let band = ACQUISITION.band();
            println!("store: no stored band, defaults low={} high={}", band.low, band.high);
        }
    }

    #[cfg(feature = "control-http")]
    let control = match control_http::setup(peripherals.WIFI) {
        Ok(runtime) => Some(runtime),
        Err(err) => {
            println!("{}", err);
            None
        }
    };

    let mut executor = esp_rtos::embassy::Executor::new();
    let executor = unsafe { make_static(&mut executor) };
    executor.run(move |spawner| {
        spawner.must_spawn(sampler::sampler_task(source));
        spawner.must_spawn(store::band_store_task(band_store));
        spawner.must_spawn(heartbeat_task());
        #[cfg(feature = "control-http")]
        if let Some(runtime) = control {
            spawner.must_spawn(control_http::wifi_connection_task(runtime.wifi_controller));
            spawner.must_spawn(control_http::net_task(runtime.net_runner));
            spawner.must_spawn(control_http::http_server_task(runtime.stack));
        }
    });
}

#[embassy_executor::task]
async fn heartbeat_task() {
    let mut ticker = Ticker::every(Duration::from_secs(HEARTBEAT_INTERVAL_SECONDS));

    loop {
        ticker.next().await;
        let stats = telemetry::snapshot();
        println!(
            "acquisition: state={} ticks={} arms={} triggers={} captures={}",
            state_label(ACQUISITION.state()),
            stats.ticks,
            stats.arms_honored,
            stats.triggers_fired,
            stats.captures_completed
        );
    }
}

unsafe fn make_static<T>(value: &mut T) -> &'static mut T {
    unsafe { core::mem::transmute(value) }
}

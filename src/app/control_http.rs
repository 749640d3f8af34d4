use core::fmt::Write as _;

use embassy_net::{tcp::TcpSocket, IpListenEndpoint, Runner, Stack, StackResources};
use embassy_time::{Duration, Timer};
use embedded_io_async::Write as _;
use esp_hal::rng::Rng;
use esp_println::println;
use esp_radio::wifi::{
    ClientConfig, Config as WifiRuntimeConfig, ModeConfig, WifiController, WifiDevice, WifiEvent,
};
use static_cell::StaticCell;
use wavetrap::acquisition::{Sample, TriggerBand};

use super::{
    config::{ACQUISITION, BAND_SAVES, CAPTURE_DEPTH, CONTROL_HTTP_PORT, PRE_TRIGGER_DEPTH},
    telemetry,
    types::state_label,
};

const HTTP_HEADER_MAX: usize = 1024;
const HTTP_RW_BUF: usize = 1024;
// Every u16 renders in at most five digits plus a two-byte separator, so
// eight bytes per sample bounds any CSV body this server produces.
const RESPONSE_BODY_MAX: usize = 8 * (PRE_TRIGGER_DEPTH + CAPTURE_DEPTH);
const WIFI_RETRY_BACKOFF_SECS: u64 = 3;

type Body = heapless::String<RESPONSE_BODY_MAX>;

pub(crate) struct ControlHttpRuntime {
    pub(crate) wifi_controller: WifiController<'static>,
    pub(crate) net_runner: Runner<'static, WifiDevice<'static>>,
    pub(crate) stack: Stack<'static>,
}

pub(crate) fn setup(
    wifi: esp_hal::peripherals::WIFI<'static>,
) -> Result<ControlHttpRuntime, &'static str> {
    static RADIO_CTRL: StaticCell<esp_radio::Controller<'static>> = StaticCell::new();
    static STACK_RESOURCES: StaticCell<StackResources<3>> = StaticCell::new();

    let radio_ctrl = esp_radio::init().map_err(|_| "control_http: esp_radio::init failed")?;
    let radio_ctrl = RADIO_CTRL.init(radio_ctrl);
    let (wifi_controller, ifaces) =
        esp_radio::wifi::new(radio_ctrl, wifi, WifiRuntimeConfig::default())
            .map_err(|_| "control_http: wifi init failed")?;

    let rng = Rng::new();
    let seed = (rng.random() as u64) << 32 | rng.random() as u64;

    let (stack, net_runner) = embassy_net::new(
        ifaces.sta,
        embassy_net::Config::dhcpv4(Default::default()),
        STACK_RESOURCES.init(StackResources::<3>::new()),
        seed,
    );

    Ok(ControlHttpRuntime {
        wifi_controller,
        net_runner,
        stack,
    })
}

#[embassy_executor::task]
pub(crate) async fn wifi_connection_task(mut controller: WifiController<'static>) {
    let Some((ssid, password)) = wifi_credentials() else {
        println!("wifi: no compiled credentials; control interface stays offline");
        return;
    };

    let mode = ModeConfig::Client(
        ClientConfig::default()
            .with_ssid(ssid.into())
            .with_password(password.into()),
    );
    if let Err(err) = controller.set_config(&mode) {
        println!("wifi: station config err={:?}", err);
        return;
    }

    loop {
        match controller.is_started() {
            Ok(true) => {}
            Ok(false) => {
                if let Err(err) = controller.start_async().await {
                    println!("wifi: start err={:?}", err);
                    Timer::after(Duration::from_secs(WIFI_RETRY_BACKOFF_SECS)).await;
                    continue;
                }
            }
            Err(err) => {
                println!("wifi: status err={:?}", err);
                Timer::after(Duration::from_secs(WIFI_RETRY_BACKOFF_SECS)).await;
                continue;
            }
        }

        match controller.connect_async().await {
            Ok(()) => {
                println!("wifi: connected ssid={}", ssid);
                controller.wait_for_event(WifiEvent::StaDisconnected).await;
                println!("wifi: disconnected, reconnecting");
            }
            Err(err) => {
                println!("wifi: connect err={:?}", err);
                let _ = controller.disconnect_async().await;
                let _ = controller.stop_async().await;
                Timer::after(Duration::from_secs(WIFI_RETRY_BACKOFF_SECS)).await;
            }
        }
    }
}

#[embassy_executor::task]
pub(crate) async fn net_task(mut runner: Runner<'static, WifiDevice<'static>>) {
    runner.run().await
}

#[embassy_executor::task]
pub(crate) async fn http_server_task(stack: Stack<'static>) {
    stack.wait_config_up().await;
    if let Some(cfg) = stack.config_v4() {
        println!(
            "control_http: listening on {}:{}",
            cfg.address.address(),
            CONTROL_HTTP_PORT
        );
    }

    let mut rx_buffer = [0u8; HTTP_RW_BUF];
    let mut tx_buffer = [0u8; HTTP_RW_BUF];
    let mut socket = TcpSocket::new(stack, &mut rx_buffer, &mut tx_buffer);
    socket.set_timeout(Some(Duration::from_secs(10)));

    loop {
        let accepted = socket
            .accept(IpListenEndpoint {
                addr: None,
                port: CONTROL_HTTP_PORT,
            })
            .await;
        if let Err(err) = accepted {
            println!("control_http: accept err={:?}", err);
            telemetry::record_http_error();
            continue;
        }

        telemetry::record_http_request();
        if let Err(err) = handle_connection(&mut socket).await {
            println!("control_http: request err={}", err);
            telemetry::record_http_error();
        }

        let _ = socket.flush().await;
        Timer::after(Duration::from_millis(20)).await;
        socket.close();
        Timer::after(Duration::from_millis(20)).await;
        socket.abort();
    }
}

async fn handle_connection(socket: &mut TcpSocket<'_>) -> Result<(), &'static str> {
    let mut header_buf = [0u8; HTTP_HEADER_MAX];
    let mut filled = 0usize;
    let header_end = loop {
        if filled == header_buf.len() {
            write_response(socket, b"413 Payload Too Large", b"header too large").await;
            return Err("header too large");
        }

        let n = socket
            .read(&mut header_buf[filled..])
            .await
            .map_err(|_| "read")?;
        if n == 0 {
            return Err("eof");
        }
        filled += n;

        if let Some(end) = find_header_end(&header_buf[..filled]) {
            break end;
        }
    };

    let header = core::str::from_utf8(&header_buf[..header_end]).map_err(|_| "header utf8")?;
    let (method, target) = parse_request_line(header).ok_or("bad request line")?;
    let content_length = parse_content_length(header).unwrap_or(0);
    let body_start = header_end + 4;
    let body_bytes_in_buffer = filled.saturating_sub(body_start);
    drain_remaining_body(socket, content_length, body_bytes_in_buffer).await?;

    match (method, target_path(target)) {
        ("GET", "/health") => {
            write_response(socket, b"200 OK", b"ok").await;
            Ok(())
        }
        ("GET", "/state") => {
            let label = state_label(ACQUISITION.state());
            write_response(socket, b"200 OK", label.as_bytes()).await;
            Ok(())
        }
        ("POST", "/arm") => {
            // Ignored unless idle; the caller polls /state to watch the
            // episode run.
            ACQUISITION.request_arm();
            write_response(socket, b"200 OK", b"ok").await;
            Ok(())
        }
        ("GET", "/thresholds") => {
            let mut body = Body::new();
            let band = ACQUISITION.band();
            let _ = write!(body, "{} {}", band.low, band.high);
            write_response(socket, b"200 OK", body.as_bytes()).await;
            Ok(())
        }
        ("POST", "/thresholds") => {
            let low = match parse_u16_query(target, "/thresholds", "low") {
                Ok(value) => value,
                Err(err) => {
                    write_response(socket, b"400 Bad Request", b"invalid low query").await;
                    return Err(err);
                }
            };
            let high = match parse_u16_query(target, "/thresholds", "high") {
                Ok(value) => value,
                Err(err) => {
                    write_response(socket, b"400 Bad Request", b"invalid high query").await;
                    return Err(err);
                }
            };

            // Any ordering is legal; an inverted band simply fires on the
            // first armed sample.
            let band = TriggerBand::new(low, high);
            ACQUISITION.set_band(band);
            let _ = BAND_SAVES.try_send(band);

            let mut body = Body::new();
            let _ = write!(body, "{} {}", band.low, band.high);
            write_response(socket, b"200 OK", body.as_bytes()).await;
            Ok(())
        }
        ("GET", "/pretrigger") => {
            let mut body = Body::new();
            encode_samples(&ACQUISITION.pretrigger_snapshot(), &mut body);
            write_response(socket, b"200 OK", body.as_bytes()).await;
            Ok(())
        }
        ("GET", "/capture") => {
            let mut body = Body::new();
            encode_samples(&ACQUISITION.capture_snapshot(), &mut body);
            write_response(socket, b"200 OK", body.as_bytes()).await;
            Ok(())
        }
        ("GET", "/waveform") => {
            // Pre-trigger window first, then the record: one contiguous
            // time series around the crossing.
            let mut body = Body::new();
            encode_samples(&ACQUISITION.pretrigger_snapshot(), &mut body);
            let _ = body.push_str(", ");
            encode_samples(&ACQUISITION.capture_snapshot(), &mut body);
            write_response(socket, b"200 OK", body.as_bytes()).await;
            Ok(())
        }
        ("GET", "/stats") => {
            let stats = telemetry::snapshot();
            let mut body = Body::new();
            let _ = write!(
                body,
                "ticks={} arms={} triggers={} captures={} http_requests={} http_errors={}",
                stats.ticks,
                stats.arms_honored,
                stats.triggers_fired,
                stats.captures_completed,
                stats.http_requests,
                stats.http_errors
            );
            write_response(socket, b"200 OK", body.as_bytes()).await;
            Ok(())
        }
        _ => {
            write_response(socket, b"404 Not Found", b"not found").await;
            Ok(())
        }
    }
}

fn encode_samples(samples: &[Sample], body: &mut Body) {
    for (i, &sample) in samples.iter().enumerate() {
        if i > 0 {
            let _ = body.push_str(", ");
        }
        let _ = write!(body, "{}", sample);
    }
}

async fn drain_remaining_body(
    socket: &mut TcpSocket<'_>,
    content_length: usize,
    already_in_buffer: usize,
) -> Result<(), &'static str> {
    if already_in_buffer >= content_length {
        return Ok(());
    }
    let mut remaining = content_length - already_in_buffer;
    let mut sink = [0u8; 256];
    while remaining > 0 {
        let want = remaining.min(sink.len());
        let n = socket.read(&mut sink[..want]).await.map_err(|_| "drain")?;
        if n == 0 {
            return Err("drain eof");
        }
        remaining -= n;
    }
    Ok(())
}

fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|window| window == b"\r\n\r\n")
}

fn parse_request_line(header: &str) -> Option<(&str, &str)> {
    let first_line = header.lines().next()?;
    let mut parts = first_line.split_ascii_whitespace();
    let method = parts.next()?;
    let target = parts.next()?;
    let _version = parts.next()?;
    Some((method, target))
}

fn parse_content_length(header: &str) -> Option<usize> {
    for line in header.lines().skip(1) {
        let (name, value) = line.split_once(':')?;
        if name.eq_ignore_ascii_case("content-length") {
            return value.trim().parse::<usize>().ok();
        }
    }
    None
}

fn target_path(target: &str) -> &str {
    target.split('?').next().unwrap_or(target)
}

fn parse_u16_query(target: &str, route: &str, key: &str) -> Result<u16, &'static str> {
    let query = target
        .strip_prefix(route)
        .and_then(|tail| tail.strip_prefix('?'))
        .ok_or("missing query")?;

    for pair in query.split('&') {
        if let Some(value) = pair
            .strip_prefix(key)
            .and_then(|tail| tail.strip_prefix('='))
        {
            return value.parse::<u16>().map_err(|_| "invalid query value");
        }
    }
    Err("missing query key")
}

async fn write_response(socket: &mut TcpSocket<'_>, status: &[u8], body: &[u8]) {
    let mut content_length = [0u8; 20];
    let mut idx = content_length.len();
    let mut remaining = body.len();
    loop {
        idx -= 1;
        content_length[idx] = b'0' + (remaining % 10) as u8;
        remaining /= 10;
        if remaining == 0 {
            break;
        }
    }

    let _ = socket.write_all(b"HTTP/1.0 ").await;
    let _ = socket.write_all(status).await;
    let _ = socket
        .write_all(b"\r\nConnection: close\r\nContent-Length: ")
        .await;
    let _ = socket.write_all(&content_length[idx..]).await;
    let _ = socket.write_all(b"\r\n\r\n").await;
    let _ = socket.write_all(body).await;
}

fn wifi_credentials() -> Option<(&'static str, &'static str)> {
    let ssid = option_env!("WAVETRAP_WIFI_SSID").or(option_env!("SSID"))?;
    let password = option_env!("WAVETRAP_WIFI_PASSWORD")
        .or(option_env!("PASSWORD"))
        .unwrap_or("");
    Some((ssid, password))
}

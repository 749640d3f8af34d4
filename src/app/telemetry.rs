use core::sync::atomic::{AtomicU32, Ordering};

use wavetrap::acquisition::TickSummary;

static TICKS: AtomicU32 = AtomicU32::new(0);
static ARMS_HONORED: AtomicU32 = AtomicU32::new(0);
static TRIGGERS_FIRED: AtomicU32 = AtomicU32::new(0);
static CAPTURES_COMPLETED: AtomicU32 = AtomicU32::new(0);
static HTTP_REQUESTS: AtomicU32 = AtomicU32::new(0);
static HTTP_ERRORS: AtomicU32 = AtomicU32::new(0);

pub(crate) fn record_tick(summary: TickSummary) {
    TICKS.fetch_add(1, Ordering::Relaxed);
    if summary.armed() {
        ARMS_HONORED.fetch_add(1, Ordering::Relaxed);
    }
    if summary.triggered() {
        TRIGGERS_FIRED.fetch_add(1, Ordering::Relaxed);
    }
    if summary.completed() {
        CAPTURES_COMPLETED.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg_attr(not(feature = "control-http"), allow(dead_code))]
pub(crate) fn record_http_request() {
    HTTP_REQUESTS.fetch_add(1, Ordering::Relaxed);
}

#[cfg_attr(not(feature = "control-http"), allow(dead_code))]
pub(crate) fn record_http_error() {
    HTTP_ERRORS.fetch_add(1, Ordering::Relaxed);
}

#[derive(Clone, Copy)]
pub(crate) struct Snapshot {
    pub(crate) ticks: u32,
    pub(crate) arms_honored: u32,
    pub(crate) triggers_fired: u32,
    pub(crate) captures_completed: u32,
    #[cfg_attr(not(feature = "control-http"), allow(dead_code))]
    pub(crate) http_requests: u32,
    #[cfg_attr(not(feature = "control-http"), allow(dead_code))]
    pub(crate) http_errors: u32,
}

pub(crate) fn snapshot() -> Snapshot {
    Snapshot {
        ticks: TICKS.load(Ordering::Relaxed),
        arms_honored: ARMS_HONORED.load(Ordering::Relaxed),
        triggers_fired: TRIGGERS_FIRED.load(Ordering::Relaxed),
        captures_completed: CAPTURES_COMPLETED.load(Ordering::Relaxed),
        http_requests: HTTP_REQUESTS.load(Ordering::Relaxed),
        http_errors: HTTP_ERRORS.load(Ordering::Relaxed),
    }
}

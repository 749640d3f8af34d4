use super::{
    engine::{AcquisitionEngine, SampleSource},
    shared::{AcquisitionShared, AcquisitionState},
    trigger::TriggerBand,
    Sample,
};

/// Replays a fixed sample script and counts how often it was read. Past the
/// end of the script the last value repeats.
struct ScriptedSource {
    samples: &'static [Sample],
    cursor: usize,
    reads: usize,
}

impl ScriptedSource {
    fn new(samples: &'static [Sample]) -> Self {
        Self {
            samples,
            cursor: 0,
            reads: 0,
        }
    }
}

impl SampleSource for ScriptedSource {
    fn read(&mut self) -> Sample {
        let sample = self.samples[self.cursor.min(self.samples.len() - 1)];
        self.cursor += 1;
        self.reads += 1;
        sample
    }
}

#[test]
fn idle_ticks_never_read_the_source() {
    let shared = AcquisitionShared::<4, 3>::new(TriggerBand::new(100, 200));
    let mut engine = AcquisitionEngine::new(&shared);
    let mut source = ScriptedSource::new(&[150]);

    for _ in 0..5 {
        engine.tick(&mut source);
    }

    assert_eq!(source.reads, 0);
    assert_eq!(shared.state(), AcquisitionState::Idle);
}

#[test]
fn arm_request_is_consumed_on_the_next_tick_without_sampling() {
    let shared = AcquisitionShared::<4, 3>::new(TriggerBand::new(100, 200));
    let mut engine = AcquisitionEngine::new(&shared);
    let mut source = ScriptedSource::new(&[150]);

    shared.request_arm();
    let summary = engine.tick(&mut source);

    assert!(summary.armed());
    assert_eq!(source.reads, 0);
    assert_eq!(shared.state(), AcquisitionState::Arming);
    assert!(!shared.arm_pending());
}

#[test]
fn first_excursion_fires_and_leads_the_record() {
    let shared = AcquisitionShared::<4, 3>::new(TriggerBand::new(100, 200));
    let mut engine = AcquisitionEngine::new(&shared);
    let mut source = ScriptedSource::new(&[150, 150, 250, 10, 20, 99]);

    shared.request_arm();
    engine.tick(&mut source); // consume the request
    engine.tick(&mut source); // 150, in band
    engine.tick(&mut source); // 150, in band
    let fired = engine.tick(&mut source); // 250 fires

    assert!(fired.triggered());
    assert_eq!(shared.state(), AcquisitionState::Capturing);

    engine.tick(&mut source); // 10
    assert_eq!(shared.state(), AcquisitionState::Capturing);
    engine.tick(&mut source); // 20, record now full
    assert_eq!(shared.state(), AcquisitionState::Capturing);

    let done = engine.tick(&mut source); // completion tick, no read
    assert!(done.completed());
    assert_eq!(shared.state(), AcquisitionState::Idle);
    assert_eq!(shared.capture_snapshot(), [250, 10, 20]);
    assert_eq!(shared.capture_len(), 3);
    assert_eq!(source.reads, 5);
}

#[test]
fn capture_state_is_visible_for_exactly_the_fill_ticks() {
    // With a 3-deep record, the trigger tick and the two ticks after it
    // report `Capturing`; the tick after that reports `Idle`.
    let shared = AcquisitionShared::<4, 3>::new(TriggerBand::new(100, 200));
    let mut engine = AcquisitionEngine::new(&shared);
    let mut source = ScriptedSource::new(&[250, 1, 2, 3]);

    shared.request_arm();
    engine.tick(&mut source); // arm
    engine.tick(&mut source); // trigger tick

    let mut observed = [AcquisitionState::Idle; 4];
    for slot in observed.iter_mut() {
        *slot = shared.state();
        engine.tick(&mut source);
    }

    assert_eq!(
        observed,
        [
            AcquisitionState::Capturing,
            AcquisitionState::Capturing,
            AcquisitionState::Capturing,
            AcquisitionState::Idle,
        ]
    );
}

#[test]
fn pretrigger_window_is_chronological_across_the_wrap() {
    let shared = AcquisitionShared::<4, 2>::new(TriggerBand::new(5, 100));
    let mut engine = AcquisitionEngine::new(&shared);
    let mut source = ScriptedSource::new(&[10, 20, 30, 40, 50, 60, 250, 42]);

    shared.request_arm();
    engine.tick(&mut source); // arm
    for _ in 0..6 {
        engine.tick(&mut source); // 10..60 all stay inside the band
    }
    assert_eq!(shared.state(), AcquisitionState::Arming);

    engine.tick(&mut source); // 250 fires
    assert_eq!(shared.state(), AcquisitionState::Capturing);
    assert_eq!(shared.pretrigger_snapshot(), [30, 40, 50, 60]);
}

#[test]
fn arming_during_an_episode_is_ignored() {
    let shared = AcquisitionShared::<4, 2>::new(TriggerBand::new(100, 200));
    let mut engine = AcquisitionEngine::new(&shared);
    let mut source = ScriptedSource::new(&[150, 250, 7, 8]);

    shared.request_arm();
    engine.tick(&mut source); // arm
    shared.request_arm(); // while Arming: no-op
    engine.tick(&mut source); // 150 into the ring

    assert!(!shared.arm_pending());

    engine.tick(&mut source); // 250 fires
    shared.request_arm(); // while Capturing: no-op
    engine.tick(&mut source); // 7 completes the record
    engine.tick(&mut source); // back to Idle

    assert_eq!(shared.state(), AcquisitionState::Idle);
    assert_eq!(shared.capture_snapshot(), [250, 7]);

    // Nothing was queued: the engine stays idle and stops sampling.
    let reads_after_episode = source.reads;
    for _ in 0..4 {
        engine.tick(&mut source);
    }
    assert_eq!(shared.state(), AcquisitionState::Idle);
    assert_eq!(source.reads, reads_after_episode);
}

#[test]
fn second_episode_starts_from_a_fresh_window() {
    let shared = AcquisitionShared::<2, 2>::new(TriggerBand::new(100, 200));
    let mut engine = AcquisitionEngine::new(&shared);
    let mut source = ScriptedSource::new(&[150, 250, 1, 120, 130, 240, 7]);

    shared.request_arm();
    engine.tick(&mut source); // arm
    engine.tick(&mut source); // 150 into the ring
    engine.tick(&mut source); // 250 fires
    engine.tick(&mut source); // 1 completes the record
    engine.tick(&mut source); // Idle
    assert_eq!(shared.state(), AcquisitionState::Idle);

    shared.request_arm();
    engine.tick(&mut source); // arm again, window rewound
    engine.tick(&mut source); // 120 into the ring
    engine.tick(&mut source); // 130 into the ring
    engine.tick(&mut source); // 240 fires
    engine.tick(&mut source); // 7 completes the record
    engine.tick(&mut source); // Idle

    assert_eq!(shared.state(), AcquisitionState::Idle);
    assert_eq!(shared.capture_snapshot(), [240, 7]);
    assert_eq!(shared.pretrigger_snapshot(), [120, 130]);
}

#[test]
fn inverted_band_fires_on_the_first_armed_sample() {
    let shared = AcquisitionShared::<4, 2>::new(TriggerBand::new(200, 100));
    let mut engine = AcquisitionEngine::new(&shared);
    let mut source = ScriptedSource::new(&[150, 151, 152]);

    shared.request_arm();
    engine.tick(&mut source); // arm
    let fired = engine.tick(&mut source); // 150 is outside any inverted band

    assert!(fired.triggered());
    assert_eq!(shared.capture_snapshot()[0], 150);
}

#[test]
fn band_changes_apply_to_the_next_armed_sample() {
    let shared = AcquisitionShared::<4, 2>::new(TriggerBand::new(100, 200));
    let mut engine = AcquisitionEngine::new(&shared);
    let mut source = ScriptedSource::new(&[150, 150, 150]);

    shared.request_arm();
    engine.tick(&mut source); // arm
    engine.tick(&mut source); // 150 stays in band
    assert_eq!(shared.state(), AcquisitionState::Arming);

    shared.set_band(TriggerBand::new(160, 200));
    let fired = engine.tick(&mut source); // 150 is now below the band

    assert!(fired.triggered());
    assert_eq!(shared.state(), AcquisitionState::Capturing);
}

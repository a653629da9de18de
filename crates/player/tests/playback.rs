//! End-to-end playback over the software decoder/extractor with a recording
//! output, exercising pacing, seek, repeat, and lifecycle semantics.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use hdrplay_common::{MediaFormat, MediaSource, MediaTime, PlayerError, Resolution};
use hdrplay_media::{
    FramePayload, OutputMode, SoftwareDecoder, SoftwareExtractor, StreamConfig, VideoDecoder,
};
use hdrplay_player::{PlayState, PlayerCallback, VideoOutput, VideoPlayer};

#[derive(Default)]
struct OutputLog {
    rendered: Vec<i64>,
    released: Vec<(i64, bool)>,
    format_changes: usize,
    stops: usize,
}

/// Video output that records the protocol instead of touching a GPU.
struct RecordingOutput {
    log: Arc<Mutex<OutputLog>>,
    /// Artificial per-frame render cost, to provoke late frames.
    render_cost: Duration,
}

impl RecordingOutput {
    fn new() -> (Self, Arc<Mutex<OutputLog>>) {
        Self::with_render_cost(Duration::ZERO)
    }

    fn with_render_cost(render_cost: Duration) -> (Self, Arc<Mutex<OutputLog>>) {
        let log = Arc::new(Mutex::new(OutputLog::default()));
        (
            Self {
                log: Arc::clone(&log),
                render_cost,
            },
            log,
        )
    }
}

impl VideoOutput for RecordingOutput {
    fn on_decoder_prepare(
        &mut self,
        decoder: &mut dyn VideoDecoder,
        _format: &MediaFormat,
    ) -> Result<(), PlayerError> {
        decoder.set_output_mode(OutputMode::Buffer);
        Ok(())
    }

    fn on_format_changed(&mut self, _format: &MediaFormat) {
        self.log.lock().format_changes += 1;
    }

    fn on_buffer_available(&mut self, _payload: &FramePayload, _pts: MediaTime) {}

    fn on_buffer_render(&mut self, pts: MediaTime) -> bool {
        if !self.render_cost.is_zero() {
            thread::sleep(self.render_cost);
        }
        self.log.lock().rendered.push(pts.as_micros());
        true
    }

    fn on_buffer_release(&mut self, pts: MediaTime, rendered: bool) {
        self.log.lock().released.push((pts.as_micros(), rendered));
    }

    fn on_output_stop(&mut self) {
        self.log.lock().stops += 1;
    }

    fn release(&mut self) {}
}

#[derive(Default)]
struct CountingCallback {
    ends: AtomicUsize,
    errors: Mutex<Vec<String>>,
    progress: AtomicUsize,
}

impl PlayerCallback for CountingCallback {
    fn on_play_process(&self, _time_secs: f64) {
        self.progress.fetch_add(1, Ordering::SeqCst);
    }
    fn on_play_end(&self) {
        self.ends.fetch_add(1, Ordering::SeqCst);
    }
    fn on_play_error(&self, error: &PlayerError) {
        self.errors.lock().push(error.to_string());
    }
}

fn make_player(config: StreamConfig, output: RecordingOutput) -> VideoPlayer {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let decoder = Box::new(SoftwareDecoder::new());
    let extractor = Box::new(SoftwareExtractor::new(config));
    let player = VideoPlayer::new(decoder, extractor, Box::new(output));
    player.set_source(MediaSource::new("synthetic.mp4"));
    player
}

fn wait_until(timeout: Duration, mut probe: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if probe() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    false
}

#[test]
fn plays_stream_to_end_in_order() {
    let config = StreamConfig {
        frame_count: 10,
        fps: 100,
        ..StreamConfig::default()
    };
    let (output, log) = RecordingOutput::new();
    let player = make_player(config, output);
    let callback = Arc::new(CountingCallback::default());
    player.set_callback(callback.clone());
    player.set_repeat(false);

    player.prepare();
    player.start();

    assert!(wait_until(Duration::from_secs(5), || {
        callback.ends.load(Ordering::SeqCst) == 1
    }));

    let log = log.lock();
    let expected: Vec<i64> = (0..10).map(|i| i * 10_000).collect();
    assert_eq!(log.rendered, expected);
    assert_eq!(log.format_changes, 1);
    assert!(log.released.iter().all(|&(_, rendered)| rendered));
    drop(log);

    assert!(callback.errors.lock().is_empty());
    assert!(callback.progress.load(Ordering::SeqCst) >= 10);
    player.release();
}

#[test]
fn repeat_loops_without_caller_intervention() {
    let config = StreamConfig {
        frame_count: 5,
        fps: 100,
        keyframe_interval: 5,
        ..StreamConfig::default()
    };
    let (output, log) = RecordingOutput::new();
    let player = make_player(config, output);
    let callback = Arc::new(CountingCallback::default());
    player.set_callback(callback.clone());
    // repeat defaults to true

    player.prepare();
    player.start();

    assert!(wait_until(Duration::from_secs(5), || {
        callback.ends.load(Ordering::SeqCst) >= 2
    }));
    player.stop();

    let log = log.lock();
    let restarts = log.rendered.iter().filter(|&&pts| pts == 0).count();
    assert!(restarts >= 2, "expected looped playback, got {restarts} starts");
    player.release();
}

#[test]
fn end_fires_once_without_repeat() {
    let config = StreamConfig {
        frame_count: 5,
        fps: 100,
        keyframe_interval: 5,
        ..StreamConfig::default()
    };
    let (output, _log) = RecordingOutput::new();
    let player = make_player(config, output);
    let callback = Arc::new(CountingCallback::default());
    player.set_callback(callback.clone());
    player.set_repeat(false);

    player.prepare();
    player.start();

    assert!(wait_until(Duration::from_secs(5), || {
        callback.ends.load(Ordering::SeqCst) >= 1
    }));
    // Give a would-be second traversal time to (not) happen.
    thread::sleep(Duration::from_millis(150));
    assert_eq!(callback.ends.load(Ordering::SeqCst), 1);
    player.release();
}

#[test]
fn seek_drops_frames_before_target() {
    let config = StreamConfig {
        frame_count: 30,
        fps: 100,
        keyframe_interval: 10,
        ..StreamConfig::default()
    };
    let (output, log) = RecordingOutput::new();
    let player = make_player(config, output);
    let callback = Arc::new(CountingCallback::default());
    player.set_callback(callback.clone());
    player.set_repeat(false);

    player.prepare();
    // Target frame 15 (0.15s); the extractor rewinds to keyframe 10, so
    // frames 10..14 are decoded and must be dropped unpaced.
    player.seek(0.15);
    player.start();

    assert!(wait_until(Duration::from_secs(5), || {
        callback.ends.load(Ordering::SeqCst) == 1
    }));

    let log = log.lock();
    assert_eq!(log.rendered.first().copied(), Some(150_000));
    assert!(log.rendered.iter().all(|&pts| pts >= 150_000));
    let dropped: Vec<i64> = log
        .released
        .iter()
        .filter(|&&(_, rendered)| !rendered)
        .map(|&(pts, _)| pts)
        .collect();
    assert_eq!(dropped, vec![100_000, 110_000, 120_000, 130_000, 140_000]);
    player.release();
}

#[test]
fn late_frames_are_dropped_at_the_jank_threshold() {
    let config = StreamConfig {
        frame_count: 8,
        fps: 30,
        keyframe_interval: 4,
        ..StreamConfig::default()
    };
    // Each render costs ~60ms against a 33ms frame interval, so the clock
    // slips behind until frames cross the -50ms threshold and drop.
    let (output, log) = RecordingOutput::with_render_cost(Duration::from_millis(60));
    let player = make_player(config, output);
    let callback = Arc::new(CountingCallback::default());
    player.set_callback(callback.clone());
    player.set_repeat(false);

    player.prepare();
    player.start();

    assert!(wait_until(Duration::from_secs(10), || {
        callback.ends.load(Ordering::SeqCst) == 1
    }));

    let log = log.lock();
    let dropped = log
        .released
        .iter()
        .filter(|&&(_, rendered)| !rendered)
        .count();
    assert!(dropped >= 1, "expected late frames to drop");
    assert!(
        log.rendered.len() >= 2,
        "recoverable lateness must still render"
    );
    assert_eq!(log.rendered.len() + dropped, 8);
    player.release();
}

#[test]
fn pause_halts_frame_flow_until_resume() {
    let config = StreamConfig {
        frame_count: 200,
        fps: 100,
        keyframe_interval: 10,
        ..StreamConfig::default()
    };
    let (output, log) = RecordingOutput::new();
    let player = make_player(config, output);
    player.set_repeat(false);

    player.prepare();
    player.start();
    assert!(wait_until(Duration::from_secs(5), || {
        !log.lock().rendered.is_empty()
    }));

    player.pause();
    assert!(wait_until(Duration::from_secs(1), || player.is_paused()));
    // Let in-flight frames drain, then confirm the flow stopped.
    thread::sleep(Duration::from_millis(50));
    let paused_at = log.lock().rendered.len();
    thread::sleep(Duration::from_millis(150));
    assert!(log.lock().rendered.len() <= paused_at + 1);

    player.start();
    assert!(wait_until(Duration::from_secs(2), || {
        log.lock().rendered.len() > paused_at + 1
    }));
    player.release();
}

#[test]
fn stop_rewinds_and_start_replays() {
    let config = StreamConfig {
        frame_count: 6,
        fps: 100,
        keyframe_interval: 3,
        ..StreamConfig::default()
    };
    let (output, log) = RecordingOutput::new();
    let player = make_player(config, output);
    let callback = Arc::new(CountingCallback::default());
    player.set_callback(callback.clone());
    player.set_repeat(false);

    player.prepare();
    player.start();
    assert!(wait_until(Duration::from_secs(5), || {
        callback.ends.load(Ordering::SeqCst) == 1
    }));

    player.stop();
    assert!(wait_until(Duration::from_secs(1), || player.is_stopped()));
    assert_eq!(log.lock().stops, 1);

    player.start();
    assert!(wait_until(Duration::from_secs(5), || {
        callback.ends.load(Ordering::SeqCst) == 2
    }));
    // Second traversal rendered from the beginning again.
    let rendered = log.lock().rendered.clone();
    assert!(rendered.iter().filter(|&&pts| pts == 0).count() >= 2);
    player.release();
}

#[test]
fn unplayable_source_surfaces_error_callback() {
    let config = StreamConfig {
        playable: false,
        ..StreamConfig::default()
    };
    let (output, _log) = RecordingOutput::new();
    let player = make_player(config, output);
    let callback = Arc::new(CountingCallback::default());
    player.set_callback(callback.clone());

    player.prepare();

    assert!(wait_until(Duration::from_secs(2), || {
        !callback.errors.lock().is_empty()
    }));
    assert!(callback.errors.lock()[0].contains("not playable"));
    assert_eq!(player.state(), PlayState::Idle);
    player.release();
}

#[test]
fn wait_frame_returns_after_one_frame() {
    let config = StreamConfig {
        frame_count: 100,
        fps: 100,
        keyframe_interval: 10,
        ..StreamConfig::default()
    };
    let (output, log) = RecordingOutput::new();
    let player = make_player(config, output);
    player.set_repeat(false);

    player.prepare();
    player.start();
    assert!(wait_until(Duration::from_secs(5), || player.is_playing()));

    let before = log.lock().released.len();
    player.wait_frame();
    assert!(log.lock().released.len() > before || player.is_released());
    player.release();
}

#[test]
fn release_is_terminal_and_idempotent() {
    let config = StreamConfig {
        frame_count: 1000,
        fps: 100,
        keyframe_interval: 10,
        ..StreamConfig::default()
    };
    let (output, _log) = RecordingOutput::new();
    let player = Arc::new(make_player(config, output));
    player.prepare();
    player.start();
    assert!(wait_until(Duration::from_secs(5), || player.is_playing()));

    // A waiter blocked on frames must be woken by release.
    let waiter = {
        let player = Arc::clone(&player);
        thread::spawn(move || player.wait_frame_timeout(30.0))
    };
    thread::sleep(Duration::from_millis(20));

    player.release();
    player.release();
    assert!(waiter.join().is_ok());
    assert!(player.is_released());

    // Every further operation is a no-op.
    player.start();
    player.seek(1.0);
    thread::sleep(Duration::from_millis(50));
    assert!(player.is_released());
}

#[test]
fn current_time_tracks_presented_frames() {
    let config = StreamConfig {
        frame_count: 20,
        fps: 100,
        keyframe_interval: 10,
        ..StreamConfig::default()
    };
    let (output, _log) = RecordingOutput::new();
    let player = make_player(config, output);
    let callback = Arc::new(CountingCallback::default());
    player.set_callback(callback.clone());
    player.set_repeat(false);

    assert_eq!(player.current_time(), 0.0);
    player.prepare();
    player.start();
    assert!(wait_until(Duration::from_secs(5), || {
        callback.ends.load(Ordering::SeqCst) == 1
    }));
    assert!(player.current_time() >= 0.19 - 1e-9);
    player.release();
}

#[test]
fn size_listener_fires_on_prepare() {
    let config = StreamConfig {
        frame_count: 3,
        fps: 100,
        keyframe_interval: 3,
        ..StreamConfig::default()
    };
    let (output, _log) = RecordingOutput::new();
    let player = make_player(config, output);

    struct SizeProbe(Mutex<Vec<Resolution>>);
    impl hdrplay_player::VideoSizeListener for SizeProbe {
        fn on_video_size_change(&self, size: Resolution) {
            self.0.lock().push(size);
        }
    }
    let probe = Arc::new(SizeProbe(Mutex::new(Vec::new())));
    player.add_size_change_listener(probe.clone());

    player.prepare();
    assert!(wait_until(Duration::from_secs(2), || player.is_prepared()));
    assert_eq!(player.video_size(), Resolution::new(320, 180));
    assert_eq!(probe.0.lock().first().copied(), Some(Resolution::new(320, 180)));
    player.release();
}

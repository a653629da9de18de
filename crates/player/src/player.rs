//! The decode/playback state machine.
//!
//! One dedicated worker thread per player owns the decoder, extractor, and
//! pacing clock. Caller operations are posted as commands; the running
//! decoder reports through its event channel; the worker `select!`s over
//! both, so every operation and every protocol step executes strictly
//! serialized, in submission order.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam::channel::{unbounded, Receiver, Sender};
use crossbeam::select;
use parking_lot::{Condvar, Mutex};
use tracing::{debug, warn};

use hdrplay_common::{MediaFormat, MediaSource, MediaTime, PlayerError, Resolution, SourceError};
use hdrplay_media::{
    DecoderEvent, FramePayload, MediaExtractor, SampleChunk, SampleInfo, VideoDecoder,
};

use crate::callback::{CallbackDispatcher, CallbackHandler, PlayerCallback};
use crate::output::{VideoOutput, VideoSizeListener};
use crate::state::PlayState;
use crate::sync::TimeSyncer;

/// Frames later than this are dropped instead of shown stale.
const MAX_FRAME_JANK_MS: i64 = 50;

enum PlayerCommand {
    Prepare,
    Start,
    Pause,
    Stop,
    Seek(MediaTime),
    Release,
}

struct PlayerShared {
    state: Mutex<PlayState>,
    released: AtomicBool,
    has_end: AtomicBool,
    repeat: AtomicBool,
    syncer: TimeSyncer,
    callbacks: Mutex<CallbackHandler>,
    frame_signals: Mutex<u64>,
    frame_cond: Condvar,
    source: Mutex<Option<MediaSource>>,
    video_size: Mutex<Resolution>,
    size_listeners: Mutex<Vec<Arc<dyn VideoSizeListener>>>,
}

impl PlayerShared {
    fn new() -> Self {
        Self {
            state: Mutex::new(PlayState::Idle),
            released: AtomicBool::new(false),
            has_end: AtomicBool::new(false),
            // Looping playback is the historical default for this player.
            repeat: AtomicBool::new(true),
            syncer: TimeSyncer::new(),
            callbacks: Mutex::new(CallbackHandler::default()),
            frame_signals: Mutex::new(0),
            frame_cond: Condvar::new(),
            source: Mutex::new(None),
            video_size: Mutex::new(Resolution::default()),
            size_listeners: Mutex::new(Vec::new()),
        }
    }

    fn state(&self) -> PlayState {
        *self.state.lock()
    }

    fn set_state(&self, state: PlayState) {
        let mut current = self.state.lock();
        if *current != state {
            debug!(from = ?*current, to = ?state, "player state change");
            *current = state;
        }
    }

    fn callbacks(&self) -> CallbackHandler {
        self.callbacks.lock().clone()
    }

    /// Wake everyone blocked in `wait_frame`.
    fn signal_frame(&self) {
        {
            let mut signals = self.frame_signals.lock();
            *signals += 1;
        }
        self.frame_cond.notify_all();
    }
}

enum Flow {
    Continue,
    Exit,
}

struct PlayerWorker {
    shared: Arc<PlayerShared>,
    decoder: Box<dyn VideoDecoder>,
    extractor: Box<dyn MediaExtractor>,
    output: Box<dyn VideoOutput>,
    commands: Receiver<PlayerCommand>,
    decoder_events: Option<Receiver<DecoderEvent>>,
    seek_pending: Option<MediaTime>,
    /// Whether the frame owning the next release event passed the state and
    /// seek filters (and therefore gets paced and reported).
    pace_release: bool,
}

impl PlayerWorker {
    fn run(mut self) {
        loop {
            // Clone the channel handles so the select borrows locals, not
            // fields the handlers need mutable access to.
            let commands = self.commands.clone();
            let flow = match self.decoder_events.clone() {
                Some(events) => {
                    select! {
                        recv(commands) -> command => match command {
                            Ok(command) => self.handle_command(command),
                            Err(_) => Flow::Exit,
                        },
                        recv(events) -> event => {
                            match event {
                                Ok(event) => self.handle_event(event),
                                Err(_) => self.decoder_events = None,
                            }
                            Flow::Continue
                        }
                    }
                }
                None => match commands.recv() {
                    Ok(command) => self.handle_command(command),
                    Err(_) => Flow::Exit,
                },
            };
            if matches!(flow, Flow::Exit) {
                break;
            }
        }
        debug!("player worker exit");
    }

    fn handle_command(&mut self, command: PlayerCommand) -> Flow {
        if self.shared.released.load(Ordering::SeqCst)
            && !matches!(command, PlayerCommand::Release)
        {
            return Flow::Continue;
        }
        match command {
            PlayerCommand::Prepare => self.on_play_prepare(),
            PlayerCommand::Start => self.on_play_start(),
            PlayerCommand::Pause => self.on_play_pause(),
            PlayerCommand::Stop => self.on_play_stop(),
            PlayerCommand::Seek(target) => self.on_play_seek(target),
            PlayerCommand::Release => {
                self.on_play_release();
                return Flow::Exit;
            }
        }
        Flow::Continue
    }

    fn on_play_prepare(&mut self) {
        match self.shared.state() {
            PlayState::Idle | PlayState::Stopped => match self.do_prepare() {
                Ok(()) => self.shared.set_state(PlayState::Prepared),
                Err(error) => self.shared.callbacks().call_error(error),
            },
            state => warn!(?state, "prepare ignored"),
        }
    }

    fn do_prepare(&mut self) -> Result<(), PlayerError> {
        let source = self
            .shared
            .source
            .lock()
            .clone()
            .ok_or(SourceError::NoSource)?;
        self.extractor.set_source(&source)?;
        if !self.extractor.is_available() {
            return Err(SourceError::Unplayable {
                path: source.path().display().to_string(),
            }
            .into());
        }

        let format = MediaFormat {
            mime: self.extractor.mime_type(),
            width: self.extractor.width(),
            height: self.extractor.height(),
            profile: self.extractor.profile(),
            level: self.extractor.profile_level(),
            max_input_size: self.extractor.max_input_size(),
            color_standard: self.extractor.color_standard(),
            color_range: self.extractor.color_range(),
            color_transfer: self.extractor.color_transfer(),
            csd0: self.extractor.csd0(),
            csd1: self.extractor.csd1(),
            ..Default::default()
        };
        self.update_video_size(format.resolution());

        // The output picks the ingestion mode and configures the decoder's
        // output side before the decoder sees the format.
        self.output.on_decoder_prepare(self.decoder.as_mut(), &format)?;

        let (events_tx, events_rx) = unbounded();
        self.decoder.configure(&format, events_tx)?;
        self.decoder_events = Some(events_rx);
        Ok(())
    }

    fn on_play_start(&mut self) {
        match self.shared.state() {
            PlayState::Prepared => {
                self.decoder.start();
                self.shared.set_state(PlayState::Playing);
            }
            PlayState::Paused => {
                self.decoder.resume();
                self.shared.set_state(PlayState::Playing);
            }
            PlayState::Stopped => {
                // A stopped decoder needs a fresh configure before it can run.
                match self.do_prepare() {
                    Ok(()) => {
                        self.decoder.start();
                        self.shared.set_state(PlayState::Playing);
                    }
                    Err(error) => self.shared.callbacks().call_error(error),
                }
            }
            PlayState::Playing => {}
            state => warn!(?state, "start ignored"),
        }
    }

    fn on_play_pause(&mut self) {
        if self.shared.state().is_playing() {
            self.decoder.pause();
            self.shared.syncer.flush();
            self.shared.set_state(PlayState::Paused);
        }
    }

    fn on_play_stop(&mut self) {
        match self.shared.state() {
            PlayState::Prepared | PlayState::Playing | PlayState::Paused => {
                self.decoder.stop();
                self.extractor.seek_pre_sync(MediaTime::ZERO);
                self.shared.syncer.reset();
                self.shared.has_end.store(false, Ordering::SeqCst);
                self.seek_pending = None;
                self.output.on_output_stop();
                self.decoder_events = None;
                self.shared.set_state(PlayState::Stopped);
                self.shared.signal_frame();
            }
            state => warn!(?state, "stop ignored"),
        }
    }

    fn on_play_seek(&mut self, target: MediaTime) {
        match self.shared.state() {
            PlayState::Prepared | PlayState::Playing | PlayState::Paused => {
                self.do_seek(target);
            }
            state => warn!(?state, "seek ignored"),
        }
    }

    fn do_seek(&mut self, target: MediaTime) {
        debug!(%target, "seek");
        self.decoder.flush();
        self.shared.syncer.flush();
        self.seek_pending = Some(target);
        self.extractor.seek_pre_sync(target);
        self.shared.has_end.store(false, Ordering::SeqCst);
    }

    fn on_play_release(&mut self) {
        self.extractor.release();
        self.decoder.release();
        self.output.release();
        self.decoder_events = None;
        self.shared.set_state(PlayState::Released);
        self.shared.signal_frame();
    }

    fn handle_event(&mut self, event: DecoderEvent) {
        if self.shared.released.load(Ordering::SeqCst) {
            Self::acknowledge(event);
            return;
        }
        match event {
            DecoderEvent::InputRequested { reply } => {
                let mut data = Vec::new();
                let info = self.extractor.read_sample(&mut data);
                self.extractor.advance();
                let _ = reply.send(SampleChunk { data, info });
            }
            DecoderEvent::OutputReady { pts, payload, reply } => {
                let render = self.decide_render(pts, &payload);
                let _ = reply.send(render);
            }
            DecoderEvent::OutputReleased { pts, rendered, done } => {
                let pace = self.pace_release;
                self.pace_release = false;
                if pace {
                    let delay = self.shared.syncer.sync(pts);
                    let delay_ms = delay.as_millis();
                    if delay_ms > 0 {
                        thread::sleep(Duration::from_millis(delay_ms as u64));
                    }
                }
                self.output.on_buffer_release(pts, rendered);
                if pace {
                    self.shared.callbacks().call_process(pts.as_secs());
                }
                self.shared.signal_frame();
                let _ = done.send(());
            }
            DecoderEvent::FormatChanged(format) => {
                self.update_video_size(format.display_size());
                self.output.on_format_changed(&format);
            }
            DecoderEvent::EndOfStream => {
                self.shared.callbacks().call_end();
                self.shared.has_end.store(true, Ordering::SeqCst);
                self.shared.signal_frame();
                if self.shared.repeat.load(Ordering::SeqCst) {
                    self.do_seek(MediaTime::ZERO);
                }
            }
            DecoderEvent::Error(error) => {
                self.shared.callbacks().call_error(error.into());
            }
        }
    }

    /// Unblock a decoder event without acting on it (post-release).
    fn acknowledge(event: DecoderEvent) {
        match event {
            DecoderEvent::InputRequested { reply } => {
                let _ = reply.send(SampleChunk {
                    data: Vec::new(),
                    info: SampleInfo {
                        size: 0,
                        pts: MediaTime::ZERO,
                        is_keyframe: false,
                        end_of_stream: true,
                    },
                });
            }
            DecoderEvent::OutputReady { reply, .. } => {
                let _ = reply.send(false);
            }
            DecoderEvent::OutputReleased { done, .. } => {
                let _ = done.send(());
            }
            _ => {}
        }
    }

    /// The render/drop decision for one decoded frame.
    fn decide_render(&mut self, pts: MediaTime, payload: &FramePayload) -> bool {
        self.pace_release = false;
        if !self.shared.state().is_playing() {
            return false;
        }
        if let Some(target) = self.seek_pending {
            if pts < target {
                debug!(%pts, %target, "dropping pre-seek frame");
                return false;
            }
            self.seek_pending = None;
        }
        self.pace_release = true;
        let delay = self.shared.syncer.sync(pts);
        if delay.as_millis() <= -MAX_FRAME_JANK_MS {
            debug!(%pts, delay_ms = delay.as_millis(), "dropping late frame");
            return false;
        }
        self.output.on_buffer_available(payload, pts);
        self.output.on_buffer_render(pts)
    }

    fn update_video_size(&self, size: Resolution) {
        let changed = {
            let mut current = self.shared.video_size.lock();
            if *current != size {
                *current = size;
                true
            } else {
                false
            }
        };
        if changed {
            debug!(%size, "video size change");
            let listeners = self.shared.size_listeners.lock().clone();
            for listener in listeners {
                listener.on_video_size_change(size);
            }
        }
    }
}

/// HDR-capable video player.
///
/// Construct with a decoder, an extractor, and a video output; the player
/// owns all three for its lifetime. All mutating operations except
/// `set_source`, `set_callback`, and `set_repeat` are posted to the worker
/// thread and run in submission order.
pub struct VideoPlayer {
    shared: Arc<PlayerShared>,
    commands: Sender<PlayerCommand>,
    worker: Option<JoinHandle<()>>,
}

impl VideoPlayer {
    pub fn new(
        decoder: Box<dyn VideoDecoder>,
        extractor: Box<dyn MediaExtractor>,
        output: Box<dyn VideoOutput>,
    ) -> Self {
        Self::with_thread_name(decoder, extractor, output, "video-player")
    }

    pub fn with_thread_name(
        decoder: Box<dyn VideoDecoder>,
        extractor: Box<dyn MediaExtractor>,
        output: Box<dyn VideoOutput>,
        thread_name: &str,
    ) -> Self {
        let shared = Arc::new(PlayerShared::new());
        let (commands_tx, commands_rx) = unbounded();
        let worker = PlayerWorker {
            shared: Arc::clone(&shared),
            decoder,
            extractor,
            output,
            commands: commands_rx,
            decoder_events: None,
            seek_pending: None,
            pace_release: false,
        };
        let handle = thread::Builder::new()
            .name(thread_name.to_string())
            .spawn(move || worker.run())
            .expect("spawn player worker");
        Self {
            shared,
            commands: commands_tx,
            worker: Some(handle),
        }
    }

    fn post(&self, command: PlayerCommand) {
        if self.shared.released.load(Ordering::SeqCst) {
            return;
        }
        let _ = self.commands.send(command);
    }

    pub fn set_source(&self, source: MediaSource) {
        *self.shared.source.lock() = Some(source);
    }

    pub fn prepare(&self) {
        self.post(PlayerCommand::Prepare);
    }

    pub fn start(&self) {
        self.post(PlayerCommand::Start);
    }

    pub fn pause(&self) {
        self.post(PlayerCommand::Pause);
    }

    pub fn stop(&self) {
        self.post(PlayerCommand::Stop);
    }

    pub fn seek(&self, time_secs: f64) {
        self.post(PlayerCommand::Seek(MediaTime::from_secs(time_secs)));
    }

    pub fn set_repeat(&self, repeat: bool) {
        self.shared.repeat.store(repeat, Ordering::SeqCst);
    }

    /// Terminal, idempotent. Pending operations are skipped, frame waiters
    /// woken; in-flight decoder work drains without rendering.
    pub fn release(&self) {
        if self.shared.released.swap(true, Ordering::SeqCst) {
            return;
        }
        let _ = self.commands.send(PlayerCommand::Release);
        self.shared.signal_frame();
    }

    pub fn state(&self) -> PlayState {
        self.shared.state()
    }

    pub fn is_playing(&self) -> bool {
        self.state().is_playing()
    }

    pub fn is_paused(&self) -> bool {
        self.state().is_paused()
    }

    pub fn is_stopped(&self) -> bool {
        self.state().is_stopped()
    }

    pub fn is_prepared(&self) -> bool {
        self.state().is_prepared()
    }

    pub fn is_released(&self) -> bool {
        self.shared.released.load(Ordering::SeqCst)
    }

    /// Current playback position in seconds (last presented timestamp).
    pub fn current_time(&self) -> f64 {
        self.shared.syncer.current_time().as_secs()
    }

    pub fn set_callback(&self, callback: Arc<dyn PlayerCallback>) {
        self.shared.callbacks.lock().set_callback(Some(callback), None);
    }

    pub fn set_callback_with_dispatcher(
        &self,
        callback: Arc<dyn PlayerCallback>,
        dispatcher: Arc<dyn CallbackDispatcher>,
    ) {
        self.shared
            .callbacks
            .lock()
            .set_callback(Some(callback), Some(dispatcher));
    }

    /// Block until one frame is rendered or dropped (or playback stops,
    /// reaches end of stream, or is released).
    pub fn wait_frame(&self) {
        self.wait_frame_timeout(0.0);
    }

    /// Like [`wait_frame`](Self::wait_frame) with an upper bound: waits until
    /// playback stops, ends, or `timeout_secs` elapses. A timeout of zero
    /// waits for exactly one frame signal.
    pub fn wait_frame_timeout(&self, timeout_secs: f64) {
        let shared = &*self.shared;
        let deadline = if timeout_secs > 0.0 {
            Some(Instant::now() + Duration::from_secs_f64(timeout_secs))
        } else {
            None
        };
        let mut signals = shared.frame_signals.lock();
        let seen = *signals;
        while shared.state().is_playing()
            && !shared.has_end.load(Ordering::SeqCst)
            && !shared.released.load(Ordering::SeqCst)
        {
            match deadline {
                None => {
                    shared.frame_cond.wait(&mut signals);
                    if *signals != seen {
                        return;
                    }
                }
                Some(deadline) => {
                    if Instant::now() >= deadline {
                        return;
                    }
                    let _ = shared.frame_cond.wait_until(&mut signals, deadline);
                    if Instant::now() >= deadline {
                        return;
                    }
                }
            }
        }
    }

    pub fn video_size(&self) -> Resolution {
        *self.shared.video_size.lock()
    }

    pub fn width(&self) -> u32 {
        self.video_size().width
    }

    pub fn height(&self) -> u32 {
        self.video_size().height
    }

    pub fn add_size_change_listener(&self, listener: Arc<dyn VideoSizeListener>) {
        let mut listeners = self.shared.size_listeners.lock();
        if listeners.iter().any(|l| Arc::ptr_eq(l, &listener)) {
            return;
        }
        listeners.push(listener);
    }

    pub fn remove_size_change_listener(&self, listener: &Arc<dyn VideoSizeListener>) {
        self.shared
            .size_listeners
            .lock()
            .retain(|l| !Arc::ptr_eq(l, listener));
    }
}

impl Drop for VideoPlayer {
    fn drop(&mut self) {
        self.release();
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }
}

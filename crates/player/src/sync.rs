//! Presentation-time pacing clock.
//!
//! Playback has no audio track to slave to, so frames are paced against the
//! wall clock: the first `sync` after construction (or a flush) anchors a
//! (wall time, pts) pair, and every later `sync` reports how far ahead of
//! or behind that line the frame is.

use std::time::Instant;

use parking_lot::Mutex;

use hdrplay_common::MediaTime;

#[derive(Debug, Default)]
struct SyncerState {
    /// Wall-clock / presentation-time anchor of the current epoch.
    anchor: Option<(Instant, MediaTime)>,
    /// Most recently synced pts; drives `current_time`.
    last_pts: MediaTime,
}

/// Wall-clock pacing primitive.
///
/// Thread-safe behind one small lock: the worker syncs while any thread may
/// query `current_time`.
#[derive(Debug, Default)]
pub struct TimeSyncer {
    state: Mutex<SyncerState>,
}

impl TimeSyncer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report the signed presentation delay for `pts`.
    ///
    /// Positive: the caller should wait that long before showing the frame.
    /// Negative: the frame is already late by that amount. The first call
    /// of an anchor epoch returns zero and establishes the anchor.
    pub fn sync(&self, pts: MediaTime) -> MediaTime {
        let now = Instant::now();
        let mut state = self.state.lock();
        state.last_pts = pts;
        match state.anchor {
            None => {
                state.anchor = Some((now, pts));
                MediaTime::ZERO
            }
            Some((anchor_wall, anchor_pts)) => {
                let elapsed_us = now.duration_since(anchor_wall).as_micros() as i64;
                (pts - anchor_pts) - MediaTime::from_micros(elapsed_us)
            }
        }
    }

    /// Discard the anchor only. The next `sync` re-anchors, so pacing
    /// restarts cleanly after a pause or seek.
    pub fn flush(&self) {
        self.state.lock().anchor = None;
    }

    /// Discard the anchor and all residual timing state (stop).
    pub fn reset(&self) {
        let mut state = self.state.lock();
        state.anchor = None;
        state.last_pts = MediaTime::ZERO;
    }

    /// The most recently synced presentation time.
    pub fn current_time(&self) -> MediaTime {
        self.state.lock().last_pts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_sync_anchors_and_returns_zero() {
        let syncer = TimeSyncer::new();
        assert_eq!(syncer.sync(MediaTime::from_micros(500_000)), MediaTime::ZERO);
    }

    #[test]
    fn delay_tracks_pts_spacing() {
        let syncer = TimeSyncer::new();
        let t0 = MediaTime::from_micros(1_000_000);
        syncer.sync(t0);
        let delay = syncer.sync(t0 + MediaTime::from_micros(40_000));
        // No wall-clock time has meaningfully passed, so the delay is the
        // pts delta (allow a few ms of test scheduling slack).
        assert!(delay.as_micros() > 30_000 && delay.as_micros() <= 40_000);
    }

    #[test]
    fn flush_restarts_the_epoch() {
        let syncer = TimeSyncer::new();
        syncer.sync(MediaTime::from_micros(1_000_000));
        syncer.flush();
        let delay = syncer.sync(MediaTime::from_micros(9_000_000));
        assert_eq!(delay, MediaTime::ZERO);
    }

    #[test]
    fn late_frames_report_negative_delay() {
        let syncer = TimeSyncer::new();
        let t0 = MediaTime::from_micros(1_000_000);
        syncer.sync(t0);
        // A pts behind the anchor is already late.
        let delay = syncer.sync(t0 - MediaTime::from_micros(100_000));
        assert!(delay.as_micros() <= -100_000);
    }

    #[test]
    fn current_time_follows_sync_and_reset() {
        let syncer = TimeSyncer::new();
        assert_eq!(syncer.current_time(), MediaTime::ZERO);
        syncer.sync(MediaTime::from_micros(2_500_000));
        assert_eq!(syncer.current_time().as_micros(), 2_500_000);

        // Flush keeps the position (pause must not rewind the UI).
        syncer.flush();
        assert_eq!(syncer.current_time().as_micros(), 2_500_000);

        syncer.reset();
        assert_eq!(syncer.current_time(), MediaTime::ZERO);
    }
}

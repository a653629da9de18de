//! Player callbacks and optional dispatch context.

use std::sync::Arc;

use hdrplay_common::PlayerError;

/// Progress/end/error notifications from a running player.
///
/// Invoked from the player's worker thread unless a dispatcher is set.
pub trait PlayerCallback: Send + Sync {
    fn on_play_process(&self, _time_secs: f64) {}

    fn on_play_end(&self) {}

    fn on_play_error(&self, _error: &PlayerError) {}
}

/// Execution context for callback delivery (e.g. a UI event loop handle).
pub trait CallbackDispatcher: Send + Sync {
    fn dispatch(&self, task: Box<dyn FnOnce() + Send>);
}

/// Holds the registered callback and routes notifications through the
/// dispatcher when one is set, inline otherwise.
#[derive(Clone, Default)]
pub struct CallbackHandler {
    callback: Option<Arc<dyn PlayerCallback>>,
    dispatcher: Option<Arc<dyn CallbackDispatcher>>,
}

impl CallbackHandler {
    pub fn set_callback(
        &mut self,
        callback: Option<Arc<dyn PlayerCallback>>,
        dispatcher: Option<Arc<dyn CallbackDispatcher>>,
    ) {
        self.callback = callback;
        self.dispatcher = dispatcher;
    }

    fn run(&self, task: impl FnOnce(&dyn PlayerCallback) + Send + 'static) {
        let Some(callback) = self.callback.clone() else {
            return;
        };
        match &self.dispatcher {
            Some(dispatcher) => dispatcher.dispatch(Box::new(move || task(callback.as_ref()))),
            None => task(callback.as_ref()),
        }
    }

    pub fn call_process(&self, time_secs: f64) {
        self.run(move |cb| cb.on_play_process(time_secs));
    }

    pub fn call_end(&self) {
        self.run(|cb| cb.on_play_end());
    }

    pub fn call_error(&self, error: PlayerError) {
        self.run(move |cb| cb.on_play_error(&error));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recording {
        processed: Mutex<Vec<f64>>,
        ended: AtomicUsize,
        errors: AtomicUsize,
    }

    impl PlayerCallback for Recording {
        fn on_play_process(&self, time_secs: f64) {
            self.processed.lock().unwrap().push(time_secs);
        }
        fn on_play_end(&self) {
            self.ended.fetch_add(1, Ordering::SeqCst);
        }
        fn on_play_error(&self, _error: &PlayerError) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Dispatcher that counts tasks and runs them inline.
    struct Counting(AtomicUsize);

    impl CallbackDispatcher for Counting {
        fn dispatch(&self, task: Box<dyn FnOnce() + Send>) {
            self.0.fetch_add(1, Ordering::SeqCst);
            task();
        }
    }

    #[test]
    fn inline_delivery_without_dispatcher() {
        let recording = Arc::new(Recording::default());
        let mut handler = CallbackHandler::default();
        handler.set_callback(Some(recording.clone()), None);

        handler.call_process(1.25);
        handler.call_end();

        assert_eq!(*recording.processed.lock().unwrap(), vec![1.25]);
        assert_eq!(recording.ended.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dispatcher_receives_every_notification() {
        let recording = Arc::new(Recording::default());
        let dispatcher = Arc::new(Counting(AtomicUsize::new(0)));
        let mut handler = CallbackHandler::default();
        handler.set_callback(Some(recording.clone()), Some(dispatcher.clone()));

        handler.call_process(0.5);
        handler.call_error(
            hdrplay_common::SourceError::NoSource.into(),
        );

        assert_eq!(dispatcher.0.load(Ordering::SeqCst), 2);
        assert_eq!(recording.errors.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn no_callback_is_a_quiet_no_op() {
        let handler = CallbackHandler::default();
        handler.call_process(1.0);
        handler.call_end();
    }
}

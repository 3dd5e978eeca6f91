// SPDX-License-Identifier: GPL-3.0-only
//! Capture thread lifecycle
//!
//! The V4L2 source dequeues buffers on its own thread so that decoding and
//! rotation overlap with the session tick. This controller owns that thread:
//! it runs an init closure once, then the loop closure until either the loop
//! asks to stop or the controller is stopped/dropped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, mpsc};
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

/// Action returned by the capture loop callback to control loop behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopAction {
    Continue,
    Stop,
}

/// Controller for a capture loop running in a separate thread
pub struct CaptureLoopController {
    thread_handle: Option<JoinHandle<()>>,
    stop_signal: Arc<AtomicBool>,
    name: String,
}

impl CaptureLoopController {
    /// Start a capture loop with per-thread state
    ///
    /// `init_fn` runs on the new thread and builds the loop state there, so
    /// the state itself does not need to be `Send` (mmap'd V4L2 streams are
    /// not). Returns once `init_fn` has finished; its error, or a failure to
    /// spawn the thread, is returned and the loop never runs.
    pub fn start_with_init<S, I, F>(name: &str, init_fn: I, mut loop_fn: F) -> Result<Self, String>
    where
        S: 'static,
        I: FnOnce() -> Result<S, String> + Send + 'static,
        F: FnMut(&mut S) -> LoopAction + Send + 'static,
    {
        let stop_signal = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop_signal);
        let thread_name = name.to_string();
        let (ready_tx, ready_rx) = mpsc::sync_channel::<Result<(), String>>(1);

        info!(name = %name, "Starting capture loop");

        let thread_handle = thread::Builder::new()
            .name(thread_name.clone())
            .spawn(move || {
                let mut state = match init_fn() {
                    Ok(s) => {
                        let _ = ready_tx.send(Ok(()));
                        s
                    }
                    Err(e) => {
                        warn!(name = %thread_name, error = %e, "Capture loop initialization failed");
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };

                while !thread_stop.load(Ordering::SeqCst) {
                    if loop_fn(&mut state) == LoopAction::Stop {
                        debug!(name = %thread_name, "Loop requested stop");
                        break;
                    }
                }

                info!(name = %thread_name, "Capture loop thread exiting");
            })
            .map_err(|e| format!("failed to spawn capture thread: {}", e))?;

        let ready = ready_rx
            .recv()
            .unwrap_or_else(|_| Err("capture thread exited during initialization".to_string()));
        if let Err(e) = ready {
            let _ = thread_handle.join();
            return Err(e);
        }

        Ok(Self {
            thread_handle: Some(thread_handle),
            stop_signal,
            name: name.to_string(),
        })
    }

    /// Signal the loop to stop without waiting
    pub fn request_stop(&self) {
        debug!(name = %self.name, "Requesting capture loop stop");
        self.stop_signal.store(true, Ordering::SeqCst);
    }

    /// Stop the loop and wait for the thread to finish
    pub fn stop(&mut self) {
        self.request_stop();
        self.join();
    }

    /// Wait for the thread to finish without sending stop signal
    pub fn join(&mut self) {
        if let Some(handle) = self.thread_handle.take()
            && handle.join().is_err()
        {
            warn!(name = %self.name, "Capture loop thread panicked");
        }
    }
}

impl Drop for CaptureLoopController {
    fn drop(&mut self) {
        if self.thread_handle.is_some() {
            debug!(name = %self.name, "CaptureLoopController dropped, stopping loop");
            self.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;
    use std::time::Duration;

    #[test]
    fn test_loop_stops_itself() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = Arc::clone(&counter);

        let mut controller = CaptureLoopController::start_with_init(
            "test-loop",
            || Ok(()),
            move |_| {
                let count = counter_clone.fetch_add(1, Ordering::SeqCst);
                if count >= 10 {
                    LoopAction::Stop
                } else {
                    LoopAction::Continue
                }
            },
        )
        .unwrap();

        controller.join();
        assert_eq!(counter.load(Ordering::SeqCst), 11);
    }

    #[test]
    fn test_stop_signal() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = Arc::clone(&counter);

        let mut controller = CaptureLoopController::start_with_init(
            "test-stop",
            || Ok(()),
            move |_| {
                counter_clone.fetch_add(1, Ordering::SeqCst);
                thread::sleep(Duration::from_millis(5));
                LoopAction::Continue
            },
        )
        .unwrap();

        thread::sleep(Duration::from_millis(30));
        controller.stop();
        assert!(counter.load(Ordering::SeqCst) > 0);
        assert!(controller.thread_handle.is_none());
    }

    #[test]
    fn test_state_is_built_on_thread() {
        // Rc is !Send: only compiles because state never crosses threads
        let seen = Arc::new(AtomicU32::new(0));
        let seen_clone = Arc::clone(&seen);

        let mut controller = CaptureLoopController::start_with_init(
            "test-init",
            || Ok(std::rc::Rc::new(42u32)),
            move |state| {
                seen_clone.store(**state, Ordering::SeqCst);
                LoopAction::Stop
            },
        )
        .unwrap();

        controller.join();
        assert_eq!(seen.load(Ordering::SeqCst), 42);
    }

    #[test]
    fn test_init_failure_is_reported_to_caller() {
        let ran = Arc::new(AtomicBool::new(false));
        let ran_clone = Arc::clone(&ran);

        let result = CaptureLoopController::start_with_init(
            "test-fail-init",
            || Err::<(), _>("no device".to_string()),
            move |_: &mut ()| {
                ran_clone.store(true, Ordering::SeqCst);
                LoopAction::Stop
            },
        );

        assert_eq!(result.err(), Some("no device".to_string()));
        assert!(!ran.load(Ordering::SeqCst));
    }
}

// SPDX-License-Identifier: GPL-3.0-only

//! Worker thread lifecycle
//!
//! One worker runs per active mode (detecting or calibrating). The
//! controller owns the stop flag and the join handle; mode transitions stop
//! and join the current worker before spawning the next, so the sensor and
//! the reference frame never have two owners.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use tracing::{debug, info, warn};

/// What the loop body wants to happen next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopAction {
    Continue,
    Stop,
}

/// Handle to a worker loop running on its own thread
pub struct WorkerHandle {
    thread: Option<JoinHandle<()>>,
    stop_flag: Arc<AtomicBool>,
    name: &'static str,
}

impl WorkerHandle {
    /// Spawn a worker that runs `body` until it returns [`LoopAction::Stop`]
    /// or [`request_stop`] is called. The cancel flag is polled at the top
    /// of every iteration.
    ///
    /// [`request_stop`]: WorkerHandle::request_stop
    pub fn spawn<F>(name: &'static str, mut body: F) -> Self
    where
        F: FnMut() -> LoopAction + Send + 'static,
    {
        let stop_flag = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop_flag);

        info!(name, "Starting worker");
        let thread = thread::spawn(move || {
            loop {
                if flag.load(Ordering::SeqCst) {
                    debug!(name, "Worker observed stop request");
                    break;
                }
                if body() == LoopAction::Stop {
                    debug!(name, "Worker loop finished");
                    break;
                }
            }
            info!(name, "Worker exiting");
        });

        Self {
            thread: Some(thread),
            stop_flag,
            name,
        }
    }

    /// A clone of the cancel flag, for wiring into signal handlers
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop_flag)
    }

    /// Ask the worker to stop without waiting for it
    pub fn request_stop(&self) {
        self.stop_flag.store(true, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Wait for the worker thread to finish
    pub fn join(&mut self) {
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!(name = self.name, "Worker thread panicked");
            }
        }
    }

    /// Stop the worker and wait until it is gone. This is the only safe
    /// point to hand its resources to a new worker.
    pub fn stop(&mut self) {
        self.request_stop();
        self.join();
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        if self.thread.is_some() {
            self.stop();
        }
    }
}

//! Repeating background tick for the recording screen.
//!
//! Each wait starts a full interval, so a ticker restarted after a pause does
//! not catch up on time spent paused. `cancel` joins the thread: once it
//! returns, the callback will not run again.

use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

pub struct Ticker {
    stop: Arc<(Mutex<bool>, Condvar)>,
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    /// Call `on_tick` every `interval` until cancelled or dropped
    pub fn start<F>(interval: Duration, mut on_tick: F) -> std::io::Result<Self>
    where
        F: FnMut() + Send + 'static,
    {
        let stop = Arc::new((Mutex::new(false), Condvar::new()));
        let signal = stop.clone();

        let handle = std::thread::Builder::new()
            .name("kickcount-ticker".to_string())
            .spawn(move || {
                let (lock, cvar) = &*signal;
                let mut stopped = lock.lock().unwrap_or_else(|e| e.into_inner());
                loop {
                    let (guard, timeout) = cvar
                        .wait_timeout_while(stopped, interval, |stopped| !*stopped)
                        .unwrap_or_else(|e| e.into_inner());
                    stopped = guard;
                    if *stopped {
                        break;
                    }
                    if timeout.timed_out() {
                        // Release the flag while the callback runs so cancel can proceed
                        drop(stopped);
                        on_tick();
                        stopped = lock.lock().unwrap_or_else(|e| e.into_inner());
                    }
                }
            })?;

        Ok(Self {
            stop,
            handle: Some(handle),
        })
    }

    pub fn is_active(&self) -> bool {
        self.handle.is_some()
    }

    pub fn cancel(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        let (lock, cvar) = &*self.stop;
        *lock.lock().unwrap_or_else(|e| e.into_inner()) = true;
        cvar.notify_all();
        if handle.join().is_err() {
            tracing::warn!("ticker thread panicked");
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.cancel();
    }
}

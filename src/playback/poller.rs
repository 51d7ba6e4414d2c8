// src/playback/poller.rs

use std::io;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Handle given to each tick; lets it sleep without outliving a cancel.
pub struct Ticker {
    cancel_rx: Receiver<()>,
}

impl Ticker {
    /// Sleeps for `d`. Returns `false` if the poller was cancelled meanwhile.
    pub fn wait(&self, d: Duration) -> bool {
        matches!(self.cancel_rx.recv_timeout(d), Err(RecvTimeoutError::Timeout))
    }
}

/// A periodic task on its own thread, cancelled deterministically.
///
/// `cancel` (and drop) signal the thread and join it, so once it returns no
/// tick is running or will run again.
pub struct Poller {
    cancel_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
    active: Arc<AtomicBool>,
}

impl Poller {
    pub fn spawn<F>(name: &str, period: Duration, mut tick: F) -> io::Result<Self>
    where
        F: FnMut(&Ticker) -> ControlFlow<()> + Send + 'static,
    {
        let (cancel_tx, cancel_rx) = mpsc::channel();
        let active = Arc::new(AtomicBool::new(true));
        let thread_active = active.clone();

        let handle = thread::Builder::new().name(name.to_string()).spawn(move || {
            let ticker = Ticker { cancel_rx };
            while ticker.wait(period) {
                if tick(&ticker).is_break() {
                    break;
                }
            }
            thread_active.store(false, Ordering::Release);
        })?;

        Ok(Self {
            cancel_tx: Some(cancel_tx),
            handle: Some(handle),
            active,
        })
    }

    /// True until the task has returned, whether it finished or was cancelled.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub fn cancel(&mut self) {
        if let Some(tx) = self.cancel_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            if handle.thread().id() == thread::current().id() {
                return;
            }
            let _ = handle.join();
        }
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.cancel();
    }
}

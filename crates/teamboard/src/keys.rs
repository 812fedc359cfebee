#![forbid(unsafe_code)]

//! Terminal key reader.
//!
//! Runs on its own thread and only ever posts actions through a
//! [`Dispatcher`]; the dashboard applies them on its next tick.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossterm::event;
use tracing::{debug, warn};

use teamboard_runtime::{Dispatch, Dispatcher, KeyEvent};

const POLL: Duration = Duration::from_millis(100);

#[derive(Debug)]
pub struct KeyReader {
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl KeyReader {
    pub fn spawn(dispatcher: Dispatcher) -> io::Result<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);
        let thread = thread::Builder::new()
            .name("keys".to_owned())
            .spawn(move || read_loop(&dispatcher, &flag))?;
        Ok(Self {
            stop,
            thread: Some(thread),
        })
    }
}

fn read_loop(dispatcher: &Dispatcher, stop: &AtomicBool) {
    while !stop.load(Ordering::Acquire) {
        match event::poll(POLL) {
            Ok(false) => continue,
            Ok(true) => {}
            Err(err) => {
                warn!(event = "keys.poll_failed", error = %err);
                return;
            }
        }
        let raw = match event::read() {
            Ok(raw) => raw,
            Err(err) => {
                warn!(event = "keys.read_failed", error = %err);
                return;
            }
        };
        let Some(key) = KeyEvent::from_crossterm(&raw) else {
            continue;
        };
        if dispatcher.dispatch(&key) == Dispatch::Quit {
            debug!(event = "keys.quit");
            return;
        }
    }
}

impl Drop for KeyReader {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

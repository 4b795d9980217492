// The system clipboard is driven from a worker thread that keeps one
// `arboard::Clipboard` alive (on X11 the contents vanish with it). Results
// come back over a channel; when the primary write fails the UI thread tries
// a fallback backend. Callers only ever see CopyOutcome.

use crossbeam_channel::{unbounded, Receiver, Sender};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClipboardError {
    #[error("clipboard unavailable: {0}")]
    Unavailable(String),
    #[error("clipboard write failed: {0}")]
    WriteFailed(String),
}

pub trait ClipboardBackend {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

#[derive(Default)]
pub struct SystemClipboard {
    inner: Option<arboard::Clipboard>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ClipboardBackend for SystemClipboard {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        if self.inner.is_none() {
            let clipboard = arboard::Clipboard::new()
                .map_err(|e| ClipboardError::Unavailable(e.to_string()))?;
            self.inner = Some(clipboard);
        }

        let Some(clipboard) = self.inner.as_mut() else {
            return Err(ClipboardError::Unavailable("not initialized".to_string()));
        };

        if let Err(e) = clipboard.set_text(text.to_string()) {
            self.inner = None;
            return Err(ClipboardError::WriteFailed(e.to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyTarget {
    Hex,
    Css,
    Rgb,
}

impl CopyTarget {
    pub fn label(self) -> &'static str {
        match self {
            CopyTarget::Hex => "HEX",
            CopyTarget::Css => "RGBA",
            CopyTarget::Rgb => "RGB",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyOutcome {
    Copied,
    Failed,
}

pub fn finish_copy(
    primary: Result<(), ClipboardError>,
    fallback: &mut dyn ClipboardBackend,
    text: &str,
) -> CopyOutcome {
    let Err(primary_err) = primary else {
        return CopyOutcome::Copied;
    };

    crate::log_warn!("Primary clipboard failed ({}), trying fallback", primary_err);
    match fallback.write_text(text) {
        Ok(()) => CopyOutcome::Copied,
        Err(e) => {
            crate::log_error!("Clipboard fallback failed: {}", e);
            CopyOutcome::Failed
        }
    }
}

pub fn copy_with_fallback(
    primary: &mut dyn ClipboardBackend,
    fallback: &mut dyn ClipboardBackend,
    text: &str,
) -> CopyOutcome {
    let result = primary.write_text(text);
    finish_copy(result, fallback, text)
}

#[derive(Debug)]
pub struct CopyResult {
    pub target: CopyTarget,
    pub text: String,
    pub result: Result<(), ClipboardError>,
}

pub struct ClipboardService {
    requests: Option<Sender<(CopyTarget, String)>>,
    results: Receiver<CopyResult>,
    worker: Option<thread::JoinHandle<()>>,
}

impl ClipboardService {
    pub fn spawn() -> Self {
        Self::spawn_with(SystemClipboard::new)
    }

    // `make_backend` runs on the worker thread, so the backend itself need
    // not be `Send`.
    pub fn spawn_with<B, F>(make_backend: F) -> Self
    where
        B: ClipboardBackend,
        F: FnOnce() -> B + Send + 'static,
    {
        let (request_tx, request_rx) = unbounded::<(CopyTarget, String)>();
        let (result_tx, result_rx) = unbounded();

        let worker = thread::spawn(move || {
            let mut backend = make_backend();
            while let Ok((target, text)) = request_rx.recv() {
                let result = backend.write_text(&text);
                if result_tx.send(CopyResult { target, text, result }).is_err() {
                    break;
                }
            }
        });

        Self {
            requests: Some(request_tx),
            results: result_rx,
            worker: Some(worker),
        }
    }

    pub fn request(&self, target: CopyTarget, text: String) -> bool {
        match &self.requests {
            Some(tx) => tx.send((target, text)).is_ok(),
            None => false,
        }
    }

    pub fn poll(&self) -> Vec<CopyResult> {
        self.results.try_iter().collect()
    }

    pub fn wait(&self, timeout: Duration) -> Option<CopyResult> {
        self.results.recv_timeout(timeout).ok()
    }
}

impl Drop for ClipboardService {
    fn drop(&mut self) {
        self.requests.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

#[derive(Debug, Clone)]
pub struct TransientFlag<T> {
    value: Option<(T, Instant)>,
    duration: Duration,
}

impl<T> TransientFlag<T> {
    pub fn new(duration: Duration) -> Self {
        Self {
            value: None,
            duration,
        }
    }

    pub fn set(&mut self, value: T, now: Instant) {
        self.value = Some((value, now));
    }

    pub fn get(&self, now: Instant) -> Option<&T> {
        self.value
            .as_ref()
            .filter(|(_, since)| now.saturating_duration_since(*since) < self.duration)
            .map(|(value, _)| value)
    }

    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        let (_, since) = self.value.as_ref()?;
        self.duration
            .checked_sub(now.saturating_duration_since(*since))
            .filter(|left| !left.is_zero())
    }
}

//! Background status line for long-running imports.
//!
//! A [`Progress`] owns one reporter thread that polls a shared counter and
//! drives an [`indicatif::ProgressBar`]. The thread stops once the counter
//! reaches its maximum; dropping the [`Progress`] forces the counter there
//! and joins the thread, so early returns never leak it.

use crate::config::ProgressConfig;
use indicatif::{HumanDuration, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::info;

/// Polling cadence of the reporter thread.
#[derive(Debug, Clone, Copy)]
pub struct ProgressOptions {
    pub interval: Duration,
    pub grace: Duration,
}

impl Default for ProgressOptions {
    fn default() -> Self {
        Self {
            interval: ProgressConfig::POLL_INTERVAL,
            grace: ProgressConfig::GRACE_PERIOD,
        }
    }
}

fn status_style() -> ProgressStyle {
    let template = format!(
        "{{msg:{}!}} [{{bar:{}}}] {{percent:>3}}%",
        ProgressConfig::MESSAGE_WIDTH,
        ProgressConfig::BAR_WIDTH
    );
    ProgressStyle::with_template(&template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ")
}

fn done_style() -> ProgressStyle {
    ProgressStyle::with_template("{msg}").unwrap_or_else(|_| ProgressStyle::default_bar())
}

struct Shared {
    action: String,
    max: u64,
    consumed: AtomicU64,
    message: Mutex<String>,
    start: Instant,
    options: ProgressOptions,
    bar: ProgressBar,
}

/// Progress reporter for one operation.
pub struct Progress {
    shared: Arc<Shared>,
    thread: Option<JoinHandle<()>>,
}

impl Progress {
    /// Report on stderr with default timing. Nothing is drawn unless stderr
    /// is a terminal.
    pub fn new(action: &str, max: u64) -> Self {
        Self::with_target(action, max, ProgressOptions::default(), ProgressDrawTarget::stderr())
    }

    /// Report to `target`.
    pub fn with_target(
        action: &str,
        max: u64,
        options: ProgressOptions,
        target: ProgressDrawTarget,
    ) -> Self {
        let bar = ProgressBar::with_draw_target(Some(max), target);
        bar.set_style(status_style());

        let shared = Arc::new(Shared {
            action: action.to_string(),
            max,
            consumed: AtomicU64::new(0),
            message: Mutex::new(action.to_string()),
            start: Instant::now(),
            options,
            bar,
        });

        let worker = shared.clone();
        let thread = std::thread::Builder::new()
            .name("progress".to_string())
            .spawn(move || worker.run())
            .ok();

        Self { shared, thread }
    }

    /// Add `n` to the counter.
    pub fn consumed(&self, n: u64) {
        self.shared.consumed.fetch_add(n, Ordering::SeqCst);
    }

    /// Set the counter to `n`.
    pub fn set(&self, n: u64) {
        self.shared.consumed.store(n, Ordering::SeqCst);
    }

    /// Replace the text shown in front of the bar.
    pub fn message(&self, msg: &str) {
        if let Ok(mut message) = self.shared.message.lock() {
            *message = msg.to_string();
        }
    }

    pub fn position(&self) -> u64 {
        self.shared.consumed.load(Ordering::SeqCst)
    }

    pub fn max(&self) -> u64 {
        self.shared.max
    }
}

impl Drop for Progress {
    fn drop(&mut self) {
        if let Some(thread) = self.thread.take() {
            self.shared
                .consumed
                .fetch_max(self.shared.max, Ordering::SeqCst);
            let _ = thread.join();
        }
    }
}

impl Shared {
    fn run(&self) {
        let mut last = 0;
        loop {
            std::thread::sleep(self.options.interval);

            let consumed = self.consumed.load(Ordering::SeqCst);
            if consumed >= self.max {
                break;
            }
            if consumed == last || self.start.elapsed() < self.options.grace {
                continue;
            }

            if let Ok(message) = self.message.lock() {
                self.bar.set_message(message.clone());
            }
            self.bar.set_position(consumed);
            last = consumed;
        }

        self.finish();
    }

    fn finish(&self) {
        let elapsed = HumanDuration(self.start.elapsed());
        self.bar.set_position(self.max);
        self.bar.set_style(done_style());
        self.bar
            .finish_with_message(format!("{} done in {}", self.action, elapsed));
        info!("{} done in {}", self.action, elapsed);
    }
}

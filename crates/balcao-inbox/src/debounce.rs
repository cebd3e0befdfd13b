// SPDX-FileCopyrightText: 2026 Balcao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trailing-edge search debounce.
//!
//! Each keystroke replaces the armed timer; only the last timer commits its
//! term. Timers are tokio tasks that report back over a channel, so the
//! engine stays single-owner. A commit carries the generation it was armed
//! with and is discarded when newer input has superseded it.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

/// A debounce timer that elapsed. Valid only while its generation is
/// current.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCommit {
    pub generation: u64,
    pub term: String,
}

/// Debounces raw search input into committed terms.
///
/// Owns the pre-debounce input (the overlay value a UI renders in the
/// search box) and at most one armed timer. Dropping the debouncer aborts
/// the timer.
pub struct SearchDebouncer {
    window: Duration,
    generation: u64,
    input: String,
    timer: Option<JoinHandle<()>>,
    tx: mpsc::UnboundedSender<SearchCommit>,
}

impl SearchDebouncer {
    /// Creates a debouncer and the receiver its timers report on.
    pub fn new(window: Duration) -> (Self, mpsc::UnboundedReceiver<SearchCommit>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                window,
                generation: 0,
                input: String::new(),
                timer: None,
                tx,
            },
            rx,
        )
    }

    /// The raw, not-yet-committed input.
    pub fn input(&self) -> &str {
        &self.input
    }

    /// True from the first keystroke until the trailing commit is confirmed
    /// or the debounce is cancelled.
    pub fn is_pending(&self) -> bool {
        self.timer.is_some()
    }

    /// Records a keystroke: replaces the armed timer with a fresh one for
    /// the full window.
    pub fn set_input(&mut self, term: &str) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        self.generation += 1;
        self.input = term.to_string();

        let generation = self.generation;
        let commit = SearchCommit {
            generation,
            term: term.to_string(),
        };
        let tx = self.tx.clone();
        let window = self.window;
        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(window).await;
            // The receiver only disappears when the engine is gone.
            let _ = tx.send(commit);
        }));
        debug!(generation, "search debounce armed");
    }

    /// Accepts a commit if it is still current. A stale commit (raced by
    /// newer input) is rejected and leaves the newer timer armed.
    pub fn confirm(&mut self, commit: &SearchCommit) -> bool {
        if commit.generation == self.generation {
            self.timer = None;
            true
        } else {
            debug!(
                commit = commit.generation,
                current = self.generation,
                "stale search commit discarded"
            );
            false
        }
    }

    /// Aborts the armed timer, if any.
    pub fn cancel(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

impl Drop for SearchDebouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

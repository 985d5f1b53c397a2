//! Terminal front end for workflows and pipelines

use async_trait::async_trait;
use discopop_runner_core::{CancelToken, WorkflowUi};
use discopop_runner_core::pipeline::{Progress, ProgressUpdate};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, BufRead, Write};
use std::sync::Mutex;
use tracing::{debug, info};

/// A progress bar over 0..=100 plus stdin confirmations
pub struct TerminalUi {
    bar: ProgressBar,
    total: Mutex<f64>,
    assume_yes: bool,
    cancel_token: Option<CancelToken>,
}

impl TerminalUi {
    pub fn new(assume_yes: bool) -> Self {
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos:>3}% {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        Self { bar, total: Mutex::new(0.0), assume_yes, cancel_token: None }
    }

    /// Cancellation also answers a pending confirmation with "no"
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel_token = Some(token);
        self
    }

    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }

    pub fn abandon(&self, message: &str) {
        self.bar.abandon_with_message(message.to_string());
    }

    fn advance(&self, increment: f64) {
        let mut total = match self.total.lock() {
            Ok(total) => total,
            Err(poisoned) => poisoned.into_inner(),
        };
        *total = (*total + increment).clamp(0.0, 100.0);
        self.bar.set_position(total.round() as u64);
    }
}

#[async_trait]
impl WorkflowUi for TerminalUi {
    fn report_message(&self, message: &str, nesting: u8) {
        if nesting == 0 {
            self.bar.suspend(|| info!("{}", message));
            self.bar.set_message(message.to_string());
        } else {
            self.bar.suspend(|| debug!("{}{}", "  ".repeat(usize::from(nesting)), message));
        }
    }

    fn report_progress(&self, increment: f64) {
        self.advance(increment);
    }

    async fn request_confirmation(&self, message: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        if self.cancel_token.as_ref().is_some_and(CancelToken::is_cancelled) {
            return false;
        }

        let bar = self.bar.clone();
        let message = message.to_string();
        let answer = tokio::task::spawn_blocking(move || bar.suspend(|| prompt(&message)));
        match &self.cancel_token {
            Some(token) => tokio::select! {
                answer = answer => answer.unwrap_or(false),
                _ = token.cancelled() => {
                    info!("Confirmation interrupted");
                    false
                }
            },
            None => answer.await.unwrap_or(false),
        }
    }
}

impl Progress for TerminalUi {
    fn report(&self, update: ProgressUpdate) {
        if let Some(message) = update.message {
            self.bar.suspend(|| info!("{}", message));
            self.bar.set_message(message);
        }
        if let Some(increment) = update.increment {
            self.advance(increment);
        }
    }
}

fn prompt(message: &str) -> bool {
    print!("{message} [y/N] ");
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    match io::stdin().lock().read_line(&mut answer) {
        Ok(_) => is_yes(&answer),
        Err(_) => false,
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

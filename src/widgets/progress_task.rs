//! ProgressTask widget: spinner, message and optional progress bar for a long task.
//!
//! Workers never touch the terminal. They hold a [`ProgressHandle`] that
//! enqueues [`ProgressUpdate`]s into the event loop's channel, and a
//! [`Ticker`] thread enqueues [`Event::Tick`] to advance the spinner.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::core::component::{Action, Component, Widget};
use crate::core::event::{Event, ProgressUpdate, TaskId};
use crate::core::input::InputEvent;
use crate::core::style::Style;
use crate::core::text::rich::RichText;
use crate::core::theme::Theme;

#[derive(Debug, Clone, PartialEq, Eq)]
enum TaskStatus {
    Running,
    Done(Option<String>),
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct ProgressTask {
    message: String,
    done: u64,
    total: u64,
    tick: usize,
    status: TaskStatus,
}

impl ProgressTask {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            done: 0,
            total: 0,
            tick: 0,
            status: TaskStatus::Running,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// `(done, total)`; `total == 0` while indeterminate.
    pub fn progress(&self) -> (u64, u64) {
        (self.done, self.total)
    }

    pub fn tick(&self) -> usize {
        self.tick
    }

    pub fn is_running(&self) -> bool {
        self.status == TaskStatus::Running
    }

    pub fn apply(&mut self, update: &ProgressUpdate) {
        match update {
            ProgressUpdate::Set { done, total } => {
                self.total = *total;
                self.done = if *total > 0 { (*done).min(*total) } else { *done };
            }
            ProgressUpdate::Advance(n) => {
                self.done = self.done.saturating_add(*n);
                if self.total > 0 {
                    self.done = self.done.min(self.total);
                }
            }
            ProgressUpdate::Message(message) => self.message = message.clone(),
            ProgressUpdate::Finish(Ok(message)) => {
                self.status = TaskStatus::Done(message.clone());
            }
            ProgressUpdate::Finish(Err(reason)) => {
                self.status = TaskStatus::Failed(reason.clone());
            }
        }
    }

    fn render_bar(&self, theme: &Theme) -> RichText {
        let symbols = &theme.progress_bar;
        let filled = if self.total == 0 {
            0
        } else {
            ((self.done as u128 * symbols.width as u128) / self.total as u128) as usize
        };
        let percent = if self.total == 0 {
            0
        } else {
            (self.done as u128 * 100 / self.total as u128) as u64
        };
        RichText::new()
            .push(symbols.done.repeat(filled), theme.resolve("task/progressbar/done"))
            .push(
                symbols.pending.repeat(symbols.width - filled),
                theme.resolve("task/progressbar/pending"),
            )
            .push(format!(" {percent:>3}%"), theme.resolve("task/progressbar"))
    }
}

impl Component for ProgressTask {
    fn render(&mut self, width: usize, theme: &Theme) -> Vec<RichText> {
        let line = match &self.status {
            TaskStatus::Running => {
                let mut line = RichText::styled(theme.spinner.frame(self.tick), theme.resolve("task/spinner"))
                    .push(" ", Style::new())
                    .push(self.message.as_str(), theme.resolve("task"));
                if self.total > 0 {
                    line = line.push(" ", Style::new()) + self.render_bar(theme);
                    line = line.push(
                        format!(" {}/{}", self.done, self.total),
                        theme.resolve("task:progress"),
                    );
                }
                line
            }
            TaskStatus::Done(final_message) => {
                let message = final_message.as_deref().unwrap_or(&self.message);
                RichText::styled(theme.decoration("heading"), theme.resolve("task/decoration:done"))
                    .push(format!("{message} - done"), theme.resolve("task:done"))
            }
            TaskStatus::Failed(reason) => {
                RichText::styled(theme.decoration("heading"), theme.resolve("task/decoration:error"))
                    .push(
                        format!("{} - error: {reason}", self.message),
                        theme.resolve("task:error"),
                    )
            }
        };
        vec![line.truncate(width, "…")]
    }
}

impl Widget for ProgressTask {
    /// `Err` carries the failure reason reported by the worker.
    type Value = Result<(), String>;

    fn handle_event(&mut self, event: &Event) -> Action<Self::Value> {
        match event {
            Event::Tick => {
                self.tick = self.tick.wrapping_add(1);
                Action::Continue
            }
            Event::Progress { update, .. } => {
                self.apply(update);
                match &self.status {
                    TaskStatus::Running => Action::Continue,
                    TaskStatus::Done(_) => Action::Confirm(Ok(())),
                    TaskStatus::Failed(reason) => Action::Confirm(Err(reason.clone())),
                }
            }
            Event::Input(InputEvent::Interrupt) => Action::Cancel,
            Event::Input(_) => Action::Continue,
        }
    }
}

/// Cloneable, `Send` handle a worker uses to report progress.
///
/// Every update is tagged with the handle's [`TaskId`]; the event loop drops
/// updates from tasks it is no longer showing. Sends after the event loop has
/// exited are dropped too.
#[derive(Debug, Clone)]
pub struct ProgressHandle {
    sender: Sender<Event>,
    task: TaskId,
}

impl ProgressHandle {
    pub fn new(sender: Sender<Event>, task: TaskId) -> Self {
        Self { sender, task }
    }

    pub fn task(&self) -> TaskId {
        self.task
    }

    fn send(&self, update: ProgressUpdate) {
        let event = Event::Progress {
            task: self.task,
            update,
        };
        if self.sender.send(event).is_err() {
            tracing::trace!("progress update dropped; event loop has exited");
        }
    }

    pub fn set(&self, done: u64, total: u64) {
        self.send(ProgressUpdate::Set { done, total });
    }

    pub fn advance(&self, n: u64) {
        self.send(ProgressUpdate::Advance(n));
    }

    pub fn message(&self, message: impl Into<String>) {
        self.send(ProgressUpdate::Message(message.into()));
    }

    pub fn finish(&self) {
        self.send(ProgressUpdate::Finish(Ok(None)));
    }

    pub fn finish_with(&self, message: impl Into<String>) {
        self.send(ProgressUpdate::Finish(Ok(Some(message.into()))));
    }

    pub fn fail(&self, reason: impl Into<String>) {
        self.send(ProgressUpdate::Finish(Err(reason.into())));
    }
}

/// Background thread that enqueues [`Event::Tick`] every `interval`.
///
/// Stops when dropped or when the receiving side hangs up.
pub struct Ticker {
    stop_flag: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl Ticker {
    pub fn start(sender: Sender<Event>, interval: Duration) -> Self {
        let stop_flag = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop_flag);
        let thread = thread::spawn(move || {
            while !flag.load(Ordering::SeqCst) {
                thread::park_timeout(interval);
                if flag.load(Ordering::SeqCst) || sender.send(Event::Tick).is_err() {
                    break;
                }
            }
        });
        Self {
            stop_flag,
            thread: Some(thread),
        }
    }

    pub fn stop(&mut self) {
        self.stop_flag.store(true, Ordering::SeqCst);
        if let Some(handle) = self.thread.take() {
            handle.thread().unpark();
            let _ = handle.join();
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stop();
    }
}

//! Cooperative event loop.
//!
//! All producers (the input reader thread, signal forwarding, progress
//! workers, tickers) send [`Event`]s into one channel. The loop blocks on
//! that channel, hands each event to the widget and redraws through the
//! render context, which is the only writer.

use std::cell::Cell;
use std::collections::{HashSet, VecDeque};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread;

use crate::core::component::{Action, Component, Interaction, Widget};
use crate::core::event::{Event, TaskId};
use crate::core::input::InputEvent;
use crate::core::terminal::Terminal;
use crate::core::theme::Theme;
use crate::error::RenderError;
use crate::render::{Frame, RenderContext};
use crate::widgets::progress_task::{ProgressHandle, ProgressTask, Ticker};

/// Events handled between two redraws at most.
const COALESCE_MAX_EVENTS: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<V> {
    Confirmed(V),
    Cancelled,
}

impl<V> Outcome<V> {
    pub fn into_option(self) -> Option<V> {
        match self {
            Self::Confirmed(value) => Some(value),
            Self::Cancelled => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

pub struct EventLoop {
    sender: Sender<Event>,
    receiver: Receiver<Event>,
    backlog: VecDeque<Event>,
    next_task: Cell<u64>,
    /// Task shown by the running `run_task`; progress from any other task is dropped.
    active_task: Option<TaskId>,
    /// Tasks whose `run_task` has returned; their workers may still be sending.
    retired: HashSet<TaskId>,
}

impl Default for EventLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl EventLoop {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            sender,
            receiver,
            backlog: VecDeque::new(),
            next_task: Cell::new(0),
            active_task: None,
            retired: HashSet::new(),
        }
    }

    /// Sender for producers on other threads.
    pub fn sender(&self) -> Sender<Event> {
        self.sender.clone()
    }

    /// Handle for a new task, to be shown with [`EventLoop::run`].
    pub fn progress_handle(&self) -> ProgressHandle {
        ProgressHandle::new(self.sender(), self.allocate_task())
    }

    fn allocate_task(&self) -> TaskId {
        let id = self.next_task.get();
        self.next_task.set(id + 1);
        TaskId::new(id)
    }

    /// Runs `widget` until it confirms or cancels.
    ///
    /// Ticks and progress left over from an earlier run are discarded; typed-ahead input is kept.
    pub fn run<T, W>(
        &mut self,
        ctx: &mut RenderContext<T>,
        widget: W,
    ) -> Result<Outcome<W::Value>, RenderError>
    where
        T: Terminal,
        W: Widget,
    {
        self.discard_stale();
        self.run_fresh(ctx, widget)
    }

    fn run_fresh<T, W>(
        &mut self,
        ctx: &mut RenderContext<T>,
        widget: W,
    ) -> Result<Outcome<W::Value>, RenderError>
    where
        T: Terminal,
        W: Widget,
    {
        let theme = Arc::clone(ctx.theme());
        let mut interaction = Interaction::new(widget);
        interaction.focus();

        ctx.enter_raw_mode()?;
        let result = self.drive(ctx, &theme, &mut interaction);
        let restored = ctx.leave_raw_mode();
        let outcome = result?;
        restored?;
        Ok(outcome)
    }

    /// Runs `work` on a worker thread while `task` shows its progress.
    ///
    /// The worker's `Ok`/`Err` finishes the task automatically. Only updates
    /// from this call's worker reach `task`. On cancellation the worker is left
    /// to finish in the background and anything it sends later is dropped.
    pub fn run_task<T, F, R>(
        &mut self,
        ctx: &mut RenderContext<T>,
        task: ProgressTask,
        work: F,
    ) -> Result<Outcome<Result<R, String>>, RenderError>
    where
        T: Terminal,
        F: FnOnce(ProgressHandle) -> Result<R, String> + Send + 'static,
        R: Send + 'static,
    {
        self.discard_stale();
        let task_id = self.allocate_task();
        let handle = ProgressHandle::new(self.sender(), task_id);
        let worker = thread::spawn(move || {
            let result = work(handle.clone());
            match &result {
                Ok(_) => handle.finish(),
                Err(reason) => handle.fail(reason.clone()),
            }
            result
        });
        let ticker = Ticker::start(self.sender(), ctx.theme().spinner.interval);
        self.active_task = Some(task_id);
        let outcome = self.run_fresh(ctx, task);
        self.active_task = None;
        self.retired.insert(task_id);
        drop(ticker);

        match outcome? {
            Outcome::Cancelled => {
                tracing::debug!("task cancelled; worker detached");
                Ok(Outcome::Cancelled)
            }
            Outcome::Confirmed(_) => match worker.join() {
                Ok(result) => Ok(Outcome::Confirmed(result)),
                Err(_) => Ok(Outcome::Confirmed(Err("worker panicked".to_string()))),
            },
        }
    }

    fn discard_stale(&mut self) {
        let mut kept = VecDeque::new();
        while let Ok(event) = self.receiver.try_recv() {
            if matches!(event, Event::Input(_)) {
                kept.push_back(event);
            }
        }
        self.backlog.retain(|event| matches!(event, Event::Input(_)));
        self.backlog.extend(kept);
    }

    fn is_current(&self, event: &Event) -> bool {
        let Event::Progress { task, .. } = event else {
            return true;
        };
        match self.active_task {
            Some(active) => *task == active,
            None => !self.retired.contains(task),
        }
    }

    fn next_event(&mut self) -> Event {
        loop {
            let event = match self.backlog.pop_front() {
                Some(event) => event,
                None => match self.receiver.recv() {
                    Ok(event) => event,
                    // Unreachable while `self.sender` is alive.
                    Err(_) => return Event::Input(InputEvent::Interrupt),
                },
            };
            if self.is_current(&event) {
                return event;
            }
            tracing::trace!(?event, "dropped progress from another task");
        }
    }

    fn try_next_event(&mut self) -> Option<Event> {
        loop {
            let event = match self.backlog.pop_front() {
                Some(event) => event,
                None => match self.receiver.try_recv() {
                    Ok(event) => event,
                    Err(TryRecvError::Empty | TryRecvError::Disconnected) => return None,
                },
            };
            if self.is_current(&event) {
                return Some(event);
            }
            tracing::trace!(?event, "dropped progress from another task");
        }
    }

    fn drive<T, W>(
        &mut self,
        ctx: &mut RenderContext<T>,
        theme: &Theme,
        interaction: &mut Interaction<W>,
    ) -> Result<Outcome<W::Value>, RenderError>
    where
        T: Terminal,
        W: Widget,
    {
        draw(ctx, theme, interaction)?;
        loop {
            let mut event = Some(self.next_event());
            let mut handled = 0;
            while let Some(current) = event.take() {
                if let Event::Input(InputEvent::Resize { columns, rows }) = &current {
                    tracing::debug!(columns, rows, "resize");
                    ctx.invalidate();
                }
                match interaction.handle(&current) {
                    Action::Continue => {}
                    Action::Confirm(value) => {
                        draw(ctx, theme, interaction)?;
                        ctx.finish()?;
                        return Ok(Outcome::Confirmed(value));
                    }
                    Action::Cancel => {
                        ctx.clear_frame()?;
                        ctx.finish()?;
                        return Ok(Outcome::Cancelled);
                    }
                }
                handled += 1;
                if handled < COALESCE_MAX_EVENTS {
                    event = self.try_next_event();
                }
            }
            draw(ctx, theme, interaction)?;
        }
    }
}

fn draw<T: Terminal, W: Widget>(
    ctx: &mut RenderContext<T>,
    theme: &Theme,
    interaction: &mut Interaction<W>,
) -> Result<(), RenderError> {
    let lines = interaction.render(ctx.width(), theme);
    ctx.redraw(Frame::new(lines).with_cursor(interaction.cursor_pos()))
}

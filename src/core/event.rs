//! Events delivered to widgets by the event loop.

use crate::core::input::InputEvent;

/// Progress report sent by a worker through a [`crate::widgets::ProgressHandle`].
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressUpdate {
    /// Absolute progress; `total == 0` means indeterminate.
    Set { done: u64, total: u64 },
    /// Adds to the current `done` count.
    Advance(u64),
    Message(String),
    /// The task finished; `Ok` carries an optional final message.
    Finish(Result<Option<String>, String>),
}

/// Identifies the task a [`ProgressUpdate`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

impl TaskId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Input(InputEvent),
    /// Timer tick driving spinners.
    Tick,
    Progress { task: TaskId, update: ProgressUpdate },
}

impl From<InputEvent> for Event {
    fn from(event: InputEvent) -> Self {
        Self::Input(event)
    }
}

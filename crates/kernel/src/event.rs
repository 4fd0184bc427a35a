//! Events
//!
//! An [`Event`] is one line of command text travelling through the kernel.
//! The producer creates it, the kernel parses and dispatches it, the handler
//! appends replies, and the kernel finally flips the ready signal. Clones share
//! the same state, so the producer can keep a handle and [`wait`](Event::wait)
//! on it while a worker task mutates it.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};
use zbot_core::ParsedArgs;

use crate::task::{Task, Tasks};

#[derive(Debug, Default)]
struct EventState {
    txt: String,
    origin: Option<String>,
    channel: String,
    cmd: String,
    args: Vec<String>,
    rest: String,
    result: Vec<String>,
}

#[derive(Default)]
struct EventInner {
    state: Mutex<EventState>,
    ready: Mutex<bool>,
    ready_cond: Condvar,
    tasks: Mutex<Vec<Task>>,
}

/// Unit of dispatchable command work
#[derive(Clone, Default)]
pub struct Event {
    inner: Arc<EventInner>,
}

impl Event {
    /// Create an event for one line of command text.
    pub fn new(txt: impl Into<String>) -> Self {
        let event = Self::default();
        event.inner.state.lock().txt = txt.into();
        event
    }

    /// Set who replies go to.
    pub fn with_origin(self, origin: impl Into<String>) -> Self {
        self.set_origin(origin);
        self
    }

    /// Set the channel replies are addressed to.
    pub fn with_channel(self, channel: impl Into<String>) -> Self {
        self.inner.state.lock().channel = channel.into();
        self
    }

    /// Command text
    pub fn txt(&self) -> String {
        self.inner.state.lock().txt.clone()
    }

    /// Replace the command text; takes effect on the next dispatch.
    pub fn set_txt(&self, txt: impl Into<String>) {
        self.inner.state.lock().txt = txt.into();
    }

    /// Reply target, if any
    pub fn origin(&self) -> Option<String> {
        self.inner.state.lock().origin.clone()
    }

    /// Set the reply target.
    pub fn set_origin(&self, origin: impl Into<String>) {
        self.inner.state.lock().origin = Some(origin.into());
    }

    /// Reply channel
    pub fn channel(&self) -> String {
        self.inner.state.lock().channel.clone()
    }

    /// Split the text into command, arguments and rest of line.
    pub fn parse(&self) {
        let mut state = self.inner.state.lock();
        let mut words = state.txt.split_whitespace();
        let cmd = words.next().unwrap_or_default().to_string();
        let args: Vec<String> = words.map(str::to_string).collect();
        state.rest = args.join(" ");
        state.args = args;
        state.cmd = cmd;
    }

    /// Command word from the last parse
    pub fn cmd(&self) -> String {
        self.inner.state.lock().cmd.clone()
    }

    /// Arguments from the last parse
    pub fn args(&self) -> Vec<String> {
        self.inner.state.lock().args.clone()
    }

    /// Arguments joined back into one string
    pub fn rest(&self) -> String {
        self.inner.state.lock().rest.clone()
    }

    /// Arguments classified into selector tokens.
    pub fn parsed(&self) -> ParsedArgs {
        ParsedArgs::parse(&self.inner.state.lock().args)
    }

    /// Append a line to the reply buffer.
    pub fn reply(&self, txt: impl Into<String>) {
        self.inner.state.lock().result.push(txt.into());
    }

    /// Reply buffer
    pub fn result(&self) -> Vec<String> {
        self.inner.state.lock().result.clone()
    }

    /// Launch a sub-task that [`wait`](Self::wait) will join.
    pub fn spawn<F>(&self, tasks: &Tasks, name: impl Into<String>, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let task = tasks.launch(name, f);
        self.inner.tasks.lock().push(task);
    }

    /// Signal completion.
    pub fn set_ready(&self) {
        let mut ready = self.inner.ready.lock();
        *ready = true;
        self.inner.ready_cond.notify_all();
    }

    /// Whether the event has completed
    pub fn is_ready(&self) -> bool {
        *self.inner.ready.lock()
    }

    /// Block until the event is ready, then join its sub-tasks.
    ///
    /// Returns, per sub-task, whether it finished without panicking.
    pub fn wait(&self) -> Vec<bool> {
        {
            let mut ready = self.inner.ready.lock();
            while !*ready {
                self.inner.ready_cond.wait(&mut ready);
            }
        }
        let tasks: Vec<Task> = std::mem::take(&mut *self.inner.tasks.lock());
        tasks.into_iter().map(Task::join).collect()
    }

    /// Wait at most `timeout` for the ready signal; sub-tasks are not joined.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let mut ready = self.inner.ready.lock();
        if !*ready {
            let _ = self
                .inner
                .ready_cond
                .wait_while_for(&mut ready, |ready| !*ready, timeout);
        }
        *ready
    }
}

impl std::fmt::Debug for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("Event")
            .field("txt", &state.txt)
            .field("origin", &state.origin)
            .field("cmd", &state.cmd)
            .field("result", &state.result.len())
            .finish()
    }
}

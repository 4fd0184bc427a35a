//! Task-launch primitive
//!
//! Every unit of concurrent work in the kernel (a dispatched event, a module
//! initializer, a timer wait, a timer payload) runs on its own named thread
//! started through [`Tasks::launch`]. There is no pool and no admission
//! control. Live tasks are tracked in a table so they can be listed.
//!
//! A panic inside a task is caught at the thread boundary and logged as one
//! line; it never takes down the process.

use std::any::Any;
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::error;

/// Snapshot of one running task.
#[derive(Debug, Clone)]
pub struct TaskInfo {
    /// Launch sequence number
    pub id: u64,
    /// Thread name
    pub name: String,
    /// When the task was launched
    pub started: Instant,
    /// Wait interval, for timer tasks
    pub sleep: Option<Duration>,
}

impl TaskInfo {
    /// Seconds until a timer task fires, or seconds since launch otherwise.
    pub fn remaining_or_age(&self, now: Instant) -> f64 {
        let age = now.saturating_duration_since(self.started);
        match self.sleep {
            Some(sleep) => sleep.saturating_sub(age).as_secs_f64(),
            None => age.as_secs_f64(),
        }
    }
}

#[derive(Default)]
struct TasksInner {
    next_id: AtomicU64,
    live: Mutex<BTreeMap<u64, TaskInfo>>,
}

/// Launcher and live-task table. Clones share the table.
#[derive(Clone, Default)]
pub struct Tasks {
    inner: Arc<TasksInner>,
}

impl Tasks {
    /// Create an empty task table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` on a new thread called `name`.
    pub fn launch<F>(&self, name: impl Into<String>, f: F) -> Task
    where
        F: FnOnce() + Send + 'static,
    {
        self.launch_with(name, None, f)
    }

    /// Like [`launch`](Self::launch), recording the wait interval of a timer.
    pub fn launch_with<F>(&self, name: impl Into<String>, sleep: Option<Duration>, f: F) -> Task
    where
        F: FnOnce() + Send + 'static,
    {
        let name = name.into();
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.live.lock().insert(
            id,
            TaskInfo {
                id,
                name: name.clone(),
                started: Instant::now(),
                sleep,
            },
        );

        let guard = LiveGuard {
            inner: Arc::clone(&self.inner),
            id,
        };
        let thread_name = name.clone();
        let spawned = thread::Builder::new().name(os_thread_name(&name)).spawn(move || {
            let _guard = guard;
            match panic::catch_unwind(AssertUnwindSafe(f)) {
                Ok(()) => true,
                Err(payload) => {
                    error!(task = %thread_name, "task panicked: {}", panic_message(&*payload));
                    false
                }
            }
        });

        match spawned {
            Ok(handle) => Task {
                name,
                handle: Some(handle),
            },
            Err(e) => {
                // The closure (and the guard inside it) was dropped with the error.
                error!(task = %name, error = %e, "failed to spawn task");
                Task { name, handle: None }
            }
        }
    }

    /// Live tasks in launch order.
    pub fn list(&self) -> Vec<TaskInfo> {
        self.inner.live.lock().values().cloned().collect()
    }

    /// Number of live tasks
    pub fn len(&self) -> usize {
        self.inner.live.lock().len()
    }

    /// Whether no task is running
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for Tasks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tasks").field("live", &self.len()).finish()
    }
}

/// Removes the task from the live table when the thread ends, panic or not.
struct LiveGuard {
    inner: Arc<TasksInner>,
    id: u64,
}

impl Drop for LiveGuard {
    fn drop(&mut self) {
        self.inner.live.lock().remove(&self.id);
    }
}

/// Handle to a launched task.
#[derive(Debug)]
pub struct Task {
    name: String,
    handle: Option<JoinHandle<bool>>,
}

impl Task {
    /// Thread name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether a thread was actually spawned for the task.
    pub fn is_spawned(&self) -> bool {
        self.handle.is_some()
    }

    /// Whether the thread has ended (or never started).
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Wait for the task; `true` if it ran to completion without panicking.
    pub fn join(self) -> bool {
        match self.handle {
            Some(handle) => handle.join().unwrap_or(false),
            None => false,
        }
    }
}

/// Name usable for an OS thread: no NUL bytes, never empty.
fn os_thread_name(name: &str) -> String {
    let cleaned: String = name.chars().filter(|c| *c != '\0').collect();
    if cleaned.is_empty() {
        "task".to_string()
    } else {
        cleaned
    }
}

/// Text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "(non-string panic)".to_string()
    }
}

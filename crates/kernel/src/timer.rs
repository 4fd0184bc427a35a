//! One-shot and repeating timers
//!
//! A timer waits on its own task and, when the delay has passed, launches the
//! payload as a fresh task, so a slow payload never delays the clock. A
//! repeater schedules its next wait before launching the payload. `stop`
//! cancels the pending wait; payloads already launched keep running.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::debug;

use crate::task::{Task, Tasks};

type Payload = Arc<dyn Fn() + Send + Sync>;

struct TimerInner {
    name: String,
    sleep: Duration,
    repeat: bool,
    func: Payload,
    tasks: Tasks,
    /// Bumped by `stop`; a wait started under an older generation is cancelled.
    generation: Mutex<u64>,
    cond: Condvar,
    fired: AtomicU64,
    latest: Mutex<Option<Instant>>,
}

impl TimerInner {
    fn schedule(self: &Arc<Self>, generation: u64) -> Task {
        let inner = Arc::clone(self);
        self.tasks
            .launch_with(self.name.clone(), Some(self.sleep), move || inner.run(generation))
    }

    fn run(self: Arc<Self>, generation: u64) {
        let deadline = Instant::now() + self.sleep;
        {
            let mut current = self.generation.lock();
            while *current == generation {
                if self.cond.wait_until(&mut current, deadline).timed_out() {
                    break;
                }
            }
            if *current != generation {
                debug!(timer = %self.name, "timer cancelled");
                return;
            }
        }
        if self.repeat {
            self.schedule(generation);
        }
        self.fired.fetch_add(1, Ordering::SeqCst);
        *self.latest.lock() = Some(Instant::now());
        let func = Arc::clone(&self.func);
        self.tasks.launch(self.name.clone(), move || func());
    }
}

/// Runs a function once after a delay.
#[derive(Clone)]
pub struct Timer {
    inner: Arc<TimerInner>,
}

impl Timer {
    /// Create a stopped timer.
    pub fn new<F>(tasks: &Tasks, name: impl Into<String>, sleep: Duration, func: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self::build(tasks, name.into(), sleep, false, Arc::new(func))
    }

    fn build(tasks: &Tasks, name: String, sleep: Duration, repeat: bool, func: Payload) -> Self {
        Self {
            inner: Arc::new(TimerInner {
                name,
                sleep,
                repeat,
                func,
                tasks: tasks.clone(),
                generation: Mutex::new(0),
                cond: Condvar::new(),
                fired: AtomicU64::new(0),
                latest: Mutex::new(None),
            }),
        }
    }

    /// Start waiting. Returns the waiting task.
    pub fn start(&self) -> Task {
        let generation = *self.inner.generation.lock();
        self.inner.schedule(generation)
    }

    /// Cancel the pending wait.
    pub fn stop(&self) {
        let mut generation = self.inner.generation.lock();
        *generation += 1;
        self.inner.cond.notify_all();
    }

    /// Task name
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Delay between start and firing
    pub fn sleep(&self) -> Duration {
        self.inner.sleep
    }

    /// How many times the payload has been launched
    pub fn fired(&self) -> u64 {
        self.inner.fired.load(Ordering::SeqCst)
    }

    /// When the payload was last launched
    pub fn latest(&self) -> Option<Instant> {
        *self.inner.latest.lock()
    }
}

impl std::fmt::Debug for Timer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Timer")
            .field("name", &self.inner.name)
            .field("sleep", &self.inner.sleep)
            .field("repeat", &self.inner.repeat)
            .field("fired", &self.fired())
            .finish()
    }
}

/// Runs a function every `sleep` until stopped.
#[derive(Clone, Debug)]
pub struct Repeater {
    timer: Timer,
}

impl Repeater {
    /// Create a stopped repeater.
    pub fn new<F>(tasks: &Tasks, name: impl Into<String>, sleep: Duration, func: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self {
            timer: Timer::build(tasks, name.into(), sleep, true, Arc::new(func)),
        }
    }

    /// Start the first wait. Returns the waiting task.
    pub fn start(&self) -> Task {
        self.timer.start()
    }

    /// Cancel the pending wait; no further ticks are scheduled.
    pub fn stop(&self) {
        self.timer.stop();
    }

    /// The underlying timer
    pub fn timer(&self) -> &Timer {
        &self.timer
    }
}

//! Reply outputs
//!
//! Anything that can show text to a user (a console, a chat connection)
//! implements [`Output`] and is added to the kernel's [`Bus`]. Replies are
//! routed to the output whose id equals the event's origin.

use std::sync::Arc;

use parking_lot::Mutex;

/// A destination for replies
pub trait Output: Send + Sync {
    /// Identifier events use as their origin
    fn id(&self) -> &str;

    /// Show `txt` on `channel`.
    fn say(&self, channel: &str, txt: &str);

    /// Broadcast `txt`; defaults to [`say`](Self::say) on no channel.
    fn announce(&self, txt: &str) {
        self.say("", txt);
    }
}

/// Registry of outputs. Clones share the registry.
#[derive(Clone, Default)]
pub struct Bus {
    outputs: Arc<Mutex<Vec<Arc<dyn Output>>>>,
}

impl Bus {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an output.
    pub fn add(&self, output: Arc<dyn Output>) {
        self.outputs.lock().push(output);
    }

    /// Remove every output with `id`.
    pub fn remove(&self, id: &str) {
        self.outputs.lock().retain(|o| o.id() != id);
    }

    /// Output registered as `origin`
    pub fn by_origin(&self, origin: &str) -> Option<Arc<dyn Output>> {
        self.outputs.lock().iter().find(|o| o.id() == origin).cloned()
    }

    /// Send `txt` to the output registered as `origin`.
    ///
    /// Returns whether such an output exists.
    pub fn say(&self, origin: &str, channel: &str, txt: &str) -> bool {
        match self.by_origin(origin) {
            Some(output) => {
                output.say(channel, txt);
                true
            }
            None => false,
        }
    }

    /// Send `txt` to every output.
    pub fn announce(&self, txt: &str) {
        let outputs: Vec<Arc<dyn Output>> = self.outputs.lock().clone();
        for output in outputs {
            output.announce(txt);
        }
    }

    /// Registered output ids
    pub fn ids(&self) -> Vec<String> {
        self.outputs.lock().iter().map(|o| o.id().to_string()).collect()
    }
}

/// Output that keeps every line in memory.
#[derive(Debug, Default)]
pub struct Buffer {
    id: String,
    lines: Mutex<Vec<String>>,
}

impl Buffer {
    /// Create an empty buffer registered as `id`.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            lines: Mutex::new(Vec::new()),
        }
    }

    /// Lines received so far
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }
}

impl Output for Buffer {
    fn id(&self) -> &str {
        &self.id
    }

    fn say(&self, _channel: &str, txt: &str) {
        self.lines.lock().push(txt.to_string());
    }
}

//! Store notification queue.
//!
//! Framework code pushes notifications while handling store events; the
//! framework's event loop drains them in arrival order.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A queued message with its positional and keyword arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub message: String,
    #[serde(default)]
    pub args: Vec<Value>,
    #[serde(default)]
    pub kwargs: Map<String, Value>,
}

impl Notification {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            args: Vec::new(),
            kwargs: Map::new(),
        }
    }

    pub fn with_arg(mut self, arg: impl Into<Value>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn with_kwarg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.kwargs.insert(key.into(), value.into());
        self
    }
}

impl From<&str> for Notification {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for Notification {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

/// FIFO queue of notifications.
#[derive(Debug, Default)]
pub struct NotificationQueue {
    queue: Mutex<VecDeque<Notification>>,
}

impl NotificationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_queue(&self) -> MutexGuard<'_, VecDeque<Notification>> {
        self.queue.lock().unwrap_or_else(|poisoned| {
            warn!("Notification queue mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    pub fn put(&self, notification: Notification) {
        self.lock_queue().push_back(notification);
    }

    /// Remove and return every queued notification, oldest first.
    ///
    /// Notifications pushed while a drain is in progress are kept for the next drain.
    pub fn drain(&self) -> Vec<Notification> {
        self.lock_queue().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.lock_queue().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_queue().is_empty()
    }
}

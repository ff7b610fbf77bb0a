//! # Notification Queue
//!
//! Plugins run inside `EditorState::apply`, before the new state is
//! installed, so they cannot call observers directly. They push here instead:
//!
//! - **immediate**: derived plugin state changes, delivered first
//! - **deferred**: selection and input notifications, delivered once every
//!   plugin notification of the transition has gone out
//!
//! The editor drains the queue at the end of each dispatch.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use scribe_model::Selection;

use crate::plugins::PluginState;

#[derive(Debug, Clone)]
pub enum Notification {
    Plugin(Rc<PluginState>),
    /// `None` when the selection became empty
    Select(Option<Selection>),
    Input,
}

/// Shared handle; clones push into the same queue
#[derive(Debug, Clone, Default)]
pub struct NotificationQueue {
    immediate: Rc<RefCell<VecDeque<Notification>>>,
    deferred: Rc<RefCell<VecDeque<Notification>>>,
}

impl NotificationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_immediate(&self, notification: Notification) {
        self.immediate.borrow_mut().push_back(notification);
    }

    pub fn defer(&self, notification: Notification) {
        self.deferred.borrow_mut().push_back(notification);
    }

    pub fn is_empty(&self) -> bool {
        self.immediate.borrow().is_empty() && self.deferred.borrow().is_empty()
    }

    /// Take everything queued so far, immediate notifications first
    pub fn drain(&self) -> Vec<Notification> {
        let mut drained: Vec<Notification> = self.immediate.borrow_mut().drain(..).collect();
        drained.extend(self.deferred.borrow_mut().drain(..));
        drained
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_immediate_before_deferred() {
        let queue = NotificationQueue::new();
        let handle = queue.clone();

        handle.defer(Notification::Input);
        handle.defer(Notification::Select(None));
        handle.push_immediate(Notification::Select(Some(Selection::text(1, 2))));

        let drained = queue.drain();
        assert!(matches!(drained[0], Notification::Select(Some(_))));
        assert!(matches!(drained[1], Notification::Input));
        assert!(matches!(drained[2], Notification::Select(None)));
        assert!(queue.is_empty());
    }
}

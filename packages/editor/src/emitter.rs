use std::rc::Rc;

use scribe_model::Selection;

use crate::plugins::PluginState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Plugin,
    Select,
    Blur,
    Focus,
    Input,
}

impl EventKind {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "plugin" => Some(EventKind::Plugin),
            "select" => Some(EventKind::Select),
            "blur" => Some(EventKind::Blur),
            "focus" => Some(EventKind::Focus),
            "input" => Some(EventKind::Input),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum EditorEvent {
    Plugin(Rc<PluginState>),
    Select(Option<Selection>),
    Blur,
    Focus,
    Input,
}

impl EditorEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            EditorEvent::Plugin(_) => EventKind::Plugin,
            EditorEvent::Select(_) => EventKind::Select,
            EditorEvent::Blur => EventKind::Blur,
            EditorEvent::Focus => EventKind::Focus,
            EditorEvent::Input => EventKind::Input,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

pub type Listener = Box<dyn FnMut(&EditorEvent)>;

/// Observers keyed by event kind, called in subscription order
#[derive(Default)]
pub struct Emitter {
    listeners: Vec<(EventKind, ListenerId, Listener)>,
    next_id: u64,
}

impl Emitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&mut self, kind: EventKind, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((kind, id, listener));
        id
    }

    /// Returns whether a listener was removed
    pub fn off(&mut self, kind: EventKind, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners
            .retain(|(listener_kind, listener_id, _)| !(*listener_kind == kind && *listener_id == id));
        self.listeners.len() != before
    }

    pub fn emit(&mut self, event: &EditorEvent) {
        let kind = event.kind();
        for (_, _, listener) in self.listeners.iter_mut().filter(|(listener_kind, _, _)| *listener_kind == kind) {
            listener(event);
        }
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners.iter().filter(|(listener_kind, _, _)| *listener_kind == kind).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn test_emit_by_kind() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut emitter = Emitter::new();

        let log = Rc::clone(&seen);
        let focus = emitter.on(EventKind::Focus, Box::new(move |_| log.borrow_mut().push("focus")));
        let log = Rc::clone(&seen);
        emitter.on(EventKind::Blur, Box::new(move |_| log.borrow_mut().push("blur")));

        emitter.emit(&EditorEvent::Focus);
        emitter.emit(&EditorEvent::Blur);
        assert_eq!(*seen.borrow(), vec!["focus", "blur"]);

        assert!(!emitter.off(EventKind::Blur, focus));
        assert!(emitter.off(EventKind::Focus, focus));
        emitter.emit(&EditorEvent::Focus);
        assert_eq!(seen.borrow().len(), 2);
        assert_eq!(emitter.listener_count(EventKind::Blur), 1);
    }

    #[test]
    fn test_parse_kind() {
        assert_eq!(EventKind::parse("select"), Some(EventKind::Select));
        assert_eq!(EventKind::parse("change"), None);
    }
}

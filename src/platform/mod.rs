//! Host platform seams: document, persisted storage and timers.
//!
//! Controllers only ever talk to these traits. The browser build implements
//! them over `web-sys` ([`web`]); tests and native hosts use the in-memory
//! document in [`memory`].

use std::fmt;
use std::time::Duration;

use crate::error::UiResult;

pub mod memory;
#[cfg(feature = "wasm")]
pub mod web;

/// Handle for one registered event listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener#{}", self.0)
    }
}

/// Event types the behavior layer listens for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Click,
    TouchStart,
    KeyDown,
    /// Resource load failure (broken images)
    Error,
    /// Element entered the viewport. Delivered by a visibility observer,
    /// not by a DOM event, and only to listeners on the element itself.
    Intersect,
}

impl EventKind {
    /// DOM event name
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Click => "click",
            EventKind::TouchStart => "touchstart",
            EventKind::KeyDown => "keydown",
            EventKind::Error => "error",
            EventKind::Intersect => "intersect",
        }
    }

    /// Whether the event travels up to ancestors and the document
    pub fn bubbles(&self) -> bool {
        matches!(self, EventKind::Click | EventKind::TouchStart | EventKind::KeyDown)
    }
}

/// Where a listener is attached
#[derive(Debug, Clone, PartialEq)]
pub enum ListenTarget<N> {
    Element(N),
    Document,
}

/// The parts of a DOM event the handlers look at
#[derive(Debug, Clone, PartialEq)]
pub struct UiEvent<N> {
    pub kind: EventKind,
    /// Innermost element the event was fired on
    pub target: Option<N>,
    /// `KeyboardEvent.key` for key events
    pub key: Option<String>,
}

impl<N> UiEvent<N> {
    pub fn click(target: N) -> Self {
        Self {
            kind: EventKind::Click,
            target: Some(target),
            key: None,
        }
    }

    pub fn touch_start(target: N) -> Self {
        Self {
            kind: EventKind::TouchStart,
            target: Some(target),
            key: None,
        }
    }

    pub fn key_down(key: &str) -> Self {
        Self {
            kind: EventKind::KeyDown,
            target: None,
            key: Some(key.to_string()),
        }
    }

    pub fn error(target: N) -> Self {
        Self {
            kind: EventKind::Error,
            target: Some(target),
            key: None,
        }
    }

    pub fn intersect(target: N) -> Self {
        Self {
            kind: EventKind::Intersect,
            target: Some(target),
            key: None,
        }
    }
}

/// What a handler asks the platform to do with the event afterwards
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventOutcome {
    pub prevent_default: bool,
}

impl EventOutcome {
    pub fn prevent_default() -> Self {
        Self {
            prevent_default: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollBehavior {
    Smooth,
    Instant,
}

/// Rendering/DOM platform.
///
/// Methods take `&self`: the document is shared mutable state owned by the
/// host, as in the browser.
pub trait Dom {
    type Node: Clone + PartialEq + fmt::Debug;

    fn element_by_id(&self, id: &str) -> Option<Self::Node>;

    /// All attached elements matching a simple selector, in document order
    fn query_all(&self, selector: &str) -> Vec<Self::Node>;

    fn query_first(&self, selector: &str) -> Option<Self::Node> {
        self.query_all(selector).into_iter().next()
    }

    /// Inclusive containment: a node contains itself
    fn contains(&self, ancestor: &Self::Node, node: &Self::Node) -> bool;

    fn has_class(&self, node: &Self::Node, class: &str) -> bool;

    fn set_class(&self, node: &Self::Node, class: &str, present: bool);

    /// Flip a class, returning whether it is now present
    fn toggle_class(&self, node: &Self::Node, class: &str) -> bool {
        let present = !self.has_class(node, class);
        self.set_class(node, class, present);
        present
    }

    fn set_style(&self, node: &Self::Node, property: &str, value: &str);

    fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;

    fn set_attribute(&self, node: &Self::Node, name: &str, value: &str);

    fn offset_top(&self, node: &Self::Node) -> f64;

    fn offset_height(&self, node: &Self::Node) -> f64;

    /// Scroll the viewport; smooth scrolling is fire-and-forget
    fn scroll_to(&self, top: f64, behavior: ScrollBehavior);

    /// Scroll so `node` is aligned with the top of the viewport
    fn scroll_into_view(&self, node: &Self::Node, behavior: ScrollBehavior);

    /// Navigate the page to `href`
    fn navigate(&self, href: &str);

    fn add_listener(&self, target: &ListenTarget<Self::Node>, kind: EventKind) -> ListenerId;

    /// Remove a listener; unknown ids are ignored
    fn remove_listener(&self, id: ListenerId);
}

/// Durable, synchronous, string-keyed storage scoped to the site origin
pub trait Storage {
    fn get_item(&self, key: &str) -> UiResult<Option<String>>;

    fn set_item(&self, key: &str, value: &str) -> UiResult<()>;
}

/// Deferred work the page asks the host to run later
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerTask {
    /// Menu controls were missing; look them up again
    RetryMenuInit,
    /// Late safety-net initialization after page-ready
    FallbackMenuInit,
}

pub trait Timer {
    fn schedule(&self, delay: Duration, task: TimerTask);
}

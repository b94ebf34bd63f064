//! Restaurant UI - client-side behavior for the restaurant website
//!
//! This library drives the interactive parts of the site:
//! - Mobile navigation menu bound exactly once, with outside-click, Escape
//!   and in-panel link dismissal
//! - Collapsible menu categories whose state survives page reloads
//! - Fade-in of content blocks as they scroll into view
//! - Broken-image placeholders, the order button shortcut and the
//!   click-to-call link
//!
//! Behavior is written against the [`platform`] traits. The `wasm` feature
//! binds them to the browser; [`platform::memory`] runs everything headless.
//!
//! ## Example
//! ```rust
//! use restaurant_ui::prelude::*;
//! use restaurant_ui::platform::memory::{ManualTimer, MemoryDom, MemoryStorage};
//!
//! let dom = MemoryDom::new();
//! let toggle = dom.append(None, "button", Some("hamburger"));
//! dom.append(None, "nav", Some("nav-mobile"));
//!
//! let mut page = Page::new(
//!     SiteConfig::default(),
//!     dom.clone(),
//!     MemoryStorage::new(),
//!     ManualTimer::new(),
//! )
//! .unwrap();
//! assert_eq!(page.on_ready(), InitOutcome::Bound);
//!
//! for listener in dom.dispatch_order(EventKind::Click, Some(toggle)) {
//!     page.dispatch(listener, &UiEvent::click(toggle));
//! }
//! assert_eq!(page.menu().state(), MenuState::Open);
//! ```

pub mod config;
pub mod error;
pub mod menu;
pub mod page;
pub mod platform;
pub mod reveal;
pub mod sections;

// Re-export common types
pub mod prelude {
    pub use crate::config::{SectionSpec, SiteConfig};
    pub use crate::error::{UiError, UiResult};
    pub use crate::menu::{BindingState, InitOutcome, MenuController, MenuState};
    pub use crate::page::Page;
    pub use crate::platform::{
        Dom, EventKind, EventOutcome, ListenTarget, ListenerId, Storage, Timer, TimerTask,
        UiEvent,
    };
    pub use crate::reveal::ScrollReveal;
    pub use crate::sections::{SectionPersistence, SectionState};
}

#[cfg(feature = "wasm")]
pub mod wasm;

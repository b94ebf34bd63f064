//! Mobile navigation menu: binding lifecycle and open/close handling.
//!
//! The controller keeps an explicit registry of the listeners it installed.
//! Binding removes whatever the previous binding registered before adding
//! anything, and once bound further `initialize` calls do nothing, so a user
//! interaction never reaches more than one handler set.

use log::{debug, error, info, warn};

use crate::config::SiteConfig;
use crate::error::UiError;
use crate::platform::{
    Dom, EventKind, EventOutcome, ListenTarget, ListenerId, ScrollBehavior, Timer, TimerTask,
    UiEvent,
};

/// Open/closed status of the mobile navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MenuState {
    #[default]
    Closed,
    Open,
}

impl MenuState {
    pub fn is_open(self) -> bool {
        self == MenuState::Open
    }

    pub fn flipped(self) -> Self {
        match self {
            MenuState::Open => MenuState::Closed,
            MenuState::Closed => MenuState::Open,
        }
    }
}

/// Where the controller is in its binding lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingState {
    Unbound,
    /// Controls were missing on `attempts` lookups; a retry is queued
    PendingRetry { attempts: u32 },
    Bound,
    /// Retry budget exhausted; the menu stays inert
    GaveUp,
}

/// Result of one `initialize` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    Bound,
    AlreadyBound,
    RetryScheduled { attempt: u32 },
    GaveUp,
}

#[derive(Debug, Clone)]
enum Handler<N> {
    ToggleClick,
    ToggleTouch,
    OutsideClick,
    NavLink(N),
    EscapeKey,
}

#[derive(Debug)]
struct Binding<N> {
    toggle: N,
    panel: N,
    listeners: Vec<(ListenerId, Handler<N>)>,
}

/// Owner of the hamburger toggle and navigation drawer behavior
#[derive(Debug)]
pub struct MenuController<N> {
    config: SiteConfig,
    state: MenuState,
    binding_state: BindingState,
    binding: Option<Binding<N>>,
    retry_queued: bool,
}

impl<N: Clone + PartialEq + std::fmt::Debug> MenuController<N> {
    pub fn new(config: &SiteConfig) -> Self {
        Self {
            config: config.clone(),
            state: MenuState::Closed,
            binding_state: BindingState::Unbound,
            binding: None,
            retry_queued: false,
        }
    }

    pub fn state(&self) -> MenuState {
        self.state
    }

    pub fn binding_state(&self) -> BindingState {
        self.binding_state
    }

    /// Whether `listener` belongs to the current binding
    pub fn owns(&self, listener: ListenerId) -> bool {
        self.binding
            .as_ref()
            .is_some_and(|b| b.listeners.iter().any(|(id, _)| *id == listener))
    }

    /// Bind to the toggle control and panel, at most once.
    ///
    /// Missing controls queue a single retry on `timer`; after
    /// `max_init_attempts` failed lookups the controller gives up for good.
    pub fn initialize<D, T>(&mut self, dom: &D, timer: &T) -> InitOutcome
    where
        D: Dom<Node = N>,
        T: Timer,
    {
        let attempt = match self.binding_state {
            BindingState::Bound => {
                debug!("Menu already bound, ignoring initialize");
                return InitOutcome::AlreadyBound;
            }
            BindingState::GaveUp => return InitOutcome::GaveUp,
            BindingState::PendingRetry { attempts } => attempts + 1,
            BindingState::Unbound => 1,
        };

        match self.lookup(dom) {
            Ok((toggle, panel)) => {
                self.bind(dom, toggle, panel);
                InitOutcome::Bound
            }
            Err(missing) => {
                if attempt >= self.config.max_init_attempts {
                    error!("{}", UiError::ControlsNotFound(attempt));
                    self.binding_state = BindingState::GaveUp;
                    return InitOutcome::GaveUp;
                }
                debug!("Menu control '{missing}' not rendered yet (attempt {attempt})");
                self.binding_state = BindingState::PendingRetry { attempts: attempt };
                if !self.retry_queued {
                    timer.schedule(self.config.retry_delay(), TimerTask::RetryMenuInit);
                    self.retry_queued = true;
                }
                InitOutcome::RetryScheduled { attempt }
            }
        }
    }

    /// Entry point for the queued retry
    pub fn on_retry_timer<D, T>(&mut self, dom: &D, timer: &T) -> InitOutcome
    where
        D: Dom<Node = N>,
        T: Timer,
    {
        self.retry_queued = false;
        self.initialize(dom, timer)
    }

    /// Late forced initialization. Unlike `initialize`, this makes one more
    /// lookup after the retry budget is spent, so controls rendered between
    /// the last retry and the fallback still get bound.
    pub fn on_fallback_timer<D, T>(&mut self, dom: &D, timer: &T) -> InitOutcome
    where
        D: Dom<Node = N>,
        T: Timer,
    {
        if self.binding_state != BindingState::GaveUp {
            return self.initialize(dom, timer);
        }
        match self.lookup(dom) {
            Ok((toggle, panel)) => {
                info!("Menu controls appeared after retries ran out");
                self.bind(dom, toggle, panel);
                InitOutcome::Bound
            }
            Err(missing) => {
                debug!("Fallback init: '{missing}' still missing");
                InitOutcome::GaveUp
            }
        }
    }

    /// Toggle and panel, or the id of the first one missing
    fn lookup<D: Dom<Node = N>>(&self, dom: &D) -> Result<(N, N), &str> {
        let toggle = dom
            .element_by_id(&self.config.toggle_id)
            .ok_or(self.config.toggle_id.as_str())?;
        let panel = dom
            .element_by_id(&self.config.panel_id)
            .ok_or(self.config.panel_id.as_str())?;
        Ok((toggle, panel))
    }

    /// Remove every listener of the current binding and return to `Unbound`
    pub fn unbind<D: Dom<Node = N>>(&mut self, dom: &D) {
        if let Some(binding) = self.binding.take() {
            for (id, _) in &binding.listeners {
                dom.remove_listener(*id);
            }
            debug!("Removed {} menu listeners", binding.listeners.len());
        }
        self.state = MenuState::Closed;
        self.binding_state = BindingState::Unbound;
    }

    fn bind<D: Dom<Node = N>>(&mut self, dom: &D, toggle: N, panel: N) {
        self.unbind(dom);

        let toggle_target = ListenTarget::Element(toggle.clone());
        let mut listeners = vec![
            (
                dom.add_listener(&toggle_target, EventKind::Click),
                Handler::ToggleClick,
            ),
            (
                dom.add_listener(&toggle_target, EventKind::TouchStart),
                Handler::ToggleTouch,
            ),
            (
                dom.add_listener(&ListenTarget::Document, EventKind::Click),
                Handler::OutsideClick,
            ),
        ];
        for link in dom.query_all(&self.config.nav_link_selector) {
            if !dom.contains(&panel, &link) {
                continue;
            }
            let id = dom.add_listener(&ListenTarget::Element(link.clone()), EventKind::Click);
            listeners.push((id, Handler::NavLink(link)));
        }
        listeners.push((
            dom.add_listener(&ListenTarget::Document, EventKind::KeyDown),
            Handler::EscapeKey,
        ));

        info!("Mobile menu bound with {} listeners", listeners.len());
        self.binding = Some(Binding {
            toggle,
            panel,
            listeners,
        });
        self.binding_state = BindingState::Bound;
        self.state = MenuState::Closed;
        self.apply(dom);
    }

    /// Route an event to its handler. `None` when the listener is not part
    /// of the current binding.
    pub fn handle_event<D: Dom<Node = N>>(
        &mut self,
        dom: &D,
        listener: ListenerId,
        event: &UiEvent<N>,
    ) -> Option<EventOutcome> {
        let handler = self
            .binding
            .as_ref()?
            .listeners
            .iter()
            .find(|(id, _)| *id == listener)
            .map(|(_, handler)| handler.clone())?;

        let outcome = match handler {
            Handler::ToggleClick => {
                self.toggle(dom);
                EventOutcome::default()
            }
            // Suppresses the click the browser synthesizes after a tap
            Handler::ToggleTouch => {
                self.toggle(dom);
                EventOutcome::prevent_default()
            }
            // Targets that are not elements count as outside
            Handler::OutsideClick => {
                let inside = event
                    .target
                    .as_ref()
                    .is_some_and(|target| self.is_inside(dom, target));
                if !inside {
                    self.close(dom);
                }
                EventOutcome::default()
            }
            Handler::NavLink(link) => {
                self.follow_link(dom, &link);
                EventOutcome::prevent_default()
            }
            Handler::EscapeKey => {
                if event.key.as_deref() == Some("Escape") {
                    self.close(dom);
                }
                EventOutcome::default()
            }
        };
        Some(outcome)
    }

    /// Flip the menu and mirror it on both elements
    pub fn toggle<D: Dom<Node = N>>(&mut self, dom: &D) -> MenuState {
        if self.binding.is_none() {
            warn!("Menu toggle requested before binding");
            return self.state;
        }
        self.state = self.state.flipped();
        self.apply(dom);
        debug!("Menu {:?}", self.state);
        self.state
    }

    pub fn close<D: Dom<Node = N>>(&mut self, dom: &D) {
        self.state = MenuState::Closed;
        self.apply(dom);
    }

    /// Scroll a page section under the fixed header, then close the menu
    pub fn scroll_to_section<D: Dom<Node = N>>(&mut self, dom: &D, section_id: &str) {
        match dom.element_by_id(section_id) {
            Some(section) => self.scroll_below_header(dom, &section),
            None => warn!("{}", UiError::MissingElement(section_id.to_string())),
        }
        self.close(dom);
    }

    fn follow_link<D: Dom<Node = N>>(&mut self, dom: &D, link: &N) {
        self.close(dom);
        let Some(href) = dom.attribute(link, "href") else {
            return;
        };
        match href.strip_prefix('#') {
            Some("") => {}
            Some(anchor) => match dom.element_by_id(anchor) {
                Some(section) => self.scroll_below_header(dom, &section),
                None => warn!("{}", UiError::MissingElement(anchor.to_string())),
            },
            None => dom.navigate(&href),
        }
    }

    fn scroll_below_header<D: Dom<Node = N>>(&self, dom: &D, section: &N) {
        let top = (dom.offset_top(section) - self.header_height(dom)).max(0.0);
        dom.scroll_to(top, ScrollBehavior::Smooth);
    }

    fn header_height<D: Dom<Node = N>>(&self, dom: &D) -> f64 {
        dom.query_first(&self.config.header_selector)
            .map(|header| dom.offset_height(&header))
            .filter(|height| *height > 0.0)
            .unwrap_or(self.config.header_height)
    }

    fn is_inside<D: Dom<Node = N>>(&self, dom: &D, target: &N) -> bool {
        self.binding
            .as_ref()
            .is_some_and(|b| dom.contains(&b.toggle, target) || dom.contains(&b.panel, target))
    }

    fn apply<D: Dom<Node = N>>(&self, dom: &D) {
        let Some(binding) = &self.binding else {
            return;
        };
        let open = self.state.is_open();
        let class = &self.config.active_class;
        dom.set_class(&binding.toggle, class, open);
        dom.set_class(&binding.panel, class, open);
        dom.set_attribute(
            &binding.toggle,
            "aria-expanded",
            if open { "true" } else { "false" },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::memory::{ManualTimer, MemoryDom, NodeRef};

    struct Fixture {
        dom: MemoryDom,
        timer: ManualTimer,
        toggle: NodeRef,
        panel: NodeRef,
        link: NodeRef,
        outside: NodeRef,
    }

    fn fixture() -> Fixture {
        let dom = MemoryDom::new();
        let toggle = dom.append(None, "button", Some("hamburger"));
        let panel = dom.append(None, "nav", Some("nav-mobile"));
        let link = dom.append(Some(panel), "a", None);
        dom.set_class(&link, "nav__link", true);
        dom.set_attribute(&link, "href", "#menu");
        let outside = dom.append(None, "main", None);
        let section = dom.append(Some(outside), "section", Some("menu"));
        dom.set_offsets(section, 500.0, 900.0);
        Fixture {
            dom,
            timer: ManualTimer::new(),
            toggle,
            panel,
            link,
            outside,
        }
    }

    fn fire(
        menu: &mut MenuController<NodeRef>,
        dom: &MemoryDom,
        event: UiEvent<NodeRef>,
    ) -> bool {
        let mut prevented = false;
        for id in dom.dispatch_order(event.kind, event.target) {
            if let Some(outcome) = menu.handle_event(dom, id, &event) {
                prevented |= outcome.prevent_default;
            }
        }
        prevented
    }

    #[test]
    fn test_initialize_binds_closed() {
        let f = fixture();
        let mut menu = MenuController::new(&SiteConfig::default());
        assert_eq!(menu.initialize(&f.dom, &f.timer), InitOutcome::Bound);
        assert_eq!(menu.binding_state(), BindingState::Bound);
        assert_eq!(menu.state(), MenuState::Closed);
        assert_eq!(f.dom.attribute(&f.toggle, "aria-expanded").as_deref(), Some("false"));
        // toggle click, toggle touch, outside click, one link, escape
        assert_eq!(f.dom.listener_count(), 5);
    }

    #[test]
    fn test_click_toggles_both_markers() {
        let f = fixture();
        let mut menu = MenuController::new(&SiteConfig::default());
        menu.initialize(&f.dom, &f.timer);

        fire(&mut menu, &f.dom, UiEvent::click(f.toggle));
        assert_eq!(menu.state(), MenuState::Open);
        assert!(f.dom.has_class(&f.toggle, "active"));
        assert!(f.dom.has_class(&f.panel, "active"));

        fire(&mut menu, &f.dom, UiEvent::click(f.toggle));
        assert_eq!(menu.state(), MenuState::Closed);
        assert!(!f.dom.has_class(&f.toggle, "active"));
        assert!(!f.dom.has_class(&f.panel, "active"));
    }

    #[test]
    fn test_touch_start_prevents_synthesized_click() {
        let f = fixture();
        let mut menu = MenuController::new(&SiteConfig::default());
        menu.initialize(&f.dom, &f.timer);

        assert!(fire(&mut menu, &f.dom, UiEvent::touch_start(f.toggle)));
        assert_eq!(menu.state(), MenuState::Open);
    }

    #[test]
    fn test_outside_click_closes_inside_click_does_not() {
        let f = fixture();
        let mut menu = MenuController::new(&SiteConfig::default());
        menu.initialize(&f.dom, &f.timer);
        menu.toggle(&f.dom);

        fire(&mut menu, &f.dom, UiEvent::click(f.panel));
        assert_eq!(menu.state(), MenuState::Open);

        fire(&mut menu, &f.dom, UiEvent::click(f.outside));
        assert_eq!(menu.state(), MenuState::Closed);
        assert!(!f.dom.has_class(&f.panel, "active"));
    }

    #[test]
    fn test_escape_closes_other_keys_ignored() {
        let f = fixture();
        let mut menu = MenuController::new(&SiteConfig::default());
        menu.initialize(&f.dom, &f.timer);
        menu.toggle(&f.dom);

        fire(&mut menu, &f.dom, UiEvent::key_down("Enter"));
        assert_eq!(menu.state(), MenuState::Open);
        fire(&mut menu, &f.dom, UiEvent::key_down("Escape"));
        assert_eq!(menu.state(), MenuState::Closed);
    }

    #[test]
    fn test_nav_link_closes_and_scrolls_below_fixed_header() {
        let f = fixture();
        let mut menu = MenuController::new(&SiteConfig::default());
        menu.initialize(&f.dom, &f.timer);
        menu.toggle(&f.dom);

        assert!(fire(&mut menu, &f.dom, UiEvent::click(f.link)));
        assert_eq!(menu.state(), MenuState::Closed);
        assert_eq!(f.dom.scrolls(), vec![(420.0, ScrollBehavior::Smooth)]);
    }

    #[test]
    fn test_missing_controls_queue_one_retry() {
        let dom = MemoryDom::new();
        let timer = ManualTimer::new();
        let mut menu = MenuController::<NodeRef>::new(&SiteConfig::default());

        assert_eq!(
            menu.initialize(&dom, &timer),
            InitOutcome::RetryScheduled { attempt: 1 }
        );
        assert_eq!(
            menu.initialize(&dom, &timer),
            InitOutcome::RetryScheduled { attempt: 2 }
        );
        assert_eq!(timer.pending().len(), 1);
        assert_eq!(menu.binding_state(), BindingState::PendingRetry { attempts: 2 });
    }

    #[test]
    fn test_gives_up_after_budget() {
        let dom = MemoryDom::new();
        let timer = ManualTimer::new();
        let config = SiteConfig {
            max_init_attempts: 3,
            ..SiteConfig::default()
        };
        let mut menu = MenuController::<NodeRef>::new(&config);

        menu.initialize(&dom, &timer);
        while let Some((_, TimerTask::RetryMenuInit)) = timer.pop_next() {
            menu.on_retry_timer(&dom, &timer);
        }
        assert_eq!(menu.binding_state(), BindingState::GaveUp);
        assert_eq!(menu.initialize(&dom, &timer), InitOutcome::GaveUp);
        assert_eq!(dom.listener_count(), 0);
    }

    #[test]
    fn test_fallback_binds_controls_rendered_after_giving_up() {
        let dom = MemoryDom::new();
        let timer = ManualTimer::new();
        let mut menu = MenuController::<NodeRef>::new(&SiteConfig::default());

        menu.initialize(&dom, &timer);
        while let Some((_, TimerTask::RetryMenuInit)) = timer.pop_next() {
            menu.on_retry_timer(&dom, &timer);
        }
        assert_eq!(menu.binding_state(), BindingState::GaveUp);
        assert_eq!(menu.on_fallback_timer(&dom, &timer), InitOutcome::GaveUp);

        dom.append(None, "button", Some("hamburger"));
        dom.append(None, "nav", Some("nav-mobile"));
        assert_eq!(menu.initialize(&dom, &timer), InitOutcome::GaveUp);
        assert_eq!(menu.on_fallback_timer(&dom, &timer), InitOutcome::Bound);
        assert_eq!(menu.binding_state(), BindingState::Bound);
        assert!(timer.pending().is_empty());
    }

    #[test]
    fn test_click_without_element_target_closes() {
        let f = fixture();
        let mut menu = MenuController::new(&SiteConfig::default());
        menu.initialize(&f.dom, &f.timer);
        menu.toggle(&f.dom);

        let event = UiEvent {
            kind: EventKind::Click,
            target: None,
            key: None,
        };
        fire(&mut menu, &f.dom, event);
        assert_eq!(menu.state(), MenuState::Closed);
        assert!(!f.dom.has_class(&f.toggle, "active"));
    }

    #[test]
    fn test_toggle_before_binding_is_noop() {
        let dom = MemoryDom::new();
        let mut menu = MenuController::<NodeRef>::new(&SiteConfig::default());
        assert_eq!(menu.toggle(&dom), MenuState::Closed);
    }

    #[test]
    fn test_stale_listener_ignored_after_unbind() {
        let f = fixture();
        let mut menu = MenuController::new(&SiteConfig::default());
        menu.initialize(&f.dom, &f.timer);
        let stale = f.dom.dispatch_order(EventKind::Click, Some(f.toggle))[0];

        menu.unbind(&f.dom);
        assert_eq!(f.dom.listener_count(), 0);
        assert!(!menu.owns(stale));
        assert_eq!(
            menu.handle_event(&f.dom, stale, &UiEvent::click(f.toggle)),
            None
        );
    }
}

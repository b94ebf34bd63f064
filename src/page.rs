//! Page-ready wiring: owns the platform handles and both controllers, and
//! routes listener and timer callbacks to them.

use log::{debug, error, info};

use crate::config::SiteConfig;
use crate::error::UiResult;
use crate::menu::{InitOutcome, MenuController};
use crate::platform::{
    Dom, EventKind, EventOutcome, ListenTarget, ListenerId, ScrollBehavior, Storage, Timer,
    TimerTask, UiEvent,
};
use crate::reveal::ScrollReveal;
use crate::sections::{SectionPersistence, SectionState};

/// Shown in place of images that fail to load
pub const IMAGE_PLACEHOLDER_SRC: &str = "data:image/svg+xml;base64,PHN2ZyB3aWR0aD0iNDAwIiBoZWlnaHQ9IjIwMCIgeG1sbnM9Imh0dHA6Ly93d3cudzMub3JnLzIwMDAvc3ZnIj48cmVjdCB3aWR0aD0iMTAwJSIgaGVpZ2h0PSIxMDAlIiBmaWxsPSIjZGRkIi8+PHRleHQgeD0iNTAlIiB5PSI1MCUiIGZvbnQtZmFtaWx5PSJBcmlhbCIgZm9udC1zaXplPSIxOCIgZmlsbD0iIzk5OSIgdGV4dC1hbmNob3I9Im1pZGRsZSIgZHk9Ii4zZW0iPkltYWdlIG5vbiBkaXNwb25pYmxlPC90ZXh0Pjwvc3ZnPg==";
pub const IMAGE_PLACEHOLDER_ALT: &str = "Image non disponible";

/// One page worth of behavior
pub struct Page<D: Dom, S: Storage, T: Timer> {
    config: SiteConfig,
    dom: D,
    storage: S,
    timer: T,
    menu: MenuController<D::Node>,
    sections: SectionPersistence,
    reveal: ScrollReveal<D::Node>,
    image_fallbacks: Vec<(ListenerId, D::Node)>,
    /// Order button listener and the block it jumps to
    order_shortcut: Option<(ListenerId, D::Node)>,
}

impl<D: Dom, S: Storage, T: Timer> Page<D, S, T> {
    pub fn new(config: SiteConfig, dom: D, storage: S, timer: T) -> UiResult<Self> {
        config.validate()?;
        let menu = MenuController::new(&config);
        let sections = SectionPersistence::new(&config);
        let reveal = ScrollReveal::new(&config);
        Ok(Self {
            config,
            dom,
            storage,
            timer,
            menu,
            sections,
            reveal,
            image_fallbacks: Vec::new(),
            order_shortcut: None,
        })
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    pub fn dom(&self) -> &D {
        &self.dom
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn menu(&self) -> &MenuController<D::Node> {
        &self.menu
    }

    pub fn sections(&self) -> &SectionPersistence {
        &self.sections
    }

    pub fn reveal(&self) -> &ScrollReveal<D::Node> {
        &self.reveal
    }

    /// Document is parsed: restore sections, bind the menu, arm the fallback
    /// initialization, then the page extras (scroll reveal, order button,
    /// broken-image placeholders)
    pub fn on_ready(&mut self) -> InitOutcome {
        self.sections.restore(&self.dom, &self.storage);
        let outcome = self.menu.initialize(&self.dom, &self.timer);
        self.timer
            .schedule(self.config.fallback_init_delay(), TimerTask::FallbackMenuInit);
        self.reveal.install(&self.dom);
        self.install_order_shortcut();
        self.install_image_fallbacks();
        info!("Page ready, menu {outcome:?}");
        outcome
    }

    pub fn on_timer(&mut self, task: TimerTask) -> InitOutcome {
        match task {
            TimerTask::RetryMenuInit => self.menu.on_retry_timer(&self.dom, &self.timer),
            TimerTask::FallbackMenuInit => self.menu.on_fallback_timer(&self.dom, &self.timer),
        }
    }

    /// Run the handler registered under `listener`
    pub fn dispatch(&mut self, listener: ListenerId, event: &UiEvent<D::Node>) -> EventOutcome {
        if let Some(outcome) = self.menu.handle_event(&self.dom, listener, event) {
            return outcome;
        }
        if self.reveal.handle_event(&self.dom, listener, event) {
            return EventOutcome::default();
        }
        if let Some((_, section)) = self
            .order_shortcut
            .as_ref()
            .filter(|(id, _)| *id == listener)
        {
            self.dom.scroll_into_view(section, ScrollBehavior::Smooth);
            return EventOutcome::prevent_default();
        }
        if let Some(index) = self.image_fallbacks.iter().position(|(id, _)| *id == listener) {
            let (id, image) = self.image_fallbacks.swap_remove(index);
            // One shot: a failing placeholder must not loop
            self.dom.remove_listener(id);
            self.dom.set_attribute(&image, "src", IMAGE_PLACEHOLDER_SRC);
            self.dom.set_attribute(&image, "alt", IMAGE_PLACEHOLDER_ALT);
            debug!("Replaced broken image with placeholder");
            return EventOutcome::default();
        }
        debug!("No handler for {listener}, ignoring");
        EventOutcome::default()
    }

    pub fn toggle_section(&mut self, section_id: &str) -> Option<SectionState> {
        self.sections
            .toggle(&self.dom, &self.storage, section_id)
            .map_err(|e| error!("Section toggle failed: {e}"))
            .ok()
    }

    pub fn toggle_subsection(&mut self, content_id: &str) -> Option<SectionState> {
        self.sections
            .toggle_subsection(&self.dom, content_id)
            .map_err(|e| error!("Subsection toggle failed: {e}"))
            .ok()
    }

    pub fn scroll_to_section(&mut self, section_id: &str) {
        self.menu.scroll_to_section(&self.dom, section_id);
    }

    pub fn close_menu(&mut self) {
        self.menu.close(&self.dom);
    }

    /// Start a phone call to the restaurant
    pub fn make_call(&self) {
        self.dom.navigate(&format!("tel:{}", self.config.phone));
    }

    fn install_order_shortcut(&mut self) {
        if self.order_shortcut.is_some() {
            return;
        }
        let button = self.dom.query_first(&self.config.order_button_selector);
        let section = self.dom.query_first(&self.config.order_section_selector);
        if let (Some(button), Some(section)) = (button, section) {
            let id = self
                .dom
                .add_listener(&ListenTarget::Element(button), EventKind::Click);
            self.order_shortcut = Some((id, section));
        }
    }

    fn install_image_fallbacks(&mut self) {
        if !self.image_fallbacks.is_empty() {
            return;
        }
        for image in self.dom.query_all(&self.config.image_selector) {
            let id = self
                .dom
                .add_listener(&ListenTarget::Element(image.clone()), EventKind::Error);
            self.image_fallbacks.push((id, image));
        }
    }
}

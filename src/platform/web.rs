//! Browser platform over `web-sys`

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use log::warn;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    Document, Element, HtmlElement, IntersectionObserver, IntersectionObserverEntry,
    IntersectionObserverInit, KeyboardEvent, ScrollIntoViewOptions, ScrollLogicalPosition,
    ScrollToOptions, Window,
};

use crate::error::{UiError, UiResult};

use super::{Dom, EventKind, EventOutcome, ListenTarget, ListenerId, ScrollBehavior, Storage, Timer, TimerTask, UiEvent};

/// Called for every DOM event reaching one of our listeners
pub type Dispatcher = Rc<dyn Fn(ListenerId, UiEvent<Element>) -> EventOutcome>;

/// Share of an element that must be visible before it counts as revealed
const REVEAL_THRESHOLD: f64 = 0.1;
/// Reveal a little before the block clears the bottom edge
const REVEAL_ROOT_MARGIN: &str = "0px 0px -50px 0px";

type ObserverCallback = Closure<dyn FnMut(js_sys::Array, IntersectionObserver)>;

enum Registration {
    Event {
        target: web_sys::EventTarget,
        kind: EventKind,
        callback: Closure<dyn FnMut(web_sys::Event)>,
    },
    /// One observer per watched element, disconnected on removal
    Observer {
        observer: IntersectionObserver,
        _callback: ObserverCallback,
    },
}

pub struct WebDom {
    window: Window,
    document: Document,
    dispatch: Dispatcher,
    listeners: RefCell<HashMap<ListenerId, Registration>>,
    next_listener: Cell<u64>,
}

impl WebDom {
    pub fn new(dispatch: Dispatcher) -> UiResult<Self> {
        let window = web_sys::window()
            .ok_or_else(|| UiError::MissingElement("window".to_string()))?;
        let document = window
            .document()
            .ok_or_else(|| UiError::MissingElement("document".to_string()))?;
        Ok(Self {
            window,
            document,
            dispatch,
            listeners: RefCell::new(HashMap::new()),
            next_listener: Cell::new(0),
        })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }
}

fn scroll_behavior(behavior: ScrollBehavior) -> web_sys::ScrollBehavior {
    match behavior {
        ScrollBehavior::Smooth => web_sys::ScrollBehavior::Smooth,
        ScrollBehavior::Instant => web_sys::ScrollBehavior::Instant,
    }
}

fn to_ui_event(kind: EventKind, event: &web_sys::Event) -> UiEvent<Element> {
    UiEvent {
        kind,
        target: event.target().and_then(|t| t.dyn_into::<Element>().ok()),
        key: event.dyn_ref::<KeyboardEvent>().map(KeyboardEvent::key),
    }
}

impl Dom for WebDom {
    type Node = Element;

    fn element_by_id(&self, id: &str) -> Option<Element> {
        self.document.get_element_by_id(id)
    }

    fn query_all(&self, selector: &str) -> Vec<Element> {
        let Ok(list) = self.document.query_selector_all(selector) else {
            warn!("Invalid selector '{selector}'");
            return Vec::new();
        };
        (0..list.length())
            .filter_map(|i| list.get(i))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .collect()
    }

    fn query_first(&self, selector: &str) -> Option<Element> {
        self.document.query_selector(selector).ok().flatten()
    }

    fn contains(&self, ancestor: &Element, node: &Element) -> bool {
        ancestor.contains(Some(node.as_ref()))
    }

    fn has_class(&self, node: &Element, class: &str) -> bool {
        node.class_list().contains(class)
    }

    fn set_class(&self, node: &Element, class: &str, present: bool) {
        let classes = node.class_list();
        let result = if present {
            classes.add_1(class)
        } else {
            classes.remove_1(class)
        };
        if result.is_err() {
            warn!("Could not update class '{class}'");
        }
    }

    fn set_style(&self, node: &Element, property: &str, value: &str) {
        if let Some(element) = node.dyn_ref::<HtmlElement>() {
            if let Err(e) = element.style().set_property(property, value) {
                warn!("Could not set style '{property}': {e:?}");
            }
        }
    }

    fn attribute(&self, node: &Element, name: &str) -> Option<String> {
        node.get_attribute(name)
    }

    fn set_attribute(&self, node: &Element, name: &str, value: &str) {
        if let Err(e) = node.set_attribute(name, value) {
            warn!("Could not set attribute '{name}': {e:?}");
        }
    }

    fn offset_top(&self, node: &Element) -> f64 {
        node.dyn_ref::<HtmlElement>()
            .map(|e| f64::from(e.offset_top()))
            .unwrap_or_default()
    }

    fn offset_height(&self, node: &Element) -> f64 {
        node.dyn_ref::<HtmlElement>()
            .map(|e| f64::from(e.offset_height()))
            .unwrap_or_default()
    }

    fn scroll_to(&self, top: f64, behavior: ScrollBehavior) {
        let options = ScrollToOptions::new();
        options.set_top(top);
        options.set_behavior(scroll_behavior(behavior));
        self.window.scroll_to_with_scroll_to_options(&options);
    }

    fn scroll_into_view(&self, node: &Element, behavior: ScrollBehavior) {
        let options = ScrollIntoViewOptions::new();
        options.set_behavior(scroll_behavior(behavior));
        options.set_block(ScrollLogicalPosition::Start);
        node.scroll_into_view_with_scroll_into_view_options(&options);
    }

    fn navigate(&self, href: &str) {
        if let Err(e) = self.window.location().set_href(href) {
            warn!("Navigation to '{href}' failed: {e:?}");
        }
    }

    fn add_listener(&self, target: &ListenTarget<Element>, kind: EventKind) -> ListenerId {
        let id = ListenerId(self.next_listener.get());
        self.next_listener.set(id.0 + 1);

        let registration = match (kind, target) {
            (EventKind::Intersect, ListenTarget::Element(element)) => self.observe(id, element),
            (EventKind::Intersect, ListenTarget::Document) => {
                warn!("Visibility can only be observed on elements");
                None
            }
            _ => self.listen(id, target, kind),
        };
        if let Some(registration) = registration {
            self.listeners.borrow_mut().insert(id, registration);
        }
        id
    }

    fn remove_listener(&self, id: ListenerId) {
        let Some(registration) = self.listeners.borrow_mut().remove(&id) else {
            return;
        };
        match registration {
            Registration::Event {
                target,
                kind,
                callback,
            } => {
                if let Err(e) = target
                    .remove_event_listener_with_callback(kind.as_str(), callback.as_ref().unchecked_ref())
                {
                    warn!("removeEventListener({}) failed: {e:?}", kind.as_str());
                }
            }
            Registration::Observer { observer, .. } => observer.disconnect(),
        }
    }
}

impl WebDom {
    fn listen(
        &self,
        id: ListenerId,
        target: &ListenTarget<Element>,
        kind: EventKind,
    ) -> Option<Registration> {
        let dispatch = Rc::clone(&self.dispatch);
        let callback = Closure::<dyn FnMut(web_sys::Event)>::wrap(Box::new(
            move |event: web_sys::Event| {
                if dispatch(id, to_ui_event(kind, &event)).prevent_default {
                    event.prevent_default();
                }
            },
        ));
        let target: web_sys::EventTarget = match target {
            ListenTarget::Element(element) => element.clone().into(),
            ListenTarget::Document => self.document.clone().into(),
        };
        if let Err(e) =
            target.add_event_listener_with_callback(kind.as_str(), callback.as_ref().unchecked_ref())
        {
            warn!("addEventListener({}) failed: {e:?}", kind.as_str());
        }
        Some(Registration::Event {
            target,
            kind,
            callback,
        })
    }

    fn observe(&self, id: ListenerId, element: &Element) -> Option<Registration> {
        let dispatch = Rc::clone(&self.dispatch);
        let callback: ObserverCallback = Closure::new(
            move |entries: js_sys::Array, _observer: IntersectionObserver| {
                for entry in entries.iter() {
                    let entry: IntersectionObserverEntry = entry.unchecked_into();
                    if entry.is_intersecting() {
                        dispatch(id, UiEvent::intersect(entry.target()));
                    }
                }
            },
        );
        let options = IntersectionObserverInit::new();
        options.set_threshold(&JsValue::from_f64(REVEAL_THRESHOLD));
        options.set_root_margin(REVEAL_ROOT_MARGIN);
        match IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &options) {
            Ok(observer) => {
                observer.observe(element);
                Some(Registration::Observer {
                    observer,
                    _callback: callback,
                })
            }
            Err(e) => {
                warn!("IntersectionObserver unavailable: {e:?}");
                None
            }
        }
    }
}

/// `window.localStorage`, absent in some sandboxed contexts
pub struct WebStorage {
    storage: Option<web_sys::Storage>,
}

impl WebStorage {
    pub fn new(window: &Window) -> Self {
        let storage = window.local_storage().ok().flatten();
        if storage.is_none() {
            warn!("localStorage unavailable, section state will not persist");
        }
        Self { storage }
    }

    fn storage(&self) -> UiResult<&web_sys::Storage> {
        self.storage
            .as_ref()
            .ok_or_else(|| UiError::StorageUnavailable("localStorage missing".to_string()))
    }
}

impl Storage for WebStorage {
    fn get_item(&self, key: &str) -> UiResult<Option<String>> {
        self.storage()?
            .get_item(key)
            .map_err(|e| UiError::StorageUnavailable(format!("{e:?}")))
    }

    fn set_item(&self, key: &str, value: &str) -> UiResult<()> {
        self.storage()?
            .set_item(key, value)
            .map_err(|e| UiError::StorageUnavailable(format!("{e:?}")))
    }
}

/// `setTimeout`-backed timer handing fired tasks to `on_fire`
pub struct WebTimer {
    window: Window,
    on_fire: Rc<dyn Fn(TimerTask)>,
}

impl WebTimer {
    pub fn new(window: Window, on_fire: Rc<dyn Fn(TimerTask)>) -> Self {
        Self { window, on_fire }
    }
}

impl Timer for WebTimer {
    fn schedule(&self, delay: Duration, task: TimerTask) {
        let on_fire = Rc::clone(&self.on_fire);
        let callback = Closure::once_into_js(move || on_fire(task));
        let millis = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX);
        if let Err(e) = self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(callback.unchecked_ref(), millis)
        {
            warn!("setTimeout failed for {task:?}: {e:?}");
        }
    }
}

//! WASM bindings for the page
//!
//! The page lives in a thread-local slot. DOM listeners and timers re-enter
//! through [`with_page`], and the inline handlers in the site markup
//! (`toggleCategory('viande')`, `scrollToSection('menu')`, ...) call the
//! exported functions below.

use std::cell::RefCell;
use std::rc::Rc;

use log::{Level, LevelFilter, Log, Metadata, Record};
use wasm_bindgen::prelude::*;
use web_sys::Element;

use crate::config::SiteConfig;
use crate::error::UiError;
use crate::page::Page;
use crate::platform::web::{WebDom, WebStorage, WebTimer};
use crate::platform::{EventOutcome, ListenerId, TimerTask, UiEvent};

// Use wee_alloc for smaller WASM binary
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

type WebPage = Page<WebDom, WebStorage, WebTimer>;

thread_local! {
    static PAGE: RefCell<Option<WebPage>> = const { RefCell::new(None) };
}

/// `log` sink writing to the browser console
struct ConsoleLogger;

static LOGGER: ConsoleLogger = ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = JsValue::from_str(&format!("[{}] {}", record.target(), record.args()));
        match record.level() {
            Level::Error => web_sys::console::error_1(&line),
            Level::Warn => web_sys::console::warn_1(&line),
            Level::Info => web_sys::console::info_1(&line),
            Level::Debug | Level::Trace => web_sys::console::debug_1(&line),
        }
    }

    fn flush(&self) {}
}

/// Initialize panic hook and console logging
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(if cfg!(debug_assertions) {
            LevelFilter::Debug
        } else {
            LevelFilter::Warn
        });
    }
}

fn with_page<R>(f: impl FnOnce(&mut WebPage) -> R) -> Option<R> {
    PAGE.with(|slot| match slot.try_borrow_mut() {
        Ok(mut page) => match page.as_mut() {
            Some(page) => Some(f(page)),
            None => {
                log::warn!("Page not booted yet");
                None
            }
        },
        Err(_) => {
            log::warn!("Page busy, dropping re-entrant call");
            None
        }
    })
}

/// Boot the page behavior. `config` is an optional object overriding
/// [`SiteConfig`] fields; call once the document has been parsed.
#[wasm_bindgen]
pub fn boot(config: JsValue) -> Result<(), JsValue> {
    let config: SiteConfig = if config.is_undefined() || config.is_null() {
        SiteConfig::default()
    } else {
        serde_wasm_bindgen::from_value(config)?
    };

    let dispatch = Rc::new(|listener: ListenerId, event: UiEvent<Element>| {
        with_page(|page| page.dispatch(listener, &event)).unwrap_or_else(EventOutcome::default)
    });
    let dom = WebDom::new(dispatch).map_err(to_js)?;
    let storage = WebStorage::new(dom.window());
    let timer = WebTimer::new(
        dom.window().clone(),
        Rc::new(|task: TimerTask| {
            with_page(|page| page.on_timer(task));
        }),
    );
    let page = Page::new(config, dom, storage, timer).map_err(to_js)?;

    let already_booted = PAGE.with(|slot| {
        let mut slot = slot.borrow_mut();
        if slot.is_some() {
            return true;
        }
        *slot = Some(page);
        false
    });
    if already_booted {
        log::warn!("boot() called twice, keeping the first page");
        return Ok(());
    }
    with_page(|page| page.on_ready());
    Ok(())
}

#[wasm_bindgen(js_name = "toggleCategory")]
pub fn toggle_category(section_id: &str) {
    with_page(|page| page.toggle_section(section_id));
}

#[wasm_bindgen(js_name = "toggleSubsection")]
pub fn toggle_subsection(content_id: &str) {
    with_page(|page| page.toggle_subsection(content_id));
}

#[wasm_bindgen(js_name = "scrollToSection")]
pub fn scroll_to_section(section_id: &str) {
    with_page(|page| page.scroll_to_section(section_id));
}

#[wasm_bindgen(js_name = "closeMobileMenu")]
pub fn close_mobile_menu() {
    with_page(|page| page.close_menu());
}

#[wasm_bindgen(js_name = "makeCall")]
pub fn make_call() {
    with_page(|page| page.make_call());
}

/// Get version information
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn to_js(err: UiError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

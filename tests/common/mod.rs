#![allow(dead_code)]

use restaurant_ui::platform::memory::{ManualTimer, MemoryDom, MemoryStorage, NodeRef};
use restaurant_ui::prelude::*;

pub type TestPage = Page<MemoryDom, MemoryStorage, ManualTimer>;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Handles into the site markup built by [`build_site`]
pub struct Site {
    pub dom: MemoryDom,
    pub header: NodeRef,
    pub toggle: NodeRef,
    pub toggle_bars: NodeRef,
    pub panel: NodeRef,
    pub menu_link: NodeRef,
    pub contact_link: NodeRef,
    pub external_link: NodeRef,
    pub hero: NodeRef,
    pub image: NodeRef,
}

pub struct Category {
    pub content: NodeRef,
    pub icon: NodeRef,
    pub header: NodeRef,
}

/// Header with the hamburger, the mobile drawer with three links, page
/// sections, and one category block per configured section
pub fn build_site(config: &SiteConfig) -> Site {
    let dom = MemoryDom::new();

    let header = dom.append(None, "header", None);
    dom.set_class(&header, "header", true);
    dom.set_offsets(header, 0.0, 70.0);
    let toggle = dom.append(Some(header), "button", Some(config.toggle_id.as_str()));
    let toggle_bars = dom.append(Some(toggle), "span", None);

    let panel = dom.append(None, "nav", Some(config.panel_id.as_str()));
    let menu_link = nav_link(&dom, panel, "#menu");
    let contact_link = nav_link(&dom, panel, "#contact");
    let external_link = nav_link(&dom, panel, "https://www.ubereats.com/fr");

    let main = dom.append(None, "main", None);
    let hero = dom.append(Some(main), "section", Some("accueil"));
    dom.set_offsets(hero, 70.0, 600.0);
    let menu = dom.append(Some(main), "section", Some("menu"));
    dom.set_offsets(menu, 670.0, 1800.0);
    let contact = dom.append(Some(main), "section", Some("contact"));
    dom.set_offsets(contact, 2470.0, 400.0);
    let image = dom.append(Some(hero), "img", None);
    dom.set_attribute(&image, "src", "/images/facade.jpg");

    for spec in &config.sections {
        build_category(&dom, Some(menu), spec);
    }

    Site {
        dom,
        header,
        toggle,
        toggle_bars,
        panel,
        menu_link,
        contact_link,
        external_link,
        hero,
        image,
    }
}

fn nav_link(dom: &MemoryDom, panel: NodeRef, href: &str) -> NodeRef {
    let item = dom.append(Some(panel), "li", None);
    let link = dom.append(Some(item), "a", None);
    dom.set_class(&link, "nav__link", true);
    dom.set_attribute(&link, "href", href);
    link
}

fn build_category(dom: &MemoryDom, parent: Option<NodeRef>, spec: &SectionSpec) {
    let id = &spec.id;
    let header = dom.append(parent, "div", Some(format!("{id}-header").as_str()));
    dom.set_class(&header, "active", true);
    dom.append(Some(header), "i", Some(format!("{id}-icon").as_str()));
    dom.append(parent, "div", Some(format!("{id}-content").as_str()));
    if spec.has_image_panel {
        dom.append(parent, "div", Some(format!("{id}-images").as_str()));
    }
}

pub fn category(dom: &MemoryDom, id: &str) -> Category {
    Category {
        content: dom.element_by_id(&format!("{id}-content")).unwrap(),
        icon: dom.element_by_id(&format!("{id}-icon")).unwrap(),
        header: dom.element_by_id(&format!("{id}-header")).unwrap(),
    }
}

pub fn is_collapsed(dom: &MemoryDom, id: &str) -> bool {
    let c = category(dom, id);
    dom.has_class(&c.content, "collapsed")
        && dom.has_class(&c.icon, "rotated")
        && !dom.has_class(&c.header, "active")
}

pub fn is_expanded(dom: &MemoryDom, id: &str) -> bool {
    let c = category(dom, id);
    !dom.has_class(&c.content, "collapsed")
        && !dom.has_class(&c.icon, "rotated")
        && dom.has_class(&c.header, "active")
}

pub fn new_page(dom: &MemoryDom, storage: &MemoryStorage, timer: &ManualTimer) -> TestPage {
    Page::new(
        SiteConfig::default(),
        dom.clone(),
        storage.clone(),
        timer.clone(),
    )
    .unwrap()
}

/// Fire `event` through every listener it reaches. Returns whether any
/// handler prevented the default action.
pub fn fire(page: &mut TestPage, dom: &MemoryDom, event: UiEvent<NodeRef>) -> bool {
    let mut prevented = false;
    for listener in dom.dispatch_order(event.kind, event.target) {
        // Handlers may remove listeners that have not run yet
        if dom.is_registered(listener) {
            prevented |= page.dispatch(listener, &event).prevent_default;
        }
    }
    prevented
}

pub fn click(page: &mut TestPage, dom: &MemoryDom, target: NodeRef) -> bool {
    fire(page, dom, UiEvent::click(target))
}

/// Touch start followed by the synthesized click unless it was prevented
pub fn tap(page: &mut TestPage, dom: &MemoryDom, target: NodeRef) {
    if !fire(page, dom, UiEvent::touch_start(target)) {
        fire(page, dom, UiEvent::click(target));
    }
}

pub fn press(page: &mut TestPage, dom: &MemoryDom, key: &str) {
    fire(page, dom, UiEvent::key_down(key));
}

/// Fire queued timers in delay order until none are left
pub fn run_timers(page: &mut TestPage, timer: &ManualTimer) {
    for _ in 0..100 {
        let Some((_, task)) = timer.pop_next() else {
            return;
        };
        page.on_timer(task);
    }
    panic!("timers kept rescheduling");
}

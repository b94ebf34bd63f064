//! In-memory platform: a small element tree, a key/value store and a manual
//! timer queue.
//!
//! Handles are cheap clones sharing the same state, so a test can hand one
//! copy to a [`Page`](crate::page::Page) and keep another for inspection.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;
use std::time::Duration;

use crate::error::{UiError, UiResult};

use super::{Dom, EventKind, ListenTarget, ListenerId, ScrollBehavior, Storage, Timer, TimerTask};

/// Handle to an element of a [`MemoryDom`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeRef(usize);

#[derive(Debug, Default)]
struct ElementData {
    tag: String,
    id: Option<String>,
    parent: Option<NodeRef>,
    attached: bool,
    classes: BTreeSet<String>,
    style: BTreeMap<String, String>,
    attributes: BTreeMap<String, String>,
    offset_top: f64,
    offset_height: f64,
}

#[derive(Debug)]
struct Registration {
    id: ListenerId,
    target: ListenTarget<NodeRef>,
    kind: EventKind,
}

#[derive(Debug, Default)]
struct Tree {
    elements: Vec<ElementData>,
    listeners: Vec<Registration>,
    next_listener: u64,
    scrolls: Vec<(f64, ScrollBehavior)>,
    scrolled_into_view: Vec<(NodeRef, ScrollBehavior)>,
    navigations: Vec<String>,
}

impl Tree {
    fn get(&self, node: NodeRef) -> &ElementData {
        &self.elements[node.0]
    }

    fn get_mut(&mut self, node: NodeRef) -> &mut ElementData {
        &mut self.elements[node.0]
    }

    /// Node and its ancestors, innermost first
    fn path(&self, node: NodeRef) -> Vec<NodeRef> {
        let mut path = vec![node];
        let mut current = self.get(node).parent;
        while let Some(parent) = current {
            path.push(parent);
            current = self.get(parent).parent;
        }
        path
    }

    /// Simple selectors, optionally joined into a comma-separated list
    fn matches(&self, node: NodeRef, selector: &str) -> bool {
        selector
            .split(',')
            .map(str::trim)
            .any(|simple| self.matches_simple(node, simple))
    }

    fn matches_simple(&self, node: NodeRef, selector: &str) -> bool {
        let element = self.get(node);
        if let Some(class) = selector.strip_prefix('.') {
            element.classes.contains(class)
        } else if let Some(id) = selector.strip_prefix('#') {
            element.id.as_deref() == Some(id)
        } else {
            element.tag.eq_ignore_ascii_case(selector)
        }
    }
}

/// Headless document
#[derive(Debug, Clone, Default)]
pub struct MemoryDom {
    tree: Rc<RefCell<Tree>>,
}

impl MemoryDom {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an element and attach it under `parent` (or at top level)
    pub fn append(&self, parent: Option<NodeRef>, tag: &str, id: Option<&str>) -> NodeRef {
        let mut tree = self.tree.borrow_mut();
        let node = NodeRef(tree.elements.len());
        tree.elements.push(ElementData {
            tag: tag.to_string(),
            id: id.map(str::to_string),
            parent,
            attached: true,
            ..ElementData::default()
        });
        node
    }

    /// Take an element and its subtree out of the document
    pub fn detach(&self, node: NodeRef) {
        self.tree.borrow_mut().get_mut(node).attached = false;
    }

    pub fn set_offsets(&self, node: NodeRef, top: f64, height: f64) {
        let mut tree = self.tree.borrow_mut();
        let element = tree.get_mut(node);
        element.offset_top = top;
        element.offset_height = height;
    }

    pub fn classes(&self, node: NodeRef) -> Vec<String> {
        self.tree.borrow().get(node).classes.iter().cloned().collect()
    }

    pub fn style(&self, node: NodeRef, property: &str) -> Option<String> {
        self.tree.borrow().get(node).style.get(property).cloned()
    }

    /// Every `scroll_to` request so far
    pub fn scrolls(&self) -> Vec<(f64, ScrollBehavior)> {
        self.tree.borrow().scrolls.clone()
    }

    /// Every `scroll_into_view` request so far
    pub fn scrolled_into_view(&self) -> Vec<(NodeRef, ScrollBehavior)> {
        self.tree.borrow().scrolled_into_view.clone()
    }

    /// Every `navigate` request so far
    pub fn navigations(&self) -> Vec<String> {
        self.tree.borrow().navigations.clone()
    }

    pub fn listener_count(&self) -> usize {
        self.tree.borrow().listeners.len()
    }

    pub fn is_registered(&self, id: ListenerId) -> bool {
        self.tree.borrow().listeners.iter().any(|r| r.id == id)
    }

    /// Listeners an event of `kind` fired at `target` reaches, in dispatch
    /// order: the target, its ancestors, then the document. Listeners on the
    /// same target keep registration order. Non-bubbling kinds only reach
    /// the target.
    pub fn dispatch_order(&self, kind: EventKind, target: Option<NodeRef>) -> Vec<ListenerId> {
        let tree = self.tree.borrow();
        let mut order = Vec::new();
        if let Some(target) = target {
            if !self.is_attached_in(&tree, target) {
                return order;
            }
            let path = tree.path(target);
            let reached = if kind.bubbles() { path.len() } else { 1 };
            for node in path.into_iter().take(reached) {
                order.extend(tree.listeners.iter().filter_map(|r| match &r.target {
                    ListenTarget::Element(n) if *n == node && r.kind == kind => Some(r.id),
                    _ => None,
                }));
            }
        }
        if !kind.bubbles() {
            return order;
        }
        order.extend(
            tree.listeners
                .iter()
                .filter(|r| r.target == ListenTarget::Document && r.kind == kind)
                .map(|r| r.id),
        );
        order
    }

    fn is_attached_in(&self, tree: &Tree, node: NodeRef) -> bool {
        tree.path(node).iter().all(|n| tree.get(*n).attached)
    }
}

impl Dom for MemoryDom {
    type Node = NodeRef;

    fn element_by_id(&self, id: &str) -> Option<NodeRef> {
        let tree = self.tree.borrow();
        (0..tree.elements.len())
            .map(NodeRef)
            .find(|n| tree.get(*n).id.as_deref() == Some(id) && self.is_attached_in(&tree, *n))
    }

    fn query_all(&self, selector: &str) -> Vec<NodeRef> {
        let tree = self.tree.borrow();
        let selector = selector.trim();
        (0..tree.elements.len())
            .map(NodeRef)
            .filter(|n| self.is_attached_in(&tree, *n) && tree.matches(*n, selector))
            .collect()
    }

    fn contains(&self, ancestor: &NodeRef, node: &NodeRef) -> bool {
        self.tree.borrow().path(*node).contains(ancestor)
    }

    fn has_class(&self, node: &NodeRef, class: &str) -> bool {
        self.tree.borrow().get(*node).classes.contains(class)
    }

    fn set_class(&self, node: &NodeRef, class: &str, present: bool) {
        let mut tree = self.tree.borrow_mut();
        let classes = &mut tree.get_mut(*node).classes;
        if present {
            classes.insert(class.to_string());
        } else {
            classes.remove(class);
        }
    }

    fn set_style(&self, node: &NodeRef, property: &str, value: &str) {
        self.tree
            .borrow_mut()
            .get_mut(*node)
            .style
            .insert(property.to_string(), value.to_string());
    }

    fn attribute(&self, node: &NodeRef, name: &str) -> Option<String> {
        self.tree.borrow().get(*node).attributes.get(name).cloned()
    }

    fn set_attribute(&self, node: &NodeRef, name: &str, value: &str) {
        self.tree
            .borrow_mut()
            .get_mut(*node)
            .attributes
            .insert(name.to_string(), value.to_string());
    }

    fn offset_top(&self, node: &NodeRef) -> f64 {
        self.tree.borrow().get(*node).offset_top
    }

    fn offset_height(&self, node: &NodeRef) -> f64 {
        self.tree.borrow().get(*node).offset_height
    }

    fn scroll_to(&self, top: f64, behavior: ScrollBehavior) {
        self.tree.borrow_mut().scrolls.push((top, behavior));
    }

    fn scroll_into_view(&self, node: &NodeRef, behavior: ScrollBehavior) {
        self.tree
            .borrow_mut()
            .scrolled_into_view
            .push((*node, behavior));
    }

    fn navigate(&self, href: &str) {
        self.tree.borrow_mut().navigations.push(href.to_string());
    }

    fn add_listener(&self, target: &ListenTarget<NodeRef>, kind: EventKind) -> ListenerId {
        let mut tree = self.tree.borrow_mut();
        tree.next_listener += 1;
        let id = ListenerId(tree.next_listener);
        tree.listeners.push(Registration {
            id,
            target: target.clone(),
            kind,
        });
        id
    }

    fn remove_listener(&self, id: ListenerId) {
        self.tree.borrow_mut().listeners.retain(|r| r.id != id);
    }
}

/// Key/value store shared between clones, like an origin's local storage
#[derive(Debug, Clone)]
pub struct MemoryStorage {
    items: Rc<RefCell<BTreeMap<String, String>>>,
    available: Rc<Cell<bool>>,
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self {
            items: Rc::default(),
            available: Rc::new(Cell::new(true)),
        }
    }
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every access fails, as in restricted browsing contexts
    pub fn unavailable() -> Self {
        let storage = Self::default();
        storage.set_available(false);
        storage
    }

    pub fn set_available(&self, available: bool) {
        self.available.set(available);
    }

    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }

    fn check(&self) -> UiResult<()> {
        if self.available.get() {
            Ok(())
        } else {
            Err(UiError::StorageUnavailable("storage access denied".to_string()))
        }
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> UiResult<Option<String>> {
        self.check()?;
        Ok(self.items.borrow().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> UiResult<()> {
        self.check()?;
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Timer that only records requests; the caller decides when they fire
#[derive(Debug, Clone, Default)]
pub struct ManualTimer {
    pending: Rc<RefCell<Vec<(Duration, TimerTask)>>>,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> Vec<(Duration, TimerTask)> {
        self.pending.borrow().clone()
    }

    /// Remove and return the earliest scheduled task
    pub fn pop_next(&self) -> Option<(Duration, TimerTask)> {
        let mut pending = self.pending.borrow_mut();
        let index = pending
            .iter()
            .enumerate()
            .min_by_key(|(_, (delay, _))| *delay)
            .map(|(i, _)| i)?;
        Some(pending.remove(index))
    }
}

impl Timer for ManualTimer {
    fn schedule(&self, delay: Duration, task: TimerTask) {
        self.pending.borrow_mut().push((delay, task));
    }
}

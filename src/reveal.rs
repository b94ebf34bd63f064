//! Fade-in of content blocks as they scroll into view

use log::debug;

use crate::config::SiteConfig;
use crate::platform::{Dom, EventKind, ListenTarget, ListenerId, UiEvent};

/// Marks matching blocks as loading and reveals each one the first time it
/// becomes visible. Once revealed, a block is no longer watched.
#[derive(Debug)]
pub struct ScrollReveal<N> {
    selector: String,
    loading_class: String,
    reveal_class: String,
    watched: Vec<(ListenerId, N)>,
    installed: bool,
}

impl<N: Clone + PartialEq> ScrollReveal<N> {
    pub fn new(config: &SiteConfig) -> Self {
        Self {
            selector: config.reveal_selector.clone(),
            loading_class: config.loading_class.clone(),
            reveal_class: config.reveal_class.clone(),
            watched: Vec::new(),
            installed: false,
        }
    }

    /// Blocks still waiting to become visible
    pub fn pending(&self) -> usize {
        self.watched.len()
    }

    /// Start watching every matching block. Returns how many were found;
    /// later calls do nothing.
    pub fn install<D: Dom<Node = N>>(&mut self, dom: &D) -> usize {
        if self.installed {
            return 0;
        }
        self.installed = true;
        for block in dom.query_all(&self.selector) {
            dom.set_class(&block, &self.loading_class, true);
            let id = dom.add_listener(&ListenTarget::Element(block.clone()), EventKind::Intersect);
            self.watched.push((id, block));
        }
        debug!("Watching {} blocks for reveal", self.watched.len());
        self.watched.len()
    }

    /// Reveal the block behind `listener`. `false` when the listener is not
    /// one of ours.
    pub fn handle_event<D: Dom<Node = N>>(
        &mut self,
        dom: &D,
        listener: ListenerId,
        event: &UiEvent<N>,
    ) -> bool {
        let Some(index) = self.watched.iter().position(|(id, _)| *id == listener) else {
            return false;
        };
        if event.kind != EventKind::Intersect {
            return true;
        }
        let (id, block) = self.watched.swap_remove(index);
        dom.remove_listener(id);
        dom.set_class(&block, &self.reveal_class, true);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::memory::{MemoryDom, NodeRef};

    fn blocks(dom: &MemoryDom) -> (NodeRef, NodeRef, NodeRef) {
        let item = dom.append(None, "article", None);
        dom.set_class(&item, "menu-item", true);
        let review = dom.append(None, "blockquote", None);
        dom.set_class(&review, "review-item", true);
        let plain = dom.append(None, "p", None);
        (item, review, plain)
    }

    #[test]
    fn test_install_marks_matching_blocks_loading() {
        let dom = MemoryDom::new();
        let (item, review, plain) = blocks(&dom);
        let mut reveal = ScrollReveal::new(&SiteConfig::default());

        assert_eq!(reveal.install(&dom), 2);
        assert!(dom.has_class(&item, "loading"));
        assert!(dom.has_class(&review, "loading"));
        assert!(dom.classes(plain).is_empty());

        assert_eq!(reveal.install(&dom), 0);
        assert_eq!(dom.listener_count(), 2);
    }

    #[test]
    fn test_intersection_reveals_once() {
        let dom = MemoryDom::new();
        let (item, review, _) = blocks(&dom);
        let mut reveal = ScrollReveal::new(&SiteConfig::default());
        reveal.install(&dom);

        let listener = dom.dispatch_order(EventKind::Intersect, Some(item))[0];
        assert!(reveal.handle_event(&dom, listener, &UiEvent::intersect(item)));
        assert!(dom.has_class(&item, "fade-in"));
        assert!(!dom.has_class(&review, "fade-in"));
        assert_eq!(reveal.pending(), 1);
        assert!(!dom.is_registered(listener));

        assert!(!reveal.handle_event(&dom, listener, &UiEvent::intersect(item)));
    }
}

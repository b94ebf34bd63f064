//! Collapsible menu categories with state remembered across page loads

use log::{debug, warn};

use crate::config::{SectionSpec, SiteConfig};
use crate::error::{UiError, UiResult};
use crate::platform::{Dom, Storage};

/// Storage key prefix; the full key is `category-<section id>`
pub const STORAGE_PREFIX: &str = "category-";

pub fn storage_key(section_id: &str) -> String {
    format!("{STORAGE_PREFIX}{section_id}")
}

/// Collapsed/expanded status of one section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SectionState {
    #[default]
    Expanded,
    Collapsed,
}

impl SectionState {
    pub fn as_str(self) -> &'static str {
        match self {
            SectionState::Expanded => "expanded",
            SectionState::Collapsed => "collapsed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "expanded" => Some(SectionState::Expanded),
            "collapsed" => Some(SectionState::Collapsed),
            _ => None,
        }
    }

    pub fn is_collapsed(self) -> bool {
        self == SectionState::Collapsed
    }
}

/// Elements making up one section, all resolved before anything is touched
struct SectionElements<N> {
    content: N,
    icon: N,
    header: N,
    images: Option<N>,
}

/// Expand/collapse handling for the configured section catalog.
///
/// Markup convention per section `id`: `<id>-content`, `<id>-icon`,
/// `<id>-header`, and `<id>-images` for sections with an image panel.
#[derive(Debug, Clone)]
pub struct SectionPersistence {
    sections: Vec<SectionSpec>,
    collapsed_class: String,
    rotated_class: String,
    active_class: String,
}

impl SectionPersistence {
    pub fn new(config: &SiteConfig) -> Self {
        Self {
            sections: config.sections.clone(),
            collapsed_class: config.collapsed_class.clone(),
            rotated_class: config.rotated_class.clone(),
            active_class: config.active_class.clone(),
        }
    }

    pub fn sections(&self) -> &[SectionSpec] {
        &self.sections
    }

    /// Persisted state of a section. Absent, unreadable or unrecognized
    /// values all mean expanded.
    pub fn stored_state<S: Storage>(&self, storage: &S, section_id: &str) -> SectionState {
        match storage.get_item(&storage_key(section_id)) {
            Ok(Some(value)) => SectionState::parse(&value).unwrap_or_else(|| {
                warn!("Ignoring stored value '{value}' for section '{section_id}'");
                SectionState::Expanded
            }),
            Ok(None) => SectionState::Expanded,
            Err(e) => {
                warn!("{e}; treating section '{section_id}' as expanded");
                SectionState::Expanded
            }
        }
    }

    /// Re-apply persisted collapse state to every section. Returns how many
    /// sections were collapsed.
    pub fn restore<D: Dom, S: Storage>(&self, dom: &D, storage: &S) -> usize {
        let mut collapsed = 0;
        for spec in &self.sections {
            if !self.stored_state(storage, &spec.id).is_collapsed() {
                continue;
            }
            match self.locate(dom, spec) {
                Ok(elements) => {
                    self.apply(dom, &elements, SectionState::Collapsed);
                    collapsed += 1;
                }
                Err(e) => warn!("Cannot restore section '{}': {e}", spec.id),
            }
        }
        debug!("Restored {collapsed} collapsed sections");
        collapsed
    }

    /// Flip a section and persist the result. Storage failures are logged;
    /// the visual change still happens.
    pub fn toggle<D: Dom, S: Storage>(
        &self,
        dom: &D,
        storage: &S,
        section_id: &str,
    ) -> UiResult<SectionState> {
        let spec = self
            .sections
            .iter()
            .find(|s| s.id == section_id)
            .ok_or_else(|| UiError::UnknownSection(section_id.to_string()))?;
        let elements = self.locate(dom, spec)?;

        let state = if dom.has_class(&elements.content, &self.collapsed_class) {
            SectionState::Expanded
        } else {
            SectionState::Collapsed
        };
        self.apply(dom, &elements, state);

        if let Err(e) = storage.set_item(&storage_key(section_id), state.as_str()) {
            warn!("Section '{section_id}' state not saved: {e}");
        }
        debug!("Section '{section_id}' {}", state.as_str());
        Ok(state)
    }

    /// Flip a nested block and spin its icon; nothing is persisted
    pub fn toggle_subsection<D: Dom>(&self, dom: &D, content_id: &str) -> UiResult<SectionState> {
        let content = element(dom, content_id)?;
        let icon = element(dom, &format!("{content_id}-icon"))?;

        let collapsed = dom.toggle_class(&content, &self.collapsed_class);
        let angle = if collapsed { 180 } else { 0 };
        dom.set_style(&icon, "transform", &format!("rotate({angle}deg)"));
        Ok(if collapsed {
            SectionState::Collapsed
        } else {
            SectionState::Expanded
        })
    }

    fn locate<D: Dom>(&self, dom: &D, spec: &SectionSpec) -> UiResult<SectionElements<D::Node>> {
        let id = &spec.id;
        let content = element(dom, &format!("{id}-content"))?;
        let icon = element(dom, &format!("{id}-icon"))?;
        let header = element(dom, &format!("{id}-header"))?;
        let images = if spec.has_image_panel {
            let images = dom.element_by_id(&format!("{id}-images"));
            if images.is_none() {
                warn!("Section '{id}' declares an image panel but '{id}-images' is missing");
            }
            images
        } else {
            None
        };
        Ok(SectionElements {
            content,
            icon,
            header,
            images,
        })
    }

    fn apply<D: Dom>(&self, dom: &D, elements: &SectionElements<D::Node>, state: SectionState) {
        let collapsed = state.is_collapsed();
        dom.set_class(&elements.content, &self.collapsed_class, collapsed);
        dom.set_class(&elements.icon, &self.rotated_class, collapsed);
        dom.set_class(&elements.header, &self.active_class, !collapsed);
        if let Some(images) = &elements.images {
            dom.set_class(images, &self.collapsed_class, collapsed);
        }
    }
}

fn element<D: Dom>(dom: &D, id: &str) -> UiResult<D::Node> {
    dom.element_by_id(id)
        .ok_or_else(|| UiError::MissingElement(id.to_string()))
}

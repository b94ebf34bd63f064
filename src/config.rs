//! Site configuration: element ids, class names, timings and the section catalog

use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{UiError, UiResult};

/// One collapsible menu category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionSpec {
    /// Section identifier, also the storage key suffix
    pub id: String,
    /// Section carries a sibling image container collapsed in lock-step
    #[serde(default)]
    pub has_image_panel: bool,
}

impl SectionSpec {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            has_image_panel: false,
        }
    }

    pub fn with_image_panel(mut self) -> Self {
        self.has_image_panel = true;
        self
    }
}

/// Everything the behavior layer needs to know about the page markup
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Id of the hamburger button
    pub toggle_id: String,
    /// Id of the mobile navigation drawer
    pub panel_id: String,
    /// Selector for navigation links inside the drawer
    pub nav_link_selector: String,
    /// Selector for the fixed page header, measured for scroll offsets
    pub header_selector: String,
    /// Header height used when the header element cannot be measured
    pub header_height: f64,
    pub active_class: String,
    pub collapsed_class: String,
    pub rotated_class: String,
    /// Selector for images receiving the broken-image placeholder
    pub image_selector: String,
    /// Blocks faded in the first time they scroll into view
    pub reveal_selector: String,
    /// Class marking a block as waiting to be revealed
    pub loading_class: String,
    pub reveal_class: String,
    /// "Commander" button jumping to the ordering block
    pub order_button_selector: String,
    pub order_section_selector: String,
    pub retry_delay_ms: u32,
    /// Lookups attempted before the menu gives up binding
    pub max_init_attempts: u32,
    pub fallback_init_delay_ms: u32,
    pub sections: Vec<SectionSpec>,
    pub phone: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            toggle_id: "hamburger".to_string(),
            panel_id: "nav-mobile".to_string(),
            nav_link_selector: ".nav__link".to_string(),
            header_selector: ".header".to_string(),
            header_height: 80.0,
            active_class: "active".to_string(),
            collapsed_class: "collapsed".to_string(),
            rotated_class: "rotated".to_string(),
            image_selector: "img".to_string(),
            reveal_selector: ".menu-item, .review-item, .info-item".to_string(),
            loading_class: "loading".to_string(),
            reveal_class: "fade-in".to_string(),
            order_button_selector: ".commander-btn".to_string(),
            order_section_selector: ".commander-section".to_string(),
            retry_delay_ms: 100,
            max_init_attempts: 10,
            fallback_init_delay_ms: 1000,
            sections: vec![
                SectionSpec::new("entrees"),
                SectionSpec::new("crudite").with_image_panel(),
                SectionSpec::new("viande"),
                SectionSpec::new("poisson"),
                SectionSpec::new("desserts"),
                SectionSpec::new("boissons"),
            ],
            phone: "0983924771".to_string(),
        }
    }
}

impl SiteConfig {
    /// Parse a configuration from JSON; missing fields keep their defaults
    pub fn from_json(json: &str) -> UiResult<Self> {
        let config: SiteConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the controllers cannot work with
    pub fn validate(&self) -> UiResult<()> {
        if self.toggle_id.is_empty() || self.panel_id.is_empty() {
            return Err(UiError::InvalidConfig(
                "toggle and panel ids must not be empty".to_string(),
            ));
        }
        if self.max_init_attempts == 0 {
            return Err(UiError::InvalidConfig(
                "max_init_attempts must be at least 1".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for section in &self.sections {
            if section.id.is_empty() {
                return Err(UiError::InvalidConfig("empty section id".to_string()));
            }
            if !seen.insert(section.id.as_str()) {
                return Err(UiError::InvalidConfig(format!(
                    "duplicate section id '{}'",
                    section.id
                )));
            }
        }
        Ok(())
    }

    pub fn section(&self, id: &str) -> Option<&SectionSpec> {
        self.sections.iter().find(|s| s.id == id)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(u64::from(self.retry_delay_ms))
    }

    pub fn fallback_init_delay(&self) -> Duration {
        Duration::from_millis(u64::from(self.fallback_init_delay_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = SiteConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.retry_delay(), Duration::from_millis(100));
        assert!(config.section("crudite").unwrap().has_image_panel);
        assert!(!config.section("viande").unwrap().has_image_panel);
        assert_eq!(config.reveal_class, "fade-in");
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = SiteConfig::from_json(r#"{"header_height": 64.0, "toggle_id": "burger"}"#)
            .unwrap();
        assert_eq!(config.toggle_id, "burger");
        assert_eq!(config.header_height, 64.0);
        assert_eq!(config.panel_id, "nav-mobile");
        assert_eq!(config.sections.len(), 6);
    }

    #[test]
    fn test_section_image_panel_defaults_to_false() {
        let config = SiteConfig::from_json(r#"{"sections": [{"id": "tapas"}]}"#).unwrap();
        assert_eq!(config.sections, vec![SectionSpec::new("tapas")]);
    }

    #[test]
    fn test_duplicate_sections_rejected() {
        let err = SiteConfig::from_json(r#"{"sections": [{"id": "a"}, {"id": "a"}]}"#)
            .unwrap_err();
        assert!(matches!(err, UiError::InvalidConfig(_)));
    }

    #[test]
    fn test_malformed_json_is_serialization_error() {
        let err = SiteConfig::from_json("{not json").unwrap_err();
        assert!(matches!(err, UiError::SerializationError(_)));
    }
}

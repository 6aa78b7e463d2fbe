//! Root Configuration - Settings shared by every component under a root.
//!
//! A [`RootConfig`] is owned by the root component and reaches descendants
//! through the propagated context. Replacing it on the root rebuilds the
//! whole subtree.

use indexmap::IndexMap;

/// Font used when neither the properties nor the config name one.
pub const DEFAULT_FONT_FAMILY: &str = "inter";

/// Font size, in CSS pixels, used when no `fontSize` property resolves.
pub const DEFAULT_FONT_SIZE: f64 = 16.0;

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RootConfig {
    /// World units per CSS pixel.
    pub pixel_size: f64,
    pub default_font_family: String,
    pub default_font_size: f64,
    /// Family name → font file location, in registration order.
    pub font_families: IndexMap<String, String>,
}

impl Default for RootConfig {
    fn default() -> Self {
        let mut font_families = IndexMap::new();
        font_families.insert(
            DEFAULT_FONT_FAMILY.to_string(),
            format!("fonts/{DEFAULT_FONT_FAMILY}.json"),
        );
        Self {
            pixel_size: 0.01,
            default_font_family: DEFAULT_FONT_FAMILY.to_string(),
            default_font_size: DEFAULT_FONT_SIZE,
            font_families,
        }
    }
}

impl RootConfig {
    pub fn with_pixel_size(mut self, pixel_size: f64) -> Self {
        self.pixel_size = pixel_size;
        self
    }

    pub fn with_default_font(mut self, family: impl Into<String>, size: f64) -> Self {
        self.default_font_family = family.into();
        self.default_font_size = size;
        self
    }

    pub fn with_font_family(mut self, family: impl Into<String>, url: impl Into<String>) -> Self {
        self.font_families.insert(family.into(), url.into());
        self
    }

    pub fn font_url(&self, family: &str) -> Option<&str> {
        self.font_families.get(family).map(String::as_str)
    }

    /// Resolve a requested family to one the table knows.
    ///
    /// Unknown or missing families fall back to the default family; the url
    /// is `None` when even the default is not registered.
    pub fn resolve_font(&self, requested: Option<&str>) -> (String, Option<String>) {
        let family = requested
            .filter(|family| self.font_families.contains_key(*family))
            .unwrap_or(&self.default_font_family);
        (family.to_string(), self.font_url(family).map(str::to_string))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_font_is_registered() {
        let config = RootConfig::default();
        assert_eq!(config.font_url(DEFAULT_FONT_FAMILY), Some("fonts/inter.json"));
    }

    #[test]
    fn test_resolve_known_and_unknown_family() {
        let config = RootConfig::default().with_font_family("mono", "fonts/mono.json");

        assert_eq!(
            config.resolve_font(Some("mono")),
            ("mono".to_string(), Some("fonts/mono.json".to_string()))
        );
        assert_eq!(
            config.resolve_font(Some("comic")),
            ("inter".to_string(), Some("fonts/inter.json".to_string()))
        );
        assert_eq!(config.resolve_font(None).0, "inter");
    }

    #[test]
    fn test_unregistered_default_has_no_url() {
        let config = RootConfig::default().with_default_font("serif", 12.0);
        assert_eq!(config.resolve_font(None), ("serif".to_string(), None));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_roundtrip_keeps_font_order() {
        let config = RootConfig::default()
            .with_pixel_size(0.02)
            .with_font_family("mono", "fonts/mono.json")
            .with_font_family("serif", "fonts/serif.json");

        let json = serde_json::to_string(&config).expect("serialize");
        let back: RootConfig = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, config);
        assert_eq!(
            back.font_families.keys().collect::<Vec<_>>(),
            vec!["inter", "mono", "serif"]
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_missing_fields_use_defaults() {
        let config: RootConfig = serde_json::from_str(r#"{"default_font_size": 12.0}"#).expect("deserialize");
        assert_eq!(config.default_font_size, 12.0);
        assert_eq!(config.default_font_family, DEFAULT_FONT_FAMILY);
        assert_eq!(config.font_url(DEFAULT_FONT_FAMILY), Some("fonts/inter.json"));
    }
}

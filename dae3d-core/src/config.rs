//! Import options.

/// Texture reference assigned when the document carries a material library
pub const DEFAULT_PLACEHOLDER_TEXTURE: &str = "/resources/f14.png";

/// Options for [`ColladaImporter`](crate::ColladaImporter).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportConfig {
    /// Written to every mesh's `texture_filename` when any
    /// `<library_materials>` exists in the document.
    pub placeholder_texture: String,
    pub apply_material_placeholder: bool,
}

impl ImportConfig {
    pub fn with_placeholder_texture(mut self, texture: impl Into<String>) -> Self {
        self.placeholder_texture = texture.into();
        self
    }

    pub fn with_material_placeholder(mut self, enabled: bool) -> Self {
        self.apply_material_placeholder = enabled;
        self
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            placeholder_texture: DEFAULT_PLACEHOLDER_TEXTURE.to_string(),
            apply_material_placeholder: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ImportConfig::default();
        assert_eq!(config.placeholder_texture, "/resources/f14.png");
        assert!(config.apply_material_placeholder);
    }

    #[test]
    fn test_builder() {
        let config = ImportConfig::default()
            .with_placeholder_texture("tex/video.webm")
            .with_material_placeholder(false);
        assert_eq!(config.placeholder_texture, "tex/video.webm");
        assert!(!config.apply_material_placeholder);
    }
}

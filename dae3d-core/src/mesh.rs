//! Flattened mesh data produced by the importer.
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::ColladaError;

/// Role of a vertex attribute in a primitive list
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Semantic {
    Vertex,
    Normal,
    Texcoord,
    Color,
}

impl Semantic {
    pub const ALL: [Semantic; 4] = [
        Semantic::Vertex,
        Semantic::Normal,
        Semantic::Texcoord,
        Semantic::Color,
    ];

    /// Scalar components per vertex
    pub fn stride(self) -> usize {
        match self {
            Semantic::Vertex | Semantic::Normal => 3,
            Semantic::Texcoord => 2,
            Semantic::Color => 4,
        }
    }

    /// Name used by the `semantic` attribute
    pub fn as_str(self) -> &'static str {
        match self {
            Semantic::Vertex => "VERTEX",
            Semantic::Normal => "NORMAL",
            Semantic::Texcoord => "TEXCOORD",
            Semantic::Color => "COLOR",
        }
    }
}

impl fmt::Display for Semantic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Semantic {
    type Err = ColladaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Semantic::ALL
            .into_iter()
            .find(|semantic| semantic.as_str() == s)
            .ok_or_else(|| ColladaError::absent(format!("semantic {s}"), "known semantics"))
    }
}

/// Kind of external resource a texture reference points at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureKind {
    Image,
    Video,
}

impl TextureKind {
    /// Classify a file name by its extension
    pub fn from_filename(name: &str) -> Option<Self> {
        let (_, extension) = name.rsplit_once('.')?;
        match extension.to_ascii_lowercase().as_str() {
            "png" | "jpg" | "jpeg" | "gif" | "bmp" | "webp" => Some(TextureKind::Image),
            "webm" | "mp4" | "ogv" | "video" => Some(TextureKind::Video),
            _ => None,
        }
    }
}

/// A single geometry flattened to one shared index stream.
///
/// Every populated attribute array is addressed by `indices[j] * stride`.
/// Arrays are sized to the highest index written; slots no triangle touches
/// are left at `0.0`.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub vertex: BTreeMap<Semantic, Vec<f32>>,
    pub stride: BTreeMap<Semantic, usize>,
    pub indices: Vec<u32>,
    pub texture_filename: Option<String>,
}

impl Mesh {
    pub fn new() -> Self {
        Self {
            vertex: BTreeMap::new(),
            stride: Semantic::ALL
                .into_iter()
                .map(|semantic| (semantic, semantic.stride()))
                .collect(),
            indices: Vec::new(),
            texture_filename: None,
        }
    }

    pub fn attribute(&self, semantic: Semantic) -> Option<&[f32]> {
        self.vertex.get(&semantic).map(Vec::as_slice)
    }

    pub fn stride(&self, semantic: Semantic) -> usize {
        self.stride
            .get(&semantic)
            .copied()
            .unwrap_or_else(|| semantic.stride())
    }

    /// Number of position slots, holes included
    pub fn vertex_count(&self) -> usize {
        self.attribute(Semantic::Vertex)
            .map_or(0, |values| values.len() / Semantic::Vertex.stride())
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn has_texcoord(&self) -> bool {
        self.vertex.contains_key(&Semantic::Texcoord)
    }

    pub fn texture_kind(&self) -> Option<TextureKind> {
        self.texture_filename
            .as_deref()
            .and_then(TextureKind::from_filename)
    }
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strides_are_fixed() {
        let mesh = Mesh::new();
        assert_eq!(mesh.stride(Semantic::Vertex), 3);
        assert_eq!(mesh.stride(Semantic::Normal), 3);
        assert_eq!(mesh.stride(Semantic::Texcoord), 2);
        assert_eq!(mesh.stride(Semantic::Color), 4);
        assert!(mesh.vertex.is_empty());
        assert!(mesh.texture_filename.is_none());
    }

    #[test]
    fn test_semantic_names() {
        for semantic in Semantic::ALL {
            assert_eq!(semantic.as_str().parse::<Semantic>().unwrap(), semantic);
        }
        assert!("TEXTANGENT".parse::<Semantic>().is_err());
        assert!("vertex".parse::<Semantic>().is_err());
    }

    #[test]
    fn test_texture_kind() {
        assert_eq!(
            TextureKind::from_filename("/resources/f14.png"),
            Some(TextureKind::Image)
        );
        assert_eq!(
            TextureKind::from_filename("clip.WEBM"),
            Some(TextureKind::Video)
        );
        assert_eq!(TextureKind::from_filename("model.dae"), None);
        assert_eq!(TextureKind::from_filename("noextension"), None);

        let mut mesh = Mesh::new();
        assert_eq!(mesh.texture_kind(), None);
        mesh.texture_filename = Some("wood.jpg".to_string());
        assert_eq!(mesh.texture_kind(), Some(TextureKind::Image));
    }

    #[test]
    fn test_counts() {
        let mut mesh = Mesh::new();
        mesh.vertex
            .insert(Semantic::Vertex, vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
        mesh.indices = vec![0, 1, 2];
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.triangle_count(), 1);
        assert!(!mesh.has_texcoord());
    }
}

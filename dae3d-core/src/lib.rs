//! DAE3D Core Library - COLLADA scene import
//!
//! Reads a COLLADA document, follows its scene graph down to the referenced
//! geometries and flattens each one into a single GPU-ready [`Mesh`]: one
//! triangle index stream shared by every vertex attribute.
//!
//! ```ignore
//! let text = std::fs::read_to_string("model.dae")?;
//! for mesh in dae3d_core::parse_collada(&text) {
//!     println!("{} triangles", mesh.triangle_count());
//! }
//! ```

pub mod assemble;
pub mod config;
pub mod document;
pub mod error;
pub mod mesh;
pub mod polylist;
pub mod scene;
pub mod source;
pub mod transform;

// Re-export commonly used types
pub use config::ImportConfig;
pub use document::{Document, Element, ElementId};
pub use error::{ColladaError, ColladaResult};
pub use mesh::{Mesh, Semantic, TextureKind};
pub use scene::{ColladaImporter, InstanceGeometry, VisualSceneNode};
pub use transform::{Rotation, Transform};

/// Import a COLLADA document with the default options.
///
/// Never fails: unparseable markup is logged and yields no meshes, as does a
/// document without scenes.
pub fn parse_collada(text: &str) -> Vec<Mesh> {
    match ColladaImporter::default().import_str(text) {
        Ok(meshes) => meshes,
        Err(e) => {
            log::error!("failed to parse COLLADA document: {e}");
            Vec::new()
        }
    }
}

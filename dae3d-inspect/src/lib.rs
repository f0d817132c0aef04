//! Text summaries of imported COLLADA meshes
use dae3d_core::{Mesh, Semantic, TextureKind};

/// One line describing a mesh: triangles, attribute slots and texture
pub fn summarize(index: usize, mesh: &Mesh) -> String {
    let attributes: Vec<String> = Semantic::ALL
        .into_iter()
        .filter_map(|semantic| {
            mesh.attribute(semantic).map(|values| {
                format!("{semantic}:{}", values.len() / mesh.stride(semantic))
            })
        })
        .collect();

    let texture = match (&mesh.texture_filename, mesh.texture_kind()) {
        (Some(name), Some(TextureKind::Image)) => format!("image {name}"),
        (Some(name), Some(TextureKind::Video)) => format!("video {name}"),
        (Some(name), None) => format!("unsupported {name}"),
        (None, _) => "none".to_string(),
    };

    format!(
        "mesh {index}: {} triangles, attributes [{}], texture {texture}",
        mesh.triangle_count(),
        attributes.join(", ")
    )
}

//! Mesh assembly: re-indexing per-semantic streams into one shared index space.
use std::collections::BTreeMap;

use log::{debug, warn};

use crate::document::{Document, ElementId};
use crate::error::{ColladaError, ColladaResult};
use crate::mesh::{Mesh, Semantic};
use crate::polylist::{decode_primitive, DecodedPrimitive};
use crate::source::resolve_source;

/// Primitive list tags understood inside `<mesh>`
const PRIMITIVE_TAGS: [&str; 2] = ["polylist", "triangles"];

/// Negate every second component of a flattened `(s, t)` array.
pub fn flip_texcoord_v(values: &mut [f32]) {
    for t in values.iter_mut().skip(1).step_by(2) {
        *t = -*t;
    }
}

/// Copy one semantic's values into the slots addressed by the shared indices.
///
/// `own[j]` addresses `source`, `indices[j]` addresses the output. The output
/// grows to the highest slot written; untouched slots stay `0.0`.
pub fn reindex(
    semantic: Semantic,
    indices: &[u32],
    own: &[u32],
    source: &[f32],
) -> ColladaResult<Vec<f32>> {
    let stride = semantic.stride();
    let mut values = Vec::new();

    for (&unified, &raw) in indices.iter().zip(own) {
        let from = raw as usize * stride;
        let components = source
            .get(from..from + stride)
            .ok_or_else(|| ColladaError::IndexOutOfRange {
                semantic: semantic.to_string(),
                index: raw as usize,
                len: source.len() / stride,
            })?;

        let to = unified as usize * stride;
        if values.len() < to + stride {
            values.resize(to + stride, 0.0);
        }
        values[to..to + stride].copy_from_slice(components);
    }

    Ok(values)
}

/// Build a [`Mesh`] from a decoded primitive list and its resolved sources.
///
/// The shared index space is the `TEXCOORD` stream when present, otherwise
/// the `VERTEX` stream. A semantic whose source is missing or whose indices
/// overrun it is left out of the mesh.
///
/// Every shared index must address a tuple of the source that supplied the
/// stream, or one of the stream's own corners when that source is missing;
/// otherwise the whole primitive list is rejected before anything is sized
/// from it.
pub fn assemble(
    decoded: &DecodedPrimitive,
    sources: &BTreeMap<Semantic, Vec<f32>>,
) -> ColladaResult<Mesh> {
    let (shared, indices) = [Semantic::Texcoord, Semantic::Vertex]
        .into_iter()
        .find_map(|semantic| decoded.triangles.get(&semantic).map(|i| (semantic, i)))
        .ok_or_else(|| ColladaError::NoUsableData("no TEXCOORD or VERTEX indices".to_string()))?;
    if indices.is_empty() {
        return Err(ColladaError::NoUsableData("no triangles".to_string()));
    }

    let slots = sources
        .get(&shared)
        .map_or(indices.len(), |source| source.len() / shared.stride());
    if let Some(&highest) = indices.iter().max() {
        if highest as usize >= slots {
            return Err(ColladaError::IndexOutOfRange {
                semantic: shared.to_string(),
                index: highest as usize,
                len: slots,
            });
        }
    }

    let mut mesh = Mesh::new();
    mesh.indices = indices.clone();

    for (&semantic, source) in sources {
        let Some(own) = decoded.triangles.get(&semantic) else {
            continue;
        };
        match reindex(semantic, &mesh.indices, own, source) {
            Ok(mut values) => {
                if semantic == Semantic::Texcoord {
                    flip_texcoord_v(&mut values);
                }
                mesh.vertex.insert(semantic, values);
            }
            Err(e) => warn!("dropping {semantic}: {e}"),
        }
    }

    if mesh.vertex.is_empty() {
        return Err(ColladaError::NoUsableData(
            "no attribute data resolved".to_string(),
        ));
    }
    if !mesh.vertex.contains_key(&Semantic::Vertex) {
        warn!("mesh has no VERTEX data");
    }

    Ok(mesh)
}

/// Decode, resolve and assemble the primitive lists of one `<mesh>` element.
///
/// Every primitive list is decoded; the last one with triangles wins.
pub fn assemble_mesh(doc: &Document, mesh: ElementId) -> ColladaResult<Mesh> {
    let mut chosen: Option<DecodedPrimitive> = None;
    let mut usable = 0;

    for &child in doc.element(mesh).children() {
        let tag = doc.element(child).tag();
        if !PRIMITIVE_TAGS.contains(&tag) {
            continue;
        }
        match decode_primitive(doc, child) {
            Ok(decoded) if !decoded.is_empty() => {
                usable += 1;
                chosen = Some(decoded);
            }
            Ok(_) => debug!("<{tag}> produced no triangles"),
            Err(e) => warn!("skipping <{tag}>: {e}"),
        }
    }

    let decoded = chosen
        .ok_or_else(|| ColladaError::NoUsableData("mesh has no usable primitive list".to_string()))?;
    if usable > 1 {
        warn!("mesh has {usable} primitive lists, only the last is imported");
    }

    let mut sources = BTreeMap::new();
    for (&semantic, source_id) in &decoded.sources {
        match resolve_source(doc, mesh, semantic, source_id) {
            Ok(values) => {
                sources.insert(semantic, values);
            }
            Err(e) => warn!("{semantic} source {source_id:?} unavailable: {e}"),
        }
    }

    assemble(&decoded, &sources)
}

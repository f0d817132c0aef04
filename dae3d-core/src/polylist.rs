//! Primitive list decoding and fan triangulation.
//!
//! A `<polylist>` interleaves every declared input in one flat `<p>` stream:
//! each polygon corner is a tuple of `num_inputs` indices, and an input's
//! `offset` picks its slot inside the tuple. Decoding splits that stream into
//! one triangle-index sequence per semantic.

use std::collections::BTreeMap;

use log::{debug, warn};

use crate::document::{strip_ref, Document, ElementId};
use crate::error::{ColladaError, ColladaResult};
use crate::mesh::Semantic;
use crate::source::parse_indices;

/// Per-semantic triangle indices plus the source each semantic reads from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedPrimitive {
    pub triangles: BTreeMap<Semantic, Vec<u32>>,
    /// Source ids with the `#` already stripped
    pub sources: BTreeMap<Semantic, String>,
}

impl DecodedPrimitive {
    pub fn is_empty(&self) -> bool {
        self.triangles.values().all(Vec::is_empty)
    }
}

struct Input {
    semantic: String,
    offset: Option<usize>,
    source: Option<String>,
}

/// Fan-triangulate one semantic out of the flat index stream.
///
/// Polygon `i` spans `vcount[i] * num_inputs` entries of `p`. Triangle `k`
/// uses corners `0`, `k + 1` and `k + 2`, each shifted by `offset`. Polygons
/// with fewer than three corners emit nothing but still advance the cursor.
///
/// The corners declared by `vcount` must all fit in `p`; nothing is
/// allocated before that holds.
pub fn triangulate(
    vcount: &[u32],
    p: &[u32],
    num_inputs: usize,
    offset: usize,
) -> ColladaResult<Vec<u32>> {
    let corners = vcount
        .iter()
        .fold(0usize, |total, &count| total.saturating_add(count as usize));
    let needed = corners.saturating_mul(num_inputs);
    if needed > p.len() {
        return Err(ColladaError::IndexOutOfRange {
            semantic: "p".to_string(),
            index: needed - 1,
            len: p.len(),
        });
    }

    let triangle_count: usize = vcount
        .iter()
        .map(|&count| (count as usize).saturating_sub(2))
        .sum();
    let mut triangles = Vec::with_capacity(triangle_count * 3);

    let mut cursor = 0;
    for &count in vcount {
        let count = count as usize;
        for k in 0..count.saturating_sub(2) {
            for corner in [0, k + 1, k + 2] {
                let position = cursor + corner * num_inputs + offset;
                let index = p
                    .get(position)
                    .copied()
                    .ok_or_else(|| ColladaError::IndexOutOfRange {
                        semantic: "p".to_string(),
                        index: position,
                        len: p.len(),
                    })?;
                triangles.push(index);
            }
        }
        cursor += count * num_inputs;
    }

    Ok(triangles)
}

/// Decode a `<polylist>` or `<triangles>` element.
///
/// Missing inputs, vertex counts or indices are logged and yield an empty
/// result; the caller decides whether anything usable is left.
pub fn decode_primitive(doc: &Document, primitive: ElementId) -> ColladaResult<DecodedPrimitive> {
    let element = doc.element(primitive);
    let mut inputs = Vec::new();
    let mut vcount = Vec::new();
    let mut p = Vec::new();

    for &child in element.children() {
        let child = doc.element(child);
        match child.tag() {
            "input" => inputs.push(Input {
                semantic: child.attribute("semantic").unwrap_or_default().to_string(),
                offset: child.attribute("offset").and_then(|o| o.trim().parse().ok()),
                source: child.attribute("source").map(|s| strip_ref(s).to_string()),
            }),
            "vcount" => vcount = parse_indices("vcount", child.text())?,
            "p" => p = parse_indices("p", child.text())?,
            _ => {}
        }
    }

    let num_inputs = inputs.len();
    if element.tag() == "triangles" && num_inputs > 0 {
        let available = p.len() / (3 * num_inputs);
        let count = element
            .attribute("count")
            .and_then(|c| c.trim().parse::<usize>().ok())
            .map_or(available, |count| count.min(available));
        vcount = vec![3; count];
    }

    if num_inputs == 0 {
        warn!("<{}> declares no input", element.tag());
    }
    if vcount.is_empty() {
        warn!("<{}> has no vertex counts", element.tag());
    }
    if p.is_empty() {
        warn!("<{}> has no indices", element.tag());
    }
    if num_inputs == 0 || vcount.is_empty() || p.is_empty() {
        return Ok(DecodedPrimitive::default());
    }

    let mut decoded = DecodedPrimitive::default();
    for input in &inputs {
        let Ok(semantic) = input.semantic.parse::<Semantic>() else {
            debug!("ignoring input semantic {:?}", input.semantic);
            continue;
        };
        let (Some(offset), Some(source)) = (input.offset, input.source.as_ref()) else {
            warn!("{semantic} input is missing its offset or source");
            continue;
        };
        match triangulate(&vcount, &p, num_inputs, offset) {
            Ok(triangles) => {
                decoded.triangles.insert(semantic, triangles);
                decoded.sources.insert(semantic, source.clone());
            }
            Err(e) => warn!("dropping {semantic}: {e}"),
        }
    }

    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_triangle() {
        let triangles = triangulate(&[3], &[0, 1, 2], 1, 0).unwrap();
        assert_eq!(triangles, vec![0, 1, 2]);
    }

    #[test]
    fn test_quad_fan() {
        let triangles = triangulate(&[4], &[10, 11, 12, 13], 1, 0).unwrap();
        assert_eq!(triangles, vec![10, 11, 12, 10, 12, 13]);
    }

    #[test]
    fn test_triangle_count_matches_vcount() {
        let vcount = [4u32, 3, 5];
        for num_inputs in 1..=3usize {
            let corners: usize = vcount.iter().map(|&v| v as usize).sum();
            let p: Vec<u32> = (0..(corners * num_inputs) as u32).collect();
            for offset in 0..num_inputs {
                let triangles = triangulate(&vcount, &p, num_inputs, offset).unwrap();
                assert_eq!(triangles.len(), 3 * ((4 - 2) + (3 - 2) + (5 - 2)));
            }
        }
    }

    #[test]
    fn test_interleaved_offsets() {
        // Two inputs, one quad: (v, n) tuples.
        let p = [0, 100, 1, 101, 2, 102, 3, 103];
        assert_eq!(
            triangulate(&[4], &p, 2, 0).unwrap(),
            vec![0, 1, 2, 0, 2, 3]
        );
        assert_eq!(
            triangulate(&[4], &p, 2, 1).unwrap(),
            vec![100, 101, 102, 100, 102, 103]
        );
    }

    #[test]
    fn test_degenerate_polygon_advances_cursor() {
        let triangles = triangulate(&[2, 3], &[9, 9, 0, 1, 2], 1, 0).unwrap();
        assert_eq!(triangles, vec![0, 1, 2]);
    }

    #[test]
    fn test_short_index_stream() {
        let err = triangulate(&[4], &[0, 1, 2], 1, 0).unwrap_err();
        assert!(matches!(err, ColladaError::IndexOutOfRange { index: 3, len: 3, .. }));
    }

    #[test]
    fn test_huge_vcount_is_rejected_before_allocating() {
        let vcount = [4_000_000_000u32; 4];
        let err = triangulate(&vcount, &[0, 1, 2], 1, 0).unwrap_err();
        assert!(matches!(err, ColladaError::IndexOutOfRange { len: 3, .. }));

        let err = triangulate(&[3, 3], &[0, 1, 2, 3, 4, 5], 2, 0).unwrap_err();
        assert!(matches!(err, ColladaError::IndexOutOfRange { index: 11, len: 6, .. }));
    }

    const POLYLIST: &str = r##"<polylist count="2" material="m">
  <input semantic="VERTEX" source="#verts" offset="0"/>
  <input semantic="NORMAL" source="#normals" offset="1"/>
  <input semantic="TEXCOORD" source="#uv" offset="2" set="0"/>
  <vcount>3 4</vcount>
  <p>0 0 0 1 0 1 2 0 2 2 1 3 3 1 4 4 1 5 0 1 6</p>
</polylist>"##;

    #[test]
    fn test_decode_polylist() {
        let doc = Document::parse(POLYLIST).unwrap();
        let decoded = decode_primitive(&doc, doc.root().unwrap()).unwrap();

        assert_eq!(decoded.triangles.len(), 3);
        assert_eq!(decoded.triangles[&Semantic::Vertex], vec![0, 1, 2, 2, 3, 4, 2, 4, 0]);
        assert_eq!(decoded.triangles[&Semantic::Normal], vec![0, 0, 0, 1, 1, 1, 1, 1, 1]);
        assert_eq!(decoded.triangles[&Semantic::Texcoord], vec![0, 1, 2, 3, 4, 5, 3, 5, 6]);
        assert_eq!(decoded.sources[&Semantic::Vertex], "verts");
        assert_eq!(decoded.sources[&Semantic::Texcoord], "uv");
    }

    #[test]
    fn test_decode_triangles_element() {
        let doc = Document::parse(
            r##"<triangles count="2">
  <input semantic="VERTEX" source="#verts" offset="0"/>
  <p>0 1 2 2 1 3</p>
</triangles>"##,
        )
        .unwrap();
        let decoded = decode_primitive(&doc, doc.root().unwrap()).unwrap();
        assert_eq!(decoded.triangles[&Semantic::Vertex], vec![0, 1, 2, 2, 1, 3]);
    }

    #[test]
    fn test_triangle_count_is_clamped_to_indices() {
        let doc = Document::parse(
            r##"<triangles count="4000000000">
  <input semantic="VERTEX" source="#verts" offset="0"/>
  <p>0 1 2</p>
</triangles>"##,
        )
        .unwrap();
        let decoded = decode_primitive(&doc, doc.root().unwrap()).unwrap();
        assert_eq!(decoded.triangles[&Semantic::Vertex], vec![0, 1, 2]);

        // A smaller declared count is honoured.
        let doc = Document::parse(
            r##"<triangles count="1">
  <input semantic="VERTEX" source="#verts" offset="0"/>
  <p>0 1 2 2 1 3</p>
</triangles>"##,
        )
        .unwrap();
        let decoded = decode_primitive(&doc, doc.root().unwrap()).unwrap();
        assert_eq!(decoded.triangles[&Semantic::Vertex], vec![0, 1, 2]);
    }

    #[test]
    fn test_huge_vcount_drops_every_semantic() {
        let doc = Document::parse(
            r##"<polylist>
  <input semantic="VERTEX" source="#verts" offset="0"/>
  <vcount>4000000000 4000000000 4000000000 4000000000</vcount>
  <p>0 1 2</p>
</polylist>"##,
        )
        .unwrap();
        let decoded = decode_primitive(&doc, doc.root().unwrap()).unwrap();
        assert!(decoded.is_empty());
    }

    #[test]
    fn test_unknown_semantic_counts_toward_width() {
        let doc = Document::parse(
            r##"<polylist>
  <input semantic="VERTEX" source="#verts" offset="0"/>
  <input semantic="TEXTANGENT" source="#tangents" offset="1"/>
  <vcount>3</vcount>
  <p>0 9 1 9 2 9</p>
</polylist>"##,
        )
        .unwrap();
        let decoded = decode_primitive(&doc, doc.root().unwrap()).unwrap();
        assert_eq!(decoded.triangles.len(), 1);
        assert_eq!(decoded.triangles[&Semantic::Vertex], vec![0, 1, 2]);
    }

    #[test]
    fn test_missing_parts_yield_empty_result() {
        let no_inputs = Document::parse("<polylist><vcount>3</vcount><p>0 1 2</p></polylist>").unwrap();
        assert!(decode_primitive(&no_inputs, no_inputs.root().unwrap())
            .unwrap()
            .is_empty());

        let no_p = Document::parse(
            r##"<polylist><input semantic="VERTEX" source="#v" offset="0"/><vcount>3</vcount></polylist>"##,
        )
        .unwrap();
        let decoded = decode_primitive(&no_p, no_p.root().unwrap()).unwrap();
        assert!(decoded.triangles.is_empty());
    }

    #[test]
    fn test_malformed_index_is_an_error() {
        let doc = Document::parse(
            r##"<polylist><input semantic="VERTEX" source="#v" offset="0"/><vcount>3</vcount><p>0 one 2</p></polylist>"##,
        )
        .unwrap();
        let err = decode_primitive(&doc, doc.root().unwrap()).unwrap_err();
        assert!(matches!(err, ColladaError::MalformedNumeric { .. }));
    }
}

//! Numeric list parsing and `<source>` resolution.
use nom::{
    character::complete::u32 as index, combinator::all_consuming, number::complete::float,
    IResult,
};

use crate::document::{strip_ref, Document, ElementId};
use crate::error::{ColladaError, ColladaResult};
use crate::mesh::Semantic;

fn scalar(input: &str) -> IResult<&str, f32> {
    float(input)
}

fn unsigned(input: &str) -> IResult<&str, u32> {
    index(input)
}

fn parse_list<T>(
    element: &str,
    text: &str,
    mut item: impl FnMut(&str) -> IResult<&str, T>,
) -> ColladaResult<Vec<T>> {
    text.split_ascii_whitespace()
        .map(|token| {
            all_consuming(&mut item)(token)
                .map(|(_, value)| value)
                .map_err(|_| ColladaError::MalformedNumeric {
                    element: element.to_string(),
                    token: token.to_string(),
                })
        })
        .collect()
}

/// Parse a whitespace separated list of floats (`float_array`, `matrix`, ...).
pub fn parse_floats(element: &str, text: &str) -> ColladaResult<Vec<f32>> {
    parse_list(element, text, scalar)
}

/// Parse a whitespace separated list of unsigned integers (`vcount`, `p`).
pub fn parse_indices(element: &str, text: &str) -> ColladaResult<Vec<u32>> {
    parse_list(element, text, unsigned)
}

/// Find a direct child of `mesh` with this tag and id, falling back to a
/// document-wide id lookup.
fn find_in_mesh(doc: &Document, mesh: ElementId, tag: &str, id: &str) -> Option<ElementId> {
    doc.children_where(mesh, tag, &[("id", id)])
        .first()
        .copied()
        .or_else(|| {
            doc.resolve_ref(id)
                .filter(|&found| doc.element(found).tag() == tag)
        })
}

/// Follow a `<vertices>` wrapper to the source holding positions.
pub fn position_source_id(
    doc: &Document,
    mesh: ElementId,
    vertices_id: &str,
) -> ColladaResult<String> {
    let vertices_id = strip_ref(vertices_id);
    let vertices = find_in_mesh(doc, mesh, "vertices", vertices_id)
        .ok_or_else(|| ColladaError::absent(format!("<vertices id=\"{vertices_id}\">"), "mesh"))?;

    let input = doc
        .children_where(vertices, "input", &[("semantic", "POSITION")])
        .first()
        .copied()
        .ok_or_else(|| ColladaError::absent("POSITION input", format!("vertices {vertices_id}")))?;

    doc.element(input)
        .attribute("source")
        .map(|source| strip_ref(source).to_string())
        .ok_or_else(|| ColladaError::absent("source attribute", format!("vertices {vertices_id}")))
}

/// Resolve the float data backing one semantic.
///
/// `VERTEX` inputs point at a `<vertices>` element rather than a `<source>`,
/// so they are indirected through [`position_source_id`] first.
pub fn resolve_source(
    doc: &Document,
    mesh: ElementId,
    semantic: Semantic,
    source_id: &str,
) -> ColladaResult<Vec<f32>> {
    let source_id = match semantic {
        Semantic::Vertex => position_source_id(doc, mesh, source_id)?,
        _ => strip_ref(source_id).to_string(),
    };

    let source = find_in_mesh(doc, mesh, "source", &source_id)
        .ok_or_else(|| ColladaError::absent(format!("<source id=\"{source_id}\">"), "mesh"))?;
    let array = doc
        .first_child(source, "float_array")
        .ok_or_else(|| ColladaError::absent("float_array", format!("source {source_id}")))?;

    parse_floats("float_array", doc.element(array).text())
}

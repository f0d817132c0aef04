//! Scene graph walk: `scene` to visual scene nodes to geometry meshes.
//!
//! The walk never fails. Any broken link (missing visual scene, geometry or
//! mesh element, undecodable primitive list) skips that one geometry and is
//! logged; the remaining geometries are still imported in document order.

use log::{debug, info, warn};
use nalgebra::{Matrix4, Vector3};

use crate::assemble::assemble_mesh;
use crate::config::ImportConfig;
use crate::document::{strip_ref, Document, ElementId};
use crate::error::{ColladaError, ColladaResult};
use crate::mesh::Mesh;
use crate::source::parse_floats;
use crate::transform::{Rotation, Transform};

/// A geometry placed by a node, with the materials bound to it.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceGeometry {
    /// Geometry id with the `#` stripped
    pub url: String,
    pub material_targets: Vec<String>,
}

/// A `<node>` of a visual scene.
///
/// The placement is parsed but never baked into mesh data: meshes stay in
/// object space and consumers apply [`VisualSceneNode::local_transform`]
/// themselves if they need it.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualSceneNode {
    pub id: Option<String>,
    pub name: Option<String>,
    pub matrix: Option<Matrix4<f32>>,
    pub translate: Option<Vector3<f32>>,
    pub rotations: Vec<Rotation>,
    pub scale: Option<Vector3<f32>>,
    pub instance_geometry: Vec<InstanceGeometry>,
}

impl VisualSceneNode {
    /// `<matrix>` when present, otherwise translate * rotations * scale.
    pub fn local_transform(&self) -> Matrix4<f32> {
        self.matrix.unwrap_or_else(|| {
            Transform::compose(
                self.translate.as_ref(),
                &self.rotations,
                self.scale.as_ref(),
            )
        })
    }
}

/// Top-level `type="NODE"` nodes of a visual scene, in document order.
///
/// Nested nodes and nodes of any other (or no) type are not placed.
pub fn visual_scene_nodes(doc: &Document, visual_scene: ElementId) -> Vec<VisualSceneNode> {
    doc.children_by_tag(visual_scene, "node")
        .into_iter()
        .filter(|&node| {
            let element = doc.element(node);
            let placed = element.attribute("type") == Some("NODE");
            if !placed {
                debug!(
                    "skipping node {:?} of type {:?}",
                    element.attribute("id"),
                    element.attribute("type")
                );
            }
            placed
        })
        .map(|node| parse_node(doc, node))
        .collect()
}

fn values(doc: &Document, element: ElementId) -> Option<Vec<f32>> {
    let element = doc.element(element);
    match parse_floats(element.tag(), element.text()) {
        Ok(values) => Some(values),
        Err(e) => {
            warn!("ignoring node transform: {e}");
            None
        }
    }
}

fn vector3(values: &[f32]) -> Option<Vector3<f32>> {
    match values {
        &[x, y, z] => Some(Vector3::new(x, y, z)),
        _ => None,
    }
}

fn parse_node(doc: &Document, node: ElementId) -> VisualSceneNode {
    let element = doc.element(node);
    let mut parsed = VisualSceneNode {
        id: element.attribute("id").map(String::from),
        name: element.attribute("name").map(String::from),
        matrix: None,
        translate: None,
        rotations: Vec::new(),
        scale: None,
        instance_geometry: Vec::new(),
    };

    for &child in element.children() {
        let tag = doc.element(child).tag();
        match tag {
            "matrix" => {
                parsed.matrix = values(doc, child).and_then(|v| Transform::from_row_major(&v));
            }
            "translate" => parsed.translate = values(doc, child).and_then(|v| vector3(&v)),
            "scale" => parsed.scale = values(doc, child).and_then(|v| vector3(&v)),
            "rotate" => {
                let sid = doc.element(child).attribute("sid").map(String::from);
                if let Some(rotation) =
                    values(doc, child).and_then(|v| Rotation::from_values(sid, &v))
                {
                    parsed.rotations.push(rotation);
                }
            }
            "instance_geometry" => match doc.element(child).attribute("url") {
                Some(url) => parsed.instance_geometry.push(InstanceGeometry {
                    url: strip_ref(url).to_string(),
                    material_targets: material_targets(doc, child),
                }),
                None => warn!("instance_geometry without url in node {:?}", parsed.id),
            },
            _ => {}
        }
    }

    parsed
}

fn material_targets(doc: &Document, instance: ElementId) -> Vec<String> {
    doc.children_by_tag(instance, "bind_material")
        .into_iter()
        .flat_map(|bind| doc.children_by_tag(bind, "technique_common"))
        .flat_map(|technique| doc.children_by_tag(technique, "instance_material"))
        .filter_map(|material| {
            doc.element(material)
                .attribute("target")
                .map(|target| strip_ref(target).to_string())
        })
        .collect()
}

/// Walks a document's scenes and collects one [`Mesh`] per placed geometry.
#[derive(Debug, Clone, Default)]
pub struct ColladaImporter {
    config: ImportConfig,
}

impl ColladaImporter {
    pub fn new(config: ImportConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    /// Parse the markup and import it. Only malformed markup is an error.
    pub fn import_str(&self, text: &str) -> ColladaResult<Vec<Mesh>> {
        let doc = Document::parse(text)?;
        debug!("indexed {} elements", doc.len());
        Ok(self.import(&doc))
    }

    /// Import every geometry reachable from the document's `<scene>`s.
    pub fn import(&self, doc: &Document) -> Vec<Mesh> {
        if doc.is_empty() {
            info!("empty document, nothing to import");
            return Vec::new();
        }
        let has_materials = !doc.elements_by_tag("library_materials").is_empty();
        let mut meshes = Vec::new();

        for &scene in doc.elements_by_tag("scene") {
            for instance in doc.children_by_tag(scene, "instance_visual_scene") {
                let Some(url) = doc.element(instance).attribute("url") else {
                    warn!("instance_visual_scene without url");
                    continue;
                };
                let visual_scenes = self.visual_scenes(doc, strip_ref(url));
                if visual_scenes.is_empty() {
                    warn!("visual scene {url:?} not found");
                    continue;
                }

                for visual_scene in visual_scenes {
                    for node in visual_scene_nodes(doc, visual_scene) {
                        for placed in &node.instance_geometry {
                            match self.geometry_mesh(doc, &placed.url) {
                                Ok(mut mesh) => {
                                    if has_materials && self.config.apply_material_placeholder {
                                        mesh.texture_filename =
                                            Some(self.config.placeholder_texture.clone());
                                    }
                                    debug!(
                                        "node {:?}: geometry {:?}, {} triangles",
                                        node.id,
                                        placed.url,
                                        mesh.triangle_count()
                                    );
                                    meshes.push(mesh);
                                }
                                Err(e) => warn!("skipping geometry {:?}: {e}", placed.url),
                            }
                        }
                    }
                }
            }
        }

        info!("imported {} meshes", meshes.len());
        meshes
    }

    fn visual_scenes(&self, doc: &Document, id: &str) -> Vec<ElementId> {
        doc.elements_by_tag("library_visual_scenes")
            .iter()
            .flat_map(|&library| doc.children_where(library, "visual_scene", &[("id", id)]))
            .collect()
    }

    fn geometry_mesh(&self, doc: &Document, id: &str) -> ColladaResult<Mesh> {
        let geometry = doc
            .elements_by_tag("library_geometries")
            .iter()
            .find_map(|&library| {
                doc.children_where(library, "geometry", &[("id", id)])
                    .first()
                    .copied()
            })
            .ok_or_else(|| ColladaError::absent(format!("geometry {id:?}"), "library_geometries"))?;
        let mesh = doc
            .first_child(geometry, "mesh")
            .ok_or_else(|| ColladaError::absent("mesh", format!("geometry {id:?}")))?;

        assemble_mesh(doc, mesh)
    }
}

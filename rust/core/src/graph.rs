// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory source B-rep.
//!
//! [`BrepGraph`] is built bottom-up (vertices, edges, loops, faces, shells,
//! regions) and then read through [`BrepTraversal`] and [`GeometryQuery`].
//! It backs importers that already hold a decoded B-rep and is the fixture
//! type for translator tests.

use brep_bridge_geometry::Extents;
use nalgebra::Point3;
use rustc_hash::FxHashMap;

use crate::curve::SourceCurve;
use crate::error::{Error, Result};
use crate::handle::EntityHandle;
use crate::model::{BodyKind, Descent, LoopEdge, LoopType, ShellType};
use crate::surface::SourceSurface;
use crate::traversal::{BrepTraversal, GeometryQuery};

#[derive(Debug, Clone)]
enum Node {
    Body,
    Region {
        shells: Vec<EntityHandle>,
    },
    Shell {
        kind: ShellType,
        faces: Vec<EntityHandle>,
    },
    Face {
        surface: Option<SourceSurface>,
        orient_to_surface: bool,
        /// `None` for intrinsically bounded faces.
        loops: Option<Vec<EntityHandle>>,
    },
    Loop {
        kind: LoopType,
        /// `None` for a loop that is a single point.
        edges: Option<Vec<LoopEdge>>,
    },
    Edge {
        vertices: [EntityHandle; 2],
        curve: Option<SourceCurve>,
        orient_to_curve: bool,
    },
    Vertex {
        point: Point3<f64>,
    },
}

impl Node {
    fn kind_name(&self) -> &'static str {
        match self {
            Node::Body => "body",
            Node::Region { .. } => "region",
            Node::Shell { .. } => "shell",
            Node::Face { .. } => "face",
            Node::Loop { .. } => "loop",
            Node::Edge { .. } => "edge",
            Node::Vertex { .. } => "vertex",
        }
    }
}

/// A source body held entirely in memory.
#[derive(Debug, Clone)]
pub struct BrepGraph {
    kind: BodyKind,
    body: EntityHandle,
    regions: Vec<EntityHandle>,
    nodes: FxHashMap<EntityHandle, Node>,
    next_handle: u64,
    extents: Option<Extents>,
}

impl BrepGraph {
    pub fn new(kind: BodyKind) -> Self {
        let body = EntityHandle(1);
        let mut nodes = FxHashMap::default();
        nodes.insert(body, Node::Body);
        Self {
            kind,
            body,
            regions: Vec::new(),
            nodes,
            next_handle: 2,
            extents: None,
        }
    }

    pub fn kind(&self) -> BodyKind {
        self.kind
    }

    /// Number of entities, the body included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether nothing but the body has been added.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    fn insert(&mut self, node: Node) -> EntityHandle {
        let handle = EntityHandle(self.next_handle);
        self.next_handle += 1;
        self.nodes.insert(handle, node);
        handle
    }

    fn node(&self, handle: EntityHandle) -> Result<&Node> {
        self.nodes.get(&handle).ok_or(Error::UnknownEntity(handle))
    }

    fn expect_kind(&self, handle: EntityHandle, expected: &'static str) -> Result<()> {
        let node = self.node(handle)?;
        if node.kind_name() == expected {
            Ok(())
        } else {
            Err(Error::WrongKind { handle, expected })
        }
    }

    pub fn add_vertex(&mut self, point: Point3<f64>) -> EntityHandle {
        self.insert(Node::Vertex { point })
    }

    pub fn add_edge(
        &mut self,
        v1: EntityHandle,
        v2: EntityHandle,
        curve: Option<SourceCurve>,
        orient_to_curve: bool,
    ) -> Result<EntityHandle> {
        self.expect_kind(v1, "vertex")?;
        self.expect_kind(v2, "vertex")?;
        Ok(self.insert(Node::Edge {
            vertices: [v1, v2],
            curve,
            orient_to_curve,
        }))
    }

    pub fn add_loop(&mut self, kind: LoopType, edges: Vec<LoopEdge>) -> Result<EntityHandle> {
        for use_ in &edges {
            self.expect_kind(use_.edge, "edge")?;
        }
        Ok(self.insert(Node::Loop {
            kind,
            edges: Some(edges),
        }))
    }

    /// A loop that collapses to a single point, such as a cone apex.
    pub fn add_singular_loop(&mut self, kind: LoopType) -> EntityHandle {
        self.insert(Node::Loop { kind, edges: None })
    }

    pub fn add_face(
        &mut self,
        surface: Option<SourceSurface>,
        orient_to_surface: bool,
        loops: Vec<EntityHandle>,
    ) -> Result<EntityHandle> {
        for lp in &loops {
            self.expect_kind(*lp, "loop")?;
        }
        Ok(self.insert(Node::Face {
            surface,
            orient_to_surface,
            loops: Some(loops),
        }))
    }

    /// A face bounded by its own surface (full sphere, torus).
    pub fn add_bounded_face(
        &mut self,
        surface: Option<SourceSurface>,
        orient_to_surface: bool,
    ) -> EntityHandle {
        self.insert(Node::Face {
            surface,
            orient_to_surface,
            loops: None,
        })
    }

    pub fn add_shell(&mut self, kind: ShellType, faces: Vec<EntityHandle>) -> Result<EntityHandle> {
        for face in &faces {
            self.expect_kind(*face, "face")?;
        }
        Ok(self.insert(Node::Shell { kind, faces }))
    }

    pub fn add_region(&mut self, shells: Vec<EntityHandle>) -> Result<EntityHandle> {
        for shell in &shells {
            self.expect_kind(*shell, "shell")?;
        }
        let region = self.insert(Node::Region { shells });
        self.regions.push(region);
        Ok(region)
    }

    /// Overrides the computed bounds.
    pub fn set_extents(&mut self, extents: Extents) {
        self.extents = Some(extents);
    }

    fn computed_extents(&self) -> Option<Extents> {
        let mut points = Vec::new();
        for node in self.nodes.values() {
            match node {
                Node::Vertex { point } => points.push(*point),
                Node::Edge {
                    curve: Some(curve),
                    ..
                } => points.extend(curve.hull_points()),
                Node::Face {
                    surface: Some(surface),
                    ..
                } => {
                    if let Some((lo, hi)) = surface.hull_extent() {
                        points.extend([lo, hi]);
                    }
                }
                _ => {}
            }
        }
        Extents::from_points(&points)
    }
}

impl BrepTraversal for BrepGraph {
    fn body(&self) -> EntityHandle {
        self.body
    }

    fn body_kind(&self) -> BodyKind {
        self.kind
    }

    fn extents(&self) -> Result<Extents> {
        self.extents
            .or_else(|| self.computed_extents())
            .ok_or(Error::NoExtents)
    }

    fn regions(&self, body: EntityHandle) -> Result<Vec<EntityHandle>> {
        self.expect_kind(body, "body")?;
        Ok(self.regions.clone())
    }

    fn shells(&self, region: EntityHandle) -> Result<Vec<EntityHandle>> {
        match self.node(region)? {
            Node::Region { shells } => Ok(shells.clone()),
            _ => Err(Error::WrongKind {
                handle: region,
                expected: "region",
            }),
        }
    }

    fn shell_type(&self, shell: EntityHandle) -> Result<ShellType> {
        match self.node(shell)? {
            Node::Shell { kind, .. } => Ok(*kind),
            _ => Err(Error::WrongKind {
                handle: shell,
                expected: "shell",
            }),
        }
    }

    fn faces(&self, shell: EntityHandle) -> Result<Vec<EntityHandle>> {
        match self.node(shell)? {
            Node::Shell { faces, .. } => Ok(faces.clone()),
            _ => Err(Error::WrongKind {
                handle: shell,
                expected: "shell",
            }),
        }
    }

    fn face_orient_to_surface(&self, face: EntityHandle) -> Result<bool> {
        match self.node(face)? {
            Node::Face {
                orient_to_surface, ..
            } => Ok(*orient_to_surface),
            _ => Err(Error::WrongKind {
                handle: face,
                expected: "face",
            }),
        }
    }

    fn face_loops(&self, face: EntityHandle) -> Result<Descent<Vec<EntityHandle>>> {
        match self.node(face)? {
            Node::Face {
                loops: Some(loops), ..
            } if !loops.is_empty() => Ok(Descent::Entered(loops.clone())),
            Node::Face { .. } => Ok(Descent::Degenerate),
            _ => Err(Error::WrongKind {
                handle: face,
                expected: "face",
            }),
        }
    }

    fn loop_type(&self, lp: EntityHandle) -> Result<LoopType> {
        match self.node(lp)? {
            Node::Loop { kind, .. } => Ok(*kind),
            _ => Err(Error::WrongKind {
                handle: lp,
                expected: "loop",
            }),
        }
    }

    fn loop_edges(&self, lp: EntityHandle) -> Result<Descent<Vec<LoopEdge>>> {
        match self.node(lp)? {
            Node::Loop {
                edges: Some(edges), ..
            } if !edges.is_empty() => Ok(Descent::Entered(edges.clone())),
            Node::Loop { .. } => Ok(Descent::Degenerate),
            _ => Err(Error::WrongKind {
                handle: lp,
                expected: "loop",
            }),
        }
    }

    fn edge_vertices(&self, edge: EntityHandle) -> Result<[EntityHandle; 2]> {
        match self.node(edge)? {
            Node::Edge { vertices, .. } => Ok(*vertices),
            _ => Err(Error::WrongKind {
                handle: edge,
                expected: "edge",
            }),
        }
    }

    fn edge_orient_to_curve(&self, edge: EntityHandle) -> Result<bool> {
        match self.node(edge)? {
            Node::Edge {
                orient_to_curve, ..
            } => Ok(*orient_to_curve),
            _ => Err(Error::WrongKind {
                handle: edge,
                expected: "edge",
            }),
        }
    }

    fn vertex_point(&self, vertex: EntityHandle) -> Result<Point3<f64>> {
        match self.node(vertex)? {
            Node::Vertex { point } => Ok(*point),
            _ => Err(Error::WrongKind {
                handle: vertex,
                expected: "vertex",
            }),
        }
    }
}

impl GeometryQuery for BrepGraph {
    fn edge_curve(&self, edge: EntityHandle) -> Result<Option<SourceCurve>> {
        match self.node(edge)? {
            Node::Edge { curve, .. } => Ok(curve.clone()),
            _ => Err(Error::WrongKind {
                handle: edge,
                expected: "edge",
            }),
        }
    }

    fn face_surface(&self, face: EntityHandle) -> Result<Option<SourceSurface>> {
        match self.node(face)? {
            Node::Face { surface, .. } => Ok(surface.clone()),
            _ => Err(Error::WrongKind {
                handle: face,
                expected: "face",
            }),
        }
    }
}

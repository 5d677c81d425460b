// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Topology builder: walks the source B-rep and fills the flat table.
//!
//! Every source region is merged into one solid region keyed by the body.
//! Shared edges and vertices are resolved through the [`TopologyCache`], so
//! each gets one entry however many loops reach it, while a relation is
//! still recorded on every sighting. Geometry is created on first sighting
//! through the [`GeometryFactory`].

use brep_bridge_core::{
    BrepTraversal, Descent, EntityHandle, GeometryQuery, LoopType, ShellType, SourceSurface,
};
use brep_bridge_kernel::{EntityTag, TargetKernel};
use brep_bridge_topology::{OrientationMaps, Sense, TopologyCache, TopologyClass, TopologyTable};

use crate::error::{Error, Result};
use crate::factory::{Construction, EdgeEnds, GeometryFactory};

/// Everything the assembler and attacher need from a traversal.
#[derive(Debug, Clone)]
pub struct BuiltTopology {
    pub table: TopologyTable<EntityTag>,
    pub orientations: OrientationMaps,
    pub is_sheet: bool,
    /// The lone face of a hole-free single-face sheet.
    pub shortcut_face: Option<usize>,
    /// Number of synthesized void regions.
    pub void_regions: usize,
}

/// Walks one source body.
pub struct TopologyBuilder<'s, 'f, 'k, S, K> {
    source: &'s S,
    factory: &'f mut GeometryFactory<'k, K>,
    table: TopologyTable<EntityTag>,
    cache: TopologyCache<EntityHandle>,
    orientations: OrientationMaps,
    saw_hole: bool,
}

impl<'s, 'f, 'k, S, K> TopologyBuilder<'s, 'f, 'k, S, K>
where
    S: BrepTraversal + GeometryQuery,
    K: TargetKernel,
{
    pub fn new(source: &'s S, factory: &'f mut GeometryFactory<'k, K>) -> Self {
        Self {
            source,
            factory,
            table: TopologyTable::new(),
            cache: TopologyCache::new(),
            orientations: OrientationMaps::new(),
            saw_hole: false,
        }
    }

    pub fn build(mut self, allow_shortcut: bool) -> Result<BuiltTopology> {
        let body = self.source.body();
        let is_sheet = self.source.body_kind().is_sheet();

        let (body_index, _) = self.register(TopologyClass::Body, body)?;
        let (solid, _) = self.register(TopologyClass::Region, body)?;
        self.table.add_relation(body_index, solid, Sense::Negative)?;

        let mut region_faces: Vec<Vec<usize>> = Vec::new();
        for region in self.source.regions(body)? {
            let exterior = self.walk_region(solid, region, is_sheet)?;
            if !exterior.is_empty() {
                region_faces.push(exterior);
            }
        }

        let shortcut_face = match region_faces.as_slice() {
            [only] if is_sheet && allow_shortcut && !self.saw_hole && only.len() == 1 => {
                Some(only[0])
            }
            _ => None,
        };

        let mut void_regions = 0;
        if !is_sheet {
            for faces in &region_faces {
                self.add_void_region(body_index, faces)?;
                void_regions += 1;
            }
        }

        self.table
            .validate()
            .map_err(|e| Error::MalformedTopology(e.to_string()))?;
        tracing::debug!(
            entries = self.table.len(),
            relations = self.table.relation_count(),
            void_regions,
            "topology table built"
        );
        Ok(BuiltTopology {
            table: self.table,
            orientations: self.orientations,
            is_sheet,
            shortcut_face,
            void_regions,
        })
    }

    /// Entry for a purely topological entity.
    fn register(&mut self, class: TopologyClass, handle: EntityHandle) -> Result<(usize, bool)> {
        self.cache
            .get_or_add(&mut self.table, class, handle, || Ok::<_, Error>(None))
    }

    /// Walks the shells of one source region and returns the faces of its
    /// first exterior shell.
    fn walk_region(&mut self, solid: usize, region: EntityHandle, is_sheet: bool) -> Result<Vec<usize>> {
        let mut exterior_faces = Vec::new();
        let mut exterior_seen = false;
        for shell in self.source.shells(region)? {
            let exterior = self.source.shell_type(shell)? == ShellType::Exterior;
            let collect = exterior && !exterior_seen;
            exterior_seen |= exterior;

            let (shell_index, _) = self.register(TopologyClass::Shell, shell)?;
            self.table.add_relation(solid, shell_index, Sense::None)?;

            let sense = if exterior { Sense::Positive } else { Sense::Negative };
            let mut shell_faces = Vec::new();
            for face in self.source.faces(shell)? {
                let face_index = self.walk_face(face)?;
                self.table.add_relation(shell_index, face_index, sense)?;
                shell_faces.push(face_index);
            }

            // An open sheet shell closes on the back of its own faces.
            if is_sheet && exterior {
                for &face_index in &shell_faces {
                    self.table.add_relation(shell_index, face_index, Sense::Negative)?;
                }
            }
            if collect {
                exterior_faces = shell_faces;
            }
        }
        Ok(exterior_faces)
    }

    fn walk_face(&mut self, face: EntityHandle) -> Result<usize> {
        if let Some(index) = self.cache.lookup(TopologyClass::Face, face) {
            return Ok(index);
        }
        let surface = self
            .source
            .face_surface(face)?
            .ok_or_else(|| Error::MissingGeometry(format!("face {face} has no surface")))?;
        let mut oriented = self.source.face_orient_to_surface(face)?;

        let factory = &mut *self.factory;
        let (index, _) = self
            .cache
            .get_or_add(&mut self.table, TopologyClass::Face, face, || {
                let (built, bit) = factory.surface(&surface, oriented)?;
                oriented = bit;
                built
                    .tag()
                    .map(Some)
                    .ok_or_else(|| Error::MissingGeometry(format!("face {face} surface")))
            })?;
        self.orientations.set_face(index, oriented);

        match self.source.face_loops(face)? {
            Descent::Degenerate => {
                tracing::trace!(%face, "intrinsically bounded face");
            }
            Descent::Entered(loops) => {
                for lp in loops {
                    self.walk_loop(index, lp, &surface)?;
                }
            }
        }
        Ok(index)
    }

    fn walk_loop(&mut self, face_index: usize, lp: EntityHandle, surface: &SourceSurface) -> Result<()> {
        let kind = self.source.loop_type(lp)?;
        let (loop_index, is_new) = self.register(TopologyClass::Loop, lp)?;
        let sense = match kind {
            LoopType::Exterior => Sense::Positive,
            LoopType::Interior => Sense::Negative,
            LoopType::Winding | LoopType::Unclassified => Sense::None,
        };
        self.table.add_relation(face_index, loop_index, sense)?;
        self.saw_hole |= kind == LoopType::Interior;
        if !is_new {
            return Ok(());
        }

        match self.source.loop_edges(lp)? {
            Descent::Degenerate => match self.factory.singular_point(surface)? {
                Construction::Created(point) => {
                    let vertex = self.table.push(TopologyClass::Vertex, Some(point));
                    self.table.add_relation(loop_index, vertex, Sense::None)?;
                }
                Construction::Degraded(reason) => {
                    tracing::warn!(%lp, %reason, "singular loop left without a vertex");
                }
            },
            Descent::Entered(uses) => {
                for edge_use in uses {
                    let edge_index = self.walk_edge(edge_use.edge)?;
                    let sense = Sense::from_orientation(edge_use.orient_to_loop);
                    self.table.add_relation(loop_index, edge_index, sense)?;
                }
            }
        }
        Ok(())
    }

    fn walk_edge(&mut self, edge: EntityHandle) -> Result<usize> {
        if let Some(index) = self.cache.lookup(TopologyClass::Edge, edge) {
            return Ok(index);
        }
        let curve = self
            .source
            .edge_curve(edge)?
            .ok_or_else(|| Error::MissingGeometry(format!("edge {edge} has no curve")))?;
        let [v1, v2] = self.source.edge_vertices(edge)?;
        let ends = EdgeEnds {
            start: self.source.vertex_point(v1)?,
            end: self.source.vertex_point(v2)?,
            orient_to_curve: self.source.edge_orient_to_curve(edge)?,
        };

        let factory = &mut *self.factory;
        let (index, _) = self
            .cache
            .get_or_add(&mut self.table, TopologyClass::Edge, edge, || {
                factory.curve(&curve, ends).map(|c| c.tag())
            })?;
        self.orientations.set_edge(index, ends.orient_to_curve);

        let first = self.walk_vertex(v1)?;
        self.table.add_relation(index, first, Sense::None)?;
        if v2 != v1 {
            let second = self.walk_vertex(v2)?;
            self.table.add_relation(index, second, Sense::None)?;
        }
        Ok(index)
    }

    fn walk_vertex(&mut self, vertex: EntityHandle) -> Result<usize> {
        if let Some(index) = self.cache.lookup(TopologyClass::Vertex, vertex) {
            return Ok(index);
        }
        let point = self.source.vertex_point(vertex)?;
        let factory = &mut *self.factory;
        let (index, _) = self
            .cache
            .get_or_add(&mut self.table, TopologyClass::Vertex, vertex, || {
                factory.point(&point).map(|c| c.tag())
            })?;
        Ok(index)
    }

    /// Void region bounded by the back of a solid region's exterior faces.
    fn add_void_region(&mut self, body: usize, faces: &[usize]) -> Result<()> {
        let region = self.table.push(TopologyClass::Region, None);
        let shell = self.table.push(TopologyClass::Shell, None);
        self.table.add_relation(body, region, Sense::Positive)?;
        self.table.add_relation(region, shell, Sense::None)?;
        for &face in faces {
            self.table.add_relation(shell, face, Sense::Negative)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brep_bridge_core::{BodyKind, BrepGraph, LoopEdge, SourceCurve};
    use brep_bridge_geometry::{normalize, Extents, Frame, Normalization, NormalizerSettings};
    use brep_bridge_kernel::MemoryKernel;
    use nalgebra::{Point3, Vector3};

    use crate::config::TranslatorConfig;

    fn identity() -> Normalization {
        let e = Extents::new(Point3::origin(), Point3::new(10.0, 10.0, 10.0));
        normalize(&e, &NormalizerSettings::default()).unwrap()
    }

    /// Unit square face in the XY plane.
    fn square(kind: BodyKind, hole: bool) -> BrepGraph {
        let mut g = BrepGraph::new(kind);
        let pts = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(4.0, 0.0, 0.0),
            Point3::new(4.0, 4.0, 0.0),
            Point3::new(0.0, 4.0, 0.0),
        ];
        let vs: Vec<_> = pts.iter().map(|p| g.add_vertex(*p)).collect();
        let mut uses = Vec::new();
        for i in 0..4 {
            let (a, b) = (vs[i], vs[(i + 1) % 4]);
            let line = SourceCurve::LineSegment {
                start: pts[i],
                end: pts[(i + 1) % 4],
            };
            let e = g.add_edge(a, b, Some(line), true).unwrap();
            uses.push(LoopEdge::new(e, true));
        }
        let mut loops = vec![g.add_loop(LoopType::Exterior, uses).unwrap()];
        if hole {
            loops.push(g.add_singular_loop(LoopType::Interior));
        }
        let plane = Frame::from_axes(Point3::origin(), Vector3::z(), Vector3::x()).unwrap();
        let face = g
            .add_face(Some(SourceSurface::Plane { frame: plane }), true, loops)
            .unwrap();
        let shell = g.add_shell(ShellType::Exterior, vec![face]).unwrap();
        g.add_region(vec![shell]).unwrap();
        g
    }

    fn build(graph: &BrepGraph, kernel: &mut MemoryKernel) -> Result<BuiltTopology> {
        let config = TranslatorConfig::default();
        let mut factory = GeometryFactory::new(kernel, identity(), &config);
        TopologyBuilder::new(graph, &mut factory).build(true)
    }

    #[test]
    fn shared_vertices_get_one_entry() {
        let graph = square(BodyKind::Surface, false);
        let mut kernel = MemoryKernel::new();
        let built = build(&graph, &mut kernel).unwrap();
        let t = &built.table;
        assert_eq!(t.count(TopologyClass::Edge), 4);
        assert_eq!(t.count(TopologyClass::Vertex), 4);
        // Every vertex is reached from two edges.
        let edge_vertex = t
            .relations()
            .filter(|r| t.class_at(r.child) == Some(TopologyClass::Vertex))
            .count();
        assert_eq!(edge_vertex, 8);
        assert_eq!(t.geometry().len(), t.classes().len());
    }

    #[test]
    fn single_sheet_face_is_a_shortcut_candidate() {
        let graph = square(BodyKind::Surface, false);
        let mut kernel = MemoryKernel::new();
        let built = build(&graph, &mut kernel).unwrap();
        assert!(built.is_sheet);
        let face = built.shortcut_face.unwrap();
        assert_eq!(built.table.class_at(face), Some(TopologyClass::Face));
        assert_eq!(built.void_regions, 0);
        // The sheet shell holds its face from both sides.
        let senses: Vec<Sense> = built
            .table
            .relations()
            .filter(|r| r.child == face && built.table.class_at(r.parent) == Some(TopologyClass::Shell))
            .map(|r| r.sense)
            .collect();
        assert_eq!(senses, vec![Sense::Positive, Sense::Negative]);
    }

    #[test]
    fn holes_rule_out_the_shortcut() {
        let graph = square(BodyKind::Surface, true);
        let mut kernel = MemoryKernel::new();
        let built = build(&graph, &mut kernel).unwrap();
        assert_eq!(built.shortcut_face, None);
        // The singular interior loop got a vertex at the plane origin.
        assert_eq!(built.table.count(TopologyClass::Vertex), 5);
    }

    #[test]
    fn solids_get_a_void_region() {
        let graph = square(BodyKind::Solid, false);
        let mut kernel = MemoryKernel::new();
        let built = build(&graph, &mut kernel).unwrap();
        assert_eq!(built.void_regions, 1);
        assert_eq!(built.shortcut_face, None);
        let body_children: Vec<Sense> = built.table.relations_of(0).map(|r| r.sense).collect();
        assert_eq!(body_children, vec![Sense::Negative, Sense::Positive]);
    }

    #[test]
    fn face_without_surface_fails_and_creates_nothing_further() {
        let mut g = BrepGraph::new(BodyKind::Solid);
        let face = g.add_bounded_face(None, true);
        let shell = g.add_shell(ShellType::Exterior, vec![face]).unwrap();
        g.add_region(vec![shell]).unwrap();
        let mut kernel = MemoryKernel::new();
        assert!(matches!(build(&g, &mut kernel), Err(Error::MissingGeometry(_))));
        assert_eq!(kernel.entity_count(), 0);
    }
}

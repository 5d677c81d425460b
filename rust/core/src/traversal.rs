// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Read-only interfaces a source modeler exposes to the translator.

use brep_bridge_geometry::Extents;
use nalgebra::Point3;

use crate::curve::SourceCurve;
use crate::error::Result;
use crate::handle::EntityHandle;
use crate::model::{BodyKind, Descent, LoopEdge, LoopType, ShellType};
use crate::surface::SourceSurface;

/// Walks the topology of one source body.
///
/// Children are returned in source order. Shared edges and vertices are
/// reported with the same [`EntityHandle`] every time they are reached.
pub trait BrepTraversal {
    /// The body itself.
    fn body(&self) -> EntityHandle;

    fn body_kind(&self) -> BodyKind;

    /// Axis-aligned bounds of the body in source units.
    fn extents(&self) -> Result<Extents>;

    fn regions(&self, body: EntityHandle) -> Result<Vec<EntityHandle>>;

    fn shells(&self, region: EntityHandle) -> Result<Vec<EntityHandle>>;

    fn shell_type(&self, shell: EntityHandle) -> Result<ShellType>;

    fn faces(&self, shell: EntityHandle) -> Result<Vec<EntityHandle>>;

    /// Whether the face normal agrees with its surface normal.
    fn face_orient_to_surface(&self, face: EntityHandle) -> Result<bool>;

    /// Loops of a face; [`Descent::Degenerate`] for intrinsically bounded
    /// faces such as a full sphere.
    fn face_loops(&self, face: EntityHandle) -> Result<Descent<Vec<EntityHandle>>>;

    fn loop_type(&self, lp: EntityHandle) -> Result<LoopType>;

    /// Edge uses of a loop; [`Descent::Degenerate`] when the loop collapses
    /// to a single point.
    fn loop_edges(&self, lp: EntityHandle) -> Result<Descent<Vec<LoopEdge>>>;

    fn edge_vertices(&self, edge: EntityHandle) -> Result<[EntityHandle; 2]>;

    /// Whether the edge's vertex1→vertex2 direction follows its curve.
    fn edge_orient_to_curve(&self, edge: EntityHandle) -> Result<bool>;

    fn vertex_point(&self, vertex: EntityHandle) -> Result<Point3<f64>>;
}

/// Hands out the geometry carried by source edges and faces.
pub trait GeometryQuery {
    /// Curve of an edge, `None` for edges without geometry.
    fn edge_curve(&self, edge: EntityHandle) -> Result<Option<SourceCurve>>;

    /// Surface of a face, `None` for faces without geometry.
    fn face_surface(&self, face: EntityHandle) -> Result<Option<SourceSurface>>;
}

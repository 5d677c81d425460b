// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The adapter interface a translator drives.
//!
//! Construction is two-phase: [`TargetKernel::create_topology`] builds the
//! whole topology graph from flat arrays, then geometry created beforehand
//! is attached in bulk, points first, then curves, then surfaces.

use brep_bridge_topology::{Sense, TopologyClass};
use nalgebra::{Point3, Vector3};

use crate::error::Result;
use crate::fault::{CheckFault, TopolFault};
use crate::sf::*;
use crate::tag::{BodyType, EntityTag, GeometryClass};

/// Parameter box of a surface: `((u_min, u_max), (v_min, v_max))`.
pub type UvBox = ((f64, f64), (f64, f64));

/// Flat topology description for a bulk create.
#[derive(Debug, Clone, Copy)]
pub struct TopologyRequest<'a> {
    pub classes: &'a [TopologyClass],
    pub parents: &'a [usize],
    pub children: &'a [usize],
    pub senses: &'a [Sense],
    /// Expected body type.
    pub body_type: BodyType,
}

/// Outcome of a bulk create.
#[derive(Debug, Clone)]
pub struct CreatedTopology {
    pub body: EntityTag,
    /// One tag per request entry.
    pub topols: Vec<EntityTag>,
    pub faults: Vec<TopolFault>,
}

pub trait TargetKernel {
    // Geometry creation

    fn create_point(&mut self, sf: &PointSf) -> Result<EntityTag>;
    fn create_line(&mut self, sf: &LineSf) -> Result<EntityTag>;
    fn create_circle(&mut self, sf: &CircleSf) -> Result<EntityTag>;
    fn create_ellipse(&mut self, sf: &EllipseSf) -> Result<EntityTag>;
    fn create_bcurve(&mut self, sf: &BCurveSf) -> Result<EntityTag>;
    fn create_piecewise_bcurve(&mut self, sf: &PiecewiseSf) -> Result<EntityTag>;
    fn create_plane(&mut self, sf: &PlaneSf) -> Result<EntityTag>;
    fn create_cylinder(&mut self, sf: &CylinderSf) -> Result<EntityTag>;
    fn create_cone(&mut self, sf: &ConeSf) -> Result<EntityTag>;
    fn create_sphere(&mut self, sf: &SphereSf) -> Result<EntityTag>;
    fn create_torus(&mut self, sf: &TorusSf) -> Result<EntityTag>;
    fn create_bsurface(&mut self, sf: &BSurfaceSf) -> Result<EntityTag>;

    // Geometry queries

    fn geometry_class(&self, geom: EntityTag) -> Result<GeometryClass>;

    /// Parameters where the curve loses tangent continuity.
    fn find_curve_discontinuities(&self, curve: EntityTag) -> Result<Vec<f64>>;

    /// Parameters in U and V where the surface loses tangent continuity.
    fn find_surface_discontinuities(&self, surface: EntityTag) -> Result<(Vec<f64>, Vec<f64>)>;

    fn curve_interval(&self, curve: EntityTag) -> Result<(f64, f64)>;
    fn surface_uvbox(&self, surface: EntityTag) -> Result<UvBox>;

    /// Creates a smooth curve approximating `curve` over `interval`.
    fn fit_curve(&mut self, curve: EntityTag, interval: (f64, f64)) -> Result<EntityTag>;

    /// Creates a smooth surface approximating `surface` over `uvbox`.
    fn fit_surface(&mut self, surface: EntityTag, uvbox: UvBox) -> Result<EntityTag>;

    fn surface_normal(&self, surface: EntityTag, u: f64, v: f64) -> Result<Vector3<f64>>;

    /// Parameters of the point on `surface` closest to `point`.
    fn surface_parameter(&self, surface: EntityTag, point: &Point3<f64>) -> Result<(f64, f64)>;

    fn point_position(&self, point: EntityTag) -> Result<Point3<f64>>;

    // Topology

    fn create_topology(&mut self, request: TopologyRequest<'_>) -> Result<CreatedTopology>;

    /// Makes a one-face sheet body bounded by a parameter box.
    fn make_sheet_from_surface(&mut self, surface: EntityTag, uvbox: UvBox) -> Result<EntityTag>;

    fn body_type(&self, body: EntityTag) -> Result<BodyType>;
    fn body_edges(&self, body: EntityTag) -> Result<Vec<EntityTag>>;
    fn body_faces(&self, body: EntityTag) -> Result<Vec<EntityTag>>;

    // Attach; each call is all-or-nothing

    fn attach_points(&mut self, vertices: &[EntityTag], points: &[EntityTag]) -> Result<()>;
    fn attach_curves(
        &mut self,
        edges: &[EntityTag],
        curves: &[EntityTag],
        senses: &[bool],
    ) -> Result<()>;
    fn attach_surfaces(
        &mut self,
        faces: &[EntityTag],
        surfaces: &[EntityTag],
        senses: &[bool],
    ) -> Result<()>;
    fn set_vertex_precision(&mut self, vertices: &[EntityTag], precision: f64) -> Result<()>;

    // Post-processing

    /// Merges coincident geometry within a body; returns how many entities
    /// were merged away.
    fn share_geometry(&mut self, body: EntityTag) -> Result<usize>;
    fn repair_edges(&mut self, edges: &[EntityTag], max_tolerance: f64) -> Result<()>;
    fn repair_face(&mut self, face: EntityTag) -> Result<()>;
    fn reset_edge_precision(&mut self, edges: &[EntityTag]) -> Result<()>;
    fn check_body(&self, body: EntityTag) -> Result<Vec<CheckFault>>;

    // Lifetime

    fn is_live(&self, tag: EntityTag) -> bool;

    /// Deletes entities; deleting a body takes its topology and attached
    /// geometry with it.
    fn delete(&mut self, tags: &[EntityTag]) -> Result<()>;
}

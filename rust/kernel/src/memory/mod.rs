// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory reference kernel.
//!
//! [`MemoryKernel`] keeps every geometry, topology and body entity in one
//! generational arena and enforces the rules a real modeling kernel would:
//! a bounded size box, orthogonal placement frames, periodic closed
//! B-curves, G1-continuous attached curves, single ownership of attached
//! geometry. Failures can be injected per [`Stage`] so callers can exercise
//! their error paths, and [`MemoryKernel::entity_count`] exposes the number
//! of live entities for leak checks.

mod geom;
mod topol;

use std::f64::consts::FRAC_PI_2;

use brep_bridge_geometry::fit::{fit_curve, fit_surface, DEFAULT_SAMPLES_PER_SPAN};
use brep_bridge_geometry::{Extents, Frame, G1_ANGLE_TOLERANCE};
use brep_bridge_topology::{Sense, TopologyClass};
use nalgebra::{Point3, Vector3};
use rustc_hash::{FxHashMap, FxHashSet};
use slotmap::SlotMap;

pub use geom::Geom;

use crate::error::{Error, Result};
use crate::fault::{CheckFault, CheckState, TopolFault};
use crate::kernel::{CreatedTopology, TargetKernel, TopologyRequest, UvBox};
use crate::sf::*;
use crate::tag::{BodyType, EntityTag, GeometryClass};

/// Half-width of the modeling cube centred on the origin.
pub const SIZE_BOX_HALF: f64 = 500.0;

/// Distance below which two points coincide.
pub const LINEAR_RESOLUTION: f64 = 1e-8;

/// Kernel calls that can be counted and made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    CreatePoint,
    CreateCurve,
    CreateSurface,
    FitCurve,
    FitSurface,
    CreateTopology,
    MakeSheet,
    AttachPoints,
    AttachCurves,
    AttachSurfaces,
    ShareGeometry,
    RepairEdges,
    RepairFace,
    CheckBody,
    Delete,
}

#[derive(Debug, Clone)]
pub(crate) struct GeomData {
    pub geom: Geom,
    pub owner: Option<EntityTag>,
}

#[derive(Debug, Clone)]
pub(crate) struct TopolData {
    pub class: TopologyClass,
    pub body: EntityTag,
    pub children: Vec<(EntityTag, Sense)>,
    /// Attached geometry and its sense.
    pub geometry: Option<(EntityTag, bool)>,
    pub precision: Option<f64>,
}

#[derive(Debug, Clone)]
pub(crate) struct BodyData {
    pub body_type: BodyType,
    pub children: Vec<(EntityTag, Sense)>,
    pub members: Vec<EntityTag>,
    /// Extent of a body made directly from a bounded surface.
    pub sheet_extent: Option<Extents>,
}

#[derive(Debug, Clone)]
pub(crate) enum Entity {
    Geometry(GeomData),
    Topol(TopolData),
    Body(BodyData),
}

/// A modeling kernel held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryKernel {
    entities: SlotMap<EntityTag, Entity>,
    failures: FxHashSet<Stage>,
    calls: FxHashMap<Stage, usize>,
    forced_body_type: Option<BodyType>,
    injected_topol_faults: Vec<TopolFault>,
    injected_check_faults: Vec<CheckState>,
}

impl MemoryKernel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entities of every kind.
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Makes every subsequent call at `stage` fail.
    pub fn fail_at(&mut self, stage: Stage) {
        self.failures.insert(stage);
    }

    pub fn clear_failures(&mut self) {
        self.failures.clear();
    }

    /// How many times `stage` has been entered.
    pub fn call_count(&self, stage: Stage) -> usize {
        self.calls.get(&stage).copied().unwrap_or(0)
    }

    /// Makes bulk topology creation report this body type.
    pub fn force_body_type(&mut self, body_type: BodyType) {
        self.forced_body_type = Some(body_type);
    }

    /// Prepends a fault to every bulk topology creation report.
    pub fn inject_topology_fault(&mut self, fault: TopolFault) {
        self.injected_topol_faults.push(fault);
    }

    /// Adds a fault to every body check.
    pub fn inject_check_fault(&mut self, state: CheckState) {
        self.injected_check_faults.push(state);
    }

    pub fn geometry(&self, tag: EntityTag) -> Result<&Geom> {
        Ok(&self.geom_data(tag)?.geom)
    }

    /// Geometry attached to a face, edge or vertex, with its sense.
    pub fn attached_geometry(&self, topol: EntityTag) -> Result<Option<(EntityTag, bool)>> {
        Ok(self.topol_data(topol)?.geometry)
    }

    pub fn precision(&self, topol: EntityTag) -> Result<Option<f64>> {
        Ok(self.topol_data(topol)?.precision)
    }

    /// Class of a topological entity.
    pub fn topology_class(&self, topol: EntityTag) -> Result<TopologyClass> {
        match self.entities.get(topol) {
            Some(Entity::Topol(t)) => Ok(t.class),
            Some(Entity::Body(_)) => Ok(TopologyClass::Body),
            Some(Entity::Geometry(_)) => Err(Error::WrongClass {
                tag: topol,
                expected: "topology",
            }),
            None => Err(Error::UnknownTag(topol)),
        }
    }

    /// Children of a body or topological entity with their senses.
    pub fn children(&self, topol: EntityTag) -> Result<Vec<(EntityTag, Sense)>> {
        match self.entities.get(topol) {
            Some(Entity::Topol(t)) => Ok(t.children.clone()),
            Some(Entity::Body(b)) => Ok(b.children.clone()),
            Some(Entity::Geometry(_)) => Err(Error::WrongClass {
                tag: topol,
                expected: "topology",
            }),
            None => Err(Error::UnknownTag(topol)),
        }
    }

    /// Axis-aligned box of a body's attached vertices and closed faces.
    pub fn body_extents(&self, body: EntityTag) -> Result<Option<Extents>> {
        let data = self.body_data(body)?;
        let mut extents = data.sheet_extent;
        let mut grow = |e: Extents| {
            extents = Some(match extents {
                Some(current) => current.union(&e),
                None => e,
            });
        };
        for &member in &data.members {
            let Some(Entity::Topol(t)) = self.entities.get(member) else {
                continue;
            };
            let Some((geom, _)) = t.geometry else {
                continue;
            };
            match (t.class, &self.geom_data(geom)?.geom) {
                (TopologyClass::Vertex, Geom::Point(p)) => grow(Extents::new(*p, *p)),
                (TopologyClass::Face, g) => {
                    if let Some(e) = g.closed_extent() {
                        grow(e);
                    }
                }
                _ => {}
            }
        }
        Ok(extents)
    }

    fn enter(&mut self, stage: Stage) -> Result<()> {
        *self.calls.entry(stage).or_insert(0) += 1;
        if self.failures.contains(&stage) {
            tracing::debug!(?stage, "injected kernel failure");
            return Err(Error::Injected(stage));
        }
        Ok(())
    }

    pub(crate) fn geom_data(&self, tag: EntityTag) -> Result<&GeomData> {
        match self.entities.get(tag) {
            Some(Entity::Geometry(g)) => Ok(g),
            Some(_) => Err(Error::WrongClass {
                tag,
                expected: "geometry",
            }),
            None => Err(Error::UnknownTag(tag)),
        }
    }

    pub(crate) fn topol_data(&self, tag: EntityTag) -> Result<&TopolData> {
        match self.entities.get(tag) {
            Some(Entity::Topol(t)) => Ok(t),
            Some(_) => Err(Error::WrongClass {
                tag,
                expected: "topology",
            }),
            None => Err(Error::UnknownTag(tag)),
        }
    }

    pub(crate) fn body_data(&self, tag: EntityTag) -> Result<&BodyData> {
        match self.entities.get(tag) {
            Some(Entity::Body(b)) => Ok(b),
            Some(_) => Err(Error::WrongClass {
                tag,
                expected: "body",
            }),
            None => Err(Error::UnknownTag(tag)),
        }
    }

    fn insert_geometry(&mut self, geom: Geom) -> Result<EntityTag> {
        let outside = geom
            .anchor_points()
            .iter()
            .any(|p| p.coords.iter().any(|c| !c.is_finite() || c.abs() > SIZE_BOX_HALF));
        if outside {
            return Err(Error::OutsideSizeBox);
        }
        Ok(self
            .entities
            .insert(Entity::Geometry(GeomData { geom, owner: None })))
    }

    fn bcurve_of(&self, tag: EntityTag) -> Result<(&brep_bridge_geometry::NurbsCurve, bool)> {
        match &self.geom_data(tag)?.geom {
            Geom::BCurve { curve, periodic } => Ok((curve, *periodic)),
            _ => Err(Error::WrongClass {
                tag,
                expected: "b-curve",
            }),
        }
    }
}

fn check_frame(basis: &Frame) -> Result<()> {
    if basis.is_orthogonal() {
        Ok(())
    } else {
        Err(Error::VectorsNotOrthogonal)
    }
}

fn check_positive(value: f64, what: &str) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidParameters(format!("{what} must be positive, got {value}")))
    }
}

impl TargetKernel for MemoryKernel {
    fn create_point(&mut self, sf: &PointSf) -> Result<EntityTag> {
        self.enter(Stage::CreatePoint)?;
        self.insert_geometry(Geom::Point(sf.position))
    }

    fn create_line(&mut self, sf: &LineSf) -> Result<EntityTag> {
        self.enter(Stage::CreateCurve)?;
        let n = sf.direction.norm();
        if n.is_nan() || n <= LINEAR_RESOLUTION {
            return Err(Error::InvalidParameters("zero line direction".into()));
        }
        self.insert_geometry(Geom::Line(LineSf {
            position: sf.position,
            direction: sf.direction / n,
        }))
    }

    fn create_circle(&mut self, sf: &CircleSf) -> Result<EntityTag> {
        self.enter(Stage::CreateCurve)?;
        check_frame(&sf.basis)?;
        check_positive(sf.radius, "radius")?;
        self.insert_geometry(Geom::Circle(*sf))
    }

    fn create_ellipse(&mut self, sf: &EllipseSf) -> Result<EntityTag> {
        self.enter(Stage::CreateCurve)?;
        check_frame(&sf.basis)?;
        check_positive(sf.minor_radius, "minor radius")?;
        if sf.major_radius < sf.minor_radius {
            return Err(Error::InvalidParameters(
                "major radius smaller than minor radius".into(),
            ));
        }
        self.insert_geometry(Geom::Ellipse(*sf))
    }

    fn create_bcurve(&mut self, sf: &BCurveSf) -> Result<EntityTag> {
        self.enter(Stage::CreateCurve)?;
        let curve = sf.to_nurbs()?;
        if sf.is_periodic && !curve.is_closed(LINEAR_RESOLUTION) {
            return Err(Error::InvalidParameters("periodic curve is not closed".into()));
        }
        self.insert_geometry(Geom::BCurve {
            curve,
            periodic: sf.is_periodic,
        })
    }

    fn create_piecewise_bcurve(&mut self, sf: &PiecewiseSf) -> Result<EntityTag> {
        self.enter(Stage::CreateCurve)?;
        let curve = sf.to_nurbs(LINEAR_RESOLUTION)?;
        let periodic = curve.is_closed(LINEAR_RESOLUTION);
        self.insert_geometry(Geom::BCurve { curve, periodic })
    }

    fn create_plane(&mut self, sf: &PlaneSf) -> Result<EntityTag> {
        self.enter(Stage::CreateSurface)?;
        check_frame(&sf.basis)?;
        self.insert_geometry(Geom::Plane(*sf))
    }

    fn create_cylinder(&mut self, sf: &CylinderSf) -> Result<EntityTag> {
        self.enter(Stage::CreateSurface)?;
        check_frame(&sf.basis)?;
        check_positive(sf.radius, "radius")?;
        self.insert_geometry(Geom::Cylinder(*sf))
    }

    fn create_cone(&mut self, sf: &ConeSf) -> Result<EntityTag> {
        self.enter(Stage::CreateSurface)?;
        check_frame(&sf.basis)?;
        if sf.radius.is_nan() || sf.radius < 0.0 {
            return Err(Error::InvalidParameters("negative cone radius".into()));
        }
        if sf.semi_angle.is_nan() || sf.semi_angle <= 0.0 || sf.semi_angle >= FRAC_PI_2 {
            return Err(Error::InvalidParameters(format!(
                "cone semi-angle {} out of range",
                sf.semi_angle
            )));
        }
        self.insert_geometry(Geom::Cone(*sf))
    }

    fn create_sphere(&mut self, sf: &SphereSf) -> Result<EntityTag> {
        self.enter(Stage::CreateSurface)?;
        check_frame(&sf.basis)?;
        check_positive(sf.radius, "radius")?;
        self.insert_geometry(Geom::Sphere(*sf))
    }

    fn create_torus(&mut self, sf: &TorusSf) -> Result<EntityTag> {
        self.enter(Stage::CreateSurface)?;
        check_frame(&sf.basis)?;
        check_positive(sf.major_radius, "major radius")?;
        check_positive(sf.minor_radius, "minor radius")?;
        self.insert_geometry(Geom::Torus(*sf))
    }

    fn create_bsurface(&mut self, sf: &BSurfaceSf) -> Result<EntityTag> {
        self.enter(Stage::CreateSurface)?;
        let surface = sf.to_nurbs()?;
        if sf.is_u_periodic && !surface.is_closed_in_u(LINEAR_RESOLUTION) {
            return Err(Error::InvalidParameters("surface periodic in u is not closed in u".into()));
        }
        if sf.is_v_periodic && !surface.is_closed_in_v(LINEAR_RESOLUTION) {
            return Err(Error::InvalidParameters("surface periodic in v is not closed in v".into()));
        }
        self.insert_geometry(Geom::BSurface {
            surface,
            periodic: (sf.is_u_periodic, sf.is_v_periodic),
        })
    }

    fn geometry_class(&self, geom: EntityTag) -> Result<GeometryClass> {
        Ok(self.geom_data(geom)?.geom.class())
    }

    fn find_curve_discontinuities(&self, curve: EntityTag) -> Result<Vec<f64>> {
        match &self.geom_data(curve)?.geom {
            Geom::BCurve { curve, .. } => Ok(curve.g1_discontinuities(G1_ANGLE_TOLERANCE)),
            g if g.class().is_curve() => Ok(Vec::new()),
            _ => Err(Error::WrongClass {
                tag: curve,
                expected: "curve",
            }),
        }
    }

    fn find_surface_discontinuities(&self, surface: EntityTag) -> Result<(Vec<f64>, Vec<f64>)> {
        match &self.geom_data(surface)?.geom {
            Geom::BSurface { surface, .. } => Ok(surface.g1_discontinuities(G1_ANGLE_TOLERANCE)),
            g if g.class().is_surface() => Ok((Vec::new(), Vec::new())),
            _ => Err(Error::WrongClass {
                tag: surface,
                expected: "surface",
            }),
        }
    }

    fn curve_interval(&self, curve: EntityTag) -> Result<(f64, f64)> {
        let geom = &self.geom_data(curve)?.geom;
        if !geom.class().is_curve() {
            return Err(Error::WrongClass {
                tag: curve,
                expected: "curve",
            });
        }
        geom.curve_interval()
            .ok_or_else(|| Error::Unbounded(geom.class()))
    }

    fn surface_uvbox(&self, surface: EntityTag) -> Result<UvBox> {
        let geom = &self.geom_data(surface)?.geom;
        if !geom.class().is_surface() {
            return Err(Error::WrongClass {
                tag: surface,
                expected: "surface",
            });
        }
        geom.uvbox().ok_or_else(|| Error::Unbounded(geom.class()))
    }

    fn fit_curve(&mut self, curve: EntityTag, interval: (f64, f64)) -> Result<EntityTag> {
        self.enter(Stage::FitCurve)?;
        let (source, periodic) = self.bcurve_of(curve)?;
        let fitted = fit_curve(source, interval, DEFAULT_SAMPLES_PER_SPAN)
            .map_err(|e| Error::FitFailed(e.to_string()))?;
        let periodic = periodic && fitted.is_closed(LINEAR_RESOLUTION);
        self.insert_geometry(Geom::BCurve {
            curve: fitted,
            periodic,
        })
    }

    fn fit_surface(&mut self, surface: EntityTag, uvbox: UvBox) -> Result<EntityTag> {
        self.enter(Stage::FitSurface)?;
        let (fitted, (u_periodic, v_periodic)) = match &self.geom_data(surface)?.geom {
            Geom::BSurface { surface, periodic } => (
                fit_surface(surface, uvbox, DEFAULT_SAMPLES_PER_SPAN)
                    .map_err(|e| Error::FitFailed(e.to_string()))?,
                *periodic,
            ),
            _ => {
                return Err(Error::WrongClass {
                    tag: surface,
                    expected: "b-surface",
                })
            }
        };
        let periodic = (
            u_periodic && fitted.is_closed_in_u(LINEAR_RESOLUTION),
            v_periodic && fitted.is_closed_in_v(LINEAR_RESOLUTION),
        );
        self.insert_geometry(Geom::BSurface {
            surface: fitted,
            periodic,
        })
    }

    fn surface_normal(&self, surface: EntityTag, u: f64, v: f64) -> Result<Vector3<f64>> {
        let geom = &self.geom_data(surface)?.geom;
        if !geom.class().is_surface() {
            return Err(Error::WrongClass {
                tag: surface,
                expected: "surface",
            });
        }
        geom.surface_normal(u, v)
            .ok_or_else(|| Error::InvalidParameters(format!("no normal at ({u}, {v})")))
    }

    fn surface_parameter(&self, surface: EntityTag, point: &Point3<f64>) -> Result<(f64, f64)> {
        self.geom_data(surface)?
            .geom
            .surface_parameter(point)
            .ok_or(Error::WrongClass {
                tag: surface,
                expected: "surface",
            })
    }

    fn point_position(&self, point: EntityTag) -> Result<Point3<f64>> {
        match &self.geom_data(point)?.geom {
            Geom::Point(p) => Ok(*p),
            _ => Err(Error::WrongClass {
                tag: point,
                expected: "point",
            }),
        }
    }

    fn create_topology(&mut self, request: TopologyRequest<'_>) -> Result<CreatedTopology> {
        self.enter(Stage::CreateTopology)?;
        self.build_topology(request)
    }

    fn make_sheet_from_surface(&mut self, surface: EntityTag, uvbox: UvBox) -> Result<EntityTag> {
        self.enter(Stage::MakeSheet)?;
        self.build_sheet(surface, uvbox)
    }

    fn body_type(&self, body: EntityTag) -> Result<BodyType> {
        Ok(self.body_data(body)?.body_type)
    }

    fn body_edges(&self, body: EntityTag) -> Result<Vec<EntityTag>> {
        self.members_of(body, TopologyClass::Edge)
    }

    fn body_faces(&self, body: EntityTag) -> Result<Vec<EntityTag>> {
        self.members_of(body, TopologyClass::Face)
    }

    fn attach_points(&mut self, vertices: &[EntityTag], points: &[EntityTag]) -> Result<()> {
        self.enter(Stage::AttachPoints)?;
        let senses = vec![true; vertices.len()];
        self.attach(TopologyClass::Vertex, vertices, points, &senses)
    }

    fn attach_curves(
        &mut self,
        edges: &[EntityTag],
        curves: &[EntityTag],
        senses: &[bool],
    ) -> Result<()> {
        self.enter(Stage::AttachCurves)?;
        self.attach(TopologyClass::Edge, edges, curves, senses)
    }

    fn attach_surfaces(
        &mut self,
        faces: &[EntityTag],
        surfaces: &[EntityTag],
        senses: &[bool],
    ) -> Result<()> {
        self.enter(Stage::AttachSurfaces)?;
        self.attach(TopologyClass::Face, faces, surfaces, senses)
    }

    fn set_vertex_precision(&mut self, vertices: &[EntityTag], precision: f64) -> Result<()> {
        check_positive(precision, "precision")?;
        for &v in vertices {
            if self.topol_data(v)?.class != TopologyClass::Vertex {
                return Err(Error::WrongClass {
                    tag: v,
                    expected: "vertex",
                });
            }
        }
        for &v in vertices {
            if let Some(Entity::Topol(t)) = self.entities.get_mut(v) {
                t.precision = Some(precision);
            }
        }
        Ok(())
    }

    fn share_geometry(&mut self, body: EntityTag) -> Result<usize> {
        self.enter(Stage::ShareGeometry)?;
        self.merge_coincident(body)
    }

    fn repair_edges(&mut self, edges: &[EntityTag], max_tolerance: f64) -> Result<()> {
        self.enter(Stage::RepairEdges)?;
        self.widen_edges(edges, max_tolerance)
    }

    fn repair_face(&mut self, face: EntityTag) -> Result<()> {
        self.enter(Stage::RepairFace)?;
        self.verify_face(face)
    }

    fn reset_edge_precision(&mut self, edges: &[EntityTag]) -> Result<()> {
        self.tighten_edges(edges)
    }

    fn check_body(&self, body: EntityTag) -> Result<Vec<CheckFault>> {
        if self.failures.contains(&Stage::CheckBody) {
            return Err(Error::Injected(Stage::CheckBody));
        }
        let mut faults: Vec<CheckFault> = self
            .injected_check_faults
            .iter()
            .map(|state| CheckFault::new(*state, None))
            .collect();
        faults.extend(self.inspect_body(body)?);
        Ok(faults)
    }

    fn is_live(&self, tag: EntityTag) -> bool {
        self.entities.contains_key(tag)
    }

    fn delete(&mut self, tags: &[EntityTag]) -> Result<()> {
        self.enter(Stage::Delete)?;
        for &tag in tags {
            match self.entities.get(tag) {
                None => return Err(Error::UnknownTag(tag)),
                Some(Entity::Topol(_)) => {
                    return Err(Error::WrongClass {
                        tag,
                        expected: "body or geometry",
                    })
                }
                Some(Entity::Geometry(g)) => {
                    if g.owner.is_some_and(|o| self.entities.contains_key(o)) {
                        return Err(Error::EntityInUse(tag));
                    }
                }
                Some(Entity::Body(_)) => {}
            }
        }
        for &tag in tags {
            match self.entities.remove(tag) {
                Some(Entity::Body(body)) => {
                    for member in body.members {
                        if let Some(Entity::Topol(t)) = self.entities.remove(member) {
                            if let Some((geom, _)) = t.geometry {
                                self.entities.remove(geom);
                            }
                        }
                    }
                }
                Some(_) | None => {}
            }
        }
        Ok(())
    }
}

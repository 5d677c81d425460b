// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Topology side of the memory kernel: bulk creation, attach, sharing,
//! repair and checking.

use brep_bridge_topology::{Sense, TopologyClass};
use rustc_hash::{FxHashMap, FxHashSet};

use super::{BodyData, Entity, GeomData, Geom, MemoryKernel, TopolData, LINEAR_RESOLUTION};
use crate::error::{Error, Result};
use crate::fault::{CheckFault, CheckState, FaultState, TopolFault};
use crate::kernel::{CreatedTopology, TopologyRequest, UvBox};
use crate::tag::{BodyType, EntityTag};

impl MemoryKernel {
    /// Body a topological entity belongs to.
    pub fn owning_body(&self, topol: EntityTag) -> Result<EntityTag> {
        Ok(self.topol_data(topol)?.body)
    }

    pub(super) fn build_topology(&mut self, request: TopologyRequest<'_>) -> Result<CreatedTopology> {
        let TopologyRequest {
            classes,
            parents,
            children,
            senses,
            body_type,
        } = request;

        if classes.is_empty() {
            return Err(Error::TopologyRejected("no entities".into()));
        }
        if parents.len() != children.len() || parents.len() != senses.len() {
            return Err(Error::TopologyRejected(format!(
                "{} parents, {} children, {} senses",
                parents.len(),
                children.len(),
                senses.len()
            )));
        }
        let bodies: Vec<usize> = classes
            .iter()
            .enumerate()
            .filter(|(_, c)| **c == TopologyClass::Body)
            .map(|(i, _)| i)
            .collect();
        let body_index = match bodies.as_slice() {
            [single] => *single,
            _ => {
                return Err(Error::TopologyRejected(format!(
                    "{} body entries",
                    bodies.len()
                )))
            }
        };
        for (&p, &c) in parents.iter().zip(children) {
            let (Some(pc), Some(cc)) = (classes.get(p), classes.get(c)) else {
                return Err(Error::TopologyRejected(format!(
                    "relation {p}->{c} outside {} entries",
                    classes.len()
                )));
            };
            if !pc.admits_child(*cc) {
                return Err(Error::TopologyRejected(format!("{pc} cannot contain {cc}")));
            }
        }

        let body = self.entities.insert(Entity::Body(BodyData {
            body_type,
            children: Vec::new(),
            members: Vec::new(),
            sheet_extent: None,
        }));
        let topols: Vec<EntityTag> = classes
            .iter()
            .enumerate()
            .map(|(i, class)| {
                if i == body_index {
                    body
                } else {
                    self.entities.insert(Entity::Topol(TopolData {
                        class: *class,
                        body,
                        children: Vec::new(),
                        geometry: None,
                        precision: None,
                    }))
                }
            })
            .collect();

        let mut child_lists: Vec<Vec<(EntityTag, Sense)>> = vec![Vec::new(); classes.len()];
        let mut seen = FxHashSet::default();
        for ((&p, &c), &s) in parents.iter().zip(children).zip(senses) {
            if seen.insert((p, c, s)) {
                child_lists[p].push((topols[c], s));
            }
        }

        let faults = self.structural_faults(classes, &child_lists);
        let mut edge_uses: FxHashMap<usize, FxHashSet<usize>> = FxHashMap::default();
        for (&p, &c) in parents.iter().zip(children) {
            if classes[p] == TopologyClass::Loop && classes[c] == TopologyClass::Edge {
                edge_uses.entry(c).or_default().insert(p);
            }
        }
        let non_manifold = edge_uses.values().any(|loops| loops.len() > 2);
        let body_type = match self.forced_body_type {
            Some(forced) => forced,
            None if non_manifold => BodyType::General,
            None => body_type,
        };

        let members: Vec<EntityTag> = topols
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != body_index)
            .map(|(_, t)| *t)
            .collect();
        for (i, list) in child_lists.into_iter().enumerate() {
            match self.entities.get_mut(topols[i]) {
                Some(Entity::Topol(t)) => t.children = list,
                Some(Entity::Body(b)) => {
                    b.children = list;
                    b.body_type = body_type;
                }
                _ => {}
            }
        }
        if let Some(Entity::Body(b)) = self.entities.get_mut(body) {
            b.members = members;
        }

        let mut all_faults = self.injected_topol_faults.clone();
        all_faults.extend(faults);
        if !all_faults.is_empty() {
            tracing::debug!(faults = all_faults.len(), "topology created with faults");
        }
        Ok(CreatedTopology {
            body,
            topols,
            faults: all_faults,
        })
    }

    fn structural_faults(
        &self,
        classes: &[TopologyClass],
        child_lists: &[Vec<(EntityTag, Sense)>],
    ) -> Vec<TopolFault> {
        let mut faults = Vec::new();
        for (i, (class, kids)) in classes.iter().zip(child_lists).enumerate() {
            let needs_children = matches!(
                class,
                TopologyClass::Body
                    | TopologyClass::Region
                    | TopologyClass::Shell
                    | TopologyClass::Loop
                    | TopologyClass::Edge
            );
            if needs_children && kids.is_empty() {
                faults.push(TopolFault::new(FaultState::MissingChild, vec![i]));
            }
            if *class == TopologyClass::Edge && kids.len() > 2 {
                faults.push(TopolFault::new(FaultState::TooManyVertices, vec![i]));
            }
        }
        faults
    }

    pub(super) fn build_sheet(&mut self, surface: EntityTag, uvbox: UvBox) -> Result<EntityTag> {
        let data = self.geom_data(surface)?;
        if !data.geom.class().is_surface() {
            return Err(Error::WrongClass {
                tag: surface,
                expected: "surface",
            });
        }
        if data.owner.is_some() {
            return Err(Error::EntityInUse(surface));
        }
        let ((u0, u1), (v0, v1)) = uvbox;
        if u1 - u0 <= LINEAR_RESOLUTION || v1 - v0 <= LINEAR_RESOLUTION {
            return Err(Error::InvalidParameters(format!(
                "empty parameter box {uvbox:?}"
            )));
        }
        let extent = data.geom.sample_extent(uvbox);

        let body = self.entities.insert(Entity::Body(BodyData {
            body_type: BodyType::Sheet,
            children: Vec::new(),
            members: Vec::new(),
            sheet_extent: extent,
        }));
        let mut new_topol = |class: TopologyClass,
                             children: Vec<(EntityTag, Sense)>,
                             geometry: Option<(EntityTag, bool)>| {
            self.entities.insert(Entity::Topol(TopolData {
                class,
                body,
                children,
                geometry,
                precision: None,
            }))
        };
        let face = new_topol(TopologyClass::Face, Vec::new(), Some((surface, true)));
        let shell = new_topol(
            TopologyClass::Shell,
            vec![(face, Sense::Positive), (face, Sense::Negative)],
            None,
        );
        let region = new_topol(TopologyClass::Region, vec![(shell, Sense::None)], None);
        if let Some(Entity::Body(b)) = self.entities.get_mut(body) {
            b.children = vec![(region, Sense::Negative)];
            b.members = vec![region, shell, face];
        }
        if let Some(Entity::Geometry(g)) = self.entities.get_mut(surface) {
            g.owner = Some(face);
        }
        Ok(body)
    }

    pub(super) fn members_of(&self, body: EntityTag, class: TopologyClass) -> Result<Vec<EntityTag>> {
        Ok(self
            .body_data(body)?
            .members
            .iter()
            .copied()
            .filter(|m| matches!(self.entities.get(*m), Some(Entity::Topol(t)) if t.class == class))
            .collect())
    }

    /// Validates a whole attach batch, then applies it.
    pub(super) fn attach(
        &mut self,
        class: TopologyClass,
        topols: &[EntityTag],
        geoms: &[EntityTag],
        senses: &[bool],
    ) -> Result<()> {
        if topols.len() != geoms.len() || topols.len() != senses.len() {
            return Err(Error::AttachRejected(format!(
                "{} {}s, {} geometries, {} senses",
                topols.len(),
                class,
                geoms.len(),
                senses.len()
            )));
        }
        let mut batch = FxHashSet::default();
        for (&topol, &geom) in topols.iter().zip(geoms) {
            let t = self.topol_data(topol)?;
            if t.class != class {
                return Err(Error::AttachRejected(format!(
                    "{} entity given where {} expected",
                    t.class, class
                )));
            }
            if t.geometry.is_some() {
                return Err(Error::AttachRejected(format!("{class} already has geometry")));
            }
            let GeomData { geom: g, owner } = self.geom_data(geom)?;
            if owner.is_some() || !batch.insert(geom) {
                return Err(Error::EntityInUse(geom));
            }
            let class_ok = match class {
                TopologyClass::Vertex => matches!(g, Geom::Point(_)),
                TopologyClass::Edge => g.class().is_curve(),
                TopologyClass::Face => g.class().is_surface(),
                _ => false,
            };
            if !class_ok {
                return Err(Error::AttachRejected(format!(
                    "{:?} cannot be attached to a {class}",
                    g.class()
                )));
            }
            if let Geom::BCurve { curve, periodic } = g {
                if curve.is_closed(LINEAR_RESOLUTION) && !periodic {
                    return Err(Error::ClosedNotPeriodic(geom));
                }
                if !curve
                    .g1_discontinuities(brep_bridge_geometry::G1_ANGLE_TOLERANCE)
                    .is_empty()
                {
                    return Err(Error::NotG1Continuous(geom));
                }
            }
        }

        for ((&topol, &geom), &sense) in topols.iter().zip(geoms).zip(senses) {
            if let Some(Entity::Topol(t)) = self.entities.get_mut(topol) {
                t.geometry = Some((geom, sense));
            }
            if let Some(Entity::Geometry(g)) = self.entities.get_mut(geom) {
                g.owner = Some(topol);
            }
        }
        Ok(())
    }

    /// Points faces and edges with identical geometry at one shared entity.
    pub(super) fn merge_coincident(&mut self, body: EntityTag) -> Result<usize> {
        let members = self.body_data(body)?.members.clone();
        let mut kept: Vec<(EntityTag, Geom)> = Vec::new();
        let mut redirects: Vec<(EntityTag, EntityTag, EntityTag)> = Vec::new();
        for member in members {
            let Some(Entity::Topol(t)) = self.entities.get(member) else {
                continue;
            };
            if !matches!(t.class, TopologyClass::Face | TopologyClass::Edge) {
                continue;
            }
            let Some((geom, _)) = t.geometry else {
                continue;
            };
            let g = &self.geom_data(geom)?.geom;
            match kept.iter().find(|(tag, k)| *tag != geom && k == g) {
                Some((shared, _)) => redirects.push((member, geom, *shared)),
                None => kept.push((geom, g.clone())),
            }
        }

        for (member, old, shared) in &redirects {
            if let Some(Entity::Topol(t)) = self.entities.get_mut(*member) {
                if let Some((_, sense)) = t.geometry {
                    t.geometry = Some((*shared, sense));
                }
            }
            self.entities.remove(*old);
        }
        if !redirects.is_empty() {
            tracing::debug!(merged = redirects.len(), "shared coincident geometry");
        }
        Ok(redirects.len())
    }

    /// Largest distance from an edge's vertices to its curve.
    fn edge_deviation(&self, edge: &TopolData) -> Result<Option<f64>> {
        let Some((curve, _)) = edge.geometry else {
            return Ok(None);
        };
        let curve = &self.geom_data(curve)?.geom;
        let mut worst: f64 = 0.0;
        for (vertex, _) in &edge.children {
            let Some((point, _)) = self.topol_data(*vertex)?.geometry else {
                continue;
            };
            if let Geom::Point(p) = self.geom_data(point)?.geom {
                if let Some(d) = curve.curve_distance(&p) {
                    worst = worst.max(d);
                }
            }
        }
        Ok(Some(worst))
    }

    /// Tolerance an edge is held to when it carries no precision of its own.
    fn vertex_tolerance(&self, edge: &TopolData) -> Result<f64> {
        let mut tol = LINEAR_RESOLUTION;
        for (vertex, _) in &edge.children {
            if let Some(p) = self.topol_data(*vertex)?.precision {
                tol = tol.max(p);
            }
        }
        Ok(tol)
    }

    pub(super) fn widen_edges(&mut self, edges: &[EntityTag], max_tolerance: f64) -> Result<()> {
        let mut first_error = None;
        for &tag in edges {
            let edge = self.topol_data(tag)?;
            let limit = edge.precision.unwrap_or(self.vertex_tolerance(edge)?);
            let Some(deviation) = self.edge_deviation(edge)? else {
                continue;
            };
            if deviation <= limit {
                continue;
            }
            if deviation <= max_tolerance {
                if let Some(Entity::Topol(t)) = self.entities.get_mut(tag) {
                    t.precision = Some(deviation);
                }
                tracing::debug!(deviation, "edge tolerance widened");
            } else if first_error.is_none() {
                first_error = Some(Error::ToleranceExceeded {
                    edge: tag,
                    deviation,
                    limit: max_tolerance,
                });
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    pub(super) fn tighten_edges(&mut self, edges: &[EntityTag]) -> Result<()> {
        for &tag in edges {
            let edge = self.topol_data(tag)?;
            if edge.precision.is_none() {
                continue;
            }
            let deviation = self.edge_deviation(edge)?.unwrap_or(0.0);
            if deviation <= self.vertex_tolerance(edge)? {
                if let Some(Entity::Topol(t)) = self.entities.get_mut(tag) {
                    t.precision = None;
                }
            }
        }
        Ok(())
    }

    pub(super) fn verify_face(&self, face: EntityTag) -> Result<()> {
        let t = self.topol_data(face)?;
        if t.class != TopologyClass::Face {
            return Err(Error::WrongClass {
                tag: face,
                expected: "face",
            });
        }
        let Some((surface, _)) = t.geometry else {
            return Err(Error::AttachRejected("face has no surface".into()));
        };
        let geom = &self.geom_data(surface)?.geom;
        if let Some(((u0, _), (v0, _))) = geom.uvbox() {
            if geom.surface_normal(u0, v0).is_none() {
                return Err(Error::InvalidParameters("surface normal undefined".into()));
            }
        }
        Ok(())
    }

    pub(super) fn inspect_body(&self, body: EntityTag) -> Result<Vec<CheckFault>> {
        let data = self.body_data(body)?;
        let mut faults = Vec::new();
        for &member in &data.members {
            let t = self.topol_data(member)?;
            match t.class {
                TopologyClass::Vertex if t.geometry.is_none() => {
                    faults.push(CheckFault::new(CheckState::BadVertex, Some(member)));
                }
                TopologyClass::Edge => {
                    let tolerance = t.precision.unwrap_or(self.vertex_tolerance(t)?);
                    match self.edge_deviation(t)? {
                        None => faults.push(CheckFault::new(CheckState::BadEdge, Some(member))),
                        Some(d) if d > tolerance * (1.0 + 1e-9) => {
                            faults.push(CheckFault::new(CheckState::BadEdge, Some(member)))
                        }
                        Some(_) => {}
                    }
                    if t.precision.is_some_and(|p| p > self.vertex_tolerance(t).unwrap_or(p)) {
                        faults.push(CheckFault::new(CheckState::ToleranceWidened, Some(member)));
                    }
                }
                TopologyClass::Loop if !self.loop_closes(t)? => {
                    faults.push(CheckFault::new(CheckState::BadLoops, Some(member)));
                }
                TopologyClass::Face if t.geometry.is_none() => {
                    faults.push(CheckFault::new(CheckState::MissingGeometry, Some(member)));
                }
                _ => {}
            }
        }
        Ok(faults)
    }

    /// A loop closes when every vertex reached through its edges is hit an
    /// even number of times. A loop holding a lone vertex is a singular loop.
    fn loop_closes(&self, lp: &TopolData) -> Result<bool> {
        if lp.children.is_empty() {
            return Ok(false);
        }
        let mut hits: FxHashMap<EntityTag, usize> = FxHashMap::default();
        let mut edges = 0;
        for (child, _) in &lp.children {
            let c = self.topol_data(*child)?;
            if c.class != TopologyClass::Edge {
                continue;
            }
            edges += 1;
            match c.children.as_slice() {
                [(only, _)] => *hits.entry(*only).or_insert(0) += 2,
                kids => {
                    for (v, _) in kids {
                        *hits.entry(*v).or_insert(0) += 1;
                    }
                }
            }
        }
        Ok(edges == 0 || hits.values().all(|n| n % 2 == 0))
    }
}

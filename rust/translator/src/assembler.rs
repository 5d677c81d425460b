// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Topology assembly: the sheet shortcut or one bulk create call.

use brep_bridge_kernel::{
    BodyType, CreatedTopology, EntityTag, Error as KernelError, FaultReport, TargetKernel,
    TopolFault, TopologyRequest, UvBox,
};
use brep_bridge_topology::{TopologyClass, TopologyTable};
use rustc_hash::FxHashSet;

use crate::builder::BuiltTopology;
use crate::cleanup::Rollback;
use crate::error::{Error, Result};

/// Makes a one-face sheet straight from the face's surface.
///
/// Returns `Ok(None)` when the shortcut does not apply or the kernel
/// declines it; the caller then takes the full path. On success every
/// other geometry entity the conversion created is deleted.
pub fn try_sheet_shortcut<K: TargetKernel>(
    kernel: &mut K,
    built: &BuiltTopology,
    rollback: &Rollback,
) -> Result<Option<EntityTag>> {
    let Some(face) = built.shortcut_face else {
        return Ok(None);
    };
    let Some(surface) = built.table.geometry_at(face) else {
        return Ok(None);
    };
    if !kernel.geometry_class(surface)?.is_surface() {
        tracing::debug!(?surface, "sheet shortcut declined: face geometry is not a surface");
        return Ok(None);
    }

    let uvbox = match kernel.surface_uvbox(surface) {
        Ok(uvbox) => uvbox,
        Err(KernelError::Unbounded(_)) => match vertex_uvbox(kernel, &built.table, face, surface)? {
            Some(uvbox) => uvbox,
            None => {
                tracing::debug!("sheet shortcut declined: unbounded surface without vertices");
                return Ok(None);
            }
        },
        Err(e) => return Err(e.into()),
    };

    let sheet = match kernel.make_sheet_from_surface(surface, uvbox) {
        Ok(sheet) => sheet,
        Err(e) => {
            tracing::debug!(error = %e, "sheet shortcut declined by kernel");
            return Ok(None);
        }
    };

    let unused: Vec<EntityTag> = rollback
        .geometry()
        .iter()
        .copied()
        .filter(|t| *t != surface && kernel.is_live(*t))
        .collect();
    if let Err(e) = kernel.delete(&unused) {
        kernel.delete(&[sheet]).ok();
        return Err(Error::rejected("make_sheet_from_surface", e));
    }
    tracing::info!(?sheet, ?uvbox, "sheet built from a single surface");
    Ok(Some(sheet))
}

/// UV box of the face's vertex points on an unbounded surface.
fn vertex_uvbox<K: TargetKernel>(
    kernel: &K,
    table: &TopologyTable<EntityTag>,
    face: usize,
    surface: EntityTag,
) -> Result<Option<UvBox>> {
    let mut params = Vec::new();
    for vertex in face_vertices(table, face) {
        if let Some(point) = table.geometry_at(vertex) {
            let position = kernel.point_position(point)?;
            params.push(kernel.surface_parameter(surface, &position)?);
        }
    }
    let Some(&(u0, v0)) = params.first() else {
        return Ok(None);
    };
    let init = ((u0, u0), (v0, v0));
    let ((u_lo, u_hi), (v_lo, v_hi)) = params.iter().fold(init, |((a, b), (c, d)), &(u, v)| {
        ((a.min(u), b.max(u)), (c.min(v), d.max(v)))
    });
    if u_hi - u_lo <= 0.0 || v_hi - v_lo <= 0.0 {
        return Ok(None);
    }
    Ok(Some(((u_lo, u_hi), (v_lo, v_hi))))
}

/// Vertices reachable from `face` through its loops and edges.
fn face_vertices(table: &TopologyTable<EntityTag>, face: usize) -> FxHashSet<usize> {
    let mut stack = vec![face];
    let mut vertices = FxHashSet::default();
    while let Some(index) = stack.pop() {
        for r in table.relations_of(index) {
            match table.class_at(r.child) {
                Some(TopologyClass::Vertex) => {
                    vertices.insert(r.child);
                }
                Some(TopologyClass::Loop | TopologyClass::Edge) => stack.push(r.child),
                _ => {}
            }
        }
    }
    vertices
}

/// Submits the whole table to the kernel's bulk constructor.
///
/// The new body is recorded in `rollback` before its faults are judged, so
/// a rejected body is still cleaned up.
pub fn assemble<K: TargetKernel>(
    kernel: &mut K,
    built: &BuiltTopology,
    rollback: &mut Rollback,
) -> Result<CreatedTopology> {
    let table = &built.table;
    let request = TopologyRequest {
        classes: table.classes(),
        parents: table.parents(),
        children: table.children(),
        senses: table.senses(),
        body_type: if built.is_sheet {
            BodyType::Sheet
        } else {
            BodyType::Solid
        },
    };
    let created = kernel
        .create_topology(request)
        .map_err(|e| Error::rejected("create_topology", e))?;
    rollback.set_body(created.body);

    match FaultReport::classify(created.faults.clone()) {
        FaultReport::Clean => {}
        FaultReport::Tolerated(faults) => {
            tracing::debug!(faults = faults.len(), "tolerated topology faults");
        }
        FaultReport::Fatal(faults) => {
            tracing::warn!(faults = faults.len(), "kernel reported fatal topology faults");
            return Err(Error::rejected("create_topology", describe(&faults)));
        }
    }
    if created.topols.len() != table.len() {
        return Err(Error::MalformedTopology(format!(
            "kernel returned {} entities for {} entries",
            created.topols.len(),
            table.len()
        )));
    }

    match kernel.body_type(created.body)? {
        BodyType::Solid | BodyType::Sheet => Ok(created),
        other => Err(Error::UnsupportedBodyKind(format!("{other:?}"))),
    }
}

fn describe(faults: &[TopolFault]) -> String {
    faults
        .iter()
        .map(|f| format!("{:?} at {:?}", f.state, f.entities))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use brep_bridge_geometry::Frame;
    use brep_bridge_kernel::sf::{PlaneSf, PointSf};
    use brep_bridge_kernel::{FaultState, MemoryKernel, Stage};
    use brep_bridge_topology::{OrientationMaps, Sense};
    use nalgebra::{Point3, Vector3};

    /// Sheet face on the XY plane; its loop's edges carry only vertices.
    fn sheet(kernel: &mut MemoryKernel) -> (BuiltTopology, Rollback) {
        let plane = kernel
            .create_plane(&PlaneSf {
                basis: Frame::from_axes(Point3::origin(), Vector3::z(), Vector3::x()).unwrap(),
            })
            .unwrap();
        let corners = [(0.0, 0.0), (3.0, 0.0), (0.0, 2.0)];
        let points: Vec<EntityTag> = corners
            .iter()
            .map(|&(x, y)| {
                kernel
                    .create_point(&PointSf {
                        position: Point3::new(x, y, 0.0),
                    })
                    .unwrap()
            })
            .collect();

        let mut t = TopologyTable::new();
        let body = t.push(TopologyClass::Body, None);
        let region = t.push(TopologyClass::Region, None);
        let shell = t.push(TopologyClass::Shell, None);
        let face = t.push(TopologyClass::Face, Some(plane));
        let lp = t.push(TopologyClass::Loop, None);
        t.add_relation(body, region, Sense::Negative).unwrap();
        t.add_relation(region, shell, Sense::None).unwrap();
        t.add_relation(shell, face, Sense::Positive).unwrap();
        t.add_relation(shell, face, Sense::Negative).unwrap();
        t.add_relation(face, lp, Sense::Positive).unwrap();
        for p in &points {
            let edge = t.push(TopologyClass::Edge, None);
            let vertex = t.push(TopologyClass::Vertex, Some(*p));
            t.add_relation(lp, edge, Sense::Positive).unwrap();
            t.add_relation(edge, vertex, Sense::None).unwrap();
        }

        let mut rollback = Rollback::new();
        rollback.track_geometry(points);
        rollback.track_geometry([plane]);
        let built = BuiltTopology {
            table: t,
            orientations: OrientationMaps::new(),
            is_sheet: true,
            shortcut_face: Some(face),
            void_regions: 0,
        };
        (built, rollback)
    }

    #[test]
    fn unbounded_plane_uses_vertex_box() {
        let mut kernel = MemoryKernel::new();
        let (built, rollback) = sheet(&mut kernel);
        let body = try_sheet_shortcut(&mut kernel, &built, &rollback)
            .unwrap()
            .unwrap();
        assert_eq!(kernel.body_type(body).unwrap(), BodyType::Sheet);
        assert_eq!(kernel.call_count(Stage::MakeSheet), 1);
        assert_eq!(kernel.call_count(Stage::CreateTopology), 0);
        for tag in rollback.geometry() {
            let surface = built.table.geometry_at(3) == Some(*tag);
            assert_eq!(kernel.is_live(*tag), surface);
        }
    }

    #[test]
    fn declined_shortcut_leaves_geometry() {
        let mut kernel = MemoryKernel::new();
        let (built, rollback) = sheet(&mut kernel);
        kernel.fail_at(Stage::MakeSheet);
        assert_eq!(try_sheet_shortcut(&mut kernel, &built, &rollback).unwrap(), None);
        assert!(rollback.geometry().iter().all(|t| kernel.is_live(*t)));
    }

    #[test]
    fn fatal_faults_reject_but_record_body() {
        let mut kernel = MemoryKernel::new();
        let (built, mut rollback) = sheet(&mut kernel);
        kernel.inject_topology_fault(TopolFault::new(FaultState::TooManyVertices, vec![4]));
        let err = assemble(&mut kernel, &built, &mut rollback).unwrap_err();
        assert!(matches!(err, Error::KernelRejected { stage: "create_topology", .. }));
        let body = rollback.body().unwrap();
        assert!(kernel.is_live(body));
        rollback.run(&mut kernel);
        assert_eq!(kernel.entity_count(), 0);
    }

    #[test]
    fn general_bodies_are_unsupported() {
        let mut kernel = MemoryKernel::new();
        let (built, mut rollback) = sheet(&mut kernel);
        kernel.force_body_type(BodyType::General);
        let err = assemble(&mut kernel, &built, &mut rollback).unwrap_err();
        assert!(matches!(err, Error::UnsupportedBodyKind(_)));
        assert!(rollback.body().is_some());
    }
}

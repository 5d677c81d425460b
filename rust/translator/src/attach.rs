// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Second construction phase: bulk geometry attach.
//!
//! Points go first, then curves, then surfaces. Each pass is one
//! all-or-nothing kernel call and a failure stops the remaining passes.

use brep_bridge_kernel::{CreatedTopology, EntityTag, TargetKernel};
use brep_bridge_topology::{OrientationMaps, TopologyClass, TopologyTable};

use crate::error::{Error, Result};

/// One attach batch for a single topology class.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct AttachBatch {
    pub topols: Vec<EntityTag>,
    pub geometry: Vec<EntityTag>,
    pub senses: Vec<bool>,
}

impl AttachBatch {
    pub fn len(&self) -> usize {
        self.topols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topols.is_empty()
    }
}

/// Collects every entry of `class` that carries geometry, with its
/// orientation bit.
pub fn collect_batch(
    table: &TopologyTable<EntityTag>,
    created: &CreatedTopology,
    orientations: &OrientationMaps,
    class: TopologyClass,
) -> Result<AttachBatch> {
    let mut batch = AttachBatch::default();
    for index in table.indices_of(class) {
        let Some(geometry) = table.geometry_at(index) else {
            continue;
        };
        let topol = created.topols.get(index).copied().ok_or_else(|| {
            Error::MalformedTopology(format!("no kernel entity for entry {index}"))
        })?;
        let sense = match class {
            TopologyClass::Face => orientations.face(index),
            TopologyClass::Edge => orientations.edge(index),
            _ => Ok(true),
        }
        .map_err(|e| Error::MalformedTopology(e.to_string()))?;
        batch.topols.push(topol);
        batch.geometry.push(geometry);
        batch.senses.push(sense);
    }
    Ok(batch)
}

/// Attaches all geometry of the table to the freshly created topology.
pub fn attach_geometry<K: TargetKernel>(
    kernel: &mut K,
    table: &TopologyTable<EntityTag>,
    created: &CreatedTopology,
    orientations: &OrientationMaps,
    vertex_tolerance: f64,
) -> Result<()> {
    let vertices = collect_batch(table, created, orientations, TopologyClass::Vertex)?;
    let edges = collect_batch(table, created, orientations, TopologyClass::Edge)?;
    let faces = collect_batch(table, created, orientations, TopologyClass::Face)?;

    if vertex_tolerance > 0.0 && !vertices.is_empty() {
        kernel
            .set_vertex_precision(&vertices.topols, vertex_tolerance)
            .map_err(|e| Error::rejected("set_vertex_precision", e))?;
    }
    kernel
        .attach_points(&vertices.topols, &vertices.geometry)
        .map_err(|e| Error::rejected("attach_points", e))?;
    kernel
        .attach_curves(&edges.topols, &edges.geometry, &edges.senses)
        .map_err(|e| Error::rejected("attach_curves", e))?;
    kernel
        .attach_surfaces(&faces.topols, &faces.geometry, &faces.senses)
        .map_err(|e| Error::rejected("attach_surfaces", e))?;

    tracing::debug!(
        points = vertices.len(),
        curves = edges.len(),
        surfaces = faces.len(),
        "geometry attached"
    );
    Ok(())
}

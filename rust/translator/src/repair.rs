// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Post-attach repair and the final body check.

use brep_bridge_kernel::{BodyType, CheckFault, EntityTag, TargetKernel};

use crate::error::{Error, Result};

/// Best-effort repair of a fully attached body.
///
/// Merging coincident geometry must succeed. Edge and face repair failures
/// are logged and returned as [`Error::RepairFailed`] values for the
/// caller's report; they never abort the conversion.
pub fn repair_body<K: TargetKernel>(
    kernel: &mut K,
    body: EntityTag,
    vertex_tolerance: f64,
    edge_repair_factor: f64,
) -> Result<Vec<Error>> {
    let merged = kernel
        .share_geometry(body)
        .map_err(|e| Error::rejected("share_geometry", e))?;
    if merged > 0 {
        tracing::debug!(merged, "merged coincident geometry");
    }

    let mut failures = Vec::new();
    let mut note = |step: &str, err: &dyn std::fmt::Display| {
        let failure = Error::RepairFailed(format!("{step}: {err}"));
        tracing::warn!(error = %failure, "repair step failed");
        failures.push(failure);
    };

    match kernel.body_edges(body) {
        Ok(edges) => {
            let max_tolerance = edge_repair_factor * vertex_tolerance;
            if let Err(e) = kernel.repair_edges(&edges, max_tolerance) {
                note("repair edges", &e);
            }
            if let Err(e) = kernel.reset_edge_precision(&edges) {
                note("reset edge precision", &e);
            }
        }
        Err(e) => note("list edges", &e),
    }

    match kernel.body_faces(body) {
        Ok(faces) => {
            for face in faces {
                if let Err(e) = kernel.repair_face(face) {
                    note("repair face", &e);
                }
            }
        }
        Err(e) => note("list faces", &e),
    }
    Ok(failures)
}

/// Rejects general bodies and bodies with unrecoverable check faults.
///
/// Returns the tolerated faults.
pub fn validate_body<K: TargetKernel>(kernel: &K, body: EntityTag) -> Result<Vec<CheckFault>> {
    let body_type = kernel.body_type(body)?;
    if body_type == BodyType::General {
        return Err(Error::UnsupportedBodyKind(format!("{body_type:?}")));
    }

    let faults = kernel
        .check_body(body)
        .map_err(|e| Error::rejected("check_body", e))?;
    if let Some(fatal) = faults.iter().find(|f| f.state.is_unrecoverable()) {
        return Err(Error::rejected(
            "check_body",
            format!("{} at {:?}", fatal.state.as_str(), fatal.entity),
        ));
    }
    for fault in &faults {
        tracing::warn!(state = fault.state.as_str(), entity = ?fault.entity, "tolerated check fault");
    }
    Ok(faults)
}

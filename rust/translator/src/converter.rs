// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Top-level conversion of one source body.
//!
//! The pipeline is normalize, build, assemble, attach, repair, validate.
//! Any error along the way rolls back every kernel entity the conversion
//! created, so the kernel is left either with one valid body or untouched.

use brep_bridge_core::{BrepTraversal, GeometryQuery};
use brep_bridge_geometry::{normalize, Normalization, Similarity};
use brep_bridge_kernel::{CheckFault, EntityTag, TargetKernel};

use crate::assembler::{assemble, try_sheet_shortcut};
use crate::attach::attach_geometry;
use crate::builder::{BuiltTopology, TopologyBuilder};
use crate::cleanup::Rollback;
use crate::config::TranslatorConfig;
use crate::error::{Error, Result};
use crate::factory::GeometryFactory;
use crate::repair::{repair_body, validate_body};

/// A successfully translated body.
#[derive(Debug, Clone)]
pub struct Conversion {
    pub body: EntityTag,
    /// Maps the body's kernel coordinates back to source coordinates.
    pub to_source: Similarity,
    /// Vertex tolerance used, in kernel units.
    pub vertex_tolerance: f64,
    /// Whether the body came from the single-surface sheet shortcut.
    pub via_shortcut: bool,
    /// Repair steps that failed without aborting.
    pub repair_failures: Vec<Error>,
    /// Check faults that were tolerated.
    pub check_faults: Vec<CheckFault>,
}

/// Translates source bodies into a target kernel.
#[derive(Debug, Clone, Default)]
pub struct Translator {
    config: TranslatorConfig,
}

impl Translator {
    pub fn new(config: TranslatorConfig) -> Self {
        Self { config }
    }

    /// Translator configured from `BREP_BRIDGE_*` environment variables.
    pub fn from_env() -> Self {
        Self::new(TranslatorConfig::from_env())
    }

    pub fn config(&self) -> &TranslatorConfig {
        &self.config
    }

    /// Converts `source` into one body of `kernel`.
    pub fn convert<S, K>(&self, source: &S, kernel: &mut K) -> Result<Conversion>
    where
        S: BrepTraversal + GeometryQuery,
        K: TargetKernel,
    {
        let mut rollback = Rollback::new();
        match self.run(source, kernel, &mut rollback) {
            Ok(conversion) => Ok(conversion),
            Err(e) => {
                tracing::warn!(error = %e, "conversion failed, rolling back");
                rollback.run(kernel);
                Err(e)
            }
        }
    }

    fn normalization<S: BrepTraversal>(&self, source: &S) -> Result<Normalization> {
        let extents = source
            .extents()
            .map_err(|e| Error::DegenerateGeometry(e.to_string()))?;
        let norm = normalize(&extents, &self.config.normalizer_settings())
            .map_err(|e| Error::DegenerateGeometry(e.to_string()))?;
        tracing::debug!(
            body_size = norm.body_size,
            scale = norm.to_kernel.scale,
            translation = ?norm.to_kernel.translation,
            vertex_tolerance = norm.vertex_tolerance,
            scaled = norm.scaled,
            "body normalized"
        );
        Ok(norm)
    }

    fn run<S, K>(&self, source: &S, kernel: &mut K, rollback: &mut Rollback) -> Result<Conversion>
    where
        S: BrepTraversal + GeometryQuery,
        K: TargetKernel,
    {
        let norm = self.normalization(source)?;

        let mut factory = GeometryFactory::new(kernel, norm, &self.config);
        let built = TopologyBuilder::new(source, &mut factory).build(self.config.allow_sheet_shortcut);
        rollback.track_geometry(factory.into_created());
        let built = built?;
        self.dump(&built);

        if let Some(sheet) = try_sheet_shortcut(kernel, &built, rollback)? {
            return Ok(Conversion {
                body: sheet,
                to_source: norm.to_source,
                vertex_tolerance: norm.vertex_tolerance,
                via_shortcut: true,
                repair_failures: Vec::new(),
                check_faults: Vec::new(),
            });
        }
        if built.shortcut_face.is_some() {
            tracing::info!("sheet shortcut declined, building full topology");
        }

        let created = assemble(kernel, &built, rollback)?;
        attach_geometry(
            kernel,
            &built.table,
            &created,
            &built.orientations,
            norm.vertex_tolerance,
        )?;
        let repair_failures = repair_body(
            kernel,
            created.body,
            norm.vertex_tolerance,
            self.config.edge_repair_factor,
        )?;
        let check_faults = validate_body(kernel, created.body)?;

        tracing::info!(
            body = ?created.body,
            entries = built.table.len(),
            void_regions = built.void_regions,
            repair_failures = repair_failures.len(),
            "body translated"
        );
        Ok(Conversion {
            body: created.body,
            to_source: norm.to_source,
            vertex_tolerance: norm.vertex_tolerance,
            via_shortcut: false,
            repair_failures,
            check_faults,
        })
    }

    fn dump(&self, built: &BuiltTopology) {
        if !self.config.dump_topology {
            return;
        }
        match built.table.to_json() {
            Ok(json) => tracing::trace!(%json, "topology table"),
            Err(e) => tracing::debug!(error = %e, "topology table dump failed"),
        }
    }
}

/// Converts `source` into `kernel` with the given configuration.
pub fn convert<S, K>(source: &S, kernel: &mut K, config: &TranslatorConfig) -> Result<Conversion>
where
    S: BrepTraversal + GeometryQuery,
    K: TargetKernel,
{
    Translator::new(config.clone()).convert(source, kernel)
}

#[cfg(test)]
mod tests {
    use super::*;
    use brep_bridge_core::{BodyKind, BrepGraph};
    use brep_bridge_kernel::MemoryKernel;

    #[test]
    fn body_without_extents_is_degenerate() {
        let graph = BrepGraph::new(BodyKind::Solid);
        let mut kernel = MemoryKernel::new();
        let err = convert(&graph, &mut kernel, &TranslatorConfig::default()).unwrap_err();
        assert!(matches!(err, Error::DegenerateGeometry(_)));
    }

    #[test]
    fn translator_keeps_its_config() {
        let config = TranslatorConfig {
            allow_sheet_shortcut: false,
            ..TranslatorConfig::default()
        };
        let t = Translator::new(config.clone());
        assert_eq!(t.config(), &config);
    }
}

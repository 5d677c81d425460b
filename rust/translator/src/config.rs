// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Translator configuration, with optional environment overrides.

use brep_bridge_geometry::NormalizerSettings;
use serde::{Deserialize, Serialize};

/// Translator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslatorConfig {
    /// Edge length of the kernel's modeling cube.
    pub size_box: f64,
    /// Bodies smaller than this are enlarged.
    pub min_body_size: f64,
    /// Fraction of the cube a shrunk body occupies.
    pub shrink_margin: f64,
    /// Fraction of the cube an enlarged body occupies.
    pub enlarge_margin: f64,
    /// Vertex tolerance per unit of effective body size.
    pub vertex_tolerance_factor: f64,
    /// Edge repair may widen tolerances up to this multiple of the vertex
    /// tolerance.
    pub edge_repair_factor: f64,
    /// Face orientation flips when source and kernel normals have a cosine
    /// below this.
    pub normal_flip_cosine: f64,
    /// Elliptical radii closer than this are not reported as approximated.
    pub ellipse_tolerance: f64,
    /// Try the single-surface sheet shortcut.
    pub allow_sheet_shortcut: bool,
    /// Emit the topology table as JSON at trace level.
    pub dump_topology: bool,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            size_box: 1000.0,
            min_body_size: 10.0,
            shrink_margin: 0.8,
            enlarge_margin: 0.5,
            vertex_tolerance_factor: 1e-5,
            edge_repair_factor: 10.0,
            normal_flip_cosine: -0.9,
            ellipse_tolerance: 1e-5,
            allow_sheet_shortcut: true,
            dump_topology: false,
        }
    }
}

impl TranslatorConfig {
    /// Defaults overridden by `BREP_BRIDGE_*` environment variables.
    /// Unparsable values fall back to the default.
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            size_box: env_or("BREP_BRIDGE_SIZE_BOX", d.size_box),
            min_body_size: env_or("BREP_BRIDGE_MIN_BODY_SIZE", d.min_body_size),
            shrink_margin: env_or("BREP_BRIDGE_SHRINK_MARGIN", d.shrink_margin),
            enlarge_margin: env_or("BREP_BRIDGE_ENLARGE_MARGIN", d.enlarge_margin),
            vertex_tolerance_factor: env_or(
                "BREP_BRIDGE_VERTEX_TOLERANCE_FACTOR",
                d.vertex_tolerance_factor,
            ),
            edge_repair_factor: env_or("BREP_BRIDGE_EDGE_REPAIR_FACTOR", d.edge_repair_factor),
            allow_sheet_shortcut: env_or("BREP_BRIDGE_SHEET_SHORTCUT", d.allow_sheet_shortcut),
            dump_topology: env_or("BREP_BRIDGE_DUMP_TOPOLOGY", d.dump_topology),
            ..d
        }
    }

    pub fn normalizer_settings(&self) -> NormalizerSettings {
        NormalizerSettings {
            size_box: self.size_box,
            min_body_size: self.min_body_size,
            shrink_margin: self.shrink_margin,
            enlarge_margin: self.enlarge_margin,
            tolerance_factor: self.vertex_tolerance_factor,
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_kernel_cube() {
        let c = TranslatorConfig::default();
        let n = c.normalizer_settings();
        assert_eq!(n, NormalizerSettings::default());
        assert!(c.allow_sheet_shortcut);
        assert!(!c.dump_topology);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let c: TranslatorConfig =
            serde_json::from_str(r#"{ "size_box": 200.0, "dump_topology": true }"#).unwrap();
        assert_eq!(c.size_box, 200.0);
        assert!(c.dump_topology);
        assert_eq!(c.edge_repair_factor, 10.0);
    }

    #[test]
    fn env_values_parse_or_fall_back() {
        assert_eq!(env_or("BREP_BRIDGE_TEST_UNSET_VARIABLE", 4.5), 4.5);
    }
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Edge curves as described by the source modeler.

use std::f64::consts::TAU;

use brep_bridge_geometry::{Frame, NurbsCurve};
use nalgebra::Point3;

/// Angular slack when deciding whether an arc sweeps a full turn.
const FULL_TURN_TOLERANCE: f64 = 1e-9;

/// The curve underlying a source edge.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SourceCurve {
    /// A bounded straight segment.
    LineSegment {
        start: Point3<f64>,
        end: Point3<f64>,
    },
    /// An arc of a circle in the frame's plane, angles measured from the
    /// frame's reference direction about its axis.
    CircularArc {
        frame: Frame,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
    },
    /// An arc of an ellipse; the major axis lies along the frame's
    /// reference direction.
    EllipticalArc {
        frame: Frame,
        major_radius: f64,
        minor_radius: f64,
        start_angle: f64,
        end_angle: f64,
    },
    /// A free-form curve.
    Nurbs { curve: NurbsCurve, periodic: bool },
    /// An ordered chain of sub-curves.
    Composite(Vec<SourceCurve>),
    /// Anything the translator has no mapping for.
    Unsupported(String),
}

impl SourceCurve {
    pub fn kind_name(&self) -> &'static str {
        match self {
            SourceCurve::LineSegment { .. } => "line segment",
            SourceCurve::CircularArc { .. } => "circular arc",
            SourceCurve::EllipticalArc { .. } => "elliptical arc",
            SourceCurve::Nurbs { .. } => "nurbs curve",
            SourceCurve::Composite(_) => "composite curve",
            SourceCurve::Unsupported(_) => "unsupported curve",
        }
    }

    fn conic_point(frame: &Frame, a: f64, b: f64, angle: f64) -> Point3<f64> {
        frame.point_in_plane(a * angle.cos(), b * angle.sin())
    }

    pub fn start_point(&self) -> Option<Point3<f64>> {
        match self {
            SourceCurve::LineSegment { start, .. } => Some(*start),
            SourceCurve::CircularArc {
                frame,
                radius,
                start_angle,
                ..
            } => Some(Self::conic_point(frame, *radius, *radius, *start_angle)),
            SourceCurve::EllipticalArc {
                frame,
                major_radius,
                minor_radius,
                start_angle,
                ..
            } => Some(Self::conic_point(frame, *major_radius, *minor_radius, *start_angle)),
            SourceCurve::Nurbs { curve, .. } => Some(curve.start_point()),
            SourceCurve::Composite(parts) => parts.first().and_then(|c| c.start_point()),
            SourceCurve::Unsupported(_) => None,
        }
    }

    pub fn end_point(&self) -> Option<Point3<f64>> {
        match self {
            SourceCurve::LineSegment { end, .. } => Some(*end),
            SourceCurve::CircularArc {
                frame,
                radius,
                end_angle,
                ..
            } => Some(Self::conic_point(frame, *radius, *radius, *end_angle)),
            SourceCurve::EllipticalArc {
                frame,
                major_radius,
                minor_radius,
                end_angle,
                ..
            } => Some(Self::conic_point(frame, *major_radius, *minor_radius, *end_angle)),
            SourceCurve::Nurbs { curve, .. } => Some(curve.end_point()),
            SourceCurve::Composite(parts) => parts.last().and_then(|c| c.end_point()),
            SourceCurve::Unsupported(_) => None,
        }
    }

    /// Whether the curve returns to its start.
    pub fn is_closed(&self, tolerance: f64) -> bool {
        match self {
            SourceCurve::CircularArc {
                start_angle,
                end_angle,
                ..
            }
            | SourceCurve::EllipticalArc {
                start_angle,
                end_angle,
                ..
            } => (end_angle - start_angle).abs() >= TAU - FULL_TURN_TOLERANCE,
            SourceCurve::LineSegment { .. } | SourceCurve::Unsupported(_) => false,
            _ => match (self.start_point(), self.end_point()) {
                (Some(s), Some(e)) => (e - s).norm() <= tolerance,
                _ => false,
            },
        }
    }

    /// Points whose axis-aligned box contains the whole curve.
    ///
    /// Conics give the box of their full ellipse, free-form curves their
    /// control hull.
    pub fn hull_points(&self) -> Vec<Point3<f64>> {
        match self {
            SourceCurve::LineSegment { start, end } => vec![*start, *end],
            SourceCurve::CircularArc { frame, radius, .. } => conic_box(frame, *radius, *radius),
            SourceCurve::EllipticalArc {
                frame,
                major_radius,
                minor_radius,
                ..
            } => conic_box(frame, *major_radius, *minor_radius),
            SourceCurve::Nurbs { curve, .. } => curve.control_points(),
            SourceCurve::Composite(parts) => parts.iter().flat_map(|c| c.hull_points()).collect(),
            SourceCurve::Unsupported(_) => Vec::new(),
        }
    }

    /// The same curve with its parameterization running the other way.
    pub fn reversed(&self) -> SourceCurve {
        match self {
            SourceCurve::LineSegment { start, end } => SourceCurve::LineSegment {
                start: *end,
                end: *start,
            },
            // Flipping the axis mirrors angles: θ in the old frame is -θ in
            // the new one.
            SourceCurve::CircularArc {
                frame,
                radius,
                start_angle,
                end_angle,
            } => SourceCurve::CircularArc {
                frame: frame.reversed(),
                radius: *radius,
                start_angle: -end_angle,
                end_angle: -start_angle,
            },
            SourceCurve::EllipticalArc {
                frame,
                major_radius,
                minor_radius,
                start_angle,
                end_angle,
            } => SourceCurve::EllipticalArc {
                frame: frame.reversed(),
                major_radius: *major_radius,
                minor_radius: *minor_radius,
                start_angle: -end_angle,
                end_angle: -start_angle,
            },
            SourceCurve::Nurbs { curve, periodic } => SourceCurve::Nurbs {
                curve: curve.reversed(),
                periodic: *periodic,
            },
            SourceCurve::Composite(parts) => {
                SourceCurve::Composite(parts.iter().rev().map(SourceCurve::reversed).collect())
            }
            SourceCurve::Unsupported(name) => SourceCurve::Unsupported(name.clone()),
        }
    }
}

/// Box corners of a full ellipse with semi-axes `a` along the frame's
/// reference direction and `b` along its y direction.
fn conic_box(frame: &Frame, a: f64, b: f64) -> Vec<Point3<f64>> {
    let x = frame.ref_direction * a.abs();
    let y = frame.y_direction() * b.abs();
    let half = (x.component_mul(&x) + y.component_mul(&y)).map(f64::sqrt);
    vec![frame.origin - half, frame.origin + half]
}

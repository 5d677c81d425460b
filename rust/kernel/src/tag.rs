// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Kernel entity tags and classifications.

use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Tag of any kernel entity: geometry, topology or body.
    pub struct EntityTag;
}

/// Class of a geometric entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeometryClass {
    Point,
    Line,
    Circle,
    Ellipse,
    BCurve,
    Plane,
    Cylinder,
    Cone,
    Sphere,
    Torus,
    BSurface,
}

impl GeometryClass {
    pub fn is_curve(&self) -> bool {
        matches!(
            self,
            GeometryClass::Line | GeometryClass::Circle | GeometryClass::Ellipse | GeometryClass::BCurve
        )
    }

    pub fn is_surface(&self) -> bool {
        matches!(
            self,
            GeometryClass::Plane
                | GeometryClass::Cylinder
                | GeometryClass::Cone
                | GeometryClass::Sphere
                | GeometryClass::Torus
                | GeometryClass::BSurface
        )
    }
}

/// Manifold classification of a kernel body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BodyType {
    Solid,
    Sheet,
    Wire,
    Acorn,
    /// Non-manifold or mixed-dimension.
    General,
}

impl BodyType {
    pub fn is_manifold(&self) -> bool {
        !matches!(self, BodyType::General)
    }
}

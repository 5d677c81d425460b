// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Rollback of a failed conversion.
//!
//! Every kernel entity a conversion creates is recorded here. On failure
//! the body goes first, taking its topology and attached geometry with it,
//! then whatever geometry is still alive on its own.

use brep_bridge_kernel::{EntityTag, TargetKernel};

#[derive(Debug, Default)]
pub struct Rollback {
    body: Option<EntityTag>,
    geometry: Vec<EntityTag>,
}

impl Rollback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track_geometry(&mut self, tags: impl IntoIterator<Item = EntityTag>) {
        self.geometry.extend(tags);
    }

    pub fn set_body(&mut self, body: EntityTag) {
        self.body = Some(body);
    }

    pub fn body(&self) -> Option<EntityTag> {
        self.body
    }

    pub fn geometry(&self) -> &[EntityTag] {
        &self.geometry
    }

    /// Deletes everything still alive and returns how many entities were
    /// removed by explicit request.
    ///
    /// Deletion failures are logged and skipped; the remaining entities are
    /// still attempted.
    pub fn run<K: TargetKernel>(self, kernel: &mut K) -> usize {
        let mut deleted = 0;
        if let Some(body) = self.body {
            if kernel.is_live(body) {
                match kernel.delete(&[body]) {
                    Ok(()) => deleted += 1,
                    Err(e) => tracing::warn!(?body, error = %e, "failed to delete body"),
                }
            }
        }
        for tag in self.geometry {
            if !kernel.is_live(tag) {
                continue;
            }
            match kernel.delete(&[tag]) {
                Ok(()) => deleted += 1,
                Err(e) => tracing::warn!(?tag, error = %e, "failed to delete geometry"),
            }
        }
        tracing::debug!(deleted, "rolled back conversion");
        deleted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brep_bridge_kernel::sf::PointSf;
    use brep_bridge_kernel::{MemoryKernel, Stage};
    use nalgebra::Point3;

    fn points(kernel: &mut MemoryKernel, n: usize) -> Vec<EntityTag> {
        (0..n)
            .map(|i| {
                kernel
                    .create_point(&PointSf {
                        position: Point3::new(i as f64, 0.0, 0.0),
                    })
                    .unwrap()
            })
            .collect()
    }

    #[test]
    fn removes_live_geometry_and_skips_dead() {
        let mut kernel = MemoryKernel::new();
        let tags = points(&mut kernel, 3);
        kernel.delete(&tags[1..2]).unwrap();

        let mut rollback = Rollback::new();
        rollback.track_geometry(tags);
        assert_eq!(rollback.run(&mut kernel), 2);
        assert_eq!(kernel.entity_count(), 0);
    }

    #[test]
    fn failing_delete_is_survived() {
        let mut kernel = MemoryKernel::new();
        let tags = points(&mut kernel, 2);
        kernel.fail_at(Stage::Delete);

        let mut rollback = Rollback::new();
        rollback.track_geometry(tags);
        assert_eq!(rollback.run(&mut kernel), 0);
        assert_eq!(kernel.entity_count(), 2);
    }
}

//! Demo scene: column rows registered with the culling keeper, each with the
//! renderer state its events drive.

use nebula_culling::{CullingError, VolumeEvent, VolumeHandle, VolumeKeeper};
use rand::Rng;
use slotmap::SecondaryMap;

use crate::instance_renderer::{InstanceRenderer, MeshVariant};
use crate::spawner::ColumnRow;

pub(crate) struct Instance {
    pub row: ColumnRow,
    pub renderer: InstanceRenderer,
}

/// Aggregate draw state at one point in time.
#[derive(Debug, Default, PartialEq)]
pub(crate) struct SceneStats {
    pub total: usize,
    pub drawn: usize,
    pub coarse: usize,
    /// Drawn instances per LOD level.
    pub lod_histogram: Vec<usize>,
    pub rebuilds: u32,
}

#[derive(Default)]
pub(crate) struct Scene {
    instances: SecondaryMap<VolumeHandle, Instance>,
}

impl Scene {
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn get(&self, handle: VolumeHandle) -> Option<&Instance> {
        self.instances.get(handle)
    }

    /// Register `row` and start tracking its renderer.
    pub fn spawn(&mut self, keeper: &mut VolumeKeeper, row: ColumnRow) -> Result<VolumeHandle, CullingError> {
        let handle = keeper.register_with_transform(row.local_bounds(), row.local_to_world())?;
        // Renderers start from the same assumption as the culling seed.
        let lod = keeper.reported_lod(handle).unwrap_or_else(|| keeper.seed_lod());
        self.instances.insert(
            handle,
            Instance {
                row,
                renderer: InstanceRenderer::new(lod),
            },
        );
        Ok(handle)
    }

    pub fn despawn(&mut self, keeper: &mut VolumeKeeper, handle: VolumeHandle) -> Result<Instance, CullingError> {
        keeper.unregister(handle)?;
        self.instances.remove(handle).ok_or(CullingError::InvalidHandle)
    }

    pub fn apply(&mut self, events: &[VolumeEvent]) {
        for event in events {
            if let Some(instance) = self.instances.get_mut(event.handle) {
                instance.renderer.on_event(event.kind);
            }
        }
    }

    pub fn random_handle(&self, rng: &mut impl Rng) -> Option<VolumeHandle> {
        if self.instances.is_empty() {
            return None;
        }
        let index = rng.gen_range(0..self.instances.len());
        self.instances.keys().nth(index)
    }

    pub fn stats(&self, lod_levels: usize) -> SceneStats {
        let mut stats = SceneStats {
            total: self.instances.len(),
            lod_histogram: vec![0; lod_levels.max(1)],
            ..SceneStats::default()
        };
        for renderer in self.instances.values().map(|i| &i.renderer) {
            stats.rebuilds += renderer.rebuilds;
            if !renderer.is_drawn() {
                continue;
            }
            stats.drawn += 1;
            if renderer.mesh == MeshVariant::Coarse {
                stats.coarse += 1;
            }
            let level = (renderer.lod as usize).min(stats.lod_histogram.len() - 1);
            stats.lod_histogram[level] += 1;
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Mat4, Vec3};
    use nebula_culling::ReferenceCamera;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256StarStar;

    fn keeper() -> VolumeKeeper {
        let mut keeper = VolumeKeeper::new(8);
        keeper.set_reference_camera(Some(ReferenceCamera::new(
            Mat4::look_to_rh(Vec3::ZERO, Vec3::NEG_Z, Vec3::Y),
            Mat4::perspective_rh(1.0, 1.0, 0.1, 500.0),
        )));
        keeper
    }

    fn row(z: f32) -> ColumnRow {
        ColumnRow {
            position: Vec3::new(0.0, 0.0, z),
            number: 20,
            space: 0.1,
        }
    }

    #[test]
    fn test_events_drive_renderers() {
        let mut keeper = keeper();
        let mut scene = Scene::default();
        let ahead = scene.spawn(&mut keeper, row(-30.0)).unwrap();
        let behind = scene.spawn(&mut keeper, row(30.0)).unwrap();

        let events = keeper.update().to_vec();
        scene.apply(&events);

        assert!(scene.get(ahead).unwrap().renderer.is_drawn());
        assert!(!scene.get(behind).unwrap().renderer.is_drawn());
        let stats = scene.stats(1);
        assert_eq!((stats.total, stats.drawn), (2, 1));
        assert_eq!(stats.lod_histogram, vec![1]);
    }

    #[test]
    fn test_despawn_keeps_other_instances_tracked() {
        let mut keeper = keeper();
        let mut scene = Scene::default();
        let first = scene.spawn(&mut keeper, row(-10.0)).unwrap();
        let last = scene.spawn(&mut keeper, row(20.0)).unwrap();

        scene.despawn(&mut keeper, first).unwrap();
        assert_eq!(scene.len(), 1);
        assert_eq!(keeper.slot(last), Some(0));

        let events = keeper.update().to_vec();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].handle, last);
        scene.apply(&events);
        assert!(!scene.get(last).unwrap().renderer.is_drawn());

        assert_eq!(scene.despawn(&mut keeper, first).err(), Some(CullingError::InvalidHandle));
    }

    #[test]
    fn test_random_handle() {
        let mut keeper = keeper();
        let mut scene = Scene::default();
        let mut rng = Xoshiro256StarStar::seed_from_u64(3);
        assert!(scene.random_handle(&mut rng).is_none());
        let handle = scene.spawn(&mut keeper, row(-10.0)).unwrap();
        assert_eq!(scene.random_handle(&mut rng), Some(handle));
    }
}

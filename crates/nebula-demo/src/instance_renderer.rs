//! Stand-in for an instanced draw dispatcher, driven purely by culling events.

use nebula_culling::VolumeEventKind;

/// LOD levels above this draw the coarse mesh.
pub(crate) const COARSE_LOD_ABOVE: u8 = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum MeshVariant {
    /// Full cylinder mesh.
    Detailed,
    /// Box mesh used at a distance.
    Coarse,
}

/// Per-row draw state. Starts drawn, matching a volume that is assumed
/// visible until told otherwise.
#[derive(Clone, Copy, Debug)]
pub(crate) struct InstanceRenderer {
    pub rendering_off: bool,
    pub mesh: MeshVariant,
    pub lod: u8,
    /// Times the instance buffer had to be rebuilt for a mesh swap.
    pub rebuilds: u32,
}

fn mesh_for(lod: u8) -> MeshVariant {
    if lod > COARSE_LOD_ABOVE {
        MeshVariant::Coarse
    } else {
        MeshVariant::Detailed
    }
}

impl InstanceRenderer {
    /// A drawn renderer at `lod`.
    pub fn new(lod: u8) -> Self {
        Self {
            rendering_off: false,
            mesh: mesh_for(lod),
            lod,
            rebuilds: 0,
        }
    }

    pub fn on_event(&mut self, kind: VolumeEventKind) {
        match kind {
            VolumeEventKind::BecameVisible => self.rendering_off = false,
            VolumeEventKind::BecameInvisible => self.rendering_off = true,
            VolumeEventKind::LodChanged(level) => {
                self.lod = level;
                let mesh = mesh_for(level);
                if mesh != self.mesh {
                    self.mesh = mesh;
                    self.rebuilds += 1;
                }
            }
        }
    }

    pub fn is_drawn(&self) -> bool {
        !self.rendering_off
    }
}

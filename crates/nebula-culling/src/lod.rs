//! Viewport-height based LOD bucketing with validated descending thresholds.

use crate::error::CullingError;

/// Maximum number of thresholds. The bucket index shares a byte with the
/// visibility bit, so it must fit in 7 bits.
pub const MAX_LOD_THRESHOLDS: usize = 127;

/// Descending viewport-height boundaries between LOD buckets.
///
/// `thresholds[0]` is the largest. An object whose viewport height exceeds
/// `thresholds[i]` (and none before it) lands in bucket `i`; one that exceeds
/// none lands in bucket `len`. Empty thresholds mean a single bucket 0.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LodThresholds {
    thresholds: Vec<f32>,
}

impl LodThresholds {
    /// Thresholds used by the instanced rendering sample scenes.
    pub const DEFAULT: [f32; 4] = [1.0, 0.5, 0.25, 0.025];

    /// A single bucket: every height maps to LOD 0.
    pub fn single() -> Self {
        Self {
            thresholds: Vec::new(),
        }
    }

    /// Validate and wrap a threshold list.
    ///
    /// # Errors
    ///
    /// Returns [`CullingError::InvalidThresholds`] if there are more than
    /// [`MAX_LOD_THRESHOLDS`] entries, an entry is NaN, or the sequence
    /// increases anywhere.
    pub fn new(thresholds: &[f32]) -> Result<Self, CullingError> {
        if thresholds.len() > MAX_LOD_THRESHOLDS {
            return Err(CullingError::InvalidThresholds(format!(
                "{} thresholds given, at most {MAX_LOD_THRESHOLDS} allowed",
                thresholds.len()
            )));
        }
        if let Some(i) = thresholds.iter().position(|t| t.is_nan()) {
            return Err(CullingError::InvalidThresholds(format!(
                "threshold {i} is NaN"
            )));
        }
        if let Some(i) = thresholds.windows(2).position(|w| w[1] > w[0]) {
            return Err(CullingError::InvalidThresholds(format!(
                "thresholds must be non-increasing: [{i}] = {} < [{}] = {}",
                thresholds[i],
                i + 1,
                thresholds[i + 1]
            )));
        }
        Ok(Self {
            thresholds: thresholds.to_vec(),
        })
    }

    /// The coarsest bucket index.
    pub fn max_lod(&self) -> u8 {
        self.thresholds.len() as u8
    }

    /// Number of distinct buckets.
    pub fn bucket_count(&self) -> usize {
        self.thresholds.len() + 1
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.thresholds
    }

    pub fn is_empty(&self) -> bool {
        self.thresholds.is_empty()
    }

    /// Map a viewport height to its LOD bucket.
    ///
    /// Bucket 0 is the most detailed (largest on screen). Buckets increase
    /// monotonically as the height shrinks.
    pub fn bucket(&self, height: f32) -> u8 {
        bucket(height, &self.thresholds)
    }
}

/// Index of the first threshold that `height` strictly exceeds, or
/// `thresholds.len()` if it exceeds none. Assumes `thresholds` is descending.
///
/// Only the first [`MAX_LOD_THRESHOLDS`] entries are consulted, so the result
/// always fits the 7-bit LOD field of a packed state.
pub fn bucket(height: f32, thresholds: &[f32]) -> u8 {
    let usable = &thresholds[..thresholds.len().min(MAX_LOD_THRESHOLDS)];
    let index = usable
        .iter()
        .position(|&threshold| height > threshold)
        .unwrap_or(usable.len());
    index as u8
}

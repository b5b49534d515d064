use serde::{Deserialize, Serialize};

use crate::foundation::error::{GridweaveError, GridweaveResult};

/// Absolute tolerance for every resolution and phase comparison in the engine.
pub const EPSILON: f64 = 0.001;

/// Compare two grid quantities under the engine-wide tolerance.
pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

/// Fractional position of a grid edge within its own resolution step,
/// normalized into `[0, 1)`.
///
/// Values within [`EPSILON`] below 1 snap to `1e-7` so that grids sitting a
/// hair under an integer boundary compare equal to grids sitting on it.
pub fn grid_phase(coord: f64, res: f64) -> f64 {
    let mut phase = (coord / res).fract();
    if phase < 0.0 {
        phase += 1.0;
    }
    if (1.0 - phase).abs() < EPSILON {
        phase = 0.0000001;
    }
    phase
}

/// Georeferenced extent of a raster, y increasing upward.
///
/// Serialized as a `[xmin, ymin, xmax, ymax]` array.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct BoundingBox {
    /// Left edge.
    pub xmin: f64,
    /// Bottom edge.
    pub ymin: f64,
    /// Right edge.
    pub xmax: f64,
    /// Top edge.
    pub ymax: f64,
}

impl From<[f64; 4]> for BoundingBox {
    fn from(v: [f64; 4]) -> Self {
        Self {
            xmin: v[0],
            ymin: v[1],
            xmax: v[2],
            ymax: v[3],
        }
    }
}

impl From<BoundingBox> for [f64; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.xmin, b.ymin, b.xmax, b.ymax]
    }
}

impl BoundingBox {
    /// Build an extent from its four edges.
    pub fn new(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }

    /// Horizontal ground size.
    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    /// Vertical ground size.
    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }

    /// Smallest extent containing both `self` and `other`.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            xmin: self.xmin.min(other.xmin),
            ymin: self.ymin.min(other.ymin),
            xmax: self.xmax.max(other.xmax),
            ymax: self.ymax.max(other.ymax),
        }
    }

    /// True when the two extents share interior area. Touching edges do not
    /// count as intersection.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.xmin < other.xmax
            && other.xmin < self.xmax
            && self.ymin < other.ymax
            && other.ymin < self.ymax
    }

    /// Reject empty or non-finite extents with a descriptive error.
    pub fn validate(&self) -> GridweaveResult<()> {
        let edges = [self.xmin, self.ymin, self.xmax, self.ymax];
        if edges.iter().any(|v| !v.is_finite()) {
            return Err(GridweaveError::validation(format!(
                "bounding box edges must be finite, got {self:?}"
            )));
        }
        if self.xmax <= self.xmin || self.ymax <= self.ymin {
            return Err(GridweaveError::validation(format!(
                "bounding box must have positive extent, got {self:?}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/geo.rs"]
mod tests;

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::compose::compound::CompoundImage;
use crate::foundation::error::{GridweaveError, GridweaveResult};
use crate::foundation::geo::{BoundingBox, EPSILON, approx_eq};
use crate::foundation::sample::{SampleBuffer, SampleFormat};
use crate::raster::image::Raster;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum MirrorSide {
    West,
    North,
    East,
    South,
}

/// Whole-tile reflection of a mosaic neighbor into an empty grid cell.
///
/// Resampling kernels read a margin beyond the pixel they produce; without
/// padding, every mosaic edge and hole would shrink the usable output by one
/// kernel support. A mirror fills such a cell with its nearest neighbor's
/// content reflected across the shared edge, which keeps the kernel fed with
/// plausible samples. Mirrors carry no real data and are excluded from
/// coverage masks.
pub struct MirrorImage {
    neighbor: Arc<dyn Raster>,
    side: MirrorSide,
    bbox: BoundingBox,
}

impl MirrorImage {
    /// Reflect the first available of the cell's west, north, east, and south
    /// neighbors, in that order. Fails when the cell has no neighbors.
    pub fn new(neighbors: [Option<Arc<dyn Raster>>; 4]) -> GridweaveResult<Self> {
        const SIDES: [MirrorSide; 4] = [
            MirrorSide::West,
            MirrorSide::North,
            MirrorSide::East,
            MirrorSide::South,
        ];
        for (side, neighbor) in SIDES.into_iter().zip(neighbors) {
            if let Some(neighbor) = neighbor {
                let b = neighbor.bbox();
                let (w, h) = (b.width(), b.height());
                let bbox = match side {
                    MirrorSide::West => BoundingBox::new(b.xmin + w, b.ymin, b.xmax + w, b.ymax),
                    MirrorSide::East => BoundingBox::new(b.xmin - w, b.ymin, b.xmax - w, b.ymax),
                    MirrorSide::North => BoundingBox::new(b.xmin, b.ymin - h, b.xmax, b.ymax - h),
                    MirrorSide::South => BoundingBox::new(b.xmin, b.ymin + h, b.xmax, b.ymax + h),
                };
                return Ok(Self {
                    neighbor,
                    side,
                    bbox,
                });
            }
        }
        Err(GridweaveError::geometry(
            "mirror cell has no neighbor to reflect",
        ))
    }
}

impl Raster for MirrorImage {
    fn width(&self) -> u32 {
        self.neighbor.width()
    }

    fn height(&self) -> u32 {
        self.neighbor.height()
    }

    fn channels(&self) -> u8 {
        self.neighbor.channels()
    }

    fn sample_format(&self) -> SampleFormat {
        self.neighbor.sample_format()
    }

    fn bbox(&self) -> BoundingBox {
        self.bbox
    }

    fn read_row(&self, row: u32, out: &mut SampleBuffer) {
        debug_assert!(row < self.height());
        match self.side {
            MirrorSide::West | MirrorSide::East => {
                self.neighbor.read_row(row, out);
                out.reverse_pixels(usize::from(self.channels()));
            }
            MirrorSide::North | MirrorSide::South => {
                self.neighbor.read_row(self.height() - 1 - row, out);
            }
        }
    }
}

/// Synthesize mirror tiles for every empty cell around and inside a pack
/// mosaic, to be appended after the real members as the compound's synthetic
/// tail.
///
/// Requires uniform tiles on a regular lattice; otherwise a warning is logged
/// and no mirrors are produced, and the caller composites unpadded. Cells
/// with no data neighbor stay empty and are reported in a single warning;
/// the four outer corners are never filled. Padding is best-effort, never a
/// hard failure.
pub fn pad_with_mirrors(compound: &CompoundImage) -> Vec<Arc<dyn Raster>> {
    let members = compound.members();
    let first = &members[0];
    let (w, h) = (first.width(), first.height());
    let (resx, resy) = (compound.resx(), compound.resy());
    let tile_w = f64::from(w) * resx;
    let tile_h = f64::from(h) * resy;
    let b = compound.bbox();

    for member in members {
        if member.width() != w
            || member.height() != h
            || !approx_eq(member.resx(), resx)
            || !approx_eq(member.resy(), resy)
        {
            warn!("mosaic tiles are not uniform, skipping mirror padding");
            return Vec::new();
        }
    }

    let mut cells: HashMap<(i64, i64), Arc<dyn Raster>> = HashMap::new();
    for member in members {
        let mb = member.bbox();
        let ox = (mb.xmin - b.xmin) / tile_w;
        let oy = (b.ymax - mb.ymax) / tile_h;
        if (ox - ox.round()).abs() > EPSILON || (oy - oy.round()).abs() > EPSILON {
            warn!("mosaic tiles do not sit on a regular lattice, skipping mirror padding");
            return Vec::new();
        }
        cells.insert((ox.round() as i64, oy.round() as i64), Arc::clone(member));
    }

    let nx = (b.width() / tile_w).round() as i64;
    let ny = (b.height() / tile_h).round() as i64;
    let mut mirrors: Vec<Arc<dyn Raster>> = Vec::new();
    let mut neighborless = 0u32;
    for j in -1..=ny {
        for i in -1..=nx {
            let corner = (i == -1 || i == nx) && (j == -1 || j == ny);
            if corner || cells.contains_key(&(i, j)) {
                continue;
            }
            let neighbors = [
                cells.get(&(i - 1, j)).cloned(),
                cells.get(&(i, j - 1)).cloned(),
                cells.get(&(i + 1, j)).cloned(),
                cells.get(&(i, j + 1)).cloned(),
            ];
            match MirrorImage::new(neighbors) {
                Ok(mirror) => mirrors.push(Arc::new(mirror)),
                Err(_) => neighborless += 1,
            }
        }
    }
    if neighborless > 0 {
        warn!(
            cells = neighborless,
            "empty mosaic cells have no neighbor to mirror, composing without them"
        );
    }
    debug!(count = mirrors.len(), "synthesized mirror tiles");
    mirrors
}

#[cfg(test)]
#[path = "../../tests/unit/compose/mirror.rs"]
mod tests;

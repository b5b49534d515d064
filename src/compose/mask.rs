use crate::compose::compound::CompoundImage;
use crate::foundation::geo::BoundingBox;
use crate::foundation::sample::{SampleBuffer, SampleFormat};
use crate::raster::image::Raster;

/// Coverage raster over a compound's grid.
///
/// Replays the compound's source selection with a flag per pixel: 255 where a
/// real member covers the pixel, 0 elsewhere. Padding members (the compound's
/// synthetic tail) do not count as coverage. Single channel, same sample
/// format as the compound so it can flow through the same resampler.
pub struct MaskImage {
    width: u32,
    height: u32,
    format: SampleFormat,
    bbox: BoundingBox,
    resx: f64,
    resy: f64,
    footprints: Vec<BoundingBox>,
}

impl MaskImage {
    /// Coverage of `compound`'s non-padding members.
    pub fn of(compound: &CompoundImage) -> Self {
        let real = compound.members().len() - compound.synthetic_tail();
        let footprints = compound.members()[..real]
            .iter()
            .map(|m| m.bbox())
            .collect();
        Self {
            width: compound.width(),
            height: compound.height(),
            format: compound.sample_format(),
            bbox: compound.bbox(),
            resx: compound.resx(),
            resy: compound.resy(),
            footprints,
        }
    }

    fn col_of(&self, x: f64) -> i64 {
        ((x - self.bbox.xmin) / self.resx).round() as i64
    }
}

impl Raster for MaskImage {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn channels(&self) -> u8 {
        1
    }

    fn sample_format(&self) -> SampleFormat {
        self.format
    }

    fn bbox(&self) -> BoundingBox {
        self.bbox
    }

    fn resx(&self) -> f64 {
        self.resx
    }

    fn resy(&self) -> f64 {
        self.resy
    }

    fn read_row(&self, row: u32, out: &mut SampleBuffer) {
        debug_assert!(row < self.height);
        debug_assert_eq!(out.len(), self.width as usize);
        out.fill_range(0, self.width as usize, 0.0);
        let y = self.bbox.ymax - (f64::from(row) + 0.5) * self.resy;
        for fp in &self.footprints {
            if y <= fp.ymin || y >= fp.ymax {
                continue;
            }
            let c0 = self.col_of(fp.xmin).max(0);
            let c1 = self.col_of(fp.xmax).min(i64::from(self.width));
            if c1 <= c0 {
                continue;
            }
            out.fill_range(c0 as usize, (c1 - c0) as usize, 255.0);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compose/mask.rs"]
mod tests;

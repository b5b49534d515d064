use std::sync::Arc;

use crate::foundation::error::{GridweaveError, GridweaveResult};
use crate::foundation::geo::BoundingBox;
use crate::foundation::sample::{SampleBuffer, SampleFormat};
use crate::raster::image::Raster;
use crate::resample::kernel::Kernel;

/// Separable kernel resampling of a source raster onto a target grid.
///
/// The produced extent is the kernel-valid part of the source: each side of
/// the source bbox moves inward by `support × source resolution` so every
/// output pixel's window reads real samples, then the result is intersected
/// with the requested target extent and snapped onto the target lattice.
/// Construction fails when nothing remains, which the orchestrator treats as
/// "this pack cannot contribute".
///
/// Each `read_row` call runs the vertical window over freshly pulled source
/// rows and a horizontal pass per output column, accumulating in f64.
pub struct ResampledImage {
    source: Arc<dyn Raster>,
    kernel: Kernel,
    width: u32,
    height: u32,
    bbox: BoundingBox,
    resx: f64,
    resy: f64,
    ratio_x: f64,
    ratio_y: f64,
    off_x: f64,
    off_y: f64,
}

impl ResampledImage {
    /// Resample `source` onto the lattice of `target` with resolution
    /// `(resx, resy)`, clipped as described on the type.
    pub fn new(
        source: Arc<dyn Raster>,
        target: BoundingBox,
        resx: f64,
        resy: f64,
        kernel: Kernel,
    ) -> GridweaveResult<Self> {
        target.validate()?;
        if resx <= 0.0 || resy <= 0.0 {
            return Err(GridweaveError::validation(format!(
                "target resolution must be strictly positive, got {resx}x{resy}"
            )));
        }
        let sb = source.bbox();
        let ratio_x = resx / source.resx();
        let ratio_y = resy / source.resy();
        let margin_x = kernel.support(ratio_x) * source.resx();
        let margin_y = kernel.support(ratio_y) * source.resy();

        let vxmin = sb.xmin + margin_x;
        let vxmax = sb.xmax - margin_x;
        let vymin = sb.ymin + margin_y;
        let vymax = sb.ymax - margin_y;
        if vxmax < target.xmin || vxmin > target.xmax || vymax < target.ymin || vymin > target.ymax
        {
            return Err(GridweaveError::geometry(
                "resampled extent does not intersect the target extent",
            ));
        }

        // Snap onto the target lattice. The 0.1-pixel slack keeps edges that
        // already sit on the lattice from drifting by a full pixel.
        let snap_floor = |v: f64, origin: f64, res: f64| {
            ((v - origin) / res + 0.1).floor() * res + origin
        };
        let snap_ceil = |v: f64, origin: f64, res: f64| {
            ((v - origin) / res - 0.1).ceil() * res + origin
        };
        let xmin = snap_floor(vxmin.max(target.xmin), target.xmin, resx);
        let xmax = snap_ceil(vxmax.min(target.xmax), target.xmin, resx);
        let ymin = snap_floor(vymin.max(target.ymin), target.ymin, resy);
        let ymax = snap_ceil(vymax.min(target.ymax), target.ymin, resy);

        let width = ((xmax - xmin) / resx + 0.1).floor() as i64;
        let height = ((ymax - ymin) / resy + 0.1).floor() as i64;
        if width < 1 || height < 1 {
            return Err(GridweaveError::geometry(
                "resampled extent does not intersect the target extent",
            ));
        }
        if width > i64::from(u32::MAX) || height > i64::from(u32::MAX) {
            return Err(GridweaveError::geometry(format!(
                "resampled extent of {width}x{height} pixel(s) is out of range"
            )));
        }

        let off_x = (xmin - sb.xmin) / source.resx();
        let off_y = (sb.ymax - ymax) / source.resy();
        Ok(Self {
            source,
            kernel,
            width: width as u32,
            height: height as u32,
            bbox: BoundingBox::new(xmin, ymin, xmax, ymax),
            resx,
            resy,
            ratio_x,
            ratio_y,
            off_x,
            off_y,
        })
    }
}

impl std::fmt::Debug for ResampledImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResampledImage")
            .field("kernel", &self.kernel)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bbox", &self.bbox)
            .field("resx", &self.resx)
            .field("resy", &self.resy)
            .field("ratio_x", &self.ratio_x)
            .field("ratio_y", &self.ratio_y)
            .field("off_x", &self.off_x)
            .field("off_y", &self.off_y)
            .finish_non_exhaustive()
    }
}

impl Raster for ResampledImage {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn channels(&self) -> u8 {
        self.source.channels()
    }

    fn sample_format(&self) -> SampleFormat {
        self.source.sample_format()
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
        let ch = usize::from(self.source.channels());
        debug_assert_eq!(out.len(), self.width as usize * ch);

        let src_w = self.source.width() as usize;
        let last_col = i64::from(self.source.width()) - 1;
        let last_row = i64::from(self.source.height()) - 1;

        let cy = self.off_y + (f64::from(row) + 0.5) * self.ratio_y - 0.5;
        let (row_first, row_weights) = self.kernel.weights(cy, self.ratio_y, self.source.height());

        // Horizontal windows are the same for every output row; they are
        // rebuilt per call so rows stay independent.
        let columns: Vec<(i64, Vec<f64>)> = (0..self.width)
            .map(|x| {
                let cx = self.off_x + (f64::from(x) + 0.5) * self.ratio_x - 0.5;
                self.kernel.weights(cx, self.ratio_x, self.source.width())
            })
            .collect();

        let mut acc = vec![0.0f64; self.width as usize * ch];
        let mut line = SampleBuffer::zeroed(self.source.sample_format(), src_w * ch);
        for (dy, wy) in row_weights.iter().enumerate() {
            let src_row = (row_first + dy as i64).clamp(0, last_row) as u32;
            self.source.read_row(src_row, &mut line);
            for (x, (col_first, col_weights)) in columns.iter().enumerate() {
                let base = x * ch;
                for (dx, wx) in col_weights.iter().enumerate() {
                    let src_col = (col_first + dx as i64).clamp(0, last_col) as usize;
                    let w = wy * wx;
                    for c in 0..ch {
                        acc[base + c] += w * line.get(src_col * ch + c);
                    }
                }
            }
        }
        for (i, v) in acc.iter().enumerate() {
            out.set(i, *v);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/resample/image.rs"]
mod tests;

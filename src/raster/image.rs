use crate::foundation::geo::{BoundingBox, approx_eq, grid_phase};
use crate::foundation::sample::{SampleBuffer, SampleFormat};

/// Demand-driven row producer over a georeferenced pixel grid.
///
/// Implementations are pure: [`Raster::read_row`] is a function of
/// `(self, row)` with no caching and no interior mutability, so rows may be
/// pulled in any order and from multiple threads at once. Composite images
/// hold their constituents as `Arc<dyn Raster>` and recompute every row they
/// are asked for from their constituents' rows.
pub trait Raster: Send + Sync {
    /// Pixel columns.
    fn width(&self) -> u32;
    /// Pixel rows.
    fn height(&self) -> u32;
    /// Interleaved samples per pixel.
    fn channels(&self) -> u8;
    /// Storage type of every sample.
    fn sample_format(&self) -> SampleFormat;
    /// Georeferenced extent. Row 0 touches `ymax`, column 0 touches `xmin`.
    fn bbox(&self) -> BoundingBox;

    /// Horizontal ground size of one pixel.
    fn resx(&self) -> f64 {
        self.bbox().width() / f64::from(self.width())
    }

    /// Vertical ground size of one pixel.
    fn resy(&self) -> f64 {
        self.bbox().height() / f64::from(self.height())
    }

    /// Produce one row of `width() × channels()` interleaved samples into
    /// `out`, which must match that length and the raster's format.
    ///
    /// Rows are recomputed on every call. Out-of-range rows and mis-sized
    /// buffers are programming errors, checked by debug assertions.
    fn read_row(&self, row: u32, out: &mut SampleBuffer);
}

/// Ground y of the pixel centers in `row`.
pub fn row_center_y(image: &dyn Raster, row: u32) -> f64 {
    image.bbox().ymax - (f64::from(row) + 0.5) * image.resy()
}

/// Row whose pixel centers sit at ground `y`. Rounds after division, which
/// recovers the exact index for grids aligned within tolerance.
pub fn row_of_y(image: &dyn Raster, y: f64) -> i64 {
    ((image.bbox().ymax - y) / image.resy() - 0.5).round() as i64
}

/// Column boundary index of ground `x`: column `c` spans
/// `[xmin + c·resx, xmin + (c+1)·resx]`.
pub fn col_of_x(image: &dyn Raster, x: f64) -> i64 {
    ((x - image.bbox().xmin) / image.resx()).round() as i64
}

/// Horizontal grid phase of the left edge, in `[0, 1)`.
pub fn phase_x(image: &dyn Raster) -> f64 {
    grid_phase(image.bbox().xmin, image.resx())
}

/// Vertical grid phase of the top edge, in `[0, 1)`.
pub fn phase_y(image: &dyn Raster) -> f64 {
    grid_phase(image.bbox().ymax, image.resy())
}

/// True when two rasters share resolutions and phases within tolerance, so
/// one can composite into the other without resampling.
pub fn is_aligned(a: &dyn Raster, b: &dyn Raster) -> bool {
    approx_eq(a.resx(), b.resx())
        && approx_eq(a.resy(), b.resy())
        && approx_eq(phase_x(a), phase_x(b))
        && approx_eq(phase_y(a), phase_y(b))
}

#[cfg(test)]
#[path = "../../tests/unit/raster/image.rs"]
mod tests;

use crate::foundation::error::{GridweaveError, GridweaveResult};
use crate::foundation::geo::BoundingBox;
use crate::foundation::sample::{SampleBuffer, SampleFormat};
use crate::raster::image::Raster;

/// Fully materialized raster.
///
/// The engine itself never materializes images; this is the leaf type used at
/// codec boundaries (decoded source files) and in tests.
#[derive(Clone, Debug)]
pub struct MemoryRaster {
    width: u32,
    height: u32,
    channels: u8,
    bbox: BoundingBox,
    samples: SampleBuffer,
}

impl MemoryRaster {
    /// Wrap owned samples. `samples` must hold exactly
    /// `width × height × channels` entries, row-major, top row first.
    pub fn new(
        width: u32,
        height: u32,
        channels: u8,
        bbox: BoundingBox,
        samples: SampleBuffer,
    ) -> GridweaveResult<Self> {
        if width == 0 || height == 0 {
            return Err(GridweaveError::validation(format!(
                "raster dimensions must be at least 1x1, got {width}x{height}"
            )));
        }
        if channels == 0 {
            return Err(GridweaveError::validation(
                "raster must have at least one channel",
            ));
        }
        bbox.validate()?;
        let expected = width as usize * height as usize * usize::from(channels);
        if samples.len() != expected {
            return Err(GridweaveError::validation(format!(
                "raster of {width}x{height}x{channels} needs {expected} samples, got {}",
                samples.len()
            )));
        }
        Ok(Self {
            width,
            height,
            channels,
            bbox,
            samples,
        })
    }

    /// Build a raster filled with one per-channel pixel value.
    pub fn filled(
        width: u32,
        height: u32,
        bbox: BoundingBox,
        format: SampleFormat,
        pixel: &[f64],
    ) -> GridweaveResult<Self> {
        if pixel.is_empty() {
            return Err(GridweaveError::validation(
                "fill pixel must have at least one channel",
            ));
        }
        let channels = u8::try_from(pixel.len()).map_err(|_| {
            GridweaveError::validation(format!("{} channels do not fit a raster", pixel.len()))
        })?;
        let mut samples =
            SampleBuffer::zeroed(format, width as usize * height as usize * pixel.len());
        samples.fill_pattern(pixel);
        Self::new(width, height, channels, bbox, samples)
    }

    /// Borrow the backing samples.
    pub fn samples(&self) -> &SampleBuffer {
        &self.samples
    }
}

impl Raster for MemoryRaster {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn channels(&self) -> u8 {
        self.channels
    }

    fn sample_format(&self) -> SampleFormat {
        self.samples.format()
    }

    fn bbox(&self) -> BoundingBox {
        self.bbox
    }

    fn read_row(&self, row: u32, out: &mut SampleBuffer) {
        debug_assert!(row < self.height);
        let stride = self.width as usize * usize::from(self.channels);
        debug_assert_eq!(out.len(), stride);
        out.copy_range(0, &self.samples, row as usize * stride, stride);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/raster/memory.rs"]
mod tests;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::foundation::error::{GridweaveError, GridweaveResult};
use crate::foundation::geo::{BoundingBox, approx_eq, grid_phase};
use crate::foundation::sample::{NodataColor, SampleFormat};
use crate::raster::image::{Raster, phase_x, phase_y};
use crate::resample::kernel::{Kernel, parse_kernel};

/// Output grid of a merge: extent plus pixel dimensions.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputGrid {
    /// Georeferenced extent of the output.
    pub bbox: BoundingBox,
    /// Pixel columns.
    pub width: u32,
    /// Pixel rows.
    pub height: u32,
}

impl OutputGrid {
    /// Horizontal ground size of one output pixel.
    pub fn resx(&self) -> f64 {
        self.bbox.width() / f64::from(self.width)
    }

    /// Vertical ground size of one output pixel.
    pub fn resy(&self) -> f64 {
        self.bbox.height() / f64::from(self.height)
    }

    /// True when `image` sits on this grid: resolutions and phases agree
    /// within tolerance, so it composites without resampling.
    pub fn aligned_with(&self, image: &dyn Raster) -> bool {
        approx_eq(self.resx(), image.resx())
            && approx_eq(self.resy(), image.resy())
            && approx_eq(grid_phase(self.bbox.xmin, self.resx()), phase_x(image))
            && approx_eq(grid_phase(self.bbox.ymax, self.resy()), phase_y(image))
    }

    /// Reject degenerate grids.
    pub fn validate(&self) -> GridweaveResult<()> {
        self.bbox.validate()?;
        if self.width == 0 || self.height == 0 {
            return Err(GridweaveError::validation(format!(
                "output grid must be at least 1x1, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

/// Engine-facing merge parameters: the output grid plus pixel semantics.
#[derive(Clone, Debug)]
pub struct MergeRequest {
    /// Grid the merge produces.
    pub output: OutputGrid,
    /// Kernel used wherever a pack needs resampling.
    pub kernel: Kernel,
    /// Fill color for pixels no input covers.
    pub nodata: NodataColor,
    /// Samples per pixel shared by the output and every input.
    pub channels: u8,
    /// Storage type shared by the output and every input.
    pub sample_format: SampleFormat,
}

impl MergeRequest {
    /// Reject incoherent parameters before any work starts.
    pub fn validate(&self) -> GridweaveResult<()> {
        self.output.validate()?;
        if !matches!(self.channels, 1 | 3 | 4) {
            return Err(GridweaveError::validation(format!(
                "channel count must be 1, 3, or 4, got {}",
                self.channels
            )));
        }
        self.nodata.validate(self.channels, self.sample_format)
    }
}

/// One input raster entry of a job: where to read it and where it sits.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceDescriptor {
    /// Path of the raster file.
    pub source: PathBuf,
    /// Georeferenced extent.
    pub bbox: BoundingBox,
    /// Horizontal ground size of one pixel.
    pub resx: f64,
    /// Vertical ground size of one pixel.
    pub resy: f64,
}

impl SourceDescriptor {
    /// Pixel columns implied by the extent and resolution.
    pub fn width(&self) -> u32 {
        (self.bbox.width() / self.resx).round() as u32
    }

    /// Pixel rows implied by the extent and resolution.
    pub fn height(&self) -> u32 {
        (self.bbox.height() / self.resy).round() as u32
    }

    /// Reject degenerate extents and resolutions.
    pub fn validate(&self) -> GridweaveResult<()> {
        self.bbox.validate()?;
        if !self.resx.is_finite() || !self.resy.is_finite() || self.resx <= 0.0 || self.resy <= 0.0
        {
            return Err(GridweaveError::validation(format!(
                "resolution must be strictly positive, got {}x{}",
                self.resx, self.resy
            )));
        }
        if self.width() == 0 || self.height() == 0 {
            return Err(GridweaveError::validation(format!(
                "extent {:?} spans less than one {}x{} pixel",
                self.bbox, self.resx, self.resy
            )));
        }
        Ok(())
    }
}

/// Where the merged raster goes and on which grid.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputDescriptor {
    /// Path of the file to write.
    pub source: PathBuf,
    /// Georeferenced extent of the output.
    pub bbox: BoundingBox,
    /// Pixel columns.
    pub width: u32,
    /// Pixel rows.
    pub height: u32,
}

impl OutputDescriptor {
    /// The grid part of the descriptor.
    pub fn grid(&self) -> OutputGrid {
        OutputGrid {
            bbox: self.bbox,
            width: self.width,
            height: self.height,
        }
    }
}

fn default_kernel() -> String {
    "lanczos".to_string()
}

fn default_nodata() -> NodataColor {
    NodataColor::new(vec![255.0, 255.0, 255.0])
}

fn default_channels() -> u8 {
    3
}

/// Declarative description of one merge run, deserialized from JSON.
///
/// ```json
/// {
///   "output": { "source": "out.png", "bbox": [0, 0, 200, 100], "width": 200, "height": 100 },
///   "inputs": [
///     { "source": "a.png", "bbox": [0, 0, 100, 100], "resx": 1.0, "resy": 1.0 },
///     { "source": "b.png", "bbox": [100, 0, 200, 100], "resx": 1.0, "resy": 1.0 }
///   ],
///   "kernel": "lanczos",
///   "nodata": "FFFFFF",
///   "channels": 3,
///   "sample_format": "uint8"
/// }
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MergeJob {
    /// Output file and grid.
    pub output: OutputDescriptor,
    /// Source rasters. List order sets compositing precedence among inputs
    /// of equal resolution (later wins).
    pub inputs: Vec<SourceDescriptor>,
    /// Kernel name, parsed case-insensitively with common aliases.
    #[serde(default = "default_kernel")]
    pub kernel: String,
    /// Fill color for uncovered pixels: hex string, decimal list, or array.
    #[serde(default = "default_nodata")]
    pub nodata: NodataColor,
    /// Samples per pixel, 1, 3, or 4.
    #[serde(default = "default_channels")]
    pub channels: u8,
    /// Storage type of every sample.
    #[serde(default)]
    pub sample_format: SampleFormat,
}

impl MergeJob {
    /// Check descriptor coherence and parameter validity, naming the
    /// offending entry in the error.
    pub fn validate(&self) -> GridweaveResult<()> {
        self.output.grid().validate()?;
        if self.inputs.is_empty() {
            return Err(GridweaveError::validation("job has no inputs"));
        }
        for (idx, input) in self.inputs.iter().enumerate() {
            input.validate().map_err(|e| {
                GridweaveError::validation(format!(
                    "input {idx} ({}): {e}",
                    input.source.display()
                ))
            })?;
        }
        parse_kernel(&self.kernel)?;
        if !matches!(self.channels, 1 | 3 | 4) {
            return Err(GridweaveError::validation(format!(
                "channel count must be 1, 3, or 4, got {}",
                self.channels
            )));
        }
        self.nodata.validate(self.channels, self.sample_format)
    }

    /// Engine-facing request built from the descriptors. Validates first.
    pub fn request(&self) -> GridweaveResult<MergeRequest> {
        self.validate()?;
        Ok(MergeRequest {
            output: self.output.grid(),
            kernel: parse_kernel(&self.kernel)?,
            nodata: self.nodata.clone(),
            channels: self.channels,
            sample_format: self.sample_format,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/merge/job.rs"]
mod tests;

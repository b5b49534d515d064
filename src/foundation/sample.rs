use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::foundation::error::{GridweaveError, GridweaveResult};

/// Storage type of every sample in a raster.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SampleFormat {
    /// 8-bit unsigned samples.
    #[default]
    #[serde(rename = "uint8", alias = "u8")]
    U8,
    /// 32-bit IEEE float samples.
    #[serde(rename = "float32", alias = "f32")]
    F32,
}

impl SampleFormat {
    /// Storage size of one sample.
    pub fn bytes_per_sample(self) -> usize {
        match self {
            SampleFormat::U8 => 1,
            SampleFormat::F32 => 4,
        }
    }
}

impl std::fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SampleFormat::U8 => f.write_str("uint8"),
            SampleFormat::F32 => f.write_str("float32"),
        }
    }
}

/// Parse a sample format name. Case-insensitive, `u8`/`f32` accepted as
/// shorthands.
pub fn parse_sample_format(name: &str) -> GridweaveResult<SampleFormat> {
    match name.trim().to_ascii_lowercase().as_str() {
        "uint8" | "u8" => Ok(SampleFormat::U8),
        "float32" | "f32" => Ok(SampleFormat::F32),
        other => Err(GridweaveError::validation(format!(
            "unknown sample format '{other}' (expected uint8 or float32)"
        ))),
    }
}

fn clamp_u8(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// One row of interleaved samples in a concrete storage format.
///
/// Format-generic code goes through the f64 accessors; bulk moves between
/// same-format buffers go through [`SampleBuffer::copy_range`].
#[derive(Clone, Debug, PartialEq)]
pub enum SampleBuffer {
    /// 8-bit unsigned samples.
    U8(Vec<u8>),
    /// 32-bit IEEE float samples.
    F32(Vec<f32>),
}

impl SampleBuffer {
    /// Allocate `len` zeroed samples of the given format.
    pub fn zeroed(format: SampleFormat, len: usize) -> Self {
        match format {
            SampleFormat::U8 => SampleBuffer::U8(vec![0; len]),
            SampleFormat::F32 => SampleBuffer::F32(vec![0.0; len]),
        }
    }

    /// Storage format of this buffer.
    pub fn format(&self) -> SampleFormat {
        match self {
            SampleBuffer::U8(_) => SampleFormat::U8,
            SampleBuffer::F32(_) => SampleFormat::F32,
        }
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        match self {
            SampleBuffer::U8(d) => d.len(),
            SampleBuffer::F32(d) => d.len(),
        }
    }

    /// True when the buffer holds no samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read one sample widened to f64.
    pub fn get(&self, idx: usize) -> f64 {
        match self {
            SampleBuffer::U8(d) => f64::from(d[idx]),
            SampleBuffer::F32(d) => f64::from(d[idx]),
        }
    }

    /// Write one sample. U8 buffers round and saturate to `0..=255`.
    pub fn set(&mut self, idx: usize, value: f64) {
        match self {
            SampleBuffer::U8(d) => d[idx] = clamp_u8(value),
            SampleBuffer::F32(d) => d[idx] = value as f32,
        }
    }

    /// Copy `len` samples from `src` starting at `src_start` into `self` at
    /// `dst_start`. Both buffers must share a format.
    pub fn copy_range(&mut self, dst_start: usize, src: &SampleBuffer, src_start: usize, len: usize) {
        debug_assert_eq!(self.format(), src.format(), "copy_range across formats");
        match (self, src) {
            (SampleBuffer::U8(d), SampleBuffer::U8(s)) => {
                d[dst_start..dst_start + len].copy_from_slice(&s[src_start..src_start + len]);
            }
            (SampleBuffer::F32(d), SampleBuffer::F32(s)) => {
                d[dst_start..dst_start + len].copy_from_slice(&s[src_start..src_start + len]);
            }
            _ => {}
        }
    }

    /// Fill the whole buffer by repeating a per-channel pattern. The buffer
    /// length must be a multiple of the pattern length.
    pub fn fill_pattern(&mut self, pattern: &[f64]) {
        debug_assert!(!pattern.is_empty());
        debug_assert_eq!(self.len() % pattern.len(), 0);
        match self {
            SampleBuffer::U8(d) => {
                let px: Vec<u8> = pattern.iter().map(|v| clamp_u8(*v)).collect();
                for chunk in d.chunks_exact_mut(px.len()) {
                    chunk.copy_from_slice(&px);
                }
            }
            SampleBuffer::F32(d) => {
                let px: Vec<f32> = pattern.iter().map(|v| *v as f32).collect();
                for chunk in d.chunks_exact_mut(px.len()) {
                    chunk.copy_from_slice(&px);
                }
            }
        }
    }

    /// Write `value` into `len` consecutive samples starting at `start`.
    pub fn fill_range(&mut self, start: usize, len: usize, value: f64) {
        match self {
            SampleBuffer::U8(d) => d[start..start + len].fill(clamp_u8(value)),
            SampleBuffer::F32(d) => d[start..start + len].fill(value as f32),
        }
    }

    /// Reverse pixel order in place, keeping each pixel's channels interleaved.
    pub fn reverse_pixels(&mut self, channels: usize) {
        debug_assert!(channels > 0);
        debug_assert_eq!(self.len() % channels, 0);
        fn rev<T>(data: &mut [T], channels: usize) {
            let pixels = data.len() / channels;
            for p in 0..pixels / 2 {
                let (a, b) = (p * channels, (pixels - 1 - p) * channels);
                for c in 0..channels {
                    data.swap(a + c, b + c);
                }
            }
        }
        match self {
            SampleBuffer::U8(d) => rev(d, channels),
            SampleBuffer::F32(d) => rev(d, channels),
        }
    }

    /// Borrow the raw bytes of a U8 buffer.
    pub fn as_u8(&self) -> Option<&[u8]> {
        match self {
            SampleBuffer::U8(d) => Some(d),
            SampleBuffer::F32(_) => None,
        }
    }

    /// Borrow the raw samples of an F32 buffer.
    pub fn as_f32(&self) -> Option<&[f32]> {
        match self {
            SampleBuffer::F32(d) => Some(d),
            SampleBuffer::U8(_) => None,
        }
    }
}

/// Per-channel fill color for pixels no input covers.
///
/// Accepts three spellings in job descriptors: a hex string with two digits
/// per channel (`"FFFFFF"`), a comma-separated decimal list (`"255,255,255"`),
/// or a JSON array of numbers. Serializes as the array form.
#[derive(Clone, Debug, PartialEq)]
pub struct NodataColor {
    values: Vec<f64>,
}

impl NodataColor {
    /// Wrap explicit per-channel values.
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    /// Parse a hex string, two digits per channel (`"CC00CC"` is magenta).
    pub fn from_hex(text: &str) -> GridweaveResult<Self> {
        let text = text.trim();
        if text.is_empty() || text.len() % 2 != 0 {
            return Err(GridweaveError::validation(format!(
                "nodata hex string must have two digits per channel, got '{text}'"
            )));
        }
        let digits: Vec<u32> = text
            .chars()
            .map(|c| {
                c.to_digit(16).ok_or_else(|| {
                    GridweaveError::validation(format!(
                        "nodata hex string contains non-hex character '{c}'"
                    ))
                })
            })
            .collect::<GridweaveResult<_>>()?;
        let values = digits
            .chunks_exact(2)
            .map(|pair| f64::from(pair[0] * 16 + pair[1]))
            .collect();
        Ok(Self { values })
    }

    /// Parse a comma-separated decimal list (`"255,255,255"`).
    pub fn from_list(text: &str) -> GridweaveResult<Self> {
        let values = text
            .split(',')
            .map(|part| {
                part.trim().parse::<f64>().map_err(|_| {
                    GridweaveError::validation(format!(
                        "nodata list entry '{}' is not a number",
                        part.trim()
                    ))
                })
            })
            .collect::<GridweaveResult<Vec<f64>>>()?;
        Ok(Self { values })
    }

    /// Parse either spelling: a comma means a decimal list, otherwise hex.
    pub fn parse(text: &str) -> GridweaveResult<Self> {
        if text.contains(',') {
            Self::from_list(text)
        } else {
            Self::from_hex(text)
        }
    }

    /// Per-channel values.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of channels the color describes.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when no channel values are present.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Check the color against a pipeline's channel count and sample format.
    pub fn validate(&self, channels: u8, format: SampleFormat) -> GridweaveResult<()> {
        if self.values.len() != usize::from(channels) {
            return Err(GridweaveError::validation(format!(
                "nodata color has {} channel(s), the job has {channels}",
                self.values.len()
            )));
        }
        if format == SampleFormat::U8 {
            for v in &self.values {
                if *v < 0.0 || *v > 255.0 || v.fract() != 0.0 {
                    return Err(GridweaveError::validation(format!(
                        "nodata value {v} does not fit uint8 samples"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Fill a row buffer with this color repeated per pixel.
    pub fn fill(&self, buffer: &mut SampleBuffer) {
        buffer.fill_pattern(&self.values);
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NodataRepr {
    Text(String),
    Values(Vec<f64>),
}

impl<'de> Deserialize<'de> for NodataColor {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match NodataRepr::deserialize(deserializer)? {
            NodataRepr::Text(text) => NodataColor::parse(&text).map_err(D::Error::custom),
            NodataRepr::Values(values) => Ok(NodataColor::new(values)),
        }
    }
}

impl Serialize for NodataColor {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.values.serialize(serializer)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/sample.rs"]
mod tests;

use crate::foundation::error::{GridweaveError, GridweaveResult};

/// Separable interpolation kernels available to the resampler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Kernel {
    /// Picks the single nearest source pixel.
    NearestNeighbour,
    /// Triangle filter over a 2-pixel window.
    Linear,
    /// Catmull-Rom cubic over a 4-pixel window.
    Cubic,
    /// Lanczos windowed sinc over a 6-pixel window.
    Lanczos3,
}

/// Parse a kernel name. Case-insensitive, common aliases accepted.
pub fn parse_kernel(name: &str) -> GridweaveResult<Kernel> {
    match name.trim().to_ascii_lowercase().as_str() {
        "nearest" | "nn" | "nearest_neighbour" | "nearest_neighbor" => {
            Ok(Kernel::NearestNeighbour)
        }
        "linear" | "bilinear" => Ok(Kernel::Linear),
        "cubic" | "bicubic" => Ok(Kernel::Cubic),
        "lanczos" | "lanczos3" => Ok(Kernel::Lanczos3),
        other => Err(GridweaveError::validation(format!(
            "unknown kernel '{other}' (expected nearest, linear, cubic, or lanczos)"
        ))),
    }
}

impl Kernel {
    /// Half-width of the kernel at ratio 1, in source pixels.
    pub fn base_support(self) -> f64 {
        match self {
            Kernel::NearestNeighbour => 0.5,
            Kernel::Linear => 1.0,
            Kernel::Cubic => 2.0,
            Kernel::Lanczos3 => 3.0,
        }
    }

    /// Half-width in source pixels at a target/source resolution ratio.
    /// Downsampling (ratio above 1) widens the window proportionally.
    pub fn support(self, ratio: f64) -> f64 {
        self.base_support() * ratio.max(1.0)
    }

    fn weight_at(self, d: f64) -> f64 {
        let x = d.abs();
        match self {
            Kernel::NearestNeighbour => {
                if x < 0.5 {
                    1.0
                } else {
                    0.0
                }
            }
            Kernel::Linear => {
                if x < 1.0 {
                    1.0 - x
                } else {
                    0.0
                }
            }
            // Catmull-Rom (a = -0.5).
            Kernel::Cubic => {
                if x < 1.0 {
                    ((1.5 * x - 2.5) * x) * x + 1.0
                } else if x < 2.0 {
                    ((-0.5 * x + 2.5) * x - 4.0) * x + 2.0
                } else {
                    0.0
                }
            }
            Kernel::Lanczos3 => {
                if x < 1e-8 {
                    1.0
                } else if x >= 3.0 {
                    0.0
                } else {
                    let pix = std::f64::consts::PI * x;
                    3.0 * pix.sin() * (pix / 3.0).sin() / (pix * pix)
                }
            }
        }
    }

    /// Source window for one output coordinate: the first source index and
    /// the normalized weight of every index in the window.
    ///
    /// `center` is the output pixel's position in source index space; `ratio`
    /// above 1 compresses distances so the widened window still spans the
    /// kernel's profile. Window indices may fall outside `0..src_len`; the
    /// sampler clamps taps to the edge.
    pub fn weights(self, center: f64, ratio: f64, src_len: u32) -> (i64, Vec<f64>) {
        let max_index = f64::from(src_len.saturating_sub(1));
        let nearest = || (center.round().clamp(0.0, max_index) as i64, vec![1.0]);
        if self == Kernel::NearestNeighbour {
            return nearest();
        }

        let scale = ratio.max(1.0);
        let support = self.base_support() * scale;
        let first = (center - support).ceil() as i64;
        let last = (center + support).floor() as i64;
        if last < first {
            return nearest();
        }

        let mut weights = Vec::with_capacity((last - first + 1) as usize);
        let mut total = 0.0;
        for i in first..=last {
            let w = self.weight_at((i as f64 - center) / scale);
            weights.push(w);
            total += w;
        }
        if total.abs() < 1e-10 {
            return nearest();
        }
        for w in &mut weights {
            *w /= total;
        }
        (first, weights)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/resample/kernel.rs"]
mod tests;

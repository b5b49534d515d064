use std::sync::Arc;

use crate::foundation::error::{GridweaveError, GridweaveResult};
use crate::foundation::geo::{BoundingBox, approx_eq, grid_phase};
use crate::foundation::sample::{NodataColor, SampleBuffer, SampleFormat};
use crate::raster::image::{Raster, is_aligned, phase_x, phase_y, row_of_y};

/// Positional mosaic of aligned members over one grid.
///
/// Members composite in list order: later members overwrite earlier ones where
/// their footprints overlap, and pixels no member covers hold the nodata
/// color. Every member must sit on the compound's grid (same resolutions and
/// phases within tolerance); anything else needs resampling first.
///
/// Two construction forms exist. [`CompoundImage::new`] spans the union of
/// member extents and is used per pack. [`CompoundImage::with_masks`] runs on
/// an explicit output grid and gates each member behind a coverage mask; the
/// final merge uses it so a member's nodata-filled but covered pixels cannot
/// clobber valid samples underneath.
pub struct CompoundImage {
    width: u32,
    height: u32,
    channels: u8,
    format: SampleFormat,
    bbox: BoundingBox,
    resx: f64,
    resy: f64,
    members: Vec<Arc<dyn Raster>>,
    masks: Option<Vec<Arc<dyn Raster>>>,
    synthetic_tail: usize,
    nodata: NodataColor,
}

impl CompoundImage {
    /// Mosaic over the union extent of `members`.
    ///
    /// The final `synthetic_tail` members are padding (mirrors): they
    /// composite like any member but are excluded from coverage masks.
    pub fn new(
        members: Vec<Arc<dyn Raster>>,
        nodata: NodataColor,
        synthetic_tail: usize,
    ) -> GridweaveResult<Self> {
        let first = members.first().ok_or_else(|| {
            GridweaveError::validation("compound image requires at least one member")
        })?;
        if synthetic_tail > members.len() {
            return Err(GridweaveError::validation(format!(
                "synthetic tail of {synthetic_tail} exceeds {} member(s)",
                members.len()
            )));
        }
        let channels = first.channels();
        let format = first.sample_format();
        let (resx, resy) = (first.resx(), first.resy());
        nodata.validate(channels, format)?;

        let mut bbox = first.bbox();
        for (idx, member) in members.iter().enumerate() {
            check_member(idx, member.as_ref(), channels, format)?;
            if !is_aligned(first.as_ref(), member.as_ref()) {
                return Err(GridweaveError::geometry(format!(
                    "member {idx} is not aligned with the compound grid \
                     (res {:.6}x{:.6} phase {:.6}/{:.6}, expected res {resx:.6}x{resy:.6})",
                    member.resx(),
                    member.resy(),
                    phase_x(member.as_ref()),
                    phase_y(member.as_ref()),
                )));
            }
            bbox = bbox.union(&member.bbox());
        }

        let width = dimension(bbox.width(), resx, "width")?;
        let height = dimension(bbox.height(), resy, "height")?;
        Ok(Self {
            width,
            height,
            channels,
            format,
            bbox,
            resx,
            resy,
            members,
            masks: None,
            synthetic_tail,
            nodata,
        })
    }

    /// Mask-gated mosaic on an explicit grid.
    ///
    /// `masks[i]` is a single-channel coverage raster over the same grid as
    /// `members[i]`; a member pixel is copied only where its mask sample is
    /// nonzero.
    pub fn with_masks(
        members: Vec<Arc<dyn Raster>>,
        masks: Vec<Arc<dyn Raster>>,
        bbox: BoundingBox,
        width: u32,
        height: u32,
        nodata: NodataColor,
    ) -> GridweaveResult<Self> {
        let first = members.first().ok_or_else(|| {
            GridweaveError::validation("compound image requires at least one member")
        })?;
        if masks.len() != members.len() {
            return Err(GridweaveError::validation(format!(
                "{} member(s) but {} mask(s)",
                members.len(),
                masks.len()
            )));
        }
        if width == 0 || height == 0 {
            return Err(GridweaveError::validation(format!(
                "output grid must be at least 1x1, got {width}x{height}"
            )));
        }
        bbox.validate()?;
        let channels = first.channels();
        let format = first.sample_format();
        nodata.validate(channels, format)?;
        let resx = bbox.width() / f64::from(width);
        let resy = bbox.height() / f64::from(height);

        for (idx, member) in members.iter().enumerate() {
            check_member(idx, member.as_ref(), channels, format)?;
            if !approx_eq(member.resx(), resx)
                || !approx_eq(member.resy(), resy)
                || !approx_eq(phase_x(member.as_ref()), grid_phase(bbox.xmin, resx))
                || !approx_eq(phase_y(member.as_ref()), grid_phase(bbox.ymax, resy))
            {
                return Err(GridweaveError::geometry(format!(
                    "member {idx} is not aligned with the output grid \
                     (res {:.6}x{:.6}, expected {resx:.6}x{resy:.6})",
                    member.resx(),
                    member.resy(),
                )));
            }
            let mask = &masks[idx];
            if mask.width() != member.width()
                || mask.height() != member.height()
                || mask.channels() != 1
                || mask.sample_format() != format
            {
                return Err(GridweaveError::geometry(format!(
                    "mask {idx} does not match its member: {}x{} with {} channel(s), \
                     member is {}x{}",
                    mask.width(),
                    mask.height(),
                    mask.channels(),
                    member.width(),
                    member.height(),
                )));
            }
        }

        Ok(Self {
            width,
            height,
            channels,
            format,
            bbox,
            resx,
            resy,
            members,
            masks: Some(masks),
            synthetic_tail: 0,
            nodata,
        })
    }

    /// Members in compositing order.
    pub fn members(&self) -> &[Arc<dyn Raster>] {
        &self.members
    }

    /// Number of trailing padding members excluded from coverage masks.
    pub fn synthetic_tail(&self) -> usize {
        self.synthetic_tail
    }

    /// Fill color for uncovered pixels.
    pub fn nodata(&self) -> &NodataColor {
        &self.nodata
    }

    fn col_of(&self, x: f64) -> i64 {
        ((x - self.bbox.xmin) / self.resx).round() as i64
    }
}

impl std::fmt::Debug for CompoundImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompoundImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("channels", &self.channels)
            .field("format", &self.format)
            .field("bbox", &self.bbox)
            .field("resx", &self.resx)
            .field("resy", &self.resy)
            .field("members", &self.members.len())
            .field("masks", &self.masks.as_ref().map(Vec::len))
            .field("synthetic_tail", &self.synthetic_tail)
            .field("nodata", &self.nodata)
            .finish()
    }
}

fn check_member(
    idx: usize,
    member: &dyn Raster,
    channels: u8,
    format: SampleFormat,
) -> GridweaveResult<()> {
    if member.channels() != channels {
        return Err(GridweaveError::geometry(format!(
            "member {idx} has {} channel(s), the compound has {channels}",
            member.channels()
        )));
    }
    if member.sample_format() != format {
        return Err(GridweaveError::geometry(format!(
            "member {idx} holds {} samples, the compound holds {format}",
            member.sample_format()
        )));
    }
    Ok(())
}

fn dimension(extent: f64, res: f64, axis: &str) -> GridweaveResult<u32> {
    let pixels = (extent / res).round();
    if pixels < 1.0 || pixels > f64::from(u32::MAX) {
        return Err(GridweaveError::geometry(format!(
            "compound {axis} of {pixels} pixel(s) is out of range"
        )));
    }
    Ok(pixels as u32)
}

impl Raster for CompoundImage {
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
        let ch = usize::from(self.channels);
        debug_assert_eq!(out.len(), self.width as usize * ch);
        debug_assert_eq!(out.format(), self.format);

        self.nodata.fill(out);
        let y = self.bbox.ymax - (f64::from(row) + 0.5) * self.resy;

        for (idx, member) in self.members.iter().enumerate() {
            let mb = member.bbox();
            if y <= mb.ymin || y >= mb.ymax {
                continue;
            }
            let c0 = self.col_of(mb.xmin).max(0);
            let c1 = self.col_of(mb.xmax).min(i64::from(self.width));
            if c1 <= c0 {
                continue;
            }
            let src_c0 = (c0 - self.col_of(mb.xmin)) as usize;
            let member_row = row_of_y(member.as_ref(), y)
                .clamp(0, i64::from(member.height()) - 1) as u32;
            let (c0, c1) = (c0 as usize, c1 as usize);

            let mut line =
                SampleBuffer::zeroed(self.format, member.width() as usize * ch);
            member.read_row(member_row, &mut line);

            match &self.masks {
                None => out.copy_range(c0 * ch, &line, src_c0 * ch, (c1 - c0) * ch),
                Some(masks) => {
                    let mask = &masks[idx];
                    let mut flags =
                        SampleBuffer::zeroed(self.format, mask.width() as usize);
                    mask.read_row(member_row, &mut flags);
                    for c in 0..(c1 - c0) {
                        if flags.get(src_c0 + c) > 0.0 {
                            out.copy_range((c0 + c) * ch, &line, (src_c0 + c) * ch, ch);
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compose/compound.rs"]
mod tests;

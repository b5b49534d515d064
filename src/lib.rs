//! Gridweave merges georeferenced rasters of mixed resolutions and extents
//! into a single output raster on a caller-chosen grid.
//!
//! # Pipeline overview
//!
//! 1. **Validate**: every input must share the output's channel count and
//!    sample format ([`merge`] rejects anything else up front).
//! 2. **Partition**: inputs group into packs of equal resolution
//!    ([`partition_packs`]).
//! 3. **Composite per pack**: each pack becomes a positional
//!    [`CompoundImage`]. Packs already sitting on the output grid pass
//!    through; the rest are padded with [`MirrorImage`] tiles and pulled
//!    through a [`ResampledImage`] with the job's [`Kernel`].
//! 4. **Merge**: a mask-gated compound on the exact output grid, prefilled
//!    with the nodata color, combines the surviving packs.
//! 5. **Stream**: [`stream_rows`] drains the result row by row into a
//!    [`RowSink`] (sequentially or chunked across a thread pool).
//!
//! The key design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Demand-driven**: every image computes rows on request and caches
//!   nothing; a row's cost is exactly the source rows it pulls.
//! - **Pure rows**: [`Raster::read_row`] is a function of `(self, row)`, so
//!   rows parallelize without locks as long as the consumer sees them in
//!   order.
//! - **No codecs in the core**: the engine reads and writes samples, never
//!   files; the `gridweave` binary decodes and encodes at the boundary.
#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![allow(missing_docs_in_private_items)]

mod compose;
mod encode;
mod foundation;
mod merge;
mod raster;
mod resample;

pub use compose::compound::CompoundImage;
pub use compose::mask::MaskImage;
pub use compose::mirror::{MirrorImage, pad_with_mirrors};
pub use encode::stream::{RowSink, StreamOptions, StreamStats, stream_rows};
pub use foundation::error::{GridweaveError, GridweaveResult};
pub use foundation::geo::{BoundingBox, EPSILON, approx_eq, grid_phase};
pub use foundation::sample::{NodataColor, SampleBuffer, SampleFormat, parse_sample_format};
pub use merge::job::{MergeJob, MergeRequest, OutputDescriptor, OutputGrid, SourceDescriptor};
pub use merge::pack::partition_packs;
pub use merge::pipeline::merge;
pub use raster::image::{
    Raster, col_of_x, is_aligned, phase_x, phase_y, row_center_y, row_of_y,
};
pub use raster::memory::MemoryRaster;
pub use resample::image::ResampledImage;
pub use resample::kernel::{Kernel, parse_kernel};

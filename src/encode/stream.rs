use rayon::prelude::*;
use tracing::debug;

use crate::foundation::error::{GridweaveError, GridweaveResult};
use crate::foundation::sample::SampleBuffer;
use crate::raster::image::Raster;

/// Consumer of output rows.
///
/// [`stream_rows`] always delivers rows strictly in ascending order starting
/// at 0, whatever the threading configuration.
pub trait RowSink {
    /// Receive one finished row.
    fn write_row(&mut self, row: u32, samples: &SampleBuffer) -> GridweaveResult<()>;
}

/// Row production settings for [`stream_rows`].
#[derive(Clone, Debug)]
pub struct StreamOptions {
    /// Compute rows on a rayon pool instead of the calling thread.
    pub parallel: bool,
    /// Rows per parallel batch; 0 behaves as 1.
    pub chunk_rows: usize,
    /// Worker threads; `None` lets rayon decide.
    pub threads: Option<usize>,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            parallel: false,
            chunk_rows: 64,
            threads: None,
        }
    }
}

/// Counters reported by [`stream_rows`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StreamStats {
    /// Rows delivered to the sink.
    pub rows_total: u64,
    /// Parallel batches computed; 0 in sequential mode.
    pub chunks: u64,
}

/// Pull every row of `image` in order and hand each to `sink`.
///
/// In parallel mode rows are computed in chunks on a dedicated pool and
/// drained to the sink in index order, so the sink observes exactly the
/// sequence the sequential mode produces. Row purity makes the parallel
/// computation safe without locks or shared state.
#[tracing::instrument(
    skip(image, options, sink),
    fields(width = image.width(), height = image.height())
)]
pub fn stream_rows(
    image: &dyn Raster,
    options: &StreamOptions,
    sink: &mut dyn RowSink,
) -> GridweaveResult<StreamStats> {
    let height = image.height();
    let samples = image.width() as usize * usize::from(image.channels());
    let format = image.sample_format();
    let mut stats = StreamStats::default();

    if !options.parallel {
        let mut row_buf = SampleBuffer::zeroed(format, samples);
        for row in 0..height {
            image.read_row(row, &mut row_buf);
            sink.write_row(row, &row_buf)?;
            stats.rows_total += 1;
        }
        return Ok(stats);
    }

    let pool = build_thread_pool(options.threads)?;
    let chunk_rows = normalized_chunk_rows(options.chunk_rows);
    let mut start = 0u32;
    while start < height {
        let end = height.min(start.saturating_add(chunk_rows));
        let rows: Vec<SampleBuffer> = pool.install(|| {
            (start..end)
                .into_par_iter()
                .map(|row| {
                    let mut buf = SampleBuffer::zeroed(format, samples);
                    image.read_row(row, &mut buf);
                    buf
                })
                .collect()
        });
        for (offset, buf) in rows.iter().enumerate() {
            sink.write_row(start + offset as u32, buf)?;
        }
        stats.rows_total += u64::from(end - start);
        stats.chunks += 1;
        start = end;
    }
    debug!(rows = stats.rows_total, chunks = stats.chunks, "streamed all rows");
    Ok(stats)
}

fn build_thread_pool(threads: Option<usize>) -> GridweaveResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(GridweaveError::validation(
            "stream threading 'threads' must be >= 1 when set",
        ));
    }
    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| GridweaveError::Other(anyhow::anyhow!("failed to build thread pool: {e}")))
}

fn normalized_chunk_rows(chunk_rows: usize) -> u32 {
    if chunk_rows == 0 {
        1
    } else {
        u32::try_from(chunk_rows).unwrap_or(u32::MAX)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/stream.rs"]
mod tests;

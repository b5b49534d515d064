use std::fs::File;
use std::io::{BufWriter, Write as _};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Parser, Subcommand};

use gridweave::{
    BoundingBox, GridweaveError, GridweaveResult, MemoryRaster, MergeJob, NodataColor, Raster,
    RowSink, SampleBuffer, SampleFormat, SourceDescriptor, StreamOptions, merge,
    parse_sample_format, stream_rows,
};

#[derive(Parser, Debug)]
#[command(name = "gridweave", version)]
struct Cli {
    /// Log engine activity (pack decisions, drops) at debug level.
    #[arg(long, global = true, default_value_t = false)]
    log: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Merge the rasters of a job file onto its output grid.
    Merge(MergeArgs),
    /// Write a monochrome nodata tile.
    Nodata(NodataArgs),
}

#[derive(Parser, Debug)]
struct MergeArgs {
    /// Input job JSON. Source paths resolve relative to this file.
    #[arg(long)]
    job: PathBuf,

    /// Compute rows in parallel.
    #[arg(long, default_value_t = false)]
    parallel: bool,

    /// Override rayon worker threads (parallel mode only).
    #[arg(long)]
    threads: Option<usize>,

    /// Rows per parallel batch.
    #[arg(long, default_value_t = 64)]
    chunk_rows: usize,
}

#[derive(Parser, Debug)]
struct NodataArgs {
    /// Output path. PNG for uint8, raw little-endian samples for float32.
    #[arg(long)]
    out: PathBuf,

    /// Tile size as WIDTHxHEIGHT.
    #[arg(long)]
    size: String,

    /// Nodata color: hex string (`FFFFFF`) or comma-separated decimals.
    /// The channel count follows from the color.
    #[arg(long)]
    color: String,

    /// Sample format (uint8 or float32).
    #[arg(long, default_value = "uint8")]
    format: String,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = if cli.log {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.cmd {
        Command::Merge(args) => cmd_merge(args),
        Command::Nodata(args) => cmd_nodata(args),
    }
}

fn cmd_merge(args: MergeArgs) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(&args.job)
        .with_context(|| format!("read job '{}'", args.job.display()))?;
    let job: MergeJob = serde_json::from_str(&text)
        .with_context(|| format!("parse job '{}'", args.job.display()))?;
    let request = job.request()?;

    let root = args.job.parent().unwrap_or_else(|| Path::new("."));
    let mut inputs: Vec<Arc<dyn Raster>> = Vec::with_capacity(job.inputs.len());
    for input in &job.inputs {
        inputs.push(Arc::new(load_source(
            root,
            input,
            request.channels,
            request.sample_format,
        )?));
    }

    let merged = merge(inputs, &request)?;

    let out_path = resolve(root, &job.output.source);
    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    let options = StreamOptions {
        parallel: args.parallel,
        chunk_rows: args.chunk_rows,
        threads: args.threads,
    };

    match request.sample_format {
        SampleFormat::U8 => {
            let mut sink = PngSink::new(merged.width(), merged.height(), request.channels);
            stream_rows(&merged, &options, &mut sink)?;
            sink.save(&out_path)?;
        }
        SampleFormat::F32 => {
            let file = File::create(&out_path)
                .with_context(|| format!("create '{}'", out_path.display()))?;
            let mut sink = RawSink {
                writer: BufWriter::new(file),
            };
            stream_rows(&merged, &options, &mut sink)?;
            sink.writer.flush()?;
        }
    }

    eprintln!("wrote {}", out_path.display());
    Ok(())
}

fn cmd_nodata(args: NodataArgs) -> anyhow::Result<()> {
    let (width, height) = parse_size(&args.size)?;
    let color = NodataColor::parse(&args.color)?;
    let format = parse_sample_format(&args.format)?;
    let channels = u8::try_from(color.len()).context("too many channels in nodata color")?;
    color.validate(channels, format)?;

    let bbox = BoundingBox::new(0.0, 0.0, f64::from(width), f64::from(height));
    let tile = MemoryRaster::filled(width, height, bbox, format, color.values())?;

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    match tile.samples() {
        SampleBuffer::U8(data) => {
            image::save_buffer_with_format(
                &args.out,
                data,
                width,
                height,
                png_color(channels)?,
                image::ImageFormat::Png,
            )
            .with_context(|| format!("write png '{}'", args.out.display()))?;
        }
        SampleBuffer::F32(data) => {
            let file = File::create(&args.out)
                .with_context(|| format!("create '{}'", args.out.display()))?;
            let mut writer = BufWriter::new(file);
            for v in data {
                writer.write_all(&v.to_le_bytes())?;
            }
            writer.flush()?;
        }
    }

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn parse_size(text: &str) -> anyhow::Result<(u32, u32)> {
    let (w, h) = text
        .split_once('x')
        .context("size must be WIDTHxHEIGHT, e.g. 256x256")?;
    let w = w.trim().parse::<u32>().context("size width must be an integer")?;
    let h = h.trim().parse::<u32>().context("size height must be an integer")?;
    Ok((w, h))
}

fn resolve(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

fn png_color(channels: u8) -> anyhow::Result<image::ColorType> {
    match channels {
        1 => Ok(image::ColorType::L8),
        3 => Ok(image::ColorType::Rgb8),
        4 => Ok(image::ColorType::Rgba8),
        other => anyhow::bail!("{other} channel(s) cannot be written as PNG"),
    }
}

fn load_source(
    root: &Path,
    desc: &SourceDescriptor,
    channels: u8,
    format: SampleFormat,
) -> anyhow::Result<MemoryRaster> {
    let path = resolve(root, &desc.source);
    let decoded = image::open(&path).with_context(|| format!("decode '{}'", path.display()))?;
    let (width, height) = (decoded.width(), decoded.height());
    if width != desc.width() || height != desc.height() {
        anyhow::bail!(
            "'{}' is {}x{} but its descriptor implies {}x{}",
            path.display(),
            width,
            height,
            desc.width(),
            desc.height()
        );
    }

    let samples = match format {
        SampleFormat::U8 => SampleBuffer::U8(match channels {
            1 => decoded.to_luma8().into_raw(),
            3 => decoded.to_rgb8().into_raw(),
            4 => decoded.to_rgba8().into_raw(),
            other => anyhow::bail!("{other} channel(s) are not supported at the codec boundary"),
        }),
        SampleFormat::F32 => SampleBuffer::F32(match channels {
            1 => decoded.to_luma32f().into_raw(),
            3 => decoded.to_rgb32f().into_raw(),
            4 => decoded.to_rgba32f().into_raw(),
            other => anyhow::bail!("{other} channel(s) are not supported at the codec boundary"),
        }),
    };
    Ok(MemoryRaster::new(
        width,
        height,
        channels,
        desc.bbox,
        samples,
    )?)
}

struct PngSink {
    width: u32,
    height: u32,
    channels: u8,
    data: Vec<u8>,
}

impl PngSink {
    fn new(width: u32, height: u32, channels: u8) -> Self {
        Self {
            width,
            height,
            channels,
            data: Vec::with_capacity(width as usize * height as usize * usize::from(channels)),
        }
    }

    fn save(&self, path: &Path) -> anyhow::Result<()> {
        image::save_buffer_with_format(
            path,
            &self.data,
            self.width,
            self.height,
            png_color(self.channels)?,
            image::ImageFormat::Png,
        )
        .with_context(|| format!("write png '{}'", path.display()))
    }
}

impl RowSink for PngSink {
    fn write_row(&mut self, _row: u32, samples: &SampleBuffer) -> GridweaveResult<()> {
        let bytes = samples
            .as_u8()
            .ok_or_else(|| GridweaveError::encode("png output requires uint8 samples"))?;
        self.data.extend_from_slice(bytes);
        Ok(())
    }
}

struct RawSink<W: std::io::Write> {
    writer: W,
}

impl<W: std::io::Write> RowSink for RawSink<W> {
    fn write_row(&mut self, _row: u32, samples: &SampleBuffer) -> GridweaveResult<()> {
        let values = samples
            .as_f32()
            .ok_or_else(|| GridweaveError::encode("raw output requires float32 samples"))?;
        for v in values {
            self.writer.write_all(&v.to_le_bytes())?;
        }
        Ok(())
    }
}

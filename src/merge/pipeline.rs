use std::sync::Arc;

use tracing::{debug, warn};

use crate::compose::compound::CompoundImage;
use crate::compose::mask::MaskImage;
use crate::compose::mirror::pad_with_mirrors;
use crate::foundation::error::{GridweaveError, GridweaveResult};
use crate::merge::job::MergeRequest;
use crate::merge::pack::partition_packs;
use crate::raster::image::Raster;
use crate::resample::image::ResampledImage;

/// Merge georeferenced inputs onto the request's output grid.
///
/// Stages:
/// 1. Validate the request and every input against it.
/// 2. Partition inputs into resolution-homogeneous packs.
/// 3. Composite each pack. A pack already sitting on the output grid
///    contributes its compound directly; any other pack is mirror-padded and
///    resampled, and is dropped with a warning when its resampled extent
///    cannot reach the output.
/// 4. Assemble the nodata-prefilled, mask-gated final compound on the exact
///    output grid.
///
/// The returned image is demand-driven; stream its rows to consume the
/// result. Fatal problems (incoherent parameters, nothing left to merge)
/// come back as errors; recoverable ones are logged and skipped.
#[tracing::instrument(skip(inputs, request), fields(inputs = inputs.len()))]
pub fn merge(
    inputs: Vec<Arc<dyn Raster>>,
    request: &MergeRequest,
) -> GridweaveResult<CompoundImage> {
    request.validate()?;
    validate_inputs(&inputs, request)?;

    let packs = partition_packs(inputs);
    debug!(packs = packs.len(), "partitioned inputs by resolution");

    let mut members: Vec<Arc<dyn Raster>> = Vec::new();
    let mut masks: Vec<Arc<dyn Raster>> = Vec::new();
    for (idx, pack) in packs.into_iter().enumerate() {
        if let Some((data, mask)) = prepare_pack(idx, pack, request)? {
            members.push(data);
            masks.push(mask);
        }
    }
    if members.is_empty() {
        return Err(GridweaveError::geometry(
            "no contributing packs: every pack falls outside the output extent",
        ));
    }

    CompoundImage::with_masks(
        members,
        masks,
        request.output.bbox,
        request.output.width,
        request.output.height,
        request.nodata.clone(),
    )
}

fn validate_inputs(inputs: &[Arc<dyn Raster>], request: &MergeRequest) -> GridweaveResult<()> {
    if inputs.is_empty() {
        return Err(GridweaveError::validation(
            "merge requires at least one input",
        ));
    }
    for (idx, input) in inputs.iter().enumerate() {
        if input.channels() != request.channels {
            return Err(GridweaveError::validation(format!(
                "input {idx} has {} channel(s), the output has {}",
                input.channels(),
                request.channels
            )));
        }
        if input.sample_format() != request.sample_format {
            return Err(GridweaveError::validation(format!(
                "input {idx} holds {} samples, the output holds {}",
                input.sample_format(),
                request.sample_format
            )));
        }
        if input.resx() <= 0.0 || input.resy() <= 0.0 {
            return Err(GridweaveError::validation(format!(
                "input {idx} has a non-positive resolution {}x{}",
                input.resx(),
                input.resy()
            )));
        }
    }
    Ok(())
}

fn prepare_pack(
    idx: usize,
    pack: Vec<Arc<dyn Raster>>,
    request: &MergeRequest,
) -> GridweaveResult<Option<(Arc<dyn Raster>, Arc<dyn Raster>)>> {
    let size = pack.len();
    let compound = CompoundImage::new(pack, request.nodata.clone(), 0)?;

    if request.output.aligned_with(&compound) {
        debug!(pack = idx, members = size, "pack sits on the output grid");
        let mask = MaskImage::of(&compound);
        return Ok(Some((Arc::new(compound), Arc::new(mask))));
    }

    let mirrors = pad_with_mirrors(&compound);
    let padded = if mirrors.is_empty() {
        compound
    } else {
        let tail = mirrors.len();
        let mut all = compound.members().to_vec();
        all.extend(mirrors);
        CompoundImage::new(all, request.nodata.clone(), tail)?
    };
    let mask = MaskImage::of(&padded);
    debug!(
        pack = idx,
        members = size,
        mirrors = padded.synthetic_tail(),
        "resampling pack onto the output grid"
    );

    let grid = &request.output;
    let data = match ResampledImage::new(
        Arc::new(padded),
        grid.bbox,
        grid.resx(),
        grid.resy(),
        request.kernel,
    ) {
        Ok(resampled) => resampled,
        Err(GridweaveError::Geometry(reason)) => {
            warn!(pack = idx, %reason, "dropping pack");
            return Ok(None);
        }
        Err(other) => return Err(other),
    };
    let mask = ResampledImage::new(
        Arc::new(mask),
        grid.bbox,
        grid.resx(),
        grid.resy(),
        request.kernel,
    )?;
    Ok(Some((Arc::new(data), Arc::new(mask))))
}

#[cfg(test)]
#[path = "../../tests/unit/merge/pipeline.rs"]
mod tests;

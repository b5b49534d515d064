use std::sync::Arc;

use crate::foundation::geo::approx_eq;
use crate::raster::image::Raster;

/// Split inputs into maximal groups sharing both resolutions within
/// tolerance.
///
/// Inputs are sorted by (resx, resy) and grouped by run against each group's
/// first member, so every input lands in exactly one pack and pack order is
/// deterministic with the finest resolution first. The sort is stable:
/// inputs with equal resolutions keep their list order, which is what sets
/// compositing precedence inside a pack.
pub fn partition_packs(inputs: Vec<Arc<dyn Raster>>) -> Vec<Vec<Arc<dyn Raster>>> {
    let mut sorted = inputs;
    sorted.sort_by(|a, b| {
        a.resx()
            .total_cmp(&b.resx())
            .then_with(|| a.resy().total_cmp(&b.resy()))
    });

    let mut packs: Vec<Vec<Arc<dyn Raster>>> = Vec::new();
    for image in sorted {
        match packs.last_mut() {
            Some(pack)
                if approx_eq(pack[0].resx(), image.resx())
                    && approx_eq(pack[0].resy(), image.resy()) =>
            {
                pack.push(image);
            }
            _ => packs.push(vec![image]),
        }
    }
    packs
}

#[cfg(test)]
#[path = "../../tests/unit/merge/pack.rs"]
mod tests;

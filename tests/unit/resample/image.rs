use super::*;
use crate::raster::memory::MemoryRaster;

fn ramp_f32(width: u32, height: u32, bbox: BoundingBox) -> Arc<dyn Raster> {
    let mut data = Vec::with_capacity((width * height) as usize);
    for row in 0..height {
        for col in 0..width {
            data.push((row * width + col) as f32);
        }
    }
    Arc::new(MemoryRaster::new(width, height, 1, bbox, SampleBuffer::F32(data)).unwrap())
}

fn read_f32(image: &dyn Raster, row: u32) -> Vec<f32> {
    let len = image.width() as usize * usize::from(image.channels());
    let mut buf = SampleBuffer::zeroed(SampleFormat::F32, len);
    image.read_row(row, &mut buf);
    buf.as_f32().unwrap().to_vec()
}

#[test]
fn nearest_on_the_same_grid_is_identity() {
    let target = BoundingBox::new(0.0, 0.0, 6.0, 6.0);
    let src = ramp_f32(6, 6, target);
    let r = ResampledImage::new(Arc::clone(&src), target, 1.0, 1.0, Kernel::NearestNeighbour)
        .unwrap();
    assert_eq!((r.width(), r.height()), (6, 6));
    assert_eq!(r.bbox(), target);
    for row in 0..6 {
        assert_eq!(read_f32(&r, row), read_f32(src.as_ref(), row));
    }
}

#[test]
fn linear_on_the_same_grid_copies_the_interior() {
    let target = BoundingBox::new(0.0, 0.0, 8.0, 8.0);
    let src = ramp_f32(8, 8, target);
    let r = ResampledImage::new(Arc::clone(&src), target, 1.0, 1.0, Kernel::Linear).unwrap();
    assert_eq!((r.width(), r.height()), (6, 6));
    assert_eq!(r.bbox(), BoundingBox::new(1.0, 1.0, 7.0, 7.0));
    // Output row 0 sits on source row 1, columns 1..7.
    let out = read_f32(&r, 0);
    let src_row = read_f32(src.as_ref(), 1);
    assert_eq!(out, src_row[1..7].to_vec());
}

#[test]
fn cubic_on_the_same_grid_copies_the_interior() {
    let target = BoundingBox::new(0.0, 0.0, 8.0, 8.0);
    let src = ramp_f32(8, 8, target);
    let r = ResampledImage::new(Arc::clone(&src), target, 1.0, 1.0, Kernel::Cubic).unwrap();
    assert_eq!((r.width(), r.height()), (4, 4));
    assert_eq!(r.bbox(), BoundingBox::new(2.0, 2.0, 6.0, 6.0));
    // Catmull-Rom is interpolating, so integer centers copy source row 2.
    let out = read_f32(&r, 0);
    let src_row = read_f32(src.as_ref(), 2);
    assert_eq!(out, src_row[2..6].to_vec());
}

#[test]
fn lanczos_on_the_same_grid_copies_the_interior() {
    let target = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
    let src = ramp_f32(10, 10, target);
    let r = ResampledImage::new(Arc::clone(&src), target, 1.0, 1.0, Kernel::Lanczos3).unwrap();
    assert_eq!((r.width(), r.height()), (4, 4));
    assert_eq!(r.bbox(), BoundingBox::new(3.0, 3.0, 7.0, 7.0));
    // The windowed sinc interpolates at integer centers, so the residual of
    // the off-center taps vanishes below f32 resolution.
    let out = read_f32(&r, 0);
    let src_row = read_f32(src.as_ref(), 3);
    assert_eq!(out, src_row[3..7].to_vec());
}

#[test]
fn lanczos_margin_shrinks_the_usable_extent() {
    let src: Arc<dyn Raster> = Arc::new(
        MemoryRaster::filled(
            20,
            20,
            BoundingBox::new(0.0, 0.0, 40.0, 40.0),
            SampleFormat::F32,
            &[7.5],
        )
        .unwrap(),
    );
    let r = ResampledImage::new(
        src,
        BoundingBox::new(0.0, 0.0, 40.0, 40.0),
        1.0,
        1.0,
        Kernel::Lanczos3,
    )
    .unwrap();
    assert_eq!((r.width(), r.height()), (28, 28));
    assert_eq!(r.bbox(), BoundingBox::new(6.0, 6.0, 34.0, 34.0));
    for &v in &read_f32(&r, 13) {
        assert!((v - 7.5).abs() < 1e-4);
    }
}

#[test]
fn linear_downsampling_averages_the_window() {
    let mut data = Vec::with_capacity(64);
    for _row in 0..8 {
        for col in 0..8 {
            data.push(col as f32);
        }
    }
    let src: Arc<dyn Raster> = Arc::new(
        MemoryRaster::new(
            8,
            8,
            1,
            BoundingBox::new(0.0, 0.0, 8.0, 8.0),
            SampleBuffer::F32(data),
        )
        .unwrap(),
    );
    let r = ResampledImage::new(
        src,
        BoundingBox::new(0.0, 0.0, 8.0, 8.0),
        2.0,
        2.0,
        Kernel::Linear,
    )
    .unwrap();
    assert_eq!((r.width(), r.height()), (2, 2));
    assert_eq!(r.bbox(), BoundingBox::new(2.0, 2.0, 6.0, 6.0));
    let out = read_f32(&r, 0);
    assert!((out[0] - 2.5).abs() < 1e-6);
    assert!((out[1] - 4.5).abs() < 1e-6);
}

#[test]
fn output_clips_to_the_target_extent() {
    let src = ramp_f32(10, 10, BoundingBox::new(0.0, 0.0, 10.0, 10.0));
    let r = ResampledImage::new(
        src,
        BoundingBox::new(4.0, 4.0, 20.0, 20.0),
        1.0,
        1.0,
        Kernel::NearestNeighbour,
    )
    .unwrap();
    assert_eq!(r.bbox(), BoundingBox::new(4.0, 4.0, 10.0, 10.0));
    assert_eq!((r.width(), r.height()), (6, 6));
}

#[test]
fn output_sits_on_the_target_lattice() {
    let src = ramp_f32(10, 10, BoundingBox::new(0.3, 0.3, 10.3, 10.3));
    let r = ResampledImage::new(
        src,
        BoundingBox::new(0.3, 0.3, 10.3, 10.3),
        2.0,
        2.0,
        Kernel::Linear,
    )
    .unwrap();
    let b = r.bbox();
    for edge in [b.xmin, b.xmax] {
        let steps = (edge - 0.3) / 2.0;
        assert!((steps - steps.round()).abs() < 1e-9, "edge {edge} off lattice");
    }
}

#[test]
fn disjoint_targets_are_a_geometry_error() {
    let src = ramp_f32(10, 10, BoundingBox::new(0.0, 0.0, 10.0, 10.0));
    let err = ResampledImage::new(
        src,
        BoundingBox::new(30.0, 0.0, 40.0, 10.0),
        1.0,
        1.0,
        Kernel::NearestNeighbour,
    )
    .unwrap_err();
    assert!(matches!(err, GridweaveError::Geometry(_)));
}

#[test]
fn margins_can_consume_a_small_source() {
    let src = ramp_f32(4, 4, BoundingBox::new(0.0, 0.0, 4.0, 4.0));
    let err = ResampledImage::new(
        src,
        BoundingBox::new(0.0, 0.0, 4.0, 4.0),
        1.0,
        1.0,
        Kernel::Lanczos3,
    )
    .unwrap_err();
    assert!(matches!(err, GridweaveError::Geometry(_)));
}

#[test]
fn bad_target_parameters_are_validation_errors() {
    let src = ramp_f32(10, 10, BoundingBox::new(0.0, 0.0, 10.0, 10.0));
    let err = ResampledImage::new(
        Arc::clone(&src),
        BoundingBox::new(0.0, 0.0, 10.0, 10.0),
        0.0,
        1.0,
        Kernel::Linear,
    )
    .unwrap_err();
    assert!(matches!(err, GridweaveError::Validation(_)));
    let err = ResampledImage::new(
        src,
        BoundingBox::new(10.0, 0.0, 0.0, 10.0),
        1.0,
        1.0,
        Kernel::Linear,
    )
    .unwrap_err();
    assert!(matches!(err, GridweaveError::Validation(_)));
}

use super::*;
use crate::raster::memory::MemoryRaster;

fn tile(bbox: BoundingBox, value: f64) -> Arc<dyn Raster> {
    Arc::new(MemoryRaster::filled(10, 10, bbox, SampleFormat::U8, &[value]).unwrap())
}

fn gray(v: f64) -> NodataColor {
    NodataColor::new(vec![v])
}

fn row_values(image: &dyn Raster, row: u32) -> Vec<f64> {
    let len = image.width() as usize * usize::from(image.channels());
    let mut buf = SampleBuffer::zeroed(image.sample_format(), len);
    image.read_row(row, &mut buf);
    (0..len).map(|i| buf.get(i)).collect()
}

#[test]
fn compound_spans_the_union_of_member_extents() {
    let a = tile(BoundingBox::new(0.0, 0.0, 10.0, 10.0), 1.0);
    let b = tile(BoundingBox::new(10.0, 0.0, 20.0, 10.0), 2.0);
    let c = CompoundImage::new(vec![a, b], gray(0.0), 0).unwrap();
    assert_eq!((c.width(), c.height()), (20, 10));
    assert_eq!(c.bbox(), BoundingBox::new(0.0, 0.0, 20.0, 10.0));
    assert_eq!(c.channels(), 1);
}

#[test]
fn later_members_win_and_gaps_hold_nodata() {
    let a = tile(BoundingBox::new(0.0, 0.0, 10.0, 10.0), 10.0);
    let b = tile(BoundingBox::new(5.0, 0.0, 15.0, 10.0), 20.0);
    let island = tile(BoundingBox::new(25.0, 0.0, 35.0, 10.0), 30.0);
    let c = CompoundImage::new(vec![a, b, island], gray(77.0), 0).unwrap();
    let row = row_values(&c, 5);
    assert_eq!(row.len(), 35);
    assert_eq!(row[4], 10.0);
    assert_eq!(row[5], 20.0);
    assert_eq!(row[14], 20.0);
    assert_eq!(row[15], 77.0);
    assert_eq!(row[24], 77.0);
    assert_eq!(row[25], 30.0);
    assert_eq!(row[34], 30.0);
}

#[test]
fn rows_outside_a_member_leave_it_out() {
    let upper = tile(BoundingBox::new(0.0, 10.0, 10.0, 20.0), 1.0);
    let lower = tile(BoundingBox::new(0.0, 0.0, 10.0, 10.0), 2.0);
    let c = CompoundImage::new(vec![upper, lower], gray(0.0), 0).unwrap();
    assert_eq!(row_values(&c, 0)[0], 1.0);
    assert_eq!(row_values(&c, 19)[0], 2.0);
}

#[test]
fn misaligned_members_are_rejected() {
    let a = tile(BoundingBox::new(0.0, 0.0, 10.0, 10.0), 1.0);
    let shifted = tile(BoundingBox::new(10.5, 0.0, 20.5, 10.0), 2.0);
    let err = CompoundImage::new(vec![a, shifted], gray(0.0), 0).unwrap_err();
    assert!(matches!(err, GridweaveError::Geometry(_)));
}

#[test]
fn members_must_share_channels_and_format() {
    let a = tile(BoundingBox::new(0.0, 0.0, 10.0, 10.0), 1.0);
    let rgb: Arc<dyn Raster> = Arc::new(
        MemoryRaster::filled(
            10,
            10,
            BoundingBox::new(10.0, 0.0, 20.0, 10.0),
            SampleFormat::U8,
            &[1.0, 2.0, 3.0],
        )
        .unwrap(),
    );
    assert!(CompoundImage::new(vec![a, rgb], gray(0.0), 0).is_err());
}

#[test]
fn synthetic_tail_cannot_exceed_members() {
    let a = tile(BoundingBox::new(0.0, 0.0, 10.0, 10.0), 1.0);
    assert!(CompoundImage::new(vec![a], gray(0.0), 2).is_err());
    assert!(CompoundImage::new(vec![], gray(0.0), 0).is_err());
}

#[test]
fn masks_gate_member_pixels() {
    let bbox = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
    let base = tile(bbox, 10.0);
    let full: Arc<dyn Raster> =
        Arc::new(MemoryRaster::filled(10, 10, bbox, SampleFormat::U8, &[255.0]).unwrap());
    let over = tile(bbox, 99.0);
    // Overlay mask: left half on, right half off.
    let mut flags = SampleBuffer::zeroed(SampleFormat::U8, 100);
    for row in 0..10 {
        flags.fill_range(row * 10, 5, 255.0);
    }
    let half: Arc<dyn Raster> = Arc::new(MemoryRaster::new(10, 10, 1, bbox, flags).unwrap());

    let c = CompoundImage::with_masks(vec![base, over], vec![full, half], bbox, 10, 10, gray(0.0))
        .unwrap();
    let row = row_values(&c, 3);
    assert_eq!(&row[..5], &[99.0; 5]);
    assert_eq!(&row[5..], &[10.0; 5]);
}

#[test]
fn with_masks_requires_one_mask_per_member() {
    let bbox = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
    let base = tile(bbox, 1.0);
    assert!(CompoundImage::with_masks(vec![base], vec![], bbox, 10, 10, gray(0.0)).is_err());
}

#[test]
fn with_masks_checks_mask_shape() {
    let bbox = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
    let base = tile(bbox, 1.0);
    let small: Arc<dyn Raster> = Arc::new(
        MemoryRaster::filled(
            5,
            5,
            BoundingBox::new(0.0, 5.0, 5.0, 10.0),
            SampleFormat::U8,
            &[255.0],
        )
        .unwrap(),
    );
    let err =
        CompoundImage::with_masks(vec![base], vec![small], bbox, 10, 10, gray(0.0)).unwrap_err();
    assert!(matches!(err, GridweaveError::Geometry(_)));
}

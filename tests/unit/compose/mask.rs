use super::*;
use crate::foundation::sample::NodataColor;
use crate::raster::memory::MemoryRaster;
use std::sync::Arc;

fn tile(bbox: BoundingBox, value: f64) -> Arc<dyn Raster> {
    Arc::new(MemoryRaster::filled(4, 4, bbox, SampleFormat::U8, &[value]).unwrap())
}

fn flags(mask: &MaskImage, row: u32) -> Vec<f64> {
    let mut buf = SampleBuffer::zeroed(mask.sample_format(), mask.width() as usize);
    mask.read_row(row, &mut buf);
    (0..buf.len()).map(|i| buf.get(i)).collect()
}

#[test]
fn coverage_follows_member_footprints() {
    let a = tile(BoundingBox::new(0.0, 0.0, 4.0, 4.0), 1.0);
    let b = tile(BoundingBox::new(8.0, 0.0, 12.0, 4.0), 2.0);
    let c = CompoundImage::new(vec![a, b], NodataColor::new(vec![0.0]), 0).unwrap();
    let mask = MaskImage::of(&c);
    assert_eq!(mask.channels(), 1);
    assert_eq!((mask.width(), mask.height()), (c.width(), c.height()));
    assert_eq!(mask.bbox(), c.bbox());

    let v = flags(&mask, 2);
    assert_eq!(&v[..4], &[255.0; 4]);
    assert_eq!(&v[4..8], &[0.0; 4]);
    assert_eq!(&v[8..], &[255.0; 4]);
}

#[test]
fn padding_members_do_not_count_as_coverage() {
    let real = tile(BoundingBox::new(0.0, 0.0, 4.0, 4.0), 1.0);
    let pad = tile(BoundingBox::new(4.0, 0.0, 8.0, 4.0), 9.0);
    let c = CompoundImage::new(vec![real, pad], NodataColor::new(vec![0.0]), 1).unwrap();
    let mask = MaskImage::of(&c);
    let v = flags(&mask, 0);
    assert_eq!(&v[..4], &[255.0; 4]);
    assert_eq!(&v[4..], &[0.0; 4]);
}

#[test]
fn mask_format_follows_the_compound() {
    let f: Arc<dyn Raster> = Arc::new(
        MemoryRaster::filled(
            4,
            4,
            BoundingBox::new(0.0, 0.0, 4.0, 4.0),
            SampleFormat::F32,
            &[0.5],
        )
        .unwrap(),
    );
    let c = CompoundImage::new(vec![f], NodataColor::new(vec![0.0]), 0).unwrap();
    let mask = MaskImage::of(&c);
    assert_eq!(mask.sample_format(), SampleFormat::F32);
    assert_eq!(flags(&mask, 1), vec![255.0; 4]);
}

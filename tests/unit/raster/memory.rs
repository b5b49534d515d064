use super::*;

#[test]
fn construction_checks_dimension_coherence() {
    let bbox = BoundingBox::new(0.0, 0.0, 4.0, 2.0);
    assert!(MemoryRaster::new(0, 2, 1, bbox, SampleBuffer::zeroed(SampleFormat::U8, 0)).is_err());
    assert!(MemoryRaster::new(4, 2, 0, bbox, SampleBuffer::zeroed(SampleFormat::U8, 8)).is_err());
    assert!(MemoryRaster::new(4, 2, 1, bbox, SampleBuffer::zeroed(SampleFormat::U8, 7)).is_err());
    let flipped = BoundingBox::new(0.0, 2.0, 4.0, 0.0);
    assert!(
        MemoryRaster::new(4, 2, 1, flipped, SampleBuffer::zeroed(SampleFormat::U8, 8)).is_err()
    );
    assert!(MemoryRaster::new(4, 2, 1, bbox, SampleBuffer::zeroed(SampleFormat::U8, 8)).is_ok());
}

#[test]
fn read_row_returns_the_requested_row() {
    let bbox = BoundingBox::new(0.0, 0.0, 3.0, 2.0);
    let img = MemoryRaster::new(3, 2, 1, bbox, SampleBuffer::U8(vec![1, 2, 3, 4, 5, 6])).unwrap();
    let mut row = SampleBuffer::zeroed(SampleFormat::U8, 3);
    img.read_row(0, &mut row);
    assert_eq!(row.as_u8().unwrap(), &[1, 2, 3]);
    img.read_row(1, &mut row);
    assert_eq!(row.as_u8().unwrap(), &[4, 5, 6]);
}

#[test]
fn filled_repeats_the_pixel_everywhere() {
    let bbox = BoundingBox::new(0.0, 0.0, 2.0, 2.0);
    let img = MemoryRaster::filled(2, 2, bbox, SampleFormat::F32, &[0.25, 0.75]).unwrap();
    assert_eq!(img.channels(), 2);
    assert_eq!(img.sample_format(), SampleFormat::F32);
    let expected = [0.25f32, 0.75, 0.25, 0.75, 0.25, 0.75, 0.25, 0.75];
    assert_eq!(img.samples().as_f32().unwrap(), &expected);
}

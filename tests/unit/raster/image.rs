use super::*;
use crate::raster::memory::MemoryRaster;

fn gray(width: u32, height: u32, bbox: BoundingBox) -> MemoryRaster {
    MemoryRaster::filled(width, height, bbox, SampleFormat::U8, &[0.0]).unwrap()
}

#[test]
fn resolutions_derive_from_extent_and_dimensions() {
    let img = gray(10, 5, BoundingBox::new(0.0, 0.0, 20.0, 20.0));
    assert!((img.resx() - 2.0).abs() < 1e-12);
    assert!((img.resy() - 4.0).abs() < 1e-12);
}

#[test]
fn row_and_ground_coordinates_round_trip() {
    let img = gray(8, 8, BoundingBox::new(0.0, 0.0, 8.0, 8.0));
    assert!((row_center_y(&img, 0) - 7.5).abs() < 1e-12);
    for row in 0..8 {
        assert_eq!(row_of_y(&img, row_center_y(&img, row)), i64::from(row));
    }
    assert_eq!(col_of_x(&img, 0.0), 0);
    assert_eq!(col_of_x(&img, 3.0), 3);
    assert_eq!(col_of_x(&img, -2.0), -2);
}

#[test]
fn phases_measure_the_grid_offset() {
    let img = gray(10, 10, BoundingBox::new(2.5, 0.0, 12.5, 10.0));
    assert!((phase_x(&img) - 0.5).abs() < 1e-12);
    assert!(phase_y(&img).abs() < 1e-12);
}

#[test]
fn alignment_accepts_shifts_by_whole_pixels() {
    let a = gray(10, 10, BoundingBox::new(0.0, 0.0, 10.0, 10.0));
    let b = gray(10, 10, BoundingBox::new(30.0, -20.0, 40.0, -10.0));
    assert!(is_aligned(&a, &b));
}

#[test]
fn alignment_rejects_res_and_phase_mismatches() {
    let a = gray(10, 10, BoundingBox::new(0.0, 0.0, 10.0, 10.0));
    let shifted = gray(10, 10, BoundingBox::new(0.5, 0.0, 10.5, 10.0));
    let coarse = gray(5, 5, BoundingBox::new(0.0, 0.0, 10.0, 10.0));
    assert!(!is_aligned(&a, &shifted));
    assert!(!is_aligned(&a, &coarse));
}

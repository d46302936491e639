use image::{ImageBuffer, Luma, Rgba, RgbaImage};
use ndarray::Array3;
use tempfile::tempdir;

use super::{IoError, read_volume, save_canvas_png, write_volume};
use crate::model::{Axis, AxisMap, ScanVolume};

fn ramp_volume() -> ScanVolume {
    // Spans the full u8 range so min/max normalization is the identity.
    let data = Array3::from_shape_fn((3, 2, 4), |(z, y, x)| match (z, y, x) {
        (0, 0, 0) => 0,
        (2, 1, 3) => 255,
        _ => (z * 40 + y * 10 + x) as u8,
    });
    ScanVolume::new(data, AxisMap::new(1.0, 1.0, 1.0)).expect("volume")
}

#[test]
fn tiff_stack_roundtrip_preserves_slices() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("stack.tiff");
    let volume = ramp_volume();
    write_volume(&path, &volume).expect("write tiff");

    let restored = read_volume(&path).expect("read tiff");
    assert_eq!(restored.shape(), AxisMap::new(4, 2, 3));
    assert_eq!(restored.data, volume.data);
    assert_eq!(restored.intensity_range, (0.0, 255.0));
    assert_eq!(restored.source.as_deref(), Some(path.as_path()));
}

#[test]
fn narrow_range_is_stretched_to_full_scale() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("narrow.png");
    let image = ImageBuffer::<Luma<u8>, Vec<u8>>::from_vec(2, 2, vec![100, 110, 120, 150])
        .expect("image");
    image.save(&path).expect("save png");

    let volume = read_volume(&path).expect("read png");
    assert_eq!(volume.shape(), AxisMap::new(2, 2, 1));
    assert_eq!(volume.intensity_range, (100.0, 150.0));
    let slice = volume.slice_image(Axis::Z, 0).expect("only slice");
    assert_eq!(slice.as_raw(), &vec![0, 51, 102, 255]);
}

#[test]
fn unsupported_extension_is_reported() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("scan.nrrd");
    std::fs::write(&path, b"NRRD0004").expect("write");
    assert!(matches!(
        read_volume(&path),
        Err(IoError::UnknownScanType(ext)) if ext == "nrrd"
    ));
}

#[test]
fn raster_write_rejects_stacks() {
    let dir = tempdir().expect("tempdir");
    let err = write_volume(dir.path().join("stack.png"), &ramp_volume()).expect_err("must fail");
    assert!(matches!(err, IoError::SliceCount(3)));
    assert_eq!(err.to_string(), "a flat image holds one slice, the scan has 3");
}

#[test]
fn extensionless_path_is_not_a_scan() {
    let err = read_volume("series/scan").expect_err("must fail");
    assert!(matches!(err, IoError::MissingExtension(_)));
    assert!(err.to_string().starts_with("scan path has no file extension"));
}

#[test]
fn stack_pages_must_share_dimensions() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("ragged.tif");
    let file = std::fs::File::create(&path).expect("create");
    let mut encoder = tiff::encoder::TiffEncoder::new(file).expect("encoder");
    encoder
        .write_image::<tiff::encoder::colortype::Gray8>(4, 2, &[0; 8])
        .expect("first page");
    encoder
        .write_image::<tiff::encoder::colortype::Gray8>(3, 2, &[0; 6])
        .expect("second page");

    assert!(matches!(
        read_volume(&path),
        Err(IoError::MismatchedPages {
            page: 1,
            expected: (4, 2),
            found: (3, 2),
        })
    ));
}

#[test]
fn canvas_is_saved_as_png() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("frame.png");
    let canvas = RgbaImage::from_pixel(3, 2, Rgba([10, 20, 30, 255]));
    save_canvas_png(&canvas, &path).expect("save");
    let restored = image::open(&path).expect("open").to_rgba8();
    assert_eq!(restored, canvas);
}

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

use spotcount_core::backend::tiff_source::write_stack;
use spotcount_core::roi::Roi;
use spotcount_core::{
    Calibration, CountError, ImageSource, MaskingExtractor, TiffSource, VolumeExtractor,
};
use tiff::encoder::{TiffEncoder, colortype};
use tiff::tags::Tag;

/// Minimal ImageJ rectangle ROI.
fn rect_roi_bytes(left: i16, top: i16, width: i16, height: i16) -> Vec<u8> {
    let mut b = vec![0u8; 64];
    b[..4].copy_from_slice(b"Iout");
    b[4..6].copy_from_slice(&228u16.to_be_bytes());
    b[6] = 1;
    b[8..10].copy_from_slice(&top.to_be_bytes());
    b[10..12].copy_from_slice(&left.to_be_bytes());
    b[12..14].copy_from_slice(&(top + height).to_be_bytes());
    b[14..16].copy_from_slice(&(left + width).to_be_bytes());
    b
}

fn plane_value(slice: u32, channel: u32, pixel: u32) -> f32 {
    (slice * 1000 + channel * 100 + pixel) as f32
}

fn write_hyperstack(path: &Path) {
    let cal = Calibration {
        pixel_width: 0.5,
        pixel_height: 0.5,
        pixel_depth: 2.0,
        unit: "µm".into(),
    };
    let planes: Vec<Vec<f32>> = (0..3)
        .flat_map(|z| (0..2).map(move |c| (0..30).map(|i| plane_value(z, c, i)).collect()))
        .collect();
    write_stack(path, 6, 5, 2, &cal, planes.iter().map(|p| p.as_slice())).unwrap();
}

#[test]
fn reads_hyperstack_layout_calibration_and_sidecar_roi() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cells.tif");
    write_hyperstack(&path);
    fs::write(dir.path().join("cells.roi"), rect_roi_bytes(1, 1, 3, 2)).unwrap();

    let image = TiffSource.open(&path).unwrap();
    let dims = image.dimensions();
    assert_eq!((dims.width, dims.height), (6, 5));
    assert_eq!((dims.channels, dims.slices, dims.frames), (2, 3, 1));

    let cal = image.calibration();
    assert_eq!(cal.pixel_width, 0.5);
    assert_eq!(cal.pixel_height, 0.5);
    assert_eq!(cal.pixel_depth, 2.0);
    assert_eq!(cal.unit, "µm");

    assert_eq!(
        image.roi(),
        Some(&Roi::Rectangle {
            left: 1,
            top: 1,
            width: 3,
            height: 2
        })
    );
    assert_eq!(image.roi_area(), Some(6.0 * 0.25));

    let plane = image.plane(2, 3).unwrap();
    assert_eq!(plane.data[7], plane_value(2, 1, 7));
}

#[test]
fn extractor_masks_every_slice_and_leaves_source_alone() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cells.tif");
    write_hyperstack(&path);
    fs::write(dir.path().join("cells.roi"), rect_roi_bytes(1, 1, 3, 2)).unwrap();

    let image = TiffSource.open(&path).unwrap();
    let roi = image.roi().unwrap().clone();
    let volume = MaskingExtractor.extract(image.as_ref(), 2, &roi).unwrap();

    assert_eq!((volume.width, volume.height, volume.depth), (6, 5, 3));
    assert_eq!(volume.channel, 2);
    for z in 0..3u32 {
        let slice = volume.slice(z);
        for y in 0..5u32 {
            for x in 0..6u32 {
                let i = y * 6 + x;
                let inside = (1..4).contains(&x) && (1..3).contains(&y);
                let want = if inside { plane_value(z, 1, i) } else { 0.0 };
                assert_eq!(slice[i as usize], want, "z={z} x={x} y={y}");
            }
        }
    }

    // the opened image still holds unmasked data
    assert_eq!(image.plane(2, 1).unwrap().data[0], plane_value(0, 1, 0));
}

#[test]
fn embedded_imagej_roi_wins_over_sidecar() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("embedded.tif");

    let roi = rect_roi_bytes(0, 0, 2, 2);
    let mut meta = Vec::new();
    meta.extend_from_slice(b"IJIJ");
    meta.extend_from_slice(b"roi ");
    meta.extend_from_slice(&1u32.to_be_bytes());
    let header = meta.len() as u32;
    meta.extend_from_slice(&roi);
    let counts = [header, roi.len() as u32];

    {
        let mut enc = TiffEncoder::new(BufWriter::new(File::create(&path).unwrap())).unwrap();
        let mut image = enc.new_image::<colortype::Gray16>(4, 4).unwrap();
        image
            .encoder()
            .write_tag(Tag::Unknown(50838), &counts[..])
            .unwrap();
        image
            .encoder()
            .write_tag(Tag::Unknown(50839), &meta[..])
            .unwrap();
        image.write_data(&[7u16; 16]).unwrap();
    }
    fs::write(dir.path().join("embedded.roi"), rect_roi_bytes(0, 0, 4, 4)).unwrap();

    let image = TiffSource.open(&path).unwrap();
    assert_eq!(image.roi().map(|r| r.pixel_area(4, 4)), Some(4));
}

#[test]
fn plain_tiff_is_single_channel_uncalibrated_without_roi() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plain.tif");
    {
        let mut enc = TiffEncoder::new(BufWriter::new(File::create(&path).unwrap())).unwrap();
        for v in [10u8, 20] {
            enc.write_image::<colortype::Gray8>(3, 2, &[v; 6]).unwrap();
        }
    }

    let image = TiffSource.open(&path).unwrap();
    let dims = image.dimensions();
    assert_eq!((dims.channels, dims.slices), (1, 2));
    assert_eq!(image.calibration(), &Calibration::default());
    assert!(image.roi().is_none());
    assert_eq!(image.plane(1, 2).unwrap().data, vec![20.0; 6]);
}

#[test]
fn rgb_samples_become_channels() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rgb.tif");
    {
        let mut enc = TiffEncoder::new(BufWriter::new(File::create(&path).unwrap())).unwrap();
        let px: Vec<u8> = (0..4).flat_map(|_| [1u8, 2, 3]).collect();
        enc.write_image::<colortype::RGB8>(2, 2, &px).unwrap();
    }

    let image = TiffSource.open(&path).unwrap();
    assert_eq!(image.dimensions().channels, 3);
    assert_eq!(image.plane(3, 1).unwrap().data, vec![3.0; 4]);
}

#[test]
fn absurd_hyperstack_layout_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("corrupt.tif");
    {
        let mut enc = TiffEncoder::new(BufWriter::new(File::create(&path).unwrap())).unwrap();
        let mut image = enc.new_image::<colortype::Gray8>(2, 2).unwrap();
        image
            .encoder()
            .write_tag(
                Tag::ImageDescription,
                "ImageJ=1.54f\nchannels=70000\nslices=70000\nframes=70000\n",
            )
            .unwrap();
        image.write_data(&[1u8; 4]).unwrap();
    }

    match TiffSource.open(&path) {
        Err(CountError::Format(msg)) => assert!(msg.contains("too large"), "{msg}"),
        Err(other) => panic!("unexpected error {other:?}"),
        Ok(_) => panic!("corrupt layout accepted"),
    }
}

/// ImageJ shape ROI: an L made of two 2 x 4 / 4 x 2 rectangles sharing no pixels.
fn composite_roi_bytes() -> Vec<u8> {
    let path: [f32; 26] = [
        0.0, 0.0, 0.0, 1.0, 2.0, 0.0, 1.0, 2.0, 4.0, 1.0, 0.0, 4.0, 4.0, //
        0.0, 2.0, 2.0, 1.0, 6.0, 2.0, 1.0, 6.0, 4.0, 1.0, 2.0, 4.0, 4.0,
    ];
    let mut b = rect_roi_bytes(0, 0, 6, 4);
    b[36..40].copy_from_slice(&(path.len() as u32).to_be_bytes());
    for v in path {
        b.extend_from_slice(&v.to_bits().to_be_bytes());
    }
    b
}

#[test]
fn composite_roi_is_loaded_with_its_area() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cells.tif");
    write_hyperstack(&path);
    fs::write(dir.path().join("cells.roi"), composite_roi_bytes()).unwrap();

    let image = TiffSource.open(&path).unwrap();
    let roi = image.roi().expect("composite ROI kept");
    assert_eq!(roi.kind(), "composite");
    assert_eq!(roi.pixel_area(6, 5), 8 + 8);
    assert_eq!(image.roi_area(), Some(16.0 * 0.25));
}

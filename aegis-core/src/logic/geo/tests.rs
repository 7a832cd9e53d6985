use std::io::Cursor;
use std::time::Duration;

use image::{DynamicImage, ImageFormat, RgbImage};

use super::*;

type Rational = (u32, u32);

/// Minimal little-endian TIFF holding only a GPS IFD
fn gps_tiff(lat: [Rational; 3], lat_ref: u8, lon: [Rational; 3], lon_ref: u8, alt: Rational, alt_ref: u8) -> Vec<u8> {
    const GPS_IFD: u32 = 26;
    const LAT_DATA: u32 = 104;
    const LON_DATA: u32 = 128;
    const ALT_DATA: u32 = 152;

    let mut out = Vec::new();
    let u16le = |out: &mut Vec<u8>, v: u16| out.extend_from_slice(&v.to_le_bytes());
    let u32le = |out: &mut Vec<u8>, v: u32| out.extend_from_slice(&v.to_le_bytes());

    // Header
    out.extend_from_slice(b"II");
    u16le(&mut out, 42);
    u32le(&mut out, 8);

    // IFD0: GPS pointer only
    u16le(&mut out, 1);
    u16le(&mut out, 0x8825);
    u16le(&mut out, 4);
    u32le(&mut out, 1);
    u32le(&mut out, GPS_IFD);
    u32le(&mut out, 0);

    // GPS IFD
    let entries: [(u16, u16, u32, [u8; 4]); 6] = [
        (1, 2, 2, [lat_ref, 0, 0, 0]),
        (2, 5, 3, LAT_DATA.to_le_bytes()),
        (3, 2, 2, [lon_ref, 0, 0, 0]),
        (4, 5, 3, LON_DATA.to_le_bytes()),
        (5, 1, 1, [alt_ref, 0, 0, 0]),
        (6, 5, 1, ALT_DATA.to_le_bytes()),
    ];
    u16le(&mut out, entries.len() as u16);
    for (tag, kind, count, value) in entries {
        u16le(&mut out, tag);
        u16le(&mut out, kind);
        u32le(&mut out, count);
        out.extend_from_slice(&value);
    }
    u32le(&mut out, 0);
    assert_eq!(out.len() as u32, LAT_DATA);

    for (num, den) in lat.into_iter().chain(lon).chain([alt]) {
        u32le(&mut out, num);
        u32le(&mut out, den);
    }
    out
}

/// SOI, APP1 Exif segment, EOI
fn jpeg_with_exif(tiff: &[u8]) -> Vec<u8> {
    let mut out = vec![0xFF, 0xD8, 0xFF, 0xE1];
    let len = (2 + 6 + tiff.len()) as u16;
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(b"Exif\0\0");
    out.extend_from_slice(tiff);
    out.extend_from_slice(&[0xFF, 0xD9]);
    out
}

fn new_delhi() -> Vec<u8> {
    jpeg_with_exif(&gps_tiff(
        [(286129, 10000), (0, 1), (0, 1)],
        b'N',
        [(772295, 10000), (0, 1), (0, 1)],
        b'E',
        (2165, 10),
        0,
    ))
}

#[test]
fn test_extracts_gps_fix() {
    let fix = extract_gps(&new_delhi()).unwrap().unwrap();
    assert!((fix.latitude - 28.6129).abs() < 1e-9);
    assert!((fix.longitude - 77.2295).abs() < 1e-9);
    assert_eq!(fix.altitude, Some(216.5));
}

#[test]
fn test_geo_tag_fields_and_maps_link() {
    let fix = extract_gps(&new_delhi()).unwrap().unwrap();
    let tag = GeoTag::new(&fix, None, GeocodeStatus::NotAttempted);

    assert_eq!(tag.latitude, 28.6129);
    assert_eq!(tag.longitude, 77.2295);
    assert_eq!(tag.altitude, Some(216.5));
    assert!(tag.maps_link.contains("28.6129"));
    assert!(tag.maps_link.contains("77.2295"));
    assert_eq!(tag.maps_link, "https://www.google.com/maps?q=28.6129,77.2295");

    let json = serde_json::to_value(&tag).unwrap();
    assert_eq!(json["geocode_status"], "not_attempted");
}

#[test]
fn test_southern_western_and_below_sea_level() {
    let bytes = jpeg_with_exif(&gps_tiff(
        [(33, 1), (51, 1), (54, 1)],
        b'S',
        [(70, 1), (30, 1), (0, 1)],
        b'W',
        (12, 1),
        1,
    ));
    let tag = GeoTag::new(&extract_gps(&bytes).unwrap().unwrap(), None, GeocodeStatus::NotAttempted);

    assert_eq!(tag.latitude, -33.865);
    assert_eq!(tag.longitude, -70.5);
    assert_eq!(tag.altitude, Some(-12.0));
}

#[test]
fn test_out_of_range_is_extraction_error() {
    let bytes = jpeg_with_exif(&gps_tiff(
        [(95, 1), (0, 1), (0, 1)],
        b'N',
        [(10, 1), (0, 1), (0, 1)],
        b'E',
        (0, 1),
        0,
    ));
    assert!(matches!(extract_gps(&bytes), Err(GeoError::Extraction(_))));
}

#[test]
fn test_image_without_exif_has_no_fix() {
    let mut png = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(RgbImage::new(4, 4))
        .write_to(&mut png, ImageFormat::Png)
        .unwrap();
    assert_eq!(extract_gps(png.get_ref()).unwrap(), None);

    assert_eq!(extract_gps(b"definitely not an image").unwrap(), None);
}

#[tokio::test]
async fn test_resolve_without_geocoder_is_not_attempted() {
    let fix = extract_gps(&new_delhi()).unwrap().unwrap();
    let tag = resolve(&fix, None).await;
    assert_eq!(tag.geocode_status, GeocodeStatus::NotAttempted);
    assert_eq!(tag.location_name, None);
}

#[tokio::test]
async fn test_resolve_with_failing_geocoder_is_unavailable() {
    let fix = extract_gps(&new_delhi()).unwrap().unwrap();
    let geocoder = ReverseGeocoder::new("http://127.0.0.1:9")
        .unwrap()
        .with_backoff(Duration::from_millis(1));

    let tag = resolve(&fix, Some(&geocoder)).await;
    assert_eq!(tag.geocode_status, GeocodeStatus::Unavailable);
    assert_eq!(tag.location_name, None);
    assert_eq!(tag.latitude, 28.6129);
}

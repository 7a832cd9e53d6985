//! GPS Extraction
//!
//! Reads the GPS IFD from JPEG/TIFF/PNG/WebP containers.
//! "No EXIF" and "no GPS" are both `Ok(None)`; only a corrupt GPS block is an error.

use std::io::Cursor;

use exif::{Exif, Field, In, Reader, Tag, Value};

use super::GeoError;

/// Decimal-degree position read from an image
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GpsFix {
    pub latitude: f64,
    pub longitude: f64,
    /// Metres; negative below sea level
    pub altitude: Option<f64>,
}

pub fn extract_gps(bytes: &[u8]) -> Result<Option<GpsFix>, GeoError> {
    let exif = match Reader::new().read_from_container(&mut Cursor::new(bytes)) {
        Ok(exif) => exif,
        Err(exif::Error::NotFound(_)) | Err(exif::Error::InvalidFormat(_)) => return Ok(None),
        Err(e) => return Err(GeoError::Extraction(e.to_string())),
    };

    let (Some(lat), Some(lon)) = (field(&exif, Tag::GPSLatitude), field(&exif, Tag::GPSLongitude)) else {
        return Ok(None);
    };

    let mut latitude = dms_to_degrees(lat)?;
    let mut longitude = dms_to_degrees(lon)?;
    if ref_is(&exif, Tag::GPSLatitudeRef, b'S') {
        latitude = -latitude;
    }
    if ref_is(&exif, Tag::GPSLongitudeRef, b'W') {
        longitude = -longitude;
    }

    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        return Err(GeoError::Extraction(format!(
            "Coordinates out of range: {}, {}",
            latitude, longitude
        )));
    }

    Ok(Some(GpsFix {
        latitude,
        longitude,
        altitude: altitude(&exif),
    }))
}

fn field(exif: &Exif, tag: Tag) -> Option<&Field> {
    exif.get_field(tag, In::PRIMARY)
}

/// Degrees, minutes, seconds rationals to decimal degrees
fn dms_to_degrees(field: &Field) -> Result<f64, GeoError> {
    match &field.value {
        Value::Rational(parts) if parts.len() >= 3 => {
            let [d, m, s] = [parts[0], parts[1], parts[2]].map(|r| r.to_f64());
            let degrees = d + m / 60.0 + s / 3600.0;
            if degrees.is_finite() {
                Ok(degrees)
            } else {
                Err(GeoError::Extraction(format!("Invalid {} value", field.tag)))
            }
        }
        _ => Err(GeoError::Extraction(format!("Unexpected {} format", field.tag))),
    }
}

fn ref_is(exif: &Exif, tag: Tag, expected: u8) -> bool {
    match field(exif, tag).map(|f| &f.value) {
        Some(Value::Ascii(values)) => values
            .first()
            .and_then(|v| v.first())
            .map(|c| c.eq_ignore_ascii_case(&expected))
            .unwrap_or(false),
        _ => false,
    }
}

fn altitude(exif: &Exif) -> Option<f64> {
    let value = match field(exif, Tag::GPSAltitude).map(|f| &f.value) {
        Some(Value::Rational(parts)) => parts.first()?.to_f64(),
        _ => return None,
    };
    if !value.is_finite() {
        return None;
    }

    let below_sea_level = matches!(
        field(exif, Tag::GPSAltitudeRef).map(|f| &f.value),
        Some(Value::Byte(b)) if b.first() == Some(&1)
    );
    Some(if below_sea_level { -value } else { value })
}

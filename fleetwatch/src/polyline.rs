//! Encoded polyline codec
//!
//! Encodes and decodes route paths using the variable-length signed-delta
//! format routing providers return (5 decimal places of precision). Decoding
//! is tolerant: empty or malformed input yields an empty path rather than an
//! error, so a bad provider response degrades to "no route drawn".

use crate::geo::GeoPoint;

/// Fixed-point scale: coordinates are stored as integers of 1e-5 degrees.
const SCALE: f64 = 1e5;

/// Decodes an encoded polyline string into a path.
///
/// Returns an empty path when the input is empty, truncated mid-value,
/// contains bytes outside the printable encoding range, or produces
/// coordinates outside valid latitude/longitude bounds.
pub fn decode(encoded: &str) -> Vec<GeoPoint> {
    let bytes = encoded.as_bytes();
    let mut path = Vec::new();
    let mut index = 0;
    let mut lat: i64 = 0;
    let mut lon: i64 = 0;

    while index < bytes.len() {
        let Some((delta, next)) = decode_value(bytes, index) else {
            return Vec::new();
        };
        lat += delta;
        index = next;

        let Some((delta, next)) = decode_value(bytes, index) else {
            return Vec::new();
        };
        lon += delta;
        index = next;

        match GeoPoint::new(lat as f64 / SCALE, lon as f64 / SCALE) {
            Ok(point) => path.push(point),
            Err(_) => return Vec::new(),
        }
    }

    path
}

/// Encodes a path as a polyline string at 1e-5 degree precision.
pub fn encode(path: &[GeoPoint]) -> String {
    let mut out = String::new();
    let mut prev_lat: i64 = 0;
    let mut prev_lon: i64 = 0;

    for point in path {
        let lat = (point.lat * SCALE).round() as i64;
        let lon = (point.lon * SCALE).round() as i64;

        encode_value(lat - prev_lat, &mut out);
        encode_value(lon - prev_lon, &mut out);

        prev_lat = lat;
        prev_lon = lon;
    }

    out
}

/// Decodes one zigzag varint starting at `index`.
///
/// Returns the signed value and the index just past it, or None when the
/// input ends mid-value, holds an out-of-range byte, or overflows the
/// coordinate range.
fn decode_value(bytes: &[u8], mut index: usize) -> Option<(i64, usize)> {
    let mut accum: i64 = 0;
    let mut shift = 0u32;

    loop {
        let byte = *bytes.get(index)?;
        if !(63..=126).contains(&byte) {
            return None;
        }
        let chunk = (byte - 63) as i64;
        accum |= (chunk & 0x1f) << shift;
        index += 1;

        if chunk & 0x20 == 0 {
            break;
        }
        shift += 5;
        if shift > 30 {
            // More chunks than any valid coordinate delta needs
            return None;
        }
    }

    let value = if accum & 1 != 0 {
        !(accum >> 1)
    } else {
        accum >> 1
    };
    Some((value, index))
}

/// Appends one value as zigzag 5-bit chunks with continuation bits.
fn encode_value(value: i64, out: &mut String) {
    let mut v = value << 1;
    if value < 0 {
        v = !v;
    }

    while v >= 0x20 {
        out.push((((0x20 | (v & 0x1f)) + 63) as u8) as char);
        v >>= 5;
    }
    out.push(((v + 63) as u8) as char);
}

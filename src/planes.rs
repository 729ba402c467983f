// ---------------------------------------------------------------------------
// Raw plane utilities on serialized sample bytes.
//
// Everything here works on `&[u8]` payloads as decoders hand them over,
// before they become an `AssembledImage`, plus one typed helper for padding
// a single plane.
// ---------------------------------------------------------------------------

use alloc::vec;
use alloc::vec::Vec;

use crate::Error;
use crate::layout::Rect;
use crate::sample::{ElementKind, decode_samples};

// ===========================================================================
// Validation helpers
// ===========================================================================

#[inline]
fn check_inplace(len: usize, unit: usize) -> Result<(), Error> {
    if unit == 0 || len % unit != 0 {
        Err(Error::NotSampleAligned {
            len,
            bytes_per_sample: unit,
        })
    } else {
        Ok(())
    }
}

/// A `width` x `height` plane of `bpp`-byte pixels must fit in `len` bytes.
#[inline]
fn check_plane(len: usize, width: usize, height: usize, bpp: usize) -> Result<(), Error> {
    if width == 0 || height == 0 {
        return Err(Error::InvalidDimensions {
            width: width as u32,
            height: height as u32,
        });
    }
    let expected = width
        .checked_mul(height)
        .and_then(|n| n.checked_mul(bpp))
        .ok_or(Error::InvalidDimensions {
            width: width as u32,
            height: height as u32,
        })?;
    if len != expected {
        return Err(Error::ShapeMismatch {
            expected,
            actual: len,
        });
    }
    Ok(())
}

// ===========================================================================
// Channel reordering
// ===========================================================================

/// Copies one channel out of a buffer holding `channels` channels of
/// `bytes_per_sample`-byte samples.
///
/// With `reverse`, channel indices count from the end (BGR data read as RGB).
pub fn split_channel(
    data: &[u8],
    channel: usize,
    channels: usize,
    bytes_per_sample: usize,
    reverse: bool,
    interleaved: bool,
) -> Result<Vec<u8>, Error> {
    if channel >= channels {
        return Err(Error::UnsupportedChannelCount(channel + 1));
    }
    check_inplace(data.len(), channels * bytes_per_sample)?;
    let index = if reverse { channels - channel - 1 } else { channel };
    let plane_len = data.len() / channels;
    if !interleaved {
        return Ok(data[index * plane_len..(index + 1) * plane_len].to_vec());
    }
    let pixel = channels * bytes_per_sample;
    let offset = index * bytes_per_sample;
    let mut out = Vec::with_capacity(plane_len);
    for px in data.chunks_exact(pixel) {
        out.extend_from_slice(&px[offset..offset + bytes_per_sample]);
    }
    Ok(out)
}

/// Swaps channels 0 and 2 in place. Buffers with fewer than three channels
/// are left alone.
pub fn bgr_to_rgb(
    buf: &mut [u8],
    interleaved: bool,
    bytes_per_sample: usize,
    channels: usize,
) -> Result<(), Error> {
    if channels < 3 {
        return Ok(());
    }
    check_inplace(buf.len(), channels * bytes_per_sample)?;
    if interleaved {
        let bps = bytes_per_sample;
        for px in buf.chunks_exact_mut(channels * bps) {
            let (first, rest) = px.split_at_mut(bps);
            first.swap_with_slice(&mut rest[bps..2 * bps]);
        }
    } else {
        let plane = buf.len() / channels;
        let (first, rest) = buf.split_at_mut(plane);
        first.swap_with_slice(&mut rest[plane..2 * plane]);
    }
    Ok(())
}

/// Copies `rect` out of a serialized `width` x `height` buffer.
///
/// Planar buffers keep their layout: the result holds each channel's
/// cropped plane in turn.
pub fn copy_subimage(
    src: &[u8],
    width: u32,
    height: u32,
    rect: Rect,
    bytes_per_sample: usize,
    channels: usize,
    interleaved: bool,
) -> Result<Vec<u8>, Error> {
    let (w, h) = (width as usize, height as usize);
    check_plane(src.len(), w, h, bytes_per_sample * channels)?;
    rect.check_within(width, height)?;
    let (rx, ry, rw, rh) = (
        rect.x as usize,
        rect.y as usize,
        rect.width as usize,
        rect.height as usize,
    );
    let mut out = Vec::with_capacity(rw * rh * channels * bytes_per_sample);
    if interleaved {
        let pixel = bytes_per_sample * channels;
        for y in ry..ry + rh {
            let row = &src[(y * w + rx) * pixel..];
            out.extend_from_slice(&row[..rw * pixel]);
        }
    } else {
        let plane = w * h * bytes_per_sample;
        for c in 0..channels {
            for y in ry..ry + rh {
                let row = &src[c * plane + (y * w + rx) * bytes_per_sample..];
                out.extend_from_slice(&row[..rw * bytes_per_sample]);
            }
        }
    }
    Ok(out)
}

// ===========================================================================
// Statistics and lookups
// ===========================================================================

/// Decodes a serialized plane of `kind` samples to their numeric values.
fn sample_values(plane: &[u8], kind: ElementKind, little_endian: bool) -> Result<Vec<f64>, Error> {
    Ok(match kind {
        ElementKind::U8 => plane.iter().map(|&b| b as f64).collect(),
        ElementKind::I8 => plane.iter().map(|&b| b as i8 as f64).collect(),
        ElementKind::U16 => decode_samples::<i16>(plane, little_endian)?
            .into_iter()
            .map(|v| v as u16 as f64)
            .collect(),
        ElementKind::I16 => decode_samples::<i16>(plane, little_endian)?
            .into_iter()
            .map(f64::from)
            .collect(),
        ElementKind::U32 => decode_samples::<i32>(plane, little_endian)?
            .into_iter()
            .map(|v| v as u32 as f64)
            .collect(),
        ElementKind::I32 => decode_samples::<i32>(plane, little_endian)?
            .into_iter()
            .map(f64::from)
            .collect(),
        ElementKind::F32 => decode_samples::<f32>(plane, little_endian)?
            .into_iter()
            .map(f64::from)
            .collect(),
        ElementKind::F64 => decode_samples::<f64>(plane, little_endian)?,
    })
}

/// Minimum and maximum of a serialized plane of `kind` samples; `None` for
/// an empty plane. NaN samples are skipped.
pub fn scan_data(plane: &[u8], kind: ElementKind, little_endian: bool) -> Result<Option<(f64, f64)>, Error> {
    Ok(sample_values(plane, kind, little_endian)?
        .into_iter()
        .filter(|v| !v.is_nan())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        }))
}

/// Rescales a serialized plane of `kind` samples to one byte per sample:
/// `min` and below become 0, `max` and above 255, values between scale by
/// `(v - min) / (max - min) * 255`, truncated.
///
/// One-byte kinds are returned as they are.
pub fn autoscale(
    plane: &[u8],
    min: i64,
    max: i64,
    kind: ElementKind,
    little_endian: bool,
) -> Result<Vec<u8>, Error> {
    if kind.bytes_per_sample() == 1 {
        return Ok(plane.to_vec());
    }
    let (lo, hi) = (min as f64, max as f64);
    Ok(sample_values(plane, kind, little_endian)?
        .into_iter()
        .map(|v| {
            if v >= hi {
                255
            } else if v <= lo {
                0
            } else {
                ((v - lo) / (hi - lo) * 255.0) as u8
            }
        })
        .collect())
}

fn lut_plane<T: Copy + Default>(row: Option<&Vec<T>>, indices: impl Iterator<Item = usize>) -> Vec<T> {
    match row {
        Some(row) => indices.map(|i| row.get(i).copied().unwrap_or_default()).collect(),
        None => indices.map(|_| T::default()).collect(),
    }
}

/// Expands 8-bit palette indices to red, green and blue planes.
/// Indices past the end of the table map to 0.
pub fn indexed_to_rgb8(lut: &[Vec<u8>], indices: &[u8]) -> Vec<Vec<u8>> {
    (0..3)
        .map(|c| lut_plane(lut.get(c), indices.iter().map(|&i| i as usize)))
        .collect()
}

/// Expands serialized 16-bit palette indices to red, green and blue planes.
pub fn indexed_to_rgb16(lut: &[Vec<u16>], indices: &[u8], little_endian: bool) -> Result<Vec<Vec<u16>>, Error> {
    let idx = decode_samples::<i16>(indices, little_endian)?;
    Ok((0..3)
        .map(|c| lut_plane(lut.get(c), idx.iter().map(|&i| i as u16 as usize)))
        .collect())
}

// ===========================================================================
// Padding
// ===========================================================================

/// Centers a `width` x `height` plane in a `new_width` x `new_height` one.
///
/// Larger targets pad with `T::default()`; smaller ones crop symmetrically.
pub fn pad_plane<T: Copy + Default>(
    plane: &[T],
    width: u32,
    height: u32,
    new_width: u32,
    new_height: u32,
) -> Result<Vec<T>, Error> {
    let (w, h) = (width as usize, height as usize);
    check_plane(plane.len(), w, h, 1)?;
    let (nw, nh) = (new_width as usize, new_height as usize);
    if nw == 0 || nh == 0 {
        return Err(Error::InvalidDimensions {
            width: new_width,
            height: new_height,
        });
    }
    // offset of the old plane inside the new one; negative when cropping
    let dx = (new_width as i64 - width as i64) / 2;
    let dy = (new_height as i64 - height as i64) / 2;
    let mut out = vec![T::default(); nw * nh];

    let x0 = dx.max(0) as usize;
    let x1 = (dx + width as i64).min(new_width as i64);
    if x1 <= x0 as i64 {
        return Ok(out);
    }
    let x1 = x1 as usize;
    for ny in 0..nh {
        let oy = ny as i64 - dy;
        if oy < 0 || oy >= height as i64 {
            continue;
        }
        let src_x = (x0 as i64 - dx) as usize;
        let src = &plane[oy as usize * w + src_x..][..x1 - x0];
        out[ny * nw + x0..ny * nw + x1].copy_from_slice(src);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_interleaved_and_planar() {
        let inter = [1u8, 2, 3, 4, 5, 6];
        assert_eq!(split_channel(&inter, 0, 3, 1, false, true).unwrap(), vec![1, 4]);
        assert_eq!(split_channel(&inter, 0, 3, 1, true, true).unwrap(), vec![3, 6]);
        let planar = [1u8, 2, 3, 4, 5, 6];
        assert_eq!(split_channel(&planar, 1, 3, 1, false, false).unwrap(), vec![3, 4]);
        let wide = [0u8, 1, 0, 2, 0, 3, 0, 4];
        assert_eq!(split_channel(&wide, 1, 2, 2, false, true).unwrap(), vec![0, 2, 0, 4]);
        assert!(split_channel(&inter, 3, 3, 1, false, true).is_err());
        assert!(split_channel(&inter[..5], 0, 3, 1, false, true).is_err());
    }

    #[test]
    fn bgr_swap_in_place() {
        let mut inter = vec![1u8, 2, 3, 4, 5, 6];
        bgr_to_rgb(&mut inter, true, 1, 3).unwrap();
        assert_eq!(inter, vec![3, 2, 1, 6, 5, 4]);
        let mut planar = vec![1u8, 1, 2, 2, 3, 3];
        bgr_to_rgb(&mut planar, false, 1, 3).unwrap();
        assert_eq!(planar, vec![3, 3, 2, 2, 1, 1]);
        let mut wide = vec![0u8, 1, 0, 2, 0, 3];
        bgr_to_rgb(&mut wide, true, 2, 3).unwrap();
        assert_eq!(wide, vec![0, 3, 0, 2, 0, 1]);
        let mut two = vec![1u8, 2];
        bgr_to_rgb(&mut two, true, 1, 2).unwrap();
        assert_eq!(two, vec![1, 2]);
    }

    #[test]
    fn subimage_copies() {
        // 3x2, two interleaved channels
        let src: Vec<u8> = (0..12).collect();
        let out = copy_subimage(&src, 3, 2, Rect::new(1, 1, 2, 1), 1, 2, true).unwrap();
        assert_eq!(out, vec![8, 9, 10, 11]);
        let out = copy_subimage(&src, 3, 2, Rect::new(1, 0, 1, 2), 1, 2, false).unwrap();
        assert_eq!(out, vec![1, 4, 7, 10]);
        assert!(copy_subimage(&src, 3, 2, Rect::new(2, 0, 2, 1), 1, 2, true).is_err());
        assert!(copy_subimage(&src[..11], 3, 2, Rect::new(0, 0, 1, 1), 1, 2, true).is_err());
    }

    #[test]
    fn scan_by_kind() {
        assert_eq!(scan_data(&[0xFF, 0x01], ElementKind::I8, false).unwrap(), Some((-1.0, 1.0)));
        assert_eq!(scan_data(&[0xFF, 0x01], ElementKind::U8, false).unwrap(), Some((1.0, 255.0)));
        assert_eq!(
            scan_data(&[0xFF, 0xFF, 0x00, 0x02], ElementKind::U16, false).unwrap(),
            Some((2.0, 65535.0))
        );
        assert_eq!(scan_data(&[], ElementKind::F32, true).unwrap(), None);
        assert!(scan_data(&[0; 3], ElementKind::I32, true).is_err());
    }

    #[test]
    fn autoscale_serialized_plane() {
        let be = [0x00u8, 0x0A, 0x00, 0x14, 0x00, 0x1E, 0xFF, 0xFF];
        assert_eq!(autoscale(&be, 10, 30, ElementKind::U16, false).unwrap(), vec![0, 127, 255, 255]);
        // -1 as a signed short sits below the window
        assert_eq!(autoscale(&be, 10, 30, ElementKind::I16, false).unwrap(), vec![0, 127, 255, 0]);
        let le = [0x0A, 0x00, 0x00, 0x00];
        assert_eq!(autoscale(&le, 0, 20, ElementKind::I32, true).unwrap(), vec![127]);
        assert_eq!(autoscale(&[7, 9], 0, 1, ElementKind::U8, true).unwrap(), vec![7, 9]);
        assert!(autoscale(&[0; 3], 0, 1, ElementKind::U16, true).is_err());
    }

    #[test]
    fn palette_expansion() {
        let lut = vec![vec![10u8, 11], vec![20, 21], vec![30, 31]];
        assert_eq!(
            indexed_to_rgb8(&lut, &[1, 0, 5]),
            vec![vec![11, 10, 0], vec![21, 20, 0], vec![31, 30, 0]]
        );
        let lut16 = vec![vec![0u16, 1000], vec![0, 2000], vec![0, 3000]];
        assert_eq!(
            indexed_to_rgb16(&lut16, &[0x01, 0x00], true).unwrap(),
            vec![vec![1000], vec![2000], vec![3000]]
        );
    }

    #[test]
    fn pad_centers_and_crops() {
        let plane = [1u8, 2, 3, 4];
        let padded = pad_plane(&plane, 2, 2, 4, 4).unwrap();
        assert_eq!(
            padded,
            vec![0, 0, 0, 0, 0, 1, 2, 0, 0, 3, 4, 0, 0, 0, 0, 0]
        );
        let cropped = pad_plane(&padded, 4, 4, 2, 2).unwrap();
        assert_eq!(cropped, plane.to_vec());
        // odd growth keeps the extra column on the right
        let odd = pad_plane(&plane, 2, 2, 3, 2).unwrap();
        assert_eq!(odd, vec![1, 2, 0, 3, 4, 0]);
        assert!(pad_plane(&plane, 2, 2, 0, 2).is_err());
        assert!(pad_plane(&plane, 3, 2, 4, 4).is_err());
    }
}

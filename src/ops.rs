//! Derived image operations: rescaling, padding, channel split and merge,
//! palette expansion and sub-images.

use alloc::vec;
use alloc::vec::Vec;

use log::debug;

use crate::Error;
use crate::color::{ColorMapping, Palette};
use crate::construct::{
    AssembledImage, assemble, construct_image, make_banded_image, make_banded_image_from_bytes,
};
use crate::layout::{ChannelOrder, Raster, Rect};
use crate::pack;
use crate::planes;
use crate::sample::ElementKind;
use crate::storage::{Banks, SampleBuffer};

/// Window for [`autoscale_with`]: `min` maps to 0, `max` to 255.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RescaleSpec {
    pub min: i64,
    pub max: i64,
}

impl RescaleSpec {
    pub const fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    #[inline]
    pub fn apply(&self, v: f64) -> u8 {
        Window::from(*self).apply(v)
    }
}

// Measured extremes, unrounded.
#[derive(Clone, Copy, Debug)]
struct Window {
    min: f64,
    max: f64,
}

impl Window {
    #[inline]
    fn apply(&self, v: f64) -> u8 {
        if v >= self.max {
            255
        } else if v <= self.min {
            0
        } else {
            ((v - self.min) / (self.max - self.min) * 256.0) as u8
        }
    }
}

impl From<RescaleSpec> for Window {
    fn from(spec: RescaleSpec) -> Self {
        Self {
            min: spec.min as f64,
            max: spec.max as f64,
        }
    }
}

/// Global minimum and maximum sample over every channel. `None` when the
/// image holds no non-NaN sample.
pub fn sample_range(image: &AssembledImage) -> Option<(f64, f64)> {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for c in 0..image.channels() {
        for y in 0..image.height() {
            for x in 0..image.width() {
                let v = image.get_sample_f64(x, y, c);
                if v.is_nan() {
                    continue;
                }
                lo = lo.min(v);
                hi = hi.max(v);
            }
        }
    }
    (lo <= hi).then_some((lo, hi))
}

/// Rescales to unsigned 8-bit using the global sample range, so the
/// smallest sample becomes 0 and the largest 255.
/// Unsigned 8-bit images come back unchanged.
pub fn autoscale(image: &AssembledImage) -> Result<AssembledImage, Error> {
    if image.kind() == ElementKind::U8 {
        return Ok(image.clone());
    }
    let (min, max) = sample_range(image).unwrap_or((0.0, 0.0));
    debug!("autoscaling {} image over [{min}, {max}]", image.kind());
    rescale(image, Window { min, max })
}

/// Rescales every sample through `spec` into a banded unsigned 8-bit image.
pub fn autoscale_with(image: &AssembledImage, spec: RescaleSpec) -> Result<AssembledImage, Error> {
    if image.kind() == ElementKind::U8 {
        return Ok(image.clone());
    }
    rescale(image, spec.into())
}

fn rescale(image: &AssembledImage, window: Window) -> Result<AssembledImage, Error> {
    let mut out = Vec::with_capacity(image.channels());
    for c in 0..image.channels() {
        let mut plane = Vec::with_capacity(image.bounds().pixel_count());
        for y in 0..image.height() {
            for x in 0..image.width() {
                plane.push(window.apply(image.get_sample_f64(x, y, c)));
            }
        }
        out.push(plane);
    }
    make_banded_image(out, image.width(), image.height(), false)
}

fn default_24_bit_max(kind: ElementKind) -> f64 {
    match kind {
        ElementKind::U8 | ElementKind::I8 => 255.0,
        ElementKind::U16 | ElementKind::I16 => 65535.0,
        ElementKind::U32 | ElementKind::I32 => u32::MAX as f64,
        ElementKind::F32 => f32::MAX as f64,
        ElementKind::F64 => f64::MAX,
    }
}

/// Red, green and blue display planes from the first three channels.
///
/// Byte kinds keep their raw bits. Wider kinds scale `(v - min) * 255 /
/// (max - min)`, truncated and clamped to 0–255; `min` defaults to 0 and
/// `max` to the kind's largest unsigned value. A single channel is
/// replicated as gray, a missing third channel is 0. `reverse` swaps red
/// and blue.
pub fn make_24_bits_planes(image: &AssembledImage, min: Option<f64>, max: Option<f64>, reverse: bool) -> Vec<Vec<u8>> {
    let kind = image.kind();
    let lo = min.unwrap_or(0.0);
    let hi = max.unwrap_or_else(|| default_24_bit_max(kind));
    let mult = if hi > lo { 255.0 / (hi - lo) } else { 0.0 };
    let channel = |c: usize| -> Vec<u8> {
        let mut plane = Vec::with_capacity(image.bounds().pixel_count());
        for y in 0..image.height() {
            for x in 0..image.width() {
                let v = image.get_sample_f64(x, y, c);
                plane.push(match kind {
                    ElementKind::U8 | ElementKind::I8 => v as i64 as u8,
                    _ => ((v - lo) * mult).clamp(0.0, 255.0) as u8,
                });
            }
        }
        plane
    };
    let mut rgb = match image.channels() {
        1 => {
            let gray = channel(0);
            vec![gray.clone(), gray.clone(), gray]
        }
        2 => vec![channel(0), channel(1), vec![0; image.bounds().pixel_count()]],
        _ => vec![channel(0), channel(1), channel(2)],
    };
    if reverse {
        rgb.swap(0, 2);
    }
    rgb
}

/// [`make_24_bits_planes`] packed into `0x00RRGGBB` words, one per pixel.
pub fn make_24_bits(image: &AssembledImage, min: Option<f64>, max: Option<f64>) -> Result<Vec<i32>, Error> {
    let rgb = make_24_bits_planes(image, min, max, false);
    let planes: Vec<&[u8]> = rgb.iter().map(Vec::as_slice).collect();
    pack::pack_planes(&planes, ChannelOrder::Rgb)
}

fn palette_mapping(image: &AssembledImage) -> Option<ColorMapping> {
    image.palette().cloned().map(ColorMapping::Indexed)
}

macro_rules! map_banks {
    ($banks:expr, $b:ident => $body:expr) => {
        match $banks {
            Banks::Bytes($b) => Banks::Bytes($body),
            Banks::Shorts($b) => Banks::Shorts($body),
            Banks::Ints($b) => Banks::Ints($body),
            Banks::Floats($b) => Banks::Floats($body),
            Banks::Doubles($b) => Banks::Doubles($body),
        }
    };
}

/// Centers the image in a `width` x `height` canvas, cropping or padding
/// with zero samples as needed. The result is banded.
pub fn pad_image(image: &AssembledImage, width: u32, height: u32) -> Result<AssembledImage, Error> {
    if image.width() == width && image.height() == height {
        return Ok(image.clone());
    }
    let (w, h) = (image.width(), image.height());
    let pixels = image.get_pixels(image.bounds())?;
    let banks = map_banks!(pixels, b => b
        .iter()
        .map(|p| planes::pad_plane(p, w, h, width, height))
        .collect::<Result<Vec<_>, Error>>()?);
    construct_image(
        image.channels(),
        image.kind(),
        width,
        height,
        false,
        true,
        banks,
        palette_mapping(image),
    )
}

/// One single-channel image per channel, in channel order.
pub fn split_channels(image: &AssembledImage) -> Result<Vec<AssembledImage>, Error> {
    if image.channels() == 1 {
        return Ok(vec![image.clone()]);
    }
    let kind = image.kind();
    image
        .get_pixels(image.bounds())?
        .split()
        .into_iter()
        .map(|bank| construct_image(1, kind, image.width(), image.height(), false, true, bank, None))
        .collect()
}

fn concat_banks(parts: Vec<Banks>) -> Option<Banks> {
    let mut iter = parts.into_iter();
    let mut acc = iter.next()?;
    for part in iter {
        match (&mut acc, part) {
            (Banks::Bytes(a), Banks::Bytes(b)) => a.extend(b),
            (Banks::Shorts(a), Banks::Shorts(b)) => a.extend(b),
            (Banks::Ints(a), Banks::Ints(b)) => a.extend(b),
            (Banks::Floats(a), Banks::Floats(b)) => a.extend(b),
            (Banks::Doubles(a), Banks::Doubles(b)) => a.extend(b),
            _ => return None,
        }
    }
    Some(acc)
}

/// Stacks the channels of several images into one banded image.
///
/// `None` when there are no images, their sizes or element kinds differ, or
/// the total would exceed four channels.
pub fn merge_channels(images: &[AssembledImage]) -> Option<AssembledImage> {
    let first = images.first()?;
    let (w, h, kind) = (first.width(), first.height(), first.kind());
    if images
        .iter()
        .any(|i| i.width() != w || i.height() != h || i.kind() != kind)
    {
        return None;
    }
    let channels: usize = images.iter().map(AssembledImage::channels).sum();
    if channels > 4 {
        return None;
    }
    let parts = images
        .iter()
        .map(|i| i.get_pixels(i.bounds()))
        .collect::<Result<Vec<_>, Error>>()
        .ok()?;
    let banks = concat_banks(parts)?;
    construct_image(channels, kind, w, h, false, true, banks, None).ok()
}

/// Expands a single-channel palette image into red, green and blue
/// channels. `None` without a palette.
pub fn indexed_to_rgb(image: &AssembledImage, little_endian: bool) -> Option<AssembledImage> {
    let palette = image.palette()?;
    if image.channels() != 1 {
        return None;
    }
    let indices = image
        .get_pixel_bytes(little_endian, image.bounds())
        .ok()?
        .into_iter()
        .next()?;
    let (w, h) = (image.width(), image.height());
    let result = match palette {
        Palette::Lut8(_) => {
            let lut = palette.table8()?;
            let rgb = match image.kind().bytes_per_sample() {
                1 => planes::indexed_to_rgb8(&lut, &indices),
                2 => {
                    // 16-bit indices into an 8-bit table
                    let wide = planes::indexed_to_rgb16(&widen(&lut), &indices, little_endian).ok()?;
                    wide.into_iter()
                        .map(|p| p.into_iter().map(|v| v as u8).collect())
                        .collect()
                }
                _ => return None,
            };
            make_banded_image(rgb, w, h, false)
        }
        Palette::Lut16(_) => {
            let lut = palette.table16()?;
            let rgb = match image.kind().bytes_per_sample() {
                1 => {
                    let idx: Vec<u8> = indices
                        .iter()
                        .flat_map(|&i| to_u16_bytes(i, little_endian))
                        .collect();
                    planes::indexed_to_rgb16(&lut, &idx, little_endian).ok()?
                }
                2 => planes::indexed_to_rgb16(&lut, &indices, little_endian).ok()?,
                _ => return None,
            };
            let shorts = rgb
                .into_iter()
                .map(|p| p.into_iter().map(|v| v as i16).collect())
                .collect();
            make_banded_image::<i16>(shorts, w, h, false)
        }
    };
    result.ok()
}

fn widen(lut: &[Vec<u8>]) -> Vec<Vec<u16>> {
    lut.iter()
        .map(|row| row.iter().map(|&v| v as u16).collect())
        .collect()
}

fn to_u16_bytes(v: u8, little_endian: bool) -> [u8; 2] {
    if little_endian {
        (v as u16).to_le_bytes()
    } else {
        (v as u16).to_be_bytes()
    }
}

/// Crops `rect` by serializing it at the given byte order and decoding it
/// again.
pub fn get_subimage(image: &AssembledImage, little_endian: bool, rect: Rect) -> Result<AssembledImage, Error> {
    let bytes = image.get_pixel_bytes(little_endian, rect)?;
    let planes: Vec<&[u8]> = bytes.iter().map(Vec::as_slice).collect();
    let sub = make_banded_image_from_bytes(&planes, rect.width, rect.height, image.kind(), little_endian)?;
    Ok(match palette_mapping(image) {
        Some(m) => sub.with_color(m),
        None => sub,
    })
}

/// Reinterprets signed integer samples as unsigned of the same width.
/// Float and unsigned images come back unchanged.
pub fn make_unsigned(image: &AssembledImage) -> Result<AssembledImage, Error> {
    let kind = image.kind();
    if !kind.is_signed() || kind.is_float() {
        return Ok(image.clone());
    }
    let raster = image.raster();
    let banks = raster.storage().banks().clone();
    let storage = SampleBuffer::new(kind.with_signedness(false), banks)?;
    let raster = Raster::new(
        raster.width(),
        raster.height(),
        raster.channels(),
        raster.layout(),
        storage,
    )?;
    Ok(assemble(raster, None, image.layout().little_endian))
}

/// All channels' big-endian bytes back to back. With `separated`, or for a
/// single-channel image, only channel 0 is returned.
pub fn get_bytes_merged(image: &AssembledImage, separated: bool) -> Result<Vec<u8>, Error> {
    let planes = image.get_pixel_bytes(false, image.bounds())?;
    if separated || planes.len() == 1 {
        return Ok(planes.into_iter().next().unwrap_or_default());
    }
    Ok(planes.concat())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::construct::{make_image, make_rgb_image};
    use crate::layout::RasterLayout;

    #[test]
    fn autoscale_hits_both_ends() {
        let img = make_image(vec![100i16, 200, 300, 400], 4, 1, 1, false, false).unwrap();
        let out = autoscale(&img).unwrap();
        assert_eq!(out.kind(), ElementKind::U8);
        let bytes = out.get_bytes(out.bounds()).unwrap();
        assert_eq!(bytes, vec![vec![0, 85, 170, 255]]);
    }

    #[test]
    fn autoscale_flat_is_all_255() {
        let img = make_image(vec![7i32; 6], 3, 2, 1, false, true).unwrap();
        let out = autoscale(&img).unwrap();
        assert!(out.get_bytes(out.bounds()).unwrap()[0].iter().all(|&v| v == 255));
    }

    #[test]
    fn autoscale_uses_global_range() {
        let img = make_banded_image(vec![vec![0i16, 10], vec![20, 40]], 2, 1, false).unwrap();
        let out = autoscale(&img).unwrap();
        let bytes = out.get_bytes(out.bounds()).unwrap();
        assert_eq!(bytes, vec![vec![0, 64], vec![128, 255]]);
    }

    #[test]
    fn autoscale_leaves_u8_alone() {
        let img = make_image(vec![3u8, 9], 2, 1, 1, false, false).unwrap();
        assert_eq!(autoscale(&img).unwrap(), img);
    }

    #[test]
    fn rescale_spec_thresholds() {
        let spec = RescaleSpec::new(10, 20);
        assert_eq!(spec.apply(10.0), 0);
        assert_eq!(spec.apply(5.0), 0);
        assert_eq!(spec.apply(20.0), 255);
        assert_eq!(spec.apply(15.0), 128);
        assert_eq!(RescaleSpec::new(4, 4).apply(4.0), 255);
    }

    #[test]
    fn float_range_is_exact() {
        let img = make_image(vec![-0.5f32, 2.25, f32::NAN], 3, 1, 1, false, true).unwrap();
        assert_eq!(sample_range(&img), Some((-0.5, 2.25)));
        let nan = make_image(vec![f64::NAN], 1, 1, 1, false, true).unwrap();
        assert_eq!(sample_range(&nan), None);
    }

    #[test]
    fn fractional_float_extremes_reach_both_ends() {
        let img = make_image(vec![0.5f32, 1.0, 2.5], 3, 1, 1, false, true).unwrap();
        let out = autoscale(&img).unwrap();
        assert_eq!(out.get_bytes(out.bounds()).unwrap(), vec![vec![0, 64, 255]]);

        let img = make_banded_image(vec![vec![-0.25f64, 0.1], vec![0.3, 0.75]], 2, 1, true).unwrap();
        let out = autoscale(&img).unwrap();
        let planes = out.get_bytes(out.bounds()).unwrap();
        assert_eq!(planes[0][0], 0);
        assert_eq!(planes[1][1], 255);
    }

    #[test]
    fn twenty_four_bit_gray_uses_kind_range() {
        let img = make_image(vec![0i16, -1, -32768], 3, 1, 1, false, false).unwrap();
        assert_eq!(img.kind(), ElementKind::U16);
        let rgb = make_24_bits_planes(&img, None, None, false);
        assert_eq!(rgb, vec![vec![0, 255, 127]; 3]);
        let words = make_24_bits(&img, None, None).unwrap();
        assert_eq!(words, vec![0, 0x00FF_FFFF, 0x007F_7F7F]);
    }

    #[test]
    fn twenty_four_bit_window_and_order() {
        let img = make_banded_image(
            vec![vec![100i32, 300], vec![200, 0], vec![300, 500]],
            2,
            1,
            true,
        )
        .unwrap();
        let rgb = make_24_bits_planes(&img, Some(100.0), Some(300.0), false);
        assert_eq!(rgb, vec![vec![0, 255], vec![127, 0], vec![255, 255]]);
        let bgr = make_24_bits_planes(&img, Some(100.0), Some(300.0), true);
        assert_eq!(bgr[0], rgb[2]);
        assert_eq!(bgr[2], rgb[0]);
        let words = make_24_bits(&img, Some(100.0), Some(300.0)).unwrap();
        assert_eq!(words[0], 0x0000_7FFF);
    }

    #[test]
    fn twenty_four_bit_bytes_keep_raw_bits() {
        let img = make_banded_image(vec![vec![0xFFu8, 1], vec![2, 3]], 2, 1, true).unwrap();
        let rgb = make_24_bits_planes(&img, Some(50.0), Some(60.0), false);
        assert_eq!(rgb, vec![vec![0xFF, 1], vec![2, 3], vec![0, 0]]);
    }

    #[test]
    fn pad_then_crop_restores_center() {
        let img = make_banded_image(vec![vec![1i16, 2, 3, 4], vec![5, 6, 7, 8]], 2, 2, true).unwrap();
        let padded = pad_image(&img, 4, 3).unwrap();
        assert_eq!(padded.raster().layout(), RasterLayout::Banded);
        assert_eq!(padded.get_sample(0, 0, 0), 0);
        assert_eq!(padded.get_sample(1, 0, 0), 1);
        assert_eq!(padded.get_sample(2, 1, 1), 8);
        assert_eq!(padded.get_sample(3, 2, 1), 0);
        let back = pad_image(&padded, 2, 2).unwrap();
        assert_eq!(back.get_shorts(back.bounds()).unwrap(), img.get_shorts(img.bounds()).unwrap());
    }

    #[test]
    fn split_then_merge() {
        let img = make_rgb_image(&[1, 2, 3, 4, 5, 6], 3, 2, 1, true).unwrap();
        let parts = split_channels(&img).unwrap();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[2].get_bytes(parts[2].bounds()).unwrap(), vec![vec![3, 6]]);
        let merged = merge_channels(&parts).unwrap();
        assert_eq!(merged.channels(), 3);
        assert_eq!(merged.get_bytes(merged.bounds()).unwrap(), img.get_bytes(img.bounds()).unwrap());
    }

    #[test]
    fn merge_rejects_incompatible() {
        let a = make_image(vec![0u8; 2], 2, 1, 1, false, false).unwrap();
        let b = make_image(vec![0i16; 2], 2, 1, 1, false, false).unwrap();
        let c = make_image(vec![0u8; 3], 3, 1, 1, false, false).unwrap();
        assert!(merge_channels(&[]).is_none());
        assert!(merge_channels(&[a.clone(), b]).is_none());
        assert!(merge_channels(&[a.clone(), c]).is_none());
        assert!(merge_channels(&[a.clone(), a.clone(), a.clone(), a.clone(), a]).is_none());
    }

    #[test]
    fn indexed_expansion() {
        let p = Palette::from_table8(&[vec![0, 10], vec![0, 20], vec![0, 30]]).unwrap();
        let img = make_image(vec![1u8, 0], 2, 1, 1, false, false)
            .unwrap()
            .with_color(ColorMapping::Indexed(p));
        let rgb = indexed_to_rgb(&img, false).unwrap();
        assert_eq!(
            rgb.get_bytes(rgb.bounds()).unwrap(),
            vec![vec![10, 0], vec![20, 0], vec![30, 0]]
        );

        let p16 = Palette::from_table16(&[vec![0, 100], vec![0, 200], vec![0, 300]]).unwrap();
        let img = make_image(vec![1i16], 1, 1, 1, false, false)
            .unwrap()
            .with_color(ColorMapping::Indexed(p16));
        let rgb = indexed_to_rgb(&img, true).unwrap();
        assert_eq!(rgb.kind(), ElementKind::U16);
        assert_eq!(rgb.get_shorts(rgb.bounds()).unwrap(), vec![vec![100], vec![200], vec![300]]);

        let plain = make_image(vec![1u8], 1, 1, 1, false, false).unwrap();
        assert!(indexed_to_rgb(&plain, false).is_none());
    }

    #[test]
    fn subimage_through_bytes() {
        let img = make_image(vec![1i32, 2, 3, 4, 5, 6], 3, 2, 1, false, true).unwrap();
        for little in [true, false] {
            let sub = get_subimage(&img, little, Rect::new(1, 0, 2, 2)).unwrap();
            assert_eq!(sub.get_ints(sub.bounds()).unwrap(), vec![vec![2, 3, 5, 6]]);
            assert_eq!(sub.kind(), ElementKind::I32);
        }
    }

    #[test]
    fn unsigned_reinterpretation() {
        let img = make_image(vec![-1i16, 5], 2, 1, 1, false, true).unwrap();
        let out = make_unsigned(&img).unwrap();
        assert_eq!(out.kind(), ElementKind::U16);
        assert_eq!(out.get_sample(0, 0, 0), 65535);
        let f = make_image(vec![-1.0f64], 1, 1, 1, false, true).unwrap();
        assert_eq!(make_unsigned(&f).unwrap(), f);
    }

    #[test]
    fn merged_bytes() {
        let img = make_banded_image(vec![vec![1u8, 2], vec![3, 4]], 2, 1, false).unwrap();
        assert_eq!(get_bytes_merged(&img, false).unwrap(), vec![1, 2, 3, 4]);
        assert_eq!(get_bytes_merged(&img, true).unwrap(), vec![1, 2]);
    }
}

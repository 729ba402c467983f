//! Assembling addressable images from raw payloads and typed arrays.

use alloc::vec;
use alloc::vec::Vec;

use log::{debug, warn};

use crate::Error;
use crate::color::{ColorMapping, Palette};
use crate::layout::{ChannelOrder, Raster, RasterLayout, SampleLayout, check_dimensions};
use crate::pack;
use crate::sample::{ElementKind, NativeType, Sample, decode_samples};
use crate::storage::{Banks, SampleBuffer};

/// The kind of image a host renderer should treat the result as.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HostFormat {
    /// Single-channel unsigned bytes.
    Gray8,
    /// Single-channel bytes looked up through a palette.
    Indexed8,
    /// Single-channel unsigned shorts.
    Gray16,
    /// Three 8-bit channels per 32-bit word, channel 0 highest.
    IntRgb,
    /// Three 8-bit channels per 32-bit word, channel 0 lowest.
    IntBgr,
    /// Four 8-bit channels per 32-bit word.
    IntArgb,
    /// Anything else: read samples through the raster.
    Component,
}

/// Storage, raster layout and color mapping, ready for a host to render.
#[derive(Clone, Debug, PartialEq)]
pub struct AssembledImage {
    layout: SampleLayout,
    raster: Raster,
    color: ColorMapping,
    host: HostFormat,
}

impl AssembledImage {
    pub fn width(&self) -> u32 {
        self.raster.width()
    }

    pub fn height(&self) -> u32 {
        self.raster.height()
    }

    pub fn channels(&self) -> usize {
        self.raster.channels()
    }

    pub fn kind(&self) -> ElementKind {
        self.raster.kind()
    }

    pub fn layout(&self) -> &SampleLayout {
        &self.layout
    }

    pub fn raster(&self) -> &Raster {
        &self.raster
    }

    pub fn color(&self) -> &ColorMapping {
        &self.color
    }

    pub fn palette(&self) -> Option<&Palette> {
        self.color.palette()
    }

    pub fn host_format(&self) -> HostFormat {
        self.host
    }

    pub fn into_raster(self) -> Raster {
        self.raster
    }

    pub fn get_sample(&self, x: u32, y: u32, channel: usize) -> i64 {
        self.raster.get_sample(x, y, channel)
    }

    pub fn get_sample_f64(&self, x: u32, y: u32, channel: usize) -> f64 {
        self.raster.get_sample_f64(x, y, channel)
    }

    /// Display color of one pixel through the image's color mapping.
    pub fn display_rgba(&self, x: u32, y: u32) -> [u8; 4] {
        let n = self.channels().min(4);
        let mut samples = [0.0f64; 4];
        for (c, s) in samples.iter_mut().enumerate().take(n) {
            *s = self.get_sample_f64(x, y, c);
        }
        self.color.rgba(self.kind(), &samples[..n])
    }

    /// Replaces the color mapping. A palette only sticks to single-channel
    /// images; otherwise the kind's default mapping is used.
    pub fn with_color(self, mapping: ColorMapping) -> Self {
        assemble(self.raster, Some(mapping), self.layout.little_endian)
    }
}

fn host_format(raster: &Raster, color: &ColorMapping) -> HostFormat {
    match raster.layout() {
        RasterLayout::Packed { order } => match (raster.channels(), order) {
            (4, _) => HostFormat::IntArgb,
            (_, ChannelOrder::Rgb) => HostFormat::IntRgb,
            (_, ChannelOrder::Bgr) => HostFormat::IntBgr,
        },
        _ if raster.channels() == 1 => match (raster.kind(), color) {
            (ElementKind::U8, ColorMapping::Indexed(_)) => HostFormat::Indexed8,
            (ElementKind::U8, _) => HostFormat::Gray8,
            (ElementKind::U16, ColorMapping::Unsigned { .. }) => HostFormat::Gray16,
            _ => HostFormat::Component,
        },
        _ => HostFormat::Component,
    }
}

/// Wraps an already validated raster with a color mapping.
///
/// `mapping` defaults to [`ColorMapping::for_kind`]; an indexed mapping on a
/// multi-channel raster is dropped.
pub fn assemble(raster: Raster, mapping: Option<ColorMapping>, little_endian: bool) -> AssembledImage {
    let kind = raster.kind();
    let color = match mapping {
        Some(ColorMapping::Indexed(_)) if raster.channels() != 1 => {
            warn!(
                "dropping palette: image has {} channels, palettes need exactly one",
                raster.channels()
            );
            ColorMapping::for_kind(kind)
        }
        Some(m) => {
            if m.palette().is_some() {
                debug!("attaching palette to {kind} image");
            }
            m
        }
        None => ColorMapping::for_kind(kind),
    };
    let host = host_format(&raster, &color);
    let layout = SampleLayout {
        width: raster.width(),
        height: raster.height(),
        channels: raster.channels(),
        interleaved: matches!(
            raster.layout(),
            RasterLayout::Interleaved | RasterLayout::Packed { .. }
        ),
        signed: kind.is_signed(),
        kind,
        little_endian,
    };
    debug!(
        "assembled {}x{} {kind} image: {} channels, {:?}, {host:?}",
        layout.width,
        layout.height,
        layout.channels,
        raster.layout()
    );
    AssembledImage {
        layout,
        raster,
        color,
        host,
    }
}

/// Chooses storage layout and color mapping for a set of banks.
///
/// `U8` samples over `Int` banks are packed color words. Otherwise the
/// layout is banded, interleaved or planar, in that order of preference.
#[allow(clippy::too_many_arguments)]
pub fn construct_image(
    channels: usize,
    kind: ElementKind,
    width: u32,
    height: u32,
    interleaved: bool,
    banded: bool,
    banks: Banks,
    mapping: Option<ColorMapping>,
) -> Result<AssembledImage, Error> {
    if channels == 0 {
        return Err(Error::UnsupportedChannelCount(0));
    }
    check_dimensions(width, height)?;
    let packed = kind == ElementKind::U8 && banks.native() == NativeType::Int;
    if packed && !(3..=4).contains(&channels) {
        return Err(Error::UnsupportedChannelCount(channels));
    }
    let layout = if packed {
        RasterLayout::Packed {
            order: ChannelOrder::Rgb,
        }
    } else if banded {
        RasterLayout::Banded
    } else if interleaved {
        RasterLayout::Interleaved
    } else {
        RasterLayout::Planar
    };
    let storage = SampleBuffer::new(kind, banks)?;
    let raster = Raster::new(width, height, channels, layout, storage)?;
    Ok(assemble(raster, mapping, false))
}

fn pixels(width: u32, height: u32) -> usize {
    width as usize * height as usize
}

/// Builds an image from one array holding every channel.
///
/// Unsigned 8-bit data with 3 or 4 channels packs into color words.
pub fn make_image<T: Sample>(
    data: Vec<T>,
    width: u32,
    height: u32,
    channels: usize,
    interleaved: bool,
    signed: bool,
) -> Result<AssembledImage, Error> {
    let kind = T::kind(signed);
    let banks = T::into_banks(vec![data]);
    if let Banks::Bytes(b) = &banks
        && !signed
        && (3..=4).contains(&channels)
    {
        return make_rgb_image(&b[0], channels, width, height, interleaved);
    }
    construct_image(channels, kind, width, height, interleaved, false, banks, None)
}

/// Builds an image with one array per channel.
pub fn make_banded_image<T: Sample>(
    data: Vec<Vec<T>>,
    width: u32,
    height: u32,
    signed: bool,
) -> Result<AssembledImage, Error> {
    let channels = data.len();
    let kind = T::kind(signed);
    construct_image(channels, kind, width, height, false, true, T::into_banks(data), None)
}

/// Decodes a serialized plane as described by `layout` and builds an image.
pub fn make_image_from_bytes(bytes: &[u8], layout: &SampleLayout) -> Result<AssembledImage, Error> {
    layout.validate()?;
    let kind = layout.resolved_kind();
    let (w, h, c, il, le) = (
        layout.width,
        layout.height,
        layout.channels,
        layout.interleaved,
        layout.little_endian,
    );
    let signed = kind.is_signed();
    let mut image = match kind.native() {
        NativeType::Byte => make_image(bytes.to_vec(), w, h, c, il, signed),
        NativeType::Short => make_image(decode_samples::<i16>(bytes, le)?, w, h, c, il, signed),
        NativeType::Int => make_image(decode_samples::<i32>(bytes, le)?, w, h, c, il, signed),
        NativeType::Float => make_image(decode_samples::<f32>(bytes, le)?, w, h, c, il, signed),
        NativeType::Double => make_image(decode_samples::<f64>(bytes, le)?, w, h, c, il, signed),
    }?;
    image.layout.little_endian = le;
    Ok(image)
}

/// Decodes one serialized plane per channel.
pub fn make_banded_image_from_bytes(
    planes: &[&[u8]],
    width: u32,
    height: u32,
    kind: ElementKind,
    little_endian: bool,
) -> Result<AssembledImage, Error> {
    fn decode_all<T: Sample>(planes: &[&[u8]], little_endian: bool) -> Result<Vec<Vec<T>>, Error> {
        planes.iter().map(|p| decode_samples::<T>(p, little_endian)).collect()
    }
    let signed = kind.is_signed();
    let mut image = match kind.native() {
        NativeType::Byte => {
            let data = planes.iter().map(|p| p.to_vec()).collect();
            make_banded_image::<u8>(data, width, height, signed)
        }
        NativeType::Short => {
            make_banded_image(decode_all::<i16>(planes, little_endian)?, width, height, signed)
        }
        NativeType::Int => {
            make_banded_image(decode_all::<i32>(planes, little_endian)?, width, height, signed)
        }
        NativeType::Float => {
            make_banded_image(decode_all::<f32>(planes, little_endian)?, width, height, signed)
        }
        NativeType::Double => {
            make_banded_image(decode_all::<f64>(planes, little_endian)?, width, height, signed)
        }
    }?;
    image.layout.little_endian = little_endian;
    Ok(image)
}

/// Packs 3 or 4 channels of 8-bit data, interleaved or planar, into color
/// words.
pub fn make_rgb_image(
    data: &[u8],
    channels: usize,
    width: u32,
    height: u32,
    interleaved: bool,
) -> Result<AssembledImage, Error> {
    check_dimensions(width, height)?;
    if !(3..=4).contains(&channels) {
        return Err(Error::UnsupportedChannelCount(channels));
    }
    let n = pixels(width, height);
    if data.len() != n * channels {
        return Err(Error::ShapeMismatch {
            expected: n * channels,
            actual: data.len(),
        });
    }
    let words = if interleaved {
        pack::pack_interleaved(data, channels, ChannelOrder::Rgb)?
    } else {
        let planes: Vec<&[u8]> = data.chunks_exact(n).collect();
        pack::pack_planes(&planes, ChannelOrder::Rgb)?
    };
    debug!("packed {channels}-channel {width}x{height} image into color words");
    construct_image(
        channels,
        ElementKind::U8,
        width,
        height,
        interleaved,
        false,
        Banks::Ints(vec![words]),
        None,
    )
}

/// Packs one 8-bit plane per channel into color words.
pub fn make_rgb_image_banded(planes: &[Vec<u8>], width: u32, height: u32) -> Result<AssembledImage, Error> {
    check_dimensions(width, height)?;
    let refs: Vec<&[u8]> = planes.iter().map(Vec::as_slice).collect();
    let words = pack::pack_planes(&refs, ChannelOrder::Rgb)?;
    construct_image(
        planes.len(),
        ElementKind::U8,
        width,
        height,
        false,
        true,
        Banks::Ints(vec![words]),
        None,
    )
}

/// Packs typed RGB pixels, row-major and tightly packed, into color words.
#[cfg(feature = "rgb")]
pub fn make_image_from_rgb(pixels: &[rgb::Rgb<u8>], width: u32, height: u32) -> Result<AssembledImage, Error> {
    make_rgb_image(bytemuck::cast_slice(pixels), 3, width, height, true)
}

/// Packs typed RGBA pixels, row-major and tightly packed, into color words.
#[cfg(feature = "rgb")]
pub fn make_image_from_rgba(pixels: &[rgb::Rgba<u8>], width: u32, height: u32) -> Result<AssembledImage, Error> {
    make_rgb_image(bytemuck::cast_slice(pixels), 4, width, height, true)
}

/// A zero-filled banded image.
pub fn blank_image(width: u32, height: u32, channels: usize, kind: ElementKind) -> Result<AssembledImage, Error> {
    let storage = SampleBuffer::zeroed(kind, channels, pixels(width, height));
    construct_image(
        channels,
        kind,
        width,
        height,
        false,
        true,
        storage.into_banks(),
        None,
    )
}

/// What a decoder hands over alongside a serialized plane.
#[derive(Clone, Debug, PartialEq)]
pub struct PlaneDescriptor {
    pub layout: SampleLayout,
    /// Float samples should be rescaled to [0, 1].
    pub normalized: bool,
    /// Samples are palette indices.
    pub indexed: bool,
    pub palette: Option<Palette>,
}

impl PlaneDescriptor {
    pub fn new(layout: SampleLayout) -> Self {
        Self {
            layout,
            normalized: false,
            indexed: false,
            palette: None,
        }
    }

    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.indexed = true;
        self.palette = Some(palette);
        self
    }

    pub fn with_normalized(mut self, normalized: bool) -> Self {
        self.normalized = normalized;
        self
    }
}

/// Builds a display-ready image from a decoder's plane.
///
/// Float planes flagged as normalized are rescaled to [0, 1]; signed integer
/// kinds get the signed color mapping; a single-channel indexed plane picks
/// up the descriptor's palette.
pub fn open_image(buf: &[u8], desc: &PlaneDescriptor) -> Result<AssembledImage, Error> {
    let layout = &desc.layout;
    layout.validate()?;
    let kind = layout.resolved_kind();
    let (w, h, c, il, le) = (
        layout.width,
        layout.height,
        layout.channels,
        layout.interleaved,
        layout.little_endian,
    );

    let image = match kind {
        ElementKind::F32 => {
            let mut f = decode_samples::<f32>(buf, le)?;
            if desc.normalized {
                normalize_floats(&mut f);
            }
            make_image(f, w, h, c, il, true)?
        }
        ElementKind::F64 => {
            let mut d = decode_samples::<f64>(buf, le)?;
            if desc.normalized {
                normalize_doubles(&mut d);
            }
            make_image(d, w, h, c, il, true)?
        }
        _ => make_image_from_bytes(buf, layout)?,
    };

    if !desc.indexed {
        return Ok(image);
    }
    if c != 1 {
        warn!("ignoring palette for indexed plane with {c} channels");
        return Ok(image);
    }
    match &desc.palette {
        Some(p) if !kind.is_float() && kind.bytes_per_sample() <= 2 => {
            Ok(image.with_color(ColorMapping::Indexed(p.clone())))
        }
        Some(_) => {
            warn!("palettes apply to 8- and 16-bit samples, not {kind}");
            Ok(image)
        }
        None => {
            warn!("indexed {kind} plane arrived without a palette");
            Ok(image)
        }
    }
}

macro_rules! normalize_impl {
    ($name:ident, $t:ty) => {
        /// Rescales finite values to [0, 1] by their min and max. Infinities
        /// clamp to the ends; a flat or empty plane becomes all zeros.
        pub fn $name(data: &mut [$t]) {
            let mut min = <$t>::MAX;
            let mut max = <$t>::MIN;
            for &v in data.iter().filter(|v| v.is_finite()) {
                min = min.min(v);
                max = max.max(v);
            }
            let range = max - min;
            if !(range > 0.0) {
                data.iter_mut().for_each(|v| *v = 0.0);
                return;
            }
            for v in data.iter_mut() {
                let clamped = if *v == <$t>::INFINITY {
                    max
                } else if *v == <$t>::NEG_INFINITY {
                    min
                } else {
                    *v
                };
                *v = (clamped - min) / range;
            }
        }
    };
}

normalize_impl!(normalize_floats, f32);
normalize_impl!(normalize_doubles, f64);

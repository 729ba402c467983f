//! Layout descriptors and the addressable raster built from them.

use crate::Error;
use crate::sample::ElementKind;
use crate::storage::SampleBuffer;

/// What a decoder says about one plane of samples.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SampleLayout {
    pub width: u32,
    pub height: u32,
    /// Channels per pixel, at least 1.
    pub channels: usize,
    /// Channels stored pixel-by-pixel rather than plane-by-plane.
    pub interleaved: bool,
    /// Integer signedness as reported by the decoder.
    pub signed: bool,
    pub kind: ElementKind,
    /// Byte order of the serialized payload.
    pub little_endian: bool,
}

impl SampleLayout {
    /// Planar, big-endian layout whose signedness follows `kind`.
    pub fn new(width: u32, height: u32, channels: usize, kind: ElementKind) -> Self {
        Self {
            width,
            height,
            channels,
            interleaved: false,
            signed: kind.is_signed(),
            kind,
            little_endian: false,
        }
    }

    pub fn with_interleaved(mut self, interleaved: bool) -> Self {
        self.interleaved = interleaved;
        self
    }

    pub fn with_little_endian(mut self, little_endian: bool) -> Self {
        self.little_endian = little_endian;
        self
    }

    pub fn with_signed(mut self, signed: bool) -> Self {
        self.signed = signed;
        self
    }

    /// The element kind after applying `signed` to integer kinds.
    pub fn resolved_kind(&self) -> ElementKind {
        self.kind.with_signedness(self.signed)
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Bytes of one fully serialized plane, all channels included.
    pub fn plane_bytes(&self) -> usize {
        self.pixel_count() * self.channels * self.kind.bytes_per_sample()
    }

    pub fn validate(&self) -> Result<(), Error> {
        check_dimensions(self.width, self.height)?;
        if self.channels == 0 {
            return Err(Error::UnsupportedChannelCount(0));
        }
        Ok(())
    }
}

pub(crate) fn check_dimensions(width: u32, height: u32) -> Result<(), Error> {
    if width == 0 || height == 0 {
        Err(Error::InvalidDimensions { width, height })
    } else {
        Ok(())
    }
}

/// Which end of a packed 32-bit word holds channel 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChannelOrder {
    /// Channel 0 in the highest used byte.
    Rgb,
    /// Channel 0 in the lowest byte.
    Bgr,
}

impl ChannelOrder {
    /// Bit offset of `channel` within a word of `channels` 8-bit channels.
    #[inline]
    pub const fn shift(self, channels: usize, channel: usize) -> u32 {
        match self {
            ChannelOrder::Rgb => ((channels - 1 - channel) * 8) as u32,
            ChannelOrder::Bgr => (channel * 8) as u32,
        }
    }
}

/// How logical samples `(x, y, channel)` map onto banks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RasterLayout {
    /// One 32-bit word per pixel holding 3 or 4 8-bit channels.
    Packed { order: ChannelOrder },
    /// One bank per channel.
    Banded,
    /// One bank, pixel-interleaved with stride `channels`.
    Interleaved,
    /// One bank, channel `c` starting at `c * width * height`.
    Planar,
}

impl RasterLayout {
    pub const fn bank_count(self, channels: usize) -> usize {
        match self {
            RasterLayout::Banded => channels,
            _ => 1,
        }
    }

    pub const fn bank_len(self, pixels: usize, channels: usize) -> usize {
        match self {
            RasterLayout::Packed { .. } | RasterLayout::Banded => pixels,
            RasterLayout::Interleaved | RasterLayout::Planar => pixels * channels,
        }
    }
}

/// A rectangle in pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The whole of a `width` x `height` image.
    pub const fn full(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Fails unless the rectangle lies inside a `width` x `height` image.
    pub fn check_within(&self, width: u32, height: u32) -> Result<(), Error> {
        let fits_x = (self.x as u64 + self.width as u64) <= width as u64;
        let fits_y = (self.y as u64 + self.height as u64) <= height as u64;
        if fits_x && fits_y {
            Ok(())
        } else {
            Err(Error::RegionOutOfBounds {
                x: self.x,
                y: self.y,
                width: self.width,
                height: self.height,
            })
        }
    }
}

/// Sample storage plus the layout that addresses it.
#[derive(Clone, Debug, PartialEq)]
pub struct Raster {
    width: u32,
    height: u32,
    channels: usize,
    layout: RasterLayout,
    storage: SampleBuffer,
}

impl Raster {
    /// Checks bank count and bank length against the layout.
    pub fn new(
        width: u32,
        height: u32,
        channels: usize,
        layout: RasterLayout,
        storage: SampleBuffer,
    ) -> Result<Self, Error> {
        check_dimensions(width, height)?;
        if channels == 0 {
            return Err(Error::UnsupportedChannelCount(0));
        }
        if matches!(layout, RasterLayout::Packed { .. })
            && (!storage.is_packed_words() || !(3..=4).contains(&channels))
        {
            return Err(Error::UnsupportedChannelCount(channels));
        }
        let expected_banks = layout.bank_count(channels);
        if storage.bank_count() != expected_banks {
            return Err(Error::BankCountMismatch {
                expected: expected_banks,
                actual: storage.bank_count(),
            });
        }
        let pixels = width as usize * height as usize;
        let expected = layout.bank_len(pixels, channels);
        if storage.bank_len() != expected {
            return Err(Error::ShapeMismatch {
                expected,
                actual: storage.bank_len(),
            });
        }
        Ok(Self {
            width,
            height,
            channels,
            layout,
            storage,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn layout(&self) -> RasterLayout {
        self.layout
    }

    pub fn storage(&self) -> &SampleBuffer {
        &self.storage
    }

    pub fn into_storage(self) -> SampleBuffer {
        self.storage
    }

    pub fn kind(&self) -> ElementKind {
        self.storage.kind()
    }

    /// `(bank, index)` of a logical sample.
    #[inline]
    pub fn address(&self, x: u32, y: u32, channel: usize) -> (usize, usize) {
        let pixel = y as usize * self.width as usize + x as usize;
        match self.layout {
            RasterLayout::Packed { .. } => (0, pixel),
            RasterLayout::Banded => (channel, pixel),
            RasterLayout::Interleaved => (0, pixel * self.channels + channel),
            RasterLayout::Planar => {
                let plane = self.width as usize * self.height as usize;
                (0, channel * plane + pixel)
            }
        }
    }

    /// Reads one logical sample, widened through the element kind.
    ///
    /// Panics if the coordinates fall outside the raster.
    #[inline]
    pub fn get_sample(&self, x: u32, y: u32, channel: usize) -> i64 {
        assert!(x < self.width && y < self.height && channel < self.channels);
        let (bank, index) = self.address(x, y, channel);
        let raw = self.storage.get_element(bank, index);
        match self.layout {
            RasterLayout::Packed { order } => (raw >> order.shift(self.channels, channel)) & 0xFF,
            _ => raw,
        }
    }

    #[inline]
    pub fn get_sample_f64(&self, x: u32, y: u32, channel: usize) -> f64 {
        match self.layout {
            RasterLayout::Packed { .. } => self.get_sample(x, y, channel) as f64,
            _ => {
                assert!(x < self.width && y < self.height && channel < self.channels);
                let (bank, index) = self.address(x, y, channel);
                self.storage.get_element_f64(bank, index)
            }
        }
    }

    #[inline]
    pub fn set_sample(&mut self, x: u32, y: u32, channel: usize, value: i64) {
        assert!(x < self.width && y < self.height && channel < self.channels);
        let (bank, index) = self.address(x, y, channel);
        match self.layout {
            RasterLayout::Packed { order } => {
                let shift = order.shift(self.channels, channel);
                let word = self.storage.get_element(bank, index);
                let word = (word & !(0xFF << shift)) | ((value & 0xFF) << shift);
                self.storage.set_element(bank, index, word);
            }
            _ => self.storage.set_element(bank, index, value),
        }
    }

    #[inline]
    pub fn set_sample_f64(&mut self, x: u32, y: u32, channel: usize, value: f64) {
        match self.layout {
            RasterLayout::Packed { .. } => self.set_sample(x, y, channel, value as i64),
            _ => {
                assert!(x < self.width && y < self.height && channel < self.channels);
                let (bank, index) = self.address(x, y, channel);
                self.storage.set_element_f64(bank, index, value);
            }
        }
    }
}

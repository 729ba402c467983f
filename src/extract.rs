//! Reading typed samples back out of an [`AssembledImage`].

use alloc::vec::Vec;

use crate::Error;
use crate::construct::AssembledImage;
use crate::layout::{Rect, RasterLayout};
use crate::pack;
use crate::sample::{NativeType, Sample, encode_samples};
use crate::storage::Banks;

impl AssembledImage {
    /// The whole image as a rectangle.
    pub fn bounds(&self) -> Rect {
        Rect::full(self.width(), self.height())
    }

    /// Borrows the backing banks when they already are one contiguous
    /// plane per channel in `T`. No copy is made.
    pub fn borrow_banks<T: Sample>(&self) -> Option<&[Vec<T>]> {
        let raster = self.raster();
        let direct = match raster.layout() {
            RasterLayout::Banded => true,
            RasterLayout::Interleaved | RasterLayout::Planar => raster.channels() == 1,
            RasterLayout::Packed { .. } => false,
        };
        let storage = raster.storage();
        if !direct || storage.bank_count() != raster.channels() {
            return None;
        }
        T::banks(storage.banks())
    }

    /// Copies `rect` out as one `Vec` per channel, converting each sample
    /// with `as` semantics.
    pub fn samples<T: Sample>(&self, rect: Rect) -> Result<Vec<Vec<T>>, Error> {
        rect.check_within(self.width(), self.height())?;
        if rect == self.bounds()
            && let Some(banks) = self.borrow_banks::<T>()
        {
            return Ok(banks.to_vec());
        }
        let float = self.kind().is_float();
        let mut out = Vec::with_capacity(self.channels());
        for c in 0..self.channels() {
            let mut plane = Vec::with_capacity(rect.pixel_count());
            for y in rect.y..rect.y + rect.height {
                for x in rect.x..rect.x + rect.width {
                    plane.push(if float {
                        T::from_f64(self.get_sample_f64(x, y, c))
                    } else {
                        T::from_i64(self.get_sample(x, y, c))
                    });
                }
            }
            out.push(plane);
        }
        Ok(out)
    }

    pub fn get_bytes(&self, rect: Rect) -> Result<Vec<Vec<u8>>, Error> {
        self.samples(rect)
    }

    pub fn get_shorts(&self, rect: Rect) -> Result<Vec<Vec<i16>>, Error> {
        self.samples(rect)
    }

    pub fn get_ints(&self, rect: Rect) -> Result<Vec<Vec<i32>>, Error> {
        self.samples(rect)
    }

    pub fn get_floats(&self, rect: Rect) -> Result<Vec<Vec<f32>>, Error> {
        self.samples(rect)
    }

    pub fn get_doubles(&self, rect: Rect) -> Result<Vec<Vec<f64>>, Error> {
        self.samples(rect)
    }

    /// Copies `rect` out in the native type of the image's element kind.
    /// Packed color words come back as one byte plane per channel.
    pub fn get_pixels(&self, rect: Rect) -> Result<Banks, Error> {
        Ok(match self.kind().native() {
            NativeType::Byte => Banks::Bytes(self.samples(rect)?),
            NativeType::Short => Banks::Shorts(self.samples(rect)?),
            NativeType::Int => Banks::Ints(self.samples(rect)?),
            NativeType::Float => Banks::Floats(self.samples(rect)?),
            NativeType::Double => Banks::Doubles(self.samples(rect)?),
        })
    }

    /// Serializes `rect` to one byte array per channel at the given byte
    /// order.
    pub fn get_pixel_bytes(&self, little_endian: bool, rect: Rect) -> Result<Vec<Vec<u8>>, Error> {
        rect.check_within(self.width(), self.height())?;
        let raster = self.raster();
        if let RasterLayout::Packed { order } = raster.layout()
            && rect == self.bounds()
            && let Banks::Ints(words) = raster.storage().banks()
        {
            let channels = raster.channels();
            return Ok((0..channels)
                .map(|c| pack::unpack_channel(&words[0], channels, c, order))
                .collect());
        }
        Ok(match self.get_pixels(rect)? {
            Banks::Bytes(b) => b,
            Banks::Shorts(b) => b.iter().map(|p| encode_samples(p, little_endian)).collect(),
            Banks::Ints(b) => b.iter().map(|p| encode_samples(p, little_endian)).collect(),
            Banks::Floats(b) => b.iter().map(|p| encode_samples(p, little_endian)).collect(),
            Banks::Doubles(b) => b.iter().map(|p| encode_samples(p, little_endian)).collect(),
        })
    }
}

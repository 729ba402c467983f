//! Element kinds and the native sample primitives that back them.
//!
//! Only five native bank types exist: `u8`, `i16`, `i32`, `f32` and `f64`.
//! Signed bytes, unsigned shorts and unsigned 32-bit ints have no bank type
//! of their own; the [`ElementKind`] tag decides how the stored bit pattern
//! is read.

use alloc::format;
use alloc::vec::Vec;
use core::fmt;
use core::str::FromStr;

use bytemuck::Pod;

use crate::Error;
use crate::storage::Banks;

/// The logical type of one sample.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementKind {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    F32,
    F64,
}

/// The native bank type used to store an [`ElementKind`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NativeType {
    Byte,
    Short,
    Int,
    Float,
    Double,
}

impl ElementKind {
    /// Every supported kind, in decoder tag order.
    pub const ALL: [ElementKind; 8] = [
        ElementKind::I8,
        ElementKind::U8,
        ElementKind::I16,
        ElementKind::U16,
        ElementKind::I32,
        ElementKind::U32,
        ElementKind::F32,
        ElementKind::F64,
    ];

    /// Bytes occupied by one serialized sample.
    pub const fn bytes_per_sample(self) -> usize {
        match self {
            ElementKind::U8 | ElementKind::I8 => 1,
            ElementKind::U16 | ElementKind::I16 => 2,
            ElementKind::U32 | ElementKind::I32 | ElementKind::F32 => 4,
            ElementKind::F64 => 8,
        }
    }

    pub const fn bits(self) -> u32 {
        self.bytes_per_sample() as u32 * 8
    }

    /// Signed integers and both float kinds report `true`.
    pub const fn is_signed(self) -> bool {
        !matches!(self, ElementKind::U8 | ElementKind::U16 | ElementKind::U32)
    }

    pub const fn is_float(self) -> bool {
        matches!(self, ElementKind::F32 | ElementKind::F64)
    }

    pub const fn native(self) -> NativeType {
        match self {
            ElementKind::U8 | ElementKind::I8 => NativeType::Byte,
            ElementKind::U16 | ElementKind::I16 => NativeType::Short,
            ElementKind::U32 | ElementKind::I32 => NativeType::Int,
            ElementKind::F32 => NativeType::Float,
            ElementKind::F64 => NativeType::Double,
        }
    }

    /// The integer kind of the same width with the opposite signedness.
    /// Float kinds map to themselves.
    pub const fn with_signedness(self, signed: bool) -> Self {
        match (self, signed) {
            (ElementKind::U8 | ElementKind::I8, true) => ElementKind::I8,
            (ElementKind::U8 | ElementKind::I8, false) => ElementKind::U8,
            (ElementKind::U16 | ElementKind::I16, true) => ElementKind::I16,
            (ElementKind::U16 | ElementKind::I16, false) => ElementKind::U16,
            (ElementKind::U32 | ElementKind::I32, true) => ElementKind::I32,
            (ElementKind::U32 | ElementKind::I32, false) => ElementKind::U32,
            (k, _) => k,
        }
    }

    /// Resolves a kind from a decoder's `(bytes per sample, float, signed)`
    /// triple.
    ///
    /// 24-bit widths (any multiple of three) describe three packed channels
    /// and fold to a third of the width per channel.
    pub fn from_parts(bytes_per_sample: usize, float: bool, signed: bool) -> Result<Self, Error> {
        let bytes = if bytes_per_sample % 3 == 0 {
            bytes_per_sample / 3
        } else {
            bytes_per_sample
        };
        let kind = match (bytes, float) {
            (1, false) => ElementKind::U8,
            (2, false) => ElementKind::U16,
            (4, false) => ElementKind::U32,
            (4, true) => ElementKind::F32,
            (8, true) => ElementKind::F64,
            _ => {
                return Err(Error::UnrecognizedElementKind(format!(
                    "{bytes_per_sample} bytes per sample, float={float}"
                )));
            }
        };
        Ok(kind.with_signedness(signed))
    }

    /// Decoder tag: `uint8`, `int16`, `float`, ...
    pub const fn name(self) -> &'static str {
        match self {
            ElementKind::U8 => "uint8",
            ElementKind::I8 => "int8",
            ElementKind::U16 => "uint16",
            ElementKind::I16 => "int16",
            ElementKind::U32 => "uint32",
            ElementKind::I32 => "int32",
            ElementKind::F32 => "float",
            ElementKind::F64 => "double",
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ElementKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        ElementKind::ALL
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::UnrecognizedElementKind(s.into()))
    }
}

mod sealed {
    pub trait Sealed {}
    impl Sealed for u8 {}
    impl Sealed for i16 {}
    impl Sealed for i32 {}
    impl Sealed for f32 {}
    impl Sealed for f64 {}
}

/// A native bank element: `u8`, `i16`, `i32`, `f32` or `f64`.
pub trait Sample: Pod + Default + PartialEq + fmt::Debug + sealed::Sealed {
    const NATIVE: NativeType;

    /// The element kind this native type stores for the given signedness.
    fn kind(signed: bool) -> ElementKind;

    /// Narrowing cast from a widened integer sample (truncates like `as`).
    fn from_i64(v: i64) -> Self;

    /// Cast from a widened float sample (saturates like `as`).
    fn from_f64(v: f64) -> Self;

    fn into_banks(banks: Vec<Vec<Self>>) -> Banks;

    fn banks(banks: &Banks) -> Option<&[Vec<Self>]>;
}

macro_rules! impl_sample {
    ($t:ty, $native:ident, $variant:ident, $signed:expr, $unsigned:expr) => {
        impl Sample for $t {
            const NATIVE: NativeType = NativeType::$native;

            #[inline]
            fn kind(signed: bool) -> ElementKind {
                if signed { $signed } else { $unsigned }
            }

            #[inline(always)]
            fn from_i64(v: i64) -> Self {
                v as $t
            }

            #[inline(always)]
            fn from_f64(v: f64) -> Self {
                v as $t
            }

            fn into_banks(banks: Vec<Vec<Self>>) -> Banks {
                Banks::$variant(banks)
            }

            fn banks(banks: &Banks) -> Option<&[Vec<Self>]> {
                match banks {
                    Banks::$variant(b) => Some(b),
                    _ => None,
                }
            }
        }
    };
}

impl_sample!(u8, Byte, Bytes, ElementKind::I8, ElementKind::U8);
impl_sample!(i16, Short, Shorts, ElementKind::I16, ElementKind::U16);
impl_sample!(i32, Int, Ints, ElementKind::I32, ElementKind::U32);
impl_sample!(f32, Float, Floats, ElementKind::F32, ElementKind::F32);
impl_sample!(f64, Double, Doubles, ElementKind::F64, ElementKind::F64);

/// Decodes a raw byte payload into native samples at the given byte order.
pub fn decode_samples<T: Sample>(bytes: &[u8], little_endian: bool) -> Result<Vec<T>, Error> {
    let size = core::mem::size_of::<T>();
    if bytes.len() % size != 0 {
        return Err(Error::NotSampleAligned {
            len: bytes.len(),
            bytes_per_sample: size,
        });
    }
    if size == 1 || little_endian == cfg!(target_endian = "little") {
        return Ok(bytemuck::pod_collect_to_vec(bytes));
    }
    let mut swapped = bytes.to_vec();
    crate::pack::swap_samples::<T>(&mut swapped);
    Ok(bytemuck::pod_collect_to_vec(&swapped))
}

/// Serializes native samples to bytes at the given byte order.
pub fn encode_samples<T: Sample>(samples: &[T], little_endian: bool) -> Vec<u8> {
    let mut out: Vec<u8> = bytemuck::cast_slice::<T, u8>(samples).to_vec();
    if little_endian != cfg!(target_endian = "little") {
        crate::pack::swap_samples::<T>(&mut out);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn from_parts_covers_decoder_triples() {
        assert_eq!(ElementKind::from_parts(1, false, true).unwrap(), ElementKind::I8);
        assert_eq!(ElementKind::from_parts(2, false, false).unwrap(), ElementKind::U16);
        assert_eq!(ElementKind::from_parts(4, false, false).unwrap(), ElementKind::U32);
        assert_eq!(ElementKind::from_parts(4, true, true).unwrap(), ElementKind::F32);
        assert_eq!(ElementKind::from_parts(8, true, true).unwrap(), ElementKind::F64);
        // 24-bit RGB folds to one byte per channel
        assert_eq!(ElementKind::from_parts(3, false, false).unwrap(), ElementKind::U8);
        assert_eq!(ElementKind::from_parts(6, false, true).unwrap(), ElementKind::I16);
    }

    #[test]
    fn from_parts_rejects_odd_widths() {
        assert!(matches!(
            ElementKind::from_parts(8, false, false),
            Err(Error::UnrecognizedElementKind(_))
        ));
        assert!(ElementKind::from_parts(5, false, false).is_err());
        assert!(ElementKind::from_parts(2, true, true).is_err());
    }

    #[test]
    fn names_round_trip() {
        for kind in ElementKind::ALL {
            assert_eq!(kind.name().parse::<ElementKind>().unwrap(), kind);
        }
        assert_eq!("UINT16".parse::<ElementKind>().unwrap(), ElementKind::U16);
        assert!("bit".parse::<ElementKind>().is_err());
    }

    #[test]
    fn signedness_flags() {
        assert!(ElementKind::F32.is_signed());
        assert!(!ElementKind::U32.is_signed());
        assert_eq!(ElementKind::U16.with_signedness(true), ElementKind::I16);
        assert_eq!(ElementKind::F64.with_signedness(false), ElementKind::F64);
        assert_eq!(ElementKind::I8.native(), NativeType::Byte);
    }

    #[test]
    fn decode_respects_byte_order() {
        let raw = [0x01u8, 0x02, 0x03, 0x04];
        let be: Vec<i16> = decode_samples(&raw, false).unwrap();
        assert_eq!(be, vec![0x0102, 0x0304]);
        let le: Vec<i16> = decode_samples(&raw, true).unwrap();
        assert_eq!(le, vec![0x0201, 0x0403]);
        let word: Vec<i32> = decode_samples(&raw, false).unwrap();
        assert_eq!(word, vec![0x0102_0304]);
    }

    #[test]
    fn decode_rejects_partial_samples() {
        let err = decode_samples::<i32>(&[0u8; 6], true).unwrap_err();
        assert_eq!(
            err,
            Error::NotSampleAligned {
                len: 6,
                bytes_per_sample: 4
            }
        );
    }

    #[test]
    fn encode_inverts_decode() {
        let values = vec![1.5f64, -2.25, 1.0e300];
        for little in [true, false] {
            let bytes = encode_samples(&values, little);
            assert_eq!(bytes.len(), 24);
            let back: Vec<f64> = decode_samples(&bytes, little).unwrap();
            assert_eq!(back, values);
        }
        let be = encode_samples(&[0x0102i16], false);
        assert_eq!(be, vec![0x01, 0x02]);
    }
}

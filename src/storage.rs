//! Typed sample storage: one backing array per bank, tagged with the
//! element kind that decides how the stored bit patterns read back.

use alloc::vec;
use alloc::vec::Vec;

use crate::Error;
use crate::sample::{ElementKind, NativeType};

/// Backing arrays of one native type. Each inner `Vec` is a bank.
#[derive(Clone, Debug, PartialEq)]
pub enum Banks {
    Bytes(Vec<Vec<u8>>),
    Shorts(Vec<Vec<i16>>),
    Ints(Vec<Vec<i32>>),
    Floats(Vec<Vec<f32>>),
    Doubles(Vec<Vec<f64>>),
}

macro_rules! each_bank {
    ($banks:expr, $b:ident => $body:expr) => {
        match $banks {
            Banks::Bytes($b) => $body,
            Banks::Shorts($b) => $body,
            Banks::Ints($b) => $body,
            Banks::Floats($b) => $body,
            Banks::Doubles($b) => $body,
        }
    };
}

impl Banks {
    /// `count` zero-filled banks of `len` samples each.
    pub fn zeroed(native: NativeType, count: usize, len: usize) -> Self {
        match native {
            NativeType::Byte => Banks::Bytes(vec![vec![0; len]; count]),
            NativeType::Short => Banks::Shorts(vec![vec![0; len]; count]),
            NativeType::Int => Banks::Ints(vec![vec![0; len]; count]),
            NativeType::Float => Banks::Floats(vec![vec![0.0; len]; count]),
            NativeType::Double => Banks::Doubles(vec![vec![0.0; len]; count]),
        }
    }

    pub fn native(&self) -> NativeType {
        match self {
            Banks::Bytes(_) => NativeType::Byte,
            Banks::Shorts(_) => NativeType::Short,
            Banks::Ints(_) => NativeType::Int,
            Banks::Floats(_) => NativeType::Float,
            Banks::Doubles(_) => NativeType::Double,
        }
    }

    pub fn bank_count(&self) -> usize {
        each_bank!(self, b => b.len())
    }

    /// Length of the first bank, or 0 when there are none.
    pub fn bank_len(&self) -> usize {
        each_bank!(self, b => b.first().map_or(0, |v| v.len()))
    }

    /// Splits into one single-bank value per bank.
    pub fn split(self) -> Vec<Banks> {
        match self {
            Banks::Bytes(b) => b.into_iter().map(|v| Banks::Bytes(vec![v])).collect(),
            Banks::Shorts(b) => b.into_iter().map(|v| Banks::Shorts(vec![v])).collect(),
            Banks::Ints(b) => b.into_iter().map(|v| Banks::Ints(vec![v])).collect(),
            Banks::Floats(b) => b.into_iter().map(|v| Banks::Floats(vec![v])).collect(),
            Banks::Doubles(b) => b.into_iter().map(|v| Banks::Doubles(vec![v])).collect(),
        }
    }

    fn check_lengths(&self) -> Result<(), Error> {
        let expected = self.bank_len();
        each_bank!(self, b => {
            for bank in b.iter() {
                if bank.len() != expected {
                    return Err(Error::ShapeMismatch {
                        expected,
                        actual: bank.len(),
                    });
                }
            }
        });
        Ok(())
    }
}

/// Banks plus the element kind they hold.
///
/// The kind's native type always matches the banks, except for packed
/// color words: `U8` samples over `Int` banks, one word per pixel.
#[derive(Clone, Debug, PartialEq)]
pub struct SampleBuffer {
    kind: ElementKind,
    banks: Banks,
}

impl SampleBuffer {
    /// Wraps `banks` as `kind` samples. All banks must have the same length.
    pub fn new(kind: ElementKind, banks: Banks) -> Result<Self, Error> {
        let native = banks.native();
        let packed = kind == ElementKind::U8 && native == NativeType::Int;
        if kind.native() != native && !packed {
            return Err(Error::KindMismatch { kind, native });
        }
        banks.check_lengths()?;
        Ok(Self { kind, banks })
    }

    /// `count` zero-filled banks of `len` samples in the kind's native type.
    pub fn zeroed(kind: ElementKind, count: usize, len: usize) -> Self {
        Self {
            kind,
            banks: Banks::zeroed(kind.native(), count, len),
        }
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn native(&self) -> NativeType {
        self.banks.native()
    }

    /// True for 8-bit channels packed into 32-bit words.
    pub fn is_packed_words(&self) -> bool {
        self.kind == ElementKind::U8 && self.native() == NativeType::Int
    }

    pub fn banks(&self) -> &Banks {
        &self.banks
    }

    pub fn into_banks(self) -> Banks {
        self.banks
    }

    pub fn bank_count(&self) -> usize {
        self.banks.bank_count()
    }

    pub fn bank_len(&self) -> usize {
        self.banks.bank_len()
    }

    /// Reads one element, widened and interpreted through the kind tag.
    ///
    /// Panics if `bank` or `index` is out of range.
    #[inline]
    pub fn get_element(&self, bank: usize, index: usize) -> i64 {
        match &self.banks {
            Banks::Bytes(b) => match self.kind {
                ElementKind::I8 => b[bank][index] as i8 as i64,
                _ => b[bank][index] as i64,
            },
            Banks::Shorts(b) => match self.kind {
                ElementKind::U16 => b[bank][index] as u16 as i64,
                _ => b[bank][index] as i64,
            },
            Banks::Ints(b) => match self.kind {
                ElementKind::I32 => b[bank][index] as i64,
                _ => (b[bank][index] as i64) & 0xFFFF_FFFF,
            },
            Banks::Floats(b) => b[bank][index] as i64,
            Banks::Doubles(b) => b[bank][index] as i64,
        }
    }

    /// Reads one element as `f64`; float banks keep their fraction.
    #[inline]
    pub fn get_element_f64(&self, bank: usize, index: usize) -> f64 {
        match &self.banks {
            Banks::Floats(b) => b[bank][index] as f64,
            Banks::Doubles(b) => b[bank][index],
            _ => self.get_element(bank, index) as f64,
        }
    }

    /// Stores one element, narrowing with `as` semantics.
    #[inline]
    pub fn set_element(&mut self, bank: usize, index: usize, value: i64) {
        match &mut self.banks {
            Banks::Bytes(b) => b[bank][index] = value as u8,
            Banks::Shorts(b) => b[bank][index] = value as i16,
            Banks::Ints(b) => b[bank][index] = value as i32,
            Banks::Floats(b) => b[bank][index] = value as f32,
            Banks::Doubles(b) => b[bank][index] = value as f64,
        }
    }

    #[inline]
    pub fn set_element_f64(&mut self, bank: usize, index: usize, value: f64) {
        match &mut self.banks {
            Banks::Floats(b) => b[bank][index] = value as f32,
            Banks::Doubles(b) => b[bank][index] = value,
            _ => self.set_element(bank, index, value as i64),
        }
    }
}

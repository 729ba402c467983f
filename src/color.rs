//! Mapping stored sample values to 8-bit display values.

use alloc::vec;
use alloc::vec::Vec;

use crate::sample::ElementKind;

/// Flips the top bit of a display value: the half-range offset that lines
/// up a signed range with an unsigned one. Applying it twice is a no-op.
#[inline]
pub const fn wrap(v: u8) -> u8 {
    if v < 128 { v + 128 } else { v - 128 }
}

#[inline]
fn rescale_to_u8(value: u64, max: u64) -> u8 {
    // round(value * 255 / max) in integers
    ((value * 510 + max) / (2 * max)) as u8
}

/// Red, green, blue and optional alpha lookup tables of equal length.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Lut<T> {
    pub red: Vec<T>,
    pub green: Vec<T>,
    pub blue: Vec<T>,
    pub alpha: Option<Vec<T>>,
}

impl<T: Copy + Default> Lut<T> {
    /// Builds a lookup from decoder rows `[r, g, b, a?]`.
    ///
    /// Missing color rows are filled with zeros; rows longer than the
    /// first are truncated, shorter ones zero-extended.
    fn from_rows(rows: &[Vec<T>]) -> Option<Self> {
        let len = rows.first()?.len();
        let row = |i: usize| -> Vec<T> {
            match rows.get(i) {
                Some(r) => {
                    let mut r = r.clone();
                    r.resize(len, T::default());
                    r
                }
                None => vec![T::default(); len],
            }
        };
        Some(Self {
            red: row(0),
            green: row(1),
            blue: row(2),
            alpha: (rows.len() > 3).then(|| row(3)),
        })
    }

    fn rows(&self) -> Vec<Vec<T>> {
        let mut rows = vec![self.red.clone(), self.green.clone(), self.blue.clone()];
        if let Some(a) = &self.alpha {
            rows.push(a.clone());
        }
        rows
    }

    #[inline]
    fn get(&self, index: i64, channel: usize) -> Option<T> {
        let index = usize::try_from(index).ok()?;
        let table = match channel {
            0 => &self.red,
            1 => &self.green,
            2 => &self.blue,
            _ => self.alpha.as_ref()?,
        };
        table.get(index).copied()
    }
}

/// Indexed color table with 8-bit or 16-bit entries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Palette {
    Lut8(Lut<u8>),
    Lut16(Lut<u16>),
}

impl Palette {
    /// `None` when `table` has no rows.
    pub fn from_table8(table: &[Vec<u8>]) -> Option<Self> {
        Lut::from_rows(table).map(Palette::Lut8)
    }

    pub fn from_table16(table: &[Vec<u16>]) -> Option<Self> {
        Lut::from_rows(table).map(Palette::Lut16)
    }

    /// The 8-bit rows `[r, g, b, a?]`, if this is an 8-bit palette.
    pub fn table8(&self) -> Option<Vec<Vec<u8>>> {
        match self {
            Palette::Lut8(lut) => Some(lut.rows()),
            Palette::Lut16(_) => None,
        }
    }

    pub fn table16(&self) -> Option<Vec<Vec<u16>>> {
        match self {
            Palette::Lut16(lut) => Some(lut.rows()),
            Palette::Lut8(_) => None,
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        match self {
            Palette::Lut8(lut) => lut.red.len(),
            Palette::Lut16(lut) => lut.red.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn has_alpha(&self) -> bool {
        match self {
            Palette::Lut8(lut) => lut.alpha.is_some(),
            Palette::Lut16(lut) => lut.alpha.is_some(),
        }
    }

    /// Raw entry for `channel` (0 red, 1 green, 2 blue, 3 alpha).
    pub fn entry(&self, index: i64, channel: usize) -> Option<u16> {
        match self {
            Palette::Lut8(lut) => lut.get(index, channel).map(u16::from),
            Palette::Lut16(lut) => lut.get(index, channel),
        }
    }

    /// Display value of one palette channel. Out-of-table indices give 0;
    /// a palette without alpha reports 255 for channel 3.
    pub fn lookup(&self, index: i64, channel: usize) -> u8 {
        if channel >= 3 && !self.has_alpha() {
            return 255;
        }
        match self {
            Palette::Lut8(lut) => lut.get(index, channel).unwrap_or(0),
            Palette::Lut16(lut) => lut
                .get(index, channel)
                .map_or(0, |v| rescale_to_u8(v as u64, 65535)),
        }
    }
}

/// Palette index of a stored sample: integer kinds contribute their raw
/// bits read as unsigned, so a signed byte of -1 selects entry 255.
pub fn palette_index(raw: f64, kind: ElementKind) -> i64 {
    if kind.is_float() {
        return raw as i64;
    }
    let mask = (1u64 << kind.bits()) - 1;
    ((raw as i64 as u64) & mask) as i64
}

/// How stored samples become 0–255 display values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ColorMapping {
    /// 8-bit values pass through.
    Linear,
    /// `bits`-wide unsigned values rescaled to 8 bits.
    Unsigned { bits: u32 },
    /// Signed values: the bit pattern is rescaled as unsigned with rounding,
    /// then offset by half range. Rounding rather than truncating keeps the
    /// most negative value at 0 and -1 at 127.
    Signed { bits: u32 },
    /// Floats in [0, 1].
    Float,
    Indexed(Palette),
}

impl ColorMapping {
    /// The mapping an image of `kind` gets when none is requested.
    pub fn for_kind(kind: ElementKind) -> Self {
        match kind {
            ElementKind::U8 => ColorMapping::Linear,
            ElementKind::I8 | ElementKind::I16 | ElementKind::I32 => {
                ColorMapping::Signed { bits: kind.bits() }
            }
            ElementKind::U16 | ElementKind::U32 => ColorMapping::Unsigned { bits: kind.bits() },
            ElementKind::F32 | ElementKind::F64 => ColorMapping::Float,
        }
    }

    pub fn palette(&self) -> Option<&Palette> {
        match self {
            ColorMapping::Indexed(p) => Some(p),
            _ => None,
        }
    }

    /// Maps one stored value of `channel` to its display value.
    pub fn map_to_display(&self, raw: f64, channel: usize) -> u8 {
        match self {
            ColorMapping::Linear => raw.clamp(0.0, 255.0) as u8,
            ColorMapping::Unsigned { bits } => {
                let max = (1u64 << bits) - 1;
                rescale_to_u8((raw as i64 as u64) & max, max)
            }
            ColorMapping::Signed { bits } => {
                let max = (1u64 << bits) - 1;
                wrap(rescale_to_u8((raw as i64 as u64) & max, max))
            }
            ColorMapping::Float => {
                if raw.is_nan() {
                    0
                } else {
                    (raw.clamp(0.0, 1.0) * 255.0 + 0.5) as u8
                }
            }
            // `raw` is already an unsigned index here; see `palette_index`
            ColorMapping::Indexed(p) => p.lookup(raw as i64, channel),
        }
    }

    /// Display color of one pixel of a `kind` image given its stored
    /// channel values.
    pub fn rgba(&self, kind: ElementKind, samples: &[f64]) -> [u8; 4] {
        if let ColorMapping::Indexed(p) = self {
            let index = samples.first().map_or(0, |&v| palette_index(v, kind));
            return [
                p.lookup(index, 0),
                p.lookup(index, 1),
                p.lookup(index, 2),
                p.lookup(index, 3),
            ];
        }
        let m = |c: usize| self.map_to_display(samples[c], c);
        match samples.len() {
            0 => [0, 0, 0, 255],
            1 => {
                let g = m(0);
                [g, g, g, 255]
            }
            2 => [m(0), m(1), 0, 255],
            3 => [m(0), m(1), m(2), 255],
            _ => [m(0), m(1), m(2), m(3)],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_is_an_involution() {
        for v in 0..=255u8 {
            assert_eq!(wrap(wrap(v)), v);
        }
        assert_eq!(wrap(0), 128);
        assert_eq!(wrap(255), 127);
    }

    #[test]
    fn signed_short_minus_one_is_127() {
        let m = ColorMapping::for_kind(ElementKind::I16);
        assert_eq!(m.map_to_display(-1.0, 0), 127);
        assert_eq!(m.map_to_display(0.0, 0), 128);
        assert_eq!(m.map_to_display(i16::MIN as f64, 0), 0);
    }

    #[test]
    fn unsigned_uses_exact_max() {
        let m = ColorMapping::for_kind(ElementKind::U32);
        assert_eq!(m.map_to_display(u32::MAX as f64, 0), 255);
        assert_eq!(m.map_to_display(0.0, 0), 0);
        let m = ColorMapping::for_kind(ElementKind::U16);
        assert_eq!(m.map_to_display(65535.0, 0), 255);
        assert_eq!(m.map_to_display(32768.0, 0), 128);
        assert_eq!(m.map_to_display(128.0, 0), 0);
        assert_eq!(m.map_to_display(129.0, 0), 1);
    }

    #[test]
    fn float_clamps_and_zeroes_nan() {
        let m = ColorMapping::Float;
        assert_eq!(m.map_to_display(f64::NAN, 0), 0);
        assert_eq!(m.map_to_display(-3.0, 0), 0);
        assert_eq!(m.map_to_display(7.0, 0), 255);
        assert_eq!(m.map_to_display(0.5, 0), 128);
    }

    #[test]
    fn linear_clamps() {
        assert_eq!(ColorMapping::Linear.map_to_display(300.0, 0), 255);
        assert_eq!(ColorMapping::Linear.map_to_display(-1.0, 0), 0);
    }

    #[test]
    fn palette_lookups() {
        let p = Palette::from_table8(&[vec![10, 20], vec![30, 40]]).unwrap();
        assert_eq!(p.len(), 2);
        assert_eq!(p.lookup(1, 0), 20);
        assert_eq!(p.lookup(1, 1), 40);
        // missing blue row is zero-filled
        assert_eq!(p.lookup(1, 2), 0);
        assert_eq!(p.lookup(1, 3), 255);
        assert_eq!(p.lookup(2, 0), 0);
        assert_eq!(p.lookup(-1, 0), 0);
        assert_eq!(p.table8().unwrap().len(), 3);
        assert!(p.table16().is_none());

        let p16 = Palette::from_table16(&[vec![0, 65535], vec![0, 32768], vec![0, 0]]).unwrap();
        assert_eq!(p16.lookup(1, 0), 255);
        assert_eq!(p16.lookup(1, 1), 128);
        assert!(Palette::from_table8(&[]).is_none());
    }

    #[test]
    fn rgba_by_channel_count() {
        let m = ColorMapping::Linear;
        let k = ElementKind::U8;
        assert_eq!(m.rgba(k, &[7.0]), [7, 7, 7, 255]);
        assert_eq!(m.rgba(k, &[1.0, 2.0]), [1, 2, 0, 255]);
        assert_eq!(m.rgba(k, &[1.0, 2.0, 3.0]), [1, 2, 3, 255]);
        assert_eq!(m.rgba(k, &[1.0, 2.0, 3.0, 4.0, 5.0]), [1, 2, 3, 4]);

        let p = Palette::from_table8(&[vec![1, 2], vec![3, 4], vec![5, 6], vec![7, 8]]).unwrap();
        assert_eq!(ColorMapping::Indexed(p).rgba(k, &[1.0]), [2, 4, 6, 8]);
    }

    #[test]
    fn signed_indices_use_raw_bits() {
        assert_eq!(palette_index(-1.0, ElementKind::I8), 255);
        assert_eq!(palette_index(-128.0, ElementKind::I8), 128);
        assert_eq!(palette_index(-1.0, ElementKind::I16), 65535);
        assert_eq!(palette_index(5.0, ElementKind::U16), 5);

        let ramp: Vec<u8> = (0..=255).collect();
        let p = Palette::from_table8(&[ramp.clone(), ramp.clone(), ramp]).unwrap();
        let m = ColorMapping::Indexed(p);
        assert_eq!(m.rgba(ElementKind::I8, &[-1.0]), [255, 255, 255, 255]);
        assert_eq!(m.rgba(ElementKind::I8, &[-2.0]), [254, 254, 254, 255]);
        assert_eq!(m.rgba(ElementKind::U8, &[3.0]), [3, 3, 3, 255]);
    }
}

// ---------------------------------------------------------------------------
// Row kernels for 32-bit color words and byte-order swaps, with SIMD dispatch.
//
// #[rite] row functions hold the loops; #[arcane] wrappers are the incant!
// targets. Word buffers are handled as native-endian bytes so the same kernel
// serves the `i32` banks of packed rasters.
// ---------------------------------------------------------------------------

use alloc::vec;
use alloc::vec::Vec;

use archmage::incant;
use archmage::prelude::*;

use crate::Error;
use crate::layout::ChannelOrder;
use crate::sample::Sample;

// ===========================================================================
// Validation helpers
// ===========================================================================

#[inline]
fn check_aligned(len: usize, width: usize) -> Result<(), Error> {
    if len % width != 0 {
        Err(Error::NotSampleAligned {
            len,
            bytes_per_sample: width,
        })
    } else {
        Ok(())
    }
}

#[inline]
fn check_len(expected: usize, actual: usize) -> Result<(), Error> {
    if expected != actual {
        Err(Error::ShapeMismatch { expected, actual })
    } else {
        Ok(())
    }
}

// ===========================================================================
// Utility
// ===========================================================================

#[inline(always)]
fn word3(s: &[u8], order: ChannelOrder) -> u32 {
    match order {
        ChannelOrder::Rgb => ((s[0] as u32) << 16) | ((s[1] as u32) << 8) | s[2] as u32,
        ChannelOrder::Bgr => s[0] as u32 | ((s[1] as u32) << 8) | ((s[2] as u32) << 16),
    }
}

#[inline(always)]
fn word4(s: &[u8], order: ChannelOrder) -> u32 {
    match order {
        ChannelOrder::Rgb => u32::from_be_bytes([s[0], s[1], s[2], s[3]]),
        ChannelOrder::Bgr => u32::from_le_bytes([s[0], s[1], s[2], s[3]]),
    }
}

// ===========================================================================
// SIMD constants
// ===========================================================================

#[cfg(target_arch = "x86_64")]
const SWAP16_MASK_AVX: [i8; 32] = [
    1, 0, 3, 2, 5, 4, 7, 6, 9, 8, 11, 10, 13, 12, 15, 14, 1, 0, 3, 2, 5, 4, 7, 6, 9, 8, 11, 10, 13,
    12, 15, 14,
];

#[cfg(target_arch = "x86_64")]
const SWAP32_MASK_AVX: [i8; 32] = [
    3, 2, 1, 0, 7, 6, 5, 4, 11, 10, 9, 8, 15, 14, 13, 12, 3, 2, 1, 0, 7, 6, 5, 4, 11, 10, 9, 8, 15,
    14, 13, 12,
];

#[cfg(target_arch = "x86_64")]
const SWAP64_MASK_AVX: [i8; 32] = [
    7, 6, 5, 4, 3, 2, 1, 0, 15, 14, 13, 12, 11, 10, 9, 8, 7, 6, 5, 4, 3, 2, 1, 0, 15, 14, 13, 12,
    11, 10, 9, 8,
];

#[cfg(target_arch = "x86_64")]
const IDENTITY_MASK_AVX: [i8; 32] = [
    0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12,
    13, 14, 15,
];

// Three bytes per pixel into the low three bytes of each word, high byte zero.
#[cfg(target_arch = "x86_64")]
const PACK3_RGB_SHUF_AVX: [i8; 32] = [
    2, 1, 0, -128, 5, 4, 3, -128, 8, 7, 6, -128, 11, 10, 9, -128, 2, 1, 0, -128, 5, 4, 3, -128, 8,
    7, 6, -128, 11, 10, 9, -128,
];

#[cfg(target_arch = "x86_64")]
const PACK3_BGR_SHUF_AVX: [i8; 32] = [
    0, 1, 2, -128, 3, 4, 5, -128, 6, 7, 8, -128, 9, 10, 11, -128, 0, 1, 2, -128, 3, 4, 5, -128, 6,
    7, 8, -128, 9, 10, 11, -128,
];

#[cfg(target_arch = "x86_64")]
const PACK3_ALIGN_PERM_AVX: [i8; 32] = [
    0, 0, 0, 0, 1, 0, 0, 0, 2, 0, 0, 0, 3, 0, 0, 0, 3, 0, 0, 0, 4, 0, 0, 0, 5, 0, 0, 0, 6, 0, 0, 0,
];

// ===========================================================================
// Scalar row implementations
// ===========================================================================

fn swap_order_row_scalar(_token: ScalarToken, row: &mut [u8], width: usize) {
    for sample in row.chunks_exact_mut(width) {
        sample.reverse();
    }
}

fn pack3_row_scalar(_token: ScalarToken, src: &[u8], dst: &mut [u8], order: ChannelOrder) {
    for (s, d) in src.chunks_exact(3).zip(dst.chunks_exact_mut(4)) {
        d.copy_from_slice(&word3(s, order).to_ne_bytes());
    }
}

fn pack4_row_scalar(_token: ScalarToken, src: &[u8], dst: &mut [u8], order: ChannelOrder) {
    for (s, d) in src.chunks_exact(4).zip(dst.chunks_exact_mut(4)) {
        d.copy_from_slice(&word4(s, order).to_ne_bytes());
    }
}

fn or_plane_row_scalar(_token: ScalarToken, plane: &[u8], words: &mut [u8], shift: u32) {
    for (&v, w) in plane.iter().zip(words.chunks_exact_mut(4)) {
        let word = u32::from_ne_bytes([w[0], w[1], w[2], w[3]]) | ((v as u32) << shift);
        w.copy_from_slice(&word.to_ne_bytes());
    }
}

fn unpack_row_scalar(_token: ScalarToken, words: &[u8], dst: &mut [u8], shift: u32) {
    for (w, d) in words.chunks_exact(4).zip(dst.iter_mut()) {
        *d = (u32::from_ne_bytes([w[0], w[1], w[2], w[3]]) >> shift) as u8;
    }
}

// ===========================================================================
// Scalar wrappers (dispatch targets for incant!)
// ===========================================================================

fn swap_order_impl_scalar(t: ScalarToken, b: &mut [u8], width: usize) {
    swap_order_row_scalar(t, b, width);
}
fn pack3_impl_scalar(t: ScalarToken, s: &[u8], d: &mut [u8], order: ChannelOrder) {
    pack3_row_scalar(t, s, d, order);
}
fn pack4_impl_scalar(t: ScalarToken, s: &[u8], d: &mut [u8], order: ChannelOrder) {
    pack4_row_scalar(t, s, d, order);
}
fn or_plane_impl_scalar(t: ScalarToken, p: &[u8], w: &mut [u8], shift: u32) {
    or_plane_row_scalar(t, p, w, shift);
}
fn unpack_impl_scalar(t: ScalarToken, w: &[u8], d: &mut [u8], shift: u32) {
    unpack_row_scalar(t, w, d, shift);
}

// ===========================================================================
// x86-64 AVX2 rite row implementations
// ===========================================================================

#[cfg(target_arch = "x86_64")]
#[rite]
fn swap_order_row_v3(_token: X64V3Token, row: &mut [u8], width: usize) {
    let table = match width {
        2 => &SWAP16_MASK_AVX,
        4 => &SWAP32_MASK_AVX,
        _ => &SWAP64_MASK_AVX,
    };
    let mask = safe_unaligned_simd::x86_64::_mm256_loadu_si256(table);
    let n = row.len();
    let mut i = 0;
    while i + 32 <= n {
        let arr: &[u8; 32] = row[i..i + 32].try_into().unwrap();
        let v = safe_unaligned_simd::x86_64::_mm256_loadu_si256(arr);
        let shuffled = _mm256_shuffle_epi8(v, mask);
        let out: &mut [u8; 32] = (&mut row[i..i + 32]).try_into().unwrap();
        safe_unaligned_simd::x86_64::_mm256_storeu_si256(out, shuffled);
        i += 32;
    }
    for sample in row[i..].chunks_exact_mut(width) {
        sample.reverse();
    }
}

#[cfg(target_arch = "x86_64")]
#[rite]
fn pack3_row_v3(_token: X64V3Token, src: &[u8], dst: &mut [u8], order: ChannelOrder) {
    let perm = safe_unaligned_simd::x86_64::_mm256_loadu_si256(&PACK3_ALIGN_PERM_AVX);
    let shuf = safe_unaligned_simd::x86_64::_mm256_loadu_si256(match order {
        ChannelOrder::Rgb => &PACK3_RGB_SHUF_AVX,
        ChannelOrder::Bgr => &PACK3_BGR_SHUF_AVX,
    });
    let (slen, dlen) = (src.len(), dst.len());
    let (mut is, mut id) = (0, 0);
    while is + 32 <= slen && id + 32 <= dlen {
        let s: &[u8; 32] = src[is..is + 32].try_into().unwrap();
        let px = safe_unaligned_simd::x86_64::_mm256_loadu_si256(s);
        let aligned = _mm256_permutevar8x32_epi32(px, perm);
        let words = _mm256_shuffle_epi8(aligned, shuf);
        let d: &mut [u8; 32] = (&mut dst[id..id + 32]).try_into().unwrap();
        safe_unaligned_simd::x86_64::_mm256_storeu_si256(d, words);
        is += 24;
        id += 32;
    }
    for (s, d) in src[is..].chunks_exact(3).zip(dst[id..].chunks_exact_mut(4)) {
        d.copy_from_slice(&word3(s, order).to_ne_bytes());
    }
}

#[cfg(target_arch = "x86_64")]
#[rite]
fn pack4_row_v3(_token: X64V3Token, src: &[u8], dst: &mut [u8], order: ChannelOrder) {
    let shuf = safe_unaligned_simd::x86_64::_mm256_loadu_si256(match order {
        ChannelOrder::Rgb => &SWAP32_MASK_AVX,
        ChannelOrder::Bgr => &IDENTITY_MASK_AVX,
    });
    let n = src.len().min(dst.len());
    let mut i = 0;
    while i + 32 <= n {
        let s: &[u8; 32] = src[i..i + 32].try_into().unwrap();
        let v = safe_unaligned_simd::x86_64::_mm256_loadu_si256(s);
        let words = _mm256_shuffle_epi8(v, shuf);
        let d: &mut [u8; 32] = (&mut dst[i..i + 32]).try_into().unwrap();
        safe_unaligned_simd::x86_64::_mm256_storeu_si256(d, words);
        i += 32;
    }
    for (s, d) in src[i..].chunks_exact(4).zip(dst[i..].chunks_exact_mut(4)) {
        d.copy_from_slice(&word4(s, order).to_ne_bytes());
    }
}

#[cfg(target_arch = "x86_64")]
#[rite]
fn or_plane_row_v3(_token: X64V3Token, plane: &[u8], words: &mut [u8], shift: u32) {
    let words32 = bytemuck::cast_slice_mut::<u8, u32>(words);
    for (&v, w) in plane.iter().zip(words32.iter_mut()) {
        *w |= (v as u32) << shift;
    }
}

#[cfg(target_arch = "x86_64")]
#[rite]
fn unpack_row_v3(_token: X64V3Token, words: &[u8], dst: &mut [u8], shift: u32) {
    let words32 = bytemuck::cast_slice::<u8, u32>(words);
    for (&w, d) in words32.iter().zip(dst.iter_mut()) {
        *d = (w >> shift) as u8;
    }
}

// x86-64 arcane wrappers
#[cfg(target_arch = "x86_64")]
#[arcane]
fn swap_order_impl_v3(t: X64V3Token, b: &mut [u8], width: usize) {
    swap_order_row_v3(t, b, width);
}
#[cfg(target_arch = "x86_64")]
#[arcane]
fn pack3_impl_v3(t: X64V3Token, s: &[u8], d: &mut [u8], order: ChannelOrder) {
    pack3_row_v3(t, s, d, order);
}
#[cfg(target_arch = "x86_64")]
#[arcane]
fn pack4_impl_v3(t: X64V3Token, s: &[u8], d: &mut [u8], order: ChannelOrder) {
    pack4_row_v3(t, s, d, order);
}
#[cfg(target_arch = "x86_64")]
#[arcane]
fn or_plane_impl_v3(t: X64V3Token, p: &[u8], w: &mut [u8], shift: u32) {
    or_plane_row_v3(t, p, w, shift);
}
#[cfg(target_arch = "x86_64")]
#[arcane]
fn unpack_impl_v3(t: X64V3Token, w: &[u8], d: &mut [u8], shift: u32) {
    unpack_row_v3(t, w, d, shift);
}

// ===========================================================================
// Public API
// ===========================================================================

/// Reverses the byte order of every `width`-byte sample in place.
///
/// `width` of 1 is a no-op; 2, 4 and 8 are the serialized sample widths.
pub fn swap_byte_order(buf: &mut [u8], width: usize) -> Result<(), Error> {
    match width {
        1 => return Ok(()),
        2 | 4 | 8 => {}
        _ => {
            return Err(Error::NotSampleAligned {
                len: buf.len(),
                bytes_per_sample: width,
            });
        }
    }
    check_aligned(buf.len(), width)?;
    incant!(swap_order_impl(buf, width), [v3, scalar]);
    Ok(())
}

/// Reverses the byte order of whole `T` samples in place.
pub(crate) fn swap_samples<T: Sample>(buf: &mut [u8]) {
    let width = core::mem::size_of::<T>();
    if width > 1 {
        incant!(swap_order_impl(buf, width), [v3, scalar]);
    }
}

/// Packs interleaved 8-bit pixels of 3 or 4 channels into one 32-bit word
/// per pixel, honoring the word's channel order.
pub fn pack_interleaved(src: &[u8], channels: usize, order: ChannelOrder) -> Result<Vec<i32>, Error> {
    if !(3..=4).contains(&channels) {
        return Err(Error::UnsupportedChannelCount(channels));
    }
    check_aligned(src.len(), channels)?;
    let mut words = vec![0i32; src.len() / channels];
    let dst = bytemuck::cast_slice_mut::<i32, u8>(&mut words);
    if channels == 3 {
        incant!(pack3_impl(src, dst, order), [v3, scalar]);
    } else {
        incant!(pack4_impl(src, dst, order), [v3, scalar]);
    }
    Ok(words)
}

/// Packs one 8-bit plane per channel into 32-bit words.
pub fn pack_planes(planes: &[&[u8]], order: ChannelOrder) -> Result<Vec<i32>, Error> {
    let channels = planes.len();
    if !(3..=4).contains(&channels) {
        return Err(Error::UnsupportedChannelCount(channels));
    }
    let pixels = planes[0].len();
    let mut words = vec![0i32; pixels];
    for (c, plane) in planes.iter().enumerate() {
        check_len(pixels, plane.len())?;
        let shift = order.shift(channels, c);
        let dst = bytemuck::cast_slice_mut::<i32, u8>(&mut words);
        incant!(or_plane_impl(plane, dst, shift), [v3, scalar]);
    }
    Ok(words)
}

/// Extracts one 8-bit channel from packed 32-bit words.
pub fn unpack_channel(words: &[i32], channels: usize, channel: usize, order: ChannelOrder) -> Vec<u8> {
    let mut out = vec![0u8; words.len()];
    let src = bytemuck::cast_slice::<i32, u8>(words);
    let shift = order.shift(channels, channel);
    incant!(unpack_impl(src, &mut out, shift), [v3, scalar]);
    out
}

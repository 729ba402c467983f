//! # sampleband
//!
//! Typed, banded pixel sample buffers for scientific image data.
//!
//! Decoders hand over raw bytes in whatever encoding the file used: 8, 16
//! or 32-bit integers of either signedness, floats or doubles, in either
//! byte order, interleaved or planar, sometimes indexed through a palette.
//! This crate turns those payloads into an [`AssembledImage`] backed by a
//! small set of native banks (`u8`, `i16`, `i32`, `f32`, `f64`), reads them
//! back out as typed arrays or bytes, and maps samples to 8-bit display
//! values.
//!
//! ```rust
//! use sampleband::{ElementKind, PlaneDescriptor, Rect, SampleLayout, open_image};
//!
//! // two big-endian signed shorts: -1 and 1000
//! let layout = SampleLayout::new(2, 1, 1, ElementKind::I16);
//! let image = open_image(&[0xFF, 0xFF, 0x03, 0xE8], &PlaneDescriptor::new(layout)).unwrap();
//!
//! assert_eq!(image.get_shorts(Rect::full(2, 1)).unwrap(), vec![vec![-1, 1000]]);
//! assert_eq!(image.display_rgba(0, 0), [127, 127, 127, 255]);
//! ```
//!
//! ## Modules
//!
//! - [`construct`] builds images from typed arrays or serialized bytes.
//! - Extraction methods live on [`AssembledImage`] (`get_pixels`,
//!   `get_pixel_bytes`, `borrow_banks`, ...).
//! - [`ops`] holds derived operations: autoscale, pad, split/merge channels,
//!   palette expansion, sub-images.
//! - [`planes`] works directly on serialized byte planes.
//! - [`pack`] holds the SIMD kernels for 32-bit color words and byte swaps.
//!
//! ## Feature flags
//!
//! - **`std`** (default) — links `std`; enables runtime SIMD detection.
//! - **`rgb`** — `make_image_from_rgb` / `make_image_from_rgba` over typed
//!   `rgb` pixels.
//! - **`imgref`** — [`display`]: render to `ImgVec<Rgba<u8>>` and build
//!   images from typed [`imgref`] images. Implies `rgb`.

#![no_std]
#![forbid(unsafe_code)]

#[cfg(feature = "std")]
extern crate std;

extern crate alloc;

mod color;
mod error;
mod extract;
mod layout;
mod sample;
mod storage;

pub mod construct;
pub mod ops;
pub mod pack;
pub mod planes;

#[cfg(feature = "imgref")]
pub mod display;

pub use color::{ColorMapping, Lut, Palette, palette_index, wrap};
pub use construct::{
    AssembledImage, HostFormat, PlaneDescriptor, assemble, blank_image, construct_image,
    make_banded_image, make_banded_image_from_bytes, make_image, make_image_from_bytes,
    make_rgb_image, make_rgb_image_banded, normalize_doubles, normalize_floats, open_image,
};
#[cfg(feature = "rgb")]
pub use construct::{make_image_from_rgb, make_image_from_rgba};
pub use error::Error;
pub use layout::{ChannelOrder, Raster, RasterLayout, Rect, SampleLayout};
pub use ops::{
    RescaleSpec, autoscale, autoscale_with, get_bytes_merged, get_subimage, indexed_to_rgb,
    make_24_bits, make_24_bits_planes, make_unsigned, merge_channels, pad_image, sample_range,
    split_channels,
};
pub use sample::{ElementKind, NativeType, Sample, decode_samples, encode_samples};
pub use storage::{Banks, SampleBuffer};

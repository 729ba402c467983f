use alloc::string::String;

use thiserror::Error;

use crate::sample::{ElementKind, NativeType};

/// Errors that can occur while building or reading sample buffers.
///
/// All failures are synchronous and local; retrying with the same inputs
/// gives the same result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum Error {
    /// The channel count cannot be represented by the requested layout
    /// (zero channels, or packed color words outside 3–4 channels).
    #[error("cannot construct image with {0} channels")]
    UnsupportedChannelCount(usize),

    /// A bank does not hold the number of samples the layout implies.
    #[error("bank holds {actual} samples, layout needs {expected}")]
    ShapeMismatch {
        /// Samples required by width, height and channel count.
        expected: usize,
        /// Samples actually present.
        actual: usize,
    },

    /// The storage carries a different number of banks than the layout needs.
    #[error("storage has {actual} banks, layout needs {expected}")]
    BankCountMismatch {
        /// Banks required by the raster layout.
        expected: usize,
        /// Banks actually present.
        actual: usize,
    },

    /// A sample-type tag outside the supported set.
    #[error("unrecognized element kind: {0}")]
    UnrecognizedElementKind(String),

    /// The element kind cannot be stored in the given native bank type.
    #[error("{kind} samples cannot live in {native:?} banks")]
    KindMismatch {
        /// Declared element kind.
        kind: ElementKind,
        /// Native type of the supplied banks.
        native: NativeType,
    },

    /// Zero width or height.
    #[error("invalid image dimensions: {width}x{height}")]
    InvalidDimensions {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },

    /// A requested rectangle does not fit inside the image.
    #[error("region {width}x{height}+{x}+{y} is outside the image")]
    RegionOutOfBounds {
        /// Left edge.
        x: u32,
        /// Top edge.
        y: u32,
        /// Region width.
        width: u32,
        /// Region height.
        height: u32,
    },

    /// A raw byte buffer is not a whole number of samples.
    #[error("{len} bytes is not a multiple of {bytes_per_sample}-byte samples")]
    NotSampleAligned {
        /// Buffer length in bytes.
        len: usize,
        /// Bytes per sample.
        bytes_per_sample: usize,
    },
}

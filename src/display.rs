//! Display rendering and typed-image construction using [`imgref`] types.
//!
//! ```rust
//! use rgb::{Rgb, Rgba};
//! use ::imgref::ImgVec;
//! use sampleband::display;
//!
//! let src = ImgVec::new(vec![Rgb::new(255u8, 0, 128); 4], 2, 2);
//! let image = display::from_rgb_img(src.as_ref()).unwrap();
//! let shown: ImgVec<Rgba<u8>> = display::render_rgba(&image);
//! assert_eq!(shown.buf()[0], Rgba::new(255, 0, 128, 255));
//! ```

use alloc::vec::Vec;

use imgref::{ImgRef, ImgVec};
use rgb::{Rgb, Rgba};

use crate::Error;
use crate::construct::{AssembledImage, make_image_from_rgb, make_image_from_rgba};

/// Renders every pixel through the image's color mapping.
pub fn render_rgba(image: &AssembledImage) -> ImgVec<Rgba<u8>> {
    let (w, h) = (image.width(), image.height());
    let mut buf = Vec::with_capacity(w as usize * h as usize);
    for y in 0..h {
        for x in 0..w {
            let [r, g, b, a] = image.display_rgba(x, y);
            buf.push(Rgba::new(r, g, b, a));
        }
    }
    ImgVec::new(buf, w as usize, h as usize)
}

fn contiguous<P: Copy>(img: ImgRef<'_, P>) -> Vec<P> {
    img.pixels().collect()
}

fn dims<P>(img: ImgRef<'_, P>) -> Result<(u32, u32), Error> {
    let w = u32::try_from(img.width()).ok();
    let h = u32::try_from(img.height()).ok();
    match (w, h) {
        (Some(w), Some(h)) => Ok((w, h)),
        _ => Err(Error::InvalidDimensions {
            width: u32::MAX,
            height: u32::MAX,
        }),
    }
}

/// Packs a typed RGB image into color words.
pub fn from_rgb_img(img: ImgRef<'_, Rgb<u8>>) -> Result<AssembledImage, Error> {
    let (w, h) = dims(img)?;
    make_image_from_rgb(&contiguous(img), w, h)
}

/// Packs a typed RGBA image into color words.
pub fn from_rgba_img(img: ImgRef<'_, Rgba<u8>>) -> Result<AssembledImage, Error> {
    let (w, h) = dims(img)?;
    make_image_from_rgba(&contiguous(img), w, h)
}

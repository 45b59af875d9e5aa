//! Decoded textures and their sampling state.

/// Skin (color + metalness) loading and application
pub mod skin;

use std::path::Path;
use std::rc::Rc;

use image::{ImageFormat, RgbaImage};
use rootcause::Report;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TextureError {
    #[error("failed to decode image {path}: {reason}")]
    Decode { path: String, reason: String },
}

/// How sampled values are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    /// Display-referred color (albedo, sticker art).
    Srgb,
    /// Raw data (metalness, roughness).
    Linear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wrapping {
    ClampToEdge,
    Repeat,
}

/// A decoded RGBA8 image plus the sampler state a renderer needs.
///
/// Pixel data is immutable and shared between clones; the sampling fields are
/// per-clone.
#[derive(Debug, Clone)]
pub struct Texture {
    pub image: Rc<RgbaImage>,
    pub color_space: ColorSpace,
    /// Flip rows on upload. Image-space data is top-down, so this is on for
    /// plain images and off for maps authored against glTF UVs.
    pub flip_y: bool,
    pub wrap_s: Wrapping,
    pub wrap_t: Wrapping,
    /// Path the texture was loaded from, if any.
    pub source: Option<String>,
}

impl Texture {
    pub fn new(image: RgbaImage) -> Self {
        Self::from_shared(Rc::new(image))
    }

    pub fn from_shared(image: Rc<RgbaImage>) -> Self {
        Self {
            image,
            color_space: ColorSpace::Linear,
            flip_y: true,
            wrap_s: Wrapping::ClampToEdge,
            wrap_t: Wrapping::ClampToEdge,
            source: None,
        }
    }

    /// Decode PNG or WebP bytes. The format is taken from the path extension,
    /// falling back to content sniffing.
    pub fn decode(path: &str, bytes: &[u8]) -> Result<Self, Report<TextureError>> {
        let decoded = match ImageFormat::from_path(Path::new(path)) {
            Ok(format) => image::load_from_memory_with_format(bytes, format),
            Err(_) => image::load_from_memory(bytes),
        }
        .map_err(|e| {
            Report::new(TextureError::Decode {
                path: path.to_string(),
                reason: e.to_string(),
            })
        })?;

        let mut texture = Self::new(decoded.to_rgba8());
        texture.source = Some(path.to_string());
        Ok(texture)
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn same_image(&self, other: &Texture) -> bool {
        Rc::ptr_eq(&self.image, &other.image)
    }

    pub(crate) fn repeat(mut self) -> Self {
        self.wrap_s = Wrapping::Repeat;
        self.wrap_t = Wrapping::Repeat;
        self
    }
}

/// Equal when both share pixels and sample them the same way.
impl PartialEq for Texture {
    fn eq(&self, other: &Self) -> bool {
        self.same_image(other)
            && self.color_space == other.color_space
            && self.flip_y == other.flip_y
            && self.wrap_s == other.wrap_s
            && self.wrap_t == other.wrap_t
    }
}

use std::path::Path;
use std::sync::Arc;

use crate::context::RenderContext;
use crate::error::{RenderError, Result};

/// A 2D RGBA texture, deleted on drop.
pub struct Texture<C: RenderContext> {
    context: Arc<C>,
    pub name: String,
    pub texture: C::Texture,
    pub width: u32,
    pub height: u32,
}

impl<C: RenderContext> Texture<C> {
    /// Decodes an image file and uploads it. Rows are flipped so the first
    /// decoded row ends up at v = 0.
    pub fn from_path(context: Arc<C>, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let img = decode_flipped(path)?;
        let (width, height) = img.dimensions();

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let texture = Self::from_rgba(context, name, width, height, &img.into_raw())?;
        log::info!("Loaded texture {:?} ({}x{})", path, width, height);

        Ok(texture)
    }

    /// Uploads tightly packed RGBA8 rows. `pixels` must hold exactly
    /// `width * height * 4` bytes.
    pub fn from_rgba(
        context: Arc<C>,
        name: String,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> Result<Self> {
        let (gl_width, gl_height) = match rgba_dimensions(width, height, pixels.len()) {
            Some(dimensions) => dimensions,
            None => {
                let error = RenderError::PixelData {
                    width,
                    height,
                    supplied: pixels.len(),
                };
                log::error!("Texture {name}: {error}");
                return Err(error);
            }
        };

        let texture = context
            .create_texture()
            .map_err(|reason| RenderError::Allocation {
                object: "texture",
                reason,
            })?;
        context.bind_texture(glow::TEXTURE_2D, Some(texture));

        context.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, glow::REPEAT as i32);
        context.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, glow::REPEAT as i32);
        context.tex_parameter_i32(
            glow::TEXTURE_2D,
            glow::TEXTURE_MIN_FILTER,
            glow::NEAREST_MIPMAP_NEAREST as i32,
        );
        context.tex_parameter_i32(
            glow::TEXTURE_2D,
            glow::TEXTURE_MAG_FILTER,
            glow::LINEAR as i32,
        );

        context.tex_image_2d_rgba(glow::TEXTURE_2D, gl_width, gl_height, pixels);
        context.generate_mipmap(glow::TEXTURE_2D);

        Ok(Texture {
            context,
            name,
            texture,
            width,
            height,
        })
    }

    /// Binds to texture unit `unit` (0 for `TEXTURE0`).
    pub fn bind(&self, unit: u32) {
        self.context.active_texture(glow::TEXTURE0 + unit);
        self.context
            .bind_texture(glow::TEXTURE_2D, Some(self.texture));
    }
}

/// GL sizes for an RGBA8 upload, if `len` bytes is exactly one such image.
fn rgba_dimensions(width: u32, height: u32, len: usize) -> Option<(i32, i32)> {
    let gl_width = i32::try_from(width).ok()?;
    let gl_height = i32::try_from(height).ok()?;
    let expected = (width as usize)
        .checked_mul(height as usize)?
        .checked_mul(4)?;
    (len == expected).then_some((gl_width, gl_height))
}

fn decode_flipped(path: &Path) -> Result<image::RgbaImage> {
    let img = image::open(path).map_err(|source| RenderError::TextureLoad {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(img.flipv().to_rgba8())
}

impl<C: RenderContext> Drop for Texture<C> {
    fn drop(&mut self) {
        log::trace!("Deleting texture {} ({:?})", self.name, self.texture);
        self.context.delete_texture(self.texture);
    }
}

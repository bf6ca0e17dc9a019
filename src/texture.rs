//! Image sampled by the particles.

use std::path::Path;

use log::info;
use wgpu::util::DeviceExt;

use crate::error::SetupError;

pub const PROCEDURAL_SIZE: u32 = 512;

/// Decoded RGBA8 pixels, ready for upload.
#[derive(Debug, Clone)]
pub struct TextureImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl TextureImage {
    pub fn open(path: &Path) -> Result<Self, SetupError> {
        let image = image::open(path)
            .map_err(|source| SetupError::Texture {
                path: path.to_path_buf(),
                source,
            })?
            .to_rgba8();

        info!(
            "Loaded texture `{}` ({}x{})",
            path.display(),
            image.width(),
            image.height()
        );

        Ok(Self {
            width: image.width(),
            height: image.height(),
            rgba: image.into_raw(),
        })
    }

    /// A landscape: sky gradient, a sun and striped fields below the horizon.
    pub fn procedural(width: u32, height: u32) -> Self {
        let mut rgba = Vec::with_capacity(width as usize * height as usize * 4);
        let horizon = height as f32 * 0.55;
        let sun = (width as f32 * 0.72, height as f32 * 0.25);
        let sun_radius = width.min(height) as f32 * 0.09;

        for y in 0..height {
            for x in 0..width {
                let (fx, fy) = (x as f32, y as f32);
                let pixel = if ((fx - sun.0).powi(2) + (fy - sun.1).powi(2)).sqrt() < sun_radius {
                    [255, 214, 90]
                } else if fy < horizon {
                    let t = fy / horizon;
                    [lerp(70, 190, t), lerp(120, 220, t), lerp(200, 250, t)]
                } else {
                    let depth = (fy - horizon) / (height as f32 - horizon);
                    let stripe = ((fx / width as f32 - 0.5) / (0.2 + depth)).abs() * 12.0;
                    if (stripe as u32 + (depth * 6.0) as u32) % 2 == 0 {
                        [lerp(110, 60, depth), lerp(160, 110, depth), 40]
                    } else {
                        [lerp(180, 120, depth), lerp(150, 95, depth), 60]
                    }
                };

                rgba.extend_from_slice(&[pixel[0], pixel[1], pixel[2], 255]);
            }
        }

        Self {
            width,
            height,
            rgba,
        }
    }

    /// Loads `path`, or generates the built in image when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, SetupError> {
        match path {
            Some(path) => Self::open(path),
            None => {
                info!(
                    "No texture given, using generated {0}x{0} image",
                    PROCEDURAL_SIZE
                );
                Ok(Self::procedural(PROCEDURAL_SIZE, PROCEDURAL_SIZE))
            }
        }
    }

    /// Uploads the pixels as linear `Rgba8Unorm`, no sRGB decoding on sample.
    pub fn upload(&self, device: &wgpu::Device, queue: &wgpu::Queue) -> wgpu::Texture {
        device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some("Particle Texture"),
                size: wgpu::Extent3d {
                    width: self.width,
                    height: self.height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8Unorm,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            &self.rgba,
        )
    }
}

fn lerp(a: u8, b: u8, t: f32) -> u8 {
    (a as f32 + (b as f32 - a as f32) * t.clamp(0.0, 1.0)).round() as u8
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("particle_field_{}_{name}", std::process::id()))
    }

    #[test]
    fn procedural_image_has_one_rgba_pixel_per_texel() {
        let image = TextureImage::procedural(64, 32);
        assert_eq!(image.rgba.len(), 64 * 32 * 4);
        assert!(image.rgba.chunks_exact(4).all(|p| p[3] == 255));
    }

    #[test]
    fn load_without_path_is_procedural() {
        let image = TextureImage::load(None).unwrap();
        assert_eq!((image.width, image.height), (PROCEDURAL_SIZE, PROCEDURAL_SIZE));
    }

    #[test]
    fn opens_png_files() {
        let path = temp_path("ok.png");
        image::RgbaImage::from_pixel(3, 2, image::Rgba([10, 20, 30, 255]))
            .save(&path)
            .unwrap();

        let image = TextureImage::open(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!((image.width, image.height), (3, 2));
        assert_eq!(&image.rgba[..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn undecodable_files_are_reported_with_their_path() {
        let path = temp_path("bad.png");
        std::fs::write(&path, b"not an image").unwrap();

        let result = TextureImage::open(&path);
        std::fs::remove_file(&path).ok();

        match result {
            Err(SetupError::Texture { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("expected texture error, got {other:?}"),
        }
    }

    #[test]
    fn missing_files_are_errors() {
        assert!(TextureImage::open(&temp_path("missing.png")).is_err());
    }
}

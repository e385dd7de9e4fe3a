use std::fs::OpenOptions;
use std::io::{Cursor, Write};
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use chrono::Utc;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageReader, RgbImage, RgbaImage};
use tracing::debug;

use crate::alpha_bleed;

/// Logos are stored as squares of this size.
pub const LOGO_SIZE: u32 = 128;

const WEBP_QUALITY: f32 = 95.0;
const JPEG_QUALITY: u8 = 95;

const ILLEGAL_FILENAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoFormat {
    WebP,
    Png,
    Jpeg,
}

impl LogoFormat {
    /// Tried in this order until one saves.
    pub const PREFERENCE: [LogoFormat; 3] = [LogoFormat::WebP, LogoFormat::Png, LogoFormat::Jpeg];

    pub fn extension(self) -> &'static str {
        match self {
            LogoFormat::WebP => "webp",
            LogoFormat::Png => "png",
            LogoFormat::Jpeg => "jpg",
        }
    }

    pub fn file_name(self, base: &str) -> String {
        format!("{}.{}", base, self.extension())
    }

    pub fn encode(self, img: &DynamicImage) -> Result<Vec<u8>> {
        match self {
            LogoFormat::WebP => encode_webp(img),
            LogoFormat::Png => {
                let mut buf = Vec::new();
                let encoder = PngEncoder::new_with_quality(
                    &mut buf,
                    CompressionType::Best,
                    PngFilter::Adaptive,
                );
                img.write_with_encoder(encoder)
                    .context("Failed to encode PNG")?;
                Ok(buf)
            }
            LogoFormat::Jpeg => {
                // JPEG has no alpha channel.
                let rgb = match img {
                    DynamicImage::ImageRgba8(rgba) => flatten_onto_white(rgba),
                    other => other.to_rgb8(),
                };
                let mut buf = Vec::new();
                let encoder = JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY);
                DynamicImage::ImageRgb8(rgb)
                    .write_with_encoder(encoder)
                    .context("Failed to encode JPEG")?;
                Ok(buf)
            }
        }
    }
}

/// Lossy WebP; the alpha plane is kept when the image has one.
fn encode_webp(img: &DynamicImage) -> Result<Vec<u8>> {
    let (width, height) = img.dimensions();
    let rgb;
    let encoder = match img {
        DynamicImage::ImageRgba8(rgba) => webp::Encoder::from_rgba(rgba.as_raw(), width, height),
        other => {
            rgb = other.to_rgb8();
            webp::Encoder::from_rgb(rgb.as_raw(), width, height)
        }
    };
    let memory = encoder
        .encode_simple(false, WEBP_QUALITY)
        .map_err(|e| anyhow!("Failed to encode WebP: {:?}", e))?;

    Ok(memory.to_vec())
}

fn flatten_onto_white(rgba: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let pixel = rgba.get_pixel(x, y);
        let alpha = pixel[3] as u32;
        let blend = |c: u8| ((c as u32 * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
        image::Rgb([blend(pixel[0]), blend(pixel[1]), blend(pixel[2])])
    })
}

/// Header-only check: the bytes must be a known image format with sane
/// dimensions. Pixel data is not decoded.
pub fn validate_image(bytes: &[u8]) -> Result<(u32, u32)> {
    let reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
    if reader.format().is_none() {
        bail!("unrecognised image format");
    }
    let (width, height) = reader.into_dimensions()?;
    if width == 0 || height == 0 {
        bail!("image has no pixels ({}x{})", width, height);
    }
    Ok((width, height))
}

/// Decode and bring an icon to the stored shape: RGBA when the source has
/// transparency, RGB otherwise, `LOGO_SIZE` square.
pub fn normalize(bytes: &[u8]) -> Result<DynamicImage> {
    let decoded = image::load_from_memory(bytes).context("Failed to decode image")?;
    let needs_resize = decoded.dimensions() != (LOGO_SIZE, LOGO_SIZE);

    let img = if decoded.color().has_alpha() {
        let mut rgba = decoded.into_rgba8();
        if needs_resize {
            alpha_bleed::bleed_transparent_edges(&mut rgba);
        }
        DynamicImage::ImageRgba8(rgba)
    } else {
        DynamicImage::ImageRgb8(decoded.into_rgb8())
    };

    if needs_resize {
        Ok(img.resize_exact(LOGO_SIZE, LOGO_SIZE, FilterType::Lanczos3))
    } else {
        Ok(img)
    }
}

/// Drop characters that are not allowed in file names; everything else,
/// including spaces and non-ASCII text, is kept.
pub fn sanitize_filename(title: &str) -> String {
    title
        .chars()
        .filter(|c| !ILLEGAL_FILENAME_CHARS.contains(c) && !c.is_ascii_control())
        .collect()
}

/// File stem for a site's logo: the title, or the domain when the title
/// has nothing usable in it.
pub fn logo_basename(title: &str, domain: &str) -> String {
    [title, domain]
        .iter()
        .map(|s| sanitize_filename(s))
        .find(|s| !s.trim().is_empty())
        .unwrap_or_else(|| "logo".to_string())
}

/// Normalize `bytes` and store them in `logos_dir`. Returns the file name
/// that was written.
pub fn save_logo(bytes: &[u8], title: &str, domain: &str, logos_dir: &Path) -> Result<String> {
    let img = normalize(bytes)?;
    save_normalized(&img, &logo_basename(title, domain), logos_dir)
}

/// Write `img` in the first format of [`LogoFormat::PREFERENCE`] that
/// encodes and saves. An existing file is never overwritten: a taken name
/// gets a unique suffix, and that suffixed name is the one returned.
pub fn save_normalized(img: &DynamicImage, base: &str, logos_dir: &Path) -> Result<String> {
    std::fs::create_dir_all(logos_dir)
        .with_context(|| format!("Failed to create {}", logos_dir.display()))?;

    let mut base = base.to_string();
    let mut failures = Vec::new();

    for format in LogoFormat::PREFERENCE {
        if logos_dir.join(format.file_name(&base)).exists() {
            base = unique_base(&base, format, logos_dir);
        }
        let file_name = format.file_name(&base);
        let path = logos_dir.join(&file_name);

        match format.encode(img).and_then(|buf| write_new(&path, &buf)) {
            Ok(()) => return Ok(file_name),
            Err(e) => {
                debug!(ext = format.extension(), error = %e, "logo save failed");
                failures.push(format!("{}: {:#}", format.extension(), e));
            }
        }
    }

    bail!("No logo format could be saved ({})", failures.join("; "))
}

fn unique_base(base: &str, format: LogoFormat, dir: &Path) -> String {
    let stamped = format!("{}_{}", base, Utc::now().timestamp());
    let free = |candidate: &String| !dir.join(format.file_name(candidate)).exists();

    if free(&stamped) {
        return stamped;
    }
    let numbered = (1u32..).map(|n| format!("{stamped}_{n}")).find(free);
    numbered.unwrap_or(stamped)
}

fn write_new(path: &Path, data: &[u8]) -> Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    if let Err(e) = file.write_all(data) {
        drop(file);
        let _ = std::fs::remove_file(path);
        return Err(e).with_context(|| format!("Failed to write {}", path.display()));
    }
    Ok(())
}

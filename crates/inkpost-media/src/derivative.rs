//! Derivative generation: fan one raw image out into resized variants.
//!
//! Each variant decodes the same immutable input and writes its own output
//! buffer; variants run concurrently up to `max_concurrency`, each on the
//! blocking pool since decode/resize/encode is CPU-bound. The first failing
//! variant aborts the remaining work for the request; partial results are
//! never delivered.

use anyhow::Context;
use bytes::Bytes;
use futures::StreamExt;
use image::{DynamicImage, GenericImageView};
use inkpost_core::{MediaError, OutputFormat, VariantSpec};
use std::io::Cursor;

pub struct DerivativeGenerator {
    format: OutputFormat,
    webp_quality: f32,
    max_concurrency: usize,
}

impl DerivativeGenerator {
    pub fn new(format: OutputFormat, webp_quality: f32, max_concurrency: usize) -> Self {
        Self {
            format,
            webp_quality,
            max_concurrency: max_concurrency.max(1),
        }
    }

    /// Render every spec, in spec order. Returns `(variant name, encoded
    /// bytes)` pairs, or the first failure.
    pub async fn generate(
        &self,
        data: Bytes,
        specs: &[VariantSpec],
    ) -> Result<Vec<(String, Bytes)>, MediaError> {
        let format = self.format;
        let quality = self.webp_quality;

        let mut stream = futures::stream::iter(specs.iter().cloned().map(|spec| {
            let data = data.clone();
            async move {
                let name = spec.name.clone();
                tracing::debug!(variant = %name, width = spec.width, height = spec.height, "rendering variant");
                match tokio::task::spawn_blocking(move || render_variant(&data, &spec, format, quality))
                    .await
                {
                    Ok(Ok(bytes)) => Ok((name, bytes)),
                    Ok(Err(cause)) => Err(MediaError::ProcessingFailure {
                        variant: name,
                        cause,
                    }),
                    Err(join_err) => Err(MediaError::ProcessingFailure {
                        variant: name,
                        cause: anyhow::Error::from(join_err),
                    }),
                }
            }
        }))
        .buffered(self.max_concurrency);

        let mut rendered = Vec::with_capacity(specs.len());
        while let Some(result) = stream.next().await {
            // Dropping the stream on the first error abandons the remaining
            // variants for this request.
            rendered.push(result?);
        }
        Ok(rendered)
    }
}

fn render_variant(
    data: &[u8],
    spec: &VariantSpec,
    format: OutputFormat,
    webp_quality: f32,
) -> anyhow::Result<Bytes> {
    let img = image::ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .context("failed to sniff image format")?
        .decode()
        .context("failed to decode image")?;

    let (orig_width, orig_height) = img.dimensions();
    let filter = select_filter(orig_width, orig_height, spec.width, spec.height);
    // Fill-crop: preserve aspect ratio, crop overflow, land exactly on the
    // spec dimensions.
    let resized = img.resize_to_fill(spec.width, spec.height, filter);

    encode(&resized, format, webp_quality)
}

/// Select resampling filter by downscale ratio: heavy downscales get cheaper
/// filters with no visible quality loss at the target size.
fn select_filter(
    orig_width: u32,
    orig_height: u32,
    new_width: u32,
    new_height: u32,
) -> image::imageops::FilterType {
    let width_ratio = orig_width as f32 / new_width as f32;
    let height_ratio = orig_height as f32 / new_height as f32;
    let max_ratio = width_ratio.max(height_ratio);

    if max_ratio > 2.0 {
        image::imageops::FilterType::Triangle
    } else if max_ratio > 1.5 {
        image::imageops::FilterType::CatmullRom
    } else {
        image::imageops::FilterType::Lanczos3
    }
}

fn encode(img: &DynamicImage, format: OutputFormat, webp_quality: f32) -> anyhow::Result<Bytes> {
    match format {
        OutputFormat::WebP => {
            let rgba = img.to_rgba8();
            let (width, height) = rgba.dimensions();
            let encoder = webp::Encoder::from_rgba(&rgba, width, height);
            let webp_data = encoder.encode(webp_quality);
            Ok(Bytes::copy_from_slice(&webp_data))
        }
        OutputFormat::Jpeg => {
            // JPEG has no alpha channel.
            let rgb = img.to_rgb8();
            let mut buffer = Vec::new();
            rgb.write_to(&mut Cursor::new(&mut buffer), image::ImageFormat::Jpeg)
                .context("failed to encode jpeg")?;
            Ok(Bytes::from(buffer))
        }
        OutputFormat::Png => {
            let mut buffer = Vec::new();
            img.write_to(&mut Cursor::new(&mut buffer), image::ImageFormat::Png)
                .context("failed to encode png")?;
            Ok(Bytes::from(buffer))
        }
    }
}

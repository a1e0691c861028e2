// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Decode/encode boundary. Encoded JPEG/PNG/TIFF/WEBP/BMP buffers come in,
// rasters go out; everything past this file works on in-memory pixels only.

use image::{DynamicImage, GrayImage, ImageFormat, RgbImage};
use loupe_core::error::{LoupeError, Result};
use loupe_core::types::RasterFormat;
use tracing::{debug, info, instrument};

/// An in-memory raster on its way into or out of the pipeline.
///
/// ```ignore
/// let photo = Raster::open("front_01.jpg")?.to_rgb8();
/// let result = extractor.extract(&photo)?;
/// Raster::from_gray(result.normalized_mask).save("front_01_mask.png")?;
/// ```
#[derive(Debug, Clone)]
pub struct Raster {
    image: DynamicImage,
}

impl Raster {
    // -- Construction ---------------------------------------------------------

    /// Decode an image file. The format is sniffed from the content.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        let raster = Self::from_bytes(&bytes).map_err(|err| match err {
            LoupeError::DecodeFailure(detail) => LoupeError::DecodeFailure(format!(
                "{}: {}",
                path.as_ref().display(),
                detail
            )),
            other => other,
        })?;
        info!(
            width = raster.width(),
            height = raster.height(),
            "Image loaded"
        );
        Ok(raster)
    }

    /// Decode raw encoded bytes (JPEG, PNG, etc.).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let image = image::load_from_memory(data)
            .map_err(|err| LoupeError::DecodeFailure(err.to_string()))?;
        if image.width() == 0 || image.height() == 0 {
            return Err(LoupeError::DecodeFailure("image has no pixels".into()));
        }
        debug!(
            width = image.width(),
            height = image.height(),
            "Image decoded from bytes"
        );
        Ok(Self { image })
    }

    pub fn from_rgb(image: RgbImage) -> Self {
        Self {
            image: DynamicImage::ImageRgb8(image),
        }
    }

    pub fn from_gray(mask: GrayImage) -> Self {
        Self {
            image: DynamicImage::ImageLuma8(mask),
        }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// The 3-channel, 8-bit view every pipeline stage consumes. Alpha is
    /// dropped and higher bit depths are reduced.
    pub fn to_rgb8(&self) -> RgbImage {
        self.image.to_rgb8()
    }

    // -- Output ---------------------------------------------------------------

    /// Encode in the given format.
    pub fn encode(&self, format: RasterFormat) -> Result<Vec<u8>> {
        match format {
            // JPEG cannot carry alpha or 16-bit samples.
            RasterFormat::Jpeg => self.to_jpeg_bytes(90),
            other => encode_to_format(&self.image, image_format(other)),
        }
    }

    pub fn to_png_bytes(&self) -> Result<Vec<u8>> {
        encode_to_format(&self.image, ImageFormat::Png)
    }

    /// Encode as JPEG with the given quality (1-100).
    pub fn to_jpeg_bytes(&self, quality: u8) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let rgb = self.image.to_rgb8();
        let encoder =
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
        rgb.write_with_encoder(encoder)
            .map_err(|err| LoupeError::EncodeFailure(format!("JPEG: {}", err)))?;
        Ok(buffer)
    }

    /// Write to a file. The format follows the file extension; unknown
    /// extensions are an `EncodeFailure`.
    #[instrument(skip(self), fields(path = %path.as_ref().display()))]
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let path = path.as_ref();
        let format = path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(RasterFormat::from_extension)
            .ok_or_else(|| {
                LoupeError::EncodeFailure(format!(
                    "cannot infer an output format from {}",
                    path.display()
                ))
            })?;
        let bytes = self.encode(format)?;
        std::fs::write(path, &bytes)?;
        debug!(bytes = bytes.len(), "Image written");
        Ok(())
    }
}

fn image_format(format: RasterFormat) -> ImageFormat {
    match format {
        RasterFormat::Png => ImageFormat::Png,
        RasterFormat::Jpeg => ImageFormat::Jpeg,
        RasterFormat::Tiff => ImageFormat::Tiff,
        RasterFormat::Webp => ImageFormat::WebP,
        RasterFormat::Bmp => ImageFormat::Bmp,
    }
}

fn encode_to_format(image: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buffer);
    image
        .write_to(&mut cursor, format)
        .map_err(|err| LoupeError::EncodeFailure(format!("{:?}: {}", format, err)))?;
    Ok(buffer)
}

//! QR rendering to PNG.

use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::imageops::{self, FilterType};
use image::{ExtendedColorType, GrayImage, ImageEncoder, Luma};
use qrcode::types::QrError;
use qrcode::{Color, EcLevel, QrCode};
use qrlink_web::ResponseError;

#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("payload cannot be encoded as a QR code: {0}")]
    Qr(#[from] QrError),

    #[error("failed to write PNG: {0}")]
    Png(#[from] image::ImageError),
}

impl ResponseError for EncodeError {}

/// Renders a text payload as a PNG image.
pub trait VisualEncoder: Send + Sync {
    fn encode_png(&self, payload: &str) -> Result<Vec<u8>, EncodeError>;
}

/// QR renderer with fixed geometry: black modules on white, scaled onto a
/// square canvas with Lanczos3 resampling.
#[derive(Clone, Debug)]
pub struct QrPngEncoder {
    /// Pixels per module before resizing
    pub module_size: u32,
    /// Quiet zone width in modules
    pub border: u32,
    /// Side of the final image in pixels
    pub canvas_size: u32,
    pub ec_level: EcLevel,
}

impl Default for QrPngEncoder {
    fn default() -> Self {
        Self {
            module_size: 10,
            border: 4,
            canvas_size: 400,
            ec_level: EcLevel::H,
        }
    }
}

impl QrPngEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn canvas_size(mut self, size: u32) -> Self {
        self.canvas_size = size;
        self
    }

    fn rasterize(&self, code: &QrCode) -> GrayImage {
        let width = code.width() as u32;
        let colors = code.to_colors();
        let modules = width + 2 * self.border;
        let side = modules * self.module_size;

        GrayImage::from_fn(side, side, |x, y| {
            let (mx, my) = (x / self.module_size, y / self.module_size);
            let inside = (self.border..self.border + width).contains(&mx)
                && (self.border..self.border + width).contains(&my);
            let dark = inside && {
                let idx = (my - self.border) * width + (mx - self.border);
                colors[idx as usize] == Color::Dark
            };
            Luma([if dark { 0 } else { 255 }])
        })
    }
}

impl VisualEncoder for QrPngEncoder {
    fn encode_png(&self, payload: &str) -> Result<Vec<u8>, EncodeError> {
        let code = QrCode::with_error_correction_level(payload.as_bytes(), self.ec_level)?;
        let raster = self.rasterize(&code);
        let canvas = imageops::resize(
            &raster,
            self.canvas_size,
            self.canvas_size,
            FilterType::Lanczos3,
        );

        let mut png = Vec::new();
        PngEncoder::new_with_quality(&mut png, CompressionType::Best, PngFilter::Adaptive)
            .write_image(
                canvas.as_raw(),
                canvas.width(),
                canvas.height(),
                ExtendedColorType::L8,
            )?;
        Ok(png)
    }
}

//! Single-page PDF rendering for scanned invoice images.
//!
//! The image is re-encoded as a baseline JPEG and embedded as a `DCTDecode`
//! XObject, so any decodable input (PNG included) ends up in a compact PDF.
//! One image pixel maps to one PDF point.

use image::{DynamicImage, ImageOutputFormat};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use std::io::Cursor;
use thiserror::Error;

/// A4 portrait, in points
pub const PAGE_WIDTH: f32 = 595.28;
pub const PAGE_HEIGHT: f32 = 841.89;
pub const PAGE_MARGIN: f32 = 10.0;

const JPEG_QUALITY: u8 = 90;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("Failed to read image: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Failed to render PDF: {0}")]
    Render(String),
}

impl From<lopdf::Error> for ConvertError {
    fn from(e: lopdf::Error) -> Self {
        ConvertError::Render(e.to_string())
    }
}

/// Where the image lands on the page, in points from the bottom-left corner
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Fits `width` x `height` inside the page margins without upscaling and
/// centers the result.
pub fn fit_to_page(width: u32, height: u32) -> Placement {
    let (w, h) = (width.max(1) as f32, height.max(1) as f32);
    let max_w = PAGE_WIDTH - 2.0 * PAGE_MARGIN;
    let max_h = PAGE_HEIGHT - 2.0 * PAGE_MARGIN;

    let scale = (max_w / w).min(max_h / h).min(1.0);
    let (draw_w, draw_h) = (w * scale, h * scale);

    Placement {
        x: (PAGE_WIDTH - draw_w) / 2.0,
        y: (PAGE_HEIGHT - draw_h) / 2.0,
        width: draw_w,
        height: draw_h,
    }
}

/// True for the image types the invoice flow converts to PDF before storage
pub fn is_convertible_image(content_type: &str) -> bool {
    matches!(
        crate::utils::validation::normalize_mime(content_type).as_str(),
        "image/jpeg" | "image/jpg" | "image/png"
    )
}

fn decode(bytes: &[u8]) -> Result<DynamicImage, ConvertError> {
    let reader = image::io::Reader::new(Cursor::new(bytes)).with_guessed_format()?;
    Ok(reader.decode()?)
}

/// Renders `bytes` (any format the `image` crate can guess) into a one-page PDF.
pub fn image_to_pdf(bytes: &[u8]) -> Result<Vec<u8>, ConvertError> {
    let img = decode(bytes)?;
    let (px_w, px_h) = (img.width(), img.height());

    let mut jpeg = Vec::new();
    DynamicImage::ImageRgb8(img.to_rgb8())
        .write_to(&mut Cursor::new(&mut jpeg), ImageOutputFormat::Jpeg(JPEG_QUALITY))
        .map_err(|e| ConvertError::Render(e.to_string()))?;

    let placement = fit_to_page(px_w, px_h);
    tracing::debug!(
        width = px_w,
        height = px_h,
        draw_width = placement.width,
        draw_height = placement.height,
        "Rendering invoice image into PDF"
    );

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let image_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => px_w as i64,
            "Height" => px_h as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "DCTDecode",
        },
        jpeg,
    ));

    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    placement.width.into(),
                    0.into(),
                    0.into(),
                    placement.height.into(),
                    placement.x.into(),
                    placement.y.into(),
                ],
            ),
            Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
            Operation::new("Q", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));

    let resources_id = doc.add_object(dictionary! {
        "XObject" => dictionary! {
            "Im0" => image_id,
        },
    });

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
    });

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut out = Vec::new();
    doc.save_to(&mut out)?;
    Ok(out)
}

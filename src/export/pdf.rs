use crate::error::{PanelError, Result};
use figure_panel_common::layout::{fitted_height_mm, mm_to_pt, A4_LANDSCAPE_HEIGHT_MM, A4_LANDSCAPE_WIDTH_MM};
use image::RgbaImage;
use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, Pt, RawImage, RawImageData, RawImageFormat, XObjectTransform,
};
use tracing::debug;

const MM_PER_INCH: f32 = 25.4;

/// ラスタをA4横1ページのPDFにする
///
/// 画像は左上に置き、幅をページ幅に合わせる。高さは縦横比から決まる
/// （ページに収まらない部分ははみ出す）。
pub fn render_pdf(raster: &RgbaImage, title: &str) -> Result<Vec<u8>> {
    let (width_px, height_px) = raster.dimensions();
    if width_px == 0 || height_px == 0 {
        return Err(PanelError::PdfGeneration("画像サイズが0です".into()));
    }

    let mut doc = PdfDocument::new(title);

    let image = RawImage {
        pixels: RawImageData::U8(raster.as_raw().clone()),
        width: width_px as usize,
        height: height_px as usize,
        data_format: RawImageFormat::RGBA8,
        tag: Vec::new(),
    };
    let image_id = doc.add_image(&image);

    // ページ幅ちょうどになるDPI
    let dpi = width_px as f32 * MM_PER_INCH / A4_LANDSCAPE_WIDTH_MM;
    let image_height_mm = fitted_height_mm(A4_LANDSCAPE_WIDTH_MM, width_px, height_px);
    let bottom_mm = A4_LANDSCAPE_HEIGHT_MM - image_height_mm;
    debug!(dpi, image_height_mm, "placing raster on pdf page");

    let ops = vec![Op::UseXobject {
        id: image_id,
        transform: XObjectTransform {
            translate_x: Some(Pt(0.0)),
            translate_y: Some(Pt(mm_to_pt(bottom_mm))),
            dpi: Some(dpi),
            ..Default::default()
        },
    }];

    let page = PdfPage::new(Mm(A4_LANDSCAPE_WIDTH_MM), Mm(A4_LANDSCAPE_HEIGHT_MM), ops);
    let mut warnings = Vec::new();
    let bytes = doc
        .with_pages(vec![page])
        .save(&PdfSaveOptions::default(), &mut warnings);
    if !warnings.is_empty() {
        debug!(count = warnings.len(), "pdf warnings");
    }
    if bytes.is_empty() {
        return Err(PanelError::PdfGeneration("PDFの書き出しに失敗しました".into()));
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_render_pdf_header() {
        let raster = RgbaImage::from_pixel(40, 20, Rgba([255, 255, 255, 255]));
        let bytes = render_pdf(&raster, "figure").unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_render_pdf_rejects_empty() {
        let raster = RgbaImage::new(0, 0);
        assert!(matches!(render_pdf(&raster, "figure"), Err(PanelError::PdfGeneration(_))));
    }

    #[test]
    fn test_page_fit_height() {
        // 2:1 の画像は 297mm × 148.5mm
        assert!((fitted_height_mm(A4_LANDSCAPE_WIDTH_MM, 400, 200) - 148.5).abs() < 1e-3);
    }
}

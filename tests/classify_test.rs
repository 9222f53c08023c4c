//! Classification of real (in-memory) PDFs.

mod common;

use std::io::Write;

use common::{build_pdf, MockRenderer, PageSpec, TextLayerRenderer};
use pagesift::classify::{classify, profile_pages};
use pagesift::{
    DocumentKind, ExtractOptions, LopdfBackend, PageKind, PageSelection, PdfBackend,
};

fn backend(pages: &[PageSpec]) -> LopdfBackend {
    LopdfBackend::from_bytes(build_pdf(pages)).unwrap()
}

#[test]
fn test_all_text_is_pure() {
    let pdf = backend(&[PageSpec::Text("Alpha"), PageSpec::Text("Beta")]);
    let classification = classify(&pdf, &ExtractOptions::default()).unwrap();

    assert_eq!(classification.kind, DocumentKind::Pure);
    assert_eq!(classification.scanned_pages(), 0);
}

#[test]
fn test_all_images_is_scanned() {
    let pdf = backend(&[PageSpec::Image, PageSpec::Image, PageSpec::Image]);
    let classification = classify(&pdf, &ExtractOptions::default()).unwrap();

    assert_eq!(classification.kind, DocumentKind::Scanned);
    assert_eq!(classification.scanned_pages(), 3);
    assert!(classification
        .pages
        .iter()
        .all(|p| p.kind() == PageKind::Scanned && p.image_count == 1));
}

#[test]
fn test_mix_is_combined() {
    let pdf = backend(&[PageSpec::Text("Cover"), PageSpec::Image]);
    let classification = classify(&pdf, &ExtractOptions::default()).unwrap();

    assert_eq!(classification.kind, DocumentKind::Combined);
    assert_eq!(classification.pages[0].kind(), PageKind::Text);
    assert_eq!(classification.pages[1].kind(), PageKind::Scanned);
}

#[test]
fn test_text_with_image_is_still_pure() {
    let pdf = backend(&[PageSpec::TextAndImage("Figure 1")]);
    let classification = classify(&pdf, &ExtractOptions::default()).unwrap();

    assert_eq!(classification.kind, DocumentKind::Pure);
    assert_eq!(classification.pages[0].kind(), PageKind::TextWithImages);
    assert_eq!(classification.embedded_images(), 1);
}

#[test]
fn test_image_counted_once_through_form() {
    let pdf = backend(&[PageSpec::TextAndNestedImage("Nested")]);

    assert_eq!(pdf.page_image_count(1).unwrap(), 1);
    assert_eq!(pdf.page_images(1).unwrap().len(), 1);
}

#[test]
fn test_profiles_are_in_page_order() {
    let pdf = backend(&[
        PageSpec::Image,
        PageSpec::Text("Two"),
        PageSpec::TextAndImage("Three"),
    ]);
    let profiles = profile_pages(&pdf, &ExtractOptions::default()).unwrap();

    let numbers: Vec<u32> = profiles.iter().map(|p| p.page).collect();
    assert_eq!(numbers, vec![1, 2, 3]);
    assert_eq!(profiles[0].kind(), PageKind::Scanned);
    assert_eq!(profiles[1].kind(), PageKind::Text);
    assert_eq!(profiles[2].kind(), PageKind::TextWithImages);
}

#[test]
fn test_selection_limits_classification() {
    let pdf = backend(&[PageSpec::Image, PageSpec::Text("Two"), PageSpec::Text("Three")]);
    let options = ExtractOptions::new().with_pages(PageSelection::Range(2..=3));
    let classification = classify(&pdf, &options).unwrap();

    assert_eq!(classification.kind, DocumentKind::Pure);
    assert_eq!(classification.pages.len(), 2);
}

#[test]
fn test_classify_file_on_disk() {
    let mut file = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
    file.write_all(&build_pdf(&[PageSpec::Text("On disk"), PageSpec::Image]))
        .unwrap();
    file.flush().unwrap();

    let classification = pagesift::classify_file(file.path()).unwrap();
    assert_eq!(classification.kind, DocumentKind::Combined);
    assert_eq!(classification.pages.len(), 2);
}

#[test]
fn test_backend_reports_version_and_count() {
    let pdf = backend(&[PageSpec::Text("One"), PageSpec::Text("Two")]);
    assert_eq!(pdf.page_count(), 2);
    assert_eq!(pdf.version(), "1.5");
    assert!(pdf.page_text(3).is_err());
}

#[test]
fn test_text_inside_form_counts_as_text_layer() {
    let pdf = backend(&[PageSpec::FormText("Text inside a form")]);

    assert!(pdf.page_text(1).unwrap().contains("Text inside a form"));
    let classification = classify(&pdf, &ExtractOptions::default()).unwrap();
    assert_eq!(classification.kind, DocumentKind::Pure);
    assert_eq!(classification.pages[0].kind(), PageKind::Text);
}

#[test]
fn test_composite_font_read_through_renderer() {
    let pdf = LopdfBackend::from_bytes(build_pdf(&[
        PageSpec::Text("Latin page"),
        PageSpec::CompositeFontText,
    ]))
    .unwrap()
    .with_renderer(Box::new(TextLayerRenderer("\u{4f60}\u{597d}")));

    assert_eq!(pdf.page_text(2).unwrap(), "\u{4f60}\u{597d}");
    let classification = classify(&pdf, &ExtractOptions::default()).unwrap();
    assert_eq!(classification.kind, DocumentKind::Pure);
}

#[test]
fn test_undecodable_composite_font_is_not_an_error() {
    let pdf = LopdfBackend::from_bytes(build_pdf(&[
        PageSpec::Text("Latin page"),
        PageSpec::CompositeFontText,
    ]))
    .unwrap()
    .with_renderer(Box::new(MockRenderer));

    // The Latin page keeps its text even though the document has a broken font.
    assert!(pdf.page_text(1).unwrap().contains("Latin page"));
    let classification = classify(&pdf, &ExtractOptions::default()).unwrap();
    assert_eq!(classification.kind, DocumentKind::Combined);
    assert_eq!(classification.pages[1].kind(), PageKind::Scanned);
}

#[test]
fn test_inline_image_is_counted() {
    let pdf = backend(&[PageSpec::TextAroundInlineImage("Caption", "After the image")]);

    let text = pdf.page_text(1).unwrap();
    assert!(text.contains("Caption"));
    assert!(text.contains("After the image"));
    assert_eq!(pdf.page_image_count(1).unwrap(), 1);

    let classification = classify(&pdf, &ExtractOptions::default()).unwrap();
    assert_eq!(classification.pages[0].kind(), PageKind::TextWithImages);
}

#[test]
fn test_flate_image_is_decoded() {
    let pdf = backend(&[PageSpec::TextAndFlateImage("Compressed figure")]);

    let images = pdf.page_images(1).unwrap();
    assert_eq!(images.len(), 1);
    assert_eq!(images[0].mime_type, "image/png");
}

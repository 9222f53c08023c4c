//! Shared fixtures: in-memory PDFs built with lopdf, plus mock collaborators.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::Write;
use std::rc::Rc;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream, StringFormat};

use pagesift::{EncodedImage, PageRenderer, Result, VisionModel};

/// What to put on a fixture page.
#[derive(Debug, Clone)]
pub enum PageSpec {
    /// Text only
    Text(&'static str),
    /// Image only, like a scanned page
    Image,
    /// Text plus one embedded image
    TextAndImage(&'static str),
    /// Text plus the same image drawn twice, once through a Form XObject
    TextAndNestedImage(&'static str),
    /// Text plus one Flate-compressed image
    TextAndFlateImage(&'static str),
    /// Text, an inline image, then more text
    TextAroundInlineImage(&'static str, &'static str),
    /// Text drawn only inside a Form XObject
    FormText(&'static str),
    /// Text in a composite (Identity-H) font with no ToUnicode map
    CompositeFontText,
}

fn text_ops(text: &str) -> Vec<Operation> {
    vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F1".into(), 12.into()]),
        Operation::new("Td", vec![72.into(), 720.into()]),
        Operation::new("Tj", vec![Object::string_literal(text)]),
        Operation::new("ET", vec![]),
    ]
}

fn image_ops(name: &str) -> Vec<Operation> {
    vec![
        Operation::new("q", vec![]),
        Operation::new(
            "cm",
            vec![200.into(), 0.into(), 0.into(), 200.into(), 72.into(), 400.into()],
        ),
        Operation::new("Do", vec![name.into()]),
        Operation::new("Q", vec![]),
    ]
}

fn gray_image(doc: &mut Document) -> ObjectId {
    doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => 2,
            "Height" => 2,
            "ColorSpace" => "DeviceGray",
            "BitsPerComponent" => 8,
        },
        vec![0, 255, 255, 0],
    ))
}

fn flate_gray_image(doc: &mut Document) -> ObjectId {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&[0, 255, 255, 0]).expect("samples compress");
    doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => 2,
            "Height" => 2,
            "ColorSpace" => "DeviceGray",
            "BitsPerComponent" => 8,
            "Filter" => "FlateDecode",
        },
        encoder.finish().expect("samples compress"),
    ))
}

fn composite_font(doc: &mut Document) -> ObjectId {
    let descriptor_id = doc.add_object(dictionary! {
        "Type" => "FontDescriptor",
        "FontName" => "NotoSansCJK-Regular",
        "Flags" => 4,
        "FontBBox" => vec![0.into(), (-120).into(), 1000.into(), 880.into()],
        "ItalicAngle" => 0,
        "Ascent" => 880,
        "Descent" => -120,
        "CapHeight" => 700,
        "StemV" => 80,
    });
    let cid_font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "CIDFontType2",
        "BaseFont" => "NotoSansCJK-Regular",
        "CIDSystemInfo" => dictionary! {
            "Registry" => Object::string_literal("Adobe"),
            "Ordering" => Object::string_literal("Identity"),
            "Supplement" => 0,
        },
        "FontDescriptor" => descriptor_id,
    });
    doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type0",
        "BaseFont" => "NotoSansCJK-Regular",
        "Encoding" => "Identity-H",
        "DescendantFonts" => vec![Object::from(cid_font_id)],
    })
}

fn encode(ops: Vec<Operation>) -> Vec<u8> {
    Content { operations: ops }
        .encode()
        .expect("content encodes")
}

/// Build a PDF with one page per spec.
pub fn build_pdf(pages: &[PageSpec]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
        "Encoding" => "WinAnsiEncoding",
    });

    let mut kids = Vec::new();
    for spec in pages {
        let (content, resources) = match spec {
            PageSpec::Text(text) => (
                encode(text_ops(text)),
                dictionary! { "Font" => dictionary! { "F1" => font_id } },
            ),
            PageSpec::Image => {
                let image_id = gray_image(&mut doc);
                (
                    encode(image_ops("Im1")),
                    dictionary! { "XObject" => dictionary! { "Im1" => image_id } },
                )
            }
            PageSpec::TextAndImage(text) => {
                let image_id = gray_image(&mut doc);
                let mut ops = text_ops(text);
                ops.extend(image_ops("Im1"));
                (
                    encode(ops),
                    dictionary! {
                        "Font" => dictionary! { "F1" => font_id },
                        "XObject" => dictionary! { "Im1" => image_id },
                    },
                )
            }
            PageSpec::TextAndNestedImage(text) => {
                let image_id = gray_image(&mut doc);
                let form_id = doc.add_object(Stream::new(
                    dictionary! {
                        "Type" => "XObject",
                        "Subtype" => "Form",
                        "BBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                        "Resources" => dictionary! {
                            "XObject" => dictionary! { "Im1" => image_id },
                        },
                    },
                    encode(image_ops("Im1")),
                ));
                let mut ops = text_ops(text);
                ops.extend(image_ops("Im1"));
                ops.extend(image_ops("Fm1"));
                (
                    encode(ops),
                    dictionary! {
                        "Font" => dictionary! { "F1" => font_id },
                        "XObject" => dictionary! { "Im1" => image_id, "Fm1" => form_id },
                    },
                )
            }
            PageSpec::TextAndFlateImage(text) => {
                let image_id = flate_gray_image(&mut doc);
                let mut ops = text_ops(text);
                ops.extend(image_ops("Im1"));
                (
                    encode(ops),
                    dictionary! {
                        "Font" => dictionary! { "F1" => font_id },
                        "XObject" => dictionary! { "Im1" => image_id },
                    },
                )
            }
            PageSpec::TextAroundInlineImage(before, after) => {
                let mut content = encode(text_ops(before));
                content.extend_from_slice(
                    b"\nq 100 0 0 100 72 400 cm\nBI /W 2 /H 2 /CS /G /BPC 8 ID \x00\xff\xff\x00 EI\nQ\n",
                );
                content.extend_from_slice(&encode(text_ops(after)));
                (
                    content,
                    dictionary! { "Font" => dictionary! { "F1" => font_id } },
                )
            }
            PageSpec::FormText(text) => {
                let form_id = doc.add_object(Stream::new(
                    dictionary! {
                        "Type" => "XObject",
                        "Subtype" => "Form",
                        "BBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                        "Resources" => dictionary! {
                            "Font" => dictionary! { "F1" => font_id },
                        },
                    },
                    encode(text_ops(text)),
                ));
                (
                    encode(image_ops("Fm1")),
                    dictionary! { "XObject" => dictionary! { "Fm1" => form_id } },
                )
            }
            PageSpec::CompositeFontText => {
                let cjk_id = composite_font(&mut doc);
                let ops = vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F2".into(), 12.into()]),
                    Operation::new("Td", vec![72.into(), 720.into()]),
                    Operation::new(
                        "Tj",
                        vec![Object::String(
                            vec![0x00, 0x24, 0x00, 0x25],
                            StringFormat::Hexadecimal,
                        )],
                    ),
                    Operation::new("ET", vec![]),
                ];
                (
                    encode(ops),
                    dictionary! { "Font" => dictionary! { "F2" => cjk_id } },
                )
            }
        };

        let content_id = doc.add_object(Stream::new(dictionary! {}, content));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources,
        });
        kids.push(Object::from(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("document saves");
    bytes
}

/// Vision model answering from a script, then `no_data` once the script runs out.
///
/// Every request's MIME type is recorded in the shared log.
pub struct MockVision {
    answers: RefCell<VecDeque<String>>,
    log: Rc<RefCell<Vec<String>>>,
}

impl MockVision {
    pub fn new(answers: &[&str]) -> (Self, Rc<RefCell<Vec<String>>>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let vision = Self {
            answers: RefCell::new(answers.iter().map(|a| a.to_string()).collect()),
            log: Rc::clone(&log),
        };
        (vision, log)
    }
}

impl VisionModel for MockVision {
    fn describe(&self, image: &EncodedImage) -> Result<String> {
        self.log.borrow_mut().push(image.mime_type.clone());
        Ok(self
            .answers
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| "no_data".to_string()))
    }
}

/// Renderer producing a tiny placeholder image per page.
pub struct MockRenderer;

impl PageRenderer for MockRenderer {
    fn render(&self, page: u32) -> Result<EncodedImage> {
        Ok(EncodedImage::png(format!("rendered page {}", page).as_bytes()))
    }
}

/// Renderer whose text layer is fixed; rasterizing is not expected.
pub struct TextLayerRenderer(pub &'static str);

impl PageRenderer for TextLayerRenderer {
    fn render(&self, page: u32) -> Result<EncodedImage> {
        Ok(EncodedImage::png(format!("rendered page {}", page).as_bytes()))
    }

    fn text_layer(&self, _page: u32) -> Result<String> {
        Ok(self.0.to_string())
    }
}

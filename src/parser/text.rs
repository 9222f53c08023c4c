//! Operator-level text collection.
//!
//! Fed by the backend's content walk, so text drawn inside Form XObjects is
//! seen too. Each string is decoded with the font in effect; a font without
//! a usable encoding only affects its own strings.

use lopdf::content::Operation;
use lopdf::{Dictionary, Document as LopdfDocument, Object};

use super::images::resolve_dict;

/// TJ adjustments below this (in thousandths of an em) read as word spaces.
const TJ_SPACE_THRESHOLD: f32 = -200.0;

/// Simple text decoding fallback when no encoding is available.
pub fn decode_text_simple(bytes: &[u8]) -> String {
    // Try UTF-16BE first (BOM marker)
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&utf16);
    }

    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

/// Accumulates shown text while a content walk visits operations.
pub(crate) struct TextCollector<'a> {
    doc: &'a LopdfDocument,
    font: Option<&'a Dictionary>,
    text: String,
    undecoded: bool,
}

impl<'a> TextCollector<'a> {
    pub(crate) fn new(doc: &'a LopdfDocument) -> Self {
        Self {
            doc,
            font: None,
            text: String::new(),
            undecoded: false,
        }
    }

    /// Feed one operation, with the resources in effect where it appears.
    pub(crate) fn visit(&mut self, op: &Operation, resources: Option<&'a Dictionary>) {
        match op.operator.as_str() {
            "Tf" => {
                self.font = op
                    .operands
                    .first()
                    .and_then(|o| o.as_name().ok())
                    .and_then(|name| self.font_dict(resources, name));
            }
            "Tj" => self.show_operand(op.operands.first()),
            "'" => {
                self.line_break();
                self.show_operand(op.operands.first());
            }
            "\"" => {
                self.line_break();
                self.show_operand(op.operands.get(2));
            }
            "TJ" => {
                let Some(Object::Array(items)) = op.operands.first() else {
                    return;
                };
                for item in items {
                    match item {
                        Object::String(bytes, _) => self.show(bytes),
                        other => {
                            if other.as_float().is_ok_and(|n| n < TJ_SPACE_THRESHOLD) {
                                self.text.push(' ');
                            }
                        }
                    }
                }
            }
            // Horizontal-only moves stay on the line.
            "Td" | "TD" => {
                if op.operands.get(1).and_then(|ty| ty.as_float().ok()) != Some(0.0) {
                    self.line_break();
                }
            }
            "T*" | "ET" => self.line_break(),
            _ => {}
        }
    }

    /// Collected text, and whether some strings could not be decoded.
    pub(crate) fn finish(self) -> (String, bool) {
        (self.text, self.undecoded)
    }

    fn font_dict(&self, resources: Option<&'a Dictionary>, name: &[u8]) -> Option<&'a Dictionary> {
        let fonts = resources?
            .get(b"Font")
            .ok()
            .and_then(|f| resolve_dict(self.doc, f))?;
        fonts.get(name).ok().and_then(|f| resolve_dict(self.doc, f))
    }

    fn show_operand(&mut self, operand: Option<&Object>) {
        if let Some(Object::String(bytes, _)) = operand {
            self.show(bytes);
        }
    }

    fn show(&mut self, bytes: &[u8]) {
        let Some(font) = self.font else {
            self.text.push_str(&decode_text_simple(bytes));
            return;
        };

        let decoded = if font.type_is(b"Font") {
            font.get_font_encoding(self.doc)
                .and_then(|encoding| LopdfDocument::decode_text(&encoding, bytes))
                .ok()
        } else {
            None
        };

        match decoded {
            Some(text) => self.text.push_str(&text),
            // Composite font codes are glyph ids; guessing would produce noise.
            None if is_composite(font) => self.undecoded = true,
            None => self.text.push_str(&decode_text_simple(bytes)),
        }
    }

    fn line_break(&mut self) {
        if !self.text.is_empty() && !self.text.ends_with('\n') {
            self.text.push('\n');
        }
    }
}

fn is_composite(font: &Dictionary) -> bool {
    matches!(
        font.get(b"Subtype").and_then(|s| s.as_name()),
        Ok(b"Type0")
    )
}

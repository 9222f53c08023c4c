//! Content stream decoding with inline image support.
//!
//! lopdf's content parser stops at the binary payload of an inline image and
//! drops everything after it. Inline images are lifted out first: the
//! `BI <dict> ID <data> EI` run is replaced by `<<dict>> BI` and, once
//! decoded, the operation's operand becomes a stream holding the samples.

use lopdf::content::{Content, Operation};
use lopdf::{Object, Stream};

use crate::error::{Error, Result};

/// Decode a content stream into operations.
///
/// Inline images come out as a `BI` operation whose single operand is an
/// [`Object::Stream`] with the (still abbreviated) image dictionary.
pub(crate) fn decode_operations(data: &[u8]) -> Result<Vec<Operation>> {
    let (cleaned, samples) = lift_inline_images(data);
    let mut operations = Content::decode(&cleaned)
        .map_err(|e| Error::PdfParse(format!("cannot decode content: {}", e)))?
        .operations;

    let mut samples = samples.into_iter();
    for op in operations.iter_mut().filter(|op| op.operator == "BI") {
        let Some(content) = samples.next() else {
            break;
        };
        let dict = match op.operands.pop() {
            Some(Object::Dictionary(dict)) => dict,
            _ => lopdf::Dictionary::new(),
        };
        op.operands = vec![Object::Stream(Stream::new(dict, content))];
    }
    Ok(operations)
}

/// Split inline image payloads out of a content stream.
fn lift_inline_images(data: &[u8]) -> (Vec<u8>, Vec<Vec<u8>>) {
    let mut cleaned = Vec::with_capacity(data.len());
    let mut samples = Vec::new();
    let mut pos = 0;

    while pos < data.len() {
        match data[pos] {
            b'%' => {
                let end = data[pos..]
                    .iter()
                    .position(|&b| b == b'\r' || b == b'\n')
                    .map_or(data.len(), |n| pos + n);
                cleaned.extend_from_slice(&data[pos..end]);
                pos = end;
            }
            b'(' => {
                let end = literal_string_end(data, pos);
                cleaned.extend_from_slice(&data[pos..end]);
                pos = end;
            }
            b'B' if is_token(data, pos, b"BI") => match inline_image_at(data, pos) {
                Some((dict, content, end)) => {
                    cleaned.extend_from_slice(b"<<");
                    cleaned.extend_from_slice(dict);
                    cleaned.extend_from_slice(b">> BI ");
                    samples.push(content.to_vec());
                    pos = end;
                }
                None => {
                    // Unterminated; leave the tail for lopdf to give up on.
                    cleaned.extend_from_slice(&data[pos..]);
                    pos = data.len();
                }
            },
            b => {
                cleaned.push(b);
                pos += 1;
            }
        }
    }

    (cleaned, samples)
}

/// Parse `BI <dict> ID <data> EI` starting at `start`.
///
/// Returns the dictionary bytes, the sample bytes and the offset past `EI`.
fn inline_image_at(data: &[u8], start: usize) -> Option<(&[u8], &[u8], usize)> {
    let dict_start = start + 2;
    let id = (dict_start..data.len()).find(|&i| is_token(data, i, b"ID"))?;

    // Exactly one whitespace byte separates ID from the samples.
    let data_start = (id + 3).min(data.len());
    let ei = (data_start..data.len()).find(|&i| {
        is_token(data, i, b"EI") && i > data_start && is_whitespace(data[i - 1])
    })?;

    Some((&data[dict_start..id], &data[data_start..ei - 1], ei + 2))
}

fn literal_string_end(data: &[u8], start: usize) -> usize {
    let mut depth = 0usize;
    let mut pos = start;
    while pos < data.len() {
        match data[pos] {
            b'\\' => pos += 1,
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return pos + 1;
                }
            }
            _ => {}
        }
        pos += 1;
    }
    data.len()
}

/// Whether `token` sits at `pos` as a whole operator.
fn is_token(data: &[u8], pos: usize, token: &[u8]) -> bool {
    data[pos..].starts_with(token)
        && (pos == 0 || is_boundary(data[pos - 1]))
        && data.get(pos + token.len()).map_or(true, |&b| is_boundary(b))
}

fn is_boundary(b: u8) -> bool {
    is_whitespace(b) || b"()<>[]{}/%".contains(&b)
}

fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n' | b'\x0c' | b'\0')
}

#[cfg(test)]
mod tests {
    use super::*;

    const CAPTIONED: &[u8] =
        b"BT /F1 12 Tf (Caption) Tj ET q BI /W 2 /H 2 /CS /G /BPC 8 ID \x00\xff\xff\x00 EI Q BT (After) Tj ET";

    #[test]
    fn test_inline_image_becomes_stream_operand() {
        let ops = decode_operations(CAPTIONED).unwrap();
        let inline = ops.iter().find(|op| op.operator == "BI").unwrap();

        let Object::Stream(stream) = &inline.operands[0] else {
            panic!("expected a stream operand");
        };
        assert_eq!(stream.content, vec![0, 255, 255, 0]);
        assert_eq!(stream.dict.get(b"W").unwrap().as_i64().unwrap(), 2);
        assert_eq!(stream.dict.get(b"CS").unwrap().as_name().unwrap(), b"G");
    }

    #[test]
    fn test_content_after_inline_image_survives() {
        let ops = decode_operations(CAPTIONED).unwrap();
        let operators: Vec<&str> = ops.iter().map(|op| op.operator.as_str()).collect();
        assert_eq!(
            operators,
            ["BT", "Tf", "Tj", "ET", "q", "BI", "Q", "BT", "Tj", "ET"]
        );
    }

    #[test]
    fn test_bi_inside_string_is_text() {
        let ops = decode_operations(b"BT (BI ID EI) Tj ET").unwrap();
        assert!(ops.iter().all(|op| op.operator != "BI"));
        assert_eq!(ops.len(), 3);
    }

    #[test]
    fn test_samples_may_contain_ei_bytes() {
        let (_, samples) = lift_inline_images(b"BI /W 3 /H 1 /CS /G /BPC 8 ID EIx EI");
        assert_eq!(samples, vec![b"EIx".to_vec()]);
    }
}

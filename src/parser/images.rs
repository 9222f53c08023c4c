//! Conversion of image XObjects into transport images.
//!
//! JPEG streams are passed through untouched. Raw sample streams (unfiltered,
//! Flate, LZW, with or without predictors) are rebuilt into PNG from their width, height, color space and
//! bit depth. JPEG 2000, JBIG2 and CCITT fax streams are reported as
//! unsupported.

use std::io::{Cursor, Read};

use image::{DynamicImage, GrayImage, ImageFormat, RgbImage};
use lopdf::{Dictionary, Document as LopdfDocument, Object, Stream};

use crate::error::{Error, Result};
use crate::model::EncodedImage;

/// Upper bound on decoded samples per image (width * height * components).
const MAX_SAMPLES: usize = 256 * 1024 * 1024;

/// Color model of decoded samples.
#[derive(Debug, Clone, PartialEq)]
enum ColorModel {
    Gray,
    Rgb,
    Cmyk,
    Indexed { base: Box<ColorModel>, lookup: Vec<u8> },
}

impl ColorModel {
    fn components(&self) -> usize {
        match self {
            ColorModel::Gray | ColorModel::Indexed { .. } => 1,
            ColorModel::Rgb => 3,
            ColorModel::Cmyk => 4,
        }
    }
}

/// Resolve an indirect reference, returning the object itself otherwise.
pub(crate) fn resolve<'a>(doc: &'a LopdfDocument, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

/// Resolve an object to a dictionary, following one reference.
pub(crate) fn resolve_dict<'a>(doc: &'a LopdfDocument, obj: &'a Object) -> Option<&'a Dictionary> {
    match resolve(doc, obj) {
        Object::Dictionary(d) => Some(d),
        Object::Stream(s) => Some(&s.dict),
        _ => None,
    }
}

/// Whether an XObject stream is an image.
pub(crate) fn is_image_xobject(stream: &Stream) -> bool {
    matches!(
        stream.dict.get(b"Subtype").and_then(|s| s.as_name()),
        Ok(b"Image")
    )
}

/// Convert an image XObject into a PNG or JPEG transport image.
pub fn encode_image_xobject(doc: &LopdfDocument, stream: &Stream) -> Result<EncodedImage> {
    let dict = &stream.dict;
    let filters = filter_names(doc, dict);

    match filters.last().map(String::as_str) {
        Some("DCTDecode") | Some("DCT") => {
            let bytes = undo_leading_filters(&filters[..filters.len() - 1], &stream.content)?;
            EncodedImage::sniffed(&bytes).ok_or_else(|| {
                Error::ImageExtract("DCT stream does not start with a JPEG marker".to_string())
            })
        }
        Some(unsupported @ ("JPXDecode" | "JBIG2Decode" | "CCITTFaxDecode" | "CCF")) => Err(
            Error::ImageExtract(format!("unsupported image encoding {}", unsupported)),
        ),
        _ => {
            let data = if filters.is_empty() {
                stream.content.clone()
            } else {
                decode_samples(stream)?
            };
            let image = raw_samples_to_image(doc, dict, &data)?;
            Ok(EncodedImage::png(&encode_png(&image)?))
        }
    }
}

/// Convert an inline image (`BI ... ID ... EI`) into a transport image.
///
/// Inline images use abbreviated keys and names; they are expanded to their
/// XObject spelling before conversion.
pub fn encode_inline_image(doc: &LopdfDocument, stream: &Stream) -> Result<EncodedImage> {
    let expanded = Stream::new(expand_inline_dict(&stream.dict), stream.content.clone());
    encode_image_xobject(doc, &expanded)
}

/// Undo the stream filters (and predictors) of raw sample data.
fn decode_samples(stream: &Stream) -> Result<Vec<u8>> {
    // lopdf refuses to decompress streams whose Subtype is Image.
    let mut samples = stream.clone();
    samples.dict.remove(b"Subtype");
    samples
        .decompressed_content()
        .map_err(|e| Error::ImageExtract(format!("cannot decode stream: {}", e)))
}

fn expand_inline_dict(dict: &Dictionary) -> Dictionary {
    let mut expanded = Dictionary::new();
    for (key, value) in dict.iter() {
        let key: &[u8] = match key.as_slice() {
            b"W" => b"Width",
            b"H" => b"Height",
            b"CS" => b"ColorSpace",
            b"BPC" => b"BitsPerComponent",
            b"F" => b"Filter",
            b"D" => b"Decode",
            b"DP" => b"DecodeParms",
            b"IM" => b"ImageMask",
            b"I" => b"Interpolate",
            other => other,
        };
        let value = match key {
            b"ColorSpace" | b"Filter" => expand_inline_names(value),
            _ => value.clone(),
        };
        expanded.set(key.to_vec(), value);
    }
    expanded
}

fn expand_inline_names(value: &Object) -> Object {
    match value {
        Object::Name(name) => {
            let full: &[u8] = match name.as_slice() {
                b"G" => b"DeviceGray",
                b"RGB" => b"DeviceRGB",
                b"CMYK" => b"DeviceCMYK",
                b"I" => b"Indexed",
                b"AHx" => b"ASCIIHexDecode",
                b"A85" => b"ASCII85Decode",
                b"LZW" => b"LZWDecode",
                b"Fl" => b"FlateDecode",
                b"RL" => b"RunLengthDecode",
                b"CCF" => b"CCITTFaxDecode",
                b"DCT" => b"DCTDecode",
                other => other,
            };
            Object::Name(full.to_vec())
        }
        Object::Array(items) => Object::Array(items.iter().map(expand_inline_names).collect()),
        other => other.clone(),
    }
}

/// Encode an image as PNG bytes.
pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    image
        .write_to(&mut buf, ImageFormat::Png)
        .map_err(|e| Error::ImageExtract(format!("PNG encoding failed: {}", e)))?;
    Ok(buf.into_inner())
}

fn filter_names(doc: &LopdfDocument, dict: &Dictionary) -> Vec<String> {
    let Ok(filter) = dict.get(b"Filter") else {
        return Vec::new();
    };
    match resolve(doc, filter) {
        Object::Name(n) => vec![String::from_utf8_lossy(n).into_owned()],
        Object::Array(arr) => arr
            .iter()
            .filter_map(|o| resolve(doc, o).as_name().ok())
            .map(|n| String::from_utf8_lossy(n).into_owned())
            .collect(),
        _ => Vec::new(),
    }
}

/// Undo the filters applied before a DCT stage. Only Flate is expected there.
fn undo_leading_filters(filters: &[String], content: &[u8]) -> Result<Vec<u8>> {
    let mut data = content.to_vec();
    for filter in filters {
        match filter.as_str() {
            "FlateDecode" | "Fl" => {
                let mut out = Vec::new();
                flate2::read::ZlibDecoder::new(data.as_slice())
                    .read_to_end(&mut out)
                    .map_err(|e| Error::ImageExtract(format!("inflate failed: {}", e)))?;
                data = out;
            }
            other => {
                return Err(Error::ImageExtract(format!(
                    "unsupported filter {} before DCTDecode",
                    other
                )))
            }
        }
    }
    Ok(data)
}

fn dict_u32(dict: &Dictionary, key: &[u8]) -> Option<u32> {
    dict.get(key)
        .ok()
        .and_then(|v| v.as_i64().ok())
        .and_then(|v| u32::try_from(v).ok())
}

fn raw_samples_to_image(doc: &LopdfDocument, dict: &Dictionary, data: &[u8]) -> Result<DynamicImage> {
    let width = dict_u32(dict, b"Width")
        .filter(|w| *w > 0)
        .ok_or_else(|| Error::ImageExtract("missing image width".to_string()))?;
    let height = dict_u32(dict, b"Height")
        .filter(|h| *h > 0)
        .ok_or_else(|| Error::ImageExtract("missing image height".to_string()))?;

    let image_mask = dict
        .get(b"ImageMask")
        .and_then(|m| m.as_bool())
        .unwrap_or(false);

    let (model, bpc) = if image_mask {
        (ColorModel::Gray, 1)
    } else {
        let cs = dict
            .get(b"ColorSpace")
            .map_err(|_| Error::ImageExtract("missing color space".to_string()))?;
        let bpc = dict_u32(dict, b"BitsPerComponent").unwrap_or(8);
        (parse_color_space(doc, cs)?, bpc)
    };

    let indexed = matches!(model, ColorModel::Indexed { .. });
    let mut samples = unpack_samples(
        data,
        width as usize,
        height as usize,
        model.components(),
        bpc,
        !indexed,
    )?;

    // A reversed Decode array, e.g. [1 0], flips every sample.
    if !indexed && decode_is_inverted(dict) {
        samples.iter_mut().for_each(|s| *s = 255 - *s);
    }

    samples_to_image(width, height, &model, samples)
}

fn decode_is_inverted(dict: &Dictionary) -> bool {
    let Ok(decode) = dict.get(b"Decode").and_then(|d| d.as_array()) else {
        return false;
    };
    let bound = |o: &Object| o.as_float().ok().or_else(|| o.as_i64().ok().map(|i| i as f32));
    match (decode.first().and_then(bound), decode.get(1).and_then(bound)) {
        (Some(lo), Some(hi)) => lo > hi,
        _ => false,
    }
}

fn parse_color_space(doc: &LopdfDocument, obj: &Object) -> Result<ColorModel> {
    match resolve(doc, obj) {
        Object::Name(name) => match name.as_slice() {
            b"DeviceGray" | b"CalGray" | b"G" => Ok(ColorModel::Gray),
            b"DeviceRGB" | b"CalRGB" | b"RGB" => Ok(ColorModel::Rgb),
            b"DeviceCMYK" | b"CMYK" => Ok(ColorModel::Cmyk),
            other => Err(Error::ImageExtract(format!(
                "unsupported color space {}",
                String::from_utf8_lossy(other)
            ))),
        },
        Object::Array(arr) => {
            let family = arr
                .first()
                .and_then(|o| resolve(doc, o).as_name().ok())
                .ok_or_else(|| Error::ImageExtract("malformed color space array".to_string()))?;
            match family {
                b"CalGray" => Ok(ColorModel::Gray),
                b"CalRGB" => Ok(ColorModel::Rgb),
                b"ICCBased" => {
                    let n = arr
                        .get(1)
                        .and_then(|o| resolve_dict(doc, o))
                        .and_then(|d| dict_u32(d, b"N"));
                    match n {
                        Some(1) => Ok(ColorModel::Gray),
                        Some(3) => Ok(ColorModel::Rgb),
                        Some(4) => Ok(ColorModel::Cmyk),
                        other => Err(Error::ImageExtract(format!(
                            "unsupported ICC component count {:?}",
                            other
                        ))),
                    }
                }
                b"Indexed" | b"I" => {
                    let base = arr
                        .get(1)
                        .ok_or_else(|| Error::ImageExtract("indexed space without base".to_string()))
                        .and_then(|b| parse_color_space(doc, b))?;
                    if matches!(base, ColorModel::Indexed { .. }) {
                        return Err(Error::ImageExtract("nested indexed color space".to_string()));
                    }
                    let lookup = match arr.get(3).map(|o| resolve(doc, o)) {
                        Some(Object::String(bytes, _)) => bytes.clone(),
                        Some(Object::Stream(s)) => s
                            .decompressed_content()
                            .unwrap_or_else(|_| s.content.clone()),
                        _ => {
                            return Err(Error::ImageExtract(
                                "indexed space without lookup table".to_string(),
                            ))
                        }
                    };
                    Ok(ColorModel::Indexed {
                        base: Box::new(base),
                        lookup,
                    })
                }
                other => Err(Error::ImageExtract(format!(
                    "unsupported color space {}",
                    String::from_utf8_lossy(other)
                ))),
            }
        }
        _ => Err(Error::ImageExtract("malformed color space".to_string())),
    }
}

/// Unpack packed samples into one byte per sample.
///
/// With `scale` set, values are stretched to 0..=255; otherwise they are kept
/// as-is (palette indices).
fn unpack_samples(
    data: &[u8],
    width: usize,
    height: usize,
    components: usize,
    bpc: u32,
    scale: bool,
) -> Result<Vec<u8>> {
    if !matches!(bpc, 1 | 2 | 4 | 8 | 16) {
        return Err(Error::ImageExtract(format!(
            "unsupported bits per component {}",
            bpc
        )));
    }

    let per_row = width
        .checked_mul(components)
        .filter(|n| n.checked_mul(height).is_some_and(|t| t <= MAX_SAMPLES))
        .ok_or_else(|| Error::ImageExtract(format!("image too large: {}x{}", width, height)))?;

    let row_bytes = (per_row * bpc as usize).div_ceil(8);
    let needed = row_bytes * height;
    if data.len() < needed {
        return Err(Error::ImageExtract(format!(
            "image data too short: {} < {} bytes",
            data.len(),
            needed
        )));
    }
    let rows = data[..needed].chunks_exact(row_bytes);

    match bpc {
        8 => Ok(data[..needed].to_vec()),
        16 => Ok(rows
            .flat_map(|row| row.chunks_exact(2).map(|pair| pair[0]))
            .collect()),
        _ => {
            let max = (1u16 << bpc) - 1;
            let bpc = bpc as usize;
            let mut out = Vec::with_capacity(per_row * height);
            for row in rows {
                for i in 0..per_row {
                    let bit = i * bpc;
                    let shift = 8 - bpc - (bit % 8);
                    let value = u16::from((row[bit / 8] >> shift) & max as u8);
                    out.push(if scale { (value * 255 / max) as u8 } else { value as u8 });
                }
            }
            Ok(out)
        }
    }
}

fn samples_to_image(
    width: u32,
    height: u32,
    model: &ColorModel,
    samples: Vec<u8>,
) -> Result<DynamicImage> {
    let mismatch = || Error::ImageExtract("sample count does not match dimensions".to_string());
    match model {
        ColorModel::Gray => GrayImage::from_raw(width, height, samples)
            .map(DynamicImage::ImageLuma8)
            .ok_or_else(mismatch),
        ColorModel::Rgb => RgbImage::from_raw(width, height, samples)
            .map(DynamicImage::ImageRgb8)
            .ok_or_else(mismatch),
        ColorModel::Cmyk => RgbImage::from_raw(width, height, cmyk_to_rgb(&samples))
            .map(DynamicImage::ImageRgb8)
            .ok_or_else(mismatch),
        ColorModel::Indexed { base, lookup } => {
            let n = base.components();
            let expanded = samples
                .iter()
                .flat_map(|&idx| {
                    let start = idx as usize * n;
                    (start..start + n).map(move |i| lookup.get(i).copied().unwrap_or(0))
                })
                .collect();
            samples_to_image(width, height, base, expanded)
        }
    }
}

fn cmyk_to_rgb(samples: &[u8]) -> Vec<u8> {
    samples
        .chunks_exact(4)
        .flat_map(|px| {
            let k = 255 - u16::from(px[3]);
            let channel = |c: u8| ((255 - u16::from(c)) * k / 255) as u8;
            [channel(px[0]), channel(px[1]), channel(px[2])]
        })
        .collect()
}

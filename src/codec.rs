//! Per-kind field codecs: value to natural MSB-first bit pattern and back.
//!
//! Every codec emits and consumes the field's pattern in MSB-first order;
//! bit-order reversal and byte-order redistribution are applied by the engine
//! on top of these patterns.

use crate::bits::{BitBuffer, sign_extend};
use crate::errors::{PackError, UnpackError};
use crate::field::{Field, FieldKind};
use crate::value::Value;

/// Text encoding used when decoding text fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    Ascii,
}

impl Default for TextEncoding {
    fn default() -> Self {
        TextEncoding::Utf8
    }
}

/// Policy for bytes that are invalid under the configured encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextErrors {
    /// Fail the unpack call.
    Strict,
    /// Substitute U+FFFD for invalid sequences.
    Replace,
    /// Drop invalid sequences.
    Ignore,
}

impl Default for TextErrors {
    fn default() -> Self {
        TextErrors::Strict
    }
}

/// Encoding and error policy applied to text fields on unpack. Packing
/// always emits UTF-8.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextConfig {
    pub encoding: TextEncoding,
    pub errors: TextErrors,
}

/// Encodes `value` into the field's natural MSB-first bit pattern of exactly
/// `field.width` bits. Padding fields are handled by [encode_padding].
pub fn encode(field: &Field, value: &Value) -> Result<BitBuffer, PackError> {
    let width = field.width;
    let mut pattern = BitBuffer::with_capacity(width);

    match field.kind {
        FieldKind::Unsigned => {
            let v = integer_value(value)?;
            let maximum = if width == 64 {
                u64::MAX as i128
            } else {
                (1i128 << width) - 1
            };
            if v < 0 || v > maximum {
                return Err(PackError::OutOfRange {
                    kind: field.kind.letter(),
                    width,
                    minimum: 0,
                    maximum,
                    value: v,
                });
            }
            pattern.push_bits(v as u64, width);
        }
        FieldKind::Signed => {
            let v = integer_value(value)?;
            let minimum = -(1i128 << (width - 1));
            let maximum = (1i128 << (width - 1)) - 1;
            if v < minimum || v > maximum {
                return Err(PackError::OutOfRange {
                    kind: field.kind.letter(),
                    width,
                    minimum,
                    maximum,
                    value: v,
                });
            }
            // Two's complement: the low `width` bits of the i64 are the pattern.
            pattern.push_bits(v as i64 as u64, width);
        }
        FieldKind::Bool => {
            let truthy = match value {
                Value::Bool(b) => *b,
                Value::U64(v) => *v != 0,
                Value::I64(v) => *v != 0,
                other => {
                    return Err(PackError::InvalidType {
                        expected: "boolean",
                        got: other.type_name(),
                    });
                }
            };
            pattern.push_bits(truthy as u64, width);
        }
        FieldKind::Float => {
            let v = match value {
                Value::F64(v) => *v,
                Value::I64(v) => *v as f64,
                Value::U64(v) => *v as f64,
                other => {
                    return Err(PackError::InvalidType {
                        expected: "float",
                        got: other.type_name(),
                    });
                }
            };
            match width {
                16 => pattern.push_bits(f32_to_f16_bits(v as f32) as u64, 16),
                32 => pattern.push_bits((v as f32).to_bits() as u64, 32),
                _ => pattern.push_bits(v.to_bits(), 64),
            }
        }
        FieldKind::Text => {
            let s = match value {
                Value::Text(s) => s,
                other => {
                    return Err(PackError::InvalidType {
                        expected: "text",
                        got: other.type_name(),
                    });
                }
            };
            push_bytes_exact(&mut pattern, s.as_bytes(), width);
        }
        FieldKind::Raw => {
            let bytes = match value {
                Value::Raw(bytes) => bytes,
                other => {
                    return Err(PackError::InvalidType {
                        expected: "raw bytes",
                        got: other.type_name(),
                    });
                }
            };
            push_bytes_exact(&mut pattern, bytes, width);
        }
        FieldKind::ZeroPadding | FieldKind::OnePadding => {
            unreachable!("padding fields are encoded by encode_padding")
        }
    }

    Ok(pattern)
}

/// The fill pattern of a padding field: all zeros or all ones.
pub fn encode_padding(field: &Field) -> BitBuffer {
    let mut pattern = BitBuffer::with_capacity(field.width);
    let bit = match field.kind {
        FieldKind::OnePadding => 1,
        _ => 0,
    };
    pattern.push_repeated(bit, field.width);
    pattern
}

/// Decodes a non-padding field from its natural MSB-first pattern of exactly
/// `field.width` bits.
pub fn decode(field: &Field, pattern: &BitBuffer, text: TextConfig) -> Result<Value, UnpackError> {
    debug_assert_eq!(pattern.len(), field.width);

    let value = match field.kind {
        FieldKind::Unsigned => Value::U64(pattern.read_u64(0, field.width)),
        FieldKind::Signed => Value::I64(sign_extend(pattern.read_u64(0, field.width), field.width)),
        FieldKind::Bool => Value::Bool(pattern.read_u64(0, field.width) != 0),
        FieldKind::Float => {
            let raw = pattern.read_u64(0, field.width);
            let v = match field.width {
                16 => f16_bits_to_f32(raw as u16) as f64,
                32 => f32::from_bits(raw as u32) as f64,
                _ => f64::from_bits(raw),
            };
            Value::F64(v)
        }
        FieldKind::Text => Value::Text(decode_text(pattern.to_bytes(), text)?),
        FieldKind::Raw => Value::Raw(pattern.to_bytes()),
        FieldKind::ZeroPadding | FieldKind::OnePadding => {
            unreachable!("padding fields are consumed, never decoded")
        }
    };

    Ok(value)
}

fn integer_value(value: &Value) -> Result<i128, PackError> {
    match value {
        Value::U64(v) => Ok(*v as i128),
        Value::I64(v) => Ok(*v as i128),
        Value::Bool(b) => Ok(*b as i128),
        other => Err(PackError::InvalidType {
            expected: "integer",
            got: other.type_name(),
        }),
    }
}

/// Appends the first `width` bits of `bytes`, zero-padding on the right when
/// the input is shorter.
fn push_bytes_exact(pattern: &mut BitBuffer, bytes: &[u8], width: usize) {
    for &b in bytes {
        let take = (width - pattern.len()).min(8);
        if take == 0 {
            return;
        }
        pattern.push_bits((b >> (8 - take)) as u64, take);
    }
    pattern.push_repeated(0, width - pattern.len());
}

fn decode_text(bytes: Vec<u8>, cfg: TextConfig) -> Result<String, UnpackError> {
    match cfg.encoding {
        TextEncoding::Utf8 => match cfg.errors {
            TextErrors::Strict => {
                String::from_utf8(bytes).map_err(|_| UnpackError::TextDecode { encoding: "utf-8" })
            }
            TextErrors::Replace => Ok(String::from_utf8_lossy(&bytes).into_owned()),
            TextErrors::Ignore => {
                let mut out = String::with_capacity(bytes.len());
                let mut rest = &bytes[..];
                loop {
                    match std::str::from_utf8(rest) {
                        Ok(s) => {
                            out.push_str(s);
                            break;
                        }
                        Err(e) => {
                            let valid = e.valid_up_to();
                            if let Ok(s) = std::str::from_utf8(&rest[..valid]) {
                                out.push_str(s);
                            }
                            let skip = e.error_len().unwrap_or(rest.len() - valid);
                            rest = &rest[valid + skip..];
                        }
                    }
                }
                Ok(out)
            }
        },
        TextEncoding::Ascii => match cfg.errors {
            TextErrors::Strict => {
                if bytes.iter().any(|b| *b > 0x7f) {
                    return Err(UnpackError::TextDecode { encoding: "ascii" });
                }
                String::from_utf8(bytes).map_err(|_| UnpackError::TextDecode { encoding: "ascii" })
            }
            TextErrors::Replace => Ok(bytes
                .iter()
                .map(|&b| if b <= 0x7f { b as char } else { '\u{fffd}' })
                .collect()),
            TextErrors::Ignore => Ok(bytes
                .iter()
                .filter(|b| **b <= 0x7f)
                .map(|&b| b as char)
                .collect()),
        },
    }
}

/// Converts an f32 to IEEE 754 binary16 bits, rounding to nearest with ties
/// to even.
pub(crate) fn f32_to_f16_bits(value: f32) -> u16 {
    let bits = value.to_bits();
    let sign = ((bits >> 16) & 0x8000) as u16;
    let exp = ((bits >> 23) & 0xff) as i32 - 127;
    let mantissa = bits & 0x7f_ffff;

    if exp == 128 {
        // Inf and NaN; keep a nonzero payload so NaN stays NaN.
        let payload = (mantissa >> 13) as u16;
        let keep_nan = (mantissa != 0 && payload == 0) as u16;
        return sign | 0x7c00 | payload | keep_nan;
    }
    if exp > 15 {
        return sign | 0x7c00;
    }
    if exp >= -14 {
        let mut out = (((exp + 15) as u32) << 10) | (mantissa >> 13);
        let rest = mantissa & 0x1fff;
        if rest > 0x1000 || (rest == 0x1000 && out & 1 == 1) {
            // Mantissa carry bumps the exponent, which is exactly right.
            out += 1;
        }
        return sign | out as u16;
    }
    if exp >= -25 {
        // Subnormal range: shift out the implicit bit.
        let full = mantissa | 0x80_0000;
        let shift = (13 - 14 - exp) as u32;
        let mut out = full >> shift;
        let rest = full & ((1u32 << shift) - 1);
        let half = 1u32 << (shift - 1);
        if rest > half || (rest == half && out & 1 == 1) {
            out += 1;
        }
        return sign | out as u16;
    }
    sign
}

/// Converts IEEE 754 binary16 bits to an f32. Exact for every input.
pub(crate) fn f16_bits_to_f32(bits: u16) -> f32 {
    let sign = ((bits & 0x8000) as u32) << 16;
    let exp = ((bits >> 10) & 0x1f) as u32;
    let frac = (bits & 0x3ff) as u32;

    if exp == 0 {
        if frac == 0 {
            return f32::from_bits(sign);
        }
        // Subnormal: renormalize into the f32 exponent range.
        let mut exp32 = 127 - 15 + 1;
        let mut frac = frac;
        while frac & 0x400 == 0 {
            frac <<= 1;
            exp32 -= 1;
        }
        return f32::from_bits(sign | ((exp32 as u32) << 23) | ((frac & 0x3ff) << 13));
    }
    if exp == 0x1f {
        return f32::from_bits(sign | 0x7f80_0000 | (frac << 13));
    }
    f32::from_bits(sign | ((exp + 112) << 23) | (frac << 13))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::BitOrder;

    fn field(kind: FieldKind, width: usize) -> Field {
        Field {
            kind,
            width,
            bit_order: BitOrder::MsbFirst,
            name: None,
            value_index: if kind.is_padding() { None } else { Some(0) },
        }
    }

    #[test]
    fn test_unsigned_range() {
        let f = field(FieldKind::Unsigned, 9);
        assert!(encode(&f, &Value::U64(511)).is_ok());
        let err = encode(&f, &Value::U64(512)).unwrap_err();
        assert_eq!(
            err,
            PackError::OutOfRange {
                kind: 'u',
                width: 9,
                minimum: 0,
                maximum: 511,
                value: 512,
            }
        );
        assert!(encode(&f, &Value::I64(-1)).is_err());
    }

    #[test]
    fn test_signed_range() {
        let f = field(FieldKind::Signed, 3);
        assert!(encode(&f, &Value::I64(-4)).is_ok());
        assert!(encode(&f, &Value::I64(3)).is_ok());
        assert!(encode(&f, &Value::I64(-5)).is_err());
        assert!(encode(&f, &Value::I64(4)).is_err());
    }

    #[test]
    fn test_signed_full_width() {
        let f = field(FieldKind::Signed, 64);
        let pattern = encode(&f, &Value::I64(-1)).unwrap();
        assert_eq!(pattern.to_bytes(), vec![0xff; 8]);
        assert_eq!(
            decode(&f, &pattern, TextConfig::default()).unwrap(),
            Value::I64(-1)
        );
    }

    #[test]
    fn test_bool_truthiness() {
        let f = field(FieldKind::Bool, 2);
        let pattern = encode(&f, &Value::U64(7)).unwrap();
        assert_eq!(pattern.read_u64(0, 2), 1);
        assert_eq!(
            decode(&f, &pattern, TextConfig::default()).unwrap(),
            Value::Bool(true)
        );
    }

    #[test]
    fn test_text_pad_and_truncate() {
        let f = field(FieldKind::Text, 24);
        for (input, expected) in [
            ("", vec![0, 0, 0]),
            ("12", vec![b'1', b'2', 0]),
            ("123", vec![b'1', b'2', b'3']),
            ("1234", vec![b'1', b'2', b'3']),
        ] {
            let pattern = encode(&f, &Value::Text(input.to_string())).unwrap();
            assert_eq!(pattern.len(), 24);
            assert_eq!(pattern.to_bytes(), expected);
        }
    }

    #[test]
    fn test_raw_sub_byte_truncation() {
        let f = field(FieldKind::Raw, 12);
        let pattern = encode(&f, &Value::Raw(vec![0xab, 0xcd])).unwrap();
        assert_eq!(pattern.len(), 12);
        assert_eq!(pattern.read_u64(0, 12), 0xabc);
    }

    #[test]
    fn test_wrong_value_type() {
        let f = field(FieldKind::Text, 8);
        assert_eq!(
            encode(&f, &Value::U64(1)).unwrap_err(),
            PackError::InvalidType {
                expected: "text",
                got: "unsigned integer",
            }
        );
    }

    #[test]
    fn test_text_decode_policies() {
        let strict = TextConfig::default();
        let err = decode_text(vec![0xff, b'a'], strict).unwrap_err();
        assert_eq!(err, UnpackError::TextDecode { encoding: "utf-8" });

        let replace = TextConfig {
            encoding: TextEncoding::Utf8,
            errors: TextErrors::Replace,
        };
        assert_eq!(decode_text(vec![0xff, b'a'], replace).unwrap(), "\u{fffd}a");

        let ignore = TextConfig {
            encoding: TextEncoding::Utf8,
            errors: TextErrors::Ignore,
        };
        assert_eq!(decode_text(vec![0xff, b'a'], ignore).unwrap(), "a");
    }

    #[test]
    fn test_ascii_decode() {
        let strict = TextConfig {
            encoding: TextEncoding::Ascii,
            errors: TextErrors::Strict,
        };
        assert_eq!(decode_text(b"Hello".to_vec(), strict).unwrap(), "Hello");
        assert_eq!(
            decode_text(vec![b'H', 0xc3], strict).unwrap_err(),
            UnpackError::TextDecode { encoding: "ascii" }
        );

        let ignore = TextConfig {
            encoding: TextEncoding::Ascii,
            errors: TextErrors::Ignore,
        };
        assert_eq!(decode_text(vec![b'H', 0xc3, b'i'], ignore).unwrap(), "Hi");
    }

    #[test]
    fn test_f16_known_values() {
        assert_eq!(f32_to_f16_bits(0.0), 0x0000);
        assert_eq!(f32_to_f16_bits(-0.0), 0x8000);
        assert_eq!(f32_to_f16_bits(1.0), 0x3c00);
        assert_eq!(f32_to_f16_bits(-2.0), 0xc000);
        assert_eq!(f32_to_f16_bits(65504.0), 0x7bff);
        assert_eq!(f32_to_f16_bits(f32::INFINITY), 0x7c00);
        assert_eq!(f32_to_f16_bits(100000.0), 0x7c00);

        assert_eq!(f16_bits_to_f32(0x3c00), 1.0);
        assert_eq!(f16_bits_to_f32(0xc000), -2.0);
        assert_eq!(f16_bits_to_f32(0x7bff), 65504.0);
        assert_eq!(f16_bits_to_f32(0x0001), 5.960_464_5e-8);
        assert!(f16_bits_to_f32(0x7e00).is_nan());
    }

    #[test]
    fn test_f16_roundtrip_exact_values() {
        for v in [0.5f32, 1.0, 1.5, -3.25, 1024.0, 0.000_061_035_156] {
            assert_eq!(f16_bits_to_f32(f32_to_f16_bits(v)), v);
        }
    }

    #[test]
    fn test_float_pattern_is_big_endian() {
        let f = field(FieldKind::Float, 32);
        let pattern = encode(&f, &Value::F64(-1.0)).unwrap();
        assert_eq!(pattern.to_bytes(), vec![0xbf, 0x80, 0x00, 0x00]);
    }
}

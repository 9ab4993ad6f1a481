//! Format-string compiler: parses the compact mini-language into a field
//! layout.
//!
//! A format is a sequence of `[bit-order-marker]kind width` groups, optionally
//! separated by whitespace, with an optional trailing `>` or `<` byte-order
//! marker as the very last character. A bit-order marker applies to its field
//! and every following field until overridden; the initial default is
//! MSB-first for both bit and byte order.

use crate::errors::CompileError;
use crate::field::{BitOrder, ByteOrder, Field, FieldKind};

/// An ordered field layout plus the record-level byte order. Immutable once
/// built.
#[derive(Debug, Clone)]
pub struct FormatSpec {
    pub fields: Vec<Field>,
    pub byte_order: ByteOrder,
}

impl FormatSpec {
    /// Parses a format string in positional mode: non-padding fields are
    /// numbered 0, 1, ... in declaration order.
    pub fn parse(fmt: &str) -> Result<Self, CompileError> {
        Self::parse_inner(fmt, None)
    }

    /// Parses a format string in named mode. `names` must contain exactly one
    /// name per non-padding field, in declaration order.
    pub fn parse_named(fmt: &str, names: &[&str]) -> Result<Self, CompileError> {
        Self::parse_inner(fmt, Some(names))
    }

    /// Sum of all field widths in bits.
    pub fn total_bits(&self) -> usize {
        self.fields.iter().map(|f| f.width).sum()
    }

    /// Number of non-padding fields.
    pub fn value_count(&self) -> usize {
        self.fields.iter().filter(|f| f.value_index.is_some()).count()
    }

    fn parse_inner(fmt: &str, names: Option<&[&str]>) -> Result<Self, CompileError> {
        let chars: Vec<char> = fmt.chars().collect();

        // The byte-order marker, if present, is the last character overall.
        let (body, byte_order) = match chars.last() {
            Some('>') => (&chars[..chars.len() - 1], ByteOrder::MsbFirst),
            Some('<') => (&chars[..chars.len() - 1], ByteOrder::LsbFirst),
            _ => (&chars[..], ByteOrder::MsbFirst),
        };

        let mut fields = Vec::new();
        let mut bit_order = BitOrder::MsbFirst;
        let mut value_index = 0usize;
        let mut pos = 0;

        while pos < body.len() {
            // Optional bit-order marker, sticky for all following fields.
            match body[pos] {
                '>' => {
                    bit_order = BitOrder::MsbFirst;
                    pos += 1;
                }
                '<' => {
                    bit_order = BitOrder::LsbFirst;
                    pos += 1;
                }
                _ => {}
            }

            let letter = match body.get(pos) {
                Some(ch) if ch.is_ascii_alphabetic() => *ch,
                _ => return Err(CompileError::BadFormat(fmt.to_string())),
            };
            pos += 1;

            let digits_start = pos;
            while pos < body.len() && body[pos].is_ascii_digit() {
                pos += 1;
            }
            if pos == digits_start {
                return Err(CompileError::BadFormat(fmt.to_string()));
            }
            let width: usize = body[digits_start..pos]
                .iter()
                .collect::<String>()
                .parse()
                .map_err(|_| CompileError::BadFormat(fmt.to_string()))?;

            if width == 0 {
                return Err(CompileError::BadFormat(fmt.to_string()));
            }

            let kind = match letter {
                'u' => FieldKind::Unsigned,
                's' => FieldKind::Signed,
                'f' => FieldKind::Float,
                'b' => FieldKind::Bool,
                't' => FieldKind::Text,
                'r' => FieldKind::Raw,
                'p' => FieldKind::ZeroPadding,
                'P' => FieldKind::OnePadding,
                other => return Err(CompileError::BadKind(other)),
            };

            match kind {
                FieldKind::Float if !matches!(width, 16 | 32 | 64) => {
                    return Err(CompileError::UnsupportedFloatWidth(width));
                }
                FieldKind::Unsigned | FieldKind::Signed | FieldKind::Bool if width > 64 => {
                    return Err(CompileError::WidthTooLarge {
                        kind: letter,
                        width,
                    });
                }
                _ => {}
            }

            let index = if kind.is_padding() {
                None
            } else {
                value_index += 1;
                Some(value_index - 1)
            };

            fields.push(Field {
                kind,
                width,
                bit_order,
                name: None,
                value_index: index,
            });

            // Groups may be separated by whitespace.
            while pos < body.len() && body[pos].is_whitespace() {
                pos += 1;
            }
        }

        if let Some(names) = names {
            if names.len() != value_index {
                return Err(CompileError::NameCountMismatch {
                    expected: value_index,
                    got: names.len(),
                });
            }
            for field in fields.iter_mut() {
                if let Some(index) = field.value_index {
                    field.name = Some(names[index].to_string());
                }
            }
        }

        Ok(FormatSpec { fields, byte_order })
    }
}

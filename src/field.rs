//! Field descriptors produced by the format compiler.

/// The eight field kinds of the format mini-language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// `u` -- unsigned integer.
    Unsigned,
    /// `s` -- signed integer, two's complement.
    Signed,
    /// `f` -- IEEE 754 float of 16, 32 or 64 bits.
    Float,
    /// `b` -- boolean.
    Bool,
    /// `t` -- text, padded or truncated to the field width.
    Text,
    /// `r` -- raw bytes, padded or truncated to the field width.
    Raw,
    /// `p` -- padding with zeros, never bound to a value.
    ZeroPadding,
    /// `P` -- padding with ones, never bound to a value.
    OnePadding,
}

impl FieldKind {
    /// Returns true for the two padding kinds.
    pub fn is_padding(&self) -> bool {
        matches!(self, FieldKind::ZeroPadding | FieldKind::OnePadding)
    }

    /// Raw and text fields carry caller-defined bytes and are exempt from
    /// the record-level byte-order redistribution.
    pub fn is_byte_order_exempt(&self) -> bool {
        matches!(self, FieldKind::Raw | FieldKind::Text)
    }

    /// The kind letter as written in a format string.
    pub fn letter(&self) -> char {
        match self {
            FieldKind::Unsigned => 'u',
            FieldKind::Signed => 's',
            FieldKind::Float => 'f',
            FieldKind::Bool => 'b',
            FieldKind::Text => 't',
            FieldKind::Raw => 'r',
            FieldKind::ZeroPadding => 'p',
            FieldKind::OnePadding => 'P',
        }
    }
}

/// Bit order used when emitting a single field's bit pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitOrder {
    MsbFirst,
    LsbFirst,
}

impl Default for BitOrder {
    fn default() -> Self {
        BitOrder::MsbFirst
    }
}

/// Record-level rule for how the bytes of a multi-byte field are arranged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    MsbFirst,
    LsbFirst,
}

impl Default for ByteOrder {
    fn default() -> Self {
        ByteOrder::MsbFirst
    }
}

/// A single field in a compiled format.
#[derive(Debug, Clone)]
pub struct Field {
    /// Field kind as declared in the format string.
    pub kind: FieldKind,
    /// Width in bits, always at least 1.
    pub width: usize,
    /// Bit order of this field's own pattern (inherited left to right).
    pub bit_order: BitOrder,
    /// Key in named mode; `None` for padding and positional fields.
    pub name: Option<String>,
    /// Position among the non-padding fields; `None` for padding.
    pub value_index: Option<usize>,
}

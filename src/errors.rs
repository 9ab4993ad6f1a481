//! Error types for format compilation, packing and unpacking.

use std::fmt;

/// Errors produced when compiling a format string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// The format string does not match the group grammar, or a group has
    /// zero width. Carries the full offending format string.
    BadFormat(String),
    /// Unknown kind letter in the format string.
    BadKind(char),
    /// Float fields support only 16, 32 and 64 bit widths.
    UnsupportedFloatWidth(usize),
    /// Integer-backed field (`u`, `s`, `b`) wider than 64 bits.
    WidthTooLarge { kind: char, width: usize },
    /// Named mode requires exactly one name per non-padding field.
    NameCountMismatch { expected: usize, got: usize },
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::BadFormat(fmt_str) => write!(f, "bad format '{fmt_str}'"),
            CompileError::BadKind(ch) => write!(f, "bad char '{ch}' in format"),
            CompileError::UnsupportedFloatWidth(width) => {
                write!(f, "expected float width of 16, 32, or 64 bits (got {width})")
            }
            CompileError::WidthTooLarge { kind, width } => {
                write!(f, "\"{kind}{width}\" exceeds 64 bits")
            }
            CompileError::NameCountMismatch { expected, got } => {
                write!(f, "expected {expected} field name(s) (got {got})")
            }
        }
    }
}

impl std::error::Error for CompileError {}

/// Errors produced when packing values against a compiled format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackError {
    /// Integer value outside the field's representable range.
    OutOfRange {
        kind: char,
        width: usize,
        minimum: i128,
        maximum: i128,
        value: i128,
    },
    /// Value variant incompatible with the field kind.
    InvalidType {
        expected: &'static str,
        got: &'static str,
    },
    /// Positional pack received fewer values than non-padding fields.
    TooFewValues { expected: usize, got: usize },
    /// Named pack is missing a key for a non-padding field.
    MissingField(String),
    /// Destination buffer cannot hold `offset + total_bits` bits.
    BufferTooSmall {
        required_bits: usize,
        capacity_bits: usize,
    },
}

impl fmt::Display for PackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PackError::OutOfRange {
                kind,
                width,
                minimum,
                maximum,
                value,
            } => write!(
                f,
                "\"{kind}{width}\" requires {minimum} <= integer <= {maximum} (got {value})"
            ),
            PackError::InvalidType { expected, got } => {
                write!(f, "expected a {expected} value (got {got})")
            }
            PackError::TooFewValues { expected, got } => {
                write!(f, "pack expected {expected} item(s) for packing (got {got})")
            }
            PackError::MissingField(name) => write!(f, "'{name}' not found in data"),
            PackError::BufferTooSmall { required_bits, .. } => {
                write!(f, "pack_into requires a buffer of at least {required_bits} bits")
            }
        }
    }
}

impl std::error::Error for PackError {}

/// Errors produced when unpacking bytes against a compiled format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnpackError {
    /// Source holds fewer bits than the format requires and truncation was
    /// not allowed.
    SourceTooShort {
        required_bits: usize,
        available_bits: usize,
    },
    /// Text field bytes are invalid under the configured encoding.
    TextDecode { encoding: &'static str },
}

impl fmt::Display for UnpackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnpackError::SourceTooShort {
                required_bits,
                available_bits,
            } => write!(
                f,
                "unpack requires at least {required_bits} bits to unpack (got {available_bits})"
            ),
            UnpackError::TextDecode { encoding } => {
                write!(f, "text field is not valid {encoding}")
            }
        }
    }
}

impl std::error::Error for UnpackError {}

/// Union of all error kinds, returned by the one-shot helper functions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    Compile(CompileError),
    Pack(PackError),
    Unpack(UnpackError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Compile(e) => e.fmt(f),
            Error::Pack(e) => e.fmt(f),
            Error::Unpack(e) => e.fmt(f),
        }
    }
}

impl std::error::Error for Error {}

impl From<CompileError> for Error {
    fn from(e: CompileError) -> Self {
        Error::Compile(e)
    }
}

impl From<PackError> for Error {
    fn from(e: PackError) -> Self {
        Error::Pack(e)
    }
}

impl From<UnpackError> for Error {
    fn from(e: UnpackError) -> Self {
        Error::Unpack(e)
    }
}

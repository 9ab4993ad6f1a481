//! # bitfmt
//!
//! Bit-level packing and unpacking of binary data driven by compact format
//! strings.
//!
//! A format string is a sequence of fields such as `u3` (3-bit unsigned),
//! `s6` (6-bit signed), `f32` (float), `b1` (bool), `t24` (text), `r8` (raw
//! bits) and `p4`/`P4` (zero/one padding), with optional `>`/`<` markers
//! controlling bit order per field and a trailing marker controlling the
//! record byte order. Fields are packed back to back with no implicit
//! alignment.
//!
//! ## Example
//!
//! ```
//! use bitfmt::value::Value;
//!
//! let packed = bitfmt::pack(
//!     "u1u1s6u7u9",
//!     &[
//!         Value::U64(0),
//!         Value::U64(0),
//!         Value::I64(-2),
//!         Value::U64(65),
//!         Value::U64(22),
//!     ],
//! )
//! .unwrap();
//! assert_eq!(packed, vec![0x3e, 0x82, 0x16]);
//!
//! let values = bitfmt::unpack("u1u1s6u7u9", &packed).unwrap();
//! assert_eq!(values[2], Value::I64(-2));
//! ```
//!
//! Compile the format once with [CompiledFormat] (or [CompiledFormatDict] for
//! name-keyed access) when packing or unpacking repeatedly.

pub mod bits;
pub mod codec;
pub mod compiled;
pub mod errors;
pub mod field;
pub mod format;
#[cfg(feature = "serde")]
pub mod serde;
pub mod value;

use std::collections::BTreeMap;

pub use codec::{TextConfig, TextEncoding, TextErrors};
pub use compiled::{CompiledFormat, CompiledFormatDict};
pub use errors::{CompileError, Error, PackError, UnpackError};
pub use value::Value;

/// Compiles a format string for repeated positional use.
pub fn compile(fmt: &str) -> Result<CompiledFormat, Error> {
    Ok(CompiledFormat::compile(fmt)?)
}

/// Compiles a format string for repeated name-keyed use. `names` must list
/// one name per non-padding field, in declaration order.
pub fn compile_dict(fmt: &str, names: &[&str]) -> Result<CompiledFormatDict, Error> {
    Ok(CompiledFormatDict::compile(fmt, names)?)
}

/// Total size of a format in bits.
pub fn calcsize(fmt: &str) -> Result<usize, Error> {
    Ok(CompiledFormat::compile(fmt)?.size_bits())
}

/// Packs `values` against `fmt` into a fresh byte vector, zero-padding the
/// final byte.
pub fn pack(fmt: &str, values: &[Value]) -> Result<Vec<u8>, Error> {
    Ok(CompiledFormat::compile(fmt)?.pack(values)?)
}

/// Packs `values` into `buf` starting at bit `offset`, leaving bits outside
/// the packed region untouched. With `fill_padding` false, padding fields
/// also keep the buffer's existing bits.
pub fn pack_into(
    fmt: &str,
    buf: &mut [u8],
    offset: usize,
    values: &[Value],
    fill_padding: bool,
) -> Result<(), Error> {
    Ok(CompiledFormat::compile(fmt)?.pack_into(buf, offset, values, fill_padding)?)
}

/// Unpacks all non-padding fields of `fmt` from `data`.
pub fn unpack(fmt: &str, data: &[u8]) -> Result<Vec<Value>, Error> {
    Ok(CompiledFormat::compile(fmt)?.unpack(data)?)
}

/// Unpacks starting at bit `offset`. With `allow_truncated` true, fields
/// past the end of `data` are dropped instead of failing.
pub fn unpack_from(
    fmt: &str,
    data: &[u8],
    offset: usize,
    allow_truncated: bool,
) -> Result<Vec<Value>, Error> {
    Ok(CompiledFormat::compile(fmt)?.unpack_from(data, offset, allow_truncated)?)
}

/// Packs named `values` against `fmt`.
pub fn pack_dict(
    fmt: &str,
    names: &[&str],
    values: &BTreeMap<String, Value>,
) -> Result<Vec<u8>, Error> {
    Ok(CompiledFormatDict::compile(fmt, names)?.pack(values)?)
}

/// Unpacks `data` against `fmt` into a name-keyed map.
pub fn unpack_dict(
    fmt: &str,
    names: &[&str],
    data: &[u8],
) -> Result<BTreeMap<String, Value>, Error> {
    Ok(CompiledFormatDict::compile(fmt, names)?.unpack(data)?)
}

/// Reverses `data` in consecutive chunks of the given byte lengths, starting
/// at byte `offset`. Returns the swapped chunks; bytes before `offset` and
/// past the last chunk are not included.
///
/// Useful for converting between byte orders before unpacking, e.g.
/// `byteswap(&[2, 4], ...)` swaps a 16-bit word followed by a 32-bit word.
pub fn byteswap(chunks: &[usize], data: &[u8], offset: usize) -> Result<Vec<u8>, Error> {
    let data = data.get(offset..).unwrap_or(&[]);
    let total: usize = chunks.iter().sum();
    if total > data.len() {
        return Err(UnpackError::SourceTooShort {
            required_bits: total * 8,
            available_bits: data.len() * 8,
        }
        .into());
    }

    let mut swapped = Vec::with_capacity(total);
    let mut start = 0;
    for &length in chunks {
        swapped.extend(data[start..start + length].iter().rev());
        start += length;
    }
    Ok(swapped)
}

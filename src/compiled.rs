//! Compiled formats: the bit engine plus the positional and name-keyed
//! facades.
//!
//! A compiled format is immutable after construction and safe to share
//! across threads; every pack or unpack call works on its own transient
//! [BitBuffer].

use std::collections::BTreeMap;

use crate::bits::BitBuffer;
use crate::codec::{self, TextConfig};
use crate::errors::{CompileError, PackError, UnpackError};
use crate::field::{BitOrder, ByteOrder, Field};
use crate::format::FormatSpec;
use crate::value::Value;

/// Where padding bits come from when packing.
enum PadSource<'a> {
    /// Emit the padding field's own 0/1 fill pattern.
    Fill,
    /// Preserve the destination buffer's existing bits.
    Preserve(&'a BitBuffer),
}

/// Shared engine state behind both facades.
#[derive(Debug, Clone)]
struct Engine {
    spec: FormatSpec,
    total_bits: usize,
    value_count: usize,
    text: TextConfig,
}

impl Engine {
    fn new(spec: FormatSpec, text: TextConfig) -> Self {
        let total_bits = spec.total_bits();
        let value_count = spec.value_count();
        Self {
            spec,
            total_bits,
            value_count,
            text,
        }
    }

    /// Packs all fields onto `out`, which may already hold prefix bits (the
    /// byte-order lane arithmetic is relative to the absolute position).
    fn pack_fields(
        &self,
        out: &mut BitBuffer,
        values: &[&Value],
        padding: PadSource<'_>,
    ) -> Result<(), PackError> {
        for field in &self.spec.fields {
            match field.value_index {
                None => {
                    let start = out.len();
                    match &padding {
                        PadSource::Fill => {
                            let pattern = codec::encode_padding(field);
                            out.extend_range(&pattern, 0, pattern.len());
                        }
                        PadSource::Preserve(existing) => {
                            out.extend_range(existing, start, start + field.width);
                        }
                    }
                }
                Some(index) => {
                    let mut pattern = codec::encode(field, values[index])?;
                    if field.bit_order == BitOrder::LsbFirst {
                        pattern = pattern.reversed();
                    }
                    self.append_field(out, &pattern, field);
                }
            }
        }
        Ok(())
    }

    /// Appends one field's pattern, redistributing 8-bit lanes when the
    /// record byte order is LSB-first. Raw and text fields are exempt: their
    /// byte order is caller-defined, not a bit-order artifact.
    fn append_field(&self, out: &mut BitBuffer, pattern: &BitBuffer, field: &Field) {
        if self.spec.byte_order == ByteOrder::MsbFirst || field.kind.is_byte_order_exempt() {
            out.extend_range(pattern, 0, pattern.len());
            return;
        }

        // Peel 8-bit chunks off the high end and emit them ahead of the
        // remaining low-order bits, so later bytes of a multi-byte field land
        // first while intra-byte order is preserved.
        let mut end = pattern.len();
        let mut split = pattern.len() as isize - (8 - out.len() % 8) as isize;
        while split > 0 {
            out.extend_range(pattern, split as usize, end);
            end = split as usize;
            split -= 8;
        }
        out.extend_range(pattern, 0, end);
    }

    fn pack(&self, values: &[&Value]) -> Result<Vec<u8>, PackError> {
        let mut out = BitBuffer::with_capacity(self.total_bits);
        self.pack_fields(&mut out, values, PadSource::Fill)?;
        out.pad_to_byte();
        Ok(out.into_bytes())
    }

    fn pack_into(
        &self,
        buf: &mut [u8],
        offset: usize,
        values: &[&Value],
        fill_padding: bool,
    ) -> Result<(), PackError> {
        let capacity_bits = buf.len() * 8;
        if offset + self.total_bits > capacity_bits {
            return Err(PackError::BufferTooSmall {
                required_bits: offset + self.total_bits,
                capacity_bits,
            });
        }

        let existing = BitBuffer::from_bytes(buf);
        let mut out = BitBuffer::with_capacity(capacity_bits);
        out.extend_range(&existing, 0, offset);

        let padding = if fill_padding {
            PadSource::Fill
        } else {
            PadSource::Preserve(&existing)
        };
        self.pack_fields(&mut out, values, padding)?;

        let written = out.len();
        out.extend_range(&existing, written, capacity_bits);
        buf.copy_from_slice(&out.into_bytes());
        Ok(())
    }

    /// Walks the fields with a bit cursor relative to `offset`, yielding
    /// `(field index, value)` pairs for non-padding fields in order.
    fn unpack_fields(
        &self,
        data: &[u8],
        offset: usize,
        allow_truncated: bool,
    ) -> Result<Vec<(usize, Value)>, UnpackError> {
        let available = (data.len() * 8).saturating_sub(offset);
        if !allow_truncated && self.total_bits > available {
            return Err(UnpackError::SourceTooShort {
                required_bits: self.total_bits,
                available_bits: available,
            });
        }

        let mut values = Vec::with_capacity(self.value_count);
        let mut cursor = 0usize;

        for (index, field) in self.spec.fields.iter().enumerate() {
            if cursor + field.width > available {
                // Only reachable with truncation allowed; the length check
                // above covers the strict case.
                break;
            }

            if field.value_index.is_some() {
                let mut pattern = self.extract_field(data, offset, cursor, field);
                if field.bit_order == BitOrder::LsbFirst {
                    pattern = pattern.reversed();
                }
                values.push((index, codec::decode(field, &pattern, self.text)?));
            }

            cursor += field.width;
        }

        Ok(values)
    }

    /// Copies one field's bits out of `data` into its natural pattern order,
    /// undoing the 8-bit lane redistribution for LSB-first byte order. The
    /// lane arithmetic mirrors the pack side, relative to the field's ending
    /// offset within the sliced view.
    fn extract_field(&self, data: &[u8], offset: usize, cursor: usize, field: &Field) -> BitBuffer {
        let width = field.width;
        let mut pattern = BitBuffer::with_capacity(width);

        if self.spec.byte_order == ByteOrder::MsbFirst || field.kind.is_byte_order_exempt() {
            pattern.push_slice_bits(data, offset + cursor, width);
            return pattern;
        }

        let mut end = width;
        let mut split = width as isize - ((cursor + width) % 8) as isize;
        while split > 0 {
            let chunk_end = (split as usize + 8).min(end);
            pattern.push_slice_bits(
                data,
                offset + cursor + split as usize,
                chunk_end - split as usize,
            );
            end = split as usize;
            split -= 8;
        }
        pattern.push_slice_bits(data, offset + cursor, end);
        pattern
    }
}

/// A compiled format using the positional call convention: values are bound
/// to non-padding fields by position.
///
/// Compile once with [CompiledFormat::compile], then pack and unpack any
/// number of times.
#[derive(Debug, Clone)]
pub struct CompiledFormat {
    engine: Engine,
}

impl CompiledFormat {
    /// Compiles a format string with the default text configuration.
    pub fn compile(fmt: &str) -> Result<Self, CompileError> {
        Self::with_text_config(fmt, TextConfig::default())
    }

    /// Compiles a format string with an explicit text encoding and error
    /// policy for text fields.
    pub fn with_text_config(fmt: &str, text: TextConfig) -> Result<Self, CompileError> {
        Ok(Self {
            engine: Engine::new(FormatSpec::parse(fmt)?, text),
        })
    }

    /// Total number of bits in the format.
    pub fn size_bits(&self) -> usize {
        self.engine.total_bits
    }

    /// Number of non-padding fields, i.e. the number of values pack expects.
    pub fn value_count(&self) -> usize {
        self.engine.value_count
    }

    /// Packs `values` into a fresh byte vector, zero-padding the final byte.
    /// At least [CompiledFormat::value_count] values are required; extras are
    /// ignored.
    pub fn pack(&self, values: &[Value]) -> Result<Vec<u8>, PackError> {
        self.engine.pack(&self.ordered(values)?)
    }

    /// Packs `values` into `buf` starting at bit `offset`, leaving bits
    /// outside the packed region untouched. With `fill_padding` false,
    /// padding fields also keep the buffer's existing bits.
    pub fn pack_into(
        &self,
        buf: &mut [u8],
        offset: usize,
        values: &[Value],
        fill_padding: bool,
    ) -> Result<(), PackError> {
        self.engine
            .pack_into(buf, offset, &self.ordered(values)?, fill_padding)
    }

    /// Unpacks all non-padding fields from `data`.
    pub fn unpack(&self, data: &[u8]) -> Result<Vec<Value>, UnpackError> {
        self.unpack_from(data, 0, false)
    }

    /// Unpacks starting at bit `offset`. With `allow_truncated` true, stops
    /// at the first field that no longer fits and returns the values decoded
    /// so far.
    pub fn unpack_from(
        &self,
        data: &[u8],
        offset: usize,
        allow_truncated: bool,
    ) -> Result<Vec<Value>, UnpackError> {
        Ok(self
            .engine
            .unpack_fields(data, offset, allow_truncated)?
            .into_iter()
            .map(|(_, value)| value)
            .collect())
    }

    fn ordered<'a>(&self, values: &'a [Value]) -> Result<Vec<&'a Value>, PackError> {
        if values.len() < self.engine.value_count {
            return Err(PackError::TooFewValues {
                expected: self.engine.value_count,
                got: values.len(),
            });
        }
        Ok(values.iter().take(self.engine.value_count).collect())
    }
}

/// A compiled format using the name-keyed call convention: values are bound
/// to non-padding fields through a map.
#[derive(Debug, Clone)]
pub struct CompiledFormatDict {
    engine: Engine,
}

impl CompiledFormatDict {
    /// Compiles a format string with one name per non-padding field, in
    /// declaration order. Padding fields never consume a name.
    pub fn compile(fmt: &str, names: &[&str]) -> Result<Self, CompileError> {
        Self::with_text_config(fmt, names, TextConfig::default())
    }

    pub fn with_text_config(
        fmt: &str,
        names: &[&str],
        text: TextConfig,
    ) -> Result<Self, CompileError> {
        Ok(Self {
            engine: Engine::new(FormatSpec::parse_named(fmt, names)?, text),
        })
    }

    /// Total number of bits in the format.
    pub fn size_bits(&self) -> usize {
        self.engine.total_bits
    }

    /// Packs the named `values` into a fresh byte vector. Every non-padding
    /// field's name must be present.
    pub fn pack(&self, values: &BTreeMap<String, Value>) -> Result<Vec<u8>, PackError> {
        self.engine.pack(&self.ordered(values)?)
    }

    /// See [CompiledFormat::pack_into].
    pub fn pack_into(
        &self,
        buf: &mut [u8],
        offset: usize,
        values: &BTreeMap<String, Value>,
        fill_padding: bool,
    ) -> Result<(), PackError> {
        self.engine
            .pack_into(buf, offset, &self.ordered(values)?, fill_padding)
    }

    /// Unpacks all non-padding fields into a name-keyed map.
    pub fn unpack(&self, data: &[u8]) -> Result<BTreeMap<String, Value>, UnpackError> {
        self.unpack_from(data, 0, false)
    }

    /// See [CompiledFormat::unpack_from].
    pub fn unpack_from(
        &self,
        data: &[u8],
        offset: usize,
        allow_truncated: bool,
    ) -> Result<BTreeMap<String, Value>, UnpackError> {
        let mut map = BTreeMap::new();
        for (index, value) in self.engine.unpack_fields(data, offset, allow_truncated)? {
            if let Some(name) = &self.engine.spec.fields[index].name {
                map.insert(name.clone(), value);
            }
        }
        Ok(map)
    }

    fn ordered<'a>(
        &self,
        values: &'a BTreeMap<String, Value>,
    ) -> Result<Vec<&'a Value>, PackError> {
        let mut ordered = Vec::with_capacity(self.engine.value_count);
        for field in &self.engine.spec.fields {
            if let Some(name) = &field.name {
                let value = values
                    .get(name)
                    .ok_or_else(|| PackError::MissingField(name.clone()))?;
                ordered.push(value);
            }
        }
        Ok(ordered)
    }
}

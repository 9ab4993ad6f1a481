//! Bit-addressable working buffer and low-level bit helpers.
//!
//! Bits are addressed in MSB-first order: bit 0 is the high bit of the first
//! byte. A [BitBuffer] is created fresh for every pack or unpack call and
//! discarded on return; it is never shared.

/// Growable bit-addressable buffer backed by a byte vector.
///
/// Unused bits in the last byte are always zero, so [BitBuffer::into_bytes]
/// is the zero-padded byte representation for free.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BitBuffer {
    bytes: Vec<u8>,
    len: usize,
}

impl BitBuffer {
    pub fn new() -> Self {
        Self {
            bytes: Vec::new(),
            len: 0,
        }
    }

    pub fn with_capacity(bits: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(bits.div_ceil(8)),
            len: 0,
        }
    }

    /// Wraps a byte slice as a bit buffer of `8 * data.len()` bits.
    pub fn from_bytes(data: &[u8]) -> Self {
        Self {
            bytes: data.to_vec(),
            len: data.len() * 8,
        }
    }

    /// Length in bits.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Reads the bit at `pos` (0 = MSB of the first byte). Returns 0 or 1.
    pub fn bit(&self, pos: usize) -> u8 {
        debug_assert!(pos < self.len);
        (self.bytes[pos / 8] >> (7 - pos % 8)) & 1
    }

    pub fn push_bit(&mut self, bit: u8) {
        if self.len % 8 == 0 {
            self.bytes.push(0);
        }
        if bit != 0 {
            self.bytes[self.len / 8] |= 0x80 >> (self.len % 8);
        }
        self.len += 1;
    }

    /// Appends the low `n` bits of `value`, most significant first.
    pub fn push_bits(&mut self, value: u64, n: usize) {
        debug_assert!(n <= 64);
        for i in (0..n).rev() {
            self.push_bit(((value >> i) & 1) as u8);
        }
    }

    /// Appends `n` copies of `bit`.
    pub fn push_repeated(&mut self, bit: u8, n: usize) {
        for _ in 0..n {
            self.push_bit(bit);
        }
    }

    /// Appends the bit range `start..end` of `other`.
    pub fn extend_range(&mut self, other: &BitBuffer, start: usize, end: usize) {
        debug_assert!(start <= end && end <= other.len);
        for pos in start..end {
            self.push_bit(other.bit(pos));
        }
    }

    /// Appends `n` bits read from a byte slice starting at bit `start`.
    pub fn push_slice_bits(&mut self, data: &[u8], start: usize, n: usize) {
        debug_assert!(start + n <= data.len() * 8);
        for pos in start..start + n {
            self.push_bit((data[pos / 8] >> (7 - pos % 8)) & 1);
        }
    }

    /// Returns a copy with the bit order reversed end to end.
    pub fn reversed(&self) -> BitBuffer {
        let mut out = BitBuffer::with_capacity(self.len);
        for pos in (0..self.len).rev() {
            out.push_bit(self.bit(pos));
        }
        out
    }

    /// Reads `n` bits starting at `start` as an unsigned value, MSB-first.
    pub fn read_u64(&self, start: usize, n: usize) -> u64 {
        debug_assert!(n <= 64 && start + n <= self.len);
        let mut value = 0u64;
        for pos in start..start + n {
            value = (value << 1) | self.bit(pos) as u64;
        }
        value
    }

    /// Appends zero bits until the length is a multiple of 8.
    pub fn pad_to_byte(&mut self) {
        while self.len % 8 != 0 {
            self.push_bit(0);
        }
    }

    /// Consumes the buffer, returning its bytes with the tail zero-padded.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// The buffer's bytes with the tail zero-padded.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.bytes.clone()
    }
}

/// Sign-extends the low `bits` of `value` to a full `i64`.
pub fn sign_extend(value: u64, bits: usize) -> i64 {
    let shift = 64 - bits;
    ((value << shift) as i64) >> shift
}

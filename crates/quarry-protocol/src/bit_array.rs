//! Fixed-width unsigned integers packed into 64-bit words.
//!
//! Packing policy: values never straddle a word boundary. Each word holds
//! `floor(64 / bits)` values starting at the least significant bit, and the
//! unused high bits of a word stay zero. This is the layout the client
//! expects for heightmaps and paletted containers since 1.16, and it makes
//! the word count `ceil(len / floor(64 / bits))`.

use quarry_common::{QuarryError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitArray {
    bits: u8,
    len: usize,
    words: Vec<u64>,
}

/// Smallest width able to hold `max_value`, never below one bit.
pub fn bits_for(max_value: u64) -> u8 {
    (64 - max_value.leading_zeros()).max(1) as u8
}

impl BitArray {
    pub fn word_count(bits: u8, len: usize) -> usize {
        let per_word = 64 / bits as usize;
        len.div_ceil(per_word)
    }

    /// Creates a zeroed array of `len` values, `bits` wide each (1..=32).
    pub fn new(bits: u8, len: usize) -> Result<Self> {
        if !(1..=32).contains(&bits) {
            return Err(QuarryError::OutOfRange {
                value: bits as u64,
                bits: 32,
            });
        }
        Ok(Self {
            bits,
            len,
            words: vec![0; Self::word_count(bits, len)],
        })
    }

    /// Creates an array wide enough for every value up to `max_value`.
    pub fn for_max_value(max_value: u64, len: usize) -> Result<Self> {
        Self::new(bits_for(max_value), len)
    }

    pub fn bits(&self) -> u8 {
        self.bits
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn per_word(&self) -> usize {
        64 / self.bits as usize
    }

    fn mask(&self) -> u64 {
        (1u64 << self.bits) - 1
    }

    fn locate(&self, index: usize) -> Result<(usize, u32)> {
        if index >= self.len {
            return Err(QuarryError::OutOfRange {
                value: index as u64,
                bits: self.bits,
            });
        }
        let per_word = self.per_word();
        let shift = (index % per_word) * self.bits as usize;
        Ok((index / per_word, shift as u32))
    }

    /// Stores `value` at `index`. Fails when `value >= 2^bits` or `index` is past the end.
    pub fn pack(&mut self, index: usize, value: u64) -> Result<()> {
        if value > self.mask() {
            return Err(QuarryError::OutOfRange {
                value,
                bits: self.bits,
            });
        }
        let (word, shift) = self.locate(index)?;
        let mask = self.mask() << shift;
        self.words[word] = (self.words[word] & !mask) | (value << shift);
        Ok(())
    }

    pub fn unpack(&self, index: usize) -> Result<u64> {
        let (word, shift) = self.locate(index)?;
        Ok((self.words[word] >> shift) & self.mask())
    }

    pub fn words(&self) -> &[u64] {
        &self.words
    }

    pub fn into_words(self) -> Vec<u64> {
        self.words
    }
}

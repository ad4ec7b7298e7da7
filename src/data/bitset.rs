//! Fixed-length bit vector used as a rule chromosome.
//!
//! Bits live in `u64` words, bit `i` at word `i / 64`, offset `i % 64`. Range
//! accessors read and write up to 64 contiguous bits without allocating, even
//! when the range straddles a word boundary.

use serde::{Deserialize, Serialize};
use std::fmt;

const WORD_BITS: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Chromosome {
    words: Vec<u64>,
    len: usize,
}

#[inline]
fn low_mask(width: usize) -> u64 {
    if width >= WORD_BITS {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

impl Chromosome {
    /// All-zero chromosome of `len` bits.
    pub fn new(len: usize) -> Self {
        Self {
            words: vec![0; len.div_ceil(WORD_BITS)],
            len,
        }
    }

    /// Parses a string of `0`/`1`, first character is bit 0.
    pub fn from_bit_str(bits: &str) -> Option<Self> {
        let mut chromosome = Self::new(bits.len());
        for (i, c) in bits.chars().enumerate() {
            match c {
                '0' => {}
                '1' => chromosome.set(i),
                _ => return None,
            }
        }
        Some(chromosome)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn get(&self, index: usize) -> bool {
        debug_assert!(index < self.len, "bit {} out of {}", index, self.len);
        (self.words[index / WORD_BITS] >> (index % WORD_BITS)) & 1 == 1
    }

    #[inline]
    pub fn set(&mut self, index: usize) {
        debug_assert!(index < self.len, "bit {} out of {}", index, self.len);
        self.words[index / WORD_BITS] |= 1u64 << (index % WORD_BITS);
    }

    #[inline]
    pub fn clear(&mut self, index: usize) {
        debug_assert!(index < self.len, "bit {} out of {}", index, self.len);
        self.words[index / WORD_BITS] &= !(1u64 << (index % WORD_BITS));
    }

    #[inline]
    pub fn set_to(&mut self, index: usize, value: bool) {
        let word = &mut self.words[index / WORD_BITS];
        let bit = 1u64 << (index % WORD_BITS);
        *word = (*word & !bit) | (bit * value as u64);
    }

    #[inline]
    pub fn flip(&mut self, index: usize) {
        debug_assert!(index < self.len, "bit {} out of {}", index, self.len);
        self.words[index / WORD_BITS] ^= 1u64 << (index % WORD_BITS);
    }

    /// Reads `width` (≤ 64) bits starting at `start`; bit `start` is the least significant.
    #[inline]
    pub fn get_range(&self, start: usize, width: usize) -> u64 {
        debug_assert!(width <= WORD_BITS);
        debug_assert!(start + width <= self.len);
        if width == 0 {
            return 0;
        }
        let word = start / WORD_BITS;
        let offset = start % WORD_BITS;
        let mut value = self.words[word] >> offset;
        if offset + width > WORD_BITS {
            value |= self.words[word + 1] << (WORD_BITS - offset);
        }
        value & low_mask(width)
    }

    /// Writes the low `width` (≤ 64) bits of `value` starting at `start`.
    #[inline]
    pub fn set_range(&mut self, start: usize, width: usize, value: u64) {
        debug_assert!(width <= WORD_BITS);
        debug_assert!(start + width <= self.len);
        if width == 0 {
            return;
        }
        let value = value & low_mask(width);
        let word = start / WORD_BITS;
        let offset = start % WORD_BITS;

        let mask = low_mask(width) << offset;
        self.words[word] = (self.words[word] & !mask) | (value << offset);

        if offset + width > WORD_BITS {
            let spill = offset + width - WORD_BITS;
            let high_mask = low_mask(spill);
            self.words[word + 1] =
                (self.words[word + 1] & !high_mask) | (value >> (WORD_BITS - offset));
        }
    }

    /// Copies bits `start..start + width` of `other` into the same positions of `self`.
    pub fn copy_range_from(&mut self, other: &Chromosome, start: usize, width: usize) {
        let mut done = 0;
        while done < width {
            let chunk = (width - done).min(WORD_BITS);
            let bits = other.get_range(start + done, chunk);
            self.set_range(start + done, chunk, bits);
            done += chunk;
        }
    }

    pub fn clear_range(&mut self, start: usize, width: usize) {
        let mut done = 0;
        while done < width {
            let chunk = (width - done).min(WORD_BITS);
            self.set_range(start + done, chunk, 0);
            done += chunk;
        }
    }

    /// Whether bits `start..start + width` hold the same values in both chromosomes.
    pub fn range_eq(&self, other: &Chromosome, start: usize, width: usize) -> bool {
        let mut done = 0;
        while done < width {
            let chunk = (width - done).min(WORD_BITS);
            if self.get_range(start + done, chunk) != other.get_range(start + done, chunk) {
                return false;
            }
            done += chunk;
        }
        true
    }

    pub fn count_ones(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    pub fn count_ones_in(&self, start: usize, width: usize) -> usize {
        let mut done = 0;
        let mut ones = 0;
        while done < width {
            let chunk = (width - done).min(WORD_BITS);
            ones += self.get_range(start + done, chunk).count_ones() as usize;
            done += chunk;
        }
        ones
    }
}

impl fmt::Display for Chromosome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..self.len {
            f.write_str(if self.get(i) { "1" } else { "0" })?;
        }
        Ok(())
    }
}

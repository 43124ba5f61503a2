//! Word-level shape of the squaring datapath.
//!
//! The MSU carries values in a redundant representation: `num_elements`
//! words of `word_len` bits each, one word per 32-bit transfer slot. Only
//! the nonredundant words carry payload capacity; the redundant words give
//! the multiplier headroom to defer carries.

use crate::{Error, Result};

/// Number of 32-bit words prepended for an iteration counter field.
pub const T_WORDS: usize = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Geometry {
    /// Bits per hardware word. At most 32 so a word rides in one u32 slot.
    pub word_len: u32,
    /// Words that count toward operand capacity.
    pub nonredundant_elements: usize,
    /// Carry-headroom words above the nonredundant ones.
    pub redundant_elements: usize,
    /// URAM banks of reduction tables the design was built with. Zero means
    /// the tables are baked into the bitstream and nothing is loaded at run
    /// time.
    pub num_urams: usize,
}

impl Geometry {
    pub fn new(
        word_len: u32,
        nonredundant_elements: usize,
        redundant_elements: usize,
        num_urams: usize,
    ) -> Result<Self> {
        if word_len == 0 || word_len > 32 {
            return Err(Error::Config(format!(
                "word_len must be in 1..=32, got {word_len}"
            )));
        }
        if nonredundant_elements == 0 {
            return Err(Error::Config(
                "nonredundant_elements must be nonzero".to_string(),
            ));
        }
        Ok(Self {
            word_len,
            nonredundant_elements,
            redundant_elements,
            num_urams,
        })
    }

    /// Total words per operand on the wire.
    pub fn num_elements(&self) -> usize {
        self.nonredundant_elements + self.redundant_elements
    }

    /// Capacity of the nonredundant words in bits. Operands at or above
    /// `2^capacity_bits` do not encode.
    pub fn capacity_bits(&self) -> u64 {
        self.word_len as u64 * self.nonredundant_elements as u64
    }

    /// Input buffer length in u32 words: two counter fields then the operand.
    pub fn words_in(&self) -> usize {
        2 * T_WORDS + self.num_elements()
    }

    /// Output buffer length in u32 words: one counter field then the result.
    pub fn words_out(&self) -> usize {
        T_WORDS + self.num_elements()
    }
}

impl Default for Geometry {
    /// Shape of the reference 128-bit design: 16-bit words, 8 nonredundant
    /// and 2 redundant elements, tables baked in.
    fn default() -> Self {
        Self {
            word_len: 16,
            nonredundant_elements: 8,
            redundant_elements: 2,
            num_urams: 0,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn default_matches_reference_design() {
        let g = Geometry::default();
        assert_eq!(g.num_elements(), 10);
        assert_eq!(g.capacity_bits(), 128);
        assert_eq!(g.words_in(), 14);
        assert_eq!(g.words_out(), 12);
    }

    #[test]
    fn rejects_degenerate_word_len() {
        assert!(Geometry::new(0, 8, 2, 0).is_err());
        assert!(Geometry::new(33, 8, 2, 0).is_err());
        assert!(Geometry::new(32, 8, 2, 0).is_ok());
    }

    #[test]
    fn rejects_zero_capacity() {
        assert!(Geometry::new(16, 0, 2, 0).is_err());
    }

    #[test]
    fn no_redundant_words_is_legal() {
        let g = Geometry::new(16, 8, 0, 0).unwrap();
        assert_eq!(g.num_elements(), 8);
        assert_eq!(g.words_in(), 12);
        assert_eq!(g.words_out(), 10);
    }
}

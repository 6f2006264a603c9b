use serde::{Deserialize, Serialize};

/// Fixed-width unsigned entries laid end to end across an array of `i64`
/// words, the encoding litematic files use for per-voxel palette indices.
///
/// Entries are packed with no padding, so an entry may straddle a word
/// boundary; entries are never realigned to the next word. The words are
/// stored signed because that is how the long array arrives off the wire,
/// but every shift here operates on the raw bit pattern via `u64`: an
/// arithmetic right shift on a negative word would smear the sign bit into
/// the extracted value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackedLongArray {
    words: Vec<i64>,
    bit_width: u32,
    len: usize,
}

impl PackedLongArray {
    /// Maximum entry width; a litematic palette index never needs more.
    pub const MAX_BIT_WIDTH: u32 = 32;

    /// Wrap `words` as `len` entries of `bit_width` bits each.
    ///
    /// Fails if the width is outside `1..=32` or the word array is too short
    /// to cover the last entry.
    pub fn new(words: Vec<i64>, bit_width: u32, len: usize) -> Result<Self, String> {
        if bit_width == 0 || bit_width > Self::MAX_BIT_WIDTH {
            return Err(format!("unsupported entry width of {} bits", bit_width));
        }
        let required = (len as u64 * bit_width as u64).div_ceil(64);
        if (words.len() as u64) < required {
            return Err(format!(
                "packed array holds {} words but {} entries of {} bits need {}",
                words.len(),
                len,
                bit_width,
                required
            ));
        }
        Ok(PackedLongArray {
            words,
            bit_width,
            len,
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn bit_width(&self) -> u32 {
        self.bit_width
    }

    /// Decode the entry at `index`.
    ///
    /// `index` must be below `len()`; callers bounds-check before calling so
    /// this stays branch-minimal on the hot path.
    #[inline(always)]
    pub fn get(&self, index: usize) -> u64 {
        debug_assert!(index < self.len);
        let start_offset = index as u64 * self.bit_width as u64;
        let start_word = (start_offset >> 6) as usize;
        let end_word = ((start_offset + self.bit_width as u64 - 1) >> 6) as usize;
        let start_bit = (start_offset & 63) as u32;
        let mask = u64::MAX >> (64 - self.bit_width);

        if start_word == end_word {
            (self.words[start_word] as u64 >> start_bit) & mask
        } else {
            // start_bit is nonzero here, so the left shift is < 64
            let low = self.words[start_word] as u64 >> start_bit;
            let high = (self.words[end_word] as u64) << (64 - start_bit);
            (low | high) & mask
        }
    }

    /// All entries in index order.
    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        (0..self.len).map(move |i| self.get(i))
    }
}

use crate::block_state::BlockState;
use crate::error::{Error, Result};
use crate::packed::PackedLongArray;
use log::debug;
use quartz_nbt::{NbtCompound, NbtList, NbtTag};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// One rectangular sub-volume of a schematic: a block-state palette plus the
/// bit-packed array mapping every voxel to a palette index.
///
/// Immutable once constructed; point queries take `&self` and concurrent
/// readers need no synchronization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Region {
    name: String,
    position: (i32, i32, i32),
    dimensions: (u32, u32, u32),
    palette: Vec<BlockState>,
    block_states: PackedLongArray,
}

/// Bits needed to index a palette of `palette_len` entries: the bit length
/// of the largest valid index, never less than one.
fn bit_width_for(palette_len: usize) -> u32 {
    (usize::BITS - (palette_len - 1).leading_zeros()).max(1)
}

fn malformed(name: &str, reason: impl ToString) -> Error {
    Error::MalformedRegion {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}

impl Region {
    /// Assemble a region from its litematic compound: `Size`,
    /// `BlockStatePalette`, `BlockStates`, and optionally `Position`.
    ///
    /// Rejects regions with an empty palette, a zero size component, or a
    /// `BlockStates` array too short for the volume.
    pub fn from_nbt(name: &str, nbt: &NbtCompound) -> Result<Region> {
        let size = nbt
            .get::<_, &NbtCompound>("Size")
            .map_err(|e| malformed(name, e))?;
        // raw components may be negative (mirrored extent); decoding only
        // ever sees the magnitudes
        let dimensions = (
            size.get::<_, i32>("x").map_err(|e| malformed(name, e))?.unsigned_abs(),
            size.get::<_, i32>("y").map_err(|e| malformed(name, e))?.unsigned_abs(),
            size.get::<_, i32>("z").map_err(|e| malformed(name, e))?.unsigned_abs(),
        );
        if dimensions.0 == 0 || dimensions.1 == 0 || dimensions.2 == 0 {
            return Err(malformed(
                name,
                format!(
                    "zero-volume size {}x{}x{}",
                    dimensions.0, dimensions.1, dimensions.2
                ),
            ));
        }

        let position = match nbt.get::<_, &NbtCompound>("Position") {
            Ok(pos) => (
                pos.get::<_, i32>("x").map_err(|e| malformed(name, e))?,
                pos.get::<_, i32>("y").map_err(|e| malformed(name, e))?,
                pos.get::<_, i32>("z").map_err(|e| malformed(name, e))?,
            ),
            Err(_) => (0, 0, 0),
        };

        let palette_tag = nbt
            .get::<_, &NbtList>("BlockStatePalette")
            .map_err(|e| malformed(name, e))?;
        if palette_tag.is_empty() {
            return Err(malformed(name, "empty block state palette"));
        }
        let mut palette = Vec::with_capacity(palette_tag.len());
        for tag in palette_tag.iter() {
            let NbtTag::Compound(compound) = tag else {
                return Err(malformed(name, "palette entry is not a compound"));
            };
            palette.push(BlockState::from_nbt(compound).map_err(|reason| malformed(name, reason))?);
        }

        let words = nbt
            .get::<_, &[i64]>("BlockStates")
            .map_err(|e| malformed(name, e))?;
        let volume = dimensions.0 as usize * dimensions.1 as usize * dimensions.2 as usize;
        let bit_width = bit_width_for(palette.len());
        let block_states = PackedLongArray::new(words.to_vec(), bit_width, volume)
            .map_err(|reason| malformed(name, reason))?;

        debug!(
            "region '{}': {}x{}x{}, palette of {} at {} bits",
            name,
            dimensions.0,
            dimensions.1,
            dimensions.2,
            palette.len(),
            bit_width
        );

        Ok(Region {
            name: name.to_string(),
            position,
            dimensions,
            palette,
            block_states,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn position(&self) -> (i32, i32, i32) {
        self.position
    }

    pub fn dimensions(&self) -> (u32, u32, u32) {
        self.dimensions
    }

    pub fn volume(&self) -> usize {
        self.dimensions.0 as usize * self.dimensions.1 as usize * self.dimensions.2 as usize
    }

    pub fn bit_width(&self) -> u32 {
        self.block_states.bit_width()
    }

    pub fn palette(&self) -> &[BlockState] {
        &self.palette
    }

    /// Flatten a coordinate to its voxel index: X runs fastest, then Z,
    /// then Y, matching the litematic block-state order.
    pub fn coords_to_index(&self, x: i32, y: i32, z: i32) -> Result<usize> {
        let (dx, dy, dz) = self.dimensions;
        if x < 0 || y < 0 || z < 0 || x as u32 >= dx || y as u32 >= dy || z as u32 >= dz {
            // report the signed flattened offset the coordinate would land on
            return Err(Error::IndexOutOfRange {
                index: y as i64 * (dx as i64 * dz as i64) + z as i64 * dx as i64 + x as i64,
                volume: self.volume(),
            });
        }
        Ok((y as usize * dz as usize + z as usize) * dx as usize + x as usize)
    }

    /// The decoded palette index for a voxel.
    pub fn palette_index(&self, index: usize) -> Result<usize> {
        if index >= self.volume() {
            return Err(Error::IndexOutOfRange {
                index: index as i64,
                volume: self.volume(),
            });
        }
        Ok(self.block_states.get(index) as usize)
    }

    /// Resolve a voxel to its palette entry.
    ///
    /// A decoded index past the end of the palette means the file is
    /// corrupt; it surfaces as an error rather than wrapping or defaulting.
    pub fn block_state(&self, index: usize) -> Result<&BlockState> {
        let palette_index = self.palette_index(index)?;
        self.palette.get(palette_index).ok_or_else(|| {
            malformed(
                &self.name,
                format!(
                    "decoded palette index {} outside palette of {}",
                    palette_index,
                    self.palette.len()
                ),
            )
        })
    }

    pub fn block_state_at(&self, x: i32, y: i32, z: i32) -> Result<&BlockState> {
        self.block_state(self.coords_to_index(x, y, z)?)
    }

    /// Every voxel's palette entry in index order.
    pub fn iter_block_states(&self) -> impl Iterator<Item = Result<&BlockState>> + '_ {
        (0..self.volume()).map(move |index| self.block_state(index))
    }

    /// Non-air voxel count.
    pub fn count_blocks(&self) -> Result<usize> {
        let mut count = 0;
        for state in self.iter_block_states() {
            if !state?.is_air() {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Tally of voxels per palette entry, skipping entries that never occur.
    pub fn count_block_types(&self) -> Result<FxHashMap<&BlockState, usize>> {
        let mut counts: FxHashMap<&BlockState, usize> = FxHashMap::default();
        for state in self.iter_block_states() {
            *counts.entry(state?).or_insert(0) += 1;
        }
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region_nbt(size: (i32, i32, i32), palette: &[BlockState], words: Vec<i64>) -> NbtCompound {
        let mut nbt = NbtCompound::new();

        let mut size_nbt = NbtCompound::new();
        size_nbt.insert("x", NbtTag::Int(size.0));
        size_nbt.insert("y", NbtTag::Int(size.1));
        size_nbt.insert("z", NbtTag::Int(size.2));
        nbt.insert("Size", NbtTag::Compound(size_nbt));

        let palette_nbt = NbtList::from(
            palette
                .iter()
                .map(|block| block.to_nbt())
                .collect::<Vec<NbtTag>>(),
        );
        nbt.insert("BlockStatePalette", NbtTag::List(palette_nbt));
        nbt.insert("BlockStates", NbtTag::LongArray(words));

        nbt
    }

    fn air_stone() -> Vec<BlockState> {
        vec![
            BlockState::new("minecraft:air"),
            BlockState::new("minecraft:stone"),
        ]
    }

    #[test]
    fn test_bit_width_from_palette_size() {
        let expected = [(1, 1), (2, 1), (3, 2), (4, 2), (5, 3), (9, 4), (17, 5), (257, 9)];
        for (palette_len, bits) in expected {
            assert_eq!(bit_width_for(palette_len), bits, "palette of {}", palette_len);
        }
    }

    #[test]
    fn test_air_and_stone_voxels() {
        // two voxels at one bit each: bit 0 = air, bit 1 = stone
        let nbt = region_nbt((1, 1, 2), &air_stone(), vec![0b10]);
        let region = Region::from_nbt("main", &nbt).unwrap();

        assert_eq!(region.bit_width(), 1);
        assert_eq!(region.volume(), 2);
        assert_eq!(region.block_state(0).unwrap().name(), "minecraft:air");
        assert_eq!(region.block_state(1).unwrap().name(), "minecraft:stone");
        assert_eq!(
            region.block_state_at(0, 0, 1).unwrap().name(),
            "minecraft:stone"
        );
    }

    #[test]
    fn test_negative_size_is_mirrored_extent() {
        let words = vec![0i64; 1]; // 30 voxels at 1 bit
        let nbt = region_nbt((-5, 3, 2), &air_stone(), words);
        let region = Region::from_nbt("mirrored", &nbt).unwrap();

        assert_eq!(region.dimensions(), (5, 3, 2));
        assert_eq!(region.volume(), 30);
    }

    #[test]
    fn test_voxel_ordering() {
        // palette of 8 so each voxel index decodes to itself when the words
        // hold 0..8 at 3 bits
        let palette: Vec<BlockState> = (0..8)
            .map(|i| BlockState::new(format!("minecraft:wool_{}", i)))
            .collect();
        let mut word = 0u64;
        for i in 0..8u64 {
            word |= i << (3 * i);
        }
        let nbt = region_nbt((2, 2, 2), &palette, vec![word as i64]);
        let region = Region::from_nbt("order", &nbt).unwrap();

        for y in 0..2 {
            for z in 0..2 {
                for x in 0..2 {
                    let index = region.coords_to_index(x, y, z).unwrap();
                    assert_eq!(index, (y * 4 + z * 2 + x) as usize);
                    assert_eq!(region.palette_index(index).unwrap(), index);
                }
            }
        }
    }

    #[test]
    fn test_out_of_range_queries() {
        let nbt = region_nbt((1, 1, 2), &air_stone(), vec![0b10]);
        let region = Region::from_nbt("main", &nbt).unwrap();

        assert!(matches!(
            region.block_state(2),
            Err(Error::IndexOutOfRange { index: 2, volume: 2 })
        ));
        assert!(matches!(
            region.block_state_at(-1, 0, 0),
            Err(Error::IndexOutOfRange { index: -1, .. })
        ));
        assert!(matches!(
            region.block_state_at(0, 0, 2),
            Err(Error::IndexOutOfRange { .. })
        ));
    }

    #[test]
    fn test_corrupt_palette_reference() {
        // second voxel decodes to index 1, but the palette only has one entry
        let palette = vec![BlockState::new("minecraft:air")];
        let nbt = region_nbt((1, 1, 2), &palette, vec![0b10]);
        let region = Region::from_nbt("corrupt", &nbt).unwrap();

        assert!(region.block_state(0).is_ok());
        assert!(matches!(
            region.block_state(1),
            Err(Error::MalformedRegion { .. })
        ));
    }

    #[test]
    fn test_degenerate_regions_rejected() {
        let zero_dim = region_nbt((0, 3, 2), &air_stone(), vec![0]);
        assert!(matches!(
            Region::from_nbt("flat", &zero_dim),
            Err(Error::MalformedRegion { .. })
        ));

        let empty_palette = region_nbt((1, 1, 1), &[], vec![0]);
        assert!(matches!(
            Region::from_nbt("unpainted", &empty_palette),
            Err(Error::MalformedRegion { .. })
        ));

        // 65 voxels at 1 bit need two words
        let undersized = region_nbt((65, 1, 1), &air_stone(), vec![0]);
        assert!(matches!(
            Region::from_nbt("short", &undersized),
            Err(Error::MalformedRegion { .. })
        ));
    }

    #[test]
    fn test_missing_size_rejected() {
        let mut nbt = NbtCompound::new();
        let palette_nbt = NbtList::from(
            air_stone()
                .iter()
                .map(|block| block.to_nbt())
                .collect::<Vec<NbtTag>>(),
        );
        nbt.insert("BlockStatePalette", NbtTag::List(palette_nbt));
        nbt.insert("BlockStates", NbtTag::LongArray(vec![0]));
        assert!(matches!(
            Region::from_nbt("sizeless", &nbt),
            Err(Error::MalformedRegion { .. })
        ));
    }

    #[test]
    fn test_block_counts() {
        // 4 voxels: air, stone, stone, air
        let nbt = region_nbt((1, 1, 4), &air_stone(), vec![0b0110]);
        let region = Region::from_nbt("main", &nbt).unwrap();

        assert_eq!(region.count_blocks().unwrap(), 2);
        let counts = region.count_block_types().unwrap();
        assert_eq!(counts[&region.palette()[0]], 2);
        assert_eq!(counts[&region.palette()[1]], 2);
    }

    #[test]
    fn test_position_defaults_to_origin() {
        let nbt = region_nbt((1, 1, 1), &air_stone(), vec![0]);
        let region = Region::from_nbt("main", &nbt).unwrap();
        assert_eq!(region.position(), (0, 0, 0));

        let mut with_pos = region_nbt((1, 1, 1), &air_stone(), vec![0]);
        let mut pos = NbtCompound::new();
        pos.insert("x", NbtTag::Int(-8));
        pos.insert("y", NbtTag::Int(64));
        pos.insert("z", NbtTag::Int(12));
        with_pos.insert("Position", NbtTag::Compound(pos));
        let region = Region::from_nbt("placed", &with_pos).unwrap();
        assert_eq!(region.position(), (-8, 64, 12));
    }
}

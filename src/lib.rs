//! Crystallite is a reader for Litematica schematic files.
//!
//! A `.litematic` file is a gzip-compressed NBT container holding one or
//! more named regions. Each region carries a palette of block states and a
//! bit-packed long array mapping every voxel in the region volume to a
//! palette index. This crate decodes that container into an immutable
//! [`Schematic`] with point-query access to every voxel:
//!
//! ```no_run
//! use crystallite::Schematic;
//!
//! let schematic = Schematic::open("castle.litematic")?;
//! for region in schematic.regions() {
//!     let (dx, dy, dz) = region.dimensions();
//!     println!("{}: {}x{}x{}", region.name(), dx, dy, dz);
//!     println!("corner block: {}", region.block_state_at(0, 0, 0)?);
//! }
//! # Ok::<(), crystallite::Error>(())
//! ```
//!
//! Decoding is read-only: writing, merging, and editing schematics are out
//! of scope.

pub mod block_state;
pub mod error;
pub mod packed;
pub mod region;
pub mod schematic;
pub mod value;

pub use block_state::BlockState;
pub use error::{Error, Result};
pub use packed::PackedLongArray;
pub use region::Region;
pub use schematic::{FileFormat, Schematic};
pub use value::Value;

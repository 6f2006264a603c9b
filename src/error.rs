use quartz_nbt::io::NbtIoError;
use quartz_nbt::NbtReprError;

/// Error type for schematic decoding.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unsupported schematic format: .{0}")]
    UnsupportedFormat(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid litematic container: {0}")]
    Parse(#[from] NbtIoError),
    #[error("invalid litematic structure: {0}")]
    Structure(#[from] NbtReprError),
    #[error("malformed region '{name}': {reason}")]
    MalformedRegion { name: String, reason: String },
    #[error("voxel index {index} out of range (region volume {volume})")]
    IndexOutOfRange { index: i64, volume: usize },
}

pub type Result<T> = std::result::Result<T, Error>;

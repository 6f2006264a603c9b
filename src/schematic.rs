use crate::error::{Error, Result};
use crate::region::Region;
use crate::value::Value;
use flate2::read::GzDecoder;
use log::debug;
use quartz_nbt::io::Flavor;
use quartz_nbt::{NbtCompound, NbtTag};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Recognized schematic container formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileFormat {
    Litematic,
}

impl FileFormat {
    /// Determine the format from the path extension alone; the file is not
    /// touched. Anything but `.litematic` is unsupported.
    pub fn from_path(path: &Path) -> Result<FileFormat> {
        let extension = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_lowercase();
        match extension.as_str() {
            "litematic" => Ok(FileFormat::Litematic),
            other => Err(Error::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Normalize a metadata key: `TimeCreated` -> `time_created`.
fn snake_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for (i, c) in key.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if i != 0 {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// A fully decoded litematic file: top-level metadata plus every region,
/// in the order the container yielded them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schematic {
    file_format: FileFormat,
    version: i32,
    data_version: i32,
    metadata: FxHashMap<String, Value>,
    regions: Vec<Region>,
    region_index: FxHashMap<String, usize>,
}

impl Schematic {
    /// Open and decode a `.litematic` file.
    ///
    /// The extension gate runs before the file is opened, so an unsupported
    /// path never costs any I/O.
    pub fn open(path: impl AsRef<Path>) -> Result<Schematic> {
        let path = path.as_ref();
        FileFormat::from_path(path)?;
        let file = File::open(path)?;
        let schematic = Self::from_reader(BufReader::with_capacity(1 << 20, file))?;
        debug!("opened schematic {}", path.display());
        Ok(schematic)
    }

    /// Decode litematic bytes from any reader, streaming the gzip layer
    /// straight into the NBT parser with no intermediate buffer.
    pub fn from_reader(reader: impl Read) -> Result<Schematic> {
        let mut gz = GzDecoder::new(reader);
        let (root, _) = quartz_nbt::io::read_nbt(&mut gz, Flavor::Uncompressed)?;
        Self::from_nbt(&root)
    }

    fn from_nbt(root: &NbtCompound) -> Result<Schematic> {
        let version = root.get::<_, i32>("Version")?;
        let data_version = root.get::<_, i32>("MinecraftDataVersion")?;

        // pure key renaming; unknown keys survive under their normalized name
        let metadata_nbt = root.get::<_, &NbtCompound>("Metadata")?;
        let metadata = metadata_nbt
            .inner()
            .iter()
            .map(|(key, tag)| (snake_case(key), Value::from(tag)))
            .collect();

        let regions_nbt = root.get::<_, &NbtCompound>("Regions")?;
        let mut regions = Vec::with_capacity(regions_nbt.inner().len());
        let mut region_index = FxHashMap::default();
        for (name, tag) in regions_nbt.inner() {
            let NbtTag::Compound(region_nbt) = tag else {
                return Err(Error::MalformedRegion {
                    name: name.clone(),
                    reason: "region entry is not a compound".to_string(),
                });
            };
            let region = Region::from_nbt(name, region_nbt)?;
            region_index.insert(name.clone(), regions.len());
            regions.push(region);
        }

        debug!(
            "decoded litematic: version {}, data version {}, {} region(s)",
            version,
            data_version,
            regions.len()
        );

        Ok(Schematic {
            file_format: FileFormat::Litematic,
            version,
            data_version,
            metadata,
            regions,
            region_index,
        })
    }

    pub fn file_format(&self) -> FileFormat {
        self.file_format
    }

    /// Litematica container version marker.
    pub fn version(&self) -> i32 {
        self.version
    }

    /// Minecraft data version the schematic was saved under.
    pub fn data_version(&self) -> i32 {
        self.data_version
    }

    /// All metadata entries under their normalized snake_case keys.
    pub fn metadata(&self) -> &FxHashMap<String, Value> {
        &self.metadata
    }

    pub fn name(&self) -> Option<&str> {
        self.metadata.get("name").and_then(Value::as_str)
    }

    pub fn author(&self) -> Option<&str> {
        self.metadata.get("author").and_then(Value::as_str)
    }

    pub fn description(&self) -> Option<&str> {
        self.metadata.get("description").and_then(Value::as_str)
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn region(&self, name: &str) -> Option<&Region> {
        self.region_index.get(name).map(|&i| &self.regions[i])
    }

    pub fn region_names(&self) -> impl Iterator<Item = &str> {
        self.regions.iter().map(Region::name)
    }
}

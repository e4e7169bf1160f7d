use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::error::Error;
use crate::index::LocusIndex;

const MAGIC: &[u8; 6] = b"SHIDX\x01";

impl LocusIndex {
    /// Path of the persisted index for a locus name.
    pub fn index_path(dir: &Path, name: &str) -> PathBuf {
        dir.join(format!("{name}.shx"))
    }

    /// Persist the index as `<dir>/<name>.shx`.
    ///
    /// Only the window sequence is stored; the k-mer table is rebuilt on
    /// load, which keeps the file small and a loaded index behaviorally
    /// identical to a freshly built one.
    pub fn write(&self, dir: &Path) -> Result<PathBuf, Error> {
        let path = Self::index_path(dir, &self.name);
        let file = File::create(&path).map_err(|e| Error::io(e, &path))?;
        let mut writer = BufWriter::new(file);

        let io_err = |e: std::io::Error| Error::io(e, &path);

        writer.write_all(MAGIC).map_err(io_err)?;
        writer
            .write_u32::<LittleEndian>(self.name.len() as u32)
            .map_err(io_err)?;
        writer.write_all(self.name.as_bytes()).map_err(io_err)?;
        writer
            .write_u64::<LittleEndian>(self.sequence.len() as u64)
            .map_err(io_err)?;
        writer.write_all(&self.sequence).map_err(io_err)?;
        writer.flush().map_err(io_err)?;

        Ok(path)
    }

    /// Load a prebuilt index for `name` from `dir`.
    pub fn load(dir: &Path, name: &str) -> Result<Self, Error> {
        let path = Self::index_path(dir, name);
        if !path.exists() {
            return Err(Error::Index(format!(
                "index not found for locus {name}: {}",
                path.display()
            )));
        }

        let file = File::open(&path).map_err(|e| Error::io(e, &path))?;
        let mut reader = BufReader::new(file);

        let corrupt = |what: &str| {
            Error::Index(format!("corrupt index {} ({what})", path.display()))
        };

        let mut magic = [0u8; 6];
        reader
            .read_exact(&mut magic)
            .map_err(|_| corrupt("truncated header"))?;
        if &magic != MAGIC {
            return Err(corrupt("bad magic"));
        }

        let name_len = reader
            .read_u32::<LittleEndian>()
            .map_err(|_| corrupt("truncated name length"))? as usize;
        let mut name_bytes = vec![0u8; name_len];
        reader
            .read_exact(&mut name_bytes)
            .map_err(|_| corrupt("truncated name"))?;
        let stored_name =
            String::from_utf8(name_bytes).map_err(|_| corrupt("non-UTF-8 name"))?;
        if stored_name != name {
            return Err(Error::Index(format!(
                "index {} holds locus {stored_name}, expected {name}",
                path.display()
            )));
        }

        let seq_len = reader
            .read_u64::<LittleEndian>()
            .map_err(|_| corrupt("truncated sequence length"))? as usize;
        let mut sequence = vec![0u8; seq_len];
        reader
            .read_exact(&mut sequence)
            .map_err(|_| corrupt("truncated sequence"))?;

        Self::build(name, &sequence)
    }
}

//! Interaction with `.siv` snapshot files.
//!
//! A snapshot holds the full state of a model between two steps, so a long
//! run can be written out and resumed later.
//!
//! Layout: 4 magic bytes, one byte for the [`ModelKind`], one byte for the
//! [`Compression`] of the body. The body is a sequence of LEB128 varints:
//! dimension, step, side, origin, flags, initial value, background value,
//! discarded value, value count, and then every stored value in storage
//! order. Signed numbers are zigzag encoded.

use std::{
    fs::File,
    io::{Read, Seek, SeekFrom, Write},
    path::Path,
};

mod compression;
pub use compression::Compression;
use compression::{Reader, Writer};

use crate::{
    automata::{FrontierPolicy, SimulationConfig},
    Error, Result, Value,
};

const MAGIC: [u8; 4] = [0x51, 0x5E, 0x1D, 0xA7];

const FLAG_BOUNDS_REACHED: u64 = 0x1;
const FLAG_FIXED_FRONTIER: u64 = 0x2;

/// Which realization of the automaton a snapshot was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    FullGrid,
    Reduced,
}

impl ModelKind {
    pub fn name(&self) -> &'static str {
        match self {
            ModelKind::FullGrid => "full-grid",
            ModelKind::Reduced => "reduced",
        }
    }
}

impl From<ModelKind> for u8 {
    fn from(value: ModelKind) -> Self {
        match value {
            ModelKind::FullGrid => 0,
            ModelKind::Reduced => 1,
        }
    }
}

impl TryFrom<u8> for ModelKind {
    type Error = u8;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::FullGrid),
            1 => Ok(Self::Reduced),
            other => Err(other),
        }
    }
}

/// The state of a model between two steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub kind: ModelKind,
    pub config: SimulationConfig,
    pub step: u64,
    /// The side of the stored array.
    pub side: usize,
    /// The array index of the lattice origin on every axis. Always zero for
    /// the reduced model.
    pub origin: usize,
    /// Whether the frontier was reached during the last step, so the array
    /// grows before the next one.
    pub bounds_reached: bool,
    /// The value lost past a fixed frontier so far.
    pub discarded: Value,
    /// The stored values in storage order.
    pub values: Vec<Value>,
}

/// A model that can be written out to a [`Snapshot`] and restored from one.
pub trait Persistent: Sized {
    fn snapshot(&self) -> Snapshot;

    /// Restore a model. Fails if the snapshot was taken from another kind
    /// of model or its values do not fit the array it describes.
    fn from_snapshot(snapshot: Snapshot) -> Result<Self>;
}

fn invalid(msg: impl Into<String>) -> Error {
    Error::InvalidSnapshot(msg.into())
}

fn write_varint<W: Write>(write: &mut W, mut value: u64) -> std::io::Result<()> {
    loop {
        let mut next_byte = (value as u8) & 0x7F;
        value >>= 7;

        if value > 0 {
            next_byte |= 0x80;
        }

        write.write_all(&[next_byte])?;

        if value == 0 {
            return Ok(());
        }
    }
}

fn read_varint<R: Read>(read: &mut R) -> Result<u64> {
    let mut value: u64 = 0;
    let mut shift = 0;
    loop {
        let mut next_byte = [0u8; 1];
        read.read_exact(&mut next_byte)?;
        let [next_byte] = next_byte;

        if shift >= 64 {
            return Err(invalid("Varint does not fit in 64 bits"));
        }
        value |= ((next_byte & 0x7F) as u64) << shift;
        shift += 7;

        if next_byte & 0x80 == 0 {
            return Ok(value);
        }
    }
}

fn zigzag(value: Value) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

fn unzigzag(value: u64) -> Value {
    ((value >> 1) as Value) ^ -((value & 1) as Value)
}

fn read_usize<R: Read>(read: &mut R, what: &str) -> Result<usize> {
    let value = read_varint(read)?;
    usize::try_from(value).map_err(|_| invalid(format!("{what} {value} is too large")))
}

impl Snapshot {
    /// Read a snapshot from `input`.
    pub fn read<T: Read>(mut input: T) -> Result<Self> {
        let mut magic = [0u8; 4];
        input.read_exact(&mut magic)?;

        if magic != MAGIC {
            return Err(invalid("File magic was incorrect."));
        }

        let mut header = [0u8; 2];
        input.read_exact(&mut header)?;
        let [kind, compression] = header;

        let kind = ModelKind::try_from(kind)
            .map_err(|k| invalid(format!("Unknown model kind {k}")))?;
        let compression = Compression::try_from(compression)
            .map_err(|c| invalid(format!("Unsupported compression type {c}")))?;

        let mut body = Reader::new(compression, input);

        let dimension = read_usize(&mut body, "Dimension")?;
        let step = read_varint(&mut body)?;
        let side = read_usize(&mut body, "Side")?;
        let origin = read_usize(&mut body, "Origin")?;
        let flags = read_varint(&mut body)?;
        let initial_value = unzigzag(read_varint(&mut body)?);
        let background_value = unzigzag(read_varint(&mut body)?);
        let discarded = unzigzag(read_varint(&mut body)?);
        let count = read_usize(&mut body, "Value count")?;

        if flags & !(FLAG_BOUNDS_REACHED | FLAG_FIXED_FRONTIER) != 0 {
            return Err(invalid(format!("Unknown flags {flags:#x}")));
        }

        let frontier = if flags & FLAG_FIXED_FRONTIER != 0 {
            FrontierPolicy::Fixed
        } else {
            FrontierPolicy::Grow
        };

        // A corrupt count must not turn into a huge allocation up front
        let mut values = Vec::with_capacity(count.min(1 << 20));
        for values_read in 0..count {
            let value = read_varint(&mut body).map_err(|e| {
                invalid(format!(
                    "Expected {count} values, but failed to read after {values_read} values. Error: {e}"
                ))
            })?;
            values.push(unzigzag(value));
        }

        Ok(Self {
            kind,
            config: SimulationConfig {
                dimension,
                initial_value,
                background_value,
                frontier,
            },
            step,
            side,
            origin,
            bounds_reached: flags & FLAG_BOUNDS_REACHED != 0,
            discarded,
            values,
        })
    }

    /// Read the snapshot stored in the file at `path`.
    pub fn read_file(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::read(file)
    }

    fn write_impl<W: Write>(
        &self,
        write_magic: bool,
        compression: Compression,
        mut write: W,
    ) -> Result<()> {
        if write_magic {
            write.write_all(&MAGIC)?;
        }

        write.write_all(&[self.kind.into(), compression.into()])?;

        let mut flags = 0;
        if self.bounds_reached {
            flags |= FLAG_BOUNDS_REACHED;
        }
        if self.config.frontier == FrontierPolicy::Fixed {
            flags |= FLAG_FIXED_FRONTIER;
        }

        let mut body = Writer::new(compression, write);

        write_varint(&mut body, self.config.dimension as u64)?;
        write_varint(&mut body, self.step)?;
        write_varint(&mut body, self.side as u64)?;
        write_varint(&mut body, self.origin as u64)?;
        write_varint(&mut body, flags)?;
        write_varint(&mut body, zigzag(self.config.initial_value))?;
        write_varint(&mut body, zigzag(self.config.background_value))?;
        write_varint(&mut body, zigzag(self.discarded))?;
        write_varint(&mut body, self.values.len() as u64)?;

        for value in &self.values {
            write_varint(&mut body, zigzag(*value))?;
        }

        body.finish()?;

        Ok(())
    }

    /// Write the snapshot into `write`.
    pub fn write<W: Write>(&self, compression: Compression, write: W) -> Result<()> {
        self.write_impl(true, compression, write)
    }

    /// Write the snapshot to the file at `path`.
    ///
    /// This will create a new file, or _will_ overwrite the contents of the
    /// file at `path`. It will not create the parent directories of `path`.
    ///
    /// The magic bytes are written last, so an interrupted write never
    /// leaves a file that looks valid.
    pub fn write_file(&self, compression: Compression, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path.as_ref())?;

        file.set_len(0)?;
        file.seek(SeekFrom::Start(0))?;
        file.write_all(&[0, 0, 0, 0])?;

        self.write_impl(false, compression, &mut file)?;

        // Write magic last
        file.seek(SeekFrom::Start(0))?;
        file.write_all(&MAGIC)?;
        file.sync_all()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Snapshot {
        Snapshot {
            kind: ModelKind::Reduced,
            config: SimulationConfig::new(3, -1_000_000, 4).with_frontier(FrontierPolicy::Fixed),
            step: 300,
            side: 2,
            origin: 0,
            bounds_reached: true,
            discarded: -17,
            values: vec![0, -1, 1, i64::MIN],
        }
    }

    #[test]
    fn zigzag_is_reversible_at_the_extremes() {
        for v in [0, 1, -1, 63, -64, i64::MAX, i64::MIN] {
            assert_eq!(unzigzag(zigzag(v)), v);
        }
        assert_eq!(zigzag(-1), 1);
        assert_eq!(zigzag(1), 2);
    }

    #[test]
    fn written_snapshots_read_back() {
        for compression in [Compression::None, Compression::Gzip] {
            let mut bytes = Vec::new();
            sample().write(compression, &mut bytes).unwrap();

            assert_eq!(bytes[..4], MAGIC);
            assert_eq!(bytes[4], 1);
            assert_eq!(bytes[5], u8::from(compression));

            assert_eq!(Snapshot::read(bytes.as_slice()).unwrap(), sample());
        }
    }

    #[test]
    fn bad_magic() {
        let mut bytes = Vec::new();
        sample().write(Compression::None, &mut bytes).unwrap();
        bytes[0] ^= 0xFF;

        assert!(matches!(
            Snapshot::read(bytes.as_slice()),
            Err(Error::InvalidSnapshot(_))
        ));
    }

    #[test]
    fn unknown_header_bytes() {
        let mut bytes = Vec::new();
        sample().write(Compression::None, &mut bytes).unwrap();

        let mut bad_kind = bytes.clone();
        bad_kind[4] = 9;
        assert!(matches!(
            Snapshot::read(bad_kind.as_slice()),
            Err(Error::InvalidSnapshot(_))
        ));

        bytes[5] = 9;
        assert!(matches!(
            Snapshot::read(bytes.as_slice()),
            Err(Error::InvalidSnapshot(_))
        ));
    }

    #[test]
    fn truncated_body() {
        let mut bytes = Vec::new();
        sample().write(Compression::None, &mut bytes).unwrap();
        bytes.truncate(bytes.len() - 3);

        assert!(Snapshot::read(bytes.as_slice()).is_err());
    }

    #[test]
    fn file_round_trip() {
        let path = std::env::temp_dir().join(format!("sivsim-snapshot-{}.siv", std::process::id()));

        sample().write_file(Compression::Gzip, &path).unwrap();
        let read = Snapshot::read_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(read, sample());
    }
}

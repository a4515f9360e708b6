//! Optional gzip framing of the snapshot body.
//!
//! The header of a `.siv` file is never compressed: only the varints that
//! follow the compression byte pass through these wrappers.

use std::io::{self, BufReader, Read, Write};

use flate2::{read::GzDecoder, write::GzEncoder};

/// How the body of a snapshot is stored, as recorded in its header byte.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Compression {
    /// Raw varints.
    None,
    #[default]
    Gzip,
}

impl From<Compression> for u8 {
    fn from(value: Compression) -> Self {
        match value {
            Compression::None => 0,
            Compression::Gzip => 1,
        }
    }
}

impl TryFrom<u8> for Compression {
    /// The unknown header byte.
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::None),
            1 => Ok(Self::Gzip),
            other => Err(other),
        }
    }
}

/// Reads a snapshot body, inflating it if the header asked for gzip.
pub enum Reader<T: Read> {
    Raw(BufReader<T>),
    Gzip(GzDecoder<BufReader<T>>),
}

impl<T: Read> Reader<T> {
    pub fn new(compression: Compression, source: T) -> Self {
        let source = BufReader::new(source);
        match compression {
            Compression::None => Self::Raw(source),
            Compression::Gzip => Self::Gzip(GzDecoder::new(source)),
        }
    }

    fn inner(&mut self) -> &mut dyn Read {
        match self {
            Self::Raw(r) => r,
            Self::Gzip(r) => r,
        }
    }
}

impl<T: Read> Read for Reader<T> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner().read(buf)
    }
}

/// Writes a snapshot body, deflating it if gzip was requested.
///
/// [`Writer::finish`] must be called once the last value is written, or a
/// gzip body is left without its trailer.
pub enum Writer<T: Write> {
    Raw(T),
    Gzip(GzEncoder<T>),
}

impl<T: Write> Writer<T> {
    pub fn new(compression: Compression, sink: T) -> Self {
        match compression {
            Compression::None => Self::Raw(sink),
            Compression::Gzip => Self::Gzip(GzEncoder::new(sink, flate2::Compression::default())),
        }
    }

    /// Flush the body and hand back the underlying sink.
    pub fn finish(self) -> io::Result<T> {
        match self {
            Self::Raw(mut sink) => {
                sink.flush()?;
                Ok(sink)
            }
            Self::Gzip(encoder) => encoder.finish(),
        }
    }

    fn inner(&mut self) -> &mut dyn Write {
        match self {
            Self::Raw(w) => w,
            Self::Gzip(w) => w,
        }
    }
}

impl<T: Write> Write for Writer<T> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner().flush()
    }
}

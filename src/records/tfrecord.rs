//! TFRecord framing.
//!
//! Each record on disk is
//!
//! ```text
//! u64  length            little endian
//! u32  masked_crc(length bytes)
//! [u8] data
//! u32  masked_crc(data)
//! ```

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::dataloader::error::DatasetError;

const MASK_DELTA: u32 = 0xa282_ead8;

pub fn masked_crc(data: &[u8]) -> u32 {
    let crc = crc32c::crc32c(data);
    ((crc >> 15) | (crc << 17)).wrapping_add(MASK_DELTA)
}

pub struct RecordWriter<W: Write> {
    inner: W,
}

impl RecordWriter<BufWriter<File>> {
    /// Creates (or truncates) the file at `path`.
    pub fn create(path: &Path) -> Result<Self, DatasetError> {
        Ok(RecordWriter::new(BufWriter::new(File::create(path)?)))
    }
}

impl<W: Write> RecordWriter<W> {
    pub fn new(inner: W) -> Self {
        RecordWriter { inner }
    }

    pub fn write_record(&mut self, data: &[u8]) -> io::Result<()> {
        let len = data.len() as u64;
        let len_bytes = len.to_le_bytes();

        self.inner.write_u64::<LittleEndian>(len)?;
        self.inner.write_u32::<LittleEndian>(masked_crc(&len_bytes))?;
        self.inner.write_all(data)?;
        self.inner.write_u32::<LittleEndian>(masked_crc(data))?;
        Ok(())
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

pub struct RecordReader<R: Read> {
    inner: R,
    offset: u64,
    failed: bool,
}

impl RecordReader<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self, DatasetError> {
        let file = File::open(path).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => DatasetError::ShardNotFound(path.to_owned()),
            _ => DatasetError::IoError(err),
        })?;
        Ok(RecordReader::new(BufReader::new(file)))
    }
}

impl<R: Read> RecordReader<R> {
    pub fn new(inner: R) -> Self {
        RecordReader {
            inner,
            offset: 0,
            failed: false,
        }
    }

    /// Reads the next record, `Ok(None)` on a clean end of input.
    pub fn read_record(&mut self) -> Result<Option<Vec<u8>>, DatasetError> {
        let start = self.offset;

        let mut len_bytes = [0u8; 8];
        match read_full(&mut self.inner, &mut len_bytes)? {
            0 => return Ok(None),
            8 => {}
            _ => return Err(DatasetError::TruncatedRecord(start)),
        }

        let len_crc = self.read_u32(start)?;
        if len_crc != masked_crc(&len_bytes) {
            return Err(DatasetError::Checksum {
                what: "length",
                offset: start,
            });
        }

        let len = u64::from_le_bytes(len_bytes);
        let mut data = Vec::new();
        let read = (&mut self.inner).take(len).read_to_end(&mut data)?;
        if read as u64 != len {
            return Err(DatasetError::TruncatedRecord(start));
        }

        let data_crc = self.read_u32(start)?;
        if data_crc != masked_crc(&data) {
            return Err(DatasetError::Checksum {
                what: "data",
                offset: start,
            });
        }

        self.offset = start + 8 + 4 + len + 4;
        Ok(Some(data))
    }

    fn read_u32(&mut self, start: u64) -> Result<u32, DatasetError> {
        self.inner
            .read_u32::<LittleEndian>()
            .map_err(|err| match err.kind() {
                io::ErrorKind::UnexpectedEof => DatasetError::TruncatedRecord(start),
                _ => DatasetError::IoError(err),
            })
    }
}

impl<R: Read> Iterator for RecordReader<R> {
    type Item = Result<Vec<u8>, DatasetError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let result = self.read_record().transpose();
        if matches!(result, Some(Err(_))) {
            self.failed = true;
        }
        result
    }
}

// Like read_exact but reports how many bytes were available before EOF
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
    Ok(filled)
}

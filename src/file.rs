//! Plaintext and gzip-compressed table input.
//!
//! Recombination maps are often distributed gzip-compressed, so [`InputFile`]
//! sniffs the gzip magic number and decompresses transparently. It also
//! builds the tab-delimited [`csv::Reader`] used for the boundaries and
//! samples tables.
//!
use csv::ReaderBuilder;
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};

use crate::error::HaploblockError;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Check if a file is gzipped by looking for the magic numbers.
///
/// Files shorter than the magic number are treated as plaintext.
fn is_gzipped_file(file: &mut File) -> io::Result<bool> {
    let mut buffer = [0; 2];
    let is_gzipped = match file.read_exact(&mut buffer) {
        Ok(()) => buffer == GZIP_MAGIC,
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => false,
        Err(e) => return Err(e),
    };
    Ok(is_gzipped)
}

/// An input table, possibly gzip-compressed.
pub struct InputFile {
    pub filepath: String,
}

impl InputFile {
    pub fn new(filepath: &str) -> Self {
        Self {
            filepath: filepath.to_string(),
        }
    }

    /// Opens the file and returns a buffered reader, decompressing if needed.
    ///
    /// Failing to open or read the file (e.g. a directory) is reported as
    /// [`HaploblockError::ResourceUnavailable`].
    pub fn reader(&self) -> Result<BufReader<Box<dyn Read>>, HaploblockError> {
        let unavailable = |source: io::Error| HaploblockError::ResourceUnavailable {
            path: self.filepath.clone(),
            source,
        };
        let mut sniff = File::open(&self.filepath).map_err(unavailable)?;
        let is_gzipped = is_gzipped_file(&mut sniff).map_err(unavailable)?;

        let file = File::open(&self.filepath).map_err(unavailable)?;
        let reader: Box<dyn Read> = if is_gzipped {
            Box::new(GzDecoder::new(file))
        } else {
            Box::new(file)
        };
        Ok(BufReader::new(reader))
    }

    /// Checks if the first line of the file starts with the expected header.
    pub fn has_header(&self, expect: &str) -> Result<bool, HaploblockError> {
        let mut buf_reader = self.reader()?;
        let mut first_line = String::new();
        buf_reader.read_line(&mut first_line)?;
        Ok(first_line.starts_with(expect))
    }

    /// Fails with [`HaploblockError::MissingHeader`] unless the first line
    /// starts with `expect`.
    pub fn require_header(&self, expect: &str) -> Result<(), HaploblockError> {
        if self.has_header(expect)? {
            Ok(())
        } else {
            Err(HaploblockError::MissingHeader {
                path: self.filepath.clone(),
                expected: expect.to_string(),
            })
        }
    }

    /// A tab-delimited record reader over this file.
    ///
    /// Records of any width are returned so callers can report the field
    /// count of a bad line themselves.
    pub fn tsv_reader(
        &self,
        has_headers: bool,
    ) -> Result<csv::Reader<BufReader<Box<dyn Read>>>, HaploblockError> {
        let buf_reader = self.reader()?;
        Ok(ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(has_headers)
            .flexible(true)
            .quoting(false)
            .from_reader(buf_reader))
    }
}

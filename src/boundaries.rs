use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;

use crate::error::{record_line, HaploblockError};
use crate::file::InputFile;
use crate::recombination::Position;

/// Header of the boundaries table.
pub const BOUNDARIES_HEADER: &str = "START\tEND";

/// The span between two consecutive recombination hotspots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HaploblockBoundary {
    #[serde(rename = "START")]
    pub start: Position,
    #[serde(rename = "END")]
    pub end: Position,
}

impl HaploblockBoundary {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// The width of the block in basepairs.
    pub fn width(&self) -> Position {
        self.end.saturating_sub(self.start)
    }
}

impl fmt::Display for HaploblockBoundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Write haploblock boundaries as a two-column TSV with a `START\tEND` header.
pub fn write_boundaries<W: Write>(
    writer: W,
    boundaries: &[HaploblockBoundary],
) -> Result<(), HaploblockError> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .from_writer(writer);
    if boundaries.is_empty() {
        // serde only emits the header alongside the first record
        wtr.write_record(BOUNDARIES_HEADER.split('\t'))?;
    }
    for boundary in boundaries {
        wtr.serialize(boundary)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Read a boundaries table written by [`write_boundaries`].
///
/// The first line must be the `START\tEND` header, and every other line
/// exactly two tab-separated positions.
pub fn read_boundaries(filepath: &str) -> Result<Vec<HaploblockBoundary>, HaploblockError> {
    let input_file = InputFile::new(filepath);
    input_file.require_header("START\t")?;

    let mut rdr = input_file.tsv_reader(true)?;
    let mut boundaries = Vec::new();
    for result in rdr.records() {
        let record = result?;
        if record.len() != 2 {
            return Err(HaploblockError::MalformedRecord {
                path: filepath.to_string(),
                line: record_line(&record),
                expected: 2,
                found: record.len(),
            });
        }
        let boundary: HaploblockBoundary =
            record
                .deserialize(None)
                .map_err(|e| HaploblockError::ParseError {
                    path: filepath.to_string(),
                    line: record_line(&record),
                    message: e.to_string(),
                })?;
        boundaries.push(boundary);
    }
    Ok(boundaries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_write_boundaries() {
        let boundaries = vec![
            HaploblockBoundary::new(10000, 30000),
            HaploblockBoundary::new(30000, 40000),
        ];
        let mut buf = Vec::new();
        write_boundaries(&mut buf, &boundaries).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "START\tEND\n10000\t30000\n30000\t40000\n"
        );
    }

    #[test]
    fn test_write_no_boundaries_keeps_header() {
        let mut buf = Vec::new();
        write_boundaries(&mut buf, &[]).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "START\tEND\n");
    }

    #[test]
    fn test_read_written_boundaries() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("haploblock_boundaries.tsv");
        let boundaries = vec![
            HaploblockBoundary::new(180000, 330000),
            HaploblockBoundary::new(330000, 400000),
        ];
        write_boundaries(std::fs::File::create(&path).unwrap(), &boundaries).unwrap();
        assert_eq!(read_boundaries(path.to_str().unwrap()).unwrap(), boundaries);
    }

    #[test]
    fn test_read_headerless() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("haploblock_boundaries.tsv");
        std::fs::write(&path, "100\t200\n").unwrap();
        assert!(matches!(
            read_boundaries(path.to_str().unwrap()),
            Err(HaploblockError::MissingHeader { .. })
        ));
    }

    #[test]
    fn test_read_bad_line() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("haploblock_boundaries.tsv");
        std::fs::write(&path, "START\tEND\n100\t200\n300\t400\t500\n").unwrap();
        match read_boundaries(path.to_str().unwrap()) {
            Err(HaploblockError::MalformedRecord { line, found, .. }) => {
                assert_eq!(line, 3);
                assert_eq!(found, 3);
            }
            other => panic!("expected MalformedRecord, got {:?}", other),
        }

        std::fs::write(&path, "START\tEND\n100\tabc\n").unwrap();
        assert!(matches!(
            read_boundaries(path.to_str().unwrap()),
            Err(HaploblockError::ParseError { line: 2, .. })
        ));
    }

    #[test]
    fn test_display() {
        let boundary = HaploblockBoundary::new(100, 250);
        assert_eq!(boundary.to_string(), "100-250");
        assert_eq!(boundary.width(), 150);
    }
}

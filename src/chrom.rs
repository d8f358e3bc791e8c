//! Chromosome label conventions.
//!
//! Recombination maps and reference FASTAs label chromosomes `chr6`, while
//! the 1000 Genomes VCFs use the bare `6`. These helpers convert between the
//! two, and read the `chr_map` file handed to `bcftools annotate --rename-chrs`.

use indexmap::IndexMap;
use std::io::BufRead;

use crate::error::HaploblockError;
use crate::file::InputFile;

const CHR_PREFIX: &str = "chr";

/// Return the `chr`-prefixed form of a chromosome label, e.g. `6` -> `chr6`.
pub fn with_chr_prefix(chrom: &str) -> String {
    if chrom.starts_with(CHR_PREFIX) {
        chrom.to_string()
    } else {
        format!("{}{}", CHR_PREFIX, chrom)
    }
}

/// Return the bare form of a chromosome label, e.g. `chr6` -> `6`.
pub fn strip_chr_prefix(chrom: &str) -> &str {
    chrom.strip_prefix(CHR_PREFIX).unwrap_or(chrom)
}

/// Read a `chr_map` file of whitespace-separated `old new` pairs (e.g. `6 chr6`).
pub fn read_chrom_map(filepath: &str) -> Result<IndexMap<String, String>, HaploblockError> {
    let reader = InputFile::new(filepath).reader()?;
    let mut chrom_map = IndexMap::new();

    for (i, result) in reader.lines().enumerate() {
        let line = result?;
        let fields: Vec<&str> = line.split_whitespace().collect();
        match fields.as_slice() {
            [] => continue,
            [old, new] => {
                chrom_map.insert(old.to_string(), new.to_string());
            }
            _ => {
                return Err(HaploblockError::MalformedRecord {
                    path: filepath.to_string(),
                    line: i as u64 + 1,
                    expected: 2,
                    found: fields.len(),
                })
            }
        }
    }
    Ok(chrom_map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_prefix_round_trip() {
        assert_eq!(with_chr_prefix("6"), "chr6");
        assert_eq!(with_chr_prefix("chr6"), "chr6");
        assert_eq!(strip_chr_prefix("chr6"), "6");
        assert_eq!(strip_chr_prefix("6"), "6");
        assert_eq!(strip_chr_prefix("chrX"), "X");
    }

    #[test]
    fn test_read_chrom_map() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("chr_map.txt");
        std::fs::write(&path, "6 chr6\n7\tchr7\n\n").unwrap();
        let map = read_chrom_map(path.to_str().unwrap()).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("6").map(String::as_str), Some("chr6"));
        assert_eq!(map.get_index(1), Some((&"7".to_string(), &"chr7".to_string())));
    }

    #[test]
    fn test_read_chrom_map_bad_line() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("chr_map.txt");
        std::fs::write(&path, "6 chr6\n7 chr7 extra\n").unwrap();
        match read_chrom_map(path.to_str().unwrap()) {
            Err(HaploblockError::MalformedRecord { line, found, .. }) => {
                assert_eq!(line, 2);
                assert_eq!(found, 3);
            }
            other => panic!("expected MalformedRecord, got {:?}", other),
        }
    }
}

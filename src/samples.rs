//! Population sample lists in the 1000 Genomes portal format.
//!
//! The table has a header line and nine tab-separated columns: Sample name,
//! Sex, Biosample ID, Population code, Population name, Superpopulation code,
//! Superpopulation name, Population elastic ID, Data collections. Only the
//! sample name is used.

use crate::error::{record_line, HaploblockError};
use crate::file::InputFile;

/// An opaque sample identifier, as it appears in the VCF header.
pub type SampleId = String;

const SAMPLES_HEADER: &str = "Sample name\t";
const SAMPLES_COLUMNS: usize = 9;

/// Read the sample names from a 1000 Genomes samples table, in file order.
pub fn read_samples(filepath: &str) -> Result<Vec<SampleId>, HaploblockError> {
    let input_file = InputFile::new(filepath);
    input_file.require_header(SAMPLES_HEADER)?;

    let mut rdr = input_file.tsv_reader(true)?;
    let mut samples = Vec::new();
    for result in rdr.records() {
        let record = result?;
        if record.len() != SAMPLES_COLUMNS {
            return Err(HaploblockError::MalformedRecord {
                path: filepath.to_string(),
                line: record_line(&record),
                expected: SAMPLES_COLUMNS,
                found: record.len(),
            });
        }
        samples.push(record[0].to_string());
    }
    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const HEADER: &str = "Sample name\tSex\tBiosample ID\tPopulation code\tPopulation name\t\
        Superpopulation code\tSuperpopulation name\tPopulation elastic ID\tData collections\n";

    #[test]
    fn test_read_samples() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("igsr_samples.tsv");
        let contents = format!(
            "{}{}{}",
            HEADER,
            "HG00096\tmale\tSAME123\tGBR\tBritish\tEUR\tEuropean Ancestry\tGBR\t1000 Genomes on GRCh38\n",
            "HG00097\tfemale\tSAME124\tGBR\tBritish\tEUR\tEuropean Ancestry\tGBR\t1000 Genomes on GRCh38\n",
        );
        std::fs::write(&path, contents).unwrap();
        let samples = read_samples(path.to_str().unwrap()).unwrap();
        assert_eq!(samples, vec!["HG00096", "HG00097"]);
    }

    #[test]
    fn test_bad_samples_table() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("igsr_samples.tsv");

        std::fs::write(&path, "HG00096\tmale\n").unwrap();
        assert!(matches!(
            read_samples(path.to_str().unwrap()),
            Err(HaploblockError::MissingHeader { .. })
        ));

        std::fs::write(&path, format!("{}HG00096\tmale\tSAME123\n", HEADER)).unwrap();
        assert!(matches!(
            read_samples(path.to_str().unwrap()),
            Err(HaploblockError::MalformedRecord {
                line: 2,
                expected: 9,
                found: 3,
                ..
            })
        ));
    }
}

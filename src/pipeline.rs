//! Per-haploblock region extraction and consensus sequence generation.
//!
//! For every haploblock boundary the pipeline cuts the matching region out
//! of a phased VCF and a reference FASTA, and optionally builds a consensus
//! sequence for each sample, all through `bcftools`, `bgzip` and `samtools`.
//! Output file names are a pure function of the chromosome, the boundary and
//! the sample (see [`RegionPaths`]), so no two steps ever write the same file.
//!
//! Every step goes through [`RegionPipeline::step`], and the first failing
//! command aborts the whole run.

use log::{info, warn};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::boundaries::HaploblockBoundary;
use crate::chrom::{read_chrom_map, strip_chr_prefix, with_chr_prefix};
use crate::error::HaploblockError;
use crate::runner::{Invocation, ProcessRunner};
use crate::samples::SampleId;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Table(#[from] HaploblockError),
    #[error("File {0} does not exist")]
    MissingInput(String),
    #[error("Cannot run '{command}': {source}")]
    CommandSpawn {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("Command exited with status {code}: {command}")]
    CommandFailed { command: String, code: i32 },
    #[error("Command terminated by a signal: {0}")]
    CommandTerminated(String),
    #[error("IO error: {0}")]
    IOError(#[from] io::Error),
}

/// Inputs and output location of a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Phased, bgzipped and indexed VCF with bare chromosome names (`6`).
    pub vcf: PathBuf,
    /// Reference FASTA (optionally bgzipped) with `chr`-prefixed names.
    pub reference: PathBuf,
    /// `bcftools annotate --rename-chrs` map, e.g. `6 chr6`. If unset the
    /// region VCFs are used with their original chromosome names.
    pub chrom_map: Option<PathBuf>,
    pub chrom: String,
    pub out_dir: PathBuf,
}

/// Fail with [`PipelineError::MissingInput`] if `path` does not exist.
pub fn require_input(path: &Path) -> Result<(), PipelineError> {
    if path.exists() {
        Ok(())
    } else {
        Err(PipelineError::MissingInput(arg(path)))
    }
}

fn arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Append `.gz`, as `bgzip` does to the file it compresses.
fn bgzipped(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".gz");
    PathBuf::from(name)
}

/// The output paths for one haploblock on one chromosome.
#[derive(Debug, Clone)]
pub struct RegionPaths {
    out_dir: PathBuf,
    chrom: String,
    pub boundary: HaploblockBoundary,
}

impl RegionPaths {
    pub fn new(out_dir: &Path, chrom: &str, boundary: HaploblockBoundary) -> Self {
        Self {
            out_dir: out_dir.to_path_buf(),
            chrom: strip_chr_prefix(chrom).to_string(),
            boundary,
        }
    }

    /// `chr{N}_region_{start}-{end}`
    fn stem(&self) -> String {
        format!(
            "{}_region_{}-{}",
            with_chr_prefix(&self.chrom),
            self.boundary.start,
            self.boundary.end
        )
    }

    fn join(&self, name: String) -> PathBuf {
        self.out_dir.join(name)
    }

    /// The region as the VCF names it, e.g. `6:100-200`.
    pub fn vcf_region(&self) -> String {
        format!("{}:{}", self.chrom, self.boundary)
    }

    /// The region as the reference names it, e.g. `chr6:100-200`.
    pub fn fasta_region(&self) -> String {
        format!("{}:{}", with_chr_prefix(&self.chrom), self.boundary)
    }

    /// Region VCF with the VCF's own chromosome names.
    pub fn region_vcf(&self) -> PathBuf {
        self.join(format!(
            "{}_region_{}-{}.vcf.gz",
            self.chrom, self.boundary.start, self.boundary.end
        ))
    }

    /// Uncompressed region VCF after chromosome renaming.
    pub fn renamed_vcf(&self) -> PathBuf {
        self.join(format!("{}.vcf", self.stem()))
    }

    pub fn renamed_vcf_index(&self) -> PathBuf {
        self.join(format!("{}.vcf.gz.csi", self.stem()))
    }

    pub fn region_fasta(&self) -> PathBuf {
        self.join(format!("{}.fa", self.stem()))
    }

    pub fn sample_vcf(&self, sample: &str) -> PathBuf {
        self.join(format!("{}_{}.vcf.gz", sample, self.stem()))
    }

    /// Uncompressed consensus FASTA; `bgzip` turns it into `<path>.gz`.
    pub fn consensus_fasta(&self, sample: &str) -> PathBuf {
        self.join(format!("{}_{}.fa", sample, self.stem()))
    }
}

/// The files produced for one haploblock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionOutput {
    pub boundary: HaploblockBoundary,
    pub vcf: PathBuf,
    pub fasta: PathBuf,
    /// Bgzipped consensus FASTA per sample, in sample order.
    pub consensus: Vec<(SampleId, PathBuf)>,
}

pub struct RegionPipeline<R: ProcessRunner> {
    pub config: PipelineConfig,
    runner: R,
}

impl<R: ProcessRunner> RegionPipeline<R> {
    pub fn new(config: PipelineConfig, runner: R) -> Self {
        Self { config, runner }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    fn paths(&self, boundary: HaploblockBoundary) -> RegionPaths {
        RegionPaths::new(&self.config.out_dir, &self.config.chrom, boundary)
    }

    /// Run one external command; any failure ends the pipeline.
    fn step<I, S>(&self, program: &str, args: I, stdout: Option<&Path>) -> Result<(), PipelineError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut invocation = Invocation::new(program, args);
        if let Some(path) = stdout {
            invocation = invocation.stdout_to(path);
        }
        self.runner.run(&invocation)?;
        Ok(())
    }

    /// Check all inputs exist and create the output directory.
    pub fn validate(&self) -> Result<(), PipelineError> {
        let mut inputs = vec![&self.config.vcf, &self.config.reference];
        inputs.extend(self.config.chrom_map.as_ref());
        for input in inputs {
            require_input(input)?;
        }

        if let Some(chrom_map) = &self.config.chrom_map {
            let bare = strip_chr_prefix(&self.config.chrom);
            let chrom_map = read_chrom_map(&arg(chrom_map))?;
            match chrom_map.get(bare) {
                Some(renamed) if *renamed == with_chr_prefix(bare) => {}
                Some(renamed) => warn!(
                    "chr_map renames {} to {}, but the reference uses {}",
                    bare,
                    renamed,
                    with_chr_prefix(bare)
                ),
                None => warn!("chr_map has no entry for chromosome {}", bare),
            }
        }

        std::fs::create_dir_all(&self.config.out_dir)?;
        Ok(())
    }

    /// Index the reference once, so each region lookup can reuse it.
    pub fn index_reference(&self) -> Result<(), PipelineError> {
        self.step("samtools", ["faidx".to_string(), arg(&self.config.reference)], None)
    }

    /// Cut the haploblock out of the VCF and index it.
    pub fn extract_region_vcf(&self, paths: &RegionPaths) -> Result<PathBuf, PipelineError> {
        let region_vcf = paths.region_vcf();
        self.step(
            "bcftools",
            [
                "view".to_string(),
                "-r".to_string(),
                paths.vcf_region(),
                arg(&self.config.vcf),
                "-o".to_string(),
                arg(&region_vcf),
            ],
            None,
        )?;
        self.step("bcftools", ["index".to_string(), arg(&region_vcf)], None)?;
        Ok(region_vcf)
    }

    /// Rename the region VCF's chromosomes to match the reference, then
    /// bgzip and index it.
    pub fn rename_chromosomes(
        &self,
        paths: &RegionPaths,
        region_vcf: &Path,
        chrom_map: &Path,
    ) -> Result<PathBuf, PipelineError> {
        let renamed = paths.renamed_vcf();
        self.step(
            "bcftools",
            [
                "annotate".to_string(),
                "--rename-chrs".to_string(),
                arg(chrom_map),
                arg(region_vcf),
            ],
            Some(&renamed),
        )?;
        self.step("bgzip", ["-f".to_string(), arg(&renamed)], None)?;

        let renamed_bgzip = bgzipped(&renamed);
        self.step(
            "bcftools",
            [
                "index".to_string(),
                "-c".to_string(),
                "-o".to_string(),
                arg(&paths.renamed_vcf_index()),
                arg(&renamed_bgzip),
            ],
            None,
        )?;
        Ok(renamed_bgzip)
    }

    /// Cut the haploblock out of the (already indexed) reference.
    pub fn extract_region_fasta(&self, paths: &RegionPaths) -> Result<PathBuf, PipelineError> {
        let region_fasta = paths.region_fasta();
        self.step(
            "samtools",
            ["faidx".to_string(), arg(&self.config.reference), paths.fasta_region()],
            Some(&region_fasta),
        )?;
        Ok(region_fasta)
    }

    /// Keep a single sample of a region VCF, and index it.
    pub fn extract_sample_vcf(
        &self,
        paths: &RegionPaths,
        region_vcf: &Path,
        sample: &str,
    ) -> Result<PathBuf, PipelineError> {
        let sample_vcf = paths.sample_vcf(sample);
        self.step(
            "bcftools",
            [
                "view".to_string(),
                "-s".to_string(),
                sample.to_string(),
                "-o".to_string(),
                arg(&sample_vcf),
                arg(region_vcf),
            ],
            None,
        )?;
        self.step("bcftools", ["index".to_string(), arg(&sample_vcf)], None)?;
        Ok(sample_vcf)
    }

    /// Apply a sample's variants to the region reference and bgzip the result.
    pub fn generate_consensus(
        &self,
        paths: &RegionPaths,
        region_fasta: &Path,
        sample_vcf: &Path,
        sample: &str,
    ) -> Result<PathBuf, PipelineError> {
        let consensus = paths.consensus_fasta(sample);
        self.step(
            "bcftools",
            [
                "consensus".to_string(),
                "-f".to_string(),
                arg(region_fasta),
                arg(sample_vcf),
            ],
            Some(&consensus),
        )?;
        self.step("bgzip", ["-f".to_string(), arg(&consensus)], None)?;
        Ok(bgzipped(&consensus))
    }

    /// Extract the VCF and reference region of every haploblock.
    pub fn split_regions(
        &self,
        boundaries: &[HaploblockBoundary],
    ) -> Result<Vec<RegionOutput>, PipelineError> {
        self.validate()?;
        self.index_reference()?;

        let mut outputs = Vec::with_capacity(boundaries.len());
        for &boundary in boundaries {
            let paths = self.paths(boundary);
            info!(
                "Extracting VCF and reference for haploblock {} ({} bp)",
                boundary,
                boundary.width()
            );
            let vcf = self.extract_region_vcf(&paths)?;
            let fasta = self.extract_region_fasta(&paths)?;
            outputs.push(RegionOutput {
                boundary,
                vcf,
                fasta,
                consensus: Vec::new(),
            });
        }
        Ok(outputs)
    }

    /// Extract every haploblock and build a consensus sequence per sample.
    pub fn phased_sequences(
        &self,
        boundaries: &[HaploblockBoundary],
        samples: &[SampleId],
    ) -> Result<Vec<RegionOutput>, PipelineError> {
        self.validate()?;
        self.index_reference()?;

        let mut outputs = Vec::with_capacity(boundaries.len());
        for &boundary in boundaries {
            let paths = self.paths(boundary);

            info!(
                "Generating phased VCF for haploblock {} ({} bp)",
                boundary,
                boundary.width()
            );
            let region_vcf = self.extract_region_vcf(&paths)?;
            let vcf = match &self.config.chrom_map {
                Some(chrom_map) => self.rename_chromosomes(&paths, &region_vcf, chrom_map)?,
                None => region_vcf,
            };

            info!("Generating phased fasta for haploblock {}", boundary);
            let fasta = self.extract_region_fasta(&paths)?;

            let mut consensus = Vec::with_capacity(samples.len());
            for sample in samples {
                info!(
                    "Generating consensus for haploblock {} for sample {}",
                    boundary, sample
                );
                let sample_vcf = self.extract_sample_vcf(&paths, &vcf, sample)?;
                let sample_fasta = self.generate_consensus(&paths, &fasta, &sample_vcf, sample)?;
                consensus.push((sample.clone(), sample_fasta));
            }

            outputs.push(RegionOutput {
                boundary,
                vcf,
                fasta,
                consensus,
            });
        }
        Ok(outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_paths() {
        let paths = RegionPaths::new(
            Path::new("out"),
            "chr6",
            HaploblockBoundary::new(180000, 330000),
        );
        assert_eq!(paths.vcf_region(), "6:180000-330000");
        assert_eq!(paths.fasta_region(), "chr6:180000-330000");
        assert_eq!(paths.region_vcf(), Path::new("out/6_region_180000-330000.vcf.gz"));
        assert_eq!(paths.renamed_vcf(), Path::new("out/chr6_region_180000-330000.vcf"));
        assert_eq!(
            paths.renamed_vcf_index(),
            Path::new("out/chr6_region_180000-330000.vcf.gz.csi")
        );
        assert_eq!(paths.region_fasta(), Path::new("out/chr6_region_180000-330000.fa"));
        assert_eq!(
            paths.sample_vcf("HG00096"),
            Path::new("out/HG00096_chr6_region_180000-330000.vcf.gz")
        );
        assert_eq!(
            bgzipped(&paths.consensus_fasta("HG00096")),
            Path::new("out/HG00096_chr6_region_180000-330000.fa.gz")
        );
    }

    #[test]
    fn test_region_paths_ignore_chrom_prefix() {
        let boundary = HaploblockBoundary::new(1, 2);
        let bare = RegionPaths::new(Path::new("out"), "6", boundary);
        let prefixed = RegionPaths::new(Path::new("out"), "chr6", boundary);
        assert_eq!(bare.region_vcf(), prefixed.region_vcf());
        assert_eq!(bare.sample_vcf("NA12878"), prefixed.sample_vcf("NA12878"));
    }

    #[test]
    fn test_require_input() {
        let dir = tempfile::tempdir().unwrap();
        let samples = dir.path().join("igsr_samples.tsv");
        match require_input(&samples) {
            Err(PipelineError::MissingInput(path)) => assert_eq!(path, arg(&samples)),
            other => panic!("expected MissingInput, got {:?}", other),
        }
        std::fs::write(&samples, "Sample name\n").unwrap();
        assert!(require_input(&samples).is_ok());
    }
}

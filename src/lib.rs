//! Haploblock boundaries from recombination maps, and per-haploblock
//! phased sequences.
//!
//! A *haploblock* is the stretch of a chromosome between two recombination
//! hotspots. [`RateSeries`] reads one chromosome of a recombination map
//! (e.g. the deCODE map of Halldorsson et al. 2019, plain or gzip-compressed),
//! and calls every position whose rate is more than ten times the chromosome
//! average a hotspot. Consecutive hotspots then bound the haploblocks.
//!
//! ```no_run
//! use haploblock::prelude::*;
//! let boundaries = parse_recombination_rates("aau1043_datas3.gz", "6")
//!                      .expect("cannot read recombination map");
//!
//! write_boundaries(std::io::stdout(), &boundaries).expect("cannot write boundaries");
//! ```
//!
//! The boundaries then drive a [`RegionPipeline`], which slices a phased VCF
//! and a reference FASTA into one region per haploblock, and builds a
//! consensus sequence per sample with `bcftools`, `bgzip` and `samtools`:
//!
//! ```no_run
//! use haploblock::prelude::*;
//! let config = PipelineConfig {
//!     vcf: "ALL.chr6.phased.vcf.gz".into(),
//!     reference: "ref_chr6.fa.gz".into(),
//!     chrom_map: Some("chr_map.txt".into()),
//!     chrom: "6".to_string(),
//!     out_dir: "haploblocks".into(),
//! };
//! let boundaries = read_boundaries("haploblock_boundaries.tsv").unwrap();
//! let samples = read_samples("igsr_samples.tsv").unwrap();
//!
//! let pipeline = RegionPipeline::new(config, CommandRunner);
//! pipeline.phased_sequences(&boundaries, &samples).unwrap();
//! ```

pub mod boundaries;
pub mod chrom;
pub mod error;
mod file;
mod numeric;
pub mod pipeline;
pub mod recombination;
pub mod runner;
pub mod samples;

pub use boundaries::{read_boundaries, write_boundaries, HaploblockBoundary};
pub use error::HaploblockError;
pub use pipeline::{PipelineConfig, PipelineError, RegionPipeline};
pub use recombination::{
    detect_boundaries, parse_recombination_rates, PositionOrder, RateSeries,
    HIGH_RATE_MULTIPLIER,
};
pub use runner::{CommandRunner, Invocation, ProcessRunner};
pub use samples::{read_samples, SampleId};

pub mod prelude {
    pub use crate::boundaries::{read_boundaries, write_boundaries, HaploblockBoundary};
    pub use crate::error::HaploblockError;
    pub use crate::pipeline::{PipelineConfig, PipelineError, RegionPipeline};
    pub use crate::recombination::{
        detect_boundaries, parse_recombination_rates, PositionOrder, RateSeries,
    };
    pub use crate::runner::{CommandRunner, Invocation, ProcessRunner};
    pub use crate::samples::{read_samples, SampleId};
}

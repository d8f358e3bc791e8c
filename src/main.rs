use clap::{Parser, Subcommand};
use haploblock::pipeline::require_input;
use haploblock::{
    parse_recombination_rates, read_boundaries, read_samples, write_boundaries, CommandRunner,
    PipelineConfig, PipelineError, RegionPipeline,
};
use log::info;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

const PROGRAM_NAME: &str = "haploblock";

const INFO: &str = "\
haploblock: haploblock boundaries and per-haploblock phased sequences
usage: haploblock [--help] <subcommand>

Subcommands:

  boundaries: detect haploblock boundaries from a recombination map.
  split-vcf: extract the VCF and reference region of each haploblock.
  phased-sequences: per-sample consensus sequences of each haploblock.

";

#[derive(Parser)]
#[clap(name = "haploblock")]
#[clap(about = INFO)]
struct Cli {
    /// More verbose logging (-d for debug, -dd for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    debug: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect haploblock boundaries from a recombination map.
    ///
    /// Positions whose recombination rate is more than 10x the chromosome
    /// average are hotspots; each pair of consecutive hotspots is a boundary.
    /// Writes a TSV with a START/END header to standard out.
    ///
    /// Example:
    ///
    ///  $ haploblock boundaries --recombination_file aau1043_datas3.gz --chr 6 \
    ///      > haploblock_boundaries.tsv
    Boundaries {
        /// recombination map from Halldorsson et al. 2019 (Chr, Begin, End, cMperMb, cM)
        #[arg(long = "recombination_file", required = true)]
        recombination_file: String,
        /// chromosome, e.g. 6 or chr6
        #[arg(long = "chr", required = true)]
        chr: String,
    },
    /// Extract the VCF and reference region of each haploblock.
    SplitVcf {
        /// boundaries TSV written by `haploblock boundaries`
        #[arg(long = "boundaries_file", required = true)]
        boundaries_file: String,
        /// phased VCF (bgzipped and indexed)
        #[arg(long, required = true)]
        vcf: PathBuf,
        /// reference sequence (bgzipped)
        #[arg(long = "ref", required = true)]
        reference: PathBuf,
        /// chromosome, e.g. 6 or chr6
        #[arg(long = "chr", required = true)]
        chr: String,
        /// output directory
        #[arg(long, required = true)]
        out: PathBuf,
    },
    /// Build per-sample consensus sequences for each haploblock.
    PhasedSequences {
        /// boundaries TSV written by `haploblock boundaries`
        #[arg(long = "boundaries_file", required = true)]
        boundaries_file: String,
        /// samples TSV from 1000 Genomes (9 columns, first is the sample name)
        #[arg(long = "samples_file", required = true)]
        samples_file: String,
        /// phased VCF (bgzipped and indexed) from 1000 Genomes
        #[arg(long, required = true)]
        vcf: PathBuf,
        /// reference sequence (bgzipped)
        #[arg(long = "ref", required = true)]
        reference: PathBuf,
        /// chromosome renaming map, one mapping per line, e.g. "6 chr6"
        #[arg(long = "chr_map", required = true)]
        chr_map: PathBuf,
        /// chromosome, e.g. 6 or chr6
        #[arg(long = "chr", required = true)]
        chr: String,
        /// output directory
        #[arg(long, required = true)]
        out: PathBuf,
    },
}

fn setup_logger(debug: u8) {
    let level = match debug {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn boundaries(recombination_file: &str, chr: &str) -> Result<(), PipelineError> {
    info!("Parsing recombination file {}", recombination_file);
    let boundaries = parse_recombination_rates(recombination_file, chr)?;

    info!("Printing {} haploblock boundaries", boundaries.len());
    let stdout = io::stdout();
    let mut writer = io::BufWriter::new(stdout.lock());
    write_boundaries(&mut writer, &boundaries)?;
    writer.flush()?;
    Ok(())
}

fn split_vcf(boundaries_file: &str, config: PipelineConfig) -> Result<(), PipelineError> {
    require_input(Path::new(boundaries_file))?;
    let boundaries = read_boundaries(boundaries_file)?;
    info!("Found {} haploblock boundaries", boundaries.len());

    let pipeline = RegionPipeline::new(config, CommandRunner);
    let outputs = pipeline.split_regions(&boundaries)?;
    info!("Extracted {} haploblock regions", outputs.len());
    Ok(())
}

fn phased_sequences(
    boundaries_file: &str,
    samples_file: &str,
    config: PipelineConfig,
) -> Result<(), PipelineError> {
    require_input(Path::new(boundaries_file))?;
    require_input(Path::new(samples_file))?;
    let boundaries = read_boundaries(boundaries_file)?;
    info!("Found {} haploblock boundaries", boundaries.len());

    let samples = read_samples(samples_file)?;
    info!("Found {} samples", samples.len());

    let pipeline = RegionPipeline::new(config, CommandRunner);
    let outputs = pipeline.phased_sequences(&boundaries, &samples)?;
    let sequences: usize = outputs.iter().map(|output| output.consensus.len()).sum();
    info!(
        "Generated {} consensus sequences over {} haploblocks",
        sequences,
        outputs.len()
    );
    Ok(())
}

fn run() -> Result<(), PipelineError> {
    let cli = Cli::parse();
    setup_logger(cli.debug);
    match cli.command {
        Some(Commands::Boundaries {
            recombination_file,
            chr,
        }) => boundaries(&recombination_file, &chr),
        Some(Commands::SplitVcf {
            boundaries_file,
            vcf,
            reference,
            chr,
            out,
        }) => split_vcf(
            &boundaries_file,
            PipelineConfig {
                vcf,
                reference,
                chrom_map: None,
                chrom: chr,
                out_dir: out,
            },
        ),
        Some(Commands::PhasedSequences {
            boundaries_file,
            samples_file,
            vcf,
            reference,
            chr_map,
            chr,
            out,
        }) => phased_sequences(
            &boundaries_file,
            &samples_file,
            PipelineConfig {
                vcf,
                reference,
                chrom_map: Some(chr_map),
                chrom: chr,
                out_dir: out,
            },
        ),
        None => {
            println!("{}\n", INFO);
            std::process::exit(1);
        }
    }
}

fn main() {
    if let Err(e) = run() {
        eprintln!("ERROR in {} : {}", PROGRAM_NAME, e);
        std::process::exit(1);
    }
}

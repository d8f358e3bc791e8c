use log::{info, warn};

use crate::boundaries::HaploblockBoundary;
use crate::chrom::with_chr_prefix;
use crate::error::{record_line, HaploblockError};
use crate::file::InputFile;
use crate::numeric::mean;

/// The float type for recombination rates.
pub type RateFloat = f64;

/// The integer type for genomic positions.
pub type Position = u64;

/// A position is a recombination hotspot when its rate is strictly greater
/// than this multiple of the chromosome-wide average rate.
pub const HIGH_RATE_MULTIPLIER: RateFloat = 10.0;

/// Number of tab-separated columns in a recombination table:
/// Chr, Begin, End, cMperMb, cM.
const RECOMBINATION_COLUMNS: usize = 5;

/// One line of a recombination-rate table.
#[derive(Debug, Clone, PartialEq)]
pub struct RecombinationRecord {
    pub chrom: String,
    /// Start of the interval ("Begin"), used as the marker position.
    pub position: Position,
    /// End of the interval, if it parses; only Begin and the rate are required.
    pub end: Option<Position>,
    /// Rate in cM/Mb.
    pub rate: RateFloat,
    /// Cumulative map position in cM, if it parses.
    pub cumulative: Option<RateFloat>,
}

/// How to treat a series whose positions are not strictly ascending.
///
/// Boundary pairing relies on adjacency, so an unsorted series silently
/// produces wrong intervals under [`PositionOrder::AssumeSorted`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PositionOrder {
    /// Use file order as-is; a warning is logged if it is not ascending.
    #[default]
    AssumeSorted,
    /// Fail with [`HaploblockError::UnsortedPositions`].
    RequireSorted,
    /// Stable-sort records by position.
    Sort,
}

/// The recombination records for a single chromosome, in file order.
#[derive(Debug, Clone, Default)]
pub struct RateSeries {
    pub chrom: String,
    pub records: Vec<RecombinationRecord>,
}

impl RateSeries {
    pub fn new(chrom: &str) -> Self {
        Self {
            chrom: chrom.to_string(),
            records: Vec::new(),
        }
    }

    /// Read the records for one chromosome from a recombination table.
    ///
    /// The table is the format of the deCODE map of Halldorsson et al. (2019),
    /// plain or gzip-compressed:
    ///
    /// ```text
    /// # Recombination map
    /// # ...
    /// Chr	Begin	End	cMperMb	cM
    /// chr6	130000	140000	0.3421	0.0034
    /// chr6	140000	150000	0.1733	0.0051
    /// ```
    ///
    /// Lines starting with `#` are skipped. Every other line must have exactly
    /// five tab-separated fields, even on other chromosomes; a bad line aborts
    /// the whole parse. Begin and cMperMb must be numeric on lines for `chrom`,
    /// which may be given bare (`6`) or prefixed (`chr6`); End and cM are kept
    /// only when they parse. Lines on other chromosomes are not parsed.
    pub fn from_table(filepath: &str, chrom: &str) -> Result<RateSeries, HaploblockError> {
        let chrom = with_chr_prefix(chrom);
        let mut rdr = InputFile::new(filepath).tsv_reader(false)?;
        let mut series = RateSeries::new(&chrom);

        for result in rdr.records() {
            let record = result?;

            // skip header lines here, the reader's comment option would shift
            // record line numbers
            if record.get(0).map_or(false, |s| s.starts_with('#')) {
                continue;
            }

            let line = record_line(&record);
            if record.len() != RECOMBINATION_COLUMNS {
                return Err(HaploblockError::MalformedRecord {
                    path: filepath.to_string(),
                    line,
                    expected: RECOMBINATION_COLUMNS,
                    found: record.len(),
                });
            }

            if &record[0] != chrom.as_str() {
                continue;
            }

            let parse_error = |column: &str, value: &str| HaploblockError::ParseError {
                path: filepath.to_string(),
                line,
                message: format!("failed to parse {} from '{}'", column, value),
            };
            let (begin, rate) = (&record[1], &record[3]);
            let parsed = RecombinationRecord {
                chrom: chrom.clone(),
                position: begin.parse().map_err(|_| parse_error("Begin", begin))?,
                end: record[2].parse().ok(),
                rate: rate.parse().map_err(|_| parse_error("cMperMb", rate))?,
                cumulative: record[4].parse().ok(),
            };

            // check rate isn't NaN or negative
            if parsed.rate.is_nan() || parsed.rate < 0.0 {
                return Err(HaploblockError::ImproperRate(format!(
                    "{}:{}",
                    parsed.chrom, parsed.position
                )));
            }
            series.records.push(parsed);
        }
        Ok(series)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The first out-of-order pair of positions, if any.
    fn first_unsorted(&self) -> Option<(Position, Position)> {
        self.records
            .windows(2)
            .map(|pair| (pair[0].position, pair[1].position))
            .find(|(previous, position)| position <= previous)
    }

    /// Apply an ordering policy to the series.
    pub fn ordered(mut self, order: PositionOrder) -> Result<RateSeries, HaploblockError> {
        let Some((previous, position)) = self.first_unsorted() else {
            return Ok(self);
        };
        match order {
            PositionOrder::AssumeSorted => {
                warn!(
                    "Positions for {} are not ascending ({} followed by {}), haploblock boundaries may be wrong",
                    self.chrom, previous, position
                );
            }
            PositionOrder::RequireSorted => {
                return Err(HaploblockError::UnsortedPositions {
                    chrom: self.chrom,
                    previous,
                    position,
                });
            }
            PositionOrder::Sort => {
                self.records.sort_by_key(|record| record.position);
            }
        }
        Ok(self)
    }

    /// The average recombination rate over the series.
    pub fn mean_rate(&self) -> Result<RateFloat, HaploblockError> {
        mean(self.records.iter().map(|record| record.rate))
            .ok_or_else(|| HaploblockError::EmptySeries(self.chrom.clone()))
    }

    /// The rate a position has to exceed to be a hotspot.
    pub fn high_rate_threshold(&self) -> Result<RateFloat, HaploblockError> {
        Ok(HIGH_RATE_MULTIPLIER * self.mean_rate()?)
    }

    /// The records whose rate is strictly above [`RateSeries::high_rate_threshold`],
    /// in series order.
    pub fn hotspots(&self) -> Result<Vec<&RecombinationRecord>, HaploblockError> {
        let threshold = self.high_rate_threshold()?;
        Ok(self
            .records
            .iter()
            .filter(|record| record.rate > threshold)
            .collect())
    }

    /// Pair up consecutive hotspots into haploblock boundaries.
    ///
    /// A haploblock spans two hotspots, so `n` hotspots give `n - 1`
    /// boundaries and the last hotspot closes the final block.
    pub fn haploblock_boundaries(&self) -> Result<Vec<HaploblockBoundary>, HaploblockError> {
        let hotspots = self.hotspots()?;
        info!(
            "Found {} positions with recombination rates > {} x average",
            hotspots.len(),
            HIGH_RATE_MULTIPLIER
        );
        Ok(hotspots
            .windows(2)
            .map(|pair| HaploblockBoundary::new(pair[0].position, pair[1].position))
            .collect())
    }
}

/// Detect the haploblock boundaries of `chrom` from a recombination table,
/// using file order for adjacency.
pub fn parse_recombination_rates(
    filepath: &str,
    chrom: &str,
) -> Result<Vec<HaploblockBoundary>, HaploblockError> {
    detect_boundaries(filepath, chrom, PositionOrder::default())
}

/// Detect the haploblock boundaries of `chrom` with an explicit ordering policy.
pub fn detect_boundaries(
    filepath: &str,
    chrom: &str,
    order: PositionOrder,
) -> Result<Vec<HaploblockBoundary>, HaploblockError> {
    RateSeries::from_table(filepath, chrom)?
        .ordered(order)?
        .haploblock_boundaries()
}

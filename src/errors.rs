use crate::core::units::BelowAbsoluteZeroError;
use crate::input::{Direction, Location};
use thiserror::Error;

/// Top-level error for a branch calculation, splitting failures into the
/// categories a caller can usefully distinguish.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("invalid configuration: {0}")]
    Configuration(#[from] ConfigurationError),
    #[error("calculation left its physical domain: {0}")]
    Domain(#[from] DomainError),
    #[error("calculation steps run out of order: {0}")]
    Sequencing(#[from] SequencingError),
    #[error(transparent)]
    Convergence(#[from] ConvergenceFailure),
    #[error("the pipeline dataset could not be read: {0}")]
    DatasetRead(#[from] csv::Error),
    #[error("the thickness catalogue could not be read: {0}")]
    CatalogRead(#[from] serde_json::Error),
    #[error("the fluid property backend failed: {0}")]
    Property(#[from] anyhow::Error),
}

impl From<BelowAbsoluteZeroError> for ModelError {
    fn from(error: BelowAbsoluteZeroError) -> Self {
        Self::Domain(error.into())
    }
}

#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("pipe size DN {nominal} is not in the wall thickness catalogue")]
    UnknownPipeSize { nominal: String },
    #[error("no {line} line insulation thickness for DN {nominal} at location '{location}'")]
    UnknownInsulationSize {
        line: Direction,
        location: Location,
        nominal: String,
    },
    #[error("'{0}' is not a recognised installation location")]
    InvalidLocation(String),
    #[error("'{0}' is not a recognised flow direction")]
    InvalidDirection(String),
    #[error("no fluid property model is registered under the name '{0}'")]
    UnknownFluid(String),
    #[error("average damaged insulation thickness must lie within [0, 1] m, not {0}")]
    AverageDamageOutOfRange(f64),
    #[error("damage fraction for segment {index} on the {line} line must lie within [0, 1], not {value}")]
    DamageFractionOutOfRange {
        line: Direction,
        index: usize,
        value: f64,
    },
    #[error("{expected} damage fractions expected for the {line} line, {actual} provided")]
    DamageLengthMismatch {
        line: Direction,
        expected: usize,
        actual: usize,
    },
    #[error("no supply take-off left to match the consumer at return segment {index}")]
    UnmatchedConsumer { index: usize },
    #[error("the dataset holds no segments for the {0} line")]
    EmptyLine(Direction),
}

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("segment {index} on the {line} line has degenerate geometry: {detail}")]
    DegenerateSegment {
        line: Direction,
        index: usize,
        detail: String,
    },
    #[error("segment {index} on the {line} line reached a non-positive temperature (t_in = {t_in_c} degC, t_out = {t_out_c} degC)")]
    InvalidTemperature {
        line: Direction,
        index: usize,
        t_in_c: f64,
        t_out_c: f64,
    },
    #[error("segment {index} on the {line} line carries a non-positive heat capacity flow ({value_w_per_k} W/K)")]
    ZeroHeatCapacityFlow {
        line: Direction,
        index: usize,
        value_w_per_k: f64,
    },
    #[error("mixing flow downstream of return segment {index} is zero, no mixing temperature exists")]
    ZeroMixingFlow { index: usize },
    #[error(transparent)]
    BelowAbsoluteZero(#[from] BelowAbsoluteZeroError),
}

#[derive(Debug, Error)]
pub enum SequencingError {
    #[error("the return line cannot be calculated before the supply line")]
    ReturnBeforeSupply,
    #[error("the system profile cannot be aggregated before both lines are calculated")]
    SystemBeforeLines,
}

/// The outlet temperature loop ran out of iterations before meeting its
/// relative tolerance.
#[derive(Clone, Debug, Error)]
#[error(
    "outlet temperature for segment {index} on the {line} line did not converge within {iterations} iterations"
)]
pub struct ConvergenceFailure {
    pub line: Direction,
    pub index: usize,
    pub iterations: usize,
}

//! Error taxonomy for the viewer engine.

use crate::url_state::UrlStateError;
use thiserror::Error;

/// Malformed or out-of-bounds genomic coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegionError {
    #[error("chromosome name is empty")]
    MissingChromosome,

    #[error("region start {start} must be below end {end}")]
    EmptyOrInverted { start: u64, end: u64 },

    #[error("unknown chromosome '{0}'")]
    UnknownChromosome(String),

    #[error("region end {end} exceeds length {length} of {chromosome}")]
    BeyondChromosome {
        chromosome: String,
        end: u64,
        length: u64,
    },

    #[error("cannot parse locus '{0}'")]
    Malformed(String),
}

/// Pixel/coordinate queries outside the declared bounds.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordError {
    #[error("position {position} lies outside {start}-{end} by more than one region width")]
    OutOfRange { position: u64, start: u64, end: u64 },

    #[error("pixel width must be positive")]
    ZeroWidth,

    #[error(transparent)]
    Region(#[from] RegionError),
}

/// Errors surfaced by viewport, coordinator and configuration APIs.
#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("invalid region: {0}")]
    InvalidRegion(#[from] RegionError),

    #[error(transparent)]
    Coord(#[from] CoordError),

    #[error("track '{track}' failed to fetch: {message}")]
    FetchFailure { track: String, message: String },

    #[error("duplicate track id '{0}'")]
    DuplicateTrackId(String),

    #[error("track order {order} is used by both '{first}' and '{second}'")]
    DuplicateTrackOrder {
        order: i32,
        first: String,
        second: String,
    },

    #[error("no data provider registered for source '{source_name}' (track '{track}')")]
    UnknownSource { track: String, source_name: String },

    #[error("unknown genome '{0}'")]
    UnknownGenome(String),

    #[error("unknown track '{0}'")]
    UnknownTrack(String),

    #[error("no async runtime available to dispatch fetches")]
    NoRuntime,

    #[error("invalid url state: {0}")]
    UrlState(#[from] UrlStateError),
}

pub type ViewerResult<T> = Result<T, ViewerError>;

// License pipeline: date selection, filtering, normalization, enrichment, output

pub mod aggregate;
pub mod dates;
pub mod enrich;
pub mod filters;
pub mod normalize;
pub mod output;
pub mod runner;

// Re-export the entry points used by the binary
pub use runner::{Pipeline, PipelineResult, SourceOutcome, SourceReport};

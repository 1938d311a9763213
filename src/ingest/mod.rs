pub mod runner;
pub mod sink;

pub use runner::{GameSource, IngestSummary, Ingestor, NhlSource};
pub use sink::{JsonLinesSink, MemorySink, RowSink, SinkError};

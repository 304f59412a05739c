pub mod ingest_flow;
pub mod record_ctx;

pub use ingest_flow::{FileOutcome, IngestFlow, IngestStats};
pub use record_ctx::RecordCtx;

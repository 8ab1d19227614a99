pub mod ingestion;
pub mod keyed_lock;
pub mod processing;

pub use ingestion::{IngestionJob, IngestionResult, IngestionService, IngestionSettings};
pub use keyed_lock::KeyedLocks;
pub use processing::{
    DocumentProcessor, HttpDocumentProcessor, NoopDocumentProcessor, ProcessingRequest,
};

// レシート機能モジュール

pub mod batch;
pub mod categories;
pub mod gateway;
pub mod models;
pub mod pipeline;
pub mod store;

#[cfg(test)]
pub(crate) mod support;

pub use batch::{
    commit_completed, draft_from_extraction, BatchItem, BatchProcessor, BatchProgress,
    BatchStatus, BatchSummary,
};
pub use categories::DEFAULT_CATEGORIES;
pub use gateway::ReceiptGateway;
pub use models::{
    Category, DraftItem, ExtractionResult, Receipt, ReceiptDraft, ReceiptItem, ReceiptPatch,
    SearchReceiptsRequest,
};
pub use pipeline::ImagePipeline;
pub use store::{LoadOutcome, ReceiptStore};

pub mod archive;
pub use archive::Archive;

pub mod chunks;
pub use chunks::{Chunk, ChunkReader};

pub mod errors;
pub use errors::{display_chain, Error, Result, TransferError};

pub mod orchestrator;
pub use orchestrator::{BatchConfig, BatchReport, Orchestrator, Outcome};

pub mod transfer;
pub use transfer::{Destination, MultipartTransfer, UploadSession};

#[cfg(test)]
pub(crate) mod testing;

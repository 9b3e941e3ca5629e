use thiserror;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("io error: {0}")]
    IOError(#[from] std::io::Error),

    #[error("{0}")]
    TransferError(#[from] TransferError),

    #[error("objectstore error: {0}")]
    ObjectStoreError(#[from] dirvault_objectstore::Error),

    #[error("chunk size {0} is below the minimum part size of {} bytes", dirvault_objectstore::MIN_PART_SIZE)]
    InvalidChunkSize(usize),

    #[error("input root is not a directory: {}", .0.display())]
    InputRootNotADirectory(std::path::PathBuf),
}

/// Failure of a single multipart transfer, classified by the phase that failed.
#[derive(thiserror::Error, Debug)]
pub enum TransferError {
    #[error("failed to read source stream: {0}")]
    StreamRead(#[source] std::io::Error),

    #[error("failed to initiate multipart upload: {0}")]
    Initiation(#[source] dirvault_objectstore::Error),

    #[error("failed to upload part {part_number}: {source}")]
    PartUpload {
        part_number: i32,
        #[source]
        source: dirvault_objectstore::Error,
    },

    #[error("failed to complete multipart upload: {0}")]
    Completion(#[source] dirvault_objectstore::Error),

    #[error("failed to abort multipart upload: {0}")]
    Abort(#[source] dirvault_objectstore::Error),

    #[error("chunk {index} arrived out of order, expected part {expected}")]
    OutOfOrderChunk { index: u64, expected: i32 },
}

/// Renders `err` followed by each cause in its source chain that its message does not already
/// include.
///
/// The AWS SDK errors only say which kind of failure happened at the top level; the service's
/// own reason (`NoSuchBucket`, `AccessDenied`, ...) is further down the chain.
pub fn display_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let msg = cause.to_string();
        if !out.contains(&msg) {
            out.push_str(": ");
            out.push_str(&msg);
        }
        source = cause.source();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(thiserror::Error, Debug)]
    #[error("service error")]
    struct ServiceError(#[source] NoSuchBucket);

    #[derive(thiserror::Error, Debug)]
    #[error("NoSuchBucket: the specified bucket does not exist")]
    struct NoSuchBucket;

    #[test]
    fn chain_includes_hidden_causes() {
        assert_eq!(
            display_chain(&ServiceError(NoSuchBucket)),
            "service error: NoSuchBucket: the specified bucket does not exist"
        );
    }

    #[test]
    fn chain_does_not_repeat_causes_already_shown() {
        let err = Error::from(TransferError::PartUpload {
            part_number: 2,
            source: dirvault_objectstore::Error::BackendError("connection reset".into()),
        });
        assert_eq!(
            display_chain(&err),
            "failed to upload part 2: backend error: connection reset"
        );
    }
}

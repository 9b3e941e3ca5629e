use std::sync::Arc;

use futures::stream::{Stream, StreamExt};

use dirvault_objectstore::{Key, Locator, ObjectStore, Part, MAX_PART_NUMBER};

use super::chunks::Chunk;
use super::errors::TransferError;

type Result<T> = std::result::Result<T, TransferError>;

/// Where a transfer puts the finished object.
#[derive(Clone, Debug)]
pub struct Destination {
    pub bucket: String,
    pub key: Key,
}

/// One in-progress multipart upload.
///
/// A session is created by [`MultipartTransfer::initiate`] and consumed by value by exactly one
/// of [`MultipartTransfer::complete`] or [`MultipartTransfer::abort`]. The recorded parts are
/// always the contiguous prefix `1..next_part_number`.
#[derive(Debug)]
pub struct UploadSession {
    upload_id: String,
    destination: Destination,
    parts: Vec<Part>,
    next_part_number: i32,
}

impl UploadSession {
    pub fn upload_id(&self) -> &str {
        &self.upload_id
    }

    pub fn destination(&self) -> &Destination {
        &self.destination
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn next_part_number(&self) -> i32 {
        self.next_part_number
    }
}

/// Drives the initiate → upload parts → complete protocol against an [`ObjectStore`].
///
/// Parts are uploaded strictly one after another in increasing part-number order. Nothing is
/// retried: each failing call is surfaced as the [`TransferError`] of the phase it belongs to.
#[derive(Clone)]
pub struct MultipartTransfer {
    objects: Arc<dyn ObjectStore>,
}

impl MultipartTransfer {
    pub fn new(objects: Arc<dyn ObjectStore>) -> Self {
        Self { objects }
    }

    /// Uploads every chunk of `chunks` to `destination` and returns the locator of the finished
    /// object.
    ///
    /// A part upload failure or a source read failure aborts the session before returning, so
    /// completion is never attempted with a partial set of parts. An empty chunk sequence still
    /// initiates and completes with no parts; whether the store accepts that is up to the store.
    pub async fn transfer<S>(&self, chunks: S, destination: &Destination) -> Result<Locator>
    where
        S: Stream<Item = std::io::Result<Chunk>>,
    {
        let mut session = self.initiate(destination).await?;

        tokio::pin!(chunks);
        while let Some(chunk) = chunks.next().await {
            let outcome = match chunk {
                Ok(chunk) => self.upload_part(&mut session, chunk).await,
                Err(e) => Err(TransferError::StreamRead(e)),
            };
            if let Err(e) = outcome {
                if let Err(abort_err) = self.abort(session).await {
                    tracing::warn!(
                        key = %destination.key,
                        error = %abort_err,
                        "failed to abort multipart upload after transfer error"
                    );
                }
                return Err(e);
            }
        }

        self.complete(session).await
    }

    pub async fn initiate(&self, destination: &Destination) -> Result<UploadSession> {
        let upload_id = self
            .objects
            .initiate_multipart_upload(&destination.bucket, &destination.key)
            .await
            .map_err(TransferError::Initiation)?;

        tracing::info!(
            bucket = %destination.bucket,
            key = %destination.key,
            %upload_id,
            "initiated multipart upload"
        );

        Ok(UploadSession {
            upload_id,
            destination: destination.clone(),
            parts: Vec::new(),
            next_part_number: 1,
        })
    }

    /// Uploads `chunk` as the next part of `session`.
    ///
    /// The part number is the chunk index plus one and must equal the session's next expected
    /// part number.
    pub async fn upload_part(&self, session: &mut UploadSession, chunk: Chunk) -> Result<()> {
        let expected = session.next_part_number;
        if chunk.index.checked_add(1) != Some(expected as u64) {
            return Err(TransferError::OutOfOrderChunk {
                index: chunk.index,
                expected,
            });
        }
        if expected > MAX_PART_NUMBER {
            return Err(TransferError::PartUpload {
                part_number: expected,
                source: dirvault_objectstore::Error::ObjectsPartNumberOutOfRange(expected),
            });
        }

        let len = chunk.data.len();
        let dest = &session.destination;
        let part = self
            .objects
            .upload_part(
                &dest.bucket,
                &dest.key,
                &session.upload_id,
                expected,
                chunk.data,
            )
            .await
            .map_err(|source| TransferError::PartUpload {
                part_number: expected,
                source,
            })?;

        tracing::debug!(
            key = %dest.key,
            part_number = expected,
            bytes = len,
            is_final = chunk.is_final,
            "uploaded part"
        );

        session.parts.push(part);
        session.next_part_number += 1;
        Ok(())
    }

    pub async fn complete(&self, session: UploadSession) -> Result<Locator> {
        let UploadSession {
            upload_id,
            destination,
            parts,
            ..
        } = session;
        let part_count = parts.len();

        self.objects
            .complete_multipart_upload(&destination.bucket, &destination.key, &upload_id, parts)
            .await
            .map_err(TransferError::Completion)?;

        let locator = self.objects.locator(&destination.bucket, &destination.key);
        tracing::info!(
            key = %destination.key,
            parts = part_count,
            %locator,
            "completed multipart upload"
        );
        Ok(locator)
    }

    /// Releases the session's staged parts on the store.
    pub async fn abort(&self, session: UploadSession) -> Result<()> {
        let dest = &session.destination;
        self.objects
            .abort_multipart_upload(&dest.bucket, &dest.key, &session.upload_id)
            .await
            .map_err(TransferError::Abort)?;

        tracing::info!(
            key = %dest.key,
            upload_id = %session.upload_id,
            parts = session.parts.len(),
            "aborted multipart upload"
        );
        Ok(())
    }
}

use async_trait::async_trait;
use bytes::Bytes;

mod config;
pub use config::Config;
mod errors;
pub use errors::{Error, KeyError, Result};
mod key;
pub use key::Key;
pub(crate) mod s3;
pub use s3::S3Config;
pub use s3::S3;

/// Smallest size S3 accepts for any part other than the last one.
pub const MIN_PART_SIZE: usize = 5 * 1024 * 1024; // 5 MiB

/// Part size used when none is configured.
pub const DEFAULT_PART_SIZE: usize = 20 * 1024 * 1024; // 20 MiB

/// Highest part number S3 accepts within a single multipart upload.
pub const MAX_PART_NUMBER: i32 = 10_000;

/// A successfully staged part of a multipart upload.
///
/// The `e_tag` is the opaque integrity token the store returned for the part; it must be echoed
/// back unchanged when completing the upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Part {
    pub e_tag: String,
    pub part_number: i32,
}

/// The final address of a completed object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Locator {
    url: String,
}

impl Locator {
    /// Virtual-hosted-style URL when the region is known, the global endpoint otherwise.
    pub fn new(bucket: &str, key: &Key, region: Option<&str>) -> Locator {
        let url = match region {
            Some(region) => format!("https://{bucket}.s3.{region}.amazonaws.com/{key}"),
            None => format!("https://{bucket}.s3.amazonaws.com/{key}"),
        };
        Locator { url }
    }

    pub fn as_str(&self) -> &str {
        &self.url
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.url)
    }
}

impl From<Locator> for String {
    fn from(l: Locator) -> String {
        l.url
    }
}

/// Provides a common interface for the multipart upload protocol of S3-compatible object stores.
///
/// Every call is a single request to the backend; implementations must not retry on their own.
/// Callers own the sequencing: initiate once, upload parts in increasing part-number order, then
/// either complete with the recorded [`Part`]s or abort.
#[async_trait]
pub trait ObjectStore: Send + Sync + 'static {
    async fn initiate_multipart_upload(&self, bucket: &str, key: &Key) -> Result<String>;

    async fn upload_part(
        &self,
        bucket: &str,
        key: &Key,
        upload_id: &str,
        part_number: i32,
        body: Bytes,
    ) -> Result<Part>;

    async fn complete_multipart_upload(
        &self,
        bucket: &str,
        key: &Key,
        upload_id: &str,
        parts: Vec<Part>,
    ) -> Result<()>;

    async fn abort_multipart_upload(&self, bucket: &str, key: &Key, upload_id: &str)
        -> Result<()>;

    /// Region used to address completed objects, if known.
    fn region(&self) -> Option<&str>;

    fn locator(&self, bucket: &str, key: &Key) -> Locator {
        Locator::new(bucket, key, self.region())
    }
}

//! In-memory object store and readers used by the unit tests.

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Mutex;
use std::task::{Context, Poll};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::io::{AsyncRead, ReadBuf};

use dirvault_objectstore::{Error, Key, ObjectStore, Part, Result};

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Call {
    Initiate { key: String },
    UploadPart { key: String, part_number: i32, len: usize },
    Complete { key: String, parts: Vec<Part> },
    Abort { key: String },
}

/// Records every call and stages part bytes so completed objects can be inspected.
///
/// Failures are injected per phase and, when `fail_key` is set, only for keys containing that
/// substring.
#[derive(Default)]
pub(crate) struct RecordingStore {
    pub region: Option<String>,
    pub fail_key: Option<String>,
    pub fail_initiate: bool,
    pub fail_part: Option<i32>,
    pub fail_complete: bool,
    pub fail_abort: bool,
    pub reject_empty_completion: bool,

    pub calls: Mutex<Vec<Call>>,
    pub staged: Mutex<HashMap<(String, i32), Bytes>>,
    pub objects: Mutex<HashMap<String, Vec<u8>>>,
}

impl RecordingStore {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn object(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| pred(c)).count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn targeted(&self, key: &Key) -> bool {
        match &self.fail_key {
            Some(s) => key.as_str().contains(s.as_str()),
            None => true,
        }
    }
}

#[async_trait]
impl ObjectStore for RecordingStore {
    async fn initiate_multipart_upload(&self, _bucket: &str, key: &Key) -> Result<String> {
        self.record(Call::Initiate {
            key: key.to_string(),
        });
        if self.fail_initiate && self.targeted(key) {
            return Err(Error::BackendError("access denied".into()));
        }
        Ok(format!("upload-{key}"))
    }

    async fn upload_part(
        &self,
        _bucket: &str,
        key: &Key,
        upload_id: &str,
        part_number: i32,
        body: Bytes,
    ) -> Result<Part> {
        self.record(Call::UploadPart {
            key: key.to_string(),
            part_number,
            len: body.len(),
        });
        if self.fail_part == Some(part_number) && self.targeted(key) {
            return Err(Error::BackendError("connection reset".into()));
        }
        self.staged
            .lock()
            .unwrap()
            .insert((upload_id.to_string(), part_number), body);
        Ok(Part {
            e_tag: format!("\"etag-{part_number}\""),
            part_number,
        })
    }

    async fn complete_multipart_upload(
        &self,
        _bucket: &str,
        key: &Key,
        upload_id: &str,
        parts: Vec<Part>,
    ) -> Result<()> {
        self.record(Call::Complete {
            key: key.to_string(),
            parts: parts.clone(),
        });
        if self.fail_complete && self.targeted(key) {
            return Err(Error::BackendError("EntityTooSmall".into()));
        }
        if self.reject_empty_completion && parts.is_empty() {
            return Err(Error::BackendError("MalformedXML".into()));
        }
        let mut staged = self.staged.lock().unwrap();
        let mut object = Vec::new();
        for part in parts {
            let bytes = staged
                .remove(&(upload_id.to_string(), part.part_number))
                .ok_or_else(|| Error::BackendError(format!("InvalidPart {}", part.part_number)))?;
            object.extend_from_slice(&bytes);
        }
        self.objects.lock().unwrap().insert(key.to_string(), object);
        Ok(())
    }

    async fn abort_multipart_upload(
        &self,
        _bucket: &str,
        key: &Key,
        upload_id: &str,
    ) -> Result<()> {
        self.record(Call::Abort {
            key: key.to_string(),
        });
        if self.fail_abort && self.targeted(key) {
            return Err(Error::BackendError("NoSuchUpload".into()));
        }
        self.staged
            .lock()
            .unwrap()
            .retain(|(id, _), _| id != upload_id);
        Ok(())
    }

    fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }
}

/// Hands out at most `step` bytes per read and fails once `fail_at` bytes were served.
pub(crate) struct Trickle {
    pub data: Vec<u8>,
    pub pos: usize,
    pub step: usize,
    pub fail_at: Option<usize>,
}

impl Trickle {
    pub fn new(data: Vec<u8>, step: usize, fail_at: Option<usize>) -> Self {
        Self {
            data,
            pos: 0,
            step,
            fail_at,
        }
    }
}

impl AsyncRead for Trickle {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        if let Some(limit) = self.fail_at {
            if self.pos >= limit {
                return Poll::Ready(Err(std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "permission denied",
                )));
            }
        }
        let start = self.pos;
        let end = (start + self.step)
            .min(self.data.len())
            .min(start + buf.remaining());
        buf.put_slice(&self.data[start..end]);
        self.pos = end;
        Poll::Ready(Ok(()))
    }
}

use async_trait::async_trait;
use aws_credential_types::provider::{ProvideCredentials, SharedCredentialsProvider};
use aws_credential_types::Credentials;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
use aws_sdk_s3::Client;
use bytes::Bytes;
use http::Uri;
use serde::Deserialize;

pub(crate) mod logging;
use super::errors::{Error, Result};
use super::s3::logging::LoggingInterceptor;
use super::{Key, ObjectStore, Part};

/// Connection settings for S3 and S3-compatible stores.
///
/// Every field is optional; anything left unset falls back to the standard AWS environment and
/// profile chain.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct S3Config {
    pub(crate) region: Option<String>,
    hostname: Option<String>,
    access_key: Option<String>,
    secret_key: Option<String>,
    #[serde(default)]
    force_path_style: bool,
}

impl S3Config {
    pub async fn new_objects(&self) -> Result<S3> {
        let sdk_config = aws_config::load_from_env().await;

        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(self.force_path_style)
            .interceptor(LoggingInterceptor);

        if let Some(region) = &self.region {
            builder = builder.region(Region::new(region.clone()));
        }

        if let (Some(access_key), Some(secret_key)) = (&self.access_key, &self.secret_key) {
            let scp = SharedCredentialsProvider::new(
                Credentials::new(
                    access_key.clone(),
                    secret_key.clone(),
                    None,
                    None,
                    "dirvault",
                )
                .provide_credentials()
                .await?,
            );
            builder = builder.credentials_provider(scp);
        }

        if let Some(hostname) = &self.hostname {
            let uri = Uri::builder()
                .scheme("https")
                .authority(hostname.as_str())
                .path_and_query("/")
                .build()?;
            builder = builder.endpoint_url(uri.to_string());
        }

        let region = self
            .region
            .clone()
            .or_else(|| sdk_config.region().map(|r| r.to_string()));
        tracing::debug!(?region, hostname = ?self.hostname, "configured s3 client");

        Ok(S3 {
            region,
            client: Client::from_conf(builder.build()),
        })
    }
}

#[derive(Clone)]
pub struct S3 {
    region: Option<String>,
    client: Client,
}

#[async_trait]
impl ObjectStore for S3 {
    async fn initiate_multipart_upload(&self, bucket: &str, key: &Key) -> Result<String> {
        let create_multipart_upload_output = self
            .client
            .create_multipart_upload()
            .key(key.as_str())
            .bucket(bucket)
            .send()
            .await?;

        let upload_id = create_multipart_upload_output
            .upload_id()
            .ok_or(Error::ObjectsFailedToInitiateChunkedUpload(
                "missing upload id",
            ))?;

        Ok(upload_id.to_string())
    }

    async fn upload_part(
        &self,
        bucket: &str,
        key: &Key,
        upload_id: &str,
        part_number: i32,
        body: Bytes,
    ) -> Result<Part> {
        let content_length = body.len() as i64;
        let upload_part_output = self
            .client
            .upload_part()
            .upload_id(upload_id)
            .part_number(part_number)
            .key(key.as_str())
            .body(ByteStream::from(body))
            .content_length(content_length)
            .bucket(bucket)
            .send()
            .await?;

        let e_tag = upload_part_output
            .e_tag()
            .ok_or(Error::ObjectsMissingETag(part_number))?;

        Ok(Part {
            e_tag: e_tag.to_string(),
            part_number,
        })
    }

    async fn complete_multipart_upload(
        &self,
        bucket: &str,
        key: &Key,
        upload_id: &str,
        parts: Vec<Part>,
    ) -> Result<()> {
        let mut mpu = CompletedMultipartUpload::builder();
        for part in parts {
            mpu = mpu.parts(
                CompletedPart::builder()
                    .e_tag(part.e_tag)
                    .part_number(part.part_number)
                    .build(),
            );
        }
        let _complete_multipart_upload_output = self
            .client
            .complete_multipart_upload()
            .multipart_upload(mpu.build())
            .upload_id(upload_id)
            .key(key.as_str())
            .bucket(bucket)
            .send()
            .await?;

        Ok(())
    }

    async fn abort_multipart_upload(&self, bucket: &str, key: &Key, upload_id: &str) -> Result<()> {
        let _abort_multipart_upload_output = self
            .client
            .abort_multipart_upload()
            .upload_id(upload_id)
            .key(key.as_str())
            .bucket(bucket)
            .send()
            .await?;
        // parts are only ever uploaded sequentially by the caller that aborts, so nothing can
        // still be in flight for this upload id and there is no need to list lingering parts.

        Ok(())
    }

    fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }
}

//! ObjectStore errors

use thiserror;

pub type Result<T> = std::result::Result<T, Error>;

/// General purpose [`super::ObjectStore`] error handling.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("http error")]
    HTTPError(#[from] http::Error),

    #[error("aws sdk create multipart upload error: {0}")]
    AWSSDKCreateMultiPartUploadError(
        #[from]
        aws_sdk_s3::error::SdkError<
            aws_sdk_s3::operation::create_multipart_upload::CreateMultipartUploadError,
        >,
    ),
    #[error("aws sdk upload part error: {0}")]
    AWSSDKUploadPartError(
        #[from] aws_sdk_s3::error::SdkError<aws_sdk_s3::operation::upload_part::UploadPartError>,
    ),
    #[error("aws sdk complete multipart upload error: {0}")]
    AWSSDKCompleteMultipartUploadError(
        #[from]
        aws_sdk_s3::error::SdkError<
            aws_sdk_s3::operation::complete_multipart_upload::CompleteMultipartUploadError,
        >,
    ),
    #[error("aws sdk abort multipart upload error: {0}")]
    AWSSDKAbortMultipartUploadError(
        #[from]
        aws_sdk_s3::error::SdkError<
            aws_sdk_s3::operation::abort_multipart_upload::AbortMultipartUploadError,
        >,
    ),
    #[error("aws sdk credentials error: {0}")]
    AWSSDKCredentialsError(#[from] aws_credential_types::provider::error::CredentialsError),

    #[error("failed to initiate chunked upload: {0}")]
    ObjectsFailedToInitiateChunkedUpload(&'static str),
    #[error("missing e_tag for part: {0}")]
    ObjectsMissingETag(i32),
    #[error("part number {0} exceeds the maximum of {}", super::MAX_PART_NUMBER)]
    ObjectsPartNumberOutOfRange(i32),

    #[error("backend error: {0}")]
    BackendError(String),

    #[error("key error: {0}")]
    KeyError(#[from] KeyError),
}

/// Error type used when parsing [`super::Key`] from a string.
#[derive(thiserror::Error, Debug)]
pub enum KeyError {
    #[error("object key must not be empty")]
    Empty,

    #[error("object key is {0} bytes long, the maximum is 1024")]
    TooLong(usize),

    #[error("root dir not allowed")]
    RootDirNotAllowed,

    #[error("current dir (`.`) not allowed")]
    CurDirNotAllowed,

    #[error("parent dir (`..`) not allowed")]
    ParentDirNotAllowed,

    #[error("empty path segments not allowed")]
    EmptySegment,
}

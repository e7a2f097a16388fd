//! # Storage Abstraction Module
//!
//! Unified read/write interface over local filesystem and Amazon S3,
//! selected from the path pattern (`s3://bucket/key` vs anything else).
//! NetCDF inputs on S3 are staged through a tempfile before opening, since
//! the NetCDF reader needs a local path.

use aws_config::BehaviorVersion;
use aws_sdk_s3::Client as S3Client;
use std::path::Path;
use thiserror::Error;
use tokio::fs;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("AWS S3 GetObject error: {0}")]
    S3GetObject(
        #[from]
        aws_sdk_s3::error::SdkError<aws_sdk_s3::operation::get_object::GetObjectError>,
    ),

    #[error("AWS S3 PutObject error: {0}")]
    S3PutObject(
        #[from]
        aws_sdk_s3::error::SdkError<aws_sdk_s3::operation::put_object::PutObjectError>,
    ),

    #[error("AWS S3 HeadObject error: {0}")]
    S3HeadObject(
        #[from]
        aws_sdk_s3::error::SdkError<aws_sdk_s3::operation::head_object::HeadObjectError>,
    ),

    #[error("AWS ByteStream error: {0}")]
    ByteStream(String),

    #[error("Invalid S3 path format: {0}")]
    InvalidS3Path(String),

    #[error("Path not found: {0}")]
    PathNotFound(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Unified interface over storage backends. All operations are async so
/// local and remote backends share a signature.
#[async_trait::async_trait]
pub trait StorageBackend: Send + Sync {
    /// Reads the entire contents of a file.
    async fn read(&self, path: &str) -> StorageResult<Vec<u8>>;

    /// Writes data to a file, creating it if it doesn't exist.
    async fn write(&self, path: &str, data: &[u8]) -> StorageResult<()>;

    /// Checks whether a file exists at the given path.
    async fn exists(&self, path: &str) -> StorageResult<bool>;
}

/// Local filesystem backend
pub struct LocalStorage;

#[async_trait::async_trait]
impl StorageBackend for LocalStorage {
    async fn read(&self, path: &str) -> StorageResult<Vec<u8>> {
        if !Path::new(path).exists() {
            return Err(StorageError::PathNotFound(path.to_string()));
        }
        Ok(fs::read(path).await?)
    }

    async fn write(&self, path: &str, data: &[u8]) -> StorageResult<()> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).await?;
        }
        fs::write(path, data).await?;
        Ok(())
    }

    async fn exists(&self, path: &str) -> StorageResult<bool> {
        Ok(Path::new(path).exists())
    }
}

/// Amazon S3 backend. Credentials come from the usual AWS environment
/// (env vars, profile, instance metadata).
pub struct S3Storage {
    client: S3Client,
}

impl S3Storage {
    pub async fn new() -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest()).load().await;
        S3Storage {
            client: S3Client::new(&config),
        }
    }
}

#[async_trait::async_trait]
impl StorageBackend for S3Storage {
    async fn read(&self, path: &str) -> StorageResult<Vec<u8>> {
        let (bucket, key) = parse_s3_path(path)?;
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await?;
        let data = output
            .body
            .collect()
            .await
            .map_err(|e| StorageError::ByteStream(e.to_string()))?;
        Ok(data.into_bytes().to_vec())
    }

    async fn write(&self, path: &str, data: &[u8]) -> StorageResult<()> {
        let (bucket, key) = parse_s3_path(path)?;
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(data.to_vec().into())
            .send()
            .await?;
        Ok(())
    }

    async fn exists(&self, path: &str) -> StorageResult<bool> {
        let (bucket, key) = parse_s3_path(path)?;
        match self
            .client
            .head_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => {
                if let aws_sdk_s3::error::SdkError::ServiceError(ref se) = e
                    && se.err().is_not_found()
                {
                    return Ok(false);
                }
                Err(e.into())
            }
        }
    }
}

/// Creates the backend matching a path pattern.
pub struct StorageFactory;

impl StorageFactory {
    pub async fn from_path(path: &str) -> StorageResult<Box<dyn StorageBackend>> {
        if path.starts_with("s3://") {
            Ok(Box::new(S3Storage::new().await))
        } else {
            Ok(Box::new(LocalStorage))
        }
    }
}

/// Splits `s3://bucket/key` into (bucket, key).
pub fn parse_s3_path(path: &str) -> StorageResult<(String, String)> {
    let stripped = path
        .strip_prefix("s3://")
        .ok_or_else(|| StorageError::InvalidS3Path(path.to_string()))?;
    match stripped.split_once('/') {
        Some((bucket, key)) if !bucket.is_empty() && !key.is_empty() => {
            Ok((bucket.to_string(), key.to_string()))
        }
        _ => Err(StorageError::InvalidS3Path(path.to_string())),
    }
}

/// Stages a possibly-remote NetCDF input to a local path. Local inputs are
/// returned as-is; S3 inputs are downloaded to a named tempfile whose guard
/// is returned so it outlives the open dataset handle.
pub async fn stage_input(
    path: &str,
) -> StorageResult<(std::path::PathBuf, Option<tempfile::NamedTempFile>)> {
    if path.starts_with("s3://") {
        let storage = StorageFactory::from_path(path).await?;
        let data = storage.read(path).await?;
        let temp = tempfile::NamedTempFile::new()?;
        fs::write(temp.path(), &data).await?;
        Ok((temp.path().to_path_buf(), Some(temp)))
    } else {
        Ok((std::path::PathBuf::from(path), None))
    }
}

//! # Parquet Output Module
//!
//! Writes extraction DataFrames to Parquet, locally or to S3 via the
//! storage abstraction.

use crate::storage::{StorageBackend as _, StorageFactory};
use log::debug;
use polars::prelude::*;
use std::fs::File;

/// Writes a DataFrame to a local Parquet file.
pub fn write_dataframe_to_parquet(
    df: &DataFrame,
    output_path: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    debug!("Writing DataFrame to parquet file: {}", output_path);
    debug!("DataFrame shape: {:?}", df.shape());
    debug!("First few rows:\n{}", df.head(Some(5)));

    let file = File::create(output_path)?;
    let writer = ParquetWriter::new(file);
    let mut df_clone = df.clone();
    writer.finish(&mut df_clone)?;

    debug!("Successfully wrote parquet file: {}", output_path);
    Ok(())
}

/// Writes a DataFrame to a local or `s3://` Parquet destination. S3 output
/// is written to a tempfile first and then uploaded.
pub async fn write_dataframe_to_parquet_async(
    df: &DataFrame,
    output_path: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    if output_path.starts_with("s3://") {
        let temp_file = tempfile::NamedTempFile::new()?;
        let temp_path = temp_file
            .path()
            .to_str()
            .ok_or("Temporary file path is not valid UTF-8")?
            .to_string();

        write_dataframe_to_parquet(df, &temp_path)?;

        let storage = StorageFactory::from_path(output_path).await?;
        let data: Vec<u8> = tokio::fs::read(temp_file.path()).await?;
        storage.write(output_path, &data).await?;

        debug!("Successfully wrote parquet file to S3: {}", output_path);
    } else {
        write_dataframe_to_parquet(df, output_path)?;
    }
    Ok(())
}

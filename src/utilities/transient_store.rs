use std::io;
use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use tempfile::TempDir;
use tokio::fs::{self, File};
use tokio::io::{AsyncWriteExt, BufWriter};

use crate::apis::ImageStream;

pub const IMAGE_FILENAME: &str = "generated_image.jpg";

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("{0}")]
    Write(#[from] io::Error),
    #[error("the image file is missing after writing it")]
    Missing,
}

/// Keeps generated images on disk only until they are delivered.
///
/// Every save gets its own request directory under `dir`, so concurrent
/// pipelines never share a file.
pub struct TransientStore {
    dir: PathBuf,
}

/// A saved image. Removed on [`StoredImage::remove`] or when dropped.
pub struct StoredImage {
    temp_dir: TempDir,
    path: PathBuf,
}

impl TransientStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub async fn save(&self, mut stream: ImageStream) -> Result<StoredImage, PersistenceError> {
        fs::create_dir_all(&self.dir).await?;

        let temp_dir = tempfile::Builder::new().prefix("request-").tempdir_in(&self.dir)?;
        let path = temp_dir.path().join(IMAGE_FILENAME);
        log::debug!("saving image to {}", path.display());

        let mut file = BufWriter::new(File::create(&path).await?);
        let mut written = 0;

        while let Some(bytes) = stream.next().await {
            let bytes = bytes?;
            file.write_all(&bytes).await?;
            written += bytes.len();
        }

        file.flush().await?;
        file.into_inner().sync_all().await?;

        if !fs::try_exists(&path).await? {
            return Err(PersistenceError::Missing);
        }

        log::info!("saved {written} bytes to {}", path.display());

        Ok(StoredImage { temp_dir, path })
    }
}

impl StoredImage {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn remove(self) -> io::Result<()> {
        log::debug!("removing {}", self.path.display());
        self.temp_dir.close()
    }
}

use crate::constants::SNIFF_BYTES;
use crate::error::{ConversionFailure, Error, Result};
use crate::transport::HttpResponse;
use bytes::Bytes;
use futures_util::StreamExt;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// What the workflow needs to know about the file being converted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    pub path: PathBuf,
    pub file_name: String,
    pub source_format: String,
    pub size: u64,
}

#[derive(Debug, Clone, Default)]
pub struct FileService;

impl FileService {
    pub fn new() -> Self {
        Self
    }

    /// Fails with [`Error::FileNotFound`] when nothing exists at `path`.
    pub async fn inspect_input(&self, path: &Path) -> Result<InputFile> {
        let metadata = match tokio::fs::metadata(path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::FileNotFound {
                    path: path.to_path_buf(),
                });
            }
            Err(e) => return Err(Error::Io(e)),
        };

        if !metadata.is_file() {
            return Err(Error::InvalidArgument(format!(
                "{} is not a file",
                path.display()
            )));
        }

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();

        let source_format = match extension_format(path) {
            Some(format) => format,
            None => self.sniff_format(path).await?.unwrap_or_default(),
        };

        Ok(InputFile {
            path: path.to_path_buf(),
            file_name,
            source_format,
            size: metadata.len(),
        })
    }

    pub async fn read_input(&self, input: &InputFile) -> Result<Bytes, ConversionFailure> {
        let data = tokio::fs::read(&input.path).await?;
        Ok(Bytes::from(data))
    }

    /// Streams a download into a temporary file beside `output_path` and
    /// renames it into place once every chunk is written. Returns the final
    /// size in bytes.
    pub async fn write_download(
        &self,
        response: HttpResponse,
        output_path: &Path,
    ) -> Result<u64, ConversionFailure> {
        let parent = match output_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        tokio::fs::create_dir_all(&parent).await?;

        let temp_file = NamedTempFile::new_in(&parent)?;
        let mut file = tokio::fs::File::from_std(temp_file.reopen()?);

        let mut body = response.body;
        let mut written = 0u64;
        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        drop(file);

        temp_file
            .persist(output_path)
            .map_err(|e| ConversionFailure::from(e.error))?;

        tracing::debug!("Wrote {} bytes to {:?}", written, output_path);
        let metadata = tokio::fs::metadata(output_path).await?;
        Ok(metadata.len())
    }

    /// True when both paths name the same file, including through links or
    /// relative components once the output exists.
    pub async fn is_same_file(&self, a: &Path, b: &Path) -> bool {
        if a == b {
            return true;
        }
        match (
            tokio::fs::canonicalize(a).await,
            tokio::fs::canonicalize(b).await,
        ) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }

    async fn sniff_format(&self, path: &Path) -> Result<Option<String>> {
        let mut file = tokio::fs::File::open(path).await?;
        let mut buffer = vec![0u8; SNIFF_BYTES];
        let mut filled = 0;
        loop {
            let read = file.read(&mut buffer[filled..]).await?;
            if read == 0 {
                break;
            }
            filled += read;
            if filled == buffer.len() {
                break;
            }
        }

        let detected = infer::get(&buffer[..filled]).map(|kind| kind.extension().to_string());
        match &detected {
            Some(format) => tracing::debug!("Detected {} content in {:?}", format, path),
            None => tracing::warn!("Could not determine the format of {:?}", path),
        }
        Ok(detected)
    }
}

fn extension_format(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .filter(|ext| !ext.is_empty())
}

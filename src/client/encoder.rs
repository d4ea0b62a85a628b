use std::{fmt, io, path::PathBuf};

use base64ct::{Base64, Encoding};
use thiserror::Error;
use tracing::debug;

/// A file the user picked for upload.
#[derive(Debug, Clone)]
pub enum SelectedFile {
    Path(PathBuf),
    Memory { name: String, bytes: Vec<u8> },
}

impl SelectedFile {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    pub fn in_memory(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self::Memory {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    pub fn name(&self) -> String {
        match self {
            Self::Path(p) => p
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| p.display().to_string()),
            Self::Memory { name, .. } => name.clone(),
        }
    }
}

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("{name} is empty")]
    Empty { name: String },
    #[error("failed to read {name}")]
    Read {
        name: String,
        #[source]
        source: io::Error,
    },
}

/// Self-contained `data:<mime>;base64,<payload>` string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage(String);

impl EncodedImage {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn mime(&self) -> &str {
        self.0
            .strip_prefix("data:")
            .and_then(|rest| rest.split(';').next())
            .unwrap_or_default()
    }
}

impl fmt::Display for EncodedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reads the file and encodes it as a data URL. Completes exactly once.
///
/// The MIME type comes from the file name; content is not inspected.
pub async fn encode(file: &SelectedFile) -> Result<EncodedImage, EncodeError> {
    let name = file.name();
    let bytes = match file {
        SelectedFile::Path(path) => tokio::fs::read(path)
            .await
            .map_err(|source| EncodeError::Read {
                name: name.clone(),
                source,
            })?,
        SelectedFile::Memory { bytes, .. } => bytes.clone(),
    };
    if bytes.is_empty() {
        return Err(EncodeError::Empty { name });
    }

    let mime = mime_from_name(&name);
    debug!(%name, %mime, size = bytes.len(), "image encoded");
    Ok(encode_bytes(&bytes, mime))
}

pub fn encode_bytes(bytes: &[u8], mime: &str) -> EncodedImage {
    EncodedImage(format!("data:{};base64,{}", mime, Base64::encode_string(bytes)))
}

fn mime_from_name(name: &str) -> &'static str {
    let ext = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "heic" => "image/heic",
        "avif" => "image/avif",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempdir::TempDir;

    #[tokio::test]
    async fn encodes_in_memory_file() {
        let file = SelectedFile::in_memory("me.PNG", b"hello".to_vec());
        let encoded = encode(&file).await.unwrap();
        assert_eq!(encoded.as_str(), "data:image/png;base64,aGVsbG8=");
        assert_eq!(encoded.mime(), "image/png");
    }

    #[tokio::test]
    async fn reads_file_from_disk() {
        let dir = TempDir::new("encoder").unwrap();
        let path = dir.path().join("avatar.jpg");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(&[0xff, 0xd8, 0xff])
            .unwrap();

        let encoded = encode(&SelectedFile::from_path(&path)).await.unwrap();
        assert_eq!(encoded.as_str(), "data:image/jpeg;base64,/9j/");
    }

    #[tokio::test]
    async fn missing_file_reports_read_error() {
        let dir = TempDir::new("encoder").unwrap();
        let err = encode(&SelectedFile::from_path(dir.path().join("gone.png")))
            .await
            .unwrap_err();
        match err {
            EncodeError::Read { name, source } => {
                assert_eq!(name, "gone.png");
                assert_eq!(source.kind(), io::ErrorKind::NotFound);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_file_is_rejected() {
        let err = encode(&SelectedFile::in_memory("blank.png", Vec::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, EncodeError::Empty { .. }));
    }

    #[test]
    fn unknown_extension_falls_back_to_octet_stream() {
        assert_eq!(mime_from_name("notes.txt"), "application/octet-stream");
        assert_eq!(mime_from_name("noext"), "application/octet-stream");
        assert_eq!(mime_from_name("a.tar.WEBP"), "image/webp");
    }
}

//! Debug artifacts: raw source payloads written next to the run.

use std::path::PathBuf;

use tracing::{debug, warn};

use crate::{Payload, SourceId};

/// Writes `sbv_<source>.<ext>` files into one directory.
///
/// Failures are logged and swallowed; artifacts never feed back into
/// resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactWriter {
    dir: PathBuf,
}

impl ArtifactWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn file_name(source: SourceId, payload: &Payload) -> String {
        let stem = source
            .as_str()
            .trim_start_matches("sbv-")
            .replace('-', "_");
        format!("sbv_{stem}.{}", payload.extension())
    }

    pub async fn write(&self, source: SourceId, payload: &Payload) -> Option<PathBuf> {
        let path = self.dir.join(Self::file_name(source, payload));

        if let Err(error) = tokio::fs::create_dir_all(&self.dir).await {
            warn!(dir = %self.dir.display(), %error, "could not create artifact directory");
            return None;
        }

        match tokio::fs::write(&path, payload.to_text()).await {
            Ok(()) => {
                debug!(source = %source, path = %path.display(), "saved debug artifact");
                Some(path)
            }
            Err(error) => {
                warn!(source = %source, path = %path.display(), %error, "could not save debug artifact");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_follow_source_and_payload() {
        let html = Payload::Text(String::from("<html></html>"));
        let xml = Payload::Xml(String::from("<ExrateList/>"));

        assert_eq!(ArtifactWriter::file_name(SourceId::SbvEnglish, &html), "sbv_english.html");
        assert_eq!(ArtifactWriter::file_name(SourceId::Vietcombank, &xml), "sbv_vietcombank.xml");
        assert_eq!(
            ArtifactWriter::file_name(SourceId::ExchangerateApi, &Payload::Json(serde_json::json!({}))),
            "sbv_exchangerate_api.json"
        );
    }

    #[tokio::test]
    async fn writes_payload_into_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let writer = ArtifactWriter::new(dir.path().join("dumps"));

        let path = writer
            .write(SourceId::SbvApi, &Payload::Text(String::from("1 USD = 23,977 VND")))
            .await
            .expect("artifact written");

        assert_eq!(path.file_name().and_then(|n| n.to_str()), Some("sbv_api.txt"));
        let saved = std::fs::read_to_string(path).expect("readable");
        assert_eq!(saved, "1 USD = 23,977 VND");
    }

    #[tokio::test]
    async fn unwritable_directory_is_swallowed() {
        let file = tempfile::NamedTempFile::new().expect("temp file");
        let writer = ArtifactWriter::new(file.path().join("nested"));

        let written = writer
            .write(SourceId::Bidv, &Payload::Json(serde_json::json!({"usd": 1})))
            .await;
        assert_eq!(written, None);
    }
}

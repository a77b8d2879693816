use super::base::{ResultSink, StorageError};
use super::layout::ColumnLayout;
use super::types::{NoticeRow, ResultSet, HEADER};
use async_trait::async_trait;
use log::{debug, info};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use uuid::Uuid;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// CSV file sink. Written with a UTF-8 BOM so spreadsheet tools pick the
/// right encoding, and swapped in by rename so readers never see a partial
/// file.
#[derive(Debug, Clone)]
pub struct CsvSink {
    path: PathBuf,
    preview: bool,
    layout: ColumnLayout,
}

impl CsvSink {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            preview: false,
            layout: ColumnLayout::default(),
        }
    }

    /// Also write a fixed-width `.txt` rendering next to the CSV.
    pub fn with_preview(mut self, preview: bool) -> Self {
        self.preview = preview;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn preview_path(&self) -> PathBuf {
        self.path.with_extension("txt")
    }

    fn temp_path(&self, target: &Path) -> PathBuf {
        let name = target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "results".to_string());
        target.with_file_name(format!(".{}.{}.tmp", name, Uuid::now_v7()))
    }

    fn write_atomically(&self, target: &Path, bytes: &[u8]) -> Result<(), StorageError> {
        if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let temp = self.temp_path(target);
        let written = fs::write(&temp, bytes).and_then(|_| fs::rename(&temp, target));
        if let Err(e) = written {
            let _ = fs::remove_file(&temp);
            return Err(e.into());
        }
        Ok(())
    }

    fn encode(rows: &[NoticeRow]) -> Result<Vec<u8>, StorageError> {
        let mut buffer = Vec::new();
        buffer.write_all(UTF8_BOM)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(buffer);
        writer.write_record(HEADER)?;
        for row in rows {
            writer.serialize(row)?;
        }
        writer
            .into_inner()
            .map_err(|e| StorageError::SerializationError(e.to_string()))
    }

    fn decode(bytes: &[u8]) -> Result<ResultSet, StorageError> {
        let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(bytes);

        let headers = reader.headers()?.clone();
        if !headers.iter().any(|h| h == "NoticeNumber") {
            return Err(StorageError::SchemaError(format!(
                "missing NoticeNumber column, found {:?}",
                headers.iter().collect::<Vec<_>>()
            )));
        }

        let mut rows = Vec::new();
        for record in reader.deserialize::<NoticeRow>() {
            rows.push(record?);
        }
        Ok(rows)
    }
}

#[async_trait]
impl ResultSink for CsvSink {
    fn describe(&self) -> String {
        format!("csv:{}", self.path.display())
    }

    async fn load(&self) -> Result<Option<ResultSet>, StorageError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No existing sink at {}", self.path.display());
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let rows = Self::decode(&bytes)?;
        debug!("Loaded {} row(s) from {}", rows.len(), self.path.display());
        Ok(Some(rows))
    }

    async fn store(&self, rows: &ResultSet) -> Result<(), StorageError> {
        let bytes = Self::encode(rows)?;
        self.write_atomically(&self.path, &bytes)?;
        info!("Wrote {} row(s) to {}", rows.len(), self.path.display());

        if self.preview {
            let preview = self.layout.render_table(rows);
            self.write_atomically(&self.preview_path(), preview.as_bytes())?;
            debug!("Wrote preview to {}", self.preview_path().display());
        }
        Ok(())
    }
}

use std::env;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use chrono::{NaiveDate, NaiveTime, SecondsFormat};
use tracing::{info, warn};

use crate::error::{ApiError, AppError};
use crate::http::HttpClient;
use crate::http::dto::ExcelResponse;
use crate::models::{ExportFile, ExportKind, XLSX_MIME};
use crate::notice::Notice;

pub const STUDENTS_EXCEL_PATH: &str = "/get_students_excel";
pub const ATTENDANCE_EXCEL_PATH: &str = "/get_attendance_excel";
pub const ROSTER_EXPORT_NAME: &str = "students";
pub const DEFAULT_EXPORT_DIR: &str = "downloads";

#[derive(Clone, Debug)]
pub struct ExportConfig {
    pub export_dir: PathBuf,
}

impl ExportConfig {
    pub fn new_from_env() -> Self {
        let export_dir = env::var("ROLLCALL_EXPORT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_EXPORT_DIR));
        Self { export_dir }
    }
}

/// The attendance export endpoint takes a full timestamp; midnight UTC of
/// the chosen day is sent.
pub fn attendance_export_param(date: NaiveDate) -> String {
    date.and_time(NaiveTime::MIN)
        .and_utc()
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    Granted,
    Denied,
    Unavailable,
}

#[async_trait]
pub trait StoragePermission: Send + Sync {
    async fn request(&self) -> PermissionState;
}

#[async_trait]
pub trait FileWriter: Send + Sync {
    async fn write(&self, file: &ExportFile) -> Result<PathBuf, AppError>;
}

/// Hands a file to whatever the platform uses for sharing. Fire and forget.
pub trait ShareSheet: Send + Sync {
    fn share(&self, title: &str, file: &ExportFile);
}

pub struct DirectoryPermission {
    dir: PathBuf,
}

impl DirectoryPermission {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl StoragePermission for DirectoryPermission {
    async fn request(&self) -> PermissionState {
        if let Err(e) = tokio::fs::create_dir_all(&self.dir).await {
            warn!("cannot create export dir {}: {}", self.dir.display(), e);
            return match e.kind() {
                ErrorKind::PermissionDenied => PermissionState::Denied,
                _ => PermissionState::Unavailable,
            };
        }
        match tokio::fs::metadata(&self.dir).await {
            Ok(meta) if meta.is_dir() && !meta.permissions().readonly() => PermissionState::Granted,
            Ok(_) => PermissionState::Denied,
            Err(_) => PermissionState::Unavailable,
        }
    }
}

pub struct DownloadsWriter {
    dir: PathBuf,
}

impl DownloadsWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

/// Keeps only the last path component so a server-supplied name cannot
/// escape the export directory.
fn safe_file_name(file: &ExportFile) -> String {
    let name = file.file_name_with_extension();
    Path::new(&name)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| *n != ".xlsx")
        .map(str::to_string)
        .unwrap_or_else(|| "export.xlsx".to_string())
}

#[async_trait]
impl FileWriter for DownloadsWriter {
    async fn write(&self, file: &ExportFile) -> Result<PathBuf, AppError> {
        let bytes = B64
            .decode(file.data.trim())
            .map_err(|e| AppError::Decode(e.to_string()))?;
        let file_name = safe_file_name(file);
        let path = self.dir.join(&file_name);

        let io_err = |source| AppError::Write {
            file_name: file_name.clone(),
            dir: self.dir.clone(),
            source,
        };
        tokio::fs::create_dir_all(&self.dir).await.map_err(io_err)?;
        tokio::fs::write(&path, bytes).await.map_err(io_err)?;

        info!("Saved {}", path.display());
        Ok(path)
    }
}

pub struct LogShareSheet;

impl ShareSheet for LogShareSheet {
    fn share(&self, title: &str, file: &ExportFile) {
        info!(
            "share '{}': {} as {} ({} base64 bytes)",
            title,
            file.file_name_with_extension(),
            XLSX_MIME,
            file.data.len()
        );
    }
}

#[derive(Debug)]
pub struct ExportOutcome {
    pub file: ExportFile,
    pub saved_to: Result<PathBuf, AppError>,
}

impl ExportOutcome {
    pub fn notice(&self) -> Notice {
        let name = self.file.file_name_with_extension();
        match &self.saved_to {
            Ok(_) => Notice::success(format!("File {} saved to Downloads directory", name)),
            Err(AppError::PermissionDenied) => Notice::error("Storage permission is denied"),
            Err(_) => Notice::error(format!(
                "Failed to save file {} in Downloads directory",
                name
            )),
        }
    }
}

pub struct ReportService {
    http: Arc<dyn HttpClient>,
    permission: Arc<dyn StoragePermission>,
    writer: Arc<dyn FileWriter>,
    share: Arc<dyn ShareSheet>,
}

impl ReportService {
    pub fn new(
        http: Arc<dyn HttpClient>,
        permission: Arc<dyn StoragePermission>,
        writer: Arc<dyn FileWriter>,
        share: Arc<dyn ShareSheet>,
    ) -> Self {
        Self {
            http,
            permission,
            writer,
            share,
        }
    }

    /// Desktop wiring: everything lands in `config.export_dir`.
    pub fn with_export_dir(http: Arc<dyn HttpClient>, config: &ExportConfig) -> Self {
        Self::new(
            http,
            Arc::new(DirectoryPermission::new(&config.export_dir)),
            Arc::new(DownloadsWriter::new(&config.export_dir)),
            Arc::new(LogShareSheet),
        )
    }

    pub async fn fetch_export(&self, kind: ExportKind) -> Result<ExportFile, ApiError> {
        match kind {
            ExportKind::Roster => {
                let body: ExcelResponse =
                    self.http.get(STUDENTS_EXCEL_PATH, &[]).await.decode(200)?;
                Ok(ExportFile {
                    file_name: ROSTER_EXPORT_NAME.to_string(),
                    data: body.data,
                })
            }
            ExportKind::Attendance(date) => {
                let body: ExcelResponse = self
                    .http
                    .get(ATTENDANCE_EXCEL_PATH, &[("date", attendance_export_param(date))])
                    .await
                    .decode(200)?;
                let file_name = body
                    .file_name
                    .filter(|n| !n.trim().is_empty())
                    .unwrap_or_else(|| format!("attendance_{}", date.format("%Y-%m-%d")));
                Ok(ExportFile {
                    file_name,
                    data: body.data,
                })
            }
        }
    }

    pub async fn save(&self, file: &ExportFile) -> Result<PathBuf, AppError> {
        match self.permission.request().await {
            PermissionState::Granted => self.writer.write(file).await,
            state => {
                warn!("storage permission {:?}, not saving {}", state, file.file_name);
                Err(AppError::PermissionDenied)
            }
        }
    }

    /// Fetches the spreadsheet, saves it if storage is available and then
    /// offers it for sharing. A failed save does not prevent sharing.
    pub async fn export(&self, kind: ExportKind) -> Result<ExportOutcome, AppError> {
        let file = self.fetch_export(kind).await?;
        let saved_to = self.save(&file).await;
        if let Err(e) = &saved_to {
            warn!("{} not saved: {}", file.file_name, e);
        }
        self.share.share(kind.title(), &file);
        Ok(ExportOutcome { file, saved_to })
    }

    /// Same as [`ReportService::export`], collapsed into the notice shown to
    /// the user.
    pub async fn export_notice(&self, kind: ExportKind) -> Notice {
        match self.export(kind).await {
            Ok(outcome) => outcome.notice(),
            Err(AppError::Api(e)) => Notice::error(e.message),
            Err(e) => Notice::error(e.to_string()),
        }
    }
}

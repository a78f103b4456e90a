use std::sync::Arc;

use crate::http::{ApiConfig, HttpClient, ReqwestHttpClient};
use crate::error::AppError;
use crate::services::{AddStudentFlow, ExportConfig, ReportService, RosterViewModel};

/// Built once at start-up; every screen gets the same client.
#[derive(Clone)]
pub struct AppState {
    pub http: Arc<dyn HttpClient>,
    pub roster: Arc<RosterViewModel>,
    pub reports: Arc<ReportService>,
}

impl AppState {
    pub fn new(http: Arc<dyn HttpClient>, export: &ExportConfig) -> Self {
        Self {
            roster: Arc::new(RosterViewModel::for_today(http.clone())),
            reports: Arc::new(ReportService::with_export_dir(http.clone(), export)),
            http,
        }
    }

    pub fn from_config(api: ApiConfig, export: &ExportConfig) -> Result<Self, AppError> {
        let http: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::new(api)?);
        Ok(Self::new(http, export))
    }

    pub fn add_student_flow(&self) -> AddStudentFlow {
        AddStudentFlow::new(self.http.clone())
    }
}

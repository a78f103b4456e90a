use chrono::NaiveDate;

pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Roster,
    Attendance(NaiveDate),
}

impl ExportKind {
    pub fn title(&self) -> &'static str {
        match self {
            ExportKind::Roster => "Students list",
            ExportKind::Attendance(_) => "Attendance list",
        }
    }
}

/// Spreadsheet as delivered by the service. The payload is kept base64
/// encoded; only the file writer decodes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub file_name: String,
    pub data: String,
}

impl ExportFile {
    pub fn file_name_with_extension(&self) -> String {
        format!("{}.xlsx", self.file_name)
    }
}

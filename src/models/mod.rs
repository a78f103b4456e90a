pub mod export;
pub mod student;

pub use export::{ExportFile, ExportKind, XLSX_MIME};
pub use student::{NewStudentRequest, Student, StudentId, UpdateAttendanceRequest};

pub mod add_student;
pub mod report;
pub mod roster;

pub use add_student::{AddStudentFlow, AddStudentForm};
pub use report::{ExportConfig, ExportOutcome, PermissionState, ReportService};
pub use roster::{LoadStatus, RosterSnapshot, RosterViewModel};

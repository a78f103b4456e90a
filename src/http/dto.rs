use serde::Deserialize;

use crate::models::Student;

#[derive(Debug, Deserialize)]
pub struct StudentsAttendanceResponse {
    pub data: StudentsData,
}

#[derive(Debug, Deserialize)]
pub struct StudentsData {
    #[serde(default)]
    pub students: Vec<Student>,
}

#[derive(Debug, Deserialize)]
pub struct ExcelResponse {
    pub data: String,
    #[serde(default, rename = "fileName")]
    pub file_name: Option<String>,
}

use std::sync::Arc;

use tracing::{info, warn};

use crate::error::AppError;
use crate::http::HttpClient;
use crate::models::NewStudentRequest;
use crate::notice::Notice;
use crate::services::roster::RosterViewModel;

pub const ADD_STUDENT_PATH: &str = "/add_student";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddStudentForm {
    pub name: String,
    pub class: String,
    pub place: String,
    /// Whether the student is present today.
    pub attendance: bool,
}

impl Default for AddStudentForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            class: String::new(),
            place: String::new(),
            attendance: true,
        }
    }
}

impl AddStudentForm {
    pub fn is_complete(&self) -> bool {
        !self.name.is_empty() && !self.class.is_empty() && !self.place.is_empty()
    }

    fn to_request(&self) -> NewStudentRequest {
        NewStudentRequest {
            name: self.name.clone(),
            class: self.class.clone(),
            place: self.place.clone(),
            attendance: self.attendance,
        }
    }
}

/// Modal flow for registering a new student. Everything the submit button
/// depends on is derived from the form and the roster when asked.
pub struct AddStudentFlow {
    http: Arc<dyn HttpClient>,
    form: AddStudentForm,
    open: bool,
    submitting: bool,
}

impl AddStudentFlow {
    pub fn new(http: Arc<dyn HttpClient>) -> Self {
        Self {
            http,
            form: AddStudentForm::default(),
            open: false,
            submitting: false,
        }
    }

    pub fn open(&mut self) {
        self.open = true;
    }

    pub fn cancel(&mut self) {
        self.form = AddStudentForm::default();
        self.open = false;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn form(&self) -> &AddStudentForm {
        &self.form
    }

    pub fn set_name(&mut self, name: &str) {
        self.form.name = name.to_string();
    }

    pub fn set_class(&mut self, class: &str) {
        self.form.class = class.to_string();
    }

    pub fn set_place(&mut self, place: &str) {
        self.form.place = place.to_string();
    }

    pub fn set_attendance(&mut self, present: bool) {
        self.form.attendance = present;
    }

    pub fn is_duplicate(&self, roster: &RosterViewModel) -> bool {
        !self.form.name.trim().is_empty() && roster.contains_name(&self.form.name)
    }

    pub fn can_submit(&self, roster: &RosterViewModel) -> bool {
        self.form.is_complete() && !self.is_duplicate(roster) && !self.submitting
    }

    /// Posts the form. On success the form is cleared, the flow closes and
    /// the roster is reloaded; on failure the form is left as entered.
    pub async fn submit(&mut self, roster: &RosterViewModel) -> Result<Notice, AppError> {
        if !self.form.is_complete() {
            return Err(AppError::InvalidForm("name, class and place are required".to_string()));
        }
        if self.is_duplicate(roster) {
            return Err(AppError::InvalidForm(format!(
                "Student with same name already exists: {}",
                self.form.name.trim()
            )));
        }
        if self.submitting {
            return Err(AppError::InvalidForm("submission already in progress".to_string()));
        }

        let body = serde_json::to_value(self.form.to_request())
            .map_err(|e| AppError::InvalidForm(e.to_string()))?;

        self.submitting = true;
        let response = self.http.post(ADD_STUDENT_PATH, body).await;
        self.submitting = false;

        match response.expect_status(201) {
            Ok(_) => {
                info!("Added student {}", self.form.name);
                self.cancel();
                if let Err(e) = roster.load().await {
                    warn!("Roster reload after adding student failed: {}", e);
                }
                Ok(Notice::success("Student added"))
            }
            Err(e) => {
                warn!("Failed to add student {}: {}", self.form.name, e);
                Ok(Notice::error("Error while adding student"))
            }
        }
    }
}

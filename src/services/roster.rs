use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{Local, NaiveDate};
use tracing::{debug, info, warn};

use crate::error::{ApiError, AppError};
use crate::http::HttpClient;
use crate::http::dto::StudentsAttendanceResponse;
use crate::models::student::normalize_name;
use crate::models::{Student, StudentId, UpdateAttendanceRequest};
use crate::notice::Notice;

pub const STUDENTS_ATTENDANCE_PATH: &str = "/get_students_attendance";
pub const UPDATE_ATTENDANCE_PATH: &str = "/update_attendance";

/// Day format the attendance endpoints key on, e.g. `03/05/21`.
pub const ROSTER_DATE_FORMAT: &str = "%d/%m/%y";

pub fn format_roster_date(date: NaiveDate) -> String {
    date.format(ROSTER_DATE_FORMAT).to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadStatus {
    #[default]
    NotLoaded,
    Loaded,
    Failed,
}

#[derive(Debug)]
struct RosterState {
    /// Day the lists below belong to.
    date: NaiveDate,
    full: Vec<Student>,
    /// Indices into `full`; the working list for toggles.
    visible: Vec<usize>,
    search: String,
    /// Records as last confirmed by the server.
    confirmed: Vec<Student>,
    load_status: LoadStatus,
    issued_ticket: u64,
    applied_ticket: u64,
    submitting: bool,
}

impl RosterState {
    fn new(date: NaiveDate) -> Self {
        Self {
            date,
            full: Vec::new(),
            visible: Vec::new(),
            search: String::new(),
            confirmed: Vec::new(),
            load_status: LoadStatus::NotLoaded,
            issued_ticket: 0,
            applied_ticket: 0,
            submitting: false,
        }
    }

    fn visible_records(&self) -> impl Iterator<Item = &Student> {
        self.visible.iter().map(|&i| &self.full[i])
    }

    fn all_checked(&self) -> bool {
        !self.visible.is_empty() && self.visible_records().all(|s| s.attendance)
    }

    fn refilter(&mut self) {
        let query = self.search.to_lowercase();
        self.visible = self
            .full
            .iter()
            .enumerate()
            .filter(|(_, s)| query.is_empty() || s.name.to_lowercase().contains(&query))
            .map(|(i, _)| i)
            .collect();
    }

    fn replace(&mut self, students: Vec<Student>, status: LoadStatus) {
        self.confirmed = students.clone();
        self.full = students;
        self.search.clear();
        self.visible = (0..self.full.len()).collect();
        self.load_status = status;
    }
}

/// Read-only view of the roster for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct RosterSnapshot {
    pub date: NaiveDate,
    pub formatted_date: String,
    pub search: String,
    pub rows: Vec<Student>,
    pub total: usize,
    pub all_checked: bool,
    pub is_loading: bool,
    pub is_submitting: bool,
    pub is_dirty: bool,
    pub load_status: LoadStatus,
}

pub struct RosterViewModel {
    http: Arc<dyn HttpClient>,
    state: Mutex<RosterState>,
}

impl RosterViewModel {
    pub fn new(http: Arc<dyn HttpClient>, date: NaiveDate) -> Self {
        Self {
            http,
            state: Mutex::new(RosterState::new(date)),
        }
    }

    pub fn for_today(http: Arc<dyn HttpClient>) -> Self {
        Self::new(http, Local::now().date_naive())
    }

    fn state(&self) -> MutexGuard<'_, RosterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn date(&self) -> NaiveDate {
        self.state().date
    }

    /// Pins the roster to another day. The records loaded for the previous
    /// day are dropped and any load still in flight for it is discarded.
    /// Returns whether the date actually changed.
    pub fn set_date(&self, date: NaiveDate) -> bool {
        let mut state = self.state();
        if state.date == date {
            return false;
        }
        info!(
            "Roster date moved from {} to {}",
            format_roster_date(state.date),
            format_roster_date(date)
        );
        state.date = date;
        state.issued_ticket += 1;
        state.applied_ticket = state.issued_ticket;
        state.replace(Vec::new(), LoadStatus::NotLoaded);
        true
    }

    /// Moves the roster to the local calendar day, e.g. after midnight.
    pub fn roll_to_today(&self) -> bool {
        self.set_date(Local::now().date_naive())
    }

    pub fn formatted_date(&self) -> String {
        format_roster_date(self.date())
    }

    /// Fetches the roster for the pinned date. A response is only applied
    /// if no newer `load` (or date change) was issued after it.
    pub async fn load(&self) -> Result<usize, ApiError> {
        let (ticket, formatted_date) = {
            let mut state = self.state();
            state.issued_ticket += 1;
            (state.issued_ticket, format_roster_date(state.date))
        };
        debug!("loading roster for {} (request #{})", formatted_date, ticket);

        let response = self
            .http
            .get(
                STUDENTS_ATTENDANCE_PATH,
                &[("formatted_date", formatted_date.clone())],
            )
            .await;
        let result = response
            .decode::<StudentsAttendanceResponse>(200)
            .map(|body| body.data.students);

        let mut state = self.state();
        if ticket < state.issued_ticket {
            warn!(
                "Discarding stale roster response #{} (newest is #{})",
                ticket, state.issued_ticket
            );
            return result.map(|students| students.len());
        }
        state.applied_ticket = ticket;

        match result {
            Ok(students) => {
                let count = students.len();
                state.replace(students, LoadStatus::Loaded);
                info!("Loaded {} students for {}", count, formatted_date);
                Ok(count)
            }
            Err(e) => {
                warn!("Failed to load roster for {}: {}", formatted_date, e);
                state.replace(Vec::new(), LoadStatus::Failed);
                Err(e)
            }
        }
    }

    pub fn set_search(&self, text: &str) {
        let mut state = self.state();
        state.search = text.to_string();
        state.refilter();
    }

    /// Flips attendance on a record of the working list and returns the new
    /// value.
    pub fn toggle(&self, id: &StudentId) -> Result<bool, AppError> {
        let mut state = self.state();
        let index = state
            .visible
            .iter()
            .copied()
            .find(|&i| state.full[i].id == *id)
            .ok_or_else(|| AppError::UnknownStudent(id.to_string()))?;

        let record = &mut state.full[index];
        record.attendance = !record.attendance;
        debug!("{} marked {}", record.name, if record.attendance { "present" } else { "absent" });
        Ok(record.attendance)
    }

    pub fn set_all_checked(&self, value: bool) {
        let mut state = self.state();
        let indices = state.visible.clone();
        for i in indices {
            state.full[i].attendance = value;
        }
    }

    pub fn all_checked(&self) -> bool {
        self.state().all_checked()
    }

    pub fn is_loading(&self) -> bool {
        let state = self.state();
        state.applied_ticket < state.issued_ticket
    }

    pub fn is_submitting(&self) -> bool {
        self.state().submitting
    }

    pub fn is_dirty(&self) -> bool {
        let state = self.state();
        state.full != state.confirmed
    }

    pub fn full_list(&self) -> Vec<Student> {
        self.state().full.clone()
    }

    pub fn visible_list(&self) -> Vec<Student> {
        self.state().visible_records().cloned().collect()
    }

    pub fn contains_name(&self, name: &str) -> bool {
        let key = normalize_name(name);
        self.state().full.iter().any(|s| s.name_key() == key)
    }

    pub fn snapshot(&self) -> RosterSnapshot {
        let state = self.state();
        RosterSnapshot {
            date: state.date,
            formatted_date: format_roster_date(state.date),
            search: state.search.clone(),
            rows: state.visible_records().cloned().collect(),
            total: state.full.len(),
            all_checked: state.all_checked(),
            is_loading: state.applied_ticket < state.issued_ticket,
            is_submitting: state.submitting,
            is_dirty: state.full != state.confirmed,
            load_status: state.load_status,
        }
    }

    /// Sends the complete roster, not just the edited rows, under the day
    /// it was loaded for. Local edits are kept whether or not the server
    /// accepts them.
    pub async fn commit(&self) -> Notice {
        let (students, formatted_date, generation) = {
            let mut state = self.state();
            if state.submitting {
                return Notice::error("Update already in progress");
            }
            if state.full.is_empty() {
                return Notice::error("Nothing to update");
            }
            state.submitting = true;
            (
                state.full.clone(),
                format_roster_date(state.date),
                state.issued_ticket,
            )
        };

        let body = serde_json::to_value(UpdateAttendanceRequest {
            formatted_date: &formatted_date,
            students: &students,
        });
        let response = match body {
            Ok(body) => self.http.put(UPDATE_ATTENDANCE_PATH, body).await,
            Err(e) => {
                warn!("Failed to encode attendance update: {}", e);
                self.state().submitting = false;
                return Notice::error("Failed to update");
            }
        };

        let mut state = self.state();
        state.submitting = false;
        match response.expect_status(200) {
            Ok(_) => {
                info!("Updated attendance of {} students for {}", students.len(), formatted_date);
                // a reload or date change since then owns `confirmed`
                if state.issued_ticket == generation {
                    state.confirmed = students;
                }
                Notice::success("Updated attendance")
            }
            Err(e) => {
                warn!("Attendance update for {} failed: {}", formatted_date, e);
                Notice::error("Failed to update")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roster_date_is_day_month_short_year() {
        let date = NaiveDate::from_ymd_opt(2021, 5, 3).unwrap();
        assert_eq!(format_roster_date(date), "03/05/21");
    }
}

pub mod attendance;

use std::str::FromStr;

use chrono::NaiveDate;
use thiserror::Error;
use tracing::debug;

use crate::error::AppError;
use crate::models::{ExportKind, StudentId};
use crate::notice::{Notice, NoticeBoard};
use crate::services::AddStudentFlow;
use crate::state::AppState;

pub const HELP: &str = "\
commands:
  show                          redraw the roster
  search <text>                 filter by student name
  clear                         clear the search
  toggle <#row | id>            flip attendance of one student
  all on|off                    mark every listed student present/absent
  commit                        send today's attendance
  refresh                       reload today's roster
  add <name>;<class>;<place>[;absent]
  cancel                        discard the add-student form
  export students
  export attendance <YYYY-MM-DD>
  help
  quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Row(usize),
    Id(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Show,
    Search(String),
    ClearSearch,
    Toggle(Target),
    All(bool),
    Commit,
    Refresh,
    Add {
        name: String,
        class: String,
        place: String,
        present: bool,
    },
    CancelAdd,
    Export(ExportKind),
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("unknown command: {0} (try `help`)")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };

        match verb {
            "" | "show" | "ls" => Ok(Command::Show),
            "search" | "/" => Ok(Command::Search(rest.to_string())),
            "clear" => Ok(Command::ClearSearch),
            "toggle" | "t" => parse_target(rest).map(Command::Toggle),
            "all" => match rest {
                "on" | "yes" | "present" => Ok(Command::All(true)),
                "off" | "no" | "absent" => Ok(Command::All(false)),
                _ => Err(CommandError::Usage("all on|off")),
            },
            "commit" | "update" => Ok(Command::Commit),
            "refresh" | "reload" => Ok(Command::Refresh),
            "add" => parse_add(rest),
            "cancel" => Ok(Command::CancelAdd),
            "export" => parse_export(rest),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" | "q" => Ok(Command::Quit),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

fn parse_target(rest: &str) -> Result<Target, CommandError> {
    if rest.is_empty() {
        return Err(CommandError::Usage("toggle <#row | id>"));
    }
    match rest.strip_prefix('#').map(str::parse::<usize>) {
        Some(Ok(row)) if row > 0 => Ok(Target::Row(row)),
        Some(_) => Err(CommandError::Usage("toggle <#row | id>")),
        None => Ok(Target::Id(rest.to_string())),
    }
}

fn parse_add(rest: &str) -> Result<Command, CommandError> {
    const USAGE: &str = "add <name>;<class>;<place>[;absent]";
    let parts: Vec<&str> = rest.split(';').map(str::trim).collect();
    let present = match parts.get(3) {
        None => true,
        Some(&"absent") | Some(&"no") => false,
        Some(&"present") | Some(&"yes") => true,
        Some(_) => return Err(CommandError::Usage(USAGE)),
    };
    match parts.as_slice() {
        [name, class, place, ..] if parts.len() <= 4 => Ok(Command::Add {
            name: name.to_string(),
            class: class.to_string(),
            place: place.to_string(),
            present,
        }),
        _ => Err(CommandError::Usage(USAGE)),
    }
}

fn parse_export(rest: &str) -> Result<Command, CommandError> {
    const USAGE: &str = "export students | export attendance <YYYY-MM-DD>";
    let mut words = rest.split_whitespace();
    match (words.next(), words.next()) {
        (Some("students"), None) => Ok(Command::Export(ExportKind::Roster)),
        (Some("attendance"), Some(date)) => NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map(|d| Command::Export(ExportKind::Attendance(d)))
            .map_err(|_| CommandError::Usage(USAGE)),
        _ => Err(CommandError::Usage(USAGE)),
    }
}

/// What the front-end should do after a command ran.
#[derive(Debug, PartialEq, Eq)]
pub enum Flow {
    Continue(String),
    Quit,
}

/// One interactive session: the attendance screen, the add-student modal
/// and the report actions sharing a single `AppState`.
pub struct Session {
    state: AppState,
    add_flow: AddStudentFlow,
    notices: NoticeBoard,
}

impl Session {
    pub fn new(state: AppState) -> Self {
        let add_flow = state.add_student_flow();
        Self {
            state,
            add_flow,
            notices: NoticeBoard::new(),
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Mount: fetch today's roster and draw it.
    pub async fn start(&mut self) -> String {
        if let Err(e) = self.state.roster.load().await {
            self.notices.push(Notice::error(e.message));
        }
        self.render()
    }

    pub fn render(&mut self) -> String {
        let mut out = attendance::render(&self.state.roster.snapshot());
        if self.add_flow.is_open() {
            out.push_str(&attendance::render_add_form(self.add_flow.form()));
        }
        out.push_str(&attendance::render_notices(self.notices.active()));
        out
    }

    fn resolve(&self, target: &Target) -> Result<StudentId, AppError> {
        let rows = self.state.roster.visible_list();
        match target {
            Target::Row(row) => row
                .checked_sub(1)
                .and_then(|i| rows.get(i))
                .map(|s| s.id.clone())
                .ok_or_else(|| AppError::UnknownStudent(format!("#{}", row))),
            Target::Id(raw) => rows
                .iter()
                .find(|s| s.id.to_string() == *raw)
                .map(|s| s.id.clone())
                .ok_or_else(|| AppError::UnknownStudent(raw.clone())),
        }
    }

    pub async fn handle(&mut self, command: Command) -> Flow {
        debug!("command {:?}", command);
        let roster = self.state.roster.clone();
        match command {
            Command::Quit => return Flow::Quit,
            Command::Help => return Flow::Continue(format!("{}\n", HELP)),
            Command::Show => {}
            Command::Search(text) => roster.set_search(&text),
            Command::ClearSearch => roster.set_search(""),
            Command::Toggle(target) => {
                if let Err(e) = self.resolve(&target).and_then(|id| roster.toggle(&id)) {
                    self.notices.push(Notice::error(e.to_string()));
                }
            }
            Command::All(value) => roster.set_all_checked(value),
            Command::Commit => {
                let notice = roster.commit().await;
                self.notices.push(notice);
            }
            Command::Refresh => {
                roster.roll_to_today();
                if let Err(e) = roster.load().await {
                    self.notices.push(Notice::error(e.message));
                }
            }
            Command::Add {
                name,
                class,
                place,
                present,
            } => {
                self.add_flow.open();
                self.add_flow.set_name(&name);
                self.add_flow.set_class(&class);
                self.add_flow.set_place(&place);
                self.add_flow.set_attendance(present);
                let notice = self
                    .add_flow
                    .submit(&roster)
                    .await
                    .unwrap_or_else(|e| Notice::error(e.to_string()));
                self.notices.push(notice);
            }
            Command::CancelAdd => self.add_flow.cancel(),
            Command::Export(kind) => {
                let notice = self.state.reports.export_notice(kind).await;
                self.notices.push(notice);
            }
        }
        Flow::Continue(self.render())
    }
}

use std::fmt::Write;

use crate::notice::{Notice, NoticeLevel};
use crate::services::{AddStudentForm, LoadStatus, RosterSnapshot};

const NAME_WIDTH: usize = 24;

fn checkbox(checked: bool) -> &'static str {
    if checked { "[x]" } else { "[ ]" }
}

pub fn render(snapshot: &RosterSnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Date: {}", snapshot.formatted_date);
    if !snapshot.search.is_empty() {
        let _ = writeln!(
            out,
            "Search: {} ({} of {})",
            snapshot.search,
            snapshot.rows.len(),
            snapshot.total
        );
    }
    let _ = writeln!(
        out,
        "{:>3}  {:<width$} Attendance {} All",
        "#",
        "Students",
        checkbox(snapshot.all_checked),
        width = NAME_WIDTH
    );

    if snapshot.is_loading {
        let _ = writeln!(out, "Loading...");
    }

    for (row, student) in snapshot.rows.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>3}  {:<width$} {}        id={}",
            row + 1,
            student.name,
            checkbox(student.attendance),
            student.id,
            width = NAME_WIDTH
        );
    }

    if !snapshot.is_loading && snapshot.rows.is_empty() {
        let line = match snapshot.load_status {
            LoadStatus::Failed => "Could not load roster",
            LoadStatus::NotLoaded => "Roster not loaded",
            LoadStatus::Loaded => "No results found",
        };
        let _ = writeln!(out, "{}", line);
    }

    if snapshot.is_submitting {
        let _ = writeln!(out, "Updating...");
    } else if snapshot.is_dirty {
        let _ = writeln!(out, "Unsaved changes, run `commit` to update");
    }
    out
}

/// Form left open after a rejected submit, so it can be corrected.
pub fn render_add_form(form: &AddStudentForm) -> String {
    format!(
        "Add student (not saved): {}; {}; {}; {}  (`add` again or `cancel`)\n",
        form.name,
        form.class,
        form.place,
        if form.attendance { "present" } else { "absent" }
    )
}

pub fn render_notices(notices: &[Notice]) -> String {
    notices
        .iter()
        .map(|n| match n.level {
            NoticeLevel::Success => format!("ok: {}\n", n.message),
            NoticeLevel::Error => format!("error: {}\n", n.message),
        })
        .collect()
}

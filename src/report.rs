//! Human-readable renderings of a snapshot: the post-submission summary, the
//! JSON export and the printable document.

use std::{
    fmt,
    path::{Path, PathBuf},
};

use crate::{
    errors::Result,
    form::{
        field::{EMAIL, FIRST_NAME, GRADE, LAST_NAME, PHONE, SCHOOL, STUDENT_ID},
        FormSnapshot,
    },
    utils::persistence::write_atomic,
};

/// Key fields echoed back after a successful submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionSummary {
    pub name: String,
    pub email: String,
    pub student_id: String,
    pub school: String,
    pub grade: String,
}

impl SubmissionSummary {
    pub fn from_snapshot(snapshot: &FormSnapshot) -> Self {
        Self {
            name: full_name(snapshot),
            email: snapshot.value_or_empty(EMAIL).to_string(),
            student_id: snapshot.value_or_empty(STUDENT_ID).to_string(),
            school: snapshot.value_or_empty(SCHOOL).to_string(),
            grade: snapshot.value_or_empty(GRADE).to_string(),
        }
    }

    pub fn rows(&self) -> [(&'static str, &str); 5] {
        [
            ("Name", self.name.as_str()),
            ("Email", self.email.as_str()),
            ("Student ID", self.student_id.as_str()),
            ("School", self.school.as_str()),
            ("Grade", self.grade.as_str()),
        ]
    }
}

impl fmt::Display for SubmissionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Submission Summary")?;
        for (label, value) in self.rows() {
            writeln!(f, "{}: {}", label, value)?;
        }
        Ok(())
    }
}

fn full_name(snapshot: &FormSnapshot) -> String {
    format!(
        "{} {}",
        snapshot.value_or_empty(FIRST_NAME),
        snapshot.value_or_empty(LAST_NAME)
    )
    .trim()
    .to_string()
}

/// Pretty-printed JSON of every field, empty ones included.
pub fn export_json(snapshot: &FormSnapshot) -> Result<String> {
    Ok(serde_json::to_string_pretty(snapshot)?)
}

/// Writes the export to `path`. A directory target receives `file_name`.
pub fn write_export(snapshot: &FormSnapshot, path: &Path, file_name: &str) -> Result<PathBuf> {
    let target = if path.is_dir() {
        path.join(file_name)
    } else {
        path.to_path_buf()
    };
    write_atomic(&target, &export_json(snapshot)?)?;
    tracing::debug!(path = %target.display(), "form data exported");
    Ok(target)
}

/// Printable document with the personal and academic sections.
pub fn print_view(snapshot: &FormSnapshot) -> String {
    let phone = match snapshot.value_or_empty(PHONE) {
        "" => "N/A",
        value => value,
    };
    let sections: [(&str, Vec<(&str, String)>); 2] = [
        (
            "Personal Information",
            vec![
                ("Name", full_name(snapshot)),
                ("Email", snapshot.value_or_empty(EMAIL).to_string()),
                ("Phone", phone.to_string()),
            ],
        ),
        (
            "Academic Information",
            vec![
                ("Student ID", snapshot.value_or_empty(STUDENT_ID).to_string()),
                ("School", snapshot.value_or_empty(SCHOOL).to_string()),
                ("Grade", snapshot.value_or_empty(GRADE).to_string()),
            ],
        ),
    ];

    let mut out = String::from("Student Information\n===================\n");
    for (title, rows) in sections {
        out.push('\n');
        out.push_str(title);
        out.push('\n');
        out.push_str(&"-".repeat(title.len()));
        out.push('\n');
        for (label, value) in rows {
            out.push_str(&format!("{}: {}\n", label, value));
        }
    }
    out
}

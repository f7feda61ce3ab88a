use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::FromRow;

/// Database representation of one applicant submission.
///
/// Rows are append-only: nothing in the service updates or deletes them,
/// and `id` values are never reused.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ApplicantRow {
    pub id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub position: String,
    pub cover_letter: Option<String>,
    /// Generated storage key of the resume artifact, if one was uploaded
    pub resume_file: Option<String>,
    /// Filename the applicant uploaded under, kept for re-presentation
    pub original_filename: Option<String>,
    pub created_at: NaiveDateTime,
}

impl ApplicantRow {
    /// Applicant's display name for email greetings
    pub fn full_name(&self) -> String {
        match (self.first_name.as_deref(), self.last_name.as_deref()) {
            (Some(first), Some(last)) => format!("{} {}", first, last),
            (Some(first), None) => first.to_string(),
            (None, Some(last)) => last.to_string(),
            (None, None) => "Applicant".to_string(),
        }
    }
}

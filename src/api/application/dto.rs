use actix_multipart::form::{tempfile::TempFile, text::Text, MultipartForm};
use chrono::NaiveDateTime;
use serde::Serialize;

use super::models::ApplicantSubmission;
use crate::db::models::ApplicantRow;

/// Multipart form for POST /apply. All text fields optional at the
/// transport level; required-ness is enforced on the validated model.
#[derive(MultipartForm)]
pub struct ApplyForm {
    #[multipart(rename = "firstName")]
    pub first_name: Option<Text<String>>,

    #[multipart(rename = "lastName")]
    pub last_name: Option<Text<String>>,

    pub email: Option<Text<String>>,

    pub phone: Option<Text<String>>,

    pub position: Option<Text<String>>,

    #[multipart(rename = "coverLetter")]
    pub cover_letter: Option<Text<String>>,

    pub resume: Option<TempFile>,
}

impl ApplyForm {
    /// Split the form into the structured submission and the spooled
    /// upload. Blank text fields collapse to None.
    pub fn into_parts(self) -> (ApplicantSubmission, Option<TempFile>) {
        fn text(field: Option<Text<String>>) -> Option<String> {
            field
                .map(|t| t.into_inner())
                .filter(|s| !s.trim().is_empty())
        }

        let submission = ApplicantSubmission {
            first_name: text(self.first_name),
            last_name: text(self.last_name),
            email: text(self.email).unwrap_or_default(),
            phone: text(self.phone),
            position: text(self.position).unwrap_or_default(),
            cover_letter: text(self.cover_letter),
        };

        (submission, self.resume)
    }
}

/// Response for POST /apply
#[derive(Serialize)]
pub struct ApplyResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
}

/// Error body shared by every failure response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
}

/// One applicant record as served to review clients, annotated with the
/// fully qualified download URL of its resume when one exists.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicantView {
    pub id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub position: String,
    pub cover_letter: Option<String>,
    pub resume_file: Option<String>,
    pub resume_url: Option<String>,
    pub created_at: NaiveDateTime,
}

impl ApplicantView {
    pub fn from_row(row: ApplicantRow, base_url: &str) -> Self {
        let resume_url = row
            .resume_file
            .as_ref()
            .map(|key| format!("{}/uploads/{}", base_url.trim_end_matches('/'), key));

        Self {
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            phone: row.phone,
            position: row.position,
            cover_letter: row.cover_letter,
            resume_file: row.resume_file,
            resume_url,
            created_at: row.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn row(resume: Option<&str>) -> ApplicantRow {
        ApplicantRow {
            id: 3,
            first_name: Some("Ada".to_string()),
            last_name: None,
            email: "ada@example.com".to_string(),
            phone: None,
            position: "Engineer".to_string(),
            cover_letter: None,
            resume_file: resume.map(str::to_string),
            original_filename: resume.map(|_| "cv.pdf".to_string()),
            created_at: Utc::now().naive_utc(),
        }
    }

    #[test]
    fn view_resolves_resume_url_against_base() {
        let view = ApplicantView::from_row(row(Some("k.pdf")), "http://jobs.example.com/");
        assert_eq!(
            view.resume_url.as_deref(),
            Some("http://jobs.example.com/uploads/k.pdf")
        );
    }

    #[test]
    fn view_without_resume_has_no_url() {
        let view = ApplicantView::from_row(row(None), "http://jobs.example.com");
        assert!(view.resume_url.is_none());
    }

    #[test]
    fn view_serializes_camel_case_with_null_resume_url() {
        let value = serde_json::to_value(ApplicantView::from_row(row(None), "http://h")).unwrap();
        assert!(value.get("firstName").is_some());
        assert!(value.get("createdAt").is_some());
        assert!(value.get("resumeUrl").unwrap().is_null());
    }
}

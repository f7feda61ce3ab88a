use chrono::Utc;
use sqlx::{Pool, Sqlite};
use tracing::debug;

use crate::api::application::ApplicantSubmission;
use crate::db::models::ApplicantRow;
use crate::storage::StoredResume;

/// Repository for applicant database operations
pub struct ApplicantRepository;

impl ApplicantRepository {
    /// Insert a new applicant record and return the full row.
    ///
    /// `created_at` is assigned here; `id` comes from the store's
    /// AUTOINCREMENT sequence. The resume reference, when present, must
    /// point at an artifact that was already written (the orchestrator
    /// stores the file before calling this).
    pub async fn insert(
        pool: &Pool<Sqlite>,
        submission: &ApplicantSubmission,
        resume: Option<&StoredResume>,
    ) -> Result<ApplicantRow, sqlx::Error> {
        debug!(
            "Inserting applicant: email={}, position={}, resume={:?}",
            submission.email,
            submission.position,
            resume.map(|r| r.key.as_str())
        );

        let created_at = Utc::now().naive_utc();

        let row = sqlx::query_as::<_, ApplicantRow>(
            r#"
            INSERT INTO applicants
                (first_name, last_name, email, phone, position, cover_letter,
                 resume_file, original_filename, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            RETURNING id, first_name, last_name, email, phone, position,
                      cover_letter, resume_file, original_filename, created_at
            "#,
        )
        .bind(&submission.first_name)
        .bind(&submission.last_name)
        .bind(&submission.email)
        .bind(&submission.phone)
        .bind(&submission.position)
        .bind(&submission.cover_letter)
        .bind(resume.map(|r| r.key.as_str()))
        .bind(resume.map(|r| r.original_filename.as_str()))
        .bind(created_at)
        .fetch_one(pool)
        .await?;

        debug!("Applicant created with id={}", row.id);
        Ok(row)
    }

    /// Fetch a single record by id
    pub async fn find_by_id(
        pool: &Pool<Sqlite>,
        id: i64,
    ) -> Result<Option<ApplicantRow>, sqlx::Error> {
        sqlx::query_as::<_, ApplicantRow>(
            r#"
            SELECT id, first_name, last_name, email, phone, position,
                   cover_letter, resume_file, original_filename, created_at
            FROM applicants
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// All records, most recent first.
    ///
    /// The descending created_at order is a contract (it drives the review
    /// UI); id breaks ties between rows inserted in the same instant.
    pub async fn list_all(pool: &Pool<Sqlite>) -> Result<Vec<ApplicantRow>, sqlx::Error> {
        sqlx::query_as::<_, ApplicantRow>(
            r#"
            SELECT id, first_name, last_name, email, phone, position,
                   cover_letter, resume_file, original_filename, created_at
            FROM applicants
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(pool)
        .await
    }
}

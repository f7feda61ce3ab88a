use actix_web::{HttpResponse, ResponseError};
use mime::Mime;
use sqlx::{Pool, Sqlite};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use super::dto::{ApplicantView, ErrorResponse};
use super::models::ApplicantSubmission;
use crate::db::applicant_repository::ApplicantRepository;
use crate::db::models::ApplicantRow;
use crate::mailer::{compose, Mailer};
use crate::storage::{IntakeError, ResumeStore};

/// Service-level errors
#[derive(Debug)]
pub enum ServiceError {
    /// Uploaded file type is not accepted
    UnsupportedMediaType(String),

    /// Uploaded file exceeds the size ceiling
    PayloadTooLarge { size: usize, limit: usize },

    /// Submission fields failed validation
    Invalid(String),

    /// Record, resume reference, or artifact missing
    NotFound(i64),

    /// Database operation failed
    Persistence(sqlx::Error),

    /// Artifact storage failed
    Storage(std::io::Error),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::UnsupportedMediaType(ty) => {
                write!(f, "Unsupported file type: {}. Only PDF and Word documents are accepted", ty)
            }
            ServiceError::PayloadTooLarge { size, limit } => {
                write!(f, "File is too large: {} bytes exceeds the {} byte limit", size, limit)
            }
            ServiceError::Invalid(msg) => write!(f, "Validation error: {}", msg),
            ServiceError::NotFound(id) => write!(f, "Applicant {} not found", id),
            ServiceError::Persistence(e) => write!(f, "Database error: {}", e),
            ServiceError::Storage(e) => write!(f, "Storage error: {}", e),
        }
    }
}

impl std::error::Error for ServiceError {}

impl From<IntakeError> for ServiceError {
    fn from(e: IntakeError) -> Self {
        match e {
            IntakeError::UnsupportedMediaType(ty) => ServiceError::UnsupportedMediaType(ty),
            IntakeError::PayloadTooLarge { size, limit } => {
                ServiceError::PayloadTooLarge { size, limit }
            }
            IntakeError::Io(e) => ServiceError::Storage(e),
        }
    }
}

impl ResponseError for ServiceError {
    fn error_response(&self) -> HttpResponse {
        let body = |message: String| ErrorResponse {
            success: false,
            message,
        };

        match self {
            ServiceError::UnsupportedMediaType(_) => {
                warn!("Rejected upload: {}", self);
                HttpResponse::UnsupportedMediaType().json(body(self.to_string()))
            }
            ServiceError::PayloadTooLarge { .. } => {
                warn!("Rejected upload: {}", self);
                HttpResponse::PayloadTooLarge().json(body(self.to_string()))
            }
            ServiceError::Invalid(_) => {
                warn!("{}", self);
                HttpResponse::BadRequest().json(body(self.to_string()))
            }
            ServiceError::NotFound(_) => {
                warn!("{}", self);
                HttpResponse::NotFound().json(body(self.to_string()))
            }
            ServiceError::Persistence(e) => {
                error!("Database error: {}", e);
                HttpResponse::InternalServerError()
                    .json(body("Failed to save application".to_string()))
            }
            ServiceError::Storage(e) => {
                error!("Storage error: {}", e);
                HttpResponse::InternalServerError()
                    .json(body("Failed to store uploaded file".to_string()))
            }
        }
    }
}

/// An upload as it arrives from the multipart layer, spooled to a
/// temporary file.
pub struct ResumeUpload<'a> {
    pub path: &'a Path,
    pub original_filename: Option<&'a str>,
    pub content_type: Option<&'a Mime>,
    pub size: usize,
}

/// Result of one accepted submission
pub struct SubmissionOutcome {
    pub record: ApplicantRow,
    /// Some(false) when a delivery attempt was made and failed;
    /// None when notification is disabled.
    pub email_delivered: Option<bool>,
}

/// Prepared file download: resolved path plus the filename suggested to
/// the client.
pub struct ResumeDownload {
    pub path: PathBuf,
    pub suggested_filename: String,
}

/// Orchestrates the submission pipeline and the read-only queries.
///
/// Dependencies are injected at construction: the record store, the
/// artifact store, an optional notifier, and the externally visible base
/// URL used to resolve resume links.
#[derive(Clone)]
pub struct ApplicationService {
    pool: Pool<Sqlite>,
    store: ResumeStore,
    mailer: Option<Mailer>,
    base_url: String,
}

impl ApplicationService {
    pub fn new(
        pool: Pool<Sqlite>,
        store: ResumeStore,
        mailer: Option<Mailer>,
        base_url: String,
    ) -> Self {
        Self {
            pool,
            store,
            mailer,
            base_url,
        }
    }

    /// Run one submission through the pipeline:
    /// validate + store artifact -> insert record -> notify.
    ///
    /// The first two steps are hard: a rejected or unstorable file ends
    /// the submission before any record is written, and a failed insert
    /// ends it with a server error (the already-written artifact is left
    /// orphaned; see the warn log). Notification is soft: the record is
    /// durable by then, so a failed delivery is reported in the outcome
    /// but the submission still succeeds.
    pub async fn submit(
        &self,
        submission: ApplicantSubmission,
        resume: Option<ResumeUpload<'_>>,
    ) -> Result<SubmissionOutcome, ServiceError> {
        info!(
            "Service: Handling submission for position={} email={}",
            submission.position, submission.email
        );

        let stored = match resume {
            Some(upload) => {
                let stored = self.store.save(
                    upload.path,
                    upload.original_filename,
                    upload.content_type,
                    upload.size,
                )?;
                info!("Service: Stored resume artifact key={}", stored.key);
                Some(stored)
            }
            None => None,
        };

        let record = ApplicantRepository::insert(&self.pool, &submission, stored.as_ref())
            .await
            .map_err(|e| {
                if let Some(stored) = &stored {
                    // Known limitation: no cleanup pass, the artifact stays
                    // behind for operators to reap.
                    warn!(
                        "Service: Insert failed after artifact {} was written; artifact is orphaned",
                        stored.key
                    );
                }
                ServiceError::Persistence(e)
            })?;

        info!("Service: Applicant record created with id={}", record.id);

        let email_delivered = match &self.mailer {
            Some(mailer) => Some(self.notify(mailer, &record).await),
            None => None,
        };

        Ok(SubmissionOutcome {
            record,
            email_delivered,
        })
    }

    /// Single delivery attempt. Returns whether it succeeded; failure is
    /// logged and never unwinds the committed record.
    async fn notify(&self, mailer: &Mailer, record: &ApplicantRow) -> bool {
        let resume_url = self.resume_url(record);
        let content = compose(record, resume_url.as_deref());

        let attachment_bytes = match &record.resume_file {
            Some(key) => match self.store.read(key) {
                Ok(bytes) => Some(bytes),
                Err(e) => {
                    warn!("Service: Could not read artifact {} for attachment: {}", key, e);
                    None
                }
            },
            None => None,
        };

        match mailer
            .send_confirmation(&record.email, &content, attachment_bytes)
            .await
        {
            Ok(()) => {
                info!("Service: Confirmation email sent to {}", record.email);
                true
            }
            Err(e) => {
                warn!(
                    "Service: Confirmation email to {} failed (record {} is saved): {}",
                    record.email, record.id, e
                );
                false
            }
        }
    }

    /// All records, most recent first, annotated with resume URLs
    pub async fn list(&self) -> Result<Vec<ApplicantView>, ServiceError> {
        let rows = ApplicantRepository::list_all(&self.pool)
            .await
            .map_err(ServiceError::Persistence)?;

        Ok(rows
            .into_iter()
            .map(|row| ApplicantView::from_row(row, &self.base_url))
            .collect())
    }

    /// One record by id, annotated with its resume URL
    pub async fn get(&self, id: i64) -> Result<ApplicantView, ServiceError> {
        let row = ApplicantRepository::find_by_id(&self.pool, id)
            .await
            .map_err(ServiceError::Persistence)?
            .ok_or(ServiceError::NotFound(id))?;

        Ok(ApplicantView::from_row(row, &self.base_url))
    }

    /// Resolve a resume download, re-checking that the artifact still
    /// exists on disk (it may have been removed externally).
    pub async fn resume_download(&self, id: i64) -> Result<ResumeDownload, ServiceError> {
        let record = ApplicantRepository::find_by_id(&self.pool, id)
            .await
            .map_err(ServiceError::Persistence)?
            .ok_or(ServiceError::NotFound(id))?;

        let key = record.resume_file.ok_or(ServiceError::NotFound(id))?;

        if !self.store.exists(&key) {
            warn!("Service: Artifact {} for applicant {} is missing on disk", key, id);
            return Err(ServiceError::NotFound(id));
        }

        let extension = Path::new(&key)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e))
            .unwrap_or_default();

        let first_name = record
            .first_name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| "resume".to_string());

        Ok(ResumeDownload {
            path: self.store.path_of(&key),
            suggested_filename: format!("{}{}", first_name, extension),
        })
    }

    fn resume_url(&self, record: &ApplicantRow) -> Option<String> {
        record
            .resume_file
            .as_ref()
            .map(|key| format!("{}/uploads/{}", self.base_url.trim_end_matches('/'), key))
    }
}

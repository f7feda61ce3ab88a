use actix_files::NamedFile;
use actix_multipart::form::MultipartForm;
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{
    get, post,
    web::{Data, Path, ServiceConfig},
    HttpRequest, HttpResponse,
};
use validator::Validate;

use super::dto::{ApplyForm, ApplyResponse};
use super::service::{ApplicationService, ResumeUpload, ServiceError};

/// POST /apply — run one submission through the orchestrator
#[post("/apply")]
async fn apply(
    service: Data<ApplicationService>,
    MultipartForm(form): MultipartForm<ApplyForm>,
) -> Result<HttpResponse, ServiceError> {
    let (submission, resume) = form.into_parts();

    submission.validate().map_err(|errors| {
        let messages: Vec<String> = errors
            .field_errors()
            .values()
            .flat_map(|errs| {
                errs.iter().map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Validation error".to_string())
                })
            })
            .collect();
        ServiceError::Invalid(messages.join("; "))
    })?;

    let upload = resume.as_ref().map(|file| ResumeUpload {
        path: file.file.path(),
        original_filename: file.file_name.as_deref(),
        content_type: file.content_type.as_ref(),
        size: file.size,
    });

    let outcome = service.submit(submission, upload).await?;

    let message = match outcome.email_delivered {
        Some(false) => {
            "Application received, but the confirmation email could not be sent".to_string()
        }
        _ => "Application received".to_string(),
    };

    Ok(HttpResponse::Ok().json(ApplyResponse {
        success: true,
        message,
        id: Some(outcome.record.id),
    }))
}

/// GET /applicants — all records, most recent first
#[get("/applicants")]
async fn list_applicants(
    service: Data<ApplicationService>,
) -> Result<HttpResponse, ServiceError> {
    let views = service.list().await?;
    Ok(HttpResponse::Ok().json(views))
}

/// GET /applicants/{id}
#[get("/applicants/{id}")]
async fn get_applicant(
    service: Data<ApplicationService>,
    path: Path<i64>,
) -> Result<HttpResponse, ServiceError> {
    let view = service.get(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(view))
}

/// GET /resume/{id} — stream the stored artifact back, suggesting a
/// filename built from the applicant's first name and the artifact's
/// extension.
#[get("/resume/{id}")]
async fn download_resume(
    service: Data<ApplicationService>,
    path: Path<i64>,
    req: HttpRequest,
) -> Result<HttpResponse, ServiceError> {
    let id = path.into_inner();
    let download = service.resume_download(id).await?;

    // The existence check in resume_download can race an external delete;
    // treat an open failure the same as a missing artifact.
    let file = NamedFile::open(&download.path).map_err(|_| ServiceError::NotFound(id))?;

    let response = file
        .set_content_disposition(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(download.suggested_filename)],
        })
        .into_response(&req);

    Ok(response)
}

pub fn application_config(config: &mut ServiceConfig) {
    config
        .service(apply)
        .service(list_applicants)
        .service(get_applicant)
        .service(download_resume);
}

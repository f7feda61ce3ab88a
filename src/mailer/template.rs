//! Confirmation email composition, kept free of transport concerns so the
//! orchestrator's soft-failure handling can be tested without SMTP.

use crate::db::models::ApplicantRow;

/// Attachment metadata; the bytes travel separately
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentSpec {
    /// Filename presented to the recipient: the applicant's original one
    pub filename: String,
    pub content_type: String,
}

/// Fully composed message, ready for a transport
#[derive(Debug, Clone)]
pub struct EmailContent {
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
    pub attachment: Option<AttachmentSpec>,
}

fn content_type_for(filename: &str) -> String {
    let extension = std::path::Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match extension.as_deref() {
        Some("pdf") => "application/pdf",
        Some("doc") => "application/msword",
        Some("docx") => {
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        }
        _ => "application/octet-stream",
    }
    .to_string()
}

/// Compose the acknowledgment for one submission.
///
/// `resume_url` is resolved by the caller, which knows the externally
/// visible host; when present the bodies carry a link and the attachment
/// descriptor names the applicant's original file.
pub fn compose(applicant: &ApplicantRow, resume_url: Option<&str>) -> EmailContent {
    let name = applicant.full_name();
    let subject = format!("Application received: {}", applicant.position);

    let mut text_body = format!(
        "Hello {},\n\n\
         Thank you for applying for the {} position. We have received your \
         application and will be in touch after reviewing it.\n",
        name, applicant.position
    );
    let mut html_body = format!(
        "<p>Hello {},</p>\
         <p>Thank you for applying for the <strong>{}</strong> position. \
         We have received your application and will be in touch after \
         reviewing it.</p>",
        name, applicant.position
    );

    if let Some(url) = resume_url {
        text_body.push_str(&format!("\nYour resume is on file: {}\n", url));
        html_body.push_str(&format!(
            "<p>Your resume is on file: <a href=\"{}\">{}</a></p>",
            url, url
        ));
    }

    text_body.push_str("\nBest regards,\nThe Hiring Team\n");
    html_body.push_str("<p>Best regards,<br/>The Hiring Team</p>");

    let attachment = applicant.resume_file.as_ref().map(|_| {
        let filename = applicant
            .original_filename
            .clone()
            .unwrap_or_else(|| "resume".to_string());
        let content_type = content_type_for(&filename);
        AttachmentSpec {
            filename,
            content_type,
        }
    });

    EmailContent {
        subject,
        text_body,
        html_body,
        attachment,
    }
}

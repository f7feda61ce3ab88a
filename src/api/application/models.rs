use validator::Validate;

/// Validated fields of one submission, decoupled from the multipart form
/// it arrived in. Email format is deliberately not checked here; the
/// address is only used as a notification destination.
#[derive(Debug, Clone, Validate)]
pub struct ApplicantSubmission {
    #[validate(length(max = 100, message = "First name must be at most 100 characters"))]
    pub first_name: Option<String>,

    #[validate(length(max = 100, message = "Last name must be at most 100 characters"))]
    pub last_name: Option<String>,

    #[validate(length(min = 1, max = 254, message = "Email is required"))]
    pub email: String,

    #[validate(length(max = 50, message = "Phone must be at most 50 characters"))]
    pub phone: Option<String>,

    #[validate(length(min = 1, max = 200, message = "Position is required"))]
    pub position: String,

    #[validate(length(max = 10000, message = "Cover letter must be at most 10000 characters"))]
    pub cover_letter: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> ApplicantSubmission {
        ApplicantSubmission {
            first_name: None,
            last_name: None,
            email: "a@example.com".to_string(),
            phone: None,
            position: "Engineer".to_string(),
            cover_letter: None,
        }
    }

    #[test]
    fn accepts_minimal_submission() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn requires_email_and_position() {
        let mut missing_email = valid();
        missing_email.email = String::new();
        assert!(missing_email.validate().is_err());

        let mut missing_position = valid();
        missing_position.position = String::new();
        assert!(missing_position.validate().is_err());
    }

    #[test]
    fn email_format_is_not_checked() {
        let mut odd = valid();
        odd.email = "definitely not an email".to_string();
        assert!(odd.validate().is_ok());
    }
}

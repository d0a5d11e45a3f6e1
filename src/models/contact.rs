use rocket::FromForm;
use validator::Validate;

/// Public contact form; no CSRF token because the public site carries no
/// session privilege to ride.
#[derive(Debug, FromForm, Validate)]
pub struct ContactForm {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 4000))]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_email() {
        let form = ContactForm {
            name: "Jo".to_string(),
            email: "not-an-email".to_string(),
            message: "Hello".to_string(),
        };
        assert!(form.validate().is_err());
    }

    #[test]
    fn accepts_complete_submission() {
        let form = ContactForm {
            name: "Jo".to_string(),
            email: "jo@example.com".to_string(),
            message: "Do you stock part OEM-77?".to_string(),
        };
        assert!(form.validate().is_ok());
    }
}

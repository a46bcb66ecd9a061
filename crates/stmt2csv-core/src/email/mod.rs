pub mod html_table;

use mailparse::{parse_mail, ParsedMail};

use crate::error::ConvertError;

/// Trait for backends that pull the displayable body out of an email.
pub trait EmailBodySource: Send + Sync {
    /// The HTML body of the message (plain text when it has no HTML part).
    fn html_body(&self, bytes: &[u8]) -> Result<String, ConvertError>;
}

/// MIME parser backed by `mailparse`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MimeEmailSource;

impl MimeEmailSource {
    pub fn new() -> Self {
        MimeEmailSource
    }
}

impl EmailBodySource for MimeEmailSource {
    fn html_body(&self, bytes: &[u8]) -> Result<String, ConvertError> {
        let mail = parse_mail(bytes).map_err(|e| ConvertError::Email(e.to_string()))?;
        let body = best_body(&mail)
            .ok_or_else(|| ConvertError::Email("no text/html or text/plain part".into()))?;
        log::debug!("email body: {} bytes", body.len());
        Ok(body)
    }
}

/// First `text/html` part in depth-first order, else the first `text/plain`.
fn best_body(mail: &ParsedMail) -> Option<String> {
    fn walk(mail: &ParsedMail, mimetype: &str) -> Option<String> {
        if mail.ctype.mimetype.eq_ignore_ascii_case(mimetype) {
            if let Ok(body) = mail.get_body() {
                return Some(body);
            }
        }
        mail.subparts.iter().find_map(|part| walk(part, mimetype))
    }

    walk(mail, "text/html").or_else(|| walk(mail, "text/plain"))
}

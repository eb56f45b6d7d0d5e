use serde::Serialize;
use url::Url;

/// Longest URL accepted for `url` / `image_url`.
pub const MAX_URL_LENGTH: usize = 2083;

/// A field-level validation error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
    pub code: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, code: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            code: code.to_string(),
        }
    }
}

/// Every field error found in one payload.
#[derive(Debug, Clone, Default, PartialEq, thiserror::Error)]
#[error("validation failed: {} field error(s)", .errors.len())]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn single(error: FieldError) -> Self {
        Self {
            errors: vec![error],
        }
    }

    pub fn push(&mut self, error: FieldError) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Turn the collected errors into a result, `Ok(value)` if there are none.
    pub fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

/// Collect the error side of `result` into `errors`, passing the value through.
pub(crate) fn collect<T>(errors: &mut ValidationErrors, result: Result<T, FieldError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            errors.push(err);
            None
        }
    }
}

pub(crate) fn non_blank(field: &str, value: String) -> Result<String, FieldError> {
    if value.trim().is_empty() {
        return Err(FieldError::new(field, "blank", format!("{field} must not be empty")));
    }
    Ok(value)
}

/// Parse an absolute http(s) URL and return its canonical serialization.
///
/// Normalization is whatever `Url` serializes: lowercase scheme and host,
/// default port dropped, empty path rendered as `/`.
pub(crate) fn http_url(field: &str, raw: &str) -> Result<String, FieldError> {
    if raw.len() > MAX_URL_LENGTH {
        return Err(FieldError::new(
            field,
            "url_too_long",
            format!("{field} must be at most {MAX_URL_LENGTH} characters"),
        ));
    }

    let parsed = Url::parse(raw)
        .map_err(|err| FieldError::new(field, "url_parsing", format!("{field} is not a valid URL: {err}")))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(FieldError::new(
            field,
            "url_scheme",
            format!("{field} must use the http or https scheme"),
        ));
    }
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(FieldError::new(field, "url_host", format!("{field} must include a host")));
    }

    Ok(parsed.to_string())
}

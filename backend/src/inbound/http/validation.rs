//! Shared validation helpers for inbound HTTP adapters.

use serde_json::json;

use crate::domain::{AuthValidationError, Error, SectionId, SectionValidationError};

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    MissingField,
    InvalidUuid,
    EmptyField,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::MissingField => "missing_field",
            ErrorCode::InvalidUuid => "invalid_uuid",
            ErrorCode::EmptyField => "empty_field",
        }
    }
}

/// Newtype wrapper for HTTP field names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(&self) -> &'static str {
        self.0
    }
}

fn field_error(message: impl Into<String>, field: &str, code: &str) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field,
        "code": code,
    }))
}

pub(crate) fn missing_field_error(field: FieldName) -> Error {
    let field = field.as_str();
    field_error(
        format!("missing required field: {field}"),
        field,
        ErrorCode::MissingField.as_str(),
    )
}

pub(crate) fn invalid_uuid_error(field: FieldName, value: &str) -> Error {
    let field = field.as_str();
    Error::invalid_request(format!("{field} must be a valid UUID")).with_details(json!({
        "field": field,
        "value": value,
        "code": ErrorCode::InvalidUuid.as_str(),
    }))
}

/// Require an optional request field.
pub(crate) fn required<T>(value: Option<T>, field: FieldName) -> Result<T, Error> {
    value.ok_or_else(|| missing_field_error(field))
}

pub(crate) fn parse_section_id(value: &str, field: FieldName) -> Result<SectionId, Error> {
    SectionId::new(value).map_err(|_| invalid_uuid_error(field, value))
}

pub(crate) fn map_auth_validation_error(err: AuthValidationError) -> Error {
    field_error(err.to_string(), err.field(), err.code())
}

pub(crate) fn map_section_validation_error(err: SectionValidationError, field: FieldName) -> Error {
    let code = match err {
        SectionValidationError::InvalidId => ErrorCode::InvalidUuid,
        SectionValidationError::EmptyName => ErrorCode::EmptyField,
    };
    field_error(err.to_string(), field.as_str(), code.as_str())
}

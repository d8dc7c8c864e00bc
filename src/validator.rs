// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Submission field validator.
//!
//! Implements the field policy applied to every submission and edit:
//! - Title and author length caps
//! - Content presence and length bounds
//! - Expiration code membership
//!
//! Lengths are counted in Unicode scalar values, after intake sanitization.

use crate::config::{Messages, ValidationConfig};
use crate::models::Expiration;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Title exceeds {max} characters")]
    TitleTooLong { max: usize },

    #[error("Author exceeds {max} characters")]
    AuthorTooLong { max: usize },

    #[error("Content is required")]
    ContentRequired,

    #[error("Content is shorter than {min} characters")]
    ContentTooShort { min: usize },

    #[error("Content exceeds {max} characters")]
    ContentTooLong { max: usize },

    #[error("Unknown expiration option: {0}")]
    InvalidExpiration(String),
}

impl ValidationError {
    /// Client-facing text for this error.
    pub fn message<'a>(&self, messages: &'a Messages) -> &'a str {
        match self {
            Self::TitleTooLong { .. } => &messages.title_too_long,
            Self::AuthorTooLong { .. } => &messages.author_too_long,
            Self::ContentRequired => &messages.content_required,
            Self::ContentTooShort { .. } => &messages.content_too_short,
            Self::ContentTooLong { .. } => &messages.content_too_long,
            Self::InvalidExpiration(_) => &messages.invalid_expiration,
        }
    }
}

/// Result of validation.
#[derive(Debug, Clone)]
pub enum ValidationResult {
    /// Field is valid
    Valid,
    /// Field is invalid
    Invalid(ValidationError),
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }

    pub fn error(&self) -> Option<&ValidationError> {
        match self {
            ValidationResult::Valid => None,
            ValidationResult::Invalid(e) => Some(e),
        }
    }
}

/// Every failing field of one request, keyed by form field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<&'static str, ValidationError>);

impl FieldErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: &str) -> Option<&ValidationError> {
        self.0.get(field)
    }

    fn record(&mut self, field: &'static str, result: ValidationResult) {
        if let ValidationResult::Invalid(err) = result {
            self.0.insert(field, err);
        }
    }

    /// Render as the `{field: message}` map sent to clients.
    pub fn to_messages(&self, messages: &Messages) -> BTreeMap<String, String> {
        self.0
            .iter()
            .map(|(field, err)| (field.to_string(), err.message(messages).to_string()))
            .collect()
    }
}

/// Fields of a submission or edit after sanitization.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PostFields {
    pub title: String,
    pub author: String,
    pub content: String,
}

impl PostFields {
    /// Trim and HTML-escape raw form input. Applied identically to all
    /// three fields so a read returns exactly what was stored.
    pub fn sanitize(title: &str, author: &str, content: &str) -> Self {
        Self {
            title: sanitize_input(title),
            author: sanitize_input(author),
            content: sanitize_input(content),
        }
    }
}

/// Trim surrounding whitespace and escape HTML-significant characters.
pub fn sanitize_input(raw: &str) -> String {
    html_escape::encode_quoted_attribute(raw.trim()).into_owned()
}

/// Post field validator.
pub struct PostValidator {
    config: ValidationConfig,
}

impl PostValidator {
    /// Create a new validator with the given configuration.
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Validate the title length.
    pub fn validate_title(&self, title: &str) -> ValidationResult {
        let len = title.chars().count();
        if len > self.config.max_title_chars {
            debug!(len, max = self.config.max_title_chars, "Title too long");
            return ValidationResult::Invalid(ValidationError::TitleTooLong {
                max: self.config.max_title_chars,
            });
        }
        ValidationResult::Valid
    }

    /// Validate the author length.
    pub fn validate_author(&self, author: &str) -> ValidationResult {
        let len = author.chars().count();
        if len > self.config.max_author_chars {
            debug!(len, max = self.config.max_author_chars, "Author too long");
            return ValidationResult::Invalid(ValidationError::AuthorTooLong {
                max: self.config.max_author_chars,
            });
        }
        ValidationResult::Valid
    }

    /// Validate content presence and length.
    pub fn validate_content(&self, content: &str) -> ValidationResult {
        if content.is_empty() {
            debug!("Content missing");
            return ValidationResult::Invalid(ValidationError::ContentRequired);
        }

        let len = content.chars().count();
        if len < self.config.min_content_chars {
            debug!(len, min = self.config.min_content_chars, "Content too short");
            return ValidationResult::Invalid(ValidationError::ContentTooShort {
                min: self.config.min_content_chars,
            });
        }

        if len > self.config.max_content_chars {
            debug!(len, max = self.config.max_content_chars, "Content too long");
            return ValidationResult::Invalid(ValidationError::ContentTooLong {
                max: self.config.max_content_chars,
            });
        }

        ValidationResult::Valid
    }

    /// Validate an expiration code against the fixed option set.
    pub fn validate_expiration(&self, code: &str) -> ValidationResult {
        match Expiration::from_code(code) {
            Some(_) => ValidationResult::Valid,
            None => {
                debug!(code = %code, "Invalid expiration code");
                ValidationResult::Invalid(ValidationError::InvalidExpiration(code.to_string()))
            }
        }
    }

    /// Validate editable fields. Every field is checked; nothing short-circuits.
    pub fn validate_fields(&self, fields: &PostFields) -> FieldErrors {
        let mut errors = FieldErrors::default();
        errors.record("title", self.validate_title(&fields.title));
        errors.record("author", self.validate_author(&fields.author));
        errors.record("content", self.validate_content(&fields.content));
        errors
    }

    /// Validate a complete submission, including its expiration code.
    pub fn validate_submission(&self, fields: &PostFields, expiration: &str) -> FieldErrors {
        let mut errors = self.validate_fields(fields);
        errors.record("expiration", self.validate_expiration(expiration));
        errors
    }
}

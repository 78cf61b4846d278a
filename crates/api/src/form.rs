//! Multipart form bodies.
//!
//! `FormData` collects text fields and file parts in order, so callers can
//! build and inspect a submission before it is turned into a
//! `reqwest::multipart::Form`. Repeated keys are allowed (e.g. one
//! `categories` entry per selected category).

use reqwest::multipart::{Form, Part};

use crate::error::ApiError;

/// A single value in a multipart form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormValue {
    /// Plain text field.
    Text(String),
    /// Uploaded file.
    File {
        /// File contents.
        bytes: Vec<u8>,
        /// Original file name.
        file_name: String,
        /// MIME type, e.g. `image/jpeg`.
        content_type: String,
    },
}

/// An ordered multipart form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    fields: Vec<(String, FormValue)>,
}

impl FormData {
    /// Create an empty form.
    #[must_use]
    pub const fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Append a text field.
    #[must_use]
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields
            .push((name.into(), FormValue::Text(value.into())));
        self
    }

    /// Append a text field when a value is present.
    #[must_use]
    pub fn text_opt(self, name: impl Into<String>, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(value) => self.text(name, value),
            None => self,
        }
    }

    /// Append a file part.
    #[must_use]
    pub fn file(
        mut self,
        name: impl Into<String>,
        bytes: Vec<u8>,
        file_name: impl Into<String>,
        content_type: impl Into<String>,
    ) -> Self {
        self.fields.push((
            name.into(),
            FormValue::File {
                bytes,
                file_name: file_name.into(),
                content_type: content_type.into(),
            },
        ));
        self
    }

    /// All fields in insertion order.
    #[must_use]
    pub fn fields(&self) -> &[(String, FormValue)] {
        &self.fields
    }

    /// Text values recorded under `name`.
    pub fn text_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.fields.iter().filter_map(move |(key, value)| match value {
            FormValue::Text(text) if key == name => Some(text.as_str()),
            _ => None,
        })
    }

    /// Number of file parts.
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.fields
            .iter()
            .filter(|(_, value)| matches!(value, FormValue::File { .. }))
            .count()
    }

    /// Whether the form has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Convert into a reqwest multipart form.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidForm`] if a file part has an unparseable
    /// MIME type.
    pub fn into_multipart(self) -> Result<Form, ApiError> {
        self.fields
            .into_iter()
            .try_fold(Form::new(), |form, (name, value)| match value {
                FormValue::Text(text) => Ok(form.text(name, text)),
                FormValue::File {
                    bytes,
                    file_name,
                    content_type,
                } => {
                    let part = Part::bytes(bytes)
                        .file_name(file_name)
                        .mime_str(&content_type)
                        .map_err(|e| ApiError::InvalidForm {
                            field: name.clone(),
                            reason: e.to_string(),
                        })?;
                    Ok(form.part(name, part))
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_keeps_order_and_repeats() {
        let form = FormData::new()
            .text("name", "Vanne 3 voies")
            .text("categories", "1")
            .text("categories", "4")
            .text_opt("brand", None::<String>)
            .file("images", vec![1, 2, 3], "vanne.jpg", "image/jpeg");

        let categories: Vec<&str> = form.text_values("categories").collect();
        assert_eq!(categories, vec!["1", "4"]);
        assert_eq!(form.file_count(), 1);
        assert_eq!(form.fields().len(), 4);
    }

    #[test]
    fn test_into_multipart_rejects_bad_mime() {
        let form = FormData::new().file("images", vec![0], "x", "not a mime");
        assert!(matches!(
            form.into_multipart(),
            Err(ApiError::InvalidForm { field, .. }) if field == "images"
        ));
    }

    #[test]
    fn test_into_multipart_accepts_valid_form() {
        let form = FormData::new()
            .text("name", "Thermocouple")
            .file("image", vec![0xFF, 0xD8], "t.jpg", "image/jpeg");
        assert!(form.into_multipart().is_ok());
    }
}

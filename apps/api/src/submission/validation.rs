use serde::{Deserialize, Serialize};

use crate::storage::FilePayload;
use crate::submission::form::{FormField, FormValues};

/// Per-field error messages. An empty message means the field is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationErrors {
    pub company_name: String,
    pub job_title: String,
    pub job_description: String,
    pub file: String,
}

impl ValidationErrors {
    pub fn get(&self, field: FormField) -> &str {
        match field {
            FormField::CompanyName => &self.company_name,
            FormField::JobTitle => &self.job_title,
            FormField::JobDescription => &self.job_description,
            FormField::Resume => &self.file,
        }
    }

    fn slot(&mut self, field: FormField) -> &mut String {
        match field {
            FormField::CompanyName => &mut self.company_name,
            FormField::JobTitle => &mut self.job_title,
            FormField::JobDescription => &mut self.job_description,
            FormField::Resume => &mut self.file,
        }
    }

    pub fn set(&mut self, field: FormField, message: impl Into<String>) {
        *self.slot(field) = message.into();
    }

    pub fn clear(&mut self, field: FormField) {
        self.slot(field).clear();
    }

    pub fn is_valid(&self) -> bool {
        FormField::ALL.iter().all(|&f| self.get(f).is_empty())
    }

    pub fn invalid_fields(&self) -> Vec<FormField> {
        FormField::ALL
            .into_iter()
            .filter(|&f| !self.get(f).is_empty())
            .collect()
    }
}

/// Checks that every text field has non-whitespace content and that a file
/// was selected. No format or size checks are made.
pub fn validate_fields(values: &FormValues, file: Option<&FilePayload>) -> ValidationErrors {
    let mut errors = ValidationErrors::default();

    if values.company_name.trim().is_empty() {
        errors.set(FormField::CompanyName, "Company Name is required");
    }
    if values.job_title.trim().is_empty() {
        errors.set(FormField::JobTitle, "Job Title is required");
    }
    if values.job_description.trim().is_empty() {
        errors.set(FormField::JobDescription, "Job Description is required");
    }
    if file.is_none() {
        errors.set(FormField::Resume, "Please upload a resume (PDF)");
    }

    errors
}

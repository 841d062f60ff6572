//! The submission form: field names, current values, selected file and
//! per-field errors.

use tracing::debug;

use crate::storage::FilePayload;
use crate::submission::validation::{validate_fields, ValidationErrors};

/// The four inputs of a resume submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormField {
    CompanyName,
    JobTitle,
    JobDescription,
    Resume,
}

impl FormField {
    pub const ALL: [FormField; 4] = [
        FormField::CompanyName,
        FormField::JobTitle,
        FormField::JobDescription,
        FormField::Resume,
    ];

    /// Maps an HTML form-field name to its field. Hyphenated names are what the
    /// upload form sends; identifier-style keys are accepted as well.
    pub fn from_form_name(name: &str) -> Option<Self> {
        match name {
            "company-name" | "companyName" => Some(FormField::CompanyName),
            "job-title" | "jobTitle" => Some(FormField::JobTitle),
            "job-description" | "jobDescription" => Some(FormField::JobDescription),
            "resume" | "file" => Some(FormField::Resume),
            _ => None,
        }
    }

    /// Identifier-style key used in error payloads.
    pub fn key(self) -> &'static str {
        match self {
            FormField::CompanyName => "companyName",
            FormField::JobTitle => "jobTitle",
            FormField::JobDescription => "jobDescription",
            FormField::Resume => "file",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormValues {
    pub company_name: String,
    pub job_title: String,
    pub job_description: String,
}

/// Form draft. Editing a field clears that field's error; `validate`
/// recomputes every error.
#[derive(Debug, Default)]
pub struct SubmissionForm {
    values: FormValues,
    file: Option<FilePayload>,
    errors: ValidationErrors,
}

impl SubmissionForm {
    /// Applies a text change by form-field name. Returns `false` when the name
    /// is not a text field of this form.
    pub fn handle_change(&mut self, name: &str, value: impl Into<String>) -> bool {
        let (field, slot) = match FormField::from_form_name(name) {
            Some(f @ FormField::CompanyName) => (f, &mut self.values.company_name),
            Some(f @ FormField::JobTitle) => (f, &mut self.values.job_title),
            Some(f @ FormField::JobDescription) => (f, &mut self.values.job_description),
            Some(FormField::Resume) | None => {
                debug!("Ignoring change to non-text form field '{name}'");
                return false;
            }
        };
        *slot = value.into();
        self.errors.clear(field);
        true
    }

    /// Selects (or deselects) the resume file. Empty uploads count as no file.
    pub fn select_file(&mut self, file: Option<FilePayload>) {
        self.file = file.filter(|f| !f.bytes.is_empty());
        self.errors.clear(FormField::Resume);
    }

    #[cfg(test)]
    pub fn values(&self) -> &FormValues {
        &self.values
    }

    #[cfg(test)]
    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    /// Recomputes all field errors. Returns `true` when the form is valid.
    pub fn validate(&mut self) -> bool {
        self.errors = validate_fields(&self.values, self.file.as_ref());
        self.errors.is_valid()
    }

    /// Validates and, on success, hands the values over as a submission the
    /// pipeline can start from.
    pub fn submit(mut self) -> Result<ValidatedSubmission, ValidationErrors> {
        if !self.validate() {
            return Err(self.errors);
        }
        let resume = self.file.ok_or_else(|| self.errors.clone())?;
        Ok(ValidatedSubmission {
            company_name: self.values.company_name,
            job_title: self.values.job_title,
            job_description: self.values.job_description,
            resume,
        })
    }
}

/// A submission that passed validation. Only `SubmissionForm::submit` builds one.
#[derive(Debug, Clone)]
pub struct ValidatedSubmission {
    pub company_name: String,
    pub job_title: String,
    pub job_description: String,
    pub resume: FilePayload,
}

pub mod record;

pub use record::{record_key, RecordFields, SubmissionRecord};

// Small pure helpers shared across the service.

pub mod class_names;
pub mod size;

pub use class_names::{cn, ClassValue};
pub use size::format_size;

use uuid::Uuid;

/// Returns a fresh random (v4) identifier. Every call yields a new value.
pub fn generate_uuid() -> Uuid {
    Uuid::new_v4()
}

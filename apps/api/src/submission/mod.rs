//! Resume submission: form handling, the analysis pipeline and its HTTP surface.

pub mod feedback;
pub mod form;
pub mod handlers;
pub mod instructions;
pub mod pipeline;
pub mod status;
pub mod validation;

#[cfg(test)]
mod testing;

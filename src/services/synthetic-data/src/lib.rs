//! Synthetic Data Service Library
//!
//! Turns a natural-language request, optionally with a custom schema or an
//! uploaded sample file, into a synthetic tabular dataset. The generation
//! path is chosen by [`orchestrator::PRECEDENCE`]: learned file patterns,
//! then a custom schema, then the built-in template for the request's
//! category.

pub mod cli;
pub mod config;
pub mod error;
pub mod fakers;
pub mod ingest;
pub mod interpreter;
pub mod orchestrator;
pub mod output;
pub mod patterns;
pub mod schema;
pub mod server;
pub mod templates;
pub mod types;

pub use config::Config;
pub use error::{Result, SyntheticDataError};
pub use interpreter::interpret;
pub use orchestrator::{GeneratedDataset, GenerationStrategy, Orchestrator, PRECEDENCE};
pub use schema::{generate_from_patterns, generate_from_schema, CustomSchema};
pub use templates::{CompletionStatus, TemplateLibrary};
pub use types::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_types() {
        let error = SyntheticDataError::InvalidSchema("duplicate field".to_string());
        assert_eq!(error.error_code(), "INVALID_SCHEMA");
        assert!(error.is_client_error());
        assert!(!error.is_server_error());
    }

    #[test]
    fn test_request_to_plan() {
        let request = GenerationRequest::new("sales report").with_count(40);
        let plan = interpret(&request.effective_text());
        assert_eq!(plan.category, Category::Sales);
        assert_eq!(plan.record_count, 40);
    }
}

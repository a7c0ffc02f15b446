//! gradebook-core: Course outlines, grade computation, and storage.
//!
//! This crate defines the dataset model, the outline parser and validator,
//! the grade engine, and the on-disk store that the gradebook CLI builds on.

pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod parser;
pub mod store;
pub mod validation;

pub use config::GradebookConfig;
pub use error::{
    ConfigError, GradeError, ParseError, SemanticError, StoreError, StructureError,
    ValidationError,
};
pub use model::{Assessment, Course, Dataset, Scale};
pub use store::{AutoRecover, DataStore, RecoveryPrompt, SaveOutcome};

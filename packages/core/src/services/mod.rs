//! Lifecycle Services
//!
//! - `ModelLifecycleCoordinator` - change detection, the switch protocol and
//!   status reporting
//! - `classify` - maps free-text failure messages to a coarse `ModelErrorType`
//! - `IndexReinitializer` - hook for the index that must be rebuilt when the
//!   embedding dimension changes

pub mod coordinator;
pub mod error;
pub mod error_classifier;
pub mod index_reinitializer;

pub use coordinator::ModelLifecycleCoordinator;
pub use error::SwitchError;
pub use error_classifier::classify;
pub use index_reinitializer::IndexReinitializer;

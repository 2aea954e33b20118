pub mod config;
pub mod executor;
pub mod kustomize;
pub mod model;
pub mod traits;

// Re-export common types for convenience
pub use config::*;
pub use executor::*;
pub use kustomize::{extract_package_file, KustomizeManager};
pub use model::*;
pub use traits::*;

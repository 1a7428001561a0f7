//! CLI command implementations.

mod bullets;
mod config;
mod languages;
mod session;
mod summarize;
mod translate;

pub use bullets::run_bullets;
pub use config::run_config;
pub use languages::run_languages;
pub use summarize::run_summarize;
pub use translate::run_translate;

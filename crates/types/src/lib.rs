// crates/types/src/lib.rs
//! Data types shared between the proofreading engine, the CLI and the
//! browser frontend (via generated TypeScript bindings).

pub mod config;
pub mod history;
pub mod issue;
pub mod session;
pub mod thesaurus;

pub use config::*;
pub use history::*;
pub use issue::*;
pub use session::*;
pub use thesaurus::*;

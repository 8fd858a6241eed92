//! Voice profile persistence for Vox Studio.
//!
//! Profiles live in a single JSON array file under the data directory, with
//! the uploaded reference recordings stored beside it. The format is plain
//! enough to edit by hand, and the store re-reads it on every call so such
//! edits are picked up without a restart.

mod error;
mod store;

pub use error::ProfileError;
pub use store::ProfileStore;

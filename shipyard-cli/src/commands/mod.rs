//! Command implementations

pub mod issue;
pub mod release;

pub use issue::IssueKind;
pub use release::ReleaseArgs;

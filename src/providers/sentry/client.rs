mod core;
mod issues;
mod preflight;
mod summaries;

pub use self::core::SentryClient;
pub use preflight::{OrganizationInfo, ProjectInfo};
pub use summaries::SummarizeOutcome;

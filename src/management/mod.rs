mod auth;
mod report;

pub use auth::TokenManager;
pub use report::CandidateRecord;
pub use report::Report;
pub use report::ReportError;
pub use report::ReportManager;

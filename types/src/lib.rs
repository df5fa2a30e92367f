//! Core domain types for Sage.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! The connector builds these from backend payloads; consumers only read them.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory

mod analysis;
mod commit;
mod envelope;
mod status;
mod suggestion;
pub mod text;

/// Backend address used when nothing else is configured.
pub const DEFAULT_SERVER_URL: &str = "tcp://localhost:5555";

pub use analysis::{
    AnalysisDepth, CodeElement, DEFAULT_ISSUE_LINE, FileAnalysis, FileMetrics, Issue, IssueKind,
    IssueSeverity, ProjectAnalysis, ProjectMetrics, SimilarCode,
};
pub use commit::{CommitGeneration, ConventionalCommit};
pub use envelope::{Envelope, MessageType};
pub use status::{ConnectionStatus, InvalidTransition};
pub use suggestion::{Suggestion, SuggestionCategory, SuggestionPriority, TITLE_MAX_CHARS};

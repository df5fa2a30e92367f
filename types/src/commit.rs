//! Conventional commit messages produced by the `git_semantic` service.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The structured parts of a conventional commit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConventionalCommit {
    #[serde(rename = "type")]
    pub commit_type: String,
    pub scope: Option<String>,
    pub breaking_change: bool,
    pub description: String,
    pub body: Option<String>,
    pub footer: Option<String>,
}

impl ConventionalCommit {
    /// Header line: `type(scope)!: description`.
    ///
    /// The scope segment is omitted when absent or blank; `!` appears iff
    /// `breaking_change` is set.
    #[must_use]
    pub fn header(&self) -> String {
        let mut header = self.commit_type.clone();
        if let Some(scope) = non_blank(self.scope.as_deref()) {
            header.push('(');
            header.push_str(scope);
            header.push(')');
        }
        if self.breaking_change {
            header.push('!');
        }
        header.push_str(": ");
        header.push_str(&self.description);
        header
    }

    /// Full message: header, then body and footer as blank-line separated
    /// paragraphs, in that order.
    #[must_use]
    pub fn to_message(&self) -> String {
        let mut message = self.header();
        for paragraph in [self.body.as_deref(), self.footer.as_deref()]
            .into_iter()
            .filter_map(non_blank)
        {
            message.push_str("\n\n");
            message.push_str(paragraph);
        }
        message
    }
}

impl fmt::Display for ConventionalCommit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_message())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// A generated commit: its parts plus the rendered message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitGeneration {
    pub message: String,
    #[serde(flatten)]
    pub commit: ConventionalCommit,
    pub confidence: f64,
    pub files_changed: Vec<String>,
}

impl CommitGeneration {
    #[must_use]
    pub fn new(commit: ConventionalCommit, confidence: f64, files_changed: Vec<String>) -> Self {
        Self {
            message: commit.to_message(),
            commit,
            confidence,
            files_changed,
        }
    }
}

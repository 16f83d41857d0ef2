//! Validation and normalization of source issues into store documents.

use crate::domain::model::{Issue, IssueDocument};
use crate::utils::error::{ConnectorError, Result};
use chrono::Utc;
use tracing::warn;

/// Maximum title length kept on a document, truncation marker included.
pub const MAX_TITLE_LEN: usize = 1000;
const TRUNCATION_MARKER: &str = "...";

/// Validate and normalize one issue into a document.
///
/// Checks run in a fixed order, each with its own rejection message: id
/// positive; title, state, url non-blank; created_at not in the future; url
/// scheme http/https; state (lowercased) exactly `open` or `closed`.
pub fn transform(issue: &Issue) -> Result<IssueDocument> {
    if issue.id <= 0 {
        return Err(ConnectorError::validation(format!(
            "issue id must be positive (got {})",
            issue.id
        )));
    }
    if issue.title.trim().is_empty() {
        return Err(ConnectorError::validation("issue title cannot be blank"));
    }
    if issue.state.trim().is_empty() {
        return Err(ConnectorError::validation("issue state cannot be blank"));
    }
    if issue.url.trim().is_empty() {
        return Err(ConnectorError::validation("issue url cannot be blank"));
    }
    if issue.created_at > Utc::now() {
        return Err(ConnectorError::validation(
            "issue created_at cannot be in the future",
        ));
    }
    if !issue.url.starts_with("http://") && !issue.url.starts_with("https://") {
        return Err(ConnectorError::validation(format!(
            "issue url must start with http:// or https:// (got {})",
            issue.url
        )));
    }

    let state = issue.state.to_lowercase();
    if state != "open" && state != "closed" {
        return Err(ConnectorError::validation(format!(
            "issue state must be 'open' or 'closed' (got '{}')",
            issue.state
        )));
    }

    Ok(IssueDocument {
        id: issue.id.to_string(),
        title: sanitize_title(&issue.title),
        state,
        url: issue.url.clone(),
        created_at: issue.created_at,
        synced_at: Utc::now(),
    })
}

/// Transform a batch, dropping records that fail validation.
///
/// Per-record rejections are logged and the record is skipped; the call as a
/// whole fails only when every record was rejected. A partially shrunk batch
/// is returned without any error signal beyond the warnings.
pub fn transform_batch(issues: &[Issue]) -> Result<Vec<IssueDocument>> {
    let mut documents = Vec::with_capacity(issues.len());
    let mut rejected = 0usize;

    for issue in issues {
        match transform(issue) {
            Ok(document) => documents.push(document),
            Err(err) => {
                rejected += 1;
                warn!(issue_id = issue.id, error = %err, "dropping issue that failed validation");
            }
        }
    }

    if documents.is_empty() && !issues.is_empty() {
        return Err(ConnectorError::validation(format!(
            "all {rejected} records failed validation"
        )));
    }

    Ok(documents)
}

fn sanitize_title(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.chars().count() <= MAX_TITLE_LEN {
        return trimmed.to_string();
    }
    let kept: String = trimmed
        .chars()
        .take(MAX_TITLE_LEN - TRUNCATION_MARKER.chars().count())
        .collect();
    format!("{kept}{TRUNCATION_MARKER}")
}

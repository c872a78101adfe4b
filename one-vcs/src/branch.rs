//! Branch naming: ticket-id extraction and title sanitization.

use regex::Regex;

use one_core::types::TicketId;

use crate::error::PatternError;

/// Matches a leading `ABC-123` key.
pub const DEFAULT_TICKET_PATTERN: &str = r"^([A-Z]+-\d+)";

/// Longest sanitized title kept in a branch name.
pub const MAX_SANITIZED_LEN: usize = 50;

/// Extract the first capture group of `pattern` from `branch`.
///
/// Fails when the pattern is empty, does not compile, or produces no group 1
/// match against the branch name.
pub fn extract_ticket_id(branch: &str, pattern: &str) -> Result<TicketId, PatternError> {
    if pattern.is_empty() {
        return Err(PatternError::EmptyPattern);
    }
    let re = Regex::new(pattern).map_err(|source| PatternError::InvalidPattern {
        pattern: pattern.to_owned(),
        source,
    })?;
    re.captures(branch)
        .and_then(|caps| caps.get(1))
        .map(|m| TicketId::from(m.as_str()))
        .ok_or_else(|| PatternError::NoMatch {
            branch: branch.to_owned(),
            pattern: pattern.to_owned(),
        })
}

/// Turn free text into a branch-safe slug.
///
/// Lowercases, maps whitespace runs to `-`, drops everything outside
/// `[a-z0-9_-]`, collapses repeated `-`, trims `-` from both ends and caps the
/// length at [`MAX_SANITIZED_LEN`]. Applying it twice changes nothing.
pub fn sanitize_branch_name(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for ch in text.to_lowercase().chars() {
        let mapped = if ch.is_whitespace() {
            '-'
        } else if ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-' || ch == '_' {
            ch
        } else {
            continue;
        };
        if mapped == '-' && slug.ends_with('-') {
            continue;
        }
        slug.push(mapped);
    }

    let trimmed = slug.trim_matches('-');
    // Only ASCII survives the filter, so byte truncation is char-safe.
    let capped = if trimmed.len() > MAX_SANITIZED_LEN {
        &trimmed[..MAX_SANITIZED_LEN]
    } else {
        trimmed
    };
    capped.trim_end_matches('-').to_owned()
}

/// `<TICKET>-<slug>`, or just the ticket id when the title adds nothing.
pub fn task_branch_name(ticket: &TicketId, title: &str) -> String {
    let slug = sanitize_branch_name(title);
    if slug.is_empty() || slug == sanitize_branch_name(ticket.as_str()) {
        ticket.0.clone()
    } else {
        format!("{ticket}-{slug}")
    }
}

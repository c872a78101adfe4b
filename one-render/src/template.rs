//! `{key}` placeholder substitution and ticket URL construction.

use one_core::types::TicketSystem;

use crate::context::LifecycleContext;

/// Substitute `{key}` placeholders from `ctx` in a single left-to-right pass.
///
/// Placeholders whose key is absent from the context are copied verbatim.
/// Substituted values are never scanned again, so a value containing `{x}`
/// stays literal.
pub fn render(template: &str, ctx: &LifecycleContext) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find(['{', '}']) {
            Some(close) if after.as_bytes()[close] == b'}' => {
                let key = &after[..close];
                match ctx.get(key) {
                    Some(value) => out.push_str(value),
                    None => {
                        tracing::debug!(placeholder = key, "no value for placeholder; kept verbatim");
                        out.push('{');
                        out.push_str(key);
                        out.push('}');
                    }
                }
                rest = &after[close + 1..];
            }
            // No closing brace before the next opening one, or none at all.
            _ => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Browse URL for `ticket_id` on `system`, or `""` for unrecognized systems.
///
/// An empty result means "no URL available" and is not an error.
pub fn build_ticket_url(system: &str, base_url: &str, ticket_id: &str) -> String {
    let suffix = match TicketSystem::parse(system) {
        Some(TicketSystem::Jira) => "/browse/",
        Some(TicketSystem::Linear) => "/issue/",
        Some(TicketSystem::GitHub) => "/issues/",
        None => return String::new(),
    };
    format!("{}{suffix}{ticket_id}", base_url.trim_end_matches('/'))
}

/// Today's local date as `YYYY-MM-DD`.
pub fn current_date() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}

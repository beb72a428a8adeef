//! Shared helper functions for CLI commands
//!
//! Workspace/session plumbing, fuzzy entity resolution and the small text
//! formatting utilities used across command modules.

use clap::ValueEnum;
use console::style;
use miette::{miette, Result};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::access::{Action, Resource, Session};
use crate::core::config::Config;
use crate::core::entity::Entity;
use crate::core::identity::EntityId;
use crate::core::repository::Repository;
use crate::core::workspace::Workspace;
use crate::entities::User;

/// Open the workspace from --workspace or by discovery
pub fn open_workspace(global: &GlobalOpts) -> Result<Workspace> {
    match &global.workspace {
        Some(path) => Workspace::open(path).map_err(|e| miette!("{}", e)),
        None => Workspace::discover().map_err(|e| miette!("{}", e)),
    }
}

/// Open the repository for the resolved workspace
pub fn open_repo(global: &GlobalOpts) -> Result<Repository> {
    Ok(Repository::open(&open_workspace(global)?))
}

/// Restore the persisted session for this invocation
pub fn restore_session(repo: &Repository) -> Result<Session> {
    Session::restore(repo).map_err(|e| miette!("{}", e))
}

/// Effective output format: an explicit --format wins, then the configured
/// default, then the command's own fallback
pub fn effective_format(global: &GlobalOpts, fallback: OutputFormat) -> OutputFormat {
    if global.format != OutputFormat::Auto {
        return global.format;
    }
    if let Some(name) = Config::load().default_format {
        if let Ok(format) = OutputFormat::from_str(&name, true) {
            if format != OutputFormat::Auto {
                return format;
            }
        }
    }
    fallback
}

/// Gate a mutating command on the permission table. The repository itself
/// never checks; this is the single place commands enforce access.
pub fn require_access(session: &Session, resource: Resource, action: Action) -> Result<()> {
    if session.can_access(resource, action) {
        return Ok(());
    }
    match session.user() {
        Some(user) => Err(miette!(
            "permission denied: {} may not {} {}",
            user.role,
            action,
            resource
        )),
        None => Err(miette!(
            "not logged in. Run '{}' first.",
            "atelier login <email>"
        )),
    }
}

/// Resolve a query string against a collection: exact id, id prefix, or
/// case-insensitive label substring. Ambiguity is an error listing the
/// candidates.
pub fn resolve_entity<'a, T: Entity>(items: &'a [T], query: &str, kind: &str) -> Result<&'a T> {
    let mut matches: Vec<&T> = items
        .iter()
        .filter(|item| {
            let id = item.id().to_string();
            id == query || id.starts_with(query)
        })
        .collect();

    if matches.is_empty() {
        let needle = query.to_lowercase();
        matches = items
            .iter()
            .filter(|item| item.label().to_lowercase().contains(&needle))
            .collect();
    }

    match matches.len() {
        0 => Err(miette!("no {} found matching '{}'", kind, query)),
        1 => Ok(matches.remove(0)),
        _ => {
            eprintln!("{} Multiple matches found:", style("!").yellow());
            for item in &matches {
                eprintln!("  {} - {}", format_short_id(item.id()), item.label());
            }
            Err(miette!(
                "ambiguous query '{}'. Please be more specific.",
                query
            ))
        }
    }
}

/// Render a user id as a display name, tolerating ids that no longer
/// resolve to a stored user
pub fn user_name(users: &[User], id: Option<&EntityId>) -> String {
    match id {
        Some(id) => users
            .iter()
            .find(|u| u.id == *id)
            .map(|u| u.name.clone())
            .unwrap_or_else(|| "unknown user".to_string()),
        None => "-".to_string(),
    }
}

/// Format an EntityId for display, truncating if too long
pub fn format_short_id(id: &EntityId) -> String {
    let s = id.to_string();
    if s.len() > 16 {
        format!("{}...", &s[..13])
    } else {
        s
    }
}

/// Truncate a string to max_len, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        format!("{}...", &s[..max_len.saturating_sub(3)])
    }
}

/// Escape a string for CSV output (RFC 4180)
pub fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::identity::EntityPrefix;
    use crate::entities::{NewUser, Role};

    #[test]
    fn test_format_short_id() {
        let id = EntityId::new(EntityPrefix::Prj);
        let formatted = format_short_id(&id);
        assert!(formatted.len() <= 16);
        assert!(formatted.ends_with("..."));
    }

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello world", 8), "hello...");
        assert_eq!(truncate_str("hi", 2), "hi");
    }

    #[test]
    fn test_escape_csv() {
        assert_eq!(escape_csv("simple"), "simple");
        assert_eq!(escape_csv("with,comma"), "\"with,comma\"");
        assert_eq!(escape_csv("with\"quote"), "\"with\"\"quote\"");
        assert_eq!(escape_csv("with\nnewline"), "\"with\nnewline\"");
    }

    #[test]
    fn test_resolve_entity_by_id_prefix_and_label() {
        let users = vec![
            User::new(NewUser::new("Alice", "alice@acme.com", Role::Admin)),
            User::new(NewUser::new("Bob", "bob@acme.com", Role::Engineer)),
        ];

        let full = users[0].id.to_string();
        assert_eq!(resolve_entity(&users, &full, "user").unwrap().name, "Alice");

        let prefix = &full[..10];
        assert_eq!(
            resolve_entity(&users, prefix, "user").unwrap().name,
            "Alice"
        );

        assert_eq!(resolve_entity(&users, "bob", "user").unwrap().name, "Bob");
        assert!(resolve_entity(&users, "carol", "user").is_err());
    }

    #[test]
    fn test_user_name_tolerates_dangling_ids() {
        let users = vec![User::new(NewUser::new("Alice", "alice@acme.com", Role::Admin))];
        let ghost = EntityId::new(EntityPrefix::Usr);

        assert_eq!(user_name(&users, Some(&users[0].id)), "Alice");
        assert_eq!(user_name(&users, Some(&ghost)), "unknown user");
        assert_eq!(user_name(&users, None), "-");
    }
}

//! Repository argument resolution

use anyhow::{Context, Result};
use log::debug;
use std::collections::HashSet;

use crate::source::RepoRef;

/// Parse `OWNER/NAME` arguments, dropping case-insensitive duplicates
pub fn resolve_repositories(arguments: &[String]) -> Result<Vec<RepoRef>> {
    let mut seen = HashSet::new();
    let mut repositories = Vec::with_capacity(arguments.len());

    for argument in arguments {
        let repo = resolve_repository(argument)?;
        if seen.insert(repo.key()) {
            repositories.push(repo);
        } else {
            debug!("Ignoring duplicate repository argument '{}'", argument);
        }
    }

    Ok(repositories)
}

pub fn resolve_repository(argument: &str) -> Result<RepoRef> {
    argument
        .parse::<RepoRef>()
        .with_context(|| format!("Invalid repository argument '{}'", argument))
}

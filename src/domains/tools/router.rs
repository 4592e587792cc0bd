//! Tool Router - builds the registry for the configured toolset.
//!
//! Each toolset knows how to register its own tools; this module only picks
//! the toolset. Construction failures (duplicate names, a missing mandatory
//! credential) are fatal to the server.

use tracing::info;

use crate::core::config::{Config, Toolset};
use crate::core::error::Result;

use super::definitions::{brave, fetch, fs, github, vercel};
use super::registry::ToolRegistry;

/// Build the registry with every tool of `config.toolset`.
pub fn build_registry(config: &Config) -> Result<ToolRegistry> {
    let mut registry = ToolRegistry::new();

    match config.toolset {
        Toolset::Github => github::register(&mut registry, config)?,
        Toolset::BraveSearch => brave::register(&mut registry, config)?,
        Toolset::Fetch => fetch::register(&mut registry, config)?,
        Toolset::Filesystem => fs::register(&mut registry, config)?,
        Toolset::Vercel => vercel::register(&mut registry, config)?,
    }

    info!(
        "Registered {} tools for toolset {}",
        registry.catalog().len(),
        config.toolset
    );
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::core::Error;

    fn config_for(toolset: Toolset) -> Config {
        let mut config = Config::default();
        config.toolset = toolset;
        config.credentials.github_token = Some("ghp_test".into());
        config
    }

    #[test]
    fn test_every_toolset_builds_with_unique_names() {
        for toolset in Toolset::ALL {
            let registry = build_registry(&config_for(toolset)).unwrap();
            let names = registry.tool_names();
            assert!(!names.is_empty(), "{toolset} has no tools");

            let unique: HashSet<_> = names.iter().collect();
            assert_eq!(unique.len(), names.len(), "{toolset} repeats a name");
        }
    }

    #[test]
    fn test_toolset_catalogs() {
        let names = |toolset| {
            build_registry(&config_for(toolset))
                .unwrap()
                .tool_names()
                .into_iter()
                .map(str::to_string)
                .collect::<Vec<_>>()
        };

        assert_eq!(names(Toolset::BraveSearch), vec!["search", "get_suggestions"]);
        assert_eq!(names(Toolset::Fetch), vec!["fetch", "fetch_json", "fetch_html"]);
        assert_eq!(names(Toolset::Filesystem), vec!["read_file", "write_file", "list_files"]);
        assert_eq!(names(Toolset::Vercel), vec!["list_projects"]);

        let github = names(Toolset::Github);
        assert_eq!(github.len(), 26);
        assert!(github.contains(&"get_issue".to_string()));
        assert!(github.contains(&"create_pull_request_review".to_string()));
    }

    #[test]
    fn test_github_without_token_is_fatal() {
        let mut config = config_for(Toolset::Github);
        config.credentials.github_token = None;
        let err = build_registry(&config).unwrap_err();
        assert!(matches!(err, Error::Tool(_)));
        assert!(err.to_string().contains("GITHUB_PERSONAL_ACCESS_TOKEN"));
    }

    #[test]
    fn test_optional_credentials_do_not_block_construction() {
        assert!(build_registry(&config_for(Toolset::BraveSearch)).is_ok());
        assert!(build_registry(&config_for(Toolset::Vercel)).is_ok());
    }
}

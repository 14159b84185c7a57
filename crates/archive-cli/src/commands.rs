//! Command execution. Results go to stdout as JSON; logs go to stderr.

use crate::Command;
use anyhow::{Context, Result};
use pdb_archive::{ArchiveApi, Query};
use serde_json::json;
use std::io::Write;
use tracing::info;

/// Parse `--query`: inline JSON or `@path`. `--latest` forces latest-only.
pub fn parse_query(raw: Option<&str>, latest: bool) -> Result<Query> {
    let mut query = match raw {
        None => Query::new(),
        Some(text) => {
            let json = match text.strip_prefix('@') {
                Some(path) => std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read query file {}", path))?,
                None => text.to_string(),
            };
            serde_json::from_str(&json).context("Invalid query")?
        }
    };
    if latest {
        query.latest = true;
    }
    Ok(query)
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}

pub async fn run(api: &ArchiveApi, command: Command) -> Result<()> {
    match command {
        Command::Reset => {
            api.reset().await?;
            info!("Schema reset");
        }
        Command::Rescan { .. } => {
            let report = api.rescan().await?;
            print_json(&report)?;
        }
        Command::Count { query, latest } => {
            let query = parse_query(query.as_deref(), latest)?;
            let count = api.query_count(query).await?;
            print_json(&json!({ "count": count }))?;
        }
        Command::Query {
            query,
            latest,
            page,
            page_size,
            all,
        } => {
            let query = parse_query(query.as_deref(), latest)?;
            let entries = if all {
                api.query_all(query).await?
            } else {
                api.query_page(query, page, page_size).await?
            };
            print_json(&entries)?;
        }
        Command::Software => print_json(&api.list_software().await?)?,
        Command::Properties => print_json(&api.list_properties().await?)?,
        Command::Lookup { hash } => {
            let identifier = api.identifier_for_hash(&hash).await?;
            print_json(&json!({ "id": identifier, "hash": hash }))?;
        }
        Command::Fetch {
            identifier,
            hash,
            kind,
            output,
        } => {
            let mut materialized = api.materialize(&identifier, &hash, kind).await?;
            let path = output.unwrap_or_else(|| materialized.file_name.clone().into());
            let mut file = std::fs::File::create(&path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            let written = std::io::copy(&mut materialized.reader, &mut file)?;
            info!(
                "Wrote {} bytes of {} to {}",
                written,
                materialized.content_type,
                path.display()
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_inline_query() {
        let query = parse_query(
            Some(r#"{"filters": [{"subject_type": "sw", "subject_name": "refmac", "operator": "=", "value": ""}]}"#),
            true,
        )
        .unwrap();
        assert!(query.latest);
        assert_eq!(query.filters.len(), 1);
    }

    #[test]
    fn test_parse_query_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("q.json");
        std::fs::write(&path, r#"{"latest": true}"#).unwrap();
        let query = parse_query(Some(&format!("@{}", path.display())), false).unwrap();
        assert!(query.latest);
    }

    #[test]
    fn test_no_query_is_everything() {
        assert_eq!(parse_query(None, false).unwrap(), Query::new());
    }
}

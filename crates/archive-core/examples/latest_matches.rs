//! List the newest snapshot of every entry that passes a property filter.
//!
//! Usage:
//!   cargo run --package pdb-archive --example latest_matches -- \
//!       /srv/pdb-redo /var/lib/pdb-redo/archive.db schema.json RFREE 0.25

use pdb_archive::{ArchiveApi, Filter, Operator, Query, Result};

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 6 {
        eprintln!("Usage: {} <archive_root> <database> <schema> <property> <max>", args[0]);
        std::process::exit(1);
    }

    let api = ArchiveApi::builder(&args[1], &args[2])
        .schema_path(&args[3])
        .build()?;

    let query = Query::new()
        .latest_only()
        .with_filter(Filter::property(&args[4], Operator::Lt, &args[5]));

    let total = api.query_count(query.clone()).await?;
    println!("{} entries with {} < {}:", total, args[4], args[5]);
    for entry in api.query_all(query).await? {
        println!("  - {} {} ({})", entry.id, entry.hash, entry.date);
    }

    Ok(())
}

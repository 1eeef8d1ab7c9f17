//! verify command - Check the persisted hierarchy for integrity problems
//!
//! Reads the raw document without building an engine, so problems a load
//! would repair or refuse are all reported.

use anyhow::{bail, Context as _, Result};

use super::session::{file_store, load_config};
use crate::cli::Context;
use crate::core::verify::verify_records;
use crate::ui::output;

/// Verify the stored records. Fails if any issue is found.
pub fn verify(ctx: &Context) -> Result<()> {
    let config = load_config(ctx)?;
    let store = file_store(ctx, &config)?;
    let rules = config.hierarchy_rules().context("Invalid hierarchy config")?;

    let Some(doc) = store.load().context("Failed to read location store")? else {
        output::print("No locations stored.", ctx.verbosity());
        return Ok(());
    };

    let fingerprint = doc.verify_fingerprint().err();
    let result = verify_records(&doc.locations, &rules);
    if result.ok() && fingerprint.is_none() {
        output::print(
            format!("OK: {} location(s), no issues.", doc.locations.len()),
            ctx.verbosity(),
        );
        return Ok(());
    }

    if let Some(err) = &fingerprint {
        println!("corrupt: {}", err);
    }
    for issue in &result.issues {
        let class = if issue.is_recoverable() {
            "repairable"
        } else if issue.is_fatal() {
            "corrupt"
        } else {
            "policy"
        };
        println!("{}: {}", class, issue);
    }
    let count = result.issues.len() + usize::from(fingerprint.is_some());
    bail!("{} issue(s) found", count)
}

use anyhow::{Context, Result};
use std::path::Path;

use sprout_core::catalog::{import_catalog, parse_catalog};
use sprout_core::service::SproutService;

pub(crate) fn cmd_import(service: &SproutService, file: &Path, json: bool) -> Result<()> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read catalog file: {}", file.display()))?;
    let catalog = parse_catalog(&raw)?;
    let summary = import_catalog(service.db(), &catalog)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!(
            "Imported {} food(s), {} recipe(s), {} tip(s)",
            summary.foods, summary.recipes, summary.tips
        );
    }
    Ok(())
}

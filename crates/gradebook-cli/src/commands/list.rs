//! The `gradebook list` command.

use anyhow::{Context as _, Result};

use gradebook_core::parser::list_outlines;

use super::Context;

pub fn execute(ctx: &Context) -> Result<()> {
    let store = ctx.store();
    let datasets = store.list()?;
    if datasets.is_empty() {
        println!("No datasets. Run `gradebook create <outline>` to make one.");
    } else {
        println!("Datasets:");
        for name in &datasets {
            println!("  {name}");
        }
    }

    let dir = &ctx.config.outlines_dir;
    if dir.is_dir() {
        let outlines = list_outlines(dir)
            .with_context(|| format!("failed to read {}", dir.display()))?;
        if !outlines.is_empty() {
            println!("\nOutlines:");
            for path in &outlines {
                println!("  {}", path.display());
            }
        }
    }

    Ok(())
}

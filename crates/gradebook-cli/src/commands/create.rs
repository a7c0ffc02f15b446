//! The `gradebook create` command.

use anyhow::{bail, Context as _, Result};

use gradebook_core::parser::load_outline;

use super::Context;

pub fn execute(ctx: &Context, outline: &str, name: Option<String>, force: bool) -> Result<()> {
    let path = ctx.config.outline_path(outline);
    let dataset = load_outline(&path)?;

    let name = match name {
        Some(name) => name,
        None => path
            .file_stem()
            .and_then(|s| s.to_str())
            .map(str::to_string)
            .with_context(|| format!("cannot derive a dataset name from {}", path.display()))?,
    };

    let store = ctx.store();
    if store.exists(&name) && !force {
        bail!("dataset '{name}' already exists (use --force to overwrite)");
    }

    ctx.save(&dataset, &name)?;
    println!(
        "Created dataset '{name}' with {} course(s) from {}",
        dataset.len(),
        path.display()
    );
    Ok(())
}

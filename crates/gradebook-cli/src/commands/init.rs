//! The `gradebook init` command.

use std::path::Path;

use anyhow::{Context as _, Result};

use super::Context;

pub fn execute(ctx: &Context) -> Result<()> {
    let config = &ctx.config;
    let store = ctx.store();

    for dir in [
        config.outlines_dir.clone(),
        config.data_dir.clone(),
        store.backup_dir(),
        store.corrupt_dir(),
    ] {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }

    if let Some(parent) = ctx.config_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    write_if_missing(&ctx.config_path, &config.to_toml()?)?;
    write_if_missing(&config.outlines_dir.join("example.txt"), EXAMPLE_OUTLINE)?;

    println!("\nNext steps:");
    println!("  1. Edit the example outline or add your own");
    println!("  2. Run: gradebook create example");
    println!("  3. Run: gradebook grade example \"Math 101\" Quiz 1 85");

    Ok(())
}

fn write_if_missing(path: &Path, contents: &str) -> Result<()> {
    if path.exists() {
        println!("{} already exists, skipping.", path.display());
    } else {
        std::fs::write(path, contents)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("Created {}", path.display());
    }
    Ok(())
}

const EXAMPLE_OUTLINE: &str = "\
course Math 101
assessments
10 drop 2 Homework 20%
4 drop 1 Quiz 20%
1 Midterm 25%
1 Final 35%
scale
A 80%
B 70%
C 60%
D 50%
F 0%
";

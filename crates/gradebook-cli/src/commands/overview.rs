//! The `gradebook overview` command.

use anyhow::{bail, Result};
use comfy_table::{Cell, Table};

use gradebook_core::engine::summarize_course;

use super::{percent, Context};

pub fn execute(ctx: &Context, dataset_name: &str, format: &str) -> Result<()> {
    let dataset = ctx.load_dataset(dataset_name)?;
    let summaries: Vec<_> = dataset
        .courses()
        .map(|(name, course)| (name, summarize_course(course)))
        .collect();

    match format {
        "json" => {
            let mut out = serde_json::Map::new();
            for (name, summary) in &summaries {
                out.insert(name.to_string(), serde_json::to_value(summary)?);
            }
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        "text" => {
            let mut table = Table::new();
            table.set_header(vec![
                "Course",
                "Average",
                "Letter",
                "Achieved",
                "Graded weight",
                "Max possible",
            ]);
            for (name, summary) in &summaries {
                table.add_row(vec![
                    Cell::new(name),
                    Cell::new(percent(summary.weighted_average)),
                    Cell::new(summary.letter.as_deref().unwrap_or("-")),
                    Cell::new(percent(summary.achieved)),
                    Cell::new(format!("{:.2}%", summary.graded_weight)),
                    Cell::new(format!("{:.2}%", summary.maximum)),
                ]);
            }
            println!("{table}");
        }
        other => bail!("unknown format: {other} (expected text or json)"),
    }

    Ok(())
}

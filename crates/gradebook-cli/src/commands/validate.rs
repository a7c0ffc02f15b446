//! The `gradebook validate` command.

use anyhow::Result;

use gradebook_core::parser::load_outline;

use super::Context;

pub fn execute(ctx: &Context, outline: &str) -> Result<()> {
    let path = ctx.config.outline_path(outline);
    let dataset = load_outline(&path)?;

    println!("Outline: {} ({} course(s))", path.display(), dataset.len());
    for (name, course) in dataset.courses() {
        let scale = if course.scale.is_none() {
            "no scale".to_string()
        } else {
            let letters: Vec<&str> = course.scale.iter().map(|(l, _)| l).collect();
            format!("scale {}", letters.join("/"))
        };
        println!(
            "  {name}: {} assessment(s), {scale}",
            course.assessments.len()
        );
    }
    println!("Outline valid.");

    Ok(())
}

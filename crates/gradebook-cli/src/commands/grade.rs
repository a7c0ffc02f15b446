//! The `gradebook grade` command.

use anyhow::{bail, Context as _, Result};

use super::{percent, Context};

pub fn execute(
    ctx: &Context,
    dataset_name: &str,
    course: &str,
    assessment: &str,
    number: usize,
    grade: &str,
) -> Result<()> {
    if number == 0 {
        bail!("attempt numbers start at 1");
    }
    let grade = parse_grade(grade)?;

    let mut dataset = ctx.load_dataset(dataset_name)?;
    let previous = dataset.set_grade(course, assessment, number - 1, grade)?;
    ctx.save(&dataset, dataset_name)?;

    println!(
        "{course} {assessment} #{number}: {} -> {}",
        percent(previous),
        percent(grade)
    );
    Ok(())
}

/// `85`, `85.5%`, or `none`/`-` to clear.
fn parse_grade(input: &str) -> Result<Option<f64>> {
    let input = input.trim();
    if input.eq_ignore_ascii_case("none") || input == "-" {
        return Ok(None);
    }
    let value: f64 = input
        .strip_suffix('%')
        .unwrap_or(input)
        .parse()
        .with_context(|| format!("invalid grade '{input}'"))?;
    Ok(Some(value))
}

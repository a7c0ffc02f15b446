//! The `gradebook needed` command.

use std::fmt;

use anyhow::{bail, Result};

use gradebook_core::engine::{project_target, total_weighted_average, Projection};
use gradebook_core::Scale;

use super::{find_course, Context};

pub fn execute(ctx: &Context, dataset_name: &str, course_name: &str, target: &str) -> Result<()> {
    let dataset = ctx.load_dataset(dataset_name)?;
    let course = find_course(&dataset, course_name)?;
    let target = parse_target(target, &course.scale)?;
    let label = target.to_string();

    match project_target(course, target.percent) {
        Projection::AllGraded => println!(
            "Every attempt in {course_name} is graded; the final grade is {:.2}%.",
            total_weighted_average(course)
        ),
        Projection::Unreachable(needed) => println!(
            "Reaching {label} would take {needed:.2}% on all remaining work, which is not possible."
        ),
        Projection::Achieved => println!("{label} is already secured in {course_name}."),
        Projection::Needed(needed) => println!(
            "You need {needed:.2}% on all remaining work in {course_name} to reach {label}."
        ),
    }
    Ok(())
}

struct Target {
    percent: f64,
    letter: Option<String>,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.letter {
            Some(letter) => write!(f, "{letter} ({}%)", self.percent),
            None => write!(f, "{}%", self.percent),
        }
    }
}

/// A percentage (`85`, `85%`) or a letter from the course scale.
fn parse_target(input: &str, scale: &Scale) -> Result<Target> {
    let trimmed = input.trim();
    if let Ok(percent) = trimmed.strip_suffix('%').unwrap_or(trimmed).parse::<f64>() {
        if percent.is_finite() {
            return Ok(Target {
                percent,
                letter: None,
            });
        }
    }
    match scale.threshold(trimmed) {
        Some(percent) => Ok(Target {
            percent,
            letter: Some(trimmed.to_string()),
        }),
        None => bail!("'{input}' is neither a percentage nor a letter in the course scale"),
    }
}

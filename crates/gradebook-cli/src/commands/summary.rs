//! The `gradebook summary` command.

use anyhow::Result;
use comfy_table::{Cell, Table};

use gradebook_core::engine::{summarize_assessment, summarize_course};
use gradebook_core::Course;

use super::{find_course, percent, Context};

pub fn execute(ctx: &Context, dataset_name: &str, course: Option<&str>) -> Result<()> {
    let dataset = ctx.load_dataset(dataset_name)?;

    match course {
        Some(name) => print_course(name, find_course(&dataset, name)?),
        None => {
            for (name, course) in dataset.courses() {
                print_course(name, course);
            }
        }
    }
    Ok(())
}

fn print_course(name: &str, course: &Course) {
    let mut table = Table::new();
    table.set_header(vec![
        "Assessment",
        "Weight",
        "Grades",
        "Drops left",
        "Average",
        "Achieved",
    ]);

    for (assessment_name, assessment) in &course.assessments {
        let summary = summarize_assessment(assessment);
        table.add_row(vec![
            Cell::new(assessment_name),
            Cell::new(format!("{}%", summary.weight)),
            Cell::new(format_grades(assessment.grades(), &summary.dropped)),
            Cell::new(summary.remaining_drops),
            Cell::new(percent(summary.average)),
            Cell::new(percent(summary.achieved)),
        ]);
    }

    let totals = summarize_course(course);
    let letter = totals
        .letter
        .as_deref()
        .map(|l| format!(" ({l})"))
        .unwrap_or_default();

    println!("{name}");
    println!("{table}");
    println!(
        "Weighted average: {}{letter}  Achieved: {}  Graded weight: {:.2}%  Max possible: {:.2}%\n",
        percent(totals.weighted_average),
        percent(totals.achieved),
        totals.graded_weight,
        totals.maximum,
    );
}

/// `80, [60], 90, -`: dropped attempts in brackets, ungraded as `-`.
fn format_grades(grades: &[Option<f64>], dropped: &[usize]) -> String {
    grades
        .iter()
        .enumerate()
        .map(|(i, g)| match g {
            None => "-".to_string(),
            Some(g) if dropped.contains(&i) => format!("[{g}]"),
            Some(g) => g.to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

//! The `gradebook scale` command.

use anyhow::Result;
use comfy_table::{Cell, Table};

use gradebook_core::engine::{letter_grade, summarize_course};

use super::{find_course, percent, Context};

pub fn execute(ctx: &Context, dataset_name: &str, course_name: &str) -> Result<()> {
    let dataset = ctx.load_dataset(dataset_name)?;
    let course = find_course(&dataset, course_name)?;

    if course.scale.is_none() {
        println!("{course_name} has no grade scale.");
        return Ok(());
    }

    let average = summarize_course(course).weighted_average;
    let current = average.and_then(|avg| letter_grade(&course.scale, avg));

    let mut table = Table::new();
    table.set_header(vec!["Letter", "Minimum", ""]);
    for (letter, minimum) in course.scale.iter() {
        let marker = if current == Some(letter) {
            "<- current"
        } else {
            ""
        };
        table.add_row(vec![
            Cell::new(letter),
            Cell::new(format!("{minimum}%")),
            Cell::new(marker),
        ]);
    }

    println!("{course_name} (weighted average {})", percent(average));
    println!("{table}");
    Ok(())
}

//! The `gradebook max` command.

use anyhow::Result;

use gradebook_core::engine::{letter_grade, max_grade_possible};

use super::{find_course, Context};

pub fn execute(ctx: &Context, dataset_name: &str, course_name: &str) -> Result<()> {
    let dataset = ctx.load_dataset(dataset_name)?;
    let course = find_course(&dataset, course_name)?;

    let maximum = max_grade_possible(course);
    match letter_grade(&course.scale, maximum) {
        Some(letter) => println!("Maximum possible grade in {course_name}: {maximum:.2}% ({letter})"),
        None => println!("Maximum possible grade in {course_name}: {maximum:.2}%"),
    }
    Ok(())
}

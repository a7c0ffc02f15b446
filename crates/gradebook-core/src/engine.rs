//! Grade computation engine.
//!
//! Pure functions over a validated [`Course`] or [`Assessment`]: dropping the
//! lowest attempts, weighted aggregation, projecting the score needed for a
//! target, and the best grade still reachable. Nothing here mutates the
//! caller's model; grades change only through
//! [`Dataset::set_grade`](crate::model::Dataset::set_grade).
//!
//! Two views of an assessment exist:
//!
//! - the *weighted average* counts only what has been graded, so a course
//!   with one quiz at 80% averages 80%;
//! - the *achieved* grade measures the same points against the full course
//!   weight, so that quiz contributes only its share of 100%.

use serde::Serialize;

use crate::model::{Assessment, Course, Scale, MAX_GRADE};

/// How many graded attempts [`filter_dropped`] removes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DropMode {
    /// Drop only as many attempts as needed so that the kept attempts fit in
    /// `amount - dropped` slots. Ungraded attempts are assumed to absorb the
    /// remaining drops.
    #[default]
    Maximize,
    /// Drop the configured number of attempts now (or every graded one, if
    /// fewer are graded). Used for worst-case figures and projections.
    Configured,
}

/// Result of drop selection: which slots of an assessment do not count.
#[derive(Debug, Clone, PartialEq)]
pub struct DropSelection<'a> {
    grades: &'a [Option<f64>],
    dropped: Vec<usize>,
}

impl<'a> DropSelection<'a> {
    /// Dropped slot indices, ascending.
    pub fn dropped_indices(&self) -> &[usize] {
        &self.dropped
    }

    pub fn is_dropped(&self, index: usize) -> bool {
        self.dropped.binary_search(&index).is_ok()
    }

    pub fn dropped_count(&self) -> usize {
        self.dropped.len()
    }

    pub fn dropped_grades(&self) -> impl Iterator<Item = f64> + '_ {
        self.dropped.iter().filter_map(|&i| self.grades[i])
    }

    /// Every slot that still counts, graded or not, in slot order.
    pub fn kept(&self) -> impl Iterator<Item = Option<f64>> + '_ {
        self.grades
            .iter()
            .enumerate()
            .filter(|(i, _)| !self.is_dropped(*i))
            .map(|(_, g)| *g)
    }

    pub fn kept_grades(&self) -> impl Iterator<Item = f64> + '_ {
        self.kept().flatten()
    }

    pub fn kept_graded_count(&self) -> usize {
        self.kept_grades().count()
    }
}

/// Select the lowest graded attempts of an assessment.
///
/// One pass over the graded slots keeps a bucket of at most `n` candidates;
/// once full, a candidate replaces the bucket maximum when it is strictly
/// smaller. Grades are ordered by `(grade, slot index)`, so among equal
/// grades the earliest attempt is dropped first.
pub fn filter_dropped(assessment: &Assessment, mode: DropMode) -> DropSelection<'_> {
    let grades = assessment.grades();
    let graded = assessment.graded_count() as i64;
    let to_drop = match mode {
        DropMode::Maximize => graded - assessment.counted(),
        DropMode::Configured => assessment.dropped().min(graded),
    }
    .max(0) as usize;

    let mut bucket: Vec<(usize, f64)> = Vec::with_capacity(to_drop);
    if to_drop > 0 {
        let graded_slots = grades
            .iter()
            .enumerate()
            .filter_map(|(i, g)| g.map(|g| (i, g)));
        for (index, grade) in graded_slots {
            if bucket.len() < to_drop {
                bucket.push((index, grade));
                continue;
            }
            let largest = bucket
                .iter()
                .enumerate()
                .max_by(|(_, a), (_, b)| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
            if let Some((pos, &(_, max))) = largest {
                if grade < max {
                    bucket[pos] = (index, grade);
                }
            }
        }
    }

    let mut dropped: Vec<usize> = bucket.into_iter().map(|(i, _)| i).collect();
    dropped.sort_unstable();
    DropSelection { grades, dropped }
}

/// Share of the assessment's weight earned so far, in percent of the course.
///
/// Configured drops are applied and ungraded attempts count as zero, so this
/// is the worst-case figure.
pub fn achieved_weight(assessment: &Assessment) -> f64 {
    kept_points(assessment, DropMode::Configured) * assessment.weight() as f64 / 100.0
}

/// Sum of kept grades divided by the number of counted attempts.
fn kept_points(assessment: &Assessment, mode: DropMode) -> f64 {
    let counted = assessment.counted();
    if counted <= 0 {
        return 0.0;
    }
    let sum: f64 = filter_dropped(assessment, mode).kept_grades().sum();
    sum / counted as f64
}

/// Mean of the recorded grades, ignoring ungraded slots. 0 when none.
pub fn interim_weight<I>(grades: I) -> f64
where
    I: IntoIterator<Item = Option<f64>>,
{
    let (sum, count) = grades
        .into_iter()
        .flatten()
        .fold((0.0, 0usize), |(sum, count), g| (sum + g, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Portion of the course weight that has reached a decided outcome.
pub fn total_graded_weight(course: &Course) -> f64 {
    course
        .assessments
        .values()
        .map(|a| {
            let selection = filter_dropped(a, DropMode::Maximize);
            let still_to_drop = a.dropped() - selection.dropped_count() as i64;
            let slots = a.amount() - still_to_drop;
            if slots <= 0 {
                return 0.0;
            }
            a.graded_count() as f64 / slots as f64 * a.weight() as f64
        })
        .sum()
}

/// Weighted average over the assessments that have at least one kept grade.
///
/// An assessment counts toward the completed weight as soon as one kept
/// attempt is recorded, even if that grade is 0.
pub fn total_weighted_average(course: &Course) -> f64 {
    let mut completed_weight = 0.0;
    let mut total = 0.0;

    for a in course.assessments.values() {
        let selection = filter_dropped(a, DropMode::Maximize);
        if selection.kept_graded_count() == 0 {
            continue;
        }
        let weight = a.weight() as f64;
        total += interim_weight(selection.kept()) * weight / 100.0;
        completed_weight += weight;
    }

    if completed_weight > 0.0 {
        total / completed_weight * 100.0
    } else {
        0.0
    }
}

/// Grade so far against the full 100% course weight.
pub fn total_achieved(course: &Course) -> f64 {
    total_weighted_average(course) * total_graded_weight(course) / 100.0
}

/// Flat score needed on every remaining attempt to finish at `target`
/// percent. `None` when nothing is left to grade.
///
/// While more attempts are ungraded than there are drops, the unused drops
/// are assumed to fall on future attempts. Otherwise the lowest graded
/// attempts are dropped now and every ungraded attempt counts.
pub fn needed_for_target(course: &Course, target: f64) -> Option<f64> {
    let mut achieved_sum = 0.0;
    let mut remaining_sum = 0.0;

    for a in course.assessments.values() {
        let counted = a.counted();
        if counted <= 0 {
            continue;
        }
        let mode = if a.ungraded_count() as i64 > a.dropped() {
            DropMode::Maximize
        } else {
            DropMode::Configured
        };
        let selection = filter_dropped(a, mode);
        let remaining = (counted - selection.kept_graded_count() as i64).max(0);
        let per_slot = a.weight() as f64 / counted as f64;

        achieved_sum += selection.kept_grades().sum::<f64>() * per_slot;
        remaining_sum += remaining as f64 * per_slot;
    }

    if remaining_sum == 0.0 {
        return None;
    }
    Some((target * 100.0 - achieved_sum) / remaining_sum)
}

/// How a target grade relates to what is left in a course.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    /// Every attempt is graded; nothing can change.
    AllGraded,
    /// Would need more than 100% on the remaining attempts.
    Unreachable(f64),
    /// Already secured regardless of the remaining attempts.
    Achieved,
    /// Needs this flat score on every remaining attempt.
    Needed(f64),
}

/// Classify [`needed_for_target`] for reporting.
pub fn project_target(course: &Course, target: f64) -> Projection {
    match needed_for_target(course, target) {
        None => Projection::AllGraded,
        Some(x) if x > MAX_GRADE => Projection::Unreachable(x),
        Some(x) if x <= 0.0 => Projection::Achieved,
        Some(x) => Projection::Needed(x),
    }
}

/// Weighted average if every ungraded attempt scored 100%.
pub fn max_grade_possible(course: &Course) -> f64 {
    let mut best = course.clone();
    for a in best.assessments.values_mut() {
        a.fill_ungraded(MAX_GRADE);
    }
    total_weighted_average(&best)
}

/// Letter with the greatest threshold not above `percent`.
pub fn letter_grade(scale: &Scale, percent: f64) -> Option<&str> {
    scale
        .iter()
        .filter(|(_, minimum)| *minimum <= percent)
        .fold(None, |best: Option<(&str, f64)>, (letter, minimum)| match best {
            Some((_, top)) if top >= minimum => best,
            _ => Some((letter, minimum)),
        })
        .map(|(letter, _)| letter)
}

/// Per-assessment figures for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssessmentSummary {
    pub weight: i64,
    pub graded: usize,
    /// Ungraded attempts.
    pub pending: usize,
    /// Drops not yet used up by a low grade.
    pub remaining_drops: i64,
    /// Slot indices currently dropped.
    pub dropped: Vec<usize>,
    /// Mean of the kept grades; `None` when nothing is graded.
    pub average: Option<f64>,
    pub achieved: Option<f64>,
}

pub fn summarize_assessment(assessment: &Assessment) -> AssessmentSummary {
    let selection = filter_dropped(assessment, DropMode::Maximize);
    let graded = assessment.graded_count();
    let has_grades = graded > 0;

    AssessmentSummary {
        weight: assessment.weight(),
        graded,
        pending: assessment.ungraded_count(),
        remaining_drops: assessment.dropped() - selection.dropped_count() as i64,
        dropped: selection.dropped_indices().to_vec(),
        average: has_grades.then(|| interim_weight(selection.kept())),
        achieved: has_grades.then(|| achieved_weight(assessment)),
    }
}

/// Per-course totals for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseSummary {
    /// `None` when nothing in the course is graded.
    pub weighted_average: Option<f64>,
    pub achieved: Option<f64>,
    pub graded_weight: f64,
    pub maximum: f64,
    /// Letter for the weighted average.
    pub letter: Option<String>,
}

pub fn summarize_course(course: &Course) -> CourseSummary {
    let has_grades = course.assessments.values().any(|a| a.graded_count() > 0);
    let weighted_average = total_weighted_average(course);

    CourseSummary {
        weighted_average: has_grades.then_some(weighted_average),
        achieved: has_grades.then(|| total_achieved(course)),
        graded_weight: total_graded_weight(course),
        maximum: max_grade_possible(course),
        letter: has_grades
            .then(|| letter_grade(&course.scale, weighted_average))
            .flatten()
            .map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    fn course(assessments: Vec<(&str, Assessment)>) -> Course {
        let mut course = Course::default();
        for (name, a) in assessments {
            course.assessments.insert(name.to_string(), a);
        }
        course
    }

    fn quiz() -> Assessment {
        Assessment::with_grades(30, 1, vec![Some(80.0), Some(60.0), Some(90.0), None])
    }

    fn math() -> Course {
        course(vec![
            ("Quiz", quiz()),
            ("Exam", Assessment::new(70, 1, 0)),
        ])
    }

    #[test]
    fn achieved_weight_drops_the_lowest() {
        let a = quiz();
        let selection = filter_dropped(&a, DropMode::Configured);
        assert_eq!(selection.dropped_indices(), &[1]);
        assert_eq!(selection.kept_grades().collect::<Vec<_>>(), vec![80.0, 90.0]);
        assert_close(achieved_weight(&a), 17.0);
    }

    #[test]
    fn maximize_keeps_room_for_ungraded_attempts() {
        let a = quiz();
        assert_eq!(filter_dropped(&a, DropMode::Maximize).dropped_count(), 0);

        let full = Assessment::with_grades(30, 1, vec![Some(80.0), Some(60.0), Some(90.0), Some(70.0)]);
        let selection = filter_dropped(&full, DropMode::Maximize);
        assert_eq!(selection.dropped_indices(), &[1]);
        assert!(selection.is_dropped(1));
        assert_eq!(selection.dropped_grades().collect::<Vec<_>>(), vec![60.0]);
    }

    #[test]
    fn drop_ties_go_to_the_earliest_attempt() {
        let a = Assessment::with_grades(100, 1, vec![Some(70.0), Some(50.0), Some(50.0), Some(90.0)]);
        assert_eq!(filter_dropped(&a, DropMode::Configured).dropped_indices(), &[1]);

        let a = Assessment::with_grades(100, 2, vec![Some(70.0), Some(50.0), Some(50.0), Some(90.0)]);
        assert_eq!(filter_dropped(&a, DropMode::Configured).dropped_indices(), &[1, 2]);
    }

    #[test]
    fn dropped_grades_are_never_above_kept_ones() {
        let grades = [55.0, 91.0, 12.5, 78.0, 12.5, 100.0, 0.0, 64.0];
        for dropped in 0..grades.len() as i64 {
            let a = Assessment::with_grades(100, dropped, grades.iter().map(|g| Some(*g)).collect());
            for mode in [DropMode::Maximize, DropMode::Configured] {
                let selection = filter_dropped(&a, mode);
                assert!(selection.dropped_count() as i64 <= dropped);
                let lowest_kept = selection.kept_grades().fold(f64::INFINITY, f64::min);
                assert!(selection.dropped_grades().all(|d| d <= lowest_kept));
            }
        }
    }

    #[test]
    fn interim_weight_ignores_ungraded() {
        assert_close(interim_weight(vec![Some(80.0), None, Some(90.0)]), 85.0);
        assert_close(interim_weight(Vec::new()), 0.0);
        assert_close(interim_weight(vec![None, None]), 0.0);
    }

    #[test]
    fn course_totals() {
        let c = math();
        assert_close(total_weighted_average(&c), 230.0 / 3.0);
        assert_close(total_graded_weight(&c), 30.0);
        assert_close(total_achieved(&c), 23.0);
    }

    #[test]
    fn nothing_graded_averages_zero() {
        let c = course(vec![
            ("Quiz", Assessment::new(40, 3, 1)),
            ("Exam", Assessment::new(60, 1, 0)),
        ]);
        assert_eq!(total_weighted_average(&c), 0.0);
        assert_eq!(total_achieved(&c), 0.0);
        assert_close(max_grade_possible(&c), 100.0);
    }

    #[test]
    fn recorded_zero_counts_as_completed() {
        let mut exam = Assessment::new(50, 1, 0);
        exam.set_grade(0, Some(0.0)).unwrap();
        let mut lab = Assessment::new(50, 1, 0);
        lab.set_grade(0, Some(100.0)).unwrap();
        let c = course(vec![("Exam", exam), ("Lab", lab)]);
        assert_close(total_weighted_average(&c), 50.0);
    }

    #[test]
    fn max_grade_fills_ungraded_with_full_marks() {
        let c = math();
        assert_close(max_grade_possible(&c), 97.0);
        assert!(max_grade_possible(&c) >= total_weighted_average(&c));
        // the model itself is untouched
        assert_eq!(c.assessments["Exam"].grades(), &[None]);
    }

    #[test]
    fn needed_when_drops_are_consumed() {
        let c = course(vec![("Quiz", Assessment::with_grades(100, 1, quiz().grades().to_vec()))]);
        assert_close(needed_for_target(&c, 80.0).unwrap(), 70.0);
    }

    #[test]
    fn needed_when_drops_are_still_open() {
        let c = course(vec![(
            "Quiz",
            Assessment::with_grades(100, 1, vec![Some(80.0), None, None, None]),
        )]);
        assert_close(needed_for_target(&c, 70.0).unwrap(), 65.0);
    }

    #[test]
    fn needed_across_assessments() {
        assert_close(needed_for_target(&math(), 80.0).unwrap(), 78.75);
        assert_eq!(project_target(&math(), 80.0), Projection::Needed(78.75));
        assert!(matches!(project_target(&math(), 99.0), Projection::Unreachable(_)));
        assert_eq!(project_target(&math(), 10.0), Projection::Achieved);
    }

    #[test]
    fn needed_is_none_when_everything_is_graded() {
        let c = course(vec![("Exam", Assessment::with_grades(100, 0, vec![Some(75.0)]))]);
        assert_eq!(needed_for_target(&c, 80.0), None);
        assert_eq!(project_target(&c, 80.0), Projection::AllGraded);
    }

    #[test]
    fn letter_grade_picks_highest_threshold_not_above() {
        let mut scale = Scale::None;
        assert_eq!(letter_grade(&scale, 95.0), None);

        scale.insert("A", 80.0);
        scale.insert("B", 70.0);
        scale.insert("F", 0.0);
        assert_eq!(letter_grade(&scale, 80.0), Some("A"));
        assert_eq!(letter_grade(&scale, 79.99), Some("B"));
        assert_eq!(letter_grade(&scale, 0.0), Some("F"));

        let mut no_floor = Scale::None;
        no_floor.insert("A", 80.0);
        assert_eq!(letter_grade(&no_floor, 50.0), None);
    }

    #[test]
    fn summaries() {
        let a = summarize_assessment(&quiz());
        assert_eq!(a.graded, 3);
        assert_eq!(a.pending, 1);
        assert_eq!(a.remaining_drops, 1);
        assert!(a.dropped.is_empty());
        assert_close(a.average.unwrap(), 230.0 / 3.0);
        assert_close(a.achieved.unwrap(), 17.0);

        let empty = summarize_assessment(&Assessment::new(70, 1, 0));
        assert_eq!(empty.average, None);

        let mut c = math();
        c.scale.insert("A", 80.0);
        c.scale.insert("B", 70.0);
        let s = summarize_course(&c);
        assert_close(s.weighted_average.unwrap(), 230.0 / 3.0);
        assert_eq!(s.letter.as_deref(), Some("B"));
        assert_close(s.maximum, 97.0);
    }
}

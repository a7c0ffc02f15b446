//! Core data model types for gradebook.
//!
//! A [`Dataset`] maps course names to [`Course`]s, each of which owns its
//! weighted [`Assessment`]s and a letter-grade [`Scale`]. All maps keep
//! declaration order so tables and attempt numbering stay stable.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::GradeError;

/// Lowest recordable grade, in percent.
pub const MIN_GRADE: f64 = 0.0;
/// Highest recordable grade, in percent.
pub const MAX_GRADE: f64 = 100.0;

/// Every course of one data file, keyed by course name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dataset {
    courses: IndexMap<String, Course>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.courses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.courses.contains_key(name)
    }

    pub fn course(&self, name: &str) -> Option<&Course> {
        self.courses.get(name)
    }

    pub fn course_mut(&mut self, name: &str) -> Option<&mut Course> {
        self.courses.get_mut(name)
    }

    pub fn courses(&self) -> impl Iterator<Item = (&str, &Course)> {
        self.courses.iter().map(|(name, course)| (name.as_str(), course))
    }

    pub(crate) fn courses_mut(&mut self) -> impl Iterator<Item = (&str, &mut Course)> {
        self.courses
            .iter_mut()
            .map(|(name, course)| (name.as_str(), course))
    }

    /// Insert a course, returning the one it replaced.
    pub fn insert(&mut self, name: impl Into<String>, course: Course) -> Option<Course> {
        self.courses.insert(name.into(), course)
    }

    /// Record (or clear, with `None`) the grade of one attempt.
    ///
    /// `index` is 0-based. Returns the grade previously in that slot.
    pub fn set_grade(
        &mut self,
        course: &str,
        assessment: &str,
        index: usize,
        grade: Option<f64>,
    ) -> Result<Option<f64>, GradeError> {
        let entry = self
            .courses
            .get_mut(course)
            .ok_or_else(|| GradeError::UnknownCourse(course.to_string()))?;
        let target = entry.assessments.get_mut(assessment).ok_or_else(|| {
            GradeError::UnknownAssessment {
                course: course.to_string(),
                assessment: assessment.to_string(),
            }
        })?;
        target.set_grade(index, grade).map_err(|e| match e {
            GradeError::IndexOutOfRange { number, amount, .. } => GradeError::IndexOutOfRange {
                assessment: assessment.to_string(),
                number,
                amount,
            },
            other => other,
        })
    }
}

/// One course: its weighted assessments and letter-grade scale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub assessments: IndexMap<String, Assessment>,
    #[serde(default)]
    pub scale: Scale,
}

impl Course {
    /// Sum of all assessment weights, in percent. Widened so that corrupt
    /// weights cannot overflow.
    pub fn total_weight(&self) -> i128 {
        self.assessments
            .values()
            .map(|a| i128::from(a.weight()))
            .sum()
    }
}

/// A graded category made of `amount` attempts, the lowest `dropped` of
/// which do not count.
///
/// Counts are signed so that a corrupt model can be represented and then
/// rejected by the validator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    weight: i64,
    amount: i64,
    dropped: i64,
    grades: Vec<Option<f64>>,
}

impl Assessment {
    /// A fresh assessment with every attempt ungraded.
    pub fn new(weight: i64, amount: i64, dropped: i64) -> Self {
        let slots = usize::try_from(amount).unwrap_or(0);
        Self {
            weight,
            amount,
            dropped,
            grades: vec![None; slots],
        }
    }

    /// An assessment whose amount is the number of given slots.
    pub fn with_grades(weight: i64, dropped: i64, grades: Vec<Option<f64>>) -> Self {
        Self {
            weight,
            amount: grades.len() as i64,
            dropped,
            grades,
        }
    }

    pub fn weight(&self) -> i64 {
        self.weight
    }

    pub fn amount(&self) -> i64 {
        self.amount
    }

    pub fn dropped(&self) -> i64 {
        self.dropped
    }

    pub fn grades(&self) -> &[Option<f64>] {
        &self.grades
    }

    /// Number of attempts that count toward the average.
    pub fn counted(&self) -> i64 {
        self.amount - self.dropped
    }

    pub fn graded_count(&self) -> usize {
        self.grades.iter().filter(|g| g.is_some()).count()
    }

    pub fn ungraded_count(&self) -> usize {
        self.grades.len() - self.graded_count()
    }

    /// Overwrite one slot. The slot count never changes.
    pub fn set_grade(
        &mut self,
        index: usize,
        grade: Option<f64>,
    ) -> Result<Option<f64>, GradeError> {
        if let Some(value) = grade {
            if !value.is_finite() || !(MIN_GRADE..=MAX_GRADE).contains(&value) {
                return Err(GradeError::OutOfRange(value));
            }
        }
        let amount = self.grades.len();
        let slot = self
            .grades
            .get_mut(index)
            .ok_or(GradeError::IndexOutOfRange {
                assessment: String::new(),
                number: index + 1,
                amount,
            })?;
        Ok(std::mem::replace(slot, grade))
    }

    /// Record `value` in every ungraded slot.
    pub(crate) fn fill_ungraded(&mut self, value: f64) {
        for slot in self.grades.iter_mut().filter(|g| g.is_none()) {
            *slot = Some(value);
        }
    }
}

/// Letter-grade thresholds for a course.
///
/// Serialized as a plain `{ "A": 80.0, ... }` object; an empty object means
/// no scale is configured.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    from = "IndexMap<String, f64>",
    into = "IndexMap<String, f64>"
)]
pub enum Scale {
    /// No letter-grade scale configured.
    #[default]
    None,
    /// Letter → minimum percentage, highest threshold first once validated.
    Entries(IndexMap<String, f64>),
}

impl Scale {
    pub fn is_none(&self) -> bool {
        matches!(self, Scale::None)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        let entries = match self {
            Scale::None => None,
            Scale::Entries(map) => Some(map.iter().map(|(k, v)| (k.as_str(), *v))),
        };
        entries.into_iter().flatten()
    }

    /// Threshold of a letter, matched case-insensitively.
    pub fn threshold(&self, letter: &str) -> Option<f64> {
        self.iter()
            .find(|(l, _)| l.eq_ignore_ascii_case(letter))
            .map(|(_, v)| v)
    }

    /// Insert or overwrite a letter's threshold.
    pub fn insert(&mut self, letter: impl Into<String>, minimum: f64) {
        match self {
            Scale::None => {
                let mut map = IndexMap::new();
                map.insert(letter.into(), minimum);
                *self = Scale::Entries(map);
            }
            Scale::Entries(map) => {
                map.insert(letter.into(), minimum);
            }
        }
    }

    /// Sort entries by threshold, highest first. Ties keep insertion order.
    pub(crate) fn sort_descending(&mut self) {
        if let Scale::Entries(map) = self {
            map.sort_by(|_, a, _, b| b.total_cmp(a));
        }
    }
}

impl From<IndexMap<String, f64>> for Scale {
    fn from(map: IndexMap<String, f64>) -> Self {
        if map.is_empty() {
            Scale::None
        } else {
            Scale::Entries(map)
        }
    }
}

impl From<Scale> for IndexMap<String, f64> {
    fn from(scale: Scale) -> Self {
        match scale {
            Scale::None => IndexMap::new(),
            Scale::Entries(map) => map,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_assessment_is_ungraded() {
        let a = Assessment::new(30, 4, 1);
        assert_eq!(a.grades().len(), 4);
        assert_eq!(a.ungraded_count(), 4);
        assert_eq!(a.counted(), 3);
    }

    #[test]
    fn set_grade_keeps_length() {
        let mut a = Assessment::new(30, 3, 0);
        assert_eq!(a.set_grade(1, Some(75.0)).unwrap(), None);
        assert_eq!(a.set_grade(1, Some(80.0)).unwrap(), Some(75.0));
        assert_eq!(a.set_grade(1, None).unwrap(), Some(80.0));
        assert_eq!(a.grades().len(), 3);

        assert!(a.set_grade(3, Some(50.0)).is_err());
        assert!(matches!(
            a.set_grade(0, Some(101.0)),
            Err(GradeError::OutOfRange(_))
        ));
        assert!(a.set_grade(0, Some(f64::NAN)).is_err());
        assert_eq!(a.grades().len(), 3);
    }

    #[test]
    fn dataset_set_grade_reports_names() {
        let mut course = Course::default();
        course
            .assessments
            .insert("Quiz".into(), Assessment::new(100, 2, 0));
        let mut data = Dataset::new();
        data.insert("Math 101", course);

        data.set_grade("Math 101", "Quiz", 0, Some(90.0)).unwrap();
        assert_eq!(
            data.course("Math 101").unwrap().assessments["Quiz"].grades(),
            &[Some(90.0), None]
        );

        assert_eq!(
            data.set_grade("Physics", "Quiz", 0, None),
            Err(GradeError::UnknownCourse("Physics".into()))
        );
        let err = data.set_grade("Math 101", "Quiz", 5, None).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid attempt number 6: Quiz has 2 attempt(s)"
        );
    }

    #[test]
    fn empty_scale_is_none() {
        let scale: Scale = serde_json::from_str("{}").unwrap();
        assert!(scale.is_none());
        assert_eq!(serde_json::to_string(&Scale::None).unwrap(), "{}");
    }

    #[test]
    fn scale_sorts_descending_and_looks_up_letters() {
        let mut map = IndexMap::new();
        map.insert("C".to_string(), 60.0);
        map.insert("A".to_string(), 80.0);
        map.insert("B".to_string(), 70.0);
        let mut scale = Scale::from(map);
        scale.sort_descending();

        let letters: Vec<&str> = scale.iter().map(|(l, _)| l).collect();
        assert_eq!(letters, vec!["A", "B", "C"]);
        assert_eq!(scale.threshold("b"), Some(70.0));
        assert_eq!(scale.threshold("F"), None);
    }

    #[test]
    fn course_serde_roundtrip_keeps_order() {
        let json = r#"{
            "assessments": {
                "Quiz": {"weight": 40, "amount": 2, "dropped": 0, "grades": [null, 85.5]},
                "Exam": {"weight": 60, "amount": 1, "dropped": 0, "grades": [null]}
            },
            "scale": {"A": 80, "B": 70}
        }"#;
        let course: Course = serde_json::from_str(json).unwrap();
        let names: Vec<&String> = course.assessments.keys().collect();
        assert_eq!(names, vec!["Quiz", "Exam"]);
        assert_eq!(course.total_weight(), 100);

        let back: Course = serde_json::from_str(&serde_json::to_string(&course).unwrap()).unwrap();
        assert_eq!(back, course);
    }
}

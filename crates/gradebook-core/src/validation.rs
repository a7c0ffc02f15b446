//! Structural and semantic validation of datasets.
//!
//! Structure is checked on the raw JSON document so that a hand-edited or
//! truncated data file is reported with a path to the offending value.
//! Semantics are checked on the typed model; this pass also canonicalizes
//! every scale (highest threshold first).
//!
//! A course without a scale is the one recoverable structural condition: it
//! is reported in the [`StructureReport`] and continues as
//! [`Scale::None`](crate::model::Scale::None).

use serde_json::{Map, Value};

use crate::error::{SemanticError, StructureError, ValidationError};
use crate::model::{Dataset, MAX_GRADE, MIN_GRADE};

const INTEGER_FIELDS: [&str; 3] = ["weight", "amount", "dropped"];

/// Recoverable findings of a structural check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructureReport {
    /// Courses that had no scale and continue without one.
    pub unscaled: Vec<String>,
}

fn structure_error(path: &[&str], reason: impl Into<String>) -> StructureError {
    StructureError {
        path: if path.is_empty() {
            "Root".to_string()
        } else {
            path.join(" -> ")
        },
        reason: reason.into(),
    }
}

fn non_empty_object<'a>(
    value: &'a Value,
    path: &[&str],
    empty_reason: &str,
) -> Result<&'a Map<String, Value>, StructureError> {
    let object = value
        .as_object()
        .ok_or_else(|| structure_error(path, "expected an object"))?;
    if object.is_empty() {
        return Err(structure_error(path, empty_reason));
    }
    Ok(object)
}

/// Check that a JSON document has the dataset shape.
pub fn check_structure(document: &Value) -> Result<StructureReport, StructureError> {
    let mut report = StructureReport::default();
    let courses = non_empty_object(document, &[], "no courses found")?;

    for (course_name, course) in courses {
        let course_name = course_name.as_str();
        let course_path = [course_name];
        let course = course
            .as_object()
            .ok_or_else(|| structure_error(&course_path, "expected an object"))?;

        let assessments = course.get("assessments").ok_or_else(|| {
            structure_error(&course_path, "missing required field 'assessments'")
        })?;
        let assessments = non_empty_object(
            assessments,
            &[course_name, "assessments"],
            "no assessments found",
        )?;

        for (assessment_name, assessment) in assessments {
            check_assessment(course_name, assessment_name, assessment)?;
        }

        match course.get("scale") {
            None | Some(Value::Null) => report.unscaled.push(course_name.to_string()),
            Some(Value::Object(scale)) if scale.is_empty() => {
                report.unscaled.push(course_name.to_string())
            }
            Some(Value::Object(scale)) => {
                for (letter, minimum) in scale {
                    if !minimum.is_number() {
                        return Err(structure_error(
                            &[course_name, "scale", letter.as_str()],
                            "expected a number",
                        ));
                    }
                }
            }
            Some(_) => {
                return Err(structure_error(
                    &[course_name, "scale"],
                    "expected an object",
                ))
            }
        }
    }

    Ok(report)
}

fn check_assessment(course: &str, name: &str, value: &Value) -> Result<(), StructureError> {
    let path = [course, "assessments", name];
    let assessment = value
        .as_object()
        .ok_or_else(|| structure_error(&path, "expected an object"))?;

    for field in INTEGER_FIELDS {
        let value = assessment
            .get(field)
            .ok_or_else(|| structure_error(&path, format!("missing required field '{field}'")))?;
        if value.as_i64().is_none() {
            return Err(structure_error(
                &[course, "assessments", name, field],
                "expected an integer",
            ));
        }
    }

    let grades = assessment
        .get("grades")
        .ok_or_else(|| structure_error(&path, "missing required field 'grades'"))?
        .as_array()
        .ok_or_else(|| {
            structure_error(&[course, "assessments", name, "grades"], "expected an array")
        })?;
    if let Some(idx) = grades.iter().position(|g| !(g.is_number() || g.is_null())) {
        let idx = idx.to_string();
        return Err(structure_error(
            &[course, "assessments", name, "grades", idx.as_str()],
            "expected a number or null",
        ));
    }

    Ok(())
}

/// The typed counterpart of [`check_structure`] for in-memory models.
fn check_model_structure(dataset: &Dataset) -> Result<StructureReport, StructureError> {
    if dataset.is_empty() {
        return Err(structure_error(&[], "no courses found"));
    }

    let mut report = StructureReport::default();
    for (name, course) in dataset.courses() {
        if course.assessments.is_empty() {
            return Err(structure_error(&[name, "assessments"], "no assessments found"));
        }
        if course.scale.is_none() {
            report.unscaled.push(name.to_string());
        }
    }
    Ok(report)
}

/// Check numeric consistency of every course, sorting each scale first.
pub fn check_semantics(dataset: &mut Dataset) -> Result<(), SemanticError> {
    for (course_name, course) in dataset.courses_mut() {
        course.scale.sort_descending();

        for (name, a) in &course.assessments {
            let names = || (course_name.to_string(), name.clone());

            if a.weight() <= 0 {
                let (course, assessment) = names();
                return Err(SemanticError::NonPositiveWeight { course, assessment });
            }

            if a.dropped() < 0 {
                let (course, assessment) = names();
                return Err(SemanticError::NegativeDropped { course, assessment });
            }

            if a.amount() <= a.dropped() {
                let (course, assessment) = names();
                return Err(SemanticError::TooManyDropped { course, assessment });
            }

            if a.grades().len() as i64 != a.amount() {
                let (course, assessment) = names();
                return Err(SemanticError::GradeCount {
                    course,
                    assessment,
                    expected: a.amount(),
                    actual: a.grades().len(),
                });
            }

            if let Some(grade) = a
                .grades()
                .iter()
                .flatten()
                .find(|g| !g.is_finite() || !(MIN_GRADE..=MAX_GRADE).contains(*g))
            {
                let (course, assessment) = names();
                return Err(SemanticError::GradeOutOfRange {
                    course,
                    assessment,
                    grade: *grade,
                });
            }
        }

        let total_weight = course.total_weight();
        if total_weight != 100 {
            return Err(SemanticError::TotalWeight {
                course: course_name.to_string(),
                total: total_weight,
            });
        }
    }

    Ok(())
}

/// Validate and canonicalize an in-memory dataset.
pub fn validate(dataset: &mut Dataset) -> Result<StructureReport, ValidationError> {
    let report = check_model_structure(dataset)?;
    check_semantics(dataset)?;
    Ok(report)
}

/// Validate a loaded JSON document and turn it into a canonical dataset.
pub fn validate_document(
    mut document: Value,
) -> Result<(Dataset, StructureReport), ValidationError> {
    let report = check_structure(&document)?;

    for course in &report.unscaled {
        tracing::warn!("{course} has no grade scale; continuing without one");
        document[course.as_str()]["scale"] = Value::Object(Map::new());
    }

    let mut dataset: Dataset = serde_json::from_value(document)
        .map_err(|e| structure_error(&[], e.to_string()))?;
    check_semantics(&mut dataset)?;

    Ok((dataset, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Assessment, Course};
    use crate::parser::parse_outline_str;
    use serde_json::json;

    fn course(weights: &[(&str, i64, i64, i64)]) -> Course {
        let mut course = Course::default();
        for (name, weight, amount, dropped) in weights {
            course
                .assessments
                .insert(name.to_string(), Assessment::new(*weight, *amount, *dropped));
        }
        course.scale.insert("A", 80.0);
        course
    }

    fn dataset(course: Course) -> Dataset {
        let mut data = Dataset::new();
        data.insert("Math 101", course);
        data
    }

    #[test]
    fn weights_must_total_100() {
        let mut data = parse_outline_str(
            "course Math 101\nassessments\n2 Assignment 60%\n1 Exam 30%\nscale\nA 80%\n",
        )
        .unwrap();
        let err = validate(&mut data).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::Semantic(SemanticError::TotalWeight { ref course, total: 90 }) if course == "Math 101"
        ));
        assert!(err.to_string().contains("total weight"));
    }

    #[test]
    fn huge_weights_do_not_wrap_to_100() {
        let exam = |weight: i64| json!({"weight": weight, "amount": 1, "dropped": 0, "grades": [null]});
        let doc = json!({
            "X": {
                "assessments": {"A": exam(i64::MAX), "B": exam(i64::MAX), "C": exam(102)},
                "scale": {"A": 80}
            }
        });
        let err = validate_document(doc).unwrap_err();
        let expected = 2 * i128::from(i64::MAX) + 102;
        assert!(matches!(
            err,
            ValidationError::Semantic(SemanticError::TotalWeight { total, .. }) if total == expected
        ));
    }

    #[test]
    fn semantic_checks_name_the_assessment() {
        let cases = [
            (course(&[("Quiz", 0, 2, 0), ("Exam", 100, 1, 0)]), "weight must be positive"),
            (course(&[("Quiz", 100, 3, -1)]), "negative"),
            (course(&[("Quiz", 100, 2, 2)]), "too many dropped"),
        ];
        for (course, message) in cases {
            let err = validate(&mut dataset(course)).unwrap_err();
            assert!(err.to_string().contains(message), "{err}");
            assert!(err.to_string().contains("Math 101 Quiz"), "{err}");
        }
    }

    #[test]
    fn scale_is_sorted_descending() {
        let mut data = parse_outline_str(
            "course X\nassessments\n1 Exam 100%\nscale\nC 60%\nA 80%\nB 70%\nD 60%\n",
        )
        .unwrap();
        let report = validate(&mut data).unwrap();
        assert!(report.unscaled.is_empty());

        let order: Vec<&str> = data.course("X").unwrap().scale.iter().map(|(l, _)| l).collect();
        assert_eq!(order, vec!["A", "B", "C", "D"]);
    }

    #[test]
    fn missing_scale_is_recovered() {
        let doc = json!({
            "Math 101": {
                "assessments": {
                    "Exam": {"weight": 100, "amount": 1, "dropped": 0, "grades": [null]}
                }
            },
            "Physics": {
                "assessments": {
                    "Lab": {"weight": 100, "amount": 2, "dropped": 0, "grades": [90, null]}
                },
                "scale": {}
            }
        });
        let (data, report) = validate_document(doc).unwrap();
        assert_eq!(report.unscaled, vec!["Math 101", "Physics"]);
        assert!(data.course("Math 101").unwrap().scale.is_none());
        assert_eq!(
            data.course("Physics").unwrap().assessments["Lab"].grades(),
            &[Some(90.0), None]
        );
    }

    #[test]
    fn structure_errors_carry_a_path() {
        let cases = [
            (json!([]), "Root"),
            (json!({}), "Root"),
            (json!({"X": {"scale": {}}}), "X"),
            (json!({"X": {"assessments": {}}}), "X -> assessments"),
            (
                json!({"X": {"assessments": {"Quiz": {"weight": 100, "amount": 1, "grades": [null]}}}}),
                "X -> assessments -> Quiz",
            ),
            (
                json!({"X": {"assessments": {"Quiz": {"weight": "100", "amount": 1, "dropped": 0, "grades": [null]}}}}),
                "X -> assessments -> Quiz -> weight",
            ),
            (
                json!({"X": {"assessments": {"Quiz": {"weight": 100, "amount": 2, "dropped": 0, "grades": [null, "A"]}}}}),
                "X -> assessments -> Quiz -> grades -> 1",
            ),
            (
                json!({"X": {"assessments": {"Quiz": {"weight": 100, "amount": 1, "dropped": 0, "grades": [null]}}, "scale": {"A": "80"}}}),
                "X -> scale -> A",
            ),
        ];
        for (doc, path) in cases {
            let err = check_structure(&doc).unwrap_err();
            assert_eq!(err.path, path, "{doc}");
        }
    }

    #[test]
    fn grade_slots_must_match_amount() {
        let doc = json!({
            "X": {
                "assessments": {
                    "Quiz": {"weight": 100, "amount": 3, "dropped": 0, "grades": [null]}
                },
                "scale": {"A": 80}
            }
        });
        let err = validate_document(doc).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::Semantic(SemanticError::GradeCount { expected: 3, actual: 1, .. })
        ));
    }

    #[test]
    fn out_of_range_grades_are_rejected() {
        let doc = json!({
            "X": {
                "assessments": {
                    "Quiz": {"weight": 100, "amount": 2, "dropped": 0, "grades": [50, 120]}
                }
            }
        });
        let err = validate_document(doc).unwrap_err();
        assert!(err.to_string().contains("outside 0-100"));
    }

    #[test]
    fn empty_dataset_is_a_structure_error() {
        let err = validate(&mut Dataset::new()).unwrap_err();
        assert!(matches!(err, ValidationError::Structure(_)));
    }
}

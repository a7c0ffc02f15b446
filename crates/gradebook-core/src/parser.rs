//! Course outline parser.
//!
//! Turns a line-oriented outline into a [`Dataset`]:
//!
//! ```text
//! course Math 101
//! assessments
//! 4 drop 1 Quiz 30%
//! 1 Exam 70%
//! scale
//! A 80%
//! ```
//!
//! Parsing is a small state machine. Section headers switch state; every
//! other non-blank line is handled by the current state. The first bad line
//! aborts the whole parse, so a partial dataset is never returned.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::error::{ParseError, ValidationError};
use crate::model::{Assessment, Course, Dataset};
use crate::validation;

/// Course name reserved for "every course".
pub const RESERVED_COURSE_NAME: &str = "all";

/// Failure to turn an outline file into a validated dataset.
#[derive(Debug, Error)]
pub enum OutlineError {
    #[error("failed to read outline {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    #[error("{}: {source}", .path.display())]
    Invalid {
        path: PathBuf,
        #[source]
        source: ValidationError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    None,
    Course,
    Assessments,
    Scale,
}

/// Header keyword → state it enters. Matched as a case-insensitive prefix.
const TRANSITIONS: [(&str, State); 3] = [
    ("course", State::Course),
    ("assessments", State::Assessments),
    ("scale", State::Scale),
];

impl State {
    fn transition(line: &str) -> Option<State> {
        TRANSITIONS.iter().find_map(|(keyword, next)| {
            line.get(..keyword.len())
                .filter(|prefix| prefix.eq_ignore_ascii_case(keyword))
                .map(|_| *next)
        })
    }

    /// A line consisting of nothing but a section keyword.
    fn is_bare_header(line: &str) -> bool {
        TRANSITIONS
            .iter()
            .any(|(keyword, _)| line.eq_ignore_ascii_case(keyword))
    }
}

struct OutlineParser {
    state: State,
    dataset: Dataset,
    current: Option<String>,
    /// Line of the last `course` header, for reporting a missing name.
    header_line: usize,
}

impl OutlineParser {
    fn new() -> Self {
        Self {
            state: State::None,
            dataset: Dataset::new(),
            current: None,
            header_line: 0,
        }
    }

    fn unnamed_course(&self) -> ParseError {
        ParseError::new(self.header_line, "Course has no name")
    }

    fn finish(self) -> Result<Dataset, ParseError> {
        if self.state == State::Course {
            return Err(self.unnamed_course());
        }
        Ok(self.dataset)
    }

    fn feed(&mut self, line_no: usize, raw: &str) -> Result<(), ParseError> {
        let line = raw.trim();
        if line.is_empty() {
            return Ok(());
        }

        // After a bare `course` header the next line is the name, even when
        // it starts with a keyword; only another bare header is rejected.
        if self.state == State::Course {
            if State::is_bare_header(line) {
                return Err(self.unnamed_course());
            }
            return self.start_course(line_no, line);
        }

        if let Some(next) = State::transition(line) {
            tracing::debug!(line = line_no, from = ?self.state, to = ?next, "outline section");
            self.state = next;
            if next == State::Course {
                self.header_line = line_no;
                if let Some(name) = inline_course_name(line) {
                    self.start_course(line_no, name)?;
                }
            }
            return Ok(());
        }

        match self.state {
            State::None => {
                tracing::debug!(line = line_no, "ignoring line outside any section");
                Ok(())
            }
            State::Course => self.start_course(line_no, line),
            State::Assessments => self.add_assessment(line_no, line),
            State::Scale => self.add_scale_entry(line_no, line),
        }
    }

    fn start_course(&mut self, line_no: usize, name: &str) -> Result<(), ParseError> {
        if name.eq_ignore_ascii_case(RESERVED_COURSE_NAME) {
            return Err(ParseError::new(
                line_no,
                format!("Course cannot be named '{RESERVED_COURSE_NAME}'."),
            ));
        }
        if self.dataset.contains(name) {
            return Err(ParseError::new(
                line_no,
                format!("Duplicate course: '{name}'"),
            ));
        }
        self.dataset.insert(name, Course::default());
        self.current = Some(name.to_string());
        self.state = State::None;
        Ok(())
    }

    fn current_course(&mut self, line_no: usize, line: &str) -> Result<&mut Course, ParseError> {
        self.current
            .as_deref()
            .and_then(|name| self.dataset.course_mut(name))
            .ok_or_else(|| ParseError::new(line_no, format!("'{line}' appears before any course")))
    }

    fn add_assessment(&mut self, line_no: usize, line: &str) -> Result<(), ParseError> {
        let syntax = || ParseError::new(line_no, format!("Invalid assessment syntax: '{line}'"));

        if !line.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(syntax());
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        let (amount, dropped, name, weight) = match parts.as_slice() {
            [amount, name, weight] => (*amount, "0", *name, *weight),
            [amount, keyword, dropped, name, weight] if keyword.eq_ignore_ascii_case("drop") => {
                (*amount, *dropped, *name, *weight)
            }
            _ => return Err(syntax()),
        };

        let non_numeric = || ParseError::new(line_no, format!("Non-numeric values: '{line}'"));
        let amount: u32 = amount.parse().map_err(|_| non_numeric())?;
        let dropped: u32 = dropped.parse().map_err(|_| non_numeric())?;

        let weight: u32 = weight
            .strip_suffix('%')
            .filter(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|digits| digits.parse().ok())
            .ok_or_else(|| ParseError::new(line_no, format!("Invalid weight: '{line}'")))?;

        let course = self.current_course(line_no, line)?;
        if course.assessments.contains_key(name) {
            return Err(ParseError::new(
                line_no,
                format!("Duplicate assessment: '{name}'"),
            ));
        }
        course.assessments.insert(
            name.to_string(),
            Assessment::new(weight.into(), amount.into(), dropped.into()),
        );
        Ok(())
    }

    fn add_scale_entry(&mut self, line_no: usize, line: &str) -> Result<(), ParseError> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let [letter, minimum] = parts[..] else {
            return Err(ParseError::new(line_no, format!("Invalid grade: '{line}'")));
        };

        let minimum: f64 = minimum
            .strip_suffix('%')
            .unwrap_or(minimum)
            .parse()
            .ok()
            .filter(|m: &f64| m.is_finite())
            .ok_or_else(|| ParseError::new(line_no, format!("Invalid minimum: '{line}'")))?;

        self.current_course(line_no, line)?
            .scale
            .insert(letter, minimum);
        Ok(())
    }
}

/// `course Math 101` names the course on the header line itself.
fn inline_course_name(line: &str) -> Option<&str> {
    let (keyword, rest) = line.split_once(char::is_whitespace)?;
    let rest = rest.trim();
    (keyword.eq_ignore_ascii_case("course") && !rest.is_empty()).then_some(rest)
}

/// Parse outline text into a dataset. Not yet validated.
pub fn parse_outline_str(text: &str) -> Result<Dataset, ParseError> {
    let mut parser = OutlineParser::new();
    for (idx, line) in text.lines().enumerate() {
        parser.feed(idx + 1, line)?;
    }
    parser.finish()
}

/// Read, parse, and validate an outline file.
pub fn load_outline(path: &Path) -> Result<Dataset, OutlineError> {
    let text = std::fs::read_to_string(path).map_err(|source| OutlineError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut dataset = parse_outline_str(&text).map_err(|source| OutlineError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    validation::validate(&mut dataset).map_err(|source| OutlineError::Invalid {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::info!(
        "parsed {} course(s) from {}",
        dataset.len(),
        path.display()
    );
    Ok(dataset)
}

/// All `.txt` outlines directly inside `dir`, sorted by file name.
pub fn list_outlines(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut outlines = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "txt") {
            outlines.push(path);
        }
    }
    outlines.sort();
    Ok(outlines)
}

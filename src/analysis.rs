//! Result analysis over an in-memory [`Dataset`].
//!
//! Every operation is pure and degrades instead of failing: a missing column,
//! or a marks column that is not numeric, produces an empty (or partial) result
//! together with a [`Diagnostic`].
//!
//! Marks are judged on a fixed 100-point scale with an inclusive pass mark of
//! 33.0.

use std::{collections::HashMap, fmt, io::Write};

use anyhow::{Context, Result};
use itertools::Itertools;
use log::warn;
use serde::Serialize;
use thiserror::Error;

use crate::{
    dataset::{Dataset, Frame, Value},
    io_utils,
};

pub const FULL_MARKS: f64 = 100.0;
pub const PASS_MARK: f64 = 33.0;
pub const STATUS_SUFFIX: &str = "_status";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
pub enum Diagnostic {
    #[error("column '{0}' not found in dataset")]
    MissingColumn(String),
    #[error("column '{0}' is not numeric")]
    NonNumericColumn(String),
    #[error("no subject columns are configured")]
    NoSubject,
}

/// Value of an analysis together with the reasons it may be incomplete.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outcome<T> {
    pub value: T,
    pub diagnostics: Vec<Diagnostic>,
}

impl<T> Outcome<T> {
    fn new(value: T, diagnostics: Vec<Diagnostic>) -> Self {
        for diagnostic in &diagnostics {
            warn!("{diagnostic}");
        }
        Self { value, diagnostics }
    }

    pub fn is_complete(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        Outcome {
            value: f(self.value),
            diagnostics: self.diagnostics,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PassStatus {
    Pass,
    Fail,
}

impl PassStatus {
    pub fn for_marks(marks: f64) -> Self {
        if marks >= PASS_MARK {
            PassStatus::Pass
        } else {
            PassStatus::Fail
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PassStatus::Pass => "Pass",
            PassStatus::Fail => "Fail",
        }
    }
}

impl fmt::Display for PassStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectFailures {
    pub subject: String,
    pub students: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub name: String,
    pub average_marks: Option<f64>,
    pub average_attendance: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarksPoint {
    pub name: Option<String>,
    pub attendance: f64,
    pub marks: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Comparison {
    pub points: Vec<MarksPoint>,
    pub correlation: Option<f64>,
}

fn numeric_column(dataset: &Dataset, name: &str) -> std::result::Result<usize, Diagnostic> {
    let idx = dataset
        .column_index(name)
        .ok_or_else(|| Diagnostic::MissingColumn(name.to_string()))?;
    if dataset.columns()[idx].column_type.is_numeric() {
        Ok(idx)
    } else {
        Err(Diagnostic::NonNumericColumn(name.to_string()))
    }
}

fn any_column(dataset: &Dataset, name: &str) -> std::result::Result<usize, Diagnostic> {
    dataset
        .column_index(name)
        .ok_or_else(|| Diagnostic::MissingColumn(name.to_string()))
}

fn status_value(value: &Value) -> Value {
    match value.as_f64() {
        Some(marks) => Value::Text(PassStatus::for_marks(marks).label().to_string()),
        None => Value::Null,
    }
}

/// Every row whose total equals the dataset-wide maximum.
pub fn highest_marks(dataset: &Dataset, total: &str) -> Outcome<Frame> {
    let mut frame = Frame::new(dataset.headers());
    let idx = match numeric_column(dataset, total) {
        Ok(idx) => idx,
        Err(diagnostic) => return Outcome::new(frame, vec![diagnostic]),
    };
    let max = dataset
        .rows()
        .iter()
        .filter_map(|row| row[idx].as_f64())
        .reduce(f64::max);
    if let Some(max) = max {
        frame.rows = dataset
            .rows()
            .iter()
            .filter(|row| row[idx].as_f64() == Some(max))
            .cloned()
            .collect();
    }
    Outcome::new(frame, Vec::new())
}

/// The `n` rows with the largest total, descending; ties keep input order.
pub fn top_students(dataset: &Dataset, total: &str, n: usize) -> Outcome<Frame> {
    let mut frame = Frame::new(dataset.headers());
    let idx = match numeric_column(dataset, total) {
        Ok(idx) => idx,
        Err(diagnostic) => return Outcome::new(frame, vec![diagnostic]),
    };
    frame.rows = dataset
        .rows()
        .iter()
        .filter_map(|row| row[idx].as_f64().map(|marks| (marks, row)))
        .sorted_by(|(a, _), (b, _)| b.total_cmp(a))
        .take(n)
        .map(|(_, row)| row.clone())
        .collect();
    Outcome::new(frame, Vec::new())
}

/// Name and marks for a single subject.
pub fn subject_marks(dataset: &Dataset, name: &str, subject: &str) -> Outcome<Frame> {
    let headers = vec![name.to_string(), subject.to_string()];
    let (name_idx, subject_idx) = match (any_column(dataset, name), any_column(dataset, subject)) {
        (Ok(n), Ok(s)) => (n, s),
        (n, s) => {
            let diagnostics = [n.err(), s.err()].into_iter().flatten().collect();
            return Outcome::new(Frame::new(headers), diagnostics);
        }
    };
    let mut frame = Frame::new(headers);
    frame.rows = dataset
        .rows()
        .iter()
        .map(|row| vec![row[name_idx].clone(), row[subject_idx].clone()])
        .collect();
    Outcome::new(frame, Vec::new())
}

/// Name and marks for a single subject, with a pass/fail `status` column.
pub fn subject_pass_fail(dataset: &Dataset, name: &str, subject: &str) -> Outcome<Frame> {
    let mut outcome = subject_marks(dataset, name, subject);
    if outcome.is_complete() && numeric_column(dataset, subject).is_err() {
        let frame = Frame::new(outcome.value.headers.clone());
        return Outcome::new(
            frame,
            vec![Diagnostic::NonNumericColumn(subject.to_string())],
        );
    }
    outcome.value.headers.push("status".to_string());
    for row in &mut outcome.value.rows {
        let status = status_value(&row[1]);
        row.push(status);
    }
    outcome
}

/// Name, every available subject, then one `<subject>_status` column per subject.
pub fn pass_fail_table(dataset: &Dataset, name: &str, subjects: &[String]) -> Outcome<Frame> {
    let mut diagnostics = Vec::new();
    let name_idx = match any_column(dataset, name) {
        Ok(idx) => idx,
        Err(diagnostic) => return Outcome::new(Frame::default(), vec![diagnostic]),
    };
    let mut available = Vec::new();
    for subject in subjects {
        match numeric_column(dataset, subject) {
            Ok(idx) => available.push((subject.as_str(), idx)),
            Err(diagnostic) => diagnostics.push(diagnostic),
        }
    }

    let mut headers = vec![name.to_string()];
    headers.extend(available.iter().map(|(subject, _)| subject.to_string()));
    headers.extend(
        available
            .iter()
            .map(|(subject, _)| format!("{subject}{STATUS_SUFFIX}")),
    );
    let mut frame = Frame::new(headers);
    for row in dataset.rows() {
        let mut out = vec![row[name_idx].clone()];
        out.extend(available.iter().map(|(_, idx)| row[*idx].clone()));
        out.extend(available.iter().map(|(_, idx)| status_value(&row[*idx])));
        frame.rows.push(out);
    }
    Outcome::new(frame, diagnostics)
}

/// Students scoring below the pass mark, per subject, in row order. Rows
/// without a name are skipped.
pub fn failures(
    dataset: &Dataset,
    name: &str,
    subjects: &[String],
) -> Outcome<Vec<SubjectFailures>> {
    let mut diagnostics = Vec::new();
    let name_idx = match any_column(dataset, name) {
        Ok(idx) => Some(idx),
        Err(diagnostic) => {
            diagnostics.push(diagnostic);
            None
        }
    };

    let mut lists = Vec::with_capacity(subjects.len());
    for subject in subjects {
        let mut students = Vec::new();
        match numeric_column(dataset, subject) {
            Ok(subject_idx) => {
                if let Some(name_idx) = name_idx {
                    students = dataset
                        .rows()
                        .iter()
                        .filter(|row| !row[name_idx].is_null())
                        .filter(|row| {
                            row[subject_idx]
                                .as_f64()
                                .is_some_and(|marks| PassStatus::for_marks(marks) == PassStatus::Fail)
                        })
                        .map(|row| row[name_idx].as_display())
                        .collect();
                }
            }
            Err(diagnostic) => diagnostics.push(diagnostic),
        }
        lists.push(SubjectFailures {
            subject: subject.clone(),
            students,
        });
    }
    Outcome::new(lists, diagnostics)
}

#[derive(Default)]
struct MeanAccumulator {
    sum: f64,
    count: usize,
}

impl MeanAccumulator {
    fn add(&mut self, value: Option<f64>) {
        if let Some(value) = value {
            self.sum += value;
            self.count += 1;
        }
    }

    fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

/// Per-student averages of total marks and attendance, in first-appearance
/// order. Rows without a name belong to no student and are skipped.
pub fn generate_report(
    dataset: &Dataset,
    name: &str,
    total: &str,
    attendance: &str,
) -> Outcome<Vec<ReportRow>> {
    let columns = [
        any_column(dataset, name),
        numeric_column(dataset, total),
        numeric_column(dataset, attendance),
    ];
    let (name_idx, total_idx, attendance_idx) = match columns {
        [Ok(n), Ok(t), Ok(a)] => (n, t, a),
        other => {
            let diagnostics = other.into_iter().filter_map(|c| c.err()).collect();
            return Outcome::new(Vec::new(), diagnostics);
        }
    };

    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, (MeanAccumulator, MeanAccumulator)> = HashMap::new();
    for row in dataset.rows().iter().filter(|row| !row[name_idx].is_null()) {
        let key = row[name_idx].as_display();
        let entry = groups.entry(key.clone()).or_insert_with(|| {
            order.push(key);
            Default::default()
        });
        entry.0.add(row[total_idx].as_f64());
        entry.1.add(row[attendance_idx].as_f64());
    }

    let report = order
        .into_iter()
        .map(|name| {
            let (marks, attendance) = &groups[&name];
            ReportRow {
                average_marks: marks.mean(),
                average_attendance: attendance.mean(),
                name,
            }
        })
        .collect();
    Outcome::new(report, Vec::new())
}

/// Attendance/marks pairs plus their Pearson correlation when it is defined.
pub fn marks_vs_attendance(
    dataset: &Dataset,
    name: &str,
    total: &str,
    attendance: &str,
) -> Outcome<Comparison> {
    let (total_idx, attendance_idx) =
        match (numeric_column(dataset, total), numeric_column(dataset, attendance)) {
            (Ok(t), Ok(a)) => (t, a),
            (t, a) => {
                let diagnostics = [a.err(), t.err()].into_iter().flatten().collect();
                return Outcome::new(Comparison::default(), diagnostics);
            }
        };
    let name_idx = dataset.column_index(name);

    let points = dataset
        .rows()
        .iter()
        .filter_map(|row| {
            let attendance = row[attendance_idx].as_f64()?;
            let marks = row[total_idx].as_f64()?;
            Some(MarksPoint {
                name: name_idx.map(|idx| row[idx].as_display()),
                attendance,
                marks,
            })
        })
        .collect::<Vec<_>>();
    let comparison = Comparison {
        correlation: pearson(&points),
        points,
    };
    Outcome::new(comparison, Vec::new())
}

fn pearson(points: &[MarksPoint]) -> Option<f64> {
    if points.len() < 2 {
        return None;
    }
    let n = points.len() as f64;
    let mean_x = points.iter().map(|p| p.attendance).sum::<f64>() / n;
    let mean_y = points.iter().map(|p| p.marks).sum::<f64>() / n;
    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for point in points {
        let dx = point.attendance - mean_x;
        let dy = point.marks - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some(cov / (var_x.sqrt() * var_y.sqrt()))
}

pub const REPORT_HEADERS: [&str; 3] = ["Name", "Average_Marks", "Average_Attendance"];

/// Writes the report as delimited text with a header row.
pub fn write_report<W: Write>(rows: &[ReportRow], writer: W, delimiter: u8) -> Result<()> {
    let mut csv_writer = io_utils::csv_writer(writer, delimiter);
    csv_writer
        .write_record(REPORT_HEADERS)
        .context("Writing report header")?;
    for row in rows {
        let marks = row.average_marks.map(|v| v.to_string()).unwrap_or_default();
        let attendance = row
            .average_attendance
            .map(|v| v.to_string())
            .unwrap_or_default();
        csv_writer
            .write_record([row.name.as_str(), marks.as_str(), attendance.as_str()])
            .with_context(|| format!("Writing report row for '{}'", row.name))?;
    }
    csv_writer.flush().context("Flushing report")?;
    Ok(())
}

//! The dashboard's analysis options and how their results are presented.

use std::fmt::{self, Write as _};

use clap::ValueEnum;
use heck::ToKebabCase;
use serde::Serialize;

use crate::{
    analysis::{self, Comparison, Diagnostic, Outcome, ReportRow, SubjectFailures},
    config::AppConfig,
    dataset::{Dataset, Frame},
    table::{self, Align},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[value(rename_all = "kebab-case")]
pub enum AnalysisOption {
    HighestMark,
    SubjectwiseAnalysis,
    FailOrPass,
    #[value(name = "top-5")]
    Top5,
    ListOfFailures,
    SubjectwisePassOrFail,
    CompareMarksAndAttendance,
    ReportGeneration,
}

impl AnalysisOption {
    pub const ALL: [AnalysisOption; 8] = [
        AnalysisOption::HighestMark,
        AnalysisOption::SubjectwiseAnalysis,
        AnalysisOption::FailOrPass,
        AnalysisOption::Top5,
        AnalysisOption::ListOfFailures,
        AnalysisOption::SubjectwisePassOrFail,
        AnalysisOption::CompareMarksAndAttendance,
        AnalysisOption::ReportGeneration,
    ];

    pub fn label(self) -> &'static str {
        match self {
            AnalysisOption::HighestMark => "Highest Mark",
            AnalysisOption::SubjectwiseAnalysis => "Subjectwise Analysis",
            AnalysisOption::FailOrPass => "Fail or Pass",
            AnalysisOption::Top5 => "Top 5",
            AnalysisOption::ListOfFailures => "List of Failures",
            AnalysisOption::SubjectwisePassOrFail => "Subjectwise Pass or Fail",
            AnalysisOption::CompareMarksAndAttendance => "Compare Marks and Attendance",
            AnalysisOption::ReportGeneration => "Report Generation",
        }
    }

    pub fn requires_subject(self) -> bool {
        matches!(
            self,
            AnalysisOption::SubjectwiseAnalysis | AnalysisOption::SubjectwisePassOrFail
        )
    }

    /// Accepts a 1-based menu number or a label in any casing/spacing.
    pub fn parse_choice(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        if let Ok(number) = trimmed.parse::<usize>() {
            return number
                .checked_sub(1)
                .and_then(|idx| Self::ALL.get(idx).copied());
        }
        let wanted = trimmed.to_kebab_case();
        Self::ALL
            .into_iter()
            .find(|option| option.label().to_kebab_case() == wanted)
    }
}

impl fmt::Display for AnalysisOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum View {
    Table(Frame),
    Failures(Vec<SubjectFailures>),
    Report(Vec<ReportRow>),
    Comparison(Comparison),
}

/// Runs one option against the dataset. Subject options fall back to the
/// first configured subject when none is chosen.
pub fn evaluate(
    option: AnalysisOption,
    dataset: &Dataset,
    config: &AppConfig,
    subject: Option<&str>,
) -> Outcome<View> {
    let fields = &config.fields;
    let subject = subject.or_else(|| config.subjects.first().map(String::as_str));
    match option {
        AnalysisOption::HighestMark => {
            analysis::highest_marks(dataset, &fields.total).map(View::Table)
        }
        AnalysisOption::Top5 => {
            analysis::top_students(dataset, &fields.total, config.top_n).map(View::Table)
        }
        AnalysisOption::FailOrPass => {
            analysis::pass_fail_table(dataset, &fields.name, &config.subjects).map(View::Table)
        }
        AnalysisOption::ListOfFailures => {
            analysis::failures(dataset, &fields.name, &config.subjects).map(View::Failures)
        }
        AnalysisOption::SubjectwiseAnalysis | AnalysisOption::SubjectwisePassOrFail => {
            let Some(subject) = subject else {
                return Outcome {
                    value: View::Table(Frame::default()),
                    diagnostics: vec![Diagnostic::NoSubject],
                };
            };
            if option == AnalysisOption::SubjectwiseAnalysis {
                analysis::subject_marks(dataset, &fields.name, subject).map(View::Table)
            } else {
                analysis::subject_pass_fail(dataset, &fields.name, subject).map(View::Table)
            }
        }
        AnalysisOption::CompareMarksAndAttendance => analysis::marks_vs_attendance(
            dataset,
            &fields.name,
            &fields.total,
            &fields.attendance,
        )
        .map(View::Comparison),
        AnalysisOption::ReportGeneration => analysis::generate_report(
            dataset,
            &fields.name,
            &fields.total,
            &fields.attendance,
        )
        .map(View::Report),
    }
}

pub fn render_outcome(option: AnalysisOption, outcome: &Outcome<View>) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "== {} ==", option.label());
    output.push_str(&render_view(&outcome.value));
    for diagnostic in &outcome.diagnostics {
        let _ = writeln!(output, "warning: {diagnostic}");
    }
    output
}

pub fn render_view(view: &View) -> String {
    match view {
        View::Table(frame) if frame.is_empty() => "(no rows)\n".to_string(),
        View::Table(frame) => table::render_frame(frame),
        View::Failures(lists) => render_failures(lists),
        View::Report(rows) => render_report(rows),
        View::Comparison(comparison) => render_comparison(comparison),
    }
}

fn render_failures(lists: &[SubjectFailures]) -> String {
    if lists.is_empty() {
        return "No failures found.\n".to_string();
    }
    let mut output = String::new();
    for list in lists {
        let _ = writeln!(output, "{} Failures:", list.subject);
        if list.students.is_empty() {
            let _ = writeln!(output, "No failures in this subject.");
        } else {
            let rows = list
                .students
                .iter()
                .map(|name| vec![name.clone()])
                .collect::<Vec<_>>();
            output.push_str(&table::render_table(
                &["Name".to_string()],
                &rows,
                &[Align::Left],
            ));
        }
    }
    output
}

fn render_report(rows: &[ReportRow]) -> String {
    if rows.is_empty() {
        return "(no rows)\n".to_string();
    }
    let headers = analysis::REPORT_HEADERS
        .iter()
        .map(|h| h.to_string())
        .collect::<Vec<_>>();
    let cells = rows
        .iter()
        .map(|row| {
            vec![
                row.name.clone(),
                format_average(row.average_marks),
                format_average(row.average_attendance),
            ]
        })
        .collect::<Vec<_>>();
    table::render_table(&headers, &cells, &[Align::Left, Align::Right, Align::Right])
}

fn render_comparison(comparison: &Comparison) -> String {
    if comparison.points.is_empty() {
        return "(no rows)\n".to_string();
    }
    let headers = vec![
        "Name".to_string(),
        "Attendance".to_string(),
        "Total Marks".to_string(),
    ];
    let cells = comparison
        .points
        .iter()
        .map(|point| {
            vec![
                point.name.clone().unwrap_or_default(),
                point.attendance.to_string(),
                point.marks.to_string(),
            ]
        })
        .collect::<Vec<_>>();
    let mut output =
        table::render_table(&headers, &cells, &[Align::Left, Align::Right, Align::Right]);
    match comparison.correlation {
        Some(r) => {
            let _ = writeln!(output, "Correlation: {r:.3}");
        }
        None => output.push_str("Correlation: n/a\n"),
    }
    output
}

fn format_average(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.2}")).unwrap_or_default()
}

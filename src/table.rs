use std::fmt::Write as _;

use crate::dataset::{Frame, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

pub fn render_table(headers: &[String], rows: &[Vec<String>], align: &[Align]) -> String {
    let mut widths = headers
        .iter()
        .map(|h| h.chars().count().max(3))
        .collect::<Vec<_>>();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(clean(cell).chars().count());
        }
    }

    let mut output = String::new();
    let left = vec![Align::Left; headers.len()];
    let _ = writeln!(output, "{}", format_row(headers, &widths, &left));
    let separator = widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_row(&separator, &widths, &left));
    for row in rows {
        let _ = writeln!(output, "{}", format_row(row, &widths, align));
    }
    output
}

/// Renders a frame, right-aligning columns that only hold numbers.
pub fn render_frame(frame: &Frame) -> String {
    let align = (0..frame.headers.len())
        .map(|idx| {
            let mut cells = frame.rows.iter().filter_map(|row| row.get(idx));
            let numeric = cells
                .all(|value| matches!(value, Value::Integer(_) | Value::Real(_) | Value::Null));
            if numeric && !frame.rows.is_empty() {
                Align::Right
            } else {
                Align::Left
            }
        })
        .collect::<Vec<_>>();
    let rows = frame
        .rows
        .iter()
        .map(|row| row.iter().map(Value::as_display).collect())
        .collect::<Vec<Vec<String>>>();
    render_table(&frame.headers, &rows, &align)
}

fn format_row(values: &[String], widths: &[usize], align: &[Align]) -> String {
    let cells = values
        .iter()
        .zip(widths)
        .enumerate()
        .map(|(idx, (value, width))| {
            let value = clean(value);
            match align.get(idx).copied().unwrap_or(Align::Left) {
                Align::Left => format!("{value:<width$}"),
                Align::Right => format!("{value:>width$}"),
            }
        })
        .collect::<Vec<_>>();
    cells.join("  ").trim_end().to_string()
}

fn clean(value: &str) -> String {
    value.replace(['\n', '\r', '\t'], " ")
}

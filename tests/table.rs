use result_analyzer::{
    analysis::{ReportRow, SubjectFailures},
    table::{Align, render_table},
    views::{View, render_view},
};

#[test]
fn render_table_aligns_columns() {
    let headers = vec!["id".to_string(), "name".to_string()];
    let rows = vec![
        vec!["1".to_string(), "Alice".to_string()],
        vec!["2".to_string(), "Bob".to_string()],
    ];

    let rendered = render_table(&headers, &rows, &[Align::Right, Align::Left]);
    let lines: Vec<&str> = rendered.lines().collect();

    assert_eq!(lines, vec!["id   name", "---  -----", "  1  Alice", "  2  Bob"]);
}

#[test]
fn report_view_formats_averages_to_two_places() {
    let view = View::Report(vec![
        ReportRow {
            name: "Asha".to_string(),
            average_marks: Some(220.5),
            average_attendance: Some(91.5),
        },
        ReportRow {
            name: "Farid".to_string(),
            average_marks: Some(88.0),
            average_attendance: None,
        },
    ]);
    let rendered = render_view(&view);
    let lines: Vec<&str> = rendered.lines().collect();
    assert_eq!(lines[0], "Name   Average_Marks  Average_Attendance");
    assert_eq!(lines[2], "Asha          220.50               91.50");
    assert_eq!(lines[3], "Farid          88.00");
}

#[test]
fn failure_view_lists_each_subject() {
    let view = View::Failures(vec![
        SubjectFailures {
            subject: "Computer Networks".to_string(),
            students: vec!["Bilal".to_string()],
        },
        SubjectFailures {
            subject: "Internet of Things".to_string(),
            students: Vec::new(),
        },
    ]);
    let rendered = render_view(&view);
    assert_eq!(
        rendered,
        "Computer Networks Failures:\nName\n-----\nBilal\nInternet of Things Failures:\nNo failures in this subject.\n"
    );
}

//! Line-oriented dashboard driving a [`Session`].
//!
//! The loop reads answers from any [`BufRead`] and writes prompts and results
//! to any [`Write`], so the same code serves a terminal and scripted input.
//! `quit` or `exit` at any prompt, or end of input, ends the session. `back`
//! at the database-name prompt returns to the upload prompt.

use std::{
    fs::File,
    io::{BufRead, BufWriter, Write},
    path::Path,
};

use anyhow::{Context, Result};
use log::{error, info};

use crate::{
    analysis,
    session::{Session, SessionState},
    views::{self, AnalysisOption, View},
};

enum Answer {
    Line(String),
    Quit,
}

struct Console<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    fn ask(&mut self, prompt: &str) -> Result<Answer> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line).context("Reading input")? == 0 {
            writeln!(self.output)?;
            return Ok(Answer::Quit);
        }
        let line = line.trim_end_matches(['\r', '\n']).to_string();
        if matches!(line.trim(), "quit" | "exit") {
            return Ok(Answer::Quit);
        }
        Ok(Answer::Line(line))
    }

    fn say(&mut self, message: impl AsRef<str>) -> Result<()> {
        writeln!(self.output, "{}", message.as_ref())?;
        Ok(())
    }
}

/// Runs the interactive dashboard until the user quits, then finishes the session.
pub fn run<R: BufRead, W: Write>(mut session: Session, input: R, output: W) -> Result<()> {
    let mut console = Console { input, output };
    loop {
        let keep_going = match session.state() {
            SessionState::LoggedOut => login_step(&mut session, &mut console)?,
            SessionState::AwaitingDataset if session.dataset().is_none() => {
                upload_step(&mut session, &mut console)?
            }
            SessionState::AwaitingDataset => store_step(&mut session, &mut console)?,
            SessionState::DashboardReady => dashboard_step(&mut session, &mut console)?,
        };
        if !keep_going {
            break;
        }
    }
    console.say("Goodbye.")?;
    console.output.flush()?;
    session.finish();
    Ok(())
}

fn login_step<R: BufRead, W: Write>(
    session: &mut Session,
    console: &mut Console<R, W>,
) -> Result<bool> {
    console.say("== Admin Login ==")?;
    let Answer::Line(identity) = console.ask("Username: ")? else {
        return Ok(false);
    };
    let Answer::Line(secret) = console.ask("Password: ")? else {
        return Ok(false);
    };
    match session.login(&identity, &secret) {
        Ok(()) => console.say("Logged in successfully!")?,
        Err(err) => console.say(err.to_string())?,
    }
    Ok(true)
}

fn upload_step<R: BufRead, W: Write>(
    session: &mut Session,
    console: &mut Console<R, W>,
) -> Result<bool> {
    console.say("== Upload CSV File ==")?;
    let Answer::Line(path) = console.ask("CSV file path: ")? else {
        return Ok(false);
    };
    let path = path.trim();
    if path.is_empty() {
        console.say("Please choose a CSV file.")?;
        return Ok(true);
    }
    match session.upload_path(Path::new(path)) {
        Ok(dataset) => {
            let message = format!(
                "CSV file uploaded successfully! ({} row(s), {} column(s))",
                dataset.row_count(),
                dataset.column_count()
            );
            console.say(message)?;
        }
        Err(err) => console.say(err.to_string())?,
    }
    Ok(true)
}

fn store_step<R: BufRead, W: Write>(
    session: &mut Session,
    console: &mut Console<R, W>,
) -> Result<bool> {
    let prompt =
        "Enter a name for the database (without extension, 'back' to upload another file): ";
    let Answer::Line(name) = console.ask(prompt)? else {
        return Ok(false);
    };
    if name.trim() == "back" {
        session.discard_dataset()?;
        console.say("Dataset discarded. Upload another CSV file.")?;
        return Ok(true);
    }
    match session.create_store(&name) {
        Ok(path) => {
            console.say(format!("Database '{}' created successfully!", path.display()))?
        }
        Err(err) => console.say(err.to_string())?,
    }
    Ok(true)
}

fn dashboard_step<R: BufRead, W: Write>(
    session: &mut Session,
    console: &mut Console<R, W>,
) -> Result<bool> {
    console.say("== Student Result Analysis Dashboard ==")?;
    for (idx, option) in AnalysisOption::ALL.iter().enumerate() {
        console.say(format!("{:>2}. {}", idx + 1, option.label()))?;
    }
    let Answer::Line(choice) = console.ask("Select an option: ")? else {
        return Ok(false);
    };
    if choice.trim() == "reset" {
        session.reset()?;
        console.say("Session reset. Upload a new CSV file.")?;
        return Ok(true);
    }
    let Some(option) = AnalysisOption::parse_choice(&choice) else {
        console.say(format!("Unknown option '{}'", choice.trim()))?;
        return Ok(true);
    };

    let subject = if option.requires_subject() {
        match choose_subject(session, console)? {
            SubjectChoice::Chosen(subject) => Some(subject),
            SubjectChoice::Invalid => return Ok(true),
            SubjectChoice::Quit => return Ok(false),
        }
    } else {
        None
    };

    let outcome = session.analyze(option, subject.as_deref())?;
    console.say(views::render_outcome(option, &outcome).trim_end())?;

    if let View::Report(rows) = &outcome.value
        && !rows.is_empty()
    {
        let Answer::Line(answer) = console.ask("Download report? [y/N]: ")? else {
            return Ok(false);
        };
        if matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes") {
            let config = session.config();
            let path = config.store.directory.join(&config.report_file);
            match save_report(rows, &path) {
                Ok(()) => console.say(format!("Report saved to {}", path.display()))?,
                Err(err) => {
                    error!("Saving report to {path:?} failed: {err:#}");
                    console.say(format!("Error saving report: {err:#}"))?
                }
            }
        }
    }
    Ok(true)
}

enum SubjectChoice {
    Chosen(String),
    Invalid,
    Quit,
}

fn choose_subject<R: BufRead, W: Write>(
    session: &Session,
    console: &mut Console<R, W>,
) -> Result<SubjectChoice> {
    let subjects = session.config().subjects.clone();
    for (idx, subject) in subjects.iter().enumerate() {
        console.say(format!("{:>2}. {subject}", idx + 1))?;
    }
    let Answer::Line(answer) = console.ask("Select Subject: ")? else {
        return Ok(SubjectChoice::Quit);
    };
    let answer = answer.trim();
    let chosen = match answer.parse::<usize>() {
        Ok(number) => number
            .checked_sub(1)
            .and_then(|idx| subjects.get(idx))
            .cloned(),
        Err(_) => subjects
            .iter()
            .find(|subject| subject.eq_ignore_ascii_case(answer))
            .cloned(),
    };
    match chosen {
        Some(subject) => Ok(SubjectChoice::Chosen(subject)),
        None => {
            console.say(format!("Unknown subject '{answer}'"))?;
            Ok(SubjectChoice::Invalid)
        }
    }
}

pub fn save_report(rows: &[analysis::ReportRow], path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Creating report file {path:?}"))?;
    analysis::write_report(rows, BufWriter::new(file), b',')
        .with_context(|| format!("Writing report to {path:?}"))?;
    info!("Saved report with {} row(s) to {path:?}", rows.len());
    Ok(())
}

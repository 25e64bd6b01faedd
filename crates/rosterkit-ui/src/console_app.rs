//! Line-oriented console front end
//!
//! Reads one command per line and prints the form and the visible grid
//! after each one. Row numbers are 1-based positions in the visible grid.

use crate::list_controller::RowAction;
use crate::report::{write_report, ReportExporter};
use crate::screen::RosterScreen;
use anyhow::Context;
use rosterkit_core::{ClassFilter, StatusFilter, Student};
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

const HELP: &str = "\
Commands:
  list                          show the grid
  search <text>                 filter by name or email (empty clears)
  class <label|any>             filter by class, e.g. 10A1
  status <Active|Inactive|any>  filter by status
  name|email|dob|cls|state <v>  set a draft field
  submit                        add or update the draft
  cancel                        leave edit mode
  edit <row#>                   load a row into the form
  delete <row#>                 delete a row
  export                        write a report of the visible rows
  help                          show this text
  quit                          exit";

/// Draft field addressed by a console command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftField {
    Name,
    Email,
    DateOfBirth,
    ClassName,
    Status,
}

/// A parsed console command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List,
    Search(String),
    Class(ClassFilter),
    Status(StatusFilter),
    Field(DraftField, String),
    Submit,
    Cancel,
    Edit(usize),
    Delete(usize),
    Export,
    Help,
    Quit,
}

fn row_number(arg: &str) -> Result<usize, String> {
    match arg.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(format!("'{}' is not a row number", arg)),
    }
}

/// Parse one input line
pub fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let (word, arg) = match line.split_once(char::is_whitespace) {
        Some((word, arg)) => (word, arg.trim()),
        None => (line, ""),
    };

    let command = match word.to_ascii_lowercase().as_str() {
        "list" | "ls" => Command::List,
        "search" => Command::Search(arg.to_string()),
        "class" => Command::Class(arg.parse().map_err(|e| format!("{}", e))?),
        "status" => Command::Status(arg.parse().map_err(|e| format!("{}", e))?),
        "name" => Command::Field(DraftField::Name, arg.to_string()),
        "email" => Command::Field(DraftField::Email, arg.to_string()),
        "dob" => Command::Field(DraftField::DateOfBirth, arg.to_string()),
        "cls" => Command::Field(DraftField::ClassName, arg.to_string()),
        "state" => Command::Field(DraftField::Status, arg.to_string()),
        "submit" => Command::Submit,
        "cancel" => Command::Cancel,
        "edit" => Command::Edit(row_number(arg)?),
        "delete" | "rm" => Command::Delete(row_number(arg)?),
        "export" => Command::Export,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        "" => return Err("empty command".to_string()),
        other => return Err(format!("unknown command '{}' (try 'help')", other)),
    };
    Ok(command)
}

/// Where exported reports go
pub struct ConsoleOptions {
    pub exporter: Box<dyn ReportExporter>,
    pub output_directory: PathBuf,
}

/// Run the console until `quit` or end of input
pub async fn run<R, W>(
    screen: &RosterScreen,
    options: &ConsoleOptions,
    input: R,
    mut output: W,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    screen.settle().await;
    render(screen, &mut output)?;

    let mut lines = input.lines();
    loop {
        write!(output, "> ")?;
        output.flush()?;

        let Some(line) = lines.next_line().await.context("Failed to read input")? else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(e) => {
                writeln!(output, "error: {}", e)?;
                continue;
            }
        };

        match command {
            Command::Quit => break,
            Command::Help => {
                writeln!(output, "{}", HELP)?;
                continue;
            }
            command => {
                if let Err(e) = execute(screen, options, command, &mut output).await {
                    writeln!(output, "error: {}", e)?;
                }
            }
        }

        screen.settle().await;
        render(screen, &mut output)?;
    }

    Ok(())
}

fn row_at(screen: &RosterScreen, row: usize) -> anyhow::Result<Student> {
    screen
        .list()
        .visible_rows()
        .into_iter()
        .nth(row - 1)
        .with_context(|| format!("no row {}", row))
}

async fn execute<W: Write>(
    screen: &RosterScreen,
    options: &ConsoleOptions,
    command: Command,
    output: &mut W,
) -> anyhow::Result<()> {
    let form = screen.form();
    let list = screen.list();

    match command {
        Command::List | Command::Help | Command::Quit => {}
        Command::Search(text) => list.set_search_text(text),
        Command::Class(filter) => list.set_class_filter(filter),
        Command::Status(filter) => list.set_status_filter(filter),
        Command::Field(field, value) => match field {
            DraftField::Name => form.set_name(value),
            DraftField::Email => form.set_email(value),
            DraftField::DateOfBirth => form.set_date_of_birth(value),
            DraftField::ClassName => form.set_class_name(value),
            DraftField::Status => form.set_status(value),
        },
        // Failures are shown through the form's error message
        Command::Submit => {
            let _ = form.submit().await;
        }
        Command::Cancel => form.cancel(),
        Command::Edit(row) => {
            let student = row_at(screen, row)?;
            list.handle_row_action(RowAction::Edit, &student.id)?;
        }
        // The form reports the outcome of a row delete through its messages
        Command::Delete(row) => {
            let student = row_at(screen, row)?;
            list.handle_row_action(RowAction::Delete, &student.id)?;
        }
        Command::Export => {
            let request = list.export_request();
            let path = write_report(
                options.exporter.as_ref(),
                &request,
                &options.output_directory,
            )?;
            writeln!(output, "Exported {} rows to {}", request.records.len(), path.display())?;
        }
    }
    Ok(())
}

/// Print the form and the grid
pub fn render<W: Write>(screen: &RosterScreen, output: &mut W) -> std::io::Result<()> {
    let form = screen.form().state();
    let title = if screen.form().is_editing() {
        "Edit Student"
    } else {
        "New Student"
    };

    writeln!(output)?;
    writeln!(output, "== {} ==", title)?;
    for (label, value) in form.draft.labelled() {
        writeln!(output, "  {:<14}{}", format!("{}:", label), value)?;
    }
    let mut actions = vec![screen.form().submit_label()];
    if screen.form().can_cancel() {
        actions.push("Cancel");
    }
    writeln!(output, "  [{}]", actions.join("] ["))?;
    if form.loading {
        writeln!(output, "  ...")?;
    }
    if let Some(message) = &form.success_message {
        writeln!(output, "  ok: {}", message)?;
    }
    if let Some(message) = &form.error_message {
        writeln!(output, "  error: {}", message)?;
    }

    let list = screen.list();
    let criteria = list.criteria();
    let search = if criteria.search_text.trim().is_empty() {
        "any".to_string()
    } else {
        criteria.search_text.clone()
    };
    writeln!(output)?;
    writeln!(
        output,
        "== Students ({} of {}) | search: {} | class: {} | status: {} ==",
        list.visible_rows().len(),
        list.record_count(),
        search,
        criteria.class_filter,
        criteria.status_filter
    )?;

    if list.is_loading() {
        return writeln!(output, "  Loading...");
    }
    if let Some(error) = list.error_message() {
        return writeln!(output, "  {}", error);
    }
    if !list.has_students() {
        return writeln!(output, "  No students found.");
    }

    let rows: Vec<Vec<String>> = list
        .visible_rows()
        .iter()
        .enumerate()
        .map(|(i, s)| {
            vec![
                (i + 1).to_string(),
                s.name.clone(),
                s.email.clone(),
                s.date_of_birth.format("%Y-%m-%d").to_string(),
                s.class_label.to_string(),
                s.status.to_string(),
            ]
        })
        .collect();

    let mut header = vec!["#".to_string()];
    header.extend(list.columns().iter().map(|c| c.label.to_string()));

    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    for row in std::iter::once(&header).chain(rows.iter()) {
        let line = row
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect::<Vec<_>>()
            .join("  ");
        writeln!(output, "  {}", line.trim_end())?;
    }
    Ok(())
}

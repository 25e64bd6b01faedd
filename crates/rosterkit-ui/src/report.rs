//! Report export
//!
//! Exporters turn the list's filtered rows into a document. They only see an
//! `ExportRequest`; nothing here talks to the store or the bus.

use chrono::{DateTime, Local};
use rosterkit_core::{FilterCriteria, Student};
use rosterkit_settings::ExportFormat;
use serde::Serialize;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while rendering or writing a report
#[derive(Error, Debug)]
pub enum ExportError {
    /// The report text could not be formatted.
    #[error("Failed to format report: {0}")]
    Format(#[from] std::fmt::Error),

    /// JSON serialization error.
    #[error("Failed to serialize report: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error while writing the report.
    #[error("Failed to write report: {0}")]
    Io(#[from] std::io::Error),
}

/// What an exporter is given
#[derive(Debug, Clone)]
pub struct ExportRequest {
    /// Filtered rows, in display order
    pub records: Vec<Student>,
    /// Criteria that produced the rows
    pub criteria: FilterCriteria,
    pub exported_at: DateTime<Local>,
}

impl ExportRequest {
    /// Build a request stamped with the current local time
    pub fn new(records: Vec<Student>, criteria: FilterCriteria) -> Self {
        Self {
            records,
            criteria,
            exported_at: Local::now(),
        }
    }

    /// Search text for report headers; "any" when empty
    pub fn search_label(&self) -> String {
        let text = self.criteria.search_text.trim();
        if text.is_empty() {
            "any".to_string()
        } else {
            text.to_string()
        }
    }
}

/// Renders an export request into a document
pub trait ReportExporter: Send + Sync {
    fn render(&self, request: &ExportRequest) -> Result<String, ExportError>;

    /// Extension for written files, without the dot
    fn file_extension(&self) -> &'static str;
}

/// Plain-text table
#[derive(Debug, Clone)]
pub struct TextReportExporter {
    pub title: String,
}

impl TextReportExporter {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }
}

fn row_cells(student: &Student) -> [String; 5] {
    [
        student.name.clone(),
        student.email.clone(),
        student.date_of_birth.format("%Y-%m-%d").to_string(),
        student.class_label.to_string(),
        student.status.to_string(),
    ]
}

const HEADERS: [&str; 5] = ["Name", "Email", "Date of Birth", "Class", "Status"];

impl ReportExporter for TextReportExporter {
    fn render(&self, request: &ExportRequest) -> Result<String, ExportError> {
        let rows: Vec<[String; 5]> = request.records.iter().map(row_cells).collect();

        let mut widths = HEADERS.map(|h| h.chars().count());
        for row in &rows {
            for (width, cell) in widths.iter_mut().zip(row.iter()) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let mut out = String::new();
        writeln!(out, "{}", self.title)?;
        writeln!(
            out,
            "Search: {} | Class: {} | Status: {}",
            request.search_label(),
            request.criteria.class_filter,
            request.criteria.status_filter
        )?;
        writeln!(
            out,
            "Exported: {}",
            request.exported_at.format("%Y-%m-%d %H:%M:%S")
        )?;
        writeln!(out, "Rows: {}", rows.len())?;
        writeln!(out)?;

        write_row(&mut out, &HEADERS.map(String::from), &widths)?;
        write_row(&mut out, &widths.map(|w| "-".repeat(w)), &widths)?;
        for row in &rows {
            write_row(&mut out, row, &widths)?;
        }

        Ok(out)
    }

    fn file_extension(&self) -> &'static str {
        "txt"
    }
}

fn write_row(out: &mut String, cells: &[String; 5], widths: &[usize; 5]) -> std::fmt::Result {
    let line = cells
        .iter()
        .zip(widths.iter())
        .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
        .collect::<Vec<_>>()
        .join("  ");
    writeln!(out, "{}", line.trim_end())
}

/// JSON document
#[derive(Debug, Clone)]
pub struct JsonReportExporter {
    pub title: String,
}

impl JsonReportExporter {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }
}

#[derive(Serialize)]
struct JsonCriteria {
    search: String,
    class: String,
    status: String,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    title: &'a str,
    exported_at: String,
    criteria: JsonCriteria,
    count: usize,
    students: &'a [Student],
}

impl ReportExporter for JsonReportExporter {
    fn render(&self, request: &ExportRequest) -> Result<String, ExportError> {
        let report = JsonReport {
            title: &self.title,
            exported_at: request.exported_at.to_rfc3339(),
            criteria: JsonCriteria {
                search: request.search_label(),
                class: request.criteria.class_filter.to_string(),
                status: request.criteria.status_filter.to_string(),
            },
            count: request.records.len(),
            students: &request.records,
        };
        Ok(serde_json::to_string_pretty(&report)?)
    }

    fn file_extension(&self) -> &'static str {
        "json"
    }
}

/// Exporter for a configured format
pub fn exporter_for(format: ExportFormat, title: &str) -> Box<dyn ReportExporter> {
    match format {
        ExportFormat::Text => Box::new(TextReportExporter::new(title)),
        ExportFormat::Json => Box::new(JsonReportExporter::new(title)),
    }
}

/// Render a report and write it into `directory`
///
/// Returns the path of the written file.
pub fn write_report(
    exporter: &dyn ReportExporter,
    request: &ExportRequest,
    directory: &Path,
) -> Result<PathBuf, ExportError> {
    let content = exporter.render(request)?;
    std::fs::create_dir_all(directory)?;

    let file_name = format!(
        "student-roster-{}.{}",
        request.exported_at.format("%Y%m%d-%H%M%S"),
        exporter.file_extension()
    );
    let path = directory.join(file_name);
    std::fs::write(&path, content)?;

    tracing::info!(
        "Exported {} students to {}",
        request.records.len(),
        path.display()
    );
    Ok(path)
}

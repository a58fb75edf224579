//! Report export to CSV and printable HTML.

use chrono::NaiveDate;
use csv::{QuoteStyle, Terminator, WriterBuilder};
use std::str::FromStr;

use crate::error::ReportError;
use crate::models::report::{ComplaintReport, EscalationReport};

/// Export file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Html,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Html => "html",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv; charset=utf-8",
            ExportFormat::Html => "text/html; charset=utf-8",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "html" | "pdf" => Ok(ExportFormat::Html),
            _ => Err(format!("Unsupported export format: {}", s)),
        }
    }
}

/// Exportable report kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Complaints,
    Escalation,
}

impl ReportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKind::Complaints => "complaints",
            ReportKind::Escalation => "escalation",
        }
    }
}

/// An export ready to be sent as a download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedReport {
    pub file_name: String,
    pub content_type: &'static str,
    pub body: String,
}

/// `<kind>_report_<YYYY-MM-DD>.<ext>`
pub fn file_name(kind: ReportKind, format: ExportFormat, date: NaiveDate) -> String {
    format!(
        "{}_report_{}.{}",
        kind.as_str(),
        date.format("%Y-%m-%d"),
        format.extension()
    )
}

/// Header row plus one record per row, `\n`-terminated. Fields are quoted
/// only when they hold a separator, quote or line break.
fn csv_document(
    headers: &[&str],
    rows: impl Iterator<Item = Vec<String>>,
) -> Result<String, ReportError> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Necessary)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(vec![]);

    writer.write_record(headers)?;
    for row in rows {
        writer.write_record(&row)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ReportError::Export(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ReportError::Export(e.to_string()))
}

pub fn complaints_csv(rows: &[ComplaintReport]) -> Result<String, ReportError> {
    csv_document(
        &[
            "ID",
            "Subject",
            "Category",
            "Priority",
            "Status",
            "Submitted At",
            "Department",
            "Resolution Time",
        ],
        rows.iter().map(|r| {
            vec![
                r.id.to_string(),
                r.subject.clone(),
                r.category.clone(),
                r.priority.to_string(),
                r.status.to_string(),
                r.submitted_at.format("%Y-%m-%d").to_string(),
                r.assigned_department.clone(),
                r.resolution_time
                    .map(|d| format!("{} days", d))
                    .unwrap_or_else(|| "N/A".to_string()),
            ]
        }),
    )
}

pub fn escalation_csv(rows: &[EscalationReport]) -> Result<String, ReportError> {
    csv_document(
        &[
            "Complaint ID",
            "Subject",
            "Category",
            "Priority",
            "Days Pending",
            "Department",
            "Escalation Reason",
        ],
        rows.iter().map(|r| {
            vec![
                r.complaint_id.to_string(),
                r.subject.clone(),
                r.category.clone(),
                r.priority.to_string(),
                r.days_pending.to_string(),
                r.assigned_department.clone(),
                r.escalation_reason.clone(),
            ]
        }),
    )
}

fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn html_document(
    kind: ReportKind,
    generated_on: NaiveDate,
    headers: &[&str],
    rows: impl Iterator<Item = Vec<String>>,
) -> String {
    let title = kind.as_str().to_uppercase();
    let mut html = format!(
        "<html>\n<head>\n<title>SULABH {title} Report</title>\n<style>\n\
         body {{ font-family: Arial, sans-serif; margin: 20px; }}\n\
         table {{ width: 100%; border-collapse: collapse; margin-top: 20px; }}\n\
         th, td {{ border: 1px solid #ddd; padding: 8px; text-align: left; }}\n\
         th {{ background-color: #f2f2f2; }}\n\
         h1 {{ color: #333; }}\n\
         .header {{ text-align: center; margin-bottom: 30px; }}\n\
         </style>\n</head>\n<body>\n<div class=\"header\">\n\
         <h1>SULABH - Online Grievance Redressal System</h1>\n\
         <h2>{title} Report</h2>\n<p>Generated on: {date}</p>\n</div>\n",
        title = title,
        date = generated_on.format("%Y-%m-%d"),
    );

    html.push_str("<table>\n<thead>\n<tr>");
    for h in headers {
        html.push_str(&format!("<th>{}</th>", h));
    }
    html.push_str("</tr>\n</thead>\n<tbody>\n");
    for row in rows {
        html.push_str("<tr>");
        for cell in row {
            html.push_str(&format!("<td>{}</td>", escape_html(&cell)));
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</tbody>\n</table>\n</body>\n</html>\n");
    html
}

pub fn complaints_html(rows: &[ComplaintReport], generated_on: NaiveDate) -> String {
    html_document(
        ReportKind::Complaints,
        generated_on,
        &[
            "ID",
            "Subject",
            "Category",
            "Priority",
            "Status",
            "Submitted",
            "Department",
        ],
        rows.iter().map(|r| {
            vec![
                r.id.to_string(),
                r.subject.clone(),
                r.category.clone(),
                r.priority.to_string(),
                r.status.to_string(),
                r.submitted_at.format("%Y-%m-%d").to_string(),
                r.assigned_department.clone(),
            ]
        }),
    )
}

pub fn escalation_html(rows: &[EscalationReport], generated_on: NaiveDate) -> String {
    html_document(
        ReportKind::Escalation,
        generated_on,
        &[
            "Complaint ID",
            "Subject",
            "Category",
            "Priority",
            "Days Pending",
            "Department",
            "Escalation Reason",
        ],
        rows.iter().map(|r| {
            vec![
                r.complaint_id.to_string(),
                r.subject.clone(),
                r.category.clone(),
                r.priority.to_string(),
                r.days_pending.to_string(),
                r.assigned_department.clone(),
                r.escalation_reason.clone(),
            ]
        }),
    )
}

pub fn export_complaints(
    rows: &[ComplaintReport],
    format: ExportFormat,
    today: NaiveDate,
) -> Result<ExportedReport, ReportError> {
    Ok(ExportedReport {
        file_name: file_name(ReportKind::Complaints, format, today),
        content_type: format.content_type(),
        body: match format {
            ExportFormat::Csv => complaints_csv(rows)?,
            ExportFormat::Html => complaints_html(rows, today),
        },
    })
}

pub fn export_escalations(
    rows: &[EscalationReport],
    format: ExportFormat,
    today: NaiveDate,
) -> Result<ExportedReport, ReportError> {
    Ok(ExportedReport {
        file_name: file_name(ReportKind::Escalation, format, today),
        content_type: format.content_type(),
        body: match format {
            ExportFormat::Csv => escalation_csv(rows)?,
            ExportFormat::Html => escalation_html(rows, today),
        },
    })
}

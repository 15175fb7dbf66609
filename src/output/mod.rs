//! Output formatting for ranked match results and submissions

pub mod submission;

pub use submission::{fp2ascii, merge_fingerprints, scan_line, test2str};

use colored::Colorize;
use serde::{Deserialize, Serialize};

use crate::db::FingerPrintDb;
use crate::error::{OsDbError, OsDbResult};
use crate::matcher::{MatchStatus, RankedMatches};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

/// One OS classification of a matched entry.
#[derive(Debug, Clone, Serialize)]
pub struct ClassEntry {
    pub vendor: String,
    pub family: String,
    pub generation: Option<String>,
    pub device_type: String,
    pub cpe: Vec<String>,
}

/// One ranked candidate with its database metadata.
#[derive(Debug, Clone, Serialize)]
pub struct MatchEntry {
    pub name: String,
    pub accuracy: f64,
    /// Line the entry begins on in the database file.
    pub db_line: usize,
    pub classes: Vec<ClassEntry>,
}

/// Serializable view of a ranking run.
#[derive(Debug, Clone, Serialize)]
pub struct MatchReport {
    pub status: String,
    pub num_perfect_matches: usize,
    pub matches: Vec<MatchEntry>,
}

/// Resolve ranked indices against the database into a report.
pub fn build_report(results: &RankedMatches, db: &FingerPrintDb) -> MatchReport {
    let matches = results
        .matches()
        .iter()
        .filter_map(|m| {
            let print = db.get(m.index)?;
            let classes = print
                .classes
                .iter()
                .map(|c| ClassEntry {
                    vendor: c.vendor.to_string(),
                    family: c.family.to_string(),
                    generation: c.generation.as_ref().map(|g| g.to_string()),
                    device_type: c.device_type.to_string(),
                    cpe: c.cpe.iter().map(|s| s.to_string()).collect(),
                })
                .collect();
            Some(MatchEntry {
                name: m.name.to_string(),
                accuracy: m.accuracy,
                db_line: print.line,
                classes,
            })
        })
        .collect();

    MatchReport {
        status: results.status.to_string(),
        num_perfect_matches: results.num_perfect_matches,
        matches,
    }
}

/// Render a report in the requested format.
pub fn render_report(report: &MatchReport, format: OutputFormat) -> OsDbResult<String> {
    match format {
        OutputFormat::Text => Ok(format_text(report)),
        OutputFormat::Json => {
            serde_json::to_string_pretty(report).map_err(|e| OsDbError::OutputError(e.to_string()))
        }
    }
}

fn format_text(report: &MatchReport) -> String {
    let mut out = String::new();

    if report.matches.is_empty() {
        out.push_str(&format!(
            "{} ({})\n",
            "No OS matches for host".yellow(),
            report.status
        ));
        return out;
    }

    if report.status == MatchStatus::TooManyPerfect.to_string() {
        out.push_str(&format!(
            "{}\n",
            "Too many perfect matches; result is ambiguous".yellow()
        ));
    }

    for entry in &report.matches {
        out.push_str(&format!(
            "{:>6.2}%  {}\n",
            entry.accuracy * 100.0,
            entry.name.bold()
        ));
        for class in &entry.classes {
            out.push_str(&format!(
                "         {} | {} | {} | {}\n",
                class.vendor,
                class.family,
                class.generation.as_deref().unwrap_or("-"),
                class.device_type
            ));
            for cpe in &class.cpe {
                out.push_str(&format!("         {}\n", cpe.cyan()));
            }
        }
    }
    out
}

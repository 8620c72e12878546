//! Verification report
//!
//! Items are kept in the order they were produced. In text mode each item
//! is printed as soon as it is pushed so a slow model load does not hide
//! earlier results.

use crate::checks::CheckResult;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// A single entry of the report
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReportItem {
    Check(CheckResult),
    Section {
        name: String,
        title: String,
        lines: Vec<String>,
    },
    Group {
        name: String,
        title: String,
        results: Vec<CheckResult>,
    },
}

impl ReportItem {
    pub fn name(&self) -> &str {
        match self {
            ReportItem::Check(result) => &result.name,
            ReportItem::Section { name, .. } | ReportItem::Group { name, .. } => name,
        }
    }

    /// Console lines for this item
    pub fn render(&self) -> Vec<String> {
        match self {
            ReportItem::Check(result) => vec![result.render()],
            ReportItem::Section { title, lines, .. } => {
                let mut out = vec![String::new(), title.clone()];
                out.extend(lines.iter().cloned());
                out
            }
            ReportItem::Group { title, results, .. } => {
                let mut out = vec![String::new(), title.clone()];
                out.extend(results.iter().map(CheckResult::render));
                out
            }
        }
    }

    fn results(&self) -> Vec<&CheckResult> {
        match self {
            ReportItem::Check(result) => vec![result],
            ReportItem::Section { .. } => Vec::new(),
            ReportItem::Group { results, .. } => results.iter().collect(),
        }
    }
}

/// Full verification report
#[derive(Debug, Serialize)]
pub struct Report {
    pub checked_at: DateTime<Utc>,
    pub no_local: bool,
    pub items: Vec<ReportItem>,
    #[serde(skip)]
    echo: bool,
}

impl Report {
    /// `echo` prints every item to stdout as it is pushed
    pub fn new(no_local: bool, echo: bool) -> Self {
        Self {
            checked_at: Utc::now(),
            no_local,
            items: Vec::new(),
            echo,
        }
    }

    pub fn push_check(&mut self, result: CheckResult) {
        self.push(ReportItem::Check(result));
    }

    pub fn push_section(&mut self, name: &str, title: &str, lines: Vec<String>) {
        self.push(ReportItem::Section {
            name: name.to_string(),
            title: title.to_string(),
            lines,
        });
    }

    pub fn push_group(&mut self, name: &str, title: &str, results: Vec<CheckResult>) {
        self.push(ReportItem::Group {
            name: name.to_string(),
            title: title.to_string(),
            results,
        });
    }

    fn push(&mut self, item: ReportItem) {
        if self.echo {
            for line in item.render() {
                println!("{}", line);
            }
        }
        self.items.push(item);
    }

    /// Whole report as console text
    pub fn render(&self) -> String {
        self.items
            .iter()
            .flat_map(ReportItem::render)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Item names in order
    pub fn names(&self) -> Vec<&str> {
        self.items.iter().map(ReportItem::name).collect()
    }

    pub fn item(&self, name: &str) -> Option<&ReportItem> {
        self.items.iter().find(|item| item.name() == name)
    }

    /// Whether any check, including grouped ones, failed
    pub fn has_failures(&self) -> bool {
        self.items
            .iter()
            .flat_map(ReportItem::results)
            .any(CheckResult::is_failure)
    }

    /// Number of failed checks
    pub fn failure_count(&self) -> usize {
        self.items
            .iter()
            .flat_map(ReportItem::results)
            .filter(|r| r.is_failure())
            .count()
    }
}

//! Error records attached to a [`Document`][crate::Document], and their
//! pretty-printable reports.

use crate::source::SourceFile;
use ariadne::{Config, Label, Report, ReportKind};
use iobj_parser::Position;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::fmt;
use std::ops::Range;

/// Which stage produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Syntax,
    Validation,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Syntax => f.write_str("syntax"),
            ErrorCategory::Validation => f.write_str("validation"),
        }
    }
}

/// One error accumulated while parsing and processing a document.
///
/// A document always yields a value tree alongside its error list; check
/// [`Document::errors`][crate::Document::errors] before trusting the
/// values.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentError {
    pub message: String,
    pub category: ErrorCategory,
    pub position: Position,
    pub end_position: Option<Position>,
    /// The zero-based row this error occurred in, when it occurred inside
    /// a collection. Row indexes reset per section.
    pub collection_index: Option<usize>,
}

impl DocumentError {
    pub(crate) fn syntax(
        message: impl Into<String>,
        position: Position,
        end_position: Option<Position>,
        collection_index: Option<usize>,
    ) -> Self {
        Self {
            message: message.into(),
            category: ErrorCategory::Syntax,
            position,
            end_position,
            collection_index,
        }
    }

    pub(crate) fn validation(
        message: impl Into<String>,
        position: Position,
        end_position: Option<Position>,
        collection_index: Option<usize>,
    ) -> Self {
        Self {
            message: message.into(),
            category: ErrorCategory::Validation,
            position,
            end_position,
            collection_index,
        }
    }

    /// Render this error as an ariadne report labeled over `source`.
    pub fn report(&self, source: &SourceFile) -> String {
        let id = source.path().display().to_string();
        let start = source.map_index(self.position.pos);
        let end = self
            .end_position
            .map(|p| source.map_index(p.pos))
            .unwrap_or(start)
            .max(start + 1);

        let mut label_message = format!("{} error", self.category);
        if let Some(row) = self.collection_index {
            label_message.push_str(&format!(" in row {row}"));
        }

        let report: Report<'_, (String, Range<usize>)> =
            Report::build(ReportKind::Error, id.clone(), start)
                .with_config(Config::default().with_color(false))
                .with_message(&self.message)
                .with_label(Label::new((id, start..end)).with_message(label_message))
                .finish();

        let mut buf = Vec::new();
        report
            .write(SourceCache(source), &mut buf)
            .expect("writing to a Vec cannot fail");
        String::from_utf8_lossy(&buf).into_owned()
    }
}

impl fmt::Display for DocumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} error at {}: {}",
            self.category, self.position, self.message
        )?;
        if let Some(row) = self.collection_index {
            write!(f, " (row {row})")?;
        }
        Ok(())
    }
}

struct SourceCache<'a>(&'a SourceFile);

impl ariadne::Cache<String> for SourceCache<'_> {
    type Storage = String;

    fn fetch(
        &mut self,
        _id: &String,
    ) -> Result<&ariadne::Source<String>, Box<dyn fmt::Debug + '_>> {
        Ok(self.0.ariadne())
    }

    fn display<'a>(&self, id: &'a String) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(id.clone()))
    }
}

impl Serialize for DocumentError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("message", &self.message)?;
        map.serialize_entry("category", &self.category)?;
        map.serialize_entry("position", &position_fields(&self.position))?;
        if let Some(end) = &self.end_position {
            map.serialize_entry("endPosition", &position_fields(end))?;
        }
        if let Some(index) = self.collection_index {
            map.serialize_entry("collectionIndex", &index)?;
        }
        map.end()
    }
}

fn position_fields(position: &Position) -> serde_json::Value {
    serde_json::json!({
        "row": position.row,
        "col": position.col,
        "pos": position.pos,
    })
}

//! Output formatting for CLI commands.
//!
//! Supports table (human-readable) and JSON output formats.

use std::io::Write;

use serde::Serialize;

use crate::cli::Format;
use crate::error::CliError;

/// Output formatter that handles both table and JSON output.
#[derive(Debug, Clone)]
pub struct OutputFormat {
    format: Format,
}

impl OutputFormat {
    /// Create a new output formatter.
    #[must_use]
    pub const fn new(format: Format) -> Self {
        Self { format }
    }

    /// Check if JSON format is selected.
    #[must_use]
    pub const fn is_json(&self) -> bool {
        matches!(self.format, Format::Json)
    }

    /// Write a value that knows how to render itself in either format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write<W, T>(&self, writer: &mut W, value: &T) -> Result<(), CliError>
    where
        W: Write,
        T: Serialize + TableDisplay,
    {
        match self.format {
            Format::Json => write_json(writer, value),
            Format::Table => value.write_table(writer),
        }
    }

    /// Write a value as pretty JSON regardless of the selected format.
    ///
    /// Commands call this with the raw API payload in JSON mode.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_json<W: Write, T: Serialize + ?Sized>(
        &self,
        writer: &mut W,
        value: &T,
    ) -> Result<(), CliError> {
        write_json(writer, value)
    }
}

fn write_json<W: Write, T: Serialize + ?Sized>(writer: &mut W, value: &T) -> Result<(), CliError> {
    serde_json::to_writer_pretty(&mut *writer, value)
        .map_err(|e| CliError::Format(format!("JSON serialization failed: {e}")))?;
    writeln!(writer)?;
    Ok(())
}

/// Trait for types that can be displayed as a table.
pub trait TableDisplay {
    /// Write the value as a human-readable table.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError>;
}

/// Column-aligned table of strings.
///
/// Columns are padded to their widest cell with two spaces between them,
/// and a rule separates the header from the rows.
#[derive(Debug, Clone, Default)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Create an empty table with the given headers.
    #[must_use]
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(ToString::to_string).collect(),
            rows: Vec::new(),
        }
    }

    /// Two-column `FIELD` / `VALUE` table.
    #[must_use]
    pub fn fields() -> Self {
        Self::new(&["FIELD", "VALUE"])
    }

    /// Append a row. Missing cells render empty.
    pub fn row<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(cells.into_iter().map(Into::into).collect());
    }

    /// Append a `FIELD` / `VALUE` pair.
    pub fn field(&mut self, name: &str, value: impl Into<String>) {
        self.rows.push(vec![name.to_string(), value.into()]);
    }

    /// Number of rows, excluding the header.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                let len = cell.chars().count();
                match widths.get_mut(i) {
                    Some(w) => *w = (*w).max(len),
                    None => widths.push(len),
                }
            }
        }
        widths
    }
}

fn write_line<W: Write>(
    writer: &mut W,
    cells: &[String],
    widths: &[usize],
) -> Result<(), CliError> {
    let mut line = String::new();
    for (i, width) in widths.iter().enumerate() {
        let cell = cells.get(i).map_or("", String::as_str);
        if i > 0 {
            line.push_str("  ");
        }
        line.push_str(cell);
        let pad = width.saturating_sub(cell.chars().count());
        line.extend(std::iter::repeat_n(' ', pad));
    }
    writeln!(writer, "{}", line.trim_end())?;
    Ok(())
}

impl TableDisplay for Table {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        let widths = self.widths();
        write_line(writer, &self.headers, &widths)?;
        let rule = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);
        writeln!(writer, "{}", "─".repeat(rule))?;
        for row in &self.rows {
            write_line(writer, row, &widths)?;
        }
        Ok(())
    }
}

/// Write an indented section title with an underline.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn section_header<W: Write>(writer: &mut W, title: &str) -> Result<(), CliError> {
    writeln!(writer)?;
    writeln!(writer, "  {title}")?;
    writeln!(writer, "  {}", "─".repeat(title.chars().count() + 2))?;
    Ok(())
}

/// Outcome reported by a [`Message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    /// The operation succeeded or was queued.
    Ok,
    /// The operator declined a confirmation prompt.
    Aborted,
    /// Informational.
    Info,
}

/// Simple message output.
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    /// Outcome.
    pub status: MessageStatus,
    /// Message text.
    pub message: String,
}

impl Message {
    /// Create a success message.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: MessageStatus::Ok,
            message: message.into(),
        }
    }

    /// Create an aborted message.
    #[must_use]
    pub fn aborted(message: impl Into<String>) -> Self {
        Self {
            status: MessageStatus::Aborted,
            message: message.into(),
        }
    }

    /// Create an informational message.
    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            status: MessageStatus::Info,
            message: message.into(),
        }
    }
}

impl TableDisplay for Message {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        match self.status {
            MessageStatus::Ok => writeln!(writer, "✓ {}", self.message)?,
            MessageStatus::Aborted => writeln!(writer, "⨯ {}", self.message)?,
            MessageStatus::Info => writeln!(writer, "{}", self.message)?,
        }
        Ok(())
    }
}

//! Page parsing and row accumulation
//!
//! Pages are comma-delimited text with a header row. Parsing is
//! segment-faithful: the final line segment of a page is always produced as a
//! record, which is an empty record when the text ends in a line terminator.
//! The accumulator drops exactly that last record from every page before
//! keeping the rest.
//!
//! The raw page text is also kept, joined to the previous pages' text with a
//! single comma. Concatenating full pages that way does not produce valid CSV
//! (every page carries its own header); consumers that need a file should
//! build it from the parsed rows instead, see [`crate::core::artifact`].

use crate::domain::{EpiError, Result};
use csv::{ReaderBuilder, StringRecord};
use serde::de::DeserializeOwned;

/// One parsed page: header plus records, trailing record included
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedPage {
    /// Header row
    pub headers: StringRecord,

    /// Data records in page order, ending with the final line segment
    pub records: Vec<StringRecord>,
}

/// Parses page text into header and records
///
/// # Errors
///
/// Returns [`EpiError::Parse`] if the text is not valid delimited text (for
/// example invalid UTF-8 inside a field).
pub fn parse_page(text: &str) -> Result<ParsedPage> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    let mut records = reader.records().collect::<std::result::Result<Vec<_>, _>>()?;

    if ends_with_line_terminator(text) {
        records.push(StringRecord::from(vec![""]));
    }

    Ok(ParsedPage { headers, records })
}

fn ends_with_line_terminator(text: &str) -> bool {
    text.ends_with('\n') || text.ends_with('\r')
}

/// Accumulates parsed rows and raw page text for one export session
///
/// # Example
///
/// ```
/// use epiexport::core::export::ResultAccumulator;
///
/// let mut acc: ResultAccumulator<Vec<String>> = ResultAccumulator::new();
/// let added = acc.ingest("region,cases\nKoshi,10\nBagmati,20\n").unwrap();
///
/// assert_eq!(added, 2);
/// assert_eq!(acc.rows()[1], vec!["Bagmati".to_string(), "20".to_string()]);
/// ```
#[derive(Debug, Clone)]
pub struct ResultAccumulator<D> {
    rows: Vec<D>,
    full_text: String,
}

impl<D> Default for ResultAccumulator<D> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            full_text: String::new(),
        }
    }
}

impl<D> ResultAccumulator<D> {
    /// Creates an empty accumulator
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends already-parsed rows and the page's raw text
    pub fn append(&mut self, rows: Vec<D>, page_text: &str) {
        self.rows.extend(rows);

        if self.full_text.is_empty() {
            self.full_text = page_text.to_string();
        } else {
            self.full_text.push(',');
            self.full_text.push_str(page_text);
        }
    }

    /// Drops all rows and text
    pub fn clear(&mut self) {
        self.rows.clear();
        self.full_text.clear();
    }

    /// Rows accumulated so far, in page arrival order
    pub fn rows(&self) -> &[D] {
        &self.rows
    }

    /// Raw page texts joined by commas
    pub fn full_text(&self) -> &str {
        &self.full_text
    }

    /// Number of rows accumulated so far
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether no rows have been accumulated
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Consumes the accumulator, returning rows and raw text
    pub fn into_parts(self) -> (Vec<D>, String) {
        (self.rows, self.full_text)
    }
}

impl<D: DeserializeOwned> ResultAccumulator<D> {
    /// Parses a page into rows, dropping the page's last record
    ///
    /// # Errors
    ///
    /// Returns [`EpiError::Parse`] if the page cannot be parsed or a record
    /// does not deserialize into `D`.
    pub fn parse(page_text: &str) -> Result<Vec<D>> {
        let ParsedPage {
            headers,
            mut records,
        } = parse_page(page_text)?;

        records.pop();

        records
            .iter()
            .enumerate()
            .map(|(i, record)| {
                record.deserialize::<D>(Some(&headers)).map_err(|e| {
                    EpiError::Parse(format!("Row {} does not match the page header: {e}", i + 1))
                })
            })
            .collect()
    }

    /// Parses and appends one page, returning the number of rows added
    ///
    /// Nothing is appended if the page fails to parse.
    pub fn ingest(&mut self, page_text: &str) -> Result<usize> {
        let rows = Self::parse(page_text)?;
        let added = rows.len();
        self.append(rows, page_text);
        Ok(added)
    }
}

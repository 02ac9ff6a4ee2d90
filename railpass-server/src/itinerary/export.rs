//! Flat row export of saved segments and search results.

use std::io::Write;

use tracing::warn;

use crate::domain::JourneyLeg;

use super::{Itinerary, SearchRecord};

/// Receives exported rows as `(column, value)` pairs.
pub trait ExportSink {
    /// Write one row, returning whether it was written.
    fn write_row(&mut self, row: &[(String, String)]) -> bool;
}

impl ExportSink for Vec<Vec<(String, String)>> {
    fn write_row(&mut self, row: &[(String, String)]) -> bool {
        self.push(row.to_vec());
        true
    }
}

/// Writes rows as CSV, with a header taken from the first row's columns.
pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
    header_written: bool,
}

impl<W: Write> CsvSink<W> {
    pub fn new(inner: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(inner),
            header_written: false,
        }
    }

    /// Flush and hand back the underlying writer.
    pub fn into_inner(self) -> Option<W> {
        match self.writer.into_inner() {
            Ok(inner) => Some(inner),
            Err(e) => {
                warn!(error = %e.error(), "failed to flush CSV export");
                None
            }
        }
    }

    fn try_write(&mut self, row: &[(String, String)]) -> Result<(), csv::Error> {
        if !self.header_written {
            self.writer.write_record(row.iter().map(|(col, _)| col))?;
            self.header_written = true;
        }
        self.writer.write_record(row.iter().map(|(_, value)| value))
    }
}

impl<W: Write> ExportSink for CsvSink<W> {
    fn write_row(&mut self, row: &[(String, String)]) -> bool {
        match self.try_write(row) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "failed to write CSV row");
                false
            }
        }
    }
}

fn leg_row<S: AsRef<str>>(leg: &JourneyLeg, columns: &[S]) -> Vec<(String, String)> {
    columns
        .iter()
        .map(|c| c.as_ref().to_string())
        .zip(leg.attributes(columns))
        .collect()
}

fn export_legs<'a, S: AsRef<str>>(
    legs: impl Iterator<Item = &'a JourneyLeg>,
    columns: &[S],
    sink: &mut dyn ExportSink,
) -> bool {
    for leg in legs {
        if !sink.write_row(&leg_row(leg, columns)) {
            return false;
        }
    }
    true
}

/// Export saved segments in slot order.
///
/// Stops at the first row the sink rejects.
pub fn export_segments<S: AsRef<str>>(
    itinerary: &Itinerary,
    columns: &[S],
    sink: &mut dyn ExportSink,
) -> bool {
    export_legs(itinerary.segments().values(), columns, sink)
}

/// Export one search's results in extraction order.
pub fn export_search<S: AsRef<str>>(
    record: &SearchRecord,
    columns: &[S],
    sink: &mut dyn ExportSink,
) -> bool {
    export_legs(record.results.values(), columns, sink)
}

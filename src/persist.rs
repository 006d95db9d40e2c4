//! Flat-file persistence.
//!
//! The first line holds the comma-joined column names; every further line
//! holds one record's values in the same order. There is no escaping, which
//! is fine because valid text never contains a comma.

use crate::error::{Result, TableError};
use crate::record::Record;
use crate::table::Table;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tracing::debug;

pub fn write_to<W: Write>(table: &Table, mut writer: W) -> Result<()> {
    writeln!(writer, "{}", table.columns().join(","))?;
    for record in table.records() {
        let line: Vec<&str> = record.values().collect();
        writeln!(writer, "{}", line.join(","))?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes `table` to `path`, replacing any existing file.
pub fn write_file(table: &Table, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)?;
    write_to(table, BufWriter::new(file))?;
    debug!(path = %path.display(), records = table.len(), "wrote table");
    Ok(())
}

pub fn read_from<R: BufRead>(reader: R) -> Result<Table> {
    let mut lines = reader.lines();
    let header = match lines.next() {
        Some(line) => line?,
        None => return Err(TableError::malformed(1, "missing header line")),
    };
    let columns: Vec<String> = split_line(&header).map(str::to_string).collect();

    let mut records = Vec::new();
    for (offset, line) in lines.enumerate() {
        let line = line?;
        let line_no = offset + 2;
        // Only truly empty lines are skipped; a value may be all spaces.
        if line.strip_suffix('\r').unwrap_or(&line).is_empty() {
            continue;
        }
        let values: Vec<&str> = split_line(&line).collect();
        if values.len() != columns.len() {
            return Err(TableError::malformed(
                line_no,
                format!("expected {} fields, found {}", columns.len(), values.len()),
            ));
        }
        records.push(Record::new(&columns, &values)?);
    }
    Table::load(&columns, records)
}

pub fn read_file(path: impl AsRef<Path>) -> Result<Table> {
    let path = path.as_ref();
    let table = read_from(BufReader::new(File::open(path)?))?;
    debug!(path = %path.display(), records = table.len(), "read table");
    Ok(table)
}

fn split_line(line: &str) -> impl Iterator<Item = &str> {
    line.strip_suffix('\r').unwrap_or(line).split(',')
}

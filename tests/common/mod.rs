#![allow(dead_code)]

use std::io::{Error, Write};
use tempfile::NamedTempFile;

/// Reservation, review, card and code for the Suite booking used across tests.
pub const HAPPY_PATH: &[[&str; 3]] = &[
    ["input", "roomType", "Suite"],
    ["input", "checkIn", "2024-06-01"],
    ["input", "checkOut", "2024-06-03"],
    ["input", "guests", "2"],
    ["input", "amount", "5000"],
    ["submit", "", ""],
    ["submit", "", ""],
    ["input", "cardNumber", "4111 1111 1111 1111"],
    ["input", "cardName", "john doe"],
    ["input", "expiry", "12/25"],
    ["input", "cvv", "123"],
    ["submit", "", ""],
    ["paste", "", "123456"],
    ["submit", "", ""],
];

pub fn write_events(rows: &[[&str; 3]]) -> Result<NamedTempFile, Error> {
    let file = NamedTempFile::new()?;
    let mut wtr = csv::WriterBuilder::new().from_writer(file.reopen()?);

    wtr.write_record(["action", "target", "value"])?;
    for row in rows {
        wtr.write_record(row)?;
    }

    wtr.flush()?;
    Ok(file)
}

/// Writes raw lines, for rows the CSV writer would refuse to produce.
pub fn write_raw(lines: &[&str]) -> Result<NamedTempFile, Error> {
    let mut file = NamedTempFile::new()?;
    writeln!(file, "action,target,value")?;
    for line in lines {
        writeln!(file, "{line}")?;
    }
    file.flush()?;
    Ok(file)
}

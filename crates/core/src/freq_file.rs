//! Persisted frequency-table format.
//!
//! The decoder rebuilds the Huffman tree from this file, so it is part of the
//! wire format alongside the encoded payload.
//!
//! # Format
//!
//! ```text
//! 01000001:5
//! 01000010:3
//! 01000011:2
//! 01000100:1
//! ```
//!
//! One record per line: the symbol as exactly eight binary digits, a `:`
//! separator, and the decimal count. Records are sorted by count descending,
//! ties by ascending symbol, so the same table always produces the same
//! bytes. There is no header, checksum, or total.
//!
//! Reading tolerates CRLF line endings and blank lines; record order does not
//! matter.

use std::io::{BufRead, Write};

use tracing::{debug, trace};

use crate::error::{FormatError, Result};
use crate::frequency::FrequencyTable;

/// Separator between the symbol and count fields.
pub const SEPARATOR: char = ':';

/// Write `table` to `writer` in the persisted format.
///
/// Returns the number of bytes written.
pub fn write_table<W: Write>(table: &FrequencyTable, mut writer: W) -> Result<u64> {
    let text = to_string(table);
    writer.write_all(text.as_bytes())?;
    writer.flush()?;

    debug!(
        records = table.len(),
        bytes = text.len(),
        "wrote frequency table"
    );
    Ok(text.len() as u64)
}

/// Render `table` in the persisted format.
pub fn to_string(table: &FrequencyTable) -> String {
    let mut out = String::with_capacity(table.len() * 16);
    for (symbol, count) in table.sorted_by_count() {
        out.push_str(&format_record(symbol, count));
        out.push('\n');
    }
    out
}

/// Render one record (without the line terminator).
pub fn format_record(symbol: u8, count: u64) -> String {
    format!("{symbol:08b}{SEPARATOR}{count}")
}

/// Read a table in the persisted format until the reader is exhausted.
///
/// # Errors
/// - `FormatError` for a malformed or non-UTF-8 record, a symbol listed
///   twice, or counts whose total does not fit in a `u64`
/// - I/O errors from the reader
pub fn read_table<R: BufRead>(reader: R) -> Result<FrequencyTable> {
    let mut table = FrequencyTable::new();
    let mut total: u64 = 0;

    for (index, line) in reader.split(b'\n').enumerate() {
        let line = line?;
        let line_no = index + 1;
        let bytes = line.strip_suffix(b"\r").unwrap_or(&line);
        let record = std::str::from_utf8(bytes).map_err(|_| FormatError::InvalidEncoding {
            line: line_no,
            content: String::from_utf8_lossy(bytes).into_owned(),
        })?;
        if record.trim().is_empty() {
            continue;
        }

        let (symbol, count) = parse_record(line_no, record)?;
        trace!(line = line_no, symbol, count, "parsed frequency record");

        total = total
            .checked_add(count)
            .ok_or(FormatError::TotalOverflow { line: line_no })?;
        if table.insert(symbol, count).is_some() {
            return Err(FormatError::DuplicateSymbol {
                line: line_no,
                symbol,
            }
            .into());
        }
    }

    debug!(records = table.len(), total, "read frequency table");
    Ok(table)
}

/// Parse a table from an in-memory string.
pub fn parse_table(text: &str) -> Result<FrequencyTable> {
    read_table(text.as_bytes())
}

/// Parse a single record line (already stripped of its terminator).
pub fn parse_record(line: usize, record: &str) -> std::result::Result<(u8, u64), FormatError> {
    let (symbol_field, count_field) =
        record
            .split_once(SEPARATOR)
            .ok_or_else(|| FormatError::MissingSeparator {
                line,
                content: record.to_string(),
            })?;

    if symbol_field.len() != 8 || !symbol_field.bytes().all(|b| b == b'0' || b == b'1') {
        return Err(FormatError::InvalidSymbol {
            line,
            content: record.to_string(),
        });
    }
    let symbol = u8::from_str_radix(symbol_field, 2).map_err(|_| FormatError::InvalidSymbol {
        line,
        content: record.to_string(),
    })?;

    // `u64::from_str` would also accept a leading '+'
    if count_field.is_empty() || !count_field.bytes().all(|b| b.is_ascii_digit()) {
        return Err(FormatError::InvalidCount {
            line,
            content: record.to_string(),
        });
    }
    let count = count_field
        .parse::<u64>()
        .map_err(|_| FormatError::InvalidCount {
            line,
            content: record.to_string(),
        })?;

    Ok((symbol, count))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_scenario_layout() {
        let table = FrequencyTable::from_bytes(b"AAAAABBBCCD");
        assert_eq!(
            to_string(&table),
            "01000001:5\n01000010:3\n01000011:2\n01000100:1\n"
        );
    }

    #[test]
    fn test_ties_sorted_by_symbol() {
        let table = FrequencyTable::from_bytes(b"cba");
        assert_eq!(to_string(&table), "01100001:1\n01100010:1\n01100011:1\n");
    }

    #[test]
    fn test_round_trip() {
        let table = FrequencyTable::from_bytes(b"the quick brown fox jumps over the lazy dog");
        let text = to_string(&table);
        assert_eq!(parse_table(&text).unwrap(), table);
    }

    #[test]
    fn test_round_trip_extreme_symbols_and_counts() {
        let table: FrequencyTable = [(0u8, u64::MAX - 1), (255u8, 1)].into_iter().collect();
        let text = to_string(&table);
        assert!(text.starts_with("00000000:18446744073709551614\n"));
        assert_eq!(parse_table(&text).unwrap(), table);
    }

    #[test]
    fn test_record_order_irrelevant() {
        let a = parse_table("01000001:5\n01000010:3\n").unwrap();
        let b = parse_table("01000010:3\n01000001:5\n").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_write_table_reports_bytes() {
        let table = FrequencyTable::from_bytes(b"ab");
        let mut out = Vec::new();
        let written = write_table(&table, &mut out).unwrap();
        assert_eq!(written, out.len() as u64);
        assert_eq!(out, b"01100001:1\n01100010:1\n");
    }

    #[test]
    fn test_crlf_and_blank_lines() {
        let table = parse_table("01000001:5\r\n\r\n01000010:3\r\n\n").unwrap();
        assert_eq!(table.get(b'A'), Some(5));
        assert_eq!(table.get(b'B'), Some(3));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_empty_file_is_empty_table() {
        assert!(parse_table("").unwrap().is_empty());
    }

    #[test]
    fn test_missing_separator() {
        let err = parse_table("01000001:5\n010000015\n").unwrap_err();
        assert!(matches!(
            err,
            Error::Format(FormatError::MissingSeparator { line: 2, .. })
        ));
    }

    #[test]
    fn test_invalid_symbol_fields() {
        for bad in ["0100001:5", "010000011:5", "0100000a:5", ":5", "01000002:5"] {
            let err = parse_table(bad).unwrap_err();
            assert!(
                matches!(err, Error::Format(FormatError::InvalidSymbol { line: 1, .. })),
                "{bad:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn test_invalid_count_fields() {
        for bad in [
            "01000001:",
            "01000001:-1",
            "01000001:+1",
            "01000001:1.5",
            "01000001: 1",
            "01000001:18446744073709551616",
        ] {
            let err = parse_table(bad).unwrap_err();
            assert!(
                matches!(err, Error::Format(FormatError::InvalidCount { line: 1, .. })),
                "{bad:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn test_non_utf8_record_is_format_error() {
        let err = read_table(&b"01000001:5\n\xff\xfe:3\n"[..]).unwrap_err();
        match err {
            Error::Format(FormatError::InvalidEncoding { line, content }) => {
                assert_eq!(line, 2);
                assert!(content.ends_with(":3"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_non_utf8_crlf_record_line_number() {
        let err = read_table(&b"01000001:5\r\n\r\n0100\x80010:3\r\n"[..]).unwrap_err();
        assert!(matches!(
            err,
            Error::Format(FormatError::InvalidEncoding { line: 3, .. })
        ));
    }

    #[test]
    fn test_duplicate_symbol() {
        let err = parse_table("01000001:5\n01000001:3\n").unwrap_err();
        assert!(matches!(
            err,
            Error::Format(FormatError::DuplicateSymbol {
                line: 2,
                symbol: b'A'
            })
        ));
    }

    #[test]
    fn test_total_overflow() {
        let text = format!("{}\n{}\n", format_record(1, u64::MAX), format_record(2, 1));
        let err = parse_table(&text).unwrap_err();
        assert!(matches!(
            err,
            Error::Format(FormatError::TotalOverflow { line: 2 })
        ));
    }

    #[test]
    fn test_zero_count_is_accepted() {
        let table = parse_table("01000001:0\n").unwrap();
        assert_eq!(table.get(b'A'), Some(0));
        assert!(table.contains(b'A'));
        assert!(!table.contains(b'B'));
    }
}

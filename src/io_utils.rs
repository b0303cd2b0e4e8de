//! I/O utilities for reading patient files and writing results.
//!
//! All file I/O flows through this module:
//!
//! - **Delimiter resolution**: extension-based detection (`.csv` → comma,
//!   `.tsv` → tab) with manual override.
//! - **Encoding**: input decoding and output transcoding via `encoding_rs`,
//!   defaulting to UTF-8.
//! - **stdin/stdout**: the `-` path routes through standard streams.
//! - **Tables**: whole files are loaded into a [`RawTable`]; ragged rows are
//!   padded rather than rejected.

use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

use anyhow::{Context, Result, anyhow};
use csv::QuoteStyle;
use encoding_rs::{Encoding, UTF_8};

use crate::records::RawTable;

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
    } else {
        Ok(UTF_8)
    }
}

pub fn resolve_input_delimiter(path: &Path, provided: Option<u8>) -> u8 {
    provided.unwrap_or_else(|| match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => DEFAULT_TSV_DELIMITER,
        _ => DEFAULT_CSV_DELIMITER,
    })
}

pub fn resolve_output_delimiter(path: Option<&Path>, provided: Option<u8>, fallback: u8) -> u8 {
    if let Some(delim) = provided {
        return delim;
    }
    if let Some(path) = path {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("tsv") => return DEFAULT_TSV_DELIMITER,
            Some(ext) if ext.eq_ignore_ascii_case("csv") => return DEFAULT_CSV_DELIMITER,
            _ => {}
        }
    }
    fallback
}

pub fn open_csv_reader<R>(reader: R, delimiter: u8) -> csv::Reader<R>
where
    R: Read,
{
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(true)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(true);
    builder.from_reader(reader)
}

pub fn open_input(path: &Path) -> Result<Box<dyn Read>> {
    if is_dash(path) {
        Ok(Box::new(std::io::stdin().lock()))
    } else {
        Ok(Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Opening input file {path:?}"))?,
        )))
    }
}

pub fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> Result<String> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        Err(anyhow!(
            "Failed to decode text with encoding {}",
            encoding.name()
        ))
    } else {
        Ok(text.into_owned())
    }
}

pub fn decode_record(record: &csv::ByteRecord, encoding: &'static Encoding) -> Result<Vec<String>> {
    record
        .iter()
        .map(|field| decode_bytes(field, encoding))
        .collect()
}

/// Reads a delimited source with a header row into memory.
pub fn read_raw_table<R>(
    source: R,
    delimiter: u8,
    encoding: &'static Encoding,
) -> Result<RawTable>
where
    R: Read,
{
    let mut reader = open_csv_reader(source, delimiter);
    let header_record = reader.byte_headers().context("Reading header row")?.clone();
    let mut table = RawTable::new(decode_record(&header_record, encoding)?);
    for (row_idx, record) in reader.byte_records().enumerate() {
        let record = record.with_context(|| format!("Reading row {}", row_idx + 2))?;
        let decoded = decode_record(&record, encoding)
            .with_context(|| format!("Decoding row {}", row_idx + 2))?;
        table.push_row(decoded);
    }
    Ok(table)
}

pub fn read_raw_table_from_path(
    path: &Path,
    delimiter: u8,
    encoding: &'static Encoding,
) -> Result<RawTable> {
    let source = open_input(path)?;
    read_raw_table(source, delimiter, encoding).with_context(|| format!("Reading {path:?}"))
}

fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    match path {
        Some(p) if !is_dash(p) => Ok(Box::new(BufWriter::new(
            File::create(p).with_context(|| format!("Creating output file {p:?}"))?,
        ))),
        _ => Ok(Box::new(std::io::stdout())),
    }
}

/// Writes `text` to the file (or stdout), transcoding when the target is not UTF-8.
pub fn write_text(path: Option<&Path>, text: &str, encoding: &'static Encoding) -> Result<()> {
    let bytes = if encoding == UTF_8 {
        text.as_bytes().to_vec()
    } else {
        let (encoded, _, had_errors) = encoding.encode(text);
        if had_errors {
            return Err(anyhow!("Failed to encode output using {}", encoding.name()));
        }
        encoded.into_owned()
    };
    let mut writer = open_output(path)?;
    writer.write_all(&bytes).context("Writing output")?;
    writer.flush().context("Flushing output")?;
    Ok(())
}

pub fn render_csv(table: &RawTable, delimiter: u8) -> Result<String> {
    let mut builder = csv::WriterBuilder::new();
    builder
        .delimiter(delimiter)
        .quote_style(QuoteStyle::Necessary)
        .double_quote(true);
    let mut writer = builder.from_writer(Vec::new());
    writer.write_record(&table.headers)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|err| anyhow!("Flushing CSV output: {}", err.error()))?;
    String::from_utf8(bytes).context("CSV output is not valid UTF-8")
}

pub fn write_csv(
    path: Option<&Path>,
    table: &RawTable,
    delimiter: u8,
    encoding: &'static Encoding,
) -> Result<()> {
    let rendered = render_csv(table, delimiter)?;
    write_text(path, &rendered, encoding)
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::WINDOWS_1252;

    #[test]
    fn read_raw_table_pads_ragged_rows() {
        let data = "a,b,c\n1,2\n4,5,6,7\n";
        let table = read_raw_table(data.as_bytes(), b',', UTF_8).unwrap();
        assert_eq!(table.headers, vec!["a", "b", "c"]);
        assert_eq!(table.rows[0], vec!["1", "2", ""]);
        assert_eq!(table.rows[1], vec!["4", "5", "6"]);
    }

    #[test]
    fn read_raw_table_decodes_legacy_encodings() {
        let (bytes, _, _) = WINDOWS_1252.encode("name\nJosé\n");
        let table = read_raw_table(&bytes[..], b',', WINDOWS_1252).unwrap();
        assert_eq!(table.rows[0][0], "José");
    }

    #[test]
    fn render_csv_quotes_only_when_needed() {
        let mut table = RawTable::new(vec!["id".into(), "note".into()]);
        table.push_row(vec!["P1".into(), "a,b".into()]);
        assert_eq!(render_csv(&table, b',').unwrap(), "id,note\nP1,\"a,b\"\n");
    }

    #[test]
    fn delimiter_follows_extension() {
        assert_eq!(resolve_input_delimiter(Path::new("x.tsv"), None), b'\t');
        assert_eq!(resolve_input_delimiter(Path::new("x.csv"), Some(b';')), b';');
        assert_eq!(resolve_output_delimiter(None, None, b'|'), b'|');
    }
}

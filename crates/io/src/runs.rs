// Tab-delimited run data import

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

/// One imported data row: destination field name -> cell text.
pub type RunRow = BTreeMap<String, String>;

/// Parse tab-delimited run data with a header line.
///
/// The first non-blank line names the destination fields; every later
/// non-blank line is a data row whose parts map onto those names by
/// position. Empty cells are left out of the row rather than stored as "".
/// Returns `None` when no data rows were produced (empty or header-only input).
pub fn parse_data_text_to_run_rows(text: &str) -> Option<Vec<RunRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(text.as_bytes());

    let mut header: Option<Vec<String>> = None;
    let mut rows = Vec::new();

    for result in reader.records() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                log::debug!("Skipping unreadable run data line: {}", e);
                continue;
            }
        };
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }

        let Some(fields) = header.as_ref() else {
            header = Some(record.iter().map(|f| f.trim().to_string()).collect());
            continue;
        };

        let row: RunRow = fields
            .iter()
            .zip(record.iter())
            .filter(|(name, value)| !name.is_empty() && !value.trim().is_empty())
            .map(|(name, value)| (name.clone(), value.trim().to_string()))
            .collect();
        rows.push(row);
    }

    if rows.is_empty() {
        None
    } else {
        Some(rows)
    }
}

/// Read a run data file (UTF-8, or Windows-1252 as exported by instruments
/// and Excel) and parse it.
pub fn import_run_file(path: &Path) -> Result<Option<Vec<RunRow>>, String> {
    let content = read_file_as_utf8(path)?;
    Ok(parse_data_text_to_run_rows(&content))
}

fn read_file_as_utf8(path: &Path) -> Result<String, String> {
    let mut file = std::fs::File::open(path).map_err(|e| e.to_string())?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(|e| e.to_string())?;

    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(e) => {
            let bytes = e.into_bytes();
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            Ok(decoded.into_owned())
        }
    }
}

//! Sales record loading and normalization.
//!
//! Upstream exports arrive either with direct field names (`ASIN`,
//! `StoreCode`, `Units`, ...) or with positional list-column aliases
//! (`Title`, `field_1` .. `field_9`). Both are normalized into one
//! `SalesRecord`. When a record carries both, the named field wins.
//!
//! Malformed values never abort a batch: an unparseable date becomes the
//! 2000-01-01 sentinel and a bad number becomes zero, each logged at warn.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDate};
use serde_json::{Map, Value};

use crate::error::LoadError;
use crate::types::SalesRecord;

/// A canonical field with its positional alias.
#[derive(Clone, Copy, Debug)]
struct FieldAlias {
    named: &'static str,
    positional: &'static str,
}

const PRODUCT_ID: FieldAlias = FieldAlias { named: "ASIN", positional: "Title" };
const TITLE: FieldAlias = FieldAlias { named: "ProductTitle", positional: "field_1" };
const BRAND: FieldAlias = FieldAlias { named: "Brand", positional: "field_2" };
const STORE_CODE: FieldAlias = FieldAlias { named: "StoreCode", positional: "field_3" };
const REVENUE: FieldAlias = FieldAlias { named: "Revenue", positional: "field_4" };
const COGS: FieldAlias = FieldAlias { named: "COGS", positional: "field_5" };
const UNITS: FieldAlias = FieldAlias { named: "Units", positional: "field_6" };
const RETURNS: FieldAlias = FieldAlias { named: "Returns", positional: "field_7" };
const WEEK_START: FieldAlias = FieldAlias { named: "WeekStart", positional: "field_8" };
const FISCAL_WEEK: FieldAlias = FieldAlias { named: "FiscalWeek", positional: "field_9" };

/// Input file encodings accepted by the loader.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputFormat {
    Json,
    Csv,
}

impl InputFormat {
    /// Guess the format from a file extension; anything but `.csv` is JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => InputFormat::Csv,
            _ => InputFormat::Json,
        }
    }
}

/// Date assigned to records whose week start cannot be parsed.
pub fn sentinel_week_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or_default()
}

/// Parse a week start given as `YYYY-MM-DD` or as an RFC 3339 timestamp.
pub fn parse_week_start(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

/// Unwrap the record list from any accepted payload envelope.
///
/// Accepted: `[...]`, `{"value": [...]}`, `{"body": [...]}`,
/// `{"body": {"value": [...]}}`.
pub fn extract_items(payload: Value) -> Result<Vec<Value>, LoadError> {
    let items = match payload {
        Value::Array(items) => items,
        Value::Object(mut envelope) => {
            if let Some(body) = envelope.remove("body") {
                match body {
                    Value::Array(items) => items,
                    Value::Object(mut inner) => match inner.remove("value") {
                        Some(Value::Array(items)) => items,
                        _ => return Err(LoadError::UnrecognizedEnvelope),
                    },
                    _ => return Err(LoadError::UnrecognizedEnvelope),
                }
            } else if let Some(value) = envelope.remove("value") {
                match value {
                    Value::Array(items) => items,
                    _ => return Err(LoadError::UnrecognizedEnvelope),
                }
            } else {
                return Err(LoadError::UnrecognizedEnvelope);
            }
        }
        _ => return Err(LoadError::UnrecognizedEnvelope),
    };

    if items.is_empty() {
        return Err(LoadError::NoRecords);
    }
    Ok(items)
}

/// Normalize raw JSON items, skipping (and logging) anything that is not an object.
pub fn normalize_items(items: &[Value]) -> Vec<SalesRecord> {
    items
        .iter()
        .enumerate()
        .filter_map(|(idx, item)| match item {
            Value::Object(fields) => Some(normalize_record(fields, idx)),
            other => {
                log::warn!("record {}: expected an object, got {}; skipped", idx, kind(other));
                None
            }
        })
        .collect()
}

/// Convert one raw record into a `SalesRecord`, substituting neutral values
/// for anything missing or malformed. `idx` is used only for log context.
pub fn normalize_record(fields: &Map<String, Value>, idx: usize) -> SalesRecord {
    let week_start_label = text_field(fields, WEEK_START);
    let week_start = match parse_week_start(&week_start_label) {
        Some(date) => date,
        None => {
            log::warn!(
                "record {}: unparseable week start '{}'; using sentinel date",
                idx,
                week_start_label
            );
            sentinel_week_start()
        }
    };

    SalesRecord {
        product_id: text_field(fields, PRODUCT_ID),
        store_code: text_field(fields, STORE_CODE),
        title: text_field(fields, TITLE),
        brand: text_field(fields, BRAND),
        revenue: amount_field(fields, REVENUE, idx),
        cogs: amount_field(fields, COGS, idx),
        units: count_field(fields, UNITS, idx),
        returns: count_field(fields, RETURNS, idx),
        week_start,
        week_start_label,
        fiscal_week_label: text_field(fields, FISCAL_WEEK),
    }
}

/// Load records from a JSON payload in any accepted envelope.
pub fn load_records_json<R: Read>(reader: R) -> Result<Vec<SalesRecord>, LoadError> {
    let payload: Value = serde_json::from_reader(reader)?;
    let items = extract_items(payload)?;
    let records = normalize_items(&items);
    if records.is_empty() {
        return Err(LoadError::NoRecords);
    }
    Ok(records)
}

/// Load records from a CSV export with a header row.
///
/// Headers may use either naming scheme; empty cells count as missing so a
/// blank named column falls through to its positional alias.
pub fn load_records_csv<R: Read>(reader: R) -> Result<Vec<SalesRecord>, LoadError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut records = Vec::new();
    for (idx, result) in csv_reader.deserialize::<HashMap<String, String>>().enumerate() {
        let row = result.map_err(|source| LoadError::Csv { line: idx + 2, source })?;
        let fields: Map<String, Value> = row
            .into_iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(k, v)| (k, Value::String(v)))
            .collect();
        records.push(normalize_record(&fields, idx));
    }

    if records.is_empty() {
        return Err(LoadError::NoRecords);
    }
    Ok(records)
}

/// Load records from a file, choosing the parser by `format` or by extension.
pub fn load_records_file(
    path: impl AsRef<Path>,
    format: Option<InputFormat>,
) -> Result<Vec<SalesRecord>, LoadError> {
    let path = path.as_ref();
    let format = format.unwrap_or_else(|| InputFormat::from_path(path));
    let file = File::open(path)?;
    let records = match format {
        InputFormat::Json => load_records_json(file)?,
        InputFormat::Csv => load_records_csv(file)?,
    };
    log::info!("loaded {} records from {}", records.len(), path.display());
    Ok(records)
}

// ---------------------------------------------------------------------------
// Field extraction
// ---------------------------------------------------------------------------

/// Named field if it carries a value, else the positional alias.
///
/// Null and blank strings count as missing, the same as empty CSV cells.
fn lookup<'a>(fields: &'a Map<String, Value>, field: FieldAlias) -> Option<&'a Value> {
    fields
        .get(field.named)
        .filter(|v| has_value(v))
        .or_else(|| fields.get(field.positional).filter(|v| has_value(v)))
}

fn has_value(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        _ => true,
    }
}

fn text_field(fields: &Map<String, Value>, field: FieldAlias) -> String {
    match lookup(fields, field) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn amount_field(fields: &Map<String, Value>, field: FieldAlias, idx: usize) -> f64 {
    let parsed = match lookup(fields, field) {
        None => return 0.0,
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) if s.trim().is_empty() => return 0.0,
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
    };

    match parsed {
        Some(v) if v.is_finite() => v,
        _ => {
            log::warn!("record {}: invalid {} value; using 0", idx, field.named);
            0.0
        }
    }
}

fn count_field(fields: &Map<String, Value>, field: FieldAlias, idx: usize) -> u64 {
    let parsed = match lookup(fields, field) {
        None => return 0,
        Some(Value::Number(n)) => n.as_u64().map(|v| v as f64).or_else(|| n.as_f64()),
        Some(Value::String(s)) if s.trim().is_empty() => return 0,
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
    };

    match parsed {
        Some(v) if v.is_finite() && v >= 0.0 => v.trunc() as u64,
        _ => {
            log::warn!("record {}: invalid {} count; using 0", idx, field.named);
            0
        }
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;
    use serde_json::json;

    fn as_map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn normalizes_named_fields() {
        let record = normalize_record(
            &as_map(json!({
                "ASIN": "B0ABC123",
                "ProductTitle": "Cordless Drill",
                "Brand": "Acme",
                "StoreCode": "IT",
                "Revenue": 1234.56,
                "COGS": 800.0,
                "Units": 100,
                "Returns": 5,
                "WeekStart": "2024-09-30",
                "FiscalWeek": "2024-W40"
            })),
            0,
        );
        assert_eq!(record.product_id, "B0ABC123");
        assert_eq!(record.store_code, "IT");
        assert_eq!(record.units, 100);
        assert_eq!(record.returns, 5);
        assert!((record.revenue - 1234.56).abs() < 1e-9);
        assert_eq!(record.week_start, NaiveDate::from_ymd_opt(2024, 9, 30).unwrap());
        assert_eq!(record.iso_week_number(), 40);
        assert_eq!(record.fiscal_week_label, "2024-W40");
    }

    #[test]
    fn normalizes_positional_aliases() {
        let record = normalize_record(
            &as_map(json!({
                "Title": "B0ABC123",
                "field_1": "Cordless Drill",
                "field_2": "Acme",
                "field_3": "DE",
                "field_4": "99.5",
                "field_6": "42",
                "field_7": 3,
                "field_8": "2024-01-01",
                "field_9": "2024-W01"
            })),
            0,
        );
        assert_eq!(record.product_id, "B0ABC123");
        assert_eq!(record.title, "Cordless Drill");
        assert_eq!(record.store_code, "DE");
        assert!((record.revenue - 99.5).abs() < 1e-9);
        assert_eq!(record.units, 42);
        assert_eq!(record.returns, 3);
        assert_eq!(record.cogs, 0.0);
    }

    #[test]
    fn named_field_wins_over_alias() {
        let record = normalize_record(
            &as_map(json!({ "Units": 0, "field_6": 50, "ASIN": "A", "Title": "B" })),
            0,
        );
        assert_eq!(record.units, 0);
        assert_eq!(record.product_id, "A");
    }

    #[test]
    fn null_named_field_falls_back_to_alias() {
        let record = normalize_record(&as_map(json!({ "Units": null, "field_6": 50 })), 0);
        assert_eq!(record.units, 50);
    }

    #[test]
    fn blank_named_field_falls_back_to_alias() {
        let record = normalize_record(
            &as_map(json!({ "ASIN": "", "Title": "B0ALIAS", "Units": "  ", "field_6": 12 })),
            0,
        );
        assert_eq!(record.product_id, "B0ALIAS");
        assert_eq!(record.units, 12);
    }

    #[test]
    fn blank_cells_behave_the_same_in_json_and_csv() {
        let csv = "ASIN,Title,Units,field_6,WeekStart\n,B0ALIAS,,12,2024-09-02\n";
        let from_csv = load_records_csv(csv.as_bytes()).unwrap();
        let json = r#"[{"ASIN":"","Title":"B0ALIAS","Units":"","field_6":"12","WeekStart":"2024-09-02"}]"#;
        let from_json = load_records_json(json.as_bytes()).unwrap();
        assert_eq!(from_csv, from_json);
        assert_eq!(from_json[0].product_id, "B0ALIAS");
    }

    #[test]
    fn bad_date_becomes_sentinel() {
        let record = normalize_record(&as_map(json!({ "WeekStart": "30/09/2024" })), 0);
        assert_eq!(record.week_start, sentinel_week_start());
        assert_eq!(record.week_start.year(), 2000);
        assert_eq!(record.week_start_label, "30/09/2024");
    }

    #[test]
    fn rfc3339_week_start_is_accepted() {
        let record = normalize_record(&as_map(json!({ "WeekStart": "2024-09-30T00:00:00Z" })), 0);
        assert_eq!(record.week_start, NaiveDate::from_ymd_opt(2024, 9, 30).unwrap());
    }

    #[test]
    fn malformed_numbers_become_zero() {
        let record = normalize_record(
            &as_map(json!({ "Revenue": "n/a", "Units": -4, "Returns": [1] })),
            0,
        );
        assert_eq!(record.revenue, 0.0);
        assert_eq!(record.units, 0);
        assert_eq!(record.returns, 0);
    }

    #[test]
    fn fractional_counts_truncate() {
        let record = normalize_record(&as_map(json!({ "Units": 12.9, "Returns": "3.0" })), 0);
        assert_eq!(record.units, 12);
        assert_eq!(record.returns, 3);
    }

    #[test]
    fn extracts_every_envelope_shape() {
        let item = json!({ "ASIN": "A" });
        for payload in [
            json!([item.clone()]),
            json!({ "value": [item.clone()] }),
            json!({ "body": [item.clone()] }),
            json!({ "body": { "value": [item.clone()] } }),
        ] {
            let items = extract_items(payload).unwrap();
            assert_eq!(items.len(), 1);
        }
    }

    #[test]
    fn rejects_unknown_envelope() {
        let err = extract_items(json!({ "rows": [] })).unwrap_err();
        assert!(matches!(err, LoadError::UnrecognizedEnvelope));
        let err = extract_items(json!({ "body": { "rows": [] } })).unwrap_err();
        assert!(matches!(err, LoadError::UnrecognizedEnvelope));
        let err = extract_items(json!("text")).unwrap_err();
        assert!(matches!(err, LoadError::UnrecognizedEnvelope));
    }

    #[test]
    fn rejects_empty_payload() {
        let err = extract_items(json!({ "body": [] })).unwrap_err();
        assert!(matches!(err, LoadError::NoRecords));
    }

    #[test]
    fn non_object_items_are_skipped() {
        let records = normalize_items(&[json!(1), json!({ "ASIN": "A" }), json!("x")]);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].product_id, "A");
    }

    #[test]
    fn json_loader_rejects_all_skipped_items() {
        let err = load_records_json("[1, 2, 3]".as_bytes()).unwrap_err();
        assert!(matches!(err, LoadError::NoRecords));
    }

    const SAMPLE_CSV: &str = "\
ASIN,ProductTitle,Brand,StoreCode,Revenue,COGS,Units,Returns,WeekStart,FiscalWeek
B01,Drill,Acme,IT,1000.50,600,100,2,2024-09-09,2024-W37
B01,Drill,Acme,IT,900.00,540,90,1,2024-09-16,2024-W38
B02,Saw,Bolt,DE,,,,,not-a-date,
";

    #[test]
    fn load_sample_csv() {
        let records = load_records_csv(SAMPLE_CSV.as_bytes()).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].product_id, "B01");
        assert_eq!(records[0].units, 100);
        assert!((records[0].revenue - 1000.50).abs() < 1e-9);
        assert_eq!(records[1].fiscal_week_label, "2024-W38");
        assert_eq!(records[2].units, 0);
        assert_eq!(records[2].week_start, sentinel_week_start());
    }

    #[test]
    fn csv_with_positional_headers() {
        let csv_data = "\
Title,field_3,field_6,field_7,field_8
B09,FR,55,4,2024-03-04
";
        let records = load_records_csv(csv_data.as_bytes()).unwrap();
        assert_eq!(records[0].product_id, "B09");
        assert_eq!(records[0].store_code, "FR");
        assert_eq!(records[0].units, 55);
    }

    #[test]
    fn csv_with_only_header_has_no_records() {
        let err = load_records_csv("ASIN,Units\n".as_bytes()).unwrap_err();
        assert!(matches!(err, LoadError::NoRecords));
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(InputFormat::from_path(Path::new("a/b.CSV")), InputFormat::Csv);
        assert_eq!(InputFormat::from_path(Path::new("a/b.json")), InputFormat::Json);
        assert_eq!(InputFormat::from_path(Path::new("payload")), InputFormat::Json);
    }

    #[test]
    fn load_file_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sales.csv");
        std::fs::write(&path, SAMPLE_CSV).unwrap();
        let records = load_records_file(&path, None).unwrap();
        assert_eq!(records.len(), 3);
    }
}

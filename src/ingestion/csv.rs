//! `show stat` CSV decoding.

use std::io::Read;

use log::{debug, trace};

use crate::error::{StatsError, StatsResult};
use crate::fields::{Field, FieldDictionary};
use crate::types::{Record, RecordSet};

use super::quotes::QuoteCheck;
use super::unified::StatsOptions;

/// Length of the `# ` marker preceding the header row.
const PREFIX_LEN: usize = 2;

/// Decode a `show stat` stream into a [`RecordSet`].
///
/// Rules:
///
/// - The first two bytes (the `# ` marker) are discarded.
/// - The first CSV row is the header; columns are matched to data rows by position.
/// - The last column of every data row is dropped.
/// - Columns whose header is not in `options`' field dictionary are skipped, as are values
///   that fail to decode; the key is then absent from the record.
/// - Every record runs through `options`' transform chain in registration order.
///
/// Decoding is all-or-nothing: a malformed row (field count differing from the header,
/// unterminated quoted field, bare `"` in an unquoted field) or a read failure discards every
/// record decoded so far.
pub fn decode_from_reader<R: Read>(mut reader: R, options: &StatsOptions) -> StatsResult<RecordSet> {
    let mut prefix = [0u8; PREFIX_LEN];
    reader.read_exact(&mut prefix).map_err(StatsError::Stream)?;

    // Not `flexible`: a row whose field count differs from the header's is an error.
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_reader(QuoteCheck::new(reader));
    decode_records(&mut rdr, options)
}

fn decode_records<R: Read>(rdr: &mut csv::Reader<R>, options: &StatsOptions) -> StatsResult<RecordSet> {
    let mut rows = rdr.records();
    let header = rows.next().ok_or(StatsError::MissingHeader)??;

    // Resolve each header position to its rule once, not per row.
    let columns: Vec<Option<&Field>> = header
        .iter()
        .map(|name| lookup(options.fields(), name))
        .collect();

    let mut records = Vec::new();
    for (row_idx0, result) in rows.enumerate() {
        // 1-based, header is row 1.
        let user_row = row_idx0 + 2;
        let row = result?;

        let mut record = Record::new();
        let kept = row.len().saturating_sub(1);
        for (raw, field) in row.iter().take(kept).zip(columns.iter()) {
            let Some(field) = field else { continue };
            match field.decode(raw) {
                Ok(value) => {
                    record.insert(field.name(), value);
                }
                Err(err) => debug!("row {user_row}: skipping field: {err}"),
            }
        }

        records.push(options.transforms().apply(record));
    }

    debug!("decoded {} stat records", records.len());
    Ok(RecordSet::new(records))
}

fn lookup<'a>(fields: &'a FieldDictionary, column: &str) -> Option<&'a Field> {
    let field = fields.get(column);
    if field.is_none() {
        trace!("ignoring unknown column '{column}'");
    }
    field
}

use super::types::{NoticeRow, ResultSet};
use log::debug;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum RowKey {
    Notice(String),
    /// Rows without a notice number only collapse with identical rows.
    Content([String; 9]),
}

impl RowKey {
    fn of(row: &NoticeRow) -> Self {
        let number = row.notice_number.trim();
        if number.is_empty() {
            RowKey::Content(row.to_record().map(str::to_string))
        } else {
            RowKey::Notice(number.to_string())
        }
    }
}

/// Folds `new_rows` into `existing`. A later row replaces an earlier one with
/// the same notice number but keeps the earlier row's position.
pub fn merge(existing: Option<ResultSet>, new_rows: Vec<NoticeRow>) -> ResultSet {
    let prior = existing.unwrap_or_default();
    let incoming = new_rows.len();

    let mut positions: HashMap<RowKey, usize> = HashMap::new();
    let mut merged: ResultSet = Vec::with_capacity(prior.len() + incoming);

    for row in prior.into_iter().chain(new_rows) {
        match positions.get(&RowKey::of(&row)) {
            Some(&index) => merged[index] = row,
            None => {
                positions.insert(RowKey::of(&row), merged.len());
                merged.push(row);
            }
        }
    }

    debug!("Merged {} new row(s) into a set of {}", incoming, merged.len());
    merged
}

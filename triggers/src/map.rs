//! Trigger map construction.

use std::collections::HashMap;

use kotik_types::Trigger;

use crate::source::SheetRow;

/// Build a trigger map from raw spreadsheet rows.
///
/// Triggers are normalized through [`Trigger::new`]; responses are trimmed.
/// Rows with an empty side are excluded, so the resulting map never contains
/// an empty key or an empty candidate list. Duplicate triggers collect their
/// responses into one candidate list in row order.
#[must_use]
pub fn build_trigger_map(rows: &[SheetRow]) -> HashMap<Trigger, Vec<String>> {
    let mut map: HashMap<Trigger, Vec<String>> = HashMap::new();
    for row in rows {
        let Ok(trigger) = Trigger::new(&row.trigger) else {
            continue;
        };
        let response = row.response.trim();
        if response.is_empty() {
            continue;
        }
        map.entry(trigger).or_default().push(response.to_string());
    }
    map
}

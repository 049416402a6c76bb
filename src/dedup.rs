use std::collections::{HashMap, hash_map::Entry};

use log::{debug, info};

use crate::record::{BusinessKey, WorkingTable};

/// Drops every row whose business key was already seen, keeping the first
/// occurrence in source order. Returns the number of rows discarded.
pub fn deduplicate(table: &mut WorkingTable) -> usize {
    let keep: Vec<bool> = {
        let mut first_seen: HashMap<BusinessKey<'_>, usize> = HashMap::with_capacity(table.len());
        table
            .records
            .iter()
            .enumerate()
            .map(|(idx, record)| match first_seen.entry(record.business_key()) {
                Entry::Occupied(original) => {
                    debug!(
                        "Row {} duplicates row {}",
                        record.source_row,
                        table.records[*original.get()].source_row
                    );
                    false
                }
                Entry::Vacant(slot) => {
                    slot.insert(idx);
                    true
                }
            })
            .collect()
    };

    let before = table.len();
    let mut flags = keep.into_iter();
    table.records.retain(|_| flags.next().unwrap_or(true));
    let removed = before - table.len();
    info!("Removed {removed} duplicate row(s); {} remain", table.len());
    removed
}

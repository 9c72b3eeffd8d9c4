//! Bounded random sampling of matching records.

use rand::seq::SliceRandom;
use rand::Rng;
use rusqlite::Connection;

use crate::quiz::model::{ClassificationRecord, FilterState};
use crate::storage::records::{get_records_by_ids, matching_ids};

/// Up to `limit` records matching every set field of `filters`, drawn
/// uniformly without replacement. Fewer matches than `limit` returns them
/// all; no match returns an empty list.
pub fn sample<R: Rng + ?Sized>(
    conn: &Connection,
    filters: &FilterState,
    limit: usize,
    rng: &mut R,
) -> rusqlite::Result<Vec<ClassificationRecord>> {
    let ids = matching_ids(conn, &filters.constraints())?;
    let chosen: Vec<i64> = ids.choose_multiple(rng, limit).copied().collect();
    log::debug!(
        "Sampled {} of {} matching record(s) for user {}",
        chosen.len(),
        ids.len(),
        filters.user_id
    );
    get_records_by_ids(conn, &chosen)
}

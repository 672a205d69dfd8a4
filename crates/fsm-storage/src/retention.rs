// SPDX-License-Identifier: MIT
// Copyright (c) 2026 FSM Runtime Contributors

//! Retention pruning (§6): drop multi-table partitions older than
//! `retentionDays`. Partitioned-mode stores have no per-row expiry here —
//! they would need a row-level delete pass, which is outside what this
//! crate's table-granularity pruning covers.

use crate::partition::{parse_table_date, PartitionStrategy};
use crate::table_store::TableStore;
use chrono::{Duration as ChronoDuration, NaiveDate};
use fsm_core::{PersistenceError, PersistentContext};

/// Drop every table owned by `strategy` whose date suffix is older than
/// `retention_days` relative to `today`. Returns the names of the tables
/// actually dropped, for the caller to log.
pub async fn prune_expired<P, S>(
    store: &S,
    strategy: &PartitionStrategy,
    today: NaiveDate,
    retention_days: u32,
) -> Result<Vec<String>, PersistenceError>
where
    P: PersistentContext,
    S: TableStore<P>,
{
    let cutoff = today - ChronoDuration::days(retention_days.into());
    let mut dropped = Vec::new();

    for table in store.all_tables() {
        if !strategy.owns_table(&table) {
            continue;
        }
        let Some(table_date) = parse_table_date(&table) else { continue };
        if table_date < cutoff {
            store.drop_table(&table).await?;
            dropped.push(table);
        }
    }

    Ok(dropped)
}

#[cfg(test)]
#[path = "retention_tests.rs"]
mod tests;

// SPDX-License-Identifier: MIT
// Copyright (c) 2026 FSM Runtime Contributors

//! Partition naming (§4.4, §6, §9): "partitioned vs multi-table storage is
//! a deployment choice hidden behind the persistence adapter". Both modes
//! are expressed as one [`PartitionStrategy`] so
//! [`crate::adapter::RotatingPersistenceAdapter`] doesn't need two
//! separate implementations of the date-range-query logic.

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, TimeZone, Utc};

/// How often a new physical table is opened in [`PartitionStrategy::MultiTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Daily,
    Monthly,
}

impl Granularity {
    fn suffix_for(&self, date: NaiveDate) -> String {
        match self {
            Granularity::Daily => format!("{:04}{:02}{:02}", date.year(), date.month(), date.day()),
            Granularity::Monthly => format!("{:04}{:02}", date.year(), date.month()),
        }
    }
}

/// §9: "Partitioned vs multi-table storage is a deployment choice hidden
/// behind the persistence adapter."
#[derive(Debug, Clone)]
pub enum PartitionStrategy {
    /// A single physical table holds every row regardless of date; the
    /// partition key is a column, not a table boundary.
    Partitioned { table_name: String },
    /// One physical table per date bucket, named `{prefix}_{YYYYMMDD}`
    /// (or `{prefix}{YYYYMMDD}` when `prefix` already ends in a separator
    /// character such as `p`).
    MultiTable { prefix: String, granularity: Granularity },
}

impl PartitionStrategy {
    pub fn multi_table_daily(prefix: impl Into<String>) -> Self {
        PartitionStrategy::MultiTable { prefix: prefix.into(), granularity: Granularity::Daily }
    }

    pub fn partitioned(table_name: impl Into<String>) -> Self {
        PartitionStrategy::Partitioned { table_name: table_name.into() }
    }

    /// The table a row created at `created_at_ms` belongs in.
    pub fn table_for(&self, created_at_ms: u64) -> String {
        match self {
            PartitionStrategy::Partitioned { table_name } => table_name.clone(),
            PartitionStrategy::MultiTable { prefix, granularity } => {
                let date = ms_to_date(created_at_ms);
                join_prefix_suffix(prefix, &granularity.suffix_for(date))
            }
        }
    }

    /// Every table name that could contain rows created within
    /// `[since_ms, until_ms]`. For [`PartitionStrategy::Partitioned`] this
    /// is always the one table; the caller still applies the date filter
    /// within it.
    pub fn tables_for_range(&self, since_ms: u64, until_ms: u64) -> Vec<String> {
        match self {
            PartitionStrategy::Partitioned { table_name } => vec![table_name.clone()],
            PartitionStrategy::MultiTable { prefix, granularity } => {
                let start = ms_to_date(since_ms);
                let end = ms_to_date(until_ms);
                let mut tables = Vec::new();
                let mut cursor = start;
                loop {
                    tables.push(join_prefix_suffix(prefix, &granularity.suffix_for(cursor)));
                    if cursor >= end {
                        break;
                    }
                    cursor = match granularity {
                        Granularity::Daily => cursor.succ_opt().unwrap_or(end),
                        Granularity::Monthly => next_month(cursor),
                    };
                }
                tables
            }
        }
    }

    /// Whether `table` was produced by this strategy's naming scheme, for
    /// filtering a backend's [`crate::table_store::TableStore::all_tables`]
    /// listing down to "tables this adapter owns" during an id scan.
    pub fn owns_table(&self, table: &str) -> bool {
        match self {
            PartitionStrategy::Partitioned { table_name } => table_name == table,
            PartitionStrategy::MultiTable { prefix, .. } => {
                table.strip_prefix(prefix.as_str()).is_some_and(|rest| {
                    let rest = rest.trim_start_matches('_');
                    !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit())
                })
            }
        }
    }
}

fn join_prefix_suffix(prefix: &str, suffix: &str) -> String {
    if prefix.ends_with(|c: char| !c.is_ascii_alphanumeric()) {
        format!("{prefix}{suffix}")
    } else {
        format!("{prefix}_{suffix}")
    }
}

fn ms_to_date(ms: u64) -> NaiveDate {
    Utc.timestamp_millis_opt(ms as i64).single().unwrap_or_else(Utc::now).date_naive()
}

fn next_month(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 { (date.year() + 1, 1) } else { (date.year(), date.month() + 1) };
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(date)
}

/// Parse a retention-pruning date suffix out of a table name, per §6:
/// either `pYYYYMMDD` or `name_YYYYMMDD`.
pub fn parse_table_date(table: &str) -> Option<NaiveDate> {
    let digits = if let Some(rest) = table.strip_prefix('p') {
        rest
    } else if let Some((_, rest)) = table.rsplit_once('_') {
        rest
    } else {
        return None;
    };

    if digits.len() != 8 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let year: i32 = digits[0..4].parse().ok()?;
    let month: u32 = digits[4..6].parse().ok()?;
    let day: u32 = digits[6..8].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

pub fn date_to_ms(date: NaiveDate) -> u64 {
    DateTime::<Utc>::from_naive_utc_and_offset(date.and_time(NaiveTime::MIN), Utc).timestamp_millis().max(0) as u64
}

#[cfg(test)]
#[path = "partition_tests.rs"]
mod tests;

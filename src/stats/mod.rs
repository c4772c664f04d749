//! Derived statistics over the application collection.
//!
//! Nothing here is stored: every figure is recomputed from the records passed in.

use std::collections::HashMap;

use serde::Serialize;

use crate::models::{ApplicationRecord, Platform, Status};

/// Per-status counts for the dashboard cards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub total: usize,
    pub applied: usize,
    pub interviewing: usize,
    pub accepted: usize,
    pub rejected: usize,
}

/// Count records per canonical status. `total` includes unrecognized statuses.
pub fn compute_stats(records: &[ApplicationRecord]) -> Stats {
    records.iter().fold(
        Stats {
            total: records.len(),
            ..Stats::default()
        },
        |mut stats, record| {
            match record.status {
                Status::Applied => stats.applied += 1,
                Status::Interviewing => stats.interviewing += 1,
                Status::Accepted => stats.accepted += 1,
                Status::Rejected => stats.rejected += 1,
                Status::Unrecognized(_) => {}
            }
            stats
        },
    )
}

/// One slice of the status chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    pub status: Status,
    pub count: usize,
}

/// Statuses that occur at least once, in canonical order.
pub fn status_distribution(records: &[ApplicationRecord]) -> Vec<StatusCount> {
    let stats = compute_stats(records);
    let counts = [
        stats.applied,
        stats.interviewing,
        stats.accepted,
        stats.rejected,
    ];

    Status::CANONICAL
        .into_iter()
        .zip(counts)
        .filter(|(_, count)| *count > 0)
        .map(|(status, count)| StatusCount { status, count })
        .collect()
}

/// One bar of the platform chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlatformCount {
    pub platform: Platform,
    pub applications: usize,
}

/// Applications per platform, most used first; ties sorted by label.
pub fn platform_breakdown(records: &[ApplicationRecord]) -> Vec<PlatformCount> {
    let mut counts: HashMap<&Platform, usize> = HashMap::new();
    for record in records {
        *counts.entry(&record.platform).or_insert(0) += 1;
    }

    let mut breakdown: Vec<PlatformCount> = counts
        .into_iter()
        .map(|(platform, applications)| PlatformCount {
            platform: platform.clone(),
            applications,
        })
        .collect();
    breakdown.sort_by(|a, b| {
        b.applications
            .cmp(&a.applications)
            .then_with(|| a.platform.as_str().cmp(b.platform.as_str()))
    });
    breakdown
}

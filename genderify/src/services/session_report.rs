//! Session-level tally of resolved artists
//!
//! Lives for one run. Each distinct artist name is counted at most once, so
//! artists met again through the cache don't inflate the totals.

use serde::Serialize;
use std::collections::HashSet;

use crate::models::{GenderLabel, ResolutionResult, ResolutionStatus};

/// Running totals for one session
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionReport {
    #[serde(skip)]
    counted: HashSet<String>,
    pub nonbinary: usize,
    pub female: usize,
    pub male: usize,
    pub unknown: usize,
    /// Groups met (their members are tallied individually)
    pub groups: usize,
    /// Artists no source could resolve (also tallied as unknown)
    pub unresolved: usize,
}

impl SessionReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a result; returns false if the artist was already counted
    ///
    /// A group only bumps `groups`. Its members are tallied through their
    /// own results, so a member met both directly and through a group is
    /// counted once.
    pub fn record(&mut self, result: &ResolutionResult) -> bool {
        if result.status == ResolutionStatus::Aborted {
            return false;
        }
        if !self.counted.insert(result.identity.name.clone()) {
            return false;
        }

        if result.is_group {
            self.groups += 1;
            return true;
        }

        if result.status == ResolutionStatus::Unresolved {
            self.unresolved += 1;
        }
        self.tally(result.gender);
        true
    }

    pub fn has_counted(&self, name: &str) -> bool {
        self.counted.contains(name)
    }

    /// Distinct artists counted (persons, groups and unresolved)
    pub fn distinct_artists(&self) -> usize {
        self.counted.len()
    }

    /// Sum of the per-gender buckets
    pub fn total_tallied(&self) -> usize {
        self.nonbinary + self.female + self.male + self.unknown
    }

    pub fn summary_line(&self) -> String {
        let pct = |n: usize| {
            let total = self.total_tallied();
            if total == 0 {
                0.0
            } else {
                n as f64 / total as f64 * 100.0
            }
        };
        format!(
            "{} artists ({} groups, {} unresolved): {} non-binary ({:.0}%), {} female ({:.0}%), {} male ({:.0}%), {} unknown ({:.0}%)",
            self.distinct_artists(),
            self.groups,
            self.unresolved,
            self.nonbinary,
            pct(self.nonbinary),
            self.female,
            pct(self.female),
            self.male,
            pct(self.male),
            self.unknown,
            pct(self.unknown),
        )
    }

    fn tally(&mut self, gender: Option<GenderLabel>) {
        match gender {
            Some(GenderLabel::Nonbinary) => self.nonbinary += 1,
            Some(GenderLabel::Female) => self.female += 1,
            Some(GenderLabel::Male) => self.male += 1,
            None => self.unknown += 1,
        }
    }
}

// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2024 Jonathan Lee
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License version 3
// as published by the Free Software Foundation.
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see https://www.gnu.org/licenses/.

use crate::aggregate::{
    CafeBreakdown, CafeFavoriteRank, CohortDistribution, WeekdayAverage, WeekdayExtreme,
};
use crate::category::{Category, LabelSet, Weekday};
use crate::error::{ErrorDescription, ErrorKind, InsightError, Result};
use crate::records::RankingRow;
use serde::Serialize;
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabeledExtreme {
    pub weekday: Weekday,
    pub label: &'static str,
    pub hour: u8,
    pub predicted_people: f64,
}
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabeledAverage {
    pub weekday: Weekday,
    pub label: &'static str,
    pub mean_people: f64,
}
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CongestionProfile {
    pub busiest: Vec<LabeledExtreme>,
    pub calmest: Vec<LabeledExtreme>,
    pub average: Vec<LabeledAverage>,
    pub weekly_mean: f64,
    pub peak: f64,
}
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DemographicBucketCount {
    pub bucket_label: String,
    pub count: u64,
}
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CohortReport {
    pub cohort: String,
    pub size: usize,
    pub gender: Vec<DemographicBucketCount>,
    pub age: Vec<DemographicBucketCount>,
    pub menu: Vec<DemographicBucketCount>,
}
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CafeDemographics {
    pub name: String,
    pub favorite_count: u64,
    pub buckets: Vec<DemographicBucketCount>,
}
/// Result of one aggregation as handed to the serving layer.
///
/// `NoData` is the canonical empty result: the inputs were valid but nothing
/// matched. `Failed` means the inputs themselves were unusable.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome<T> {
    Ready { data: T },
    NoData { reason: String },
    Failed { error: ErrorDescription },
}
impl<T> Outcome<T> {
    pub fn from_result(result: Result<T>) -> Self {
        match result {
            Ok(data) => Self::Ready { data },
            Err(error) => Self::from_error(&error),
        }
    }
    pub fn from_error(error: &InsightError) -> Self {
        Self::from_description(error.describe())
    }
    pub fn from_description(error: ErrorDescription) -> Self {
        match error.kind {
            ErrorKind::NoData => Self::NoData {
                reason: error.message,
            },
            ErrorKind::BadInput | ErrorKind::Unavailable => Self::Failed { error },
        }
    }
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }
    pub fn data(&self) -> Option<&T> {
        match self {
            Self::Ready { data } => Some(data),
            _ => None,
        }
    }
}
#[derive(Debug, Clone, Copy, Default)]
pub struct ResultFormatter {
    labels: LabelSet,
}
impl ResultFormatter {
    pub fn new(labels: LabelSet) -> Self {
        Self { labels }
    }
    pub fn labels(&self) -> LabelSet {
        self.labels
    }
    pub fn extremes(&self, extremes: &[WeekdayExtreme]) -> Vec<LabeledExtreme> {
        extremes
            .iter()
            .map(|e| LabeledExtreme {
                weekday: e.weekday,
                label: e.weekday.label(self.labels),
                hour: e.hour,
                predicted_people: e.predicted_people,
            })
            .collect()
    }
    pub fn averages(&self, averages: &[WeekdayAverage]) -> Vec<LabeledAverage> {
        averages
            .iter()
            .map(|a| LabeledAverage {
                weekday: a.weekday,
                label: a.weekday.label(self.labels),
                mean_people: a.mean_people,
            })
            .collect()
    }
    pub fn congestion(
        &self,
        busiest: &[WeekdayExtreme],
        calmest: &[WeekdayExtreme],
        averages: &[WeekdayAverage],
        weekly_mean: f64,
        peak: f64,
    ) -> CongestionProfile {
        CongestionProfile {
            busiest: self.extremes(busiest),
            calmest: self.extremes(calmest),
            average: self.averages(averages),
            weekly_mean,
            peak,
        }
    }
    pub fn ranking(&self, ranking: &[CafeFavoriteRank]) -> Vec<RankingRow> {
        ranking.iter().map(RankingRow::from).collect()
    }
    pub fn category_buckets<C: Category>(&self, counts: &[(C, usize)]) -> Vec<DemographicBucketCount> {
        counts
            .iter()
            .map(|(category, count)| DemographicBucketCount {
                bucket_label: category.label(self.labels).to_string(),
                count: *count as u64,
            })
            .collect()
    }
    pub fn cohort(&self, distribution: &CohortDistribution) -> CohortReport {
        CohortReport {
            cohort: distribution.cohort.clone(),
            size: distribution.size,
            gender: self.category_buckets(&distribution.gender),
            age: self.category_buckets(&distribution.age),
            menu: distribution
                .menu
                .iter()
                .map(|(menu, count)| DemographicBucketCount {
                    bucket_label: menu.clone(),
                    count: *count as u64,
                })
                .collect(),
        }
    }
    pub fn cafe_demographics<C: Category>(
        &self,
        breakdowns: &[CafeBreakdown<C>],
    ) -> Vec<CafeDemographics> {
        breakdowns
            .iter()
            .map(|b| CafeDemographics {
                name: b.name.clone(),
                favorite_count: b.favorite_count,
                buckets: self.category_buckets(&b.counts),
            })
            .collect()
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::AgeBucket;
    #[test]
    fn no_data_errors_become_no_data_outcomes() {
        let outcome: Outcome<()> = Outcome::from_error(&InsightError::EmptyCohort {
            cohort: "admirers of café 1".into(),
        });
        assert!(matches!(outcome, Outcome::NoData { .. }));
        let outcome: Outcome<()> = Outcome::from_error(&InsightError::SourceUnavailable {
            url: "http://localhost".into(),
            reason: "HTTP status 500".into(),
        });
        assert!(matches!(
            outcome,
            Outcome::Failed { error } if error.kind == ErrorKind::Unavailable
        ));
    }
    #[test]
    fn age_buckets_are_labelled_in_fixed_order() {
        let formatter = ResultFormatter::new(LabelSet::English);
        let counts: Vec<_> = AgeBucket::ALL.iter().map(|b| (*b, 0usize)).collect();
        let labels: Vec<_> = formatter
            .category_buckets(&counts)
            .into_iter()
            .map(|b| b.bucket_label)
            .collect();
        assert_eq!(
            labels,
            ["Under 20s", "20s", "30s", "40s", "50s", "60s and Above"]
        );
    }
    #[test]
    fn outcome_serialises_with_status_tag() {
        let outcome = Outcome::Ready { data: 3 };
        let json = serde_json::to_string(&outcome).unwrap_or_default();
        assert_eq!(json, r#"{"status":"ready","data":3}"#);
    }
}

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

use crate::aggregate::{self, CafeFavoriteRank, Extremum};
use crate::config::PipelineConfig;
use crate::error::{ConfigError, ErrorDescription, InsightError, Result};
use crate::format::{CafeDemographics, CohortReport, CongestionProfile, Outcome, ResultFormatter};
use crate::join::{self, BoundingBox, Region};
use crate::records::{CafeRecord, FavoriteEdge, OccupancySample, RankingRow, SurveyResponse};
use crate::store::{self, LoadedSources, RecordStore};
use crate::table::Table;
use serde::Serialize;
use tracing::info;
type Attempt<T> = std::result::Result<T, ErrorDescription>;
/// Every aggregation of one run, each with its own outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsightReport {
    pub congestion: Outcome<CongestionProfile>,
    pub ranking: Outcome<Vec<RankingRow>>,
    pub store_names: Outcome<Vec<String>>,
    pub cohort: Outcome<CohortReport>,
    pub regional_gender: Outcome<Vec<CafeDemographics>>,
    pub regional_age: Outcome<Vec<CafeDemographics>>,
}
impl InsightReport {
    pub fn ready_count(&self) -> usize {
        [
            self.congestion.is_ready(),
            self.ranking.is_ready(),
            self.store_names.is_ready(),
            self.cohort.is_ready(),
            self.regional_gender.is_ready(),
            self.regional_age.is_ready(),
        ]
        .into_iter()
        .filter(|ready| *ready)
        .count()
    }
}
pub struct CafePipeline {
    config: PipelineConfig,
    store: RecordStore,
    formatter: ResultFormatter,
}
impl CafePipeline {
    pub fn new(config: PipelineConfig) -> Self {
        let store = RecordStore::new(config.sources.clone());
        let formatter = ResultFormatter::new(config.labels);
        Self {
            config,
            store,
            formatter,
        }
    }
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }
    pub fn store(&self) -> &RecordStore {
        &self.store
    }
    pub fn formatter(&self) -> &ResultFormatter {
        &self.formatter
    }
    /// Busiest and calmest hour per weekday, per-weekday means and the
    /// overall peak of one café's occupancy series.
    pub fn congestion(&self, occupancy: &Table<OccupancySample>) -> Result<CongestionProfile> {
        let samples = occupancy.rows();
        let no_samples = || InsightError::EmptySeries { weekday: None };
        let peak = aggregate::series_peak(samples).ok_or_else(no_samples)?;
        let weekly_mean = aggregate::series_mean(samples).ok_or_else(no_samples)?;
        let policy = self.config.missing_weekday;
        let busiest = aggregate::weekday_extremes(samples, Extremum::Max, policy)?;
        let calmest = aggregate::weekday_extremes(samples, Extremum::Min, policy)?;
        let averages = aggregate::weekday_means(samples);
        Ok(self
            .formatter
            .congestion(&busiest, &calmest, &averages, weekly_mean, peak))
    }
    pub fn ranking(
        &self,
        favorites: &Table<FavoriteEdge>,
        registry: &Table<CafeRecord>,
        region: &Region,
    ) -> Result<Vec<RankingRow>> {
        let ranking = aggregate::regional_ranking(favorites, registry, region);
        if ranking.is_empty() {
            return Err(InsightError::EmptyRanking {
                region: region.describe(),
            });
        }
        Ok(self.formatter.ranking(&ranking))
    }
    /// Registry names inside `bbox`, in registry order.
    pub fn store_names(&self, registry: &Table<CafeRecord>, bbox: &BoundingBox) -> Vec<String> {
        join::filter_by_bounding_box(registry, bbox)
            .iter()
            .map(|cafe| cafe.name.clone())
            .collect()
    }
    pub fn store_cohort_report(
        &self,
        store_id: i64,
        registry: &Table<CafeRecord>,
        favorites: &Table<FavoriteEdge>,
        survey: &Table<SurveyResponse>,
    ) -> Result<CohortReport> {
        let cohort = aggregate::store_cohort(store_id, registry.rows(), favorites.rows())?;
        let distribution = aggregate::cohort_distribution(&cohort, survey.rows())?;
        Ok(self.formatter.cohort(&distribution))
    }
    /// Ranking that drives the per-café demographics: computed from the local
    /// favorites for the configured region, or fetched from the published
    /// endpoint when `remote` is set.
    pub fn resolve_ranking(
        &self,
        favorites: &Table<FavoriteEdge>,
        registry: &Table<CafeRecord>,
        remote: bool,
    ) -> Result<Vec<CafeFavoriteRank>> {
        let ranking = if remote {
            let url = self
                .config
                .ranking
                .url
                .as_deref()
                .ok_or_else(|| ConfigError::InvalidValue {
                    key: "ranking.url".to_string(),
                    value: String::new(),
                })?;
            let published = store::fetch_ranking(url, self.config.ranking.timeout())?;
            aggregate::resolve_published_ranking(published.rows(), registry.rows())
        } else {
            aggregate::regional_ranking(favorites, registry, &self.config.region)
        };
        if ranking.is_empty() {
            let region = if remote {
                "published ranking".to_string()
            } else {
                self.config.region.describe()
            };
            return Err(InsightError::EmptyRanking { region });
        }
        Ok(ranking)
    }
    pub fn regional_gender(
        &self,
        favorites: &Table<FavoriteEdge>,
        survey: &Table<SurveyResponse>,
        ranking: &[CafeFavoriteRank],
    ) -> Result<Vec<CafeDemographics>> {
        let breakdown = aggregate::gender_by_cafe(favorites.rows(), survey.rows(), ranking)?;
        Ok(self.formatter.cafe_demographics(&breakdown))
    }
    pub fn regional_age(
        &self,
        favorites: &Table<FavoriteEdge>,
        survey: &Table<SurveyResponse>,
        ranking: &[CafeFavoriteRank],
    ) -> Result<Vec<CafeDemographics>> {
        let breakdown = aggregate::age_by_cafe(favorites.rows(), survey.rows(), ranking)?;
        Ok(self.formatter.cafe_demographics(&breakdown))
    }
    /// Loads every source and runs every aggregation.
    pub fn report(&self) -> InsightReport {
        let sources = self.store.load_all(self.config.parallel_loads);
        self.report_from(&sources)
    }
    /// Runs every aggregation against already loaded sources. A source that
    /// failed to load fails only the aggregations that read it.
    pub fn report_from(&self, sources: &LoadedSources) -> InsightReport {
        let congestion = settle(available(&sources.occupancy).map(|o| self.congestion(o)));
        let ranking = settle(
            both(&sources.favorites, &sources.registry).map(|(favorites, registry)| {
                self.ranking(favorites, registry, &self.config.region)
            }),
        );
        // Only the demographics read the published ranking when one is configured.
        let regional: Attempt<Vec<CafeFavoriteRank>> =
            both(&sources.favorites, &sources.registry).and_then(|(favorites, registry)| {
                self.resolve_ranking(favorites, registry, self.config.ranking.url.is_some())
                    .map_err(|e| e.describe())
            });
        let store_names = match available(&sources.registry) {
            Ok(registry) => Outcome::Ready {
                data: self.store_names(registry, &self.config.bounding_box),
            },
            Err(error) => Outcome::from_description(error),
        };
        let cohort = settle(
            self.config
                .target_store_id()
                .map_err(|e| InsightError::from(e).describe())
                .and_then(|store_id| {
                    let (registry, favorites) = both(&sources.registry, &sources.favorites)?;
                    let survey = available(&sources.survey)?;
                    Ok(self.store_cohort_report(store_id, registry, favorites, survey))
                }),
        );
        let demographics = |breakdown: fn(
            &Self,
            &Table<FavoriteEdge>,
            &Table<SurveyResponse>,
            &[CafeFavoriteRank],
        ) -> Result<Vec<CafeDemographics>>| {
            settle(regional.as_ref().map_err(Clone::clone).and_then(|ranking| {
                let (favorites, survey) = both(&sources.favorites, &sources.survey)?;
                Ok(breakdown(self, favorites, survey, ranking))
            }))
        };
        let regional_gender = demographics(Self::regional_gender);
        let regional_age = demographics(Self::regional_age);
        let report = InsightReport {
            congestion,
            ranking,
            store_names,
            cohort,
            regional_gender,
            regional_age,
        };
        info!(
            target: "cafe_insight::pipeline",
            ready = report.ready_count(),
            total = 6,
            "Report complete"
        );
        report
    }
}
fn available<R>(source: &Result<Table<R>>) -> Attempt<&Table<R>> {
    source.as_ref().map_err(ErrorDescription::from)
}
fn both<'a, A, B>(
    a: &'a Result<Table<A>>,
    b: &'a Result<Table<B>>,
) -> Attempt<(&'a Table<A>, &'a Table<B>)> {
    Ok((available(a)?, available(b)?))
}
fn settle<T>(attempt: Attempt<Result<T>>) -> Outcome<T> {
    match attempt {
        Ok(result) => Outcome::from_result(result),
        Err(error) => Outcome::from_description(error),
    }
}

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

use crate::category::{AgeBucket, Category, Gender, Weekday};
use crate::error::{InsightError, Result};
use crate::join::{self, Region};
use crate::records::{CafeRecord, FavoriteEdge, OccupancySample, RankingRow, SurveyResponse};
use crate::table::Table;
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::Hash;
use tracing::{debug, warn};
/// Groups rows by key. Groups appear in first-occurrence order and rows keep
/// their input order inside a group.
pub fn group_by<'a, T, K, I, F>(rows: I, key: F) -> IndexMap<K, Vec<&'a T>>
where
    T: 'a,
    I: IntoIterator<Item = &'a T>,
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let mut groups: IndexMap<K, Vec<&'a T>> = IndexMap::new();
    for row in rows {
        groups.entry(key(row)).or_default().push(row);
    }
    groups
}
pub fn count_by<I, K, F>(items: I, key: F) -> IndexMap<K, usize>
where
    I: IntoIterator,
    K: Eq + Hash,
    F: Fn(&I::Item) -> K,
{
    let mut counts: IndexMap<K, usize> = IndexMap::new();
    for item in items {
        *counts.entry(key(&item)).or_insert(0) += 1;
    }
    counts
}
/// Descending by count; equal counts keep first-occurrence order.
pub fn ranked_counts<K: Eq + Hash>(counts: IndexMap<K, usize>) -> Vec<(K, usize)> {
    let mut ranked: Vec<(K, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked
}
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Extremum {
    Max,
    Min,
}
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MissingWeekdayPolicy {
    Abort,
    #[default]
    Skip,
}
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekdayExtreme {
    pub weekday: Weekday,
    pub hour: u8,
    pub predicted_people: f64,
}
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekdayAverage {
    pub weekday: Weekday,
    pub mean_people: f64,
}
fn pick_extreme<'a>(
    samples: &[&'a OccupancySample],
    extremum: Extremum,
) -> Option<&'a OccupancySample> {
    let mut best: Option<&'a OccupancySample> = None;
    for &sample in samples {
        let replace = best.map_or(true, |current| match extremum {
            Extremum::Max => sample.predicted_people > current.predicted_people,
            Extremum::Min => sample.predicted_people < current.predicted_people,
        });
        if replace {
            best = Some(sample);
        }
    }
    best
}
pub fn weekday_extreme(
    samples: &[OccupancySample],
    weekday: Weekday,
    extremum: Extremum,
) -> Result<WeekdayExtreme> {
    let day: Vec<&OccupancySample> = samples.iter().filter(|s| s.weekday == weekday).collect();
    pick_extreme(&day, extremum)
        .map(|s| WeekdayExtreme {
            weekday,
            hour: s.hour,
            predicted_people: s.predicted_people,
        })
        .ok_or(InsightError::EmptySeries { weekday: Some(weekday) })
}
/// One row per weekday in Sunday-first order.
///
/// Ties go to the earliest sample in input order. A weekday without samples
/// either aborts with [`InsightError::EmptySeries`] or is left out, depending
/// on `policy`.
pub fn weekday_extremes(
    samples: &[OccupancySample],
    extremum: Extremum,
    policy: MissingWeekdayPolicy,
) -> Result<Vec<WeekdayExtreme>> {
    let by_day = group_by(samples, |s| s.weekday);
    let mut extremes = Vec::with_capacity(Weekday::ALL.len());
    for &weekday in Weekday::ALL {
        let picked = by_day
            .get(&weekday)
            .and_then(|day| pick_extreme(day, extremum));
        match (picked, policy) {
            (Some(s), _) => extremes.push(WeekdayExtreme {
                weekday,
                hour: s.hour,
                predicted_people: s.predicted_people,
            }),
            (None, MissingWeekdayPolicy::Abort) => {
                return Err(InsightError::EmptySeries {
                    weekday: Some(weekday),
                });
            }
            (None, MissingWeekdayPolicy::Skip) => {
                warn!(target: "cafe_insight::aggregate", ?weekday, ?extremum, "No samples for weekday; skipping");
            }
        }
    }
    Ok(extremes)
}
pub fn weekday_means(samples: &[OccupancySample]) -> Vec<WeekdayAverage> {
    let by_day = group_by(samples, |s| s.weekday);
    Weekday::ALL
        .iter()
        .filter_map(|&weekday| {
            let day = by_day.get(&weekday)?;
            let total: f64 = day.iter().map(|s| s.predicted_people).sum();
            Some(WeekdayAverage {
                weekday,
                mean_people: total / day.len() as f64,
            })
        })
        .collect()
}
pub fn series_peak(samples: &[OccupancySample]) -> Option<f64> {
    samples
        .iter()
        .map(|s| s.predicted_people)
        .fold(None, |peak, v| Some(peak.map_or(v, |p: f64| p.max(v))))
}
/// Mean over every sample regardless of weekday.
pub fn series_mean(samples: &[OccupancySample]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    let total: f64 = samples.iter().map(|s| s.predicted_people).sum();
    Some(total / samples.len() as f64)
}
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CafeFavoriteRank {
    pub store_id: i64,
    pub name: String,
    pub favorite_count: u64,
}
impl From<&CafeFavoriteRank> for RankingRow {
    fn from(rank: &CafeFavoriteRank) -> Self {
        Self {
            name: rank.name.clone(),
            favorite_count: rank.favorite_count,
        }
    }
}
/// Favorite edges per café, edges counted without deduplication.
pub fn favorite_counts(favorites: &[FavoriteEdge]) -> IndexMap<i64, usize> {
    count_by(favorites, |edge| edge.store_id)
}
/// Counts favorites per registered café and ranks them by count.
///
/// Edges pointing at cafés missing from `cafes` are dropped. Equal counts
/// keep the order in which the café first appears among the edges.
pub fn favorite_ranking(favorites: &[FavoriteEdge], cafes: &[CafeRecord]) -> Vec<CafeFavoriteRank> {
    let joined = join::favorites_with_cafes(favorites, cafes);
    let mut groups: IndexMap<i64, CafeFavoriteRank> = IndexMap::new();
    for (edge, cafe) in &joined.rows {
        groups
            .entry(edge.store_id)
            .or_insert_with(|| CafeFavoriteRank {
                store_id: cafe.id,
                name: cafe.name.clone(),
                favorite_count: 0,
            })
            .favorite_count += 1;
    }
    let mut ranking: Vec<CafeFavoriteRank> = groups.into_values().collect();
    ranking.sort_by(|a, b| b.favorite_count.cmp(&a.favorite_count));
    ranking
}
pub fn regional_ranking(
    favorites: &Table<FavoriteEdge>,
    cafes: &Table<CafeRecord>,
    region: &Region,
) -> Vec<CafeFavoriteRank> {
    let regional = region.apply(cafes);
    debug!(
        target: "cafe_insight::aggregate",
        region = %region.describe(),
        cafes = regional.len(),
        "Region filter applied"
    );
    favorite_ranking(favorites.rows(), regional.rows())
}
/// Resolves a published `{name, favorite_count}` ranking to registry ids,
/// keeping the published order.
pub fn resolve_published_ranking(
    ranking: &[RankingRow],
    cafes: &[CafeRecord],
) -> Vec<CafeFavoriteRank> {
    join::ranking_with_cafes(ranking, cafes)
        .rows
        .into_iter()
        .map(|(row, cafe)| CafeFavoriteRank {
            store_id: cafe.id,
            name: row.name.clone(),
            favorite_count: row.favorite_count,
        })
        .collect()
}
/// Distinct user ids relevant to one demographic aggregation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cohort {
    label: String,
    user_ids: IndexSet<i64>,
}
impl Cohort {
    pub fn new(label: impl Into<String>, user_ids: impl IntoIterator<Item = i64>) -> Self {
        Self {
            label: label.into(),
            user_ids: user_ids.into_iter().collect(),
        }
    }
    pub fn admirers_of(store_id: i64, favorites: &[FavoriteEdge]) -> Self {
        Self::new(
            format!("admirers of café {store_id}"),
            favorites
                .iter()
                .filter(|edge| edge.store_id == store_id)
                .map(|edge| edge.user_id),
        )
    }
    pub fn label(&self) -> &str {
        &self.label
    }
    pub fn len(&self) -> usize {
        self.user_ids.len()
    }
    pub fn is_empty(&self) -> bool {
        self.user_ids.is_empty()
    }
    pub fn contains(&self, user_id: i64) -> bool {
        self.user_ids.contains(&user_id)
    }
    /// Survey responses of cohort members, in survey order.
    pub fn responses<'a>(&self, survey: &'a [SurveyResponse]) -> Result<Vec<&'a SurveyResponse>> {
        let matched: Vec<&SurveyResponse> =
            survey.iter().filter(|r| self.contains(r.user_id)).collect();
        if matched.is_empty() {
            return Err(InsightError::EmptyCohort {
                cohort: self.label.clone(),
            });
        }
        debug!(
            target: "cafe_insight::aggregate",
            cohort = %self.label,
            members = self.len(),
            matched = matched.len(),
            unmatched = self.len().saturating_sub(matched.len()),
            "Cohort matched against survey"
        );
        Ok(matched)
    }
}
/// Cohort of users who favorited `store_id`. The café must be registered.
pub fn store_cohort(
    store_id: i64,
    cafes: &[CafeRecord],
    favorites: &[FavoriteEdge],
) -> Result<Cohort> {
    if !cafes.iter().any(|cafe| cafe.id == store_id) {
        return Err(InsightError::UnknownStore { store_id });
    }
    let cohort = Cohort::admirers_of(store_id, favorites);
    if cohort.is_empty() {
        return Err(InsightError::EmptyCohort {
            cohort: cohort.label().to_string(),
        });
    }
    Ok(cohort)
}
/// Every member of `C` in fixed order, zero counts included.
pub fn category_counts<C, F>(responses: &[&SurveyResponse], category_of: F) -> Vec<(C, usize)>
where
    C: Category,
    F: Fn(&SurveyResponse) -> C,
{
    let mut slots = vec![0usize; C::ALL.len()];
    for response in responses {
        slots[category_of(response).index()] += 1;
    }
    C::ALL.iter().copied().zip(slots).collect()
}
pub fn gender_distribution(responses: &[&SurveyResponse]) -> Vec<(Gender, usize)> {
    ranked_counts(count_by(responses, |r| r.gender))
}
pub fn age_distribution(responses: &[&SurveyResponse]) -> Vec<(AgeBucket, usize)> {
    category_counts(responses, |r| AgeBucket::from_age(r.age))
}
pub fn menu_distribution(responses: &[&SurveyResponse]) -> Vec<(String, usize)> {
    ranked_counts(count_by(responses, |r| r.favorite_menu.clone()))
}
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CohortDistribution {
    pub cohort: String,
    pub size: usize,
    pub gender: Vec<(Gender, usize)>,
    pub age: Vec<(AgeBucket, usize)>,
    pub menu: Vec<(String, usize)>,
}
/// Gender, age-band and favorite-menu counts over the cohort's matched
/// survey responses. `size` counts matched responses, not cohort members.
pub fn cohort_distribution(
    cohort: &Cohort,
    survey: &[SurveyResponse],
) -> Result<CohortDistribution> {
    let responses = cohort.responses(survey)?;
    Ok(CohortDistribution {
        cohort: cohort.label().to_string(),
        size: responses.len(),
        gender: gender_distribution(&responses),
        age: age_distribution(&responses),
        menu: menu_distribution(&responses),
    })
}
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CafeBreakdown<C> {
    pub store_id: i64,
    pub name: String,
    pub favorite_count: u64,
    pub counts: Vec<(C, usize)>,
}
/// Two-level group-by (café × category) over favorites⋈survey, joined to
/// `ranking` by café id.
///
/// Ranked cafés without any matched survey response are left out. Rows follow
/// the ranking's order and list every category, zero-filled.
pub fn breakdown_by_cafe<C, F>(
    favorites: &[FavoriteEdge],
    survey: &[SurveyResponse],
    ranking: &[CafeFavoriteRank],
    category_of: F,
) -> Result<Vec<CafeBreakdown<C>>>
where
    C: Category,
    F: Fn(&SurveyResponse) -> C,
{
    let joined = join::favorites_with_survey(favorites, survey);
    let mut counts: HashMap<i64, Vec<usize>> = HashMap::new();
    for (edge, response) in &joined.rows {
        let slots = counts
            .entry(edge.store_id)
            .or_insert_with(|| vec![0; C::ALL.len()]);
        slots[category_of(response).index()] += 1;
    }
    let breakdowns: Vec<CafeBreakdown<C>> = ranking
        .iter()
        .filter_map(|rank| {
            let slots = counts.get(&rank.store_id)?;
            Some(CafeBreakdown {
                store_id: rank.store_id,
                name: rank.name.clone(),
                favorite_count: rank.favorite_count,
                counts: C::ALL.iter().copied().zip(slots.iter().copied()).collect(),
            })
        })
        .collect();
    debug!(
        target: "cafe_insight::aggregate",
        ranked = ranking.len(),
        kept = breakdowns.len(),
        "Per-café breakdown joined to ranking"
    );
    if breakdowns.is_empty() {
        return Err(InsightError::EmptyCohort {
            cohort: "admirers of ranked cafés".to_string(),
        });
    }
    Ok(breakdowns)
}
pub fn gender_by_cafe(
    favorites: &[FavoriteEdge],
    survey: &[SurveyResponse],
    ranking: &[CafeFavoriteRank],
) -> Result<Vec<CafeBreakdown<Gender>>> {
    breakdown_by_cafe(favorites, survey, ranking, |r| r.gender)
}
pub fn age_by_cafe(
    favorites: &[FavoriteEdge],
    survey: &[SurveyResponse],
    ranking: &[CafeFavoriteRank],
) -> Result<Vec<CafeBreakdown<AgeBucket>>> {
    breakdown_by_cafe(favorites, survey, ranking, |r| AgeBucket::from_age(r.age))
}

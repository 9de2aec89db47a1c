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

//! Inner joins and region filters.
//!
//! Every join is an inner join. Rows without a partner on the other side are
//! dropped and counted in [`JoinStats`]. Output order follows the left input;
//! for each left row, matches follow the right input's order.
use crate::records::{CafeRecord, FavoriteEdge, RankingRow, SurveyResponse};
use crate::table::Table;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::Hash;
use tracing::{debug, warn};
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct JoinStats {
    pub left_rows: usize,
    pub right_rows: usize,
    pub matched_rows: usize,
    pub dropped_left: usize,
    pub dropped_right: usize,
}
impl JoinStats {
    pub fn log(&self, relation: &str) {
        debug!(
            target: "cafe_insight::join",
            relation,
            left = self.left_rows,
            right = self.right_rows,
            matched = self.matched_rows,
            dropped_left = self.dropped_left,
            dropped_right = self.dropped_right,
            "Inner join complete"
        );
    }
}
#[derive(Debug, Clone)]
pub struct Joined<L, R> {
    pub rows: Vec<(L, R)>,
    pub stats: JoinStats,
}
impl<L, R> Joined<L, R> {
    pub fn len(&self) -> usize {
        self.rows.len()
    }
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
pub fn inner_join<'l, 'r, L, R, K, FL, FR>(
    left: &'l [L],
    right: &'r [R],
    left_key: FL,
    right_key: FR,
) -> Joined<&'l L, &'r R>
where
    K: Eq + Hash,
    FL: Fn(&L) -> K,
    FR: Fn(&R) -> K,
{
    let mut index: HashMap<K, Vec<usize>> = HashMap::with_capacity(right.len());
    for (position, row) in right.iter().enumerate() {
        index.entry(right_key(row)).or_default().push(position);
    }
    let mut right_matched = vec![false; right.len()];
    let mut rows = Vec::new();
    let mut dropped_left = 0;
    for row in left {
        match index.get(&left_key(row)) {
            Some(positions) => {
                for &position in positions {
                    right_matched[position] = true;
                    rows.push((row, &right[position]));
                }
            }
            None => dropped_left += 1,
        }
    }
    let stats = JoinStats {
        left_rows: left.len(),
        right_rows: right.len(),
        matched_rows: rows.len(),
        dropped_left,
        dropped_right: right_matched.iter().filter(|m| !**m).count(),
    };
    Joined { rows, stats }
}
pub fn favorites_with_cafes<'a>(
    favorites: &'a [FavoriteEdge],
    cafes: &'a [CafeRecord],
) -> Joined<&'a FavoriteEdge, &'a CafeRecord> {
    let joined = inner_join(favorites, cafes, |f| f.store_id, |c| c.id);
    joined.stats.log("favorites⋈registry");
    joined
}
pub fn favorites_with_survey<'a>(
    favorites: &'a [FavoriteEdge],
    survey: &'a [SurveyResponse],
) -> Joined<&'a FavoriteEdge, &'a SurveyResponse> {
    let joined = inner_join(favorites, survey, |f| f.user_id, |s| s.user_id);
    joined.stats.log("favorites⋈survey");
    joined
}
/// Join key normalisation for name-based matching: trim and lowercase only.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}
/// Matches an externally published ranking to registry entries by
/// normalised name. A name shared by several registry rows matches all of
/// them.
pub fn ranking_with_cafes<'a>(
    ranking: &'a [RankingRow],
    cafes: &'a [CafeRecord],
) -> Joined<&'a RankingRow, &'a CafeRecord> {
    let joined = inner_join(
        ranking,
        cafes,
        |r| normalize_name(&r.name),
        |c| normalize_name(&c.name),
    );
    joined.stats.log("ranking⋈registry");
    if joined.stats.dropped_left > 0 {
        warn!(
            target: "cafe_insight::join",
            dropped = joined.stats.dropped_left,
            "Ranking names without a registry match were dropped"
        );
    }
    joined
}
pub fn matches_address(address: &str, needle: &str, case_insensitive: bool) -> bool {
    if case_insensitive {
        address.to_lowercase().contains(&needle.to_lowercase())
    } else {
        address.contains(needle)
    }
}
pub fn filter_by_address_substring(
    cafes: &Table<CafeRecord>,
    needle: &str,
    case_insensitive: bool,
) -> Table<CafeRecord> {
    cafes.filter(|cafe| matches_address(&cafe.address, needle, case_insensitive))
}
/// Latitude range is closed, longitude range is half-open: `[lon_min, lon_max)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}
impl BoundingBox {
    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        latitude >= self.lat_min
            && latitude <= self.lat_max
            && longitude >= self.lon_min
            && longitude < self.lon_max
    }
}
impl Default for BoundingBox {
    fn default() -> Self {
        Self {
            lat_min: 37.6,
            lat_max: 37.7,
            lon_min: 126.8,
            lon_max: 126.9,
        }
    }
}
pub fn filter_by_bounding_box(cafes: &Table<CafeRecord>, bbox: &BoundingBox) -> Table<CafeRecord> {
    cafes.filter(|cafe| bbox.contains(cafe.latitude, cafe.longitude))
}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Region {
    Address { needle: String },
    BoundingBox(BoundingBox),
}
impl Region {
    pub fn address(needle: impl Into<String>) -> Self {
        Self::Address {
            needle: needle.into(),
        }
    }
    pub fn apply(&self, cafes: &Table<CafeRecord>) -> Table<CafeRecord> {
        match self {
            Self::Address { needle } => filter_by_address_substring(cafes, needle, true),
            Self::BoundingBox(bbox) => filter_by_bounding_box(cafes, bbox),
        }
    }
    pub fn describe(&self) -> String {
        match self {
            Self::Address { needle } => format!("address contains '{needle}'"),
            Self::BoundingBox(b) => format!(
                "lat [{}, {}] lon [{}, {})",
                b.lat_min, b.lat_max, b.lon_min, b.lon_max
            ),
        }
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn duplicate_right_keys_fan_out_in_right_order() {
        let left = [1, 2];
        let right = [(1, "a"), (3, "x"), (1, "b")];
        let joined = inner_join(&left, &right, |l| *l, |r| r.0);
        let names: Vec<_> = joined.rows.iter().map(|(_, r)| r.1).collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(joined.stats.dropped_left, 1);
        assert_eq!(joined.stats.dropped_right, 1);
    }
    #[test]
    fn case_sensitive_address_match_respects_case() {
        assert!(matches_address("Seoul Mapo-gu", "mapo", true));
        assert!(!matches_address("Seoul Mapo-gu", "mapo", false));
    }
}

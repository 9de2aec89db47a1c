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

use crate::aggregate::MissingWeekdayPolicy;
use crate::category::LabelSet;
use crate::error::ConfigError;
use crate::join::{BoundingBox, Region};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::info;
pub const ENV_OCCUPANCY_PATH: &str = "CAFE_OCCUPANCY_PATH";
pub const ENV_FAVORITES_PATH: &str = "CAFE_FAVORITES_PATH";
pub const ENV_REGISTRY_PATH: &str = "CAFE_REGISTRY_PATH";
pub const ENV_SURVEY_PATH: &str = "CAFE_SURVEY_PATH";
pub const ENV_TARGET_STORE_ID: &str = "CAFE_TARGET_STORE_ID";
pub const ENV_REGION: &str = "CAFE_REGION";
pub const ENV_RANKING_URL: &str = "CAFE_RANKING_URL";
pub const ENV_PARALLEL_LOADS: &str = "CAFE_PARALLEL_LOADS";
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcePaths {
    pub occupancy: PathBuf,
    pub favorites: PathBuf,
    pub registry: PathBuf,
    pub survey: PathBuf,
}
impl Default for SourcePaths {
    fn default() -> Self {
        Self {
            occupancy: PathBuf::from("291.csv"),
            favorites: PathBuf::from("store_favorite.csv"),
            registry: PathBuf::from("store.csv"),
            survey: PathBuf::from("survey.csv"),
        }
    }
}
impl SourcePaths {
    /// Resolves relative paths against `base`.
    pub fn relative_to(self, base: &Path) -> Self {
        let resolve = |p: PathBuf| if p.is_relative() { base.join(p) } else { p };
        Self {
            occupancy: resolve(self.occupancy),
            favorites: resolve(self.favorites),
            registry: resolve(self.registry),
            survey: resolve(self.survey),
        }
    }
}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    /// Published ranking endpoint; the ranking is computed locally when unset.
    pub url: Option<String>,
    pub timeout_secs: u64,
}
impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout_secs: 10,
        }
    }
}
impl RankingConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub sources: SourcePaths,
    pub target_store_id: Option<i64>,
    pub region: Region,
    pub bounding_box: BoundingBox,
    pub ranking: RankingConfig,
    pub missing_weekday: MissingWeekdayPolicy,
    pub labels: LabelSet,
    pub parallel_loads: bool,
}
impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sources: SourcePaths::default(),
            target_store_id: None,
            region: Region::address("경기도"),
            bounding_box: BoundingBox::default(),
            ranking: RankingConfig::default(),
            missing_weekday: MissingWeekdayPolicy::default(),
            labels: LabelSet::default(),
            parallel_loads: false,
        }
    }
}
impl PipelineConfig {
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }
    /// Defaults, then the optional file, then `CAFE_*` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => {
                info!(target: "cafe_insight::config", path = %path.display(), "Loading configuration file");
                Self::load_from_file(path)?
            }
            None => Self::default(),
        };
        config.with_env()
    }
    pub fn with_env(self) -> Result<Self, ConfigError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(ENV_OCCUPANCY_PATH) {
            self.sources.occupancy = PathBuf::from(path);
        }
        if let Some(path) = lookup(ENV_FAVORITES_PATH) {
            self.sources.favorites = PathBuf::from(path);
        }
        if let Some(path) = lookup(ENV_REGISTRY_PATH) {
            self.sources.registry = PathBuf::from(path);
        }
        if let Some(path) = lookup(ENV_SURVEY_PATH) {
            self.sources.survey = PathBuf::from(path);
        }
        if let Some(raw) = lookup(ENV_TARGET_STORE_ID) {
            self.target_store_id = Some(parse_value(ENV_TARGET_STORE_ID, &raw)?);
        }
        if let Some(needle) = lookup(ENV_REGION) {
            self.region = Region::address(needle);
        }
        if let Some(url) = lookup(ENV_RANKING_URL) {
            self.ranking.url = Some(url.trim_end_matches('/').to_string()).filter(|u| !u.is_empty());
        }
        if let Some(raw) = lookup(ENV_PARALLEL_LOADS) {
            self.parallel_loads = parse_value(ENV_PARALLEL_LOADS, &raw)?;
        }
        Ok(self)
    }
    /// Explicit target café, or the numeric stem of the occupancy file
    /// (`291.csv` → 291).
    pub fn target_store_id(&self) -> Result<i64, ConfigError> {
        if let Some(id) = self.target_store_id {
            return Ok(id);
        }
        self.sources
            .occupancy
            .file_stem()
            .and_then(|stem| stem.to_str())
            .and_then(|stem| stem.parse::<i64>().ok())
            .ok_or_else(|| ConfigError::MissingTargetStore {
                path: self.sources.occupancy.display().to_string(),
            })
    }
}
fn parse_value<T: FromStr>(key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: raw.to_string(),
    })
}
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }
    #[test]
    fn target_store_derives_from_occupancy_stem() {
        let config = PipelineConfig::default();
        assert_eq!(config.target_store_id().ok(), Some(291));
    }
    #[test]
    fn explicit_target_store_wins() {
        let config = PipelineConfig {
            target_store_id: Some(7),
            ..PipelineConfig::default()
        };
        assert_eq!(config.target_store_id().ok(), Some(7));
    }
    #[test]
    fn non_numeric_stem_without_target_is_an_error() {
        let mut config = PipelineConfig::default();
        config.sources.occupancy = PathBuf::from("occupancy.csv");
        assert!(matches!(
            config.target_store_id(),
            Err(ConfigError::MissingTargetStore { .. })
        ));
    }
    #[test]
    fn overrides_replace_file_values() {
        let config = PipelineConfig::default()
            .with_overrides(lookup(&[
                (ENV_SURVEY_PATH, "/data/survey.csv"),
                (ENV_REGION, "서울"),
                (ENV_RANKING_URL, "http://ranking.local/"),
                (ENV_PARALLEL_LOADS, "true"),
            ]))
            .expect("valid overrides");
        assert_eq!(config.sources.survey, PathBuf::from("/data/survey.csv"));
        assert_eq!(config.region, Region::address("서울"));
        assert_eq!(config.ranking.url.as_deref(), Some("http://ranking.local"));
        assert!(config.parallel_loads);
    }
    #[test]
    fn invalid_override_is_reported_with_its_key() {
        let result =
            PipelineConfig::default().with_overrides(lookup(&[(ENV_TARGET_STORE_ID, "abc")]));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { key, .. }) if key == ENV_TARGET_STORE_ID
        ));
    }
    #[test]
    fn toml_file_fills_missing_fields_with_defaults() {
        let parsed: PipelineConfig = toml::from_str(
            r#"
            target_store_id = 12
            missing_weekday = "abort"
            [sources]
            survey = "responses.csv"
            [region]
            kind = "bounding_box"
            lat_min = 37.5
            lat_max = 37.6
            lon_min = 126.9
            lon_max = 127.0
            "#,
        )
        .expect("valid toml");
        assert_eq!(parsed.target_store_id, Some(12));
        assert_eq!(parsed.missing_weekday, MissingWeekdayPolicy::Abort);
        assert_eq!(parsed.sources.survey, PathBuf::from("responses.csv"));
        assert_eq!(parsed.sources.registry, PathBuf::from("store.csv"));
        assert!(matches!(parsed.region, Region::BoundingBox(b) if b.lat_min == 37.5));
    }
}

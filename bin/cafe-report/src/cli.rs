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

use cafe_insight::{BoundingBox, ConfigError, LabelSet, PipelineConfig, Region};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
#[derive(Parser, Debug)]
#[command(
    name = "cafe-report",
    version,
    about = "Congestion, favorite ranking and demographic aggregations over café data"
)]
pub struct Args {
    #[arg(long = "config", help = "TOML configuration file (CAFE_* variables override it)")]
    pub config: Option<PathBuf>,
    #[arg(long = "occupancy", help = "Occupancy CSV of the target café")]
    pub occupancy: Option<PathBuf>,
    #[arg(long = "favorites", help = "Favorites CSV (user_id, store_id)")]
    pub favorites: Option<PathBuf>,
    #[arg(long = "registry", help = "Café registry CSV")]
    pub registry: Option<PathBuf>,
    #[arg(long = "survey", help = "Survey responses CSV")]
    pub survey: Option<PathBuf>,
    #[arg(long = "labels", value_enum, help = "Label set used for weekdays and buckets")]
    pub labels: Option<LabelArg>,
    #[arg(
        long = "parallel",
        default_value_t = false,
        help = "Load the four sources concurrently"
    )]
    pub parallel: bool,
    #[command(subcommand)]
    pub command: Command,
}
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Busiest and calmest hour per weekday plus weekday means.
    Congestion,
    /// Favorite ranking of cafés whose address contains the region needle.
    Ranking {
        #[arg(long = "region", help = "Address substring, matched case-insensitively")]
        region: Option<String>,
    },
    /// Favorite ranking of cafés inside a bounding box.
    RankingBox(BoxArgs),
    /// Names of registered cafés inside the bounding box.
    StoreNames(BoxArgs),
    /// Gender, age and menu distribution of one café's admirers.
    Cohort {
        #[arg(long = "store", help = "Café id (defaults to the occupancy file stem)")]
        store: Option<i64>,
    },
    /// Per-café gender and age counts over the regional ranking.
    Regional {
        #[arg(long = "region", help = "Address substring, matched case-insensitively")]
        region: Option<String>,
        #[arg(
            long = "remote",
            default_value_t = false,
            help = "Use the published ranking instead of computing it locally"
        )]
        remote: bool,
        #[arg(long = "ranking-url", help = "Published ranking endpoint")]
        ranking_url: Option<String>,
    },
    /// Every aggregation, each with its own outcome.
    Report,
}
#[derive(ClapArgs, Debug, Clone, Default)]
pub struct BoxArgs {
    #[arg(long = "lat-min")]
    pub lat_min: Option<f64>,
    #[arg(long = "lat-max")]
    pub lat_max: Option<f64>,
    #[arg(long = "lon-min")]
    pub lon_min: Option<f64>,
    #[arg(long = "lon-max")]
    pub lon_max: Option<f64>,
}
impl BoxArgs {
    pub fn over(&self, base: BoundingBox) -> BoundingBox {
        BoundingBox {
            lat_min: self.lat_min.unwrap_or(base.lat_min),
            lat_max: self.lat_max.unwrap_or(base.lat_max),
            lon_min: self.lon_min.unwrap_or(base.lon_min),
            lon_max: self.lon_max.unwrap_or(base.lon_max),
        }
    }
}
#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum LabelArg {
    English,
    Short,
    Korean,
}
impl From<LabelArg> for LabelSet {
    fn from(arg: LabelArg) -> Self {
        match arg {
            LabelArg::English => Self::English,
            LabelArg::Short => Self::Short,
            LabelArg::Korean => Self::Korean,
        }
    }
}
impl Args {
    /// Defaults, then the config file, then the environment, then flags.
    pub fn pipeline_config(&self) -> Result<PipelineConfig, ConfigError> {
        let mut config = PipelineConfig::load(self.config.as_deref())?;
        if let Some(path) = &self.occupancy {
            config.sources.occupancy = path.clone();
        }
        if let Some(path) = &self.favorites {
            config.sources.favorites = path.clone();
        }
        if let Some(path) = &self.registry {
            config.sources.registry = path.clone();
        }
        if let Some(path) = &self.survey {
            config.sources.survey = path.clone();
        }
        if let Some(labels) = self.labels {
            config.labels = labels.into();
        }
        if self.parallel {
            config.parallel_loads = true;
        }
        match &self.command {
            Command::Ranking { region: Some(needle) } => config.region = Region::address(needle),
            Command::RankingBox(bbox) => {
                config.region = Region::BoundingBox(bbox.over(config.bounding_box));
            }
            Command::StoreNames(bbox) => config.bounding_box = bbox.over(config.bounding_box),
            Command::Cohort { store: Some(id) } => config.target_store_id = Some(*id),
            Command::Regional {
                region,
                ranking_url,
                ..
            } => {
                if let Some(needle) = region {
                    config.region = Region::address(needle);
                }
                if let Some(url) = ranking_url {
                    config.ranking.url = Some(url.clone());
                }
            }
            _ => {}
        }
        Ok(config)
    }
}

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

pub mod aggregate;
pub mod category;
pub mod config;
pub mod error;
pub mod format;
pub mod join;
pub mod pipeline;
pub mod records;
pub mod store;
pub mod table;
pub use aggregate::{
    CafeBreakdown, CafeFavoriteRank, Cohort, CohortDistribution, Extremum, MissingWeekdayPolicy,
};
pub use category::{AgeBucket, Category, Gender, LabelSet, Weekday};
pub use config::{PipelineConfig, RankingConfig, SourcePaths};
pub use error::{ConfigError, ErrorDescription, ErrorKind, InsightError, Result, SchemaError};
pub use format::{
    CafeDemographics, CohortReport, CongestionProfile, DemographicBucketCount, Outcome,
    ResultFormatter,
};
pub use join::{BoundingBox, JoinStats, Region};
pub use pipeline::{CafePipeline, InsightReport};
pub use records::{CafeRecord, FavoriteEdge, OccupancySample, RankingRow, Record, SurveyResponse};
pub use store::{CsvReader, LoadedSources, RecordStore, SourceTables};
pub use table::{Table, TableMetadata};

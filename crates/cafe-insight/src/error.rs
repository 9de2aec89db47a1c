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

use crate::category::Weekday;
use serde::{Deserialize, Serialize};
use thiserror::Error;
#[derive(Error, Debug)]
pub enum InsightError {
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),
    #[error("Source '{url}' unavailable: {reason}")]
    SourceUnavailable { url: String, reason: String },
    #[error("No occupancy samples recorded{}", weekday_suffix(.weekday))]
    EmptySeries { weekday: Option<Weekday> },
    #[error("Cohort '{cohort}' has no matching survey responses")]
    EmptyCohort { cohort: String },
    #[error("No favorited cafés found in region '{region}'")]
    EmptyRanking { region: String },
    #[error("Café {store_id} is not present in the registry")]
    UnknownStore { store_id: i64 },
    #[error("Failed to read source file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("'{source_name}' is missing required column '{column}'")]
    MissingColumn { source_name: String, column: String },
    #[error("'{source_name}' row {row}, column '{column}': expected {expected}, found '{value}'")]
    InvalidValue {
        source_name: String,
        row: usize,
        column: String,
        value: String,
        expected: &'static str,
    },
    #[error("'{source_name}' row {row}: duplicate key {key}")]
    DuplicateKey {
        source_name: String,
        row: usize,
        key: String,
    },
    #[error("'{source_name}' is malformed: {reason}")]
    Malformed { source_name: String, reason: String },
}
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse configuration file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },
    #[error("No target café configured and none derivable from '{path}'")]
    MissingTargetStore { path: String },
}
/// Coarse classification used at the boundary to tell bad input apart from
/// a valid request that simply has nothing to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    BadInput,
    Unavailable,
    NoData,
}
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDescription {
    pub kind: ErrorKind,
    pub message: String,
}
impl InsightError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Schema(_) | Self::Io { .. } | Self::Config(_) => ErrorKind::BadInput,
            Self::SourceUnavailable { .. } => ErrorKind::Unavailable,
            Self::EmptySeries { .. }
            | Self::EmptyCohort { .. }
            | Self::EmptyRanking { .. }
            | Self::UnknownStore { .. } => ErrorKind::NoData,
        }
    }
    pub fn describe(&self) -> ErrorDescription {
        ErrorDescription {
            kind: self.kind(),
            message: self.to_string(),
        }
    }
}
impl From<&InsightError> for ErrorDescription {
    fn from(error: &InsightError) -> Self {
        error.describe()
    }
}
fn weekday_suffix(weekday: &Option<Weekday>) -> String {
    weekday.map(|day| format!(" for {day:?}")).unwrap_or_default()
}
pub type Result<T> = std::result::Result<T, InsightError>;

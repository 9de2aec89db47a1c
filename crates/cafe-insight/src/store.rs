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

use crate::config::SourcePaths;
use crate::error::{InsightError, Result, SchemaError};
use crate::records::{
    CafeRecord, FavoriteEdge, OccupancySample, RankingRow, Record, SurveyResponse,
};
use crate::table::Table;
use csv::StringRecord;
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};
const BYTE_ORDER_MARK: char = '\u{feff}';
/// Typed view over one CSV data row.
#[derive(Debug)]
pub struct RowReader<'a> {
    source_name: &'static str,
    row: usize,
    record: &'a StringRecord,
    positions: &'a HashMap<&'static str, usize>,
}
impl<'a> RowReader<'a> {
    pub fn new(
        source_name: &'static str,
        row: usize,
        record: &'a StringRecord,
        positions: &'a HashMap<&'static str, usize>,
    ) -> Self {
        Self {
            source_name,
            row,
            record,
            positions,
        }
    }
    pub fn text(&self, column: &str) -> std::result::Result<&'a str, SchemaError> {
        let position = self
            .positions
            .get(column)
            .ok_or_else(|| SchemaError::MissingColumn {
                source_name: self.source_name.to_string(),
                column: column.to_string(),
            })?;
        Ok(self.record.get(*position).map_or("", str::trim))
    }
    pub fn parse_with<T, F>(
        &self,
        column: &str,
        expected: &'static str,
        parse: F,
    ) -> std::result::Result<T, SchemaError>
    where
        F: FnOnce(&str) -> Option<T>,
    {
        let raw = self.text(column)?;
        parse(raw).ok_or_else(|| SchemaError::InvalidValue {
            source_name: self.source_name.to_string(),
            row: self.row,
            column: column.to_string(),
            value: raw.to_string(),
            expected,
        })
    }
    pub fn integer(&self, column: &str) -> std::result::Result<i64, SchemaError> {
        self.parse_with(column, "an integer", |raw| raw.parse::<i64>().ok())
    }
    pub fn coordinate(&self, column: &str) -> std::result::Result<f64, SchemaError> {
        self.parse_with(column, "a numeric coordinate", |raw| {
            raw.parse::<f64>().ok().filter(|v| v.is_finite())
        })
    }
}
#[derive(Debug, Clone)]
pub struct CsvReader {
    delimiter: u8,
}
impl CsvReader {
    pub fn new() -> Self {
        Self { delimiter: b',' }
    }
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }
    pub fn read_file<R: Record>(&self, path: &Path) -> Result<Table<R>> {
        let file = File::open(path).map_err(|source| InsightError::Io {
            path: path.display().to_string(),
            source,
        })?;
        self.read_from(file, Some(path))
    }
    pub fn read_from<R, T>(&self, input: T, path: Option<&Path>) -> Result<Table<R>>
    where
        R: Record,
        T: Read,
    {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .trim(csv::Trim::All)
            .from_reader(input);
        let headers = reader
            .headers()
            .map_err(|e| csv_failure(R::SOURCE, path, e))?
            .clone();
        let positions = resolve_columns::<R>(&headers)?;
        let mut rows = Vec::new();
        let mut seen = HashSet::new();
        for (index, record) in reader.records().enumerate() {
            let record = record.map_err(|e| csv_failure(R::SOURCE, path, e))?;
            let view = RowReader::new(R::SOURCE, index + 1, &record, &positions);
            let parsed = R::from_row(&view)?;
            if let Some(key) = parsed.unique_key() {
                if !seen.insert(key.clone()) {
                    return Err(SchemaError::DuplicateKey {
                        source_name: R::SOURCE.to_string(),
                        row: index + 1,
                        key,
                    }
                    .into());
                }
            }
            rows.push(parsed);
        }
        info!(
            target: "cafe_insight::store",
            source = R::SOURCE,
            rows = rows.len(),
            path = ?path,
            "Loaded source table"
        );
        Ok(Table::with_source(R::SOURCE, rows, path))
    }
}
impl Default for CsvReader {
    fn default() -> Self {
        Self::new()
    }
}
fn resolve_columns<R: Record>(
    headers: &StringRecord,
) -> std::result::Result<HashMap<&'static str, usize>, SchemaError> {
    let normalized: Vec<String> = headers
        .iter()
        .map(|h| h.trim_start_matches(BYTE_ORDER_MARK).trim().to_string())
        .collect();
    R::COLUMNS
        .iter()
        .map(|&column| {
            normalized
                .iter()
                .position(|h| h == column)
                .map(|position| (column, position))
                .ok_or_else(|| SchemaError::MissingColumn {
                    source_name: R::SOURCE.to_string(),
                    column: column.to_string(),
                })
        })
        .collect()
}
fn csv_failure(source_name: &str, path: Option<&Path>, error: csv::Error) -> InsightError {
    let reason = error.to_string();
    match error.into_kind() {
        csv::ErrorKind::Io(source) => InsightError::Io {
            path: path.map_or_else(|| source_name.to_string(), |p| p.display().to_string()),
            source,
        },
        _ => SchemaError::Malformed {
            source_name: source_name.to_string(),
            reason,
        }
        .into(),
    }
}
/// Per-source load outcomes. A failed source only affects the aggregations
/// that read it.
#[derive(Debug)]
pub struct LoadedSources {
    pub occupancy: Result<Table<OccupancySample>>,
    pub registry: Result<Table<CafeRecord>>,
    pub favorites: Result<Table<FavoriteEdge>>,
    pub survey: Result<Table<SurveyResponse>>,
}
#[derive(Debug, Clone)]
pub struct SourceTables {
    pub occupancy: Table<OccupancySample>,
    pub registry: Table<CafeRecord>,
    pub favorites: Table<FavoriteEdge>,
    pub survey: Table<SurveyResponse>,
}
impl LoadedSources {
    /// Fails on the first source that did not load.
    pub fn into_tables(self) -> Result<SourceTables> {
        Ok(SourceTables {
            occupancy: self.occupancy?,
            registry: self.registry?,
            favorites: self.favorites?,
            survey: self.survey?,
        })
    }
}
#[derive(Debug, Clone)]
pub struct RecordStore {
    paths: SourcePaths,
    reader: CsvReader,
}
impl RecordStore {
    pub fn new(paths: SourcePaths) -> Self {
        Self {
            paths,
            reader: CsvReader::new(),
        }
    }
    pub fn occupancy(&self) -> Result<Table<OccupancySample>> {
        self.reader.read_file(&self.paths.occupancy)
    }
    pub fn registry(&self) -> Result<Table<CafeRecord>> {
        self.reader.read_file(&self.paths.registry)
    }
    pub fn favorites(&self) -> Result<Table<FavoriteEdge>> {
        self.reader.read_file(&self.paths.favorites)
    }
    pub fn survey(&self) -> Result<Table<SurveyResponse>> {
        self.reader.read_file(&self.paths.survey)
    }
    pub fn load_all(&self, parallel: bool) -> LoadedSources {
        if parallel {
            let ((occupancy, registry), (favorites, survey)) = rayon::join(
                || rayon::join(|| self.occupancy(), || self.registry()),
                || rayon::join(|| self.favorites(), || self.survey()),
            );
            LoadedSources {
                occupancy,
                registry,
                favorites,
                survey,
            }
        } else {
            LoadedSources {
                occupancy: self.occupancy(),
                registry: self.registry(),
                favorites: self.favorites(),
                survey: self.survey(),
            }
        }
    }
}
/// Fetches a published ranking with a single synchronous attempt.
pub fn fetch_ranking(url: &str, timeout: Duration) -> Result<Table<RankingRow>> {
    let unavailable = |reason: String| InsightError::SourceUnavailable {
        url: url.to_string(),
        reason,
    };
    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| unavailable(e.to_string()))?;
    let response = client
        .get(url)
        .send()
        .map_err(|e| unavailable(e.to_string()))?;
    let status = response.status();
    if !status.is_success() {
        return Err(unavailable(format!("HTTP status {status}")));
    }
    let rows: Vec<RankingRow> = response.json().map_err(|e| SchemaError::Malformed {
        source_name: "ranking".to_string(),
        reason: e.to_string(),
    })?;
    debug!(target: "cafe_insight::store", %url, rows = rows.len(), "Fetched published ranking");
    Ok(Table::new("ranking", rows))
}

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

use crate::category::{Gender, Weekday};
use crate::error::SchemaError;
use crate::store::RowReader;
use serde::{Deserialize, Serialize};
/// A typed row of one flat source.
///
/// `COLUMNS` lists the headers that must be present; extra headers are
/// ignored. Rows with a `unique_key` are checked for duplicates at load time.
pub trait Record: Sized + Send + Sync {
    const SOURCE: &'static str;
    const COLUMNS: &'static [&'static str];
    fn from_row(row: &RowReader<'_>) -> Result<Self, SchemaError>;
    fn unique_key(&self) -> Option<String> {
        None
    }
}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OccupancySample {
    pub weekday: Weekday,
    pub hour: u8,
    pub predicted_people: f64,
}
impl Record for OccupancySample {
    const SOURCE: &'static str = "occupancy";
    const COLUMNS: &'static [&'static str] = &["weekday", "hour", "predicted_people"];
    fn from_row(row: &RowReader<'_>) -> Result<Self, SchemaError> {
        let weekday = row.parse_with("weekday", "a weekday name", Weekday::parse)?;
        let hour = row.parse_with("hour", "an hour between 0 and 23", |raw| {
            raw.parse::<u8>().ok().filter(|h| *h < 24)
        })?;
        let predicted_people = row.parse_with("predicted_people", "a non-negative number", |raw| {
            raw.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite() && *v >= 0.0)
        })?;
        Ok(Self {
            weekday,
            hour,
            predicted_people,
        })
    }
    fn unique_key(&self) -> Option<String> {
        Some(format!("({:?}, {})", self.weekday, self.hour))
    }
}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CafeRecord {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
}
impl Record for CafeRecord {
    const SOURCE: &'static str = "registry";
    const COLUMNS: &'static [&'static str] = &["id", "name", "address", "latitude", "longitude"];
    fn from_row(row: &RowReader<'_>) -> Result<Self, SchemaError> {
        Ok(Self {
            id: row.integer("id")?,
            name: row.text("name")?.to_string(),
            address: row.text("address")?.to_string(),
            latitude: row.coordinate("latitude")?,
            longitude: row.coordinate("longitude")?,
        })
    }
    fn unique_key(&self) -> Option<String> {
        Some(format!("id {}", self.id))
    }
}
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FavoriteEdge {
    pub user_id: i64,
    pub store_id: i64,
}
impl Record for FavoriteEdge {
    const SOURCE: &'static str = "favorites";
    const COLUMNS: &'static [&'static str] = &["user_id", "store_id"];
    fn from_row(row: &RowReader<'_>) -> Result<Self, SchemaError> {
        Ok(Self {
            user_id: row.integer("user_id")?,
            store_id: row.integer("store_id")?,
        })
    }
}
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurveyResponse {
    pub user_id: i64,
    pub gender: Gender,
    pub age: u32,
    pub favorite_menu: String,
}
impl Record for SurveyResponse {
    const SOURCE: &'static str = "survey";
    const COLUMNS: &'static [&'static str] = &["user_id", "gender", "age", "favorite_menu"];
    fn from_row(row: &RowReader<'_>) -> Result<Self, SchemaError> {
        Ok(Self {
            user_id: row.integer("user_id")?,
            gender: row.parse_with("gender", "a gender code (M/F)", Gender::parse)?,
            age: row.parse_with("age", "a non-negative integer age", |raw| {
                raw.parse::<u32>().ok()
            })?,
            favorite_menu: row.text("favorite_menu")?.to_string(),
        })
    }
    fn unique_key(&self) -> Option<String> {
        Some(format!("user_id {}", self.user_id))
    }
}
/// Published ranking entry; also the wire format of the remote ranking source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingRow {
    pub name: String,
    pub favorite_count: u64,
}

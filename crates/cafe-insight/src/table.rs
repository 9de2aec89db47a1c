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

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
#[derive(Debug, Clone, Serialize)]
pub struct TableMetadata {
    pub name: String,
    pub row_count: usize,
    pub loaded_at: DateTime<Utc>,
    pub source_path: Option<PathBuf>,
}
/// Immutable snapshot of one typed source. Cloning shares the row storage.
#[derive(Debug, Clone)]
pub struct Table<R> {
    rows: Arc<[R]>,
    metadata: TableMetadata,
}
impl<R> Table<R> {
    pub fn new(name: impl Into<String>, rows: Vec<R>) -> Self {
        Self::with_source(name, rows, None)
    }
    pub fn with_source(name: impl Into<String>, rows: Vec<R>, source_path: Option<&Path>) -> Self {
        let metadata = TableMetadata {
            name: name.into(),
            row_count: rows.len(),
            loaded_at: Utc::now(),
            source_path: source_path.map(Path::to_path_buf),
        };
        Self {
            rows: rows.into(),
            metadata,
        }
    }
    pub fn rows(&self) -> &[R] {
        &self.rows
    }
    pub fn len(&self) -> usize {
        self.rows.len()
    }
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
    pub fn name(&self) -> &str {
        &self.metadata.name
    }
    pub fn metadata(&self) -> &TableMetadata {
        &self.metadata
    }
    pub fn iter(&self) -> std::slice::Iter<'_, R> {
        self.rows.iter()
    }
}
impl<R: Clone> Table<R> {
    /// Keeps matching rows in their original order.
    pub fn filter<P>(&self, predicate: P) -> Self
    where
        P: Fn(&R) -> bool,
    {
        let rows: Vec<R> = self.rows.iter().filter(|r| predicate(r)).cloned().collect();
        Self::with_source(
            format!("{}_filtered", self.metadata.name),
            rows,
            self.metadata.source_path.as_deref(),
        )
    }
}
impl<'a, R> IntoIterator for &'a Table<R> {
    type Item = &'a R;
    type IntoIter = std::slice::Iter<'a, R>;
    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

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

//! Ordered categorical dimensions shared by the aggregator and the formatter.
//!
//! Each category lists its members once, in presentation order, through
//! [`Category::ALL`]. Grouping, zero-filling and labelling all walk that
//! slice.
use serde::{Deserialize, Serialize};
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LabelSet {
    #[default]
    English,
    Short,
    Korean,
}
pub trait Category: Copy + Eq + std::hash::Hash + std::fmt::Debug + 'static {
    const ALL: &'static [Self];
    fn label(self, labels: LabelSet) -> &'static str;
    /// Position of `self` inside [`Category::ALL`].
    fn index(self) -> usize;
}
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Weekday {
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}
impl Weekday {
    /// Accepts full English names and three-letter abbreviations in any case.
    pub fn parse(raw: &str) -> Option<Self> {
        let lowered = raw.trim().to_lowercase();
        Self::ALL.iter().copied().find(|day| {
            let full = day.label(LabelSet::English).to_lowercase();
            let short = day.label(LabelSet::Short).to_lowercase();
            lowered == full || lowered == short
        })
    }
}
impl Category for Weekday {
    const ALL: &'static [Self] = &[
        Self::Sunday,
        Self::Monday,
        Self::Tuesday,
        Self::Wednesday,
        Self::Thursday,
        Self::Friday,
        Self::Saturday,
    ];
    fn label(self, labels: LabelSet) -> &'static str {
        const ENGLISH: [&str; 7] = [
            "Sunday",
            "Monday",
            "Tuesday",
            "Wednesday",
            "Thursday",
            "Friday",
            "Saturday",
        ];
        const SHORT: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
        const KOREAN: [&str; 7] = ["일", "월", "화", "수", "목", "금", "토"];
        match labels {
            LabelSet::English => ENGLISH[self.index()],
            LabelSet::Short => SHORT[self.index()],
            LabelSet::Korean => KOREAN[self.index()],
        }
    }
    fn index(self) -> usize {
        self as usize
    }
}
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}
impl Gender {
    /// Survey exports use either Latin codes or the Korean `남`/`여`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "m" | "male" | "남" | "남자" | "남성" => Some(Self::Male),
            "f" | "female" | "여" | "여자" | "여성" => Some(Self::Female),
            _ => None,
        }
    }
}
impl Category for Gender {
    const ALL: &'static [Self] = &[Self::Male, Self::Female];
    fn label(self, labels: LabelSet) -> &'static str {
        match (self, labels) {
            (Self::Male, LabelSet::English) => "Male",
            (Self::Female, LabelSet::English) => "Female",
            (Self::Male, LabelSet::Short) => "M",
            (Self::Female, LabelSet::Short) => "F",
            (Self::Male, LabelSet::Korean) => "남",
            (Self::Female, LabelSet::Korean) => "여",
        }
    }
    fn index(self) -> usize {
        self as usize
    }
}
/// Half-open age bands, low edge inclusive: `[0,20) [20,30) ... [60,∞)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AgeBucket {
    Under20,
    Twenties,
    Thirties,
    Forties,
    Fifties,
    SixtyPlus,
}
impl AgeBucket {
    pub fn from_age(age: u32) -> Self {
        match age {
            0..=19 => Self::Under20,
            20..=29 => Self::Twenties,
            30..=39 => Self::Thirties,
            40..=49 => Self::Forties,
            50..=59 => Self::Fifties,
            _ => Self::SixtyPlus,
        }
    }
    pub fn lower_bound(self) -> u32 {
        match self {
            Self::Under20 => 0,
            Self::Twenties => 20,
            Self::Thirties => 30,
            Self::Forties => 40,
            Self::Fifties => 50,
            Self::SixtyPlus => 60,
        }
    }
    /// Exclusive upper edge; `None` for the open-ended last band.
    pub fn upper_bound(self) -> Option<u32> {
        Self::ALL
            .get(self.index() + 1)
            .map(|next| next.lower_bound())
    }
    pub fn contains(self, age: u32) -> bool {
        age >= self.lower_bound() && self.upper_bound().map_or(true, |upper| age < upper)
    }
}
impl Category for AgeBucket {
    const ALL: &'static [Self] = &[
        Self::Under20,
        Self::Twenties,
        Self::Thirties,
        Self::Forties,
        Self::Fifties,
        Self::SixtyPlus,
    ];
    fn label(self, labels: LabelSet) -> &'static str {
        const ENGLISH: [&str; 6] = ["Under 20s", "20s", "30s", "40s", "50s", "60s and Above"];
        const SHORT: [&str; 6] = ["<20", "20-29", "30-39", "40-49", "50-59", "60+"];
        const KOREAN: [&str; 6] = ["20대 미만", "20대", "30대", "40대", "50대", "60대 이상"];
        match labels {
            LabelSet::English => ENGLISH[self.index()],
            LabelSet::Short => SHORT[self.index()],
            LabelSet::Korean => KOREAN[self.index()],
        }
    }
    fn index(self) -> usize {
        self as usize
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn weekday_order_starts_on_sunday() {
        let labels: Vec<_> = Weekday::ALL
            .iter()
            .map(|d| d.label(LabelSet::Short))
            .collect();
        assert_eq!(labels, ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"]);
    }
    #[test]
    fn weekday_parse_accepts_full_and_short_names() {
        assert_eq!(Weekday::parse("Tuesday"), Some(Weekday::Tuesday));
        assert_eq!(Weekday::parse(" fri "), Some(Weekday::Friday));
        assert_eq!(Weekday::parse("SATURDAY"), Some(Weekday::Saturday));
        assert_eq!(Weekday::parse("Funday"), None);
    }
    #[test]
    fn gender_parse_accepts_source_local_codes() {
        assert_eq!(Gender::parse("남"), Some(Gender::Male));
        assert_eq!(Gender::parse("여"), Some(Gender::Female));
        assert_eq!(Gender::parse("F"), Some(Gender::Female));
        assert_eq!(Gender::parse("x"), None);
    }
    #[test]
    fn index_matches_position_in_all() {
        for (i, bucket) in AgeBucket::ALL.iter().enumerate() {
            assert_eq!(bucket.index(), i);
        }
        for (i, day) in Weekday::ALL.iter().enumerate() {
            assert_eq!(day.index(), i);
        }
    }
}

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

use cafe_insight::{
    CafePipeline, ErrorKind, InsightReport, LabelSet, Outcome, PipelineConfig, Region,
    SourcePaths,
};
use serde_json::{json, Value};
use std::fs;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
const OCCUPANCY: &str = "\
weekday,hour,predicted_people
Sunday,10,12
Monday,10,5
Tuesday,10,20
Wednesday,10,8
Thursday,10,15
Friday,10,3
Saturday,10,18
Tuesday,15,7
";
const REGISTRY: &str = "\
id,name,address,latitude,longitude
291,Amaloon,경기도 고양시 덕양구,37.65,126.83
100,Bean House,경기도 파주시,37.71,126.79
200,Seoul Brew,서울특별시 마포구,37.55,126.92
";
const FAVORITES: &str = "\
user_id,store_id
1,291
2,291
3,291
4,100
5,200
1,100
6,999
";
const SURVEY: &str = "\
user_id,gender,age,favorite_menu
1,남,24,아메리카노
2,여,31,카페라떼
4,여,19,아메리카노
5,남,45,녹차
";
fn fixture() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("291.csv"), OCCUPANCY).unwrap();
    fs::write(dir.path().join("store.csv"), REGISTRY).unwrap();
    fs::write(dir.path().join("store_favorite.csv"), FAVORITES).unwrap();
    fs::write(dir.path().join("survey.csv"), SURVEY).unwrap();
    dir
}
fn config_for(dir: &TempDir) -> PipelineConfig {
    PipelineConfig {
        sources: SourcePaths::default().relative_to(dir.path()),
        ..PipelineConfig::default()
    }
}
fn names<T>(outcome: &Outcome<Vec<T>>, name: impl Fn(&T) -> String) -> Vec<String> {
    outcome
        .data()
        .map(|rows| rows.iter().map(name).collect())
        .unwrap_or_default()
}
fn failure_kind<T>(outcome: &Outcome<T>) -> Option<ErrorKind> {
    match outcome {
        Outcome::Failed { error } => Some(error.kind),
        _ => None,
    }
}
#[test]
fn test_full_report_end_to_end() {
    let dir = fixture();
    let report = CafePipeline::new(config_for(&dir)).report();
    assert_eq!(report.ready_count(), 6);
    let congestion = report.congestion.data().unwrap();
    assert_eq!(congestion.busiest.len(), 7);
    assert_eq!(congestion.busiest[2].label, "Tuesday");
    assert_eq!(congestion.busiest[2].hour, 10);
    assert_eq!(congestion.calmest[2].hour, 15);
    assert!((congestion.peak - 20.0).abs() < f64::EPSILON);
    assert!((congestion.weekly_mean - 88.0 / 8.0).abs() < 1e-9);
    assert!((congestion.average[2].mean_people - 13.5).abs() < 1e-9);
    let ranking = report.ranking.data().unwrap();
    assert_eq!(ranking.len(), 2);
    assert_eq!((ranking[0].name.as_str(), ranking[0].favorite_count), ("Amaloon", 3));
    assert_eq!((ranking[1].name.as_str(), ranking[1].favorite_count), ("Bean House", 2));
    assert_eq!(report.store_names.data().unwrap(), &["Amaloon".to_string()]);
    let cohort = report.cohort.data().unwrap();
    assert_eq!(cohort.size, 2);
    assert_eq!(cohort.age.len(), 6);
    assert_eq!(cohort.age[1].bucket_label, "20s");
    assert_eq!(cohort.age[1].count, 1);
    let gender = names(&report.regional_gender, |d| d.name.clone());
    assert_eq!(gender, ["Amaloon", "Bean House"]);
    let bean_house = &report.regional_age.data().unwrap()[1];
    assert_eq!(bean_house.buckets[0].bucket_label, "Under 20s");
    assert_eq!(bean_house.buckets[0].count, 1);
    assert_eq!(bean_house.buckets[1].count, 1);
}
#[test]
fn test_report_json_is_byte_identical_across_runs() {
    let dir = fixture();
    let pipeline = CafePipeline::new(config_for(&dir));
    let first = serde_json::to_string(&pipeline.report()).unwrap();
    let second = serde_json::to_string(&pipeline.report()).unwrap();
    assert_eq!(first, second);
    let mut parallel = config_for(&dir);
    parallel.parallel_loads = true;
    let third = serde_json::to_string(&CafePipeline::new(parallel).report()).unwrap();
    assert_eq!(first, third);
}
#[test]
fn test_report_json_shape() {
    let dir = fixture();
    let report = CafePipeline::new(config_for(&dir)).report();
    let value: Value = serde_json::to_value(&report).unwrap();
    assert_eq!(value["ranking"]["status"], "ready");
    assert_eq!(
        value["ranking"]["data"][0],
        json!({"name": "Amaloon", "favorite_count": 3})
    );
    assert_eq!(value["congestion"]["data"]["busiest"][0]["weekday"], "Sunday");
}
#[test]
fn test_korean_labels() {
    let dir = fixture();
    let config = PipelineConfig {
        labels: LabelSet::Korean,
        ..config_for(&dir)
    };
    let report = CafePipeline::new(config).report();
    let congestion = report.congestion.data().unwrap();
    assert_eq!(congestion.busiest[2].label, "화");
    assert_eq!(report.cohort.data().unwrap().age[0].bucket_label, "20대 미만");
    assert_eq!(
        report.regional_gender.data().unwrap()[0].buckets[0].bucket_label,
        "남"
    );
}
#[test]
fn test_bad_survey_fails_only_dependent_aggregations() {
    let dir = fixture();
    fs::write(
        dir.path().join("survey.csv"),
        "user_id,gender,age,favorite_menu\n1,남,twenty,아메리카노\n",
    )
    .unwrap();
    let report = CafePipeline::new(config_for(&dir)).report();
    assert!(report.congestion.is_ready());
    assert!(report.ranking.is_ready());
    assert!(report.store_names.is_ready());
    assert_eq!(failure_kind(&report.cohort), Some(ErrorKind::BadInput));
    assert_eq!(failure_kind(&report.regional_gender), Some(ErrorKind::BadInput));
    assert_eq!(failure_kind(&report.regional_age), Some(ErrorKind::BadInput));
}
#[test]
fn test_region_without_cafes_is_no_data() {
    let dir = fixture();
    let config = PipelineConfig {
        region: Region::address("부산"),
        ..config_for(&dir)
    };
    let report = CafePipeline::new(config).report();
    assert!(matches!(report.ranking, Outcome::NoData { .. }));
    assert!(matches!(report.regional_gender, Outcome::NoData { .. }));
    assert!(report.cohort.is_ready());
}
#[test]
fn test_unknown_target_store_is_no_data() {
    let dir = fixture();
    let config = PipelineConfig {
        target_store_id: Some(4242),
        ..config_for(&dir)
    };
    let report = CafePipeline::new(config).report();
    assert!(matches!(&report.cohort, Outcome::NoData { reason } if reason.contains("4242")));
}
#[test]
fn test_missing_weekday_abort_policy_surfaces_no_data() {
    let dir = fixture();
    fs::write(
        dir.path().join("291.csv"),
        "weekday,hour,predicted_people\nSunday,9,4\n",
    )
    .unwrap();
    let skip = CafePipeline::new(config_for(&dir)).report();
    assert_eq!(skip.congestion.data().unwrap().busiest.len(), 1);
    let config = PipelineConfig {
        missing_weekday: cafe_insight::MissingWeekdayPolicy::Abort,
        ..config_for(&dir)
    };
    let abort = CafePipeline::new(config).report();
    assert!(matches!(abort.congestion, Outcome::NoData { .. }));
}
async fn remote_report(server: &MockServer, dir: &TempDir) -> InsightReport {
    let mut config = config_for(dir);
    config.ranking.url = Some(format!("{}/ranking", server.uri()));
    config.ranking.timeout_secs = 5;
    tokio::task::spawn_blocking(move || CafePipeline::new(config).report())
        .await
        .unwrap()
}
#[tokio::test]
async fn test_published_ranking_drives_regional_demographics() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ranking"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"name": "bean house", "favorite_count": 50},
            {"name": " Amaloon", "favorite_count": 40},
            {"name": "Closed Cafe", "favorite_count": 30}
        ])))
        .expect(1)
        .mount(&server)
        .await;
    let dir = fixture();
    let report = remote_report(&server, &dir).await;
    let ranking = report.ranking.data().unwrap();
    assert_eq!((ranking[0].name.as_str(), ranking[0].favorite_count), ("Amaloon", 3));
    assert_eq!((ranking[1].name.as_str(), ranking[1].favorite_count), ("Bean House", 2));
    let gender = names(&report.regional_gender, |d| d.name.clone());
    assert_eq!(gender, ["bean house", " Amaloon"]);
    assert_eq!(report.regional_age.data().unwrap()[0].favorite_count, 50);
}
#[tokio::test]
async fn test_ranking_endpoint_failure_is_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ranking"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let dir = fixture();
    let report = remote_report(&server, &dir).await;
    assert_eq!(report.ranking.data().unwrap()[0].name, "Amaloon");
    assert_eq!(failure_kind(&report.regional_gender), Some(ErrorKind::Unavailable));
    assert_eq!(failure_kind(&report.regional_age), Some(ErrorKind::Unavailable));
    assert!(report.congestion.is_ready());
    assert!(report.cohort.is_ready());
}
#[tokio::test]
async fn test_malformed_ranking_body_is_bad_input() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ranking"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;
    let dir = fixture();
    let report = remote_report(&server, &dir).await;
    assert!(report.ranking.is_ready());
    assert_eq!(failure_kind(&report.regional_gender), Some(ErrorKind::BadInput));
    assert_eq!(failure_kind(&report.regional_age), Some(ErrorKind::BadInput));
}
#[test]
fn test_unreachable_ranking_endpoint_keeps_local_ranking() {
    let dir = fixture();
    let mut config = config_for(&dir);
    config.ranking.url = Some("http://127.0.0.1:9/ranking".to_string());
    config.ranking.timeout_secs = 1;
    let report = CafePipeline::new(config).report();
    assert_eq!(report.ready_count(), 4);
    let ranking = names(&report.ranking, |r| r.name.clone());
    assert_eq!(ranking, ["Amaloon", "Bean House"]);
    assert_eq!(failure_kind(&report.regional_gender), Some(ErrorKind::Unavailable));
    assert_eq!(failure_kind(&report.regional_age), Some(ErrorKind::Unavailable));
}
#[test]
fn test_empty_occupancy_series_names_no_weekday() {
    let dir = fixture();
    fs::write(dir.path().join("291.csv"), "weekday,hour,predicted_people\n").unwrap();
    let report = CafePipeline::new(config_for(&dir)).report();
    match &report.congestion {
        Outcome::NoData { reason } => {
            assert_eq!(reason, "No occupancy samples recorded");
        }
        other => panic!("expected no data, got {other:?}"),
    }
    assert!(report.ranking.is_ready());
}
#[test]
fn test_fetch_timeout_is_configurable() {
    let config = PipelineConfig::default();
    assert_eq!(config.ranking.timeout(), Duration::from_secs(10));
}
#[test]
fn test_shipped_config_file_parses() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../../config/cafe-report.toml");
    let config = PipelineConfig::load_from_file(&path).unwrap();
    assert_eq!(config.region, Region::address("경기도"));
    assert_eq!(config.target_store_id().unwrap(), 291);
    assert!(config.ranking.url.is_none());
}

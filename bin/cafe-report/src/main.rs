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

mod cli;
use anyhow::Context;
use cafe_insight::{
    CafeDemographics, CafePipeline, CohortReport, CongestionProfile, ErrorDescription, ErrorKind,
    Outcome, RankingRow,
};
use clap::Parser;
use cli::{Args, Command};
use serde::Serialize;
use std::process;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
#[derive(Debug, Serialize)]
struct RegionalDemographics {
    ranking: Vec<RankingRow>,
    gender: Outcome<Vec<CafeDemographics>>,
    age: Outcome<Vec<CafeDemographics>>,
}
fn main() {
    dotenvy::dotenv().ok();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();
    match run(&args) {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            error!("cafe-report failed: {e:#}");
            let description = ErrorDescription {
                kind: ErrorKind::BadInput,
                message: format!("{e:#}"),
            };
            eprintln!(
                "{}",
                serde_json::to_string_pretty(&description).unwrap_or_else(|_| description.message)
            );
            process::exit(1);
        }
    }
}
/// Returns `Ok(false)` when the requested aggregation failed on bad or
/// unavailable input.
fn run(args: &Args) -> anyhow::Result<bool> {
    let config = args
        .pipeline_config()
        .context("Failed to resolve configuration")?;
    let pipeline = CafePipeline::new(config);
    info!(command = ?args.command, "Running cafe-report");
    match &args.command {
        Command::Congestion => emit(Outcome::from_result(congestion(&pipeline))),
        Command::Ranking { .. } | Command::RankingBox(_) => {
            emit(Outcome::from_result(ranking(&pipeline)))
        }
        Command::StoreNames(_) => emit(Outcome::from_result(store_names(&pipeline))),
        Command::Cohort { .. } => emit(Outcome::from_result(cohort(&pipeline))),
        Command::Regional { remote, .. } => {
            emit(Outcome::from_result(regional(&pipeline, *remote)))
        }
        Command::Report => {
            let report = pipeline.report();
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(true)
        }
    }
}
fn emit<T: Serialize>(outcome: Outcome<T>) -> anyhow::Result<bool> {
    if let Outcome::Failed { error } = &outcome {
        eprintln!("{}", serde_json::to_string_pretty(error)?);
        return Ok(false);
    }
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(true)
}
fn congestion(pipeline: &CafePipeline) -> cafe_insight::Result<CongestionProfile> {
    let occupancy = pipeline.store().occupancy()?;
    pipeline.congestion(&occupancy)
}
fn ranking(pipeline: &CafePipeline) -> cafe_insight::Result<Vec<RankingRow>> {
    let store = pipeline.store();
    let favorites = store.favorites()?;
    let registry = store.registry()?;
    pipeline.ranking(&favorites, &registry, &pipeline.config().region)
}
fn store_names(pipeline: &CafePipeline) -> cafe_insight::Result<Vec<String>> {
    let registry = pipeline.store().registry()?;
    Ok(pipeline.store_names(&registry, &pipeline.config().bounding_box))
}
fn cohort(pipeline: &CafePipeline) -> cafe_insight::Result<CohortReport> {
    let store_id = pipeline.config().target_store_id()?;
    let store = pipeline.store();
    let registry = store.registry()?;
    let favorites = store.favorites()?;
    let survey = store.survey()?;
    pipeline.store_cohort_report(store_id, &registry, &favorites, &survey)
}
fn regional(pipeline: &CafePipeline, remote: bool) -> cafe_insight::Result<RegionalDemographics> {
    let store = pipeline.store();
    let favorites = store.favorites()?;
    let registry = store.registry()?;
    let survey = store.survey()?;
    let ranking = pipeline.resolve_ranking(&favorites, &registry, remote)?;
    Ok(RegionalDemographics {
        ranking: pipeline.formatter().ranking(&ranking),
        gender: Outcome::from_result(pipeline.regional_gender(&favorites, &survey, &ranking)),
        age: Outcome::from_result(pipeline.regional_age(&favorites, &survey, &ranking)),
    })
}

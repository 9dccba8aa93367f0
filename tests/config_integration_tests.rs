//! Tests for config file loading and code table selection
use std::fs;

use clap::Parser;
use gctk::config::{Args, Commands, Config, FileConfig};
use gctk::interpreter::{DistanceMode, Plane, Units};
use tempfile::TempDir;

const SHOP_TABLE: &str = "[table]\nname = \"shop\"\n\n[[codes]]\nname = \"G0\"\n\n[[codes]]\nname = \"M30\"\n";

fn args(list: &[&str]) -> Args {
    Args::try_parse_from(std::iter::once("gctk").chain(list.iter().copied())).expect("parse args")
}

fn project() -> TempDir {
    let dir = TempDir::new().expect("temp dir");
    fs::create_dir(dir.path().join("codes")).expect("codes dir");
    fs::write(dir.path().join("codes").join("shop.toml"), SHOP_TABLE).expect("write table");
    fs::write(
        dir.path().join("gctk.toml"),
        "codes = \"shop\"\ncode_dirs = [\"codes\"]\nlog_level = \"debug\"\n\n[modal]\nunits = \"in\"\ndistance = \"incremental\"\n",
    )
    .expect("write config");
    dir
}

#[test]
fn test_file_config_resolves_code_dirs() {
    let dir = project();
    let file = FileConfig::load(&dir.path().join("gctk.toml")).expect("load config");
    assert_eq!(file.code_dirs, vec![dir.path().join("codes")]);
    assert_eq!(file.modal.units, Some(Units::Inches));
}

#[test]
fn test_project_config_selects_table() {
    let dir = project();
    let config_path = dir.path().join("gctk.toml");
    let config = Config::from_args(args(&["--config", config_path.to_str().unwrap(), "extent"]))
        .expect("create config");

    assert_eq!(config.command, Commands::Extent);
    assert_eq!(config.log_level, "debug");
    assert_eq!(config.project_codes.as_deref(), Some("shop"));

    let state = config.modal.initial_state();
    assert_eq!(state.units, Units::Inches);
    assert_eq!(state.distance, DistanceMode::Incremental);
    assert_eq!(state.plane, Plane::XY);

    let table = config.code_table("G0 X1\nM30").expect("code table");
    assert_eq!(table.name, "shop");
}

#[test]
fn test_cli_overrides_config_file() {
    let dir = project();
    let config_path = dir.path().join("gctk.toml");
    let config = Config::from_args(args(&[
        "--config",
        config_path.to_str().unwrap(),
        "--codes",
        "core",
        "--units",
        "mm",
        "--log-level",
        "trace",
    ]))
    .expect("create config");

    assert_eq!(config.log_level, "trace");
    assert_eq!(config.modal.initial_state().units, Units::Millimeters);
    assert_eq!(config.modal.initial_state().distance, DistanceMode::Incremental);
    assert_eq!(config.code_table("G0").expect("code table").name, "core");
}

#[test]
fn test_modeline_overrides_config() {
    let dir = project();
    let config_path = dir.path().join("gctk.toml");
    let config = Config::from_args(args(&["--config", config_path.to_str().unwrap()]))
        .expect("create config");

    let table = config
        .code_table("; gctk_codes=core\nG1 X1")
        .expect("code table");
    assert_eq!(table.name, "core");
}

#[test]
fn test_codes_dir_argument() {
    let dir = project();
    let codes_dir = dir.path().join("codes");
    let config = Config::from_args(args(&[
        "--codes-dir",
        codes_dir.to_str().unwrap(),
        "--codes",
        "shop",
    ]))
    .expect("create config");

    assert!(config.code_dirs.iter().any(|(d, _)| *d == codes_dir));
    assert_eq!(config.code_table("").expect("code table").name, "shop");
}

#[test]
fn test_unknown_table_is_an_error() {
    let config = Config::from_args(args(&["--codes", "no-such-table"])).expect("create config");
    let err = config.code_table("G0").unwrap_err();
    assert!(err.to_string().contains("no-such-table"));
}

#[test]
fn test_invalid_config_file() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("gctk.toml");
    fs::write(&path, "[modal]\nunits = \"cubits\"\n").expect("write config");
    assert!(Config::from_args(args(&["--config", path.to_str().unwrap()])).is_err());
}

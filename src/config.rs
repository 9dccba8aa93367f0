//! Configuration for the gctk command-line tool.
//!
//! Handles:
//! - Command-line argument parsing
//! - The optional `gctk.toml` config file
//! - Code table directories and selection
//! - Initial modal state overrides

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;

use crate::codes::{CodeRegistry, CodeTable, TablePriority};
use crate::interpreter::{Axis, DistanceMode, ModalState, Plane, Units};

/// Config file looked up in the working directory when `--config` is absent
pub const DEFAULT_CONFIG_FILE: &str = "gctk.toml";

const DEFAULT_LOG_LEVEL: &str = "warn";

/// Command-line arguments for gctk
#[derive(Debug, Parser)]
#[command(name = "gctk")]
#[command(about = "G-code Toolkit")]
#[command(version)]
pub struct Args {
    /// Config file (defaults to ./gctk.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Code table to use, by name or path to a TOML file
    #[arg(long, global = true, value_name = "NAME|FILE")]
    pub codes: Option<String>,

    /// Extra directory containing code table TOML files
    #[arg(long, global = true)]
    pub codes_dir: Option<PathBuf>,

    /// Initial units (mm, in)
    #[arg(long, global = true)]
    pub units: Option<Units>,

    /// Initial distance mode (absolute, incremental)
    #[arg(long, global = true)]
    pub distance: Option<DistanceMode>,

    /// Initial plane (xy, zx, yz)
    #[arg(long, global = true)]
    pub plane: Option<Plane>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Program file to read; stdin when absent
    #[arg(short, long, global = true)]
    pub input: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Clone, PartialEq, Subcommand)]
pub enum Commands {
    /// Print interpreted events as JSON lines (default)
    Events,
    /// Print the XY extent of all moves as JSON
    #[command(alias = "get-extent")]
    Extent,
    /// Shift absolute motion coordinates
    Translate {
        #[arg(short, default_value_t = 0.0, allow_negative_numbers = true)]
        x: f64,
        #[arg(short, default_value_t = 0.0, allow_negative_numbers = true)]
        y: f64,
        #[arg(short, default_value_t = 0.0, allow_negative_numbers = true)]
        z: f64,
    },
    /// Mirror motion about the plane AXIS = VALUE
    Mirror {
        #[command(flatten)]
        axis: MirrorAxis,
    },
    /// Report diagnostics only; fails when a line is rejected
    Check,
}

#[derive(Debug, Clone, PartialEq, clap::Args)]
#[group(required = true, multiple = false)]
pub struct MirrorAxis {
    #[arg(short, allow_negative_numbers = true)]
    pub x: Option<f64>,
    #[arg(short, allow_negative_numbers = true)]
    pub y: Option<f64>,
    #[arg(short, allow_negative_numbers = true)]
    pub z: Option<f64>,
}

impl MirrorAxis {
    pub fn axis(&self) -> Option<(Axis, f64)> {
        match (self.x, self.y, self.z) {
            (Some(x), _, _) => Some((Axis::X, x)),
            (_, Some(y), _) => Some((Axis::Y, y)),
            (_, _, Some(z)) => Some((Axis::Z, z)),
            (None, None, None) => None,
        }
    }
}

/// Initial modal state overrides
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModalOverrides {
    pub units: Option<Units>,
    pub distance: Option<DistanceMode>,
    pub plane: Option<Plane>,
}

impl ModalOverrides {
    /// Overrides from `other` win where set
    pub fn merge(self, other: ModalOverrides) -> Self {
        Self {
            units: other.units.or(self.units),
            distance: other.distance.or(self.distance),
            plane: other.plane.or(self.plane),
        }
    }

    pub fn apply(&self, state: &mut ModalState) {
        if let Some(units) = self.units {
            state.units = units;
        }
        if let Some(distance) = self.distance {
            state.distance = distance;
        }
        if let Some(plane) = self.plane {
            state.plane = plane;
        }
    }

    pub fn initial_state(&self) -> ModalState {
        let mut state = ModalState::default();
        self.apply(&mut state);
        state
    }
}

/// Contents of a `gctk.toml` file
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub codes: Option<String>,
    pub code_dirs: Vec<PathBuf>,
    pub log_level: Option<String>,
    pub modal: ModalOverrides,
}

impl FileConfig {
    /// Load a config file; relative `code_dirs` resolve against its directory
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let mut config: FileConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        if let Some(base) = path.parent() {
            for dir in &mut config.code_dirs {
                if dir.is_relative() {
                    *dir = base.join(&*dir);
                }
            }
        }
        Ok(config)
    }
}

/// Combined configuration from all sources
#[derive(Debug, Clone)]
pub struct Config {
    /// Code table set on the command line
    pub cli_codes: Option<String>,
    /// Code table set in the config file
    pub project_codes: Option<String>,
    /// Code table directories, lowest priority first
    pub code_dirs: Vec<(PathBuf, TablePriority)>,
    pub log_level: String,
    pub modal: ModalOverrides,
    pub input: Option<PathBuf>,
    pub command: Commands,
    /// Config file that was loaded, if any
    pub config_path: Option<PathBuf>,
}

impl Config {
    /// Create configuration from command-line arguments
    pub fn from_args_and_env() -> Result<Self> {
        Self::from_args(Args::parse())
    }

    /// Create configuration from explicit arguments (useful for testing)
    pub fn from_args(args: Args) -> Result<Self> {
        let config_path = match args.config {
            Some(path) => Some(path),
            None => Some(PathBuf::from(DEFAULT_CONFIG_FILE)).filter(|p| p.is_file()),
        };
        let file = match &config_path {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };

        let mut code_dirs = Vec::new();

        // User global directory: ~/.config/gctk/codes/
        if let Some(config_dir) = dirs::config_dir() {
            code_dirs.push((config_dir.join("gctk").join("codes"), TablePriority::UserGlobal));
        }

        // Current workspace directory: ./.gctk/codes/
        code_dirs.push((PathBuf::from(".gctk").join("codes"), TablePriority::Workspace));

        code_dirs.extend(
            file.code_dirs
                .into_iter()
                .map(|dir| (dir, TablePriority::Workspace)),
        );
        if let Some(custom_dir) = args.codes_dir {
            code_dirs.push((custom_dir, TablePriority::Workspace));
        }

        let cli_modal = ModalOverrides {
            units: args.units,
            distance: args.distance,
            plane: args.plane,
        };

        Ok(Config {
            cli_codes: args.codes,
            project_codes: file.codes,
            code_dirs,
            log_level: args
                .log_level
                .or(file.log_level)
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
            modal: file.modal.merge(cli_modal),
            input: args.input,
            command: args.command.unwrap_or(Commands::Events),
            config_path,
        })
    }

    /// Registry with the built-in table plus every configured directory
    pub fn registry(&self) -> Result<CodeRegistry> {
        let mut registry = CodeRegistry::with_builtin();
        for (dir, priority) in &self.code_dirs {
            let loaded = registry.load_directory(dir, *priority)?;
            if loaded > 0 {
                log::info!("Loaded {} code table(s) from {}", loaded, dir.display());
            }
        }
        Ok(registry)
    }

    /// Pick the code table for `src`
    ///
    /// Priority: command line, then a modeline in the program, then the
    /// config file, then the built-in core table.
    pub fn code_table(&self, src: &str) -> Result<CodeTable> {
        let mut registry = self.registry()?;

        if let Some(codes) = &self.cli_codes {
            registry.select(codes)?;
        } else if let Some(name) = registry.detect_modeline_table(src) {
            registry.set_active(&name);
        } else if let Some(codes) = &self.project_codes {
            let source = self
                .config_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_string());
            registry
                .select(codes)
                .with_context(|| format!("Code table from {}", source))?;
        }

        let table = registry
            .active()
            .cloned()
            .unwrap_or_else(CodeTable::core);
        log::info!("Using code table '{}'", table.name);
        Ok(table)
    }
}

//! # Frostlod CLI
//!
//! Command-line interface for Frostlod.
//!
//! ## Commands
//! - `scan` - List mesh templates in a samples folder
//! - `inspect` - Show the materials and LOD spans of a template
//! - `ratios` - Print the decimation ratio per level
//! - `preview` - Generate LODs for a template in a scratch scene and report polygon counts
//! - `prefs` - Show or reset saved preferences

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use frostlod_core::{DecimateMethod, LodPolicy, Preset, Scene, Symmetry};
use frostlod_editor::{LodSession, Preferences};

/// Frostlod LOD toolkit CLI
#[derive(Parser)]
#[command(name = "frostlod")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// List mesh templates in a samples folder
    Scan {
        /// Samples folder
        root: PathBuf,
    },

    /// Show the materials and LOD spans of a template
    Inspect {
        /// Template file
        file: PathBuf,

        /// Print the descriptor as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the decimation ratio per level
    Ratios {
        #[command(flatten)]
        policy: PolicyArgs,

        /// Highest level to print
        #[arg(short, long, default_value = "6")]
        levels: u32,
    },

    /// Generate LODs for a template in a scratch scene and report polygon counts
    Preview {
        /// Template file
        file: PathBuf,

        /// Polygon count of each source mesh
        #[arg(long, default_value = "10000")]
        polys: usize,

        #[command(flatten)]
        policy: PolicyArgs,
    },

    /// Show or reset saved preferences
    Prefs {
        /// Preferences file
        file: PathBuf,

        /// Write factory defaults to the file
        #[arg(long)]
        reset: bool,
    },
}

/// Preset names accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PresetArg {
    High,
    Medium,
    Aggressive,
}

impl From<PresetArg> for Preset {
    fn from(arg: PresetArg) -> Self {
        match arg {
            PresetArg::High => Preset::High,
            PresetArg::Medium => Preset::Medium,
            PresetArg::Aggressive => Preset::Aggressive,
        }
    }
}

/// Decimation methods accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MethodArg {
    Collapse,
    Unsubdivide,
    Planar,
}

impl From<MethodArg> for DecimateMethod {
    fn from(arg: MethodArg) -> Self {
        match arg {
            MethodArg::Collapse => DecimateMethod::Collapse,
            MethodArg::Unsubdivide => DecimateMethod::UnSubdivide,
            MethodArg::Planar => DecimateMethod::Planar,
        }
    }
}

/// Symmetry axes accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SymmetryArg {
    None,
    X,
    Y,
    Z,
}

impl From<SymmetryArg> for Symmetry {
    fn from(arg: SymmetryArg) -> Self {
        match arg {
            SymmetryArg::None => Symmetry::None,
            SymmetryArg::X => Symmetry::X,
            SymmetryArg::Y => Symmetry::Y,
            SymmetryArg::Z => Symmetry::Z,
        }
    }
}

/// Policy flags shared by commands
#[derive(Args, Debug, Clone, Default)]
pub struct PolicyArgs {
    /// Ratio preset
    #[arg(short, long, value_enum, conflicts_with_all = ["base", "step"])]
    pub preset: Option<PresetArg>,

    /// LOD1 ratio (custom preset)
    #[arg(short, long)]
    pub base: Option<f64>,

    /// Ratio step per level (custom preset)
    #[arg(short, long)]
    pub step: Option<f64>,

    /// Decimation method
    #[arg(short, long, value_enum)]
    pub method: Option<MethodArg>,

    /// Symmetry axis (collapse only)
    #[arg(long, value_enum)]
    pub symmetry: Option<SymmetryArg>,
}

impl PolicyArgs {
    /// Build a policy, starting from the defaults
    pub fn to_policy(&self) -> LodPolicy {
        let mut policy = LodPolicy::default();
        if let Some(preset) = self.preset {
            policy.apply_preset(preset.into());
        } else if self.base.is_some() || self.step.is_some() {
            policy = LodPolicy::custom(
                self.base.unwrap_or(policy.base_ratio),
                self.step.unwrap_or(policy.step),
            );
        }
        if let Some(method) = self.method {
            policy.method = method.into();
        }
        if let Some(symmetry) = self.symmetry {
            policy.symmetry = symmetry.into();
        }
        policy
    }
}

/// Execute the CLI command
pub fn execute(cli: Cli) -> Result<()> {
    if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    match cli.command {
        Commands::Scan { root } => scan(&root),
        Commands::Inspect { file, json } => inspect(&file, json),
        Commands::Ratios { policy, levels } => {
            ratios(&policy.to_policy(), levels);
            Ok(())
        }
        Commands::Preview { file, polys, policy } => preview(&file, polys, policy.to_policy()),
        Commands::Prefs { file, reset } => prefs(&file, reset),
    }
}

fn scan(root: &Path) -> Result<()> {
    if !root.is_dir() {
        bail!("Samples folder not found: {}", root.display());
    }

    let entries = frostlod_assets::scan(Some(root));
    if entries.is_empty() {
        log::info!("No templates found in {}", root.display());
    }
    for entry in entries {
        println!("{:<24} {}", entry.display_name, entry.path.display());
    }
    Ok(())
}

fn inspect(file: &Path, json: bool) -> Result<()> {
    let descriptor = frostlod_assets::load_template(file)
        .with_context(|| format!("Failed to load {}", file.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&descriptor)?);
        return Ok(());
    }

    println!("Template:   {}", descriptor.name);
    println!("Asset path: {}", descriptor.asset_path);
    println!("Materials:");
    for material in &descriptor.materials {
        println!("  {:<32} LOD {}-{}", material.name, material.min_lod, material.max_lod);
    }
    println!("Sections:");
    for (level, names) in &descriptor.levels {
        println!("  LOD{}: {}", level, names.join(", "));
    }
    Ok(())
}

/// `(level, ratio)` pairs from LOD0 through `levels`
pub fn ratio_table(policy: &LodPolicy, levels: u32) -> Vec<(u32, f64)> {
    (0..=levels).map(|level| (level, policy.ratio_for_level(level))).collect()
}

fn ratios(policy: &LodPolicy, levels: u32) {
    println!("Preset {:?}, base {:.2}, step {:.2}", policy.preset, policy.base_ratio, policy.step);
    for (level, ratio) in ratio_table(policy, levels) {
        println!("  LOD{}: {:>6.1}%", level, ratio * 100.0);
    }
}

/// Run a full generation for `file` against a scratch scene where every
/// material gets a source mesh of `polys` polygons
pub fn preview_scene(file: &Path, polys: usize, policy: LodPolicy) -> Result<(LodSession, Scene)> {
    let mut session = LodSession::new(Preferences::default());
    session.settings.policy = policy;
    session
        .load_template(file)
        .with_context(|| format!("Failed to load {}", file.display()))?;

    let mut scene = Scene::new();
    for index in 0..session.slots().len() {
        let source = scene.add_mesh(format!("{}_source", session.slots()[index].name()), polys);
        session.assign(&scene, index, source)?;
    }
    session.generate(&mut scene)?;
    Ok((session, scene))
}

fn preview(file: &Path, polys: usize, policy: LodPolicy) -> Result<()> {
    let (session, scene) = preview_scene(file, polys, policy)?;

    println!("Per material ({} source polygons):", polys);
    for slot in session.slots() {
        let counts: Vec<String> = session
            .settings
            .policy
            .preview(polys, slot.entry.min_lod, slot.entry.max_lod)
            .into_iter()
            .map(|(level, count)| format!("LOD{level} {count}"))
            .collect();
        println!("  {:<32} {}", slot.name(), counts.join(", "));
    }

    println!("Scene totals:");
    for (level, count, percent) in session.poly_counts(&scene).rows() {
        println!("  LOD{}: {:>10} ({:.1}%)", level, count, percent);
    }
    Ok(())
}

fn prefs(file: &Path, reset: bool) -> Result<()> {
    let prefs = if reset {
        let prefs = Preferences::default();
        prefs.save(file)?;
        log::info!("Reset preferences at {}", file.display());
        prefs
    } else {
        Preferences::load_or_default(file)
    };
    println!("{}", serde_json::to_string_pretty(&prefs)?);
    Ok(())
}

//! Silva CLI - forest influence estimation for proposed cutblocks

mod config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use silva_algorithms::engine::Layer;
use silva_algorithms::influence::run_forest_influence;
use silva_algorithms::overmature::immediate_overmature;
use silva_algorithms::vector::bounding_box;
use silva_algorithms::MemoryEngine;
use silva_core::{rows_without_influence, Error, GeometryEngine, ResampleMethod, ScratchWorkspace};

use config::{override_with, RunConfig};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "silva")]
#[command(author, version, about = "Forest influence estimation for proposed cutblocks", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// TOML run file; flags override its values
    #[arg(short, long, global = true, env = "SILVA_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate the share of a cutblock under forest influence
    Influence {
        /// Cutblock boundary polygons
        #[arg(long)]
        cutblock: Option<String>,
        /// Retention polygons
        #[arg(long)]
        retention: Option<String>,
        /// Non-merchantable / non-forest polygons
        #[arg(long)]
        non_merch: Option<String>,
        /// Tree points with heights (preferred over --chm)
        #[arg(long)]
        trees: Option<String>,
        /// Canopy height model raster
        #[arg(long)]
        chm: Option<String>,
        /// Adjacent cutblock polygons
        #[arg(long)]
        adjacent: Option<String>,
        /// Single tree points inside the block
        #[arg(long)]
        single_trees: Option<String>,
        /// Output directory for the report and influence polygon
        #[arg(short, long)]
        workspace: Option<PathBuf>,
        /// Cell size of the generalized height grid
        #[arg(long)]
        cell_size: Option<f64>,
        /// Resampling kernel: nearest, bilinear
        #[arg(long)]
        resample: Option<String>,
        /// Boundary attribute holding the block id
        #[arg(long)]
        block_id_field: Option<String>,
    },
    /// Immediate overmature share of vegetation around proposed blocks
    Overmature {
        /// Proposed block polygons
        #[arg(long)]
        blocks: Option<String>,
        /// Vegetation inventory polygons
        #[arg(long)]
        vegetation: Option<String>,
        /// Output directory for the report
        #[arg(short, long)]
        workspace: Option<PathBuf>,
        /// Width of the ring around the blocks
        #[arg(long)]
        ring_width: Option<f64>,
    },
    /// Show information about a raster or vector dataset
    Info {
        /// Input dataset (.tif, .geojson)
        input: PathBuf,
    },
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to install log subscriber")
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg}").unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn parse_resample(s: &str) -> Result<ResampleMethod> {
    match s.to_lowercase().as_str() {
        "nearest" | "nn" => Ok(ResampleMethod::Nearest),
        "bilinear" | "linear" => Ok(ResampleMethod::Bilinear),
        _ => anyhow::bail!("Unknown resampling method: {}. Use nearest or bilinear.", s),
    }
}

/// Block ids become file names; keep them portable
fn file_stem_for(block_id: &str) -> String {
    let stem: String = block_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if stem.is_empty() {
        "block".to_string()
    } else {
        stem
    }
}

fn workspace_dir(flag: Option<PathBuf>, config: &RunConfig) -> PathBuf {
    flag.or_else(|| config.workspace.clone())
        .unwrap_or_else(|| PathBuf::from("."))
}

fn print_rows<'a>(rows: impl IntoIterator<Item = (&'a str, String)>) {
    for (label, value) in rows {
        println!("  {:<54} {}", format!("{}:", label), value);
    }
}

fn write_json<T: serde::Serialize>(value: &T, path: &Path) -> Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    std::fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))
}

fn done(name: &str, path: &Path, elapsed: std::time::Duration) {
    println!("{} saved to: {}", name, path.display());
    println!("  Processing time: {:.2?}", elapsed);
}

// ─── Commands ───────────────────────────────────────────────────────────

#[allow(clippy::too_many_arguments)]
fn influence(
    mut config: RunConfig,
    cutblock: Option<String>,
    retention: Option<String>,
    non_merch: Option<String>,
    trees: Option<String>,
    chm: Option<String>,
    adjacent: Option<String>,
    single_trees: Option<String>,
    workspace: Option<PathBuf>,
    cell_size: Option<f64>,
    resample: Option<String>,
    block_id_field: Option<String>,
) -> Result<()> {
    let paths = &mut config.inputs;
    override_with(&mut paths.cutblock, cutblock);
    override_with(&mut paths.retention, retention);
    override_with(&mut paths.non_merch, non_merch);
    if trees.is_some() {
        paths.tree_layer = trees;
    }
    if chm.is_some() {
        paths.chm = chm;
    }
    if adjacent.is_some() {
        paths.adjacent_cutblocks = adjacent;
    }
    if single_trees.is_some() {
        paths.single_trees = single_trees;
    }

    let params = &mut config.influence;
    override_with(&mut params.cell_size, cell_size);
    override_with(&mut params.resample_method, resample.as_deref().map(parse_resample).transpose()?);
    override_with(&mut params.block_id_field, block_id_field);

    let out_dir = workspace_dir(workspace, &config);
    let workspace = ScratchWorkspace::create(&out_dir).context("Failed to create workspace directory")?;
    let engine = MemoryEngine::new();

    let pb = spinner("Estimating forest influence...");
    let start = Instant::now();
    let outcome = run_forest_influence(&engine, &config.inputs, workspace, &config.influence);
    let elapsed = start.elapsed();
    pb.finish_and_clear();

    let result = match outcome {
        Ok(result) => result,
        Err(Error::DivisionByZero {
            quantity,
            totals: Some(totals),
            block_id,
            single_tree_count,
        }) => {
            println!("Forest influence could not be computed:");
            print_rows(rows_without_influence(block_id.as_deref(), single_tree_count, &totals));
            anyhow::bail!("{} is 0", quantity);
        }
        Err(e) => return Err(e).context("Forest influence estimation failed"),
    };

    let stem = file_stem_for(&result.block_id);
    let map_image = match &result.influence_layer {
        Some(layer) => {
            let path = out_dir.join(format!("{}_forest_influence.geojson", stem));
            let pb = spinner("Writing influence polygon...");
            engine.save(layer, &path).context("Failed to write influence polygon")?;
            pb.finish_and_clear();
            Some(path.display().to_string())
        }
        None => None,
    };

    let record = result.to_record(map_image);
    let report = out_dir.join(format!("{}_forest_influence.json", stem));
    write_json(&record, &report)?;

    println!("Forest influence for block {}:", record.block_id);
    print_rows(record.rows());
    done("Report", &report, elapsed);
    Ok(())
}

fn overmature(
    mut config: RunConfig,
    blocks: Option<String>,
    vegetation: Option<String>,
    workspace: Option<PathBuf>,
    ring_width: Option<f64>,
) -> Result<()> {
    override_with(&mut config.overmature.ring_width, ring_width);
    let blocks = blocks
        .or_else(|| Some(config.inputs.cutblock.clone()).filter(|p| !p.trim().is_empty()))
        .context("No block layer given (--blocks or inputs.cutblock)")?;
    let vegetation = vegetation
        .or_else(|| config.vegetation.clone())
        .context("No vegetation layer given (--vegetation or vegetation)")?;

    let out_dir = workspace_dir(workspace, &config);
    let workspace = ScratchWorkspace::create(&out_dir).context("Failed to create workspace directory")?;
    let engine = MemoryEngine::new();

    let pb = spinner("Reading layers...");
    let blocks = engine.open(&blocks).context("Failed to open block layer")?;
    let vegetation = engine.open(&vegetation).context("Failed to open vegetation layer")?;
    pb.finish_and_clear();

    let start = Instant::now();
    let result = immediate_overmature(&engine, &blocks, &vegetation, &workspace, &config.overmature)
        .context("Overmature assessment failed")?;
    let elapsed = start.elapsed();

    let report = out_dir.join("immediate_overmature.json");
    write_json(&result, &report)?;

    println!("Immediate overmature:");
    print_rows([
        ("Block_ID", result.block_ids.clone()),
        ("Total_Area", result.total_area.to_string()),
        ("Overmature_Area", result.overmature_area.to_string()),
        ("Immediate_OM", format!("{:.2}", result.percent)),
    ]);
    done("Report", &report, elapsed);
    Ok(())
}

fn info_command(input: &Path) -> Result<()> {
    let engine = MemoryEngine::new();
    let pb = spinner("Reading dataset...");
    let path = input.to_string_lossy();
    let handle = engine.open(&path).context("Failed to read dataset")?;
    let layer = engine.layer(&handle)?;
    pb.finish_and_clear();

    println!("File: {}", input.display());
    match &layer {
        Layer::Raster(raster) => {
            let (rows, cols) = raster.shape();
            let bounds = raster.bounds();
            let stats = raster.statistics();
            info!("Input: {} x {}", cols, rows);

            println!("Type: raster");
            println!("Dimensions: {} x {} ({} cells)", cols, rows, raster.len());
            println!("Cell size: {}", raster.cell_size());
            println!(
                "Bounds: ({:.6}, {:.6}) - ({:.6}, {:.6})",
                bounds.0, bounds.1, bounds.2, bounds.3
            );
            if let Some(crs) = raster.crs() {
                println!("CRS: {}", crs);
            }
            if let Some(nodata) = raster.nodata() {
                println!("NoData: {}", nodata);
            }
            println!("\nStatistics:");
            if let Some(min) = stats.min {
                println!("  Min: {:.4}", min);
            }
            if let Some(max) = stats.max {
                println!("  Max: {:.4}", max);
            }
            if let Some(mean) = stats.mean {
                println!("  Mean: {:.4}", mean);
            }
            println!(
                "  Valid cells: {} ({:.1}%)",
                stats.valid_count,
                100.0 * stats.valid_count as f64 / raster.len().max(1) as f64
            );
        }
        Layer::Polygons(fc) | Layer::Points(fc) => {
            println!("Type: {} vector", layer.kind());
            println!("Features: {}", fc.len());
            if let Some(crs) = &fc.crs {
                println!("CRS: {}", crs);
            }
            let extent = fc
                .iter()
                .filter_map(|f| f.geometry.as_ref().and_then(bounding_box))
                .reduce(|a, b| a.merge(&b));
            if let Some(bb) = extent {
                println!(
                    "Bounds: ({:.6}, {:.6}) - ({:.6}, {:.6})",
                    bb.min_x, bb.min_y, bb.max_x, bb.max_y
                );
            }
            if matches!(layer, Layer::Polygons(_)) {
                println!("Area: {:.2}", engine.area_of(&handle)?);
            }
        }
    }
    Ok(())
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    let config = match &cli.config {
        Some(path) => RunConfig::load(path)?,
        None => RunConfig::default(),
    };

    match cli.command {
        Commands::Influence {
            cutblock,
            retention,
            non_merch,
            trees,
            chm,
            adjacent,
            single_trees,
            workspace,
            cell_size,
            resample,
            block_id_field,
        } => influence(
            config,
            cutblock,
            retention,
            non_merch,
            trees,
            chm,
            adjacent,
            single_trees,
            workspace,
            cell_size,
            resample,
            block_id_field,
        ),
        Commands::Overmature {
            blocks,
            vegetation,
            workspace,
            ring_width,
        } => overmature(config, blocks, vegetation, workspace, ring_width),
        Commands::Info { input } => info_command(&input),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_resample() {
        assert_eq!(parse_resample("Bilinear").unwrap(), ResampleMethod::Bilinear);
        assert_eq!(parse_resample("nn").unwrap(), ResampleMethod::Nearest);
        assert!(parse_resample("cubic").is_err());
    }

    #[test]
    fn test_file_stem_for() {
        assert_eq!(file_stem_for("RB-101"), "RB-101");
        assert_eq!(file_stem_for("CP 12/3"), "CP_12_3");
        assert_eq!(file_stem_for(""), "block");
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::try_parse_from([
            "silva",
            "--verbose",
            "influence",
            "--cutblock",
            "block.geojson",
            "--chm",
            "chm.tif",
            "--cell-size",
            "10",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Influence {
                cutblock,
                chm,
                cell_size,
                trees,
                ..
            } => {
                assert_eq!(cutblock.as_deref(), Some("block.geojson"));
                assert_eq!(chm.as_deref(), Some("chm.tif"));
                assert_eq!(cell_size, Some(10.0));
                assert!(trees.is_none());
            }
            _ => panic!("expected influence command"),
        }
    }

    #[test]
    fn test_workspace_flag_overrides_config() {
        let config = RunConfig::parse("workspace = \"from_file\"").unwrap();
        assert_eq!(workspace_dir(None, &config), PathBuf::from("from_file"));
        assert_eq!(workspace_dir(Some("flag".into()), &config), PathBuf::from("flag"));
    }
}

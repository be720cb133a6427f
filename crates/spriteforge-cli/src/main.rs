use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use globset::{Glob, GlobSet, GlobSetBuilder};
use image::{DynamicImage, ImageReader};
use serde::Deserialize;
use spriteforge_core::format::{FormatGroup, formats_in, free_formats};
use spriteforge_core::prelude::*;
use tracing::{error, info, warn};
use walkdir::WalkDir;

#[derive(Parser, Debug)]
#[command(
    name = "spriteforge",
    about = "Trim, pack and export sprites into texture atlases",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Show progress bars (disable with --progress false or --quiet)
    #[arg(long, default_value_t = true, action=ArgAction::Set, global=true, help_heading = "Logging/UX")]
    progress: bool,
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action=ArgAction::Count, global=true, help_heading = "Logging/UX")]
    verbose: u8,
    /// Quiet mode (overrides verbose)
    #[arg(
        short,
        long,
        default_value_t = false,
        global = true,
        help_heading = "Logging/UX"
    )]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Pack images and write the atlas image(s), description and usage snippet
    Pack(PackArgs),
    /// List the supported export formats
    Formats,
    /// Cut a sprite sheet into individual frames
    Split(SplitArgs),
    /// Report the trimmed bounds of each image without packing
    Trim(TrimArgs),
}

#[derive(Parser, Debug, Clone)]
struct PackArgs {
    // Input/Output
    /// Input file or directory
    #[arg(help_heading = "Input/Output")]
    input: PathBuf,
    /// Output directory
    #[arg(short, long, default_value = "out", help_heading = "Input/Output")]
    out_dir: PathBuf,
    /// Atlas base name (files will be name.png/name.<ext>, or name.zip for several bins)
    #[arg(short, long, default_value = "atlas", help_heading = "Input/Output")]
    name: String,
    /// YAML config file path (values override the flags below)
    #[arg(long, help_heading = "Input/Output")]
    config: Option<PathBuf>,
    /// Include patterns (glob). If set, only files matching any pattern are considered
    #[arg(long, help_heading = "Input/Output")]
    include: Vec<String>,
    /// Exclude patterns (glob). Files matching any pattern will be ignored
    #[arg(long, help_heading = "Input/Output")]
    exclude: Vec<String>,

    // Layout
    /// Max bin width
    #[arg(long, default_value_t = 512, help_heading = "Layout")]
    max_width: u32,
    /// Max bin height
    #[arg(long, default_value_t = 512, help_heading = "Layout")]
    max_height: u32,
    /// Pixels between neighbouring sprites
    #[arg(long, default_value_t = 2, help_heading = "Layout")]
    padding: u32,
    /// Margin kept free along the bin edges
    #[arg(long, default_value_t = 0, help_heading = "Layout")]
    border: u32,
    /// Round bin sizes up to powers of two
    #[arg(long, default_value_t = true, action=ArgAction::Set, help_heading = "Layout")]
    pot: bool,
    /// Allow 90 degree rotation
    #[arg(long, default_value_t = false, help_heading = "Layout")]
    allow_rotation: bool,

    // Algorithm
    /// MaxRects heuristic: bssf|baf|blsf|bl|cp
    #[arg(long, default_value = "bssf", help_heading = "Algorithm")]
    heuristic: String,
    /// Insertion order: area_desc|max_side_desc|height_desc|width_desc|id_asc|none
    #[arg(long, default_value = "area_desc", help_heading = "Algorithm")]
    sort_order: String,

    // Sprite processing
    /// Trim transparent borders before packing
    #[arg(long, default_value_t = true, action=ArgAction::Set, help_heading = "Sprite processing")]
    trim: bool,

    // Output
    /// Export format id (see `spriteforge formats`)
    #[arg(short, long, default_value = "json", help_heading = "Output")]
    format: String,
    /// Skip the watermark on the atlas image(s)
    #[arg(long, default_value_t = false, help_heading = "Output")]
    no_watermark: bool,
    /// Write packing statistics to this JSON file
    #[arg(long, help_heading = "Output")]
    export_stats: Option<PathBuf>,

    // Debug
    /// Print the effective config and exit
    #[arg(long, default_value_t = false, help_heading = "Debug")]
    print_config: bool,
    /// Format for --print-config: json|yaml
    #[arg(long, default_value = "json", help_heading = "Debug")]
    print_config_format: String,
    /// Compute the layout only; nothing is written
    #[arg(long, default_value_t = false, help_heading = "Debug")]
    dry_run: bool,
}

#[derive(Parser, Debug, Clone)]
struct SplitArgs {
    /// Sprite sheet image
    input: PathBuf,
    /// Number of frames to extract
    #[arg(long)]
    frames: u32,
    /// Grid rows (requires --cols); detected from the frame count when omitted
    #[arg(long, requires = "cols")]
    rows: Option<u32>,
    /// Grid columns (requires --rows)
    #[arg(long, requires = "rows")]
    cols: Option<u32>,
    /// Output directory
    #[arg(short, long, default_value = "frames")]
    out_dir: PathBuf,
    /// Frame file prefix (frames are written as prefix_<i>.png)
    #[arg(long, default_value = "frame")]
    prefix: String,
}

#[derive(Parser, Debug, Clone)]
struct TrimArgs {
    /// Input file or directory
    input: PathBuf,
    /// Include patterns (glob)
    #[arg(long)]
    include: Vec<String>,
    /// Exclude patterns (glob)
    #[arg(long)]
    exclude: Vec<String>,
    /// Print the report as JSON
    #[arg(long, default_value_t = false)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing_with_level(cli.quiet, cli.verbose);
    let progress = cli.progress && !cli.quiet;
    match &cli.command {
        Commands::Pack(args) => run_pack(args, progress),
        Commands::Formats => {
            run_formats();
            Ok(())
        }
        Commands::Split(args) => run_split(args),
        Commands::Trim(args) => run_trim(args, progress),
    }
}

fn run_pack(args: &PackArgs, show_progress: bool) -> anyhow::Result<()> {
    let cfg = build_config(args)?;
    if args.print_config {
        let s = match args.print_config_format.to_ascii_lowercase().as_str() {
            "yaml" | "yml" => serde_yaml::to_string(&cfg)?,
            _ => serde_json::to_string_pretty(&cfg)?,
        };
        println!("{s}");
        return Ok(());
    }
    cfg.validate().context("invalid packing config")?;

    let paths = gather_paths(&args.input, &args.include, &args.exclude)?;
    if paths.is_empty() {
        anyhow::bail!("no images found under {}", args.input.display());
    }
    let mut sprites = load_sprites_with_progress(&args.input, &paths, show_progress)?;
    info!(count = sprites.len(), "loaded sprites");

    let started = Instant::now();
    let trim = prepare_sprites(&mut sprites, &cfg);
    for id in &trim.fully_transparent {
        warn!(sprite = %id, "fully transparent; packed at raw size");
    }
    let sizes: Vec<SpriteSize> = sprites.iter().map(Sprite::packing_size).collect();
    let result = pack(&sizes, &cfg);
    let elapsed = started.elapsed();
    for r in &result.rejected {
        error!(sprite = %r.sprite_id, error = %r.error, "sprite left out");
    }

    let stats = result.stats();
    info!(
        elapsed_ms = elapsed.as_millis() as u64,
        bins = stats.num_bins,
        "{}",
        stats.summary()
    );

    if let Some(path) = &args.export_stats {
        let json = serde_json::to_string_pretty(&stats)?;
        fs::write(path, json).with_context(|| format!("write stats {}", path.display()))?;
    }

    if args.dry_run {
        info!("dry run: no files written");
        return Ok(());
    }
    if result.bins.is_empty() {
        anyhow::bail!("nothing could be packed");
    }

    fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("create out_dir {}", args.out_dir.display()))?;
    let opts = ExportOptions {
        watermark: !args.no_watermark,
    };
    let bundle = export_atlas(&result.bins, &sprites, &cfg, &args.name, &opts)
        .with_context(|| format!("export {} as {}", args.name, cfg.export_format))?;
    for blob in &bundle.blobs {
        let path = args.out_dir.join(&blob.name);
        fs::write(&path, &blob.bytes).with_context(|| format!("write {}", path.display()))?;
        info!(file = %path.display(), bytes = blob.bytes.len(), "wrote");
    }
    if !result.is_complete() {
        anyhow::bail!("{} sprite(s) could not be packed", result.rejected.len());
    }
    Ok(())
}

fn run_formats() {
    let free = free_formats();
    for group in [FormatGroup::General, FormatGroup::Web, FormatGroup::Engines] {
        println!("{}:", group.label());
        for f in formats_in(group) {
            let tag = if free.contains(&f.id) { " (free)" } else { "" };
            println!("  {:<12} {:<28} .{}{}", f.id, f.label, f.extension, tag);
        }
    }
}

fn run_split(args: &SplitArgs) -> anyhow::Result<()> {
    let sheet = load_image(&args.input)
        .with_context(|| format!("load sheet {}", args.input.display()))?
        .to_rgba8();
    let grid = args.rows.zip(args.cols);
    let res = split_sheet(&sheet, args.frames, grid)?;
    info!(
        rows = res.rows,
        cols = res.cols,
        detected = res.detected,
        "split {}x{} cells",
        res.cell_width,
        res.cell_height
    );
    fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("create out_dir {}", args.out_dir.display()))?;
    for (i, frame) in res.frames.iter().enumerate() {
        let path = args.out_dir.join(format!("{}_{}.png", args.prefix, i));
        frame
            .save(&path)
            .with_context(|| format!("write {}", path.display()))?;
    }
    info!(frames = res.frames.len(), out = %args.out_dir.display(), "frames written");
    Ok(())
}

fn run_trim(args: &TrimArgs, show_progress: bool) -> anyhow::Result<()> {
    let paths = gather_paths(&args.input, &args.include, &args.exclude)?;
    let mut sprites = load_sprites_with_progress(&args.input, &paths, show_progress)?;
    let report = prepare_sprites(&mut sprites, &PackingConfig::default());
    if args.json {
        let rows: Vec<serde_json::Value> = sprites
            .iter()
            .map(|s| {
                serde_json::json!({
                    "id": s.id,
                    "status": s.trim_status,
                    "source": { "w": s.width, "h": s.height },
                    "trimRect": s.trim_rect,
                })
            })
            .collect();
        let out = serde_json::json!({ "sprites": rows, "summary": report });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }
    for s in &sprites {
        match s.trim_rect {
            Some(r) if s.trimmed => println!(
                "{}: {}x{} -> {}x{} at ({}, {})",
                s.id,
                s.pixels().width(),
                s.pixels().height(),
                r.w,
                r.h,
                r.x,
                r.y
            ),
            _ => println!("{}: {:?}", s.id, s.trim_status),
        }
    }
    println!(
        "trimmed: {}, fully transparent: {}, no alpha: {}",
        report.trimmed,
        report.fully_transparent.len(),
        report.no_alpha
    );
    Ok(())
}

fn build_config(args: &PackArgs) -> anyhow::Result<PackingConfig> {
    let heuristic: MaxRectsHeuristic = args
        .heuristic
        .parse()
        .map_err(|_| anyhow::anyhow!("unknown heuristic: {}", args.heuristic))?;
    let sort_order = parse_sort_order(&args.sort_order)?;
    let cfg = PackingConfig::builder()
        .with_max_dimensions(args.max_width, args.max_height)
        .padding(args.padding)
        .border(args.border)
        .pot(args.pot)
        .allow_rotation(args.allow_rotation)
        .trim_transparency(args.trim)
        .export_format(args.format.clone())
        .heuristic(heuristic)
        .sort_order(sort_order)
        .build();
    match &args.config {
        Some(path) => {
            let file = fs::read_to_string(path)
                .with_context(|| format!("read config {}", path.display()))?;
            let y: YamlConfig = serde_yaml::from_str(&file)
                .with_context(|| format!("parse config {}", path.display()))?;
            y.into_packing_config(cfg)
        }
        None => Ok(cfg),
    }
}

fn gather_paths(
    path: &Path,
    include: &[String],
    exclude: &[String],
) -> anyhow::Result<Vec<PathBuf>> {
    let inc_set = build_globset(include)?;
    let exc_set = build_globset(exclude)?;
    let mut list: Vec<PathBuf> = Vec::new();
    if path.is_file() {
        if !should_skip(path, inc_set.as_ref(), exc_set.as_ref()) && is_image(path) {
            list.push(path.to_path_buf());
        }
    } else {
        for entry in WalkDir::new(path)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let p = entry.path();
            if p.is_file() && !should_skip(p, inc_set.as_ref(), exc_set.as_ref()) && is_image(p) {
                list.push(p.to_path_buf());
            }
        }
    }
    Ok(list)
}

fn build_globset(patterns: &[String]) -> anyhow::Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut b = GlobSetBuilder::new();
    for pat in patterns {
        b.add(Glob::new(pat).with_context(|| format!("bad glob {pat}"))?);
    }
    Ok(Some(b.build()?))
}

fn should_skip(p: &Path, include: Option<&GlobSet>, exclude: Option<&GlobSet>) -> bool {
    let s = p.to_string_lossy().replace('\\', "/");
    if let Some(ex) = exclude {
        if ex.is_match(&s) {
            return true;
        }
    }
    if let Some(inc) = include {
        if !inc.is_match(&s) {
            return true;
        }
    }
    false
}

fn is_image(p: &Path) -> bool {
    matches!(
        p.extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_ascii_lowercase()),
        Some(ext) if matches!(ext.as_str(), "png" | "jpg" | "jpeg" | "bmp" | "tga" | "gif")
    )
}

/// Sprite id and name are the path relative to the input root, with `/` separators.
fn sprite_key(root: &Path, p: &Path) -> String {
    let rel = if root.is_file() {
        p.file_name().map(Path::new).unwrap_or(p)
    } else {
        p.strip_prefix(root).unwrap_or(p)
    };
    rel.to_string_lossy().replace('\\', "/")
}

fn load_sprites_with_progress(
    root: &Path,
    paths: &[PathBuf],
    progress: bool,
) -> anyhow::Result<Vec<Sprite>> {
    use indicatif::{ProgressBar, ProgressStyle};
    let bar = if progress {
        let b = ProgressBar::new(paths.len() as u64);
        b.set_style(ProgressStyle::with_template(
            "{spinner:.green} loading {pos}/{len} [{elapsed_precise}] {wide_msg}",
        )?);
        Some(b)
    } else {
        None
    };
    let mut list = Vec::with_capacity(paths.len());
    for p in paths {
        let msg = p.file_name().and_then(|s| s.to_str()).unwrap_or("");
        if let Some(b) = &bar {
            b.set_message(msg.to_string());
        }
        match load_image(p) {
            Ok(img) => {
                let key = sprite_key(root, p);
                list.push(Sprite::new(key.clone(), key, img));
            }
            Err(e) => {
                error!(?p, error = %e, "skip image");
            }
        }
        if let Some(b) = &bar {
            b.inc(1);
        }
    }
    if let Some(b) = &bar {
        b.finish_and_clear();
    }
    Ok(list)
}

fn load_image(p: &Path) -> anyhow::Result<DynamicImage> {
    let img = ImageReader::open(p)?.with_guessed_format()?.decode()?;
    Ok(img)
}

fn init_tracing_with_level(quiet: bool, verbose: u8) {
    let level = if quiet {
        "error".to_string()
    } else {
        match verbose {
            0 => "info".into(),
            1 => "debug".into(),
            _ => "trace".into(),
        }
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_target(false)
        .try_init();
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct YamlConfig {
    max_width: Option<u32>,
    max_height: Option<u32>,
    padding: Option<u32>,
    border: Option<u32>,
    pot: Option<bool>,
    allow_rotation: Option<bool>,
    trim: Option<bool>,
    format: Option<String>,
    heuristic: Option<String>,
    sort_order: Option<String>,
    worker_threshold: Option<usize>,
}

impl YamlConfig {
    fn into_packing_config(self, mut cfg: PackingConfig) -> anyhow::Result<PackingConfig> {
        if let Some(v) = self.max_width {
            cfg.max_width = v;
        }
        if let Some(v) = self.max_height {
            cfg.max_height = v;
        }
        if let Some(v) = self.padding {
            cfg.padding = v;
        }
        if let Some(v) = self.border {
            cfg.border = v;
        }
        if let Some(v) = self.pot {
            cfg.pot = v;
        }
        if let Some(v) = self.allow_rotation {
            cfg.allow_rotation = v;
        }
        if let Some(v) = self.trim {
            cfg.trim_transparency = v;
        }
        if let Some(v) = self.format {
            cfg.export_format = v;
        }
        if let Some(v) = self.heuristic {
            cfg.heuristic = v
                .parse()
                .map_err(|_| anyhow::anyhow!("unknown heuristic: {v}"))?;
        }
        if let Some(v) = self.sort_order {
            cfg.sort_order = parse_sort_order(&v)?;
        }
        if let Some(v) = self.worker_threshold {
            cfg.worker_threshold = v;
        }
        Ok(cfg)
    }
}

fn parse_sort_order(s: &str) -> anyhow::Result<SortOrder> {
    s.parse()
        .map_err(|_| anyhow::anyhow!("unknown sort order: {}", s))
}

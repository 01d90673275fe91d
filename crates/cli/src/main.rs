//! Image row cache CLI.
//!
//! This binary hosts a cache director configured from the command line. It performs:
//! 1. **Run:** Create synthetic images, write a deterministic pattern through the cache,
//!    read it back under memory pressure, verify it, and print statistics.
//! 2. **Plan:** Print the block layout an image would get under a given configuration.

mod workload;

use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use rowswap_core::image::Geometry;
use rowswap_core::{CacheConfig, CacheError, Director, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::workload::{ScanOrder, Workload};

#[derive(Parser, Debug)]
#[command(
    name = "rowswap",
    author,
    version,
    about = "Disk-backed, budget-limited image row cache",
    long_about = "Exercise the row cache with synthetic images, or plan the block layout of an image.\n\nExamples:\n  rowswap run --images 2 --width 4096 --height 20000 -m 64\n  rowswap run --order interleaved -b 256 -m 8 --tmp-dir /var/tmp -vv\n  rowswap plan --width 30000 --height 15000 --pixel-bytes 6 -b 2048"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace). Overrides RUST_LOG.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write, read back and verify synthetic images through the cache.
    Run {
        /// Number of images sharing the budget.
        #[arg(long, default_value_t = 2)]
        images: usize,

        /// Scan order across images.
        #[arg(long, value_enum, default_value_t = ScanOrder::Sequential)]
        order: ScanOrder,

        #[command(flatten)]
        image: ImageArgs,

        #[command(flatten)]
        cache: CacheArgs,
    },

    /// Print the block layout of an image without allocating it.
    Plan {
        #[command(flatten)]
        image: ImageArgs,

        #[command(flatten)]
        cache: CacheArgs,
    },
}

/// Image dimensions.
#[derive(Args, Debug, Clone, Copy)]
struct ImageArgs {
    /// Pixels per row.
    #[arg(long, default_value_t = 4096)]
    width: usize,

    /// Number of rows.
    #[arg(long, default_value_t = 4096)]
    height: usize,

    /// Bytes per pixel.
    #[arg(long, default_value_t = 3)]
    pixel_bytes: usize,
}

/// Cache configuration; flags override the JSON file, which overrides the defaults.
#[derive(Args, Debug, Clone)]
struct CacheArgs {
    /// Block size in KiB.
    #[arg(short = 'b', long)]
    block_size_kb: Option<usize>,

    /// Memory budget shared by all images, in MiB.
    #[arg(short = 'm', long)]
    cache_mb: Option<usize>,

    /// Directory for spill files (default: the system temp directory).
    #[arg(long)]
    tmp_dir: Option<PathBuf>,

    /// JSON configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
}

impl CacheArgs {
    /// Builds the validated configuration from the file and flag overrides.
    fn resolve(&self) -> Result<CacheConfig> {
        let mut config = match &self.config {
            Some(path) => CacheConfig::from_file(path)?,
            None => CacheConfig::default(),
        };
        if let Some(kb) = self.block_size_kb {
            config = config.with_block_size_kb(kb);
        }
        if let Some(mb) = self.cache_mb {
            config = config.with_managed_mb(mb);
        }
        if let Some(dir) = &self.tmp_dir {
            config = config.with_temp_dir(dir);
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Run {
            images,
            order,
            image,
            cache,
        } => cmd_run(images, order, image, &cache),
        Commands::Plan { image, cache } => cmd_plan(image, &cache),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            report_error(&e);
            ExitCode::FAILURE
        }
    }
}

/// Installs the stderr subscriber; `-v` flags take precedence over `RUST_LOG`.
fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Prints an error with its source chain and, for budget errors, the flags to adjust.
fn report_error(error: &CacheError) {
    eprintln!("\n[!] {error}");
    let mut source = error.source();
    while let Some(cause) = source {
        eprintln!("    caused by: {cause}");
        source = cause.source();
    }
    if matches!(
        error,
        CacheError::Thrash { .. } | CacheError::RowTooWide { .. }
    ) {
        eprintln!("    adjust the budget with -m <MiB> or the block size with -b <KiB>");
    }
}

/// Runs the synthetic workload and verifies every row.
///
/// # Arguments
///
/// * `images` - Number of images to create.
/// * `order` - Whether images are scanned one after another or row-interleaved.
/// * `image` - Dimensions of every image.
/// * `cache` - Configuration flags.
///
/// # Returns
///
/// Success if every row read back intact; failure on any mismatch.
fn cmd_run(
    images: usize,
    order: ScanOrder,
    image: ImageArgs,
    cache: &CacheArgs,
) -> Result<ExitCode> {
    let mut director = Director::new(cache.resolve()?)?;
    print_config(director.config());

    let workload = Workload::create(
        &mut director,
        images,
        image.width,
        image.height,
        image.pixel_bytes,
    )?;
    println!(
        "[*] {} image(s) of {} x {} x {} B, {} scan",
        images, image.width, image.height, image.pixel_bytes, order
    );

    workload.write(&mut director, order)?;
    info!("write pass complete");
    director.reset_cache_misses();
    let mismatches = workload.verify(&mut director, order)?;
    info!(mismatches, "verify pass complete");

    println!();
    director.stats().print();
    for stats in director.all_cache_stats() {
        stats.print();
    }
    let _ = director.shutdown();

    if mismatches > 0 {
        eprintln!("\n[!] {mismatches} row(s) did not read back intact");
        return Ok(ExitCode::FAILURE);
    }
    println!("\n[*] All rows verified");
    Ok(ExitCode::SUCCESS)
}

/// Prints the derived layout of one image.
fn cmd_plan(image: ImageArgs, cache: &CacheArgs) -> Result<ExitCode> {
    let config = cache.resolve()?;
    print_config(&config);

    let g = Geometry::new(
        image.width,
        image.height,
        image.pixel_bytes,
        config.block_size_bytes,
    )?;
    let image_bytes = g.row_bytes() * g.height();
    println!("row_bytes                {}", g.row_bytes());
    println!("lines_per_block          {}", g.lines_per_block());
    println!("blocks_needed            {}", g.blocks_needed());
    println!("image_bytes              {image_bytes}");
    println!("managed_blocks           {}", config.managed_blocks());
    println!(
        "fully_resident           {}",
        g.blocks_needed() <= config.managed_blocks()
    );
    Ok(ExitCode::SUCCESS)
}

fn print_config(config: &CacheConfig) {
    println!(
        "Configuration: block {} KiB  budget {} MiB ({} blocks)  spill dir {}",
        config.block_size_bytes / 1024,
        config.managed_bytes / (1024 * 1024),
        config.managed_blocks(),
        config
            .temp_dir
            .as_ref()
            .map_or_else(|| "<system temp>".to_owned(), |d| d.display().to_string())
    );
}

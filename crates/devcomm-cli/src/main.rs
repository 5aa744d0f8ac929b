//! Command-line interface for devcomm address mapping.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use devcomm_core::prelude::*;
use devcomm_core::{DevCommFilterInfo as FilterInfo, Error as DevCommError};
use serde::Serialize;

/// devcomm - Map device and PLC memory addresses onto platform memory.
#[derive(Parser, Debug)]
#[command(name = "devcomm")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Action to perform.
    #[command(subcommand)]
    command: Command,

    /// TOML config file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print results as JSON.
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Command {
    /// Load a mapping file and report loaded and skipped lines.
    Check {
        /// Mapping file to check.
        #[arg(required = true)]
        file: PathBuf,
        /// How to interpret the file.
        #[arg(short, long, value_enum, default_value_t = ModeArg::Auto)]
        mode: ModeArg,
    },
    /// Swap a device filter (e.g. DEV1:INWORD) for its mapped address.
    SwapDev {
        /// Filter expression.
        filter: String,
        /// Device mapping file (defaults to the configured path).
        #[arg(short, long)]
        device_map: Option<PathBuf>,
        /// Active filter criteria, `name=value`.
        #[arg(long = "filter-info", value_parser = parse_filter_info)]
        filter_info: Vec<FilterInfo>,
    },
    /// Swap a PLC filter (e.g. M1:V1:WORD) for its mapped address.
    SwapPlc {
        /// Filter expression.
        filter: String,
        /// PLC mapping file (defaults to the configured path).
        #[arg(short, long)]
        plc_map: Option<PathBuf>,
        /// Secondary filter over non-key fields, e.g. `target=D100`.
        #[arg(short, long)]
        extra: Option<String>,
        /// Active filter criteria, `name=value`.
        #[arg(long = "filter-info", value_parser = parse_filter_info)]
        filter_info: Vec<FilterInfo>,
    },
    /// List the keys of the address tables.
    Table {
        /// Device mapping file.
        #[arg(short, long)]
        device_map: Option<PathBuf>,
        /// PLC mapping file.
        #[arg(short, long)]
        plc_map: Option<PathBuf>,
    },
    /// List the platform data type tags.
    DataTypes,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    Device,
    Plc,
    Auto,
}

impl From<ModeArg> for LoadMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Device => LoadMode::Device,
            ModeArg::Plc => LoadMode::Plc,
            ModeArg::Auto => LoadMode::Auto,
        }
    }
}

fn parse_filter_info(s: &str) -> std::result::Result<FilterInfo, String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got {:?}", s))?;
    let value = value
        .trim()
        .parse::<i32>()
        .map_err(|_| format!("filter value must be an integer, got {:?}", value))?;
    Ok(FilterInfo::new(name.trim(), value))
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose { "debug" } else { "warn" };

    // JSON logs for production/container environments
    let json_logging = std::env::var("DEVCOMM_LOG_JSON")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(false);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .compact()
            .with_writer(std::io::stderr)
            .init();
    }

    tracing::debug!(command = ?args.command, "devcomm starting");
    let config = load_config(args.config.as_deref())?;

    match args.command {
        Command::Check { file, mode } => run_check(config, &file, mode.into(), args.json),
        Command::SwapDev {
            filter,
            device_map,
            filter_info,
        } => run_swap_dev(config, &filter, device_map, filter_info, args.json),
        Command::SwapPlc {
            filter,
            plc_map,
            extra,
            filter_info,
        } => run_swap_plc(config, &filter, plc_map, extra, filter_info, args.json),
        Command::Table {
            device_map,
            plc_map,
        } => run_table(config, device_map, plc_map, args.json),
        Command::DataTypes => run_data_types(args.json),
    }
}

/// Config file if given, then `DEVCOMM_*` environment overrides.
fn load_config(path: Option<&Path>) -> Result<DevCommConfig> {
    let config = match path {
        Some(path) => DevCommConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => DevCommConfig::default(),
    };
    let config = config.with_env_overrides();
    config.validate()?;
    Ok(config)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Load the explicit file, or fall back to every configured path.
fn prepare_resolver(
    mut config: DevCommConfig,
    device_map: Option<PathBuf>,
    plc_map: Option<PathBuf>,
) -> Result<AddressResolver> {
    if device_map.is_some() || plc_map.is_some() {
        config.mem_map_path = None;
        config.device_map_path = device_map;
        config.plc_map_path = plc_map;
    }
    let resolver = AddressResolver::new(config)?;
    let summary = resolver.reload().context("Failed to load mapping files")?;
    if summary.skipped_count() > 0 {
        eprintln!(
            "warning: skipped {} malformed mapping line(s)",
            summary.skipped_count()
        );
    }
    Ok(resolver)
}

fn run_check(config: DevCommConfig, file: &Path, mode: LoadMode, json: bool) -> Result<()> {
    let resolver = AddressResolver::new(config)?;
    let summary = resolver
        .load_mem_mapping_file(file, mode)
        .with_context(|| format!("Failed to load {}", file.display()))?;

    if json {
        return print_json(&summary);
    }

    println!("Mapping file: {}", file.display());
    println!("  device records: {}", summary.device_loaded);
    println!("  plc records:    {}", summary.plc_loaded);
    println!("  skipped lines:  {}", summary.skipped_count());
    for skipped in &summary.skipped {
        println!("    line {}: {}", skipped.line, skipped.reason);
    }
    Ok(())
}

fn run_swap_dev(
    config: DevCommConfig,
    filter: &str,
    device_map: Option<PathBuf>,
    filter_info: Vec<FilterInfo>,
    json: bool,
) -> Result<()> {
    let resolver = prepare_resolver(config, device_map, None)?;
    resolver.set_comm_filters(filter_info);

    let entry = resolver
        .resolve_device_address(filter)?
        .ok_or_else(|| DevCommError::NotFound(filter.to_string()))?;

    if json {
        return print_json(&entry);
    }
    println!("device:  {}", entry.dev_id);
    println!("memtype: {}", entry.mem_type);
    println!("target:  {}", entry.target_addr);
    if !entry.desc.is_empty() {
        println!("desc:    {}", entry.desc);
    }
    Ok(())
}

fn run_swap_plc(
    config: DevCommConfig,
    filter: &str,
    plc_map: Option<PathBuf>,
    extra: Option<String>,
    filter_info: Vec<FilterInfo>,
    json: bool,
) -> Result<()> {
    let resolver = prepare_resolver(config, None, plc_map)?;
    resolver.set_comm_filters(filter_info);

    let entry = resolver
        .resolve_plc_address(filter, extra.as_deref())?
        .ok_or_else(|| DevCommError::NotFound(filter.to_string()))?;

    if json {
        return print_json(&entry);
    }
    println!("machine:  {}", entry.machine_id);
    println!("vendor:   {}", entry.vendor_code);
    println!("type:     {}", entry.target_data_type);
    println!("target:   {}", entry.plc_target_addr);
    println!("end:      {}", entry.plc_target_end_addr);
    println!("memory:   {} {} @ {}", entry.mem_id, entry.mem_blk_type, entry.plc_data_addr);
    if !entry.desc.is_empty() {
        println!("desc:     {}", entry.desc);
    }
    Ok(())
}

#[derive(Serialize)]
struct TableKeys {
    device: Vec<String>,
    plc: Vec<String>,
}

fn run_table(
    config: DevCommConfig,
    device_map: Option<PathBuf>,
    plc_map: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let resolver = prepare_resolver(config, device_map, plc_map)?;
    let keys = TableKeys {
        device: resolver.device_keys(),
        plc: resolver.plc_keys(),
    };

    if json {
        return print_json(&keys);
    }
    println!("Device table ({} keys)", keys.device.len());
    for key in &keys.device {
        println!("  {}", key);
    }
    println!("PLC table ({} keys)", keys.plc.len());
    for key in &keys.plc {
        println!("  {}", key);
    }
    Ok(())
}

#[derive(Serialize)]
struct DataTypeRow {
    code: u8,
    tag: &'static str,
    bits: u32,
    signed: bool,
}

fn run_data_types(json: bool) -> Result<()> {
    let rows: Vec<DataTypeRow> = DataType::ALL
        .iter()
        .map(|t| DataTypeRow {
            code: t.code(),
            tag: t.as_str(),
            bits: t.bit_width(),
            signed: t.is_signed(),
        })
        .collect();

    if json {
        return print_json(&rows);
    }
    for row in rows {
        println!(
            "{:>2}  {:<13} {:>2} bit  {}",
            row.code,
            row.tag,
            row.bits,
            if row.signed { "signed" } else { "unsigned" }
        );
    }
    Ok(())
}

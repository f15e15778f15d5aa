//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::{DEFAULT_CONFIG_NAME, FileConfigAdapter};
use crate::domain::config_validation::validate_scan_config;
use crate::domain::enrich::enrich;
use crate::domain::error::LeadscanError;
use crate::domain::scan::{ScanConfig, run_scan};
use crate::domain::signal::SignalRecord;
use crate::domain::tier::classify_latest;
use crate::domain::universe::{DEFAULT_MARKETS, parse_codes, parse_markets, select_universe};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::store_port::StorePort;

#[derive(Parser, Debug)]
#[command(name = "leadscan", about = "Leader-tier scanner for daily equity data")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Classify every stock in the configured universe
    Scan {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        trade_date: Option<NaiveDate>,
    },
    /// Classify the latest trading day of one stock
    Classify {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        code: String,
        #[arg(long)]
        name: Option<String>,
    },
    /// Print the most recent signal rows of one stock
    Signals {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        code: String,
        #[arg(long, default_value_t = 10)]
        last: usize,
    },
    /// Load a directory of CSV files into the SQLite store
    Import {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        dir: PathBuf,
    },
    /// List the configured stock universe
    ListStocks {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Show the stored date range of one stock or of the whole universe
    Info {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        code: Option<String>,
    },
    /// Validate the scan configuration
    Validate {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Scan { config, trade_date } => run_scan_command(config.as_deref(), trade_date),
        Command::Classify { config, code, name } => {
            run_classify(config.as_deref(), &code, name.as_deref())
        }
        Command::Signals { config, code, last } => run_signals(config.as_deref(), &code, last),
        Command::Import { config, dir } => run_import(config.as_deref(), &dir),
        Command::ListStocks { config } => run_list_stocks(config.as_deref()),
        Command::Info { config, code } => run_info(config.as_deref(), code.as_deref()),
        Command::Validate { config } => run_validate(config.as_deref()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            (&e).into()
        }
    }
}

/// An explicit path, or `leadscan.ini` in the working directory or one of
/// its ancestors.
pub fn resolve_config_path(explicit: Option<&Path>) -> Result<PathBuf, LeadscanError> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir()?;
    FileConfigAdapter::discover(DEFAULT_CONFIG_NAME, &cwd).ok_or_else(|| {
        LeadscanError::ConfigParse {
            file: DEFAULT_CONFIG_NAME.to_string(),
            reason: format!("not found in {} or any parent directory", cwd.display()),
        }
    })
}

pub fn load_config(explicit: Option<&Path>) -> Result<FileConfigAdapter, LeadscanError> {
    let path = resolve_config_path(explicit)?;
    tracing::info!(path = %path.display(), "loading config");
    FileConfigAdapter::from_file(&path)
}

fn default_start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2018, 1, 1).unwrap_or_default()
}

/// Build the `[scan]` settings. `today` anchors the default end date, which
/// is the day after so that today's rows are included.
pub fn build_scan_config(
    config: &dyn ConfigPort,
    today: NaiveDate,
    trade_date_override: Option<NaiveDate>,
) -> Result<ScanConfig, LeadscanError> {
    let start_date = config
        .get_date("scan", "start_date")?
        .unwrap_or_else(default_start_date);
    let end_date = config
        .get_date("scan", "end_date")?
        .unwrap_or_else(|| today.succ_opt().unwrap_or(today));
    let trade_date = match trade_date_override {
        Some(date) => Some(date),
        None => config.get_date("scan", "trade_date")?,
    };

    let markets_raw = config
        .get_string("scan", "markets")
        .unwrap_or_else(|| DEFAULT_MARKETS.to_string());
    let markets = parse_markets(&markets_raw).map_err(|e| LeadscanError::ConfigInvalid {
        section: "scan".into(),
        key: "markets".into(),
        reason: e.to_string(),
    })?;

    let codes = config
        .get_string("scan", "codes")
        .filter(|s| !s.trim().is_empty())
        .map(|raw| parse_codes(&raw))
        .transpose()
        .map_err(|e| LeadscanError::ConfigInvalid {
            section: "scan".into(),
            key: "codes".into(),
            reason: e.to_string(),
        })?;

    Ok(ScanConfig {
        start_date,
        end_date,
        trade_date,
        markets,
        codes,
        persist_signals: config.get_bool("scan", "persist_signals", false),
    })
}

/// Anything that can both supply daily data and store results.
pub trait Backend {
    fn data(&self) -> &dyn DataPort;
    fn store(&self) -> &dyn StorePort;
}

impl<T: DataPort + StorePort> Backend for T {
    fn data(&self) -> &dyn DataPort {
        self
    }

    fn store(&self) -> &dyn StorePort {
        self
    }
}

/// PostgreSQL when `[postgres] connection_string` is set and the feature is
/// enabled, otherwise the SQLite file at `[sqlite] path`.
pub fn open_backend(config: &dyn ConfigPort) -> Result<Box<dyn Backend>, LeadscanError> {
    #[cfg(feature = "postgres")]
    {
        if config.get_string("postgres", "connection_string").is_some() {
            use crate::adapters::postgres_adapter::PostgresAdapter;
            tracing::info!("using postgres backend");
            return Ok(Box::new(PostgresAdapter::from_config(config)?));
        }
    }

    #[cfg(feature = "sqlite")]
    {
        use crate::adapters::sqlite_adapter::SqliteAdapter;
        let adapter = SqliteAdapter::from_config(config)?;
        adapter.initialize_schema()?;
        tracing::info!("using sqlite backend");
        Ok(Box::new(adapter))
    }

    #[cfg(not(feature = "sqlite"))]
    {
        let _ = config;
        Err(LeadscanError::ConfigMissing {
            section: "postgres".into(),
            key: "connection_string".into(),
        })
    }
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

fn run_scan_command(
    config_path: Option<&Path>,
    trade_date: Option<NaiveDate>,
) -> Result<(), LeadscanError> {
    // Stage 1: config
    let config = load_config(config_path)?;
    validate_scan_config(&config)?;
    let scan_config = build_scan_config(&config, today(), trade_date)?;
    tracing::info!(
        start = %scan_config.start_date,
        end = %scan_config.end_date,
        trade_date = ?scan_config.trade_date,
        "scan window"
    );

    // Stage 2: backend
    let backend = open_backend(&config)?;

    // Stage 3: scan
    let summary = run_scan(backend.data(), backend.store(), &scan_config)?;

    for result in &summary.results {
        println!(
            "{}\t{}\t{}\t{}",
            result.trade_date, result.code, result.name, result.tier
        );
    }

    eprintln!("\n=== Scan Summary ===");
    eprintln!("Scanned:   {}", summary.scanned);
    eprintln!("No data:   {}", summary.no_data);
    eprintln!("Stale:     {}", summary.stale);
    eprintln!("No tier:   {}", summary.no_tier);
    eprintln!("Failed:    {}", summary.failed);
    for (tier, count) in &summary.matched {
        eprintln!("  {tier}: {count}");
    }
    eprintln!("Matched:   {}", summary.matched_total());
    Ok(())
}

fn run_classify(
    config_path: Option<&Path>,
    code: &str,
    name: Option<&str>,
) -> Result<(), LeadscanError> {
    let config = load_config(config_path)?;
    let scan_config = build_scan_config(&config, today(), None)?;
    let backend = open_backend(&config)?;

    let code = code.trim().to_uppercase();
    let records = backend
        .data()
        .fetch_daily(&code, scan_config.start_date, scan_config.end_date)?;
    if records.is_empty() {
        return Err(LeadscanError::NoData { code });
    }

    let series = enrich(&records);
    match classify_latest(&series, &code, name.unwrap_or(&code))? {
        Some(result) => println!(
            "{}\t{}\t{}\t{}",
            result.trade_date, result.code, result.name, result.tier
        ),
        None => {
            let date = series.latest().map(|row| row.date().to_string());
            println!("{}\t{}\tno tier", date.unwrap_or_default(), code);
        }
    }
    Ok(())
}

fn run_signals(config_path: Option<&Path>, code: &str, last: usize) -> Result<(), LeadscanError> {
    let config = load_config(config_path)?;
    let scan_config = build_scan_config(&config, today(), None)?;
    let backend = open_backend(&config)?;

    let code = code.trim().to_uppercase();
    let records = backend
        .data()
        .fetch_daily(&code, scan_config.start_date, scan_config.end_date)?;
    if records.is_empty() {
        return Err(LeadscanError::NoData { code });
    }

    let series = enrich(&records);
    let signals: Vec<SignalRecord> = series.rows[series.len().saturating_sub(last)..]
        .iter()
        .filter_map(SignalRecord::from_row)
        .collect();

    println!(
        "date\ttrend_buy\ttrend_sell\texit_buy\texit_sell\tdynamic_line\tzone\tentry_buy\tbuild_area"
    );
    for s in &signals {
        println!(
            "{}\t{}\t{}\t{}\t{}\t{:.3}\t{}\t{}\t{}",
            s.trade_date,
            s.trend_buy,
            s.trend_sell,
            s.exit_buy,
            s.exit_sell,
            s.dynamic_line,
            s.zone(),
            s.entry_buy,
            s.build_area
        );
    }

    if scan_config.persist_signals {
        backend.store().save_signals(&signals)?;
        tracing::info!(code = %code, rows = signals.len(), "signals saved");
    }
    Ok(())
}

fn run_import(config_path: Option<&Path>, dir: &Path) -> Result<(), LeadscanError> {
    let config = load_config(config_path)?;

    #[cfg(feature = "sqlite")]
    {
        use crate::adapters::sqlite_adapter::SqliteAdapter;

        let store = SqliteAdapter::from_config(&config)?;
        store.initialize_schema()?;

        let source = CsvAdapter::new(dir.to_path_buf());
        let stocks = source.all_stocks()?;
        store.insert_stocks(&stocks)?;

        let mut rows = 0;
        for stock in &stocks {
            let records = source.read_daily(&stock.code)?;
            store.insert_daily(&records)?;
            tracing::debug!(code = %stock.code, rows = records.len(), "imported");
            rows += records.len();
        }

        tracing::info!(stocks = stocks.len(), rows, dir = %dir.display(), "import complete");
        eprintln!("Imported {} stocks, {} daily rows", stocks.len(), rows);
        Ok(())
    }

    #[cfg(not(feature = "sqlite"))]
    {
        let _ = (config, CsvAdapter::new(dir.to_path_buf()));
        Err(LeadscanError::ConfigInvalid {
            section: "sqlite".into(),
            key: "path".into(),
            reason: "sqlite feature is required for import".into(),
        })
    }
}

fn run_list_stocks(config_path: Option<&Path>) -> Result<(), LeadscanError> {
    let config = load_config(config_path)?;
    let scan_config = build_scan_config(&config, today(), None)?;
    let backend = open_backend(&config)?;

    let stocks = select_universe(
        backend.data(),
        &scan_config.markets,
        scan_config.codes.as_deref(),
    )?;

    if stocks.is_empty() {
        eprintln!("No stocks found in {}", scan_config.markets.join(","));
    } else {
        for stock in &stocks {
            println!("{}\t{}\t{}", stock.code, stock.name, stock.market);
        }
        eprintln!("{} stocks found", stocks.len());
    }
    Ok(())
}

fn run_info(config_path: Option<&Path>, code: Option<&str>) -> Result<(), LeadscanError> {
    let config = load_config(config_path)?;
    let backend = open_backend(&config)?;

    let codes = match code {
        Some(code) => vec![code.trim().to_uppercase()],
        None => {
            let scan_config = build_scan_config(&config, today(), None)?;
            select_universe(
                backend.data(),
                &scan_config.markets,
                scan_config.codes.as_deref(),
            )?
            .into_iter()
            .map(|stock| stock.code)
            .collect()
        }
    };

    for code in &codes {
        match backend.data().get_data_range(code)? {
            Some((min_date, max_date, count)) => {
                println!("{code}: {count} rows, {min_date} to {max_date}");
            }
            None => eprintln!("{code}: no data found"),
        }
    }
    Ok(())
}

fn run_validate(config_path: Option<&Path>) -> Result<(), LeadscanError> {
    let config = load_config(config_path)?;
    validate_scan_config(&config)?;
    let scan_config = build_scan_config(&config, today(), None)?;

    eprintln!("Scan window:  {} to {}", scan_config.start_date, scan_config.end_date);
    match scan_config.trade_date {
        Some(date) => eprintln!("Trade date:   {date}"),
        None => eprintln!("Trade date:   latest available"),
    }
    eprintln!("Markets:      {}", scan_config.markets.join(", "));
    if let Some(codes) = &scan_config.codes {
        eprintln!("Codes:        {}", codes.join(", "));
    }
    eprintln!("Save signals: {}", scan_config.persist_signals);
    eprintln!("\nConfiguration is valid.");
    Ok(())
}

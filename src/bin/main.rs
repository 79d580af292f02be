//! aqp CLI - plan and build samples for an analytic workload
//!
//! Usage:
//!   aqp plan [--create] [--overwrite] [--workload <file.toml>]
//!   aqp load-prejoins <file>
//!   aqp create-sample st2 --tables <t1,t2> --columns <c1,c2> --min-rows <n>
//!   aqp test-sample (--all | --sample <name> --queries <id1,id2>)
//!   aqp meta (stats | prejoins | samples)
//!
//! Examples:
//!   aqp --database tpcds_500_parquet plan --workload workload.toml --create
//!   aqp create-sample st2 --tables store_sales,date_dim --columns d_year --min-rows 1000
//!   aqp test-sample --all --measure-time --clear-cache-script ./clear_cache.sh

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use aqp::cache::{Meta, SqliteStore, WarehouseStore};
use aqp::config::{load_workload, MetadataBackend, Settings};
use aqp::executor::{SqlExecutor, WorkerExecutor};
use aqp::planner::{CacheFlusher, PlanOptions, Planner, ScriptCacheFlusher, Thresholds};
use aqp::prejoin::import_prejoins;
use aqp::Error;

#[derive(Parser)]
#[command(name = "aqp")]
#[command(about = "aqp - Approximate query processing sample planner")]
#[command(version)]
struct Cli {
    /// Settings file (defaults to $AQP_CONFIG, ./aqp.toml, ~/.config/aqp/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Warehouse database, overriding the settings file
    #[arg(long, global = true)]
    database: Option<String>,

    /// Warehouse host, overriding the settings file
    #[arg(long, global = true)]
    host: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Plan samples for every query of the workload
    Plan {
        /// Materialize the proposed samples
        #[arg(long)]
        create: bool,

        /// Recreate samples that already exist
        #[arg(long)]
        overwrite: bool,

        /// Workload definition
        #[arg(short, long, default_value = "workload.toml")]
        workload: PathBuf,
    },

    /// Register existing join tables listed in a prejoin file
    LoadPrejoins {
        /// Lines of `database;name;t1,t2;a = b AND c = d`
        file: PathBuf,
    },

    /// Create a sample by hand
    CreateSample {
        #[command(subcommand)]
        kind: SampleKind,
    },

    /// Measure the accuracy of samples
    TestSample {
        /// Test every recorded sample against the query it was built for
        #[arg(long, conflicts_with_all = ["sample", "queries"])]
        all: bool,

        /// Name of the sample to test
        #[arg(long, requires = "queries", required_unless_present = "all")]
        sample: Option<String>,

        /// Query ids to test the sample with
        #[arg(long, value_delimiter = ',')]
        queries: Vec<String>,

        /// Time the original and sampled runs
        #[arg(long, requires = "clear_cache_script")]
        measure_time: bool,

        /// Script clearing caches before each timed run
        #[arg(long)]
        clear_cache_script: Option<PathBuf>,

        /// Workload definition
        #[arg(short, long, default_value = "workload.toml")]
        workload: PathBuf,
    },

    /// Inspect the metadata store
    Meta {
        #[command(subcommand)]
        action: MetaAction,
    },
}

#[derive(Subcommand)]
enum SampleKind {
    /// Keep up to MIN_ROWS random rows for every group of COLUMNS
    St2 {
        /// Tables of the join the sample is drawn through
        #[arg(long, value_delimiter = ',', required = true)]
        tables: Vec<String>,

        /// Grouping columns
        #[arg(long, value_delimiter = ',', required = true)]
        columns: Vec<String>,

        /// Rows kept per group
        #[arg(long)]
        min_rows: u64,

        /// Recreate the sample if it exists
        #[arg(long)]
        overwrite: bool,
    },
}

#[derive(Subcommand)]
enum MetaAction {
    /// Show record counts and size
    Stats,
    /// List live prejoins of the database
    Prejoins,
    /// List live samples
    Samples,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match load_settings(&cli) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error loading settings: {}", e);
            return ExitCode::FAILURE;
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(settings.logging.level.to_lowercase())
            }),
        )
        .with_writer(std::io::stderr)
        .try_init()
        .ok();

    match run(cli.command, &settings) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_settings(cli: &Cli) -> Result<Settings, Error> {
    let mut settings = match &cli.config {
        Some(path) => Settings::from_file(path)?,
        None => Settings::load()?,
    };
    settings.apply_env_overrides()?;
    if let Some(database) = &cli.database {
        settings.warehouse.database = database.clone();
    }
    if let Some(host) = &cli.host {
        settings.warehouse.host = host.clone();
    }
    Ok(settings)
}

fn run(command: Commands, settings: &Settings) -> Result<ExitCode, Error> {
    // Listing a local store needs no warehouse connection.
    if let Commands::Meta { action } = &command {
        if settings.metadata.backend == MetadataBackend::Sqlite {
            let meta = sqlite_meta(settings)?;
            return cmd_meta(&meta, &settings.warehouse.database, action);
        }
    }

    let connection = settings.connection()?;
    let executor = WorkerExecutor::spawn(settings, &connection)?;
    let meta = open_meta(settings, &executor)?;
    let database = settings.warehouse.database.as_str();

    match command {
        Commands::Plan {
            create,
            overwrite,
            workload,
        } => cmd_plan(&executor, &meta, settings, &workload, create, overwrite),
        Commands::LoadPrejoins { file } => cmd_load_prejoins(&executor, &meta, &file),
        Commands::CreateSample {
            kind:
                SampleKind::St2 {
                    tables,
                    columns,
                    min_rows,
                    overwrite,
                },
        } => {
            let options = PlanOptions {
                overwrite,
                ..(&settings.planner).into()
            };
            let planner = Planner::new(&executor, &meta, database).with_options(options);
            let (sample, _) = planner.create_stratified2(&tables, &columns, min_rows)?;
            println!("Sample {} is ready.", sample);
            Ok(ExitCode::SUCCESS)
        }
        Commands::TestSample {
            all,
            sample,
            queries,
            measure_time,
            clear_cache_script,
            workload,
        } => {
            let flusher = match (measure_time, clear_cache_script) {
                (true, Some(script)) => Some(ScriptCacheFlusher::new(script)),
                _ => None,
            };
            let flusher = flusher.as_ref().map(|f| f as &dyn CacheFlusher);
            let workload = load_workload(&workload)?;
            let planner = Planner::new(&executor, &meta, database);

            let evaluations = match sample {
                Some(name) if !all => planner.evaluate_named(&name, &queries, &workload, flusher)?,
                _ => planner.evaluate_all(&workload, flusher),
            };
            for evaluation in &evaluations {
                println!("{}", evaluation);
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Meta { action } => cmd_meta(&meta, database, &action),
    }
}

fn sqlite_meta(settings: &Settings) -> Result<Meta<'static>, Error> {
    let store = match settings.metadata.resolved_path()? {
        Some(path) => SqliteStore::open(path)?,
        None => SqliteStore::open_default()?,
    };
    Ok(Meta::new(store))
}

fn open_meta<'e>(settings: &Settings, executor: &'e dyn SqlExecutor) -> Result<Meta<'e>, Error> {
    match settings.metadata.backend {
        MetadataBackend::Sqlite => sqlite_meta(settings),
        MetadataBackend::Warehouse => Ok(Meta::new(WarehouseStore::open(
            executor,
            &settings.warehouse.database,
            &settings.metadata.table,
        )?)),
    }
}

fn cmd_plan(
    executor: &dyn SqlExecutor,
    meta: &Meta<'_>,
    settings: &Settings,
    workload: &Path,
    create: bool,
    overwrite: bool,
) -> Result<ExitCode, Error> {
    let queries = load_workload(workload)?;
    let options = PlanOptions {
        create,
        overwrite,
        ..(&settings.planner).into()
    };
    let mut planner = Planner::new(executor, meta, settings.warehouse.database.as_str())
        .with_thresholds(Thresholds::from(&settings.sampling))
        .with_options(options);

    let report = planner.plan_workload(&queries)?;
    for prejoin in &report.prejoins_evicted {
        println!("Evicted prejoin {} (table no longer exists).", prejoin.name);
    }
    for prejoin in &report.prejoins_created {
        println!("Created prejoin {} for {}.", prejoin.name, prejoin.fact_table_name);
    }
    for query in &report.queries {
        println!("{}", query);
    }

    if report.failed() > 0 {
        eprintln!("{} of {} queries failed", report.failed(), report.queries.len());
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_load_prejoins(executor: &dyn SqlExecutor, meta: &Meta<'_>, file: &Path) -> Result<ExitCode, Error> {
    let imported = import_prejoins(file, executor, meta).map_err(Error::from)?;
    for prejoin in &imported {
        println!("Registered prejoin {}.{}", prejoin.database, prejoin.name);
    }
    println!("{} prejoins registered.", imported.len());
    Ok(ExitCode::SUCCESS)
}

fn cmd_meta(meta: &Meta<'_>, database: &str, action: &MetaAction) -> Result<ExitCode, Error> {
    match action {
        MetaAction::Stats => {
            let stats = meta.stats()?;
            println!("Records: {}", stats.record_count);
            println!("Keys:    {}", stats.key_count);
            println!("Size:    {} bytes", stats.total_size_bytes);
        }
        MetaAction::Prejoins => {
            let prejoins = meta.prejoins(database);
            if prejoins.is_empty() {
                println!("No prejoins recorded for {}.", database);
            }
            for p in &prejoins {
                let tables: Vec<_> = p.table_set.iter().map(String::as_str).collect();
                println!("  - {} (fact: {}, tables: {})", p.name, p.fact_table_name, tables.join(", "));
            }
        }
        MetaAction::Samples => {
            let samples = meta.samples(database);
            if samples.is_empty() {
                println!("No samples recorded for {}.", database);
            }
            for s in &samples {
                println!("  - {} ({})", s, s.sample_type);
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

#![forbid(unsafe_code)]
use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt::Subscriber, EnvFilter};
use turnos::{build_schedule, model::DayCategory, ScheduleSource, Settings, ShiftCode};

/// API et CLI des plannings de turnos (CSV exporté du tableur)
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Active les logs détaillés (sinon `RUST_LOG`, par défaut `warn`)
    #[arg(long, global = true)]
    log: bool,

    #[command(flatten)]
    settings: Settings,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Démarrer l'API HTTP
    #[cfg(feature = "http")]
    Serve {
        #[arg(long, env = "HOST", default_value = "0.0.0.0")]
        host: String,
        #[arg(long, env = "PORT", default_value_t = 8000)]
        port: u16,
    },

    /// Charger et afficher le planning résolu
    Show {
        /// Limiter à une date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,
        /// Sortie JSON (même forme que `GET /turnos`)
        #[arg(long)]
        json: bool,
    },

    /// Résoudre un code pour une date
    Resolve {
        /// YYYY-MM-DD
        #[arg(long)]
        date: String,
        /// Code de turno (vide : jour libre)
        #[arg(long)]
        code: Option<String>,
    },

    /// Afficher ou exporter la table d'horaires active
    Table {
        #[arg(long)]
        out: Option<String>,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .with_context(|| format!("invalid date (expected YYYY-MM-DD): {raw}"))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    #[cfg(feature = "http")]
    let verbose = cli.log || matches!(cli.cmd, Commands::Serve { .. });
    #[cfg(not(feature = "http"))]
    let verbose = cli.log;
    init_logging(verbose);

    let settings = cli.settings;
    let code = match cli.cmd {
        #[cfg(feature = "http")]
        Commands::Serve { host, port } => {
            let runtime = tokio::runtime::Runtime::new().context("starting tokio runtime")?;
            runtime.block_on(serve(&settings, &host, port))?;
            0
        }
        Commands::Show { date, json } => {
            let source = settings.source()?;
            let table = settings.hours_table()?;
            let loaded = source.load()?;
            let mut schedule = build_schedule(&loaded.rows, &table);
            if let Some(raw) = date {
                let only = parse_date(&raw)?;
                schedule.retain(|d, _| *d == only);
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&schedule)?);
            } else {
                for (day, people) in &schedule {
                    for (person, entry) in people {
                        let code = if entry.shift_code.is_empty() {
                            "-"
                        } else {
                            entry.shift_code.as_str()
                        };
                        println!("{day} | {person} | {code} | {}", entry.display_range);
                    }
                }
            }
            eprintln!(
                "{} date(s), {} row(s) skipped, {} month(s) guessed",
                schedule.len(),
                loaded.report.rows_skipped,
                loaded.report.guessed_months
            );
            // Code 2 = planning vide
            if schedule.is_empty() {
                2
            } else {
                0
            }
        }
        Commands::Resolve { date, code } => {
            let day = parse_date(&date)?;
            let table = settings.hours_table()?;
            let code = ShiftCode::new(code.unwrap_or_default());
            println!("{}\t{}", DayCategory::of(day), table.resolve(day, &code));
            0
        }
        Commands::Table { out } => {
            let table = settings.hours_table()?;
            let json = serde_json::to_string_pretty(&table.to_entries())?;
            match out {
                Some(path) => {
                    std::fs::write(&path, json).with_context(|| format!("writing {path}"))?;
                    println!("{} entries written to {path}", table.len());
                }
                None => println!("{json}"),
            }
            0
        }
    };

    std::process::exit(code);
}

#[cfg(feature = "http")]
async fn serve(settings: &Settings, host: &str, port: u16) -> Result<()> {
    use std::net::SocketAddr;
    use std::sync::Arc;
    use turnos::http::{create_router, AppState};

    let cache = Arc::new(settings.cache()?);
    tracing::info!(
        file = %settings.file.display(),
        people = settings.people.len(),
        policy = ?settings.cache_policy,
        "starting turnos API"
    );

    // premier chargement à froid ; un échec n'empêche pas le démarrage
    let warm = cache.clone();
    match tokio::task::spawn_blocking(move || warm.get_or_load()).await? {
        Ok(snap) => tracing::info!(dates = snap.schedule.len(), "initial schedule loaded"),
        Err(err) => tracing::warn!(error = %err, "initial schedule load failed"),
    }

    let app = create_router(AppState::new(cache));
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .with_context(|| format!("invalid bind address {host}:{port}"))?;
    tracing::info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

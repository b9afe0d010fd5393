use std::path::PathBuf;

use anyhow::Context;
use chrono::{Datelike, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use advisor_scorecard::config::Config;
use advisor_scorecard::{
    import, period, report, seed, Caller, GoalUpdate, OperationResult, PeriodType,
    PostgresStore, ScorecardEngine,
};

#[derive(Parser)]
#[command(name = "advisor-scorecard")]
#[command(about = "Staff performance scorecards for advisory practices", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "scorecard.toml")]
    config: PathBuf,

    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Advisor whose roles are scored
    #[arg(long, env = "SCORECARD_OWNER_ID")]
    owner: Option<Uuid>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed {
        #[arg(long)]
        year: Option<i32>,
    },
    /// Import weekly values from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Add missing core behavior metrics to every role
    EnsureCatalog,
    /// Grade every role for a month, quarter or year
    Scorecard {
        #[arg(long, value_enum, default_value_t = PeriodType::Month)]
        period: PeriodType,
        /// Month (1-12) or quarter (1-4); ignored for a year
        #[arg(long, default_value_t = 1)]
        value: u32,
        #[arg(long)]
        year: Option<i32>,
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    /// Generate a markdown report
    Report {
        #[arg(long, value_enum, default_value_t = PeriodType::Month)]
        period: PeriodType,
        #[arg(long, default_value_t = 1)]
        value: u32,
        #[arg(long)]
        year: Option<i32>,
        #[arg(long, default_value = "scorecard.md")]
        out: PathBuf,
    },
    /// Change a metric's monthly goal
    SetGoal {
        #[arg(long)]
        metric: Uuid,
        #[arg(long)]
        goal: f64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load(&cli.config)?.with_overrides(cli.database_url, cli.owner);

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.filter))
        .context("invalid log filter")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(config.database_url()?)
        .await
        .context("failed to connect to Postgres")?;
    let store = PostgresStore::new(pool);

    if let Commands::InitDb = cli.command {
        store.init_db().await?;
        println!("Schema ready.");
        return Ok(());
    }

    let caller = Caller {
        owner_id: config.scorecard.owner_id,
    };
    let engine = ScorecardEngine::new(store);
    let current_year = Utc::now().year();
    info!(owner = ?caller.owner_id, "scorecard engine ready");

    match cli.command {
        Commands::InitDb => {}
        Commands::Seed { year } => {
            let saved = seed::seed(&engine, &caller, year.unwrap_or(current_year)).await?;
            println!("Seed data inserted ({saved} weekly values).");
        }
        Commands::Import { csv } => {
            let file = std::fs::File::open(&csv)
                .with_context(|| format!("failed to open {}", csv.display()))?;
            let rows = import::read_rows(file)?;
            let report = import::import_rows(&engine, &caller, rows).await?;
            println!(
                "Imported {} of {} rows from {}.",
                report.succeeded(),
                report.attempted,
                csv.display()
            );
            for failure in report.errors.iter() {
                println!(
                    "- row {} ({} / {}): {}",
                    failure.index + 1,
                    failure.item.role,
                    failure.item.metric,
                    failure.error.message
                );
            }
        }
        Commands::EnsureCatalog => {
            let added = engine.ensure_all_catalogs(&caller).await?;
            println!("Added {added} core behavior metrics.");
        }
        Commands::Scorecard {
            period,
            value,
            year,
            format,
        } => {
            let year = year.unwrap_or(current_year);
            let result = match period::resolve(period, value) {
                Ok(period) => engine.get_scorecard(&caller, period, year).await,
                Err(error) => Err(error),
            };

            match format {
                Format::Json => {
                    let body = OperationResult::from(result);
                    println!("{}", serde_json::to_string_pretty(&body)?);
                }
                Format::Text => {
                    let scorecard = result?;
                    println!(
                        "{} of {}: company average {:.1}% ({})",
                        scorecard.period,
                        scorecard.year,
                        scorecard.company_summary.company_average,
                        scorecard.company_summary.company_grade
                    );
                    for card in scorecard.role_scorecards.iter() {
                        println!(
                            "- {} {:.1}% ({}) core {:.1}% ({}) role {:.1}% ({})",
                            card.role_name,
                            card.combined_average,
                            card.combined_grade,
                            card.default_metrics_average,
                            card.default_metrics_grade,
                            card.user_metrics_average,
                            card.user_metrics_grade
                        );
                    }
                }
            }
        }
        Commands::Report {
            period,
            value,
            year,
            out,
        } => {
            let period = period::resolve(period, value)?;
            let scorecard = engine
                .get_scorecard(&caller, period, year.unwrap_or(current_year))
                .await?;
            std::fs::write(&out, report::build_report(&scorecard))?;
            println!("Report written to {}.", out.display());
        }
        Commands::SetGoal { metric, goal } => {
            let report = engine
                .update_goals(
                    &caller,
                    vec![GoalUpdate {
                        metric_id: metric,
                        goal_value: goal,
                    }],
                )
                .await?;
            match report.errors.first() {
                Some(failure) => println!("Goal not updated: {}", failure.error.message),
                None => println!("Goal updated."),
            }
        }
    }

    Ok(())
}

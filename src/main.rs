use anyhow::Result;
use backoffice_mock::{
    api::{serve, ServerConfig},
    cli::{Cli, Commands},
    dashboard::{export_tab, find_tab, DashboardApp, DumpClient},
    schema::ALL_TABLES,
    seed::{seed_database, GeneratorConfig, SeedOptions},
    writer::generate_schema_sql,
};
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn run_server(config: ServerConfig) -> Result<()> {
    serve(config).await
}

fn main() -> Result<()> {
    let cli = Cli::parse_args();

    match cli.command {
        Commands::Seed {
            db,
            seed,
            associates,
            events,
            invoices,
            fresh,
            no_progress,
        } => {
            init_tracing();
            let start = Instant::now();

            let options = SeedOptions {
                generator: GeneratorConfig {
                    seed,
                    associates,
                    events,
                    invoices,
                },
                fresh,
                progress: !no_progress,
            };

            println!("Seeding {:?} (seed {})...", db, seed);
            let summary = seed_database(&db, &options)?;

            println!();
            for (table, count) in &summary.tables {
                println!("  {:<15} {:>6}", table, count);
            }
            println!(
                "  {:<15} {:>6}\n  {:<15} {:>6}",
                "monthly_revenue",
                summary.reports.monthly_revenue,
                "delinquency",
                summary.reports.delinquency
            );

            let elapsed = start.elapsed();
            println!(
                "\nCreated {:?} ({} records) in {:.1}s",
                db,
                summary.total_records(),
                elapsed.as_secs_f64()
            );
        }

        Commands::Serve {
            db,
            public_dir,
            host,
            port,
        } => {
            init_tracing();
            run_server(ServerConfig {
                db_path: db,
                public_dir,
                host,
                port,
            })?;
        }

        Commands::Dashboard { api, export_dir } => {
            let client = DumpClient::new(&api.base_url, api.token)?;
            let app = DashboardApp::new(client, export_dir)?;
            app.run()?;
        }

        Commands::Export {
            api,
            tab,
            filter,
            output,
        } => {
            init_tracing();
            let output = match output {
                Some(path) => path,
                None => PathBuf::from(
                    find_tab(&tab)
                        .map(|t| t.csv_file_name())
                        .unwrap_or_else(|| format!("{}.csv", tab)),
                ),
            };

            let mut client = DumpClient::new(&api.base_url, api.token)?;
            let rows = export_tab(&mut client, &tab, &filter, &output)?;
            tracing::info!(tab = %tab, rows, output = %output.display(), "exported");
            println!("Exported {} rows to {:?}", rows, output);
        }

        Commands::Schema => {
            print!("{}", generate_schema_sql());
        }

        Commands::ListTables => {
            println!("Available tables:\n");
            for table in ALL_TABLES {
                println!("  {:<16} {}", table.name, table.kind);
            }
        }
    }

    Ok(())
}

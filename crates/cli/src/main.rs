use anyhow::Context;
use clap::{Parser, Subcommand};
use shelf_kernel::settings::Settings;

/// Command-line entrypoint for the Shelf resource service.
#[derive(Debug, Parser)]
#[command(name = "shelf", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Migrate (unless disabled) and serve the HTTP API
    Serve,
    /// Apply pending migrations and exit
    Migrate,
    /// Print the effective configuration
    Check,
    /// List mounted resources and their endpoints
    Routes,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load().with_context(|| "failed to load Shelf settings")?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            shelf_telemetry::init(&settings.telemetry)?;
            shelf_app::app::serve(settings).await
        }
        Command::Migrate => {
            shelf_telemetry::init(&settings.telemetry)?;
            let registry = shelf_app::app::registry();
            let db = shelf_app::app::connect(&settings).await?;
            let applied = shelf_app::app::migrate(&registry, &db).await?;
            db.close().await;
            println!("applied {applied} migrations");
            Ok(())
        }
        Command::Check => {
            print_settings(&settings);
            Ok(())
        }
        Command::Routes => {
            let registry = shelf_app::app::registry();
            for (method, path) in shelf_http::router::route_table(&registry) {
                println!("{method:<7} {path}");
            }
            Ok(())
        }
    }
}

fn print_settings(settings: &Settings) {
    println!("environment:      {:?}", settings.environment);
    println!(
        "server:           {}:{} (timeout {} ms)",
        settings.server.host, settings.server.port, settings.server.request_timeout_ms
    );
    println!("database:         {}", settings.database.url);
    println!("max connections:  {}", settings.database.max_connections);
    println!("run migrations:   {}", settings.database.run_migrations);
    println!(
        "logging:          {:?} ({})",
        settings.telemetry.log_format, settings.telemetry.log_filter
    );
    println!("api tokens:       {}", settings.auth.tokens.len());
    println!("max list limit:   {}", settings.api.max_limit);
}

use std::path::PathBuf;

use anyhow::{anyhow, Context};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use passabola_core::auth::hash_password;
use passabola_core::config::{AuthConfig, CoreConfig};
use passabola_core::seed::seed_from_dir;
use passabola_core::store::collections;
use passabola_core::{AuditLog, CollectionStore, Record, Role, TokenClaims, TokenService};
use passabola_gateway::config::GatewayConfig;
use passabola_gateway::{serve, shutdown_signal};
use tokio::net::TcpListener;

#[derive(Parser)]
#[command(name = "passabola")]
#[command(about = "Backend da plataforma Passa a Bola", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inicia a API HTTP
    Serve,
    /// Importa dados iniciais para coleções vazias
    Seed {
        /// Diretório com jogadoras.json e eventos.json (padrão: PASSABOLA_SEED_DIR)
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },
    /// Lista os registros de uma coleção
    List {
        collection: Collection,
    },
    /// Gera o hash Argon2 de uma senha
    HashPassword {
        /// Senha em texto puro (pedida no terminal se omitida)
        password: Option<String>,
    },
    /// Emite um token de acesso
    IssueToken {
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        role: String,
    },
    /// Valida um token de acesso
    VerifyToken {
        token: String,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Collection {
    Users,
    Players,
    Events,
}

impl Collection {
    fn name(self) -> &'static str {
        match self {
            Collection::Users => collections::USERS,
            Collection::Players => collections::PLAYERS,
            Collection::Events => collections::EVENTS,
        }
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    if let Err(err) = run(cli.command).await {
        eprintln!("{} {:#}", "❌ Erro:".red().bold(), err);
        std::process::exit(1);
    }
}

async fn run(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Serve => {
            if let Err(err) = passabola_core::logging::init_tracing(None) {
                eprintln!("⚠️ failed to initialise tracing: {err}");
            }

            let config = GatewayConfig::from_env().context("configuração inválida")?;
            let listener = TcpListener::bind(config.bind_address())
                .await
                .with_context(|| format!("falha ao escutar em {}", config.bind_address()))?;
            println!(
                "{} http://{}",
                "🚀 API Passa a Bola em".green().bold(),
                listener.local_addr()?
            );
            serve(config, listener, shutdown_signal()).await?;
        }

        Commands::Seed { dir } => {
            let core = CoreConfig::from_env()?;
            let seed_dir = dir
                .or_else(|| core.seed_dir.clone())
                .ok_or_else(|| anyhow!("informe --dir ou PASSABOLA_SEED_DIR"))?;

            let report = seed_from_dir(&open_store(&core), &seed_dir)?;
            if report.is_empty() {
                println!("{}", "Nenhuma coleção vazia para importar".yellow());
            }
            for (collection, count) in &report.imported {
                println!(
                    "{} {} ({} registros)",
                    "✔ Coleção importada:".green().bold(),
                    collection.bold(),
                    count
                );
            }
        }

        Commands::List { collection } => {
            let core = CoreConfig::from_env()?;
            let records = list_records(&open_store(&core), collection);
            println!("{}", serde_json::to_string_pretty(&records)?);
            eprintln!("{} registro(s) em {}", records.len(), collection.name());
        }

        Commands::HashPassword { password } => {
            let password = match password {
                Some(password) => password,
                None => rpassword::prompt_password("Senha: ")?,
            };
            println!("{}", hash_password(&password)?);
        }

        Commands::IssueToken { email, role } => {
            let role: Role = role.parse().map_err(anyhow::Error::msg)?;
            let tokens = TokenService::new(&AuthConfig::from_env()?);
            let token = tokens.issue(&TokenClaims::new(email, role.as_str()))?;
            println!("{token}");
        }

        Commands::VerifyToken { token } => {
            let tokens = TokenService::new(&AuthConfig::from_env()?);
            match tokens.validate(&token) {
                Ok(validated) => {
                    println!("{}", "✔ Token válido".green().bold());
                    println!("  Email: {}", validated.subject);
                    println!("  Perfil: {}", validated.role);
                    println!("  Expira em: {}", format_timestamp(validated.expires_at));
                }
                Err(err) => {
                    println!("{} {}", "✗ Token inválido:".red().bold(), err);
                    std::process::exit(2);
                }
            }
        }
    }

    Ok(())
}

fn open_store(core: &CoreConfig) -> CollectionStore {
    CollectionStore::json_files(core.data_dir.clone(), AuditLog::new(core.log_file.clone()))
}

/// Loads a collection for display; password hashes never leave the store.
fn list_records(store: &CollectionStore, collection: Collection) -> Vec<Record> {
    let mut records = store.list(collection.name());
    if matches!(collection, Collection::Users) {
        for record in &mut records {
            record.remove("hashed_password");
        }
    }
    records
}

fn format_timestamp(seconds: i64) -> String {
    DateTime::<Utc>::from_timestamp(seconds, 0)
        .map(|at| at.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| seconds.to_string())
}

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, info};

use vault_admin::config::StoreConfig;
use vault_admin::schema::BackendKind;
use vault_admin::services::issuance::TokenCreateRequest;
use vault_admin::services::{accessors, issuance, roles, users};
use vault_admin::store::{AuthSession, SessionResolver, StoreHandle, VaultClient};
use vault_admin::utils;

#[derive(Parser)]
#[command(name = "vault-admin", version, about = "Manage Vault users, tokens and token roles")]
struct AppCli {
    /// Store config file (JSON); falls back to VAULT_ADDR and friends
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Userpass users and approle roles
    #[command(subcommand)]
    Users(UserCommands),
    /// Token accessors and issuance
    #[command(subcommand)]
    Tokens(TokenCommands),
    /// Token roles
    #[command(subcommand)]
    Roles(RoleCommands),
}

#[derive(Subcommand)]
enum UserCommands {
    /// List identities of a backend
    List {
        #[arg(short, long)]
        backend: String,
    },
    /// Delete an identity
    Delete {
        #[arg(short, long)]
        backend: String,
        id: String,
    },
}

#[derive(Subcommand)]
enum TokenCommands {
    /// List outstanding accessors
    Accessors,
    /// Count outstanding accessors
    Count,
    /// Look up tokens by comma-delimited accessors
    Lookup { accessors: String },
    /// Revoke a token by accessor
    Revoke { accessor: String },
    /// Create a token
    Create(CreateArgs),
}

#[derive(Args)]
struct CreateArgs {
    #[arg(long = "policy")]
    policies: Vec<String>,
    #[arg(long)]
    role: Option<String>,
    #[arg(long)]
    ttl: Option<String>,
    #[arg(long)]
    explicit_max_ttl: Option<String>,
    #[arg(long)]
    period: Option<String>,
    #[arg(long)]
    display_name: Option<String>,
    #[arg(long)]
    num_uses: Option<u64>,
    #[arg(long)]
    orphan: bool,
    #[arg(long)]
    no_default_policy: bool,
    /// key=value metadata, repeatable
    #[arg(long = "meta", value_parser = parse_meta)]
    meta: Vec<(String, String)>,
    /// Wrap the response for this TTL (e.g. 5m)
    #[arg(long)]
    wrap_ttl: Option<String>,
}

#[derive(Subcommand)]
enum RoleCommands {
    List,
    Get { name: String },
}

fn parse_meta(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got {raw:?}"))
}

impl From<CreateArgs> for TokenCreateRequest {
    fn from(args: CreateArgs) -> Self {
        TokenCreateRequest {
            role: args.role,
            policies: args.policies,
            meta: args.meta.into_iter().collect::<HashMap<_, _>>(),
            no_parent: args.orphan,
            no_default_policy: args.no_default_policy,
            ttl: args.ttl,
            explicit_max_ttl: args.explicit_max_ttl,
            period: args.period,
            display_name: args.display_name,
            num_uses: args.num_uses,
            ..Default::default()
        }
    }
}

async fn connect(config: &StoreConfig) -> Result<StoreHandle> {
    let client = VaultClient::new(config)?;
    let resolver = SessionResolver::new(client, config.verify_session);
    let handle = resolver.resolve(&AuthSession::from_env()).await?;
    info!(caller = %handle.caller().display_name, "connected to store");
    Ok(handle)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    utils::logging::init();

    let args = AppCli::parse();
    debug!(version = vault_admin::VERSION, "starting");
    let config = match &args.config {
        Some(path) => StoreConfig::from_file(path)?,
        None => StoreConfig::from_env()?,
    };

    match args.command {
        Commands::Users(UserCommands::List { backend }) => {
            let kind: BackendKind = backend.parse()?;
            let handle = connect(&config).await?;
            print_json(&users::list_identities(&handle, kind.as_str()).await?)?;
        }
        Commands::Users(UserCommands::Delete { backend, id }) => {
            let kind: BackendKind = backend.parse()?;
            let handle = connect(&config).await?;
            users::delete_identity(&handle, kind.as_str(), &id).await?;
            print_json(&serde_json::json!({"deleted": id}))?;
        }
        Commands::Tokens(TokenCommands::Accessors) => {
            let handle = connect(&config).await?;
            print_json(&accessors::list_accessors(&handle).await?)?;
        }
        Commands::Tokens(TokenCommands::Count) => {
            let handle = connect(&config).await?;
            print_json(&accessors::count_accessors(&handle).await?)?;
        }
        Commands::Tokens(TokenCommands::Lookup { accessors: csv }) => {
            let handle = connect(&config).await?;
            print_json(&accessors::lookup_by_accessors(&handle, &csv).await?)?;
        }
        Commands::Tokens(TokenCommands::Revoke { accessor }) => {
            let handle = connect(&config).await?;
            accessors::revoke_by_accessor(&handle, &accessor).await?;
            print_json(&serde_json::json!({"revoked": true}))?;
        }
        Commands::Tokens(TokenCommands::Create(create)) => {
            let wrap_ttl = create.wrap_ttl.clone();
            let request = TokenCreateRequest::from(create);
            let handle = connect(&config).await?;
            let issued = issuance::create_token(&handle, &request, wrap_ttl.as_deref()).await?;
            print_json(&issued)?;
        }
        Commands::Roles(RoleCommands::List) => {
            let handle = connect(&config).await?;
            print_json(&roles::list_roles(&handle).await?)?;
        }
        Commands::Roles(RoleCommands::Get { name }) => {
            let handle = connect(&config).await?;
            print_json(&roles::get_role(&handle, &name).await?)?;
        }
    }

    Ok(())
}

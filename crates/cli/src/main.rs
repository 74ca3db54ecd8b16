//! Publisher CLI for Larder.

mod api_client;

use anyhow::{Context, Result};
use api_client::ApiClient;
use clap::{Args, Parser, Subcommand};
use larder_core::codec;
use larder_core::update::{SchemaVersionContent, UpdateDocument, UpdatePayload};
use larder_signer::{DEFAULT_KEY_BITS, KeyPair, PayloadSigner};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "larderctl")]
#[command(about = "Build, sign and publish Larder updates")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct ApiArgs {
    /// Server API URL
    #[arg(long, env = "LARDER_SERVER")]
    server: String,
}

#[derive(Args, Clone)]
struct SigningArgs {
    /// Path to the PEM or OpenSSH private key
    #[arg(short, long, env = "LARDER_SIGNING_KEY_FILE")]
    key: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Key management commands
    Key {
        #[command(subcommand)]
        command: KeyCommands,
    },
    /// Update document commands
    Payload {
        #[command(subcommand)]
        command: PayloadCommands,
    },
    /// Print the base64 signature of an update document
    Sign {
        #[command(flatten)]
        signing: SigningArgs,
        /// Update document to sign, exactly as it will be sent
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Sign an update document and send it to the server
    Publish {
        #[command(flatten)]
        signing: SigningArgs,
        /// Update document to publish
        #[arg(short, long)]
        file: PathBuf,
        #[command(flatten)]
        api: ApiArgs,
    },
    /// Show the current version for a schema version
    Info {
        /// Schema version
        schema_version: i32,
        #[command(flatten)]
        api: ApiArgs,
    },
    /// List every stored schema version
    List {
        #[command(flatten)]
        api: ApiArgs,
    },
    /// Download and verify the content for a schema version
    Fetch {
        /// Schema version
        schema_version: i32,
        /// Output file
        #[arg(short, long)]
        output: PathBuf,
        #[command(flatten)]
        api: ApiArgs,
    },
    /// Check server health and version
    Health {
        #[command(flatten)]
        api: ApiArgs,
    },
}

#[derive(Subcommand)]
enum KeyCommands {
    /// Generate a new RSA signing key pair
    Generate {
        /// Key name, stored as the public key comment (e.g., "release-2024")
        #[arg(short, long)]
        name: String,
        /// Modulus size in bits
        #[arg(long, default_value_t = DEFAULT_KEY_BITS)]
        bits: usize,
        /// Output file for the private key
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show the OpenSSH public key for a private key
    Public {
        /// Path to the private key file
        #[arg(short, long)]
        file: PathBuf,
        /// Comment for the public key line (default: file stem)
        #[arg(long)]
        name: Option<String>,
    },
}

#[derive(Subcommand)]
enum PayloadCommands {
    /// Build an update document from content files
    Build {
        /// Version token (40 lowercase hex characters)
        #[arg(long = "version")]
        version: String,
        /// Entry as SCHEMA_VERSION=FILE; repeat for several schema versions
        #[arg(short, long = "entry", value_name = "SCHEMA_VERSION=FILE")]
        entries: Vec<String>,
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Key { command } => handle_key_command(command).await,
        Commands::Payload { command } => handle_payload_command(command).await,
        Commands::Sign { signing, file } => {
            let signer = load_signer(&signing.key).await?;
            let body = read_file(&file).await?;
            println!("{}", signer.sign_base64(&body)?);
            Ok(())
        }
        Commands::Publish { signing, file, api } => {
            handle_publish_command(&signing, &file, &api).await
        }
        Commands::Info {
            schema_version,
            api,
        } => {
            let client = get_api_client(&api)?;
            let info = client.get_info(schema_version).await?;
            println!("Schema version: {}", info.schema_version);
            println!("Version:        {}", info.version);
            if let Some(size) = info.content_size {
                println!("Size:           {size} bytes");
            }
            if let Some(updated_at) = info.updated_at {
                println!("Updated:        {updated_at}");
            }
            Ok(())
        }
        Commands::List { api } => {
            let client = get_api_client(&api)?;
            let databases = client.list().await?;
            if databases.is_empty() {
                println!("No databases published");
                return Ok(());
            }
            println!("{:<8} {:<42} {:>12}", "SCHEMA", "VERSION", "SIZE");
            for db in databases {
                let size = db
                    .content_size
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!("{:<8} {:<42} {:>12}", db.schema_version, db.version, size);
            }
            Ok(())
        }
        Commands::Fetch {
            schema_version,
            output,
            api,
        } => {
            let client = get_api_client(&api)?;
            let fetched = client.fetch(schema_version).await?;
            tokio::fs::write(&output, &fetched.content)
                .await
                .with_context(|| format!("failed to write {}", output.display()))?;
            println!(
                "Wrote {} bytes to {} (sha256 {})",
                fetched.content.len(),
                output.display(),
                fetched.digest
            );
            Ok(())
        }
        Commands::Health { api } => {
            let client = get_api_client(&api)?;
            let health = client.health().await?;
            println!("Status:  {}", health.status);
            println!("Version: {}", health.version);
            Ok(())
        }
    }
}

async fn handle_key_command(command: KeyCommands) -> Result<()> {
    match command {
        KeyCommands::Generate { name, bits, output } => {
            let keypair = KeyPair::generate(&name, bits).context("failed to generate key")?;
            let private_pem = keypair.to_private_pem()?;
            let public_key = keypair.to_openssh_public()?;

            if let Some(path) = output {
                tokio::fs::write(&path, &private_pem)
                    .await
                    .with_context(|| format!("failed to write key to {}", path.display()))?;
                restrict_permissions(&path)?;
                println!("Private key written to: {}", path.display());
            } else {
                println!("Private key:");
                print!("{private_pem}");
            }

            println!("\nPublic key:");
            println!("{public_key}");
            println!("\nInstall the public key in the server's trusted key directory as <name>.pub");
        }
        KeyCommands::Public { file, name } => {
            let name = name.unwrap_or_else(|| key_name_from_path(&file));
            let pem = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("failed to read key file: {}", file.display()))?;
            let keypair = KeyPair::from_pem(name, &pem).context("failed to parse private key")?;
            println!("{}", keypair.to_openssh_public()?);
        }
    }
    Ok(())
}

async fn handle_payload_command(command: PayloadCommands) -> Result<()> {
    match command {
        PayloadCommands::Build {
            version,
            entries,
            output,
        } => {
            let mut schema_versions = Vec::with_capacity(entries.len());
            for entry in &entries {
                let (schema_version, path) = parse_entry(entry)?;
                let content = read_file(&path).await?;
                schema_versions.push(SchemaVersionContent {
                    schema_version,
                    content: codec::encode(&content),
                });
            }

            let json = UpdateDocument {
                version,
                schema_versions,
            }
            .to_json()?;
            // Same rules the server applies once the signature checks out.
            let payload =
                UpdatePayload::parse_and_validate(&json).context("update document is invalid")?;

            match output {
                Some(path) => {
                    tokio::fs::write(&path, &json)
                        .await
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    eprintln!(
                        "Wrote update {} covering schema versions {:?} to {}",
                        payload.version,
                        payload.schema_versions(),
                        path.display()
                    );
                }
                None => println!("{json}"),
            }
        }
    }
    Ok(())
}

async fn handle_publish_command(signing: &SigningArgs, file: &Path, api: &ApiArgs) -> Result<()> {
    let client = get_api_client(api)?;
    let signer = load_signer(&signing.key).await?;
    let body = read_file(file).await?;
    let signature = signer.sign_base64(&body)?;

    let outcome = client.publish(body, &signature).await?;
    println!("Published version {}", outcome.version);
    if !outcome.created.is_empty() {
        println!("  created:  {:?}", outcome.created);
    }
    if !outcome.replaced.is_empty() {
        println!("  replaced: {:?}", outcome.replaced);
    }
    Ok(())
}

async fn load_signer(path: &Path) -> Result<PayloadSigner> {
    let pem = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read key file: {}", path.display()))?;
    PayloadSigner::from_pem(key_name_from_path(path), &pem).context("failed to parse private key")
}

async fn read_file(path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))
}

fn key_name_from_path(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("larder")
        .to_string()
}

/// Parse `SCHEMA_VERSION=FILE`.
fn parse_entry(entry: &str) -> Result<(i64, PathBuf)> {
    let (schema_version, path) = entry
        .split_once('=')
        .ok_or_else(|| anyhow::anyhow!("entry must be SCHEMA_VERSION=FILE: {entry}"))?;
    let schema_version: i64 = schema_version
        .trim()
        .parse()
        .with_context(|| format!("invalid schema version in entry: {entry}"))?;
    if path.is_empty() {
        anyhow::bail!("missing file in entry: {entry}");
    }
    Ok((schema_version, PathBuf::from(path)))
}

fn get_api_client(api: &ApiArgs) -> Result<ApiClient> {
    ApiClient::new(&normalize_base_url(&api.server)?)
}

fn normalize_base_url(url: &str) -> Result<String> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        anyhow::bail!("server URL must start with http:// or https://");
    }
    Ok(url.trim_end_matches('/').to_string())
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .with_context(|| format!("failed to restrict permissions on {}", path.display()))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

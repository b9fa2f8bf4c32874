use clap::{Parser, Subcommand};
use snapship::imaging::RustBackend;
use snapship::keys::{KeyPolicy, UploadKey};
use snapship::picker::{ImageHandle, PathPicker};
use snapship::pipeline::{Uploader, read_and_compress};
use snapship::session::Session;
use snapship::store::{HttpStore, ObjectStore, public_url};
use snapship::{config, output};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Bearer token for the store. Environment only — never config.
const TOKEN_ENV: &str = "SNAPSHIP_TOKEN";
/// Authenticated user id, needed only for `--owner-scoped` keys.
const USER_ID_ENV: &str = "SNAPSHIP_USER_ID";

fn version_string() -> &'static str {
    if env!("ON_RELEASE_TAG") == "true" {
        return env!("CARGO_PKG_VERSION");
    }
    match env!("GIT_HASH") {
        "" => "dev@unknown",
        // Leaked at most once per process, when the version is rendered
        hash => Box::leak(format!("dev@{hash}").into_boxed_str()),
    }
}

#[derive(Parser)]
#[command(name = "snapship")]
#[command(about = "Compress an image to a byte budget and upload it to bucket storage")]
#[command(long_about = "\
Compress an image to a byte budget and upload it to bucket storage

The pipeline scales the source to a fixed width (800px by default), encodes
JPEG at descending quality (80, 70, ... down to 10) until the result fits
the byte budget (1 MiB by default), then writes it to the store exactly
once. Every attempt re-encodes from the original source, so quality steps
never stack generation loss. A floor-quality result still over budget is
uploaded anyway and flagged in the report.

Sources may be JPEG, PNG, WebP, TIFF or anything else the decoder sniffs;
output is always baseline JPEG with content type image/jpeg.

Writes go to {base_url}/object/{bucket}/{key}. Credentials come from the
environment, never from config:

  SNAPSHIP_TOKEN     bearer token for the store (upload, fetch)
  SNAPSHIP_USER_ID   user id for --owner-scoped keys (upload)

Typical session:

  export SNAPSHIP_TOKEN=eyJhbG...
  snapship --base-url https://files.example.com/storage/v1 upload holiday.png
  snapship check holiday.png          # dry run: compression report, no store
  snapship url 1724601600124.jpg      # public URL for a stored key
  snapship fetch 1724601600124.jpg --out cover.jpg

Run 'snapship gen-config' to generate a documented snapship.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Config file (defaults to ./snapship.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Store API root, overrides the config file
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Bucket all keys are relative to, overrides the config file
    #[arg(long, global = true)]
    bucket: Option<String>,

    #[command(subcommand)]
    command: Command,
}

/// Arguments for the upload command.
#[derive(clap::Args)]
struct UploadArgs {
    /// Image to upload
    image: PathBuf,

    /// Store under this exact key instead of deriving a timestamp key
    #[arg(long)]
    key: Option<String>,

    /// Derive the key under the user's folder (needs SNAPSHIP_USER_ID)
    #[arg(long, conflicts_with = "key")]
    owner_scoped: bool,

    /// Replace an existing object instead of failing on key collision
    #[arg(long)]
    upsert: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Compress an image and write it to the store
    Upload(UploadArgs),
    /// Compress without uploading and report the quality walk
    Check {
        /// Image to compress
        image: PathBuf,
    },
    /// Download a stored object to a local file
    Fetch {
        /// Bucket-relative key to download
        key: String,
        /// Destination file (defaults to the key's file name)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print the public URL for a stored key
    Url {
        /// Bucket-relative key
        key: String,
    },
    /// Print a stock snapship.toml with all options documented
    GenConfig,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut cfg = config::load(cli.config.as_deref())?;
    if let Some(base_url) = cli.base_url {
        cfg.store.base_url = base_url;
    }
    if let Some(bucket) = cli.bucket {
        cfg.store.bucket = bucket;
    }

    match cli.command {
        Command::Upload(args) => {
            cfg.store.require()?;
            let session = session_from_env(args.owner_scoped)?;
            let store = HttpStore::new(&cfg.store, &session)?;
            let uploader = Uploader::new(
                RustBackend::new(),
                store,
                cfg.compression.to_compression_config(),
            )
            .with_upsert(args.upsert);

            let name = args.image.display().to_string();
            let receipt = match args.key {
                Some(key) => {
                    let handle = ImageHandle::from_path(&args.image);
                    uploader.upload(handle, UploadKey::new(key)?).await?
                }
                None => {
                    let policy = match session.user_id {
                        Some(owner) => KeyPolicy::OwnerScoped { owner },
                        None => KeyPolicy::Timestamp,
                    };
                    let picker = PathPicker::new(&args.image);
                    let Some(receipt) = uploader.pick_and_upload(&picker, &policy).await? else {
                        return Ok(());
                    };
                    receipt
                }
            };
            output::print_upload_report(&name, &receipt, cfg.compression.max_bytes);
        }
        Command::Check { image } => {
            let name = image.display().to_string();
            let handle = ImageHandle::from_path(&image);
            let compressed = read_and_compress(
                Arc::new(RustBackend::new()),
                handle,
                cfg.compression.to_compression_config(),
            )
            .await?;
            output::print_check_report(&name, &compressed, cfg.compression.max_bytes);
        }
        Command::Fetch { key, out } => {
            cfg.store.require()?;
            let session = session_from_env(false)?;
            let store = HttpStore::new(&cfg.store, &session)?;
            let bytes = store.get(&key).await?;
            let dest = out.unwrap_or_else(|| default_fetch_dest(&key));
            std::fs::write(&dest, &bytes)?;
            let line =
                output::format_fetch_line(&key, bytes.len() as u64, &dest.display().to_string());
            println!("{line}");
        }
        Command::Url { key } => {
            cfg.store.require()?;
            println!("{}", public_url(&cfg.store.base_url, &cfg.store.bucket, &key));
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Build a session from the environment.
///
/// The token is always required here; the user id only when the command will
/// derive an owner-scoped key.
fn session_from_env(need_user: bool) -> Result<Session, Box<dyn std::error::Error>> {
    let token = std::env::var(TOKEN_ENV)
        .map_err(|_| format!("{TOKEN_ENV} must be set for commands that talk to the store"))?;
    let mut session = Session::new(token);
    if need_user {
        let raw = std::env::var(USER_ID_ENV)
            .map_err(|_| format!("--owner-scoped needs {USER_ID_ENV}"))?;
        let user_id: Uuid = raw.trim().parse()?;
        session = session.with_user(user_id);
    }
    Ok(session)
}

/// Destination for `fetch` when `--out` is not given: the key's file name.
fn default_fetch_dest(key: &str) -> PathBuf {
    match key.rsplit('/').next() {
        Some(name) if !name.is_empty() => PathBuf::from(name),
        _ => PathBuf::from("fetched.jpg"),
    }
}

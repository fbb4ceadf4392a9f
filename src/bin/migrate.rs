use std::path::PathBuf;

use clap::Parser;
use sso_grpc::storage::SqliteStorage;

#[derive(Parser, Debug)]
#[command(name = "migrate")]
#[command(about = "Applies database migrations for the SSO service", long_about = None)]
#[command(version)]
struct Args {
    /// Path to the SQLite database file (created if missing)
    #[arg(short, long, env = "SSO_STORAGE_PATH")]
    storage_path: PathBuf,

    /// Seed a client application, formatted as ID:NAME:SECRET (repeatable)
    #[arg(long, value_name = "ID:NAME:SECRET")]
    seed_app: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Opening runs any pending migrations.
    let storage = SqliteStorage::open(&args.storage_path).await?;
    println!("migrations applied to {}", args.storage_path.display());

    for entry in &args.seed_app {
        let (id, name, secret) = parse_seed(entry)?;
        storage.save_app(id, name, secret).await?;
        println!("seeded application {id} ({name})");
    }

    Ok(())
}

fn parse_seed(raw: &str) -> Result<(i64, &str, &str), String> {
    let mut parts = raw.splitn(3, ':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(id), Some(name), Some(secret)) if !name.is_empty() && !secret.is_empty() => {
            let id = id
                .parse()
                .map_err(|_| format!("invalid app id in '{raw}'"))?;
            Ok((id, name, secret))
        }
        _ => Err(format!("expected ID:NAME:SECRET, got '{raw}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_entry_parsing() {
        assert_eq!(parse_seed("1:web:s3cret").unwrap(), (1, "web", "s3cret"));
        // Secrets may themselves contain colons.
        assert_eq!(
            parse_seed("2:cli:a:b:c").unwrap(),
            (2, "cli", "a:b:c")
        );
        assert!(parse_seed("x:web:s").is_err());
        assert!(parse_seed("1:web").is_err());
        assert!(parse_seed("").is_err());
    }
}

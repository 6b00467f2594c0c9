//! The `lingolife init` command.

use std::path::Path;

use anyhow::Result;

const CONFIG_FILE: &str = "lingolife.toml";

pub fn execute() -> Result<()> {
    if Path::new(CONFIG_FILE).exists() {
        println!("{CONFIG_FILE} already exists, skipping.");
    } else {
        std::fs::write(CONFIG_FILE, SAMPLE_CONFIG)?;
        println!("Created {CONFIG_FILE}");
    }

    println!("\nNext steps:");
    println!("  1. Edit {CONFIG_FILE} (leave [database] empty for the in-memory store)");
    println!("  2. Run: lingolife serve");
    println!("  3. Run: lingolife register <username> <email> --password <password>");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# lingolife configuration

[server]
host = "0.0.0.0"
port = 5000
jwt_secret = "${JWT_SECRET}"
token_ttl_days = 7

# Remote store (Supabase / PostgREST). Without url and api_key the server
# keeps words in memory, seeded with sample data.
[database]
url = "${SUPABASE_URL}"
api_key = "${SUPABASE_SERVICE_ROLE_KEY}"
seed_samples = true

# Credentials for the signed translation fallback.
[youdao]
app_key = "${YOUDAO_APP_KEY}"
app_secret = "${YOUDAO_APP_SECRET}"
timeout_secs = 15
"#;

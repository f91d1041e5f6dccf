//! Example: Classify the keys in a saved vindex response
//!
//! Run with: cargo run --example check_expiring -- <vindex file> [YYYY-MM-DD] [config.json]

use chrono::NaiveDate;
use pgp_expiry::{Classification, Config, ExpiryRun, PgpKey, VindexParser};
use tracing_subscriber::EnvFilter;

fn main() -> pgp_expiry::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let Some(vindex_path) = args.next() else {
        eprintln!("usage: check_expiring <vindex file> [YYYY-MM-DD] [config.json]");
        std::process::exit(2);
    };

    let today = match args.next() {
        Some(date) => NaiveDate::parse_from_str(&date, "%Y-%m-%d")
            .map_err(|_| pgp_expiry::Error::InvalidDate { value: date })?,
        None => chrono::Local::now().date_naive(),
    };
    let config = Config::load_or_default(args.next().unwrap_or_else(|| "config.json".into()))?;

    let response = std::fs::read(&vindex_path)?;
    let policy = config.exclusion_policy();
    let mut run = ExpiryRun::new(today, config.expiring_days, &policy);

    for key in VindexParser::from_bytes(&response)? {
        match run.classify(&key) {
            Classification::Expiring => println!("{}", format_key_output(&key)),
            Classification::Excluded(reason) => println!("[excluded: {reason}] {key}"),
            Classification::NotExpiring => {}
        }
    }

    let stats = run.finish();
    println!(
        "\nChecked {}, excluded {}. {} expiring in {} days.",
        stats.parsed, stats.excluded, stats.expiring, config.expiring_days
    );

    Ok(())
}

fn format_key_output(key: &PgpKey) -> String {
    let key_type = key.key_type().map(|t| t.to_string()).unwrap_or_default();
    let expires = key.friendly_expiry_date().unwrap_or_default();

    format!(
        "{} {} expires {}\n    {}",
        key.long_id().unwrap_or_default(),
        key_type,
        expires,
        key.email_lines().join(", ")
    )
}

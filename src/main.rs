use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use std::io::Read;
use std::path::Path;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

use veritext::models::HumanizeOptions;
use veritext::services::{
    load_or_default, load_text_file, resolve_api_key, score_label, DetectorClient,
    HumanizerClient, PollPolicy, DETECTOR_SERVICE, HUMANIZER_SERVICE,
};

const USAGE: &str = "Usage:
  veritext detect <file|-> [--key <api_key>]
  veritext humanize <file|-> [--key <api_key>]
      [--readability <High School|University|Doctorate|Journalist|Marketing>]
      [--purpose <General Writing|Essay|Article|...>]
      [--strength <Quality|Balanced|More Human>]
      [--model <v2|v11>]
      [--interval-secs <n>] [--max-attempts <n>]

Reads the document from the given .txt/.md file, or from stdin with `-`.
API keys come from --key, the environment (GPTZERO_API_KEY /
UNDETECTABLE_API_KEY), or the config file.";

fn parse_arg_value(args: &[String], key: &str) -> Option<String> {
    args.iter()
        .position(|a| a == key)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

/// First argument that is not part of a `--flag value` pair.
fn positional_arg(args: &[String]) -> Option<&str> {
    let mut i = 0;
    while i < args.len() {
        if args[i].starts_with("--") {
            i += 2;
        } else {
            return Some(args[i].as_str());
        }
    }
    None
}

fn parse_enum_value<T: DeserializeOwned>(name: &str, raw: &str) -> Result<T> {
    serde_json::from_value(serde_json::Value::String(raw.to_string()))
        .with_context(|| format!("invalid value {:?} for --{}", raw, name))
}

fn read_input(path_arg: &str) -> Result<String> {
    if path_arg == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("failed to read stdin")?;
        Ok(buffer)
    } else {
        Ok(load_text_file(Path::new(path_arg))?)
    }
}

fn require_api_key(args: &[String], service: &str) -> Result<String> {
    if let Some(key) = parse_arg_value(args, "--key") {
        return Ok(key);
    }
    match resolve_api_key(service) {
        Some(key) => Ok(key),
        None => bail!(
            "no API key configured for the {} service; pass --key or set the environment variable",
            service
        ),
    }
}

fn humanize_options(args: &[String], base: HumanizeOptions) -> Result<HumanizeOptions> {
    let mut options = base;
    if let Some(raw) = parse_arg_value(args, "--readability") {
        options.readability = parse_enum_value("readability", &raw)?;
    }
    if let Some(raw) = parse_arg_value(args, "--purpose") {
        options.purpose = parse_enum_value("purpose", &raw)?;
    }
    if let Some(raw) = parse_arg_value(args, "--strength") {
        options.strength = parse_enum_value("strength", &raw)?;
    }
    if let Some(raw) = parse_arg_value(args, "--model") {
        options.model = parse_enum_value("model", &raw)?;
    }
    Ok(options)
}

fn poll_policy(args: &[String]) -> PollPolicy {
    let mut policy = PollPolicy::default();
    if let Some(n) = parse_arg_value(args, "--interval-secs").and_then(|s| s.parse().ok()) {
        policy.interval = Duration::from_secs(n);
    }
    if let Some(n) = parse_arg_value(args, "--max-attempts").and_then(|s| s.parse().ok()) {
        policy.max_attempts = n;
    }
    policy
}

async fn run_detect(args: &[String]) -> Result<()> {
    let path = positional_arg(args).unwrap_or("-");
    let text = read_input(path)?;
    let api_key = require_api_key(args, DETECTOR_SERVICE)?;

    let client = DetectorClient::new(api_key);
    let result = client.analyze(&text).await?;

    println!(
        "Overall: {:.1}% AI ({})",
        result.completely_generated_prob * 100.0,
        score_label(result.completely_generated_prob)
    );
    println!(
        "Average paragraph probability: {:.1}%",
        result.average_generated_prob * 100.0
    );
    println!("Burstiness: {:.2}", result.overall_burstiness);
    println!();

    for (i, paragraph) in result.paragraphs.iter().enumerate() {
        let preview: String = paragraph.text.chars().take(60).collect();
        println!(
            "  [{}] {:>5.1}%  {}  {}",
            i + 1,
            paragraph.generated_prob * 100.0,
            score_label(paragraph.generated_prob),
            preview.replace('\n', " ")
        );
    }
    Ok(())
}

async fn run_humanize(args: &[String]) -> Result<()> {
    let path = positional_arg(args).unwrap_or("-");
    let text = read_input(path)?;
    let api_key = require_api_key(args, HUMANIZER_SERVICE)?;

    // Config-file defaults apply when no flag overrides them.
    let config = load_or_default();
    let options = humanize_options(args, config.humanize_defaults.unwrap_or_default())?;
    let policy = poll_policy(args);

    let client = HumanizerClient::new(api_key);

    let cancel = CancellationToken::new();
    let ctrl_c_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, cancelling job");
            ctrl_c_cancel.cancel();
        }
    });

    let humanized = client.humanize(&text, &options, &policy, &cancel).await?;
    println!("{}", humanized);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    veritext::init_logging();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first() else {
        eprintln!("{}", USAGE);
        return Ok(());
    };

    match command.as_str() {
        "detect" => run_detect(&args[1..]).await,
        "humanize" => run_humanize(&args[1..]).await,
        _ => {
            eprintln!("{}", USAGE);
            bail!("unknown command {:?}", command);
        }
    }
}

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "relay-cli")]
#[command(about = "Command-line client for the eduai relay", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:3000", env = "RELAY_URL")]
    url: String,

    /// Bearer token sent as the Authorization header.
    #[arg(short, long, env = "RELAY_TOKEN")]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check relay liveness and database connectivity
    Health,
    /// Generate visual notes from text and save the image
    Notes {
        /// Text to turn into a diagram
        text: String,
        #[arg(short, long, default_value = "visual-notes.png")]
        out: PathBuf,
    },
    /// Translate the text in an image and save the result
    Translate {
        file: PathBuf,
        #[arg(short, long)]
        lang: String,
        #[arg(short, long, default_value = "translated-image.png")]
        out: PathBuf,
    },
    /// Waitlist operations
    #[command(subcommand)]
    Waitlist(WaitlistCommands),
}

#[derive(Subcommand)]
enum WaitlistCommands {
    /// Add an email to the waitlist
    Join { email: String },
    /// List waitlist entries (needs the admin key as --token)
    List,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/').to_string();

    let mut headers = HeaderMap::new();
    if let Some(token) = &cli.token {
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token))?,
        );
    }

    match cli.command {
        Commands::Health => {
            let live = client.get(format!("{}/health", base)).send().await?;
            println!("relay: {}", live.status());
            let res = client.get(format!("{}/api/health/db", base)).send().await?;
            print_json(res).await?;
        }
        Commands::Notes { text, out } => {
            let res = client
                .post(format!("{}/api/visual-notes", base))
                .headers(headers)
                .json(&json!({ "text": text }))
                .send()
                .await?;
            save_image(res, &out).await?;
        }
        Commands::Translate { file, lang, out } => {
            let bytes = tokio::fs::read(&file).await?;
            let file_name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "upload".to_string());
            let form = Form::new()
                .part("file", Part::bytes(bytes).file_name(file_name))
                .text("target_lang", lang);
            let res = client
                .post(format!("{}/api/visual-translation", base))
                .headers(headers)
                .multipart(form)
                .send()
                .await?;
            save_image(res, &out).await?;
        }
        Commands::Waitlist(WaitlistCommands::Join { email }) => {
            let res = client
                .post(format!("{}/api/waitlist", base))
                .json(&json!({ "email": email }))
                .send()
                .await?;
            print_json(res).await?;
        }
        Commands::Waitlist(WaitlistCommands::List) => {
            let res = client
                .get(format!("{}/api/admin/waitlist", base))
                .headers(headers)
                .send()
                .await?;
            print_json(res).await?;
        }
    }

    Ok(())
}

async fn save_image(res: reqwest::Response, out: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: relay returned status {}", status);
        return print_json(res).await;
    }

    let content_type = res
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();
    let bytes = res.bytes().await?;
    tokio::fs::write(out, &bytes).await?;
    println!("Saved {} bytes ({}) to {}", bytes.len(), content_type, out.display());
    Ok(())
}

async fn print_json(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }
    if !status.is_success() {
        eprintln!("Status: {}", status);
    }
    Ok(())
}

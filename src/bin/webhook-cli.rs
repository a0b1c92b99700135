use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::Value;

use swift_webhook::webhook::{X_AUTH_TOKEN, X_REMOVE_WEBHOOK, X_WEBHOOK, X_WEBHOOK_AUTH};

#[derive(Parser)]
#[command(name = "webhook-cli")]
#[command(about = "Manage container webhooks through the Swift webhook proxy", long_about = None)]
struct Cli {
    /// Storage account URL, e.g. http://localhost:8080/v1/AUTH_test
    #[arg(short, long, env = "OS_STORAGE_URL")]
    url: String,

    /// Swift auth token
    #[arg(short, long, env = "OS_AUTH_TOKEN")]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Attach a webhook to a container
    Set {
        container: String,
        /// Callback URL to notify
        webhook: String,
        /// Credential sent to the callback as HTTP basic auth
        #[arg(long)]
        auth: String,
    },
    /// Remove the container's webhook
    Remove { container: String },
    /// Print the container's webhook URL
    Show { container: String },
    /// Print the cluster capability document
    Info,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let account = cli.url.trim_end_matches('/');

    let mut headers = HeaderMap::new();
    if let Some(token) = &cli.token {
        headers.insert(X_AUTH_TOKEN, HeaderValue::from_str(token)?);
    }

    match cli.command {
        Commands::Set { container, webhook, auth } => {
            headers.insert(X_WEBHOOK, HeaderValue::from_str(&webhook)?);
            headers.insert(X_WEBHOOK_AUTH, HeaderValue::from_str(&auth)?);
            let res = client
                .put(format!("{}/{}", account, container))
                .headers(headers)
                .send()
                .await?;
            report(res, "Webhook set").await;
        }
        Commands::Remove { container } => {
            headers.insert(X_REMOVE_WEBHOOK, HeaderValue::from_static("true"));
            let res = client
                .post(format!("{}/{}", account, container))
                .headers(headers)
                .send()
                .await?;
            report(res, "Webhook removed").await;
        }
        Commands::Show { container } => {
            let res = client
                .head(format!("{}/{}", account, container))
                .headers(headers)
                .send()
                .await?;
            if !res.status().is_success() {
                eprintln!("Error: storage returned status {}", res.status());
                return Ok(());
            }
            match res.headers().get(X_WEBHOOK).and_then(|v| v.to_str().ok()) {
                Some(webhook) => println!("{}", webhook),
                None => println!("No webhook configured"),
            }
        }
        Commands::Info => {
            let mut info_url = reqwest::Url::parse(account)?;
            info_url.set_path("/info");
            let res = client.get(info_url).send().await?;
            if !res.status().is_success() {
                eprintln!("Error: /info returned status {}", res.status());
                return Ok(());
            }
            let json: Value = res.json().await?;
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
    }

    Ok(())
}

async fn report(res: reqwest::Response, success: &str) {
    let status = res.status();
    if status.is_success() {
        println!("{} ({})", success, status);
    } else {
        eprintln!("Error: storage returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
    }
}

//! Terminal client for the radx X-ray scan service.

mod client;
mod session;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use radx_model::{Anomaly, DeleteRequest, RenameRequest, SaveScanRequest};

use client::ApiClient;
use session::{ScanSession, parse_anomaly_arg};

#[derive(Parser, Debug)]
#[command(name = "radxctl")]
#[command(about = "Upload X-ray images, run anomaly detection, and manage scan history")]
struct Cli {
    /// Server base URL
    #[arg(long, global = true, default_value = "http://localhost:3000")]
    server: String,

    /// Give up waiting for a detection result after this many seconds
    #[arg(long, global = true, default_value_t = 15)]
    timeout_secs: u64,

    /// Poll interval while a detection job is running, in milliseconds
    #[arg(long, global = true, default_value_t = 500)]
    poll_ms: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the scan history
    List,
    /// Upload an image, run detection, and display the findings
    Detect {
        /// Local file path or remote URL of the X-ray image
        image: String,
        /// Where to write the processed result image
        #[arg(long)]
        output: Option<PathBuf>,
        /// Persist the finished scan into the history afterwards
        #[arg(long)]
        save: bool,
    },
    /// Persist a scan record without running detection
    Save {
        /// Image URL the server should download and store
        image_url: String,
        /// Findings as name=percentage pairs, e.g. --anomaly "Fracture=65%"
        #[arg(long = "anomaly")]
        anomalies: Vec<String>,
    },
    /// Rewrite a stored record's image URL (metadata only)
    Rename {
        image_url: String,
        new_image_url: String,
    },
    /// Remove records matching an image URL (metadata only)
    Delete { image_url: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let client = ApiClient::new(&cli.server);

    match cli.command {
        Command::List => list(&client).await,
        Command::Detect {
            image,
            output,
            save,
        } => {
            detect(
                &client,
                &image,
                output,
                save,
                Duration::from_millis(cli.poll_ms),
                Duration::from_secs(cli.timeout_secs),
            )
            .await
        }
        Command::Save {
            image_url,
            anomalies,
        } => save(&client, image_url, anomalies).await,
        Command::Rename {
            image_url,
            new_image_url,
        } => {
            let matched = client
                .rename(&RenameRequest {
                    image_url,
                    new_image_url,
                })
                .await?;
            println!("Renamed {matched} record(s)");
            Ok(())
        }
        Command::Delete { image_url } => {
            let matched = client.delete(&DeleteRequest { image_url }).await?;
            println!("Deleted {matched} record(s)");
            Ok(())
        }
    }
}

async fn list(client: &ApiClient) -> Result<()> {
    let records = client.list().await?;
    if records.is_empty() {
        println!("No scans in the history.");
        return Ok(());
    }
    for record in records {
        let name = record
            .image_url
            .rsplit('/')
            .next()
            .unwrap_or(&record.image_url);
        println!("{name}");
        print_findings(&record.anomalies, "  ");
    }
    Ok(())
}

async fn detect(
    client: &ApiClient,
    image: &str,
    output: Option<PathBuf>,
    save_after: bool,
    poll_interval: Duration,
    deadline: Duration,
) -> Result<()> {
    let mut session = ScanSession::new(client, poll_interval, deadline);
    let outcome = session.run(image, output).await?;

    println!("Result image written to {}", outcome.output_file.display());
    print_findings(&outcome.anomalies, "");

    if save_after {
        session.save(&outcome).await?;
        println!("Scan saved to the history.");
    }
    Ok(())
}

async fn save(client: &ApiClient, image_url: String, anomalies: Vec<String>) -> Result<()> {
    let anomalies = anomalies
        .iter()
        .map(|arg| parse_anomaly_arg(arg))
        .collect::<Result<Vec<_>>>()?;
    client
        .save(&SaveScanRequest {
            image_url: Some(image_url),
            anomalies: if anomalies.is_empty() {
                None
            } else {
                Some(anomalies)
            },
        })
        .await?;
    println!("Scan saved to the history.");
    Ok(())
}

fn print_findings(anomalies: &[Anomaly], indent: &str) {
    if anomalies.is_empty() {
        println!("{indent}No anomalies detected");
        return;
    }
    for anomaly in anomalies {
        println!("{indent}{}: {}", anomaly.anomaly_name, anomaly.percentage);
    }
}

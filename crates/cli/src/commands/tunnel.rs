//! Tunnel commands: provision credentials, query client status

use anyhow::{Context, Result};
use clap::Subcommand;
use std::path::PathBuf;

use crate::client::{ApiClient, Credential, TunnelStatus};
use crate::output::{print_item, print_message, OutputFormat, TableDisplay};

#[derive(Subcommand)]
pub enum TunnelCommands {
    /// Provision a tunnel credential for a signed name claim
    Provision {
        /// Registered name (e.g. alice.eth)
        name: String,
        /// Message that was signed
        message: String,
        /// Hex signature (65 bytes, r || s || v)
        signature: String,
        /// Also download the configuration document to this directory
        #[arg(long)]
        save_to: Option<PathBuf>,
    },

    /// Show connection status for a client
    Status {
        /// Client id (12 hex characters)
        client_id: String,
    },
}

impl TableDisplay for Credential {
    fn headers() -> Vec<&'static str> {
        vec!["NAME", "CLIENT ID", "TUNNEL IP", "CONTENT ADDRESS", "PINNED", "FILENAME"]
    }
    fn row(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.client_id.clone(),
            self.assigned_ip.clone(),
            self.content_address.clone(),
            if self.pinned { "yes" } else { "no" }.to_string(),
            self.filename.clone(),
        ]
    }
}

impl TableDisplay for TunnelStatus {
    fn headers() -> Vec<&'static str> {
        vec!["CLIENT ID", "STATUS", "LAST SEEN"]
    }
    fn row(&self) -> Vec<String> {
        vec![
            self.client_id.clone(),
            self.status.clone(),
            self.last_seen
                .map(|t| t.to_string())
                .unwrap_or_else(|| "never".to_string()),
        ]
    }
}

pub async fn run(command: TunnelCommands, client: &ApiClient, format: OutputFormat) -> Result<()> {
    match command {
        TunnelCommands::Provision {
            name,
            message,
            signature,
            save_to,
        } => {
            let credential = client.provision(&name, &message, &signature).await?;
            print_item(&credential, format);

            if let Some(dir) = save_to {
                let document = client
                    .storage_get(&credential.content_address)
                    .await
                    .context("credential issued but download failed")?;
                let path = dir.join(&credential.filename);
                std::fs::write(&path, document)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                print_message(&format!("Saved configuration to {}", path.display()), format);
            }
        }
        TunnelCommands::Status { client_id } => {
            let status = client.tunnel_status(&client_id).await?;
            print_item(&status, format);
        }
    }
    Ok(())
}

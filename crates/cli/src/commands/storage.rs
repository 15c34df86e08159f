//! Storage commands: publish, fetch, and locate content

use anyhow::{Context, Result};
use clap::Subcommand;
use std::io::Read;
use std::path::PathBuf;

use crate::client::{ApiClient, Published};
use crate::output::{print_item, print_message, OutputFormat, TableDisplay};

#[derive(Subcommand)]
pub enum StorageCommands {
    /// Publish content and print its content address
    Put {
        /// File to publish; reads stdin when omitted
        file: Option<PathBuf>,
    },

    /// Fetch content by its address
    Get {
        /// Content address
        address: String,
        /// Write to this file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Print the public gateway URL for a content address
    Gateway {
        /// Content address
        address: String,
    },
}

impl TableDisplay for Published {
    fn headers() -> Vec<&'static str> {
        vec!["CONTENT ADDRESS", "GATEWAY URL"]
    }
    fn row(&self) -> Vec<String> {
        vec![self.content_address.clone(), self.gateway_url.clone()]
    }
}

pub async fn run(command: StorageCommands, client: &ApiClient, format: OutputFormat) -> Result<()> {
    match command {
        StorageCommands::Put { file } => {
            let content = match file {
                Some(path) => std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read {}", path.display()))?,
                None => {
                    let mut buf = String::new();
                    std::io::stdin()
                        .read_to_string(&mut buf)
                        .context("failed to read stdin")?;
                    buf
                }
            };
            let published = client.storage_put(&content).await?;
            print_item(&published, format);
        }
        StorageCommands::Get { address, output } => {
            let content = client.storage_get(&address).await?;
            match output {
                Some(path) => {
                    std::fs::write(&path, content)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    print_message(&format!("Saved content to {}", path.display()), format);
                }
                None => {
                    let mut stdout = std::io::stdout();
                    std::io::Write::write_all(&mut stdout, &content)?;
                }
            }
        }
        StorageCommands::Gateway { address } => {
            let published = client.storage_gateway(&address).await?;
            print_item(&published, format);
        }
    }
    Ok(())
}

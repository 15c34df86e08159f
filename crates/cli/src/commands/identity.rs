//! Identity commands: resolve names, verify ownership and signatures

use anyhow::Result;
use clap::Subcommand;

use crate::client::{ApiClient, OwnershipCheck, Resolved, SignatureCheck};
use crate::output::{print_item, OutputFormat, TableDisplay};

#[derive(Subcommand)]
pub enum IdentityCommands {
    /// Resolve a name to its registered address
    Resolve {
        /// Registered name (e.g. alice.eth)
        name: String,
    },

    /// Check the registry's declared owner of a name
    VerifyOwnership {
        /// Registered name
        name: String,
        /// Address to check against the owner field
        address: String,
    },

    /// Verify a signed message against a name's registered address
    VerifySignature {
        /// Registered name
        name: String,
        /// Message that was signed
        message: String,
        /// Hex signature (65 bytes, r || s || v)
        signature: String,
    },
}

impl TableDisplay for Resolved {
    fn headers() -> Vec<&'static str> {
        vec!["NAME", "ADDRESS"]
    }
    fn row(&self) -> Vec<String> {
        vec![self.name.clone(), self.address.clone()]
    }
}

impl TableDisplay for OwnershipCheck {
    fn headers() -> Vec<&'static str> {
        vec!["NAME", "ADDRESS", "OWNER"]
    }
    fn row(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.address.clone(),
            if self.is_owner { "yes" } else { "no" }.to_string(),
        ]
    }
}

impl TableDisplay for SignatureCheck {
    fn headers() -> Vec<&'static str> {
        vec!["NAME", "VALID"]
    }
    fn row(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            if self.is_valid { "yes" } else { "no" }.to_string(),
        ]
    }
}

pub async fn run(command: IdentityCommands, client: &ApiClient, format: OutputFormat) -> Result<()> {
    match command {
        IdentityCommands::Resolve { name } => {
            let resolved = client.resolve(&name).await?;
            print_item(&resolved, format);
        }
        IdentityCommands::VerifyOwnership { name, address } => {
            let check = client.verify_ownership(&name, &address).await?;
            print_item(&check, format);
        }
        IdentityCommands::VerifySignature {
            name,
            message,
            signature,
        } => {
            let check = client.verify_signature(&name, &message, &signature).await?;
            print_item(&check, format);
        }
    }
    Ok(())
}

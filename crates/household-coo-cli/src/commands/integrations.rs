use clap::Subcommand;
use household_coo_core::Integration;

use super::open_store;

#[derive(Subcommand)]
pub enum IntegrationsAction {
    /// Show connection status
    Show,
    /// Flip a connection on or off
    Toggle {
        /// gmail or whatsapp
        integration: Integration,
    },
}

fn status(connected: bool) -> &'static str {
    if connected {
        "connected"
    } else {
        "disconnected"
    }
}

pub fn run(action: IntegrationsAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = open_store()?;

    match action {
        IntegrationsAction::Show => {
            println!("{}", serde_json::to_string_pretty(&store.state().integrations)?);
        }
        IntegrationsAction::Toggle { integration } => {
            let connected = store.toggle_integration(integration)?;
            let name = match integration {
                Integration::Gmail => "gmail",
                Integration::Whatsapp => "whatsapp",
            };
            println!("{name}: {}", status(connected));
        }
    }
    Ok(())
}

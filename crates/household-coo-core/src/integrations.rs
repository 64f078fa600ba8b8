//! Source connection flags.
//!
//! Gmail and the WhatsApp bot are represented only by on/off switches; no
//! real connection is made.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::ValidationError;

/// Number users message to reach the household bot.
pub const DEFAULT_WHATSAPP_BOT_ID: &str = "+1-555-COO-HELP";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Integration {
    Gmail,
    Whatsapp,
}

impl FromStr for Integration {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gmail" | "email" => Ok(Integration::Gmail),
            "whatsapp" | "wa" => Ok(Integration::Whatsapp),
            other => Err(ValidationError::InvalidValue {
                field: "integration".into(),
                message: format!("'{other}' is not gmail or whatsapp"),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationsState {
    pub gmail_connected: bool,
    pub whatsapp_bot_connected: bool,
    pub whatsapp_bot_id: String,
}

impl Default for IntegrationsState {
    fn default() -> Self {
        Self {
            gmail_connected: true,
            whatsapp_bot_connected: true,
            whatsapp_bot_id: DEFAULT_WHATSAPP_BOT_ID.into(),
        }
    }
}

impl IntegrationsState {
    /// Flip one connection flag and return its new value.
    pub fn toggle(&mut self, integration: Integration) -> bool {
        let flag = match integration {
            Integration::Gmail => &mut self.gmail_connected,
            Integration::Whatsapp => &mut self.whatsapp_bot_connected,
        };
        *flag = !*flag;
        *flag
    }

    pub fn is_connected(&self, integration: Integration) -> bool {
        match integration {
            Integration::Gmail => self.gmail_connected,
            Integration::Whatsapp => self.whatsapp_bot_connected,
        }
    }
}

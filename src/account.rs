//! Sign-in state, usage credits, and plan details.
//!
//! Only used for display and for gating AI question generation.

use std::sync::Mutex;

use serde::Deserialize;
use tracing::info;

use crate::error::GenerationError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub name: String,
    pub email: Option<String>,
}

pub trait Account: Send + Sync {
    fn is_signed_in(&self) -> bool;

    fn user(&self) -> Option<UserProfile>;

    /// Remaining generation credits; `None` means unmetered.
    fn credits_remaining(&self) -> Option<u32>;

    fn plan_name(&self) -> String;

    /// Spends one credit.
    fn consume_credit(&self) -> Result<(), GenerationError>;

    /// Asks to upgrade or manage the subscription. Returns where to go.
    fn request_upgrade(&self) -> Option<String>;
}

/// Checks that a generation request may be made, without spending a credit.
pub fn ensure_can_generate(account: &dyn Account) -> Result<(), GenerationError> {
    if !account.is_signed_in() {
        return Err(GenerationError::SignedOut);
    }
    match account.credits_remaining() {
        Some(0) => Err(GenerationError::InsufficientCredits),
        _ => Ok(()),
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AccountSettings {
    pub user: Option<String>,
    pub email: Option<String>,
    pub credits: Option<u32>,
    pub plan: Option<String>,
    pub upgrade_url: Option<String>,
}

/// Account backed by local settings.
#[derive(Debug)]
pub struct LocalAccount {
    settings: AccountSettings,
    credits: Mutex<Option<u32>>,
}

impl LocalAccount {
    pub fn new(settings: AccountSettings) -> Self {
        let credits = Mutex::new(settings.credits);
        Self { settings, credits }
    }

    pub fn signed_out() -> Self {
        Self::new(AccountSettings::default())
    }
}

impl Account for LocalAccount {
    fn is_signed_in(&self) -> bool {
        self.settings.user.is_some()
    }

    fn user(&self) -> Option<UserProfile> {
        self.settings.user.as_ref().map(|name| UserProfile {
            name: name.clone(),
            email: self.settings.email.clone(),
        })
    }

    fn credits_remaining(&self) -> Option<u32> {
        *self.credits.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn plan_name(&self) -> String {
        self.settings
            .plan
            .clone()
            .unwrap_or_else(|| "Free".to_string())
    }

    fn consume_credit(&self) -> Result<(), GenerationError> {
        let mut credits = self.credits.lock().unwrap_or_else(|e| e.into_inner());
        match credits.as_mut() {
            None => Ok(()),
            Some(0) => Err(GenerationError::InsufficientCredits),
            Some(remaining) => {
                *remaining -= 1;
                Ok(())
            }
        }
    }

    fn request_upgrade(&self) -> Option<String> {
        let url = self.settings.upgrade_url.clone();
        info!(plan = %self.plan_name(), url = ?url, "upgrade requested");
        url
    }
}

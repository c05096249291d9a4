//! Post-deployment summary

use crate::model::ContainerApp;
use crate::provider::Platform;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What the user sees once `up` finishes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpSummary {
    pub app_name: String,
    pub resource_group: String,
    pub url: Option<String>,
}

impl UpSummary {
    /// Re-read the app and pick up its public address
    pub async fn collect(platform: &Platform, app: &ContainerApp) -> Self {
        let url = app
            .get(platform)
            .await
            .and_then(|record| record.fqdn)
            .filter(|fqdn| !fqdn.is_empty())
            .map(|fqdn| with_scheme(&fqdn));

        Self {
            app_name: app.name().to_string(),
            resource_group: app.resource_group().name().unwrap_or_default().to_string(),
            url,
        }
    }

    pub fn logs_command(&self) -> String {
        format!(
            "az containerapp logs show -n {} -g {}",
            self.app_name, self.resource_group
        )
    }

    pub fn show_command(&self) -> String {
        format!(
            "az containerapp show -n {} -g {}",
            self.app_name, self.resource_group
        )
    }
}

fn with_scheme(fqdn: &str) -> String {
    if fqdn.starts_with("http") {
        fqdn.to_string()
    } else {
        format!("http://{}", fqdn)
    }
}

impl fmt::Display for UpSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Container app '{}' is up.", self.app_name)?;
        if let Some(url) = &self.url {
            writeln!(f, "Browse to your container app at: {}", url)?;
        }
        writeln!(f, "Stream logs for your container with: {}", self.logs_command())?;
        write!(f, "See full output using: {}", self.show_command())
    }
}

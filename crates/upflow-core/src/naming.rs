//! Names for resources the user did not name

use crate::constants::{MAXIMUM_REGISTRY_NAME_LENGTH, REGISTRY_DOMAIN_SUFFIX, REGISTRY_HASH_LENGTH};
use chrono::{DateTime, TimeZone};
use rand::Rng;
use sha2::{Digest, Sha256};

/// Registry name derived from (resource group, user, app name).
///
/// The suffix is a SHA-256 digest of the NUL-separated inputs, so reruns
/// with the same inputs land on the same registry from any process.
pub fn registry_name(resource_group: &str, user: &str, app_name: &str) -> String {
    const DELIMITER: &[u8] = b"\x00";

    let mut hasher = Sha256::new();
    hasher.update(resource_group.as_bytes());
    hasher.update(DELIMITER);
    hasher.update(user.as_bytes());
    hasher.update(DELIMITER);
    hasher.update(app_name.as_bytes());
    let digest = hex::encode(hasher.finalize());

    let base: String = format!("{}acr", app_name)
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();

    let mut name = format!("{}{}", base, &digest[..REGISTRY_HASH_LENGTH]).to_ascii_lowercase();
    name.truncate(MAXIMUM_REGISTRY_NAME_LENGTH);
    name
}

/// Registry name from a login server or image host,
/// e.g. `https://myacr.azurecr.io` or `myacr.azurecr.io/web:1` → `myacr`
pub fn registry_name_from_server(server: &str) -> String {
    let host = server
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(server);
    let host = host.split('/').next().unwrap_or(host);
    host.split('.').next().unwrap_or(host).to_string()
}

pub fn is_platform_registry(server: &str) -> bool {
    server.contains(REGISTRY_DOMAIN_SUFFIX)
}

pub fn login_server(registry_name: &str) -> String {
    format!("{}{}", registry_name, REGISTRY_DOMAIN_SUFFIX)
}

/// Randomized resource group name, `<user>_rg_<0000-9999>`
pub fn randomized_group_name(user: &str) -> String {
    let prefix: String = user
        .split('@')
        .next()
        .unwrap_or(user)
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    let prefix = if prefix.is_empty() { "upflow" } else { &prefix };

    let suffix: u16 = rand::thread_rng().gen_range(0..10_000);
    format!("{}_rg_{:04}", prefix, suffix)
}

pub fn environment_name(app_name: &str) -> String {
    format!("{}-env", app_name).replace('_', "-")
}

/// Version tag for images built from source, e.g. `20261017093015123456`
pub fn build_tag<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    now.format("%Y%m%d%H%M%S%6f").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_registry_name_is_deterministic() {
        let first = registry_name("web-rg", "dev@example.com", "web-api");
        let second = registry_name("web-rg", "dev@example.com", "web-api");
        assert_eq!(first, second);
        assert!(first.starts_with("webapiacr"));
        assert_eq!(first.len(), "webapiacr".len() + REGISTRY_HASH_LENGTH);
    }

    #[test]
    fn test_registry_name_depends_on_every_input() {
        let base = registry_name("rg", "user", "app");
        assert_ne!(base, registry_name("rg2", "user", "app"));
        assert_ne!(base, registry_name("rg", "user2", "app"));
        // field boundaries are kept apart
        assert_ne!(registry_name("ab", "c", "app"), registry_name("a", "bc", "app"));
    }

    #[test]
    fn test_registry_name_is_valid_registry_name() {
        let name = registry_name("rg", "user", &"Long-App_Name".repeat(5));
        assert!(name.len() <= MAXIMUM_REGISTRY_NAME_LENGTH);
        assert!(name.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_registry_name_from_server() {
        assert_eq!(registry_name_from_server("myacr.azurecr.io"), "myacr");
        assert_eq!(registry_name_from_server("https://myacr.azurecr.io"), "myacr");
        assert_eq!(registry_name_from_server("myacr.azurecr.io/web:1"), "myacr");
    }

    #[test]
    fn test_randomized_group_name() {
        let name = randomized_group_name("dev.ops@example.com");
        assert!(name.starts_with("devops_rg_"));
        assert_eq!(name.len(), "devops_rg_".len() + 4);
    }

    #[test]
    fn test_environment_name() {
        assert_eq!(environment_name("my_app"), "my-app-env");
    }

    #[test]
    fn test_build_tag_format() {
        let now = Utc.with_ymd_and_hms(2026, 10, 17, 9, 30, 15).unwrap();
        assert_eq!(build_tag(&now), "20261017093015000000");
    }
}

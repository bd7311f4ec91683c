//! Where the cellar lives and which Untappd credentials to use

use crate::beer_cellar::Credentials;
use crate::untappd::UNTAPPD_API_BASE;
use std::path::{Path, PathBuf};

pub const DEFAULT_CELLAR_NAME: &str = "prod";

/// Detect the cellar directory on this system
pub fn cellar_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os("BEERCELLAR_DIR") {
        PathBuf::from(dir)
    } else if let Some(home) = std::env::var_os("HOME") {
        PathBuf::from(home).join(".beer")
    } else {
        PathBuf::from(".beer")
    }
}

/// Cellar name, which prefixes every file of the cellar
pub fn cellar_name() -> String {
    std::env::var("BEERCELLAR_NAME")
        .ok()
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| DEFAULT_CELLAR_NAME.to_string())
}

/// Folder holding the beer name cache for a cellar
pub fn name_cache_dir(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{}_cache", name))
}

pub fn api_base() -> String {
    std::env::var("UNTAPPD_API_BASE").unwrap_or_else(|_| UNTAPPD_API_BASE.to_string())
}

/// Untappd user whose check-ins are synced (`UNTAPPD_USER`)
pub fn untappd_user() -> Option<String> {
    std::env::var("UNTAPPD_USER").ok().filter(|u| !u.is_empty())
}

/// User access token, used instead of the app key and secret when set
pub fn access_token() -> Option<String> {
    std::env::var("UNTAPPD_ACCESS_TOKEN").ok().filter(|t| !t.is_empty())
}

/// Credentials saved with the cellar, else from `CLIENTID` / `CLIENTSECRET`
pub fn resolve_credentials(stored: &Credentials) -> Credentials {
    if !stored.is_empty() {
        return stored.clone();
    }

    Credentials::new(
        std::env::var("CLIENTID").unwrap_or_default(),
        std::env::var("CLIENTSECRET").unwrap_or_default(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cellar_dir_is_set() {
        let dir = cellar_dir();
        assert!(!dir.as_os_str().is_empty());
    }

    #[test]
    fn test_name_cache_dir() {
        assert_eq!(
            name_cache_dir(Path::new("/tmp/beer"), "prod"),
            PathBuf::from("/tmp/beer/prod_cache")
        );
    }

    #[test]
    fn test_stored_credentials_win() {
        let stored = Credentials::new("testkey", "testsecret");
        assert_eq!(resolve_credentials(&stored), stored);
    }
}

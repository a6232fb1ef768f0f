// Runtime configuration read from CATSHELF_* environment variables

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;

const DEFAULT_COVER_SIZE: u32 = 256;
const DEFAULT_CORNER_RADIUS: u32 = 32;
const DEFAULT_COVER_WORKERS: usize = 4;
const MAX_COVER_WORKERS: usize = 8;
const DEFAULT_COVER_CACHE_MB: usize = 64;
const MAX_COVER_CACHE_MB: usize = 16 * 1024;
const DEFAULT_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Catalog file to show at startup. `None` if no project directory could be resolved.
    pub catalog_path: Option<PathBuf>,
    /// Edge length decoded covers are scaled to fit.
    pub cover_size: u32,
    pub corner_radius: u32,
    pub cover_workers: usize,
    pub cover_cache_mb: usize,
    pub fetch_timeout: Duration,
    pub disk_cache_dir: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let catalog_path = lookup("CATSHELF_CATALOG")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .or_else(|| default_catalog_path().ok());

        let disk_cache_dir = if flag(lookup("CATSHELF_NO_DISK_CACHE")) {
            None
        } else {
            default_cover_cache_dir().ok()
        };

        Self {
            catalog_path,
            cover_size: number(lookup("CATSHELF_COVER_SIZE"))
                .filter(|v| *v > 0)
                .unwrap_or(DEFAULT_COVER_SIZE),
            corner_radius: number(lookup("CATSHELF_CORNER_RADIUS"))
                .unwrap_or(DEFAULT_CORNER_RADIUS),
            cover_workers: number(lookup("CATSHELF_COVER_WORKERS"))
                .unwrap_or(DEFAULT_COVER_WORKERS)
                .clamp(1, MAX_COVER_WORKERS),
            cover_cache_mb: number(lookup("CATSHELF_COVER_CACHE_MB"))
                .filter(|v| (1..=MAX_COVER_CACHE_MB).contains(v))
                .unwrap_or(DEFAULT_COVER_CACHE_MB),
            fetch_timeout: Duration::from_secs(
                number(lookup("CATSHELF_COVER_TIMEOUT_SECS"))
                    .filter(|v| *v > 0)
                    .unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
            disk_cache_dir,
        }
    }

    pub fn cover_cache_bytes(&self) -> usize {
        self.cover_cache_mb.saturating_mul(1024 * 1024)
    }
}

fn number<T: std::str::FromStr>(value: Option<String>) -> Option<T> {
    value.and_then(|v| v.trim().parse::<T>().ok())
}

fn flag(value: Option<String>) -> bool {
    value
        .map(|v| {
            matches!(
                v.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            )
        })
        .unwrap_or(false)
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("", "", "catshelf").context("Failed to determine project directories")
}

pub fn default_catalog_path() -> Result<PathBuf> {
    Ok(project_dirs()?.config_dir().join("catalog.json"))
}

pub fn default_cover_cache_dir() -> Result<PathBuf> {
    Ok(project_dirs()?.cache_dir().join("covers"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]);
        assert_eq!(config.cover_size, DEFAULT_COVER_SIZE);
        assert_eq!(config.corner_radius, 32);
        assert_eq!(config.cover_workers, DEFAULT_COVER_WORKERS);
        assert_eq!(config.cover_cache_bytes(), 64 * 1024 * 1024);
        assert_eq!(config.fetch_timeout, Duration::from_secs(15));
        assert_eq!(config.catalog_path, default_catalog_path().ok());
        assert_eq!(config.disk_cache_dir, default_cover_cache_dir().ok());
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("CATSHELF_CATALOG", "/srv/music/catalog.json"),
            ("CATSHELF_COVER_SIZE", "128"),
            ("CATSHELF_CORNER_RADIUS", "0"),
            ("CATSHELF_COVER_WORKERS", "2"),
            ("CATSHELF_COVER_CACHE_MB", "16"),
            ("CATSHELF_COVER_TIMEOUT_SECS", "3"),
            ("CATSHELF_NO_DISK_CACHE", "Yes"),
        ]);
        assert_eq!(
            config.catalog_path,
            Some(PathBuf::from("/srv/music/catalog.json"))
        );
        assert_eq!(config.cover_size, 128);
        assert_eq!(config.corner_radius, 0);
        assert_eq!(config.cover_workers, 2);
        assert_eq!(config.cover_cache_mb, 16);
        assert_eq!(config.fetch_timeout, Duration::from_secs(3));
        assert_eq!(config.disk_cache_dir, None);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = config_from(&[
            ("CATSHELF_COVER_SIZE", "0"),
            ("CATSHELF_CORNER_RADIUS", "round"),
            ("CATSHELF_COVER_WORKERS", "64"),
            ("CATSHELF_COVER_CACHE_MB", "-5"),
            ("CATSHELF_NO_DISK_CACHE", "nope"),
        ]);
        assert_eq!(config.cover_size, DEFAULT_COVER_SIZE);
        assert_eq!(config.corner_radius, DEFAULT_CORNER_RADIUS);
        assert_eq!(config.cover_workers, MAX_COVER_WORKERS);
        assert_eq!(config.cover_cache_mb, DEFAULT_COVER_CACHE_MB);
        assert_eq!(config.disk_cache_dir, default_cover_cache_dir().ok());
    }

    #[test]
    fn test_huge_cache_size_falls_back() {
        let config = config_from(&[("CATSHELF_COVER_CACHE_MB", "18446744073709551615")]);
        assert_eq!(config.cover_cache_mb, DEFAULT_COVER_CACHE_MB);
        assert_eq!(config.cover_cache_bytes(), 64 * 1024 * 1024);

        let config = config_from(&[("CATSHELF_COVER_CACHE_MB", "16384")]);
        assert_eq!(config.cover_cache_mb, MAX_COVER_CACHE_MB);

        let manual = Config {
            cover_cache_mb: usize::MAX,
            ..config_from(&[])
        };
        assert_eq!(manual.cover_cache_bytes(), usize::MAX);
    }
}

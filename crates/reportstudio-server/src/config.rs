//! Process configuration and the env-file-backed provider settings store.
//!
//! Process-level knobs (bind address, fonts) come from flags/environment via
//! clap. Provider settings live in a small KEY=VALUE file with explicit
//! load/save: the store is injected where it is needed, never a global.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use clap::Parser;
use tracing::{debug, warn};

use crate::llm::Provider;

#[derive(Debug, Clone, Parser)]
#[command(
    name = "reportstudio-server",
    about = "LLM-assisted report generation and themed PDF/DOCX export"
)]
pub struct Config {
    /// Bind host.
    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Bind port.
    #[arg(long, env = "PORT", default_value_t = 5173)]
    pub port: u16,

    /// KEY=VALUE file backing the provider settings store.
    #[arg(long, env = "SETTINGS_FILE", default_value = ".env")]
    pub settings_file: PathBuf,

    /// Directory holding `<family>-Regular.ttf` (+Bold/Italic/BoldItalic)
    /// for PDF output.
    #[arg(long, env = "FONTS_DIR", default_value = "./fonts")]
    pub fonts_dir: PathBuf,

    /// Body font family name for PDF output.
    #[arg(long, env = "FONT_FAMILY", default_value = "LiberationSans")]
    pub font_family: String,

    /// Monospace family used for code blocks in PDF output.
    #[arg(long, env = "MONO_FONT_FAMILY", default_value = "LiberationMono")]
    pub mono_font_family: String,
}

const ACTIVE_PROVIDER_KEY: &str = "ACTIVE_PROVIDER";

/// Provider endpoints and credentials, persisted as a flat env file.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl SettingsStore {
    /// Loads the store; a missing or unreadable file yields an empty store.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let mut values = BTreeMap::new();
        match dotenvy::from_path_iter(&path) {
            Ok(iter) => {
                for item in iter {
                    match item {
                        Ok((key, value)) => {
                            values.insert(key, value);
                        }
                        Err(err) => warn!(error = %err, "skipping malformed settings line"),
                    }
                }
            }
            Err(err) => debug!(error = %err, path = %path.display(), "no settings file yet"),
        }
        SettingsStore { path, values }
    }

    /// Writes the store back to its file, one KEY=VALUE per line.
    pub fn save(&self) -> std::io::Result<()> {
        let mut out = String::from("# reportstudio provider settings\n");
        for (key, value) in &self.values {
            out.push_str(key);
            out.push('=');
            out.push_str(value);
            out.push('\n');
        }
        std::fs::write(&self.path, out)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn active_provider(&self) -> Provider {
        self.get(ACTIVE_PROVIDER_KEY)
            .and_then(Provider::parse)
            .unwrap_or(Provider::Mistral)
    }

    pub fn set_active_provider(&mut self, provider: Provider) {
        self.set(ACTIVE_PROVIDER_KEY, provider.as_str());
    }

    /// Base URL for a provider, falling back to its well-known default.
    pub fn base_url(&self, provider: Provider) -> String {
        self.get(&format!("{}_BASE_URL", provider.env_prefix()))
            .map(|url| url.trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| provider.default_base_url().to_string())
    }

    pub fn set_base_url(&mut self, provider: Provider, base_url: &str) {
        self.set(
            format!("{}_BASE_URL", provider.env_prefix()),
            base_url.trim_end_matches('/'),
        );
    }

    pub fn api_key(&self, provider: Provider) -> Option<String> {
        self.get(&format!("{}_API_KEY", provider.env_prefix()))
            .map(str::to_string)
            .filter(|key| !key.trim().is_empty())
    }

    pub fn set_api_key(&mut self, provider: Provider, api_key: &str) {
        self.set(format!("{}_API_KEY", provider.env_prefix()), api_key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let store = SettingsStore::load(dir.path().join("absent.env"));
        assert_eq!(store.active_provider(), Provider::Mistral);
        assert_eq!(store.base_url(Provider::Mistral), "https://api.mistral.ai/v1");
        assert_eq!(store.api_key(Provider::Mistral), None);
    }

    #[test]
    fn settings_round_trip_through_the_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.env");

        let mut store = SettingsStore::load(&path);
        store.set_active_provider(Provider::DeepSeek);
        store.set_base_url(Provider::DeepSeek, "https://api.deepseek.com/v1/");
        store.set_api_key(Provider::DeepSeek, "sk-test");
        store.save().unwrap();

        let reloaded = SettingsStore::load(&path);
        assert_eq!(reloaded.active_provider(), Provider::DeepSeek);
        assert_eq!(reloaded.base_url(Provider::DeepSeek), "https://api.deepseek.com/v1");
        assert_eq!(reloaded.api_key(Provider::DeepSeek), Some("sk-test".to_string()));
    }

    #[test]
    fn blank_api_key_counts_as_missing() {
        let dir = TempDir::new().unwrap();
        let mut store = SettingsStore::load(dir.path().join("s.env"));
        store.set_api_key(Provider::Mistral, "   ");
        assert_eq!(store.api_key(Provider::Mistral), None);
    }
}

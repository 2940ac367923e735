use std::fs;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use directories::BaseDirs;
use serde::{Deserialize, Serialize};

use crate::error::KiraError;

pub const DEFAULT_EUTILS_BASE: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";
pub const DEFAULT_MAX_RECORDS: usize = 200;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
const CONFIG_FILE: &str = "kira-ts.json";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub tool: Option<String>,
    #[serde(default)]
    pub eutils_base: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub max_records: Option<usize>,
    #[serde(default)]
    pub single_page: Option<bool>,
    #[serde(default)]
    pub output_dir: Option<String>,
}

/// Identity and endpoint for every E-utilities call. Passed to the client
/// constructor; nothing here is global.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntrezConfig {
    pub email: Option<String>,
    pub api_key: Option<String>,
    pub tool: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for EntrezConfig {
    fn default() -> Self {
        Self {
            email: None,
            api_key: None,
            tool: default_tool(),
            base_url: DEFAULT_EUTILS_BASE.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl EntrezConfig {
    /// Query parameters identifying the caller, appended to every request.
    pub fn identity_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("tool", self.tool.clone())];
        if let Some(email) = non_blank(self.email.as_deref()) {
            params.push(("email", email));
        }
        if let Some(api_key) = non_blank(self.api_key.as_deref()) {
            params.push(("api_key", api_key));
        }
        params
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub schema_version: u32,
    pub entrez: EntrezConfig,
    pub max_records: usize,
    pub single_page: bool,
    pub output_dir: Utf8PathBuf,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            schema_version: 1,
            entrez: EntrezConfig::default(),
            max_records: DEFAULT_MAX_RECORDS,
            single_page: false,
            output_dir: Utf8PathBuf::from("."),
        }
    }
}

impl ResolvedConfig {
    /// `NCBI_EMAIL` and `NCBI_API_KEY` win over file values.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(email) = non_blank(lookup("NCBI_EMAIL").as_deref()) {
            self.entrez.email = Some(email);
        }
        if let Some(api_key) = non_blank(lookup("NCBI_API_KEY").as_deref()) {
            self.entrez.api_key = Some(api_key);
        }
        self
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// An explicit path must exist. Without one, `./kira-ts.json` and then the
    /// user config directory are tried before falling back to defaults.
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, KiraError> {
        let config_path = match path {
            Some(path) => Some(PathBuf::from(path)),
            None => Self::discover(),
        };

        let Some(config_path) = config_path else {
            tracing::debug!("no config file found, using defaults");
            return Self::resolve_config(Config::default());
        };

        tracing::debug!(path = %config_path.display(), "loading config");
        let content = fs::read_to_string(&config_path)
            .map_err(|_| KiraError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| KiraError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, KiraError> {
        let schema_version = config.schema_version.unwrap_or(1);
        if schema_version != 1 {
            return Err(KiraError::ConfigParse(format!(
                "unsupported schema_version {schema_version}"
            )));
        }

        let max_records = config.max_records.unwrap_or(DEFAULT_MAX_RECORDS);
        if max_records == 0 {
            return Err(KiraError::ConfigParse(
                "max_records must be greater than zero".to_string(),
            ));
        }

        let entrez = EntrezConfig {
            email: non_blank(config.email.as_deref()),
            api_key: non_blank(config.api_key.as_deref()),
            tool: non_blank(config.tool.as_deref()).unwrap_or_else(default_tool),
            base_url: non_blank(config.eutils_base.as_deref())
                .map(|base| base.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_EUTILS_BASE.to_string()),
            timeout_secs: config.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
        };

        Ok(ResolvedConfig {
            schema_version,
            entrez,
            max_records,
            single_page: config.single_page.unwrap_or(false),
            output_dir: Utf8PathBuf::from(config.output_dir.unwrap_or_else(|| ".".to_string())),
        })
    }

    fn discover() -> Option<PathBuf> {
        let local = PathBuf::from(CONFIG_FILE);
        if local.exists() {
            return Some(local);
        }
        BaseDirs::new()
            .map(|dirs| {
                dirs.config_dir()
                    .join("kira-taxon-survey")
                    .join("config.json")
            })
            .filter(|path| path.exists())
    }
}

fn default_tool() -> String {
    "kira-ts".to_string()
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

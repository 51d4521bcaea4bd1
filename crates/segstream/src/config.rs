//! Run configuration.
//!
//! Layered with figment, later layers winning:
//! defaults < config file < `.env` < `SEGSTREAM_*` env < `STREAM_URL` / `MERGEDFILE_NAME` < CLI flags.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use once_cell::sync::Lazy;
use segstream_fetch::{RetryPolicy, StreamConfig};
use segstream_locator::Endpoint;
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_FILE: &str = "segstream.toml";
pub const DOTENV_FILE: &str = ".env";

static DEFAULT_HEADERS: Lazy<BTreeMap<String, String>> = Lazy::new(|| {
    [
        ("Accept", "*/*"),
        ("Accept-Language", "ru-RU,ru;q=0.9"),
        (
            "Sec-Ch-Ua",
            r#""Not A(Brand";v="8", "Chromium";v="132", "Google Chrome";v="132""#,
        ),
        ("Sec-Ch-Ua-Mobile", "?0"),
        ("Sec-Ch-Ua-Platform", r#""Windows""#),
        ("Sec-Fetch-Dest", "empty"),
        ("Sec-Fetch-Mode", "cors"),
        ("Sec-Fetch-Site", "cross-site"),
        ("Referer", "https://disk.yandex.ru/"),
        ("Referrer-Policy", "strict-origin-when-cross-origin"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Captured segment URL the session identifiers are parsed from.
    pub stream_url: Option<String>,
    pub file_name: String,
    pub output_dir: PathBuf,
    pub log_dir: PathBuf,
    pub workers: usize,
    pub interval_ms: u64,
    pub timeout_secs: u64,
    pub start_index: u64,
    pub channel_capacity: usize,
    pub retry_attempts: u32,
    pub retry_delay_ms: u64,
    pub client_tag: String,
    pub build_tag: String,
    pub endpoint: Endpoint,
    pub headers: BTreeMap<String, String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            stream_url: None,
            file_name: "recording".into(),
            output_dir: PathBuf::from("output"),
            log_dir: PathBuf::from("logs"),
            workers: 4,
            interval_ms: 200,
            timeout_secs: 20,
            start_index: 0,
            channel_capacity: StreamConfig::DEFAULT_CHANNEL_CAPACITY,
            retry_attempts: 3,
            retry_delay_ms: 1_000,
            client_tag: String::new(),
            build_tag: String::new(),
            endpoint: Endpoint::default(),
            headers: DEFAULT_HEADERS.clone(),
        }
    }
}

impl Settings {
    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.ts", self.file_name))
    }

    pub fn stream_config(&self) -> StreamConfig {
        let retry = RetryPolicy::default()
            .max_attempts(self.retry_attempts)
            .delay(Duration::from_millis(self.retry_delay_ms));

        StreamConfig::new(self.output_path())
            .headers(
                self.headers
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            )
            .interval_ms(self.interval_ms)
            .timeout(Duration::from_secs(self.timeout_secs))
            .workers(self.workers)
            .start_index(self.start_index)
            .channel_capacity(self.channel_capacity)
            .retry(retry)
    }

    /// [`stream_config`](Self::stream_config) with every worker count forced to one.
    pub fn sequential_config(&self) -> StreamConfig {
        self.stream_config().workers(1)
    }
}

/// Values given on the command line; unset flags leave lower layers alone.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Overrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_index: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
}

pub fn figment(config_file: Option<&Path>, overrides: &Overrides) -> Result<Figment, figment::Error> {
    let config_file = config_file.unwrap_or(Path::new(DEFAULT_CONFIG_FILE));

    Ok(Figment::from(Serialized::defaults(Settings::default()))
        .merge(Toml::file(config_file))
        .merge(Serialized::defaults(dotenv_values(Path::new(DOTENV_FILE))?))
        .merge(Env::prefixed("SEGSTREAM_").split("__"))
        .merge(Env::raw().only(&["STREAM_URL"]))
        .merge(Env::raw().only(&["MERGEDFILE_NAME"]).map(|_| "file_name".into()))
        .merge(Serialized::defaults(overrides)))
}

pub fn load(config_file: Option<&Path>, overrides: &Overrides) -> Result<Settings, figment::Error> {
    figment(config_file, overrides)?.extract()
}

/// `STREAM_URL` and `MERGEDFILE_NAME` from a dotenv file, read without
/// touching the process environment. A missing file yields nothing.
fn dotenv_values(path: &Path) -> Result<BTreeMap<String, String>, figment::Error> {
    let entries = match dotenvy::from_path_iter(path) {
        Ok(entries) => entries,
        Err(e) if e.not_found() => return Ok(BTreeMap::new()),
        Err(e) => return Err(dotenv_error(path, e)),
    };

    let mut values = BTreeMap::new();
    for entry in entries {
        let (key, value) = entry.map_err(|e| dotenv_error(path, e))?;
        let key = match key.as_str() {
            "STREAM_URL" => "stream_url",
            "MERGEDFILE_NAME" => "file_name",
            _ => continue,
        };
        values.insert(key.to_string(), value);
    }
    Ok(values)
}

fn dotenv_error(path: &Path, e: dotenvy::Error) -> figment::Error {
    figment::Error::from(format!("failed to read {}: {e}", path.display()))
}

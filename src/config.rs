use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct GenerationConfig {
    pub model: String,
    pub temperature: f32,
    pub top_p: f32,
    pub frequency_penalty: f32,
    pub max_output_tokens: usize,
    pub stop: Vec<String>,
    pub timeout: Duration,
    pub retry_attempts: u32,
    pub retry_delay: Duration,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: "llama3.2:3b".to_string(),
            temperature: 0.8,
            top_p: 0.9,
            frequency_penalty: 0.7,
            max_output_tokens: 150,
            stop: vec!["\n".to_string(), "User:".to_string(), "Response:".to_string()],
            timeout: Duration::from_secs(30),
            retry_attempts: 3,
            retry_delay: Duration::from_secs(1),
        }
    }
}

#[derive(Clone, Debug)]
pub struct QuoteConfig {
    pub min_len: usize,
    pub max_len: usize,
}

impl Default for QuoteConfig {
    fn default() -> Self {
        Self {
            min_len: 50,
            max_len: 280,
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub bind_addr: String,
    pub data_dir: PathBuf,
    pub static_dir: PathBuf,
    pub ollama_base_url: String,
    pub generation: GenerationConfig,
    pub quotes: QuoteConfig,
    pub items_per_page: usize,
    pub max_upload_bytes: usize,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let data_dir = env::var("BOOKFEED_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data"));

        let defaults = GenerationConfig::default();

        Self {
            bind_addr: env::var("BOOKFEED_BIND").unwrap_or_else(|_| "127.0.0.1:5000".to_string()),
            data_dir,
            static_dir: env::var("BOOKFEED_STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("static")),
            ollama_base_url: env::var("OLLAMA_BASE_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:11434".to_string()),
            generation: GenerationConfig {
                model: env::var("GENERATION_MODEL").unwrap_or(defaults.model),
                timeout: env_parse("GENERATION_TIMEOUT_SECS")
                    .map(Duration::from_secs)
                    .unwrap_or(defaults.timeout),
                retry_attempts: env_parse("GENERATION_RETRY_ATTEMPTS")
                    .unwrap_or(defaults.retry_attempts)
                    .max(1),
                retry_delay: env_parse("GENERATION_RETRY_DELAY_MS")
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.retry_delay),
                ..defaults
            },
            quotes: QuoteConfig {
                min_len: env_parse("MIN_QUOTE_LENGTH").unwrap_or(50),
                max_len: env_parse("MAX_QUOTE_LENGTH").unwrap_or(280),
            },
            items_per_page: env_parse("ITEMS_PER_PAGE").unwrap_or(10).max(1),
            max_upload_bytes: env_parse("MAX_UPLOAD_BYTES").unwrap_or(16 * 1024 * 1024),
        }
    }

    /// Settings for running against a scratch directory, used by tests and the offline CLI.
    pub fn for_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            bind_addr: "127.0.0.1:0".to_string(),
            data_dir: data_dir.into(),
            static_dir: PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/static")),
            ollama_base_url: "http://127.0.0.1:11434".to_string(),
            generation: GenerationConfig::default(),
            quotes: QuoteConfig::default(),
            items_per_page: 10,
            max_upload_bytes: 16 * 1024 * 1024,
        }
    }

    pub fn upload_dir(&self) -> PathBuf {
        self.data_dir.join("uploads")
    }

    pub fn sqlite_dsn(&self) -> String {
        format!("sqlite://{}", self.data_dir.join("bookfeed.sqlite3").display())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}

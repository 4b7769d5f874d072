use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_base_url: String,
    pub api_token: Option<String>,
    pub mock_data_dir: PathBuf,
    pub server_type_fallback: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            api_base_url: env::var("API_BASE_URL")
                .unwrap_or_else(|_| "https://api.skydeck.example/v1".into()),
            api_token: env::var("API_TOKEN").ok(),
            mock_data_dir: env::var("MOCK_DATA_DIR")
                .unwrap_or_else(|_| "assets/mock".into())
                .into(),
            server_type_fallback: env::var("SERVER_TYPE_FALLBACK")
                .unwrap_or_else(|_| "true".into())
                .parse()
                .expect("SERVER_TYPE_FALLBACK must be true or false"),
        }
    }
}

use std::env;

pub const DEFAULT_CALENDAR_SCOPE: &str = "https://www.googleapis.com/auth/calendar";
pub const DEFAULT_ACCESS_CONFIG_PATH: &str = "config/config.json";
pub const DEFAULT_GOOGLE_API_URL: &str = "https://www.googleapis.com/calendar/v3";
pub const DEFAULT_GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

#[derive(Clone, Debug)]
pub struct AppConfig {
    // Calendar settings are optional so the bot still starts without
    // them, commands report the missing value instead
    pub calendar_id: Option<String>,
    pub credentials_path: Option<String>,
    pub calendar_scope: String,
    pub access_config_path: String,
    pub webhook_url: Option<String>,
    pub google_api_url: String,
    pub google_token_url: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_vars(|key| env::var(key).ok())
    }
}

impl AppConfig {
    pub fn from_vars<F>(var: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| var(key).filter(|v| !v.trim().is_empty());

        let calendar_id = non_empty("SHARECAL_CALENDAR_ID");
        let credentials_path = non_empty("SHARECAL_CREDENTIALS_PATH");
        let calendar_scope = non_empty("SHARECAL_CALENDAR_SCOPE")
            .unwrap_or_else(|| DEFAULT_CALENDAR_SCOPE.to_string());
        let access_config_path = non_empty("SHARECAL_CONFIG_PATH")
            .unwrap_or_else(|| DEFAULT_ACCESS_CONFIG_PATH.to_string());
        let webhook_url = non_empty("SHARECAL_WEBHOOK_URL");
        let google_api_url = non_empty("SHARECAL_GOOGLE_API_URL")
            .unwrap_or_else(|| DEFAULT_GOOGLE_API_URL.to_string());
        let google_token_url = non_empty("SHARECAL_GOOGLE_TOKEN_URL")
            .unwrap_or_else(|| DEFAULT_GOOGLE_TOKEN_URL.to_string());

        Self {
            calendar_id,
            credentials_path,
            calendar_scope,
            access_config_path,
            webhook_url,
            google_api_url,
            google_token_url,
        }
    }
}

use super::Config;

impl Config {
    pub fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("EDUBOT_API_KEY").or_else(|_| std::env::var("API_KEY"))
            && !key.is_empty()
        {
            self.model.api_key = Some(key);
        }

        if let Ok(provider) = std::env::var("EDUBOT_PROVIDER")
            && !provider.is_empty()
        {
            self.model.provider = provider;
        }

        if let Ok(model) = std::env::var("EDUBOT_MODEL")
            && !model.is_empty()
        {
            self.model.model = model;
        }

        if let Ok(base_url) = std::env::var("EDUBOT_BASE_URL")
            && !base_url.is_empty()
        {
            self.model.base_url = base_url;
        }

        if let Ok(superprompt) = std::env::var("EDUBOT_SUPERPROMPT")
            && !superprompt.trim().is_empty()
        {
            self.model.superprompt = Some(superprompt);
        }

        if let Ok(locale) = std::env::var("EDUBOT_LOCALE")
            && matches!(locale.as_str(), "en" | "de")
        {
            self.locale = locale;
        }
    }
}

use super::Config;

impl Config {
    pub fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("TASTEKIT_API_KEY")
            && !key.is_empty()
        {
            self.embedding.api_key = Some(key);
        }

        if let Ok(provider) = std::env::var("TASTEKIT_EMBEDDING_PROVIDER")
            && !provider.is_empty()
        {
            self.embedding.provider = provider;
        }

        if let Ok(catalog) = std::env::var("TASTEKIT_CATALOG")
            && !catalog.is_empty()
        {
            self.scoring.catalog_path = Some(catalog);
        }

        if let Ok(locale) = std::env::var("TASTEKIT_LOCALE")
            && !locale.trim().is_empty()
        {
            self.locale = locale.trim().to_lowercase();
        }
    }
}

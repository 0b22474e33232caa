use super::Config;

const SUPPORTED: [&str; 2] = ["en", "ru"];

fn detect_system_locale() -> Option<String> {
    std::env::var("LANG")
        .or_else(|_| std::env::var("LC_MESSAGES"))
        .ok()
        .map(|lang| lang.trim().to_lowercase())
        .filter(|lang| !lang.is_empty())
}

/// Config value -> system `LANG` -> `"en"`. `TASTEKIT_LOCALE` has already
/// been folded into the config value by the env overrides.
fn detect_locale(config_locale: &str) -> String {
    if config_locale != "en" && !config_locale.is_empty() {
        return normalise_locale(config_locale);
    }

    if let Some(system_locale) = detect_system_locale() {
        return normalise_locale(&system_locale);
    }

    "en".into()
}

/// Normalise `"ru_RU.UTF-8"` -> `"ru"`; unsupported languages become `"en"`.
fn normalise_locale(raw: &str) -> String {
    let base = raw.split('.').next().unwrap_or(raw);
    let lang = base.split('_').next().unwrap_or(base);
    if SUPPORTED.contains(&lang) {
        lang.to_string()
    } else {
        "en".into()
    }
}

impl Config {
    /// Resolves the locale, sets it process-wide for `rust_i18n` and hands it
    /// to the elicitation section for answer option labels.
    pub fn apply_locale(&mut self) {
        let locale = detect_locale(&self.locale);
        rust_i18n::set_locale(&locale);
        self.elicitation.locale.clone_from(&locale);
        self.locale = locale;
    }
}

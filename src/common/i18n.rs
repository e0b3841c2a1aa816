// src/common/i18n.rs

use std::collections::HashMap;

use crate::common::error::AppError;

pub const DEFAULT_LANG: &str = "en";

const BUNDLES: &[(&str, &str)] = &[
    ("en", include_str!("../../locales/en.json")),
    ("fr", include_str!("../../locales/fr.json")),
];

/// Tabelas de mensagens por idioma, carregadas uma vez na inicialização.
#[derive(Debug, Clone, Default)]
pub struct I18nStore {
    messages: HashMap<String, HashMap<String, String>>,
}

impl I18nStore {
    pub fn load() -> Result<Self, AppError> {
        let mut messages = HashMap::new();
        for (lang, raw) in BUNDLES {
            let table: HashMap<String, String> = serde_json::from_str(raw)?;
            messages.insert(lang.to_string(), table);
        }
        Ok(Self { messages })
    }

    /// Idioma desconhecido cai para o padrão; chave desconhecida volta como está.
    pub fn translate(&self, lang: &str, key: &str) -> String {
        self.lookup(lang, key)
            .or_else(|| self.lookup(DEFAULT_LANG, key))
            .map(str::to_string)
            .unwrap_or_else(|| key.to_string())
    }

    /// Igual a `translate`, substituindo `{nome}` pelos argumentos.
    pub fn translate_with(&self, lang: &str, key: &str, args: &[(&str, &str)]) -> String {
        let mut text = self.translate(lang, key);
        for (name, value) in args {
            text = text.replace(&format!("{{{}}}", name), value);
        }
        text
    }

    fn lookup(&self, lang: &str, key: &str) -> Option<&str> {
        self.messages
            .get(lang)
            .and_then(|table| table.get(key))
            .map(String::as_str)
    }
}

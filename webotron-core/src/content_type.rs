//! Extension-based content-type lookup for uploaded objects.

use std::collections::HashMap;

pub const DEFAULT_CONTENT_TYPE: &str = "text/plain";

/// Maps object keys to MIME types by extension. Never reads file contents.
///
/// Registered entries take precedence over the built-in `mime_guess` table.
#[derive(Debug, Clone, Default)]
pub struct ContentTypeResolver {
    overrides: HashMap<String, String>,
}

impl ContentTypeResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the type for `extension`. A leading dot is ignored.
    pub fn register(&mut self, extension: &str, content_type: impl Into<String>) -> &mut Self {
        let ext = extension.trim_start_matches('.').to_ascii_lowercase();
        self.overrides.insert(ext, content_type.into());
        self
    }

    pub fn resolve(&self, key: &str) -> String {
        let Some(ext) = extension(key) else {
            return DEFAULT_CONTENT_TYPE.to_string();
        };
        if let Some(registered) = self.overrides.get(&ext) {
            return registered.clone();
        }
        mime_guess::from_ext(&ext)
            .first_raw()
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string()
    }
}

/// Lowercased extension of the last key segment. Dotfiles such as
/// `.htaccess` have no extension.
fn extension(key: &str) -> Option<String> {
    let name = key.rsplit('/').next().unwrap_or(key);
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

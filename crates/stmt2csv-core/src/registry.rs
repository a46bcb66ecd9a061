//! Adapter registry built from the embedded bank formats.

use std::sync::OnceLock;

use crate::error::ConvertError;
use crate::formats::builtin::{load_builtin, BUILTIN_KEYS};
use crate::formats::schema::{FormatSpec, SourceFormat};

/// A selectable converter: a format plus the input kinds it accepts.
#[derive(Debug, Clone)]
pub struct Adapter {
    pub key: String,
    pub name: String,
    pub source_formats: Vec<SourceFormat>,
    pub spec: FormatSpec,
}

impl Adapter {
    pub fn from_spec(spec: FormatSpec) -> Self {
        Adapter {
            key: spec.key.clone(),
            name: spec.name.clone(),
            source_formats: vec![spec.source],
            spec,
        }
    }

    /// Whether a file with this extension can be fed to the adapter.
    ///
    /// PDF adapters also take `.json` page dumps.
    pub fn accepts_extension(&self, extension: &str) -> bool {
        if extension.eq_ignore_ascii_case("json") {
            return self.source_formats.contains(&SourceFormat::Pdf);
        }
        SourceFormat::from_extension(extension).is_some_and(|f| self.source_formats.contains(&f))
    }
}

/// All built-in adapters, sorted case-insensitively by key.
///
/// # Panics
///
/// Panics if an embedded format fails to parse or validate.
pub fn all_adapters() -> &'static [Adapter] {
    static ADAPTERS: OnceLock<Vec<Adapter>> = OnceLock::new();
    ADAPTERS.get_or_init(|| {
        let mut adapters: Vec<Adapter> = BUILTIN_KEYS
            .iter()
            .map(|key| {
                load_builtin(key)
                    .map(Adapter::from_spec)
                    .unwrap_or_else(|e| panic!("embedded format {key} is broken: {e}"))
            })
            .collect();
        adapters.sort_by_key(|a| a.key.to_lowercase());
        adapters
    })
}

pub fn find_adapter(key: &str) -> Result<&'static Adapter, ConvertError> {
    all_adapters().iter().find(|a| a.key == key).ok_or_else(|| {
        let known: Vec<&str> = all_adapters().iter().map(|a| a.key.as_str()).collect();
        ConvertError::UnknownAdapter(format!("{key}. Available: {}", known.join(", ")))
    })
}

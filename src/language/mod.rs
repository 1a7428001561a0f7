//! Language directives for transform requests.
//!
//! A directive either keeps the source's language or forces replies in a named
//! target language resolved from a language code.

mod iso639;

pub use iso639::{IsoLanguageResolver, ISO_639_1};

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Language policy applied uniformly across a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformDirective {
    /// Keep the source's original language.
    OriginalLanguage,
    /// Reply in the given language.
    ForcedLanguage {
        /// Language code as requested.
        code: String,
        /// Display name; equals `code` when the code could not be resolved.
        name: String,
    },
}

impl TransformDirective {
    /// Display name of the forced language, if any.
    pub fn language_name(&self) -> Option<&str> {
        match self {
            TransformDirective::OriginalLanguage => None,
            TransformDirective::ForcedLanguage { name, .. } => Some(name),
        }
    }

    /// Whether the forced language code did not resolve to a display name.
    ///
    /// Detected as `code == name`, so a resolver that names a language by its own
    /// code is reported as a fallback too.
    pub fn is_fallback(&self) -> bool {
        matches!(self, TransformDirective::ForcedLanguage { code, name } if code == name)
    }
}

impl std::fmt::Display for TransformDirective {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransformDirective::OriginalLanguage => write!(f, "original language"),
            TransformDirective::ForcedLanguage { code, name } => {
                write!(f, "forced language {} ({})", code, name)
            }
        }
    }
}

/// Resolves a language code to a human-readable name.
pub trait LanguageNameResolver: Send + Sync {
    fn resolve(&self, code: &str) -> Option<String>;
}

/// Builds transform directives from an optional forced language code.
#[derive(Clone)]
pub struct LanguagePolicy {
    resolver: Arc<dyn LanguageNameResolver>,
}

impl LanguagePolicy {
    pub fn new(resolver: Arc<dyn LanguageNameResolver>) -> Self {
        Self { resolver }
    }

    /// Resolve a directive.
    ///
    /// A blank code counts as absent. A code the resolver does not know is kept as
    /// its own display name.
    pub fn resolve(&self, forced_code: Option<&str>) -> TransformDirective {
        let Some(code) = forced_code.map(str::trim).filter(|c| !c.is_empty()) else {
            return TransformDirective::OriginalLanguage;
        };

        match self.resolver.resolve(code) {
            Some(name) if !name.trim().is_empty() => {
                debug!("Resolved language code '{}' to {}", code, name);
                TransformDirective::ForcedLanguage {
                    code: code.to_string(),
                    name,
                }
            }
            _ => {
                warn!(
                    "Unknown language code '{}', using the code itself as the language name",
                    code
                );
                TransformDirective::ForcedLanguage {
                    code: code.to_string(),
                    name: code.to_string(),
                }
            }
        }
    }
}

impl Default for LanguagePolicy {
    fn default() -> Self {
        Self::new(Arc::new(IsoLanguageResolver))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapResolver(HashMap<&'static str, &'static str>);

    impl LanguageNameResolver for MapResolver {
        fn resolve(&self, code: &str) -> Option<String> {
            self.0.get(code).map(|s| s.to_string())
        }
    }

    fn policy() -> LanguagePolicy {
        LanguagePolicy::new(Arc::new(MapResolver(HashMap::from([
            ("es", "Spanish"),
            ("blank", "  "),
            ("Esperanto", "Esperanto"),
        ]))))
    }

    #[test]
    fn test_absent_code_keeps_original_language() {
        assert_eq!(policy().resolve(None), TransformDirective::OriginalLanguage);
        assert_eq!(policy().resolve(Some("  ")), TransformDirective::OriginalLanguage);
    }

    #[test]
    fn test_resolved_code() {
        let directive = policy().resolve(Some("es"));
        assert_eq!(
            directive,
            TransformDirective::ForcedLanguage {
                code: "es".to_string(),
                name: "Spanish".to_string()
            }
        );
        assert!(!directive.is_fallback());
        assert_eq!(directive.language_name(), Some("Spanish"));
    }

    #[test]
    fn test_unresolved_code_falls_back_to_code() {
        let directive = policy().resolve(Some("xx"));
        assert_eq!(
            directive,
            TransformDirective::ForcedLanguage {
                code: "xx".to_string(),
                name: "xx".to_string()
            }
        );
        assert!(directive.is_fallback());

        // A resolver answering with a blank name is treated as unresolved.
        assert!(policy().resolve(Some("blank")).is_fallback());
    }

    #[test]
    fn test_name_equal_to_code_reads_as_fallback() {
        let directive = policy().resolve(Some("Esperanto"));
        assert_eq!(directive.language_name(), Some("Esperanto"));
        assert!(directive.is_fallback());
    }

    #[test]
    fn test_default_policy_uses_iso_names() {
        let directive = LanguagePolicy::default().resolve(Some("FR"));
        assert_eq!(directive.language_name(), Some("French"));
    }
}

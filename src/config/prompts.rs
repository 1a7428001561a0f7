//! Prompt templates for Precis.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.
//! Templates use `{{text}}`, `{{language_instruction}}` and `{{language_name}}`
//! placeholders, plus any custom variables from the config.

use crate::chunking::char_len;
use crate::language::TransformDirective;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub summary: SummaryPrompts,
    pub bullets: BulletPrompts,
    pub translation: TranslationPrompts,
    pub punctuation: PunctuationPrompts,
    pub language: LanguagePrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Prompts for narrative summaries (map + reduce).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryPrompts {
    /// Applied to each chunk.
    pub map: String,
    /// Applied to the already-summarized chunks.
    pub reduce: String,
}

impl Default for SummaryPrompts {
    fn default() -> Self {
        Self {
            map: r#"{{language_instruction}}
Write a concise summary of the following without any introduction:
"{{text}}"
CONCISE SUMMARY:
"#
            .to_string(),

            reduce: r#"{{language_instruction}}
You will be given a series of summaries from a book. The summaries will be enclosed in triple backticks (```)
Your goal is to give a verbose summary of what happened in the story.
The reader should be able to grasp what happened in the book.
Do not give any introduction.
```{{text}}```
VERBOSE SUMMARY:
"#
            .to_string(),
        }
    }
}

/// Prompt for bullet-point extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BulletPrompts {
    pub map: String,
}

impl Default for BulletPrompts {
    fn default() -> Self {
        Self {
            map: r#"Write a concise summary of the following text delimited by triple backquotes.
```{{text}}```
Return your response in bullet points which covers the key points of the text.
Do not introduce your answer by sentences like 'Here is the summary in bullet points:'.
{{language_instruction}}
"#
            .to_string(),
        }
    }
}

/// Prompt for translation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationPrompts {
    pub template: String,
}

impl Default for TranslationPrompts {
    fn default() -> Self {
        Self {
            template: r#"Translate the following text delimited by triple backquotes in {{language_name}}.
```{{text}}```
Only provide translation without triple backquotes. No other text.
"#
            .to_string(),
        }
    }
}

/// Prompt for restoring punctuation in unpunctuated transcripts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PunctuationPrompts {
    pub template: String,
}

impl Default for PunctuationPrompts {
    fn default() -> Self {
        Self {
            template: r#"Restore the punctuation and capitalization of the following text delimited by triple backquotes.
Do not add, remove or reorder any word.
```{{text}}```
Only provide the punctuated text without triple backquotes. No other text.
{{language_instruction}}
"#
            .to_string(),
        }
    }
}

/// Language instructions inserted as `{{language_instruction}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguagePrompts {
    /// Used when no language is forced.
    pub original: String,
    /// Used when a language is forced; may reference `{{language_name}}`.
    pub forced: String,
}

impl Default for LanguagePrompts {
    fn default() -> Self {
        Self {
            original: "Keep text original language.".to_string(),
            forced: "Process and reply using the {{language_name}} human language.".to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let summary_path = custom_path.join("summary.toml");
            if summary_path.exists() {
                let content = std::fs::read_to_string(&summary_path)?;
                prompts.summary = toml::from_str(&content)?;
            }

            let bullets_path = custom_path.join("bullets.toml");
            if bullets_path.exists() {
                let content = std::fs::read_to_string(&bullets_path)?;
                prompts.bullets = toml::from_str(&content)?;
            }

            let translation_path = custom_path.join("translation.toml");
            if translation_path.exists() {
                let content = std::fs::read_to_string(&translation_path)?;
                prompts.translation = toml::from_str(&content)?;
            }

            let punctuation_path = custom_path.join("punctuation.toml");
            if punctuation_path.exists() {
                let content = std::fs::read_to_string(&punctuation_path)?;
                prompts.punctuation = toml::from_str(&content)?;
            }

            let language_path = custom_path.join("language.toml");
            if language_path.exists() {
                let content = std::fs::read_to_string(&language_path)?;
                prompts.language = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Build a request template from one of the prompt bodies.
    pub fn template(&self, body: &str) -> PromptTemplate {
        PromptTemplate::new(body)
            .with_language(self.language.clone())
            .with_variables(self.variables.clone())
    }
}

/// A prompt body bound to language instructions and custom variables.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    body: String,
    language: LanguagePrompts,
    variables: HashMap<String, String>,
}

impl PromptTemplate {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            language: LanguagePrompts::default(),
            variables: HashMap::new(),
        }
    }

    pub fn with_language(mut self, language: LanguagePrompts) -> Self {
        self.language = language;
        self
    }

    pub fn with_variables(mut self, variables: HashMap<String, String>) -> Self {
        self.variables = variables;
        self
    }

    /// Render the request for one piece of text.
    ///
    /// `{{text}}` is substituted last, so placeholders inside the text are left alone.
    pub fn render(&self, text: &str, directive: &TransformDirective) -> String {
        let language_name = directive
            .language_name()
            .unwrap_or("original language")
            .to_string();

        let mut name_vars = HashMap::new();
        name_vars.insert("language_name".to_string(), language_name.clone());

        let instruction = match directive {
            TransformDirective::OriginalLanguage => self.language.original.clone(),
            TransformDirective::ForcedLanguage { .. } => {
                Prompts::render(&self.language.forced, &name_vars)
            }
        };

        let mut vars = self.variables.clone();
        vars.remove("text");
        vars.insert("language_instruction".to_string(), instruction);
        vars.insert("language_name".to_string(), language_name);

        Prompts::render(&self.body, &vars).replace("{{text}}", text)
    }

    /// Characters the rendered prompt occupies besides the text itself.
    pub fn overhead(&self, directive: &TransformDirective) -> usize {
        char_len(&self.render("", directive))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spanish() -> TransformDirective {
        TransformDirective::ForcedLanguage {
            code: "es".to_string(),
            name: "Spanish".to_string(),
        }
    }

    #[test]
    fn test_default_prompts() {
        let prompts = Prompts::default();
        assert!(prompts.summary.map.contains("{{text}}"));
        assert!(prompts.summary.reduce.contains("{{text}}"));
        assert_ne!(prompts.summary.map, prompts.summary.reduce);
        assert!(prompts.translation.template.contains("{{language_name}}"));
    }

    #[test]
    fn test_render_template() {
        let template = "Hello {{name}}, you have {{count}} messages.";
        let mut vars = HashMap::new();
        vars.insert("name".to_string(), "Alice".to_string());
        vars.insert("count".to_string(), "5".to_string());

        let result = Prompts::render(template, &vars);
        assert_eq!(result, "Hello Alice, you have 5 messages.");
    }

    #[test]
    fn test_language_instruction() {
        let prompts = Prompts::default();
        let template = prompts.template(&prompts.bullets.map);

        let original = template.render("some text", &TransformDirective::OriginalLanguage);
        assert!(original.contains("Keep text original language."));
        assert!(original.contains("```some text```"));

        let forced = template.render("some text", &spanish());
        assert!(forced.contains("Process and reply using the Spanish human language."));
    }

    #[test]
    fn test_text_is_not_reinterpreted() {
        let mut vars = HashMap::new();
        vars.insert("author".to_string(), "Ann".to_string());
        let template = PromptTemplate::new("{{author}}: {{text}} ({{language_name}})")
            .with_variables(vars);

        let rendered = template.render("{{author}} {{language_name}}", &spanish());
        assert_eq!(rendered, "Ann: {{author}} {{language_name}} (Spanish)");
    }

    #[test]
    fn test_overhead_excludes_text() {
        let template = PromptTemplate::new("ab{{text}}cd");
        assert_eq!(template.overhead(&TransformDirective::OriginalLanguage), 4);
    }
}

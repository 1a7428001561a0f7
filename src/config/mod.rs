//! Configuration module for Precis.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{
    BulletPrompts, LanguagePrompts, PromptTemplate, Prompts, PunctuationPrompts, SummaryPrompts,
    TranslationPrompts,
};
pub use settings::{
    ChunkingSettings, CondensationSettings, LanguageSettings, PromptSettings, Settings,
    SourceSettings, TransformSettings,
};

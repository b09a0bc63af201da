//! # Prompt Library
//!
//! Named system prompts loaded from a directory of `*.txt` files.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Default, Clone)]
pub struct PromptLibrary {
    prompts: BTreeMap<String, String>,
}

impl PromptLibrary {
    /// Loads every `*.txt` file in `dir`, keyed by file stem.
    pub fn load_dir(dir: &Path) -> Result<Self> {
        let mut library = Self::default();
        let entries = fs::read_dir(dir)
            .with_context(|| format!("Failed to read prompt directory {}", dir.display()))?;

        for entry in entries {
            let path = entry?.path();
            if !path.is_file() || path.extension().is_none_or(|ext| ext != "txt") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to load prompt {name}"))?;
            library.insert(name, content);
        }

        tracing::info!(count = library.len(), dir = %dir.display(), "Loaded system prompts");
        Ok(library)
    }

    pub fn insert(&mut self, name: impl Into<String>, prompt: impl Into<String>) {
        self.prompts.insert(name.into(), prompt.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.prompts.get(name).map(String::as_str)
    }

    /// A loaded prompt if `name_or_text` names one, otherwise the text itself.
    pub fn resolve<'a>(&'a self, name_or_text: &'a str) -> &'a str {
        self.get(name_or_text).unwrap_or(name_or_text)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.prompts.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }
}

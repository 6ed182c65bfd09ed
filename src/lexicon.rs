//! Word catalog the secret word is drawn from.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{GameError, GameResult};

/// Catalog compiled into the binary
const BUILTIN_LEXICON: &str = include_str!("../data/lexicon.json");

#[derive(Debug, thiserror::Error)]
pub enum LexiconError {
    #[error("Failed to read lexicon file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse lexicon: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Lexicon has no categories")]
    Empty,

    #[error("Category '{0}' has no words")]
    EmptyCategory(String),
}

/// Category name -> words
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct Lexicon {
    categories: BTreeMap<String, Vec<String>>,
}

/// Category listing for clients
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryInfo {
    pub name: String,
    pub word_count: usize,
}

impl Lexicon {
    pub fn new(categories: BTreeMap<String, Vec<String>>) -> Result<Self, LexiconError> {
        if categories.is_empty() {
            return Err(LexiconError::Empty);
        }
        if let Some((name, _)) = categories.iter().find(|(_, words)| words.is_empty()) {
            return Err(LexiconError::EmptyCategory(name.clone()));
        }
        Ok(Self { categories })
    }

    pub fn builtin() -> Result<Self, LexiconError> {
        Self::from_json(BUILTIN_LEXICON)
    }

    pub fn from_json(json: &str) -> Result<Self, LexiconError> {
        let categories: BTreeMap<String, Vec<String>> = serde_json::from_str(json)?;
        Self::new(categories)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LexiconError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn categories(&self) -> Vec<CategoryInfo> {
        self.categories
            .iter()
            .map(|(name, words)| CategoryInfo {
                name: name.clone(),
                word_count: words.len(),
            })
            .collect()
    }

    pub fn words(&self, category: &str) -> Option<&[String]> {
        self.categories.get(category).map(Vec::as_slice)
    }

    /// Concatenate the words of the selected categories, in selection order
    pub fn pool(&self, selected: &[String]) -> GameResult<Vec<&str>> {
        if selected.is_empty() {
            return Err(GameError::InvalidInput(
                "select at least one category".to_string(),
            ));
        }

        let mut pool = Vec::new();
        for category in selected {
            let words = self.words(category).ok_or_else(|| {
                GameError::InvalidInput(format!("unknown category '{}'", category))
            })?;
            pool.extend(words.iter().map(String::as_str));
        }
        Ok(pool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn small() -> Lexicon {
        Lexicon::from_json(r#"{"Nombres": ["Ana", "Beto", "Cata"], "Clubes": ["Boca"]}"#).unwrap()
    }

    #[test]
    fn test_builtin_lexicon_loads() {
        let lexicon = Lexicon::builtin().unwrap();
        let categories = lexicon.categories();
        assert_eq!(categories.len(), 8);
        assert!(categories.iter().all(|c| c.word_count > 0));
        assert!(lexicon
            .words("Futbolistas del Mundo - Históricos")
            .unwrap()
            .contains(&"Pelé".to_string()));
    }

    #[test]
    fn test_pool_concatenates_selected_categories() {
        let lexicon = small();
        let pool = lexicon
            .pool(&["Nombres".to_string(), "Clubes".to_string()])
            .unwrap();
        assert_eq!(pool, vec!["Ana", "Beto", "Cata", "Boca"]);
    }

    #[test]
    fn test_pool_rejects_empty_selection() {
        let lexicon = small();
        let result = lexicon.pool(&[]);
        assert!(matches!(result, Err(GameError::InvalidInput(_))));
    }

    #[test]
    fn test_pool_rejects_unknown_category() {
        let lexicon = small();
        let result = lexicon.pool(&["Planetas".to_string()]);
        match result {
            Err(GameError::InvalidInput(msg)) => assert!(msg.contains("Planetas")),
            other => panic!("Expected InvalidInput, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_category_rejected() {
        let result = Lexicon::from_json(r#"{"Vacía": []}"#);
        assert!(matches!(result, Err(LexiconError::EmptyCategory(name)) if name == "Vacía"));
        assert!(matches!(Lexicon::from_json("{}"), Err(LexiconError::Empty)));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"Colores": ["Rojo", "Azul"]}}"#).unwrap();

        let lexicon = Lexicon::from_file(file.path()).unwrap();
        assert_eq!(lexicon.words("Colores").unwrap().len(), 2);

        let missing = Lexicon::from_file("/definitely/not/here.json");
        assert!(matches!(missing, Err(LexiconError::Io(_))));
    }
}

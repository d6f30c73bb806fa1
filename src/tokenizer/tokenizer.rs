use rust_stemmers::{Algorithm, Stemmer};
use std::collections::{BTreeSet, HashSet};
use stop_words::{get, LANGUAGE};
use unicode_segmentation::UnicodeSegmentation;

use super::TextNormalizer;
use crate::config::TokenizerConfig;

/// Text tokenizer with stemming and optional stopword removal
pub struct Tokenizer {
    config: TokenizerConfig,
    stemmer: Option<Stemmer>,
    stopwords: HashSet<String>,
}

impl Tokenizer {
    /// Create a new tokenizer from configuration
    pub fn new(config: &TokenizerConfig) -> Self {
        let stemmer = if config.stem {
            Some(Stemmer::create(Algorithm::English))
        } else {
            None
        };

        let stopwords = if config.remove_stopwords {
            get(LANGUAGE::English)
                .into_iter()
                .map(|s| s.to_lowercase())
                .collect()
        } else {
            HashSet::new()
        };

        Self {
            config: config.clone(),
            stemmer,
            stopwords,
        }
    }

    /// Tokenize text into a vector of terms, in order of appearance
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        text.unicode_words()
            .filter_map(|word| self.normalize_word(word))
            .collect()
    }

    fn normalize_word(&self, word: &str) -> Option<String> {
        let token = if self.config.lowercase {
            word.to_lowercase()
        } else {
            word.to_string()
        };

        if token.chars().count() < self.config.min_token_length
            || token.chars().count() > self.config.max_token_length
            || self.stopwords.contains(&token)
        {
            return None;
        }

        let token = match &self.stemmer {
            Some(stemmer) => stemmer.stem(&token).to_string(),
            None => token,
        };

        if token.is_empty() {
            None
        } else {
            Some(token)
        }
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new(&TokenizerConfig::default())
    }
}

impl TextNormalizer for Tokenizer {
    fn normalize(&self, text: &str) -> BTreeSet<String> {
        self.tokenize(text).into_iter().collect()
    }

    fn normalize_query_term(&self, word: &str) -> Option<String> {
        // A query word may still carry punctuation; keep the first real word.
        word.unicode_words().find_map(|w| self.normalize_word(w))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain_config() -> TokenizerConfig {
        TokenizerConfig {
            lowercase: true,
            remove_stopwords: false,
            stem: false,
            min_token_length: 2,
            max_token_length: 50,
        }
    }

    #[test]
    fn test_basic_tokenization() {
        let tokenizer = Tokenizer::new(&plain_config());
        let tokens = tokenizer.tokenize("Hello World! This is a test.");

        assert!(tokens.contains(&"hello".to_string()));
        assert!(tokens.contains(&"world".to_string()));
        assert!(tokens.contains(&"test".to_string()));
        assert!(!tokens.contains(&"a".to_string()));
    }

    #[test]
    fn test_stopword_removal() {
        let config = TokenizerConfig {
            remove_stopwords: true,
            ..plain_config()
        };

        let tokenizer = Tokenizer::new(&config);
        let tokens = tokenizer.tokenize("This is a report about the zebra");

        assert!(!tokens.contains(&"the".to_string()));
        assert!(!tokens.contains(&"is".to_string()));
        assert!(!tokens.contains(&"this".to_string()));
        assert!(tokens.contains(&"zebra".to_string()));

        // without removal the same words survive
        let kept = Tokenizer::new(&plain_config()).tokenize("This is the zebra");
        assert_eq!(kept, vec!["this", "is", "the", "zebra"]);
    }

    #[test]
    fn test_stemming() {
        let config = TokenizerConfig {
            stem: true,
            ..plain_config()
        };

        let tokenizer = Tokenizer::new(&config);
        let tokens = tokenizer.tokenize("running runs");

        assert!(tokens.iter().all(|t| t == "run"));
    }

    #[test]
    fn test_normalize_deduplicates() {
        let tokenizer = Tokenizer::new(&plain_config());
        let terms = tokenizer.normalize("apple Apple banana apple.");

        let terms: Vec<_> = terms.into_iter().collect();
        assert_eq!(terms, vec!["apple".to_string(), "banana".to_string()]);
    }

    #[test]
    fn test_min_max_token_length() {
        let config = TokenizerConfig {
            min_token_length: 3,
            max_token_length: 5,
            ..plain_config()
        };

        let tokenizer = Tokenizer::new(&config);
        let tokens = tokenizer.tokenize("a ab abc abcd abcde abcdef");

        assert_eq!(tokens, vec!["abc", "abcd", "abcde"]);
    }

    #[test]
    fn test_normalize_query_term() {
        let tokenizer = Tokenizer::default();

        assert_eq!(tokenizer.normalize_query_term("Cats"), Some("cat".to_string()));
        assert_eq!(tokenizer.normalize_query_term("dog,"), Some("dog".to_string()));
        assert_eq!(tokenizer.normalize_query_term("--"), None);
    }
}

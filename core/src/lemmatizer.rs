//! Word to lemma mapping.
//!
//! The index only needs a deterministic `word -> lemma` function. The default
//! implementation is a Snowball stemmer; anything implementing [`Lemmatizer`]
//! can be plugged into the [`NormalizationPipeline`](crate::NormalizationPipeline).

use crate::Language;
use lazy_static::lazy_static;
use rust_stemmers::{Algorithm, Stemmer};
use thiserror::Error;

lazy_static! {
    static ref RUSSIAN: Stemmer = Stemmer::create(Algorithm::Russian);
    static ref ENGLISH: Stemmer = Stemmer::create(Algorithm::English);
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LemmatizeError {
    #[error("token {0:?} contains non-alphabetic characters")]
    NotAlphabetic(String),
    #[error("token {0:?} mixes scripts or uses an unsupported one")]
    UnsupportedScript(String),
}

/// Maps an already lowercased word to its canonical form.
///
/// Implementations must be deterministic for the lifetime of an index: the
/// same function runs at build time and at query time.
pub trait Lemmatizer: Send + Sync {
    fn normalize(&self, word: &str) -> Result<String, LemmatizeError>;
}

impl<F> Lemmatizer for F
where
    F: Fn(&str) -> Result<String, LemmatizeError> + Send + Sync,
{
    fn normalize(&self, word: &str) -> Result<String, LemmatizeError> {
        self(word)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Script {
    Cyrillic,
    Latin,
}

fn script_of(word: &str) -> Result<Script, LemmatizeError> {
    let mut script = None;
    for c in word.chars() {
        if !c.is_alphabetic() {
            return Err(LemmatizeError::NotAlphabetic(word.to_string()));
        }
        let s = match c {
            'а'..='я' | 'А'..='Я' | 'ё' | 'Ё' => Script::Cyrillic,
            c if c.is_ascii_alphabetic() => Script::Latin,
            _ => return Err(LemmatizeError::UnsupportedScript(word.to_string())),
        };
        match script {
            None => script = Some(s),
            Some(prev) if prev != s => return Err(LemmatizeError::UnsupportedScript(word.to_string())),
            Some(_) => {}
        }
    }
    script.ok_or_else(|| LemmatizeError::NotAlphabetic(word.to_string()))
}

/// Snowball stemming through `rust-stemmers`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SnowballLemmatizer {
    language: Language,
}

impl SnowballLemmatizer {
    pub fn new(language: Language) -> Self {
        Self { language }
    }

    pub fn language(&self) -> Language {
        self.language
    }
}

impl Lemmatizer for SnowballLemmatizer {
    fn normalize(&self, word: &str) -> Result<String, LemmatizeError> {
        let script = script_of(word)?;
        let stemmer: &Stemmer = match (self.language, script) {
            (Language::Russian, _) | (Language::Auto, Script::Cyrillic) => &*RUSSIAN,
            (Language::English, _) | (Language::Auto, Script::Latin) => &*ENGLISH,
        };
        Ok(stemmer.stem(word).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inflections_share_a_lemma() {
        let l = SnowballLemmatizer::default();
        assert_eq!(l.normalize("слона").unwrap(), "слон");
        assert_eq!(l.normalize("слонов").unwrap(), "слон");
        assert_eq!(l.normalize("running").unwrap(), "run");
    }

    #[test]
    fn refuses_digits_and_mixed_scripts() {
        let l = SnowballLemmatizer::default();
        assert!(matches!(l.normalize("2019"), Err(LemmatizeError::NotAlphabetic(_))));
        assert!(matches!(l.normalize("key_2020"), Err(LemmatizeError::NotAlphabetic(_))));
        assert!(matches!(l.normalize("rusский"), Err(LemmatizeError::UnsupportedScript(_))));
    }

    #[test]
    fn closures_are_lemmatizers() {
        let upper = |w: &str| -> Result<String, LemmatizeError> { Ok(w.to_uppercase()) };
        assert_eq!(upper.normalize("ab").unwrap(), "AB");
    }
}

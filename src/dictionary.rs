use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::ops::Range;
use std::sync::OnceLock;

use regex::Regex;

use crate::storage::{KeyValueStore, StorageError};

/// Key the definitions live under in the store.
pub const DICTIONARY_KEY: &str = "dictionary";

fn word_regex() -> &'static Regex {
    static WORD: OnceLock<Regex> = OnceLock::new();
    WORD.get_or_init(|| Regex::new(r"[\p{L}\p{N}'-]+").expect("Invalid word regex"))
}

/// User-written word definitions.
///
/// A word is properly defined when it is a common word, or when every word
/// of its definition is itself properly defined. Definitions that loop back
/// onto themselves never count as defined.
pub struct Dictionary<S: KeyValueStore> {
    store: S,
    definitions: BTreeMap<String, String>,
    common: HashSet<String>,
    memo: RefCell<HashMap<String, bool>>,
}

impl<S: KeyValueStore> Dictionary<S> {
    /// Load the definitions kept in `store`.
    pub fn load<I, W>(store: S, common_words: I) -> Result<Self, StorageError>
    where
        I: IntoIterator<Item = W>,
        W: AsRef<str>,
    {
        let definitions = match store.get(DICTIONARY_KEY)? {
            Some(json) => {
                serde_json::from_str(&json).map_err(|source| StorageError::Parse {
                    key: DICTIONARY_KEY.to_string(),
                    source,
                })?
            }
            None => BTreeMap::new(),
        };
        let common = common_words
            .into_iter()
            .map(|word| word.as_ref().to_lowercase())
            .collect();
        Ok(Self {
            store,
            definitions,
            common,
            memo: RefCell::default(),
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn is_common(&self, word: &str) -> bool {
        self.common.contains(&word.to_lowercase())
    }

    pub fn definition(&self, word: &str) -> Option<&str> {
        self.definitions.get(&word.to_lowercase()).map(String::as_str)
    }

    /// Set the definition of `word` and write the dictionary back to the store.
    pub fn define(&mut self, word: &str, definition: &str) -> Result<(), StorageError> {
        let word = word.to_lowercase();
        tracing::debug!(%word, "defining word");
        self.definitions.insert(word, definition.to_string());
        // Other words may be defined in terms of this one.
        self.memo.get_mut().clear();
        self.flush()
    }

    fn flush(&mut self) -> Result<(), StorageError> {
        let json = serde_json::to_string(&self.definitions).map_err(|source| {
            StorageError::Encode {
                key: DICTIONARY_KEY.to_string(),
                source,
            }
        })?;
        self.store.set(DICTIONARY_KEY, &json)
    }

    pub fn is_properly_defined(&self, word: &str) -> bool {
        let mut visiting = HashSet::new();
        self.check(&word.to_lowercase(), &mut visiting)
    }

    fn check(&self, word: &str, visiting: &mut HashSet<String>) -> bool {
        if self.common.contains(word) {
            return true;
        }
        if let Some(known) = self.memo.borrow().get(word) {
            return *known;
        }
        let Some(definition) = self.definitions.get(word) else {
            return false;
        };
        if !visiting.insert(word.to_string()) {
            return false;
        }
        let defined = definition
            .split(' ')
            .filter(|part| !part.is_empty())
            .all(|part| self.check(&part.to_lowercase(), visiting));
        visiting.remove(word);
        // A negative answer below an open word may come from a cut cycle.
        if visiting.is_empty() || defined {
            self.memo.borrow_mut().insert(word.to_string(), defined);
        }
        defined
    }

    /// Words of `definition` that are not properly defined yet.
    pub fn undefined_words(&self, definition: &str) -> Vec<String> {
        definition
            .split(' ')
            .filter(|word| !word.is_empty())
            .filter(|word| !self.is_properly_defined(word))
            .map(str::to_string)
            .collect()
    }

    /// Character ranges of the words in `text` that are not common words.
    pub fn uncommon_ranges(&self, text: &str) -> Vec<Range<usize>> {
        word_ranges(text)
            .filter(|(word, _)| !self.is_common(word))
            .map(|(_, range)| range)
            .collect()
    }

    /// Character ranges of the uncommon words in `text` still lacking a
    /// proper definition.
    pub fn undefined_ranges(&self, text: &str) -> Vec<Range<usize>> {
        word_ranges(text)
            .filter(|(word, _)| !self.is_properly_defined(word))
            .map(|(_, range)| range)
            .collect()
    }
}

fn word_ranges(text: &str) -> impl Iterator<Item = (&str, Range<usize>)> {
    word_regex().find_iter(text).map(|found| {
        let start = text[..found.start()].chars().count();
        let range = start..start + found.as_str().chars().count();
        (found.as_str(), range)
    })
}

/// The word touching character offset `offset` of `text`, if any.
pub fn word_at(text: &str, offset: usize) -> Option<&str> {
    word_ranges(text)
        .find(|(_, range)| range.start <= offset && offset <= range.end)
        .map(|(word, _)| word)
}

#[cfg(test)]
#[path = "dictionary_tests.rs"]
mod dictionary_tests;

//! JSON question bank
//!
//! A local implementation of the quiz contract. The file holds an array of
//! records:
//!
//! ```json
//! [{ "id": 1, "category": "math_1", "question_en": "2+2?",
//!    "question_de": "2+2?", "answers": ["3","4","5","6"],
//!    "correct_answer_index": 1 }]
//! ```
//!
//! Language-riddle categories (`english_*`, `german_*`, `greek_*`) are asked
//! in their own language whatever the preference; everything else uses the
//! requested language and falls back to English. Answer order is shuffled on
//! every draw.

use crate::game::dice::{seeded, RandomSource};
use crate::remote::quiz::{Question, QuizService};
use crate::remote::RemoteError;
use crate::{QuizballError, Result};
use rand_chacha::ChaCha12Rng;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// One stored question with its translations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRecord {
    pub id: u32,
    pub category: String,
    pub question_en: String,
    #[serde(default)]
    pub question_de: Option<String>,
    #[serde(default)]
    pub question_el: Option<String>,
    pub answers: Vec<String>,
    pub correct_answer_index: usize,
}

impl QuestionRecord {
    fn text_for(&self, language: &str) -> &str {
        let lang = if self.category.starts_with("german_") {
            "de"
        } else if self.category.starts_with("greek_") {
            "el"
        } else if self.category.starts_with("english_") {
            "en"
        } else {
            language
        };
        let translated = match lang {
            "de" => self.question_de.as_deref(),
            "el" => self.question_el.as_deref(),
            _ => None,
        };
        translated.unwrap_or(&self.question_en)
    }
}

/// Questions indexed by category
pub struct QuestionBank {
    by_category: FxHashMap<String, Vec<QuestionRecord>>,
    rng: ChaCha12Rng,
}

impl QuestionBank {
    pub fn from_records(records: Vec<QuestionRecord>, seed: u64) -> Result<Self> {
        let mut by_category: FxHashMap<String, Vec<QuestionRecord>> = FxHashMap::default();
        for record in records {
            if record.answers.len() != 4 {
                return Err(QuizballError::InvalidQuestionBank(format!(
                    "question {} has {} answers, expected 4",
                    record.id,
                    record.answers.len()
                )));
            }
            if record.correct_answer_index >= 4 {
                return Err(QuizballError::InvalidQuestionBank(format!(
                    "question {} has correct index {}",
                    record.id, record.correct_answer_index
                )));
            }
            by_category
                .entry(record.category.clone())
                .or_default()
                .push(record);
        }
        Ok(QuestionBank {
            by_category,
            rng: seeded(seed),
        })
    }

    pub fn parse(content: &str, seed: u64) -> Result<Self> {
        let records: Vec<QuestionRecord> = serde_json::from_str(content)?;
        Self::from_records(records, seed)
    }

    pub fn load_from_file(path: &Path, seed: u64) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let bank = Self::parse(&content, seed)?;
        log::debug!(
            "loaded {} questions in {} categories from {}",
            bank.len(),
            bank.by_category.len(),
            path.display()
        );
        Ok(bank)
    }

    pub fn len(&self) -> usize {
        self.by_category.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_category.is_empty()
    }
}

impl QuizService for QuestionBank {
    fn random_question(
        &mut self,
        category: &str,
        language: &str,
    ) -> std::result::Result<Question, RemoteError> {
        let records = self
            .by_category
            .get(category)
            .filter(|records| !records.is_empty())
            .ok_or_else(|| RemoteError::NotFound(format!("category '{category}'")))?;
        let record = &records[self.rng.pick_index(records.len())];

        // Fisher-Yates over answer positions, tracking where the correct one lands
        let mut order = [0usize, 1, 2, 3];
        for i in (1..order.len()).rev() {
            let j = self.rng.pick_index(i + 1);
            order.swap(i, j);
        }
        let choices = order.map(|idx| record.answers[idx].clone());
        let correct_index = order
            .iter()
            .position(|&idx| idx == record.correct_answer_index)
            .ok_or_else(|| RemoteError::InvalidResponse(format!("question {}", record.id)))?;

        Ok(Question {
            id: record.id,
            prompt: record.text_for(language).to_string(),
            choices,
            correct_index,
            category: record.category.clone(),
        })
    }

    fn categories(&mut self) -> std::result::Result<Vec<String>, RemoteError> {
        let mut categories: Vec<String> = self.by_category.keys().cloned().collect();
        categories.sort();
        Ok(categories)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BANK: &str = r#"[
        { "id": 1, "category": "math_1", "question_en": "2+2?", "question_de": "Zwei plus zwei?",
          "answers": ["3", "4", "5", "6"], "correct_answer_index": 1 },
        { "id": 2, "category": "german_1", "question_en": "Dog?", "question_de": "Hund?",
          "answers": ["dog", "cat", "cow", "fox"], "correct_answer_index": 0 },
        { "id": 3, "category": "geography_1", "question_en": "Capital of Greece?",
          "answers": ["Athens", "Sparta", "Rome", "Oslo"], "correct_answer_index": 0 }
    ]"#;

    #[test]
    fn test_parse_and_list_categories() {
        let mut bank = QuestionBank::parse(BANK, 1).unwrap();
        assert_eq!(bank.len(), 3);
        assert_eq!(
            bank.categories().unwrap(),
            vec!["geography_1".to_string(), "german_1".to_string(), "math_1".to_string()]
        );
    }

    #[test]
    fn test_shuffle_tracks_correct_answer() {
        let mut bank = QuestionBank::parse(BANK, 9).unwrap();
        for _ in 0..20 {
            let q = bank.random_question("math_1", "en").unwrap();
            assert_eq!(q.choices[q.correct_index], "4");
            let mut sorted = q.choices.to_vec();
            sorted.sort();
            assert_eq!(sorted, vec!["3", "4", "5", "6"]);
        }
    }

    #[test]
    fn test_language_selection() {
        let mut bank = QuestionBank::parse(BANK, 2).unwrap();
        assert_eq!(bank.random_question("math_1", "de").unwrap().prompt, "Zwei plus zwei?");
        assert_eq!(bank.random_question("math_1", "en").unwrap().prompt, "2+2?");
        // language riddles ignore the requested language
        assert_eq!(bank.random_question("german_1", "en").unwrap().prompt, "Hund?");
        // missing translation falls back to English
        assert_eq!(
            bank.random_question("geography_1", "el").unwrap().prompt,
            "Capital of Greece?"
        );
    }

    #[test]
    fn test_unknown_category_and_bad_records() {
        let mut bank = QuestionBank::parse(BANK, 2).unwrap();
        assert!(matches!(
            bank.random_question("history_1", "en"),
            Err(RemoteError::NotFound(_))
        ));

        let bad = r#"[{ "id": 5, "category": "x", "question_en": "?", "answers": ["a"], "correct_answer_index": 0 }]"#;
        assert!(matches!(
            QuestionBank::parse(bad, 0),
            Err(QuizballError::InvalidQuestionBank(_))
        ));
    }
}

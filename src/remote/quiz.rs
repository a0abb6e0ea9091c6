//! Quiz collaborator contract and its local fallback

use crate::game::dice::RandomSource;
use crate::loader::config::Preferences;
use crate::remote::RemoteError;
use serde::{Deserialize, Serialize};

/// A multiple-choice question as presented to the player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: u32,
    pub prompt: String,
    pub choices: [String; 4],
    pub correct_index: usize,
    pub category: String,
}

impl Question {
    pub fn is_correct(&self, answer_index: usize) -> bool {
        answer_index == self.correct_index
    }

    /// Question used whenever no quiz service can supply one
    pub fn fallback() -> Self {
        Question {
            id: 0,
            prompt: "What is 1+1?".to_string(),
            choices: ["0", "1", "2", "3"].map(str::to_string),
            correct_index: 2,
            category: "math_1".to_string(),
        }
    }
}

/// Category list used whenever no quiz service can supply one
pub const FALLBACK_CATEGORIES: [&str; 7] = [
    "math_1",
    "math_2",
    "math_3",
    "english_1",
    "german_1",
    "greek_1",
    "geography_1",
];

/// Source of questions
pub trait QuizService {
    fn random_question(&mut self, category: &str, language: &str) -> Result<Question, RemoteError>;

    fn categories(&mut self) -> Result<Vec<String>, RemoteError>;
}

/// Quiz access that never fails
///
/// Wraps an optional [`QuizService`]; any error is logged and replaced by
/// the fixed fallback of the same shape.
#[derive(Default)]
pub struct QuizFacade {
    service: Option<Box<dyn QuizService>>,
}

impl QuizFacade {
    pub fn new(service: Box<dyn QuizService>) -> Self {
        QuizFacade {
            service: Some(service),
        }
    }

    /// Facade with no service at all
    pub fn offline() -> Self {
        QuizFacade::default()
    }

    pub fn question(&mut self, category: &str, language: &str) -> Question {
        let Some(service) = self.service.as_mut() else {
            return Question::fallback();
        };
        match service.random_question(category, language) {
            Ok(question) => question,
            Err(err) => {
                log::warn!("question for '{category}' unavailable ({err}), using fallback");
                Question::fallback()
            }
        }
    }

    pub fn categories(&mut self) -> Vec<String> {
        let fallback = || -> Vec<String> { FALLBACK_CATEGORIES.iter().map(|c| c.to_string()).collect() };
        let Some(service) = self.service.as_mut() else {
            return fallback();
        };
        match service.categories() {
            Ok(categories) if !categories.is_empty() => categories,
            Ok(_) => {
                log::warn!("quiz service returned no categories, using fallback");
                fallback()
            }
            Err(err) => {
                log::warn!("category list unavailable ({err}), using fallback");
                fallback()
            }
        }
    }

    /// Ask a question from a uniformly chosen selected category
    pub fn next_question(&mut self, prefs: &Preferences, rng: &mut dyn RandomSource) -> Question {
        let category = if prefs.categories.is_empty() {
            let all = self.categories();
            all[rng.pick_index(all.len())].clone()
        } else {
            prefs.categories[rng.pick_index(prefs.categories.len())].clone()
        };
        self.question(&category, &prefs.language)
    }
}

/// Display form of a category id: `math_1` becomes `Math 1`
pub fn format_category_name(category: &str) -> String {
    category
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

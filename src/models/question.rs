use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of answer options every question carries.
pub const NUM_OPTIONS: usize = 4;

/// Category label that disables the category filter.
pub const ALL_CATEGORIES: &str = "All Categories";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub text: String,
    pub options: [String; NUM_OPTIONS],
    pub correct_answer: usize,
    pub category: String,
    pub difficulty: Difficulty,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

/// Why a question record was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidQuestion {
    #[error("question text is empty")]
    EmptyText,
    #[error("option {0} is empty")]
    EmptyOption(usize),
    #[error("options are not unique")]
    DuplicateOptions,
    #[error("correct answer {0} is out of range")]
    AnswerOutOfRange(usize),
}

impl Question {
    pub fn is_correct(&self, answer: usize) -> bool {
        answer == self.correct_answer
    }

    pub fn correct_option(&self) -> &str {
        &self.options[self.correct_answer.min(NUM_OPTIONS - 1)]
    }

    /// Matches a difficulty filter and an optional category filter.
    pub fn matches(&self, difficulty: Difficulty, category: Option<&str>) -> bool {
        if self.difficulty != difficulty {
            return false;
        }
        match category {
            None => true,
            Some(c) if c == ALL_CATEGORIES => true,
            Some(c) => self.category == c,
        }
    }

    pub fn validate(&self) -> Result<(), InvalidQuestion> {
        if self.text.trim().is_empty() {
            return Err(InvalidQuestion::EmptyText);
        }
        if let Some(index) = self.options.iter().position(|o| o.trim().is_empty()) {
            return Err(InvalidQuestion::EmptyOption(index));
        }
        let unique: HashSet<&str> = self.options.iter().map(|o| o.trim()).collect();
        if unique.len() != NUM_OPTIONS {
            return Err(InvalidQuestion::DuplicateOptions);
        }
        if self.correct_answer >= NUM_OPTIONS {
            return Err(InvalidQuestion::AnswerOutOfRange(self.correct_answer));
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn sample(text: &str, category: &str, difficulty: Difficulty, correct: usize) -> Question {
    Question {
        text: text.to_string(),
        options: [
            format!("{text} a"),
            format!("{text} b"),
            format!("{text} c"),
            format!("{text} d"),
        ],
        correct_answer: correct,
        category: category.to_string(),
        difficulty,
        image: None,
        explanation: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_difficulty_serializes_lowercase() {
        let json = serde_json::to_string(&Difficulty::Hard).unwrap();
        assert_eq!(json, "\"hard\"");
        assert!(serde_json::from_str::<Difficulty>("\"extreme\"").is_err());
        assert_eq!("Medium".parse::<Difficulty>(), Ok(Difficulty::Medium));
    }

    #[test]
    fn test_matches_category_filter() {
        let q = sample("q", "Geography", Difficulty::Easy, 0);
        assert!(q.matches(Difficulty::Easy, None));
        assert!(q.matches(Difficulty::Easy, Some(ALL_CATEGORIES)));
        assert!(q.matches(Difficulty::Easy, Some("Geography")));
        assert!(!q.matches(Difficulty::Easy, Some("World History")));
        assert!(!q.matches(Difficulty::Hard, None));
    }

    #[test]
    fn test_validate_rejects_malformed() {
        let mut q = sample("q", "Geography", Difficulty::Easy, 2);
        assert_eq!(q.validate(), Ok(()));

        q.correct_answer = 4;
        assert_eq!(q.validate(), Err(InvalidQuestion::AnswerOutOfRange(4)));

        q.correct_answer = 0;
        q.options[3] = q.options[0].clone();
        assert_eq!(q.validate(), Err(InvalidQuestion::DuplicateOptions));

        q.text = "  ".to_string();
        assert_eq!(q.validate(), Err(InvalidQuestion::EmptyText));
    }

    #[test]
    fn test_wrong_option_count_fails_to_parse() {
        let json = r#"{"text":"t","options":["a","b","c"],"correct_answer":0,
            "category":"c","difficulty":"easy"}"#;
        assert!(serde_json::from_str::<Question>(json).is_err());
    }
}

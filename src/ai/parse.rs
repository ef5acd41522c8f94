use std::collections::HashSet;

use serde_json::Value;
use tracing::warn;

use crate::error::GenerationError;
use crate::models::{ALL_CATEGORIES, Difficulty, Question};

pub(crate) fn question_prompt(difficulty: Difficulty, category: Option<&str>, count: usize) -> String {
    let (topic, category_field) = match category {
        Some(c) if c != ALL_CATEGORIES => (format!("about {c}"), format!("exactly \"{c}\"")),
        _ => (
            "across a mix of general knowledge categories".to_string(),
            "string".to_string(),
        ),
    };
    format!(
        "Write {count} {difficulty} multiple-choice trivia questions {topic}. \
         Reply with only a JSON array. Each element must have the fields \
         \"text\" (string), \"options\" (array of exactly 4 distinct strings), \
         \"correct_answer\" (index 0-3 of the right option), \"category\" ({category_field}), \
         \"difficulty\" (\"{difficulty}\") and \"explanation\" (one sentence)."
    )
}

pub(crate) fn hint_prompt(question: &Question) -> String {
    format!(
        "A simple illustration hinting at \"{}\", without any text or letters.",
        question.correct_option()
    )
}

/// Extracts valid questions from a model reply.
///
/// Malformed entries, entries of another difficulty, and repeated question
/// texts are dropped. Fails when nothing usable remains.
pub(crate) fn parse_generated(
    content: &str,
    difficulty: Difficulty,
) -> Result<Vec<Question>, GenerationError> {
    let body = strip_code_fence(content);
    let value: Value = serde_json::from_str(body)
        .map_err(|e| GenerationError::Malformed(format!("reply is not JSON: {e}")))?;

    let entries = match value {
        Value::Array(entries) => entries,
        Value::Object(mut object) => match object.remove("questions") {
            Some(Value::Array(entries)) => entries,
            _ => {
                return Err(GenerationError::Malformed(
                    "reply has no question list".to_string(),
                ));
            }
        },
        _ => {
            return Err(GenerationError::Malformed(
                "reply has no question list".to_string(),
            ));
        }
    };

    let mut seen = HashSet::new();
    let mut questions = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        let question: Question = match serde_json::from_value(entry) {
            Ok(q) => q,
            Err(e) => {
                warn!(index, error = %e, "dropping generated entry that does not fit the schema");
                continue;
            }
        };
        if let Err(e) = question.validate() {
            warn!(index, error = %e, "dropping invalid generated question");
            continue;
        }
        if question.difficulty != difficulty {
            warn!(index, got = %question.difficulty, "dropping generated question of wrong difficulty");
            continue;
        }
        if !seen.insert(question.text.trim().to_lowercase()) {
            warn!(index, "dropping duplicate generated question");
            continue;
        }
        questions.push(question);
    }

    if questions.is_empty() {
        return Err(GenerationError::Malformed(
            "no usable questions in reply".to_string(),
        ));
    }
    Ok(questions)
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPLY: &str = r#"```json
[
  {"text": "What is 2 + 2?", "options": ["3", "4", "5", "6"], "correct_answer": 1,
   "category": "Math", "difficulty": "easy", "explanation": "Basic sum."},
  {"text": "what is 2 + 2?", "options": ["1", "4", "5", "6"], "correct_answer": 1,
   "category": "Math", "difficulty": "easy"},
  {"text": "Pick one", "options": ["a", "a", "b", "c"], "correct_answer": 0,
   "category": "Math", "difficulty": "easy"},
  {"text": "Too few", "options": ["a", "b"], "correct_answer": 0,
   "category": "Math", "difficulty": "easy"},
  {"text": "Out of range", "options": ["a", "b", "c", "d"], "correct_answer": 9,
   "category": "Math", "difficulty": "easy"},
  {"text": "Wrong level", "options": ["a", "b", "c", "d"], "correct_answer": 0,
   "category": "Math", "difficulty": "hard"},
  {"text": "Bad level", "options": ["a", "b", "c", "d"], "correct_answer": 0,
   "category": "Math", "difficulty": "impossible"}
]
```"#;

    #[test]
    fn test_parse_keeps_only_valid_unique_entries() {
        let questions = parse_generated(REPLY, Difficulty::Easy).unwrap();
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].text, "What is 2 + 2?");
        assert_eq!(questions[0].explanation.as_deref(), Some("Basic sum."));
    }

    #[test]
    fn test_parse_accepts_wrapped_list() {
        let reply = r#"{"questions": [{"text": "Q", "options": ["a", "b", "c", "d"],
            "correct_answer": 3, "category": "C", "difficulty": "medium"}]}"#;
        let questions = parse_generated(reply, Difficulty::Medium).unwrap();
        assert_eq!(questions[0].correct_answer, 3);
    }

    #[test]
    fn test_parse_rejects_unusable_reply() {
        assert!(matches!(
            parse_generated("Sorry, I can't help with that.", Difficulty::Easy),
            Err(GenerationError::Malformed(_))
        ));
        assert!(matches!(
            parse_generated("[]", Difficulty::Easy),
            Err(GenerationError::Malformed(_))
        ));
        assert!(matches!(
            parse_generated(r#"{"items": []}"#, Difficulty::Easy),
            Err(GenerationError::Malformed(_))
        ));
    }

    #[test]
    fn test_prompt_mentions_category_and_level() {
        let prompt = question_prompt(Difficulty::Hard, Some("Geography"), 5);
        assert!(prompt.contains("5 hard"));
        assert!(prompt.contains("about Geography"));
        assert!(prompt.contains(r#""category" (exactly "Geography")"#));

        let prompt = question_prompt(Difficulty::Easy, Some(ALL_CATEGORIES), 3);
        assert!(!prompt.contains(ALL_CATEGORIES));
    }
}

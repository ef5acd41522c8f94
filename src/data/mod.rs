mod loader;

pub use loader::{
    BundledQuestions, JsonFileQuestions, QuestionSource, StaticQuestions, categories,
    load_questions_from_json, parse_questions,
};

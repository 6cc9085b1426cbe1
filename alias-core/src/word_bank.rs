use alias_types::{Difficulty, GameError, GameState, Language};
use rand::Rng;
use rand::seq::SliceRandom;

/// Number of words requested per generation call.
pub const GENERATION_BATCH_SIZE: usize = 50;

const WORDS_UA_EASY: &[&str] = &[
    "Кіт", "Сонце", "Кава", "Книга", "Машина", "Океан", "Гітара", "Піца", "Яблуко", "Диван",
    "Школа", "Торт", "Сім'я", "Подарунок", "Хмара", "Літак", "Стіл", "Вікно", "Риба", "Квітка",
];

const WORDS_UA_MEDIUM: &[&str] = &[
    "Космонавт", "Програміст", "Університет", "Інвестиції", "Паляниця", "Карпати", "Еволюція",
    "Магніт", "Сцена", "Стипендія", "Алгоритм", "Гравітація", "Провідник", "Музей", "Діамант",
];

const WORDS_UA_HARD: &[&str] = &[
    "Екзистенціалізм", "Метаморфоза", "Дисонанс", "Агностицизм", "Синхрофазотрон",
    "Когнітивність", "Прокрастинація", "Абстракція", "Інтроспекція", "Парадигма", "Ентропія",
];

const WORDS_EN_EASY: &[&str] = &[
    "Cat", "Sun", "Coffee", "Book", "Car", "Ocean", "Guitar", "Pizza", "Soccer", "Apple",
    "Clock", "Mirror", "School", "Cake", "Family", "Gift", "Cloud", "Bread", "Water", "Tree",
];

const WORDS_EN_MEDIUM: &[&str] = &[
    "Astronaut", "Developer", "University", "Investment", "Software", "Mountain", "Evolution",
    "Magnet", "Stage", "Scholarship", "Algorithm", "Gravity", "Museum", "Diamond",
];

const WORDS_EN_HARD: &[&str] = &[
    "Existentialism", "Metamorphosis", "Dissonance", "Agnosticism", "Cognitive",
    "Procrastination", "Abstraction", "Introspection", "Heuristic", "Paradigm", "Entropy",
];

pub struct WordBank;

impl WordBank {
    /// The curated list for a language and difficulty tier.
    pub fn static_words(language: Language, difficulty: Difficulty) -> &'static [&'static str] {
        match (language, difficulty) {
            (Language::Ua, Difficulty::Easy) => WORDS_UA_EASY,
            (Language::Ua, Difficulty::Medium) => WORDS_UA_MEDIUM,
            (Language::Ua, Difficulty::Hard) => WORDS_UA_HARD,
            (Language::En, Difficulty::Easy) => WORDS_EN_EASY,
            (Language::En, Difficulty::Medium) => WORDS_EN_MEDIUM,
            (Language::En, Difficulty::Hard) => WORDS_EN_HARD,
        }
    }

    /// Draw the next secret word for a game.
    ///
    /// Uses the cached generated words when the room has them enabled and the
    /// cache is non-empty, the static list otherwise. Draws are independent, so
    /// the same word can come up twice in a row.
    pub fn draw<R: Rng + ?Sized>(state: &GameState, rng: &mut R) -> Result<String, GameError> {
        let generated = state.cached_ai_words();
        if state.use_ai && !generated.is_empty() {
            if let Some(word) = generated.choose(rng) {
                return Ok(word.clone());
            }
        }

        Self::static_words(state.language, state.difficulty)
            .choose(rng)
            .map(|word| word.to_string())
            .ok_or(GameError::NoWordsAvailable {
                language: state.language,
                difficulty: state.difficulty,
            })
    }
}

/// Parse a comma-separated word list returned by the generator.
///
/// Entries are trimmed, lose any `"` or `.` characters, and are dropped when
/// one character or shorter.
pub fn parse_generated_words(text: &str) -> Vec<String> {
    text.split(',')
        .map(|entry| {
            entry
                .trim()
                .chars()
                .filter(|c| *c != '"' && *c != '.')
                .collect::<String>()
        })
        .filter(|word| word.chars().count() > 1)
        .collect()
}

pub fn generation_prompt(language: Language, difficulty: Difficulty, batch_size: usize) -> String {
    format!(
        "Generate a list of {} common nouns or objects for a game of Alias in {}. \
         Difficulty level: {}. Format the output as a simple comma-separated list. \
         No preamble, just words.",
        batch_size,
        language.display_name(),
        difficulty.label()
    )
}

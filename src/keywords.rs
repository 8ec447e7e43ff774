//! Keyword extraction for knowledge items and queries.
//!
//! The same pipeline runs at ingestion time (item keywords) and query time
//! (query keywords) so the two sides of the keyword-overlap score speak the
//! same vocabulary: lowercase, strip punctuation, lemmatize against a fixed
//! dictionary, drop stop words and very short tokens, then rank by frequency
//! with a boost for nutrition-domain terms.

/// Keyword budget for queries, facts, and myths.
pub const DEFAULT_MAX_KEYWORDS: usize = 10;

/// Keyword budget for document chunks; longer passages keep more anchors.
pub const CHUNK_MAX_KEYWORDS: usize = 15;

/// Tokens shorter than this never become keywords.
const MIN_TOKEN_CHARS: usize = 3;

/// English stop words, sorted for binary search.
const STOP_WORDS: &[&str] = &[
    "a", "about", "after", "an", "and", "are", "as", "at", "be", "been",
    "but", "by", "call", "come", "day", "did", "down", "each", "find",
    "first", "for", "from", "get", "had", "has", "have", "he", "her", "him",
    "how", "i", "if", "in", "into", "is", "it", "its", "like", "long",
    "made", "make", "many", "may", "more", "now", "of", "oil", "on", "out",
    "part", "said", "sit", "so", "some", "than", "that", "the", "their",
    "them", "then", "these", "they", "this", "time", "to", "two", "up",
    "very", "was", "what", "when", "where", "which", "who", "why", "will",
    "with", "words", "would", "you",
];

/// Inflected form → base form, sorted by the inflected form for binary
/// search. A fixed dictionary is enough at this scale; a real stemmer would
/// be overkill for a chat vocabulary.
const LEMMAS: &[(&str, &str)] = &[
    ("asked", "ask"),
    ("asking", "ask"),
    ("asks", "ask"),
    ("ate", "eat"),
    ("best", "good"),
    ("better", "good"),
    ("calories", "calorie"),
    ("carbohydrates", "carbohydrate"),
    ("carbs", "carb"),
    ("diets", "diet"),
    ("drank", "drink"),
    ("drinking", "drink"),
    ("drinks", "drink"),
    ("drunk", "drink"),
    ("eaten", "eat"),
    ("eating", "eat"),
    ("eats", "eat"),
    ("exercised", "exercise"),
    ("exercises", "exercise"),
    ("exercising", "exercise"),
    ("fats", "fat"),
    ("foods", "food"),
    ("gained", "gain"),
    ("gaining", "gain"),
    ("gains", "gain"),
    ("healthier", "healthy"),
    ("healthiest", "healthy"),
    ("helped", "help"),
    ("helping", "help"),
    ("helps", "help"),
    ("loses", "lose"),
    ("losing", "lose"),
    ("lost", "lose"),
    ("meals", "meal"),
    ("minerals", "mineral"),
    ("myths", "myth"),
    ("needed", "need"),
    ("needing", "need"),
    ("needs", "need"),
    ("proteins", "protein"),
    ("swaps", "swap"),
    ("taken", "take"),
    ("takes", "take"),
    ("taking", "take"),
    ("tips", "tip"),
    ("took", "take"),
    ("vitamins", "vitamin"),
    ("wanted", "want"),
    ("wanting", "want"),
    ("wants", "want"),
    ("worse", "bad"),
    ("worst", "bad"),
];

/// Nutrition-domain vocabulary. A token matching any of these (in either
/// containment direction) scores higher during extraction.
const DOMAIN_TERMS: &[&str] = &[
    "carb", "carbohydrate", "protein", "fat", "calorie", "vitamin",
    "mineral", "fiber", "sugar", "salt", "sodium", "cholesterol", "omega",
    "antioxidant", "diet", "nutrition", "meal", "food", "eating", "weight",
    "health", "exercise", "fitness", "muscle", "metabolism", "digestion",
    "nutrient",
];

/// Split text into lowercase word tokens; punctuation becomes whitespace.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Reduce a word to its base form, or return it unchanged if unknown.
/// Expects lowercase input (as produced by [`tokenize`]).
pub fn lemmatize(word: &str) -> &str {
    match LEMMAS.binary_search_by_key(&word, |&(form, _)| form) {
        Ok(i) => LEMMAS[i].1,
        Err(_) => word,
    }
}

/// True for words carrying no retrieval signal.
pub fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.binary_search(&word).is_ok()
}

fn is_domain_term(word: &str) -> bool {
    DOMAIN_TERMS
        .iter()
        .any(|term| word.contains(term) || term.contains(word))
}

/// Extract the top `max_keywords` salient terms from `text`.
///
/// Each surviving token scores +1 per occurrence, with +2 more per
/// occurrence for nutrition-domain terms. Ties keep first-occurrence order.
///
/// # Examples
///
/// ```
/// use nutrirag::keywords::extract_keywords;
///
/// let keywords = extract_keywords("Are carbs bad for you?", 10);
/// assert_eq!(keywords, vec!["carb".to_string(), "bad".to_string()]);
/// ```
pub fn extract_keywords(text: &str, max_keywords: usize) -> Vec<String> {
    let mut scores: Vec<(String, u32)> = Vec::new();

    for token in tokenize(text) {
        let word = lemmatize(&token);
        if is_stop_word(word) || word.chars().count() < MIN_TOKEN_CHARS {
            continue;
        }

        let increment = if is_domain_term(word) { 3 } else { 1 };
        match scores.iter_mut().find(|(w, _)| w.as_str() == word) {
            Some((_, score)) => *score += increment,
            None => scores.push((word.to_string(), increment)),
        }
    }

    // Stable sort keeps first-occurrence order among equal scores.
    scores.sort_by(|a, b| b.1.cmp(&a.1));
    scores.truncate(max_keywords);
    scores.into_iter().map(|(word, _)| word).collect()
}

use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use unicode_normalization::UnicodeNormalization;
use std::collections::HashSet;

lazy_static! {
    static ref STRIP: Regex = Regex::new(r"[^-a-zA-Z0-9]").expect("valid regex");
    static ref WORD: Regex = Regex::new(r"--|-?[a-z0-9]+(?:-[a-z0-9]+)*|-").expect("valid regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "i","me","my","myself","we","our","ours","ourselves","you","you're","you've","you'll","you'd",
            "your","yours","yourself","yourselves","he","him","his","himself","she","she's","her","hers",
            "herself","it","it's","its","itself","they","them","their","theirs","themselves",
            "what","which","who","whom","this","that","that'll","these","those",
            "am","is","are","was","were","be","been","being","have","has","had","having","do","does","did","doing",
            "a","an","the","and","but","if","or","because","as","until","while",
            "of","at","by","for","with","about","against","between","into","through","during","before","after",
            "above","below","to","from","up","down","in","out","on","off","over","under",
            "again","further","then","once","here","there","when","where","why","how",
            "all","any","both","each","few","more","most","other","some","such",
            "no","nor","not","only","own","same","so","than","too","very",
            "s","t","can","will","just","don","don't","should","should've","now",
            "d","ll","m","o","re","ve","y","ain","aren","aren't","couldn","couldn't","didn","didn't",
            "doesn","doesn't","hadn","hadn't","hasn","hasn't","haven","haven't","isn","isn't","ma",
            "mightn","mightn't","mustn","mustn't","needn","needn't","shan","shan't","shouldn","shouldn't",
            "wasn","wasn't","weren","weren't","won","won't","wouldn","wouldn't"
        ];
        words.iter().copied().collect()
    };
}

pub fn is_stopword(token: &str) -> bool { STOPWORDS.contains(token) }

/// Normalize one whitespace-delimited word into an index term.
///
/// NFKC folding and lowercasing come first, then everything but ASCII letters,
/// digits and `-` is stripped and the first sub-token is kept. Stopwords,
/// single characters and `--` yield an empty string; anything else is stemmed.
pub fn normalize(token: &str) -> String {
    let word = clean_word(token);
    if word.is_empty() || is_stopword(&word) || word.len() <= 1 || word == "--" {
        return String::new();
    }
    STEMMER.stem(&word).into_owned()
}

/// The folded, stripped first sub-token of `token`, before stopword filtering and stemming.
pub fn clean_word(token: &str) -> String {
    let folded = token.nfkc().collect::<String>().to_lowercase();
    let cleaned = STRIP.replace_all(&folded, "");
    WORD.find(&cleaned).map(|m| m.as_str().to_string()).unwrap_or_default()
}

/// Normalized terms of a document's title and content, sorted, duplicates kept.
pub fn get_normalized_tokens(title: &str, content: &str) -> Vec<String> {
    let mut tokens: Vec<String> = content
        .split_whitespace()
        .chain(title.split_whitespace())
        .map(normalize)
        .filter(|t| !t.is_empty())
        .collect();
    tokens.sort();
    tokens
}

/// Log term frequency weight.
pub fn tf(raw: u32) -> f64 {
    if raw > 0 { 1.0 + (raw as f64).ln() } else { 0.0 }
}

/// `ln(n / df)`. Callers guarantee `n > 0` and `df > 0`.
pub fn idf(n: usize, df: usize) -> f64 {
    (n as f64 / df as f64).ln()
}

//! Rule-based reading of Italian food questions.
//!
//! The message is normalized into a token list, then run through a fixed
//! sequence of stages. Each stage may consume tokens and record what it found
//! in the intent; whatever is left at the end is the food phrase.

use nutribot_core::types::{ParsedIntent, SizeBucket};
use tracing::trace;

const SMALL_WORDS: &[&str] = &["piccola", "piccolo", "piccoli", "piccole", "poco", "poca", "pochi", "poche"];
const MEDIUM_WORDS: &[&str] = &["media", "medio", "medi", "medie"];
const LARGE_WORDS: &[&str] = &["grande", "grandi", "tanta", "tanto", "tanti", "tante"];

static SIZE_WORDS: [(SizeBucket, &[&str]); 3] = [
    (SizeBucket::Small, SMALL_WORDS),
    (SizeBucket::Medium, MEDIUM_WORDS),
    (SizeBucket::Large, LARGE_WORDS),
];

const CONTAINERS: &[&str] = &["porzione", "pacchetto", "confezione", "bicchiere"];

const NUMBER_WORDS: &[(&str, u32)] = &[
    ("un", 1),
    ("uno", 1),
    ("una", 1),
    ("due", 2),
    ("tre", 3),
    ("quattro", 4),
    ("cinque", 5),
    ("sei", 6),
    ("sette", 7),
    ("otto", 8),
    ("nove", 9),
    ("dieci", 10),
];

/// Article that goes with each container in the three-token form.
fn container_article(container: &str) -> &'static str {
    match container {
        "porzione" | "confezione" => "una",
        _ => "un",
    }
}

#[derive(Debug, Default)]
struct Parse {
    tokens: Vec<String>,
    intent: ParsedIntent,
}

type Stage = fn(Parse) -> Parse;

const STAGES: &[(&str, Stage)] = &[
    ("details", strip_details),
    ("relocate_size", relocate_size_word),
    ("serving", detect_serving),
    ("pieces", detect_pieces),
    ("leading_di", strip_leading_di),
    ("grams", detect_grams),
    ("milliliters", detect_milliliters),
    ("leading_di", strip_leading_di),
    ("size", detect_size),
];

/// Parses a user message. Never fails: an empty food phrase is a valid result.
pub fn parse(message: &str) -> ParsedIntent {
    let start = Parse { tokens: normalize(message), intent: ParsedIntent::default() };
    let Parse { tokens, mut intent } = STAGES.iter().fold(start, |parse, (name, stage)| {
        let next = stage(parse);
        trace!(stage = name, tokens = ?next.tokens, "parser stage");
        next
    });
    intent.food_phrase = tokens.join(" ");
    intent
}

/// Lowercase, apostrophes to spaces, split on whitespace.
pub fn normalize(message: &str) -> Vec<String> {
    message
        .to_lowercase()
        .replace(['\'', '’'], " ")
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

fn tail_is(tokens: &[String], words: &[&str]) -> bool {
    tokens.len() >= words.len() && tokens[tokens.len() - words.len()..].iter().zip(words).all(|(t, w)| t == w)
}

fn head_is(tokens: &[String], words: &[&str]) -> bool {
    tokens.len() >= words.len() && tokens.iter().zip(words).all(|(t, w)| t == w)
}

fn strip_details(mut p: Parse) -> Parse {
    let suffix_len = if tail_is(&p.tokens, &["con", "dettagli"]) {
        2
    } else if tail_is(&p.tokens, &["dettagli"]) {
        1
    } else {
        0
    };
    if suffix_len > 0 {
        p.tokens.truncate(p.tokens.len() - suffix_len);
        p.intent.details_requested = true;
    }
    p
}

/// Moves the first size word found mid-sentence to the end, so that
/// "una porzione piccola di pasta" reads "una porzione di pasta piccola".
fn relocate_size_word(mut p: Parse) -> Parse {
    if p.tokens.len() < 3 {
        return p;
    }
    let last = p.tokens.len() - 1;
    let found = SIZE_WORDS
        .iter()
        .flat_map(|(_, words)| words.iter())
        .find(|w| p.tokens[1..last].iter().any(|t| t == *w));
    if let Some(word) = found {
        let mut relocated: Vec<String> = Vec::with_capacity(p.tokens.len());
        for (i, token) in p.tokens.drain(..).enumerate() {
            if i == 0 || i == last || token != *word {
                relocated.push(token);
            }
        }
        relocated.push((*word).to_string());
        p.tokens = relocated;
    }
    p
}

fn unit_amount(token: &str, unit: &str) -> Option<u32> {
    token.strip_suffix(unit).filter(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit())).and_then(|n| n.parse().ok())
}

/// True when the message opens with a gram or milliliter amount.
fn unit_led(tokens: &[String]) -> bool {
    let Some(first) = tokens.first() else { return false };
    ["g", "ml"].iter().any(|unit| {
        unit_amount(first, unit).is_some() || tokens.get(1).is_some_and(|second| second == unit)
    })
}

fn detect_serving(mut p: Parse) -> Parse {
    if p.tokens.len() < 3 || unit_led(&p.tokens) {
        return p;
    }
    let consumed = CONTAINERS.iter().copied().find_map(|container| {
        if head_is(&p.tokens, &[container, "di"]) {
            Some(2)
        } else if head_is(&p.tokens, &[container_article(container), container, "di"]) {
            Some(3)
        } else {
            None
        }
    });
    if let Some(n) = consumed {
        p.tokens.drain(..n);
        p.intent.serving_requested = Some(1);
    }
    p
}

fn detect_pieces(mut p: Parse) -> Parse {
    if p.tokens.len() < 2 || unit_led(&p.tokens) {
        return p;
    }
    let first = p.tokens[0].as_str();
    let count = if first.bytes().all(|b| b.is_ascii_digit()) {
        first.parse().ok()
    } else {
        NUMBER_WORDS.iter().find(|(w, _)| *w == first).map(|(_, n)| *n)
    };
    if let Some(count) = count {
        p.tokens.remove(0);
        p.intent.piece_count = Some(count);
    }
    p
}

fn strip_leading_di(mut p: Parse) -> Parse {
    if p.tokens.first().is_some_and(|t| t == "di") {
        p.tokens.remove(0);
    }
    p
}

fn detect_amount(mut p: Parse, unit: &str) -> Parse {
    if p.intent.amount_grams.is_some() {
        return p;
    }
    let Some(first) = p.tokens.first() else { return p };
    if let Some(amount) = unit_amount(first, unit) {
        p.tokens.remove(0);
        p.intent.amount_grams = Some(amount);
    } else if p.tokens.get(1).is_some_and(|t| t == unit) {
        if let Some(amount) = unit_amount(&format!("{first}{unit}"), unit) {
            p.tokens.drain(..2);
            p.intent.amount_grams = Some(amount);
        }
    }
    p
}

fn detect_grams(p: Parse) -> Parse {
    detect_amount(p, "g")
}

/// Milliliters are treated as grams.
fn detect_milliliters(p: Parse) -> Parse {
    detect_amount(p, "ml")
}

/// Strips `word` from the front of the first token or the back of the last
/// one, dropping the token when nothing else is left of it.
fn strip_edge(tokens: &mut Vec<String>, word: &str) -> bool {
    if let Some(rest) = tokens.first().and_then(|t| t.strip_prefix(word)).map(str::to_string) {
        if rest.is_empty() {
            tokens.remove(0);
        } else {
            tokens[0] = rest;
        }
        return true;
    }
    if let Some(rest) = tokens.last().and_then(|t| t.strip_suffix(word)).map(str::to_string) {
        match tokens.last_mut() {
            Some(last) if !rest.is_empty() => *last = rest,
            _ => {
                tokens.pop();
            }
        }
        return true;
    }
    false
}

fn detect_size(mut p: Parse) -> Parse {
    for &(bucket, words) in &SIZE_WORDS {
        if words.iter().any(|word| strip_edge(&mut p.tokens, word)) {
            p.intent.size_bucket = Some(bucket);
            return p;
        }
    }
    p
}

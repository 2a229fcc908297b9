//! Reply composition.
//!
//! A reply is built line by line: header, variability warning, macro summary,
//! quantity estimates, specificity prompt and see-also list. Composition is
//! deterministic and never fails; missing data only removes lines.

use nutribot_core::types::{AggregateStats, ParsedIntent, SizeBucket, SizeTable};

use crate::aggregate::MatchedFood;

pub const DEFAULT_VARIABILITY_THRESHOLD: f64 = 0.15;

/// Reply when no food matches the message.
pub fn no_match_reply(message: &str) -> String {
    format!("Non ho trovato nessun alimento specifico corrispondente a \"{message}\". Puoi provare ad essere più generale?")
}

/// How a size lookup over several foods resolved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SizeResolution {
    /// Every food defines the size with the same weight.
    Exact(f64),
    /// Every food defines the size, weights differ; the mean is used.
    Averaged(f64),
    /// Some foods define the size and some do not.
    Partial,
    /// No food defines the size.
    Missing,
}

pub fn resolve_size<'a>(tables: impl IntoIterator<Item = &'a SizeTable>, bucket: SizeBucket) -> SizeResolution {
    let mut total = 0usize;
    let mut weights = Vec::new();
    for table in tables {
        total += 1;
        weights.extend(table.get(bucket));
    }
    match weights.as_slice() {
        [] => SizeResolution::Missing,
        _ if weights.len() < total => SizeResolution::Partial,
        [first, rest @ ..] if rest.iter().all(|w| w == first) => SizeResolution::Exact(f64::from(*first)),
        _ => SizeResolution::Averaged(weights.iter().map(|&w| f64::from(w)).sum::<f64>() / weights.len() as f64),
    }
}

fn rounded(value: f64) -> i64 {
    value.round() as i64
}

fn percent(ratio: f64) -> i64 {
    rounded(ratio * 100.0)
}

fn unit_label(foods: &[&MatchedFood]) -> &'static str {
    let liquid = foods.iter().filter(|m| m.food.liquid).count();
    match liquid {
        0 => "g",
        n if n == foods.len() => "ml",
        _ => "g/ml",
    }
}

fn serving_adjective(bucket: SizeBucket) -> &'static str {
    match bucket {
        SizeBucket::Small => "piccola",
        SizeBucket::Medium => "media",
        SizeBucket::Large => "grande",
    }
}

fn piece_adjective(bucket: SizeBucket, plural: bool) -> &'static str {
    match (bucket, plural) {
        (SizeBucket::Small, false) => "piccolo",
        (SizeBucket::Small, true) => "piccoli",
        (SizeBucket::Medium, false) => "medio",
        (SizeBucket::Medium, true) => "medi",
        (SizeBucket::Large, false) => "grande",
        (SizeBucket::Large, true) => "grandi",
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Specificity {
    servings: bool,
    pieces: bool,
}

impl Specificity {
    fn prompt(self) -> Option<&'static str> {
        match (self.servings, self.pieces) {
            (true, true) => Some("Per avere informazioni su porzioni e pezzi, prova ad essere più specifico."),
            (true, false) => Some("Per avere informazioni sulle porzioni, prova ad essere più specifico."),
            (false, true) => Some("Per avere informazioni sui pezzi, prova ad essere più specifico."),
            (false, false) => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Composer {
    variability_threshold: f64,
}

impl Default for Composer {
    fn default() -> Self {
        Self::new(DEFAULT_VARIABILITY_THRESHOLD)
    }
}

impl Composer {
    pub fn new(variability_threshold: f64) -> Self {
        Self { variability_threshold }
    }

    /// Builds the reply for `message` given its parsed intent, the matched
    /// foods (see-also entries included) and their aggregate statistics.
    /// With `debug`, each listed food carries its relative search score.
    pub fn compose(&self, message: &str, intent: &ParsedIntent, matched: &[MatchedFood], stats: &AggregateStats, debug: bool) -> String {
        let (see_also, foods): (Vec<&MatchedFood>, Vec<&MatchedFood>) = matched.iter().partition(|m| m.food.see_also);
        if foods.is_empty() || !stats.has_data() {
            return no_match_reply(message);
        }

        let unit = unit_label(&foods);
        let mut lines = vec![header(intent, &foods, debug)];

        if let Some(variation) = stats.cho_variation.filter(|v| *v > self.variability_threshold) {
            lines.push(format!(
                "Attenzione: i valori nutrizionali di questo alimento possono variare molto (fino al {}%).",
                percent(variation)
            ));
        }

        lines.extend(macro_summary(intent.details_requested, stats, unit));

        let mut specificity = Specificity::default();
        if let Some(cho) = stats.means.cho {
            if let Some(amount) = intent.amount_grams {
                lines.push(format!(
                    "Per {amount}{unit}, il totale di carboidrati è di circa {}g.",
                    rounded(f64::from(amount) * cho)
                ));
            } else {
                // Without any quantity both a serving and a single piece are tried.
                let explicit = intent.has_quantity();
                let serving = if explicit { intent.serving_requested } else { Some(1) };
                let pieces = if explicit { intent.piece_count } else { Some(1) };
                let bucket = intent.size_bucket.unwrap_or(SizeBucket::Medium);

                if serving.is_some() {
                    match resolve_size(foods.iter().map(|m| &m.food.servings), bucket) {
                        SizeResolution::Exact(weight) => lines.push(serving_line(bucket, weight, cho, unit, false)),
                        SizeResolution::Averaged(weight) => lines.push(serving_line(bucket, weight, cho, unit, true)),
                        SizeResolution::Partial => specificity.servings = true,
                        SizeResolution::Missing => specificity.servings = explicit,
                    }
                }
                if let Some(count) = pieces {
                    match resolve_size(foods.iter().map(|m| &m.food.pieces), bucket) {
                        SizeResolution::Exact(weight) => lines.push(pieces_line(bucket, count, weight, cho, unit, false)),
                        SizeResolution::Averaged(weight) => lines.push(pieces_line(bucket, count, weight, cho, unit, true)),
                        SizeResolution::Partial => specificity.pieces = true,
                        SizeResolution::Missing => specificity.pieces = explicit,
                    }
                }
            }
        }
        lines.extend(specificity.prompt().map(str::to_string));

        if !see_also.is_empty() {
            let names: Vec<String> = see_also.iter().map(|m| format!("*{}*", m.food.name)).collect();
            lines.push(format!("Vedi anche: {}.", names.join(", ")));
        }

        lines.join("\n").trim_end().to_string()
    }
}

fn score_suffix(food: &MatchedFood, debug: bool) -> String {
    if debug { format!(" ({:.2})", food.relative_score) } else { String::new() }
}

fn header(intent: &ParsedIntent, foods: &[&MatchedFood], debug: bool) -> String {
    if let [only] = foods {
        return format!("Ho trovato \"*{}*\".{}", only.food.name, score_suffix(only, debug));
    }
    let mut header = format!("Per \"{}\" ho trovato:", intent.food_phrase);
    for food in foods {
        header.push_str(&format!("\n- *{}*{}", food.food.name, score_suffix(food, debug)));
    }
    header
}

fn macro_summary(details: bool, stats: &AggregateStats, unit: &str) -> Option<String> {
    let means = &stats.means;
    if !details {
        return means.cho.map(|cho| format!("Mediamente, {}g di carboidrati per 100{unit}.", percent(cho)));
    }
    let parts: Vec<String> = [
        (means.cho, "carboidrati"),
        (means.protein, "proteine"),
        (means.fiber, "fibre"),
        (means.fat, "grassi"),
    ]
    .iter()
    .filter_map(|(value, label)| value.map(|v| format!("{}g di {label}", percent(v))))
    .collect();
    if parts.is_empty() {
        return None;
    }
    Some(format!("Valori nutrizionali medi: {} per 100{unit}.", parts.join(", ")))
}

fn serving_line(bucket: SizeBucket, weight: f64, cho: f64, unit: &str, averaged: bool) -> String {
    let sentence = format!(
        "una porzione {} è di {}{unit}, per un totale di circa {}g di carboidrati.",
        serving_adjective(bucket),
        rounded(weight),
        rounded(weight * cho)
    );
    if averaged { format!("In media, {sentence}") } else { capitalize(&sentence) }
}

fn pieces_line(bucket: SizeBucket, count: u32, weight: f64, cho: f64, unit: &str, averaged: bool) -> String {
    let total = weight * f64::from(count);
    let sentence = if count == 1 {
        format!("un pezzo {} è di {}{unit}", piece_adjective(bucket, false), rounded(total))
    } else {
        format!("{count} pezzi {} sono {}{unit}", piece_adjective(bucket, true), rounded(total))
    };
    let sentence = format!("{sentence}, per un totale di circa {}g di carboidrati.", rounded(total * cho));
    if averaged { format!("In media, {sentence}") } else { capitalize(&sentence) }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

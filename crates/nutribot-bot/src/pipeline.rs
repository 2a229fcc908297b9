use nutribot_core::config::Settings;
use nutribot_core::error::Result;
use nutribot_core::traits::{FoodRepository, FoodSearch};
use nutribot_core::types::{ParsedIntent, QueryOptions, SearchHit, Variant};
use tracing::{debug, info, warn};

use crate::aggregate::{aggregate, MatchedFood};
use crate::compose::{no_match_reply, Composer};
use crate::parser::parse;

const DEBUG_TOKEN: &str = "debug";

/// Splits a trailing `debug` token off a raw message.
pub fn split_debug(message: &str) -> (&str, bool) {
    let trimmed = message.trim();
    match trimmed.rsplit_once(char::is_whitespace) {
        Some((rest, last)) if last.eq_ignore_ascii_case(DEBUG_TOKEN) => (rest.trim_end(), true),
        None if trimmed.eq_ignore_ascii_case(DEBUG_TOKEN) => ("", true),
        _ => (trimmed, false),
    }
}

/// Removes markup delimiters before a reply leaves the process.
pub fn sanitize_reply(reply: &str) -> String {
    reply.chars().filter(|c| !matches!(c, '<' | '>')).collect()
}

/// Index partition that best fits the requested quantity.
pub fn variant_for(intent: &ParsedIntent) -> Variant {
    if intent.amount_grams.is_some() {
        Variant::Base
    } else if intent.piece_count.is_some() {
        Variant::Pieces
    } else if intent.serving_requested.is_some() {
        Variant::Servings
    } else {
        Variant::Base
    }
}

/// Answers food questions: parse, search, fetch observations, aggregate, compose.
pub struct Bot<S, R>
where
    S: FoodSearch,
    R: FoodRepository,
{
    search: S,
    repository: R,
    composer: Composer,
    options: QueryOptions,
    variant_fallback: bool,
}

impl<S, R> Bot<S, R>
where
    S: FoodSearch,
    R: FoodRepository,
{
    pub fn new(search: S, repository: R) -> Self {
        Self { search, repository, composer: Composer::default(), options: QueryOptions::default(), variant_fallback: true }
    }

    pub fn from_settings(search: S, repository: R, settings: &Settings) -> Self {
        Self::new(search, repository)
            .with_query_options(settings.search.query_options())
            .with_variability_threshold(settings.bot.variability_threshold)
            .with_variant_fallback(settings.bot.variant_fallback)
    }

    #[must_use]
    pub fn with_query_options(mut self, options: QueryOptions) -> Self { self.options = options; self }

    #[must_use]
    pub fn with_variability_threshold(mut self, threshold: f64) -> Self { self.composer = Composer::new(threshold); self }

    #[must_use]
    pub fn with_variant_fallback(mut self, enabled: bool) -> Self { self.variant_fallback = enabled; self }

    pub fn search(&self) -> &S { &self.search }

    pub fn repository(&self) -> &R { &self.repository }

    /// Produces the reply for one raw message. Collaborator failures are
    /// returned as errors; an unmatched food is a normal reply.
    pub fn answer(&self, raw_message: &str) -> Result<String> {
        let (message, is_debug) = split_debug(raw_message);
        let intent = parse(message);
        debug!(?intent, debug_mode = is_debug, "parsed message");
        if intent.food_phrase.is_empty() {
            return Ok(no_match_reply(message));
        }

        let matched = self.find(&intent)?;
        let stats = aggregate(&matched);
        info!(food = %intent.food_phrase, matched = matched.len(), "resolved foods");
        Ok(self.composer.compose(message, &intent, &matched, &stats, is_debug))
    }

    fn query(&self, intent: &ParsedIntent) -> Result<Vec<SearchHit>> {
        let variant = variant_for(intent);
        let hits = self.search.query(&intent.food_phrase, variant, self.options)?;
        if hits.is_empty() && variant != Variant::Base && self.variant_fallback {
            debug!(?variant, "no hits in variant index, retrying on base");
            return self.search.query(&intent.food_phrase, Variant::Base, self.options);
        }
        Ok(hits)
    }

    fn find(&self, intent: &ParsedIntent) -> Result<Vec<MatchedFood>> {
        let mut matched = Vec::new();
        for hit in self.query(intent)? {
            let food = match self.repository.get_by_uuid(&hit.id) {
                Ok(food) => food,
                Err(e) if e.is_not_found() => {
                    warn!(id = %hit.id, "search hit missing from repository, skipping");
                    continue;
                }
                Err(e) => return Err(e),
            };
            let observations = self.repository.list_observations(&hit.id)?;
            matched.push(MatchedFood { food, relative_score: hit.relative_score, observations });
        }
        Ok(matched)
    }
}

use nutribot_core::types::{AggregateStats, FoodDocument, MacroStats, NutritionObservation};

/// A search hit resolved against the food repository.
#[derive(Debug, Clone)]
pub struct MatchedFood {
    pub food: FoodDocument,
    pub relative_score: f32,
    pub observations: Vec<NutritionObservation>,
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

fn variation(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    (max > 0.0).then(|| 1.0 - min / max)
}

/// Averages the observations of every matched food except see-also entries.
pub fn aggregate(matched: &[MatchedFood]) -> AggregateStats {
    let observations: Vec<&NutritionObservation> =
        matched.iter().filter(|m| !m.food.see_also).flat_map(|m| m.observations.iter()).collect();
    let collect = |pick: fn(&NutritionObservation) -> Option<f64>| -> Vec<f64> { observations.iter().filter_map(|o| pick(o)).collect() };

    let cho = collect(|o| o.cho_ratio);
    AggregateStats {
        means: MacroStats {
            cho: mean(&cho),
            protein: mean(&collect(|o| o.protein_ratio)),
            fiber: mean(&collect(|o| o.fiber_ratio)),
            fat: mean(&collect(|o| o.fat_ratio)),
        },
        cho_variation: variation(&cho),
    }
}

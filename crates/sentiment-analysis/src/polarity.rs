//! Lexicon polarity scoring for short texts such as headlines.

use std::collections::HashMap;

const NEGATION_WORDS: &[&str] = &[
    "not", "no", "never", "don't", "doesn't", "didn't", "isn't", "aren't",
    "wasn't", "weren't", "won't", "wouldn't", "couldn't", "shouldn't", "hardly",
    "barely", "neither", "nor", "without",
];

/// How many tokens back a negation still applies.
const NEGATION_WINDOW: usize = 3;

/// Negated assessments flip sign and lose half their strength.
const NEGATION_FACTOR: f64 = -0.5;

const INTENSIFIERS: &[(&str, f64)] = &[
    ("very", 1.3),
    ("extremely", 1.5),
    ("highly", 1.3),
    ("sharply", 1.4),
    ("significantly", 1.3),
    ("massive", 1.4),
    ("huge", 1.3),
    ("deeply", 1.3),
    ("slightly", 0.5),
    ("somewhat", 0.6),
    ("modestly", 0.6),
];

/// Prior polarity per word, in [-1, 1].
const LEXICON: &[(&str, f64)] = &[
    // General
    ("good", 0.7), ("great", 0.8), ("best", 1.0), ("better", 0.5),
    ("excellent", 1.0), ("positive", 0.23), ("bad", -0.7), ("worse", -0.4),
    ("worst", -1.0), ("terrible", -1.0), ("awful", -1.0), ("negative", -0.3),
    ("happy", 0.8), ("wrong", -0.5), ("impressive", 1.0), ("poor", -0.4),
    ("new", 0.14), ("big", 0.1), ("top", 0.5), ("hot", 0.25),
    // Market direction
    ("bullish", 0.6), ("bearish", -0.6), ("rally", 0.5), ("rallies", 0.5),
    ("surge", 0.6), ("surges", 0.6), ("soar", 0.7), ("soars", 0.7),
    ("jump", 0.4), ("jumps", 0.4), ("gain", 0.4), ("gains", 0.4),
    ("rise", 0.3), ("rises", 0.3), ("climb", 0.3), ("climbs", 0.3),
    ("rebound", 0.4), ("recovery", 0.4), ("high", 0.16), ("higher", 0.25),
    ("record", 0.3), ("decline", -0.4), ("declines", -0.4), ("fall", -0.4),
    ("falls", -0.4), ("drop", -0.4), ("drops", -0.4), ("plunge", -0.7),
    ("plunges", -0.7), ("crash", -0.8), ("crashes", -0.8), ("slump", -0.6),
    ("slumps", -0.6), ("tumble", -0.6), ("tumbles", -0.6), ("sink", -0.5),
    ("sinks", -0.5), ("low", -0.1), ("lower", -0.25), ("retreat", -0.3),
    ("volatile", -0.2), ("selloff", -0.6), ("sell-off", -0.6),
    // Results and outlook
    ("beat", 0.5), ("beats", 0.5), ("miss", -0.5), ("misses", -0.5),
    ("profit", 0.4), ("profitable", 0.5), ("loss", -0.5), ("losses", -0.5),
    ("growth", 0.4), ("strong", 0.43), ("stronger", 0.5), ("weak", -0.38),
    ("weaker", -0.45), ("robust", 0.5), ("solid", 0.3), ("exceed", 0.5),
    ("exceeds", 0.5), ("disappoint", -0.6), ("disappoints", -0.6),
    ("disappointing", -0.6), ("success", 0.6), ("successful", 0.6),
    ("fail", -0.5), ("fails", -0.5), ("failure", -0.6), ("optimistic", 0.5),
    ("pessimistic", -0.5), ("upbeat", 0.5), ("gloomy", -0.5),
    ("momentum", 0.2), ("breakthrough", 0.6), ("innovation", 0.3),
    ("expansion", 0.3), ("accelerating", 0.3), ("tailwind", 0.4),
    ("headwind", -0.4), ("headwinds", -0.4),
    // Analyst actions
    ("upgrade", 0.5), ("upgraded", 0.5), ("upgrades", 0.5),
    ("downgrade", -0.5), ("downgraded", -0.5), ("downgrades", -0.5),
    ("outperform", 0.5), ("underperform", -0.5), ("overweight", 0.3),
    ("underweight", -0.3), ("buy", 0.2), ("sell", -0.2), ("overvalued", -0.4),
    ("undervalued", 0.3),
    // Corporate events
    ("dividend", 0.2), ("buyback", 0.3), ("repurchase", 0.2),
    ("lawsuit", -0.5), ("litigation", -0.4), ("probe", -0.4),
    ("investigation", -0.4), ("recall", -0.5), ("fraud", -0.8),
    ("bankruptcy", -0.9), ("default", -0.6), ("layoff", -0.5),
    ("layoffs", -0.5), ("dilution", -0.4), ("bubble", -0.4),
    ("warning", -0.4), ("risk", -0.2), ("risks", -0.2), ("concern", -0.3),
    ("concerns", -0.3), ("fear", -0.5), ("fears", -0.5), ("trouble", -0.5),
    ("win", 0.6), ("wins", 0.6),
];

/// Scores text as the mean polarity of its sentiment-bearing words.
///
/// Intensifiers scale the next sentiment word; a negation within
/// [`NEGATION_WINDOW`] tokens flips it and halves it.
#[derive(Debug, Clone)]
pub struct PolarityScorer {
    lexicon: HashMap<&'static str, f64>,
    intensifiers: HashMap<&'static str, f64>,
}

impl PolarityScorer {
    pub fn new() -> Self {
        Self {
            lexicon: LEXICON.iter().copied().collect(),
            intensifiers: INTENSIFIERS.iter().copied().collect(),
        }
    }

    fn is_negation(token: &str) -> bool {
        NEGATION_WORDS.contains(&token) || token.ends_with("n't")
    }

    /// Polarity in [-1, 1]; 0.0 when no word carries sentiment.
    pub fn polarity(&self, text: &str) -> f64 {
        let lowered = text.to_lowercase().replace('\u{2019}', "'");
        let tokens: Vec<&str> = lowered
            .split(|c: char| c.is_whitespace() || (c.is_ascii_punctuation() && c != '\'' && c != '-'))
            .map(|t| t.trim_matches(|c: char| c == '\'' || c == '-'))
            .filter(|t| !t.is_empty())
            .collect();

        let mut assessments: Vec<f64> = Vec::new();
        let mut last_negation: Option<usize> = None;
        let mut intensity = 1.0;

        for (i, token) in tokens.iter().enumerate() {
            if Self::is_negation(token) {
                last_negation = Some(i);
                continue;
            }
            if let Some(&factor) = self.intensifiers.get(token) {
                intensity *= factor;
                continue;
            }
            let Some(&prior) = self.lexicon.get(token) else {
                intensity = 1.0;
                continue;
            };

            let mut score = prior * intensity;
            if last_negation.is_some_and(|neg| i - neg <= NEGATION_WINDOW) {
                score *= NEGATION_FACTOR;
            }
            assessments.push(score.clamp(-1.0, 1.0));
            intensity = 1.0;
        }

        if assessments.is_empty() {
            return 0.0;
        }
        let mean = assessments.iter().sum::<f64>() / assessments.len() as f64;
        mean.clamp(-1.0, 1.0)
    }
}

impl Default for PolarityScorer {
    fn default() -> Self {
        Self::new()
    }
}

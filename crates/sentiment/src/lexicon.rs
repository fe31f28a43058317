//! 基于词典的情感分析（VADER 风格）

use crate::preprocessing::{normalize, words};
use crate::types::SentimentLabel;
use crate::SentimentClassifier;
use std::collections::{HashMap, HashSet};

/// compound >= 0.05 为 bullish，<= -0.05 为 bearish
pub const POSITIVE_THRESHOLD: f64 = 0.05;
pub const NEGATIVE_THRESHOLD: f64 = -0.05;

const NORMALIZATION_ALPHA: f64 = 15.0;
const BOOSTER_INCREMENT: f64 = 0.293;
const CAPS_INCREMENT: f64 = 0.733;
const NEGATION_SCALAR: f64 = -0.74;
const EXCLAMATION_INCREMENT: f64 = 0.292;
const WINDOW: usize = 3;

/// 词典情感分析器
pub struct LexiconClassifier {
    valences: HashMap<String, f64>,
    boosters: HashMap<String, f64>,
    negations: HashSet<String>,
}

impl LexiconClassifier {
    pub fn new() -> Self {
        let mut analyzer = Self {
            valences: HashMap::new(),
            boosters: HashMap::new(),
            negations: HashSet::new(),
        };

        analyzer.initialize_dictionaries();
        analyzer
    }

    /// 追加或覆盖词条
    pub fn with_words<I, S>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        for (word, valence) in entries {
            self.valences.insert(normalize(&word.into()), valence);
        }
        self
    }

    fn initialize_dictionaries(&mut self) {
        // 正面词汇（通用 + 财经）
        let positive_words = [
            ("good", 1.9),
            ("great", 3.1),
            ("excellent", 2.7),
            ("strong", 2.3),
            ("stronger", 2.1),
            ("positive", 2.6),
            ("optimistic", 1.3),
            ("confident", 2.2),
            ("win", 2.8),
            ("wins", 2.7),
            ("won", 2.7),
            ("success", 2.7),
            ("successful", 2.8),
            ("gain", 2.4),
            ("gains", 1.8),
            ("growth", 1.6),
            ("grow", 1.3),
            ("grows", 1.3),
            ("profit", 1.9),
            ("profits", 1.9),
            ("profitable", 1.9),
            ("surge", 1.8),
            ("surges", 1.8),
            ("soar", 2.0),
            ("soars", 2.0),
            ("rally", 1.7),
            ("rallies", 1.7),
            ("jump", 1.2),
            ("jumps", 1.2),
            ("rise", 1.0),
            ("rises", 1.0),
            ("climb", 1.0),
            ("climbs", 1.0),
            ("beat", 1.4),
            ("beats", 1.4),
            ("exceed", 1.6),
            ("exceeds", 1.6),
            ("outperform", 1.8),
            ("outperforms", 1.8),
            ("upgrade", 1.9),
            ("upgraded", 1.9),
            ("upgrades", 1.9),
            ("record", 0.8),
            ("boost", 1.7),
            ("boosts", 1.7),
            ("improve", 1.9),
            ("improved", 2.1),
            ("improves", 1.9),
            ("recovery", 1.4),
            ("rebound", 1.3),
            ("rebounds", 1.3),
            ("bullish", 2.0),
            ("buy", 0.9),
            ("opportunity", 1.8),
            ("innovative", 1.8),
            ("innovation", 1.6),
            ("expand", 1.1),
            ("expands", 1.1),
            ("expansion", 1.1),
            ("partnership", 1.3),
            ("award", 2.5),
            ("top", 0.8),
            ("best", 3.2),
            ("like", 1.5),
            ("love", 3.2),
            ("benefit", 2.0),
            ("benefits", 2.0),
            ("secure", 1.4),
            ("resilient", 1.2),
            ("robust", 1.6),
            ("upbeat", 1.8),
        ];

        // 负面词汇
        let negative_words = [
            ("bad", -2.5),
            ("worse", -2.1),
            ("worst", -3.1),
            ("weak", -1.9),
            ("weaker", -1.9),
            ("negative", -2.7),
            ("pessimistic", -1.5),
            ("loss", -1.3),
            ("losses", -1.7),
            ("lose", -1.7),
            ("loses", -1.7),
            ("lost", -1.3),
            ("fall", -1.0),
            ("falls", -1.0),
            ("fell", -1.0),
            ("drop", -1.1),
            ("drops", -1.1),
            ("decline", -1.2),
            ("declines", -1.2),
            ("plunge", -2.2),
            ("plunges", -2.2),
            ("plunged", -2.2),
            ("crash", -1.7),
            ("crashes", -1.7),
            ("crater", -2.0),
            ("craters", -2.0),
            ("slump", -1.7),
            ("slumps", -1.7),
            ("tumble", -1.5),
            ("tumbles", -1.5),
            ("sink", -1.2),
            ("sinks", -1.2),
            ("miss", -1.3),
            ("misses", -1.3),
            ("missed", -1.3),
            ("cut", -1.1),
            ("cuts", -1.1),
            ("slash", -1.6),
            ("slashes", -1.6),
            ("slashed", -1.6),
            ("downgrade", -1.9),
            ("downgraded", -1.9),
            ("downgrades", -1.9),
            ("underperform", -1.8),
            ("bearish", -2.0),
            ("sell", -0.6),
            ("risk", -1.1),
            ("risks", -1.1),
            ("concern", -1.2),
            ("concerns", -1.2),
            ("worry", -1.9),
            ("worries", -1.9),
            ("fear", -2.2),
            ("fears", -2.0),
            ("warning", -1.4),
            ("warns", -1.4),
            ("alarm", -1.4),
            ("crisis", -3.1),
            ("lawsuit", -1.8),
            ("sued", -1.9),
            ("fraud", -2.8),
            ("scandal", -2.9),
            ("probe", -1.1),
            ("investigation", -1.3),
            ("layoffs", -1.9),
            ("bankruptcy", -2.6),
            ("default", -1.6),
            ("breach", -2.0),
            ("outage", -1.6),
            ("hack", -1.9),
            ("volatile", -0.8),
            ("uncertainty", -1.4),
            ("uncertain", -1.2),
            ("disappoint", -2.0),
            ("disappointing", -2.2),
            ("disappoints", -2.0),
            ("fail", -2.5),
            ("fails", -2.3),
            ("failed", -2.3),
            ("trouble", -1.7),
            ("problem", -1.7),
            ("problems", -1.7),
            ("bear", -1.0),
            ("nosedive", -2.0),
        ];

        for (word, score) in positive_words.into_iter().chain(negative_words) {
            self.valences.insert(word.to_string(), score);
        }

        // 程度副词
        let boosters = [
            ("very", BOOSTER_INCREMENT),
            ("extremely", BOOSTER_INCREMENT),
            ("highly", BOOSTER_INCREMENT),
            ("sharply", BOOSTER_INCREMENT),
            ("significantly", BOOSTER_INCREMENT),
            ("hugely", BOOSTER_INCREMENT),
            ("most", BOOSTER_INCREMENT),
            ("more", BOOSTER_INCREMENT),
            ("really", BOOSTER_INCREMENT),
            ("slightly", -BOOSTER_INCREMENT),
            ("somewhat", -BOOSTER_INCREMENT),
            ("barely", -BOOSTER_INCREMENT),
            ("marginally", -BOOSTER_INCREMENT),
            ("less", -BOOSTER_INCREMENT),
        ];
        for (word, increment) in boosters {
            self.boosters.insert(word.to_string(), increment);
        }

        let negations = [
            "not", "no", "never", "neither", "nor", "none", "nothing", "nobody", "without",
            "cannot", "cant", "dont", "doesnt", "didnt", "wont", "isnt", "arent", "wasnt",
        ];
        self.negations = negations.into_iter().map(String::from).collect();
    }

    fn is_negation(&self, token: &str) -> bool {
        self.negations.contains(token) || token.ends_with("n't")
    }

    /// VADER 风格 compound 分数，范围 [-1, 1]
    pub fn polarity(&self, text: &str) -> f64 {
        let raw_tokens = words(text);
        if raw_tokens.is_empty() {
            return 0.0;
        }
        let tokens: Vec<String> = raw_tokens.iter().map(|t| normalize(t)).collect();

        // 只有部分词全大写时才算强调
        let caps_count = raw_tokens.iter().filter(|t| is_all_caps(t)).count();
        let caps_differential = caps_count > 0 && caps_count < raw_tokens.len();

        let mut valences = Vec::with_capacity(tokens.len());
        for (i, token) in tokens.iter().enumerate() {
            let Some(&base) = self.valences.get(token.as_str()) else {
                valences.push(0.0);
                continue;
            };
            let sign = base.signum();
            let mut valence = base;

            if caps_differential && is_all_caps(raw_tokens[i]) {
                valence += sign * CAPS_INCREMENT;
            }

            let start = i.saturating_sub(WINDOW);
            for (distance, previous) in tokens[start..i].iter().rev().enumerate() {
                if let Some(&increment) = self.boosters.get(previous.as_str()) {
                    // 距离越远影响越小
                    let decay = 1.0 - 0.05 * distance as f64;
                    valence += sign * increment * decay;
                }
            }

            if tokens[start..i].iter().any(|t| self.is_negation(t)) {
                valence *= NEGATION_SCALAR;
            }

            valences.push(valence);
        }

        // "but" 之前减弱，之后加强
        if let Some(pivot) = tokens.iter().position(|t| t == "but") {
            for (i, valence) in valences.iter_mut().enumerate() {
                if i < pivot {
                    *valence *= 0.5;
                } else if i > pivot {
                    *valence *= 1.5;
                }
            }
        }

        let mut sum: f64 = valences.iter().sum();
        if sum != 0.0 {
            let exclamations = text.matches('!').count().min(4) as f64;
            sum += sum.signum() * exclamations * EXCLAMATION_INCREMENT;
        }

        let compound = sum / (sum * sum + NORMALIZATION_ALPHA).sqrt();
        compound.clamp(-1.0, 1.0)
    }
}

impl Default for LexiconClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl SentimentClassifier for LexiconClassifier {
    fn name(&self) -> &'static str {
        "vader"
    }

    fn classify(&self, text: &str) -> SentimentLabel {
        let compound = self.polarity(text);
        tracing::trace!("lexicon compound {compound:.3}");
        if compound >= POSITIVE_THRESHOLD {
            SentimentLabel::Bullish
        } else if compound <= NEGATIVE_THRESHOLD {
            SentimentLabel::Bearish
        } else {
            SentimentLabel::Neutral
        }
    }
}

fn is_all_caps(token: &str) -> bool {
    let mut letters = token.chars().filter(|c| c.is_alphabetic()).peekable();
    letters.peek().is_some() && token.chars().count() > 1 && letters.all(|c| c.is_uppercase())
}

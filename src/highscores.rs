// In-memory best score per level.
//
// Lower is better. The table lives for the process lifetime and is shared
// between request handlers, so the compare-and-store runs under one lock.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;

use crate::levels::LevelId;

/// A submitted score. Keeps the JSON type the client sent.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Score {
    Number(serde_json::Number),
    Text(String),
}

impl Score {
    pub fn text(text: impl Into<String>) -> Self {
        Score::Text(text.into())
    }

    pub fn number(n: impl Into<serde_json::Number>) -> Self {
        Score::Number(n.into())
    }

    /// Accept a JSON number or a non-empty JSON string.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Number(n) => Some(Score::Number(n.clone())),
            serde_json::Value::String(s) if !s.is_empty() => Some(Score::Text(s.clone())),
            _ => None,
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Score::Number(n) => n.as_f64(),
            Score::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Score::Number(n) => write!(f, "{n}"),
            Score::Text(s) => f.write_str(s),
        }
    }
}

fn compare_numbers(a: &serde_json::Number, b: &serde_json::Number) -> Ordering {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return x.cmp(&y);
    }
    if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
        return x.cmp(&y);
    }
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => Ordering::Equal,
    }
}

/// How text scores are compared to decide which is better.
///
/// JSON numbers always compare numerically; the order only matters once a
/// text score is involved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScoreOrder {
    /// Byte-wise string comparison: `"9"` is worse than `"10"`.
    #[default]
    Lexicographic,
    /// Compare as numbers when both parse, otherwise as strings.
    Numeric,
}

impl ScoreOrder {
    pub fn compare(self, a: &Score, b: &Score) -> Ordering {
        if let (Score::Number(x), Score::Number(y)) = (a, b) {
            return compare_numbers(x, y);
        }
        let as_text = || a.to_string().cmp(&b.to_string());
        match self {
            ScoreOrder::Lexicographic => as_text(),
            ScoreOrder::Numeric => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or_else(as_text),
                _ => as_text(),
            },
        }
    }

    /// True when `candidate` is strictly better (lower) than `current`.
    pub fn is_better(self, candidate: &Score, current: &Score) -> bool {
        self.compare(candidate, current) == Ordering::Less
    }
}

impl FromStr for ScoreOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "string" | "lexicographic" => Ok(ScoreOrder::Lexicographic),
            "numeric" | "number" => Ok(ScoreOrder::Numeric),
            other => Err(format!("unknown score order '{other}'")),
        }
    }
}

impl fmt::Display for ScoreOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreOrder::Lexicographic => write!(f, "string"),
            ScoreOrder::Numeric => write!(f, "numeric"),
        }
    }
}

/// Result of an update attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateOutcome {
    pub updated: bool,
    /// The replaced score. Always `None` when `updated` is false.
    pub previous: Option<Score>,
}

/// Thread-safe best-score table, cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct HighscoreTable {
    inner: Arc<Mutex<HashMap<LevelId, Score>>>,
    order: ScoreOrder,
}

impl HighscoreTable {
    pub fn new(order: ScoreOrder) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            order,
        }
    }

    pub fn order(&self) -> ScoreOrder {
        self.order
    }

    // Entries are independent, so a panic mid-update cannot leave the map
    // inconsistent; keep serving after a poisoned lock.
    fn lock(&self) -> MutexGuard<'_, HashMap<LevelId, Score>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn get(&self, level: LevelId) -> Option<Score> {
        self.lock().get(&level).cloned()
    }

    /// Store `score` if the level has none yet or it beats the current one.
    pub fn update(&self, level: LevelId, score: Score) -> UpdateOutcome {
        let mut map = self.lock();
        match map.get(&level) {
            Some(current) if !self.order.is_better(&score, current) => UpdateOutcome {
                updated: false,
                previous: None,
            },
            _ => {
                let previous = map.insert(level, score);
                UpdateOutcome {
                    updated: true,
                    previous,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(text: &str) -> Score {
        Score::text(text)
    }

    fn n(value: i64) -> Score {
        Score::number(value)
    }

    #[test]
    fn test_first_update_always_stores() {
        let table = HighscoreTable::new(ScoreOrder::Lexicographic);
        let outcome = table.update(1, s("100"));
        assert!(outcome.updated);
        assert_eq!(outcome.previous, None);
        assert_eq!(table.get(1), Some(s("100")));
    }

    #[test]
    fn test_improvement_sequence() {
        let table = HighscoreTable::new(ScoreOrder::Numeric);

        assert_eq!(
            table.update(1, s("100")),
            UpdateOutcome {
                updated: true,
                previous: None
            }
        );
        assert_eq!(
            table.update(1, s("50")),
            UpdateOutcome {
                updated: true,
                previous: Some(s("100"))
            }
        );
        assert_eq!(table.get(1), Some(s("50")));
        assert_eq!(
            table.update(1, s("80")),
            UpdateOutcome {
                updated: false,
                previous: None
            }
        );
        assert_eq!(table.get(1), Some(s("50")));
    }

    #[test]
    fn test_same_score_twice_is_rejected() {
        for order in [ScoreOrder::Lexicographic, ScoreOrder::Numeric] {
            let table = HighscoreTable::new(order);
            assert!(table.update(4, s("42")).updated);
            let second = table.update(4, s("42"));
            assert!(!second.updated);
            assert_eq!(second.previous, None);
        }
    }

    #[test]
    fn test_levels_are_independent() {
        let table = HighscoreTable::default();
        table.update(1, s("5"));
        table.update(2, s("7"));
        assert_eq!(table.get(1), Some(s("5")));
        assert_eq!(table.get(2), Some(s("7")));
        assert_eq!(table.get(3), None);
    }

    #[test]
    fn test_lexicographic_vs_numeric() {
        let lex = ScoreOrder::Lexicographic;
        let num = ScoreOrder::Numeric;

        // Orders agree here.
        assert!(lex.is_better(&s("50"), &s("80")));
        assert!(num.is_better(&s("50"), &s("80")));

        // And disagree here.
        assert!(!lex.is_better(&s("9"), &s("10")));
        assert!(num.is_better(&s("9"), &s("10")));
        assert!(lex.is_better(&s("100"), &s("80")));
        assert!(!num.is_better(&s("100"), &s("80")));
    }

    #[test]
    fn test_lexicographic_table_keeps_string_semantics() {
        let table = HighscoreTable::new(ScoreOrder::Lexicographic);
        table.update(1, s("10"));
        assert!(!table.update(1, s("9")).updated);
        assert_eq!(table.get(1), Some(s("10")));
    }

    #[test]
    fn test_numeric_falls_back_for_non_numbers() {
        let num = ScoreOrder::Numeric;
        assert!(num.is_better(&s("1.5"), &s("2")));
        assert!(num.is_better(&s("abc"), &s("abd")));
        assert!(num.is_better(&s("10"), &s("abc")));
    }

    #[test]
    fn test_table_holds_minimum_of_sequence() {
        let scores = ["40", "70", "12", "12", "90", "3", "15"];
        let table = HighscoreTable::new(ScoreOrder::Numeric);
        let mut best: Option<f64> = None;
        for text in scores {
            let value: f64 = text.parse().unwrap();
            let expected = best.map_or(true, |b| value < b);
            assert_eq!(table.update(9, s(text)).updated, expected, "score {text}");
            if expected {
                best = Some(value);
            }
        }
        assert_eq!(table.get(9), Some(s("3")));
    }

    #[test]
    fn test_concurrent_updates_keep_best() {
        let table = HighscoreTable::new(ScoreOrder::Numeric);
        let handles: Vec<_> = (1..=8)
            .map(|t| {
                let table = table.clone();
                std::thread::spawn(move || {
                    for i in 0..200u32 {
                        table.update(1, Score::number(1000 + t * 200 - i));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(table.get(1), Some(n(1001)));
    }

    #[test]
    fn test_numbers_compare_numerically_in_both_orders() {
        for order in [ScoreOrder::Lexicographic, ScoreOrder::Numeric] {
            let table = HighscoreTable::new(order);
            assert!(table.update(1, n(10)).updated, "{order}");
            let outcome = table.update(1, n(9));
            assert!(outcome.updated, "{order}");
            assert_eq!(outcome.previous, Some(n(10)));
            assert!(!table.update(1, n(80)).updated, "{order}");
            assert_eq!(table.get(1), Some(n(9)));
        }
    }

    #[test]
    fn test_number_ordering_edges() {
        let lex = ScoreOrder::Lexicographic;
        assert!(lex.is_better(&n(-5), &n(3)));
        assert!(lex.is_better(&Score::number(u64::MAX - 1), &Score::number(u64::MAX)));
        let half = Score::from_json(&serde_json::json!(1.5)).unwrap();
        assert!(lex.is_better(&half, &n(2)));
        assert!(!lex.is_better(&n(2), &half));
    }

    #[test]
    fn test_mixed_number_and_text() {
        // Numeric order parses the text side; string order compares text forms.
        assert!(ScoreOrder::Numeric.is_better(&n(9), &s("10")));
        assert!(!ScoreOrder::Lexicographic.is_better(&n(9), &s("10")));
    }

    #[test]
    fn test_score_from_json() {
        assert_eq!(Score::from_json(&serde_json::json!("12")), Some(s("12")));
        assert_eq!(Score::from_json(&serde_json::json!(12)), Some(n(12)));
        assert_eq!(
            Score::from_json(&serde_json::json!(1.5)).map(|v| v.to_string()),
            Some("1.5".to_string())
        );
        assert_eq!(Score::from_json(&serde_json::json!("")), None);
        assert_eq!(Score::from_json(&serde_json::json!(null)), None);
        assert_eq!(Score::from_json(&serde_json::json!([1])), None);
    }

    #[test]
    fn test_score_keeps_json_type() {
        assert_eq!(serde_json::to_value(n(27)).unwrap(), serde_json::json!(27));
        assert_eq!(serde_json::to_value(s("27")).unwrap(), serde_json::json!("27"));
    }

    #[test]
    fn test_score_order_parse() {
        assert_eq!("string".parse::<ScoreOrder>(), Ok(ScoreOrder::Lexicographic));
        assert_eq!("Numeric".parse::<ScoreOrder>(), Ok(ScoreOrder::Numeric));
        assert!("fastest".parse::<ScoreOrder>().is_err());
        assert_eq!(ScoreOrder::default(), ScoreOrder::Lexicographic);
    }
}

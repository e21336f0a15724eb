use std::fmt;

use crate::game::GameKind;
use crate::settings::{GameSettings, ReportMap};

/// A derived ratio that may have no value, e.g. time per hit with zero hits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Derived {
    Value(f64),
    Undefined,
}

impl Derived {
    pub fn value(self) -> Option<f64> {
        match self {
            Derived::Value(v) => Some(v),
            Derived::Undefined => None,
        }
    }

    pub fn is_defined(self) -> bool {
        matches!(self, Derived::Value(_))
    }
}

impl fmt::Display for Derived {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Derived::Value(v) => write!(f, "{v:.2}"),
            Derived::Undefined => write!(f, "N/A"),
        }
    }
}

pub fn round_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Session duration spread over correct answers.
pub fn average_latency_ms(duration_ms: i64, score: u32) -> Derived {
    if score == 0 {
        return Derived::Undefined;
    }
    Derived::Value(round_hundredths(duration_ms as f64 / f64::from(score)))
}

/// Share of answers that were correct, as a percentage.
pub fn accuracy_percent(score: u32, errors: u32) -> Derived {
    let total = u64::from(score) + u64::from(errors);
    if total == 0 {
        return Derived::Undefined;
    }
    Derived::Value(round_hundredths(f64::from(score) * 100.0 / total as f64))
}

pub fn mean(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        None
    } else {
        Some(data.iter().sum::<f64>() / data.len() as f64)
    }
}

/// Immutable summary of one finished session.
#[derive(Debug, Clone, PartialEq)]
pub struct Metric {
    pub game: GameKind,
    pub score: u32,
    pub error_count: u32,
    pub duration_ms: Option<i64>,
    pub derived: Derived,
}

impl Metric {
    pub fn compute(settings: &GameSettings, score: u32, error_count: u32) -> Self {
        let game = settings.game();
        let duration_ms = settings.duration_ms();
        let derived = match (game, duration_ms) {
            (GameKind::Monte, _) => accuracy_percent(score, error_count),
            (_, Some(duration)) => average_latency_ms(duration, score),
            (_, None) => Derived::Undefined,
        };

        Self {
            game,
            score,
            error_count,
            duration_ms,
            derived,
        }
    }

    /// Metrics as reported to the results store. An undefined derived value
    /// is left out rather than encoded as a number.
    pub fn to_report_map(&self) -> ReportMap {
        let mut map = ReportMap::new();
        map.insert("Result1".into(), f64::from(self.score));
        if self.game.counts_errors() {
            map.insert("Result2".into(), f64::from(self.error_count));
        }
        if let Derived::Value(v) = self.derived {
            map.insert(self.game.derived_key().into(), v);
        }
        map
    }

    pub fn derived_display(&self) -> String {
        match self.derived {
            Derived::Value(v) => format!("{v:.2}{}", self.game.derived_unit()),
            Derived::Undefined => Derived::Undefined.to_string(),
        }
    }
}

/// Best historical derived value for a player and game.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BestMetric {
    /// The results store could not be reached.
    Unavailable,
    /// Reachable, but there is nothing to rank.
    NoHistory,
    Best(f64),
}

impl BestMetric {
    pub fn value(self) -> Option<f64> {
        match self {
            BestMetric::Best(v) => Some(v),
            _ => None,
        }
    }

    pub fn display(self, game: GameKind) -> String {
        match self {
            BestMetric::Unavailable | BestMetric::NoHistory => "N/A".to_string(),
            BestMetric::Best(v) => format!("{v}{}", game.derived_unit()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::ActiveColor;

    #[test]
    fn test_average_latency() {
        assert_eq!(average_latency_ms(3000, 1), Derived::Value(3000.0));
        assert_eq!(average_latency_ms(30_000, 7), Derived::Value(4285.71));
        assert_eq!(average_latency_ms(3000, 0), Derived::Undefined);
    }

    #[test]
    fn test_accuracy() {
        assert_eq!(accuracy_percent(7, 3), Derived::Value(70.0));
        assert_eq!(accuracy_percent(1, 2), Derived::Value(33.33));
        assert_eq!(accuracy_percent(0, 4), Derived::Value(0.0));
        assert_eq!(accuracy_percent(0, 0), Derived::Undefined);
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[10., 20., 30., 15., 22.]), Some(19.4));
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn test_derived_display() {
        assert_eq!(Derived::Value(12.5).to_string(), "12.50");
        assert_eq!(Derived::Undefined.to_string(), "N/A");
    }

    #[test]
    fn test_metric_for_hunt() {
        let settings = GameSettings::ItemHunt {
            duration_secs: 3,
            color: ActiveColor::Green,
        };
        let metric = Metric::compute(&settings, 1, 1);
        assert_eq!(metric.derived, Derived::Value(3000.0));

        let map = metric.to_report_map();
        assert_eq!(map.get("Result1"), Some(&1.0));
        assert_eq!(map.get("Result2"), Some(&3000.0));
        assert_eq!(map.len(), 2);
        assert_eq!(metric.derived_display(), "3000.00ms");
    }

    #[test]
    fn test_metric_for_stroop_keeps_errors() {
        let settings = GameSettings::Stroop { duration_secs: 30 };
        let metric = Metric::compute(&settings, 10, 4);
        let map = metric.to_report_map();
        assert_eq!(map.get("Result2"), Some(&4.0));
        assert_eq!(map.get("Result3"), Some(&3000.0));
    }

    #[test]
    fn test_metric_with_zero_score_omits_derived() {
        let settings = GameSettings::Stroop { duration_secs: 30 };
        let metric = Metric::compute(&settings, 0, 2);
        assert_eq!(metric.derived, Derived::Undefined);
        let map = metric.to_report_map();
        assert!(!map.contains_key("Result3"));
        assert_eq!(metric.derived_display(), "N/A");
    }

    #[test]
    fn test_metric_for_monte() {
        let settings = GameSettings::Monte {
            card_count: 3,
            round_count: 4,
            shuffle_count: 2,
        };
        let metric = Metric::compute(&settings, 3, 1);
        assert_eq!(metric.derived, Derived::Value(75.0));
        assert_eq!(metric.duration_ms, None);
        assert_eq!(metric.derived_display(), "75.00%");
    }

    #[test]
    fn test_best_metric_display() {
        assert_eq!(BestMetric::Best(250.5).display(GameKind::ItemHunt), "250.5ms");
        assert_eq!(BestMetric::Best(90.0).display(GameKind::Monte), "90%");
        assert_eq!(BestMetric::Unavailable.display(GameKind::Stroop), "N/A");
        assert_ne!(BestMetric::NoHistory, BestMetric::Best(0.0));
    }
}

//! Fit score extraction from free-form reviewer output.
//!
//! The reviewer is asked to finish with `Fit Score: N`, but models drift, so the
//! extractor walks an ordered cascade of patterns and takes the first stage
//! that matches anything. Within a stage the first occurrence wins.
//!
//! | stage | pattern                                   |
//! |-------|-------------------------------------------|
//! | 1     | line starting with `fit score:`           |
//! | 2     | `fit score:` anywhere                     |
//! | 3     | `score:` / `overall score:` anywhere      |
//! | 4     | `N/100`, `N out of 100`                   |
//! | 5     | `N%`                                      |
//! | 6     | `(N)`                                     |
//! | 7     | first standalone number within [0, 100]   |
//!
//! Whatever stage fires, the value is rounded and clamped to [0, 100].

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// A `-` only counts as a sign when no word character precedes it, so the
/// upper end of a range like `60-70` stays positive.
const NUMBER: &str = r"((?:\B-)?\d+(?:\.\d+)?)";

/// Markdown emphasis the model likes to put around labels, e.g. `**Fit Score:** 80`.
const EMPHASIS: &str = r"[\s*_]*";

struct Stage {
    name: &'static str,
    pattern: Lazy<Regex>,
    /// Stage 7 only: skip candidates outside [0, 100] instead of clamping them.
    in_range_only: bool,
}

static STAGES: [Stage; 7] = [
    Stage {
        name: "fit score line",
        pattern: Lazy::new(|| labelled(r"(?im)^[\s*#>_-]*fit\s*score")),
        in_range_only: false,
    },
    Stage {
        name: "fit score label",
        pattern: Lazy::new(|| labelled(r"(?i)fit\s*score")),
        in_range_only: false,
    },
    Stage {
        name: "score label",
        pattern: Lazy::new(|| labelled(r"(?i)(?:overall\s+)?score")),
        in_range_only: false,
    },
    Stage {
        name: "out of 100",
        pattern: Lazy::new(|| compile(&format!(r"(?i){NUMBER}\s*(?:/\s*100\b|out\s+of\s+100\b)"))),
        in_range_only: false,
    },
    Stage {
        name: "percent",
        pattern: Lazy::new(|| compile(&format!(r"{NUMBER}\s*%"))),
        in_range_only: false,
    },
    Stage {
        name: "parenthesized",
        pattern: Lazy::new(|| compile(&format!(r"\(\s*{NUMBER}\s*\)"))),
        in_range_only: false,
    },
    Stage {
        name: "standalone number",
        pattern: Lazy::new(|| compile(r"((?:\B-)?\b\d+(?:\.\d+)?\b)")),
        in_range_only: true,
    },
];

/// `label`, a colon (emphasis allowed on either side), then the number.
fn labelled(label: &str) -> Regex {
    compile(&format!("{label}{EMPHASIS}:{EMPHASIS}{NUMBER}"))
}

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("score pattern must be a valid regex")
}

/// Runs the cascade. `None` means no stage found a usable number.
pub fn detect_fit_score(text: &str) -> Option<u32> {
    for stage in &STAGES {
        let mut candidates = stage
            .pattern
            .captures_iter(text)
            .filter_map(|caps| caps.get(1)?.as_str().parse::<f64>().ok());

        let value = if stage.in_range_only {
            candidates.find(|v| (0.0..=100.0).contains(v))
        } else {
            candidates.next()
        };

        if let Some(value) = value {
            let score = clamp_score(value);
            debug!("Fit score {score} extracted via {} (raw {value})", stage.name);
            return Some(score);
        }
    }

    debug!("No fit score found in review text");
    None
}

/// Never fails: text without a recognizable number scores 0.
///
/// Outcomes are built from `detect_fit_score` so `score_detected` can be set.
#[cfg(test)]
pub fn extract_fit_score(text: &str) -> u32 {
    detect_fit_score(text).unwrap_or(0)
}

/// Rounds half away from zero, then clamps into [0, 100].
fn clamp_score(value: f64) -> u32 {
    value.round().clamp(0.0, 100.0) as u32
}

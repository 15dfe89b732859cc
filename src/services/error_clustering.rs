//! Canonicalization of step error messages into chartable buckets.
//!
//! Messages pass through an ordered rule table. A rule either settles the
//! message (a bucket label or exclusion), rewrites it and lets evaluation
//! continue, or does not apply. The last rule always settles.

use std::collections::HashMap;

use crate::models::ErrorTypeMetrics;
use crate::reporter::step_log::COMPONENTS_USED_MARKER;

/// Bucket for absent or empty messages.
pub const UNKNOWN_ERROR: &str = "Unknown Error";
/// Bucket for click-interception failures regardless of locator details.
pub const CLICK_INTERCEPTED: &str = "element click intercepted";

const MESSAGE_PREFIX: &str = "message:";
const BUCKET_WORDS: usize = 3;

enum Action {
    Bucket(String),
    Exclude,
    Rewrite(String),
}

struct Rule {
    name: &'static str,
    apply: fn(&str) -> Option<Action>,
}

fn empty(msg: &str) -> Option<Action> {
    msg.is_empty()
        .then(|| Action::Bucket(UNKNOWN_ERROR.to_string()))
}

fn component_trail(msg: &str) -> Option<Action> {
    msg.contains(COMPONENTS_USED_MARKER).then_some(Action::Exclude)
}

fn message_prefix(msg: &str) -> Option<Action> {
    let head = msg.get(..MESSAGE_PREFIX.len())?;
    head.eq_ignore_ascii_case(MESSAGE_PREFIX)
        .then(|| Action::Rewrite(msg[MESSAGE_PREFIX.len()..].trim().to_string()))
}

fn click_intercepted(msg: &str) -> Option<Action> {
    msg.to_lowercase()
        .contains(CLICK_INTERCEPTED)
        .then(|| Action::Bucket(CLICK_INTERCEPTED.to_string()))
}

/// Whitespace-only remainders carry no signal and are dropped.
fn leading_words(msg: &str) -> Option<Action> {
    let words: Vec<&str> = msg.split_whitespace().take(BUCKET_WORDS).collect();
    if words.is_empty() {
        Some(Action::Exclude)
    } else {
        Some(Action::Bucket(words.join(" ")))
    }
}

/// Evaluated top to bottom; order matters.
const RULES: &[Rule] = &[
    Rule { name: "empty", apply: empty },
    Rule { name: "component_trail", apply: component_trail },
    Rule { name: "message_prefix", apply: message_prefix },
    Rule { name: "click_intercepted", apply: click_intercepted },
    Rule { name: "leading_words", apply: leading_words },
];

/// Canonical bucket for a message, or `None` if it is excluded from metrics.
pub fn canonicalize(message: Option<&str>) -> Option<String> {
    let mut current = message.unwrap_or_default().to_string();

    for rule in RULES {
        match (rule.apply)(&current) {
            Some(Action::Bucket(label)) => return Some(label),
            Some(Action::Exclude) => {
                tracing::trace!(rule = rule.name, "Error message excluded");
                return None;
            }
            Some(Action::Rewrite(next)) => current = next,
            None => {}
        }
    }

    Some(UNKNOWN_ERROR.to_string())
}

/// Count messages per bucket, keeping buckets in first-seen order.
pub fn cluster<I, S>(messages: I) -> ErrorTypeMetrics
where
    I: IntoIterator<Item = Option<S>>,
    S: AsRef<str>,
{
    let mut metrics = ErrorTypeMetrics::default();
    let mut index: HashMap<String, usize> = HashMap::new();

    for message in messages {
        let text: Option<&str> = message.as_ref().map(|m| m.as_ref());
        let Some(bucket) = canonicalize(text) else {
            continue;
        };
        match index.get(&bucket) {
            Some(&i) => metrics.values[i] += 1,
            None => {
                index.insert(bucket.clone(), metrics.labels.len());
                metrics.labels.push(bucket);
                metrics.values.push(1);
            }
        }
    }

    metrics
}

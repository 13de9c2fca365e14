//! Flood and quality filtering.
//!
//! A message survives only if its minute bucket is not a flood, its text is
//! short, link-free and written (at least partly) in the target script. The
//! flood count is taken over the whole unfiltered input.

use crate::config::PipelineConfig;
use replypack_types::Message;
use std::collections::HashMap;

const LINK_MARKER: &str = "://";

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FilterStats {
    pub kept: usize,
    pub flood: usize,
    pub too_long: usize,
    pub links: usize,
    pub wrong_script: usize,
}

impl FilterStats {
    pub fn dropped(&self) -> usize {
        self.flood + self.too_long + self.links + self.wrong_script
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Flood,
    TooLong,
    Link,
    WrongScript,
}

pub fn minute_counts(messages: &[Message]) -> HashMap<i64, usize> {
    let mut counts = HashMap::new();
    for message in messages {
        *counts.entry(message.minute_key()).or_insert(0) += 1;
    }
    counts
}

/// First failing predicate for `message`, or `None` when it is kept.
pub fn rejection(
    message: &Message,
    counts: &HashMap<i64, usize>,
    config: &PipelineConfig,
) -> Option<Rejection> {
    let bucket = counts.get(&message.minute_key()).copied().unwrap_or(0);
    if bucket > config.flood_threshold {
        return Some(Rejection::Flood);
    }
    if message.text.chars().count() >= config.max_text_chars {
        return Some(Rejection::TooLong);
    }
    if message.text.contains(LINK_MARKER) {
        return Some(Rejection::Link);
    }
    if !config.script.is_present_in(&message.text) {
        return Some(Rejection::WrongScript);
    }
    None
}

/// Keep the surviving messages in their original order.
pub fn filter_messages(
    messages: Vec<Message>,
    config: &PipelineConfig,
) -> (Vec<Message>, FilterStats) {
    let counts = minute_counts(&messages);
    let mut stats = FilterStats::default();

    let kept: Vec<Message> = messages
        .into_iter()
        .filter(|m| match rejection(m, &counts, config) {
            None => true,
            Some(Rejection::Flood) => {
                stats.flood += 1;
                false
            }
            Some(Rejection::TooLong) => {
                stats.too_long += 1;
                false
            }
            Some(Rejection::Link) => {
                stats.links += 1;
                false
            }
            Some(Rejection::WrongScript) => {
                stats.wrong_script += 1;
                false
            }
        })
        .collect();

    stats.kept = kept.len();
    (kept, stats)
}

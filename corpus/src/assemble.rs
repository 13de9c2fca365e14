//! Turn enumerated windows into shuffled training samples.

use crate::windows::Window;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use regex::Regex;
use replypack_types::{Message, Sample, Turn};

/// Secondary rendering of a message body, stored as `processed_body`.
/// Must be pure: it is called once per message per sample.
pub trait TextProcessor: Send + Sync {
    fn process(&self, text: &str) -> String;
}

impl<F> TextProcessor for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn process(&self, text: &str) -> String {
        self(text)
    }
}

/// Leaves the body untouched.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainText;

impl TextProcessor for PlainText {
    fn process(&self, text: &str) -> String {
        text.to_string()
    }
}

/// Lowercase, with punctuation split off into separate tokens.
pub struct SpacedLowercase {
    punctuation: Regex,
    whitespace: Regex,
}

impl SpacedLowercase {
    pub fn new() -> Self {
        Self {
            punctuation: Regex::new(r#"([.,!?;:()"«»…])"#).expect("punctuation pattern"),
            whitespace: Regex::new(r"\s+").expect("whitespace pattern"),
        }
    }
}

impl Default for SpacedLowercase {
    fn default() -> Self {
        Self::new()
    }
}

impl TextProcessor for SpacedLowercase {
    fn process(&self, text: &str) -> String {
        let lowered = text.to_lowercase();
        let spaced = self.punctuation.replace_all(&lowered, " $1 ");
        self.whitespace.replace_all(spaced.trim(), " ").into_owned()
    }
}

pub fn to_turn(message: &Message, processor: &dyn TextProcessor) -> Turn {
    Turn {
        body: message.text.clone(),
        processed_body: processor.process(&message.text),
        author: message.author_id.clone(),
    }
}

/// One sample per window, turns in window order (oldest first).
pub fn assemble_samples(
    messages: &[Message],
    windows: &[Window],
    processor: &dyn TextProcessor,
) -> Vec<Sample> {
    windows
        .iter()
        .map(|window| {
            window
                .iter()
                .map(|&idx| to_turn(&messages[idx], processor))
                .collect()
        })
        .collect()
}

/// Uniformly permute sample order. Turns inside a sample keep their order.
pub fn shuffle_samples(samples: &mut [Sample], seed: Option<u64>) {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    samples.shuffle(&mut rng);
}

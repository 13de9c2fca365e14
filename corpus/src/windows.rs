//! Context-window enumeration over the implicit reply graph.
//!
//! Every message is a potential window end. From there we walk backwards
//! through its reply parents, one branch per parent, until the path holds
//! `context_len + 1` messages. A message without parents is treated as a reply
//! to the message right before it; at index 0 that branch simply dies.
//!
//! Windows are not deduplicated. A heavily forked thread produces one window
//! per distinct ancestor chain.

use crate::config::{PipelineConfig, WindowMode};
use rayon::prelude::*;
use replypack_types::Message;
use std::collections::HashMap;

/// Indices into the filtered message slice, oldest first.
pub type Window = Vec<usize>;

/// id -> position in the filtered sequence. The only graph structure we build.
#[derive(Debug, Default)]
pub struct ReplyIndex {
    by_id: HashMap<i64, usize>,
}

impl ReplyIndex {
    /// On duplicate ids the later message wins.
    pub fn new(messages: &[Message]) -> Self {
        let by_id = messages
            .iter()
            .enumerate()
            .map(|(idx, m)| (m.id, idx))
            .collect();
        Self { by_id }
    }

    pub fn get(&self, id: i64) -> Option<usize> {
        self.by_id.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

/// All reply windows, ordered by end index and then by parent order.
///
/// `messages` should already be link-resolved. Parent ids missing from the
/// slice are skipped, and the message still does not fall back to its
/// predecessor.
pub fn enumerate_windows(messages: &[Message], context_len: usize) -> Vec<Window> {
    let index = ReplyIndex::new(messages);
    let mut out = Vec::new();
    for end in 0..messages.len() {
        windows_ending_at(messages, &index, end, context_len, &mut out);
    }
    out
}

/// Same output as [`enumerate_windows`], with window ends fanned out over rayon.
pub fn enumerate_windows_parallel(messages: &[Message], context_len: usize) -> Vec<Window> {
    let index = ReplyIndex::new(messages);
    let per_end: Vec<Vec<Window>> = (0..messages.len())
        .into_par_iter()
        .map(|end| {
            let mut out = Vec::new();
            windows_ending_at(messages, &index, end, context_len, &mut out);
            out
        })
        .collect();
    per_end.into_iter().flatten().collect()
}

pub fn windows_ending_at(
    messages: &[Message],
    index: &ReplyIndex,
    end: usize,
    context_len: usize,
    out: &mut Vec<Window>,
) {
    let window_len = context_len.saturating_add(1);
    let mut path = vec![end];
    extend_path(messages, index, &mut path, window_len, out);
}

fn extend_path(
    messages: &[Message],
    index: &ReplyIndex,
    path: &mut Vec<usize>,
    window_len: usize,
    out: &mut Vec<Window>,
) {
    if path.len() >= window_len {
        out.push(path.iter().rev().copied().collect());
        return;
    }
    let Some(&last) = path.last() else {
        return;
    };

    let message = &messages[last];
    if !message.has_parents() {
        // Fallback edge: reply to whatever came just before.
        let Some(prev) = last.checked_sub(1) else {
            return;
        };
        path.push(prev);
        extend_path(messages, index, path, window_len, out);
        path.pop();
        return;
    }

    for &parent_id in &message.parent_ids {
        let Some(parent) = index.get(parent_id) else {
            continue;
        };
        path.push(parent);
        extend_path(messages, index, path, window_len, out);
        path.pop();
    }
}

/// Every contiguous run of `context_len + 1` messages, ignoring reply links.
///
/// The run ending at the last message is included, so `len` messages give
/// `len - context_len` windows.
pub fn sequential_windows(len: usize, context_len: usize) -> Vec<Window> {
    let window_len = context_len.saturating_add(1);
    if len < window_len {
        return Vec::new();
    }
    (window_len..=len)
        .map(|end| (end - window_len..end).collect())
        .collect()
}

/// Windows for `messages` as selected by `config`.
pub fn build_windows(messages: &[Message], config: &PipelineConfig) -> Vec<Window> {
    match (config.window_mode, config.parallel) {
        (WindowMode::Sequential, _) => sequential_windows(messages.len(), config.context_len),
        (WindowMode::Replies, false) => enumerate_windows(messages, config.context_len),
        (WindowMode::Replies, true) => enumerate_windows_parallel(messages, config.context_len),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::links::resolve_links;
    use chrono::{Duration, TimeZone, Utc};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use serde_json::json;

    fn msg(id: i64, parents: &[i64]) -> Message {
        let base = Utc.with_ymd_and_hms(2016, 4, 1, 12, 0, 0).unwrap();
        Message {
            id,
            text: format!("сообщение {id}"),
            author_id: json!(id),
            timestamp: base + Duration::minutes(id),
            parent_ids: parents.to_vec(),
        }
    }

    fn ids(messages: &[Message], windows: &[Window]) -> Vec<Vec<i64>> {
        windows
            .iter()
            .map(|w| w.iter().map(|&i| messages[i].id).collect())
            .collect()
    }

    /// The five-message thread: 3 replies to 1, 4 has no marker, 5 replies to 2 and 4.
    fn scenario() -> Vec<Message> {
        vec![msg(1, &[]), msg(2, &[]), msg(3, &[1]), msg(4, &[]), msg(5, &[2, 4])]
    }

    fn linked(messages: &[Message], earlier: usize, later: usize) -> bool {
        let child = &messages[later];
        if child.parent_ids.is_empty() {
            earlier + 1 == later
        } else {
            child.parent_ids.contains(&messages[earlier].id)
        }
    }

    fn random_thread(seed: u64, len: i64) -> Vec<Message> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut messages: Vec<Message> = (1..=len)
            .map(|id| {
                let fanout = rng.gen_range(0..4);
                let parents: Vec<i64> = (0..fanout).map(|_| rng.gen_range(1..=len + 3)).collect();
                msg(id, &parents)
            })
            .collect();
        resolve_links(&mut messages);
        messages
    }

    #[test]
    fn scenario_yields_fallback_and_fork_windows() {
        let messages = scenario();
        let index = ReplyIndex::new(&messages);
        let mut out = Vec::new();
        for end in 2..5 {
            windows_ending_at(&messages, &index, end, 1, &mut out);
        }
        assert_eq!(
            ids(&messages, &out),
            vec![vec![1, 3], vec![3, 4], vec![2, 5], vec![4, 5]]
        );
    }

    #[test]
    fn scenario_full_run_includes_second_message_fallback() {
        let messages = scenario();
        let windows = enumerate_windows(&messages, 1);
        assert_eq!(
            ids(&messages, &windows),
            vec![vec![1, 2], vec![1, 3], vec![3, 4], vec![2, 5], vec![4, 5]]
        );
    }

    #[test]
    fn first_message_without_parents_yields_nothing() {
        let messages = scenario();
        let index = ReplyIndex::new(&messages);
        let mut out = Vec::new();
        windows_ending_at(&messages, &index, 0, 1, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn chains_shorter_than_window_are_pruned() {
        // Ending at 2 or 3 the chain hits index 0 after two messages.
        let messages = scenario();
        let windows = enumerate_windows(&messages, 2);
        assert_eq!(
            ids(&messages, &windows),
            vec![vec![1, 3, 4], vec![1, 2, 5], vec![3, 4, 5]]
        );
    }

    #[test]
    fn fork_at_every_step_multiplies_windows() {
        let messages = vec![
            msg(1, &[]),
            msg(2, &[]),
            msg(3, &[1, 2]),
            msg(4, &[1, 2]),
            msg(5, &[3, 4]),
        ];
        let index = ReplyIndex::new(&messages);
        let mut out = Vec::new();
        windows_ending_at(&messages, &index, 4, 2, &mut out);
        assert_eq!(
            ids(&messages, &out),
            vec![vec![1, 3, 5], vec![2, 3, 5], vec![1, 4, 5], vec![2, 4, 5]]
        );
    }

    #[test]
    fn unknown_parent_does_not_trigger_fallback() {
        let messages = vec![msg(1, &[]), msg(2, &[99])];
        assert!(enumerate_windows(&messages, 1).is_empty());
    }

    #[test]
    fn every_window_has_fixed_length_and_valid_edges() {
        let messages = random_thread(7, 60);
        for context_len in 1..=4 {
            let windows = enumerate_windows(&messages, context_len);
            assert!(!windows.is_empty());
            for window in &windows {
                assert_eq!(window.len(), context_len + 1);
                for pair in window.windows(2) {
                    assert!(linked(&messages, pair[0], pair[1]), "bad edge {pair:?}");
                }
            }
        }
    }

    #[test]
    fn enumeration_is_deterministic() {
        let messages = random_thread(11, 80);
        assert_eq!(enumerate_windows(&messages, 3), enumerate_windows(&messages, 3));
    }

    #[test]
    fn parallel_matches_sequential_order() {
        let messages = random_thread(23, 200);
        assert_eq!(
            enumerate_windows_parallel(&messages, 3),
            enumerate_windows(&messages, 3)
        );
    }

    #[test]
    fn sequential_windows_cover_every_run() {
        assert_eq!(
            sequential_windows(5, 2),
            vec![vec![0, 1, 2], vec![1, 2, 3], vec![2, 3, 4]]
        );
        assert!(sequential_windows(2, 2).is_empty());
        assert_eq!(sequential_windows(3, 2), vec![vec![0, 1, 2]]);
    }

    #[test]
    fn build_windows_follows_mode() {
        let messages = scenario();
        let sequential = PipelineConfig {
            context_len: 1,
            window_mode: WindowMode::Sequential,
            ..Default::default()
        };
        assert_eq!(build_windows(&messages, &sequential).len(), 4);

        let replies = PipelineConfig {
            context_len: 1,
            parallel: true,
            ..Default::default()
        };
        assert_eq!(build_windows(&messages, &replies), enumerate_windows(&messages, 1));
    }

    #[test]
    fn oversized_context_len_yields_nothing_without_allocating() {
        let messages = scenario();
        assert!(enumerate_windows(&messages, usize::MAX).is_empty());
        assert!(sequential_windows(messages.len(), usize::MAX).is_empty());
    }

    #[test]
    fn sequential_windows_include_run_ending_at_last_message() {
        let windows = sequential_windows(5, 2);
        assert_eq!(windows.len(), 5 - 2);
        assert_eq!(windows.last(), Some(&vec![2, 3, 4]));
    }

    #[test]
    fn duplicate_ids_resolve_to_last_occurrence() {
        let messages = vec![msg(1, &[]), msg(1, &[]), msg(2, &[1])];
        let index = ReplyIndex::new(&messages);
        assert_eq!(index.get(1), Some(1));
        assert_eq!(index.len(), 2);
    }
}

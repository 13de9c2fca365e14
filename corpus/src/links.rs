use replypack_types::Message;
use std::collections::HashSet;

/// Restrict every `parent_ids` to ids present in `messages`, in place.
///
/// The result is duplicate-free and keeps first-appearance order. Returns the
/// number of references removed (dangling ones plus repeats).
pub fn resolve_links(messages: &mut [Message]) -> usize {
    let known: HashSet<i64> = messages.iter().map(|m| m.id).collect();
    let mut removed = 0;

    for message in messages.iter_mut() {
        let before = message.parent_ids.len();
        let mut seen = HashSet::with_capacity(before);
        message
            .parent_ids
            .retain(|id| known.contains(id) && seen.insert(*id));
        removed += before - message.parent_ids.len();
    }
    removed
}

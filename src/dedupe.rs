use std::collections::HashSet;

use crate::data::RankingItem;

/// Append `incoming` to `existing`, dropping every item whose id was already seen.
///
/// Order of both sequences is preserved, so merging the same page twice is a no-op.
pub fn merge(existing: Vec<RankingItem>, incoming: Vec<RankingItem>) -> Vec<RankingItem> {
    let mut seen: HashSet<u64> = existing.iter().map(|item| item.id).collect();
    let mut merged = existing;
    merged.extend(incoming.into_iter().filter(|item| seen.insert(item.id)));
    merged
}

/// Flatten pages into one id-unique sequence in first-seen order
pub fn merge_pages<I>(pages: I) -> Vec<RankingItem>
where
    I: IntoIterator<Item = Vec<RankingItem>>,
{
    pages.into_iter().fold(Vec::new(), merge)
}

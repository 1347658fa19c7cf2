//! Bounded top-k selection.

use crate::{DocId, ScoredDoc};
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Return the `k` best `(doc_id, score)` candidates, best first.
///
/// Keeps a min-heap of at most `k` entries, so the cost is O(n log k). Equal
/// scores are ordered by ascending doc id, which also decides ties at the
/// k-th boundary.
pub fn select<I>(doc_scores: I, k: usize) -> Vec<ScoredDoc>
where
    I: IntoIterator<Item = (DocId, f64)>,
{
    if k == 0 {
        return Vec::new();
    }
    let mut heap: BinaryHeap<Reverse<ScoredDoc>> = BinaryHeap::with_capacity(k);
    for (doc_id, score) in doc_scores {
        let candidate = ScoredDoc { score, doc_id };
        if heap.len() < k {
            heap.push(Reverse(candidate));
        } else if let Some(mut min) = heap.peek_mut() {
            if candidate > min.0 {
                *min = Reverse(candidate);
            }
        }
    }
    // ascending order of Reverse is descending order of hits
    heap.into_sorted_vec().into_iter().map(|Reverse(hit)| hit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn brute_force(scores: &[(DocId, f64)], k: usize) -> Vec<ScoredDoc> {
        let mut all: Vec<ScoredDoc> = scores.iter().map(|&(doc_id, score)| ScoredDoc { score, doc_id }).collect();
        all.sort_by(|a, b| b.cmp(a));
        all.truncate(k);
        all
    }

    #[test]
    fn returns_best_first() {
        let scores = vec![(0, 0.2), (1, 0.9), (2, 0.5), (3, 0.1)];
        let top = select(scores, 2);
        assert_eq!(top, vec![ScoredDoc { score: 0.9, doc_id: 1 }, ScoredDoc { score: 0.5, doc_id: 2 }]);
    }

    #[test]
    fn fewer_candidates_than_k() {
        let top = select(vec![(4, 1.0), (7, 3.0)], 10);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].doc_id, 7);
    }

    #[test]
    fn zero_k_or_no_candidates() {
        assert!(select(vec![(0, 1.0)], 0).is_empty());
        assert!(select(Vec::<(DocId, f64)>::new(), 3).is_empty());
    }

    #[test]
    fn ties_prefer_lower_doc_id() {
        let top = select(vec![(5, 1.0), (2, 1.0), (9, 1.0), (1, 0.5)], 2);
        assert_eq!(top.iter().map(|h| h.doc_id).collect::<Vec<_>>(), vec![2, 5]);
    }

    #[test]
    fn matches_brute_force() {
        // deterministic pseudo-random scores with plenty of duplicates
        let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
        let mut scores: HashMap<DocId, f64> = HashMap::new();
        for doc_id in 0..500u32 {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            scores.insert(doc_id, (seed % 97) as f64 / 7.0);
        }
        let pairs: Vec<(DocId, f64)> = scores.into_iter().collect();
        for k in [1, 3, 10, 50, 499, 500, 800] {
            let top = select(pairs.clone(), k);
            assert_eq!(top.len(), k.min(pairs.len()));
            assert!(top.windows(2).all(|w| w[0].score >= w[1].score));
            assert_eq!(top, brute_force(&pairs, k));
        }
    }
}

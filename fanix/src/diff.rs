//! Edit scripts between keyed sequences.
//!
//! [`diff`] computes a minimal list of removals and insertions transforming one sequence into another,
//! based on the longest common subsequence of their keys. Elements in the common subsequence stay in
//! place; everything else is removed and then inserted. An element that merely moved shows up as a
//! removal *and* an insertion of the same key, which lets callers recycle whatever was attached to the
//! removed element.
use similar::{
    algorithms::{myers, Capture},
    DiffTag,
};

/// Kind of an edit operation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Remove the element at the specified position.
    Remove,
    /// Insert the element at the specified position.
    Insert,
}

/// One step of an edit script.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Edit<T> {
    /// Position of the change, in the sequence as it is when the edit is applied.
    pub index: usize,
    pub op: Operation,
    /// The removed or inserted element.
    pub item: T,
}

impl<T> Edit<T> {
    pub fn is_remove(&self) -> bool {
        self.op == Operation::Remove
    }

    pub fn is_insert(&self) -> bool {
        self.op == Operation::Insert
    }
}

/// Computes the edit script transforming `old` into `new`, comparing elements by `key_of`.
///
/// Applying the edits in order (see [`apply`]) to `old` yields `new`. All removals come first, by
/// descending index, followed by all insertions by ascending index: when a key is relocated, its
/// removal is always seen before its insertion.
pub fn diff<T, K>(old: &[T], new: &[T], key_of: impl Fn(&T) -> K) -> Vec<Edit<T>>
where
    T: Clone,
    K: PartialEq,
{
    let old_keys: Vec<K> = old.iter().map(&key_of).collect();
    let new_keys: Vec<K> = new.iter().map(&key_of).collect();
    let (keep_old, keep_new) = common_subsequence(&old_keys, &new_keys);

    let mut edits = Vec::new();
    for (i, _) in keep_old.iter().enumerate().rev().filter(|(_, keep)| !**keep) {
        edits.push(Edit {
            index: i,
            op: Operation::Remove,
            item: old[i].clone(),
        });
    }
    for (j, _) in keep_new.iter().enumerate().filter(|(_, keep)| !**keep) {
        edits.push(Edit {
            index: j,
            op: Operation::Insert,
            item: new[j].clone(),
        });
    }
    edits
}

/// Computes the edit script between two key lists.
pub fn diff_keys<K: Clone + PartialEq>(old: &[K], new: &[K]) -> Vec<Edit<K>> {
    diff(old, new, K::clone)
}

/// Applies an edit script to a vector.
///
/// # Panics
///
/// If an edit index is out of bounds, i.e. the script wasn't computed for this vector.
pub fn apply<T: Clone>(seq: &mut Vec<T>, edits: &[Edit<T>]) {
    for edit in edits {
        match edit.op {
            Operation::Remove => {
                seq.remove(edit.index);
            }
            Operation::Insert => seq.insert(edit.index, edit.item.clone()),
        }
    }
}

/// Marks the elements of `a` and `b` that belong to one of their longest common subsequences.
///
/// Runs Myers' algorithm, in linear space.
fn common_subsequence<K: PartialEq>(a: &[K], b: &[K]) -> (Vec<bool>, Vec<bool>) {
    let mut capture = Capture::new();
    myers::diff(&mut capture, a, 0..a.len(), b, 0..b.len()).unwrap_or_else(|never| match never {});

    let mut keep_a = vec![true; a.len()];
    let mut keep_b = vec![true; b.len()];
    for op in capture.into_ops() {
        let (tag, old_range, new_range) = op.as_tag_tuple();
        match tag {
            DiffTag::Equal => {}
            DiffTag::Delete | DiffTag::Insert | DiffTag::Replace => {
                keep_a[old_range].fill(false);
                keep_b[new_range].fill(false);
            }
        }
    }
    (keep_a, keep_b)
}

#[cfg(test)]
mod tests {
    use super::{apply, diff, diff_keys, Edit, Operation};
    use rand::{thread_rng, Rng};

    fn check(old: &[char], new: &[char]) -> Vec<Edit<char>> {
        let edits = diff_keys(old, new);
        let mut result = old.to_vec();
        apply(&mut result, &edits);
        assert_eq!(result, new, "edits {edits:?} don't transform {old:?} into {new:?}");
        edits
    }

    fn lcs_len(a: &[char], b: &[char]) -> usize {
        let mut prev = vec![0usize; b.len() + 1];
        for x in a {
            let mut cur = vec![0usize; b.len() + 1];
            for (j, y) in b.iter().enumerate() {
                cur[j + 1] = if x == y { prev[j] + 1 } else { prev[j + 1].max(cur[j]) };
            }
            prev = cur;
        }
        prev[b.len()]
    }

    #[test]
    fn identical_sequences_produce_no_edits() {
        assert!(check(&['a', 'b', 'c'], &['a', 'b', 'c']).is_empty());
        assert!(check(&[], &[]).is_empty());
    }

    #[test]
    fn rotation_relocates_one_key() {
        let edits = check(&['a', 'b', 'c'], &['c', 'a', 'b']);
        assert_eq!(
            edits,
            vec![
                Edit {
                    index: 2,
                    op: Operation::Remove,
                    item: 'c'
                },
                Edit {
                    index: 0,
                    op: Operation::Insert,
                    item: 'c'
                },
            ]
        );
    }

    #[test]
    fn swap_is_a_single_relocation() {
        let edits = check(&['a', 'b'], &['b', 'a']);
        assert_eq!(edits.len(), 2);
        assert!(edits[0].is_remove());
        assert!(edits[1].is_insert());
        assert_eq!(edits[0].item, edits[1].item);
    }

    #[test]
    fn pure_insertions_and_removals() {
        let edits = check(&['a', 'c'], &['a', 'b', 'c', 'd']);
        assert!(edits.iter().all(Edit::is_insert));
        assert_eq!(edits.len(), 2);

        let edits = check(&['a', 'b', 'c'], &['b']);
        assert!(edits.iter().all(Edit::is_remove));
        assert_eq!(edits.len(), 2);

        check(&[], &['x', 'y']);
        check(&['x', 'y'], &[]);
    }

    #[test]
    fn duplicate_keys() {
        check(&['a', 'a', 'b'], &['a', 'b', 'a']);
        check(&['a', 'b', 'a', 'b'], &['b', 'b', 'a', 'a']);
    }

    #[test]
    fn key_function_is_used_for_matching() {
        let old = [(1, "one"), (2, "two")];
        let new = [(2, "deux"), (1, "un")];
        let edits = diff(&old, &new, |(k, _)| *k);
        assert_eq!(edits.len(), 2);
        let mut result = old.to_vec();
        apply(&mut result, &edits);
        // the relocated element comes from `new`, the kept one from `old`
        assert_eq!(result.iter().map(|(k, _)| *k).collect::<Vec<_>>(), vec![2, 1]);
    }

    #[test]
    fn reversing_a_long_list() {
        let old: Vec<u32> = (0..1000).collect();
        let new: Vec<u32> = old.iter().rev().copied().collect();
        let edits = diff_keys(&old, &new);
        assert_eq!(edits.len(), 2 * (old.len() - 1));
        let mut result = old.clone();
        apply(&mut result, &edits);
        assert_eq!(result, new);
    }

    #[test]
    fn stress_test() {
        let mut rng = thread_rng();
        let alphabet = ['a', 'b', 'c', 'd', 'e', 'f'];

        for _ in 0..500 {
            let old: Vec<char> = (0..rng.gen_range(0..12))
                .map(|_| alphabet[rng.gen_range(0..alphabet.len())])
                .collect();
            let new: Vec<char> = (0..rng.gen_range(0..12))
                .map(|_| alphabet[rng.gen_range(0..alphabet.len())])
                .collect();
            let edits = check(&old, &new);

            // minimal: everything outside one LCS is touched exactly once
            let common = lcs_len(&old, &new);
            assert_eq!(edits.iter().filter(|e| e.is_remove()).count(), old.len() - common);
            assert_eq!(edits.iter().filter(|e| e.is_insert()).count(), new.len() - common);

            // removals strictly before insertions
            let first_insert = edits.iter().position(Edit::is_insert).unwrap_or(edits.len());
            assert!(edits[first_insert..].iter().all(Edit::is_insert));
        }
    }
}

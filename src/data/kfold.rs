// ============================================================
// Layer 4 — Stratified K-Fold Splitter
// ============================================================
// Splits an instance collection into k train/validation folds
// while keeping every fold's validation set representative of
// every group (here: every origin dataset).
//
// How the folds are built:
//
//   instances ──group by key──▶ group A: a0 a1 a2 a3 a4
//                               group B: b0 b1 b2
//
//   each group ──slice into k contiguous shards (k = 2)──▶
//                               A: [a0 a1 a2] [a3 a4]
//                               B: [b0 b1]    [b2]
//
//   fold i validation = shard i of every group
//   fold i train      = every other shard of every group
//
//     fold 0: val = a0 a1 a2 b0 b1   train = a3 a4 b2
//     fold 1: val = a3 a4 b2         train = a0 a1 a2 b0 b1
//
// Shard sizes: a group of n instances gives the first n % k
// shards ceil(n/k) instances and the rest floor(n/k), so the
// per-group count in any two validation sets differs by at most 1.
// Groups smaller than k simply leave some shards empty.
//
// Groups are ordered by first appearance and members keep their
// original relative order, so a split is fully determined by the
// collection, k, the grouping function and (optionally) a seed.
//
// Reference: Rust Book §13 (Iterators and Closures)
//            rand crate documentation (seeded StdRng)

use std::{collections::HashMap, hash::Hash, ops::Range};

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use crate::domain::error::ConfigurationError;

/// One train/validation split. Instances are borrowed from the
/// collection the splitter was built over; nothing is copied.
#[derive(Debug, Clone)]
pub struct Fold<'a, T> {
    pub index:      usize,
    pub train:      Vec<&'a T>,
    pub validation: Vec<&'a T>,
}

/// Instances sharing one group key, as indices into the collection.
#[derive(Debug, Clone)]
struct Group<K> {
    key:     K,
    members: Vec<usize>,
}

/// Group-aware k-fold splitter.
///
/// Built once over a borrowed collection; iterating it yields exactly
/// `k` folds in index order, and iterating again yields the same folds.
#[derive(Debug, Clone)]
pub struct StratifiedKFold<'a, T, K> {
    instances: &'a [T],
    k:         usize,
    groups:    Vec<Group<K>>,
}

impl<'a, T, K> StratifiedKFold<'a, T, K>
where
    K: Eq + Hash + Clone,
{
    /// Group `instances` with `grouping` and prepare `k` folds.
    ///
    /// Fails if `k < 2`, if the collection is empty, or if `grouping`
    /// returns `None` for any instance.
    pub fn new<F>(instances: &'a [T], k: usize, grouping: F) -> Result<Self, ConfigurationError>
    where
        F: Fn(&T) -> Option<K>,
    {
        if k < 2 {
            return Err(ConfigurationError::InvalidFoldCount { k });
        }
        if instances.is_empty() {
            return Err(ConfigurationError::EmptyCollection);
        }

        let mut groups: Vec<Group<K>>   = Vec::new();
        let mut slot:   HashMap<K, usize> = HashMap::new();

        for (index, instance) in instances.iter().enumerate() {
            let key = grouping(instance)
                .ok_or(ConfigurationError::MissingGroupKey { index })?;

            let g = match slot.get(&key) {
                Some(&g) => g,
                None => {
                    slot.insert(key.clone(), groups.len());
                    groups.push(Group { key, members: Vec::new() });
                    groups.len() - 1
                }
            };
            groups[g].members.push(index);
        }

        tracing::debug!(
            "Stratified {}-fold over {} instances in {} groups",
            k,
            instances.len(),
            groups.len()
        );

        Ok(Self { instances, k, groups })
    }

    /// Permute each group's members with a generator seeded from `seed`
    /// before slicing. The same seed always gives the same folds.
    pub fn with_shuffle(mut self, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        for group in &mut self.groups {
            group.members.shuffle(&mut rng);
        }
        self
    }

    /// Number of folds
    pub fn k(&self) -> usize {
        self.k
    }

    /// Number of distinct group keys discovered
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Group keys in discovery order
    pub fn group_keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.groups.iter().map(|g| &g.key)
    }

    /// Build fold `index`, or `None` if `index >= k`.
    pub fn fold(&self, index: usize) -> Option<Fold<'a, T>> {
        if index >= self.k {
            return None;
        }

        let mut train      = Vec::with_capacity(self.instances.len());
        let mut validation = Vec::new();

        // Validation: shard `index` of every group, in group order.
        for group in &self.groups {
            let range = shard_range(group.members.len(), self.k, index);
            validation.extend(group.members[range].iter().map(|&i| &self.instances[i]));
        }

        // Train: every other shard, group order then shard order.
        for group in &self.groups {
            for shard in (0..self.k).filter(|&s| s != index) {
                let range = shard_range(group.members.len(), self.k, shard);
                train.extend(group.members[range].iter().map(|&i| &self.instances[i]));
            }
        }

        Some(Fold { index, train, validation })
    }

    /// How many instances of each group land in fold `index`'s validation set.
    pub fn group_counts(&self, index: usize) -> Vec<(&K, usize)> {
        self.groups
            .iter()
            .map(|g| (&g.key, shard_range(g.members.len(), self.k, index).len()))
            .collect()
    }

    /// Iterate over all `k` folds in index order.
    pub fn iter(&self) -> Folds<'_, 'a, T, K> {
        Folds { splitter: self, next: 0 }
    }
}

/// Contiguous range of shard `i` when `n` items are cut into `k` shards.
/// The first `n % k` shards get one extra item.
fn shard_range(n: usize, k: usize, i: usize) -> Range<usize> {
    let base  = n / k;
    let extra = n % k;
    let start = i * base + i.min(extra);
    let len   = base + usize::from(i < extra);
    start..start + len
}

/// Iterator over the folds of a [`StratifiedKFold`].
pub struct Folds<'s, 'a, T, K> {
    splitter: &'s StratifiedKFold<'a, T, K>,
    next:     usize,
}

impl<'s, 'a, T, K> Iterator for Folds<'s, 'a, T, K>
where
    K: Eq + Hash + Clone,
{
    type Item = Fold<'a, T>;

    fn next(&mut self) -> Option<Self::Item> {
        let fold = self.splitter.fold(self.next)?;
        self.next += 1;
        Some(fold)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.splitter.k.saturating_sub(self.next);
        (left, Some(left))
    }
}

impl<'s, 'a, T, K> ExactSizeIterator for Folds<'s, 'a, T, K> where K: Eq + Hash + Clone {}

impl<'s, 'a, T, K> IntoIterator for &'s StratifiedKFold<'a, T, K>
where
    K: Eq + Hash + Clone,
{
    type Item     = Fold<'a, T>;
    type IntoIter = Folds<'s, 'a, T, K>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    /// (id, group) pairs: ids are unique so folds can be compared as sets
    fn items(groups: &[(&'static str, usize)]) -> Vec<(usize, &'static str)> {
        let mut out = Vec::new();
        for &(g, n) in groups {
            for _ in 0..n {
                out.push((out.len(), g));
            }
        }
        out
    }

    fn group_of(item: &(usize, &'static str)) -> Option<&'static str> {
        Some(item.1)
    }

    fn ids(v: &[&(usize, &'static str)]) -> Vec<usize> {
        v.iter().map(|x| x.0).collect()
    }

    #[test]
    fn test_shard_range_sizes() {
        // 7 into 3 → 3, 2, 2
        assert_eq!(shard_range(7, 3, 0), 0..3);
        assert_eq!(shard_range(7, 3, 1), 3..5);
        assert_eq!(shard_range(7, 3, 2), 5..7);
        // 1 into 5 → only the first shard is non-empty
        assert_eq!(shard_range(1, 5, 0).len(), 1);
        for i in 1..5 {
            assert!(shard_range(1, 5, i).is_empty());
        }
    }

    #[test]
    fn test_yields_exactly_k_folds() {
        let data = items(&[("a", 10), ("b", 7)]);
        let kf   = StratifiedKFold::new(&data, 4, group_of).unwrap();
        assert_eq!(kf.iter().len(), 4);
        let indices: Vec<usize> = kf.iter().map(|f| f.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
        assert!(kf.fold(4).is_none());
    }

    #[test]
    fn test_partition_property() {
        let data = items(&[("a", 11), ("b", 3), ("c", 8)]);
        let kf   = StratifiedKFold::new(&data, 5, group_of).unwrap();

        for fold in &kf {
            let mut all = ids(&fold.train);
            all.extend(ids(&fold.validation));
            all.sort_unstable();
            // Union is the whole collection with no duplicates → disjoint too
            assert_eq!(all, (0..data.len()).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_coverage_property() {
        let data = items(&[("a", 9), ("b", 4)]);
        let k    = 3;
        let kf   = StratifiedKFold::new(&data, k, group_of).unwrap();

        let mut val_hits   = vec![0usize; data.len()];
        let mut train_hits = vec![0usize; data.len()];
        for fold in &kf {
            for id in ids(&fold.validation) { val_hits[id] += 1; }
            for id in ids(&fold.train)      { train_hits[id] += 1; }
        }
        assert!(val_hits.iter().all(|&n| n == 1));
        assert!(train_hits.iter().all(|&n| n == k - 1));
    }

    #[test]
    fn test_stratification_property() {
        let data = items(&[("a", 23), ("b", 5), ("c", 1), ("d", 10)]);
        let kf   = StratifiedKFold::new(&data, 4, group_of).unwrap();

        for g in ["a", "b", "c", "d"] {
            let counts: Vec<usize> = kf
                .iter()
                .map(|f| f.validation.iter().filter(|x| x.1 == g).count())
                .collect();
            let max = *counts.iter().max().unwrap();
            let min = *counts.iter().min().unwrap();
            assert!(max - min <= 1, "group {g} counts {counts:?}");
        }
    }

    #[test]
    fn test_deterministic() {
        let data = items(&[("a", 6), ("b", 6), ("a", 3)]);
        let kf1  = StratifiedKFold::new(&data, 3, group_of).unwrap();
        let kf2  = StratifiedKFold::new(&data, 3, group_of).unwrap();

        fn run(kf: &StratifiedKFold<'_, (usize, &'static str), &'static str>) -> Vec<(Vec<usize>, Vec<usize>)> {
            kf.iter().map(|f| (ids(&f.train), ids(&f.validation))).collect()
        }
        assert_eq!(run(&kf1), run(&kf2));
        // Re-iterating the same splitter reproduces the folds
        assert_eq!(run(&kf1), run(&kf1));
    }

    #[test]
    fn test_two_groups_two_folds_scenario() {
        // A, B from origin 1; C, D from origin 2
        let data = vec![('A', 1), ('B', 1), ('C', 2), ('D', 2)];
        let kf   = StratifiedKFold::new(&data, 2, |x: &(char, u8)| Some(x.1)).unwrap();

        let names = |v: &[&(char, u8)]| v.iter().map(|x| x.0).collect::<String>();
        let f0 = kf.fold(0).unwrap();
        let f1 = kf.fold(1).unwrap();
        assert_eq!(names(&f0.validation), "AC");
        assert_eq!(names(&f0.train),      "BD");
        assert_eq!(names(&f1.validation), "BD");
        assert_eq!(names(&f1.train),      "AC");
    }

    #[test]
    fn test_groups_keep_discovery_and_member_order() {
        // Interleaved groups: b appears first
        let data = vec![(0, "b"), (1, "a"), (2, "b"), (3, "a"), (4, "b"), (5, "a")];
        let kf   = StratifiedKFold::new(&data, 3, group_of).unwrap();

        assert_eq!(kf.group_keys().copied().collect::<Vec<_>>(), vec!["b", "a"]);
        let f0 = kf.fold(0).unwrap();
        assert_eq!(ids(&f0.validation), vec![0, 1]);
        assert_eq!(ids(&f0.train),      vec![2, 4, 3, 5]);
    }

    #[test]
    fn test_single_item_group_with_five_folds() {
        let data = items(&[("big", 10), ("lonely", 1)]);
        let kf   = StratifiedKFold::new(&data, 5, group_of).unwrap();

        let lonely: Vec<usize> = kf
            .iter()
            .map(|f| f.validation.iter().filter(|x| x.1 == "lonely").count())
            .collect();
        assert_eq!(lonely.iter().sum::<usize>(), 1);
        assert_eq!(lonely.iter().filter(|&&n| n == 0).count(), 4);

        let counts = kf.group_counts(0);
        assert_eq!(counts, vec![(&"big", 2), (&"lonely", 1)]);
    }

    #[test]
    fn test_k_below_two_is_rejected() {
        let data = items(&[("a", 4)]);
        let err  = StratifiedKFold::new(&data, 1, group_of).unwrap_err();
        assert_eq!(err, ConfigurationError::InvalidFoldCount { k: 1 });
        assert!(StratifiedKFold::new(&data, 0, group_of).is_err());
    }

    #[test]
    fn test_empty_collection_is_rejected() {
        let data: Vec<(usize, &'static str)> = Vec::new();
        let err = StratifiedKFold::new(&data, 3, group_of).unwrap_err();
        assert_eq!(err, ConfigurationError::EmptyCollection);
    }

    #[test]
    fn test_missing_group_key_is_rejected() {
        let data = vec![Some("a"), Some("b"), None, Some("a")];
        let err  = StratifiedKFold::new(&data, 2, |x: &Option<&'static str>| *x).unwrap_err();
        assert_eq!(err, ConfigurationError::MissingGroupKey { index: 2 });
    }

    #[test]
    fn test_seeded_shuffle_is_reproducible_and_still_partitions() {
        let data = items(&[("a", 12), ("b", 9)]);
        let kf1  = StratifiedKFold::new(&data, 3, group_of).unwrap().with_shuffle(7);
        let kf2  = StratifiedKFold::new(&data, 3, group_of).unwrap().with_shuffle(7);

        for (a, b) in kf1.iter().zip(kf2.iter()) {
            assert_eq!(ids(&a.validation), ids(&b.validation));
            assert_eq!(ids(&a.train),      ids(&b.train));

            let mut all = ids(&a.train);
            all.extend(ids(&a.validation));
            all.sort_unstable();
            assert_eq!(all, (0..data.len()).collect::<Vec<_>>());
        }
    }
}

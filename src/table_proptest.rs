#![cfg(test)]

// Property tests for ChainedMap kept inside the crate so they can assert
// the structural invariants (count bookkeeping, absent-bucket rule) that
// the public surface does not expose.

use crate::chain::InsertError;
use crate::table::{ChainedMap, LookupError};
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hasher};

// Pool-indexed operations to improve shrinking: indices shrink to earlier
// keys, pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Insert(usize, i32),
    Upsert(usize, i32),
    Update(usize, i32),
    Lookup(usize),
    Contains(usize),
    Remove(usize),
    Iterate,
    Clear,
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=8).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let op = prop_oneof![
            4 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Insert(i, v)),
            4 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Upsert(i, v)),
            3 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Update(i, v)),
            3 => idx.clone().prop_map(OpI::Lookup),
            3 => idx.clone().prop_map(OpI::Contains),
            3 => idx.clone().prop_map(OpI::Remove),
            2 => Just(OpI::Iterate),
            1 => Just(OpI::Clear),
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (pool.clone(), ops))
    })
}

// Shared state-machine body: run the op list against the map under test and
// a std HashMap model, asserting parity plus structural invariants after
// every single operation.
fn run_state_machine<S>(
    mut sut: ChainedMap<String, i32, S>,
    pool: Vec<String>,
    ops: Vec<OpI>,
) -> Result<(), TestCaseError>
where
    S: BuildHasher,
{
    let mut model: HashMap<String, i32> = HashMap::new();

    for op in ops {
        match op {
            OpI::Insert(i, v) => {
                let k = pool[i].clone();
                let already = model.contains_key(&k);
                match sut.insert(k.clone(), v) {
                    Ok(()) => {
                        prop_assert!(!already, "insert must fail on duplicate");
                        model.insert(k, v);
                    }
                    Err(InsertError::DuplicateKey) => {
                        prop_assert!(already, "duplicate error only when key exists");
                        // Failed insert leaves the stored value alone.
                        prop_assert_eq!(sut.lookup(&k).ok(), model.get(&k));
                    }
                }
            }
            OpI::Upsert(i, v) => {
                let k = pool[i].clone();
                sut.upsert(k.clone(), v);
                model.insert(k.clone(), v);
                prop_assert_eq!(sut.lookup(&k), Ok(&v));
            }
            OpI::Update(i, v) => {
                let k = pool[i].clone();
                let present = model.contains_key(&k);
                match sut.update(k.clone(), v) {
                    Ok(()) => {
                        prop_assert!(present, "update succeeds only on present keys");
                        model.insert(k, v);
                    }
                    Err(LookupError::KeyNotFound) => {
                        prop_assert!(!present, "not-found only when key absent");
                    }
                }
            }
            OpI::Lookup(i) => {
                let k = &pool[i];
                prop_assert_eq!(sut.lookup(k).ok(), model.get(k));
            }
            OpI::Contains(i) => {
                let k = &pool[i];
                prop_assert_eq!(sut.contains_key(k), model.contains_key(k));
            }
            OpI::Remove(i) => {
                let k = &pool[i];
                let removed = sut.remove(k);
                prop_assert_eq!(removed, model.remove(k).is_some());
                prop_assert!(!sut.contains_key(k), "removed key is gone");
            }
            OpI::Iterate => {
                let seen: BTreeMap<String, i32> =
                    sut.iter().map(|(k, v)| (k.clone(), *v)).collect();
                prop_assert_eq!(seen.len(), model.len(), "no duplicates, no omissions");
                let want: BTreeMap<String, i32> =
                    model.iter().map(|(k, v)| (k.clone(), *v)).collect();
                prop_assert_eq!(seen, want);
            }
            OpI::Clear => {
                let cap = sut.bucket_count();
                sut.clear();
                model.clear();
                prop_assert_eq!(sut.len(), 0);
                prop_assert_eq!(sut.used_bucket_count(), 0);
                prop_assert_eq!(sut.bucket_count(), cap, "clear keeps capacity");
            }
        }

        // Post-conditions after each op.
        sut.check_invariants();
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
    }
    Ok(())
}

// Property: state-machine equivalence against std::collections::HashMap,
// plus the structural invariants after every mutation:
// - len() equals the sum of chain lengths;
// - used_bucket_count() equals the number of non-absent buckets;
// - an emptied chain reverts to an absent bucket;
// - duplicate insert / absent update fail without side effects.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        // Tiny initial capacity so growth fires often under random inserts.
        let sut: ChainedMap<String, i32> = ChainedMap::with_chain_limit(1, 2);
        run_state_machine(sut, pool, ops)?;
    }
}

// Collision variant: a constant hasher forces every key into one chain,
// stressing full-chain scans, the per-chain growth trigger, and the
// emptied-chain-goes-absent rule under worst-case hashing.
#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        let sut: ChainedMap<String, i32, ConstBuildHasher> =
            ChainedMap::with_hasher(ConstBuildHasher);
        run_state_machine(sut, pool, ops)?;
    }
}

// Property: growth never loses or corrupts entries. Insert enough distinct
// keys into a capacity-1 table to force repeated doublings, then check every
// key still resolves to its original value.
proptest! {
    #![proptest_config(ProptestConfig { cases: 32, .. ProptestConfig::default() })]
    #[test]
    fn prop_growth_preserves_all_entries(n in 1usize..200) {
        let mut sut: ChainedMap<String, usize> = ChainedMap::with_chain_limit(1, 1);
        let before = sut.bucket_count();
        for i in 0..n {
            sut.insert(format!("key-{i}"), i).unwrap();
        }
        sut.check_invariants();
        prop_assert_eq!(sut.len(), n);
        if n > 1 {
            prop_assert!(sut.bucket_count() >= before * 2, "at least one doubling");
        }
        for i in 0..n {
            prop_assert_eq!(sut.lookup(&format!("key-{i}")), Ok(&i));
        }
        // Traversal sees exactly the inserted population.
        prop_assert_eq!(sut.iter().count(), n);
    }
}

extern crate std;

use std::{collections::BTreeMap, mem, pin::Pin, prelude::v1::*, ptr::NonNull};

use arbitrary::Arbitrary;
use cordyceps::Linked;
use proptest::strategy::{Just, Strategy};

use crate::{BstMap, Links, TreeNode};

#[derive(Debug)]
#[repr(C)]
pub struct TestNode {
    pub links: Links<TestNode>,
    pub key: u32,
}

impl TestNode {
    pub fn new(key: u32) -> Box<TestNode> {
        Box::new(TestNode {
            links: Links::new(),
            key,
        })
    }
}

unsafe impl Linked<Links<TestNode>> for TestNode {
    type Handle = Box<TestNode>;

    fn into_ptr(r: Self::Handle) -> NonNull<Self> {
        Box::leak(r).into()
    }

    unsafe fn from_ptr(ptr: NonNull<Self>) -> Self::Handle {
        unsafe { Box::from_raw(ptr.as_ptr()) }
    }

    unsafe fn links(ptr: NonNull<Self>) -> NonNull<Links<TestNode>> {
        // SAFETY: Self is #[repr(C)] and `links` is first field
        ptr.cast()
    }
}

impl TreeNode<Links<TestNode>> for TestNode {
    type Key = u32;

    fn key(&self) -> &Self::Key {
        &self.key
    }

    fn swap_payload(self: Pin<&mut Self>, other: Pin<&mut Self>) {
        // SAFETY: Pinning is not structural for `key`.
        unsafe { mem::swap(&mut self.get_unchecked_mut().key, &mut other.get_unchecked_mut().key) }
    }
}

#[derive(Copy, Clone, Debug, Arbitrary)]
pub enum ItemValue {
    Index(usize),
    Random(u32),
}

proptest::prop_compose! {
    fn index_strategy()(
        index in 0usize..1000,
    ) -> ItemValue {
        ItemValue::Index(index)
    }
}

proptest::prop_compose! {
    fn random_strategy()(
        random in 0u32..1000,
    ) -> ItemValue {
        ItemValue::Random(random)
    }
}

fn value_strategy() -> impl Strategy<Value = ItemValue> {
    proptest::prop_oneof![index_strategy(), random_strategy()]
}

#[derive(Copy, Clone, Debug, Arbitrary)]
pub enum Op {
    Insert(ItemValue, u32),
    Emplace(ItemValue, u16),
    Get(ItemValue),
    Find(ItemValue),
    Subscript(ItemValue),
    Erase(ItemValue),
    First,
    PopFirst,
    Last,
    PopLast,
    Balance,
    Clone,
    Take,
    Clear,
}

impl Op {
    fn finalize(self, sorted: &[u32]) -> FinalOp {
        fn get_value(v: &[u32], i: ItemValue) -> u32 {
            match i {
                ItemValue::Index(idx) if v.is_empty() => idx as u32,
                ItemValue::Index(idx) => v[idx % v.len()],
                ItemValue::Random(v) => v,
            }
        }

        match self {
            Op::Insert(item, value) => FinalOp::Insert(get_value(sorted, item), value),
            Op::Emplace(item, value) => FinalOp::Emplace(get_value(sorted, item), value),
            Op::Get(item) => FinalOp::Get(get_value(sorted, item)),
            Op::Find(item) => FinalOp::Find(get_value(sorted, item)),
            Op::Subscript(item) => FinalOp::Subscript(get_value(sorted, item)),
            Op::Erase(item) => FinalOp::Erase(get_value(sorted, item)),
            Op::First => FinalOp::First,
            Op::PopFirst => FinalOp::PopFirst,
            Op::Last => FinalOp::Last,
            Op::PopLast => FinalOp::PopLast,
            Op::Balance => FinalOp::Balance,
            Op::Clone => FinalOp::Clone,
            Op::Take => FinalOp::Take,
            Op::Clear => FinalOp::Clear,
        }
    }
}

#[derive(Copy, Clone, Debug)]
enum FinalOp {
    Insert(u32, u32),
    Emplace(u32, u16),
    Get(u32),
    Find(u32),
    Subscript(u32),
    Erase(u32),
    First,
    PopFirst,
    Last,
    PopLast,
    Balance,
    Clone,
    Take,
    Clear,
}

pub fn op_strategy() -> impl Strategy<Value = Op> {
    proptest::prop_oneof![
        4 => (value_strategy(), proptest::num::u32::ANY).prop_map(|(k, v)| Op::Insert(k, v)),
        1 => (value_strategy(), proptest::num::u16::ANY).prop_map(|(k, v)| Op::Emplace(k, v)),
        1 => value_strategy().prop_map(Op::Get),
        1 => value_strategy().prop_map(Op::Find),
        1 => value_strategy().prop_map(Op::Subscript),
        2 => value_strategy().prop_map(Op::Erase),
        1 => Just(Op::First),
        1 => Just(Op::PopFirst),
        1 => Just(Op::Last),
        1 => Just(Op::PopLast),
        1 => Just(Op::Balance),
        1 => Just(Op::Clone),
        1 => Just(Op::Take),
        1 => Just(Op::Clear),
    ]
}

/// Applies `ops` to both a [`BstMap`] and a [`BTreeMap`], asserting that they agree after every
/// step.
pub fn run_btree_equivalence(ops: Vec<Op>) {
    let mut sorted_keys = Vec::with_capacity(ops.len());
    let mut btree: BTreeMap<u32, u32> = BTreeMap::new();
    let mut bst: BstMap<u32, u32> = BstMap::new();

    fn insert_sorted(v: &mut Vec<u32>, key: u32) {
        if let Err(idx) = v.binary_search(&key) {
            v.insert(idx, key);
        }
    }

    fn remove_sorted(v: &mut Vec<u32>, key: u32) {
        if let Ok(idx) = v.binary_search(&key) {
            v.remove(idx);
        }
    }

    for (op_id, op) in ops.into_iter().enumerate() {
        let final_op = op.finalize(&sorted_keys);

        match final_op {
            FinalOp::Insert(key, value) => {
                insert_sorted(&mut sorted_keys, key);

                let from_btree = !btree.contains_key(&key);
                btree.entry(key).or_insert(value);

                let (cursor, from_bst) = bst.insert((key, value));
                assert_eq!(cursor.key(), Some(&key), "FinalOp #{op_id}: {final_op:?}");
                assert_eq!(cursor.value(), btree.get(&key), "FinalOp #{op_id}: {final_op:?}");

                assert_eq!(from_btree, from_bst, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::Emplace(key, value) => {
                insert_sorted(&mut sorted_keys, key);

                let from_btree = !btree.contains_key(&key);
                btree.entry(key).or_insert(value.into());

                let (_, from_bst) = bst.emplace(key, value);

                assert_eq!(from_btree, from_bst, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::Get(key) => {
                let from_btree = btree.get(&key);
                let from_bst = bst.get(&key);

                assert_eq!(from_btree, from_bst, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::Find(key) => {
                let from_btree = btree.get_key_value(&key);
                let cursor = bst.find(&key);

                assert_eq!(from_btree, cursor.key_value(), "FinalOp #{op_id}: {final_op:?}");
                assert_eq!(
                    from_btree.is_none(),
                    cursor == bst.cursor_end(),
                    "FinalOp #{op_id}: {final_op:?}"
                );
            }

            FinalOp::Subscript(key) => {
                insert_sorted(&mut sorted_keys, key);

                *btree.entry(key).or_default() += 1;
                *bst.get_or_insert_default(key) += 1;

                assert_eq!(btree.get(&key), bst.get(&key), "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::Erase(key) => {
                remove_sorted(&mut sorted_keys, key);

                let from_btree = btree.remove(&key).is_some();
                let from_bst = bst.erase(&key).is_ok();

                assert_eq!(from_btree, from_bst, "FinalOp #{op_id}: {final_op:?}");
                assert!(!bst.contains_key(&key), "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::First => {
                let from_btree = btree.first_key_value();
                let from_bst = bst.first_key_value();

                assert_eq!(from_btree, from_bst, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::PopFirst => {
                let from_btree = btree.pop_first();
                let from_bst = bst.pop_first();

                if let Some((key, _)) = from_btree {
                    remove_sorted(&mut sorted_keys, key);
                }

                assert_eq!(from_btree, from_bst, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::Last => {
                let from_btree = btree.last_key_value();
                let from_bst = bst.last_key_value();

                assert_eq!(from_btree, from_bst, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::PopLast => {
                let from_btree = btree.pop_last();
                let from_bst = bst.pop_last();

                if let Some((key, _)) = from_btree {
                    remove_sorted(&mut sorted_keys, key);
                }

                assert_eq!(from_btree, from_bst, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::Balance => {
                bst.balance();

                let len = bst.len();
                let min_height = (usize::BITS - len.leading_zeros()) as usize;
                assert_eq!(bst.height(), min_height, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::Clone => {
                let copy = bst.clone();
                copy.assert_invariants();
                assert_eq!(copy, bst, "FinalOp #{op_id}: {final_op:?}");
                assert_eq!(copy.height(), bst.height(), "FinalOp #{op_id}: {final_op:?}");

                bst = copy;
            }

            FinalOp::Take => {
                let taken = bst.take();
                assert!(bst.is_empty(), "FinalOp #{op_id}: {final_op:?}");
                bst.assert_invariants();

                bst = taken;
            }

            FinalOp::Clear => {
                btree.clear();
                bst.clear();
                sorted_keys.clear();
            }
        }

        bst.assert_invariants();
        assert_eq!(btree.len(), bst.len());
        assert!(btree.iter().eq(bst.iter()));
    }
}

#[derive(Clone, Debug, Arbitrary)]
pub enum CursorOp {
    // Get is not an operation as it's executed on every loop iteration to check equivalence.
    MoveNext,
    PeekNext,
    RemoveCurrent,
    Restart,
}

pub fn cursor_op_strategy() -> impl Strategy<Value = CursorOp> {
    proptest::prop_oneof![
        3 => Just(CursorOp::MoveNext),
        1 => Just(CursorOp::PeekNext),
        2 => Just(CursorOp::RemoveCurrent),
        1 => Just(CursorOp::Restart),
    ]
}

#[derive(Clone, Debug)]
pub struct CursorEquivalenceInput {
    pub values: Vec<u32>,
    pub ops: Vec<CursorOp>,
}

impl<'a> arbitrary::Arbitrary<'a> for CursorEquivalenceInput {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        fn value(u: &mut arbitrary::Unstructured<'_>) -> u32 {
            u32::arbitrary(u).unwrap_or(0)
        }

        fn op(u: &mut arbitrary::Unstructured<'_>) -> CursorOp {
            CursorOp::arbitrary(u).unwrap_or(CursorOp::MoveNext)
        }

        let num_values = u8::arbitrary(u)? % 100;
        let num_ops = u16::arbitrary(u)? % 1000;

        let values = core::iter::repeat_with(|| value(u))
            .take(num_values.into())
            .collect();

        let ops = core::iter::repeat_with(|| op(u))
            .take(num_ops.into())
            .collect();

        Ok(CursorEquivalenceInput { values, ops })
    }
}

/// Drives a [`CursorMut`](crate::map::CursorMut) and an index into a sorted `Vec` through the
/// same operations, asserting that they point at the same key after every step.
///
/// `values` are inserted in the given order, so the tree takes whatever shape they produce.
pub fn run_cursor_equivalence(values: Vec<u32>, ops: Vec<CursorOp>) {
    let mut bst: BstMap<u32, u32> = BstMap::new();
    for &val in &values {
        bst.insert((val, val));
    }

    let mut vec: Vec<u32> = values;
    vec.sort_unstable();
    vec.dedup();

    fn vec_curs_next(v: &[u32], curs: Option<usize>) -> Option<usize> {
        curs.and_then(|i| i.checked_add(1)).filter(|&i| i < v.len())
    }

    fn vec_curs_first(v: &[u32]) -> Option<usize> {
        (!v.is_empty()).then_some(0)
    }

    let mut vec_curs = vec_curs_first(&vec);
    let mut bst_curs = bst.cursor_first_mut();

    // Check that the initial states are equivalent.
    assert_eq!(vec_curs.map(|i| &vec[i]), bst_curs.key());

    for op in ops {
        match op {
            CursorOp::MoveNext => {
                vec_curs = vec_curs_next(&vec, vec_curs);
                bst_curs.move_next();
            }

            CursorOp::PeekNext => {
                let v = vec_curs_next(&vec, vec_curs).map(|i| &vec[i]);
                let b = bst_curs.peek_next().map(|(key, _)| key);

                assert_eq!(v, b);
            }

            CursorOp::RemoveCurrent => {
                let v = vec_curs.map(|i| vec.remove(i));

                if vec_curs == Some(vec.len()) {
                    vec_curs = None;
                }

                let b = bst_curs.remove_current().map(|(key, value)| {
                    assert_eq!(key, value);
                    key
                });

                assert_eq!(v, b);
            }

            CursorOp::Restart => {
                drop(bst_curs);
                bst.assert_invariants();

                vec_curs = vec_curs_first(&vec);
                bst_curs = bst.cursor_first_mut();
            }
        }

        let v = vec_curs.map(|i| &vec[i]);
        assert_eq!(v, bst_curs.key());
    }

    drop(bst_curs);
    bst.assert_invariants();
    assert!(vec.iter().eq(bst.keys()));
}

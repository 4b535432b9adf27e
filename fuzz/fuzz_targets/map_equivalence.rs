#![no_main]

use cordyceps_bst::model::{run_btree_equivalence, Op};
use libfuzzer_sys::fuzz_target;

// Every op sequence must leave `BstMap` agreeing with `BTreeMap`.
fuzz_target!(|ops: Vec<Op>| run_btree_equivalence(ops));

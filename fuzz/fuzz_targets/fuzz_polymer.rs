//! Fuzz relation reindexing and folding
//!
//! Shapes and coordinate maps come straight from the input, so most of them
//! are invalid. Every call must return an error instead of panicking.

#![no_main]

use algsat::Relation;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let [size, arity, new_arity, count, rest @ ..] = data else {
        return;
    };
    let size = 1 + *size as usize % 3;
    let arity = *arity as usize % 4;
    let new_arity = *new_arity as usize % 4;
    let count = *count as usize % 5;

    // targets may point past new_arity
    let (targets, bits) = rest.split_at(arity.min(rest.len()));
    let targets: Vec<usize> = targets.iter().map(|&t| t as usize % (new_arity + 2)).collect();
    let bits = bits.iter().map(|&b| b & 1 == 1);

    let Ok(rel) = Relation::from_bools(size, arity, bits) else {
        return;
    };
    if let Ok(image) = rel.polymer(&targets, new_arity) {
        let _ = image.fold_any(count);
        let _ = image.fold_one(count);
    }
    let _ = rel.fold_all(count);
    let _ = rel.fold_amo(count);
    let _ = rel.polymer_rotate(count as isize - 2);
    let _ = rel.polymer_swap(count, 1);
});

//! Fuzz the evaluate encodings against the generic one
//!
//! Relations and graphs are constant, so every image is computed on TRUE and
//! FALSE literals only and the encodings must agree cell by cell.

#![no_main]

use algsat::{EvalStrategy, Relation};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let [size, k, g, rest @ ..] = data else {
        return;
    };
    let size = 1 + *size as usize % 3;
    let k = 1 + *k as usize % 3;
    let g = 1 + *g as usize % 3;

    let mut bits = rest.iter().flat_map(|&b| (0..8).map(move |i| (b >> i) & 1 == 1));
    let Ok(rel) = Relation::from_bools(size, k, bits.by_ref().take(size.pow(k as u32))) else {
        return;
    };
    let mut graphs = Vec::with_capacity(k);
    for _ in 0..k {
        let Ok(graph) = Relation::from_bools(size, g, bits.by_ref().take(size.pow(g as u32)))
        else {
            return;
        };
        graphs.push(graph);
    }

    let generic = rel
        .evaluate_using(EvalStrategy::Generic, &graphs)
        .and_then(|image| image.decode());
    for strategy in EvalStrategy::ALL {
        if strategy.applies(k, g) {
            let image = rel
                .evaluate_using(strategy, &graphs)
                .and_then(|image| image.decode());
            assert_eq!(image, generic, "{strategy} at size={size} k={k} g={g}");
        }
    }
});

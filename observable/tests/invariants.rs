//! Property tests for notification order and derived-cell consistency.

mod common;
use observable::*;
use proptest::prelude::*;
use std::sync::{Arc, Mutex};

proptest! {
    #[test]
    fn every_set_reaches_every_observer_in_order(
        initial in any::<i32>(),
        values in proptest::collection::vec(any::<i32>(), 0..32),
        observers in 1usize..6,
    ) {
        let cell = Observable::new(initial);
        let log = Arc::new(Mutex::new(Vec::new()));
        let _guards: Vec<_> = (0..observers)
            .map(|observer| {
                let log = log.clone();
                cell.listen(move |value| log.lock().unwrap().push((observer, value)))
            })
            .collect();

        for value in &values {
            cell.set(*value);
        }

        let expected: Vec<(usize, i32)> =
            values.iter().flat_map(|value| (0..observers).map(move |observer| (observer, *value))).collect();
        prop_assert_eq!(log.lock().unwrap().clone(), expected);
        prop_assert_eq!(cell.get(), values.last().copied().unwrap_or(initial));
    }

    #[test]
    fn mapped_cell_always_matches_its_source(
        initial in any::<i64>(),
        values in proptest::collection::vec(any::<i64>(), 0..32),
    ) {
        let source = Observable::new(initial);
        let halved = source.map(|v| v / 2);
        let described = halved.map(|v| format!("{v}"));

        prop_assert_eq!(described.get(), (initial / 2).to_string());
        for value in values {
            source.set(value);
            prop_assert_eq!(halved.get(), value / 2);
            prop_assert_eq!(described.get(), (value / 2).to_string());
        }
    }

    #[test]
    fn flat_map_follows_only_the_latest_inner(switches in proptest::collection::vec((0usize..4, any::<i32>()), 1..24)) {
        let inners: Vec<Observable<i32>> = (0..4).map(|i| Observable::new(i as i32)).collect();
        let selected = Observable::new(0usize);
        let followed = {
            let inners = inners.clone();
            selected.flat_map(move |index| inners[index].clone())
        };

        let mut current = 0;
        for (index, value) in switches {
            selected.set(index);
            current = index;
            prop_assert_eq!(followed.get(), inners[current].get());
            // writes to the unselected inner cells are ignored
            for (i, inner) in inners.iter().enumerate().filter(|(i, _)| *i != current) {
                inner.set(value.wrapping_add(i as i32));
                prop_assert_eq!(followed.get(), inners[current].get());
            }
            inners[current].set(value);
            prop_assert_eq!(followed.get(), value);
        }
        prop_assert!(inners.iter().enumerate().all(|(i, inner)| inner.observer_count() == usize::from(i == current)));
    }
}

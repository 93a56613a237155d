#![allow(missing_docs)]
use crate::{ApplyMode, ComparatorKind, Error, MissingKey, OrderedMap, SortOptions};
use rand::prelude::*;
use std::{
    sync::atomic::{AtomicUsize, Ordering},
    thread,
};

const MODES: [ApplyMode; 2] = [ApplyMode::Deferred, ApplyMode::Immediate];

fn map_with_mode<K, V>(mode: ApplyMode) -> OrderedMap<K, V>
where
    K: std::hash::Hash + Eq + Clone + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    ordmap_logger::setup();
    OrderedMap::builder().mode(mode).build().unwrap()
}

#[test]
fn test_basic_lifecycle() {
    for mode in MODES {
        let map = map_with_mode(mode);
        map.set("a", 1);
        map.set("b", 2);
        map.set("c", 3);
        map.wait();
        assert_eq!(map.len(), 3);
        assert_eq!(map.iter().collect::<Vec<_>>(), [("a", 1), ("b", 2), ("c", 3)]);

        map.delete("b");
        map.wait();
        assert_eq!(map.iter().collect::<Vec<_>>(), [("a", 1), ("c", 3)]);

        map.swap("a", "c").unwrap();
        map.wait();
        assert_eq!(map.get("a"), Some(3));
        assert_eq!(map.get("c"), Some(1));
        assert_eq!(map.values().collect::<Vec<_>>(), [1, 3]);
        assert_eq!(map.iter().collect::<Vec<_>>(), [("c", 1), ("a", 3)]);
        map.check();
    }
}

#[test]
fn test_absent_keys() {
    for mode in MODES {
        let map: OrderedMap<&str, i32> = map_with_mode(mode);
        map.delete("missing");
        map.wait();
        assert!(map.is_empty());
        assert_eq!(map.get("missing"), None);
        assert!(matches!(
            map.swap("x", "y"),
            Err(Error::KeyNotFound(MissingKey::Both))
        ));

        map.set("x", 1);
        assert!(matches!(
            map.swap("x", "y"),
            Err(Error::KeyNotFound(MissingKey::Second))
        ));
        assert!(matches!(
            map.swap("y", "x"),
            Err(Error::KeyNotFound(MissingKey::First))
        ));
        map.wait();
        assert_eq!(map.snapshot(), [("x", 1)]);
    }
}

#[test]
fn test_swap_admitted_against_pending_set() {
    // Admission decides, the worker may not have inserted "b" yet.
    let map = map_with_mode(ApplyMode::Deferred);
    map.set("a", 1);
    map.set("b", 2);
    map.swap("a", "b").unwrap();
    map.delete("b");
    assert!(map.swap("a", "b").is_err());
    map.wait();
    assert_eq!(map.snapshot(), [("a", 2)]);
    map.check();
}

#[test]
fn test_append_order() {
    for mode in MODES {
        let map = map_with_mode(mode);
        for key in 0..200u32 {
            map.set(key.wrapping_mul(2654435761), key);
        }
        map.wait();
        assert!(map.values().eq(0..200));
        assert_eq!(map.position_of(&2654435761), Some(1));
        assert_eq!(map.active_comparator(), ComparatorKind::None);
    }
}

#[test]
fn test_delete_renumbering() {
    for mode in MODES {
        let map = map_with_mode(mode);
        for key in 0..10usize {
            map.set(key, key * 10);
        }
        map.delete(&4);
        map.wait();
        assert_eq!(map.len(), 9);
        for key in 0..4 {
            assert_eq!(map.position_of(&key), Some(key));
        }
        for key in 5..10 {
            assert_eq!(map.position_of(&key), Some(key - 1));
        }
        assert!(!map.contains_key(&4));

        map.delete(&9);
        map.wait();
        assert_eq!(map.get_index(7), Some((8, 80)));
        assert_eq!(map.get_index(8), None);
        map.check();
    }
}

#[test]
fn test_swap_symmetry() {
    for mode in MODES {
        let map = map_with_mode(mode);
        for key in 0..8 {
            map.set(key, key.to_string());
        }
        map.wait();
        let before = map.snapshot();
        map.swap(&1, &6).unwrap();
        map.swap(&1, &6).unwrap();
        map.wait();
        assert_eq!(map.snapshot(), before);
    }
}

#[test]
fn test_sticky_key_comparator() {
    for mode in MODES {
        let map = map_with_mode(mode);
        map.sort_by_key(|a: &u32, b: &u32| a < b, SortOptions::STICKY);
        for key in (0..100).rev() {
            map.set(key, ());
        }
        map.wait();
        assert!(map.keys().eq(0..100));
        assert_eq!(map.active_comparator(), ComparatorKind::ByKey);

        map.clear_sticky();
        map.set(50, ());
        map.set(200, ());
        map.set(150, ());
        map.wait();
        assert_eq!(map.active_comparator(), ComparatorKind::None);
        assert_eq!(map.keys().skip(99).collect::<Vec<_>>(), [99, 200, 150]);
        map.check();
    }
}

#[test]
fn test_sticky_value_comparator() {
    for mode in MODES {
        let map = map_with_mode(mode);
        map.set("low", 1);
        map.set("high", 9);
        map.sort_by_value(|a: &i32, b: &i32| a > b, SortOptions::STICKY);
        map.set("mid", 5);
        map.set("low", 10);
        map.wait();
        assert_eq!(map.keys().collect::<Vec<_>>(), ["low", "high", "mid"]);

        // Sorting by key replaces the value comparator.
        map.sort_by_key(|a: &&str, b: &&str| a < b, SortOptions::STICKY);
        map.set("aaa", 0);
        map.wait();
        assert_eq!(map.keys().collect::<Vec<_>>(), ["aaa", "high", "low", "mid"]);
        assert_eq!(map.active_comparator(), ComparatorKind::ByKey);

        map.sort_by_value(|a: &i32, b: &i32| a < b, SortOptions::default());
        map.wait();
        assert_eq!(map.active_comparator(), ComparatorKind::None);
        assert!(map.values().eq([0, 5, 9, 10]));
        map.check();
    }
}

#[test]
fn test_unstable_sort() {
    let map = map_with_mode(ApplyMode::Immediate);
    let mut rng = rand_pcg::Pcg64::seed_from_u64(7);
    let mut values: Vec<u64> = (0..500).map(|_| rng.gen()).collect();
    for (key, &value) in values.iter().enumerate() {
        map.set(key, value);
    }
    map.sort_by_value(
        |a: &u64, b: &u64| a < b,
        SortOptions {
            stable: false,
            sticky: false,
        },
    );
    values.sort_unstable();
    assert!(map.values().eq(values));
    map.check();
}

#[test]
fn test_concurrent_writers() {
    let map = map_with_mode(ApplyMode::Deferred);
    thread::scope(|scope| {
        for thread_index in 0..8u64 {
            let map = &map;
            scope.spawn(move || {
                let mut rng = rand_pcg::Pcg64::seed_from_u64(thread_index);
                for i in 0..500u64 {
                    let key = thread_index * 1000 + i;
                    map.set(key, i);
                    match rng.gen_range(0..10) {
                        0 => map.delete(&key),
                        1 => {
                            let other = thread_index * 1000 + rng.gen_range(0..=i);
                            let _ = map.swap(&key, &other);
                        }
                        2 => map.set(key, i + 1),
                        _ => (),
                    }
                }
            });
        }
    });
    map.wait();
    assert_eq!(map.pending(), 0);
    map.check();

    let snapshot = map.snapshot();
    assert_eq!(map.to_map().len(), snapshot.len());
    assert!(snapshot.iter().all(|&(key, value)| key / 1000 < 8 && value <= 500));
}

#[test]
fn test_concurrent_readers_see_whole_mutations() {
    let map = map_with_mode(ApplyMode::Deferred);
    for key in 0..100u32 {
        map.set(key, 0u32);
    }
    map.wait();
    thread::scope(|scope| {
        scope.spawn(|| {
            for round in 1..=50 {
                map.sort_by_key(
                    move |a: &u32, b: &u32| if round % 2 == 0 { a < b } else { a > b },
                    SortOptions::STABLE,
                );
            }
        });
        for _ in 0..4 {
            scope.spawn(|| {
                for _ in 0..200 {
                    let snapshot = map.snapshot();
                    assert_eq!(snapshot.len(), 100);
                    let ascending = snapshot.windows(2).all(|pair| pair[0].0 < pair[1].0);
                    let descending = snapshot.windows(2).all(|pair| pair[0].0 > pair[1].0);
                    assert!(ascending || descending);
                }
            });
        }
    });
    map.wait();
    assert!(map.keys().eq(0..100));
}

#[test]
fn test_panicking_comparator_does_not_wedge() {
    for mode in MODES {
        let map = map_with_mode(mode);
        for key in 0..50 {
            map.set(key, key);
        }
        let calls = AtomicUsize::new(0);
        map.sort_by_value(
            move |a: &i32, b: &i32| {
                if calls.fetch_add(1, Ordering::Relaxed) == 20 {
                    panic!("comparator failure");
                }
                a > b
            },
            SortOptions::STICKY,
        );
        map.set(100, 100);
        map.wait();
        assert_eq!(map.pending(), 0);
        assert_eq!(map.len(), 51);
        assert_eq!(map.active_comparator(), ComparatorKind::None);
        assert_eq!(map.position_of(&100), Some(50));
        map.check();
    }
}

#[test]
fn test_drop_applies_pending() {
    let applied = std::sync::Arc::new(AtomicUsize::new(0));
    {
        let map = map_with_mode(ApplyMode::Deferred);
        for key in 0..1000 {
            map.set(key, ());
        }
        let applied = applied.clone();
        map.sort_by_key(
            move |a: &i32, b: &i32| {
                applied.fetch_add(1, Ordering::Relaxed);
                a < b
            },
            SortOptions::STABLE,
        );
    }
    assert!(applied.load(Ordering::Relaxed) > 0);
}

#[test]
fn test_iteration_steps_through_changes() {
    let map = map_with_mode(ApplyMode::Immediate);
    for key in 0..5 {
        map.set(key, key);
    }
    let mut iter = map.keys();
    assert_eq!(iter.next(), Some(0));
    assert_eq!(iter.next(), Some(1));
    map.delete(&0);
    assert_eq!(iter.next(), Some(3));
    map.set(5, 5);
    assert_eq!(iter.collect::<Vec<_>>(), [4, 5]);
}

#[test]
fn test_builder_options() {
    let map: OrderedMap<String, u8, std::collections::hash_map::RandomState> =
        OrderedMap::builder()
            .capacity(16)
            .worker_name("ordmap-test-apply")
            .hasher(std::collections::hash_map::RandomState::new())
            .build()
            .unwrap();
    map.set("k".to_owned(), 1);
    map.wait();
    assert_eq!(map.get("k"), Some(1));
    assert_eq!(map.get_with("k", |value| value + 1), Some(2));
    assert_eq!(format!("{map:?}"), r#"{"k": 1}"#);
    assert!(map.to_map().contains_key("k"));
}

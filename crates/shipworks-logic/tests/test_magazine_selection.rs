//! Randomized checks of the magazine selection rules.
//!
//! Each test builds many magazines from a seeded RNG and compares the
//! magazine's answers against a direct scan of its contents.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shipworks_logic::defs::ShellId;
use shipworks_logic::magazine::ShellMagazine;

const SHELL_TYPES: [&str; 4] = ["HE", "EMP", "Antimatter", "Nuclear"];
const CASES: usize = 500;

fn random_magazine(rng: &mut StdRng) -> ShellMagazine {
    let mut magazine = ShellMagazine::with_capacity(8);
    let len = rng.gen_range(0..8);
    for _ in 0..len {
        let shell = SHELL_TYPES[rng.gen_range(0..SHELL_TYPES.len())];
        magazine.load_shell(ShellId::new(shell), 1);
    }
    for shell in SHELL_TYPES {
        if rng.gen_bool(0.3) {
            magazine.prevent(ShellId::new(shell));
        }
    }
    if len > 0 {
        let _ = magazine.select(rng.gen_range(0..len));
    }
    magazine
}

fn first_usable(magazine: &ShellMagazine) -> Option<usize> {
    magazine
        .loaded()
        .iter()
        .position(|s| !magazine.is_prevented(s))
}

#[test]
fn selected_index_prefers_first_usable_shell() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..CASES {
        let magazine = random_magazine(&mut rng);
        let expected = match first_usable(&magazine) {
            Some(i) if !magazine.prevented().is_empty() => Some(i),
            _ if magazine.manual_selection() < magazine.len() => Some(magazine.manual_selection()),
            _ => None,
        };
        assert_eq!(magazine.selected_index(), expected, "{:?}", magazine);
    }
}

#[test]
fn has_usable_matches_scan() {
    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..CASES {
        let magazine = random_magazine(&mut rng);
        assert_eq!(magazine.has_usable(), first_usable(&magazine).is_some());
        if magazine.has_usable() {
            let shell = magazine.current_shell().expect("usable magazine has a selection");
            if !magazine.prevented().is_empty() {
                assert!(!magazine.is_prevented(shell));
            }
        }
    }
}

#[test]
fn notify_fired_removes_exactly_the_selected_shell() {
    let mut rng = StdRng::seed_from_u64(23);
    for _ in 0..CASES {
        let mut magazine = random_magazine(&mut rng);
        let before = magazine.loaded().to_vec();
        let Some(index) = magazine.selected_index() else {
            assert!(magazine.notify_fired().is_err());
            continue;
        };

        let fired = magazine.notify_fired().unwrap();
        let mut expected = before.clone();
        let removed = expected.remove(index);

        assert_eq!(fired, removed);
        assert_eq!(magazine.loaded(), expected.as_slice());
    }
}

#[test]
fn remove_all_returns_one_item_per_shell() {
    let mut rng = StdRng::seed_from_u64(31);
    for _ in 0..CASES {
        let mut magazine = random_magazine(&mut rng);
        let before = magazine.len();
        let items = magazine.remove_all();

        assert_eq!(items.len(), before);
        assert!(items.iter().all(|i| i.count == 1));
        assert!(magazine.is_empty());
    }
}

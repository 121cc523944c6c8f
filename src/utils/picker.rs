#![forbid(unsafe_code)]

use std::sync::{Arc, Mutex};

use log::info;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

// ***************************************************************************
//                              AnswerPicker
// ***************************************************************************
/// Source of randomness used to select one answer from a category's list.
///
/// Implementations must pick uniformly and return `None` only when the
/// slice is empty.
pub trait AnswerPicker: Send + Sync {
    fn choose<'a>(&self, answers: &'a [String]) -> Option<&'a String>;
}

// ---------------------------------------------------------------------------
// ThreadRngPicker:
// ---------------------------------------------------------------------------
/// Default picker backed by the thread local generator.
#[derive(Debug, Default)]
pub struct ThreadRngPicker;

impl AnswerPicker for ThreadRngPicker {
    fn choose<'a>(&self, answers: &'a [String]) -> Option<&'a String> {
        answers.choose(&mut rand::thread_rng())
    }
}

// ---------------------------------------------------------------------------
// SeededPicker:
// ---------------------------------------------------------------------------
/// Reproducible picker.  Draws from all request handlers are serialized
/// through one seeded generator.
#[derive(Debug)]
pub struct SeededPicker {
    rng: Mutex<StdRng>,
}

impl SeededPicker {
    pub fn new(seed: u64) -> Self {
        Self {rng: Mutex::new(StdRng::seed_from_u64(seed))}
    }
}

impl AnswerPicker for SeededPicker {
    fn choose<'a>(&self, answers: &'a [String]) -> Option<&'a String> {
        // A poisoned lock still holds a usable generator.
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        answers.choose(&mut *rng)
    }
}

// ---------------------------------------------------------------------------
// make_picker:
// ---------------------------------------------------------------------------
/** Select the picker implementation based on the configured seed. */
pub fn make_picker(seed: Option<u64>) -> Arc<dyn AnswerPicker> {
    match seed {
        Some(s) => {
            info!("Answers will be selected using a generator seeded with {}.", s);
            Arc::new(SeededPicker::new(s))
        },
        None => Arc::new(ThreadRngPicker),
    }
}

// ***************************************************************************
//                                  Tests
// ***************************************************************************
#[cfg(test)]
pub mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Picks the indexes it was given, in order, wrapping around.  Indexes
    /// beyond the end of a slice wrap modulo the slice length.
    pub struct FixedSequencePicker {
        indexes: Vec<usize>,
        next: AtomicUsize,
    }

    impl FixedSequencePicker {
        pub fn new(indexes: Vec<usize>) -> Self {
            Self {indexes, next: AtomicUsize::new(0)}
        }
    }

    impl AnswerPicker for FixedSequencePicker {
        fn choose<'a>(&self, answers: &'a [String]) -> Option<&'a String> {
            if answers.is_empty() || self.indexes.is_empty() {
                return None;
            }
            let n = self.next.fetch_add(1, Ordering::SeqCst);
            let i = self.indexes[n % self.indexes.len()];
            answers.get(i % answers.len())
        }
    }

    fn answers() -> Vec<String> {
        vec!["hi".to_string(), "hello".to_string(), "hey".to_string()]
    }

    #[test]
    fn thread_rng_picks_member() {
        let answers = answers();
        for _ in 0..50 {
            let a = ThreadRngPicker.choose(&answers).unwrap();
            assert!(answers.contains(a));
        }
    }

    #[test]
    fn empty_list_yields_none() {
        let empty: Vec<String> = vec![];
        assert!(ThreadRngPicker.choose(&empty).is_none());
        assert!(SeededPicker::new(7).choose(&empty).is_none());
    }

    #[test]
    fn same_seed_same_sequence() {
        let answers = answers();
        let p1 = SeededPicker::new(42);
        let p2 = SeededPicker::new(42);
        let s1: Vec<&String> = (0..20).map(|_| p1.choose(&answers).unwrap()).collect();
        let s2: Vec<&String> = (0..20).map(|_| p2.choose(&answers).unwrap()).collect();
        assert_eq!(s1, s2);
    }

    #[test]
    fn thread_rng_reaches_every_entry() {
        let answers = answers();
        let mut seen = [false; 3];
        for _ in 0..500 {
            let a = ThreadRngPicker.choose(&answers).unwrap();
            let i = answers.iter().position(|x| x == a).unwrap();
            seen[i] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn fixed_sequence_wraps() {
        let answers = answers();
        let p = FixedSequencePicker::new(vec![2, 0]);
        assert_eq!(p.choose(&answers).unwrap(), "hey");
        assert_eq!(p.choose(&answers).unwrap(), "hi");
        assert_eq!(p.choose(&answers).unwrap(), "hey");
    }

    #[test]
    fn make_picker_honors_seed() {
        let answers = answers();
        let seeded = make_picker(Some(9));
        let reference = SeededPicker::new(9);
        for _ in 0..10 {
            assert_eq!(seeded.choose(&answers), reference.choose(&answers));
        }
    }
}

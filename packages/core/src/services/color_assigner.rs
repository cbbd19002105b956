//! Round-robin color selection
//!
//! The cursor is shared by every create call of a `TreeService`. It advances
//! with a single compare-and-swap, so concurrent creates each get a distinct
//! cursor value and the palette is consumed strictly in order. Colors are
//! never handed back: a create that rolls back still consumes its color.

use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug)]
pub struct ColorAssigner {
    palette: Vec<String>,
    cursor: AtomicUsize,
}

impl ColorAssigner {
    /// Create an assigner starting at the first palette entry
    ///
    /// Returns `None` for an empty palette.
    pub fn new(palette: Vec<String>) -> Option<Self> {
        if palette.is_empty() {
            return None;
        }
        Some(Self {
            palette,
            cursor: AtomicUsize::new(0),
        })
    }

    /// Palette entry at the cursor; advances the cursor modulo the palette size
    pub fn assign(&self) -> &str {
        let len = self.palette.len();
        let index = self
            .cursor
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |i| Some((i + 1) % len))
            .unwrap_or_else(|i| i);
        &self.palette[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_PALETTE;
    use std::collections::HashMap;
    use std::sync::Arc;

    fn palette(colors: &[&str]) -> Vec<String> {
        colors.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_empty_palette_rejected() {
        assert!(ColorAssigner::new(Vec::new()).is_none());
    }

    #[test]
    fn test_cycles_in_order_and_wraps() {
        let assigner = ColorAssigner::new(palette(&["#111111", "#222222", "#333333"])).unwrap();

        let assigned: Vec<String> = (0..7).map(|_| assigner.assign().to_string()).collect();
        assert_eq!(
            assigned,
            vec!["#111111", "#222222", "#333333", "#111111", "#222222", "#333333", "#111111"]
        );
        assert_eq!(assigner.assign(), "#222222");
    }

    #[test]
    fn test_default_palette_wraps_after_eleven() {
        let assigner = ColorAssigner::new(palette(&DEFAULT_PALETTE)).unwrap();
        for expected in DEFAULT_PALETTE {
            assert_eq!(assigner.assign(), expected);
        }
        assert_eq!(assigner.assign(), DEFAULT_PALETTE[0]);
    }

    #[test]
    fn test_concurrent_assignment_is_balanced() {
        let assigner = Arc::new(ColorAssigner::new(palette(&["#AAAAAA", "#BBBBBB", "#CCCCCC"])).unwrap());

        let handles: Vec<_> = (0..6)
            .map(|_| {
                let assigner = Arc::clone(&assigner);
                std::thread::spawn(move || {
                    (0..100)
                        .map(|_| assigner.assign().to_string())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut counts: HashMap<String, usize> = HashMap::new();
        for handle in handles {
            for color in handle.join().unwrap() {
                *counts.entry(color).or_default() += 1;
            }
        }

        assert_eq!(counts.len(), 3);
        assert!(counts.values().all(|&n| n == 200));
    }
}

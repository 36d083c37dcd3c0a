//! Scalar similarity used by the leaf pass of the matcher.

use rapidhash::RapidHashMap as HashMap;

use crate::tree::Scalar;

/// Scores how alike two strings are, in `[0, 1]`.
///
/// Implementations must be symmetric and return `1.0` for equal inputs.
pub trait StringSimilarity {
    /// Similarity of `a` and `b`.
    fn similarity(&self, a: &str, b: &str) -> f64;
}

impl<F> StringSimilarity for F
where
    F: Fn(&str, &str) -> f64,
{
    fn similarity(&self, a: &str, b: &str) -> f64 {
        self(a, b)
    }
}

/// Sørensen–Dice coefficient over character bigrams, ignoring whitespace.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiceCoefficient;

impl StringSimilarity for DiceCoefficient {
    fn similarity(&self, a: &str, b: &str) -> f64 {
        let a: Vec<char> = a.chars().filter(|c| !c.is_whitespace()).collect();
        let b: Vec<char> = b.chars().filter(|c| !c.is_whitespace()).collect();

        if a == b {
            return 1.0;
        }
        if a.len() < 2 || b.len() < 2 {
            return 0.0;
        }

        let mut bigrams: HashMap<(char, char), usize> = HashMap::default();
        for pair in a.windows(2) {
            *bigrams.entry((pair[0], pair[1])).or_default() += 1;
        }

        let mut shared = 0usize;
        for pair in b.windows(2) {
            if let Some(count) = bigrams.get_mut(&(pair[0], pair[1]))
                && *count > 0
            {
                *count -= 1;
                shared += 1;
            }
        }

        (2 * shared) as f64 / (a.len() + b.len() - 2) as f64
    }
}

/// Similarity of two same-kinded leaves.
///
/// Equal values score `1.0`, two strings are scored by `strings`, and any
/// other unequal pair scores a flat `0.5`.
pub fn leaf_similarity<S: StringSimilarity + ?Sized>(
    a: Option<&Scalar>,
    b: Option<&Scalar>,
    strings: &S,
) -> f64 {
    if a == b {
        return 1.0;
    }
    match (a, b) {
        (Some(Scalar::String(a)), Some(Scalar::String(b))) => {
            strings.similarity(a.as_str(), b.as_str()).clamp(0.0, 1.0)
        }
        _ => 0.5,
    }
}

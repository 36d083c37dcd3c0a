//! Child alignment: reorder matched children with as few moves as possible.

use crate::trace;

use crate::chawathe::ScriptGenerator;
use crate::error::DiffError;
use crate::position::find_pos;
use indextree::NodeId;
use rapidhash::RapidHashSet as HashSet;

/// Longest common subsequence of `a` and `b` under `eq`, as index-aligned pairs.
///
/// Ties are broken towards dropping the head of `a`, so the result is stable.
pub(crate) fn lcs<T: Copy>(a: &[T], b: &[T], mut eq: impl FnMut(T, T) -> bool) -> Vec<(T, T)> {
    let n = a.len();
    let m = b.len();

    // dp[i][j] = length of the LCS of a[i..] and b[j..]
    let mut dp = vec![vec![0usize; m + 1]; n + 1];
    let mut same = vec![vec![false; m]; n];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            if eq(a[i], b[j]) {
                same[i][j] = true;
                dp[i][j] = dp[i + 1][j + 1] + 1;
            } else {
                dp[i][j] = dp[i + 1][j].max(dp[i][j + 1]);
            }
        }
    }

    let mut result = Vec::with_capacity(dp[0][0]);
    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        if same[i][j] {
            result.push((a[i], b[j]));
            i += 1;
            j += 1;
        } else if dp[i][j + 1] > dp[i + 1][j] {
            j += 1;
        } else {
            i += 1;
        }
    }
    result
}

impl ScriptGenerator<'_> {
    /// Put the children of `w` that are matched to children of `x` in the
    /// same relative order as their partners.
    pub(crate) fn align_children(&mut self, w: NodeId, x: NodeId) -> Result<(), DiffError> {
        self.in_order.clear_children(self.after, x);

        let s1: Vec<NodeId> = self
            .before
            .children(w)
            .filter(|&a| {
                self.matching
                    .get_b(a)
                    .is_some_and(|b| self.after.parent(b) == Some(x))
            })
            .collect();
        let s2: Vec<NodeId> = self
            .after
            .children(x)
            .filter(|&b| {
                self.matching
                    .get_a(b)
                    .is_some_and(|a| self.before.parent(a) == Some(w))
            })
            .collect();
        if s1.is_empty() || s2.is_empty() {
            return Ok(());
        }

        let common = lcs(&s1, &s2, |a, b| self.matching.has_pair(a, b));
        trace!(
            w = usize::from(w),
            x = usize::from(x),
            s1 = s1.len(),
            s2 = s2.len(),
            lcs = common.len(),
            "align_children"
        );
        for &(_, b) in &common {
            self.in_order.mark(b);
        }
        let common: HashSet<(NodeId, NodeId)> = common.into_iter().collect();

        for &a in &s1 {
            for &b in &s2 {
                if !self.initial.has_pair(a, b) || common.contains(&(a, b)) {
                    continue;
                }
                let position =
                    find_pos(self.before, self.after, &self.matching, &self.in_order, b)?;
                self.emit_move(a, w, position)?;
                self.in_order.mark(b);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lcs_basic() {
        let a = [1, 2, 3, 4, 5];
        let b = [2, 4, 5, 1];
        let pairs = lcs(&a, &b, |x, y| x == y);
        assert_eq!(pairs, vec![(2, 2), (4, 4), (5, 5)]);
    }

    #[test]
    fn test_lcs_empty_inputs() {
        let empty: [u8; 0] = [];
        assert!(lcs(&empty, &[1u8, 2], |x, y| x == y).is_empty());
        assert!(lcs(&[1u8], &empty, |x, y| x == y).is_empty());
    }

    #[test]
    fn test_lcs_tie_drops_head_of_first() {
        // [a, b] vs [b, a]: both single pairs are optimal, b is kept
        let pairs = lcs(&['a', 'b'], &['b', 'a'], |x, y| x == y);
        assert_eq!(pairs, vec![('b', 'b')]);
    }

    #[test]
    fn test_lcs_custom_predicate() {
        let a = ["x1", "y1", "z1"];
        let b = ["z2", "x2", "y2"];
        let pairs = lcs(&a, &b, |p, q| p.as_bytes()[0] == q.as_bytes()[0]);
        assert_eq!(pairs, vec![("x1", "x2"), ("y1", "y2")]);
    }
}

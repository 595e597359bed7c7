//! Longest common subsequence over a precomputed match matrix.

/// Pairs `(i, j)` of a longest common subsequence, ascending in both
/// coordinates. `matches[i][j]` tells whether left item `i` and right item `j`
/// are the same logical item.
///
/// Backtracking prefers dropping right items on ties, so a left item keeps
/// its earliest possible partner.
pub fn lcs(matches: &[Vec<bool>], width: usize) -> Vec<(usize, usize)> {
    let n = matches.len();
    let m = width;
    if n == 0 || m == 0 {
        return Vec::new();
    }

    let stride = m + 1;
    let mut lengths = vec![0u32; (n + 1) * stride];
    for i in 1..=n {
        for j in 1..=m {
            lengths[i * stride + j] = if matches[i - 1][j - 1] {
                lengths[(i - 1) * stride + j - 1] + 1
            } else {
                lengths[(i - 1) * stride + j].max(lengths[i * stride + j - 1])
            };
        }
    }

    let mut pairs = Vec::with_capacity(lengths[n * stride + m] as usize);
    let (mut i, mut j) = (n, m);
    while i > 0 && j > 0 {
        if matches[i - 1][j - 1] {
            pairs.push((i - 1, j - 1));
            i -= 1;
            j -= 1;
        } else if lengths[i * stride + j - 1] >= lengths[(i - 1) * stride + j] {
            j -= 1;
        } else {
            i -= 1;
        }
    }
    pairs.reverse();
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix<T: PartialEq>(a: &[T], b: &[T]) -> Vec<Vec<bool>> {
        a.iter().map(|x| b.iter().map(|y| x == y).collect()).collect()
    }

    #[test]
    fn empty_sides() {
        assert!(lcs(&[], 3).is_empty());
        assert!(lcs(&[vec![], vec![]], 0).is_empty());
    }

    #[test]
    fn classic() {
        let a: Vec<char> = "ABCBDAB".chars().collect();
        let b: Vec<char> = "BDCABA".chars().collect();
        let pairs = lcs(&matrix(&a, &b), b.len());
        assert_eq!(pairs.len(), 4);
        for window in pairs.windows(2) {
            assert!(window[0].0 < window[1].0 && window[0].1 < window[1].1);
        }
        for &(i, j) in &pairs {
            assert_eq!(a[i], b[j]);
        }
    }

    #[test]
    fn swap_keeps_the_later_left_item() {
        let pairs = lcs(&matrix(&[1, 2], &[2, 1]), 2);
        assert_eq!(pairs, vec![(1, 0)]);
    }

    #[test]
    fn disjoint() {
        assert!(lcs(&matrix(&[1, 2, 3], &[4, 5]), 2).is_empty());
    }
}

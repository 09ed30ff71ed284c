use derive_new::new;
use std::ops::Range;

/// Sequences up to this combined length are diffed with the full trace
const TRACE_LIMIT: usize = 256;

/// A single step of an edit script
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit<T> {
    Delete { value: T },
    Insert { value: T },
    Equal { value: T },
}

impl<T> Edit<T> {
    pub fn value(&self) -> &T {
        match self {
            Edit::Delete { value } | Edit::Insert { value } | Edit::Equal { value } => value,
        }
    }

    pub fn is_change(&self) -> bool {
        !matches!(self, Edit::Equal { .. })
    }

    /// Line marker used by unified diffs
    pub fn marker(&self) -> char {
        match self {
            Edit::Delete { .. } => '-',
            Edit::Insert { .. } => '+',
            Edit::Equal { .. } => ' ',
        }
    }
}

/// Furthest x reached on every diagonal `k = x - y` after some number of edits
#[derive(Debug, Clone)]
struct Frontier {
    offset: isize,
    xs: Vec<isize>,
}

impl Frontier {
    fn new(max_edits: usize) -> Self {
        Frontier {
            offset: max_edits as isize,
            xs: vec![0; 2 * max_edits + 2],
        }
    }

    fn get(&self, k: isize) -> isize {
        self.xs[(self.offset + k) as usize]
    }

    fn set(&mut self, k: isize, x: isize) {
        self.xs[(self.offset + k) as usize] = x;
    }

    /// Diagonal the best path onto `k` after `d` edits comes from
    ///
    /// `k + 1` means the last edit was an insertion, `k - 1` a deletion. Deletions win ties.
    fn previous_diagonal(&self, d: isize, k: isize) -> isize {
        if k == -d || (k != d && self.get(k - 1) < self.get(k + 1)) {
            k + 1
        } else {
            k - 1
        }
    }
}

/// Myers' O(ND) shortest edit script over two sequences
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct MyersDiff<'d, T> {
    a: &'d [T],
    b: &'d [T],
}

impl<T: Eq + Clone> MyersDiff<'_, T> {
    /// Frontiers before each edit count, up to the one reaching both ends
    fn trace(&self) -> Vec<Frontier> {
        let (n, m) = (self.a.len() as isize, self.b.len() as isize);
        let mut frontier = Frontier::new((n + m) as usize);
        let mut trace = Vec::new();

        for d in 0..=(n + m) {
            trace.push(frontier.clone());

            for k in (-d..=d).step_by(2) {
                let mut x = if frontier.previous_diagonal(d, k) == k + 1 {
                    frontier.get(k + 1)
                } else {
                    frontier.get(k - 1) + 1
                };
                let mut y = x - k;
                while x < n && y < m && self.a[x as usize] == self.b[y as usize] {
                    x += 1;
                    y += 1;
                }
                frontier.set(k, x);

                if x >= n && y >= m {
                    return trace;
                }
            }
        }

        trace
    }

    /// Shortest edit script from `a` to `b`
    ///
    /// Small inputs keep the whole trace and backtrack through it. Larger ones are split
    /// on middle snakes, which needs memory linear in the input size.
    pub fn diff(&self) -> Vec<Edit<T>> {
        let mut edits = Vec::with_capacity(self.a.len().max(self.b.len()));
        self.conquer(0..self.a.len(), 0..self.b.len(), &mut edits);

        edits
    }

    fn conquer(&self, a: Range<usize>, b: Range<usize>, edits: &mut Vec<Edit<T>>) {
        if a.len() + b.len() <= TRACE_LIMIT {
            edits.extend(MyersDiff::new(&self.a[a], &self.b[b]).traced_diff());
            return;
        }

        let prefix = common_prefix(&self.a[a.clone()], &self.b[b.clone()]);
        edits.extend(equal_edits(&self.a[a.start..a.start + prefix]));
        let (a, b) = (a.start + prefix..a.end, b.start + prefix..b.end);
        let suffix = common_suffix(&self.a[a.clone()], &self.b[b.clone()]);
        let (a, b) = (a.start..a.end - suffix, b.start..b.end - suffix);

        let split = if a.is_empty() || b.is_empty() {
            None
        } else {
            self.middle_snake(a.clone(), b.clone())
        };
        match split {
            Some((x, y)) if (x, y) != (a.start, b.start) && (x, y) != (a.end, b.end) => {
                self.conquer(a.start..x, b.start..y, edits);
                self.conquer(x..a.end, y..b.end, edits);
            }
            _ => self.replace(a.clone(), b.clone(), edits),
        }

        edits.extend(equal_edits(&self.a[a.end..a.end + suffix]));
    }

    /// Delete all of `a`, then insert all of `b`
    fn replace(&self, a: Range<usize>, b: Range<usize>, edits: &mut Vec<Edit<T>>) {
        edits.extend(self.a[a].iter().map(|value| Edit::Delete {
            value: value.clone(),
        }));
        edits.extend(self.b[b].iter().map(|value| Edit::Insert {
            value: value.clone(),
        }));
    }

    /// Point where a shortest path through the two ranges can be split
    ///
    /// Searches forward from the start and backward from the end at the same time until
    /// the two paths overlap. The ranges must not share a prefix or a suffix.
    fn middle_snake(&self, a: Range<usize>, b: Range<usize>) -> Option<(usize, usize)> {
        let (old, new) = (&self.a[a.clone()], &self.b[b.clone()]);
        let (n, m) = (old.len() as isize, new.len() as isize);
        let delta = n - m;
        let odd = delta & 1 == 1;
        let max_d = (old.len() + new.len()).div_ceil(2) + 1;
        let in_grid = |x: isize, y: isize| (0..=n).contains(&x) && (0..=m).contains(&y);

        let mut forward = Frontier::new(max_d);
        let mut backward = Frontier::new(max_d);
        for d in 0..max_d as isize {
            for k in (-d..=d).rev().step_by(2) {
                let x0 = if forward.previous_diagonal(d, k) == k + 1 {
                    forward.get(k + 1)
                } else {
                    forward.get(k - 1) + 1
                };
                let y0 = x0 - k;
                let mut x = x0;
                if x0 < n && (0..m).contains(&y0) {
                    x += common_prefix(&old[x0 as usize..], &new[y0 as usize..]) as isize;
                }
                forward.set(k, x);

                if odd
                    && (k - delta).abs() < d
                    && in_grid(x0, y0)
                    && x + backward.get(delta - k) >= n
                {
                    return Some((a.start + x0 as usize, b.start + y0 as usize));
                }
            }

            for k in (-d..=d).rev().step_by(2) {
                let mut x = if backward.previous_diagonal(d, k) == k + 1 {
                    backward.get(k + 1)
                } else {
                    backward.get(k - 1) + 1
                };
                let mut y = x - k;
                if x < n && (0..m).contains(&y) {
                    let advance =
                        common_suffix(&old[..(n - x) as usize], &new[..(m - y) as usize]) as isize;
                    x += advance;
                    y += advance;
                }
                backward.set(k, x);

                if !odd
                    && (k - delta).abs() <= d
                    && in_grid(x, y)
                    && x + forward.get(delta - k) >= n
                {
                    return Some((a.start + (n - x) as usize, b.start + (m - y) as usize));
                }
            }
        }

        None
    }

    fn traced_diff(&self) -> Vec<Edit<T>> {
        let (mut x, mut y) = (self.a.len() as isize, self.b.len() as isize);
        let mut edits = Vec::new();

        for (d, frontier) in self.trace().iter().enumerate().rev() {
            let d = d as isize;
            let prev_k = frontier.previous_diagonal(d, x - y);
            let prev_x = frontier.get(prev_k);
            let prev_y = prev_x - prev_k;

            while x > prev_x && y > prev_y {
                x -= 1;
                y -= 1;
                edits.push(Edit::Equal {
                    value: self.a[x as usize].clone(),
                });
            }

            if d > 0 {
                let edit = if x == prev_x {
                    Edit::Insert {
                        value: self.b[prev_y as usize].clone(),
                    }
                } else {
                    Edit::Delete {
                        value: self.a[prev_x as usize].clone(),
                    }
                };
                edits.push(edit);
            }

            (x, y) = (prev_x, prev_y);
        }

        edits.reverse();
        edits
    }
}

fn common_prefix<T: Eq>(a: &[T], b: &[T]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

fn common_suffix<T: Eq>(a: &[T], b: &[T]) -> usize {
    a.iter()
        .rev()
        .zip(b.iter().rev())
        .take_while(|(x, y)| x == y)
        .count()
}

fn equal_edits<T: Clone>(values: &[T]) -> impl Iterator<Item = Edit<T>> + '_ {
    values.iter().map(|value| Edit::Equal {
        value: value.clone(),
    })
}

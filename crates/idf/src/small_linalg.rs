//! Stack-allocated small linear algebra for the Levenberg-Marquardt normal
//! equations (4 parameters).

/// Stack-allocated vector of dimension `R`.
#[derive(Clone, Copy, Debug)]
pub(crate) struct SmallVec<const R: usize> {
    pub(crate) data: [f64; R],
}

/// Stack-allocated R x R matrix stored in column-major order.
///
/// `cols[c][r]` = element at row r, column c.
#[derive(Clone, Copy, Debug)]
pub(crate) struct SmallMat<const R: usize> {
    pub(crate) cols: [[f64; R]; R],
}

impl<const R: usize> SmallVec<R> {
    /// Returns a zero-initialized vector.
    #[inline(always)]
    pub(crate) fn zeros() -> Self {
        Self { data: [0.0; R] }
    }

    /// Euclidean norm.
    pub(crate) fn norm(&self) -> f64 {
        self.data.iter().map(|v| v * v).sum::<f64>().sqrt()
    }

    /// Largest absolute component.
    pub(crate) fn max_abs(&self) -> f64 {
        self.data.iter().fold(0.0, |m, v| m.max(v.abs()))
    }
}

impl<const R: usize> SmallMat<R> {
    /// Returns a zero-initialized matrix.
    #[inline(always)]
    pub(crate) fn zeros() -> Self {
        Self {
            cols: [[0.0; R]; R],
        }
    }

    /// Returns the element at `(row, col)`.
    #[inline(always)]
    pub(crate) fn get(&self, row: usize, col: usize) -> f64 {
        self.cols[col][row]
    }

    /// Sets the element at `(row, col)` to `val`.
    #[inline(always)]
    pub(crate) fn set(&mut self, row: usize, col: usize, val: f64) {
        self.cols[col][row] = val;
    }

    /// Adds `val` to the element at `(row, col)`.
    #[inline(always)]
    pub(crate) fn add(&mut self, row: usize, col: usize, val: f64) {
        self.cols[col][row] += val;
    }

    /// Solves `self * x = rhs` by Gaussian elimination with partial
    /// pivoting.
    ///
    /// Returns `None` if the matrix is numerically singular or the solution
    /// is not finite.
    pub(crate) fn solve(&self, rhs: &SmallVec<R>) -> Option<SmallVec<R>> {
        let mut a = *self;
        let mut b = *rhs;

        for k in 0..R {
            let mut pivot = k;
            for i in (k + 1)..R {
                if a.get(i, k).abs() > a.get(pivot, k).abs() {
                    pivot = i;
                }
            }
            if a.get(pivot, k).abs() < 1e-300 {
                return None;
            }
            if pivot != k {
                for c in 0..R {
                    let tmp = a.get(k, c);
                    a.set(k, c, a.get(pivot, c));
                    a.set(pivot, c, tmp);
                }
                b.data.swap(k, pivot);
            }
            for i in (k + 1)..R {
                let f = a.get(i, k) / a.get(k, k);
                for c in k..R {
                    a.add(i, c, -f * a.get(k, c));
                }
                b.data[i] -= f * b.data[k];
            }
        }

        let mut x = SmallVec::zeros();
        for i in (0..R).rev() {
            let mut sum = b.data[i];
            for c in (i + 1)..R {
                sum -= a.get(i, c) * x.data[c];
            }
            x.data[i] = sum / a.get(i, i);
        }

        x.data.iter().all(|v| v.is_finite()).then_some(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn mat<const R: usize>(rows: [[f64; R]; R]) -> SmallMat<R> {
        let mut m = SmallMat::zeros();
        for (r, row) in rows.iter().enumerate() {
            for (c, &v) in row.iter().enumerate() {
                m.set(r, c, v);
            }
        }
        m
    }

    #[test]
    fn solve_identity() {
        let m = mat([[1.0, 0.0], [0.0, 1.0]]);
        let x = m.solve(&SmallVec { data: [3.0, -2.0] }).unwrap();
        assert_relative_eq!(x.data[0], 3.0);
        assert_relative_eq!(x.data[1], -2.0);
    }

    #[test]
    fn solve_needs_pivoting() {
        // Zero on the leading diagonal forces a row swap.
        let m = mat([[0.0, 2.0, 1.0], [1.0, 1.0, 0.0], [3.0, 0.0, 1.0]]);
        let expected = [1.0, 2.0, 3.0];
        let rhs = SmallVec {
            data: [
                2.0 * 2.0 + 3.0,
                1.0 + 2.0,
                3.0 + 3.0,
            ],
        };
        let x = m.solve(&rhs).unwrap();
        for i in 0..3 {
            assert_relative_eq!(x.data[i], expected[i], epsilon = 1e-12);
        }
    }

    #[test]
    fn solve_singular() {
        let m = mat([[1.0, 2.0], [2.0, 4.0]]);
        assert!(m.solve(&SmallVec { data: [1.0, 1.0] }).is_none());
    }

    #[test]
    fn norms() {
        let v = SmallVec { data: [3.0, -4.0] };
        assert_relative_eq!(v.norm(), 5.0);
        assert_relative_eq!(v.max_abs(), 4.0);
    }
}

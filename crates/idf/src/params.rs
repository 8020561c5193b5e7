//! Fitted IDF curve coefficients.

/// Coefficients of the intensity model `I(Tr, td) = a·Tr^b / (td + c)^d`,
/// with `Tr` in years, `td` in minutes and `I` in mm/h.
///
/// A failed fit is represented by [`IdfParameters::sentinel`], where all
/// four coefficients are NaN. Partially valid parameter sets are never
/// constructed by this crate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IdfParameters {
    a: f64,
    b: f64,
    c: f64,
    d: f64,
}

impl IdfParameters {
    /// Creates a parameter set from explicit coefficients.
    pub fn new(a: f64, b: f64, c: f64, d: f64) -> Self {
        Self { a, b, c, d }
    }

    /// All-NaN parameters marking an unavailable fit.
    pub fn sentinel() -> Self {
        Self::new(f64::NAN, f64::NAN, f64::NAN, f64::NAN)
    }

    pub(crate) fn from_array(p: [f64; 4]) -> Self {
        Self::new(p[0], p[1], p[2], p[3])
    }

    /// Returns `[a, b, c, d]`.
    pub fn to_array(self) -> [f64; 4] {
        [self.a, self.b, self.c, self.d]
    }

    /// Scale coefficient.
    pub fn a(&self) -> f64 {
        self.a
    }

    /// Return-period exponent.
    pub fn b(&self) -> f64 {
        self.b
    }

    /// Duration offset (minutes).
    pub fn c(&self) -> f64 {
        self.c
    }

    /// Duration exponent.
    pub fn d(&self) -> f64 {
        self.d
    }

    /// Returns `true` if all four coefficients are finite.
    pub fn is_fitted(&self) -> bool {
        self.to_array().iter().all(|v| v.is_finite())
    }

    /// Evaluates the model intensity (mm/h) for a return period (years) and
    /// duration (minutes). NaN for sentinel parameters.
    pub fn intensity(&self, return_period: f64, duration_min: f64) -> f64 {
        self.a * return_period.powf(self.b) / (duration_min + self.c).powf(self.d)
    }
}

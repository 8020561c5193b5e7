//! # pluvio-idf
//!
//! Intensity-Duration-Frequency analysis from a daily precipitation record.
//!
//! ## Pipeline
//!
//! ```mermaid
//! graph LR
//!     A["DailySeries"] -->|"estimate_quantiles()"| B["ReturnPeriodQuantiles"]
//!     B -->|"disaggregate()"| C["DurationIntensityTable (143 rows)"]
//!     C -->|"fit_idf()"| D["IdfFit { a, b, c, d }"]
//! ```
//!
//! 1. **Annual maxima** of daily precipitation, then the Gumbel (Chow)
//!    frequency factor gives the 1-day depth for each return period.
//! 2. **Disaggregation** cascades fixed regional ratios from the 1-day depth
//!    down to 5 minutes and converts depths to intensities.
//! 3. **Fitting** of `I = a·Tr^b / (td + c)^d` by Levenberg-Marquardt.
//!    A failed fit yields [`IdfParameters::sentinel`] (all NaN), never an
//!    error.
//!
//! The return-period set, duration set and cascade ratios live in
//! [`constants`] and are shared by every stage.
//!
//! ## Glossary
//!
//! - **Tr**: return period in years
//! - **td**: storm duration in minutes
//! - **depth**: accumulated precipitation over `td` (mm)
//! - **intensity**: depth divided by duration in hours (mm/h)

pub mod constants;
mod config;
mod disaggregate;
mod error;
mod fit;
mod gumbel;
mod params;

pub(crate) mod optimizer;
pub(crate) mod small_linalg;

pub use config::IdfFitConfig;
pub use disaggregate::{DurationIntensityTable, IntensityRow, disaggregate};
pub use error::IdfError;
pub use fit::{FitStatus, IdfFit, fit_idf, fit_idf_with};
pub use gumbel::{AnnualMaxima, ReturnPeriodQuantiles, estimate_quantiles, gumbel_quantile};
pub use params::IdfParameters;

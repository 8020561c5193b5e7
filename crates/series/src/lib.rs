//! # pluvio-series
//!
//! Daily precipitation records and the calendar keys used to group them.
//!
//! ## Architecture
//!
//! ```mermaid
//! graph LR
//!     A["Vec of DailyRecord"] -->|"DailySeries::from_records()"| B["DailySeries"]
//!     B -->|".annual_maxima()"| C["BTreeMap year -> max"]
//!     B -->|".monthly_totals()"| D["BTreeMap YearMonth -> sum"]
//! ```
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `record` | Raw daily record with nullable precipitation |
//! | `series` | Cleaned, date-ordered, de-duplicated series |
//! | `year_month` | Chronologically ordered (year, month) key |
//! | `error` | Error types |

mod error;
mod record;
mod series;
mod year_month;

pub use error::SeriesError;
pub use record::DailyRecord;
pub use series::{CleaningReport, DailySeries};
pub use year_month::YearMonth;

pub use chrono::NaiveDate;

//! Drought/wetness category of an SPI value.

use std::fmt;

/// Conventional SPI categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpiClass {
    ExtremelyWet,
    VeryWet,
    ModeratelyWet,
    NearNormal,
    ModeratelyDry,
    SeverelyDry,
    ExtremelyDry,
}

impl SpiClass {
    /// Classifies an SPI value; `None` for the NaN sentinel.
    pub fn from_spi(spi: f64) -> Option<Self> {
        if spi.is_nan() {
            return None;
        }
        let class = if spi >= 2.0 {
            Self::ExtremelyWet
        } else if spi >= 1.5 {
            Self::VeryWet
        } else if spi >= 1.0 {
            Self::ModeratelyWet
        } else if spi > -1.0 {
            Self::NearNormal
        } else if spi > -1.5 {
            Self::ModeratelyDry
        } else if spi > -2.0 {
            Self::SeverelyDry
        } else {
            Self::ExtremelyDry
        };
        Some(class)
    }

    /// Returns the lower-case label used in reports.
    pub fn label(self) -> &'static str {
        match self {
            Self::ExtremelyWet => "extremely wet",
            Self::VeryWet => "very wet",
            Self::ModeratelyWet => "moderately wet",
            Self::NearNormal => "near normal",
            Self::ModeratelyDry => "moderately dry",
            Self::SeverelyDry => "severely dry",
            Self::ExtremelyDry => "extremely dry",
        }
    }

    /// `true` for the three dry categories.
    pub fn is_dry(self) -> bool {
        matches!(
            self,
            Self::ModeratelyDry | Self::SeverelyDry | Self::ExtremelyDry
        )
    }
}

impl fmt::Display for SpiClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

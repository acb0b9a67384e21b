//! Static code tables of the short-term forecast provider.

use serde::{Deserialize, Serialize};
use std::{convert::TryFrom, fmt};

use crate::error::{ForecastError, Result};

/// Category tag of a single observation row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Category {
    /// Probability of precipitation (%)
    Pop,
    /// Precipitation type, see [`PrecipitationType`]
    Pty,
    /// Precipitation amount over one hour
    Pcp,
    /// Relative humidity (%)
    Reh,
    /// Snow amount over one hour
    Sno,
    /// Sky condition, see [`SkyCode`]
    Sky,
    /// Temperature over one hour (°C)
    Tmp,
    /// Daily minimum temperature (°C)
    Tmn,
    /// Daily maximum temperature (°C)
    Tmx,
    /// East-west wind component (m/s)
    Uuu,
    /// North-south wind component (m/s)
    Vvv,
    /// Wave height (m)
    Wav,
    /// Wind direction (deg)
    Vec,
    /// Wind speed (m/s)
    Wsd,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Pop => "POP",
            Category::Pty => "PTY",
            Category::Pcp => "PCP",
            Category::Reh => "REH",
            Category::Sno => "SNO",
            Category::Sky => "SKY",
            Category::Tmp => "TMP",
            Category::Tmn => "TMN",
            Category::Tmx => "TMX",
            Category::Uuu => "UUU",
            Category::Vvv => "VVV",
            Category::Wav => "WAV",
            Category::Vec => "VEC",
            Category::Wsd => "WSD",
        }
    }

    pub const fn all() -> &'static [Category] {
        &[
            Category::Pop,
            Category::Pty,
            Category::Pcp,
            Category::Reh,
            Category::Sno,
            Category::Sky,
            Category::Tmp,
            Category::Tmn,
            Category::Tmx,
            Category::Uuu,
            Category::Vvv,
            Category::Wav,
            Category::Vec,
            Category::Wsd,
        ]
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Category {
    type Error = String;

    fn try_from(value: &str) -> std::result::Result<Self, Self::Error> {
        Category::all()
            .iter()
            .copied()
            .find(|c| c.as_str() == value)
            .ok_or_else(|| format!("Unknown forecast category '{value}'"))
    }
}

impl TryFrom<String> for Category {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        Category::try_from(value.as_str())
    }
}

impl From<Category> for String {
    fn from(c: Category) -> Self {
        c.as_str().to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkyCode {
    Sunny,
    PartlyCloudy,
    Cloudy,
}

impl SkyCode {
    /// Looks up a sky condition code. Codes outside the table are an error,
    /// never a guessed description.
    pub fn from_code(code: i64) -> Result<Self> {
        match code {
            1 => Ok(SkyCode::Sunny),
            2 | 3 => Ok(SkyCode::PartlyCloudy),
            4 => Ok(SkyCode::Cloudy),
            _ => Err(ForecastError::UnknownCode { kind: "sky", code }),
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            SkyCode::Sunny => "sunny",
            SkyCode::PartlyCloudy => "partly cloudy",
            SkyCode::Cloudy => "cloudy",
        }
    }
}

impl fmt::Display for SkyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrecipitationType {
    None,
    Rain,
    RainAndSnow,
    Snow,
    Shower,
}

impl PrecipitationType {
    pub fn from_code(code: i64) -> Result<Self> {
        match code {
            0 => Ok(PrecipitationType::None),
            1 => Ok(PrecipitationType::Rain),
            2 => Ok(PrecipitationType::RainAndSnow),
            3 => Ok(PrecipitationType::Snow),
            4 => Ok(PrecipitationType::Shower),
            _ => Err(ForecastError::UnknownCode { kind: "precipitation type", code }),
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            PrecipitationType::None => "none",
            PrecipitationType::Rain => "rain",
            PrecipitationType::RainAndSnow => "rain and snow",
            PrecipitationType::Snow => "snow",
            PrecipitationType::Shower => "shower",
        }
    }
}

impl fmt::Display for PrecipitationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

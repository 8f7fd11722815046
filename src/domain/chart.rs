// Chart domain models: sensor categories, chart modes and time spans
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Sensor type grouping whose series share a log format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Temperature,
    HumidityTemperature,
    Co2,
    Pressure,
}

impl Category {
    /// Traversal order used by the orchestrator.
    pub const ALL: [Category; 4] = [
        Category::Temperature,
        Category::HumidityTemperature,
        Category::Co2,
        Category::Pressure,
    ];

    /// Short tag used in log names, image names and renderer arguments.
    pub fn tag(self) -> &'static str {
        match self {
            Category::Temperature => "t",
            Category::HumidityTemperature => "ht",
            Category::Co2 => "co2",
            Category::Pressure => "press",
        }
    }

    /// Key used for this category in the sensor configuration file.
    pub fn config_key(self) -> &'static str {
        match self {
            Category::Temperature => "temperature",
            Category::HumidityTemperature => "humidity_temperature",
            Category::Co2 => "co2",
            Category::Pressure => "pressure",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartMode {
    #[default]
    Default,
    Combined,
    Separate,
}

impl ChartMode {
    pub const ALL: [ChartMode; 3] = [ChartMode::Default, ChartMode::Combined, ChartMode::Separate];

    pub fn as_str(self) -> &'static str {
        match self {
            ChartMode::Default => "default",
            ChartMode::Combined => "combined",
            ChartMode::Separate => "separate",
        }
    }

    /// Accepts only the two non-default tokens; everything else resets to default.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "combined" => Some(ChartMode::Combined),
            "separate" => Some(ChartMode::Separate),
            _ => None,
        }
    }
}

impl fmt::Display for ChartMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum ChartSpan {
    #[default]
    #[serde(rename = "default")]
    Default,
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "6h")]
    SixHours,
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "3d")]
    ThreeDays,
    #[serde(rename = "1w")]
    OneWeek,
    #[serde(rename = "1m")]
    OneMonth,
    #[serde(rename = "3m")]
    ThreeMonths,
}

const HOUR: u64 = 3600;
const DAY: u64 = 24 * HOUR;

impl ChartSpan {
    pub const ALL: [ChartSpan; 8] = [
        ChartSpan::Default,
        ChartSpan::OneHour,
        ChartSpan::SixHours,
        ChartSpan::OneDay,
        ChartSpan::ThreeDays,
        ChartSpan::OneWeek,
        ChartSpan::OneMonth,
        ChartSpan::ThreeMonths,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ChartSpan::Default => "default",
            ChartSpan::OneHour => "1h",
            ChartSpan::SixHours => "6h",
            ChartSpan::OneDay => "1d",
            ChartSpan::ThreeDays => "3d",
            ChartSpan::OneWeek => "1w",
            ChartSpan::OneMonth => "1m",
            ChartSpan::ThreeMonths => "3m",
        }
    }

    /// Accepts the seven explicit span tokens; `default` and anything else yield `None`.
    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .filter(|s| *s != ChartSpan::Default)
            .find(|s| s.as_str() == token)
    }

    fn parse_any(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == token)
    }

    /// Width of the plotted window. The default span plots one day.
    pub fn duration(self) -> Duration {
        let secs = match self {
            ChartSpan::OneHour => HOUR,
            ChartSpan::SixHours => 6 * HOUR,
            ChartSpan::Default | ChartSpan::OneDay => DAY,
            ChartSpan::ThreeDays => 3 * DAY,
            ChartSpan::OneWeek => 7 * DAY,
            ChartSpan::OneMonth => 30 * DAY,
            ChartSpan::ThreeMonths => 90 * DAY,
        };
        Duration::from_secs(secs)
    }

    pub fn label(self) -> &'static str {
        match self {
            ChartSpan::OneHour => "1 Hour",
            ChartSpan::SixHours => "6 Hours",
            ChartSpan::Default | ChartSpan::OneDay => "1 Day",
            ChartSpan::ThreeDays => "3 Days",
            ChartSpan::OneWeek => "1 Week",
            ChartSpan::OneMonth => "1 Month",
            ChartSpan::ThreeMonths => "3 Months",
        }
    }
}

impl fmt::Display for ChartSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Splits a concatenated `{mode}{span}` segment, as written in image names.
pub(crate) fn split_mode_span(segment: &str) -> Option<(ChartMode, ChartSpan)> {
    ChartMode::ALL.into_iter().find_map(|mode| {
        let rest = segment.strip_prefix(mode.as_str())?;
        ChartSpan::parse_any(rest).map(|span| (mode, span))
    })
}

/// One physical sensor within a category, addressed by a 1-based index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesDescriptor {
    pub category: Category,
    pub index: u32,
    pub enabled: bool,
}

impl SeriesDescriptor {
    /// Builds descriptors from the ordered "graph enabled" flags of one category.
    pub fn from_flags(category: Category, flags: &[bool]) -> Vec<Self> {
        flags
            .iter()
            .enumerate()
            .map(|(position, enabled)| Self {
                category,
                index: position as u32 + 1,
                enabled: *enabled,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_tokens() {
        assert_eq!(ChartMode::from_token("combined"), Some(ChartMode::Combined));
        assert_eq!(ChartMode::from_token("separate"), Some(ChartMode::Separate));
        assert_eq!(ChartMode::from_token("default"), None);
        assert_eq!(ChartMode::from_token("Combined"), None);
        assert_eq!(ChartMode::from_token(""), None);
    }

    #[test]
    fn test_span_tokens() {
        for token in ["1h", "6h", "1d", "3d", "1w", "1m", "3m"] {
            let span = ChartSpan::from_token(token).expect("valid span");
            assert_eq!(span.as_str(), token);
        }
        assert_eq!(ChartSpan::from_token("default"), None);
        assert_eq!(ChartSpan::from_token("12h"), None);
        assert_eq!(ChartSpan::from_token("garbage"), None);
    }

    #[test]
    fn test_span_duration() {
        assert_eq!(ChartSpan::Default.duration(), ChartSpan::OneDay.duration());
        assert_eq!(ChartSpan::SixHours.duration(), Duration::from_secs(21_600));
        assert_eq!(ChartSpan::ThreeMonths.duration(), Duration::from_secs(7_776_000));
        assert_eq!(ChartSpan::OneWeek.label(), "1 Week");
    }

    #[test]
    fn test_series_are_one_indexed() {
        let series = SeriesDescriptor::from_flags(Category::Co2, &[false, true]);
        assert_eq!(series[0].index, 1);
        assert!(!series[0].enabled);
        assert_eq!(series[1].index, 2);
        assert!(series[1].enabled);
    }

    #[test]
    fn test_split_mode_span() {
        assert_eq!(
            split_mode_span("separate3d"),
            Some((ChartMode::Separate, ChartSpan::ThreeDays))
        );
        assert_eq!(
            split_mode_span("defaultdefault"),
            Some((ChartMode::Default, ChartSpan::Default))
        );
        assert_eq!(split_mode_span("separate"), None);
        assert_eq!(split_mode_span("bogus1h"), None);
    }
}

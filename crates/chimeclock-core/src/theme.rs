use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Color scheme of the clock face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Pink,
    Purple,
    Rainbow,
}

/// Background and text colors as CSS color strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub background: &'static str,
    pub foreground: &'static str,
}

impl Theme {
    pub const ALL: [Theme; 3] = [Theme::Pink, Theme::Purple, Theme::Rainbow];

    pub fn palette(self) -> Palette {
        match self {
            Theme::Pink => Palette {
                background: "#fff0f5",
                foreground: "#ff69b4",
            },
            Theme::Purple => Palette {
                background: "#f9f0ff",
                foreground: "#8a2be2",
            },
            Theme::Rainbow => Palette {
                background: "rgba(255,255,255,0.2)",
                foreground: "#ffffff",
            },
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Theme::Pink => "pink",
            Theme::Purple => "purple",
            Theme::Rainbow => "rainbow",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Theme {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Theme::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConfigError::InvalidValue {
                key: "ui.theme".into(),
                message: format!("unknown theme '{s}' (expected pink, purple or rainbow)"),
            })
    }
}

/// `HH:MM:SS`, as shown on the clock face.
pub fn clock_face(now: NaiveDateTime) -> String {
    now.format("%H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn parses_theme_names() {
        assert_eq!("Purple".parse::<Theme>().unwrap(), Theme::Purple);
        assert_eq!(" rainbow".parse::<Theme>().unwrap(), Theme::Rainbow);
        assert!("green".parse::<Theme>().is_err());
    }

    #[test]
    fn palettes_differ_per_theme() {
        assert_eq!(Theme::Pink.palette().foreground, "#ff69b4");
        assert_eq!(Theme::Purple.palette().foreground, "#8a2be2");
        assert_eq!(Theme::Rainbow.palette().foreground, "#ffffff");
    }

    #[test]
    fn clock_face_is_zero_padded() {
        let now = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(7, 5, 9)
            .unwrap();
        assert_eq!(clock_face(now), "07:05:09");
    }
}

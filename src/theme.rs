use std::str::FromStr;

use tuirealm::ratatui::style::Color;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub enum ThemePreset {
    #[default]
    Default,
    Light,
    HighContrast,
    Mono,
}

impl ThemePreset {
    pub const ALL: [Self; 4] = [Self::Default, Self::Light, Self::HighContrast, Self::Mono];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Light => "light",
            Self::HighContrast => "high-contrast",
            Self::Mono => "mono",
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            Self::Default => "Balanced colors for everyday use",
            Self::Light => "Bright background with dark text",
            Self::HighContrast => "Enhanced visibility, bright on dark",
            Self::Mono => "Minimal monochrome aesthetic",
        }
    }

    pub const fn next(self) -> Self {
        match self {
            Self::Default => Self::Light,
            Self::Light => Self::HighContrast,
            Self::HighContrast => Self::Mono,
            Self::Mono => Self::Default,
        }
    }
}

impl FromStr for ThemePreset {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "default" => Ok(Self::Default),
            "light" | "day" => Ok(Self::Light),
            "high-contrast" | "high_contrast" | "contrast" => Ok(Self::HighContrast),
            "mono" | "monochrome" => Ok(Self::Mono),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub base: BasePalette,
    pub interactive: InteractivePalette,
    pub status: StatusPalette,
    pub toast: ToastPalette,
}

#[derive(Debug, Clone, Copy)]
pub struct BasePalette {
    pub text: Color,
    pub text_muted: Color,
    pub header: Color,
    pub accent: Color,
    pub danger: Color,
}

#[derive(Debug, Clone, Copy)]
pub struct InteractivePalette {
    pub focus: Color,
    pub selected_bg: Color,
    pub border: Color,
}

/// Row markers for the three task states.
#[derive(Debug, Clone, Copy)]
pub struct StatusPalette {
    pub fresh: Color,
    pub in_progress: Color,
    pub done: Color,
}

#[derive(Debug, Clone, Copy)]
pub struct ToastPalette {
    pub success: Color,
    pub error: Color,
    pub info: Color,
}

impl Theme {
    pub fn from_preset(preset: ThemePreset) -> Self {
        match preset {
            ThemePreset::Default => Self {
                base: BasePalette {
                    text: Color::White,
                    text_muted: Color::DarkGray,
                    header: Color::Cyan,
                    accent: Color::Magenta,
                    danger: Color::Red,
                },
                interactive: InteractivePalette {
                    focus: Color::Cyan,
                    selected_bg: Color::Rgb(54, 48, 72),
                    border: Color::DarkGray,
                },
                status: StatusPalette {
                    fresh: Color::LightGreen,
                    in_progress: Color::Yellow,
                    done: Color::Gray,
                },
                toast: ToastPalette {
                    success: Color::LightGreen,
                    error: Color::LightRed,
                    info: Color::LightBlue,
                },
            },
            ThemePreset::Light => Self {
                base: BasePalette {
                    text: Color::Rgb(32, 38, 51),
                    text_muted: Color::Rgb(95, 105, 122),
                    header: Color::Rgb(37, 99, 235),
                    accent: Color::Rgb(2, 132, 199),
                    danger: Color::Rgb(185, 28, 28),
                },
                interactive: InteractivePalette {
                    focus: Color::Rgb(37, 99, 235),
                    selected_bg: Color::Rgb(227, 237, 255),
                    border: Color::Rgb(196, 208, 224),
                },
                status: StatusPalette {
                    fresh: Color::Rgb(22, 163, 74),
                    in_progress: Color::Rgb(202, 138, 4),
                    done: Color::Rgb(71, 85, 105),
                },
                toast: ToastPalette {
                    success: Color::Rgb(22, 163, 74),
                    error: Color::Rgb(185, 28, 28),
                    info: Color::Rgb(2, 132, 199),
                },
            },
            ThemePreset::HighContrast => Self {
                base: BasePalette {
                    text: Color::White,
                    text_muted: Color::Gray,
                    header: Color::LightCyan,
                    accent: Color::LightBlue,
                    danger: Color::LightRed,
                },
                interactive: InteractivePalette {
                    focus: Color::LightCyan,
                    selected_bg: Color::Rgb(36, 36, 36),
                    border: Color::Gray,
                },
                status: StatusPalette {
                    fresh: Color::LightGreen,
                    in_progress: Color::LightYellow,
                    done: Color::White,
                },
                toast: ToastPalette {
                    success: Color::LightGreen,
                    error: Color::LightRed,
                    info: Color::LightCyan,
                },
            },
            ThemePreset::Mono => Self {
                base: BasePalette {
                    text: Color::White,
                    text_muted: Color::DarkGray,
                    header: Color::White,
                    accent: Color::Gray,
                    danger: Color::White,
                },
                interactive: InteractivePalette {
                    focus: Color::White,
                    selected_bg: Color::Rgb(48, 48, 48),
                    border: Color::DarkGray,
                },
                status: StatusPalette {
                    fresh: Color::White,
                    in_progress: Color::Gray,
                    done: Color::DarkGray,
                },
                toast: ToastPalette {
                    success: Color::White,
                    error: Color::White,
                    info: Color::Gray,
                },
            },
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::from_preset(ThemePreset::Default)
    }
}

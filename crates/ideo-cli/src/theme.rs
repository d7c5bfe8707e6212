use ideo_core::Theme;
use ratatui::style::Color;

#[derive(Clone)]
pub struct Palette {
    pub name: &'static str,
    pub bg: Color,
    pub fg: Color,
    pub accent: Color,
    pub muted: Color,
    pub success: Color,
    pub error: Color,
    pub warning: Color,
    pub border: Color,
    pub selection: Color,
}

impl Palette {
    pub fn dark() -> Self {
        Self {
            name: "Dark",
            bg: Color::Rgb(30, 30, 30),
            fg: Color::Rgb(220, 220, 220),
            accent: Color::Rgb(122, 162, 247),
            muted: Color::Rgb(100, 100, 100),
            success: Color::Rgb(76, 175, 80),
            error: Color::Rgb(247, 118, 142),
            warning: Color::Rgb(224, 175, 104),
            border: Color::Rgb(60, 60, 60),
            selection: Color::Rgb(55, 60, 80),
        }
    }

    pub fn light() -> Self {
        Self {
            name: "Light",
            bg: Color::Rgb(250, 250, 250),
            fg: Color::Rgb(30, 30, 30),
            accent: Color::Rgb(40, 90, 200),
            muted: Color::Rgb(140, 140, 140),
            success: Color::Rgb(76, 175, 80),
            error: Color::Rgb(200, 40, 60),
            warning: Color::Rgb(180, 120, 20),
            border: Color::Rgb(204, 204, 204),
            selection: Color::Rgb(255, 228, 228),
        }
    }

    pub fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Dark => Self::dark(),
            Theme::Light => Self::light(),
        }
    }
}

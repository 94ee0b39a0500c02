use ratatui::style::{Color, Modifier, Style};

/// Named colors for one UI theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub text: Color,
    pub muted: Color,
    pub accent: Color,
    pub border: Color,
    pub editing: Color,
    pub user: Color,
    pub assistant: Color,
    pub error: Color,
    pub success: Color,
    pub highlight_bg: Color,
    pub highlight_fg: Color,
    pub bar_bg: Color,
    pub bar_fg: Color,
}

pub const DARK: Palette = Palette {
    text: Color::Reset,
    muted: Color::DarkGray,
    accent: Color::Cyan,
    border: Color::DarkGray,
    editing: Color::Yellow,
    user: Color::Cyan,
    assistant: Color::Yellow,
    error: Color::Red,
    success: Color::Green,
    highlight_bg: Color::Blue,
    highlight_fg: Color::White,
    bar_bg: Color::DarkGray,
    bar_fg: Color::White,
};

pub const LIGHT: Palette = Palette {
    text: Color::Black,
    muted: Color::Gray,
    accent: Color::Blue,
    border: Color::Gray,
    editing: Color::Magenta,
    user: Color::Blue,
    assistant: Color::Magenta,
    error: Color::Red,
    success: Color::Green,
    highlight_bg: Color::Cyan,
    highlight_fg: Color::Black,
    bar_bg: Color::Gray,
    bar_fg: Color::Black,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

impl Theme {
    /// Parse the persisted preference value ("light" or "dark").
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn palette(self) -> &'static Palette {
        match self {
            Theme::Light => &LIGHT,
            Theme::Dark => &DARK,
        }
    }
}

impl Palette {
    /// Border style for a pane, highlighted when the pane has focus.
    pub fn border_style(&self, focused: bool) -> Style {
        if focused {
            Style::default().fg(self.accent)
        } else {
            Style::default().fg(self.border)
        }
    }

    /// List selection highlight.
    pub fn highlight(&self) -> Style {
        Style::default()
            .bg(self.highlight_bg)
            .fg(self.highlight_fg)
            .add_modifier(Modifier::BOLD)
    }

    pub fn muted_style(&self) -> Style {
        Style::default().fg(self.muted)
    }
}

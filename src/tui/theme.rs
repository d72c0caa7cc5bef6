use std::collections::HashMap;

use ratatui::style::Color;

use crate::model::{BlockType, UiConfig};

/// Parsed color theme for the TUI
#[derive(Debug, Clone)]
pub struct Theme {
    pub background: Color,
    pub text: Color,
    pub text_bright: Color,
    pub highlight: Color,
    pub dim: Color,
    pub red: Color,
    pub yellow: Color,
    pub green: Color,
    pub selection_bg: Color,
    pub popup_border: Color,
    /// Accent per block type
    pub type_colors: HashMap<BlockType, Color>,
}

impl Default for Theme {
    fn default() -> Self {
        let type_colors = HashMap::from([
            (BlockType::DeepWork, Color::Rgb(0x44, 0x88, 0xFF)),
            (BlockType::Admin, Color::Rgb(0x44, 0xDD, 0xFF)),
            (BlockType::Break, Color::Rgb(0x44, 0xFF, 0x88)),
            (BlockType::Meeting, Color::Rgb(0xFF, 0xD7, 0x00)),
            (BlockType::Personal, Color::Rgb(0xCC, 0x66, 0xFF)),
            (BlockType::Event, Color::Rgb(0xFF, 0x88, 0x44)),
            (BlockType::Routine, Color::Rgb(0x9E, 0xA8, 0xB8)),
        ]);

        Theme {
            background: Color::Rgb(0x10, 0x10, 0x18),
            text: Color::Rgb(0xC8, 0xC8, 0xD0),
            text_bright: Color::Rgb(0xFF, 0xFF, 0xFF),
            highlight: Color::Rgb(0xFB, 0x41, 0x96),
            dim: Color::Rgb(0x70, 0x70, 0x80),
            red: Color::Rgb(0xFF, 0x44, 0x44),
            yellow: Color::Rgb(0xFF, 0xD7, 0x00),
            green: Color::Rgb(0x44, 0xFF, 0x88),
            selection_bg: Color::Rgb(0x2A, 0x22, 0x38),
            popup_border: Color::Rgb(0x70, 0x70, 0x80),
            type_colors,
        }
    }
}

/// Parse a hex color string like "#FF4444" into an RGB Color
fn parse_hex_color(hex: &str) -> Option<Color> {
    let hex = hex.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(Color::Rgb(r, g, b))
}

impl Theme {
    /// Build from `[ui]`, keeping defaults for anything unset or unparseable
    pub fn from_config(ui: &UiConfig) -> Self {
        let mut theme = Theme::default();

        for (key, value) in &ui.colors {
            let Some(color) = parse_hex_color(value) else {
                continue;
            };
            match key.as_str() {
                "background" => theme.background = color,
                "text" => theme.text = color,
                "text_bright" => theme.text_bright = color,
                "highlight" => theme.highlight = color,
                "dim" => theme.dim = color,
                "red" => theme.red = color,
                "yellow" => theme.yellow = color,
                "green" => theme.green = color,
                "selection_bg" => theme.selection_bg = color,
                "popup_border" => theme.popup_border = color,
                _ => {}
            }
        }

        for (name, value) in &ui.type_colors {
            if let (Ok(block_type), Some(color)) = (name.parse::<BlockType>(), parse_hex_color(value))
            {
                theme.type_colors.insert(block_type, color);
            }
        }

        theme
    }

    pub fn type_color(&self, block_type: BlockType) -> Color {
        self.type_colors
            .get(&block_type)
            .copied()
            .unwrap_or(self.text)
    }
}

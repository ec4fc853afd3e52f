use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_PRIMARY_COLOR: &str = "#3B82F6";
pub const DEFAULT_TITLE: &str = "Chat Support";
pub const DEFAULT_WELCOME_MESSAGE: &str = "Hello! How can I help you today?";

/// Corner of the page the launcher is pinned to.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Position {
    #[default]
    BottomRight,
    BottomLeft,
}

impl Position {
    pub fn as_str(&self) -> &'static str {
        match self {
            Position::BottomRight => "bottom-right",
            Position::BottomLeft => "bottom-left",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Position {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "bottom-right" => Ok(Position::BottomRight),
            "bottom-left" => Ok(Position::BottomLeft),
            other => Err(format!("unknown widget position '{other}' (expected bottom-right or bottom-left)")),
        }
    }
}

/// How a widget looks when the embedding page does not say otherwise.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WidgetPresentation {
    pub primary_color: String,
    pub position: Position,
    pub title: String,
}

impl Default for WidgetPresentation {
    fn default() -> Self {
        Self {
            primary_color: DEFAULT_PRIMARY_COLOR.to_string(),
            position: Position::default(),
            title: DEFAULT_TITLE.to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WidgetPresentationUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl WidgetPresentationUpdate {
    pub fn is_empty(&self) -> bool {
        self.primary_color.is_none() && self.position.is_none() && self.title.is_none()
    }
}

impl WidgetPresentation {
    /// Merge an update field by field. Blank strings leave the current value.
    pub fn merge(&mut self, update: WidgetPresentationUpdate) {
        if let Some(color) = update.primary_color.filter(|c| !c.trim().is_empty()) {
            self.primary_color = color;
        }
        if let Some(position) = update.position {
            self.position = position;
        }
        if let Some(title) = update.title.filter(|t| !t.trim().is_empty()) {
            self.title = title;
        }
    }
}

/// Suffix that namespaces a widget instance's globals, e.g.
/// `window.ChatbotWidget_<key>` and `window.ChatbotWidgetConfig_<key>`.
pub fn widget_key(assistant_id: &str) -> String {
    assistant_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

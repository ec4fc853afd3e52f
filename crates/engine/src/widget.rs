//! Generates the embeddable chat widget script.

use courier_shared::widget::DEFAULT_WELCOME_MESSAGE;
use courier_shared::{Position, WidgetPresentation};
use serde::Serialize;

const TEMPLATE: &str = include_str!("../assets/widget.js");
const DEFAULTS_SLOT: &str = "/*__COURIER_DEFAULTS__*/null";

/// Values baked into one rendering of the widget script. The embedding page
/// can still override each of them with `data-*` attributes or `src` query
/// parameters.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WidgetScript {
    api_endpoint: String,
    assistant_id: String,
    primary_color: String,
    position: Position,
    title: String,
    welcome_message: String,
}

impl WidgetScript {
    /// `api_endpoint` is the `/api` base the widget posts chat messages to.
    pub fn new(api_endpoint: impl Into<String>) -> Self {
        let presentation = WidgetPresentation::default();
        Self {
            api_endpoint: api_endpoint.into(),
            assistant_id: String::new(),
            primary_color: presentation.primary_color,
            position: presentation.position,
            title: presentation.title,
            welcome_message: DEFAULT_WELCOME_MESSAGE.to_string(),
        }
    }

    pub fn presentation(mut self, presentation: &WidgetPresentation) -> Self {
        self.primary_color = presentation.primary_color.clone();
        self.position = presentation.position;
        self.title = presentation.title.clone();
        self
    }

    pub fn assistant_id(mut self, assistant_id: impl Into<String>) -> Self {
        self.assistant_id = assistant_id.into();
        self
    }

    pub fn primary_color(mut self, color: impl Into<String>) -> Self {
        self.primary_color = color.into();
        self
    }

    pub fn position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn welcome_message(mut self, welcome: impl Into<String>) -> Self {
        self.welcome_message = welcome.into();
        self
    }

    pub fn render(&self) -> String {
        TEMPLATE.replacen(DEFAULTS_SLOT, &self.defaults_literal(), 1)
    }

    /// The defaults as a JS object literal that is safe inside `<script>`.
    fn defaults_literal(&self) -> String {
        // Serializing a struct of strings cannot fail.
        let json = serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string());
        json.replace('<', "\\u003c")
            .replace('>', "\\u003e")
            .replace('\u{2028}', "\\u2028")
            .replace('\u{2029}', "\\u2029")
    }
}

//! Embed snippets for pasting into a host page.

use courier_shared::Position;
use courier_shared::widget::widget_key;

#[derive(Debug, Clone, Default)]
pub struct EmbedOptions {
    pub assistant_id: String,
    pub title: Option<String>,
    pub color: Option<String>,
    pub position: Option<Position>,
    pub welcome: Option<String>,
}

impl EmbedOptions {
    fn attributes(&self) -> Vec<(&'static str, String)> {
        let mut attrs = vec![("data-assistant-id", self.assistant_id.clone())];
        if let Some(title) = &self.title {
            attrs.push(("data-title", title.clone()));
        }
        if let Some(color) = &self.color {
            attrs.push(("data-color", color.clone()));
        }
        if let Some(position) = self.position {
            attrs.push(("data-position", position.to_string()));
        }
        if let Some(welcome) = &self.welcome {
            attrs.push(("data-welcome", welcome.clone()));
        }
        attrs
    }
}

/// The `<script>` tag that loads one widget instance from `server_url`.
pub fn snippet(server_url: &str, options: &EmbedOptions) -> String {
    let mut tag = format!(
        "<script src=\"{}/widget.js\"",
        escape_attribute(server_url.trim_end_matches('/'))
    );
    for (name, value) in options.attributes() {
        tag.push_str(&format!("\n  {}=\"{}\"", name, escape_attribute(&value)));
    }
    tag.push_str("\n></script>");
    tag
}

/// The script tag preceded by an event hooks object and followed by
/// examples of driving the widget from page script.
pub fn advanced_snippet(server_url: &str, options: &EmbedOptions) -> String {
    let key = widget_key(&options.assistant_id);

    format!(
        r#"<script>
  window.ChatbotWidgetConfig_{key} = {{
    onOpen: function () {{ console.log('Chat opened'); }},
    onClose: function () {{ console.log('Chat closed'); }},
    onMessage: function (message, isUser) {{ console.log(isUser ? 'User:' : 'Bot:', message); }}
  }};
</script>
{tag}
<script>
  // window.ChatbotWidget_{key}.open();
  // window.ChatbotWidget_{key}.close();
  // window.ChatbotWidget_{key}.toggle();
  // window.ChatbotWidget_{key}.sendMessage('Hello!');
  // window.ChatbotWidget_{key}.isOpen();
</script>"#,
        tag = snippet(server_url, options)
    )
}

fn escape_attribute(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
    out
}

use courier_shared::Position;
use serde::Deserialize;

/// Query string accepted by `GET /widget.js`. Names match the parameters the
/// widget itself reads from its `src` URL.
#[derive(Deserialize, Debug, Default)]
pub struct WidgetQuery {
    pub assistant: Option<String>,
    pub color: Option<String>,
    pub position: Option<String>,
    pub title: Option<String>,
    pub welcome: Option<String>,
}

impl WidgetQuery {
    pub fn position(&self) -> Option<Position> {
        self.position.as_deref().and_then(|p| p.parse().ok())
    }
}

pub mod schemas;
pub mod widget;

pub use schemas::{
    ChatRequest, ChatResponse, ConfigUpdate, ErrorResponse, HIDDEN_API_KEY, HealthResponse,
    LoginRequest, LoginResponse, MessageResponse, PublicWidgetConfig, RedactedConfig,
};
pub use widget::{Position, WidgetPresentation, WidgetPresentationUpdate};

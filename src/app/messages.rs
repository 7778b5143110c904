use crate::kiosk::Event;

/// Messages from background tasks to the main UI thread
pub enum BackgroundMessage {
    /// A backend or worker result to feed back into the session
    Response(Event),
    /// A background task crashed
    Error(String),
}

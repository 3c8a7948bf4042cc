/// Immutable per-process metadata shared by all handlers.
pub struct AppState {
    pub service: String,
    pub version: String,
}

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PithError {
    #[error("window creation failed: {0}")]
    Window(#[from] tao::error::OsError),

    #[error("webview creation failed: {0}")]
    Webview(#[from] wry::Error),

    #[error("file watcher failed: {0}")]
    Watcher(#[from] notify::Error),
}

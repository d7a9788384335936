use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use serde::Deserialize;
use tao::{
    dpi::LogicalSize,
    event::{Event as TaoEvent, WindowEvent},
    event_loop::{ControlFlow, EventLoopBuilder, EventLoopProxy, EventLoopWindowTarget},
    window::{Window, WindowBuilder, WindowId},
};
use wry::{WebView, WebViewBuilder};

mod error;
mod outline;
mod page;
mod tracker;
mod view;

use error::PithError;
use tracker::ScrollSnapshot;
use view::DocumentView;

#[derive(Debug)]
enum UserEvent {
    CloseWindow(WindowId),
    QuitApp,
    /// Scroll tick resolved to a new active heading.
    SetActive(WindowId, String),
    /// Outline entry clicked.
    Navigate(WindowId, String),
    /// Watched file changed on disk.
    Reload(WindowId),
}

/// Messages posted by the page script.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcMessage {
    Scroll(ScrollSnapshot),
    TocClick { id: String },
    CloseWindow,
    QuitApp,
}

const INITIAL_WIDTH: f64 = 1000.0;
const HEIGHT: f64 = 900.0;

struct AppWindow {
    _window: Arc<Window>,
    webview: WebView,
    view: Arc<Mutex<DocumentView>>,
    path: Option<PathBuf>,
    _watcher: Option<RecommendedWatcher>,
}

fn create_window(
    event_loop: &EventLoopWindowTarget<UserEvent>,
    proxy: EventLoopProxy<UserEvent>,
    path: Option<&PathBuf>,
) -> Result<(WindowId, AppWindow), PithError> {
    let (content, filename) = load_file(path);
    let view = Arc::new(Mutex::new(DocumentView::new(&content)));
    let full_html = match view.lock() {
        Ok(view) => page::build_page(&content, view.outline()),
        Err(_) => page::build_page(&content, &[]),
    };

    let window = WindowBuilder::new()
        .with_title(format!("Pith - {}", filename))
        .with_inner_size(LogicalSize::new(INITIAL_WIDTH, HEIGHT))
        .build(event_loop)?;

    let window = Arc::new(window);
    let window_id = window.id();
    let proxy_clone = proxy.clone();
    let ipc_view = Arc::clone(&view);

    let webview = WebViewBuilder::new()
        .with_html(&full_html)
        .with_ipc_handler(move |req| {
            let msg = req.body();
            let message: IpcMessage = match serde_json::from_str(msg) {
                Ok(m) => m,
                Err(e) => {
                    log::warn!("dropping malformed ipc message: {}", e);
                    return;
                }
            };
            match message {
                IpcMessage::Scroll(snapshot) => {
                    let Ok(mut view) = ipc_view.lock() else { return };
                    let changed = view
                        .tracker_mut()
                        .on_scroll(&snapshot, snapshot.scroll_top)
                        .map(str::to_string);
                    if let Some(id) = changed {
                        let _ = proxy_clone.send_event(UserEvent::SetActive(window_id, id));
                    }
                }
                IpcMessage::TocClick { id } => {
                    let Ok(mut view) = ipc_view.lock() else { return };
                    // Click wins over whatever the smooth scroll reports next.
                    view.tracker_mut().activate(&id);
                    let _ = proxy_clone.send_event(UserEvent::Navigate(window_id, id));
                }
                IpcMessage::CloseWindow => {
                    let _ = proxy_clone.send_event(UserEvent::CloseWindow(window_id));
                }
                IpcMessage::QuitApp => {
                    let _ = proxy_clone.send_event(UserEvent::QuitApp);
                }
            }
        })
        .with_navigation_handler(|url| {
            if url.starts_with("about:") || url.starts_with("data:") {
                return true;
            }
            if url.starts_with("http://") || url.starts_with("https://") {
                open_external(&url);
                return false;
            }
            true
        })
        .build(&window)?;

    let watcher = match path {
        Some(path) => Some(watch_file(path, proxy, window_id)?),
        None => None,
    };

    Ok((
        window_id,
        AppWindow {
            _window: window,
            webview,
            view,
            path: path.cloned(),
            _watcher: watcher,
        },
    ))
}

fn watch_file(
    path: &PathBuf,
    proxy: EventLoopProxy<UserEvent>,
    window_id: WindowId,
) -> Result<RecommendedWatcher, PithError> {
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        match res {
            Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                let _ = proxy.send_event(UserEvent::Reload(window_id));
            }
            Ok(_) => {}
            Err(e) => log::warn!("file watcher error: {}", e),
        }
    })?;
    watcher.watch(path, RecursiveMode::NonRecursive)?;
    Ok(watcher)
}

fn open_external(url: &str) {
    #[cfg(target_os = "macos")]
    let opener = "open";
    #[cfg(target_os = "linux")]
    let opener = "xdg-open";
    #[cfg(target_os = "windows")]
    let opener = "explorer";

    if let Err(e) = std::process::Command::new(opener).arg(url).spawn() {
        log::warn!("could not open {}: {}", url, e);
    }
}

fn main() -> Result<(), PithError> {
    env_logger::init();

    let initial_path = std::env::args().nth(1).map(|arg| {
        let path = PathBuf::from(&arg);
        path.canonicalize().unwrap_or(path)
    });

    let event_loop = EventLoopBuilder::<UserEvent>::with_user_event().build();
    let proxy = event_loop.create_proxy();
    let mut windows: HashMap<WindowId, AppWindow> = HashMap::new();

    // Only create the initial window if a file was passed on the command line
    if let Some(ref path) = initial_path {
        let (id, app_window) = create_window(&event_loop, proxy.clone(), Some(path))?;
        windows.insert(id, app_window);
    }

    event_loop.run(move |event, event_loop, control_flow| {
        *control_flow = ControlFlow::Wait;

        match event {
            TaoEvent::Opened { urls } => {
                // One window per opened file
                for url in urls {
                    if let Ok(path) = url.to_file_path() {
                        match create_window(event_loop, proxy.clone(), Some(&path)) {
                            Ok((id, app_window)) => {
                                windows.insert(id, app_window);
                            }
                            Err(e) => log::error!("could not open {}: {}", path.display(), e),
                        }
                    }
                }
            }
            TaoEvent::UserEvent(UserEvent::CloseWindow(window_id)) => {
                windows.remove(&window_id);
                if windows.is_empty() {
                    *control_flow = ControlFlow::Exit;
                }
            }
            TaoEvent::UserEvent(UserEvent::QuitApp) => {
                *control_flow = ControlFlow::Exit;
            }
            TaoEvent::UserEvent(UserEvent::SetActive(window_id, id)) => {
                if let Some(app) = windows.get(&window_id) {
                    eval(&app.webview, &format!("setActiveToc({});", js_string(&id)));
                }
            }
            TaoEvent::UserEvent(UserEvent::Navigate(window_id, id)) => {
                if let Some(app) = windows.get(&window_id) {
                    let quoted = js_string(&id);
                    eval(
                        &app.webview,
                        &format!("setActiveToc({}); scrollToHeading({});", quoted, quoted),
                    );
                }
            }
            TaoEvent::UserEvent(UserEvent::Reload(window_id)) => {
                if let Some(app) = windows.get(&window_id) {
                    reload_document(app);
                }
            }
            TaoEvent::WindowEvent {
                event: WindowEvent::CloseRequested,
                window_id,
                ..
            } => {
                windows.remove(&window_id);
                if windows.is_empty() {
                    *control_flow = ControlFlow::Exit;
                }
            }
            _ => {}
        }
    });
}

/// Rebuild the document from disk: fresh outline, tracker reset to empty,
/// page replaced wholesale. The old page's scroll reporting dies with it.
fn reload_document(app: &AppWindow) {
    let (content, filename) = load_file(app.path.as_ref());
    log::debug!("reloading {}", filename);

    let Ok(mut view) = app.view.lock() else { return };
    view.load(&content);
    let full_html = page::build_page(&content, view.outline());
    drop(view);

    if let Err(e) = app.webview.load_html(&full_html) {
        log::error!("reload failed: {}", e);
    }
}

fn eval(webview: &WebView, script: &str) {
    if let Err(e) = webview.evaluate_script(script) {
        log::warn!("script evaluation failed: {}", e);
    }
}

/// JSON-quote a value for interpolation into a script call.
fn js_string(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

fn load_file(path: Option<&PathBuf>) -> (String, String) {
    if let Some(path) = path {
        match std::fs::read_to_string(path) {
            Ok(c) => (
                c,
                path.file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("untitled")
                    .to_string(),
            ),
            Err(e) => (
                format!("# Error\n\nCould not load file: {}", e),
                "Error".to_string(),
            ),
        }
    } else {
        (
            "# Welcome to Pith\n\nOpen a markdown file to get started.\n\nThe table of contents on the right follows your reading position.".to_string(),
            "Pith".to_string(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ipc_scroll_message_decodes() {
        let msg: IpcMessage = serde_json::from_str(
            r#"{"type": "scroll", "scroll_top": 42.0, "headings": [{"id": "a", "top": 10.0}]}"#,
        )
        .unwrap();
        match msg {
            IpcMessage::Scroll(snapshot) => {
                assert_eq!(snapshot.scroll_top, 42.0);
                assert_eq!(snapshot.headings.len(), 1);
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn ipc_click_and_control_messages_decode() {
        let msg: IpcMessage =
            serde_json::from_str(r#"{"type": "toc_click", "id": "hello-world"}"#).unwrap();
        assert!(matches!(msg, IpcMessage::TocClick { id } if id == "hello-world"));

        assert!(matches!(
            serde_json::from_str::<IpcMessage>(r#"{"type": "close_window"}"#).unwrap(),
            IpcMessage::CloseWindow
        ));
        assert!(matches!(
            serde_json::from_str::<IpcMessage>(r#"{"type": "quit_app"}"#).unwrap(),
            IpcMessage::QuitApp
        ));
    }

    #[test]
    fn malformed_ipc_is_an_error_not_a_panic() {
        assert!(serde_json::from_str::<IpcMessage>("resize:100:200").is_err());
    }

    #[test]
    fn js_string_quotes_awkward_ids() {
        assert_eq!(js_string("don't-panic!"), r#""don't-panic!""#);
        assert_eq!(js_string(r#"a"b"#), r#""a\"b""#);
    }

    #[test]
    fn missing_file_renders_an_error_document() {
        let (content, filename) = load_file(Some(&PathBuf::from("/definitely/not/here.md")));
        assert!(content.starts_with("# Error"));
        assert_eq!(filename, "Error");
    }
}

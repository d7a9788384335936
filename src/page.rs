//! HTML composition for the viewer page.
//!
//! The document body is rendered once per load; heading tags get the same
//! anchor ids the outline carries, so sidebar clicks land on the right
//! element. The embedded script only reports geometry and applies
//! decisions pushed back from the host.

use pulldown_cmark::{html, Options, Parser};

use crate::outline::{anchor_id, HeadingNode};

pub fn markdown_to_html(markdown: &str) -> String {
    let options = Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_TASKLISTS;

    let parser = Parser::new_ext(markdown, options);
    let mut html_output = String::new();
    html::push_html(&mut html_output, parser);
    html_output
}

/// Inject an `id` into every rendered `<h1>`-`<h6>`, derived from the
/// heading's plain text with the same rule the outline uses.
pub fn add_heading_ids(html: &str) -> String {
    let mut result = html.to_string();
    for tag in ["h1", "h2", "h3", "h4", "h5", "h6"] {
        let open_tag = format!("<{}>", tag);
        let close_tag = format!("</{}>", tag);

        let mut new_result = String::new();
        let mut remaining = result.as_str();

        while let Some(start) = remaining.find(&open_tag) {
            new_result.push_str(&remaining[..start]);
            remaining = &remaining[start + open_tag.len()..];

            if let Some(end) = remaining.find(&close_tag) {
                let inner = &remaining[..end];
                // Recover the plain text the extractor saw: drop inline
                // tags, then undo the renderer's entity escaping, so the
                // injected id equals the outline id for the same heading.
                let id = anchor_id(&decode_entities(&strip_html_tags(inner)));
                new_result.push_str(&format!(
                    r#"<{} id="{}">{}</{}>"#,
                    tag,
                    html_escape(&id),
                    inner,
                    tag
                ));
                remaining = &remaining[end + close_tag.len()..];
            }
        }
        new_result.push_str(remaining);
        result = new_result;
    }
    result
}

/// Rendered document body with anchors in place.
pub fn render_document(markdown: &str) -> String {
    add_heading_ids(&markdown_to_html(markdown))
}

fn strip_html_tags(s: &str) -> String {
    let mut result = String::new();
    let mut in_tag = false;
    for c in s.chars() {
        if c == '<' {
            in_tag = true;
        } else if c == '>' {
            in_tag = false;
        } else if !in_tag {
            result.push(c);
        }
    }
    result
}

/// Undo the entity escaping the HTML renderer applies to text content.
/// `&amp;` goes last so double-escaped input stays escaped once.
fn decode_entities(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&amp;", "&")
}

pub fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Nested sidebar markup for the outline tree. Entries carry their anchor
/// in `data-anchor`; the page script wires up the clicks.
pub fn toc_html(outline: &[HeadingNode]) -> String {
    let mut out = String::new();
    for node in outline {
        push_toc_entry(&mut out, node);
    }
    out
}

fn push_toc_entry(out: &mut String, node: &HeadingNode) {
    out.push_str(&format!(
        r##"<a href="#" class="toc-item toc-level-{}" data-anchor="{}">{}</a>"##,
        node.level,
        html_escape(&node.id),
        html_escape(&node.text)
    ));
    if !node.children.is_empty() {
        out.push_str(r#"<div class="toc-children">"#);
        for child in &node.children {
            push_toc_entry(out, child);
        }
        out.push_str("</div>");
    }
}

/// The complete page handed to the webview.
pub fn build_page(markdown: &str, outline: &[HeadingNode]) -> String {
    let content = render_document(markdown);
    let toc = toc_html(outline);

    format!(
        r##"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <style>{}</style>
</head>
<body>
    <div class="container">
        <main class="content" id="content">{}</main>
        <nav class="toc" id="toc">{}</nav>
    </div>
    <script>{}</script>
</body>
</html>"##,
        CSS, content, toc, JS
    )
}

const CSS: &str = r##"
* {
    margin: 0;
    padding: 0;
    box-sizing: border-box;
}

:root {
    --bg-primary: #0d1117;
    --bg-secondary: #161b22;
    --bg-tertiary: #21262d;
    --text-primary: #e6edf3;
    --text-secondary: #8b949e;
    --border-color: #30363d;
    --accent-color: #58a6ff;
}

body {
    font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Helvetica, Arial, sans-serif;
    background: var(--bg-primary);
    color: var(--text-primary);
    line-height: 1.6;
    overflow: hidden;
    font-size: 15px;
}

.container {
    display: flex;
    height: 100vh;
}

.content {
    flex: 1;
    overflow-y: auto;
    padding: 32px 48px;
}

.toc {
    width: 220px;
    min-width: 160px;
    background: var(--bg-secondary);
    border-left: 1px solid var(--border-color);
    overflow-y: auto;
    padding: 16px 0;
    order: 2;
}

.toc-item {
    display: block;
    padding: 5px 14px;
    color: var(--text-secondary);
    text-decoration: none;
    font-size: 12px;
    border-right: 2px solid transparent;
}

.toc-item:hover {
    color: var(--text-primary);
    background: var(--bg-tertiary);
    border-right-color: var(--accent-color);
}

.toc-item.active {
    color: var(--text-primary);
    background: rgba(88, 166, 255, 0.1);
    border-right-color: var(--accent-color);
}

.toc-level-1 { font-weight: 600; color: var(--text-primary); }
.toc-children .toc-level-2 { font-weight: 500; padding-left: 26px; }
.toc-children .toc-level-3 { font-weight: 400; padding-left: 38px; }

.content h1, .content h2, .content h3, .content h4, .content h5, .content h6 {
    margin-top: 24px;
    margin-bottom: 16px;
    font-weight: 600;
    line-height: 1.25;
}

.content h1 { font-size: 2em; padding-bottom: 0.3em; border-bottom: 1px solid var(--border-color); }
.content h2 { font-size: 1.5em; padding-bottom: 0.3em; border-bottom: 1px solid var(--border-color); }
.content h3 { font-size: 1.25em; }
.content h4 { font-size: 1em; }
.content h5 { font-size: 0.875em; }
.content h6 { font-size: 0.85em; color: var(--text-secondary); }

.content p { margin-bottom: 16px; }

.content a { color: var(--accent-color); text-decoration: none; }
.content a:hover { text-decoration: underline; }

.content code {
    padding: 0.2em 0.4em;
    font-size: 85%;
    background: var(--bg-tertiary);
    border-radius: 6px;
    font-family: ui-monospace, SFMono-Regular, "SF Mono", Menlo, Consolas, monospace;
}

.content pre {
    padding: 16px;
    overflow: auto;
    font-size: 85%;
    line-height: 1.45;
    background: var(--bg-secondary);
    border-radius: 6px;
    margin-bottom: 16px;
}

.content pre code { padding: 0; background: transparent; }

.content blockquote {
    padding: 0 1em;
    color: var(--text-secondary);
    border-left: 4px solid var(--border-color);
    margin-bottom: 16px;
}

.content ul, .content ol { padding-left: 2em; margin-bottom: 16px; }
.content li { margin-bottom: 4px; }

.content table { border-collapse: collapse; margin-bottom: 16px; width: 100%; }
.content th, .content td { padding: 6px 13px; border: 1px solid var(--border-color); }
.content th { font-weight: 600; background: var(--bg-secondary); }
.content tr:nth-child(2n) { background: var(--bg-secondary); }
"##;

const JS: &str = r##"
function postIpc(msg) {
    if (window.ipc) {
        window.ipc.postMessage(JSON.stringify(msg));
    }
}

// Geometry reporting. The host decides which entry is active; the page
// just ships a snapshot per animation frame while scrolling.
let scrollPending = false;

function reportScroll() {
    scrollPending = false;
    const content = document.getElementById('content');
    const headings = [];
    content.querySelectorAll('h1, h2, h3, h4, h5, h6').forEach(h => {
        headings.push({ id: h.id, top: h.offsetTop });
    });
    postIpc({ type: 'scroll', scroll_top: content.scrollTop, headings: headings });
}

function onScroll() {
    if (!scrollPending) {
        scrollPending = true;
        requestAnimationFrame(reportScroll);
    }
}

// Entry points the host invokes via evaluate_script.
function setActiveToc(id) {
    document.querySelectorAll('.toc-item').forEach(item => {
        item.classList.toggle('active', item.dataset.anchor === id);
    });
}

function scrollToHeading(id) {
    const el = document.getElementById(id);
    if (el) {
        el.scrollIntoView({ behavior: 'smooth', block: 'start' });
    }
}

document.addEventListener('keydown', function(e) {
    if ((e.metaKey || e.ctrlKey) && e.key === 'w') {
        e.preventDefault();
        postIpc({ type: 'close_window' });
        return;
    }
    if ((e.metaKey || e.ctrlKey) && e.key === 'q') {
        e.preventDefault();
        postIpc({ type: 'quit_app' });
    }
});

document.addEventListener('DOMContentLoaded', function() {
    document.getElementById('content').addEventListener('scroll', onScroll);

    document.querySelectorAll('.toc-item').forEach(item => {
        item.addEventListener('click', function(e) {
            e.preventDefault();
            postIpc({ type: 'toc_click', id: item.dataset.anchor });
        });
    });

    reportScroll();
});
"##;

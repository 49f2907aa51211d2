//! HTML page for the mirrored channel.
//!
//! Rendering is a pure function of the cache document, so the same document
//! always produces the same bytes.

use std::fmt::Write;

use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};

use crate::catalog::{CacheDocument, VideoItem};

pub const DESCRIPTION_PREVIEW_CHARS: usize = 120;
const FALLBACK_TITLE: &str = "Canal YouTube";
const FALLBACK_DESCRIPTION: &str = "Sin descripción";

const STYLE: &str = r#"        body {font-family:system-ui,sans-serif;margin:0;background:#000;color:#fff}
        header {background:#c00;padding:20px;text-align:center;position:sticky;top:0;z-index:100}
        h1 {margin:0;font-size:2em}
        .tabs {display:flex;justify-content:center;gap:20px;margin:20px 0;flex-wrap:wrap}
        .tab-btn {padding:12px 30px;font-size:1.1em;background:#333;border:none;color:white;cursor:pointer;border-radius:8px;transition:.3s}
        .tab-btn.active {background:#c00;font-weight:bold}
        .tab-btn:hover {background:#a00}
        .description {background:rgba(255,255,255,0.1);padding:20px;border-radius:12px;max-width:900px;margin:20px auto;white-space:pre-line}
        .video-grid {display:grid;grid-template-columns:repeat(auto-fill,minmax(320px,1fr));gap:20px;padding:20px;max-width:1400px;margin:0 auto}
        .video-card {background:#111;border-radius:12px;overflow:hidden;transition:.2s;position:relative}
        .video-card:hover {transform:scale(1.03)}
        .video-card a {color:inherit;text-decoration:none}
        .video-card img {width:100%;height:180px;object-fit:cover}
        .video-info {padding:12px}
        .video-info h3 {margin:0 0 8px;font-size:1.1em;line-height:1.3}
        .video-info p {margin:0;color:#ccc;font-size:0.9em;overflow:hidden;display:-webkit-box;-webkit-line-clamp:3;-webkit-box-orient:vertical}
        .meta {font-size:0.8em;color:#888;margin-top:8px}
        .short-badge {position:absolute;top:10px;left:10px;background:#c00;padding:4px 8px;border-radius:4px;font-size:0.8em;font-weight:bold}
        footer {text-align:center;color:#666;font-size:0.8em;padding:20px}
        @media(max-width:600px){.video-grid{grid-template-columns:1fr}.tabs{flex-direction:column;align-items:center}}
"#;

const SCRIPT: &str = r#"    <script>
        function show(id, button) {
            document.querySelectorAll('.tab-content').forEach(e => e.style.display = 'none');
            document.getElementById(id).style.display = 'block';
            document.querySelectorAll('.tab-btn').forEach(b => b.classList.remove('active'));
            button.classList.add('active');
        }
    </script>
"#;

/// Cuts descriptions to [`DESCRIPTION_PREVIEW_CHARS`] characters, adding an
/// ellipsis when something was cut.
pub fn truncate_description(description: &str) -> String {
    let mut chars = description.chars();
    let preview: String = chars.by_ref().take(DESCRIPTION_PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{preview}...")
    } else {
        preview
    }
}

/// `YYYY-MM-DD` part of an ISO-8601 timestamp.
fn publish_date(published_at: &str) -> String {
    published_at.chars().take(10).collect()
}

fn or_fallback<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() { fallback } else { value }
}

pub fn render_page(document: &CacheDocument) -> String {
    let title = or_fallback(&document.channel_title, FALLBACK_TITLE);
    let description = or_fallback(&document.channel_description, FALLBACK_DESCRIPTION);

    let mut html = String::with_capacity(4096 + 512 * document.videos.len());
    html.push_str("<!DOCTYPE html>\n<html lang=\"es\">\n<head>\n");
    html.push_str("    <meta charset=\"UTF-8\">\n");
    html.push_str("    <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    let _ = writeln!(html, "    <title>{} - Mirror</title>", text(title));
    html.push_str("    <style>\n");
    html.push_str(STYLE);
    html.push_str("    </style>\n</head>\n<body>\n");

    let _ = writeln!(html, "    <header><h1>{}</h1></header>", text(title));
    html.push_str("    <div class=\"tabs\">\n");
    html.push_str(
        "        <button class=\"tab-btn active\" onclick=\"show('videos', this)\">Vídeos</button>\n",
    );
    let _ = writeln!(
        html,
        "        <button class=\"tab-btn\" onclick=\"show('shorts', this)\">Shorts ({})</button>",
        document.shorts.len()
    );
    html.push_str("    </div>\n");
    let _ = writeln!(html, "    <div class=\"description\">{}</div>", text(description));

    html.push_str("\n    <div id=\"videos\" class=\"tab-content\">\n        <div class=\"video-grid\">\n");
    for video in &document.regular_videos {
        push_regular_card(&mut html, video);
    }
    html.push_str("        </div>\n    </div>\n");

    html.push_str(
        "\n    <div id=\"shorts\" class=\"tab-content\" style=\"display:none\">\n        <div class=\"video-grid\">\n",
    );
    for video in &document.shorts {
        push_short_card(&mut html, video);
    }
    html.push_str("        </div>\n    </div>\n\n");

    if !document.last_update.is_empty() {
        let _ = writeln!(
            html,
            "    <footer>Actualizado: {}</footer>",
            text(&document.last_update)
        );
    }
    html.push_str(SCRIPT);
    html.push_str("</body>\n</html>\n");
    html
}

fn push_regular_card(html: &mut String, video: &VideoItem) {
    html.push_str("            <div class=\"video-card\">\n");
    let _ = writeln!(
        html,
        "                <a href=\"https://www.youtube.com/watch?v={}\" target=\"_blank\" rel=\"noopener\">",
        attr(&video.video_id)
    );
    push_thumbnail(html, video);
    html.push_str("                    <div class=\"video-info\">\n");
    let _ = writeln!(html, "                        <h3>{}</h3>", text(&video.title));
    let _ = writeln!(
        html,
        "                        <p>{}</p>",
        text(&truncate_description(&video.description))
    );
    let _ = writeln!(
        html,
        "                        <div class=\"meta\">{}</div>",
        text(&publish_date(&video.published_at))
    );
    html.push_str("                    </div>\n                </a>\n            </div>\n");
}

fn push_short_card(html: &mut String, video: &VideoItem) {
    html.push_str("            <div class=\"video-card\">\n");
    html.push_str("                <span class=\"short-badge\">SHORT</span>\n");
    let _ = writeln!(
        html,
        "                <a href=\"https://www.youtube.com/shorts/{}\" target=\"_blank\" rel=\"noopener\">",
        attr(&video.video_id)
    );
    push_thumbnail(html, video);
    html.push_str("                    <div class=\"video-info\">\n");
    let _ = writeln!(html, "                        <h3>{}</h3>", text(&video.title));
    let _ = writeln!(
        html,
        "                        <div class=\"meta\">{}</div>",
        text(&publish_date(&video.published_at))
    );
    html.push_str("                    </div>\n                </a>\n            </div>\n");
}

fn push_thumbnail(html: &mut String, video: &VideoItem) {
    let _ = writeln!(
        html,
        "                    <img src=\"{}\" alt=\"{}\" loading=\"lazy\">",
        attr(&video.thumbnail),
        attr(&video.title)
    );
}

//! Server-rendered HTML for the interactive shell

use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::models::ScrapeResult;

const TITLE: &str = "YouTube Playlist Scraper";

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; max-width: 960px; margin: 2rem auto; padding: 0 1rem; }
form { display: flex; gap: .5rem; margin: 1rem 0; }
input[type=text] { flex: 1; padding: .5rem; }
.error { background: #fde8e8; color: #9b1c1c; padding: .75rem; border-radius: 4px; }
.success { background: #e6f6ea; color: #1e6b34; padding: .75rem; border-radius: 4px; }
.busy { color: #555; }
details { border: 1px solid #ddd; border-radius: 4px; padding: .5rem; margin: .5rem 0; }
summary { cursor: pointer; font-weight: 600; }
pre { background: #f6f8fa; padding: .75rem; overflow-x: auto; }
"#;

fn layout(body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>{style}</style>
</head>
<body>
<h1>{title}</h1>
<p>Enter a course name to search for related YouTube playlists and extract video details.</p>
{body}
</body>
</html>"#,
        title = TITLE,
        style = STYLE,
        body = body
    )
}

fn form(course_name: &str) -> String {
    format!(
        r#"<form method="post" action="/scrape" onsubmit="document.getElementById('busy').hidden = false; this.querySelector('button').disabled = true;">
<input type="text" name="course_name" placeholder="Course Name" value="{value}" autofocus>
<button type="submit">Scrape Playlist</button>
</form>
<p id="busy" class="busy" hidden>⏳ Scraping YouTube playlist... (this may take up to a minute)</p>"#,
        value = encode_double_quoted_attribute(course_name)
    )
}

/// The input form, optionally with an inline error
pub fn form_page(course_name: &str, error: Option<&str>) -> String {
    let mut body = form(course_name);
    if let Some(error) = error {
        body.push_str(&format!(r#"<div class="error">Error: {}</div>"#, encode_text(error)));
    }
    layout(&body)
}

fn field(label: &str, value: Option<&str>) -> String {
    format!(
        "<li><strong>{}</strong>: {}</li>",
        label,
        encode_text(value.unwrap_or("N/A"))
    )
}

/// Form plus the playlist info, one expandable entry per video and a download link
pub fn results_page(course_name: &str, result: &ScrapeResult, download_name: &str, playlist_json: &str) -> String {
    let mut body = form(course_name);

    body.push_str(&format!(
        r#"<div class="success">Scraping complete! {} videos kept.</div>
<h2>Playlist Information</h2>
<pre>{}</pre>
<h2>Videos</h2>
"#,
        result.videos.len(),
        encode_text(playlist_json)
    ));

    for video in &result.videos {
        body.push_str(&format!("<details>\n<summary>{}</summary>\n<ul>\n", encode_text(&video.title)));
        body.push_str(&field("URL", Some(&video.url)));
        body.push_str(&field("Channel", Some(&video.channel)));
        body.push_str(&field("Duration", video.duration.as_deref()));
        body.push_str(&field("Views", video.views.as_deref()));
        body.push_str(&field("Upload Time", video.upload_time.as_deref()));
        body.push_str("</ul>\n");
        if let Some(thumbnail) = &video.thumbnail {
            body.push_str(&format!(
                r#"<img src="{}" width="320" alt="{}">"#,
                encode_double_quoted_attribute(thumbnail),
                encode_double_quoted_attribute(&video.title)
            ));
        }
        body.push_str("</details>\n");
    }

    body.push_str(&format!(
        r#"<h2>Download JSON</h2>
<p><a href="/download/{name}" download="{name}">Download Results as JSON</a></p>"#,
        name = encode_double_quoted_attribute(download_name)
    ));

    layout(&body)
}

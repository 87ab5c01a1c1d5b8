//! Index page generation
//!
//! One `<img>` per registered stream, laid out in a table. Streams sharing a
//! row sit side by side; a row with fewer images than the widest row spans
//! the missing columns so every row fills the table.

use std::collections::BTreeMap;
use std::fmt::Write;

use axum::http::StatusCode;

use crate::registry::{StreamEntry, StreamRegistry};

/// Render the index page for a registry
pub fn render_index(title: &str, registry: &StreamRegistry) -> String {
    let mut rows: BTreeMap<usize, Vec<&StreamEntry>> = BTreeMap::new();
    for entry in registry.entries() {
        rows.entry(entry.placement.row).or_default().push(entry);
    }

    let columns = rows.values().map(Vec::len).max().unwrap_or(1);
    let title = escape(title);

    let mut html = String::with_capacity(512);
    html.push_str("<html>\n<head>\n");
    let _ = writeln!(html, "<title>{}</title>", title);
    html.push_str("</head>\n<body>\n");
    let _ = writeln!(html, "<h1>{}</h1>", title);
    html.push_str("<table>\n");

    for row in rows.values() {
        html.push_str("<tr>");
        let span = columns / row.len();
        for entry in row {
            if span > 1 {
                let _ = write!(html, "<td colspan=\"{}\">", span);
            } else {
                html.push_str("<td>");
            }
            let _ = write!(
                html,
                "<img src=\"{}\" width=\"{}\" height=\"{}\" />",
                escape(&entry.path),
                entry.placement.width,
                entry.placement.height
            );
            html.push_str("</td>");
        }
        html.push_str("</tr>\n");
    }

    html.push_str("</table>\n</body>\n</html>\n");
    html
}

/// Small HTML body for error responses
pub fn render_error(status: StatusCode) -> String {
    let reason = status.canonical_reason().unwrap_or("Error");
    format!(
        "<html>\n<head><title>Error response</title></head>\n<body>\n\
         <h1>Error response</h1>\n<p>Error code: {}</p>\n<p>Message: {}.</p>\n\
         </body>\n</html>\n",
        status.as_u16(),
        reason
    )
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Placement;

    #[test]
    fn test_single_stream_page() {
        let registry = StreamRegistry::builder()
            .stream("/stream.mjpg", 480, 270)
            .build()
            .unwrap();

        let html = render_index("picamera2 MJPEG streaming demo", &registry);

        assert!(html.contains("<title>picamera2 MJPEG streaming demo</title>"));
        assert!(html.contains(
            "<tr><td><img src=\"/stream.mjpg\" width=\"480\" height=\"270\" /></td></tr>"
        ));
    }

    #[test]
    fn test_rows_span_columns() {
        let registry = StreamRegistry::builder()
            .stream_at("/stream.mjpg", Placement::new(800, 600, 0))
            .stream_at("/stream2.mjpg", Placement::new(400, 300, 1))
            .stream_at("/stream3.mjpg", Placement::new(400, 300, 1))
            .stream_at("/stream4.mjpg", Placement::new(800, 190, 2))
            .build()
            .unwrap();

        let html = render_index("Focus", &registry);

        assert_eq!(html.matches("<img ").count(), 4);
        assert!(html.contains(
            "<tr><td colspan=\"2\"><img src=\"/stream.mjpg\" width=\"800\" height=\"600\" /></td></tr>"
        ));
        assert!(html.contains(
            "<tr><td><img src=\"/stream2.mjpg\" width=\"400\" height=\"300\" /></td>\
             <td><img src=\"/stream3.mjpg\" width=\"400\" height=\"300\" /></td></tr>"
        ));
        assert!(html.contains("<td colspan=\"2\"><img src=\"/stream4.mjpg\""));

        // Rows appear in order
        let first = html.find("/stream.mjpg").unwrap();
        let strip = html.find("/stream4.mjpg").unwrap();
        assert!(first < strip);
    }

    #[test]
    fn test_error_page() {
        let html = render_error(StatusCode::NOT_FOUND);
        assert!(html.contains("<p>Error code: 404</p>"));
        assert!(html.contains("<p>Message: Not Found.</p>"));
    }

    #[test]
    fn test_title_escaped() {
        let registry = StreamRegistry::builder().stream("/s", 1, 1).build().unwrap();
        let html = render_index("<Cam & Co>", &registry);
        assert!(html.contains("<h1>&lt;Cam &amp; Co&gt;</h1>"));
    }
}

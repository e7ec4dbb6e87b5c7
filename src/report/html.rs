// * HTML overlay
// * Self-contained document: status line, one collapsible block per record, copy and
// * dismiss buttons. Refreshes itself until the run is finished.

use crate::report::reporter::Reporter;

const STYLE: &str = "\
#sf-overlay{position:fixed;top:16px;right:16px;width:480px;max-height:85vh;overflow:auto;\
background:#fff;border:1px solid #ccc;border-radius:8px;padding:12px;font:14px sans-serif;\
box-shadow:0 4px 16px rgba(0,0,0,.2)}\
#sf-overlay details{border-top:1px solid #eee;padding:6px 0}\
#sf-overlay pre{white-space:pre-wrap;background:#f7f7f7;padding:8px}\
#sf-overlay .failed{color:#b00020}\
#sf-overlay .group{color:#666}";

const SCRIPT: &str = "\
function sfCopy(id){navigator.clipboard.writeText(document.getElementById(id).innerText);}\
function sfDismiss(){document.getElementById('sf-overlay').style.display='none';}";

/// Escapes text for element content and double-quoted attributes
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn render_html(reporter: &Reporter) -> String {
    let mut body = String::new();
    body.push_str(&format!(
        "<div id=\"sf-status\"><strong>{}</strong></div>\n",
        escape_html(reporter.status())
    ));

    for block in reporter.blocks() {
        let text_id = format!("sf-text-{}", block.index);
        body.push_str("<details open>\n");
        body.push_str(&format!("<summary>{}. {}", block.index, escape_html(&block.title)));
        if !block.group.is_empty() {
            body.push_str(&format!(" <span class=\"group\">{}</span>", escape_html(&block.group)));
        }
        body.push_str("</summary>\n");

        match &block.text {
            Some(text) => {
                body.push_str(&format!("<pre id=\"{text_id}\">{}</pre>\n", escape_html(text)));
                body.push_str(&format!(
                    "<button type=\"button\" onclick=\"sfCopy('{text_id}')\">Copy</button>\n"
                ));
            }
            None => body.push_str("<p class=\"failed\">Generation failed</p>\n"),
        }
        body.push_str(&format!(
            "<a href=\"{}\" target=\"_blank\" rel=\"noopener\">Open item</a>\n",
            escape_html(&block.reference)
        ));
        if let Some((ok, detail)) = &block.paste {
            let class = if *ok { "" } else { " class=\"failed\"" };
            body.push_str(&format!("<p{class}>Paste: {}</p>\n", escape_html(detail)));
        }
        body.push_str("</details>\n");
    }

    let refresh = if reporter.is_finished() {
        ""
    } else {
        "<meta http-equiv=\"refresh\" content=\"3\">\n"
    };
    let hidden = if reporter.is_dismissed() { " style=\"display:none\"" } else { "" };

    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n{refresh}<title>Study Flow</title>\n\
         <style>{STYLE}</style>\n<script>{SCRIPT}</script>\n</head>\n<body>\n\
         <div id=\"sf-overlay\"{hidden}>\n\
         <button type=\"button\" style=\"float:right\" onclick=\"sfDismiss()\">Dismiss</button>\n\
         {body}</div>\n</body>\n</html>\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::CandidateRecord;
    use crate::generation::{GenerationOutcome, Generated};
    use crate::pipeline::events::PipelineEvent;
    use std::sync::Arc;

    #[test]
    fn test_escapes_untrusted_text() {
        assert_eq!(escape_html(r#"<b>"Tom" & 'Jerry'</b>"#), "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;");
    }

    #[test]
    fn test_block_has_copy_link_and_escaped_text() {
        let mut reporter = Reporter::new();
        let record = Arc::new(
            CandidateRecord::new("Essay <1>", "English", "https://x.test/c/1/a/2", "").unwrap(),
        );
        reporter.apply(&PipelineEvent::RecordOutcome {
            index: 1,
            total: 1,
            outcome: GenerationOutcome::from_generated(
                record,
                Some(Generated {
                    text: "a < b".into(),
                    endpoint: "m".into(),
                }),
            ),
        });

        let html = render_html(&reporter);
        assert!(html.contains("<details open>"));
        assert!(html.contains("Essay &lt;1&gt;"));
        assert!(html.contains("<pre id=\"sf-text-1\">a &lt; b</pre>"));
        assert!(html.contains("sfCopy('sf-text-1')"));
        assert!(html.contains("href=\"https://x.test/c/1/a/2\""));
        assert!(html.contains("http-equiv=\"refresh\""));
    }

    #[test]
    fn test_finished_and_dismissed_overlay() {
        let mut reporter = Reporter::new();
        reporter.apply(&PipelineEvent::Aborted { reason: "x".into() });
        reporter.dismiss();
        let html = render_html(&reporter);
        assert!(!html.contains("http-equiv=\"refresh\""));
        assert!(html.contains("id=\"sf-overlay\" style=\"display:none\""));
    }
}

use crate::pipeline::PipelineReport;
use crate::sql::{format_row, QueryOutcome};
use std::fmt::Write;

const PAGE_TITLE: &str = "SQL Query Generator";
const PAGE_HEADER: &str = "Gemini-powered SQL Query Generator with Schema Matching";

const STYLE: &str = "body{font-family:sans-serif;max-width:52rem;margin:2rem auto;padding:0 1rem}\
pre{background:#f4f4f4;padding:.75rem;overflow-x:auto}\
.error{background:#fde8e8;color:#8a1c1c;padding:.75rem;border-radius:4px}\
.row{font-family:monospace;padding:.15rem 0}\
label{display:block;margin-top:1rem}";

/// everything the page template needs for one render
#[derive(Debug, Default)]
pub struct PageView<'a> {
    pub question: &'a str,
    pub error: Option<&'a str>,
    pub report: Option<&'a PipelineReport>,
}

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

fn render_report(out: &mut String, report: &PipelineReport) {
    let _ = write!(
        out,
        "<h3>Generated SQL Query:</h3><pre><code class=\"language-sql\">{}</code></pre>",
        escape_html(&report.generated_sql)
    );
    let _ = write!(
        out,
        "<h3>Corrected SQL Query:</h3><pre><code class=\"language-sql\">{}</code></pre>",
        escape_html(&report.corrected_sql)
    );

    out.push_str("<h3>Query Results:</h3>");
    match &report.outcome {
        QueryOutcome::Rows { rows, .. } if rows.is_empty() => {
            out.push_str("<p><em>No rows returned.</em></p>");
        }
        QueryOutcome::Rows { rows, .. } => {
            for row in rows {
                let _ = write!(out, "<div class=\"row\">{}</div>", escape_html(&format_row(row)));
            }
        }
        QueryOutcome::Failed { message } => {
            let _ = write!(
                out,
                "<div class=\"error\">Error: {}</div>",
                escape_html(message)
            );
        }
    }
}

pub fn render_page(view: &PageView<'_>) -> String {
    let mut out = String::with_capacity(4096);

    let _ = write!(
        out,
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>{}</title><style>{}</style></head><body>",
        PAGE_TITLE, STYLE
    );
    let _ = write!(out, "<h2>{}</h2>", PAGE_HEADER);

    let _ = write!(
        out,
        "<form method=\"post\" action=\"/ask\" enctype=\"multipart/form-data\">\
         <label for=\"file\">Upload SQLite Database</label>\
         <input type=\"file\" id=\"file\" name=\"file\" accept=\".db\">\
         <label for=\"question\">Input your question:</label>\
         <input type=\"text\" id=\"question\" name=\"question\" size=\"60\" value=\"{}\">\
         <p><button type=\"submit\">Ask the question</button></p>\
         </form>",
        escape_html(view.question)
    );

    if let Some(error) = view.error {
        let _ = write!(out, "<div class=\"error\">{}</div>", escape_html(error));
    }

    if let Some(report) = view.report {
        render_report(&mut out, report);
    }

    out.push_str("</body></html>");
    out
}

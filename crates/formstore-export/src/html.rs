use formstore_core::{DocumentProperties, ExportFormat, Grid};

use crate::{Result, TabularWriter};

const HEADER_STYLE: &str = "font-weight: bold; text-align: center; vertical-align: middle";

/// A standalone HTML document holding a single table.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlWriter;

impl TabularWriter for HtmlWriter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Html
    }

    fn write(&self, grid: &Grid, properties: &DocumentProperties) -> Result<Vec<u8>> {
        let mut html = String::new();

        html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
        html.push_str(&format!(
            "<meta name=\"author\" content=\"{}\">\n",
            escape(&properties.creator)
        ));
        html.push_str(&format!(
            "<meta name=\"description\" content=\"{}\">\n",
            escape(&properties.subject)
        ));
        html.push_str(&format!("<title>{}</title>\n", escape(&properties.title)));
        html.push_str("</head>\n<body>\n<table>\n<thead>\n<tr>");
        for label in &grid.header {
            html.push_str(&format!(
                "<th style=\"{}\">{}</th>",
                HEADER_STYLE,
                escape(label)
            ));
        }
        html.push_str("</tr>\n</thead>\n<tbody>\n");

        for row in &grid.rows {
            html.push_str("<tr>");
            for cell in row {
                html.push_str(&format!("<td>{}</td>", escape(cell)));
            }
            html.push_str("</tr>\n");
        }

        html.push_str("</tbody>\n</table>\n</body>\n</html>\n");

        Ok(html.into_bytes())
    }
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

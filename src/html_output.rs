//! HTML report
//!
//! A single self-contained page: the interactive Plotly chart with its run and
//! request dropdowns, followed by a statistics table per run.

use crate::figure::AssembledFigure;
use crate::stats::percentile_label;
use crate::store::{AggregateStore, RunData};

const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

/// HTML report formatter
#[derive(Debug)]
pub struct HtmlOutput<'a> {
    store: &'a AggregateStore,
    figure: &'a AssembledFigure,
    title: String,
}

impl<'a> HtmlOutput<'a> {
    pub fn new(store: &'a AggregateStore, figure: &'a AssembledFigure, title: &str) -> Self {
        Self {
            store,
            figure,
            title: title.to_string(),
        }
    }

    /// Escape HTML special characters to prevent XSS
    fn escape_html(text: &str) -> String {
        text.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
            .replace('"', "&quot;")
            .replace('\'', "&#39;")
    }

    /// JSON is embedded in a `<script>` element. `<` only occurs inside JSON
    /// strings, where `\u003c` is an equivalent escape.
    fn escape_script(json: &str) -> String {
        json.replace('<', "\\u003c")
    }

    fn generate_styles() -> &'static str {
        r#"
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            margin: 20px;
            background-color: #f5f5f5;
        }
        h1, h2 {
            color: #333;
        }
        #chart {
            background-color: white;
            box-shadow: 0 1px 3px rgba(0,0,0,0.1);
            margin-bottom: 20px;
            height: 640px;
        }
        table {
            border-collapse: collapse;
            width: 100%;
            background-color: white;
            box-shadow: 0 1px 3px rgba(0,0,0,0.1);
            margin-bottom: 20px;
        }
        th, td {
            border: 1px solid #ddd;
            padding: 8px;
            text-align: left;
        }
        th {
            background-color: #4a90d9;
            color: white;
            font-weight: bold;
        }
        tr:nth-child(even) {
            background-color: #f9f9f9;
        }
        .request {
            color: #0066cc;
            font-family: monospace;
        }
        .num {
            font-family: monospace;
            text-align: right;
        }
        .ko {
            color: #cc0000;
        }
        .run-meta {
            font-size: 0.9em;
            color: #666;
        }
        .footer {
            margin-top: 20px;
            font-size: 0.8em;
            color: #888;
            text-align: center;
        }
        "#
    }

    fn render_run_table(&self, simulation: &str, run: &RunData) -> String {
        let mut html = String::new();
        let summary = run.summary();

        html.push_str(&format!(
            "    <h2>{} / {}</h2>\n",
            Self::escape_html(simulation),
            Self::escape_html(run.id())
        ));
        html.push_str(&format!(
            "    <p class=\"run-meta\">{} users, {} requests ({} KO), {:.1} s</p>\n",
            summary.users_started,
            summary.requests,
            summary.ko_requests,
            summary.duration_ms() as f64 / 1000.0
        ));

        html.push_str("    <table class=\"stats-table\">\n        <tr><th>Request</th><th>Count</th><th>KO</th><th>Mean (ms)</th>");
        for p in self.store.percentiles() {
            html.push_str(&format!("<th>{} (ms)</th>", percentile_label(*p)));
        }
        html.push_str("</tr>\n");

        for aggregate in run.requests() {
            let stats = aggregate.statistics();
            let ko_class = if aggregate.ko_count() > 0 {
                "num ko"
            } else {
                "num"
            };
            html.push_str(&format!(
                "        <tr><td class=\"request\">{}</td><td class=\"num\">{}</td><td class=\"{}\">{}</td><td class=\"num\">{:.1}</td>",
                Self::escape_html(&aggregate.path().to_string()),
                stats.count,
                ko_class,
                aggregate.ko_count(),
                stats.mean
            ));
            for pv in &stats.percentiles {
                html.push_str(&format!("<td class=\"num\">{:.1}</td>", pv.value));
            }
            html.push_str("</tr>\n");
        }

        html.push_str("    </table>\n");
        html
    }

    /// Generate the complete HTML document
    pub fn to_html(&self) -> serde_json::Result<String> {
        let figure_json = Self::escape_script(&self.figure.figure.to_json()?);
        let mut html = String::new();

        html.push_str("<!DOCTYPE html>\n");
        html.push_str("<html lang=\"en\">\n");

        html.push_str("<head>\n");
        html.push_str("    <meta charset=\"UTF-8\">\n");
        html.push_str(
            "    <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n",
        );
        html.push_str(&format!(
            "    <title>{}</title>\n",
            Self::escape_html(&self.title)
        ));
        html.push_str(&format!("    <script src=\"{}\"></script>\n", PLOTLY_CDN));
        html.push_str("    <style>");
        html.push_str(Self::generate_styles());
        html.push_str("</style>\n");
        html.push_str("</head>\n");

        html.push_str("<body>\n");
        html.push_str(&format!(
            "    <h1>{}</h1>\n",
            Self::escape_html(&self.title)
        ));
        html.push_str("    <div id=\"chart\"></div>\n");
        html.push_str("    <script>\n");
        html.push_str(&format!("        const figure = {};\n", figure_json));
        html.push_str(
            "        Plotly.newPlot('chart', figure.data, figure.layout, {responsive: true});\n",
        );
        html.push_str("    </script>\n");

        for simulation in self.store.simulations() {
            for run in simulation.runs() {
                html.push_str(&self.render_run_table(simulation.id(), run));
            }
        }

        html.push_str("    <div class=\"footer\">\n");
        html.push_str(&format!(
            "        Generated by gstat {}\n",
            Self::escape_html(crate::build_version())
        ));
        html.push_str("    </div>\n");

        html.push_str("</body>\n");
        html.push_str("</html>\n");

        Ok(html)
    }
}

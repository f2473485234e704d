//! Report over one full validation sweep.
#![allow(dead_code)]

use chrono::Utc;
use std::fmt;

use super::ValidationResult;

const REPORT_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8"/>
<title>Profilebot validation report</title>
<style>
body { font-family: sans-serif; margin: 2em; }
table { border-collapse: collapse; }
td { border: 1px solid #ccc; padding: 8px; }
</style>
</head>
<body>
<h1>Profiles with suspect images</h1>
<table>
</table>
<p>[Summary]</p>
<p>Generated [Generated]</p>
</body>
</html>
"#;

const HTML_LINE_TEMPLATE: &str =
    r#"<tr><td>[Profile]</td><td>[Name]</td><td><img src="[ImageURL]" width="250"/></td></tr></table>"#;

/// The invalid results of one "validate/notify all users" run. Rendered to a
/// one-line-per-user text summary for the admin and an HTML artifact for the
/// report slot. Callers pass only invalid results.
pub struct ValidationReport {
    results: Vec<ValidationResult>,
}

impl ValidationReport {
    pub fn new(results: Vec<ValidationResult>) -> Self {
        Self { results }
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// The HTML artifact. Only results with a suspect image get a table row;
    /// the rest are covered by the summary line.
    pub fn to_html(&self) -> String {
        let mut html = REPORT_TEMPLATE.to_string();

        for result in &self.results {
            let Some(image_url) = result.suspect_image.as_deref() else {
                continue;
            };

            let row = HTML_LINE_TEMPLATE
                .replace("[Profile]", &result.subject.id)
                .replace("[Name]", &result.subject.name)
                .replace("[ImageURL]", image_url);
            html = html.replace("</table>", &row);
        }

        html = html.replace("[Summary]", &self.summary_line());
        html.replace(
            "[Generated]",
            &Utc::now().format("%Y-%m-%d %H:%M UTC").to_string(),
        )
    }

    fn summary_line(&self) -> String {
        if self.results.is_empty() {
            "No profiles contain errors :)".to_string()
        } else {
            format!("{} users have bad profiles", self.results.len())
        }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.results.is_empty() {
            return f.write_str("No profiles contain errors :)");
        }

        let mentions: Vec<String> = self
            .results
            .iter()
            .map(|result| {
                let marker = if result.suspect_image.is_some() {
                    " 🌅"
                } else {
                    ""
                };
                format!("{}{}", result.subject.mention(), marker)
            })
            .collect();

        write!(
            f,
            "{} users have bad profiles:\n{}",
            self.results.len(),
            mentions.join(", ")
        )
    }
}

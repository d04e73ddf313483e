use anyhow::{Context, Result};
use handlebars::{handlebars_helper, Handlebars};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::Path;

use super::season_builder::Season;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Markdown,
    Json,
    Html,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "json" => Ok(OutputFormat::Json),
            "html" | "htm" => Ok(OutputFormat::Html),
            other => Err(format!(
                "unsupported output format '{}' (expected markdown, json or html)",
                other
            )),
        }
    }
}

handlebars_helper!(plural: |count: u64, noun: str| {
    if count == 1 {
        format!("{} {}", count, noun)
    } else {
        format!("{} {}s", count, noun)
    }
});

const TEMPLATE_NAME: &str = "chronicle";

/// Renders one repository's season hierarchy for display.
pub struct ChronicleRenderer {
    template_engine: Handlebars<'static>,
    format: OutputFormat,
}

impl ChronicleRenderer {
    pub fn new(format: OutputFormat, template_path: Option<&Path>) -> Result<Self> {
        let mut template_engine = Handlebars::new();
        // Output is Markdown, not HTML.
        template_engine.register_escape_fn(handlebars::no_escape);
        template_engine.register_helper("plural", Box::new(plural));

        match template_path {
            Some(path) => {
                let template = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read template {}", path.display()))?;
                template_engine.register_template_string(TEMPLATE_NAME, &template)?;
            }
            None => {
                let default_template = include_str!("../../templates/chronicle.md.hbs");
                template_engine.register_template_string(TEMPLATE_NAME, default_template)?;
            }
        }

        Ok(Self {
            template_engine,
            format,
        })
    }

    pub fn generate(&self, name: &str, seasons: &[Season]) -> Result<String> {
        match self.format {
            OutputFormat::Markdown => self.generate_markdown(name, seasons),
            OutputFormat::Json => self.generate_json(name, seasons),
            OutputFormat::Html => self.generate_html(name, seasons),
        }
    }

    fn generate_markdown(&self, name: &str, seasons: &[Season]) -> Result<String> {
        let data = json!({
            "name": name,
            "season_count": seasons.len(),
            "episode_count": seasons.iter().map(|s| s.episodes.len()).sum::<usize>(),
            "commit_count": seasons.iter().map(Season::commit_count).sum::<usize>(),
            "seasons": seasons.iter().map(|season| json!({
                "number": season.number,
                "title": season.title,
                "episode_count": season.episodes.len(),
                "commit_count": season.commit_count(),
                "episodes": season.episodes.iter().map(|episode| json!({
                    "title": episode.title,
                    "description": episode.description,
                    "date_range_label": episode.date_range_label,
                    "start_date": episode.start_date.format("%Y-%m-%d").to_string(),
                    "end_date": episode.end_date.format("%Y-%m-%d").to_string(),
                    "commit_count": episode.commit_count(),
                    "commits": episode.commits.iter().map(|c| json!({
                        "short_id": c.short_id(),
                        "message": c.first_line(),
                        "author": c.author(),
                        "date": c.committed_at.format("%Y-%m-%d").to_string(),
                    })).collect::<Vec<_>>(),
                })).collect::<Vec<_>>(),
            })).collect::<Vec<_>>(),
        });

        Ok(self.template_engine.render(TEMPLATE_NAME, &data)?)
    }

    fn generate_json(&self, name: &str, seasons: &[Season]) -> Result<String> {
        Ok(serde_json::to_string_pretty(&json!({
            "name": name,
            "seasons": seasons,
        }))?)
    }

    fn generate_html(&self, name: &str, seasons: &[Season]) -> Result<String> {
        let markdown = self.generate_markdown(name, seasons)?;
        let parser = pulldown_cmark::Parser::new(&markdown);
        let mut html = String::new();
        pulldown_cmark::html::push_html(&mut html, parser);

        // Seasons are h2, episodes h3; the date line is the episode's first <strong>.
        Ok(format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{} chronicle</title>
    <style>
        body {{ font-family: Georgia, 'Times New Roman', serif; max-width: 760px; margin: 0 auto; padding: 24px; line-height: 1.5; }}
        h2 {{ margin-top: 2.5em; padding-left: 0.5em; border-left: 4px solid #6f42c1; }}
        h3 {{ margin-bottom: 0.2em; }}
        h3 + p strong {{ color: #6a737d; font-weight: normal; font-variant: small-caps; }}
        li code {{ font-size: 0.85em; color: #6a737d; }}
    </style>
</head>
<body>
{}
</body>
</html>"#,
            handlebars::html_escape(name),
            html
        ))
    }
}

//! Output formatting for CLI

use console::style;
use marquee_core::{format_duration, Catalog, MediaRecord, PlaybackState, PlayerPhase};
use serde::Serialize;
use tabled::{Table, Tabled};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Table,
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            "table" => OutputFormat::Table,
            _ => OutputFormat::Text,
        }
    }
}

/// Pretty JSON for any serializable value
pub fn to_json<T: Serialize>(data: &T) -> String {
    serde_json::to_string_pretty(data).unwrap_or_else(|_| "{}".to_string())
}

#[derive(Tabled)]
struct CatalogRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Format")]
    format: String,
    #[tabled(rename = "Duration")]
    duration: String,
}

impl From<&MediaRecord> for CatalogRow {
    fn from(item: &MediaRecord) -> Self {
        Self {
            id: item.id.clone(),
            title: item.title.clone(),
            format: item.stream_format().badge().to_string(),
            duration: format_duration(item.duration),
        }
    }
}

/// Render the catalog list
pub fn render_catalog(catalog: &Catalog, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => to_json(catalog),
        OutputFormat::Table => {
            let rows: Vec<CatalogRow> = catalog.items.iter().map(CatalogRow::from).collect();
            format!("{} movies available\n{}", catalog.len(), Table::new(rows))
        }
        OutputFormat::Text => {
            let mut out = format!("{} movies available\n", catalog.len());
            for item in &catalog.items {
                out.push_str(&format!(
                    "  {:<22} {:<28} {:>4} {:>6}\n",
                    item.id,
                    item.title,
                    item.stream_format().badge(),
                    format_duration(item.duration)
                ));
            }
            out
        }
    }
}

/// Render the detail view of one record
pub fn render_details(item: &MediaRecord, format: OutputFormat) -> String {
    if format == OutputFormat::Json {
        return to_json(item);
    }

    let stream_format = item.stream_format();
    let mut out = String::new();
    out.push_str(&format!("{}\n", style(&item.title).bold()));
    out.push_str(&format!("  {}\n\n", item.description));
    out.push_str(&format!(
        "  Format:    {} ({})\n",
        style(stream_format.badge()).cyan(),
        stream_format.description()
    ));
    out.push_str(&format!("  Delivery:  {}\n", stream_format.delivery()));
    out.push_str(&format!(
        "  Duration:  {} ({} minutes)\n",
        format_duration(item.duration),
        item.minutes()
    ));
    out.push_str(&format!("  Stream:    {}\n", item.stream_url));
    out.push_str(&format!("  Poster:    {}\n", item.thumbnail));
    out
}

#[derive(Serialize)]
struct PlaybackSummary<'a> {
    id: &'a str,
    phase: PlayerPhase,
    state: &'a PlaybackState,
}

/// Render the final playback state
pub fn render_playback(id: &str, phase: PlayerPhase, state: &PlaybackState, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => to_json(&PlaybackSummary { id, phase, state }),
        OutputFormat::Table | OutputFormat::Text => match &state.error {
            Some(error) => format!("{} {}", style("Playback error:").red().bold(), error),
            None => format!("Playback {} ({})", phase, id),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marquee_core::demo_catalog;

    #[test]
    fn test_format_parsing() {
        assert_eq!(OutputFormat::from("JSON"), OutputFormat::Json);
        assert_eq!(OutputFormat::from("table"), OutputFormat::Table);
        assert_eq!(OutputFormat::from("anything"), OutputFormat::Text);
    }

    #[test]
    fn test_catalog_text_lists_every_item() {
        let catalog = demo_catalog();
        let text = render_catalog(&catalog, OutputFormat::Text);
        assert!(text.starts_with("6 movies available"));
        assert!(text.contains("sintel-mp4"));
        assert!(text.contains("14:48"));
    }

    #[test]
    fn test_details_json_uses_camel_case() {
        let catalog = demo_catalog();
        let json = render_details(&catalog.items[0], OutputFormat::Json);
        assert!(json.contains("\"streamUrl\""));
    }
}

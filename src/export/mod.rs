//! Export Module - Printable guest list of an event

use crate::dtos::RosterEntryDTO;
use crate::entities::Event;
use genpdf::elements::{Break, FrameCellDecorator, Paragraph, TableLayout};
use genpdf::style::Style;
use genpdf::{Document, SimplePageDecorator};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, instrument};

const HEADER: [&str; 5] = ["#", "Name", "Phone", "Email", "Gender"];
const COLUMN_WEIGHTS: [usize; 5] = [1, 5, 4, 6, 2];

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("fonts could not be loaded: {0}")]
    Fonts(genpdf::error::Error),
    #[error("pdf rendering failed: {0}")]
    Render(#[from] genpdf::error::Error),
}

/// Table cells of the roster, in roster order and numbered from 1
pub fn roster_rows(entries: &[RosterEntryDTO]) -> Vec<[String; 5]> {
    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            [
                (i + 1).to_string(),
                entry.name.clone(),
                entry.phone.clone().unwrap_or_else(|| "-".to_string()),
                entry.email.clone().unwrap_or_else(|| "-".to_string()),
                entry.gender.label().to_string(),
            ]
        })
        .collect()
}

pub fn schedule_line(event: &Event) -> String {
    let starts = event.starts_at.format("%Y-%m-%d %H:%M UTC");
    let mut line = match event.ends_at {
        Some(ends) => format!("{} - {}", starts, ends.format("%Y-%m-%d %H:%M UTC")),
        None => starts.to_string(),
    };
    if let Some(venue) = &event.venue {
        line.push_str(&format!(" @ {venue}"));
    }
    line
}

/// Renders the guest list as a PDF document
#[instrument(skip(event, entries, font_dir), fields(event_id = event.event_id, guests = entries.len()))]
pub fn render_guest_list(
    event: &Event,
    entries: &[RosterEntryDTO],
    font_dir: &Path,
    font_family: &str,
) -> Result<Vec<u8>, ExportError> {
    let fonts = genpdf::fonts::from_files(font_dir, font_family, None).map_err(ExportError::Fonts)?;

    let mut doc = Document::new(fonts);
    doc.set_title(format!("Guest list - {}", event.name));

    let mut decorator = SimplePageDecorator::new();
    decorator.set_margins(12);
    doc.set_page_decorator(decorator);
    doc.set_font_size(10);

    doc.push(Paragraph::default().styled_string(event.name.clone(), Style::default().with_font_size(18)));
    doc.push(Paragraph::new(schedule_line(event)));
    doc.push(Paragraph::new(match event.capacity {
        Some(capacity) => format!("{} of {} seats taken", entries.len(), capacity),
        None => format!("{} guests", entries.len()),
    }));
    doc.push(Break::new(2));

    let mut table = TableLayout::new(COLUMN_WEIGHTS.to_vec());
    table.set_cell_decorator(FrameCellDecorator::new(true, true, false));

    let mut row = table.row();
    for title in HEADER {
        row.push_element(Paragraph::default().styled_string(title, Style::new().bold()));
    }
    row.push()?;

    for cells in roster_rows(entries) {
        let mut row = table.row();
        for cell in cells {
            row.push_element(Paragraph::new(cell));
        }
        row.push()?;
    }
    doc.push(table);

    let mut out = Vec::new();
    doc.render(&mut out)?;
    debug!(bytes = out.len(), "Guest list rendered");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{EventStatus, Gender};
    use chrono::{TimeZone, Utc};

    fn entry(name: &str, phone: Option<&str>, email: Option<&str>, gender: Gender) -> RosterEntryDTO {
        RosterEntryDTO {
            guest_id: 1,
            rsvp_id: 1,
            submitted_by: 1,
            name: name.to_string(),
            email: email.map(str::to_string),
            phone: phone.map(str::to_string),
            gender,
            is_primary: false,
            added_by_host: false,
            responded_at: Utc::now(),
        }
    }

    fn event() -> Event {
        Event {
            event_id: 1,
            creator_id: 1,
            name: "Summer Party".to_string(),
            description: None,
            venue: Some("Terrace".to_string()),
            starts_at: Utc.with_ymd_and_hms(2026, 7, 1, 18, 0, 0).unwrap(),
            ends_at: Some(Utc.with_ymd_and_hms(2026, 7, 1, 23, 0, 0).unwrap()),
            capacity: Some(10),
            attendee_count: 2,
            status: EventStatus::Published,
            flyer_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_rows_are_numbered_and_filled() {
        let rows = roster_rows(&[
            entry("Bob", Some("9123456780"), Some("bob@gmail.com"), Gender::Male),
            entry("Xavier", None, Some("x@gmail.com"), Gender::Unspecified),
        ]);
        assert_eq!(rows[0], ["1", "Bob", "9123456780", "bob@gmail.com", "Male"].map(String::from));
        assert_eq!(rows[1][0], "2");
        assert_eq!(rows[1][2], "-");
        assert_eq!(rows[1][4], "-");
    }

    #[test]
    fn test_schedule_line() {
        assert_eq!(
            schedule_line(&event()),
            "2026-07-01 18:00 UTC - 2026-07-01 23:00 UTC @ Terrace"
        );
    }

    /// First directory holding a complete Liberation Sans family, if any
    fn installed_fonts() -> Option<std::path::PathBuf> {
        let family = "LiberationSans";
        let candidates = std::env::var("PDF_FONT_DIR")
            .into_iter()
            .chain([
                "/usr/share/fonts/truetype/liberation".to_string(),
                "/usr/share/fonts/liberation-sans".to_string(),
                "/usr/share/fonts/TTF".to_string(),
            ]);
        candidates.map(std::path::PathBuf::from).find(|dir| {
            ["Regular", "Bold", "Italic", "BoldItalic"]
                .iter()
                .all(|style| dir.join(format!("{family}-{style}.ttf")).is_file())
        })
    }

    #[test]
    fn test_guest_list_renders_pdf() {
        let Some(font_dir) = installed_fonts() else {
            eprintln!("skipping: no LiberationSans fonts installed, set PDF_FONT_DIR to run");
            return;
        };
        let entries = [
            entry("Bob", Some("9123456780"), Some("bob@gmail.com"), Gender::Male),
            entry("Xavier", None, Some("x@gmail.com"), Gender::Unspecified),
        ];

        let pdf = render_guest_list(&event(), &entries, &font_dir, "LiberationSans")
            .expect("rendering should succeed with fonts available");
        assert!(pdf.starts_with(b"%PDF"));
    }

    #[test]
    fn test_missing_fonts_are_reported() {
        let result = render_guest_list(&event(), &[], Path::new("/nonexistent-fonts"), "Nope");
        assert!(matches!(result, Err(ExportError::Fonts(_))));
    }
}

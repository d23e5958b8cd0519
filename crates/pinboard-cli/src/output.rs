use std::io::Write;

use owo_colors::OwoColorize;
use pinboard_core::{OutlineEntry, PinnedItem, get_pinned_model_ids, outline};

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

/// Print the pinned tree as an indented outline, the way the sidebar shows it.
pub fn print_tree(w: &mut dyn Write, items: &[PinnedItem], color: ColorMode) -> std::io::Result<()> {
    if items.is_empty() {
        if color.enabled() {
            writeln!(w, "{}", "No pinned models.".dimmed())?;
        } else {
            writeln!(w, "No pinned models.")?;
        }
        return Ok(());
    }

    for row in outline(items) {
        let indent = "  ".repeat(row.depth);
        match row.entry {
            OutlineEntry::Category(name) => {
                if color.enabled() {
                    writeln!(w, "{}{}/", indent, name.bold().cyan())?;
                } else {
                    writeln!(w, "{}{}/", indent, name)?;
                }
            }
            OutlineEntry::Model(id) => writeln!(w, "{}- {}", indent, id)?,
        }
    }
    Ok(())
}

/// Print the flattened id list, one per line.
pub fn print_ids(w: &mut dyn Write, items: &[PinnedItem]) -> std::io::Result<()> {
    for id in get_pinned_model_ids(items) {
        writeln!(w, "{}", id)?;
    }
    Ok(())
}

/// Summary line printed after a successful extraction.
pub fn print_extraction_summary(
    w: &mut dyn Write,
    file_name: &str,
    pages: usize,
    text: &str,
    color: ColorMode,
) -> std::io::Result<()> {
    let msg = format!(
        "Extracted {} page{} ({} characters) from {}",
        pages,
        if pages == 1 { "" } else { "s" },
        text.chars().count(),
        file_name
    );
    if color.enabled() {
        writeln!(w, "{}", msg.green())
    } else {
        writeln!(w, "{}", msg)
    }
}

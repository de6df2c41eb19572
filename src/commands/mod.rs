pub mod conflicts;
pub mod expand;
pub mod occurrences;

use std::path::Path;

use anyhow::{Context, Result};
use famcal_core::{Event, parse_events};

/// Load the JSON array of events exported by the organizer.
pub fn load_events(path: &Path) -> Result<Vec<Event>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Could not read events file {}", path.display()))?;

    let events = parse_events(&content)
        .with_context(|| format!("Could not parse events file {}", path.display()))?;

    tracing::debug!(path = %path.display(), count = events.len(), "loaded events");
    Ok(events)
}

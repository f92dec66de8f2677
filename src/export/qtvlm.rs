//! qtVlm multi-routing job descriptor.
//!
//! Renders `qtvlm_all_routes.xml`: a `<runs>` document qtVlm replays as a
//! batch of routing jobs, one per retained boat, each starting from the
//! boat's last reported position timestamp and routing to the FINISH mark.

use std::path::Path;

use chrono::DateTime;
use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::Writer;

use crate::track::TrackStore;

use super::{text_element, write_atomic, ExportError};

/// Renders the routing descriptor. The first `<run>` clears any routes left
/// over from a previous replay.
pub fn routes_document(store: &TrackStore) -> Result<Vec<u8>, ExportError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Start(BytesStart::new("runs")))?;

    writer.write_event(Event::Start(BytesStart::new("run")))?;
    text_element(&mut writer, "clearAllRoutes", "true")?;
    writer.write_event(Event::End(BytesEnd::new("run")))?;

    for boat in store.boats() {
        let Some(last) = boat.last_position() else {
            continue;
        };
        let start = DateTime::from_timestamp(last.timestamp as i64, 0).unwrap_or_default();

        writer.write_event(Event::Start(BytesStart::new("run")))?;
        text_element(&mut writer, "routingName", boat.name())?;
        text_element(&mut writer, "startPoint", boat.name())?;
        text_element(&mut writer, "endPoint", "FINISH")?;
        text_element(&mut writer, "startDate", &start.format("%m/%d/%Y").to_string())?;
        text_element(&mut writer, "startTime", &start.format("%H:%M:%S").to_string())?;
        text_element(&mut writer, "multiRouting", "false")?;
        text_element(&mut writer, "convertToRoute", "true")?;
        text_element(&mut writer, "autoSimpOptim", "false")?;
        writer.write_event(Event::End(BytesEnd::new("run")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("runs")))?;
    Ok(writer.into_inner())
}

pub fn write_qtvlm_routes(store: &TrackStore, path: &Path) -> Result<(), ExportError> {
    let document = routes_document(store)?;
    write_atomic(path, &document)?;
    Ok(())
}

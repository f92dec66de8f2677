//! GPX rendering.
//!
//! Two documents per run: `tracks.gpx` with one track per retained boat, and
//! `wpts.gpx` with each boat's last position plus the START and FINISH marks
//! of the selected leg run.

use std::path::Path;

use chrono::DateTime;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::Writer;

use crate::config::LegMarks;
use crate::track::{Position, TrackStore};

use super::{text_element, write_atomic, ExportError};

/// Display colors accepted by the Garmin `gpxx:TrackExtension`, cycled by
/// output order so a rerun colors the fleet identically.
pub const GPX_COLORS: [&str; 16] = [
    "Black",
    "DarkRed",
    "DarkGreen",
    "DarkYellow",
    "DarkBlue",
    "DarkMagenta",
    "DarkCyan",
    "LightGray",
    "DarkGray",
    "Red",
    "Green",
    "Yellow",
    "Blue",
    "Magenta",
    "Cyan",
    "White",
];

const GPX_NS: &str = "http://www.topografix.com/GPX/1/1";
const GPXX_NS: &str = "http://www.garmin.com/xmlschemas/GpxExtensions/v3";

/// ISO-8601 UTC without sub-second precision; tracker feeds report whole
/// seconds. Unrepresentable timestamps render as the epoch.
fn format_time(timestamp: f64) -> String {
    DateTime::from_timestamp(timestamp as i64, 0)
        .unwrap_or_default()
        .format("%Y-%m-%dT%H:%M:%SZ")
        .to_string()
}

fn gpx_root(color_extension: bool) -> BytesStart<'static> {
    let mut root = BytesStart::new("gpx");
    root.push_attribute(("version", "1.1"));
    root.push_attribute(("creator", "sailtrack"));
    root.push_attribute(("xmlns", GPX_NS));
    if color_extension {
        root.push_attribute(("xmlns:gpxx", GPXX_NS));
    }
    root
}

fn waypoint<W: std::io::Write>(
    writer: &mut Writer<W>,
    lat: f64,
    lon: f64,
    name: &str,
) -> Result<(), ExportError> {
    let mut wpt = BytesStart::new("wpt");
    wpt.push_attribute(("lat", lat.to_string().as_str()));
    wpt.push_attribute(("lon", lon.to_string().as_str()));
    writer.write_event(Event::Start(wpt))?;
    text_element(writer, "name", name)?;
    writer.write_event(Event::End(BytesEnd::new("wpt")))?;
    Ok(())
}

fn track_point<W: std::io::Write>(
    writer: &mut Writer<W>,
    position: &Position,
) -> Result<(), ExportError> {
    let mut trkpt = BytesStart::new("trkpt");
    trkpt.push_attribute(("lat", position.latitude.to_string().as_str()));
    trkpt.push_attribute(("lon", position.longitude.to_string().as_str()));
    writer.write_event(Event::Start(trkpt))?;
    text_element(writer, "time", &format_time(position.timestamp))?;
    writer.write_event(Event::End(BytesEnd::new("trkpt")))?;
    Ok(())
}

/// Renders `tracks.gpx`: one `<trk>` per boat, named `past <boat name>`,
/// with a single segment holding the merged positions in order.
pub fn tracks_document(store: &TrackStore, color_tracks: bool) -> Result<Vec<u8>, ExportError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.write_event(Event::Start(gpx_root(color_tracks)))?;

    for (index, boat) in store.boats().enumerate() {
        writer.write_event(Event::Start(BytesStart::new("trk")))?;
        text_element(&mut writer, "name", &format!("past {}", boat.name()))?;

        if color_tracks {
            writer.write_event(Event::Start(BytesStart::new("extensions")))?;
            writer.write_event(Event::Start(BytesStart::new("gpxx:TrackExtension")))?;
            text_element(
                &mut writer,
                "gpxx:DisplayColor",
                GPX_COLORS[index % GPX_COLORS.len()],
            )?;
            writer.write_event(Event::End(BytesEnd::new("gpxx:TrackExtension")))?;
            writer.write_event(Event::End(BytesEnd::new("extensions")))?;
        }

        writer.write_event(Event::Start(BytesStart::new("trkseg")))?;
        for position in boat.positions() {
            track_point(&mut writer, position)?;
        }
        writer.write_event(Event::End(BytesEnd::new("trkseg")))?;
        writer.write_event(Event::End(BytesEnd::new("trk")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("gpx")))?;
    Ok(writer.into_inner())
}

/// Renders `wpts.gpx`: each boat's last position as a waypoint named after
/// the boat, then the START and FINISH marks.
pub fn waypoints_document(store: &TrackStore, marks: &LegMarks) -> Result<Vec<u8>, ExportError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.write_event(Event::Start(gpx_root(false)))?;

    for boat in store.boats() {
        if let Some(last) = boat.last_position() {
            waypoint(&mut writer, last.latitude, last.longitude, boat.name())?;
        }
    }
    waypoint(&mut writer, marks.start.lat, marks.start.lng, "START")?;
    waypoint(&mut writer, marks.finish.lat, marks.finish.lng, "FINISH")?;

    writer.write_event(Event::End(BytesEnd::new("gpx")))?;
    Ok(writer.into_inner())
}

pub fn write_tracks_gpx(
    store: &TrackStore,
    color_tracks: bool,
    path: &Path,
) -> Result<(), ExportError> {
    let document = tracks_document(store, color_tracks)?;
    write_atomic(path, &document)?;
    Ok(())
}

pub fn write_waypoints_gpx(
    store: &TrackStore,
    marks: &LegMarks,
    path: &Path,
) -> Result<(), ExportError> {
    let document = waypoints_document(store, marks)?;
    write_atomic(path, &document)?;
    Ok(())
}

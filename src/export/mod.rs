//! Output projection: GPX track/waypoint files and the qtVlm job descriptor.
//!
//! The writers read the pruned store through `TrackStore::boats()` (sorted by
//! id) and `Boat::last_position()` only, and render XML directly with the
//! quick-xml event writer. Files are written atomically: temp file in the
//! destination directory, then rename.

mod gpx;
mod qtvlm;

pub use gpx::{tracks_document, waypoints_document, write_tracks_gpx, write_waypoints_gpx, GPX_COLORS};
pub use qtvlm::{routes_document, write_qtvlm_routes};

use std::fs;
use std::io;
use std::path::Path;

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

/// Errors raised while rendering or writing an output file.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to write output file: {0}")]
    Io(#[from] io::Error),

    #[error("XML write error: {0}")]
    Xml(#[from] quick_xml::Error),
}

/// `<tag>text</tag>` with escaping.
fn text_element<W: io::Write>(
    writer: &mut Writer<W>,
    tag: &str,
    text: &str,
) -> Result<(), ExportError> {
    writer.write_event(Event::Start(BytesStart::new(tag)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}

/// Write-then-rename so a crashed run never leaves a truncated file behind.
fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => Path::new(".").to_path_buf(),
    };
    let temp_path = parent.join(format!(".{}.tmp", uuid::Uuid::new_v4()));
    fs::write(&temp_path, bytes)?;
    fs::rename(&temp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_element_escapes_content() {
        let mut writer = Writer::new(Vec::new());
        text_element(&mut writer, "name", "Charal & Friends <2>").unwrap();
        let xml = String::from_utf8(writer.into_inner()).unwrap();
        assert_eq!(xml, "<name>Charal &amp; Friends &lt;2&gt;</name>");
    }

    #[test]
    fn atomic_write_replaces_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.gpx");

        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"second");
        // No temp files left behind.
        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name() != "out.gpx")
            .collect();
        assert!(leftovers.is_empty());
    }
}

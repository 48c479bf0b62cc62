use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use crate::correlation::CorrelationEvent;
use crate::error::Result;
use crate::frame::Frame;

/// Saves the frame an event was raised on, before the event is persisted.
pub trait FrameExporter {
    /// Returns where the frame was written.
    fn export(&mut self, frame: &Frame, event: &CorrelationEvent) -> Result<PathBuf>;
}

impl<E: FrameExporter + ?Sized> FrameExporter for &mut E {
    fn export(&mut self, frame: &Frame, event: &CorrelationEvent) -> Result<PathBuf> {
        (**self).export(frame, event)
    }
}

impl<E: FrameExporter + ?Sized> FrameExporter for Box<E> {
    fn export(&mut self, frame: &Frame, event: &CorrelationEvent) -> Result<PathBuf> {
        (**self).export(frame, event)
    }
}

/// Writes the detections of the frame as JSON into a directory, one file
/// per event, named `stolen_<plate>_frame_<index>.json`.
#[derive(Debug, Clone)]
pub struct JsonFrameExporter {
    dir: PathBuf,
}

impl JsonFrameExporter {
    /// Creates the directory when missing.
    pub fn new<P: Into<PathBuf>>(dir: P) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;

        Ok(Self { dir })
    }

    #[inline]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl FrameExporter for JsonFrameExporter {
    fn export(&mut self, frame: &Frame, event: &CorrelationEvent) -> Result<PathBuf> {
        let path = self.dir.join(format!(
            "stolen_{}_frame_{}.json",
            event.plate_text, event.frame_index
        ));

        let writer = BufWriter::new(File::create(&path)?);
        serde_json::to_writer(writer, frame)?;

        log::debug!("frame #{} saved to {}", frame.index, path.display());

        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::tests::record;
    use chrono::Utc;

    #[test]
    fn test_json_exporter_writes_frame() {
        let dir = std::env::temp_dir().join(format!("platetrack-export-{}", std::process::id()));
        let mut exporter = JsonFrameExporter::new(&dir).unwrap();

        let frame = Frame::new(42, vec![], vec![]);
        let event = CorrelationEvent {
            plate_text: "NA13NRU".into(),
            vehicle: record(1, "NA13NRU"),
            track_id: 3,
            frame_index: 42,
            timecode: "00:00:01".into(),
            confidence: 0.9,
            video_source: "cam0".into(),
            image_path: None,
            detected_at: Utc::now(),
        };

        let path = exporter.export(&frame, &event).unwrap();

        assert_eq!(path, dir.join("stolen_NA13NRU_frame_42.json"));
        let back: Frame = serde_json::from_reader(File::open(&path).unwrap()).unwrap();
        assert_eq!(back, frame);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}

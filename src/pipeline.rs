use std::collections::{BTreeMap, HashSet};
use std::io::Write;

use crate::aggregator::canonical_readings;
use crate::config::PipelineConfig;
use crate::correlation::{CorrelationEngine, CorrelationEvent};
use crate::error::{Error, Result};
use crate::export::FrameExporter;
use crate::frame::Frame;
use crate::persistence::EventSink;
use crate::plate::{PlateAssociation, PlateAssociator};
use crate::registry::{normalize_plate, Registry};
use crate::track::Track;
use crate::tracker::Tracker;

/// Outcome of one frame.
#[derive(Debug)]
pub struct FrameReport {
    pub frame_index: u64,
    /// malformed detections dropped before tracking
    pub rejected: usize,
    pub tracks: Vec<Track>,
    pub associations: usize,
    /// persisted events with their store ids
    pub events: Vec<(u64, CorrelationEvent)>,
    /// registry, export and persistence failures; the frame itself was still processed
    pub failures: Vec<Error>,
}

#[derive(Debug)]
pub struct RunSummary {
    pub frames: u64,
    pub events: usize,
    pub log: Vec<PlateAssociation>,
    /// `track_id -> canonical plate text`
    pub canonical: BTreeMap<u32, String>,
}

/// Processing state of a single video stream.
///
/// Track ids and the seen-plate set live here and nowhere else, so separate
/// streams must use separate runs.
pub struct Run<R, S> {
    tracker: Tracker,
    associator: PlateAssociator,
    engine: CorrelationEngine<R>,
    sink: S,
    exporter: Option<Box<dyn FrameExporter>>,
    log: Vec<PlateAssociation>,
    frames: u64,
    events: usize,
}

impl<R: Registry, S: EventSink> Run<R, S> {
    pub fn new(config: &PipelineConfig, registry: R, sink: S) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            tracker: Tracker::new(config.tracker)?,
            associator: PlateAssociator::new(config.plate_margin),
            engine: CorrelationEngine::new(registry, config.fps, config.video_source.clone()),
            sink,
            exporter: None,
            log: Vec::new(),
            frames: 0,
            events: 0,
        })
    }

    /// Saves the frame of every event through `exporter` before the event is
    /// persisted.
    pub fn with_exporter<E: FrameExporter + 'static>(mut self, exporter: E) -> Self {
        self.exporter = Some(Box::new(exporter));
        self
    }

    #[inline]
    pub fn tracker(&self) -> &Tracker {
        &self.tracker
    }

    #[inline]
    pub fn engine(&self) -> &CorrelationEngine<R> {
        &self.engine
    }

    #[inline]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Association log so far, in frame order.
    #[inline]
    pub fn log(&self) -> &[PlateAssociation] {
        &self.log
    }

    /// Runs one frame through tracking, plate association and correlation.
    ///
    /// Malformed detections are dropped first. A plate whose lookup or
    /// persistence failed is not tried again until the next frame.
    pub fn process_frame(&mut self, frame: &Frame) -> FrameReport {
        self.frames += 1;

        let mut frame = frame.clone();
        let rejected = frame.sanitize();

        let tracks = self.tracker.step(&frame.vehicles);
        let mut associations = 0;
        let mut events = Vec::new();
        let mut failures = Vec::new();
        let mut failed_plates = HashSet::new();

        for reading in &frame.plates {
            let association = match self.associator.associate(frame.index, reading, &tracks) {
                Some(association) => association,
                None => continue,
            };

            associations += 1;

            let plate = normalize_plate(&association.plate_text);
            if failed_plates.contains(&plate) {
                log::debug!("frame #{}: {} already failed in this frame", frame.index, plate);
                self.log.push(association);
                continue;
            }

            match self.engine.observe(&association) {
                Ok(Some(event)) => {
                    let event = self.export(&frame, event, &mut failures);

                    match self.sink.append(&event) {
                        Ok(id) => {
                            self.events += 1;
                            events.push((id, event));
                        }
                        Err(err) => {
                            log::warn!(
                                "frame #{}: failed to persist event for {}: {}",
                                frame.index,
                                event.plate_text,
                                err
                            );
                            self.engine.forget(&event.plate_text);
                            failed_plates.insert(plate);
                            failures.push(err);
                        }
                    }
                }
                Ok(None) => (),
                Err(err) => {
                    log::warn!("frame #{}: {}", frame.index, err);
                    failed_plates.insert(plate);
                    failures.push(err);
                }
            }

            self.log.push(association);
        }

        FrameReport {
            frame_index: frame.index,
            rejected,
            tracks,
            associations,
            events,
            failures,
        }
    }

    fn export(
        &mut self,
        frame: &Frame,
        event: CorrelationEvent,
        failures: &mut Vec<Error>,
    ) -> CorrelationEvent {
        let exporter = match self.exporter.as_mut() {
            Some(exporter) => exporter,
            None => return event,
        };

        match exporter.export(frame, &event) {
            Ok(path) => event.with_image_path(path),
            Err(err) => {
                log::warn!(
                    "frame #{}: failed to export frame for {}: {}",
                    frame.index,
                    event.plate_text,
                    err
                );
                failures.push(err);
                event
            }
        }
    }

    /// Ends the run, choosing the canonical plate text of every track.
    pub fn finish(self) -> RunSummary {
        RunSummary {
            frames: self.frames,
            events: self.events,
            canonical: canonical_readings(&self.log),
            log: self.log,
        }
    }
}

/// Writes an association log as JSON lines.
pub fn write_associations<W: Write>(mut writer: W, log: &[PlateAssociation]) -> Result<()> {
    for association in log {
        serde_json::to_writer(&mut writer, association)?;
        writer.write_all(b"\n")?;
    }

    writer.flush()?;
    Ok(())
}

//! Vehicle tracking and license plate correlation over detector output.
//!
//! Per frame, vehicle detections go through the [`Tracker`], plate readings
//! are attributed to confirmed tracks by the [`PlateAssociator`] and the
//! [`CorrelationEngine`] looks every distinct plate up in a [`Registry`] at
//! most once per run. [`Run`] wires these together for one video stream.

pub mod aggregator;
pub mod assignment;
pub mod bbox;
pub mod config;
pub mod correlation;
pub mod detection;
pub mod detector;
pub mod error;
pub mod export;
pub mod frame;
pub mod kalman;
pub mod persistence;
pub mod pipeline;
pub mod plate;
pub mod registry;
pub mod store;
pub mod track;
pub mod tracker;

pub use aggregator::{canonical_readings, ReadingAggregator};
pub use config::{DetectorConfig, PipelineConfig, TrackerConfig};
pub use correlation::{CorrelationEngine, CorrelationEvent, SeenPlateSet};
pub use detection::{Detection, PlateReading, VehicleClass};
pub use error::{Error, Result};
pub use export::{FrameExporter, JsonFrameExporter};
pub use frame::Frame;
pub use persistence::{EventSink, JsonLinesSink, MemorySink};
pub use pipeline::{FrameReport, Run, RunSummary};
pub use plate::{PlateAssociation, PlateAssociator};
pub use registry::{MemoryRegistry, Registry, VehicleRecord};
pub use track::{Track, TrackState};
pub use tracker::Tracker;

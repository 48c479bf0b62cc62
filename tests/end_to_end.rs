use platetrack::bbox::BBox;
use platetrack::{
    Detection, Frame, JsonLinesSink, MemoryRegistry, MemorySink, PipelineConfig, PlateReading,
    Run, VehicleClass, VehicleRecord,
};

fn stolen(id: i64, plate: &str) -> VehicleRecord {
    serde_json::from_value(serde_json::json!({
        "id": id,
        "license_plate": plate,
        "make": "Toyota",
        "model": "Camry",
        "year": "2018",
        "color": "Silver",
        "description": "Dent on rear bumper",
        "date_reported": "2024-03-12",
    }))
    .unwrap()
}

/// A car driving right at 5 px/frame; frames 3..=6 carry a readable plate
/// with a rising text score.
fn drive() -> Vec<Frame> {
    (1..=10u64)
        .map(|index| {
            let dx = index as f32 * 5.0;
            let car = Detection::new(
                BBox::ltrb(100.0 + dx, 200.0, 300.0 + dx, 350.0),
                0.92,
                VehicleClass::Car,
            )
            .unwrap();

            let plates = if (3..=6).contains(&index) {
                vec![PlateReading::new(
                    BBox::ltrb(170.0 + dx, 300.0, 230.0 + dx, 320.0),
                    0.8,
                    Some("NA13NRU".to_string()),
                    0.5 + index as f32 * 0.05,
                )
                .unwrap()]
            } else {
                vec![]
            };

            Frame::new(index, vec![car], plates)
        })
        .collect()
}

#[test]
fn test_registered_vehicle_is_reported_once() {
    let registry = MemoryRegistry::new(vec![stolen(1, "NA13NRU"), stolen(2, "AK19ZXC")]);
    let config = PipelineConfig {
        video_source: "cam-01.mp4".into(),
        ..PipelineConfig::default()
    };
    let mut run = Run::new(&config, &registry, MemorySink::default()).unwrap();

    let mut events = Vec::new();
    for frame in drive() {
        let report = run.process_frame(&frame);
        assert!(report.failures.is_empty());
        assert!(report.tracks.len() <= 1);
        events.extend(report.events);
    }

    assert_eq!(events.len(), 1);
    let (id, event) = &events[0];
    assert_eq!(*id, 1);
    assert_eq!(event.plate_text, "NA13NRU");
    assert_eq!(event.frame_index, 3);
    assert_eq!(event.track_id, 1);
    assert_eq!(event.timecode, "00:00:00");
    assert_eq!(event.video_source, "cam-01.mp4");
    assert_eq!(event.vehicle.id, 1);

    // one lookup, the remaining sightings hit the seen set
    assert_eq!(run.engine().lookups(), 1);
    assert_eq!(run.sink().len(), 1);

    let summary = run.finish();
    assert_eq!(summary.frames, 10);
    assert_eq!(summary.events, 1);
    assert_eq!(summary.log.len(), 4);
    assert!(summary.log.iter().all(|a| a.track_id == 1));
    assert_eq!(summary.canonical.len(), 1);
    assert_eq!(summary.canonical[&1], "NA13NRU");
}

#[test]
fn test_unregistered_plate_produces_no_event() {
    let registry = MemoryRegistry::new(vec![stolen(2, "AK19ZXC")]);
    let mut sink = MemorySink::default();
    let mut run = Run::new(&PipelineConfig::default(), &registry, &mut sink).unwrap();

    for frame in drive() {
        assert!(run.process_frame(&frame).events.is_empty());
    }

    assert_eq!(run.engine().lookups(), 1);
    assert_eq!(run.engine().seen().len(), 1);

    let summary = run.finish();
    assert_eq!(summary.events, 0);
    assert!(sink.is_empty());
}

#[test]
fn test_events_written_as_json_lines() {
    let registry = MemoryRegistry::new(vec![stolen(7, "NA13NRU")]);
    let mut sink = JsonLinesSink::new(Vec::new());
    let mut run = Run::new(&PipelineConfig::default(), &registry, &mut sink).unwrap();

    for frame in drive() {
        run.process_frame(&frame);
    }

    assert_eq!(run.finish().events, 1);

    let out = String::from_utf8(sink.into_inner()).unwrap();
    let lines: Vec<serde_json::Value> = out
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();

    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["id"], 1);
    assert_eq!(lines[0]["plate_text"], "NA13NRU");
    assert_eq!(lines[0]["frame_index"], 3);
    assert_eq!(lines[0]["vehicle"]["id"], 7);
    assert_eq!(lines[0]["vehicle"]["status"], "ACTIVE");
}

#[test]
fn test_frames_replay_from_json() {
    let lines = [
        r#"{"index": 1, "vehicles": [{"bbox": [100, 200, 300, 350], "p": 0.9, "c": 2}]}"#,
        r#"{"index": 2, "vehicles": [{"bbox": [104, 200, 304, 350], "p": 0.9, "c": 7}], "plates": []}"#,
        r#"{"index": 3, "vehicles": [{"bbox": [108, 200, 308, 350], "p": 0.9, "c": 2}, {"bbox": [5, 5, 5, 40], "p": 0.5, "c": 2}],
            "plates": [{"bbox": [170, 300, 230, 320], "p": 0.8, "text": "NA13NRU", "text_score": 0.9}]}"#,
    ];

    let mut frames: Vec<Frame> = lines
        .iter()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();

    assert_eq!(frames[1].vehicles[0].class, VehicleClass::Truck);
    assert_eq!(frames[2].sanitize(), 1);

    let registry = MemoryRegistry::new(vec![stolen(1, "NA13NRU")]);
    let mut run = Run::new(&PipelineConfig::default(), &registry, MemorySink::default()).unwrap();

    let reports: Vec<_> = frames.iter().map(|f| run.process_frame(f)).collect();

    assert!(reports[0].tracks.is_empty());
    assert_eq!(reports[2].tracks.len(), 1);
    assert_eq!(reports[2].events.len(), 1);
    assert_eq!(reports[2].events[0].1.frame_index, 3);
}

#[test]
fn test_non_vehicle_class_is_rejected() {
    let bad = r#"{"index": 1, "vehicles": [{"bbox": [0, 0, 10, 10], "p": 0.9, "c": 0}]}"#;

    assert!(serde_json::from_str::<Frame>(bad).is_err());
}

use serde_derive::Serialize;
use std::io::Write;

use crate::correlation::CorrelationEvent;
use crate::error::{Error, Result};

/// Destination of correlation events. Each event is appended at most once;
/// implementations must not retry internally.
pub trait EventSink {
    /// Stores the event and returns the identifier assigned to it.
    fn append(&mut self, event: &CorrelationEvent) -> Result<u64>;
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn append(&mut self, event: &CorrelationEvent) -> Result<u64> {
        (**self).append(event)
    }
}

#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    events: Vec<(u64, CorrelationEvent)>,
}

impl MemorySink {
    #[inline]
    pub fn events(&self) -> &[(u64, CorrelationEvent)] {
        &self.events
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl EventSink for MemorySink {
    fn append(&mut self, event: &CorrelationEvent) -> Result<u64> {
        let id = self.events.len() as u64 + 1;
        self.events.push((id, event.clone()));

        Ok(id)
    }
}

#[derive(Serialize)]
struct StoredEvent<'a> {
    id: u64,
    #[serde(flatten)]
    event: &'a CorrelationEvent,
}

/// Writes one JSON object per event, flushing after every append.
#[derive(Debug)]
pub struct JsonLinesSink<W: Write> {
    writer: W,
    next_id: u64,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, next_id: 1 }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> EventSink for JsonLinesSink<W> {
    fn append(&mut self, event: &CorrelationEvent) -> Result<u64> {
        let id = self.next_id;
        let line = serde_json::to_string(&StoredEvent { id, event })?;

        writeln!(self.writer, "{}", line)
            .and_then(|_| self.writer.flush())
            .map_err(|err| Error::Persistence(format!("event #{}: {}", id, err)))?;

        self.next_id += 1;
        Ok(id)
    }
}

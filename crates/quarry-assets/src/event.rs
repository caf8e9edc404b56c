//! Resource events for frame-by-frame change detection.

use crate::resource::{ResourceId, ResourceType};

/// Events emitted by the resource manager.
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceEvent {
    /// A resource finished decoding.
    Loaded {
        /// The loaded resource.
        id: ResourceId,
        /// Its type.
        kind: ResourceType,
    },

    /// A resource failed to decode and stays `NotLoaded`.
    LoadFailed {
        /// The failed resource.
        id: ResourceId,
        /// Its type.
        kind: ResourceType,
        /// Error message.
        error: String,
    },
}

impl ResourceEvent {
    /// The resource this event relates to.
    pub fn id(&self) -> ResourceId {
        match self {
            ResourceEvent::Loaded { id, .. } => *id,
            ResourceEvent::LoadFailed { id, .. } => *id,
        }
    }

    /// The type of the resource.
    pub fn kind(&self) -> ResourceType {
        match self {
            ResourceEvent::Loaded { kind, .. } => *kind,
            ResourceEvent::LoadFailed { kind, .. } => *kind,
        }
    }

    /// Check if this is a failure event.
    pub fn is_failed(&self) -> bool {
        matches!(self, ResourceEvent::LoadFailed { .. })
    }
}

/// A buffer of resource events that can be drained each frame.
#[derive(Debug, Default)]
pub struct ResourceEventBuffer {
    events: Vec<ResourceEvent>,
}

impl ResourceEventBuffer {
    /// Create a new empty event buffer.
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Push an event to the buffer.
    pub fn push(&mut self, event: ResourceEvent) {
        self.events.push(event);
    }

    /// Drain all events from the buffer.
    pub fn drain(&mut self) -> impl Iterator<Item = ResourceEvent> + '_ {
        self.events.drain(..)
    }

    /// Get an iterator over events without draining.
    pub fn iter(&self) -> impl Iterator<Item = &ResourceEvent> {
        self.events.iter()
    }

    /// Check if there are any events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Get the number of events.
    pub fn len(&self) -> usize {
        self.events.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_empties_buffer() {
        let mut buffer = ResourceEventBuffer::new();
        buffer.push(ResourceEvent::Loaded {
            id: ResourceId(0),
            kind: ResourceType::Texture,
        });
        buffer.push(ResourceEvent::LoadFailed {
            id: ResourceId(1),
            kind: ResourceType::Mesh,
            error: "bad".to_string(),
        });
        assert_eq!(buffer.len(), 2);
        assert!(buffer.iter().any(ResourceEvent::is_failed));

        let drained: Vec<_> = buffer.drain().collect();
        assert_eq!(drained[1].id(), ResourceId(1));
        assert_eq!(drained[1].kind(), ResourceType::Mesh);
        assert!(buffer.is_empty());
    }
}

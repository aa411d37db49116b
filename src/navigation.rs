// SPDX-License-Identifier: GPL-3.0-only

//! Navigation input consumed by cameras
//!
//! Events carry pointer coordinates in device units. Only a handful of
//! button ids mean anything to the cameras, see [`ButtonRole`].
//!
//! Events produced on another thread (a UI or window thread) go through a
//! [`NavigationQueue`]. The thread that owns the GPU context drains the
//! queue before each draw, so camera state is only ever touched there.

use crate::constants::ESCAPE_KEY;
use futures::channel::mpsc;
use tracing::{debug, trace};

/// One navigation input event
#[derive(Debug, Clone, PartialEq)]
pub enum NavigationEvent {
    MouseMove { x: f64, y: f64 },
    MouseButtonPress { button: i32, x: f64, y: f64 },
    MouseButtonRelease { button: i32, x: f64, y: f64 },
    KeyPress { key: String },
    KeyRelease { key: String },
}

impl NavigationEvent {
    /// Pointer position carried by the event, if any
    pub fn pointer(&self) -> Option<(f64, f64)> {
        match self {
            NavigationEvent::MouseMove { x, y }
            | NavigationEvent::MouseButtonPress { x, y, .. }
            | NavigationEvent::MouseButtonRelease { x, y, .. } => Some((*x, *y)),
            NavigationEvent::KeyPress { .. } | NavigationEvent::KeyRelease { .. } => None,
        }
    }

    /// True for a press of the Escape key
    pub fn is_escape_press(&self) -> bool {
        matches!(self, NavigationEvent::KeyPress { key } if key == ESCAPE_KEY)
    }
}

/// What a mouse button id means to the cameras
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonRole {
    /// Button 1, drag to rotate
    Primary,
    /// Wheel up (4) or wheel left (6)
    ScrollUp,
    /// Wheel down (5) or wheel right (7)
    ScrollDown,
    /// Anything else
    Other,
}

impl ButtonRole {
    pub fn from_id(button: i32) -> Self {
        match button {
            1 => ButtonRole::Primary,
            4 | 6 => ButtonRole::ScrollUp,
            5 | 7 => ButtonRole::ScrollDown,
            _ => ButtonRole::Other,
        }
    }
}

#[cfg(feature = "gst")]
impl TryFrom<&gstreamer::EventRef> for NavigationEvent {
    type Error = crate::errors::VrError;

    fn try_from(event: &gstreamer::EventRef) -> Result<Self, Self::Error> {
        use crate::errors::VrError;
        use gstreamer_video::NavigationEvent as GstNavigationEvent;

        let parsed = GstNavigationEvent::parse(event)
            .map_err(|e| VrError::Event(format!("not a navigation event: {}", e)))?;

        match parsed {
            GstNavigationEvent::MouseMove { x, y, .. } => Ok(NavigationEvent::MouseMove { x, y }),
            GstNavigationEvent::MouseButtonPress { button, x, y, .. } => {
                Ok(NavigationEvent::MouseButtonPress { button, x, y })
            }
            GstNavigationEvent::MouseButtonRelease { button, x, y, .. } => {
                Ok(NavigationEvent::MouseButtonRelease { button, x, y })
            }
            GstNavigationEvent::KeyPress { key, .. } => Ok(NavigationEvent::KeyPress { key }),
            GstNavigationEvent::KeyRelease { key, .. } => Ok(NavigationEvent::KeyRelease { key }),
            _ => Err(VrError::Event("unsupported navigation event".into())),
        }
    }
}

/// Sending half of a [`NavigationQueue`], cheap to clone across threads
#[derive(Clone)]
pub struct NavigationSender {
    tx: mpsc::UnboundedSender<NavigationEvent>,
}

impl NavigationSender {
    /// Queue an event. Returns false once the receiving filter is gone.
    pub fn send(&self, event: NavigationEvent) -> bool {
        self.tx.unbounded_send(event).is_ok()
    }
}

/// Arrival-ordered event queue drained on the GPU thread
pub struct NavigationQueue {
    tx: mpsc::UnboundedSender<NavigationEvent>,
    rx: mpsc::UnboundedReceiver<NavigationEvent>,
}

impl NavigationQueue {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded();
        Self { tx, rx }
    }

    pub fn sender(&self) -> NavigationSender {
        NavigationSender {
            tx: self.tx.clone(),
        }
    }

    /// Take every event queued so far, oldest first, without blocking
    pub fn drain(&mut self) -> Vec<NavigationEvent> {
        let mut events = Vec::new();
        // Err means empty; Ok(None) cannot happen while we hold a sender
        while let Ok(Some(event)) = self.rx.try_next() {
            trace!(?event, "Dequeued navigation event");
            events.push(event);
        }
        if !events.is_empty() {
            debug!(count = events.len(), "Drained queued navigation events");
        }
        events
    }
}

impl Default for NavigationQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_roles() {
        assert_eq!(ButtonRole::from_id(1), ButtonRole::Primary);
        assert_eq!(ButtonRole::from_id(4), ButtonRole::ScrollUp);
        assert_eq!(ButtonRole::from_id(6), ButtonRole::ScrollUp);
        assert_eq!(ButtonRole::from_id(5), ButtonRole::ScrollDown);
        assert_eq!(ButtonRole::from_id(7), ButtonRole::ScrollDown);
        assert_eq!(ButtonRole::from_id(2), ButtonRole::Other);
        assert_eq!(ButtonRole::from_id(3), ButtonRole::Other);
    }

    #[test]
    fn test_escape_detection() {
        let esc = NavigationEvent::KeyPress {
            key: "Escape".into(),
        };
        let release = NavigationEvent::KeyRelease {
            key: "Escape".into(),
        };
        let other = NavigationEvent::KeyPress { key: "w".into() };
        assert!(esc.is_escape_press());
        assert!(!release.is_escape_press());
        assert!(!other.is_escape_press());
    }

    #[test]
    fn test_queue_preserves_arrival_order_across_threads() {
        let mut queue = NavigationQueue::new();
        let sender = queue.sender();

        let handle = std::thread::spawn(move || {
            for i in 0..5 {
                sender.send(NavigationEvent::MouseMove {
                    x: i as f64,
                    y: 0.0,
                });
            }
        });
        handle.join().unwrap();

        let xs: Vec<f64> = queue
            .drain()
            .iter()
            .filter_map(|e| e.pointer().map(|(x, _)| x))
            .collect();
        assert_eq!(xs, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
        assert!(queue.drain().is_empty());
    }
}

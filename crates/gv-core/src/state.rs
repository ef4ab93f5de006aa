//! Session state of one table view and its change notification

use std::sync::{Arc, Weak};
use std::time::Duration;
use parking_lot::RwLock;
use crate::RemoteError;

/// State of one table view, reset only by an explicit refresh
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    /// Whether the remote source may still have rows past the known ones
    pub has_more_rows: bool,
    /// Current window size
    pub chunk_size: usize,
    /// Whether a remote fetch or save is in flight
    pub is_loader_visible: bool,
    pub status_message: Option<String>,
    /// Duration of the last successful remote call
    pub duration: Option<Duration>,
    pub error_message: Option<String>,
    /// Whether the last error carries a structured detail payload
    pub has_error_details: bool,
}

impl SessionState {
    /// Create the initial state
    pub fn new(chunk_size: usize) -> Self {
        Self {
            has_more_rows: true,
            chunk_size,
            is_loader_visible: false,
            status_message: None,
            duration: None,
            error_message: None,
            has_error_details: false,
        }
    }
    
    pub fn is_fully_loaded(&self) -> bool {
        !self.has_more_rows
    }
    
    /// Record the status of a successful remote call
    pub fn record_success(&mut self, status_message: String, duration: Option<Duration>) {
        self.status_message = Some(status_message);
        self.duration = duration;
        self.clear_error();
    }
    
    pub fn record_error(&mut self, error: &RemoteError) {
        self.error_message = Some(error.user_message());
        self.has_error_details = error.has_details();
    }
    
    /// Record a local failure, which never carries details
    pub fn record_failure(&mut self, message: impl Into<String>) {
        self.error_message = Some(message.into());
        self.has_error_details = false;
    }
    
    pub fn clear_error(&mut self) {
        self.error_message = None;
        self.has_error_details = false;
    }
}

/// Trait for components that need to respond to view-model state changes
pub trait ViewModelSubscriber: Send + Sync {
    /// Called after every state mutation
    fn on_state_change(&self, state: &SessionState);
}

/// Weakly held subscribers
#[derive(Default)]
pub struct SubscriberList {
    subscribers: RwLock<Vec<Weak<dyn ViewModelSubscriber>>>,
}

impl SubscriberList {
    pub fn new() -> Self {
        Self::default()
    }
    
    /// Add a subscriber
    pub fn add(&self, subscriber: Arc<dyn ViewModelSubscriber>) {
        self.subscribers.write().push(Arc::downgrade(&subscriber));
    }
    
    /// Notify all live subscribers, dropping dead ones
    pub fn notify(&self, state: &SessionState) {
        let live: Vec<Arc<dyn ViewModelSubscriber>> = {
            let mut subscribers = self.subscribers.write();
            subscribers.retain(|weak| weak.strong_count() > 0);
            subscribers.iter().filter_map(Weak::upgrade).collect()
        };
        
        // Call out with the list unlocked so subscribers may subscribe others
        for subscriber in live {
            subscriber.on_state_change(state);
        }
    }
    
    pub fn len(&self) -> usize {
        self.subscribers.read().iter().filter(|weak| weak.strong_count() > 0).count()
    }
    
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    
    struct Recorder(Mutex<Vec<bool>>);
    
    impl ViewModelSubscriber for Recorder {
        fn on_state_change(&self, state: &SessionState) {
            self.0.lock().push(state.is_loader_visible);
        }
    }
    
    #[test]
    fn test_dead_subscribers_are_dropped() {
        let list = SubscriberList::new();
        let kept = Arc::new(Recorder(Mutex::new(Vec::new())));
        let dropped = Arc::new(Recorder(Mutex::new(Vec::new())));
        list.add(kept.clone());
        list.add(dropped.clone());
        drop(dropped);
        
        let mut state = SessionState::new(200);
        state.is_loader_visible = true;
        list.notify(&state);
        
        assert_eq!(list.len(), 1);
        assert_eq!(*kept.0.lock(), vec![true]);
    }
    
    #[test]
    fn test_success_clears_error() {
        let mut state = SessionState::new(200);
        state.record_error(&RemoteError::structured("bad", Some(serde_json::json!("trace"))));
        assert!(state.has_error_details);
        
        state.record_success("ok".to_string(), Some(Duration::from_millis(12)));
        assert_eq!(state.error_message, None);
        assert!(!state.has_error_details);
        assert_eq!(state.status_message.as_deref(), Some("ok"));
    }
}

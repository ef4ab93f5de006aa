//! Grid configuration

use serde::{Deserialize, Serialize};

/// Bounds for the window size requested from the remote source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchLimits {
    pub min: usize,
    pub max: usize,
    /// Used when no size, or a size of zero, is requested
    pub default: usize,
}

impl Default for FetchLimits {
    fn default() -> Self {
        Self {
            min: 1,
            max: 5000,
            default: 200,
        }
    }
}

impl FetchLimits {
    /// Clamp a requested window size into `[min, max]`. Zero yields the default.
    pub fn clamp(&self, requested: usize) -> usize {
        let requested = if requested == 0 { self.default } else { requested };
        // An inverted range from a bad config must not panic
        requested.max(self.min).min(self.max)
    }
}

/// Configuration of one grid view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub limits: FetchLimits,
    
    /// Initial window size (clamped by `limits`)
    pub chunk_size: usize,
    
    /// Keep the loader hidden while a window is being fetched
    pub no_loader_while_requesting_data: bool,
}

impl Default for GridConfig {
    fn default() -> Self {
        let limits = FetchLimits::default();
        Self {
            chunk_size: limits.default,
            limits,
            no_loader_while_requesting_data: false,
        }
    }
}

impl GridConfig {
    /// Parse a JSON configuration document. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
    
    /// The initial window size after clamping
    pub fn initial_chunk_size(&self) -> usize {
        self.limits.clamp(self.chunk_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    
    #[test]
    fn test_clamp() {
        let limits = FetchLimits::default();
        assert_eq!(limits.clamp(0), 200);
        assert_eq!(limits.clamp(1), 1);
        assert_eq!(limits.clamp(750), 750);
        assert_eq!(limits.clamp(5001), 5000);
        assert_eq!(limits.clamp(usize::MAX), 5000);
    }
    
    #[test]
    fn test_partial_json() {
        let config = GridConfig::from_json_str(r#"{ "chunk_size": 9000, "no_loader_while_requesting_data": true }"#).unwrap();
        assert_eq!(config.limits, FetchLimits::default());
        assert_eq!(config.initial_chunk_size(), 5000);
        assert!(config.no_loader_while_requesting_data);
        
        let empty = GridConfig::from_json_str("{}").unwrap();
        assert_eq!(empty, GridConfig::default());
    }
}

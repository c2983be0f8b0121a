//! Screen navigation stack
//!
//! Three destinations: the catalog list, the detail view of one record and the
//! player for one record. The catalog is the root and is never popped.

use crate::MediaRecord;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Navigation destinations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "screen", content = "item")]
pub enum Route {
    Catalog,
    Details(MediaRecord),
    Player(MediaRecord),
}

impl Route {
    /// Screen name
    pub fn name(&self) -> &'static str {
        match self {
            Route::Catalog => "Home",
            Route::Details(_) => "Details",
            Route::Player(_) => "Player",
        }
    }

    /// Record the route is parameterized by
    pub fn item(&self) -> Option<&MediaRecord> {
        match self {
            Route::Catalog => None,
            Route::Details(item) | Route::Player(item) => Some(item),
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.item() {
            Some(item) => write!(f, "{}({})", self.name(), item.id),
            None => f.write_str(self.name()),
        }
    }
}

/// Stack navigator rooted at the catalog
#[derive(Debug, Clone)]
pub struct Navigator {
    stack: Vec<Route>,
}

impl Navigator {
    /// Create a stack rooted at the catalog
    pub fn new() -> Self {
        Self {
            stack: vec![Route::Catalog],
        }
    }

    /// Push a destination
    pub fn navigate(&mut self, route: Route) {
        debug!(from = %self.current(), to = %route, "Navigate");
        self.stack.push(route);
    }

    /// Pop the current destination.
    ///
    /// Returns false at the root, letting the platform handle the back event.
    pub fn go_back(&mut self) -> bool {
        if self.stack.len() <= 1 {
            return false;
        }
        if let Some(left) = self.stack.pop() {
            debug!(from = %left, to = %self.current(), "Back");
        }
        true
    }

    /// Get the top route
    pub fn current(&self) -> &Route {
        // The root is never popped
        &self.stack[self.stack.len() - 1]
    }

    /// Number of routes on the stack
    pub fn depth(&self) -> usize {
        self.stack.len()
    }
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new()
    }
}

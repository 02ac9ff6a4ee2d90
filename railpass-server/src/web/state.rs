//! Application state for the web layer.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::itinerary::Itinerary;
use crate::session::SearchWorkerHandle;
use crate::stations::StationTable;

/// Shared application state.
///
/// Contains all the services needed to handle requests.
#[derive(Clone)]
pub struct AppState {
    /// The itinerary being planned; mutations are serialized by the lock
    pub itinerary: Arc<Mutex<Itinerary>>,

    /// Queue for searches on the booking site
    pub searcher: SearchWorkerHandle,

    /// Station directory
    pub stations: Arc<StationTable>,

    /// Where `save` and `load` read and write the itinerary
    pub itinerary_path: Arc<PathBuf>,
}

impl AppState {
    /// Create a new app state with an empty itinerary.
    pub fn new(
        searcher: SearchWorkerHandle,
        stations: StationTable,
        itinerary_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            itinerary: Arc::new(Mutex::new(Itinerary::new())),
            searcher,
            stations: Arc::new(stations),
            itinerary_path: Arc::new(itinerary_path.into()),
        }
    }
}

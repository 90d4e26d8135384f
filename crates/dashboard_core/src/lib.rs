pub mod aqi;
pub mod domain;
pub mod messages;
pub mod persist;
pub mod playlist;
pub mod ports;
pub mod power;
pub mod preview;
pub mod slices;
pub mod staleness;
pub mod store;

#[cfg(test)]
pub(crate) mod test_support;

pub use domain::{
    AirQualityReading, AqiCategory, Fact, FactId, Folder, FolderColor, FolderId, FolderListing,
    FolderUpdate, HackerNewsArticle, HourStatus, LightData, LoopMode, NewsDataArticle,
    NewsDataPage, Note, NoteId, NoteUpdate, Pollutant, PowerBlock, SensorReading, Track, TrackId,
    UserId,
};
pub use persist::{PersistError, Snapshot, PERSIST_SCHEMA};
pub use playlist::PlaylistCatalog;
pub use ports::{
    AirQualityService, Clock, FactService, LightService, NewsService, NotesService, PortError,
    PortResult, SnapshotStore, SystemClock,
};
pub use slices::{ActionError, ActionResult, FetchOutcome};
pub use store::{DashboardState, Services, Store, StoreSubscription};

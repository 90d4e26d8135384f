pub mod air_quality;
pub mod cipher;
pub mod db;
pub mod light;
pub mod news;
pub mod snapshot;

pub use air_quality::SensorCommunityAdapter;
pub use cipher::NoteCipher;
pub use db::DbAdapter;
pub use light::LightScheduleAdapter;
pub use news::NewsFeedAdapter;
pub use snapshot::JsonFileSnapshotStore;

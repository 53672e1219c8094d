pub mod board;
pub mod config;
pub mod resolve;
pub mod session;
pub mod store;
pub mod weather;

pub use board::{Board, BoardChange, BoardError, ContainerId, LinkItem, Section};
pub use config::{ConfigError, PortalConfig, SectionConfig, StorageConfig, WeatherConfig};
pub use resolve::{Candidate, DropSlot, Span, resolve, resolve_index};
pub use session::{DragSession, PortalCommand, RowGeometry};
pub use store::{
    FAVORITES_KEY, JsonFileStore, KeyValueStore, MemoryStore, SavedLink, StoreError, layout_key,
    restore_board, save_board,
};
pub use weather::{
    WeatherCondition, WeatherError, WeatherIcon, WeatherLocation, WeatherSummary, WeatherTone,
    describe, fetch_current_weather, forecast_url, parse_forecast,
};

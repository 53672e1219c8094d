use std::cell::RefCell;
use std::rc::Rc;

use anyhow::{Context as _, Result};
use portal_core::{
    Board, JsonFileStore, KeyValueStore, MemoryStore, PortalConfig, restore_board, save_board,
};

pub(crate) type SharedStore = Rc<RefCell<Box<dyn KeyValueStore>>>;

/// Everything the window needs, resolved before the app starts.
pub(crate) struct Startup {
    pub(crate) config: PortalConfig,
    pub(crate) board: Board,
    pub(crate) store: SharedStore,
}

impl Startup {
    pub(crate) fn load() -> Result<Self> {
        let config = PortalConfig::discover().context("failed to load portal configuration")?;
        let store = open_store(&config);
        let catalog = config.catalog();

        let board = restore_board(&*store, &catalog).unwrap_or_else(|err| {
            tracing::warn!("failed to restore saved layout: {err}");
            catalog
        });
        tracing::info!(
            sections = board.sections().len(),
            favorites = board.favorites().len(),
            "board ready"
        );

        Ok(Self {
            config,
            board,
            store: Rc::new(RefCell::new(store)),
        })
    }
}

fn open_store(config: &PortalConfig) -> Box<dyn KeyValueStore> {
    let opened = config
        .store_path()
        .map_err(anyhow::Error::from)
        .and_then(|path| {
            JsonFileStore::open(&path)
                .with_context(|| format!("failed to open store at {}", path.display()))
        });

    match opened {
        Ok(store) => {
            tracing::info!("using store {}", store.path().display());
            Box::new(store)
        }
        Err(err) => {
            tracing::warn!("{err:#}; changes will not survive a restart");
            Box::new(MemoryStore::new())
        }
    }
}

pub(crate) fn persist(store: &SharedStore, board: &Board) {
    if let Err(err) = save_board(&mut **store.borrow_mut(), board) {
        tracing::error!("failed to save board: {err}");
    }
}

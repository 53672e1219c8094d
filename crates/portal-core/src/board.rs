use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::session::PortalCommand;

/// A single link card.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkItem {
    pub href: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default)]
    pub new_tab: bool,
}

impl LinkItem {
    pub fn new(href: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            label: label.into(),
            icon: None,
            new_tab: false,
        }
    }

    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn new_tab(mut self, new_tab: bool) -> Self {
        self.new_tab = new_tab;
        self
    }
}

/// A titled group of links. Sections with an empty id are never persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Section {
    pub id: String,
    pub title: String,
    pub links: Vec<LinkItem>,
}

impl Section {
    pub fn new(id: impl Into<String>, title: impl Into<String>, links: Vec<LinkItem>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            links,
        }
    }
}

/// Identifies one drop container on the board.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ContainerId {
    Section(String),
    Favorites,
}

impl ContainerId {
    pub fn section(id: impl Into<String>) -> Self {
        ContainerId::Section(id.into())
    }

    pub fn is_favorites(&self) -> bool {
        matches!(self, ContainerId::Favorites)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BoardError {
    #[error("unknown container {0:?}")]
    UnknownContainer(ContainerId),
    #[error("index {index} is out of range for {container:?} ({len} items)")]
    IndexOutOfRange {
        container: ContainerId,
        index: usize,
        len: usize,
    },
    #[error("item at {index} in {container:?} is no longer {href}")]
    StaleItem {
        container: ContainerId,
        index: usize,
        href: String,
    },
}

/// What a command did to the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoardChange {
    Moved,
    FavoriteAdded,
    FavoriteRemoved,
    Unchanged,
}

impl BoardChange {
    pub fn is_changed(self) -> bool {
        self != BoardChange::Unchanged
    }
}

/// Link sections plus the pinned favorites area.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Board {
    sections: Vec<Section>,
    favorites: Vec<LinkItem>,
}

impl Board {
    pub fn new(sections: Vec<Section>) -> Self {
        Self {
            sections,
            favorites: Vec::new(),
        }
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn favorites(&self) -> &[LinkItem] {
        &self.favorites
    }

    pub fn section(&self, id: &str) -> Option<&Section> {
        self.sections.iter().find(|section| section.id == id)
    }

    pub(crate) fn section_mut(&mut self, id: &str) -> Option<&mut Section> {
        self.sections.iter_mut().find(|section| section.id == id)
    }

    pub(crate) fn clear_favorites(&mut self) {
        self.favorites.clear();
    }

    pub fn items(&self, container: &ContainerId) -> Option<&[LinkItem]> {
        match container {
            ContainerId::Section(id) => self.section(id).map(|section| section.links.as_slice()),
            ContainerId::Favorites => Some(&self.favorites),
        }
    }

    fn items_mut(&mut self, container: &ContainerId) -> Result<&mut Vec<LinkItem>, BoardError> {
        match container {
            ContainerId::Section(id) => self
                .section_mut(id)
                .map(|section| &mut section.links)
                .ok_or_else(|| BoardError::UnknownContainer(container.clone())),
            ContainerId::Favorites => Ok(&mut self.favorites),
        }
    }

    /// The first section link with this href, in section order.
    pub fn find_link(&self, href: &str) -> Option<&LinkItem> {
        self.sections
            .iter()
            .flat_map(|section| section.links.iter())
            .find(|link| link.href == href)
    }

    pub fn is_favorite(&self, href: &str) -> bool {
        self.favorites.iter().any(|link| link.href == href)
    }

    /// Pin a link. Returns `false` when a favorite with the same href exists.
    pub fn add_favorite(&mut self, link: LinkItem) -> bool {
        if self.is_favorite(&link.href) {
            return false;
        }
        self.favorites.push(link);
        true
    }

    pub fn remove_favorite(&mut self, href: &str) -> Option<LinkItem> {
        let ix = self.favorites.iter().position(|link| link.href == href)?;
        Some(self.favorites.remove(ix))
    }

    pub fn favorites_placeholder_visible(&self) -> bool {
        self.favorites.is_empty()
    }

    /// Move the item at `from_index` of `from` into `to`.
    ///
    /// `insert_at` indexes the target list after the item has been removed and
    /// is clamped to its length.
    pub fn move_link(
        &mut self,
        from: &ContainerId,
        from_index: usize,
        to: &ContainerId,
        insert_at: usize,
    ) -> Result<(), BoardError> {
        self.items_mut(to)?;
        let source = self.items_mut(from)?;
        if from_index >= source.len() {
            return Err(BoardError::IndexOutOfRange {
                container: from.clone(),
                index: from_index,
                len: source.len(),
            });
        }
        let item = source.remove(from_index);

        let target = self.items_mut(to)?;
        let insert_at = insert_at.min(target.len());
        target.insert(insert_at, item);
        Ok(())
    }

    /// Apply a controller command.
    pub fn apply(&mut self, command: PortalCommand) -> Result<BoardChange, BoardError> {
        match command {
            PortalCommand::Reorder {
                from,
                from_index,
                href,
                to,
                slot,
            } => {
                let len = self
                    .items(&from)
                    .ok_or_else(|| BoardError::UnknownContainer(from.clone()))?
                    .len();
                let current = self
                    .items(&from)
                    .and_then(|items| items.get(from_index))
                    .ok_or(BoardError::IndexOutOfRange {
                        container: from.clone(),
                        index: from_index,
                        len,
                    })?;
                if current.href != href {
                    return Err(BoardError::StaleItem {
                        container: from,
                        index: from_index,
                        href,
                    });
                }

                let target_len = self
                    .items(&to)
                    .ok_or_else(|| BoardError::UnknownContainer(to.clone()))?
                    .len();
                let remaining = if from == to {
                    target_len.saturating_sub(1)
                } else {
                    target_len
                };
                let insert_at = match slot {
                    crate::DropSlot::Before(ix) => ix,
                    crate::DropSlot::EndOfList => remaining,
                };

                if from == to && insert_at.min(remaining) == from_index {
                    return Ok(BoardChange::Unchanged);
                }

                self.move_link(&from, from_index, &to, insert_at)?;
                Ok(BoardChange::Moved)
            }
            PortalCommand::AddFavorite { link } => {
                if self.add_favorite(link) {
                    Ok(BoardChange::FavoriteAdded)
                } else {
                    Ok(BoardChange::Unchanged)
                }
            }
            PortalCommand::RemoveFavorite { href } => match self.remove_favorite(&href) {
                Some(_) => Ok(BoardChange::FavoriteRemoved),
                None => Ok(BoardChange::Unchanged),
            },
        }
    }
}

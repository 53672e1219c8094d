use crate::board::{Board, ContainerId, LinkItem};
use crate::resolve::{Candidate, DropSlot, Span, resolve};

/// One rendered row of a container, measured in the current layout pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RowGeometry {
    pub index: usize,
    pub span: Span,
}

impl RowGeometry {
    pub fn new(index: usize, top: f32, height: f32) -> Self {
        Self {
            index,
            span: Span::new(top, height),
        }
    }
}

impl Candidate for RowGeometry {
    fn top(&self) -> f32 {
        self.span.top
    }

    fn height(&self) -> f32 {
        self.span.height
    }
}

/// A board mutation requested by the drag controller or a row action.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PortalCommand {
    /// Move a link. `slot` indexes the target list with the dragged link removed.
    Reorder {
        from: ContainerId,
        from_index: usize,
        href: String,
        to: ContainerId,
        slot: DropSlot<usize>,
    },
    AddFavorite {
        link: LinkItem,
    },
    RemoveFavorite {
        href: String,
    },
}

/// The link being dragged, from drag start until drop or cancel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DragSession {
    origin: ContainerId,
    origin_index: usize,
    link: LinkItem,
}

impl DragSession {
    /// Begin dragging the item at `index` of `container`.
    pub fn start(board: &Board, container: ContainerId, index: usize) -> Option<Self> {
        let link = board.items(&container)?.get(index)?.clone();
        Some(Self {
            origin: container,
            origin_index: index,
            link,
        })
    }

    pub fn origin(&self) -> &ContainerId {
        &self.origin
    }

    pub fn origin_index(&self) -> usize {
        self.origin_index
    }

    pub fn link(&self) -> &LinkItem {
        &self.link
    }

    /// Whether `index` of `container` is the row being dragged.
    pub fn is_dragged(&self, container: &ContainerId, index: usize) -> bool {
        self.origin == *container && self.origin_index == index
    }

    /// Whether dropping onto `target` would do anything.
    pub fn accepts(&self, target: &ContainerId) -> bool {
        !(self.origin.is_favorites() && !target.is_favorites())
    }

    /// Resolve where the dragged link would land in `target`.
    ///
    /// `rows` are the rendered rows of `target`. The dragged row is skipped, and
    /// the result indexes the target list with the dragged link removed.
    pub fn drop_slot(
        &self,
        target: &ContainerId,
        rows: impl IntoIterator<Item = RowGeometry>,
        cursor_y: f32,
    ) -> DropSlot<usize> {
        let same_container = self.origin == *target;
        let candidates = rows
            .into_iter()
            .filter(|row| !(same_container && row.index == self.origin_index));

        resolve(candidates, cursor_y).map(|row| {
            if same_container && row.index > self.origin_index {
                row.index - 1
            } else {
                row.index
            }
        })
    }

    /// Finish the drag on `target`, turning it into a board command.
    pub fn into_command(self, target: ContainerId, slot: DropSlot<usize>) -> Option<PortalCommand> {
        match (&self.origin, &target) {
            (ContainerId::Section(_), ContainerId::Favorites) => {
                Some(PortalCommand::AddFavorite { link: self.link })
            }
            (ContainerId::Favorites, ContainerId::Section(_)) => None,
            _ => Some(PortalCommand::Reorder {
                from: self.origin,
                from_index: self.origin_index,
                href: self.link.href,
                to: target,
                slot,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{BoardChange, Section};

    fn board() -> Board {
        Board::new(vec![
            Section::new(
                "tax",
                "Tax",
                vec![
                    LinkItem::new("https://a.example/", "A"),
                    LinkItem::new("https://b.example/", "B"),
                    LinkItem::new("https://c.example/", "C"),
                ],
            ),
            Section::new("bank", "Bank", vec![LinkItem::new("https://x.example/", "X")]),
        ])
    }

    fn rows(count: usize) -> Vec<RowGeometry> {
        (0..count)
            .map(|ix| RowGeometry::new(ix, ix as f32 * 40.0, 40.0))
            .collect()
    }

    #[test]
    fn start_requires_existing_item() {
        let board = board();
        assert!(DragSession::start(&board, ContainerId::section("tax"), 3).is_none());
        assert!(DragSession::start(&board, ContainerId::section("missing"), 0).is_none());
        assert!(DragSession::start(&board, ContainerId::Favorites, 0).is_none());

        let session = DragSession::start(&board, ContainerId::section("tax"), 1).unwrap();
        assert_eq!(session.link().label, "B");
        assert!(session.is_dragged(&ContainerId::section("tax"), 1));
        assert!(!session.is_dragged(&ContainerId::section("bank"), 1));
    }

    #[test]
    fn drop_slot_skips_dragged_row() {
        let board = board();
        let tax = ContainerId::section("tax");
        let session = DragSession::start(&board, tax.clone(), 0).unwrap();

        // Over the dragged row's own midpoint, the next remaining row wins.
        assert_eq!(session.drop_slot(&tax, rows(3), 10.0), DropSlot::Before(0));
        // Between B (60) and C (100), C becomes index 1 once A is removed.
        assert_eq!(session.drop_slot(&tax, rows(3), 80.0), DropSlot::Before(1));
        assert_eq!(session.drop_slot(&tax, rows(3), 110.0), DropSlot::EndOfList);
    }

    #[test]
    fn drop_slot_in_other_container_uses_every_row() {
        let board = board();
        let session = DragSession::start(&board, ContainerId::section("tax"), 0).unwrap();
        let bank = ContainerId::section("bank");

        assert_eq!(session.drop_slot(&bank, rows(1), 5.0), DropSlot::Before(0));
        assert_eq!(session.drop_slot(&bank, rows(1), 25.0), DropSlot::EndOfList);
        assert_eq!(session.drop_slot(&bank, Vec::new(), 0.0), DropSlot::EndOfList);
    }

    #[test]
    fn drag_to_end_of_same_section() {
        let mut board = board();
        let tax = ContainerId::section("tax");
        let session = DragSession::start(&board, tax.clone(), 0).unwrap();

        let slot = session.drop_slot(&tax, rows(3), 500.0);
        let command = session.into_command(tax.clone(), slot).unwrap();
        assert_eq!(board.apply(command).unwrap(), BoardChange::Moved);

        let labels: Vec<_> = board.items(&tax).unwrap().iter().map(|l| l.label.as_str()).collect();
        assert_eq!(labels, ["B", "C", "A"]);
    }

    #[test]
    fn drag_upwards_in_same_section() {
        let mut board = board();
        let tax = ContainerId::section("tax");
        let session = DragSession::start(&board, tax.clone(), 2).unwrap();

        let slot = session.drop_slot(&tax, rows(3), 15.0);
        assert_eq!(slot, DropSlot::Before(0));
        let command = session.into_command(tax.clone(), slot).unwrap();
        board.apply(command).unwrap();

        let labels: Vec<_> = board.items(&tax).unwrap().iter().map(|l| l.label.as_str()).collect();
        assert_eq!(labels, ["C", "A", "B"]);
    }

    #[test]
    fn section_to_favorites_pins_a_copy() {
        let mut board = board();
        let tax = ContainerId::section("tax");

        for _ in 0..2 {
            let session = DragSession::start(&board, tax.clone(), 1).unwrap();
            let command = session
                .into_command(ContainerId::Favorites, DropSlot::EndOfList)
                .unwrap();
            board.apply(command).unwrap();
        }

        assert_eq!(board.favorites().len(), 1);
        assert_eq!(board.favorites()[0].href, "https://b.example/");
        assert_eq!(board.items(&tax).unwrap().len(), 3);
    }

    #[test]
    fn favorites_reorder_within_favorites_only() {
        let mut board = board();
        board.add_favorite(LinkItem::new("https://a.example/", "A"));
        board.add_favorite(LinkItem::new("https://b.example/", "B"));

        let session = DragSession::start(&board, ContainerId::Favorites, 1).unwrap();
        assert!(session.accepts(&ContainerId::Favorites));
        assert!(!session.accepts(&ContainerId::section("tax")));
        assert_eq!(
            session
                .clone()
                .into_command(ContainerId::section("tax"), DropSlot::EndOfList),
            None
        );

        let command = session
            .into_command(ContainerId::Favorites, DropSlot::Before(0))
            .unwrap();
        assert_eq!(board.apply(command).unwrap(), BoardChange::Moved);
        assert_eq!(board.favorites()[0].label, "B");
    }
}

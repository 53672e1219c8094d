use std::collections::BTreeMap;
use std::rc::Rc;

use gpui::{
    App, AppContext as _, Context, CursorStyle, ElementId, Entity, EntityId, FocusHandle,
    FontWeight, InteractiveElement as _, IntoElement, ParentElement as _, Render, RenderOnce,
    SharedString, StatefulInteractiveElement as _, StyleRefinement, Styled, Window, div,
    prelude::FluentBuilder as _, px,
};
use gpui_component::list::ListItem;
use gpui_component::{
    ActiveTheme as _, Icon, IconName, Sizable as _, StyledExt as _, h_flex, v_flex,
};
use portal_core::{
    Board, BoardChange, ContainerId, DragSession, DropSlot, LinkItem, PortalCommand, RowGeometry,
};

const CONTEXT: &str = "LinkBoard";
const FAVORITES_TITLE: &str = "お気に入り";
const FAVORITES_PLACEHOLDER: &str = "よく使うリンクをここにドラッグしてください";
const PIN_BADGE: &str = "＋お気に入り";

type RenderLink =
    Rc<dyn Fn(&ContainerId, usize, &LinkItem, LinkRowState, &mut Window, &mut App) -> ListItem>;

/// Create a [`LinkBoard`].
pub fn link_board<R>(state: &Entity<LinkBoardState>, render_link: R) -> LinkBoard
where
    R: Fn(&ContainerId, usize, &LinkItem, LinkRowState, &mut Window, &mut App) -> ListItem
        + 'static,
{
    LinkBoard::new(state, render_link)
}

#[derive(Clone)]
struct LinkDrag {
    board_id: EntityId,
    container: ContainerId,
    ix: usize,
    label: SharedString,
}

/// Floating chip under the cursor. Shows a pin badge while over the favorites card.
struct DragGhost {
    board: Entity<LinkBoardState>,
    label: SharedString,
}

impl Render for DragGhost {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let pins = self
            .board
            .read(cx)
            .drop_preview
            .as_ref()
            .is_some_and(|preview| preview.pins);
        let theme = cx.theme();

        h_flex()
            .gap_x_2()
            .items_center()
            .max_w(px(280.))
            .px(px(10.))
            .py(px(6.))
            .rounded(px(8.))
            .bg(theme.popover)
            .border_1()
            .border_color(if pins { theme.drag_border } else { theme.border })
            .shadow_md()
            .text_color(theme.popover_foreground)
            .text_sm()
            .child(Icon::from(IconName::Globe).small().text_color(theme.muted_foreground))
            .child(div().truncate().child(self.label.clone()))
            .when(pins, |this| {
                this.child(
                    div()
                        .px(px(6.))
                        .rounded(px(4.))
                        .bg(theme.drag_border)
                        .text_color(theme.background)
                        .text_xs()
                        .child(PIN_BADGE),
                )
            })
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct LinkRowState {
    pub dragging: bool,
    pub favorite: bool,
    /// The insertion line is drawn above this row.
    pub drop_before: bool,
}

#[derive(Clone, Debug, PartialEq)]
struct DropPreview {
    container: ContainerId,
    slot: DropSlot<usize>,
    /// Dropping pins a copy instead of moving the link.
    pins: bool,
}

impl DropPreview {
    /// Rendered row index that gets the insertion line, `None` for the end of the list.
    fn line_row(&self, session: &DragSession) -> Option<usize> {
        let DropSlot::Before(ix) = self.slot else {
            return None;
        };
        if *session.origin() == self.container && ix >= session.origin_index() {
            Some(ix + 1)
        } else {
            Some(ix)
        }
    }
}

#[derive(Default)]
struct LinkBoardCallbacks {
    on_change: Option<Rc<dyn Fn(&Board, BoardChange)>>,
}

/// State for the link board: the sections, the favorites area and the drag in flight.
pub struct LinkBoardState {
    focus_handle: FocusHandle,
    board: Board,
    session: Option<DragSession>,
    row_bounds: BTreeMap<ContainerId, BTreeMap<usize, RowGeometry>>,
    hovered: Option<(ContainerId, f32)>,
    drop_preview: Option<DropPreview>,
    callbacks: LinkBoardCallbacks,
    render_link: RenderLink,
}

impl LinkBoardState {
    pub fn new(board: Board, cx: &mut App) -> Self {
        Self {
            focus_handle: cx.focus_handle(),
            board,
            session: None,
            row_bounds: BTreeMap::new(),
            hovered: None,
            drop_preview: None,
            callbacks: LinkBoardCallbacks::default(),
            render_link: Rc::new(|_, ix, _, _, _, _| ListItem::new(ix)),
        }
    }

    /// Provide a callback invoked after every command that changed the board.
    pub fn on_change(mut self, on_change: impl Fn(&Board, BoardChange) + 'static) -> Self {
        self.callbacks.on_change = Some(Rc::new(on_change));
        self
    }

    /// Apply a command and report the change to `on_change`.
    fn apply(&mut self, command: PortalCommand, cx: &mut Context<Self>) -> BoardChange {
        let change = match self.board.apply(command) {
            Ok(change) => change,
            Err(err) => {
                tracing::warn!("board command rejected: {err}");
                return BoardChange::Unchanged;
            }
        };

        if change.is_changed() {
            tracing::debug!(?change, "board changed");
            cx.notify();
            if let Some(on_change) = self.callbacks.on_change.as_ref() {
                on_change(&self.board, change);
            }
        }
        change
    }

    pub fn remove_favorite(&mut self, href: &str, cx: &mut Context<Self>) -> BoardChange {
        self.apply(
            PortalCommand::RemoveFavorite {
                href: href.to_string(),
            },
            cx,
        )
    }

    fn open_link(&mut self, container: &ContainerId, ix: usize, cx: &mut Context<Self>) {
        let Some(link) = self.board.items(container).and_then(|items| items.get(ix)) else {
            return;
        };
        tracing::debug!(href = %link.href, "opening link");
        cx.open_url(&link.href);
    }

    fn end_drag(&mut self) {
        self.session = None;
        self.row_bounds.clear();
        self.hovered = None;
        self.drop_preview = None;
    }

    fn on_drag_start(&mut self, drag: &LinkDrag, _window: &mut Window, cx: &mut Context<Self>) {
        self.end_drag();
        self.session = DragSession::start(&self.board, drag.container.clone(), drag.ix);
        if let Some(session) = self.session.as_ref() {
            tracing::debug!(href = %session.link().href, from = ?session.origin(), "drag started");
        }
        cx.notify();
    }

    fn candidates(&self, container: &ContainerId) -> Vec<RowGeometry> {
        let len = self.board.items(container).map_or(0, |items| items.len());
        self.row_bounds
            .get(container)
            .map(|rows| rows.values().filter(|row| row.index < len).copied().collect())
            .unwrap_or_default()
    }

    fn refresh_preview(&mut self, cx: &mut Context<Self>) {
        let new_preview = (|| {
            let session = self.session.as_ref()?;
            let (container, cursor_y) = self.hovered.as_ref()?;
            if !session.accepts(container) {
                return None;
            }
            let pins = pins_link(session, container);
            let slot = if pins {
                DropSlot::EndOfList
            } else {
                session.drop_slot(container, self.candidates(container), *cursor_y)
            };
            Some(DropPreview {
                container: container.clone(),
                slot,
                pins,
            })
        })();

        if self.drop_preview != new_preview {
            self.drop_preview = new_preview;
            cx.notify();
        }
    }

    fn on_container_drag_move(
        &mut self,
        container: &ContainerId,
        event: &gpui::DragMoveEvent<LinkDrag>,
        _window: &mut Window,
        cx: &mut Context<Self>,
    ) {
        if !cx.has_active_drag() || event.drag(cx).board_id != cx.entity_id() {
            return;
        }

        let mouse_position = event.event.position;
        if event.bounds.contains(&mouse_position) {
            self.hovered = Some((container.clone(), mouse_position.y.into()));
        } else if self
            .hovered
            .as_ref()
            .is_some_and(|(hovered, _)| hovered == container)
        {
            self.hovered = None;
        }
        self.refresh_preview(cx);
    }

    fn on_row_drag_move(
        &mut self,
        container: &ContainerId,
        ix: usize,
        event: &gpui::DragMoveEvent<LinkDrag>,
        _window: &mut Window,
        cx: &mut Context<Self>,
    ) {
        if !cx.has_active_drag() || event.drag(cx).board_id != cx.entity_id() {
            return;
        }

        let bounds = event.bounds;
        let row = RowGeometry::new(ix, bounds.origin.y.into(), bounds.size.height.into());
        self.row_bounds
            .entry(container.clone())
            .or_default()
            .insert(ix, row);
        if self
            .hovered
            .as_ref()
            .is_some_and(|(hovered, _)| hovered == container)
        {
            self.refresh_preview(cx);
        }
    }

    fn on_drop(
        &mut self,
        container: &ContainerId,
        drag: &LinkDrag,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) {
        if drag.board_id != cx.entity_id() {
            return;
        }

        let Some(session) = self.session.take() else {
            return;
        };
        let cursor_y: f32 = window.mouse_position().y.into();
        let slot = session.drop_slot(container, self.candidates(container), cursor_y);
        self.end_drag();
        cx.notify();

        if let Some(command) = session.into_command(container.clone(), slot) {
            self.apply(command, cx);
        }
    }

    fn render_container(
        &self,
        container: ContainerId,
        title: SharedString,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) -> impl IntoElement + use<> {
        let theme = cx.theme();
        let border = theme.border;
        let background = theme.background;
        let muted_foreground = theme.muted_foreground;
        let drag_border = theme.drag_border;
        let drop_target_bg = theme.drop_target;

        let items = self.board.items(&container).unwrap_or_default();
        let active_drag = cx.has_active_drag();
        let preview = self
            .drop_preview
            .as_ref()
            .filter(|preview| preview.container == container);
        let line_row = preview
            .filter(|preview| !preview.pins)
            .zip(self.session.as_ref())
            .map(|(preview, session)| preview.line_row(session));
        let highlight = preview.is_some_and(|preview| preview.pins);
        let state_entity = cx.entity();
        let board_id = cx.entity_id();

        let mut rows = Vec::with_capacity(items.len());
        for (ix, link) in items.iter().enumerate() {
            let dragging = active_drag
                && self
                    .session
                    .as_ref()
                    .is_some_and(|session| session.is_dragged(&container, ix));
            let row_state = LinkRowState {
                dragging,
                favorite: self.board.is_favorite(&link.href),
                drop_before: line_row == Some(Some(ix)),
            };

            let list_item = (self.render_link)(&container, ix, link, row_state, window, cx);
            let drag_value = LinkDrag {
                board_id,
                container: container.clone(),
                ix,
                label: link.label.clone().into(),
            };

            let move_container = container.clone();
            let click_container = container.clone();
            let state_entity = state_entity.clone();
            let row = div()
                .id(ix)
                .relative()
                .border_t_2()
                .border_color(if row_state.drop_before {
                    drag_border
                } else {
                    gpui::transparent_black()
                })
                .cursor(CursorStyle::OpenHand)
                .child(list_item)
                .on_drag_move::<LinkDrag>(cx.listener(move |this, event, window, cx| {
                    this.on_row_drag_move(&move_container, ix, event, window, cx);
                }))
                .on_click(cx.listener(move |this, _event, _window, cx| {
                    this.open_link(&click_container, ix, cx);
                }))
                .on_drag(drag_value, move |drag, _offset, window, cx| {
                    state_entity.update(cx, |state, cx| {
                        state.on_drag_start(drag, window, cx);
                    });
                    let board = state_entity.clone();
                    let label = drag.label.clone();
                    cx.new(|_| DragGhost { board, label })
                });
            rows.push(row);
        }

        let line_at_end = line_row == Some(None);
        let is_favorites = container.is_favorites();
        let placeholder = is_favorites && self.board.favorites_placeholder_visible();
        let move_container = container.clone();
        let drop_container = container.clone();

        v_flex()
            .id(ElementId::Name(container_key(&container).into()))
            .min_w(px(240.))
            .p(px(12.))
            .gap_y_2()
            .rounded(px(12.))
            .border_1()
            .border_color(border)
            .bg(background)
            .when(highlight, |this| {
                this.bg(drop_target_bg.alpha(drop_target_bg.a.max(0.2)))
                    .border_color(drag_border)
            })
            .child(
                div()
                    .text_sm()
                    .font_weight(FontWeight::SEMIBOLD)
                    .child(title),
            )
            .child(
                v_flex()
                    .gap_y_1()
                    .children(rows)
                    .when(placeholder, |this| {
                        this.child(
                            div()
                                .py(px(12.))
                                .text_sm()
                                .text_color(muted_foreground)
                                .child(FAVORITES_PLACEHOLDER),
                        )
                    })
                    .when(line_at_end, |this| {
                        this.child(div().h(px(2.)).w_full().bg(drag_border))
                    }),
            )
            .on_drag_move::<LinkDrag>(cx.listener(move |this, event, window, cx| {
                this.on_container_drag_move(&move_container, event, window, cx);
            }))
            .on_drop::<LinkDrag>(cx.listener(move |this, drag, window, cx| {
                this.on_drop(&drop_container, drag, window, cx);
            }))
    }
}

/// Dropping a section link on favorites pins a copy rather than moving it.
fn pins_link(session: &DragSession, target: &ContainerId) -> bool {
    !session.origin().is_favorites() && target.is_favorites()
}

fn container_key(container: &ContainerId) -> String {
    match container {
        ContainerId::Section(id) => format!("link-board-section-{id}"),
        ContainerId::Favorites => "link-board-favorites".to_string(),
    }
}

impl Render for LinkBoardState {
    fn render(&mut self, window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        if !cx.has_active_drag() && self.session.is_some() {
            self.end_drag();
        }

        let favorites =
            self.render_container(ContainerId::Favorites, FAVORITES_TITLE.into(), window, cx);
        let sections = self
            .board
            .sections()
            .iter()
            .map(|section| {
                (
                    ContainerId::Section(section.id.clone()),
                    SharedString::from(section.title.clone()),
                )
            })
            .collect::<Vec<_>>();
        let section_cards = sections
            .into_iter()
            .map(|(container, title)| {
                self.render_container(container, title, window, cx)
                    .into_any_element()
            })
            .collect::<Vec<_>>();

        v_flex()
            .id("link-board-state")
            .size_full()
            .gap_y_3()
            .child(favorites)
            .child(h_flex().flex_wrap().items_start().gap_3().children(section_cards))
    }
}

/// The portal's link board element.
#[derive(IntoElement)]
pub struct LinkBoard {
    id: ElementId,
    state: Entity<LinkBoardState>,
    style: StyleRefinement,
    render_link: RenderLink,
}

impl LinkBoard {
    pub fn new<R>(state: &Entity<LinkBoardState>, render_link: R) -> Self
    where
        R: Fn(&ContainerId, usize, &LinkItem, LinkRowState, &mut Window, &mut App) -> ListItem
            + 'static,
    {
        Self {
            id: ElementId::Name(format!("link-board-{}", state.entity_id()).into()),
            state: state.clone(),
            style: StyleRefinement::default(),
            render_link: Rc::new(render_link),
        }
    }
}

impl Styled for LinkBoard {
    fn style(&mut self) -> &mut StyleRefinement {
        &mut self.style
    }
}

impl RenderOnce for LinkBoard {
    fn render(self, _window: &mut Window, cx: &mut App) -> impl IntoElement {
        let focus_handle = self.state.read(cx).focus_handle.clone();
        self.state
            .update(cx, |state, _| state.render_link = self.render_link);

        div()
            .id(self.id)
            .key_context(CONTEXT)
            .track_focus(&focus_handle)
            .size_full()
            .child(self.state)
            .refine_style(&self.style)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portal_core::{LinkItem, Section};

    fn session(origin: ContainerId, origin_index: usize) -> DragSession {
        let links = (0..4)
            .map(|ix| LinkItem::new(format!("https://l.example/{ix}"), format!("L{ix}")))
            .collect::<Vec<_>>();
        let mut board = Board::new(vec![Section::new("s", "S", links.clone())]);
        for link in links {
            board.add_favorite(link);
        }
        DragSession::start(&board, origin, origin_index).unwrap()
    }

    #[test]
    fn line_row_skips_over_dragged_row() {
        let section = ContainerId::section("s");
        let session = session(section.clone(), 1);
        let preview = |slot| DropPreview {
            container: section.clone(),
            slot,
            pins: false,
        };

        assert_eq!(preview(DropSlot::Before(0)).line_row(&session), Some(0));
        assert_eq!(preview(DropSlot::Before(1)).line_row(&session), Some(2));
        assert_eq!(preview(DropSlot::Before(2)).line_row(&session), Some(3));
        assert_eq!(preview(DropSlot::EndOfList).line_row(&session), None);
    }

    #[test]
    fn line_row_in_other_container_is_unshifted() {
        let session = session(ContainerId::Favorites, 0);
        let preview = DropPreview {
            container: ContainerId::section("s"),
            slot: DropSlot::Before(0),
            pins: false,
        };
        assert_eq!(preview.line_row(&session), Some(0));
    }

    #[test]
    fn only_section_links_pin_on_favorites() {
        let from_section = session(ContainerId::section("s"), 0);
        assert!(pins_link(&from_section, &ContainerId::Favorites));
        assert!(!pins_link(&from_section, &ContainerId::section("s")));

        let from_favorites = session(ContainerId::Favorites, 0);
        assert!(!pins_link(&from_favorites, &ContainerId::Favorites));
    }

    #[test]
    fn container_keys_are_distinct() {
        assert_ne!(
            container_key(&ContainerId::Favorites),
            container_key(&ContainerId::section("favorites"))
        );
    }
}

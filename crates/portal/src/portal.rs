use gpui::prelude::FluentBuilder as _;
use gpui::*;
use gpui_component::button::{Button, ButtonVariants as _};
use gpui_component::list::ListItem;
use gpui_component::{ActiveTheme as _, Icon, IconName, Sizable as _, h_flex, v_flex};
use gpui_link_board::{LinkBoardState, LinkRowState, link_board};
use portal_core::weather::FAILURE_TEXT;
use portal_core::{
    ContainerId, LinkItem, WeatherConfig, WeatherSummary, WeatherTone, fetch_current_weather,
};

use crate::startup::{Startup, persist};

pub const CONTEXT: &str = "Portal";
const TITLE: &str = "経理ポータル";
const HINT: &str = "リンクをドラッグして並び替え・お気に入りに追加できます";

actions!(portal, [RefreshWeather, Quit]);

pub fn init_keybindings(cx: &mut App) {
    cx.bind_keys([
        KeyBinding::new("f5", RefreshWeather, Some(CONTEXT)),
        #[cfg(target_os = "macos")]
        KeyBinding::new("cmd-q", Quit, None),
        #[cfg(not(target_os = "macos"))]
        KeyBinding::new("ctrl-q", Quit, None),
    ]);
    cx.on_action(|_: &Quit, cx| cx.quit());
}

#[derive(Clone, Debug)]
enum WeatherState {
    Disabled,
    Loading,
    Ready(WeatherSummary),
    Failed,
}

pub struct PortalView {
    focus_handle: FocusHandle,
    board: Entity<LinkBoardState>,
    weather_config: WeatherConfig,
    weather: WeatherState,
    weather_seq: u64,
}

impl PortalView {
    pub(crate) fn view(startup: Startup, window: &mut Window, cx: &mut App) -> Entity<Self> {
        cx.new(|cx| Self::new(startup, window, cx))
    }

    fn new(startup: Startup, window: &mut Window, cx: &mut Context<Self>) -> Self {
        let Startup {
            config,
            board,
            store,
        } = startup;

        let board = cx.new(|cx| {
            LinkBoardState::new(board, cx).on_change(move |board, change| {
                tracing::debug!(?change, "persisting board");
                persist(&store, board);
            })
        });

        let mut this = Self {
            focus_handle: cx.focus_handle(),
            board,
            weather_config: config.weather,
            weather: WeatherState::Disabled,
            weather_seq: 0,
        };
        this.refresh_weather(window, cx);
        this
    }

    fn refresh_weather(&mut self, window: &mut Window, cx: &mut Context<Self>) {
        if !self.weather_config.enabled {
            self.weather = WeatherState::Disabled;
            return;
        }

        self.weather_seq = self.weather_seq.wrapping_add(1);
        let seq = self.weather_seq;
        self.weather = WeatherState::Loading;
        cx.notify();

        let config = self.weather_config.clone();
        cx.spawn_in(window, async move |this, window| {
            let result = window
                .background_executor()
                .spawn(async move { fetch_current_weather(&config) })
                .await;

            let applied = this.update_in(window, |this, _window, cx| {
                if this.weather_seq != seq {
                    return;
                }
                this.weather = match result {
                    Ok(summary) => WeatherState::Ready(summary),
                    Err(err) => {
                        tracing::error!("weather fetch failed: {err}");
                        WeatherState::Failed
                    }
                };
                cx.notify();
            });
            if let Err(err) = applied {
                tracing::debug!("portal closed before weather arrived: {err}");
            }

            Some(())
        })
        .detach();
    }

    fn on_refresh_weather(
        &mut self,
        _: &RefreshWeather,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) {
        self.refresh_weather(window, cx);
    }

    fn render_weather(&self, cx: &mut Context<Self>) -> impl IntoElement + use<> {
        let theme = cx.theme();
        let muted = theme.muted_foreground;
        let danger = theme.danger;

        let (glyph, color, text): (SharedString, Hsla, SharedString) = match &self.weather {
            WeatherState::Disabled => return div().into_any_element(),
            WeatherState::Loading => ("…".into(), muted, "天気情報を取得中".into()),
            WeatherState::Ready(summary) => (
                summary.condition.icon.glyph().into(),
                tone_color(summary.condition.tone),
                summary.to_string().into(),
            ),
            WeatherState::Failed => ("!".into(), danger, FAILURE_TEXT.into()),
        };

        h_flex()
            .id("weather-widget")
            .gap_x_2()
            .items_center()
            .text_sm()
            .child(div().text_lg().text_color(color).child(glyph))
            .child(text)
            .into_any_element()
    }
}

fn tone_color(tone: WeatherTone) -> Hsla {
    let color = match tone {
        WeatherTone::Yellow => rgb(0xeab308),
        WeatherTone::LightGray => rgb(0x9ca3af),
        WeatherTone::Gray => rgb(0x6b7280),
        WeatherTone::LightBlue => rgb(0x60a5fa),
        WeatherTone::Blue => rgb(0x3b82f6),
        WeatherTone::DeepBlue => rgb(0x2563eb),
        WeatherTone::Neutral => rgb(0x9ca3af),
    };
    color.into()
}

fn render_link_row(
    board: &Entity<LinkBoardState>,
    container: &ContainerId,
    ix: usize,
    link: &LinkItem,
    row_state: LinkRowState,
    cx: &mut App,
) -> ListItem {
    let theme = cx.theme();
    let muted = theme.muted_foreground;

    let label = h_flex()
        .gap_x_2()
        .items_center()
        .flex_1()
        .min_w(px(0.))
        .child(Icon::from(IconName::Menu).small().text_color(muted))
        .child(Icon::from(IconName::Globe).small().text_color(muted))
        .child(div().flex_1().min_w(px(0.)).truncate().child(link.label.clone()))
        .when(row_state.favorite && !container.is_favorites(), |this| {
            this.child(Icon::from(IconName::Check).xsmall().text_color(muted))
        })
        .when(link.new_tab, |this| {
            this.child(div().text_xs().text_color(muted).child("↗"))
        });

    let remove = container.is_favorites().then(|| {
        let board = board.clone();
        let href = link.href.clone();
        Button::new(("remove-favorite", ix))
            .ghost()
            .xsmall()
            .icon(IconName::Close)
            .tooltip("お気に入りから削除")
            .on_click(move |_, _window, cx| {
                cx.stop_propagation();
                board.update(cx, |board, cx| {
                    board.remove_favorite(&href, cx);
                });
            })
    });

    ListItem::new(("link", ix))
        .when(row_state.dragging, |this| this.opacity(0.4))
        .child(
            h_flex()
                .w_full()
                .gap_x_2()
                .items_center()
                .justify_between()
                .child(label)
                .when_some(remove, |this, remove| this.child(remove)),
        )
}

impl Render for PortalView {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let theme = cx.theme();
        let muted = theme.muted_foreground;
        let border = theme.border;
        let board = self.board.clone();
        let weather = self.render_weather(cx);

        v_flex()
            .id("portal")
            .key_context(CONTEXT)
            .track_focus(&self.focus_handle)
            .on_action(cx.listener(Self::on_refresh_weather))
            .size_full()
            .p(px(16.))
            .gap_y_3()
            .child(
                h_flex()
                    .justify_between()
                    .items_center()
                    .pb(px(12.))
                    .border_b_1()
                    .border_color(border)
                    .child(
                        v_flex()
                            .gap_y_1()
                            .child(
                                div()
                                    .text_xl()
                                    .font_weight(FontWeight::BOLD)
                                    .child(TITLE),
                            )
                            .child(
                                div().text_sm().text_color(muted).child(HINT),
                            ),
                    )
                    .child(weather),
            )
            .child(
                div()
                    .flex_1()
                    .min_h(px(0.))
                    .child(link_board(
                        &self.board,
                        move |container, ix, link, row_state, _window, cx| {
                            render_link_row(&board, container, ix, link, row_state, cx)
                        },
                    )),
            )
    }
}

mod logging;
mod portal;
mod startup;

use anyhow::Result;
use gpui::*;
use gpui_component::Root;

use crate::portal::PortalView;
use crate::startup::Startup;

fn main() -> Result<()> {
    if let Err(err) = logging::init() {
        eprintln!("accounting-portal: {err:#}");
    }

    let startup = Startup::load()?;
    let app = Application::new();

    app.run(move |cx| {
        gpui_component::init(cx);
        portal::init_keybindings(cx);
        cx.activate(true);

        cx.spawn(async move |cx| {
            cx.open_window(
                WindowOptions {
                    titlebar: Some(TitlebarOptions {
                        title: Some("経理ポータル".into()),
                        appears_transparent: false,
                        traffic_light_position: None,
                    }),
                    ..Default::default()
                },
                |window, cx| {
                    let view = PortalView::view(startup, window, cx);
                    cx.new(|cx| Root::new(view, window, cx))
                },
            )?;

            Ok::<_, anyhow::Error>(())
        })
        .detach();
    });

    Ok(())
}

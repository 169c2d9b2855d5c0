use anyhow::Result;
use std::future::Future;
use std::io::{IsTerminal, Write};
use tradewatch_render::text::TextRenderer;

use crate::app::App;

/// Print one text frame per snapshot or connection change until Ctrl-C.
pub async fn run(app: &App) -> Result<()> {
    let stdout = std::io::stdout();
    let renderer = TextRenderer::new(stdout.is_terminal());
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Ctrl-C handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    stream_frames(app, &renderer, stdout, interrupt).await?;
    tracing::info!("Interrupted");
    Ok(())
}

/// The interrupt future is pinned once, so a signal that arrives while a
/// frame is being written is still observed.
async fn stream_frames<W: Write>(
    app: &App,
    renderer: &TextRenderer,
    mut out: W,
    interrupt: impl Future<Output = ()>,
) -> Result<()> {
    let mut frames = app.feed.store().subscribe();
    let mut state = app.feed.subscribe_state();
    tokio::pin!(interrupt);

    loop {
        writeln!(out, "{}", renderer.render(&app.panel()))?;
        out.flush()?;

        tokio::select! {
            _ = &mut interrupt => return Ok(()),
            changed = frames.changed() => changed?,
            changed = state.changed() => changed?,
        }
    }
}

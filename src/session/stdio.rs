use anyhow::{Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

use super::{Event, SessionController};

/// Run a session over newline-delimited JSON.
///
/// Writes the startup event, then one line per event for each request
/// line read. Returns when the session is cancelled or input ends.
pub async fn run_session<R, W>(
    controller: &mut SessionController,
    input: R,
    mut output: W,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let startup = controller.startup().await;
    write_events(&mut output, &startup).await?;

    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await.context("Failed to read request")? {
        if line.trim().is_empty() {
            continue;
        }
        debug!(request = %line, "Received request");

        let events = controller.handle_line(&line).await;
        write_events(&mut output, &events).await?;

        if controller.is_closed() {
            break;
        }
    }

    Ok(())
}

/// Run a session on the process's stdin and stdout.
pub async fn run_stdio_session(controller: &mut SessionController) -> Result<()> {
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    run_session(controller, stdin, tokio::io::stdout()).await
}

async fn write_events<W: AsyncWrite + Unpin>(output: &mut W, events: &[Event]) -> Result<()> {
    for event in events {
        let mut line = serde_json::to_string(event).context("Failed to encode event")?;
        line.push('\n');
        output
            .write_all(line.as_bytes())
            .await
            .context("Failed to write event")?;
    }
    output.flush().await.context("Failed to flush events")?;
    Ok(())
}

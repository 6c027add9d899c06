use crate::session::{ format_transcript, ChatSession };
use log::debug;
use std::io::{ self, Write };
use tokio::io::{ AsyncBufRead, AsyncBufReadExt };

const QUIT_COMMAND: &str = "/quit";

/// Reads questions line by line until EOF or `/quit`, re-rendering the whole
/// transcript after every turn.
pub async fn run_console<R, W>(session: &ChatSession, input: R, output: &mut W) -> io::Result<()>
    where R: AsyncBufRead + Unpin, W: Write
{
    writeln!(output, "Knowledge relay chat 💬  (session {})", session.id())?;
    writeln!(output, "Type your question, or {} to exit.", QUIT_COMMAND)?;

    let mut lines = input.lines();
    loop {
        write!(output, "> ")?;
        output.flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line == QUIT_COMMAND {
            break;
        }
        if line.is_empty() {
            continue;
        }

        writeln!(output, "Thinking...")?;
        output.flush()?;
        if let Err(e) = session.submit(line).await {
            writeln!(output, "{}", e)?;
            continue;
        }

        let transcript = session.transcript().await;
        debug!("Rendering transcript with {} entries", transcript.len());
        writeln!(output, "----------------------------------------")?;
        write!(output, "{}", format_transcript(&transcript))?;
    }

    writeln!(output)?;
    writeln!(output, "Goodbye.")?;
    Ok(())
}

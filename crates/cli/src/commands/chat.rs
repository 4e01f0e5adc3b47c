use std::io;

use labbot_agent::ChatbotRuntime;
use labbot_core::config::LoadOptions;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::commands::{load_runtime, CommandResult};

const EXIT_WORDS: [&str; 3] = ["exit", "quit", "bye"];

pub async fn run(options: LoadOptions) -> CommandResult {
    let runtime = match load_runtime("chat", options) {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let input = BufReader::new(tokio::io::stdin());
    let mut output = tokio::io::stdout();
    let result = run_session(&runtime, input, &mut output).await;
    runtime.shutdown().await;

    match result {
        Ok(turns) => CommandResult::plain(format!("({turns} questions answered)")),
        Err(error) => CommandResult::failure("chat", "io", error.to_string(), 1),
    }
}

/// Reads questions line by line until an exit word or end of input.
/// Returns the number of questions sent to the runtime.
pub async fn run_session<R, W>(
    runtime: &ChatbotRuntime,
    mut input: R,
    output: &mut W,
) -> io::Result<usize>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let prompt = runtime.prompt();
    write_line(output, &format!("Bot: {}", prompt.greeting())).await?;
    write_line(output, "Type 'exit', 'quit' or 'bye' to leave, 'help' for topics.").await?;

    let mut turns = 0;
    let mut line = String::new();
    loop {
        output.write_all(b"\nYou: ").await?;
        output.flush().await?;

        line.clear();
        if input.read_line(&mut line).await? == 0 {
            write_line(output, &format!("\nBot: {}", prompt.farewell())).await?;
            break;
        }

        let message = line.trim();
        if message.is_empty() {
            continue;
        }

        let lowered = message.to_lowercase();
        if EXIT_WORDS.contains(&lowered.as_str()) {
            write_line(output, &format!("Bot: {}", prompt.farewell())).await?;
            break;
        }
        if lowered == "help" {
            write_line(output, &format!("Bot: {}", prompt.help_text())).await?;
            continue;
        }

        turns += 1;
        let correlation_id = format!("cli-chat-{turns}");
        let text = match runtime.respond(message, &correlation_id).await {
            Ok(reply) => reply.text,
            Err(_) => prompt.error_message(),
        };
        write_line(output, &format!("Bot: {text}")).await?;
    }

    Ok(turns)
}

async fn write_line<W: AsyncWrite + Unpin>(output: &mut W, text: &str) -> io::Result<()> {
    output.write_all(text.as_bytes()).await?;
    output.write_all(b"\n").await?;
    output.flush().await
}

use labbot_agent::ChatbotRuntime;
use labbot_core::config::LoadOptions;
use serde::Serialize;

use crate::commands::{load_runtime, serialize_payload, CommandResult};

#[derive(Debug, Serialize)]
struct AskOutcome<'a> {
    command: &'static str,
    status: &'static str,
    route: &'static str,
    response: &'a str,
}

pub async fn run(options: LoadOptions, message: &str, json: bool) -> CommandResult {
    let runtime = match load_runtime("ask", options) {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let result = answer(&runtime, message, json).await;
    runtime.shutdown().await;
    result
}

pub async fn answer(runtime: &ChatbotRuntime, message: &str, json: bool) -> CommandResult {
    let reply = match runtime.respond(message, "cli-ask").await {
        Ok(reply) => reply,
        Err(error) => return CommandResult::failure("ask", "runtime", error.to_string(), 1),
    };

    if !json {
        return CommandResult::plain(reply.text);
    }

    let outcome = AskOutcome {
        command: "ask",
        status: "ok",
        route: reply.route.as_str(),
        response: &reply.text,
    };
    CommandResult::plain(serialize_payload(&outcome))
}

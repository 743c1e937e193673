//! Interactive chat REPL and one-shot ask.

use std::error::Error;
use std::sync::Arc;

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use aide_agent::{Assistant, ProgressFn, RunOptions, ThreadStore};

use crate::assistants::Roster;

/// Run the interactive chat loop against one assistant.
///
/// `/reset` discards the current thread and starts a fresh one; `/tools`
/// lists the assistant's tools; `/quit` exits.
pub async fn chat(roster: &Roster, assistant: &Arc<Assistant>) -> Result<(), Box<dyn Error>> {
    let mut editor = DefaultEditor::new()?;
    let mut thread_id = ThreadStore::mint_id("chat");

    println!("Chatting with {}. /reset, /tools, /quit", assistant.name());

    loop {
        let line = match editor.readline("> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => return Err(Box::new(e)),
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let _ = editor.add_history_entry(line);

        match line {
            "/quit" | "/exit" => break,
            "/reset" => {
                thread_id = roster.runner.threads().reset(&thread_id).await;
                println!("Started a fresh thread.");
                continue;
            }
            "/tools" => {
                print_tools(assistant);
                continue;
            }
            _ => {}
        }

        let progress: ProgressFn = Arc::new(|status: &str| eprintln!("  {status}"));
        let options = RunOptions::new(&thread_id).with_progress(progress);
        match roster.runner.run_with(assistant, line, options).await {
            Ok(report) => {
                println!("{}", report.response);
                if report.over_budget {
                    eprintln!(
                        "  (note: this request took {:.1}s)",
                        report.elapsed.as_secs_f32()
                    );
                }
            }
            Err(e) => eprintln!("Error: {e}"),
        }
    }

    Ok(())
}

/// Send one message and print the response.
pub async fn ask(
    roster: &Roster,
    assistant: &Arc<Assistant>,
    message: &str,
) -> Result<(), Box<dyn Error>> {
    let thread_id = ThreadStore::mint_id("ask");
    let response = roster.runner.run(assistant, &thread_id, message).await?;
    println!("{response}");
    Ok(())
}

/// Print the tool listing for one assistant.
pub fn print_tools(assistant: &Assistant) {
    println!("{} ({} tools):", assistant.name(), assistant.registry().len());
    for def in assistant.registry().definitions() {
        let summary: String = def.description.chars().take(72).collect();
        println!("  {:28} {}", def.name, summary);
    }
}

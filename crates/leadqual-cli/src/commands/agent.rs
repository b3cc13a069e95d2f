//! Agent command: talk to the multi-agent router

use crate::app::{self, AgentArgs, OutputFormat};
use crate::output::json;
use anyhow::Result;
use leadqual_core::agents::{RouterEvent, RouterReply, RouterSession};
use leadqual_core::error::exit_codes;
use leadqual_core::{Config, Services};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

pub async fn run(args: AgentArgs, config: &Config, format: OutputFormat) -> Result<i32> {
    let services = Services::from_config(config)?;
    let router = services.router(config);
    let mut session = router.session();

    if let Some(message) = app::joined(&args.text) {
        let reply = turn(&mut session, &message, format).await?;
        if format == OutputFormat::Json {
            print!("{}", json::to_pretty(&reply));
        }
        return Ok(exit_codes::SUCCESS);
    }

    eprintln!("Enter a lead (name, email, company). Empty line or Ctrl-D to quit.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        eprint!("> ");
        std::io::stderr().flush().ok();

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            break;
        }

        match turn(&mut session, line, format).await {
            Ok(reply) if format == OutputFormat::Json => print!("{}", json::to_pretty(&reply)),
            Ok(_) => {}
            Err(e) => eprintln!("Error: {}", e),
        }
    }
    Ok(exit_codes::SUCCESS)
}

/// Run one turn, printing hand-offs to stderr and streaming the reply to stdout
async fn turn(session: &mut RouterSession, message: &str, format: OutputFormat) -> Result<RouterReply> {
    let (tx, mut rx) = mpsc::channel(64);
    let print_stream = format == OutputFormat::Cli;

    let printer = async move {
        while let Some(event) = rx.recv().await {
            match event {
                RouterEvent::Handoff(handoff) => {
                    eprintln!("[{} -> {}]", handoff.from, handoff.to);
                }
                RouterEvent::Delta(text) if print_stream => {
                    print!("{}", text);
                    std::io::stdout().flush().ok();
                }
                RouterEvent::Delta(_) => {}
            }
        }
        if print_stream {
            println!();
        }
    };
    let run_turn = async move {
        let reply = session.turn(message, &tx).await;
        drop(tx);
        reply
    };

    let (reply, _) = tokio::join!(run_turn, printer);
    Ok(reply?)
}

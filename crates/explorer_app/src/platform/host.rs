use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use explorer_engine::{Explorer, ExplorerCommand, ExplorerEvent, ExplorerHandle};
use explorer_logging::explorer_info;
use log::LevelFilter;

use super::config::{load_config, CONFIG_FILENAME};
use super::logging::{self, LogDestination};
use super::render::{render_content, render_tree};

#[derive(Debug, PartialEq, Eq)]
enum HostCommand {
    Explorer(ExplorerCommand),
    Quit,
}

fn parse_command(line: &str) -> Result<Option<HostCommand>, String> {
    let mut parts = line.split_whitespace();
    let Some(verb) = parts.next() else {
        return Ok(None);
    };
    let arg = parts.next().map(str::to_string);
    let command = match (verb, arg) {
        ("toggle", Some(id)) => ExplorerCommand::Toggle(id),
        ("select", Some(id)) => ExplorerCommand::Select(id),
        ("root", Some(id)) => ExplorerCommand::SwitchRoot(id),
        ("drawer", None) => ExplorerCommand::ToggleDrawer,
        ("quit" | "exit", None) => return Ok(Some(HostCommand::Quit)),
        ("toggle" | "select" | "root", None) => return Err(format!("{verb} needs a node id")),
        _ => return Err(format!("unknown command: {}", line.trim())),
    };
    Ok(Some(HostCommand::Explorer(command)))
}

pub fn run_app() -> anyhow::Result<()> {
    let destination = LogDestination::from_env_value(std::env::var("EXPLORER_LOG").ok().as_deref());
    logging::initialize(destination, LevelFilter::Debug);

    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILENAME));
    let config = load_config(&config_path)
        .with_context(|| format!("loading configuration from {config_path:?}"))?;
    let explorer = Explorer::from_config(&config).context("starting the explorer")?;
    let handle = ExplorerHandle::spawn(explorer).context("starting the controller")?;
    explorer_info!("explorer started for root {}", config.root_folder_id);

    println!("commands: toggle <id> | select <id> | drawer | root <id> | quit");
    handle.send(ExplorerCommand::OpenRoot(config.root_folder_id.clone()));

    let (line_tx, line_rx) = mpsc::channel::<String>();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if line_tx.send(line).is_err() {
                break;
            }
        }
    });

    loop {
        while let Some(event) = handle.recv_timeout(Duration::from_millis(50)) {
            print_event(&event);
        }
        match line_rx.try_recv() {
            Ok(line) => match parse_command(&line) {
                Ok(Some(HostCommand::Quit)) => break,
                Ok(Some(HostCommand::Explorer(command))) => {
                    if !handle.send(command) {
                        break;
                    }
                }
                Ok(None) => {}
                Err(message) => eprintln!("{message}"),
            },
            Err(mpsc::TryRecvError::Empty) => {}
            Err(mpsc::TryRecvError::Disconnected) => break,
        }
    }

    handle.shutdown();
    Ok(())
}

fn print_event(event: &ExplorerEvent) {
    let lines = match event {
        ExplorerEvent::TreeChanged(view) => render_tree(view),
        ExplorerEvent::Content(content) => render_content(content),
        ExplorerEvent::NodeFailed { id, message } => vec![format!("! {id}: {message}")],
        ExplorerEvent::Fatal(message) => vec![format!("!! {message}")],
    };
    for line in lines {
        println!("{line}");
    }
}

#[cfg(test)]
mod tests {
    use explorer_engine::ExplorerCommand;

    use super::{parse_command, HostCommand};

    #[test]
    fn commands_parse_with_their_ids() {
        assert_eq!(
            parse_command("toggle folder-1"),
            Ok(Some(HostCommand::Explorer(ExplorerCommand::Toggle(
                "folder-1".to_string()
            ))))
        );
        assert_eq!(
            parse_command("  root  abc "),
            Ok(Some(HostCommand::Explorer(ExplorerCommand::SwitchRoot(
                "abc".to_string()
            ))))
        );
        assert_eq!(
            parse_command("drawer"),
            Ok(Some(HostCommand::Explorer(ExplorerCommand::ToggleDrawer)))
        );
        assert_eq!(parse_command("quit"), Ok(Some(HostCommand::Quit)));
        assert_eq!(parse_command("   "), Ok(None));
    }

    #[test]
    fn missing_ids_and_unknown_verbs_are_reported() {
        assert!(parse_command("select").is_err());
        assert!(parse_command("dance now").is_err());
    }
}

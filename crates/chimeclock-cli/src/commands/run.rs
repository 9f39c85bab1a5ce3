use std::ops::ControlFlow;
use std::sync::Arc;

use chimeclock_core::{
    AudioBackend, ClockController, ClockRuntime, Config, Event, SystemClock, Theme,
};
use clap::Args;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::terminal::TerminalDisplay;

const HELP: &str =
    "commands: set HH:MM | clear | stop | test [HH:MM] | vol 0-100 | tick on|off | theme pink|purple|rainbow | quit";

#[derive(Args)]
pub struct RunArgs {
    /// Alarm time (HH:MM)
    #[arg(long)]
    alarm: Option<String>,
    /// Do not beep every second
    #[arg(long)]
    no_tick: bool,
    /// Volume 0-100 (defaults to the configured volume)
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
    volume: Option<u8>,
    /// Clock face theme
    #[arg(long)]
    theme: Option<Theme>,
}

/// A line typed while the clock runs.
#[derive(Debug, Clone, PartialEq)]
enum Command {
    Set(String),
    Clear,
    Stop,
    Test(Option<String>),
    Volume(u8),
    Tick(bool),
    Theme(Theme),
    Help,
    Quit,
}

fn parse_command(line: &str) -> Result<Command, String> {
    let mut parts = line.split_whitespace();
    let Some(verb) = parts.next() else {
        return Ok(Command::Help);
    };
    let arg = parts.next();
    match verb.to_ascii_lowercase().as_str() {
        "set" => Ok(Command::Set(arg.unwrap_or_default().to_string())),
        "clear" => Ok(Command::Clear),
        "stop" => Ok(Command::Stop),
        "test" => Ok(Command::Test(arg.map(str::to_string))),
        "vol" | "volume" => arg
            .and_then(|v| v.parse::<u8>().ok())
            .filter(|v| *v <= 100)
            .map(Command::Volume)
            .ok_or_else(|| "volume must be 0-100".to_string()),
        "tick" => match arg {
            Some("on") => Ok(Command::Tick(true)),
            Some("off") => Ok(Command::Tick(false)),
            _ => Err("tick on|off".to_string()),
        },
        "theme" => arg
            .unwrap_or_default()
            .parse::<Theme>()
            .map(Command::Theme)
            .map_err(|e| e.to_string()),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" | "q" => Ok(Command::Quit),
        other => Err(format!("unknown command '{other}'")),
    }
}

fn backend() -> Box<dyn AudioBackend + Send> {
    #[cfg(feature = "speaker")]
    {
        Box::new(crate::speaker::SpeakerBackend)
    }
    #[cfg(not(feature = "speaker"))]
    {
        Box::new(chimeclock_core::UnsupportedBackend {
            reason: "built without the `speaker` feature".into(),
        })
    }
}

fn handle(runtime: &ClockRuntime, command: Command) -> ControlFlow<()> {
    match command {
        Command::Set(input) => runtime.apply(|c| c.set_alarm_input(&input)),
        Command::Clear => runtime.apply(|c| c.clear_alarm()),
        Command::Stop => runtime.apply(|c| c.stop_warble().into_iter().collect()),
        Command::Test(input) => runtime.apply(|c| c.test_alarm(input.as_deref())),
        Command::Volume(v) => runtime.apply(|c| vec![c.set_volume_percent(v)]),
        Command::Tick(on) => runtime.apply(|c| vec![c.set_tick_enabled(on)]),
        Command::Theme(theme) => runtime.apply(|c| vec![c.set_theme(theme)]),
        Command::Help => println!("\r{HELP}"),
        Command::Quit => return ControlFlow::Break(()),
    }
    ControlFlow::Continue(())
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run_clock(args, config))
}

async fn run_clock(args: RunArgs, config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let controller = ClockController::new(&config, backend())
        .with_status_display(Box::new(TerminalDisplay))
        .with_clock_display(Box::new(TerminalDisplay));
    let (runtime, mut events) =
        ClockRuntime::start(controller, Arc::new(SystemClock), &config.timing);

    runtime.apply(|c| {
        let mut out: Vec<Event> = c.enable_audio().into_iter().collect();
        if let Some(volume) = args.volume {
            out.push(c.set_volume_percent(volume));
        }
        if args.no_tick {
            out.push(c.set_tick_enabled(false));
        }
        if let Some(theme) = args.theme {
            out.push(c.set_theme(theme));
        }
        out
    });
    if let Some(alarm) = &args.alarm {
        runtime.apply(|c| c.set_alarm_input(alarm));
    }
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            Some(event) = events.recv() => {
                tracing::debug!(?event, "clock event");
            }
            line = lines.next_line(), if stdin_open => match line? {
                Some(line) => match parse_command(&line) {
                    Ok(command) => {
                        if handle(&runtime, command).is_break() {
                            break;
                        }
                    }
                    Err(message) => println!("\r{message}"),
                },
                // Without input the clock keeps running until Ctrl-C.
                None => stdin_open = false,
            },
        }
    }

    runtime.shutdown();
    println!();
    Ok(())
}

use chimeclock_core::{
    ClockController, Clock, Config, Event, ManualClock, OfflineBackend, RecordingDisplay,
};
use chrono::{Duration, NaiveDateTime};
use clap::Args;

const START_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn parse_start(s: &str) -> Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(s, START_FORMAT)
        .map_err(|e| format!("expected \"YYYY-MM-DD HH:MM:SS\": {e}"))
}

#[derive(Args)]
pub struct SimulateArgs {
    /// Wall-clock start ("YYYY-MM-DD HH:MM:SS")
    #[arg(long, value_parser = parse_start)]
    start: NaiveDateTime,
    /// How many seconds to simulate
    #[arg(long, default_value_t = 60)]
    seconds: u64,
    /// Alarm time (HH:MM)
    #[arg(long)]
    alarm: Option<String>,
    /// Press "stop" this many seconds after the warble starts
    #[arg(long)]
    ring_for: Option<u64>,
    /// Include per-second tick beeps
    #[arg(long)]
    tick: bool,
}

pub fn run(args: SimulateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let recorder = RecordingDisplay::new();
    let mut controller = ClockController::new(&config, Box::new(OfflineBackend::default()))
        .with_status_display(Box::new(recorder.clone()));
    let clock = ManualClock::new(args.start);

    let mut events: Vec<Event> = controller.enable_audio().into_iter().collect();
    events.push(controller.set_tick_enabled(args.tick));
    if let Some(alarm) = &args.alarm {
        events.extend(controller.set_alarm_input(alarm));
    }
    emit(&events)?;

    let step_ms = config.timing.poll_interval_ms.max(1);
    let end_ms = args.seconds.saturating_mul(1000);
    let mut elapsed_ms = 0;
    let mut next_alternation: Option<u64> = None;
    let mut ringing_since: Option<u64> = None;

    while elapsed_ms <= end_ms {
        let now = clock.now();
        let events = controller.poll(now);
        if events
            .iter()
            .any(|e| matches!(e, Event::WarbleStarted { .. }))
        {
            ringing_since = Some(elapsed_ms);
        }
        emit(&events)?;

        match controller.warble_period() {
            Some(period) => {
                let period_ms = period.as_millis() as u64;
                let due = *next_alternation.get_or_insert(elapsed_ms + period_ms);
                if elapsed_ms >= due {
                    controller.alternate_warble();
                    next_alternation = Some(due + period_ms);
                }
            }
            None => next_alternation = None,
        }

        if let (Some(limit), Some(since)) = (args.ring_for, ringing_since) {
            if elapsed_ms - since >= limit.saturating_mul(1000) {
                emit(&controller.stop_warble().into_iter().collect::<Vec<_>>())?;
                ringing_since = None;
            }
        }

        clock.advance(Duration::milliseconds(step_ms as i64));
        elapsed_ms += step_ms;
    }

    let statuses = recorder.statuses().len();
    tracing::debug!(statuses, "simulation finished");
    println!(
        "{}",
        serde_json::json!({ "status": controller.status().to_string() })
    );
    Ok(())
}

fn emit(events: &[Event]) -> Result<(), serde_json::Error> {
    for event in events {
        println!("{}", serde_json::to_string(event)?);
    }
    Ok(())
}

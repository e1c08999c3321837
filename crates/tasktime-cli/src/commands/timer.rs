use clap::Subcommand;
use serde_json::json;
use tasktime_core::time::{format_for_display, format_hms};
use tasktime_core::{Event, Ticker, TimerMethod, Tracker};

use super::{open_tracker, print_json, CliResult};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start timing a task
    Start {
        /// Task ID
        task_id: String,
        /// Override the task's timer method
        #[arg(long)]
        method: Option<TimerMethod>,
    },
    /// Pause the running session
    Pause,
    /// Resume the paused session
    Resume,
    /// Stop the session and record its time
    Stop,
    /// Forget the active session without recording it
    Reset,
    /// Move the pomodoro cycle to its next phase
    NextPhase,
    /// Print current timer state as JSON
    Status,
    /// Print progress every second until the phase ends or Ctrl-C
    Watch {
        /// Advance pomodoro phases automatically instead of exiting
        #[arg(long)]
        auto_advance: bool,
    },
}

pub fn run(action: TimerAction) -> CliResult {
    let mut tracker = open_tracker()?;

    match action {
        TimerAction::Start { task_id, method } => {
            let event = tracker.start_timer(&task_id, method)?;
            print_json(&event)?;
        }
        TimerAction::Pause => {
            let event = tracker.pause_timer()?;
            print_event_or_status(&mut tracker, event)?;
        }
        TimerAction::Resume => {
            let event = tracker.resume_timer()?;
            print_event_or_status(&mut tracker, event)?;
        }
        TimerAction::Stop => {
            let events = tracker.stop_timer()?;
            print_json(&events)?;
        }
        TimerAction::Reset => {
            tracker.reset_timer()?;
            print_json(&json!({ "type": "timer_reset" }))?;
        }
        TimerAction::NextPhase => {
            let event = tracker.next_phase()?;
            print_event_or_status(&mut tracker, event)?;
        }
        TimerAction::Status => {
            print_status(&mut tracker)?;
        }
        TimerAction::Watch { auto_advance } => {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            runtime.block_on(watch(&mut tracker, auto_advance))?;
        }
    }
    Ok(())
}

fn print_event_or_status(tracker: &mut Tracker, event: Option<Event>) -> CliResult {
    match event {
        Some(event) => print_json(&event),
        None => print_status(tracker),
    }
}

fn print_status(tracker: &mut Tracker) -> CliResult {
    let progress = tracker.refresh_elapsed();
    let elapsed = tracker.timer().live_elapsed_secs(tracker.repository());
    print_json(&json!({
        "state": tracker.timer().state(),
        "elapsed": format_hms(elapsed),
        "progress": progress,
    }))
}

async fn watch(tracker: &mut Tracker, auto_advance: bool) -> CliResult {
    if !tracker.timer().state().is_active() {
        return Err("no active session".into());
    }

    let mut ticker = Ticker::every_second();
    loop {
        tokio::select! {
            tick = ticker.tick() => {
                if tick.is_none() {
                    break;
                }
                let Some(progress) = tracker.refresh_elapsed() else {
                    break;
                };
                println!(
                    "{}",
                    json!({ "display": format_for_display(progress.elapsed_secs), "progress": progress })
                );

                if tracker.timer().phase_complete() {
                    // no session mutation while ticks are in flight
                    ticker.cancel();
                    if auto_advance && tracker.timer().state().timer_method == TimerMethod::Pomodoro {
                        if let Some(event) = tracker.next_phase()? {
                            println!("{}", serde_json::to_string(&event)?);
                        }
                        ticker = Ticker::every_second();
                    } else {
                        println!("{}", json!({ "type": "phase_complete" }));
                        break;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                ticker.cancel();
                break;
            }
        }
    }
    Ok(())
}

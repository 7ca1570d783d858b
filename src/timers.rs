//! Recurring work while the app is running: a one-minute plan refresh and
//! a habit reset at each local midnight.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};

use crate::application::App;
use crate::core::day_plan::DayPlan;
use crate::core::temporal::{self, TimeOfDay};
use crate::store::KeyValueStore;

pub const PLAN_REFRESH: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq)]
pub enum TimerEvent {
    PlanRefreshed { greeting: &'static str, plan: DayPlan },
    HabitsReset { changed: usize },
}

fn next_midnight() -> Instant {
    Instant::now() + temporal::duration_until_midnight(temporal::now())
}

/// Run until `shutdown` flips to true or its sender is dropped.
pub async fn run<S: KeyValueStore>(
    app: &App<S>,
    mut shutdown: watch::Receiver<bool>,
    mut on_event: impl FnMut(TimerEvent),
) {
    let mut plan_tick = tokio::time::interval(PLAN_REFRESH);
    plan_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let midnight = tokio::time::sleep_until(next_midnight());
    tokio::pin!(midnight);

    log::info!("Timers started");
    loop {
        tokio::select! {
            _ = plan_tick.tick() => {
                let time = TimeOfDay::current();
                let plan = app.today_plan(temporal::today());
                let (done, total) = plan.progress();
                log::debug!("{}: {}/{} planned items done", time.greeting(), done, total);
                on_event(TimerEvent::PlanRefreshed { greeting: time.greeting(), plan });
            }
            _ = &mut midnight => {
                let today = temporal::today();
                match app.reset_habits(today) {
                    Ok(changed) => on_event(TimerEvent::HabitsReset { changed }),
                    Err(e) => log::error!("Habit reset failed: {}", e),
                }
                midnight.as_mut().reset(next_midnight());
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }
    log::info!("Timers stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn refreshes_plan_then_stops_on_shutdown() {
        let app = App::open(MemoryStore::new());
        app.add_plan_item("Stretch", Some(TimeOfDay::Morning)).unwrap();
        let (tx, rx) = watch::channel(false);
        let mut seen = Vec::new();

        let stopper = async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            let _ = tx.send(true);
        };
        let runner = run(&app, rx, |event| seen.push(event));
        tokio::join!(runner, stopper);

        assert_eq!(seen.len(), 1);
        match &seen[0] {
            TimerEvent::PlanRefreshed { plan, .. } => assert_eq!(plan.items.len(), 1),
            other => panic!("unexpected event {other:?}"),
        }
    }
}

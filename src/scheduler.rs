//! Recurring jobs on local wall-clock time.
//!
//! Jobs live in a sorted set of `(next fire time, job)`. Each tick pops
//! every due entry in order, runs it to completion and reschedules it to its
//! next occurrence strictly after the tick time, so a run that overran
//! several occurrences fires once. Jobs run inline, never concurrently.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::future::Future;

use anyhow::{bail, Result};
use chrono::{Datelike, Duration as ChronoDuration, Local, NaiveDateTime, NaiveTime, Weekday};
use tracing::{error, info};

use crate::config::ScheduleConfig;
use crate::orchestrator::Orchestrator;
use crate::scraper::Fetch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Job {
    DailyUpdate,
    WeeklyUpdate,
    SelfTest,
}

impl Job {
    pub fn name(&self) -> &'static str {
        match self {
            Job::DailyUpdate => "daily_update",
            Job::WeeklyUpdate => "weekly_update",
            Job::SelfTest => "self_test",
        }
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    Daily(NaiveTime),
    Weekly(Weekday, NaiveTime),
}

impl Cadence {
    /// First occurrence strictly after `after`.
    pub fn next_after(&self, after: NaiveDateTime) -> NaiveDateTime {
        match *self {
            Cadence::Daily(time) => {
                let candidate = after.date().and_time(time);
                if candidate > after {
                    candidate
                } else {
                    candidate + ChronoDuration::days(1)
                }
            }
            Cadence::Weekly(weekday, time) => {
                let today = after.weekday().num_days_from_monday() as i64;
                let target = weekday.num_days_from_monday() as i64;
                let days_ahead = (target - today).rem_euclid(7);
                let candidate = (after.date() + ChronoDuration::days(days_ahead)).and_time(time);
                if candidate > after {
                    candidate
                } else {
                    candidate + ChronoDuration::days(7)
                }
            }
        }
    }
}

/// Sorted job queue.
#[derive(Debug, Clone)]
pub struct Schedule {
    cadences: BTreeMap<Job, Cadence>,
    queue: BTreeSet<(NaiveDateTime, Job)>,
}

impl Schedule {
    pub fn new(jobs: &[(Job, Cadence)], now: NaiveDateTime) -> Self {
        let mut schedule = Self {
            cadences: BTreeMap::new(),
            queue: BTreeSet::new(),
        };
        for &(job, cadence) in jobs {
            schedule.cadences.insert(job, cadence);
            schedule.queue.insert((cadence.next_after(now), job));
        }
        schedule
    }

    /// Daily update, weekly update and daily self-test from configuration.
    pub fn from_config(config: &ScheduleConfig, now: NaiveDateTime) -> Result<Self> {
        let daily = config.daily_time()?;
        let weekly = config.weekly_time()?;
        let self_test = config.self_test_time()?;
        let weekday = config.weekday()?;

        Ok(Self::new(
            &[
                (Job::DailyUpdate, Cadence::Daily(daily)),
                (Job::WeeklyUpdate, Cadence::Weekly(weekday, weekly)),
                (Job::SelfTest, Cadence::Daily(self_test)),
            ],
            now,
        ))
    }

    pub fn next(&self) -> Option<(NaiveDateTime, Job)> {
        self.queue.first().copied()
    }

    /// Pop every job due at `now`, in fire order, rescheduling each after `now`.
    pub fn take_due(&mut self, now: NaiveDateTime) -> Vec<Job> {
        let mut due = Vec::new();
        while let Some(&(at, job)) = self.queue.first() {
            if at > now {
                break;
            }
            self.queue.pop_first();
            due.push(job);
            if let Some(cadence) = self.cadences.get(&job) {
                self.queue.insert((cadence.next_after(now), job));
            }
        }
        due
    }
}

/// Something that can execute scheduled jobs.
pub trait JobRunner {
    fn run_job(&mut self, job: Job) -> impl Future<Output = Result<()>>;
}

impl<F: Fetch> JobRunner for Orchestrator<F> {
    async fn run_job(&mut self, job: Job) -> Result<()> {
        match job {
            Job::DailyUpdate => self.update_all().await.map(|_| ()),
            Job::WeeklyUpdate => self.update_with_advanced().await.map(|_| ()),
            Job::SelfTest => {
                let report = self.self_test()?;
                if !report.passed() {
                    bail!("self-test failed: {:?}", report);
                }
                Ok(())
            }
        }
    }
}

pub struct Scheduler<R: JobRunner> {
    runner: R,
    schedule: Schedule,
    config: ScheduleConfig,
}

impl<R: JobRunner> Scheduler<R> {
    pub fn new(runner: R, config: ScheduleConfig, now: NaiveDateTime) -> Result<Self> {
        let schedule = Schedule::from_config(&config, now)?;
        Ok(Self {
            runner,
            schedule,
            config,
        })
    }

    async fn dispatch(&mut self, job: Job) -> bool {
        info!("Running job {}", job);
        match self.runner.run_job(job).await {
            Ok(()) => {
                info!("Job {} finished", job);
                true
            }
            Err(e) => {
                error!("Job {} failed: {:#}", job, e);
                false
            }
        }
    }

    /// Run every job due at `now`. Returns how many ran.
    pub async fn tick(&mut self, now: NaiveDateTime) -> usize {
        let due = self.schedule.take_due(now);
        for &job in &due {
            self.dispatch(job).await;
        }
        due.len()
    }

    /// Cold-start update, then poll forever.
    pub async fn run(&mut self) -> Result<()> {
        info!("Scheduler started");
        info!("  daily update at {}", self.config.daily_at);
        info!(
            "  weekly update on {} at {}",
            self.config.weekly_day, self.config.weekly_at
        );
        info!("  self-test at {}", self.config.self_test_at);

        if self.config.run_on_start {
            info!("Running initial update");
            self.dispatch(Job::DailyUpdate).await;
        }

        let mut interval = tokio::time::interval(self.config.poll_interval());
        loop {
            interval.tick().await;
            if self.tick(Local::now().naive_local()).await > 0 {
                if let Some((at, job)) = self.schedule.next() {
                    info!("Next job {} at {}", job, at);
                }
            }
        }
    }
}

//! Cooperative timer registry. Nothing preempts a running task: a callback
//! must finish its work and report when it wants to run again.

use tracing::debug;

use crate::error::TimerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    Reschedule(u64),
    Cancel,
}

impl Schedule {
    /// Integer convention: a positive interval re-arms, zero or negative stops.
    pub fn from_interval(interval_ms: i64) -> Self {
        if interval_ms > 0 {
            Self::Reschedule(interval_ms as u64)
        } else {
            Self::Cancel
        }
    }
}

pub trait Task<Ctx> {
    fn name(&self) -> &'static str;

    fn run(&mut self, ctx: &mut Ctx) -> Schedule;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u32);

impl TimerId {
    pub fn raw(self) -> u32 {
        self.0
    }
}

struct TimerEntry<Ctx> {
    id: TimerId,
    deadline_ms: u64,
    task: Box<dyn Task<Ctx>>,
}

/// At most `N` armed timers. Timers keep the slot order they were created in,
/// which is also the order simultaneously due timers fire in.
pub struct TimerRegistry<Ctx, const N: usize> {
    timers: Vec<TimerEntry<Ctx>>,
    next_id: u32,
}

impl<Ctx, const N: usize> Default for TimerRegistry<Ctx, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Ctx, const N: usize> TimerRegistry<Ctx, N> {
    pub fn new() -> Self {
        Self {
            timers: Vec::with_capacity(N),
            next_id: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        N
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    pub fn is_armed(&self, id: TimerId) -> bool {
        self.timers.iter().any(|timer| timer.id == id)
    }

    pub fn create(
        &mut self,
        task: Box<dyn Task<Ctx>>,
        interval_ms: u64,
        now_ms: u64,
    ) -> Result<TimerId, TimerError> {
        if self.timers.len() >= N {
            return Err(TimerError::RegistryFull { capacity: N });
        }

        let id = TimerId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        debug!("timer {} armed for {} ({interval_ms} ms)", id.0, task.name());
        self.timers.push(TimerEntry {
            id,
            deadline_ms: now_ms.saturating_add(interval_ms),
            task,
        });
        Ok(id)
    }

    pub fn rearm(&mut self, id: TimerId, interval_ms: u64, now_ms: u64) -> Result<(), TimerError> {
        let timer = self
            .timers
            .iter_mut()
            .find(|timer| timer.id == id)
            .ok_or(TimerError::UnknownTimer(id.0))?;
        timer.deadline_ms = now_ms.saturating_add(interval_ms);
        Ok(())
    }

    pub fn flush_all(&mut self) {
        self.timers.clear();
    }

    /// Runs every timer due at `now_ms` once, in slot order. Returns how many
    /// callbacks ran.
    pub fn call_next_callback(&mut self, ctx: &mut Ctx, now_ms: u64) -> usize {
        let mut fired = 0;
        let mut index = 0;

        while index < self.timers.len() {
            if self.timers[index].deadline_ms > now_ms {
                index += 1;
                continue;
            }

            fired += 1;
            let timer = &mut self.timers[index];
            match timer.task.run(ctx) {
                Schedule::Reschedule(interval_ms) if interval_ms > 0 => {
                    timer.deadline_ms = now_ms.saturating_add(interval_ms);
                    index += 1;
                }
                _ => {
                    debug!("timer {} for {} stopped", timer.id.0, timer.task.name());
                    self.timers.remove(index);
                }
            }
        }

        fired
    }
}

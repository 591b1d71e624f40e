//! scheduler - Perpetual frame loop with an explicit stop handle
//! Single threaded: the host paces frames, the loop yields to it between ticks

use alloc::rc::Rc;
use core::cell::Cell;

use heapless::Deque;
use rand::Rng;

use crate::{FrameStats, ParticleField, Settings, Surface};

pub const EVENT_CAPACITY: usize = 8;

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum HostEvent {
    Resize { width: f32, height: f32 },
    Closed,
}

/// Host events gathered between two frames.
// PERF: fixed capacity, nothing allocates on the frame path
pub struct EventQueue {
    events: Deque<HostEvent, EVENT_CAPACITY>,
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl EventQueue {
    pub fn new() -> Self {
        Self { events: Deque::new() }
    }

    /// Queues `event`. A resize replaces an already queued resize since only
    /// the latest size matters; anything past capacity is dropped.
    pub fn push(&mut self, event: HostEvent) {
        if let HostEvent::Resize { .. } = event {
            if let Some(queued) = self
                .events
                .iter_mut()
                .find(|queued| matches!(queued, HostEvent::Resize { .. }))
            {
                *queued = event;
                return;
            }
        }

        if let Err(dropped) = self.events.push_back(event) {
            log::warn!("event queue full, dropping {:?}", dropped);
        }
    }

    pub fn pop(&mut self) -> Option<HostEvent> {
        self.events.pop_front()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// The host's per-frame primitive.
pub trait FrameSource<S> {
    /// Presents the frame just drawn (if any), waits for the next refresh
    /// opportunity and queues whatever happened meanwhile.
    fn next_frame(&mut self, surface: Option<&mut S>, stats: &FrameStats, events: &mut EventQueue);
}

impl<S, F> FrameSource<S> for F
where
    F: FnMut(Option<&mut S>, &FrameStats, &mut EventQueue),
{
    fn next_frame(&mut self, surface: Option<&mut S>, stats: &FrameStats, events: &mut EventQueue) {
        self(surface, stats, events)
    }
}

/// Cancels a running `Scheduler`. Clones share the same flag.
#[derive(Clone, Debug, Default)]
pub struct StopHandle {
    stopped: Rc<Cell<bool>>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.stopped.set(true);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.get()
    }
}

#[derive(Debug, Default)]
pub struct Scheduler {
    handle: StopHandle,
    ticks: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&self) -> StopHandle {
        self.handle.clone()
    }

    /// Total ticks run by this scheduler.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Runs frames until the handle is stopped or the host closes.
    ///
    /// Returns the number of ticks run by this call. A surface error ends
    /// the loop and is handed back to the caller.
    pub fn run<S, R, F>(&mut self, field: &mut ParticleField<S, R>, frames: &mut F) -> Result<u64, S::Error>
    where
        S: Surface,
        R: Rng,
        F: FrameSource<S>,
    {
        let mut events = EventQueue::new();
        let mut stats = FrameStats::default();
        let mut ticks = 0;

        log::info!("frame loop running");
        while !self.handle.is_stopped() {
            frames.next_frame(field.surface_mut(), &stats, &mut events);

            while let Some(event) = events.pop() {
                match event {
                    HostEvent::Resize { width, height } => field.on_resize(width, height),
                    HostEvent::Closed => self.handle.stop(),
                }
            }
            if self.handle.is_stopped() {
                break;
            }

            stats = field.tick()?;
            ticks += 1;
            self.ticks += 1;
        }

        log::info!("frame loop stopped after {} ticks", ticks);
        Ok(ticks)
    }
}

/// Builds a field for `surface` together with the scheduler that drives it.
pub fn start<S, R>(surface: Option<S>, rng: R, settings: Settings) -> (ParticleField<S, R>, Scheduler)
where
    S: Surface,
    R: Rng,
{
    (ParticleField::start(surface, rng, settings), Scheduler::new())
}

pub fn stop(handle: &StopHandle) {
    handle.stop();
}

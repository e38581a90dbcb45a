//! Character-by-character reveal of assistant replies.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tokio::time::MissedTickBehavior;

use crate::api::models::MessageId;

pub const DEFAULT_QUANTUM: Duration = Duration::from_millis(10);
/// Shortest step `drive` accepts; tokio intervals cannot tick every zero ms.
pub const MIN_QUANTUM: Duration = Duration::from_millis(1);

/// Reveal state of one message of `len` characters. Each step yields the new
/// number of visible characters; the iterator ends once all are visible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reveal {
    id: MessageId,
    index: usize,
    len: usize,
}

impl Reveal {
    pub fn new(id: MessageId, len: usize) -> Self {
        Self { id, index: 0, len }
    }

    pub fn id(&self) -> MessageId {
        self.id
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_done(&self) -> bool {
        self.index == self.len
    }

    pub fn restart(&mut self) {
        self.index = 0;
    }
}

impl Iterator for Reveal {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.index < self.len {
            self.index += 1;
            Some(self.index)
        } else {
            None
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.len - self.index;
        (left, Some(left))
    }
}

/// Steps `reveal` once per `quantum`, starting one quantum from now, and
/// reports each revealed count to `on_step`. Stops early when `on_step`
/// returns `false`. A `quantum` below [`MIN_QUANTUM`] is raised to it.
pub async fn drive<F>(mut reveal: Reveal, quantum: Duration, mut on_step: F) -> Reveal
where
    F: FnMut(MessageId, usize) -> bool,
{
    let quantum = quantum.max(MIN_QUANTUM);
    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + quantum, quantum);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let id = reveal.id();
    while !reveal.is_done() {
        ticker.tick().await;
        let Some(n) = reveal.next() else { break };
        if !on_step(id, n) {
            break;
        }
    }
    reveal
}

/// Abort handles of running reveal drivers, keyed by message.
#[derive(Default)]
pub struct RevealTasks {
    handles: Mutex<HashMap<MessageId, AbortHandle>>,
}

impl std::fmt::Debug for RevealTasks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.handles.lock().map(|h| h.len()).unwrap_or(0);
        write!(f, "RevealTasks({count} running)")
    }
}

impl RevealTasks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs [`drive`] for `reveal` on `rt` and tracks the task until it ends.
    /// Returns `false`, spawning nothing, when there is nothing to reveal.
    pub fn spawn<F>(self: &Arc<Self>, rt: &Handle, reveal: Reveal, quantum: Duration, on_step: F) -> bool
    where
        F: FnMut(MessageId, usize) -> bool + Send + 'static,
    {
        if reveal.is_done() {
            return false;
        }
        let id = reveal.id();
        // Held across the spawn so the task's own `remove` waits for the insert.
        let Ok(mut map) = self.handles.lock() else { return false };
        let tasks = Arc::clone(self);
        let handle = rt.spawn(async move {
            drive(reveal, quantum, on_step).await;
            tasks.remove(id);
        });
        map.insert(id, handle.abort_handle());
        true
    }

    fn remove(&self, id: MessageId) {
        if let Ok(mut map) = self.handles.lock() {
            map.remove(&id);
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.handles.lock().map(|h| h.len()).unwrap_or(0)
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Aborts every running driver. Returns how many were stopped.
    pub fn cancel_all(&self) -> usize {
        let Ok(mut map) = self.handles.lock() else { return 0 };
        let n = map.len();
        for (_, handle) in map.drain() {
            handle.abort();
        }
        n
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reveal_counts_up_to_len_and_restarts() {
        let mut reveal = Reveal::new(7, 3);
        assert_eq!(reveal.size_hint(), (3, Some(3)));
        assert_eq!(reveal.by_ref().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert!(reveal.is_done());
        assert_eq!(reveal.next(), None);

        reveal.restart();
        assert_eq!(reveal.index(), 0);
        assert_eq!(reveal.next(), Some(1));
    }

    #[test]
    fn empty_reveal_is_already_done() {
        let mut reveal = Reveal::new(1, 0);
        assert!(reveal.is_done());
        assert_eq!(reveal.next(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn drive_emits_one_step_per_quantum() {
        let start = tokio::time::Instant::now();
        let mut seen = Vec::new();
        let reveal = drive(Reveal::new(3, 4), DEFAULT_QUANTUM, |id, n| {
            assert_eq!(id, 3);
            seen.push((n, start.elapsed()));
            true
        })
        .await;

        assert!(reveal.is_done());
        let counts: Vec<_> = seen.iter().map(|(n, _)| *n).collect();
        assert_eq!(counts, vec![1, 2, 3, 4]);
        assert_eq!(seen[0].1, Duration::from_millis(10));
        assert_eq!(seen[3].1, Duration::from_millis(40));
    }

    #[tokio::test(start_paused = true)]
    async fn drive_stops_when_told() {
        let mut steps = 0;
        let reveal = drive(Reveal::new(1, 10), DEFAULT_QUANTUM, |_, n| {
            steps += 1;
            n < 3
        })
        .await;
        assert_eq!(steps, 3);
        assert_eq!(reveal.index(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn independent_reveals_interleave() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let a = {
            let log = log.clone();
            tokio::spawn(drive(Reveal::new(1, 2), DEFAULT_QUANTUM, move |id, n| {
                log.lock().unwrap().push((id, n));
                true
            }))
        };
        let b = {
            let log = log.clone();
            tokio::spawn(drive(Reveal::new(2, 3), DEFAULT_QUANTUM, move |id, n| {
                log.lock().unwrap().push((id, n));
                true
            }))
        };
        assert!(a.await.unwrap().is_done());
        assert!(b.await.unwrap().is_done());

        let log = log.lock().unwrap();
        let of = |id| log.iter().filter(|(i, _)| *i == id).map(|(_, n)| *n).collect::<Vec<_>>();
        assert_eq!(of(1), vec![1, 2]);
        assert_eq!(of(2), vec![1, 2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_quantum_still_finishes() {
        let start = tokio::time::Instant::now();
        let reveal = drive(Reveal::new(2, 3), Duration::ZERO, |_, _| true).await;
        assert!(reveal.is_done());
        assert_eq!(start.elapsed(), MIN_QUANTUM * 3);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_all_aborts_running_drivers() {
        let tasks = Arc::new(RevealTasks::new());
        let steps = Arc::new(Mutex::new(0usize));
        let spawned = {
            let steps = steps.clone();
            tasks.spawn(&Handle::current(), Reveal::new(5, 1000), DEFAULT_QUANTUM, move |_, _| {
                *steps.lock().unwrap() += 1;
                true
            })
        };
        assert!(spawned);
        assert_eq!(tasks.len(), 1);

        tokio::time::sleep(Duration::from_millis(35)).await;
        assert_eq!(tasks.cancel_all(), 1);
        assert!(tasks.is_empty());

        let seen = *steps.lock().unwrap();
        assert!(seen > 0);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(*steps.lock().unwrap(), seen);
    }

    #[tokio::test(start_paused = true)]
    async fn finished_driver_leaves_no_handle() {
        let tasks = Arc::new(RevealTasks::new());
        assert!(!tasks.spawn(&Handle::current(), Reveal::new(1, 0), DEFAULT_QUANTUM, |_, _| true));
        assert!(tasks.is_empty());

        assert!(tasks.spawn(&Handle::current(), Reveal::new(2, 2), DEFAULT_QUANTUM, |_, _| true));
        assert_eq!(tasks.len(), 1);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(tasks.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn short_reveals_on_many_workers_all_deregister() {
        let tasks = Arc::new(RevealTasks::new());
        let rt = Handle::current();
        for id in 0..200 {
            tasks.spawn(&rt, Reveal::new(id, (id % 3) as usize), Duration::ZERO, |_, _| true);
        }
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while !tasks.is_empty() {
            assert!(std::time::Instant::now() < deadline, "{:?} left behind", tasks);
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(tasks.cancel_all(), 0);
    }
}

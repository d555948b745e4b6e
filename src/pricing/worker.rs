use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};
use std::time::Duration;

use indexmap::IndexMap;
use tokio::sync::{
    Mutex, Notify,
    mpsc::{self, UnboundedReceiver, UnboundedSender},
};
use tokio_util::sync::CancellationToken;

use super::cache::PriceCache;
use super::fetch::PriceSource;

pub const WORKER_COUNT: usize = 4;

/// What an interactive fetch round reports back to its owner. Every event
/// carries the round it belongs to so stale rounds can be thrown away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchEvent {
    PriceReady { round: u64, item_id: u32, median: String },
    Progress { round: u64, completed: usize, total: usize },
    RoundEnded { round: u64 },
}

impl FetchEvent {
    pub fn round(&self) -> u64 {
        match self {
            FetchEvent::PriceReady { round, .. }
            | FetchEvent::Progress { round, .. }
            | FetchEvent::RoundEnded { round } => *round,
        }
    }
}

struct RoundShared {
    round: u64,
    ids: Vec<u32>,
    server: String,
    source: Arc<dyn PriceSource>,
    events: UnboundedSender<FetchEvent>,
    /// Next unclaimed index into `ids`; workers claim with fetch_add.
    cursor: AtomicUsize,
    completed: AtomicUsize,
    active_workers: AtomicUsize,
    stop: AtomicBool,
}

/// Background price fetching for whatever tab the user is looking at. One
/// round at a time; four workers share the round's id list through an atomic
/// cursor and post results back over a channel.
pub struct InteractiveFetch {
    round_counter: u64,
    current: Option<Arc<RoundShared>>,
}

impl Default for InteractiveFetch {
    fn default() -> Self {
        Self::new()
    }
}

impl InteractiveFetch {
    pub fn new() -> InteractiveFetch {
        InteractiveFetch { round_counter: 0, current: None }
    }

    /// Kicks off a round for `ids`. Refuses while a round is still running
    /// or when there is nothing to fetch. The whole work set is marked
    /// pending in the cache up front, so `missing_ids` won't re-list ids
    /// this round is already fetching. Returns the round number and the
    /// event stream to drain.
    pub fn start(
        &mut self,
        ids: Vec<u32>,
        server: &str,
        source: Arc<dyn PriceSource>,
        cache: &mut PriceCache,
    ) -> Option<(u64, UnboundedReceiver<FetchEvent>)> {
        if self.is_running() || ids.is_empty() {
            return None;
        }
        cache.clear_pending();
        for &id in &ids {
            cache.mark_pending(id);
        }
        self.round_counter += 1;
        let round = self.round_counter;
        let (events, receiver) = mpsc::unbounded_channel();
        let workers = WORKER_COUNT.min(ids.len());
        let shared = Arc::new(RoundShared {
            round,
            ids,
            server: server.to_string(),
            source,
            events,
            cursor: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
            active_workers: AtomicUsize::new(workers),
            stop: AtomicBool::new(false),
        });
        for _ in 0..workers {
            tokio::spawn(worker_loop(Arc::clone(&shared)));
        }
        self.current = Some(shared);
        Some((round, receiver))
    }

    pub fn current_round(&self) -> Option<u64> {
        self.current.as_ref().map(|shared| shared.round)
    }

    pub fn is_running(&self) -> bool {
        self.current
            .as_ref()
            .is_some_and(|shared| shared.active_workers.load(Ordering::SeqCst) > 0)
    }

    /// Asks the running round to wind down. Workers notice at their next
    /// loop iteration; in-flight requests still finish.
    pub fn request_stop(&self) {
        if let Some(shared) = &self.current {
            shared.stop.store(true, Ordering::SeqCst);
        }
    }

    /// Stops and forgets the round entirely. Used on server switch, where
    /// any still-arriving results belong to the wrong server.
    pub fn invalidate(&mut self) {
        self.request_stop();
        self.current = None;
    }
}

async fn worker_loop(shared: Arc<RoundShared>) {
    loop {
        if shared.stop.load(Ordering::SeqCst) {
            break;
        }
        let index = shared.cursor.fetch_add(1, Ordering::SeqCst);
        if index >= shared.ids.len() {
            break;
        }
        let item_id = shared.ids[index];
        // A failed fetch stays unresolved here; the next manual round can
        // retry it. Progress still ticks so the owner sees the attempt.
        if let Ok(median) = shared.source.fetch_median(item_id, &shared.server).await {
            let _ = shared.events.send(FetchEvent::PriceReady {
                round: shared.round,
                item_id,
                median,
            });
        }
        let completed = shared.completed.fetch_add(1, Ordering::SeqCst) + 1;
        let _ = shared.events.send(FetchEvent::Progress {
            round: shared.round,
            completed,
            total: shared.ids.len(),
        });
    }
    // Last worker out closes the round.
    if shared.active_workers.fetch_sub(1, Ordering::SeqCst) == 1 {
        let _ = shared.events.send(FetchEvent::RoundEnded { round: shared.round });
    }
}

/// Merges one event into the cache. Events from any round other than
/// `current_round` are stale (the user switched servers or a new round
/// started) and are dropped; returns whether the event was applied.
pub fn apply_event(cache: &mut PriceCache, current_round: Option<u64>, event: &FetchEvent) -> bool {
    if Some(event.round()) != current_round {
        return false;
    }
    match event {
        FetchEvent::PriceReady { item_id, median, .. } => {
            cache.set(*item_id, median.clone());
        }
        // Nothing is in flight anymore; ids whose fetch failed go back on
        // the table for the next round.
        FetchEvent::RoundEnded { .. } => cache.clear_pending(),
        FetchEvent::Progress { .. } => {}
    }
    true
}

/// Result of a blocking batch fetch. When `cancelled` is set the medians are
/// partial and the caller shouldn't trust them.
pub struct BatchOutcome {
    pub medians: IndexMap<u32, String>,
    pub cancelled: bool,
}

/// Fetches every id up front, for export. Runs up to four workers, reports
/// progress as results land and resolves every id: a failed fetch becomes
/// the "0" sentinel rather than a hole. All workers are joined before the
/// result map is read.
pub async fn fetch_all_medians(
    ids: &[u32],
    server: &str,
    source: Arc<dyn PriceSource>,
    cancel: &CancellationToken,
    progress: &mut dyn FnMut(usize, usize),
) -> BatchOutcome {
    let total = ids.len();
    if total == 0 {
        return BatchOutcome { medians: IndexMap::new(), cancelled: false };
    }

    let ids = Arc::new(ids.to_vec());
    let server = Arc::new(server.to_string());
    let results = Arc::new(Mutex::new(IndexMap::new()));
    let cursor = Arc::new(AtomicUsize::new(0));
    let done = Arc::new(AtomicUsize::new(0));
    let notify = Arc::new(Notify::new());

    let workers = WORKER_COUNT.min(total);
    let mut handles = Vec::with_capacity(workers);
    for _ in 0..workers {
        let ids = Arc::clone(&ids);
        let server = Arc::clone(&server);
        let source = Arc::clone(&source);
        let results = Arc::clone(&results);
        let cursor = Arc::clone(&cursor);
        let done = Arc::clone(&done);
        let notify = Arc::clone(&notify);
        let cancel = cancel.clone();
        handles.push(tokio::spawn(async move {
            loop {
                if cancel.is_cancelled() {
                    break;
                }
                let index = cursor.fetch_add(1, Ordering::SeqCst);
                if index >= ids.len() {
                    break;
                }
                let id = ids[index];
                let median = match source.fetch_median(id, &server).await {
                    Ok(median) => median,
                    Err(_) => String::from("0"),
                };
                results.lock().await.insert(id, median);
                done.fetch_add(1, Ordering::SeqCst);
                notify.notify_one();
            }
        }));
    }

    let mut cancelled = false;
    loop {
        let completed = done.load(Ordering::SeqCst);
        progress(completed, total);
        if completed == total {
            break;
        }
        if cancel.is_cancelled() {
            cancelled = true;
            break;
        }
        tokio::select! {
            _ = notify.notified() => {}
            _ = cancel.cancelled() => {}
            _ = tokio::time::sleep(Duration::from_millis(100)) => {}
        }
    }

    for handle in handles {
        let _ = handle.await;
    }
    let medians = results.lock().await.clone();
    BatchOutcome { medians, cancelled }
}

// Ordered Set Store Port (Interface)

use crate::error::{AppError, Result};
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, warn};

/// Attempts per member when the default move re-inserts into the target set
pub const MOVE_INSERT_ATTEMPTS: usize = 3;
/// Attempts to put a member back into its source set after the insert gave up
pub const MOVE_RESTORE_ATTEMPTS: usize = 5;
/// First restore backoff, doubled after every failed attempt
pub const MOVE_RESTORE_BACKOFF: Duration = Duration::from_millis(20);

/// A set member together with its score
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredMember {
    pub member: String,
    pub score: f64,
}

impl ScoredMember {
    pub fn new(member: impl Into<String>, score: f64) -> Self {
        Self {
            member: member.into(),
            score,
        }
    }
}

/// One page of a key scan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyPage {
    pub keys: Vec<String>,
    /// Cursor for the next page, `None` once the scan is complete
    pub next_cursor: Option<String>,
}

/// Score-ordered sets addressed by key name
///
/// Every method is one round trip and atomic on its own. Sets are ordered by
/// ascending score, ties broken by ascending member. A set whose last member
/// is removed stops existing and no longer shows up in scans.
///
/// Implementations are shared across tasks and processes; they must not keep
/// a private copy of set contents between calls.
#[async_trait]
pub trait OrderedSetStore: Send + Sync {
    /// Insert `member` unless it is already present. Returns true if inserted.
    async fn add_if_absent(&self, key: &str, member: &str, score: f64) -> Result<bool>;

    /// 0-based ascending rank of `member`, `None` if absent
    async fn rank(&self, key: &str, member: &str) -> Result<Option<u64>>;

    /// Remove and return up to `count` lowest-score members, lowest first
    async fn pop_minimum(&self, key: &str, count: u64) -> Result<Vec<ScoredMember>>;

    /// Enumerate keys matching a glob `pattern`, one page at a time
    ///
    /// Start with `cursor = None` and feed back `next_cursor` until it is `None`.
    /// A key may show up on more than one page; callers de-duplicate.
    async fn scan_keys(
        &self,
        pattern: &str,
        cursor: Option<&str>,
        page_size: usize,
    ) -> Result<KeyPage>;

    /// Pop up to `count` lowest-score members of `from` and add each to `to` with `score`
    ///
    /// Returns the moved members in pop order. Members already present in `to`
    /// still count as moved.
    ///
    /// The default builds the move out of [`pop_minimum`](Self::pop_minimum) and
    /// [`add_if_absent`](Self::add_if_absent), one member at a time, so at most
    /// one member is ever outside both sets. Its insert into `to` is tried
    /// [`MOVE_INSERT_ATTEMPTS`] times; after that it goes back into `from` with
    /// its original score, retried with backoff. The move stops at the first
    /// member that could not reach `to`. Once anything has moved the result is
    /// `Ok` with what moved; an error is returned only when nothing did.
    /// Stores that can do this in one atomic step override it.
    async fn move_minimum(
        &self,
        from: &str,
        to: &str,
        count: u64,
        score: f64,
    ) -> Result<Vec<ScoredMember>> {
        let mut moved = Vec::new();

        while (moved.len() as u64) < count {
            let entry = match self.pop_minimum(from, 1).await {
                Ok(mut popped) => match popped.pop() {
                    Some(entry) => entry,
                    None => break,
                },
                Err(e) if moved.is_empty() => return Err(e),
                Err(e) => {
                    warn!(key = %from, moved = moved.len(), error = %e, "Move stopped early");
                    break;
                }
            };

            match land_member(self, from, to, &entry, score).await {
                Landing::Moved => moved.push(ScoredMember::new(entry.member, score)),
                Landing::Restored(e) if moved.is_empty() => return Err(e),
                Landing::Restored(e) => {
                    warn!(key = %to, moved = moved.len(), error = %e, "Move stopped early");
                    break;
                }
                Landing::Stranded(e) => {
                    error!(
                        from = %from,
                        to = %to,
                        member = %entry.member,
                        original_score = entry.score,
                        error = %e,
                        "Member could not be placed in either set"
                    );
                    if moved.is_empty() {
                        return Err(AppError::StoreUnavailable(format!(
                            "member {} popped from {} could not be placed: {}",
                            entry.member, from, e
                        )));
                    }
                    break;
                }
            }
        }

        Ok(moved)
    }
}

/// Where a popped member ended up
enum Landing {
    Moved,
    /// Back in the source set; carries the last insert error
    Restored(AppError),
    Stranded(AppError),
}

async fn land_member<S>(store: &S, from: &str, to: &str, entry: &ScoredMember, score: f64) -> Landing
where
    S: OrderedSetStore + ?Sized,
{
    let mut attempt = 1;
    let insert_err = loop {
        match store.add_if_absent(to, &entry.member, score).await {
            Ok(_) => return Landing::Moved,
            Err(e) => {
                warn!(key = %to, member = %entry.member, attempt, error = %e, "Move insert failed");
                if attempt >= MOVE_INSERT_ATTEMPTS {
                    break e;
                }
                attempt += 1;
            }
        }
    };

    let mut attempt = 1;
    let mut backoff = MOVE_RESTORE_BACKOFF;
    loop {
        match store.add_if_absent(from, &entry.member, entry.score).await {
            Ok(_) => return Landing::Restored(insert_err),
            Err(e) => {
                warn!(key = %from, member = %entry.member, attempt, error = %e, "Restore failed");
                if attempt >= MOVE_RESTORE_ATTEMPTS {
                    return Landing::Stranded(e);
                }
                sleep(backoff).await;
                backoff *= 2;
                attempt += 1;
            }
        }
    }
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::{BTreeMap, HashMap, HashSet};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// In-process ordered set store
    ///
    /// Mirrors the semantics of a remote sorted-set store closely enough for
    /// unit tests, plus fault injection. Does not override `move_minimum`, so
    /// tests against it exercise the default move.
    #[derive(Default)]
    pub struct InMemoryOrderedSetStore {
        sets: Mutex<BTreeMap<String, HashMap<String, f64>>>,
        unavailable_keys: Mutex<HashSet<String>>,
        add_faults: Mutex<HashMap<String, AddFault>>,
        failing_scans: AtomicUsize,
        call_count: AtomicUsize,
    }

    /// Inserts into one key: let `pass` through, then fail `fail`
    #[derive(Debug, Clone, Copy)]
    struct AddFault {
        pass: usize,
        fail: usize,
    }

    impl InMemoryOrderedSetStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// Every operation touching `key` fails until [`Self::restore_key`]
        pub fn make_unavailable(&self, key: impl Into<String>) {
            self.unavailable_keys.lock().unwrap().insert(key.into());
        }

        pub fn restore_key(&self, key: &str) {
            self.unavailable_keys.lock().unwrap().remove(key);
        }

        /// The next `times` inserts into `key` fail
        pub fn fail_next_adds(&self, key: impl Into<String>, times: usize) {
            self.fail_adds_after(key, 0, times);
        }

        /// After `successes` more inserts into `key`, the following `failures` fail
        pub fn fail_adds_after(&self, key: impl Into<String>, successes: usize, failures: usize) {
            self.add_faults.lock().unwrap().insert(
                key.into(),
                AddFault {
                    pass: successes,
                    fail: failures,
                },
            );
        }

        /// The next `times` key scans fail
        pub fn fail_next_scans(&self, times: usize) {
            self.failing_scans.store(times, Ordering::SeqCst);
        }

        /// Members of `key` in ascending order
        pub fn members(&self, key: &str) -> Vec<ScoredMember> {
            self.sets
                .lock()
                .unwrap()
                .get(key)
                .map(sorted)
                .unwrap_or_default()
        }

        pub fn call_count(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }

        fn check(&self, key: &str) -> Result<()> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            if self.unavailable_keys.lock().unwrap().contains(key) {
                return Err(AppError::StoreUnavailable(format!(
                    "connection refused while accessing {}",
                    key
                )));
            }
            Ok(())
        }
    }

    fn sorted(set: &HashMap<String, f64>) -> Vec<ScoredMember> {
        let mut entries: Vec<ScoredMember> = set
            .iter()
            .map(|(member, score)| ScoredMember::new(member.clone(), *score))
            .collect();
        entries.sort_by(|a, b| a.score.total_cmp(&b.score).then_with(|| a.member.cmp(&b.member)));
        entries
    }

    /// Shell-style glob match supporting `*` and `?`
    pub(super) fn glob_match(pattern: &str, text: &str) -> bool {
        let p: Vec<char> = pattern.chars().collect();
        let t: Vec<char> = text.chars().collect();
        let (mut pi, mut ti) = (0, 0);
        let mut star: Option<(usize, usize)> = None;

        while ti < t.len() {
            if pi < p.len() && (p[pi] == '?' || p[pi] == t[ti]) {
                pi += 1;
                ti += 1;
            } else if pi < p.len() && p[pi] == '*' {
                star = Some((pi, ti));
                pi += 1;
            } else if let Some((sp, st)) = star {
                pi = sp + 1;
                ti = st + 1;
                star = Some((sp, st + 1));
            } else {
                return false;
            }
        }

        p[pi..].iter().all(|&c| c == '*')
    }

    #[async_trait]
    impl OrderedSetStore for InMemoryOrderedSetStore {
        async fn add_if_absent(&self, key: &str, member: &str, score: f64) -> Result<bool> {
            self.check(key)?;

            if let Some(fault) = self.add_faults.lock().unwrap().get_mut(key) {
                if fault.pass > 0 {
                    fault.pass -= 1;
                } else if fault.fail > 0 {
                    fault.fail -= 1;
                    return Err(AppError::StoreUnavailable(format!(
                        "injected write failure on {}",
                        key
                    )));
                }
            }

            let mut sets = self.sets.lock().unwrap();
            let set = sets.entry(key.to_string()).or_default();
            if set.contains_key(member) {
                return Ok(false);
            }
            set.insert(member.to_string(), score);
            Ok(true)
        }

        async fn rank(&self, key: &str, member: &str) -> Result<Option<u64>> {
            self.check(key)?;

            let sets = self.sets.lock().unwrap();
            Ok(sets.get(key).and_then(|set| {
                sorted(set)
                    .iter()
                    .position(|e| e.member == member)
                    .map(|pos| pos as u64)
            }))
        }

        async fn pop_minimum(&self, key: &str, count: u64) -> Result<Vec<ScoredMember>> {
            self.check(key)?;

            let mut sets = self.sets.lock().unwrap();
            let Some(set) = sets.get_mut(key) else {
                return Ok(Vec::new());
            };

            let popped: Vec<ScoredMember> = sorted(set)
                .into_iter()
                .take(usize::try_from(count).unwrap_or(usize::MAX))
                .collect();
            for entry in &popped {
                set.remove(&entry.member);
            }
            if set.is_empty() {
                sets.remove(key);
            }
            Ok(popped)
        }

        async fn scan_keys(
            &self,
            pattern: &str,
            cursor: Option<&str>,
            page_size: usize,
        ) -> Result<KeyPage> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            let failing = self
                .failing_scans
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
            if failing.is_ok() {
                return Err(AppError::StoreUnavailable(format!(
                    "connection refused while scanning {}",
                    pattern
                )));
            }

            let sets = self.sets.lock().unwrap();
            let mut matching = sets
                .keys()
                .filter(|k| cursor.map_or(true, |c| k.as_str() > c))
                .filter(|k| glob_match(pattern, k));

            let keys: Vec<String> = matching.by_ref().take(page_size.max(1)).cloned().collect();
            let next_cursor = match matching.next() {
                Some(_) => keys.last().cloned(),
                None => None,
            };

            Ok(KeyPage { keys, next_cursor })
        }
    }
}

//! Object id generation.
//!
//! The machine/process fingerprint and the counter are per-process state.
//! Every generator built with [`ObjectIdGen::new`] (or
//! [`ObjectIdGen::with_fingerprint`]) draws from the same process-wide
//! counter, so any number of them can coexist without minting duplicates.

use md5::{Digest, Md5};
use once_cell::sync::Lazy;
use std::env;
use std::ffi::OsString;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::object_id::ObjectId;

/// Counter value before the first id; the first id carries `2`.
const INITIAL_COUNTER: u32 = 1;

/// Digest bytes that make up the machine fingerprint.
const MACHINE_DIGEST_INDICES: [usize; 3] = [1, 3, 5];

/// Overrides the OS host name for the machine fingerprint.
const HOSTNAME_OVERRIDE_VAR: &str = "OBJECTID_HOSTNAME";
const FALLBACK_HOSTNAME: &str = "localhost";

/// Source of wall-clock time.
pub trait Clock: Send + Sync {
    /// Seconds and microseconds since the Unix epoch.
    fn now(&self) -> (u32, u32);
}

/// [`Clock`] backed by [`SystemTime`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> (u32, u32) {
        let dur = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        (dur.as_secs() as u32, dur.subsec_micros())
    }
}

/// Machine and process bytes stamped into every generated id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    machine: [u8; 3],
    process: [u8; 2],
}

static PROCESS_FINGERPRINT: Lazy<Fingerprint> = Lazy::new(|| {
    let hostname = host_name();
    let pid = std::process::id();
    let fingerprint = Fingerprint::new(&hostname, pid);
    tracing::debug!(
        hostname = %hostname,
        pid,
        machine = %hex::encode(fingerprint.machine),
        process = %hex::encode(fingerprint.process),
        "derived process fingerprint"
    );
    fingerprint
});

static PROCESS_COUNTER: Lazy<Arc<AtomicU32>> =
    Lazy::new(|| Arc::new(AtomicU32::new(INITIAL_COUNTER)));

fn host_name() -> String {
    resolve_host_name(
        env::var(HOSTNAME_OVERRIDE_VAR).ok(),
        gethostname::gethostname(),
    )
}

fn resolve_host_name(override_name: Option<String>, os_name: OsString) -> String {
    let non_empty = |s: &str| {
        let s = s.trim();
        (!s.is_empty()).then(|| s.to_string())
    };

    override_name
        .as_deref()
        .and_then(non_empty)
        .or_else(|| non_empty(os_name.to_string_lossy().as_ref()))
        .unwrap_or_else(|| FALLBACK_HOSTNAME.to_string())
}

impl Fingerprint {
    /// Derive a fingerprint from a host name and a process id.
    ///
    /// The machine bytes are digest bytes 1, 3 and 5 of the MD5 of the host
    /// name. The process bytes are the low 16 bits of `pid`, low byte first.
    pub fn new(hostname: &str, pid: u32) -> Self {
        let digest = Md5::digest(hostname.as_bytes());
        Self {
            machine: MACHINE_DIGEST_INDICES.map(|i| digest[i]),
            process: [(pid & 0xff) as u8, ((pid >> 8) & 0xff) as u8],
        }
    }

    pub const fn from_parts(machine: [u8; 3], process: [u8; 2]) -> Self {
        Self { machine, process }
    }

    /// Fingerprint of the running process, computed once and cached.
    ///
    /// The host name is the OS host name unless `OBJECTID_HOSTNAME` is set.
    pub fn detect() -> Self {
        *PROCESS_FINGERPRINT
    }

    pub fn machine(&self) -> [u8; 3] {
        self.machine
    }

    pub fn process(&self) -> [u8; 2] {
        self.process
    }
}

/// Object id generator.
///
/// `next_id` takes `&self`; the counter is atomic so one generator can be
/// shared between threads.
pub struct ObjectIdGen {
    fingerprint: Fingerprint,
    clock: Box<dyn Clock>,
    counter: Arc<AtomicU32>,
}

impl ObjectIdGen {
    /// Generator for this process using the system clock and the
    /// process-wide counter.
    pub fn new() -> Self {
        Self::with_fingerprint(Fingerprint::detect())
    }

    /// Generator with an explicit fingerprint, the system clock and the
    /// process-wide counter.
    pub fn with_fingerprint(fingerprint: Fingerprint) -> Self {
        Self {
            fingerprint,
            clock: Box::new(SystemClock),
            counter: Arc::clone(&PROCESS_COUNTER),
        }
    }

    /// Generator with an explicit fingerprint and clock. It starts a counter
    /// of its own instead of using the process-wide one.
    pub fn with_clock(fingerprint: Fingerprint, clock: impl Clock + 'static) -> Self {
        Self {
            fingerprint,
            clock: Box::new(clock),
            counter: Arc::new(AtomicU32::new(INITIAL_COUNTER)),
        }
    }

    /// Generate the next object id.
    pub fn next_id(&self) -> ObjectId {
        let (seconds, micros) = self.clock.now();
        // fetch_add wraps on overflow; only the low 24 bits are stored
        let counter = self
            .counter
            .fetch_add(1, Ordering::Relaxed)
            .wrapping_add(1);
        ObjectId::from_fields(
            seconds,
            micros,
            self.fingerprint.machine,
            self.fingerprint.process,
            counter,
        )
    }

    /// Generate n object ids.
    pub fn next_n(&self, n: usize) -> Vec<ObjectId> {
        (0..n).map(|_| self.next_id()).collect()
    }

    /// Current counter value (the value used by the last generated id).
    pub fn counter(&self) -> u32 {
        self.counter.load(Ordering::Relaxed)
    }

    /// Restore counter state, e.g. after a restart. On a generator that uses
    /// the process-wide counter this affects every such generator.
    pub fn restore_counter(&self, value: u32) {
        self.counter.store(value, Ordering::Relaxed);
    }

    pub fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }
}

impl Default for ObjectIdGen {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ObjectIdGen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectIdGen")
            .field("fingerprint", &self.fingerprint)
            .field("counter", &self.counter())
            .finish_non_exhaustive()
    }
}

impl Iterator for ObjectIdGen {
    type Item = ObjectId;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        Some(self.next_id())
    }
}

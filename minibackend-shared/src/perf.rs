/// Query timing instrumentation
///
/// Wraps any operation, usually a query, and logs how long it took. The
/// wrapper never touches the operation's output: values and errors pass
/// through untouched, and the timer stops whether the operation succeeded or
/// failed.
///
/// Records are emitted at `INFO` under the `perf` target, so they can be
/// switched on and off independently, e.g. `RUST_LOG=info,perf=off`.
///
/// # Example
///
/// ```no_run
/// use minibackend_shared::perf::instrument;
///
/// # async fn example(pool: sqlx::PgPool) -> Result<(), sqlx::Error> {
/// let count: i64 = instrument(
///     "count_customers",
///     sqlx::query_scalar("SELECT COUNT(*) FROM customers").fetch_one(&pool),
/// )
/// .await?;
/// // logs: [PERF] count_customers took 0.84 ms
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::info;

/// One timed invocation
///
/// Lives only as long as the call it describes.
#[derive(Debug, Clone)]
pub struct QueryTiming {
    /// Operation name given to the wrapper
    pub operation: String,

    /// Wall-clock time the operation started
    pub started_at: DateTime<Utc>,

    /// Monotonic time from start to finish
    pub elapsed: Duration,
}

impl QueryTiming {
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed.as_secs_f64() * 1000.0
    }

    /// Logs the record
    pub fn emit(&self) {
        info!(
            target: "perf",
            operation = %self.operation,
            elapsed_ms = self.elapsed_ms(),
            started_at = %self.started_at.to_rfc3339(),
            "[PERF] {} took {:.2} ms",
            self.operation,
            self.elapsed_ms()
        );
    }
}

/// Awaits `operation` and returns its output along with the timing, without logging
pub async fn measure<Fut>(operation: &str, future: Fut) -> (Fut::Output, QueryTiming)
where
    Fut: Future,
{
    let started_at = Utc::now();
    let start = Instant::now();

    let output = future.await;

    let timing = QueryTiming {
        operation: operation.to_string(),
        started_at,
        elapsed: start.elapsed(),
    };

    (output, timing)
}

/// Awaits `future`, logs one timing record, and returns the future's output
pub async fn instrument<Fut>(operation: &str, future: Fut) -> Fut::Output
where
    Fut: Future,
{
    let (output, timing) = measure(operation, future).await;
    timing.emit();
    output
}

/// Blocking counterpart of [`instrument`]
pub fn instrument_blocking<T, F>(operation: &str, f: F) -> T
where
    F: FnOnce() -> T,
{
    let started_at = Utc::now();
    let start = Instant::now();

    let output = f();

    QueryTiming {
        operation: operation.to_string(),
        started_at,
        elapsed: start.elapsed(),
    }
    .emit();

    output
}

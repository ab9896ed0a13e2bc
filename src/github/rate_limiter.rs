use reqwest::Response;
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;
use tokio::time::{sleep, Duration};

const DEFAULT_PER_MINUTE: u32 = 30;

/// Client-side throttle for the GitHub REST API.
///
/// Honours the `x-ratelimit-*` headers and on top of that caps the number of
/// requests started per minute.
pub struct RateLimiter {
    state: Mutex<RateLimitState>,
    per_minute: u32,
}

struct RateLimitState {
    remaining: u32,
    reset_at: Option<Instant>,
    requests_this_minute: u32,
    minute_start: Instant,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::with_per_minute(DEFAULT_PER_MINUTE)
    }

    pub fn with_per_minute(per_minute: u32) -> Self {
        Self {
            state: Mutex::new(RateLimitState {
                remaining: 5000,
                reset_at: None,
                requests_this_minute: 0,
                minute_start: Instant::now(),
            }),
            per_minute: per_minute.max(1),
        }
    }

    pub async fn wait(&self) {
        let mut state = self.state.lock().await;

        if state.remaining == 0 {
            if let Some(reset_at) = state.reset_at.take() {
                let now = Instant::now();
                if reset_at > now {
                    let wait_duration = reset_at - now;
                    drop(state);
                    tracing::info!("Rate limited, waiting {:?}", wait_duration);
                    sleep(wait_duration).await;
                    state = self.state.lock().await;
                }
            }
        }

        let minute_elapsed = state.minute_start.elapsed();
        if minute_elapsed >= Duration::from_secs(60) {
            state.requests_this_minute = 0;
            state.minute_start = Instant::now();
        } else if state.requests_this_minute >= self.per_minute {
            let wait_time = Duration::from_secs(60) - minute_elapsed;
            drop(state);
            tracing::debug!("Soft rate limiting, waiting {:?}", wait_time);
            sleep(wait_time).await;
            state = self.state.lock().await;
            state.requests_this_minute = 0;
            state.minute_start = Instant::now();
        }

        state.requests_this_minute += 1;
    }

    pub async fn update_from_response(&self, response: &Response) {
        let header = |name: &str| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
        };

        if let Some(remaining) = header("x-ratelimit-remaining") {
            self.record(remaining as u32, header("x-ratelimit-reset")).await;
        }
    }

    /// Stores the quota the server reported. `reset` is a unix timestamp.
    pub async fn record(&self, remaining: u32, reset: Option<u64>) {
        let mut state = self.state.lock().await;
        state.remaining = remaining;

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        state.reset_at = reset
            .filter(|reset| *reset > now)
            .map(|reset| Instant::now() + Duration::from_secs(reset - now));
    }

    pub async fn remaining(&self) -> u32 {
        self.state.lock().await.remaining
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

use std::time::Duration;

const BASE_DELAY_MS: u64 = 100;
// Caps a single wait at 100ms * 2^6 = 6.4s.
const MAX_SHIFT: u32 = 6;

/// Delay before reopen attempt number `attempt` (1-based): exponential from
/// 100 ms, doubling per attempt, capped.
pub fn retry_delay(attempt: u32) -> Duration {
    if attempt == 0 {
        return Duration::ZERO;
    }
    let shift = (attempt - 1).min(MAX_SHIFT);
    Duration::from_millis(BASE_DELAY_MS << shift)
}

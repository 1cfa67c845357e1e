use log::debug;

const MIN_SHARDS: usize = 2;
const MAX_SHARDS: usize = 8192;

/// Shard count for a store used by `parallelism` threads.
///
/// Scales with the square of the thread count so lock contention stays
/// low when every thread hits the map at once.
pub fn get_number_of_shards(parallelism: usize) -> usize {
    let parallelism = parallelism.clamp(1, 192);
    let shards = normalize_shards(parallelism * parallelism / 4);
    debug!("Parallelism {} gives {} shards", parallelism, shards);
    shards
}

/// Rounds a requested shard count to what the sharded map accepts: a
/// power of two of at least two.
pub fn normalize_shards(requested: usize) -> usize {
    let requested = requested.clamp(MIN_SHARDS, MAX_SHARDS);
    if requested.is_power_of_two() {
        requested
    } else {
        // largest power of two below the request
        1 << requested.ilog2()
    }
}

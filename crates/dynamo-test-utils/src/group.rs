//! Run a closure on every rank of an in-process group.

use dynamo_comm::LocalComm;

/// Spawn one scoped thread per rank, hand each its [`LocalComm`]
/// endpoint, and collect the results in rank order.
///
/// Panics if any rank's closure panics.
pub fn run_on_ranks<T, F>(size: usize, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(LocalComm) -> T + Sync,
{
    let group = LocalComm::group(size);
    std::thread::scope(|s| {
        let f = &f;
        let handles: Vec<_> = group
            .into_iter()
            .enumerate()
            .map(|(rank, comm)| {
                std::thread::Builder::new()
                    .name(format!("rank-{rank}"))
                    .spawn_scoped(s, move || f(comm))
                    .unwrap()
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    })
}

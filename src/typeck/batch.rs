use crossbeam_channel::unbounded;

/// Map `f` over `items` on up to `jobs` scoped worker threads.
///
/// Work is handed out through a shared channel and results come back tagged
/// with their index, so the output is in input order regardless of which
/// worker finished first.
pub fn run_ordered<T, R, F>(items: &[T], jobs: usize, f: F) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync,
{
    let jobs = jobs.clamp(1, items.len().max(1));
    if jobs == 1 {
        return items.iter().map(|item| f(item)).collect();
    }

    let (work_tx, work_rx) = unbounded::<usize>();
    let (done_tx, done_rx) = unbounded::<(usize, R)>();
    for index in 0..items.len() {
        // the receiver is alive until the scope below ends
        let _ = work_tx.send(index);
    }
    drop(work_tx);

    std::thread::scope(|s| {
        for worker in 0..jobs {
            let work_rx = work_rx.clone();
            let done_tx = done_tx.clone();
            let f = &f;
            s.spawn(move || {
                for index in work_rx.iter() {
                    tracing::trace!(worker, index, "picked up class");
                    if done_tx.send((index, f(&items[index]))).is_err() {
                        break;
                    }
                }
            });
        }
    });
    drop(done_tx);

    let mut results: Vec<(usize, R)> = done_rx.try_iter().collect();
    results.sort_by_key(|(index, _)| *index);
    results.into_iter().map(|(_, r)| r).collect()
}

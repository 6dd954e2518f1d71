use crate::browser::fake::{FakeLauncher, FakeState};
use crate::browser::{BrowserHandle, BrowserPool};
use crate::error::LaunchError;
use futures::future::join_all;
use std::sync::Arc;
use std::sync::atomic::Ordering;

fn pool() -> (BrowserPool<FakeLauncher>, Arc<FakeState>) {
    let state = FakeState::with_page("<html></html>");
    let pool = BrowserPool::new(FakeLauncher::new(Arc::clone(&state)));
    (pool, state)
}

#[tokio::test]
async fn test_concurrent_callers_share_one_launch() {
    let (pool, state) = pool();

    let handles = join_all((0..8).map(|_| pool.ensure())).await;

    assert_eq!(pool.launch_count(), 1);
    assert_eq!(state.count("launch"), 1);
    let first = handles[0].as_ref().unwrap();
    for handle in &handles {
        assert!(Arc::ptr_eq(first, handle.as_ref().unwrap()));
    }
    assert!(pool.is_ready());
}

#[tokio::test]
async fn test_concurrent_callers_across_tasks_share_one_launch() {
    let (pool, _state) = pool();
    let pool = Arc::new(pool);

    let tasks: Vec<_> = (0..4)
        .map(|_| {
            let pool = Arc::clone(&pool);
            tokio::spawn(async move { pool.ensure().await.map(|_| ()) })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    assert_eq!(pool.launch_count(), 1);
}

#[tokio::test]
async fn test_ready_handle_is_reused_without_launch() {
    let (pool, _state) = pool();

    let first = pool.ensure().await.unwrap();
    let second = pool.ensure().await.unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(pool.launch_count(), 1);
}

#[tokio::test]
async fn test_failed_launch_reaches_every_waiter_then_retries() {
    let (pool, state) = pool();
    state.fail_launch.store(true, Ordering::SeqCst);

    let results = join_all((0..5).map(|_| pool.ensure())).await;

    assert_eq!(pool.launch_count(), 1);
    for result in &results {
        assert!(matches!(result, Err(LaunchError::Spawn { .. })));
    }
    assert!(!pool.is_ready());

    // Nothing stale is cached; the next call launches afresh
    state.fail_launch.store(false, Ordering::SeqCst);
    pool.ensure().await.unwrap();
    assert_eq!(pool.launch_count(), 2);
}

#[tokio::test]
async fn test_dead_handle_is_relaunched() {
    let (pool, state) = pool();

    let first = pool.ensure().await.unwrap();
    state.kill_browser();
    assert!(!first.is_connected());
    assert!(!pool.is_ready());

    let second = pool.ensure().await.unwrap();
    assert!(second.is_connected());
    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(pool.launch_count(), 2);
}

#[tokio::test]
async fn test_shutdown_is_idempotent() {
    let (pool, state) = pool();

    // Never launched
    pool.shutdown().await;
    assert_eq!(state.count("browser:close"), 0);

    pool.warm_up().await.unwrap();
    pool.shutdown().await;
    pool.shutdown().await;

    assert_eq!(state.count("browser:close"), 1);
    assert!(!pool.is_ready());

    // A later request launches a new browser
    pool.ensure().await.unwrap();
    assert_eq!(pool.launch_count(), 2);
}

//! Blocking scope tests
//!
//! The non-suspending mirror of the runtime: same sharing and teardown
//! rules, with suspending recipes rejected up front.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use infuse_container::{Container, ContextualizedProvider};
use infuse_core::{Error, Provider};

#[derive(Debug)]
struct Config;
struct Session {
    id: usize,
}

#[test]
fn blocking_scopes_share_per_tier() {
    let counter = Arc::new(AtomicUsize::new(0));
    let counting = Arc::clone(&counter);
    let session_counter = Arc::new(AtomicUsize::new(0));
    let session_counting = Arc::clone(&session_counter);

    let container = Container::builder()
        .provider(ContextualizedProvider::application(
            Provider::bind::<Config>().from(move |_| {
                counting.fetch_add(1, Ordering::SeqCst);
                Ok(Config)
            }),
        ))
        .provider(ContextualizedProvider::task(
            Provider::bind::<Session>().from(move |_| {
                Ok(Session {
                    id: session_counting.fetch_add(1, Ordering::SeqCst),
                })
            }),
        ))
        .build()
        .unwrap();

    let app = container.blocking_application_scope().unwrap();
    let first = app.task_scope().unwrap();
    let second = app.task_scope().unwrap();

    let shared_a = first.get::<Config>().unwrap();
    let shared_b = second.get::<Config>().unwrap();
    assert!(Arc::ptr_eq(&shared_a, &shared_b));
    assert_eq!(counter.load(Ordering::SeqCst), 1);

    let a = first.get::<Session>().unwrap();
    let b = second.get::<Session>().unwrap();
    assert_ne!(a.id, b.id);

    first.close().unwrap();
    second.close().unwrap();
    app.close().unwrap();
}

#[test]
fn blocking_teardown_runs_in_reverse_order() {
    let log: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));

    let config_log = Arc::clone(&log);
    let session_log = Arc::clone(&log);
    let container = Container::builder()
        .provider(ContextualizedProvider::application(
            Provider::bind::<Config>().from_resource(move |_| {
                let exit_log = Arc::clone(&config_log);
                Ok((Config, move || {
                    exit_log
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .push("config down");
                    Ok(())
                }))
            }),
        ))
        .provider(ContextualizedProvider::application(
            Provider::bind::<Session>()
                .needs::<Config>("config")
                .from_resource(move |_| {
                    let exit_log = Arc::clone(&session_log);
                    Ok((Session { id: 0 }, move || {
                        exit_log
                            .lock()
                            .unwrap_or_else(PoisonError::into_inner)
                            .push("session down");
                        Ok(())
                    }))
                }),
        ))
        .build()
        .unwrap();

    let app = container.blocking_application_scope().unwrap();
    app.get::<Session>().unwrap();
    app.close().unwrap();

    let entries = log.lock().unwrap_or_else(PoisonError::into_inner).clone();
    assert_eq!(entries, vec!["session down", "config down"]);
}

#[test]
fn suspending_recipes_are_rejected_without_construction() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let counting = Arc::clone(&attempts);
    let container = Container::builder()
        .provider(ContextualizedProvider::application(
            Provider::bind::<Config>().from_async(move |_| {
                counting.fetch_add(1, Ordering::SeqCst);
                async { Ok(Config) }
            }),
        ))
        .build()
        .unwrap();

    let app = container.blocking_application_scope().unwrap();
    let err = app.get::<Config>().unwrap_err();
    assert!(matches!(err, Error::SyncSuspension { .. }));
    assert!(err.to_string().contains("requires suspension"));
    assert_eq!(attempts.load(Ordering::SeqCst), 0);
    app.close().unwrap();
}

#[test]
fn suspending_dependencies_poison_the_whole_request() {
    #[derive(Debug)]
    struct Service;

    let container = Container::builder()
        .provider(ContextualizedProvider::application(
            Provider::bind::<Config>().from_async(|_| async { Ok(Config) }),
        ))
        .provider(ContextualizedProvider::application(
            Provider::bind::<Service>()
                .needs::<Config>("config")
                .from(|_| Ok(Service)),
        ))
        .build()
        .unwrap();

    let app = container.blocking_application_scope().unwrap();
    let err = app.get::<Service>().unwrap_err();
    assert!(matches!(err, Error::SyncSuspension { .. }));
    app.close().unwrap();
}

#[test]
fn blocking_with_task_scope_closes_on_error() {
    let log: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));
    let scoped_log = Arc::clone(&log);
    let container = Container::builder()
        .provider(ContextualizedProvider::task(
            Provider::bind::<Session>().from_resource(move |_| {
                let exit_log = Arc::clone(&scoped_log);
                Ok((Session { id: 0 }, move || {
                    exit_log
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .push("session down");
                    Ok(())
                }))
            }),
        ))
        .build()
        .unwrap();

    let app = container.blocking_application_scope().unwrap();
    let err = app
        .with_task_scope(|task| {
            task.get::<Session>()?;
            Err::<(), _>(Error::construction("handler failed"))
        })
        .unwrap_err();

    assert!(matches!(err, Error::Construction { .. }));
    let entries = log.lock().unwrap_or_else(PoisonError::into_inner).clone();
    assert_eq!(entries, vec!["session down"]);
    app.close().unwrap();
}

#[test]
fn closed_blocking_scope_rejects_requests() {
    let container = Container::builder()
        .provider(ContextualizedProvider::application(
            Provider::bind::<Config>().from(|_| Ok(Config)),
        ))
        .build()
        .unwrap();

    let app = container.blocking_application_scope().unwrap();
    app.close().unwrap();
    assert!(matches!(
        app.get::<Config>().unwrap_err(),
        Error::ScopeClosed
    ));
    assert!(matches!(
        app.thread_scope().unwrap_err(),
        Error::ScopeClosed
    ));
}

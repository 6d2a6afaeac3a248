use async_trait::async_trait;
use autowire::{
    Arguments, AsyncDispose, Container, ContainerConfig, Dependency, DiError, DiResult, Dispose, Disposer,
    Injectable, Lifetime,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Journal = Arc<Mutex<Vec<String>>>;

fn journal(container: &Container) -> Journal {
    let journal: Journal = Arc::new(Mutex::new(Vec::new()));
    container.register_instance(journal.clone());
    journal
}

macro_rules! sync_resource {
    ($name:ident $(, $dep:ident)*) => {
        struct $name {
            journal: Journal,
        }

        impl Dispose for $name {
            fn dispose(&self) -> anyhow::Result<()> {
                self.journal.lock().unwrap().push(stringify!($name).to_string());
                Ok(())
            }
        }

        impl Injectable for $name {
            fn dependencies() -> Vec<Dependency> {
                vec![
                    Dependency::typed::<Mutex<Vec<String>>>("journal"),
                    $(Dependency::typed::<$dep>(stringify!($dep)),)*
                ]
            }
            fn construct(args: &mut Arguments) -> DiResult<Self> {
                Ok($name { journal: args.take("journal")? })
            }
            fn disposer(this: &Arc<Self>) -> Option<Disposer> {
                Some(Disposer::sync(this.clone()))
            }
        }
    };
}

sync_resource!(Pool);
sync_resource!(Cache, Pool);
sync_resource!(Session, Cache);

struct AsyncClient {
    journal: Journal,
}

#[async_trait]
impl AsyncDispose for AsyncClient {
    async fn dispose(&self) -> anyhow::Result<()> {
        tokio::task::yield_now().await;
        self.journal.lock().unwrap().push("AsyncClient".to_string());
        Ok(())
    }
}

impl Injectable for AsyncClient {
    fn dependencies() -> Vec<Dependency> {
        vec![Dependency::typed::<Mutex<Vec<String>>>("journal")]
    }
    fn construct(args: &mut Arguments) -> DiResult<Self> {
        Ok(AsyncClient { journal: args.take("journal")? })
    }
    fn disposer(this: &Arc<Self>) -> Option<Disposer> {
        Some(Disposer::asynchronous(this.clone()))
    }
}

#[tokio::test]
async fn singleton_released_exactly_once() {
    let container = Container::new();
    let journal = journal(&container);
    container.register_self::<Pool>(Lifetime::Singleton);

    container.resolve::<Pool>().unwrap();
    container.resolve::<Pool>().unwrap();
    assert_eq!(container.tracked_disposables(), 1);

    container.dispose().await.unwrap();
    assert_eq!(*journal.lock().unwrap(), vec!["Pool"]);
    assert_eq!(container.cached_singletons(), 0);

    // Nothing is tracked anymore, so a second teardown releases nothing
    container.dispose().await.unwrap();
    assert_eq!(journal.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn released_in_construction_order() {
    let container = Container::new();
    let journal = journal(&container);
    container.register_self::<Pool>(Lifetime::Singleton);
    container.register_self::<Cache>(Lifetime::Singleton);
    container.register_self::<Session>(Lifetime::Singleton);
    container.register_self::<AsyncClient>(Lifetime::Singleton);

    container.resolve::<AsyncClient>().unwrap();
    // Dependencies finish constructing before their dependents
    container.resolve::<Session>().unwrap();

    container.dispose().await.unwrap();
    assert_eq!(
        *journal.lock().unwrap(),
        vec!["AsyncClient", "Pool", "Cache", "Session"]
    );
}

#[tokio::test]
async fn transient_instances_are_each_released() {
    let container = Container::new();
    let journal = journal(&container);
    container.register_self::<Pool>(Lifetime::Transient);

    container.resolve::<Pool>().unwrap();
    container.resolve::<Pool>().unwrap();
    container.resolve::<Pool>().unwrap();
    assert_eq!(container.tracked_disposables(), 3);

    container.dispose().await.unwrap();
    assert_eq!(journal.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn failing_release_does_not_stop_the_rest() {
    struct Broken;
    impl Dispose for Broken {
        fn dispose(&self) -> anyhow::Result<()> {
            anyhow::bail!("socket already closed")
        }
    }
    impl Injectable for Broken {
        fn construct(_: &mut Arguments) -> DiResult<Self> {
            Ok(Broken)
        }
        fn disposer(this: &Arc<Self>) -> Option<Disposer> {
            Some(Disposer::sync(this.clone()))
        }
    }

    let container = Container::new();
    let journal = journal(&container);
    container.register_self::<Broken>(Lifetime::Singleton);
    container.register_self::<Pool>(Lifetime::Singleton);

    container.resolve::<Broken>().unwrap();
    container.resolve::<Pool>().unwrap();

    match container.dispose().await {
        Err(DiError::Dispose(failures)) => {
            assert_eq!(failures.len(), 1);
            assert!(failures[0].service.ends_with("Broken"));
            assert_eq!(failures[0].message, "socket already closed");
        }
        other => panic!("expected Dispose error, got {:?}", other),
    }
    assert_eq!(*journal.lock().unwrap(), vec!["Pool"]);
    assert_eq!(container.cached_singletons(), 0);
    assert_eq!(container.tracked_disposables(), 0);
}

#[tokio::test]
async fn panicking_release_counts_as_failure() {
    struct Explosive;
    impl Dispose for Explosive {
        fn dispose(&self) -> anyhow::Result<()> {
            panic!("boom")
        }
    }
    impl Injectable for Explosive {
        fn construct(_: &mut Arguments) -> DiResult<Self> {
            Ok(Explosive)
        }
        fn disposer(this: &Arc<Self>) -> Option<Disposer> {
            Some(Disposer::sync(this.clone()))
        }
    }

    let container = Container::new();
    let journal = journal(&container);
    container.register_self::<Explosive>(Lifetime::Singleton);
    container.register_self::<Pool>(Lifetime::Singleton);
    container.resolve::<Explosive>().unwrap();
    container.resolve::<Pool>().unwrap();

    let err = container.dispose().await.unwrap_err();
    assert!(err.to_string().contains("boom"));
    assert_eq!(*journal.lock().unwrap(), vec!["Pool"]);
}

#[tokio::test]
async fn slow_release_times_out() {
    struct Sluggish;
    #[async_trait]
    impl AsyncDispose for Sluggish {
        async fn dispose(&self) -> anyhow::Result<()> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(())
        }
    }
    impl Injectable for Sluggish {
        fn construct(_: &mut Arguments) -> DiResult<Self> {
            Ok(Sluggish)
        }
        fn disposer(this: &Arc<Self>) -> Option<Disposer> {
            Some(Disposer::asynchronous(this.clone()))
        }
    }

    let container = Container::with_config(ContainerConfig::default().dispose_timeout(Duration::from_millis(20)));
    container.register_self::<Sluggish>(Lifetime::Singleton);
    container.resolve::<Sluggish>().unwrap();

    match container.dispose().await {
        Err(DiError::Dispose(failures)) => assert!(failures[0].message.contains("timed out")),
        other => panic!("expected timeout failure, got {:?}", other),
    }
}

#[tokio::test]
async fn container_is_reusable_after_dispose() {
    let container = Container::new();
    let journal = journal(&container);
    container.register_self::<Pool>(Lifetime::Singleton);

    let first = container.resolve::<Pool>().unwrap();
    container.dispose().await.unwrap();

    let second = container.resolve::<Pool>().unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(container.tracked_disposables(), 1);

    container.dispose().await.unwrap();
    assert_eq!(journal.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn registered_instances_are_never_released() {
    let container = Container::new();
    let journal = journal(&container);
    let pool = Arc::new(Pool { journal: journal.clone() });
    container.register_instance(pool);

    container.resolve::<Pool>().unwrap();
    assert_eq!(container.tracked_disposables(), 0);
    container.dispose().await.unwrap();
    assert!(journal.lock().unwrap().is_empty());
}

#[tokio::test]
async fn scoped_returns_body_value_and_tears_down() {
    let container = Container::new();
    let journal = journal(&container);
    container.register_self::<Session>(Lifetime::Singleton);
    container.register_self::<Cache>(Lifetime::Singleton);
    container.register_self::<Pool>(Lifetime::Singleton);

    let count = container
        .scoped(|c| async move {
            c.resolve::<Session>().unwrap();
            c.tracked_disposables()
        })
        .await
        .unwrap();

    assert_eq!(count, 3);
    assert_eq!(*journal.lock().unwrap(), vec!["Pool", "Cache", "Session"]);
    assert_eq!(container.cached_singletons(), 0);
}

#[tokio::test]
async fn scoped_passes_body_errors_through() {
    let container = Container::new();
    let journal = journal(&container);
    container.register_self::<Pool>(Lifetime::Singleton);

    let outcome = container
        .scoped(|c| async move {
            assert!(c.resolve::<Pool>().is_ok());
            c.resolve::<Cache>().map(|_| ())
        })
        .await
        .unwrap();

    assert!(matches!(outcome, Err(DiError::NotFound(_))));
    assert_eq!(*journal.lock().unwrap(), vec!["Pool"]);
}

#[tokio::test]
async fn scoped_tears_down_when_body_panics() {
    use futures::FutureExt;
    use std::panic::AssertUnwindSafe;

    let container = Container::new();
    let journal = journal(&container);
    container.register_self::<Pool>(Lifetime::Singleton);

    let result = AssertUnwindSafe(container.scoped(|c| async move {
        c.resolve::<Pool>().unwrap();
        panic!("request handler crashed");
    }))
    .catch_unwind()
    .await;

    assert!(result.is_err());
    assert_eq!(*journal.lock().unwrap(), vec!["Pool"]);
    assert_eq!(container.tracked_disposables(), 0);
    assert_eq!(container.cached_singletons(), 0);
}

#[tokio::test]
async fn scoped_tears_down_when_timed_out() {
    let container = Container::new();
    let journal = journal(&container);
    container.register_self::<Pool>(Lifetime::Singleton);

    let result = tokio::time::timeout(
        Duration::from_millis(20),
        container.scoped(|c| async move {
            c.resolve::<Pool>().unwrap();
            tokio::time::sleep(Duration::from_secs(10)).await;
        }),
    )
    .await;

    assert!(result.is_err());
    assert_eq!(*journal.lock().unwrap(), vec!["Pool"]);
    assert_eq!(container.tracked_disposables(), 0);
    assert_eq!(container.cached_singletons(), 0);
}

#[tokio::test]
async fn dropped_scope_spawns_async_releases() {
    let container = Container::new();
    let journal = journal(&container);
    container.register_self::<Pool>(Lifetime::Singleton);
    container.register_self::<AsyncClient>(Lifetime::Singleton);

    let scope = container.scoped(|c| async move {
        c.resolve::<AsyncClient>().unwrap();
        c.resolve::<Pool>().unwrap();
        futures::future::pending::<()>().await;
    });
    tokio::select! {
        _ = scope => unreachable!("scope body never completes"),
        _ = tokio::time::sleep(Duration::from_millis(20)) => {}
    }

    // Sync releases ran in place; the async one runs on the runtime
    assert_eq!(*journal.lock().unwrap(), vec!["Pool"]);
    assert_eq!(container.tracked_disposables(), 0);
    assert_eq!(container.cached_singletons(), 0);

    for _ in 0..100 {
        if journal.lock().unwrap().len() == 2 {
            break;
        }
        tokio::task::yield_now().await;
    }
    assert_eq!(*journal.lock().unwrap(), vec!["Pool", "AsyncClient"]);
}

#[tokio::test]
async fn aborted_task_still_tears_down_scope() {
    let container = Container::new();
    let journal = journal(&container);
    container.register_self::<Pool>(Lifetime::Transient);

    let handle = container.clone();
    let task = tokio::spawn(async move {
        handle
            .scoped(|c| async move {
                c.resolve::<Pool>().unwrap();
                c.resolve::<Pool>().unwrap();
                tokio::time::sleep(Duration::from_secs(10)).await;
            })
            .await
    });
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(container.tracked_disposables(), 2);

    task.abort();
    assert!(task.await.unwrap_err().is_cancelled());
    assert_eq!(*journal.lock().unwrap(), vec!["Pool", "Pool"]);
    assert_eq!(container.tracked_disposables(), 0);
}

#[tokio::test]
async fn factory_instances_with_disposer_are_released() {
    let container = Container::new();
    let journal = journal(&container);
    container.register_factory_with_disposer::<Pool, _, _>(
        Lifetime::Transient,
        vec![Dependency::typed::<Mutex<Vec<String>>>("journal")],
        |args| Ok(Arc::new(Pool { journal: args.take("journal")? })),
        |pool| Some(Disposer::sync(pool.clone())),
    );

    container.resolve::<Pool>().unwrap();
    container.resolve::<Pool>().unwrap();
    assert_eq!(container.tracked_disposables(), 2);

    container.dispose().await.unwrap();
    assert_eq!(*journal.lock().unwrap(), vec!["Pool", "Pool"]);
    assert_eq!(container.tracked_disposables(), 0);
}

#[tokio::test]
async fn factory_disposer_may_decline_tracking() {
    let container = Container::new();
    let journal = journal(&container);
    container.register_factory_with_disposer::<Pool, _, _>(
        Lifetime::Singleton,
        vec![Dependency::typed::<Mutex<Vec<String>>>("journal")],
        |args| Ok(Arc::new(Pool { journal: args.take("journal")? })),
        |_| None,
    );

    container.resolve::<Pool>().unwrap();
    assert_eq!(container.tracked_disposables(), 0);

    container.dispose().await.unwrap();
    assert!(journal.lock().unwrap().is_empty());
}

#[tokio::test]
async fn release_notifies_observers() {
    static RELEASED: AtomicUsize = AtomicUsize::new(0);

    struct Counter;
    impl autowire::DiObserver for Counter {
        fn resolving(&self, _: &autowire::Key) {}
        fn resolved(&self, _: &autowire::Key, _: Duration) {}
        fn released(&self, _: &'static str, success: bool) {
            assert!(success);
            RELEASED.fetch_add(1, Ordering::SeqCst);
        }
    }

    let container = Container::new();
    journal(&container);
    container.add_observer(Arc::new(Counter));
    container.register_self::<Pool>(Lifetime::Transient);
    container.resolve::<Pool>().unwrap();
    container.resolve::<Pool>().unwrap();

    container.dispose().await.unwrap();
    assert_eq!(RELEASED.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn transient_database_released_once_per_scope() {
    static CONNECTIONS: AtomicUsize = AtomicUsize::new(0);

    struct Database {
        id: usize,
        journal: Journal,
    }
    #[async_trait]
    impl AsyncDispose for Database {
        async fn dispose(&self) -> anyhow::Result<()> {
            self.journal.lock().unwrap().push(format!("close {}", self.id));
            Ok(())
        }
    }
    impl Injectable for Database {
        fn dependencies() -> Vec<Dependency> {
            vec![Dependency::typed::<Mutex<Vec<String>>>("journal")]
        }
        fn construct(args: &mut Arguments) -> DiResult<Self> {
            Ok(Database {
                id: CONNECTIONS.fetch_add(1, Ordering::SeqCst),
                journal: args.take("journal")?,
            })
        }
        fn disposer(this: &Arc<Self>) -> Option<Disposer> {
            Some(Disposer::asynchronous(this.clone()))
        }
    }

    let container = Container::new();
    let journal = journal(&container);
    container.register_self::<Database>(Lifetime::Transient);

    let first = container
        .scoped(|c| async move { c.resolve::<Database>().map(|db| db.id) })
        .await
        .unwrap()
        .unwrap();
    assert_eq!(*journal.lock().unwrap(), vec![format!("close {}", first)]);

    let second = container.resolve::<Database>().unwrap();
    assert_ne!(second.id, first);
    assert_eq!(journal.lock().unwrap().len(), 1);
    container.dispose().await.unwrap();
    assert_eq!(journal.lock().unwrap().len(), 2);
}

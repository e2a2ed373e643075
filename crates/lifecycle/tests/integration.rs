//! Integration tests for the request lifecycle

#[cfg(test)]
mod tests {
    use satdl_credentials::MemoryCredentialStore;
    use satdl_errors::{AuthorityError, Error, RequestError, StorageError};
    use satdl_events::{AppEvent, SweepEvent};
    use satdl_lifecycle::*;
    use satdl_types::{
        ActivityFilter, ActivityKind, ActivityOutcome, DocumentFormat, LifecycleState, NaiveDate,
        PackageId, RequestId, RequestKind, StatusQuery, StatusReport,
    };
    use std::collections::{HashMap, VecDeque};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::time::Instant;

    const SPACING: Duration = Duration::from_millis(500);

    /// Authority answering from per-request queues, recording every call
    #[derive(Default)]
    struct ScriptedAuthority {
        scripts: Mutex<HashMap<RequestId, VecDeque<Result<StatusReport, Error>>>>,
        calls: Mutex<Vec<(RequestId, Instant)>>,
        delay: Duration,
        active: AtomicUsize,
        max_active: AtomicUsize,
    }

    impl ScriptedAuthority {
        fn with_delay(delay: Duration) -> Self {
            Self {
                delay,
                ..Self::default()
            }
        }

        fn push(&self, id: &RequestId, answer: Result<StatusReport, Error>) {
            self.scripts
                .lock()
                .unwrap()
                .entry(id.clone())
                .or_default()
                .push_back(answer);
        }

        fn calls(&self) -> Vec<RequestId> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .map(|(id, _)| id.clone())
                .collect()
        }

        fn call_times(&self) -> Vec<Instant> {
            self.calls.lock().unwrap().iter().map(|(_, at)| *at).collect()
        }

        fn reset_calls(&self) {
            self.calls.lock().unwrap().clear();
        }
    }

    #[async_trait::async_trait]
    impl AuthorityClient for ScriptedAuthority {
        async fn check_status(&self, query: &StatusQuery) -> Result<StatusReport, Error> {
            let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_active.fetch_max(now_active, Ordering::SeqCst);
            self.calls
                .lock()
                .unwrap()
                .push((query.request_id.clone(), Instant::now()));

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.active.fetch_sub(1, Ordering::SeqCst);

            let answer = self
                .scripts
                .lock()
                .unwrap()
                .get_mut(&query.request_id)
                .and_then(VecDeque::pop_front);
            answer.unwrap_or_else(|| Ok(StatusReport::new(LifecycleState::Processing, "queued")))
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn options() -> ManagerOptions {
        ManagerOptions {
            spacing: SPACING,
            status_timeout: Duration::from_secs(30),
        }
    }

    fn manager(authority: &Arc<ScriptedAuthority>) -> Arc<LifecycleManager> {
        Arc::new(LifecycleManager::new(
            Arc::new(MemoryCredentialStore::validated("XAXX010101000")),
            authority.clone(),
            options(),
        ))
    }

    async fn create(manager: &LifecycleManager) -> RequestId {
        manager
            .create_request(
                RequestKind::Issued,
                DocumentFormat::FullDocument,
                ActivityFilter::Active,
                date(2024, 1, 1),
                date(2024, 1, 31),
            )
            .await
            .unwrap()
    }

    fn unavailable() -> Error {
        AuthorityError::Unavailable {
            message: "connection refused".into(),
        }
        .into()
    }

    #[tokio::test]
    async fn test_create_request_is_pending() {
        let authority = Arc::new(ScriptedAuthority::default());
        let manager = manager(&authority);

        let id = create(&manager).await;
        let request = manager.get_request(&id).await.unwrap();

        assert_eq!(request.state(), LifecycleState::Pending);
        assert!(request.packages().is_empty());
        assert!(request.last_checked_at().is_none());
        assert_eq!(request.kind(), RequestKind::Issued);
        assert_eq!(request.format(), DocumentFormat::FullDocument);
        assert!(authority.calls().is_empty());
    }

    #[tokio::test]
    async fn test_not_configured_wins_over_invalid_range() {
        let authority = Arc::new(ScriptedAuthority::default());
        let manager = LifecycleManager::new(
            Arc::new(MemoryCredentialStore::unconfigured()),
            authority,
            options(),
        );

        let err = manager
            .create_request(
                RequestKind::Received,
                DocumentFormat::MetadataOnly,
                ActivityFilter::Any,
                date(2024, 2, 1),
                date(2024, 1, 1),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Request(RequestError::NotConfigured)));
        assert!(manager.list_requests().await.is_empty());
    }

    #[tokio::test]
    async fn test_list_is_most_recent_first() {
        let authority = Arc::new(ScriptedAuthority::default());
        let manager = manager(&authority);

        let first = create(&manager).await;
        let second = create(&manager).await;
        let third = create(&manager).await;

        let ids: Vec<_> = manager
            .list_requests()
            .await
            .into_iter()
            .map(|r| r.request_id().clone())
            .collect();
        assert_eq!(ids, vec![third, second, first]);
    }

    #[tokio::test]
    async fn test_verify_ready_attaches_packages() {
        let authority = Arc::new(ScriptedAuthority::default());
        let manager = manager(&authority);
        let id = create(&manager).await;
        authority.push(&id, Ok(StatusReport::ready("published", ["PKG-1"])));

        let state = manager.verify_request(&id).await.unwrap();
        assert_eq!(state, LifecycleState::Ready);

        let request = manager.get_request(&id).await.unwrap();
        assert_eq!(request.packages(), &[PackageId::new("PKG-1")]);
        assert!(request.last_checked_at().is_some());
        assert_eq!(request.last_message(), Some("published"));
    }

    #[tokio::test]
    async fn test_terminal_verify_makes_no_call() {
        let authority = Arc::new(ScriptedAuthority::default());
        let manager = manager(&authority);
        let id = create(&manager).await;
        authority.push(
            &id,
            Ok(StatusReport::new(LifecycleState::Rejected, "rejected by authority")),
        );
        manager.verify_request(&id).await.unwrap();
        authority.reset_calls();

        let state = manager.verify_request(&id).await.unwrap();
        assert_eq!(state, LifecycleState::Rejected);
        assert!(authority.calls().is_empty());
    }

    #[tokio::test]
    async fn test_ready_verify_is_idempotent() {
        let authority = Arc::new(ScriptedAuthority::default());
        let manager = manager(&authority);
        let id = create(&manager).await;
        authority.push(&id, Ok(StatusReport::ready("published", ["PKG-1", "PKG-2"])));
        manager.verify_request(&id).await.unwrap();
        let before = manager.get_request(&id).await.unwrap();

        for _ in 0..2 {
            assert_eq!(
                manager.verify_request(&id).await.unwrap(),
                LifecycleState::Ready
            );
        }
        assert_eq!(manager.get_request(&id).await.unwrap(), before);
        assert_eq!(authority.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_request_is_not_found() {
        let authority = Arc::new(ScriptedAuthority::default());
        let manager = manager(&authority);

        let err = manager
            .verify_request(&RequestId::new("REQ-missing"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Request(RequestError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_failed_check_keeps_state() {
        let authority = Arc::new(ScriptedAuthority::default());
        let manager = manager(&authority);
        let id = create(&manager).await;
        manager.verify_request(&id).await.unwrap();
        authority.push(&id, Err(unavailable()));

        let err = manager.verify_request(&id).await.unwrap_err();
        assert!(err.is_external_unavailable());

        let request = manager.get_request(&id).await.unwrap();
        assert_eq!(request.state(), LifecycleState::Processing);
        assert!(request.last_message().unwrap().contains("connection refused"));

        let history = manager.history().await;
        assert_eq!(history[0].kind, ActivityKind::Verification);
        assert_eq!(history[0].outcome, ActivityOutcome::Error);
    }

    #[tokio::test]
    async fn test_processing_never_returns_to_pending() {
        let authority = Arc::new(ScriptedAuthority::default());
        let manager = manager(&authority);
        let id = create(&manager).await;

        authority.push(&id, Ok(StatusReport::new(LifecycleState::Processing, "")));
        authority.push(&id, Ok(StatusReport::new(LifecycleState::Pending, "")));
        manager.verify_request(&id).await.unwrap();

        assert_eq!(
            manager.verify_request(&id).await.unwrap(),
            LifecycleState::Processing
        );
    }

    #[tokio::test]
    async fn test_ready_without_packages_is_refused() {
        let authority = Arc::new(ScriptedAuthority::default());
        let manager = manager(&authority);
        let id = create(&manager).await;
        authority.push(&id, Ok(StatusReport::new(LifecycleState::Ready, "done")));

        let err = manager.verify_request(&id).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Authority(AuthorityError::InvalidResponse { .. })
        ));
        let request = manager.get_request(&id).await.unwrap();
        assert_eq!(request.state(), LifecycleState::Pending);
        assert!(request.last_checked_at().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_authority_times_out() {
        let authority = Arc::new(ScriptedAuthority::with_delay(Duration::from_secs(60)));
        let manager = manager(&authority);
        let id = create(&manager).await;

        let err = manager.verify_request(&id).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Authority(AuthorityError::Timeout { seconds: 30 })
        ));
        assert!(err.is_external_unavailable());
        assert_eq!(
            manager.get_request(&id).await.unwrap().state(),
            LifecycleState::Pending
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_verify_of_same_request_is_skipped() {
        let authority = Arc::new(ScriptedAuthority::with_delay(Duration::from_secs(1)));
        let manager = manager(&authority);
        let id = create(&manager).await;

        let (a, b) = tokio::join!(manager.verify_request(&id), manager.verify_request(&id));
        assert_eq!(a.unwrap(), LifecycleState::Processing);
        assert_eq!(b.unwrap(), LifecycleState::Pending);
        assert_eq!(authority.calls().len(), 1);

        // the guard is released once the first verification finishes
        manager.verify_request(&id).await.unwrap();
        assert_eq!(authority.calls().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_verify_all_skips_terminal_in_listing_order() {
        let authority = Arc::new(ScriptedAuthority::default());
        let manager = manager(&authority);

        let oldest = create(&manager).await;
        let ready = create(&manager).await;
        let newest = create(&manager).await;
        authority.push(&ready, Ok(StatusReport::ready("published", ["PKG-1"])));
        manager.verify_request(&ready).await.unwrap();
        let ready_before = manager.get_request(&ready).await.unwrap();
        authority.reset_calls();

        let report = manager.verify_all().await;

        assert_eq!(authority.calls(), vec![newest.clone(), oldest.clone()]);
        assert_eq!(report.checked(), 2);
        assert!(report.is_clean());
        assert_eq!(report.state_of(&newest), Some(LifecycleState::Processing));
        assert_eq!(report.state_of(&ready), None);
        assert_eq!(manager.get_request(&ready).await.unwrap(), ready_before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_verify_all_is_sequential_and_spaced() {
        let delay = Duration::from_millis(200);
        let authority = Arc::new(ScriptedAuthority::with_delay(delay));
        let manager = manager(&authority);
        for _ in 0..4 {
            create(&manager).await;
        }

        manager.verify_all().await;

        assert_eq!(authority.max_active.load(Ordering::SeqCst), 1);
        let times = authority.call_times();
        assert_eq!(times.len(), 4);
        for pair in times.windows(2) {
            assert!(pair[1] - pair[0] >= delay + SPACING);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_verify_all_continues_past_failures() {
        let authority = Arc::new(ScriptedAuthority::default());
        let (tx, mut rx) = satdl_events::channel();
        let manager = LifecycleManager::new(
            Arc::new(MemoryCredentialStore::validated("XAXX010101000")),
            authority.clone(),
            options(),
        )
        .with_event_sender(tx);

        let first = create(&manager).await;
        let failing = create(&manager).await;
        let last = create(&manager).await;
        authority.push(&failing, Err(unavailable()));

        let report = manager.verify_all().await;

        assert_eq!(authority.calls().len(), 3);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].request_id, failing);
        assert!(report.failures[0].external_unavailable);
        assert_eq!(report.state_of(&failing), Some(LifecycleState::Pending));
        assert_eq!(report.state_of(&first), Some(LifecycleState::Processing));
        assert_eq!(report.state_of(&last), Some(LifecycleState::Processing));

        let failed = manager.get_request(&failing).await.unwrap();
        assert_eq!(failed.state(), LifecycleState::Pending);
        assert!(failed.last_message().unwrap().contains("unavailable"));

        let mut summaries = Vec::new();
        while let Ok(message) = rx.try_recv() {
            if let AppEvent::Sweep(SweepEvent::Completed { failed, checked, .. }) = message.event
            {
                summaries.push((checked, failed.len()));
            }
        }
        assert_eq!(summaries, vec![(3, 1)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_failure_reports_actual_state() {
        let authority = Arc::new(ScriptedAuthority::default());
        let manager = manager(&authority);
        let id = create(&manager).await;

        manager.verify_request(&id).await.unwrap();
        authority.push(&id, Err(unavailable()));
        let report = manager.verify_all().await;

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.outcomes.len(), 1);
        assert_eq!(report.state_of(&id), Some(LifecycleState::Processing));
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_verifier_ticks_until_disabled() {
        let period = Duration::from_secs(300);
        let authority = Arc::new(ScriptedAuthority::default());
        let manager = manager(&authority);
        create(&manager).await;

        let mut auto = AutoVerifier::new(manager.clone(), period).unwrap();
        auto.enable();
        assert!(auto.is_enabled());

        tokio::time::sleep(period - Duration::from_secs(1)).await;
        assert!(authority.calls().is_empty());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(authority.calls().len(), 1);

        tokio::time::sleep(period).await;
        assert_eq!(authority.calls().len(), 2);

        auto.disable().await;
        assert!(!auto.is_enabled());
        tokio::time::sleep(period * 3).await;
        assert_eq!(authority.calls().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disable_during_overlong_pass_starts_no_new_pass() {
        // Each pass outlasts the period, so a tick is due when it ends
        let period = Duration::from_secs(1);
        for _ in 0..40 {
            let authority = Arc::new(ScriptedAuthority::with_delay(Duration::from_secs(2)));
            let manager = manager(&authority);
            let id = create(&manager).await;

            let mut auto = AutoVerifier::new(manager.clone(), period).unwrap();
            auto.enable();
            tokio::time::sleep(Duration::from_millis(1500)).await;
            assert_eq!(authority.calls().len(), 1);

            auto.disable().await;
            // The running pass finished before disable returned
            let request = manager.get_request(&id).await.unwrap();
            assert_eq!(request.state(), LifecycleState::Processing);
            assert!(request.last_checked_at().is_some());

            tokio::time::sleep(period * 10).await;
            assert_eq!(authority.calls().len(), 1);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_overrunning_passes_are_not_caught_up() {
        let period = Duration::from_secs(1);
        let delay = Duration::from_millis(2500);
        let authority = Arc::new(ScriptedAuthority::with_delay(delay));
        let manager = manager(&authority);
        create(&manager).await;

        let mut auto = AutoVerifier::new(manager.clone(), period).unwrap();
        auto.enable();
        // Passes start at 1s, 3.5s, 6s and 8.5s
        tokio::time::sleep(Duration::from_millis(9000)).await;
        auto.disable().await;

        let times = authority.call_times();
        assert_eq!(times.len(), 4);
        for pair in times.windows(2) {
            let gap = pair[1] - pair[0];
            assert!(gap >= delay, "passes overlapped: {gap:?}");
            assert!(gap < delay + Duration::from_millis(100), "extra wait: {gap:?}");
        }
        assert_eq!(authority.max_active.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_zero_period_is_rejected() {
        let authority = Arc::new(ScriptedAuthority::default());
        assert!(AutoVerifier::new(manager(&authority), Duration::ZERO).is_err());
    }

    #[tokio::test]
    async fn test_download_ready_package() {
        let authority = Arc::new(ScriptedAuthority::default());
        let manager = manager(&authority);
        let id = create(&manager).await;
        let pending = create(&manager).await;
        authority.push(&id, Ok(StatusReport::ready("published", ["PKG-1"])));
        manager.verify_request(&id).await.unwrap();

        let source = tempfile::tempdir().unwrap();
        let downloads = tempfile::tempdir().unwrap();
        std::fs::write(source.path().join("PKG-1.zip"), b"package bytes").unwrap();
        let downloader = Downloader::new(
            Arc::new(DirectoryTransfer::new(source.path())),
            downloads.path(),
        );

        let package = downloader
            .download(&manager, &id, &PackageId::new("PKG-1"))
            .await
            .unwrap();
        assert_eq!(package.file_name, format!("PKG-1_{id}.zip"));
        assert_eq!(package.size, 13);
        assert_eq!(std::fs::read(&package.path).unwrap(), b"package bytes");

        let err = downloader
            .download(&manager, &id, &PackageId::new("PKG-9"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Request(RequestError::PackageNotFound { .. })
        ));

        let err = downloader.download_all(&manager, &pending).await.unwrap_err();
        assert!(matches!(err, Error::Request(RequestError::NotReady { .. })));

        let stats = manager.stats().await;
        assert_eq!(stats.total_requests, 2);
        assert_eq!(stats.active_requests, 1);
        assert_eq!(stats.ready_requests, 1);
        assert_eq!(stats.packages_downloaded, 1);
        assert_eq!(stats.recent_errors, 0);
        assert_eq!(stats.success_rate, Some(100.0));

        let by_package = manager
            .history_filtered(&HistoryFilter {
                search: Some("pkg-1".into()),
                ..HistoryFilter::default()
            })
            .await;
        assert_eq!(by_package.len(), 1);
        assert_eq!(by_package[0].kind, ActivityKind::Download);
        assert_eq!(by_package[0].package_id, Some(PackageId::new("PKG-1")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_history_filters_and_success_rate() {
        let authority = Arc::new(ScriptedAuthority::default());
        let manager = manager(&authority);
        let ok = create(&manager).await;
        let failing = create(&manager).await;
        authority.push(&failing, Err(unavailable()));
        manager.verify_request(&ok).await.unwrap();
        manager.verify_request(&failing).await.unwrap_err();

        // Two creations succeed, one verification is informational, one fails
        let stats = manager.stats().await;
        assert_eq!(stats.success_rate, Some(50.0));
        assert_eq!(stats.recent_errors, 1);

        let errors = manager
            .history_filtered(&HistoryFilter {
                outcome: Some(ActivityOutcome::Error),
                ..HistoryFilter::default()
            })
            .await;
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].request_id.as_ref(), Some(&failing));

        let verifications = manager
            .history_filtered(&HistoryFilter {
                kind: Some(ActivityKind::Verification),
                ..HistoryFilter::default()
            })
            .await;
        assert_eq!(verifications.len(), 2);
        // Most recent first
        assert_eq!(verifications[0].request_id.as_ref(), Some(&failing));

        let for_request = manager
            .history_filtered(&HistoryFilter {
                search: Some(ok.as_str().to_lowercase()),
                ..HistoryFilter::default()
            })
            .await;
        assert_eq!(for_request.len(), 2);

        let today = chrono::Utc::now().date_naive();
        let tomorrow = today.succ_opt().unwrap();
        let none_yet = manager
            .history_filtered(&HistoryFilter {
                since: Some(tomorrow),
                ..HistoryFilter::default()
            })
            .await;
        assert!(none_yet.is_empty());
        let all_today = manager
            .history_filtered(&HistoryFilter {
                since: Some(today),
                until: Some(today),
                ..HistoryFilter::default()
            })
            .await;
        assert_eq!(all_today.len(), 4);
    }

    #[tokio::test]
    async fn test_ledger_round_trip_restores_requests() {
        let authority = Arc::new(ScriptedAuthority::default());
        let manager = manager(&authority);
        let id = create(&manager).await;
        authority.push(&id, Ok(StatusReport::ready("published", ["PKG-1"])));
        manager.verify_request(&id).await.unwrap();
        create(&manager).await;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("requests.json");
        manager.snapshot().await.save(&path).await.unwrap();

        let ledger = RequestLedger::load(&path).await.unwrap();
        let restored = LifecycleManager::restore(
            Arc::new(MemoryCredentialStore::validated("XAXX010101000")),
            authority.clone(),
            options(),
            ledger,
        )
        .unwrap();

        assert_eq!(restored.list_requests().await, manager.list_requests().await);
        assert_eq!(restored.history().await, manager.history().await);
    }

    #[tokio::test]
    async fn test_missing_ledger_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = RequestLedger::load(&dir.path().join("absent.json"))
            .await
            .unwrap();
        assert!(ledger.requests.is_empty());
        assert!(ledger.validate().is_ok());
    }

    #[tokio::test]
    async fn test_ledger_with_broken_invariant_is_corrupted() {
        let authority = Arc::new(ScriptedAuthority::default());
        let manager = manager(&authority);
        create(&manager).await;

        let mut value = serde_json::to_value(manager.snapshot().await).unwrap();
        value["requests"][0]["state"] = serde_json::json!("ready");

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("requests.json");
        std::fs::write(&path, serde_json::to_string(&value).unwrap()).unwrap();

        let ledger = RequestLedger::load(&path).await.unwrap();
        let err = LifecycleManager::restore(
            Arc::new(MemoryCredentialStore::unconfigured()),
            authority,
            options(),
            ledger,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Storage(StorageError::Corrupted { .. })));
    }

    #[tokio::test]
    async fn test_fixture_authority_drives_manager() {
        let id = RequestId::new("REQ-fixture");
        let mut fixture = FixtureAuthority::new();
        fixture.insert(FixtureResponse {
            request_id: id.clone(),
            state: LifecycleState::CompletedEmpty,
            message: "no documents in period".into(),
            packages: Vec::new(),
            unavailable: false,
        });

        let report = fixture
            .check_status(&StatusQuery {
                request_id: id,
                kind: RequestKind::Received,
                format: DocumentFormat::MetadataOnly,
                period_start: date(2024, 5, 1),
                period_end: date(2024, 5, 31),
            })
            .await
            .unwrap();
        assert_eq!(report.state, LifecycleState::CompletedEmpty);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn any_state() -> impl Strategy<Value = LifecycleState> {
            prop::sample::select(LifecycleState::ALL.to_vec())
        }

        fn any_report() -> impl Strategy<Value = StatusReport> {
            (any_state(), prop::collection::vec("PKG-[0-9]{1,3}", 0..3)).prop_map(
                |(state, packages)| StatusReport {
                    state,
                    message: String::new(),
                    packages: packages.into_iter().map(PackageId::new).collect(),
                },
            )
        }

        fn runtime() -> tokio::runtime::Runtime {
            tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap()
        }

        proptest! {
            #[test]
            fn packages_present_iff_ready(reports in prop::collection::vec(any_report(), 1..8)) {
                runtime().block_on(async {
                    let authority = Arc::new(ScriptedAuthority::default());
                    let manager = manager(&authority);
                    let id = create(&manager).await;
                    for report in &reports {
                        authority.push(&id, Ok(report.clone()));
                    }

                    let mut seen_terminal = None;
                    for _ in &reports {
                        let _ = manager.verify_request(&id).await;
                        let request = manager.get_request(&id).await.unwrap();
                        assert_eq!(
                            request.state() == LifecycleState::Ready,
                            !request.packages().is_empty()
                        );
                        assert!(request.last_checked_at().is_some() || request.state().is_terminal());
                        if let Some(terminal) = seen_terminal {
                            assert_eq!(request.state(), terminal);
                        } else if request.state().is_terminal() {
                            seen_terminal = Some(request.state());
                        }
                    }
                });
            }

            #[test]
            fn start_after_end_is_invalid_range(start in 0i64..20_000, gap in 1i64..400) {
                runtime().block_on(async {
                    let authority = Arc::new(ScriptedAuthority::default());
                    let manager = manager(&authority);
                    let base = date(1990, 1, 1);
                    let end = base + chrono::Duration::days(start);
                    let begin = end + chrono::Duration::days(gap);

                    let err = manager
                        .create_request(
                            RequestKind::Received,
                            DocumentFormat::FullDocument,
                            ActivityFilter::Cancelled,
                            begin,
                            end,
                        )
                        .await
                        .unwrap_err();
                    assert!(matches!(err, Error::Request(RequestError::InvalidRange { .. })));
                    assert!(manager.list_requests().await.is_empty());
                });
            }

            #[test]
            fn valid_period_creates_pending(start in 0i64..20_000, len in 0i64..400) {
                runtime().block_on(async {
                    let authority = Arc::new(ScriptedAuthority::default());
                    let manager = manager(&authority);
                    let begin = date(1990, 1, 1) + chrono::Duration::days(start);
                    let end = begin + chrono::Duration::days(len);

                    let id = manager
                        .create_request(
                            RequestKind::Issued,
                            DocumentFormat::MetadataOnly,
                            ActivityFilter::Any,
                            begin,
                            end,
                        )
                        .await
                        .unwrap();
                    let request = manager.get_request(&id).await.unwrap();
                    assert_eq!(request.state(), LifecycleState::Pending);
                    assert!(request.packages().is_empty());
                });
            }
        }
    }
}

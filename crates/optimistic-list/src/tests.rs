//! Synchronizer Integration Tests
//!
//! Runs the synchronizer against an in-memory fake remote. Requests can be
//! held open so tests can observe the optimistic state, release responses
//! out of order, or tear down mid-flight.

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use futures::channel::oneshot;
    use futures::poll;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use crate::{
        CollectionClient, ListState, Outcome, RecordId, SyncError, SyncResult, Synchronizer, User,
    };

    /// In-memory remote collection with switchable failure and held responses
    #[derive(Default)]
    struct FakeRemote {
        users: RefCell<Vec<User>>,
        next_id: Cell<RecordId>,
        failure: RefCell<Option<SyncError>>,
        hold: Cell<bool>,
        held: RefCell<Vec<oneshot::Sender<()>>>,
        patches: RefCell<Vec<(RecordId, User)>>,
    }

    impl FakeRemote {
        fn with_users(users: &[(RecordId, &str)]) -> Rc<Self> {
            let remote = FakeRemote::default();
            *remote.users.borrow_mut() = users.iter().map(|(id, name)| User::new(*id, *name)).collect();
            remote
                .next_id
                .set(users.iter().map(|(id, _)| *id).max().unwrap_or(0) + 1);
            Rc::new(remote)
        }

        fn fail_with(&self, err: SyncError) {
            *self.failure.borrow_mut() = Some(err);
        }

        fn hold_responses(&self) {
            self.hold.set(true);
        }

        /// Let the `index`-th held request (in issue order) answer
        fn release(&self, index: usize) {
            let sender = self.held.borrow_mut().remove(index);
            let _ = sender.send(());
        }

        fn held_count(&self) -> usize {
            self.held.borrow().len()
        }

        fn remote_users(&self) -> Vec<User> {
            self.users.borrow().clone()
        }

        /// Park until released, then report the configured failure if any
        async fn gate(&self) -> SyncResult<()> {
            if self.hold.get() {
                let (tx, rx) = oneshot::channel();
                self.held.borrow_mut().push(tx);
                let _ = rx.await;
            }
            match self.failure.borrow().clone() {
                Some(err) => Err(err),
                None => Ok(()),
            }
        }
    }

    #[async_trait(?Send)]
    impl CollectionClient<User> for FakeRemote {
        async fn fetch_all(&self) -> SyncResult<Vec<User>> {
            self.gate().await?;
            Ok(self.remote_users())
        }

        async fn create(&self, record: &User) -> SyncResult<User> {
            self.gate().await?;
            let id = self.next_id.get();
            self.next_id.set(id + 1);
            let saved = User::new(id, record.name.clone());
            self.users.borrow_mut().push(saved.clone());
            Ok(saved)
        }

        async fn update(&self, id: RecordId, record: &User) -> SyncResult<()> {
            self.gate().await?;
            self.patches.borrow_mut().push((id, record.clone()));
            Ok(())
        }

        async fn delete(&self, id: RecordId) -> SyncResult<()> {
            self.gate().await?;
            self.users.borrow_mut().retain(|user| user.id != id);
            Ok(())
        }
    }

    type TestSync = Synchronizer<User, Rc<FakeRemote>>;

    fn users(list: &[(RecordId, &str)]) -> Vec<User> {
        list.iter().map(|(id, name)| User::new(*id, *name)).collect()
    }

    fn sync_over(remote: &Rc<FakeRemote>) -> TestSync {
        Synchronizer::new(Rc::clone(remote))
    }

    async fn loaded(list: &[(RecordId, &str)]) -> (TestSync, Rc<FakeRemote>) {
        let remote = FakeRemote::with_users(list);
        let sync = sync_over(&remote);
        assert_eq!(sync.load().await, Outcome::Confirmed);
        (sync, remote)
    }

    fn exclaim(user: &User) -> User {
        User::new(user.id, format!("{}!", user.name))
    }

    // ========================
    // load
    // ========================

    #[tokio::test]
    async fn test_initial_load() {
        let (sync, _) = loaded(&[(1, "A"), (2, "B")]).await;

        assert_eq!(sync.records(), users(&[(1, "A"), (2, "B")]));
        assert_eq!(sync.last_error(), None);
        assert!(!sync.is_loading());
        assert!(!sync.has_load_in_flight());
    }

    #[tokio::test]
    async fn test_load_failure_sets_error_and_leaves_list_empty() {
        let remote = FakeRemote::with_users(&[(1, "A")]);
        remote.fail_with(SyncError::Network("Network Error".into()));
        let sync = sync_over(&remote);

        let outcome = sync.load().await;

        assert_eq!(outcome, Outcome::Failed(SyncError::Network("Network Error".into())));
        assert!(sync.records().is_empty());
        assert_eq!(sync.last_error().as_deref(), Some("Network Error"));
        assert!(!sync.is_loading());
    }

    #[tokio::test]
    async fn test_teardown_mid_load_is_silent() {
        let remote = FakeRemote::with_users(&[(1, "A")]);
        remote.hold_responses();
        let sync = sync_over(&remote);

        let mut load = sync.load();
        assert!(poll!(&mut load).is_pending());
        assert!(sync.is_loading());
        assert!(sync.has_load_in_flight());

        sync.teardown();
        remote.release(0);

        assert_eq!(load.await, Outcome::Cancelled);
        assert!(sync.records().is_empty());
        assert_eq!(sync.last_error(), None);
        assert!(!sync.has_load_in_flight());
    }

    #[tokio::test]
    async fn test_cancelled_client_error_is_silent() {
        let remote = FakeRemote::with_users(&[(1, "A")]);
        remote.fail_with(SyncError::Cancelled);
        let sync = sync_over(&remote);

        assert_eq!(sync.load().await, Outcome::Cancelled);
        assert_eq!(sync.last_error(), None);
        assert!(sync.records().is_empty());
    }

    #[tokio::test]
    async fn test_new_load_aborts_previous_one() {
        let remote = FakeRemote::with_users(&[(1, "A")]);
        remote.hold_responses();
        let sync = sync_over(&remote);

        let mut first = sync.load();
        assert!(poll!(&mut first).is_pending());

        let mut second = sync.load();
        assert!(poll!(&mut second).is_pending());
        assert_eq!(first.await, Outcome::Cancelled);
        assert!(sync.has_load_in_flight());

        remote.release(1);
        assert_eq!(second.await, Outcome::Confirmed);
        assert_eq!(sync.records(), users(&[(1, "A")]));
        assert!(!sync.has_load_in_flight());
    }

    // ========================
    // add
    // ========================

    #[tokio::test]
    async fn test_add_prepends_then_confirms() {
        let (sync, remote) = loaded(&[(1, "A")]).await;
        remote.hold_responses();
        remote.next_id.set(3);

        let mut add = sync.add(User::draft("C"));
        assert_eq!(sync.records(), users(&[(0, "C"), (1, "A")]));
        assert!(sync.state().entries()[0].is_pending());

        assert!(poll!(&mut add).is_pending());
        remote.release(0);
        assert_eq!(add.await, Outcome::Confirmed);

        assert_eq!(sync.records(), users(&[(3, "C"), (1, "A")]));
        assert!(!sync.state().entries()[0].is_pending());
        assert_eq!(sync.pending_mutations(), 0);
    }

    #[tokio::test]
    async fn test_add_failure_restores_previous_list() {
        let (sync, remote) = loaded(&[(1, "A"), (2, "B")]).await;
        remote.fail_with(SyncError::status(500));
        let before = sync.records();

        let outcome = sync.add(User::draft("C")).await;

        assert_eq!(outcome, Outcome::RolledBack(SyncError::status(500)));
        assert_eq!(sync.records(), before);
        assert_eq!(
            sync.last_error().as_deref(),
            Some("Request failed with status code 500")
        );
    }

    #[tokio::test]
    async fn test_concurrent_adds_confirm_by_correlation() {
        let (sync, remote) = loaded(&[(1, "A")]).await;
        remote.hold_responses();

        let mut first = sync.add(User::draft("X"));
        let mut second = sync.add(User::draft("Y"));
        assert!(poll!(&mut first).is_pending());
        assert!(poll!(&mut second).is_pending());
        assert_eq!(sync.records(), users(&[(0, "Y"), (0, "X"), (1, "A")]));

        // Second response arrives first
        remote.release(1);
        assert_eq!(second.await, Outcome::Confirmed);
        assert_eq!(sync.records(), users(&[(2, "Y"), (0, "X"), (1, "A")]));

        remote.release(0);
        assert_eq!(first.await, Outcome::Confirmed);
        assert_eq!(sync.records(), users(&[(2, "Y"), (3, "X"), (1, "A")]));
    }

    #[tokio::test]
    async fn test_add_confirmation_after_reload_is_dropped() {
        let (sync, remote) = loaded(&[(1, "A")]).await;
        remote.hold_responses();

        let mut add = sync.add(User::draft("Z"));
        assert!(poll!(&mut add).is_pending());
        let mut reload = sync.load();
        assert!(poll!(&mut reload).is_pending());

        // The fetch answers before the create lands
        remote.release(1);
        assert_eq!(reload.await, Outcome::Confirmed);
        assert_eq!(sync.records(), users(&[(1, "A")]));

        remote.release(0);
        assert_eq!(add.await, Outcome::Confirmed);
        assert_eq!(sync.records(), users(&[(1, "A")]));
    }

    #[tokio::test]
    async fn test_remove_of_unsaved_record_is_refused() {
        let (sync, remote) = loaded(&[(1, "A")]).await;
        remote.hold_responses();

        let mut x = sync.add(User::draft("X"));
        let mut y = sync.add(User::draft("Y"));
        assert!(poll!(&mut x).is_pending());
        assert!(poll!(&mut y).is_pending());

        let outcome = sync.remove(&User::draft("Y")).await;

        assert_eq!(outcome, Outcome::Failed(SyncError::Unsaved));
        assert_eq!(sync.records(), users(&[(0, "Y"), (0, "X"), (1, "A")]));
        assert_eq!(remote.held_count(), 2);
        assert_eq!(sync.last_error(), None);

        remote.release(0);
        remote.release(0);
        assert_eq!(x.await, Outcome::Confirmed);
        assert_eq!(y.await, Outcome::Confirmed);
        assert_eq!(sync.records(), users(&[(3, "Y"), (2, "X"), (1, "A")]));
        assert_eq!(remote.remote_users(), users(&[(1, "A"), (2, "X"), (3, "Y")]));
    }

    // ========================
    // update
    // ========================

    #[tokio::test]
    async fn test_update_sends_updated_record() {
        let (sync, remote) = loaded(&[(1, "A"), (2, "B"), (3, "C")]).await;

        let outcome = sync.update(&User::new(2, "B"), exclaim).await;

        assert_eq!(outcome, Outcome::Confirmed);
        assert_eq!(sync.records(), users(&[(1, "A"), (2, "B!"), (3, "C")]));
        assert_eq!(remote.patches.borrow().clone(), vec![(2, User::new(2, "B!"))]);
    }

    #[tokio::test]
    async fn test_update_is_applied_before_response() {
        let (sync, remote) = loaded(&[(1, "A"), (2, "B")]).await;
        remote.hold_responses();

        let mut update = sync.update(&User::new(1, "A"), exclaim);
        assert_eq!(sync.records(), users(&[(1, "A!"), (2, "B")]));

        assert!(poll!(&mut update).is_pending());
        remote.release(0);
        assert_eq!(update.await, Outcome::Confirmed);
        assert_eq!(sync.records(), users(&[(1, "A!"), (2, "B")]));
    }

    #[tokio::test]
    async fn test_update_failure_rolls_back() {
        let (sync, remote) = loaded(&[(1, "A"), (2, "B")]).await;
        remote.fail_with(SyncError::status(404));

        let outcome = sync.update(&User::new(2, "B"), exclaim).await;

        assert!(matches!(outcome, Outcome::RolledBack(_)));
        assert_eq!(sync.records(), users(&[(1, "A"), (2, "B")]));
        assert!(sync.last_error().is_some());
    }

    #[tokio::test]
    async fn test_update_never_reorders_or_resizes() {
        let (sync, _) = loaded(&[(5, "E"), (1, "A"), (9, "I"), (3, "C")]).await;

        for user in sync.records() {
            let before = sync.records();
            sync.update(&user, exclaim).await;
            let after = sync.records();

            assert_eq!(after.len(), before.len());
            let ids: Vec<_> = after.iter().map(|u| u.id).collect();
            assert_eq!(ids, vec![5, 1, 9, 3]);
        }
    }

    #[tokio::test]
    async fn test_update_of_unsaved_record_is_refused() {
        let (sync, remote) = loaded(&[(1, "A")]).await;
        remote.hold_responses();

        let mut add = sync.add(User::draft("X"));
        assert!(poll!(&mut add).is_pending());

        let outcome = sync.update(&User::draft("X"), exclaim).await;

        assert_eq!(outcome, Outcome::Failed(SyncError::Unsaved));
        assert_eq!(sync.records(), users(&[(0, "X"), (1, "A")]));
        assert!(remote.patches.borrow().is_empty());
        assert_eq!(remote.held_count(), 1);
    }

    #[tokio::test]
    async fn test_same_record_updates_last_response_wins() {
        let (sync, remote) = loaded(&[(1, "A"), (2, "B")]).await;
        remote.hold_responses();

        let mut first = sync.update(&User::new(1, "A"), exclaim);
        let mut second = sync.update(&User::new(1, "A!"), exclaim);
        assert!(poll!(&mut first).is_pending());
        assert!(poll!(&mut second).is_pending());
        assert_eq!(sync.records(), users(&[(1, "A!!"), (2, "B")]));

        // Issued last, answered first
        remote.release(1);
        assert_eq!(second.await, Outcome::Confirmed);
        assert_eq!(sync.records(), users(&[(1, "A!!"), (2, "B")]));

        // The older request fails last and restores the list it saw
        remote.fail_with(SyncError::status(500));
        remote.release(0);
        assert_eq!(first.await, Outcome::RolledBack(SyncError::status(500)));

        assert_eq!(sync.records(), users(&[(1, "A"), (2, "B")]));
        assert_eq!(
            sync.last_error().as_deref(),
            Some("Request failed with status code 500")
        );
        assert_eq!(remote.patches.borrow().clone(), vec![(1, User::new(1, "A!!"))]);
    }

    #[tokio::test]
    async fn test_same_record_updates_in_issue_order() {
        let (sync, remote) = loaded(&[(1, "A")]).await;
        remote.hold_responses();

        let mut first = sync.update(&User::new(1, "A"), exclaim);
        let mut second = sync.update(&User::new(1, "A!"), exclaim);
        assert!(poll!(&mut first).is_pending());
        assert!(poll!(&mut second).is_pending());

        remote.release(0);
        assert_eq!(first.await, Outcome::Confirmed);

        // A late failure rolls back to the state before its own call
        remote.fail_with(SyncError::status(500));
        remote.release(0);
        assert!(matches!(second.await, Outcome::RolledBack(_)));
        assert_eq!(sync.records(), users(&[(1, "A!")]));
    }

    // ========================
    // remove
    // ========================

    #[tokio::test]
    async fn test_remove_deletes_locally_and_remotely() {
        let (sync, remote) = loaded(&[(1, "A"), (2, "B")]).await;

        let outcome = sync.remove(&User::new(1, "A")).await;

        assert_eq!(outcome, Outcome::Confirmed);
        assert_eq!(sync.records(), users(&[(2, "B")]));
        assert_eq!(remote.remote_users(), users(&[(2, "B")]));
    }

    #[tokio::test]
    async fn test_remove_failure_reverts() {
        let (sync, remote) = loaded(&[(1, "A"), (2, "B")]).await;
        remote.hold_responses();
        remote.fail_with(SyncError::Network("Network Error".into()));

        let mut remove = sync.remove(&User::new(1, "A"));
        assert_eq!(sync.records(), users(&[(2, "B")]));

        assert!(poll!(&mut remove).is_pending());
        remote.release(0);
        assert!(matches!(remove.await, Outcome::RolledBack(_)));

        assert_eq!(sync.records(), users(&[(1, "A"), (2, "B")]));
        assert_eq!(sync.last_error().as_deref(), Some("Network Error"));
    }

    #[tokio::test]
    async fn test_error_slot_keeps_last_failure() {
        let (sync, remote) = loaded(&[(1, "A"), (2, "B")]).await;

        remote.fail_with(SyncError::status(500));
        sync.remove(&User::new(1, "A")).await;
        remote.fail_with(SyncError::status(404));
        sync.remove(&User::new(2, "B")).await;
        assert_eq!(
            sync.last_error().as_deref(),
            Some("Request failed with status code 404")
        );

        // Success does not clear the slot
        *remote.failure.borrow_mut() = None;
        sync.remove(&User::new(2, "B")).await;
        assert_eq!(
            sync.last_error().as_deref(),
            Some("Request failed with status code 404")
        );
    }

    // ========================
    // teardown
    // ========================

    #[tokio::test]
    async fn test_late_responses_after_teardown_are_ignored() {
        let (sync, remote) = loaded(&[(1, "A"), (2, "B")]).await;
        remote.hold_responses();
        remote.fail_with(SyncError::status(500));

        let mut add = sync.add(User::draft("C"));
        let mut remove = sync.remove(&User::new(2, "B"));
        assert!(poll!(&mut add).is_pending());
        assert!(poll!(&mut remove).is_pending());
        assert_eq!(sync.pending_mutations(), 2);
        let optimistic = sync.records();

        sync.teardown();
        remote.release(0);
        remote.release(0);

        assert_eq!(add.await, Outcome::Cancelled);
        assert_eq!(remove.await, Outcome::Cancelled);
        assert_eq!(sync.records(), optimistic);
        assert_eq!(sync.last_error(), None);
        assert_eq!(sync.pending_mutations(), 0);
    }

    #[tokio::test]
    async fn test_calls_after_teardown_do_nothing() {
        let (sync, remote) = loaded(&[(1, "A")]).await;
        sync.teardown();

        assert_eq!(sync.add(User::draft("B")).await, Outcome::Cancelled);
        assert_eq!(sync.remove(&User::new(1, "A")).await, Outcome::Cancelled);
        assert_eq!(sync.load().await, Outcome::Cancelled);
        assert_eq!(sync.records(), users(&[(1, "A")]));
        assert_eq!(remote.remote_users(), users(&[(1, "A")]));
        assert_eq!(remote.held_count(), 0);
    }

    // ========================
    // subscribe
    // ========================

    #[tokio::test]
    async fn test_listeners_see_every_change() {
        let remote = FakeRemote::with_users(&[(1, "A")]);
        let sync = sync_over(&remote);
        let seen: Rc<RefCell<Vec<ListState<User>>>> = Rc::default();
        {
            let seen = Rc::clone(&seen);
            sync.subscribe(move |state| seen.borrow_mut().push(state.clone()));
        }

        sync.load().await;
        sync.add(User::draft("B")).await;

        let seen = seen.borrow();
        let sizes: Vec<_> = seen.iter().map(ListState::len).collect();
        let loading: Vec<_> = seen.iter().map(ListState::is_loading).collect();
        // subscribe, loading on, loaded, placeholder, confirmed
        assert_eq!(sizes, vec![0, 0, 1, 2, 2]);
        assert_eq!(loading, vec![false, true, false, false, false]);
        assert_eq!(seen.last().unwrap().records(), users(&[(2, "B"), (1, "A")]));
    }
}

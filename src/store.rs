//! Client-side users store.
//!
//! Holds the accumulated list of users, the user shown on the detail screen,
//! the pagination cursor and the loading/error status. State only changes
//! through [`UsersStore::resolve`] (and the two cursor setters), which is
//! what lets an event loop run network calls elsewhere and apply their
//! outcomes one at a time, in the order they complete.
//!
//! List pages accumulate: every successful list fetch appends its results to
//! [`UsersStore::users`] instead of replacing them.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::api::{NewOrUpdateUser, User, UsersApi, UsersPage};
use crate::error::ApiError;

pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// The five asynchronous store operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationKind {
    FetchUsers,
    FetchUserById,
    CreateUser,
    UpdateUser,
    DeleteUser,
}

impl OperationKind {
    /// Tracked operations drive `loading` and write failures into `error`.
    /// Create/update/delete report failures to their caller only.
    pub fn is_tracked(self) -> bool {
        matches!(self, OperationKind::FetchUsers | OperationKind::FetchUserById)
    }

    pub fn label(self) -> &'static str {
        match self {
            OperationKind::FetchUsers => "fetch users",
            OperationKind::FetchUserById => "fetch user",
            OperationKind::CreateUser => "create user",
            OperationKind::UpdateUser => "update user",
            OperationKind::DeleteUser => "delete user",
        }
    }
}

/// Lifecycle of one operation kind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OperationStatus {
    #[default]
    Idle,
    Pending,
    Succeeded,
    Failed,
}

#[derive(Clone, Copy, Debug, Default)]
struct OperationState {
    in_flight: usize,
    last: OperationStatus,
}

/// A store operation with its arguments.
#[derive(Clone, Debug, PartialEq)]
pub enum Request {
    FetchUsers { page: u32, page_size: u32 },
    FetchUserById { id: String },
    CreateUser { payload: NewOrUpdateUser },
    UpdateUser { id: String, payload: NewOrUpdateUser },
    DeleteUser { id: String },
}

impl Request {
    pub fn kind(&self) -> OperationKind {
        match self {
            Request::FetchUsers { .. } => OperationKind::FetchUsers,
            Request::FetchUserById { .. } => OperationKind::FetchUserById,
            Request::CreateUser { .. } => OperationKind::CreateUser,
            Request::UpdateUser { .. } => OperationKind::UpdateUser,
            Request::DeleteUser { .. } => OperationKind::DeleteUser,
        }
    }

    /// Perform the network call. Touches no store state.
    pub async fn send<A: UsersApi + ?Sized>(self, api: &A) -> Result<Response, ApiError> {
        match self {
            Request::FetchUsers { page, page_size } => {
                api.list_users(page, page_size).await.map(Response::Page)
            }
            Request::FetchUserById { id } => api.get_user(&id).await.map(Response::Fetched),
            Request::CreateUser { payload } => {
                api.create_user(&payload).await.map(Response::Created)
            }
            Request::UpdateUser { id, payload } => {
                api.update_user(&id, &payload).await.map(Response::Updated)
            }
            Request::DeleteUser { id } => {
                api.delete_user(&id).await?;
                Ok(Response::Deleted { id })
            }
        }
    }
}

/// Successful result of a [`Request`].
#[derive(Clone, Debug, PartialEq)]
pub enum Response {
    Page(UsersPage),
    Fetched(User),
    Created(User),
    Updated(User),
    /// Carries the id the caller asked to delete; the server body is ignored.
    Deleted { id: String },
}

#[derive(Clone, Debug)]
pub struct UsersStore {
    users: Vec<User>,
    user: Option<User>,
    loading: bool,
    error: Option<String>,
    page: u32,
    page_size: u32,
    total_pages: u32,
    total_users: u64,
    operations: HashMap<OperationKind, OperationState>,
}

impl Default for UsersStore {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl UsersStore {
    /// Empty store with the cursor on page 1.
    pub fn new(page_size: u32) -> Self {
        Self {
            users: Vec::new(),
            user: None,
            loading: false,
            error: None,
            page: 1,
            page_size,
            total_pages: 0,
            total_users: 0,
            operations: HashMap::new(),
        }
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    /// User loaded by the last successful detail fetch.
    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn total_users(&self) -> u64 {
        self.total_users
    }

    /// Current status of an operation kind. `Pending` while any call of
    /// that kind is in flight, else the outcome of the last one.
    pub fn status(&self, kind: OperationKind) -> OperationStatus {
        match self.operations.get(&kind) {
            Some(state) if state.in_flight > 0 => OperationStatus::Pending,
            Some(state) => state.last,
            None => OperationStatus::Idle,
        }
    }

    /// Move the cursor. Does not fetch.
    pub fn set_page(&mut self, page: u32) {
        self.page = page;
    }

    /// Change the page size. Does not fetch.
    pub fn set_page_size(&mut self, page_size: u32) {
        self.page_size = page_size;
    }

    /// Page to request when the list view reaches its end, if any.
    pub fn next_page(&self) -> Option<u32> {
        if !self.loading && self.page < self.total_pages {
            Some(self.page + 1)
        } else {
            None
        }
    }

    /// Mark an operation as started.
    pub fn begin(&mut self, kind: OperationKind) {
        let state = self.operations.entry(kind).or_default();
        state.in_flight += 1;
        if kind.is_tracked() {
            self.loading = true;
        }
        debug!(op = kind.label(), "operation started");
    }

    /// Apply the outcome of an operation started with [`begin`](Self::begin).
    ///
    /// On failure the error is handed back; tracked operations also record
    /// its message in [`error`](Self::error).
    pub fn resolve(
        &mut self,
        kind: OperationKind,
        outcome: Result<Response, ApiError>,
    ) -> Result<(), ApiError> {
        let succeeded = outcome.is_ok();
        self.finish(kind, Some(succeeded));
        match outcome {
            Ok(response) => {
                self.apply(response);
                self.error = None;
                info!(op = kind.label(), users = self.users.len(), "operation succeeded");
                Ok(())
            }
            Err(err) => {
                let message = err.user_message();
                warn!(op = kind.label(), error = %message, "operation failed");
                if kind.is_tracked() {
                    self.error = Some(message);
                }
                Err(err)
            }
        }
    }

    /// Forget an in-flight operation whose outcome will never arrive.
    pub fn abandon(&mut self, kind: OperationKind) {
        self.finish(kind, None);
        debug!(op = kind.label(), "operation abandoned");
    }

    /// Run a request end to end against `api`.
    pub async fn run<A: UsersApi + ?Sized>(
        &mut self,
        api: &A,
        request: Request,
    ) -> Result<(), ApiError> {
        let kind = request.kind();
        self.begin(kind);
        let outcome = request.send(api).await;
        self.resolve(kind, outcome)
    }

    pub async fn fetch_users<A: UsersApi + ?Sized>(
        &mut self,
        api: &A,
        page: u32,
        page_size: u32,
    ) -> Result<(), ApiError> {
        self.run(api, Request::FetchUsers { page, page_size }).await
    }

    pub async fn fetch_user_by_id<A: UsersApi + ?Sized>(
        &mut self,
        api: &A,
        id: &str,
    ) -> Result<(), ApiError> {
        self.run(api, Request::FetchUserById { id: id.to_string() })
            .await
    }

    pub async fn create_user<A: UsersApi + ?Sized>(
        &mut self,
        api: &A,
        payload: NewOrUpdateUser,
    ) -> Result<(), ApiError> {
        self.run(api, Request::CreateUser { payload }).await
    }

    pub async fn update_user<A: UsersApi + ?Sized>(
        &mut self,
        api: &A,
        id: &str,
        payload: NewOrUpdateUser,
    ) -> Result<(), ApiError> {
        self.run(
            api,
            Request::UpdateUser {
                id: id.to_string(),
                payload,
            },
        )
        .await
    }

    pub async fn delete_user<A: UsersApi + ?Sized>(
        &mut self,
        api: &A,
        id: &str,
    ) -> Result<(), ApiError> {
        self.run(api, Request::DeleteUser { id: id.to_string() })
            .await
    }

    fn finish(&mut self, kind: OperationKind, succeeded: Option<bool>) {
        let state = self.operations.entry(kind).or_default();
        state.in_flight = state.in_flight.saturating_sub(1);
        match succeeded {
            Some(true) => state.last = OperationStatus::Succeeded,
            Some(false) => state.last = OperationStatus::Failed,
            None => {}
        }
        self.loading = self
            .operations
            .iter()
            .any(|(kind, state)| kind.is_tracked() && state.in_flight > 0);
    }

    fn apply(&mut self, response: Response) {
        match response {
            Response::Page(page) => {
                self.users.extend(page.results);
                self.page = page.page;
                self.total_pages = page.total_pages;
                self.total_users = page.total_users;
            }
            Response::Fetched(user) => self.user = Some(user),
            Response::Created(user) => self.users.push(user),
            Response::Updated(user) => {
                if let Some(slot) = self.users.iter_mut().find(|u| u.id == user.id) {
                    *slot = user;
                }
            }
            Response::Deleted { id } => self.users.retain(|u| u.id != id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    fn mk_user(id: &str) -> User {
        User {
            id: id.to_string(),
            first_name: format!("First{id}"),
            last_name: format!("Last{id}"),
            height: 180.0,
            weight: 75.0,
            gender: "other".to_string(),
            residence: "Somewhere".to_string(),
            photo: None,
        }
    }

    fn mk_page(page: u32, ids: &[&str], total_pages: u32, total_users: u64) -> UsersPage {
        UsersPage {
            results: ids.iter().map(|id| mk_user(id)).collect(),
            page,
            total_pages,
            total_users,
        }
    }

    fn network_error() -> ApiError {
        ApiError::Status {
            status: 503,
            body: String::new(),
        }
    }

    /// Serves canned pages and records how it was called.
    #[derive(Default)]
    struct FakeApi {
        pages: Mutex<Vec<UsersPage>>,
        fail: bool,
        calls: Mutex<Vec<String>>,
    }

    impl FakeApi {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        fn with_pages(pages: Vec<UsersPage>) -> Self {
            Self {
                pages: Mutex::new(pages),
                ..Self::default()
            }
        }

        fn record(&self, call: String) -> Result<(), ApiError> {
            self.calls.lock().unwrap().push(call);
            if self.fail { Err(network_error()) } else { Ok(()) }
        }
    }

    #[async_trait]
    impl UsersApi for FakeApi {
        async fn list_users(&self, page: u32, page_size: u32) -> Result<UsersPage, ApiError> {
            self.record(format!("list {page} {page_size}"))?;
            Ok(self.pages.lock().unwrap().remove(0))
        }

        async fn get_user(&self, id: &str) -> Result<User, ApiError> {
            self.record(format!("get {id}"))?;
            Ok(mk_user(id))
        }

        async fn create_user(&self, payload: &NewOrUpdateUser) -> Result<User, ApiError> {
            self.record("create".to_string())?;
            Ok(payload.clone().into_user("new"))
        }

        async fn update_user(
            &self,
            id: &str,
            payload: &NewOrUpdateUser,
        ) -> Result<User, ApiError> {
            self.record(format!("update {id}"))?;
            Ok(payload.clone().into_user(id))
        }

        async fn delete_user(&self, id: &str) -> Result<(), ApiError> {
            self.record(format!("delete {id}"))
        }
    }

    fn store_with(ids: &[&str]) -> UsersStore {
        let mut store = UsersStore::default();
        store.begin(OperationKind::FetchUsers);
        store
            .resolve(
                OperationKind::FetchUsers,
                Ok(Response::Page(mk_page(1, ids, 1, ids.len() as u64))),
            )
            .unwrap();
        store
    }

    #[tokio::test]
    async fn pages_accumulate_across_fetches() {
        let first: Vec<String> = (0..10).map(|i| format!("a{i}")).collect();
        let second: Vec<String> = (0..10).map(|i| format!("b{i}")).collect();
        let first: Vec<&str> = first.iter().map(String::as_str).collect();
        let second: Vec<&str> = second.iter().map(String::as_str).collect();
        let api = FakeApi::with_pages(vec![mk_page(1, &first, 3, 30), mk_page(2, &second, 3, 30)]);
        let mut store = UsersStore::new(10);

        store.fetch_users(&api, 1, 10).await.unwrap();
        assert_eq!(store.users().len(), 10);
        assert_eq!(store.page(), 1);
        assert_eq!(store.total_pages(), 3);
        assert_eq!(store.total_users(), 30);

        store.fetch_users(&api, 2, 10).await.unwrap();
        assert_eq!(store.users().len(), 20);
        assert_eq!(store.page(), 2);
        assert_eq!(store.users()[0].id, "a0");
        assert_eq!(store.users()[10].id, "b0");
        assert!(!store.loading());
        assert_eq!(*api.calls.lock().unwrap(), vec!["list 1 10", "list 2 10"]);
    }

    #[tokio::test]
    async fn failed_list_fetch_keeps_users_and_sets_error() {
        let mut store = store_with(&["x"]);
        let api = FakeApi::failing();
        let err = store.fetch_users(&api, 2, 10).await.unwrap_err();
        assert_eq!(err.status(), Some(503));
        assert_eq!(store.users().len(), 1);
        assert_eq!(store.error(), Some("Request failed with status code 503"));
        assert!(!store.loading());
        assert_eq!(store.status(OperationKind::FetchUsers), OperationStatus::Failed);
    }

    #[tokio::test]
    async fn failed_detail_fetch_keeps_previous_user() {
        let mut store = UsersStore::default();
        store.fetch_user_by_id(&FakeApi::default(), "old").await.unwrap();
        assert_eq!(store.user().map(|u| u.id.as_str()), Some("old"));

        let err = store
            .fetch_user_by_id(&FakeApi::failing(), "abc")
            .await
            .unwrap_err();
        assert_eq!(store.user().map(|u| u.id.as_str()), Some("old"));
        assert_eq!(store.error(), Some(err.user_message().as_str()));
    }

    #[tokio::test]
    async fn next_success_clears_error() {
        let mut store = UsersStore::default();
        let _ = store.fetch_user_by_id(&FakeApi::failing(), "abc").await;
        assert!(store.error().is_some());
        store.fetch_user_by_id(&FakeApi::default(), "abc").await.unwrap();
        assert_eq!(store.error(), None);
    }

    #[tokio::test]
    async fn create_appends_server_record_at_the_end() {
        let mut store = store_with(&["x", "y"]);
        let payload = NewOrUpdateUser {
            first_name: "New".into(),
            ..NewOrUpdateUser::default()
        };
        store
            .create_user(&FakeApi::default(), payload.clone())
            .await
            .unwrap();
        let expected = payload.into_user("new");
        assert_eq!(store.users().len(), 3);
        assert_eq!(store.users().last(), Some(&expected));
        assert_eq!(store.users().iter().filter(|u| **u == expected).count(), 1);
    }

    #[tokio::test]
    async fn failed_mutations_leave_error_and_users_alone() {
        let mut store = store_with(&["x"]);
        let api = FakeApi::failing();
        assert!(store.create_user(&api, NewOrUpdateUser::default()).await.is_err());
        assert!(store.update_user(&api, "x", NewOrUpdateUser::default()).await.is_err());
        assert!(store.delete_user(&api, "x").await.is_err());
        assert_eq!(store.error(), None);
        assert_eq!(store.users(), &[mk_user("x")]);
        assert_eq!(store.status(OperationKind::DeleteUser), OperationStatus::Failed);
    }

    #[tokio::test]
    async fn update_replaces_only_the_matching_entry() {
        let mut store = store_with(&["x", "y", "z"]);
        let payload = NewOrUpdateUser {
            first_name: "Changed".into(),
            ..mk_user("y").to_payload()
        };
        store
            .update_user(&FakeApi::default(), "y", payload)
            .await
            .unwrap();
        assert_eq!(store.users()[0], mk_user("x"));
        assert_eq!(store.users()[1].first_name, "Changed");
        assert_eq!(store.users()[1].id, "y");
        assert_eq!(store.users()[2], mk_user("z"));
    }

    #[tokio::test]
    async fn update_of_uncached_user_is_a_noop() {
        let mut store = store_with(&["x"]);
        store
            .update_user(&FakeApi::default(), "elsewhere", NewOrUpdateUser::default())
            .await
            .unwrap();
        assert_eq!(store.users(), &[mk_user("x")]);
    }

    #[tokio::test]
    async fn delete_removes_the_id_and_keeps_order() {
        let mut store = store_with(&["x", "y"]);
        store.delete_user(&FakeApi::default(), "x").await.unwrap();
        assert_eq!(store.users(), &[mk_user("y")]);

        let mut store = store_with(&["a", "b", "c", "d"]);
        store.delete_user(&FakeApi::default(), "c").await.unwrap();
        let ids: Vec<&str> = store.users().iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "d"]);
    }

    #[test]
    fn loading_tracks_overlapping_fetches() {
        let mut store = UsersStore::default();
        assert!(!store.loading());
        store.begin(OperationKind::FetchUsers);
        store.begin(OperationKind::FetchUserById);
        assert!(store.loading());

        store
            .resolve(OperationKind::FetchUserById, Ok(Response::Fetched(mk_user("u"))))
            .unwrap();
        assert!(store.loading(), "list fetch still in flight");
        assert_eq!(store.status(OperationKind::FetchUsers), OperationStatus::Pending);
        assert_eq!(
            store.status(OperationKind::FetchUserById),
            OperationStatus::Succeeded
        );

        let _ = store.resolve(OperationKind::FetchUsers, Err(network_error()));
        assert!(!store.loading());
    }

    #[test]
    fn mutations_do_not_toggle_loading() {
        let mut store = UsersStore::default();
        store.begin(OperationKind::CreateUser);
        assert!(!store.loading());
        assert_eq!(store.status(OperationKind::CreateUser), OperationStatus::Pending);
    }

    #[test]
    fn out_of_order_pages_append_in_resolution_order() {
        let mut store = UsersStore::default();
        store.begin(OperationKind::FetchUsers);
        store.begin(OperationKind::FetchUsers);
        store
            .resolve(
                OperationKind::FetchUsers,
                Ok(Response::Page(mk_page(2, &["b"], 2, 2))),
            )
            .unwrap();
        store
            .resolve(
                OperationKind::FetchUsers,
                Ok(Response::Page(mk_page(1, &["a"], 2, 2))),
            )
            .unwrap();
        let ids: Vec<&str> = store.users().iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(store.page(), 1);
    }

    #[test]
    fn abandon_releases_loading_without_an_outcome() {
        let mut store = UsersStore::default();
        store.begin(OperationKind::FetchUsers);
        store.abandon(OperationKind::FetchUsers);
        assert!(!store.loading());
        assert_eq!(store.status(OperationKind::FetchUsers), OperationStatus::Idle);
    }

    #[test]
    fn cursor_setters_do_not_fetch_or_touch_users() {
        let mut store = store_with(&["x"]);
        store.set_page(4);
        store.set_page_size(25);
        assert_eq!(store.page(), 4);
        assert_eq!(store.page_size(), 25);
        assert_eq!(store.users().len(), 1);
        assert!(!store.loading());
    }

    #[test]
    fn next_page_stops_at_the_last_page_and_while_loading() {
        let mut store = UsersStore::default();
        store.begin(OperationKind::FetchUsers);
        store
            .resolve(
                OperationKind::FetchUsers,
                Ok(Response::Page(mk_page(1, &["a"], 2, 2))),
            )
            .unwrap();
        assert_eq!(store.next_page(), Some(2));

        store.begin(OperationKind::FetchUsers);
        assert_eq!(store.next_page(), None);
        store
            .resolve(
                OperationKind::FetchUsers,
                Ok(Response::Page(mk_page(2, &["b"], 2, 2))),
            )
            .unwrap();
        assert_eq!(store.next_page(), None);
    }
}

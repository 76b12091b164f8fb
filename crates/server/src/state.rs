use depot::{query::QueryEngine, store::Store};

pub struct AppState {
    pub store: Store,
    pub queries: QueryEngine,
}

impl AppState {
    pub fn new(store: Store) -> Self {
        let queries = QueryEngine::new(store.clone());
        Self { store, queries }
    }
}

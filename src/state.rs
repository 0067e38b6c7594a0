use std::sync::Arc;

use crate::flow::{FlowController, FlowSettings};
use crate::render::Renderer;
use crate::store::Store;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub renderer: Arc<Renderer>,
    pub settings: Arc<FlowSettings>,
}

impl AppState {
    pub fn new(store: Store, renderer: Renderer, settings: FlowSettings) -> Self {
        AppState {
            store: Arc::new(store),
            renderer: Arc::new(renderer),
            settings: Arc::new(settings),
        }
    }

    pub fn flow(&self) -> FlowController<'_> {
        FlowController::new(&self.store, &self.renderer, &self.settings)
    }

    pub async fn run_flow<T, F>(&self, step: F) -> anyhow::Result<T>
    where
        T: Send + 'static,
        F: FnOnce(FlowController<'_>) -> T + Send + 'static,
    {
        let state = self.clone();
        let output = tokio::task::spawn_blocking(move || step(state.flow())).await?;
        Ok(output)
    }
}

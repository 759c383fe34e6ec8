use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use crate::shared::config::ProviderConfig;
use crate::speech::domain::load_progress::{LoadProgressEvent, ProgressCallback};
use crate::speech::domain::model_handle::ModelHandle;
use crate::speech::domain::model_loader::{ModelConstructionError, ModelLoader};

type LoadOutcome = Result<ModelHandle, ModelConstructionError>;

/// Lazily constructs one model instance and shares it for the provider's lifetime.
///
/// Construction is single-flight: callers arriving while a construction is in
/// progress join it instead of starting another, and all of them observe the
/// same outcome. A failed construction is not memoized, so the next call
/// starts over.
pub struct ModelProvider {
    config: ProviderConfig,
    loader: Box<dyn ModelLoader>,
    slot: Mutex<Slot>,
}

#[derive(Default)]
struct Slot {
    handle: Option<ModelHandle>,
    pending: Option<Arc<PendingLoad>>,
}

/// An in-flight construction that later callers can wait on.
struct PendingLoad {
    outcome: Mutex<Option<LoadOutcome>>,
    done: Condvar,
    listeners: Mutex<Vec<ProgressCallback>>,
}

impl ModelProvider {
    pub fn new(config: ProviderConfig, loader: Box<dyn ModelLoader>) -> Self {
        Self {
            config,
            loader,
            slot: Mutex::new(Slot::default()),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.lock_slot().handle.is_some()
    }

    /// Return the shared model, constructing it on first use.
    ///
    /// `progress` receives construction events from the moment this caller
    /// starts or joins a construction. It is never called when the model is
    /// already loaded.
    pub fn get_instance(&self, progress: Option<ProgressCallback>) -> LoadOutcome {
        let pending = {
            let mut slot = self.lock_slot();
            if let Some(handle) = &slot.handle {
                return Ok(handle.clone());
            }
            if let Some(pending) = &slot.pending {
                let pending = Arc::clone(pending);
                drop(slot);
                log::debug!("Joining in-flight model construction");
                if let Some(cb) = progress {
                    pending.subscribe(cb);
                }
                return pending.wait();
            }

            let pending = Arc::new(PendingLoad::new());
            if let Some(cb) = progress {
                pending.subscribe(cb);
            }
            slot.pending = Some(Arc::clone(&pending));
            pending
        };

        log::info!(
            "Constructing model {} ({})",
            self.config.model_id,
            self.config.model_file_name()
        );
        let outcome = self.construct(&pending);

        {
            let mut slot = self.lock_slot();
            slot.pending = None;
            if let Ok(handle) = &outcome {
                slot.handle = Some(handle.clone());
            }
        }
        match &outcome {
            Ok(_) => log::info!("Model ready"),
            Err(e) => log::warn!("Model construction failed: {e}"),
        }
        pending.finish(outcome.clone());
        outcome
    }

    fn construct(&self, pending: &PendingLoad) -> LoadOutcome {
        let relay = |event: LoadProgressEvent| pending.broadcast(&event);
        panic::catch_unwind(AssertUnwindSafe(|| self.loader.load(&self.config, &relay)))
            .unwrap_or_else(|_| {
                Err(ModelConstructionError::Initialize(
                    "model loader panicked".to_string(),
                ))
            })
    }

    fn lock_slot(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PendingLoad {
    fn new() -> Self {
        Self {
            outcome: Mutex::new(None),
            done: Condvar::new(),
            listeners: Mutex::new(Vec::new()),
        }
    }

    fn subscribe(&self, listener: ProgressCallback) {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener);
    }

    fn broadcast(&self, event: &LoadProgressEvent) {
        let listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        for listener in listeners.iter() {
            listener(event);
        }
    }

    fn finish(&self, outcome: LoadOutcome) {
        *self.outcome.lock().unwrap_or_else(PoisonError::into_inner) = Some(outcome);
        self.done.notify_all();
    }

    fn wait(&self) -> LoadOutcome {
        let mut guard = self.outcome.lock().unwrap_or_else(PoisonError::into_inner);
        loop {
            if let Some(outcome) = guard.as_ref() {
                return outcome.clone();
            }
            guard = self
                .done
                .wait(guard)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}

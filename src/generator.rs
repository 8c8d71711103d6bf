//! Generation orchestration: cache lookup, mirror dispatch, persistence.
//!
//! [`ImageGenerator::request_images`] is the one operation callers reach,
//! through the `verseImageGenerator.generateImages` command. Apart from an
//! empty prompt it never fails: mirror errors are logged and become an
//! empty result.

use crate::cache::ImageCache;
use crate::host::{CommandBus, CommandHandler, ExecutionContext};
use crate::models::{ImageResult, MirrorId, GENERATE_IMAGES_COMMAND, IMAGE_URLS_DATA_KEY};
use crate::router::MirrorRouter;
use crate::storage::KeyValueStore;
use crate::{Error, Result};
use async_trait::async_trait;
use futures_util::future::{BoxFuture, FutureExt, Shared};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

type PendingImages = Shared<BoxFuture<'static, ImageResult>>;

#[derive(Default)]
struct GeneratorState {
    cache: ImageCache,
    /// Mirror calls still running. Requests for the same prompt on the same
    /// mirror join the running call instead of starting another.
    in_flight: HashMap<(String, MirrorId), PendingImages>,
}

/// Injectable service bundle used to construct [`ImageGenerator`].
pub struct GeneratorServices {
    pub router: MirrorRouter,
    pub store: Arc<dyn KeyValueStore>,
}

pub struct ImageGenerator {
    inner: Arc<GeneratorInner>,
}

/// Everything a background generation or write task needs.
struct GeneratorInner {
    router: MirrorRouter,
    store: Arc<dyn KeyValueStore>,
    execution_token: String,
    state: Mutex<GeneratorState>,
    write_lock: tokio::sync::Mutex<()>,
    pending_writes: Mutex<Vec<JoinHandle<()>>>,
}

impl ImageGenerator {
    /// Build a generator with an empty cache. Nothing is loaded from storage
    /// and no command is registered; see [`ImageGenerator::activate`].
    pub fn with_services(context: &ExecutionContext, services: GeneratorServices) -> Self {
        Self {
            inner: Arc::new(GeneratorInner {
                router: services.router,
                store: services.store,
                execution_token: context.execution_token.clone(),
                state: Mutex::new(GeneratorState::default()),
                write_lock: tokio::sync::Mutex::new(()),
                pending_writes: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Load the persisted cache, then expose the generate command on `bus`.
    pub async fn activate(
        context: &ExecutionContext,
        services: GeneratorServices,
        bus: &dyn CommandBus,
    ) -> Result<Arc<Self>> {
        info!("Verse Image Generator is activating!");

        let generator = Arc::new(Self::with_services(context, services));
        generator.load_persisted().await;

        bus.register_command(
            GENERATE_IMAGES_COMMAND,
            Arc::new(GenerateImagesCommand {
                generator: Arc::clone(&generator),
            }),
        )
        .await?;

        Ok(generator)
    }

    /// Wait for outstanding cache writes before the host tears us down.
    pub async fn deactivate(&self) -> bool {
        info!("Verse Image Generator is deactivating!");
        self.flush().await;
        true
    }

    pub fn cached(&self, prompt: &str) -> Option<ImageResult> {
        self.inner.state().cache.get(prompt).cloned()
    }

    pub fn cache_len(&self) -> usize {
        self.inner.state().cache.len()
    }

    /// Merge the persisted snapshot into the cache without replacing any
    /// prompt already cached. Failures are logged and treated as no
    /// snapshot. Returns the number of prompts added.
    pub async fn load_persisted(&self) -> usize {
        let snapshot = match self
            .inner
            .store
            .read_user_data(&self.inner.execution_token, IMAGE_URLS_DATA_KEY)
            .await
        {
            Ok(snapshot) => snapshot,
            Err(Error::SnapshotMissing(what)) => {
                info!("No image url cache stored yet ({})", what);
                return 0;
            }
            Err(e) => {
                warn!("Could not load image url cache. {}", e);
                return 0;
            }
        };

        let merged = self.inner.state().cache.merge_snapshot(&snapshot);
        match merged {
            Ok(added) => {
                info!("Loaded {} cached prompts from storage", added);
                added
            }
            Err(e) => {
                warn!("Could not load image url cache. {}", e);
                0
            }
        }
    }

    /// Generate (or recall) images for `prompt` from the given mirror.
    ///
    /// `mirror` defaults to 0; unknown ids use the default mirror. The mirror
    /// call runs in its own task, so a caller that gives up (for example on
    /// a timeout) does not stall later requests that join it.
    pub async fn request_images(&self, prompt: &str, mirror: Option<i64>) -> Result<ImageResult> {
        if prompt.is_empty() {
            return Err(Error::InvalidInput("Must provide a prompt!".to_string()));
        }
        let mirror = MirrorId::from(mirror);
        let key = (prompt.to_string(), mirror);

        let pending = {
            let mut state = self.inner.state();
            if let Some(cached) = state.cache.get(prompt) {
                debug!("Cache hit for prompt {}", prompt);
                return Ok(cached.clone());
            }

            match state.in_flight.get(&key) {
                Some(pending) => {
                    info!(
                        "Joining in-flight request to mirror {} for prompt {}",
                        mirror, prompt
                    );
                    pending.clone()
                }
                None => {
                    info!(
                        "Requesting generated images from mirror {} for prompt {}",
                        mirror, prompt
                    );
                    // The task needs this lock to retire its entry, so it
                    // cannot finish before the entry is inserted.
                    let pending = GeneratorInner::spawn_generation(&self.inner, key.clone());
                    state.in_flight.insert(key, pending.clone());
                    pending
                }
            }
        };

        Ok(pending.await)
    }

    /// Await every background write started so far.
    pub async fn flush(&self) {
        let handles = std::mem::take(
            &mut *self
                .inner
                .pending_writes
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );

        for handle in handles {
            if let Err(e) = handle.await {
                warn!("Image url cache write task failed: {}", e);
            }
        }
    }
}

impl GeneratorInner {
    fn state(&self) -> MutexGuard<'_, GeneratorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run one mirror call to completion in the background. The task that
    /// made the call is the only one that caches its result and persists.
    fn spawn_generation(inner: &Arc<Self>, key: (String, MirrorId)) -> PendingImages {
        let inner = Arc::clone(inner);

        let task = tokio::spawn(async move {
            let (prompt, mirror) = &key;
            let images = match inner.router.route(*mirror as i64, prompt).await {
                Ok(images) => images,
                Err(e) => {
                    error!(
                        "Error while retrieving image urls from mirror {}: {}",
                        mirror, e
                    );
                    Vec::new()
                }
            };

            {
                let mut state = inner.state();
                state.in_flight.remove(&key);
                if state.cache.insert(prompt, images.clone()) {
                    debug!("Cached {} images for prompt {}", images.len(), prompt);
                }
            }

            Self::save_image_urls(&inner, prompt);
            images
        });

        task.map(|joined| {
            joined.unwrap_or_else(|e| {
                error!("Image generation task failed: {}", e);
                Vec::new()
            })
        })
        .boxed()
        .shared()
    }

    /// Persist the whole cache in the background. Writes run one at a time
    /// and each serializes the cache as it is when the write starts, so the
    /// last write always holds the latest state.
    fn save_image_urls(inner: &Arc<Self>, prompt: &str) {
        let writer = Arc::clone(inner);
        let prompt = prompt.to_string();

        let handle = tokio::spawn(async move {
            let _guard = writer.write_lock.lock().await;
            let snapshot = writer.state().cache.to_snapshot();

            let result = match snapshot {
                Ok(snapshot) => {
                    writer
                        .store
                        .write_user_data(&writer.execution_token, IMAGE_URLS_DATA_KEY, &snapshot)
                        .await
                }
                Err(e) => Err(e),
            };

            if let Err(e) = result {
                warn!(
                    "Saving Generated Image Urls for prompt '{}' failed! {}",
                    prompt, e
                );
            }
        });

        let mut pending = inner
            .pending_writes
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        pending.retain(|handle| !handle.is_finished());
        pending.push(handle);
    }
}

/// Handler for `verseImageGenerator.generateImages(prompt, mirror?)`.
struct GenerateImagesCommand {
    generator: Arc<ImageGenerator>,
}

#[async_trait]
impl CommandHandler for GenerateImagesCommand {
    async fn handle(&self, args: Vec<Value>) -> Result<Value> {
        let prompt = args.first().and_then(Value::as_str).unwrap_or_default();
        let mirror = args.get(1).and_then(mirror_arg);

        let images = self.generator.request_images(prompt, mirror).await?;
        Ok(serde_json::to_value(images)?)
    }
}

/// Mirror ids arrive as JSON numbers; integral floats are accepted too.
fn mirror_arg(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|raw| raw.fract() == 0.0 && raw.abs() <= i64::MAX as f64)
            .map(|raw| raw as i64)
    })
}

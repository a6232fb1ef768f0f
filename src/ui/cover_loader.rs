// Cover loading into GTK pictures
// Bridges the background CoverPipeline to the main loop. Every load stamps the
// target picture with a token; results for an older token are dropped, so a
// recycled row never shows the previous category's cover.

use gdk4::Texture;
use gtk4::prelude::*;
use gtk4::{gdk, glib, Picture};
use lru::LruCache;
use std::cell::RefCell;
use std::num::NonZeroUsize;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::adapter::ImageLoader;
use crate::covers::{CoverImage, CoverPipeline, CoverResult, RequestOutcome};
use crate::ui::cover_waiters::{CoverTarget, CoverWaiters};

const TEXTURE_CACHE_ENTRIES: usize = 256;
const COVER_TOKEN_KEY: &str = "catshelf-cover-token";

static NEXT_COVER_TOKEN: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static PLACEHOLDER: Texture = build_placeholder();
}

pub fn placeholder_texture() -> Texture {
    PLACEHOLDER.with(Texture::clone)
}

// Dark gray (#1a1a1a) square
fn build_placeholder() -> Texture {
    let size: usize = 64;
    let mut pixels = vec![0u8; size * size * 4];
    for chunk in pixels.chunks_exact_mut(4) {
        chunk.copy_from_slice(&[0x1a, 0x1a, 0x1a, 0xff]);
    }
    let bytes = glib::Bytes::from_owned(pixels);
    gdk::MemoryTexture::new(
        size as i32,
        size as i32,
        gdk::MemoryFormat::R8g8b8a8,
        &bytes,
        size * 4,
    )
    .upcast()
}

fn create_texture(image: &CoverImage) -> Option<Texture> {
    let (width, height) = (image.width, image.height);
    if width == 0 || height == 0 {
        return None;
    }
    let expected = (width as usize)
        .saturating_mul(height as usize)
        .saturating_mul(4);
    if image.rgba.len() < expected {
        return None;
    }
    let bytes = glib::Bytes::from(&image.rgba[..]);
    let texture = gdk::MemoryTexture::new(
        width as i32,
        height as i32,
        gdk::MemoryFormat::R8g8b8a8,
        &bytes,
        (width * 4) as usize,
    );
    Some(texture.upcast())
}

fn set_cover_token(picture: &Picture, token: u64) {
    // Only ever stored and read as u64 under this key.
    unsafe {
        picture.set_data(COVER_TOKEN_KEY, token);
    }
}

fn cover_token(picture: &Picture) -> u64 {
    let token = unsafe { picture.data::<u64>(COVER_TOKEN_KEY) };
    token.map(|ptr| unsafe { *ptr.as_ref() }).unwrap_or(0)
}

/// Detach `picture` from any in-flight load and show the placeholder.
pub fn clear_cover(picture: &Picture) {
    set_cover_token(picture, 0);
    picture.set_paintable(Some(&placeholder_texture()));
}

impl CoverTarget for glib::WeakRef<Picture> {
    type Cover = Texture;

    fn load_token(&self) -> u64 {
        self.upgrade().map_or(0, |picture| cover_token(&picture))
    }

    fn show_cover(&self, texture: &Texture) {
        if let Some(picture) = self.upgrade() {
            picture.set_paintable(Some(texture));
        }
    }
}

struct LoaderState {
    waiters: CoverWaiters<glib::WeakRef<Picture>>,
    textures: LruCache<String, Texture>,
}

pub struct GtkCoverLoader {
    pipeline: CoverPipeline,
    state: RefCell<LoaderState>,
}

impl GtkCoverLoader {
    pub fn new(pipeline: CoverPipeline) -> Rc<Self> {
        let results = pipeline.results();
        let loader = Rc::new(Self {
            pipeline,
            state: RefCell::new(LoaderState {
                waiters: CoverWaiters::new(),
                textures: LruCache::new(
                    NonZeroUsize::new(TEXTURE_CACHE_ENTRIES).unwrap_or(NonZeroUsize::MIN),
                ),
            }),
        });

        let loader_weak = Rc::downgrade(&loader);
        glib::spawn_future_local(async move {
            while let Ok(result) = results.recv().await {
                if let Some(loader) = loader_weak.upgrade() {
                    loader.handle_result(result);
                } else {
                    break;
                }
            }
        });

        loader
    }

    fn handle_result(&self, result: CoverResult) {
        let texture = result.image.as_deref().and_then(create_texture);

        let mut state = self.state.borrow_mut();
        if let Some(ref texture) = texture {
            state.textures.put(result.url.clone(), texture.clone());
        }
        let waiting = state.waiters.waiting(&result.url);
        // Failed loads leave the placeholder in place.
        let shown = state.waiters.settle(&result.url, texture.as_ref());

        tracing::trace!(
            url = %result.url,
            waiting,
            shown,
            error = ?result.error,
            pending = self.pipeline.pending_count(),
            cached_covers = self.pipeline.cache().len(),
            cached_bytes = self.pipeline.cache().memory_bytes(),
            "Cover result"
        );
    }
}

impl ImageLoader<Picture> for GtkCoverLoader {
    fn load(&self, url: &str, picture: &Picture) {
        let token = NEXT_COVER_TOKEN.fetch_add(1, Ordering::Relaxed);
        set_cover_token(picture, token);

        if url.trim().is_empty() {
            picture.set_paintable(Some(&placeholder_texture()));
            return;
        }

        let mut state = self.state.borrow_mut();
        if let Some(texture) = state.textures.get(url).cloned() {
            picture.set_paintable(Some(&texture));
            return;
        }

        picture.set_paintable(Some(&placeholder_texture()));

        if let Some(texture) = self.pipeline.cached(url).as_deref().and_then(create_texture) {
            state.textures.put(url.to_string(), texture.clone());
            picture.set_paintable(Some(&texture));
            return;
        }

        state.waiters.wait(url, picture.downgrade(), token);

        // Earlier waiters for this URL may still get a result already in flight.
        if self.pipeline.request(url) == RequestOutcome::Rejected {
            state.waiters.withdraw_last(url);
        }
    }
}

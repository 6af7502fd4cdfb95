use std::sync::LazyLock;

use tokio::runtime::{Builder, Runtime};

pub const MAX_DELETE_ATTEMPTS: u64 = 3;

pub const JPEG_QUALITY: u8 = 95;

pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

pub const DEFAULT_ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp"];

pub static CURRENT_NUM_THREADS: LazyLock<usize> = LazyLock::new(|| {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
});

// Rocket-specific Tokio Runtime
// Request handling runs here; decoding, encoding and the analysis call are moved to its blocking pool.
pub static ROCKET_RUNTIME: LazyLock<Runtime> = LazyLock::new(|| {
    Builder::new_multi_thread()
        .worker_threads(*CURRENT_NUM_THREADS)
        .thread_name("rocket-io-worker")
        .enable_all()
        .build()
        .expect("Failed to build Rocket Tokio runtime")
});

/// Room for multipart boundaries and headers on top of the file itself.
pub const MULTIPART_OVERHEAD: u64 = 1024 * 1024;

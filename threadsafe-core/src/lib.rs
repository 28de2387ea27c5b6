pub mod archive;
pub mod attachment;
pub mod error;
pub mod lookup;
pub mod model;
pub mod render;
pub mod service;
pub mod settings;
pub mod uri;
pub mod walk;

pub use archive::ArchiveDir;
pub use attachment::{HttpDownloader, MediaSource};
pub use error::{LookupError, Result, ThreadSafeError};
pub use lookup::TweetLookup;
pub use lookup::twitter::TwitterClient;
pub use model::{ArchiveSummary, Attachment, Thread, Tweet};
pub use render::{RenderOptions, TemplateThread};
pub use service::{
    SaveRequest, SaveResult, list_threads, regen_thread, render_archive_list, save_thread,
};
pub use settings::Settings;
pub use uri::TweetUri;
pub use walk::{DEFAULT_MAX_THREAD_LEN, walk_thread};

use std::path::PathBuf;

use log::{info, warn};

use crate::archive::{ArchiveDir, list_archives};
use crate::attachment::{MediaSource, download_attachments};
use crate::error::{Result, ThreadSafeError};
use crate::lookup::TweetLookup;
use crate::model::{ArchiveSummary, Thread};
use crate::render::{RenderOptions, write_html};
use crate::settings::Settings;
use crate::uri::TweetUri;
use crate::walk::DEFAULT_MAX_THREAD_LEN;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveRequest {
    pub name: String,
    pub last_tweet: TweetUri,
    pub limit: usize,
    pub download_attachments: bool,
    pub render: RenderOptions,
}

impl SaveRequest {
    pub fn new(name: impl Into<String>, last_tweet: TweetUri) -> Self {
        Self {
            name: name.into(),
            last_tweet,
            limit: DEFAULT_MAX_THREAD_LEN,
            download_attachments: true,
            render: RenderOptions::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveResult {
    pub dir: PathBuf,
    pub tweet_count: usize,
    pub attachment_count: usize,
}

/// Archives a thread: `thread.json`, attachments, then `thread.html`.
///
/// Refuses to touch an existing archive directory; nothing is written until the
/// whole thread has been fetched. A download or render failure after that
/// leaves the directory with its `thread.json` in place and is reported as
/// [`ThreadSafeError::IncompleteArchive`]: `regen` can finish the HTML, and
/// the directory must be deleted before saving the same name again.
pub fn save_thread(
    settings: &Settings,
    lookup: &impl TweetLookup,
    media: &impl MediaSource,
    request: &SaveRequest,
) -> Result<SaveResult> {
    let dir = ArchiveDir::new(&settings.root, &request.name)?;
    dir.ensure_absent()?;

    info!(
        "saving thread {:?} ending at tweet {}",
        request.name, request.last_tweet.tweet_id
    );
    let thread = Thread::fetch(
        lookup,
        request.name.as_str(),
        &request.last_tweet.tweet_id,
        request.limit,
    )?;

    thread.to_json(&dir)?;

    let attachment_count =
        finish_archive(&thread, &dir, media, request).map_err(|source| {
            warn!("leaving incomplete archive at {}", dir.path().display());
            ThreadSafeError::IncompleteArchive {
                path: dir.path().to_path_buf(),
                source: Box::new(source),
            }
        })?;

    Ok(SaveResult {
        dir: dir.path().to_path_buf(),
        tweet_count: thread.len(),
        attachment_count,
    })
}

fn finish_archive(
    thread: &Thread,
    dir: &ArchiveDir,
    media: &impl MediaSource,
    request: &SaveRequest,
) -> Result<usize> {
    let attachment_count = if request.download_attachments {
        download_attachments(thread, dir, media)?.len()
    } else {
        0
    };

    write_html(thread, dir, &request.render)?;
    Ok(attachment_count)
}

/// Re-renders `thread.html` of a saved thread from its `thread.json`.
pub fn regen_thread(settings: &Settings, name: &str, render: &RenderOptions) -> Result<PathBuf> {
    let dir = ArchiveDir::new(&settings.root, name)?;
    dir.ensure_present()?;

    let thread = Thread::load(&dir)?;
    let path = write_html(&thread, &dir, render)?;
    info!("regenerated {}", path.display());
    Ok(path)
}

pub fn list_threads(settings: &Settings) -> Result<Vec<ArchiveSummary>> {
    list_archives(&settings.root)
}

pub fn render_archive_list(summaries: &[ArchiveSummary]) -> String {
    let mut output = String::new();
    for summary in summaries {
        let handle = summary
            .author_handle
            .as_deref()
            .map(|handle| format!("@{handle}"))
            .unwrap_or_else(|| "-".to_string());
        output.push_str(&format!(
            "{}\t{} tweet(s)\t{}\n",
            summary.name, summary.tweet_count, handle
        ));
    }
    output
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::fs;

    use tempfile::tempdir;

    use crate::attachment::MediaSource;
    use crate::error::{Result, ThreadSafeError};
    use crate::model::{Attachment, Thread};
    use crate::render::RenderOptions;
    use crate::service::{
        SaveRequest, list_threads, regen_thread, render_archive_list, save_thread,
    };
    use crate::settings::Settings;
    use crate::uri::TweetUri;
    use crate::walk::tests::{FakeLookup, tweet};

    #[derive(Default)]
    struct CountingMedia {
        count: Cell<usize>,
    }

    impl MediaSource for CountingMedia {
        fn fetch(&self, _attachment: &Attachment) -> Result<Vec<u8>> {
            self.count.set(self.count.get() + 1);
            Ok(b"media".to_vec())
        }
    }

    fn settings(root: &std::path::Path) -> Settings {
        Settings {
            root: root.to_path_buf(),
            token: Some("token".to_string()),
        }
    }

    fn lookup() -> FakeLookup {
        let mut last = tweet("3", "1", "u", &["2"]);
        last.attachments = vec![Attachment {
            media_key: "3_1".to_string(),
            media_type: "photo".to_string(),
            url: "https://pbs.twimg.com/media/a.jpg".to_string(),
        }];
        FakeLookup::with([tweet("1", "1", "u", &[]), tweet("2", "1", "u", &["1"]), last])
    }

    fn request(name: &str) -> SaveRequest {
        SaveRequest::new(name, TweetUri::parse("3").expect("tweet uri"))
    }

    #[test]
    fn save_writes_json_attachments_and_html() {
        let temp = tempdir().expect("tempdir");
        let media = CountingMedia::default();

        let result = save_thread(&settings(temp.path()), &lookup(), &media, &request("my thread"))
            .expect("save should succeed");

        assert_eq!(result.dir, temp.path().join("my_thread"));
        assert_eq!(result.tweet_count, 3);
        assert_eq!(result.attachment_count, 1);
        assert_eq!(media.count.get(), 1);

        let saved = Thread::from_json_file(&result.dir.join("thread.json")).expect("load");
        assert_eq!(saved.name, "my thread");
        assert_eq!(saved.tweets[0].id, "1");
        assert!(
            result
                .dir
                .join("attachments/tweet=3-media_key=3_1.jpg")
                .is_file()
        );
        let html = fs::read_to_string(result.dir.join("thread.html")).expect("read html");
        assert!(html.contains("[3/3] tweet 3"));
    }

    #[test]
    fn save_without_attachments_skips_downloads() {
        let temp = tempdir().expect("tempdir");
        let media = CountingMedia::default();
        let mut request = request("demo");
        request.download_attachments = false;

        let result =
            save_thread(&settings(temp.path()), &lookup(), &media, &request).expect("save");
        assert_eq!(result.attachment_count, 0);
        assert_eq!(media.count.get(), 0);
        assert!(!result.dir.join("attachments").exists());
    }

    #[test]
    fn save_refuses_existing_directory() {
        let temp = tempdir().expect("tempdir");
        fs::create_dir_all(temp.path().join("demo")).expect("mkdir");

        let err = save_thread(
            &settings(temp.path()),
            &lookup(),
            &CountingMedia::default(),
            &request("demo"),
        )
        .expect_err("must fail");
        assert!(matches!(err, ThreadSafeError::ArchiveExists { .. }));
    }

    #[test]
    fn failed_walk_writes_nothing() {
        let temp = tempdir().expect("tempdir");
        let mut request = request("demo");
        request.limit = 2;

        let err = save_thread(
            &settings(temp.path()),
            &lookup(),
            &CountingMedia::default(),
            &request,
        )
        .expect_err("must fail");
        assert!(matches!(err, ThreadSafeError::ChainExhausted { limit: 2 }));
        assert!(!temp.path().join("demo").exists());
    }

    struct FailingMedia;

    impl MediaSource for FailingMedia {
        fn fetch(&self, attachment: &Attachment) -> Result<Vec<u8>> {
            Err(ThreadSafeError::Download {
                url: attachment.url.clone(),
                status: 503,
            })
        }
    }

    #[test]
    fn failed_download_reports_incomplete_archive_that_regen_can_finish() {
        let temp = tempdir().expect("tempdir");
        let settings = settings(temp.path());

        let err = save_thread(&settings, &lookup(), &FailingMedia, &request("demo"))
            .expect_err("must fail");
        assert!(matches!(
            err,
            ThreadSafeError::IncompleteArchive { ref source, .. }
                if matches!(**source, ThreadSafeError::Download { status: 503, .. })
        ));
        let message = format!("{err}");
        assert!(message.contains("run regen"));
        assert!(message.contains("status code: 503"));
        assert!(temp.path().join("demo/thread.json").is_file());
        assert!(!temp.path().join("demo/thread.html").exists());

        regen_thread(&settings, "demo", &RenderOptions::default()).expect("regen");
        assert!(temp.path().join("demo/thread.html").is_file());

        let again = save_thread(&settings, &lookup(), &CountingMedia::default(), &request("demo"))
            .expect_err("must fail");
        assert!(matches!(again, ThreadSafeError::ArchiveExists { .. }));
    }

    #[test]
    fn regen_rewrites_html_with_root_template() {
        let temp = tempdir().expect("tempdir");
        let settings = settings(temp.path());
        let mut request = request("demo");
        request.download_attachments = false;
        save_thread(&settings, &lookup(), &CountingMedia::default(), &request).expect("save");

        fs::write(temp.path().join("thread-safe.tmpl"), "custom: {{name}}").expect("write");
        let path = regen_thread(&settings, "demo", &RenderOptions::default()).expect("regen");
        assert_eq!(fs::read_to_string(path).expect("read"), "custom: demo");
    }

    #[test]
    fn regen_of_missing_thread_fails() {
        let temp = tempdir().expect("tempdir");
        let err = regen_thread(&settings(temp.path()), "missing", &RenderOptions::default())
            .expect_err("must fail");
        assert!(format!("{err}").contains("does not exist"));
    }

    #[test]
    fn list_renders_saved_threads() {
        let temp = tempdir().expect("tempdir");
        let settings = settings(temp.path());
        let mut request = request("demo");
        request.download_attachments = false;
        save_thread(&settings, &lookup(), &CountingMedia::default(), &request).expect("save");

        let summaries = list_threads(&settings).expect("list");
        assert_eq!(render_archive_list(&summaries), "demo\t3 tweet(s)\t@alice\n");
    }
}

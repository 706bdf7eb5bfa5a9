use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqlitePoolOptions, FromRow, SqlitePool};

use crate::model::{parse_timestamp, CardType, NewsItem, TopicTag};

/// Read side of the curated story store.
#[async_trait]
pub trait ManualStore: Send + Sync {
    /// Most recently created first.
    async fn list_manual_stories(&self) -> anyhow::Result<Vec<StoryRecord>>;
}

/// A curated story row, loosely typed as stored.
#[derive(Debug, Clone, FromRow)]
pub struct StoryRecord {
    pub id: i64,
    #[sqlx(rename = "type")]
    pub kind: Option<String>,
    pub source: Option<String>,
    pub title: String,
    pub summary: Option<String>,
    pub link: Option<String>,
    pub created_at: Option<String>,
    pub day: Option<i64>,
    pub topic_tag: Option<String>,
    pub featured: bool,
    pub pinned: bool,
    pub breaking: bool,
    pub curator_note: Option<String>,
    pub speaker: Option<String>,
    pub speaker_title: Option<String>,
    pub session_tag: Option<String>,
}

impl StoryRecord {
    /// Normalise into a `NewsItem`. `now` stands in for a missing creation time.
    pub fn into_item(self, now: DateTime<Utc>) -> NewsItem {
        let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());

        NewsItem {
            id: self.id.to_string(),
            kind: self
                .kind
                .as_deref()
                .and_then(CardType::parse)
                .unwrap_or_default(),
            source: non_empty(self.source).unwrap_or_else(|| "Editorial".to_string()),
            source_url: None,
            title: self.title,
            summary: self.summary.unwrap_or_default(),
            link: non_empty(self.link),
            published_at: self
                .created_at
                .as_deref()
                .and_then(parse_timestamp)
                .unwrap_or(now),
            day: self
                .day
                .filter(|d| *d > 0)
                .and_then(|d| u32::try_from(d).ok())
                .unwrap_or(1),
            session_tag: non_empty(self.session_tag),
            topic_tag: self
                .topic_tag
                .as_deref()
                .and_then(TopicTag::parse)
                .unwrap_or_default(),
            featured: self.featured,
            pinned: self.pinned,
            breaking: self.breaking,
            manual: true,
            curator_note: non_empty(self.curator_note),
            speaker: non_empty(self.speaker),
            speaker_title: non_empty(self.speaker_title),
            image_url: None,
        }
    }
}

/// Fields accepted when filing a new story.
#[derive(Debug, Clone, Default)]
pub struct NewStory {
    pub kind: Option<String>,
    pub source: Option<String>,
    pub title: String,
    pub summary: String,
    pub link: Option<String>,
    pub day: Option<i64>,
    pub topic_tag: Option<String>,
    pub featured: bool,
    pub pinned: bool,
    pub breaking: bool,
    pub curator_note: Option<String>,
    pub speaker: Option<String>,
    pub speaker_title: Option<String>,
    pub session_tag: Option<String>,
    /// Defaults to the insert time
    pub created_at: Option<String>,
}

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    pub async fn initialize(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS stories (
                id INTEGER PRIMARY KEY,
                type TEXT DEFAULT 'news',
                source TEXT DEFAULT 'Editorial',
                title TEXT NOT NULL,
                summary TEXT,
                link TEXT,
                created_at TEXT DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now')),
                day INTEGER DEFAULT 1,
                topic_tag TEXT DEFAULT 'general',
                featured INTEGER NOT NULL DEFAULT 0,
                pinned INTEGER NOT NULL DEFAULT 0,
                breaking INTEGER NOT NULL DEFAULT 0,
                curator_note TEXT,
                speaker TEXT,
                speaker_title TEXT,
                session_tag TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_stories_created ON stories(created_at DESC)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn create_story(&self, story: &NewStory) -> anyhow::Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO stories (
                type, source, title, summary, link, day, topic_tag,
                featured, pinned, breaking, curator_note, speaker, speaker_title,
                session_tag, created_at
            )
            VALUES (
                COALESCE(?, 'news'), COALESCE(?, 'Editorial'), ?, ?, ?, COALESCE(?, 1),
                COALESCE(?, 'general'), ?, ?, ?, ?, ?, ?, ?,
                COALESCE(?, strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
            )
            "#,
        )
        .bind(&story.kind)
        .bind(&story.source)
        .bind(&story.title)
        .bind(&story.summary)
        .bind(&story.link)
        .bind(story.day)
        .bind(&story.topic_tag)
        .bind(story.featured)
        .bind(story.pinned)
        .bind(story.breaking)
        .bind(&story.curator_note)
        .bind(&story.speaker)
        .bind(&story.speaker_title)
        .bind(&story.session_tag)
        .bind(&story.created_at)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }
}

#[async_trait]
impl ManualStore for Database {
    async fn list_manual_stories(&self) -> anyhow::Result<Vec<StoryRecord>> {
        let stories = sqlx::query_as::<_, StoryRecord>(
            "SELECT * FROM stories ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(stories)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    async fn create_test_db() -> (Database, TempDir) {
        let temp_dir = tempfile::tempdir().unwrap();
        let url = format!(
            "sqlite:{}?mode=rwc",
            temp_dir.path().join("stories.db").display()
        );
        let db = Database::new(&url).await.unwrap();
        db.initialize().await.unwrap();
        (db, temp_dir)
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 17, 9, 0, 0).unwrap()
    }

    fn record(id: i64) -> StoryRecord {
        StoryRecord {
            id,
            kind: None,
            source: None,
            title: "Opening remarks".to_string(),
            summary: None,
            link: None,
            created_at: None,
            day: None,
            topic_tag: None,
            featured: false,
            pinned: false,
            breaking: false,
            curator_note: None,
            speaker: None,
            speaker_title: None,
            session_tag: None,
        }
    }

    mod into_item_tests {
        use super::*;

        #[test]
        fn test_defaults_for_missing_fields() {
            let item = record(7).into_item(now());

            assert_eq!(item.id, "7");
            assert_eq!(item.kind, CardType::News);
            assert_eq!(item.source, "Editorial");
            assert_eq!(item.summary, "");
            assert_eq!(item.published_at, now());
            assert_eq!(item.day, 1);
            assert_eq!(item.topic_tag, TopicTag::General);
            assert!(item.manual);
            assert!(item.link.is_none());
        }

        #[test]
        fn test_quote_fields_carried() {
            let item = StoryRecord {
                kind: Some("quote".to_string()),
                speaker: Some("A. Speaker".to_string()),
                speaker_title: Some("Minister".to_string()),
                session_tag: Some("day2-keynote".to_string()),
                curator_note: Some("Worth reading".to_string()),
                topic_tag: Some("keynotes".to_string()),
                day: Some(2),
                created_at: Some("2026-02-17 06:00:00".to_string()),
                ..record(1)
            }
            .into_item(now());

            assert_eq!(item.kind, CardType::Quote);
            assert_eq!(item.speaker.as_deref(), Some("A. Speaker"));
            assert_eq!(item.speaker_title.as_deref(), Some("Minister"));
            assert_eq!(item.session_tag.as_deref(), Some("day2-keynote"));
            assert_eq!(item.curator_note.as_deref(), Some("Worth reading"));
            assert_eq!(item.topic_tag, TopicTag::Keynotes);
            assert_eq!(item.day, 2);
            assert_eq!(
                item.published_at,
                Utc.with_ymd_and_hms(2026, 2, 17, 6, 0, 0).unwrap()
            );
        }

        #[test]
        fn test_unknown_values_fall_back() {
            let item = StoryRecord {
                kind: Some("video".to_string()),
                topic_tag: Some("sports".to_string()),
                day: Some(0),
                created_at: Some("yesterday".to_string()),
                ..record(1)
            }
            .into_item(now());

            assert_eq!(item.kind, CardType::News);
            assert_eq!(item.topic_tag, TopicTag::General);
            assert_eq!(item.day, 1);
            assert_eq!(item.published_at, now());
        }

        #[test]
        fn test_blank_optional_fields_become_none() {
            let item = StoryRecord {
                link: Some("  ".to_string()),
                speaker: Some(String::new()),
                ..record(1)
            }
            .into_item(now());

            assert!(item.link.is_none());
            assert!(item.speaker.is_none());
        }
    }

    mod store_tests {
        use super::*;

        #[tokio::test]
        async fn test_create_and_list() {
            let (db, _dir) = create_test_db().await;

            let id = db
                .create_story(&NewStory {
                    title: "Breaking: keynote moved".to_string(),
                    summary: "Now at Hall 5".to_string(),
                    breaking: true,
                    ..Default::default()
                })
                .await
                .unwrap();

            let stories = db.list_manual_stories().await.unwrap();
            assert_eq!(stories.len(), 1);
            let story = &stories[0];
            assert_eq!(story.id, id);
            assert!(story.breaking);
            assert!(!story.pinned);
            assert_eq!(story.kind.as_deref(), Some("news"));
            assert_eq!(story.source.as_deref(), Some("Editorial"));
            assert_eq!(story.day, Some(1));
            assert!(story.created_at.as_deref().and_then(parse_timestamp).is_some());
        }

        #[tokio::test]
        async fn test_list_is_newest_first() {
            let (db, _dir) = create_test_db().await;

            for (title, created_at) in [
                ("first", "2026-02-16T08:00:00Z"),
                ("third", "2026-02-16T10:00:00Z"),
                ("second", "2026-02-16T09:00:00Z"),
            ] {
                db.create_story(&NewStory {
                    title: title.to_string(),
                    created_at: Some(created_at.to_string()),
                    ..Default::default()
                })
                .await
                .unwrap();
            }

            let titles: Vec<_> = db
                .list_manual_stories()
                .await
                .unwrap()
                .into_iter()
                .map(|s| s.title)
                .collect();
            assert_eq!(titles, vec!["third", "second", "first"]);
        }

        #[tokio::test]
        async fn test_empty_store() {
            let (db, _dir) = create_test_db().await;
            assert!(db.list_manual_stories().await.unwrap().is_empty());
        }

        #[tokio::test]
        async fn test_initialize_is_idempotent() {
            let (db, _dir) = create_test_db().await;
            db.initialize().await.unwrap();
            db.initialize().await.unwrap();
        }
    }
}

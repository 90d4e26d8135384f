//! In-memory collaborators for the core tests.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::domain::*;
use crate::playlist::PlaylistCatalog;
use crate::ports::*;
use crate::power::day_schedule;
use crate::store::{Services, Store};

pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 16, 8, 0, 0).unwrap()
}

/// Owner of every folder and note held by `FakeServices`.
pub const FAKE_OWNER: &str = "user-1";

pub fn fake_store() -> (Store, Arc<FakeServices>) {
    let fake = FakeServices::new();
    (Store::with_defaults(fake.services()), fake)
}

//=========================================================================================
// Fixtures
//=========================================================================================

pub fn fact_ids(count: usize) -> Vec<FactId> {
    (0..count).map(|i| FactId::new(format!("fact-{}", i))).collect()
}

pub fn folder(id: &str, title: &str) -> Folder {
    Folder {
        id: FolderId::new(id),
        title: title.to_string(),
        color: FolderColor::Default,
        tags: Vec::new(),
        timestamp: fixed_now(),
    }
}

pub fn note(id: &str, folder_id: &str, title: &str, favorite: bool) -> Note {
    Note {
        id: NoteId::new(id),
        title: title.to_string(),
        content: format!("Content of {}", title),
        folder_id: FolderId::new(folder_id),
        tags: Vec::new(),
        timestamp: fixed_now(),
        encrypted: false,
        favorite,
    }
}

pub fn light_data(hours: Vec<HourStatus>) -> LightData {
    LightData {
        street: "Main".to_string(),
        house_number: "1".to_string(),
        queue_number: "3.1".to_string(),
        last_update: "16.10.2026 07:45".to_string(),
        today: day_schedule(&[HourStatus::On; 24]),
        tomorrow: Vec::new(),
        today_date: "16.10.26".to_string(),
        tomorrow_date: "17.10.26".to_string(),
        week_schedule: WeekSchedule {
            days: vec![WeekDay {
                day_name: "Friday".to_string(),
                day_name_en: "Friday".to_string(),
                is_today: true,
                is_yesterday: false,
                hours,
                blocks: Vec::new(),
            }],
            timestamp: fixed_now(),
        },
    }
}

pub fn news_article(id: &str) -> NewsDataArticle {
    NewsDataArticle {
        article_id: id.to_string(),
        link: format!("https://news.example/{}", id),
        title: format!("Article {}", id),
        description: None,
        source_name: Some("example".to_string()),
        image_url: None,
        pub_date: None,
        category: vec!["top".to_string()],
    }
}

pub fn hacker_news_article(id: u64) -> HackerNewsArticle {
    HackerNewsArticle {
        id,
        by: "pg".to_string(),
        title: format!("Story {}", id),
        url: Some(format!("https://hn.example/{}", id)),
        score: 10,
        time: 1_760_601_600,
        descendants: 0,
    }
}

//=========================================================================================
// Fake collaborators
//=========================================================================================

#[derive(Default)]
pub struct FakeServices {
    calls: Mutex<HashMap<&'static str, usize>>,
    failures: Mutex<HashMap<&'static str, PortError>>,
    delay: Mutex<Option<Duration>>,

    sensor: Mutex<Option<PortResult<SensorReading>>>,
    fact_ids: Mutex<Vec<FactId>>,
    light: Mutex<Option<PortResult<LightData>>>,
    news_pages: Mutex<VecDeque<PortResult<NewsDataPage>>>,
    news_cursors: Mutex<Vec<Option<String>>>,
    hacker_news: Mutex<VecDeque<PortResult<Vec<HackerNewsArticle>>>>,

    folders: Mutex<Vec<Folder>>,
    notes: Mutex<Vec<Note>>,
    next_id: Mutex<usize>,
}

impl FakeServices {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn services(self: &Arc<Self>) -> Services {
        Services {
            air_quality: self.clone(),
            facts: self.clone(),
            light: self.clone(),
            news: self.clone(),
            notes: self.clone(),
            clock: self.clone(),
            playlists: Arc::new(PlaylistCatalog::builtin()),
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        fixed_now()
    }

    pub fn calls(&self, method: &str) -> usize {
        self.calls.lock().unwrap().get(method).copied().unwrap_or(0)
    }

    /// Every call sleeps for `delay` before answering.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    /// The next call to `method` fails with `error`.
    pub fn fail_next(&self, method: &'static str, error: PortError) {
        self.failures.lock().unwrap().insert(method, error);
    }

    pub fn set_sensor(&self, reading: PortResult<SensorReading>) {
        *self.sensor.lock().unwrap() = Some(reading);
    }

    pub fn set_fact_ids(&self, ids: Vec<FactId>) {
        *self.fact_ids.lock().unwrap() = ids;
    }

    pub fn set_light(&self, data: PortResult<LightData>) {
        *self.light.lock().unwrap() = Some(data);
    }

    pub fn push_news_page(&self, page: PortResult<NewsDataPage>) {
        self.news_pages.lock().unwrap().push_back(page);
    }

    pub fn news_cursors(&self) -> Vec<Option<String>> {
        self.news_cursors.lock().unwrap().clone()
    }

    pub fn push_hacker_news(&self, batch: PortResult<Vec<HackerNewsArticle>>) {
        self.hacker_news.lock().unwrap().push_back(batch);
    }

    pub fn seed_folder(&self, folder: Folder) {
        self.folders.lock().unwrap().push(folder);
    }

    pub fn seed_note(&self, note: Note) {
        self.notes.lock().unwrap().push(note);
    }

    async fn enter(&self, method: &'static str) -> PortResult<()> {
        *self.calls.lock().unwrap().entry(method).or_default() += 1;
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match self.failures.lock().unwrap().remove(method) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn new_id(&self, prefix: &str) -> String {
        let mut next = self.next_id.lock().unwrap();
        *next += 1;
        format!("{}-{}", prefix, next)
    }

    /// Rows of other users look missing, as they do to a scoped query.
    fn owned(&self, user_id: &UserId, id: &str) -> PortResult<()> {
        if user_id.as_str() != FAKE_OWNER {
            return Err(PortError::NotFound(id.to_string()));
        }
        Ok(())
    }

    fn with_note<T>(&self, id: &NoteId, f: impl FnOnce(&mut Note) -> T) -> PortResult<T> {
        let mut notes = self.notes.lock().unwrap();
        let note = notes
            .iter_mut()
            .find(|n| &n.id == id)
            .ok_or_else(|| PortError::NotFound(id.to_string()))?;
        Ok(f(note))
    }
}

impl Clock for FakeServices {
    fn now(&self) -> DateTime<Utc> {
        fixed_now()
    }
}

#[async_trait]
impl AirQualityService for FakeServices {
    async fn latest_reading(&self) -> PortResult<SensorReading> {
        self.enter("latest_reading").await?;
        self.sensor
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Err(PortError::Unexpected("no reading".to_string())))
    }
}

#[async_trait]
impl FactService for FakeServices {
    async fn fact_id_page(&self, offset: usize, limit: usize) -> PortResult<Vec<FactId>> {
        self.enter("fact_id_page").await?;
        let ids = self.fact_ids.lock().unwrap();
        Ok(ids.iter().skip(offset).take(limit).cloned().collect())
    }

    async fn get_fact(&self, id: &FactId) -> PortResult<Fact> {
        self.enter("get_fact").await?;
        if !self.fact_ids.lock().unwrap().contains(id) {
            return Err(PortError::NotFound(id.to_string()));
        }
        Ok(Fact {
            id: id.clone(),
            category: "science".to_string(),
            title: format!("Fact {}", id),
        })
    }
}

#[async_trait]
impl LightService for FakeServices {
    async fn fetch_schedule(&self) -> PortResult<LightData> {
        self.enter("fetch_schedule").await?;
        self.light
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Err(PortError::Unexpected("no schedule".to_string())))
    }
}

#[async_trait]
impl NewsService for FakeServices {
    async fn news_data_page(&self, next_page: Option<&str>) -> PortResult<NewsDataPage> {
        self.news_cursors
            .lock()
            .unwrap()
            .push(next_page.map(str::to_string));
        self.enter("news_data_page").await?;
        self.news_pages
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(PortError::Unexpected("no page queued".to_string())))
    }

    async fn hacker_news(&self, _limit: usize) -> PortResult<Vec<HackerNewsArticle>> {
        self.enter("hacker_news").await?;
        self.hacker_news
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(PortError::Unexpected("no batch queued".to_string())))
    }
}

#[async_trait]
impl NotesService for FakeServices {
    async fn list_folders(&self, user_id: &UserId) -> PortResult<FolderListing> {
        self.enter("list_folders").await?;
        if user_id.as_str() != FAKE_OWNER {
            return Ok(FolderListing::default());
        }
        let mut favorite_notes: Vec<Note> = self
            .notes
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.favorite)
            .cloned()
            .collect();
        favorite_notes.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(FolderListing {
            folders: self.folders.lock().unwrap().clone(),
            favorite_notes,
        })
    }

    async fn create_folder(&self, user_id: &UserId) -> PortResult<Folder> {
        self.enter("create_folder").await?;
        self.owned(user_id, "folder")?;
        let created = folder(&self.new_id("folder"), "New folder");
        self.folders.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn update_folder(
        &self,
        folder_id: &FolderId,
        user_id: &UserId,
        update: &FolderUpdate,
    ) -> PortResult<Folder> {
        self.enter("update_folder").await?;
        self.owned(user_id, folder_id.as_str())?;
        let mut folders = self.folders.lock().unwrap();
        let folder = folders
            .iter_mut()
            .find(|f| &f.id == folder_id)
            .ok_or_else(|| PortError::NotFound(folder_id.to_string()))?;
        if let Some(title) = &update.title {
            folder.title = title.clone();
        }
        if let Some(color) = update.color {
            folder.color = color;
        }
        Ok(folder.clone())
    }

    async fn delete_folder(&self, folder_id: &FolderId, user_id: &UserId) -> PortResult<()> {
        self.enter("delete_folder").await?;
        self.owned(user_id, folder_id.as_str())?;
        self.folders.lock().unwrap().retain(|f| &f.id != folder_id);
        Ok(())
    }

    async fn list_folder_notes(&self, folder_id: &FolderId, user_id: &UserId) -> PortResult<Vec<Note>> {
        self.enter("list_folder_notes").await?;
        if user_id.as_str() != FAKE_OWNER {
            return Ok(Vec::new());
        }
        Ok(self
            .notes
            .lock()
            .unwrap()
            .iter()
            .filter(|n| &n.folder_id == folder_id)
            .cloned()
            .collect())
    }

    async fn get_note(&self, note_id: &NoteId, user_id: &UserId) -> PortResult<Note> {
        self.enter("get_note").await?;
        self.owned(user_id, note_id.as_str())?;
        self.with_note(note_id, |n| n.clone())
    }

    async fn create_note(&self, folder_id: &FolderId, user_id: &UserId) -> PortResult<Note> {
        self.enter("create_note").await?;
        self.owned(user_id, folder_id.as_str())?;
        let created = note(&self.new_id("note"), folder_id.as_str(), "Untitled", false);
        self.notes.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn update_note(&self, note_id: &NoteId, user_id: &UserId, update: &NoteUpdate) -> PortResult<Note> {
        self.enter("update_note").await?;
        self.owned(user_id, note_id.as_str())?;
        self.with_note(note_id, |n| {
            if let Some(title) = &update.title {
                n.title = title.clone();
            }
            if let Some(content) = &update.content {
                n.content = content.clone();
            }
            n.clone()
        })
    }

    async fn move_note(&self, note_id: &NoteId, folder_id: &FolderId, user_id: &UserId) -> PortResult<Note> {
        self.enter("move_note").await?;
        self.owned(user_id, note_id.as_str())?;
        self.with_note(note_id, |n| {
            n.folder_id = folder_id.clone();
            n.clone()
        })
    }

    async fn delete_note(&self, note_id: &NoteId, user_id: &UserId) -> PortResult<()> {
        self.enter("delete_note").await?;
        self.owned(user_id, note_id.as_str())?;
        self.notes.lock().unwrap().retain(|n| &n.id != note_id);
        Ok(())
    }

    async fn set_note_favorite(&self, note_id: &NoteId, user_id: &UserId, favorite: bool) -> PortResult<Note> {
        self.enter("set_note_favorite").await?;
        self.owned(user_id, note_id.as_str())?;
        self.with_note(note_id, |n| {
            n.favorite = favorite;
            n.clone()
        })
    }

    async fn encrypt_note(
        &self,
        note_id: &NoteId,
        user_id: &UserId,
        content: &str,
        title: Option<&str>,
    ) -> PortResult<Note> {
        self.enter("encrypt_note").await?;
        self.owned(user_id, note_id.as_str())?;
        self.with_note(note_id, |n| {
            n.content = format!("enc:{}", content);
            n.encrypted = true;
            if let Some(title) = title {
                n.title = title.to_string();
            }
            n.clone()
        })
    }

    async fn decrypt_note(&self, note_id: &NoteId, user_id: &UserId) -> PortResult<String> {
        self.enter("decrypt_note").await?;
        self.owned(user_id, note_id.as_str())?;
        self.with_note(note_id, |n| {
            n.content.strip_prefix("enc:").unwrap_or(&n.content).to_string()
        })
    }

    async fn decrypt_note_in_store(&self, note_id: &NoteId, user_id: &UserId) -> PortResult<Note> {
        self.enter("decrypt_note_in_store").await?;
        self.owned(user_id, note_id.as_str())?;
        self.with_note(note_id, |n| {
            if let Some(plain) = n.content.strip_prefix("enc:") {
                n.content = plain.to_string();
            }
            n.encrypted = false;
            n.clone()
        })
    }
}

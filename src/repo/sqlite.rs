use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::Connection;

use crate::error::{Error, Result};
use crate::model::{
    Album, ExifInfo, GpsPoint, MediaType, MonthCount, Photo, SourceDirectory, Tag, YearCount,
};
use crate::repo::PhotoRepository;

/// Upper bound on search results returned in one call
const SEARCH_LIMIT: i64 = 500;

/// SQLite-backed photo repository.
///
/// Owns the catalog database: photo records per source directory, tag and
/// album associations. The connection sits behind a mutex because rusqlite
/// connections are not Sync; the engine itself serializes access anyway.
pub struct SqlitePhotoRepository {
    conn: Mutex<Connection>,
}

impl SqlitePhotoRepository {
    /// Open (or create) the catalog at `db_path` and initialize the schema.
    pub fn new(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(db_path)?;
        let repo = SqlitePhotoRepository {
            conn: Mutex::new(conn),
        };
        repo.init_schema()?;
        tracing::debug!(path = %db_path.display(), "catalog database opened");
        Ok(repo)
    }

    /// Private catalog held entirely in memory. Used by tests and previews.
    pub fn open_in_memory() -> Result<Self> {
        let repo = SqlitePhotoRepository {
            conn: Mutex::new(Connection::open_in_memory()?),
        };
        repo.init_schema()?;
        Ok(repo)
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS library (
                id INTEGER PRIMARY KEY,
                root_path TEXT NOT NULL UNIQUE,
                created_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS photos (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                library_id INTEGER NOT NULL,
                path TEXT NOT NULL,
                filename TEXT NOT NULL,
                folder_rel TEXT NOT NULL,
                taken_at TEXT,
                modified_at TEXT NOT NULL,
                media_type TEXT NOT NULL,
                size_bytes INTEGER NOT NULL,
                width INTEGER,
                height INTEGER,
                is_favorite INTEGER NOT NULL DEFAULT 0,
                is_deleted INTEGER NOT NULL DEFAULT 0,
                deleted_at TEXT,
                camera_make TEXT,
                camera_model TEXT,
                lens TEXT,
                iso INTEGER,
                shutter_speed TEXT,
                aperture TEXT,
                focal_length TEXT,
                gps_lat REAL,
                gps_lon REAL,
                UNIQUE(library_id, path),
                FOREIGN KEY (library_id) REFERENCES library(id)
            );
            CREATE INDEX IF NOT EXISTS idx_photos_library_taken ON photos(library_id, taken_at);
            CREATE INDEX IF NOT EXISTS idx_photos_library_folder ON photos(library_id, folder_rel);
            CREATE INDEX IF NOT EXISTS idx_photos_path_search ON photos(path, filename);

            CREATE TABLE IF NOT EXISTS tags (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                color TEXT NOT NULL DEFAULT '#0071e3'
            );
            CREATE TABLE IF NOT EXISTS photo_tags (
                photo_id INTEGER NOT NULL,
                tag_id INTEGER NOT NULL,
                PRIMARY KEY (photo_id, tag_id),
                FOREIGN KEY (photo_id) REFERENCES photos(id) ON DELETE CASCADE,
                FOREIGN KEY (tag_id) REFERENCES tags(id) ON DELETE CASCADE
            );
            CREATE TABLE IF NOT EXISTS albums (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS album_photos (
                album_id INTEGER NOT NULL,
                photo_id INTEGER NOT NULL,
                position INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (album_id, photo_id),
                FOREIGN KEY (album_id) REFERENCES albums(id) ON DELETE CASCADE,
                FOREIGN KEY (photo_id) REFERENCES photos(id) ON DELETE CASCADE
            );
            "#,
        )?;
        Self::run_migrations(&conn)?;
        Ok(())
    }

    /// Additive column migrations for databases created by older versions.
    /// Safe to re-run; only missing columns are added.
    fn run_migrations(conn: &Connection) -> Result<()> {
        let columns: Vec<String> = conn
            .prepare("PRAGMA table_info(photos)")?
            .query_map([], |row| row.get::<_, String>(1))?
            .filter_map(|r| r.ok())
            .collect();

        let migrations: &[(&str, &str)] = &[
            ("is_favorite", "ALTER TABLE photos ADD COLUMN is_favorite INTEGER NOT NULL DEFAULT 0"),
            ("is_deleted", "ALTER TABLE photos ADD COLUMN is_deleted INTEGER NOT NULL DEFAULT 0"),
            ("deleted_at", "ALTER TABLE photos ADD COLUMN deleted_at TEXT"),
            ("camera_make", "ALTER TABLE photos ADD COLUMN camera_make TEXT"),
            ("camera_model", "ALTER TABLE photos ADD COLUMN camera_model TEXT"),
            ("lens", "ALTER TABLE photos ADD COLUMN lens TEXT"),
            ("iso", "ALTER TABLE photos ADD COLUMN iso INTEGER"),
            ("shutter_speed", "ALTER TABLE photos ADD COLUMN shutter_speed TEXT"),
            ("aperture", "ALTER TABLE photos ADD COLUMN aperture TEXT"),
            ("focal_length", "ALTER TABLE photos ADD COLUMN focal_length TEXT"),
            ("gps_lat", "ALTER TABLE photos ADD COLUMN gps_lat REAL"),
            ("gps_lon", "ALTER TABLE photos ADD COLUMN gps_lon REAL"),
        ];

        for &(col, sql) in migrations {
            if !columns.iter().any(|c| c == col) {
                conn.execute(sql, [])?;
                tracing::info!(column = col, "migrated photos table");
            }
        }
        Ok(())
    }

    /// Register a source directory, returning its id. Re-registering an
    /// existing root is idempotent.
    pub fn get_or_create_source(&self, root_path: &str) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        let id: i64 = conn.query_row(
            "INSERT INTO library (root_path, created_at) VALUES (?1, ?2)
             ON CONFLICT(root_path) DO UPDATE SET created_at = created_at RETURNING id",
            rusqlite::params![root_path, fmt_ts(Utc::now())],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    /// Ingest one record under a source. The scanner assigns everything but
    /// the id; `photo.id` and `photo.source` on the input are ignored.
    /// Re-ingesting a (source, path) pair replaces the earlier row.
    pub fn insert_photo(&self, source_id: i64, photo: &Photo) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        let exif = photo.exif.clone().unwrap_or_default();
        conn.execute(
            r#"
            INSERT OR REPLACE INTO photos (library_id, path, filename, folder_rel, taken_at, modified_at,
                                           media_type, size_bytes, width, height, is_favorite, is_deleted, deleted_at,
                                           camera_make, camera_model, lens, iso, shutter_speed, aperture, focal_length,
                                           gps_lat, gps_lon)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22)
            "#,
            rusqlite::params![
                source_id,
                photo.path,
                photo.filename,
                photo.folder_rel,
                photo.taken_at.map(fmt_ts),
                fmt_ts(photo.modified_at),
                media_type_str(photo.media_type),
                photo.size_bytes,
                photo.width,
                photo.height,
                photo.is_favorite,
                photo.is_deleted,
                photo.deleted_at.map(fmt_ts),
                exif.camera_make,
                exif.camera_model,
                exif.lens,
                exif.iso,
                exif.shutter_speed,
                exif.aperture,
                exif.focal_length,
                exif.gps.map(|g| g.lat),
                exif.gps.map(|g| g.lon),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Drop a source and everything indexed under it
    pub fn remove_source(&self, source_id: i64) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "DELETE FROM photo_tags WHERE photo_id IN (SELECT id FROM photos WHERE library_id = ?1)",
            [source_id],
        )?;
        conn.execute(
            "DELETE FROM album_photos WHERE photo_id IN (SELECT id FROM photos WHERE library_id = ?1)",
            [source_id],
        )?;
        conn.execute("DELETE FROM photos WHERE library_id = ?1", [source_id])?;
        conn.execute("DELETE FROM library WHERE id = ?1", [source_id])?;
        Ok(())
    }

    /// Standard photo columns, joined with the owning source's root path
    fn photo_select() -> &'static str {
        "SELECT p.id, p.path, p.filename, p.folder_rel, p.taken_at, p.modified_at, p.media_type,
                p.size_bytes, p.width, p.height, p.is_favorite, p.is_deleted, p.deleted_at,
                p.camera_make, p.camera_model, p.lens, p.iso, p.shutter_speed, p.aperture,
                p.focal_length, p.gps_lat, p.gps_lon, l.root_path
         FROM photos p JOIN library l ON l.id = p.library_id"
    }

    fn photo_from_row(row: &rusqlite::Row) -> Result<Photo> {
        let taken_at: Option<String> = row.get(4)?;
        let modified_at: String = row.get(5)?;
        let deleted_at: Option<String> = row.get(12)?;
        let media_type: String = row.get(6)?;
        let root_path: String = row.get(22)?;

        let gps = match (row.get::<_, Option<f64>>(20)?, row.get::<_, Option<f64>>(21)?) {
            (Some(lat), Some(lon)) => Some(GpsPoint { lat, lon }),
            _ => None,
        };
        let exif = ExifInfo {
            camera_make: row.get(13)?,
            camera_model: row.get(14)?,
            lens: row.get(15)?,
            iso: row.get(16)?,
            shutter_speed: row.get(17)?,
            aperture: row.get(18)?,
            focal_length: row.get(19)?,
            gps,
        };

        Ok(Photo {
            id: row.get(0)?,
            path: row.get(1)?,
            filename: row.get(2)?,
            folder_rel: row.get(3)?,
            width: row.get(8)?,
            height: row.get(9)?,
            taken_at: taken_at.as_deref().map(parse_ts).transpose()?,
            modified_at: parse_ts(&modified_at)?,
            size_bytes: row.get(7)?,
            media_type: if media_type == "video" {
                MediaType::Video
            } else {
                MediaType::Photo
            },
            source: source_name(&root_path),
            is_favorite: row.get::<_, i64>(10)? != 0,
            is_deleted: row.get::<_, i64>(11)? != 0,
            deleted_at: deleted_at.as_deref().map(parse_ts).transpose()?,
            exif: if exif == ExifInfo::default() { None } else { Some(exif) },
        })
    }

    fn query_photos(conn: &Connection, sql: &str, params: &[&dyn rusqlite::ToSql]) -> Result<Vec<Photo>> {
        let mut stmt = conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(Self::photo_from_row(row)?);
        }
        Ok(out)
    }
}

#[async_trait]
impl PhotoRepository for SqlitePhotoRepository {
    async fn fetch_page(&self, limit: usize, offset: usize) -> Result<Vec<Photo>> {
        let conn = self.conn.lock().unwrap();
        let sql = format!(
            "{} WHERE p.is_deleted = 0
             ORDER BY COALESCE(p.taken_at, p.modified_at) DESC, p.path
             LIMIT ?1 OFFSET ?2",
            Self::photo_select()
        );
        Self::query_photos(&conn, &sql, &[&(limit as i64), &(offset as i64)])
    }

    async fn fetch_count(&self) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        let count = conn.query_row(
            "SELECT COUNT(*) FROM photos WHERE is_deleted = 0",
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    async fn fetch_libraries(&self) -> Result<Vec<SourceDirectory>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT l.id, l.root_path, COUNT(p.id) FROM library l
             LEFT JOIN photos p ON p.library_id = l.id AND p.is_deleted = 0
             GROUP BY l.id ORDER BY l.root_path",
        )?;
        let mut rows = stmt.query([])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let root_path: String = row.get(1)?;
            out.push(SourceDirectory {
                id: row.get(0)?,
                name: source_name(&root_path),
                root_path,
                photo_count: row.get(2)?,
            });
        }
        Ok(out)
    }

    async fn photo_by_id(&self, id: i64) -> Result<Option<Photo>> {
        let conn = self.conn.lock().unwrap();
        let sql = format!("{} WHERE p.id = ?1", Self::photo_select());
        Ok(Self::query_photos(&conn, &sql, &[&id])?.into_iter().next())
    }

    async fn toggle_favorite(&self, id: i64) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let current: i64 = conn
            .query_row("SELECT is_favorite FROM photos WHERE id = ?1", [id], |row| row.get(0))
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => {
                    Error::Validation(format!("photo {} not found", id))
                }
                other => Error::Storage(other),
            })?;
        let new_val = i64::from(current == 0);
        conn.execute(
            "UPDATE photos SET is_favorite = ?1 WHERE id = ?2",
            rusqlite::params![new_val, id],
        )?;
        Ok(new_val != 0)
    }

    async fn soft_delete(&self, ids: &[i64]) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let now = fmt_ts(Utc::now());
        for id in ids {
            conn.execute(
                "UPDATE photos SET is_deleted = 1, deleted_at = ?1 WHERE id = ?2",
                rusqlite::params![now, id],
            )?;
        }
        Ok(())
    }

    async fn restore(&self, ids: &[i64]) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        for id in ids {
            conn.execute(
                "UPDATE photos SET is_deleted = 0, deleted_at = NULL WHERE id = ?1",
                [id],
            )?;
        }
        Ok(())
    }

    async fn hard_delete(&self, ids: &[i64], delete_from_disk: bool) -> Result<u64> {
        let conn = self.conn.lock().unwrap();
        let mut paths = Vec::new();
        for id in ids {
            if let Ok(path) = conn.query_row(
                "SELECT path FROM photos WHERE id = ?1",
                [id],
                |row| row.get::<_, String>(0),
            ) {
                paths.push(path);
            }
            conn.execute("DELETE FROM photo_tags WHERE photo_id = ?1", [id])?;
            conn.execute("DELETE FROM album_photos WHERE photo_id = ?1", [id])?;
            conn.execute("DELETE FROM photos WHERE id = ?1", [id])?;
        }
        if delete_from_disk {
            for p in &paths {
                let _ = std::fs::remove_file(p);
            }
        }
        Ok(paths.len() as u64)
    }

    async fn rename(&self, id: i64, new_filename: &str) -> Result<String> {
        let conn = self.conn.lock().unwrap();
        let old_path: String = conn
            .query_row("SELECT path FROM photos WHERE id = ?1", [id], |row| row.get(0))
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => {
                    Error::Validation(format!("photo {} not found", id))
                }
                other => Error::Storage(other),
            })?;
        let new_path = Path::new(&old_path)
            .with_file_name(new_filename)
            .to_string_lossy()
            .to_string();

        let collisions: i64 = conn.query_row(
            "SELECT COUNT(*) FROM photos WHERE path = ?1 AND id != ?2",
            rusqlite::params![new_path, id],
            |row| row.get(0),
        )?;
        if collisions > 0 || Path::new(&new_path).exists() {
            return Err(Error::Validation(format!(
                "a file named {} already exists",
                new_filename
            )));
        }

        // rename on disk first so a filesystem failure leaves the catalog
        // untouched; records for files that no longer exist rename in place
        if Path::new(&old_path).exists() {
            std::fs::rename(&old_path, &new_path)?;
        }
        conn.execute(
            "UPDATE photos SET filename = ?1, path = ?2 WHERE id = ?3",
            rusqlite::params![new_filename, new_path, id],
        )?;
        Ok(new_path)
    }

    async fn search(&self, query: &str) -> Result<Vec<Photo>> {
        let conn = self.conn.lock().unwrap();
        if let Some(tag) = query.strip_prefix('#') {
            let sql = format!(
                "{} JOIN photo_tags pt ON pt.photo_id = p.id JOIN tags t ON t.id = pt.tag_id
                 WHERE p.is_deleted = 0 AND t.name = ?1 COLLATE NOCASE
                 ORDER BY COALESCE(p.taken_at, p.modified_at) DESC LIMIT ?2",
                Self::photo_select()
            );
            return Self::query_photos(&conn, &sql, &[&tag, &SEARCH_LIMIT]);
        }
        let pattern = format!("%{}%", escape_like(query));
        let sql = format!(
            "{} WHERE p.is_deleted = 0 AND
                 (p.path LIKE ?1 ESCAPE '\\' OR p.filename LIKE ?1 ESCAPE '\\'
                  OR p.folder_rel LIKE ?1 ESCAPE '\\'
                  OR p.id IN (SELECT pt.photo_id FROM photo_tags pt
                              JOIN tags t ON t.id = pt.tag_id
                              WHERE t.name LIKE ?1 ESCAPE '\\'))
             ORDER BY COALESCE(p.taken_at, p.modified_at) DESC LIMIT ?2",
            Self::photo_select()
        );
        Self::query_photos(&conn, &sql, &[&pattern, &SEARCH_LIMIT])
    }

    async fn years(&self) -> Result<Vec<YearCount>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT CAST(strftime('%Y', COALESCE(taken_at, modified_at)) AS INTEGER) AS y, COUNT(*)
             FROM photos WHERE is_deleted = 0 GROUP BY y ORDER BY y DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(YearCount {
                year: row.get(0)?,
                count: row.get(1)?,
            })
        })?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    async fn months(&self, year: i32) -> Result<Vec<MonthCount>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT CAST(strftime('%m', COALESCE(taken_at, modified_at)) AS INTEGER) AS m, COUNT(*)
             FROM photos WHERE is_deleted = 0
               AND strftime('%Y', COALESCE(taken_at, modified_at)) = ?1
             GROUP BY m ORDER BY m DESC",
        )?;
        let year_str = format!("{:04}", year);
        let rows = stmt.query_map([year_str], move |row| {
            Ok(MonthCount {
                year,
                month: row.get(0)?,
                count: row.get(1)?,
            })
        })?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    async fn media_type_counts(&self) -> Result<Vec<(MediaType, i64)>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT media_type, COUNT(*) FROM photos WHERE is_deleted = 0 GROUP BY media_type",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;
        Ok(rows
            .filter_map(|r| r.ok())
            .map(|(t, c)| {
                let media = if t == "video" { MediaType::Video } else { MediaType::Photo };
                (media, c)
            })
            .collect())
    }

    async fn create_tag(&self, name: &str, color: &str) -> Result<Tag> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO tags (name, color) VALUES (?1, ?2)",
            rusqlite::params![name, color],
        )
        .map_err(|e| match e {
            rusqlite::Error::SqliteFailure(err, _)
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Error::Validation(format!("a tag named {} already exists", name))
            }
            other => Error::Storage(other),
        })?;
        Ok(Tag {
            id: conn.last_insert_rowid(),
            name: name.to_string(),
            color: color.to_string(),
        })
    }

    async fn delete_tag(&self, tag_id: i64) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM photo_tags WHERE tag_id = ?1", [tag_id])?;
        conn.execute("DELETE FROM tags WHERE id = ?1", [tag_id])?;
        Ok(())
    }

    async fn list_tags(&self) -> Result<Vec<Tag>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT id, name, color FROM tags ORDER BY name")?;
        let rows = stmt.query_map([], |row| {
            Ok(Tag {
                id: row.get(0)?,
                name: row.get(1)?,
                color: row.get(2)?,
            })
        })?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    async fn tag_photos(&self, ids: &[i64], tag_id: i64) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        for id in ids {
            conn.execute(
                "INSERT OR IGNORE INTO photo_tags (photo_id, tag_id) VALUES (?1, ?2)",
                rusqlite::params![id, tag_id],
            )?;
        }
        Ok(())
    }

    async fn untag_photos(&self, ids: &[i64], tag_id: i64) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        for id in ids {
            conn.execute(
                "DELETE FROM photo_tags WHERE photo_id = ?1 AND tag_id = ?2",
                rusqlite::params![id, tag_id],
            )?;
        }
        Ok(())
    }

    async fn tags_for_photo(&self, id: i64) -> Result<Vec<Tag>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT t.id, t.name, t.color FROM tags t
             JOIN photo_tags pt ON pt.tag_id = t.id WHERE pt.photo_id = ?1 ORDER BY t.name",
        )?;
        let rows = stmt.query_map([id], |row| {
            Ok(Tag {
                id: row.get(0)?,
                name: row.get(1)?,
                color: row.get(2)?,
            })
        })?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    async fn create_album(&self, name: &str) -> Result<Album> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now();
        conn.execute(
            "INSERT INTO albums (name, created_at) VALUES (?1, ?2)",
            rusqlite::params![name, fmt_ts(now)],
        )?;
        Ok(Album {
            id: conn.last_insert_rowid(),
            name: name.to_string(),
            created_at: now,
            photo_count: 0,
            cover_path: None,
        })
    }

    async fn delete_album(&self, album_id: i64) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM album_photos WHERE album_id = ?1", [album_id])?;
        conn.execute("DELETE FROM albums WHERE id = ?1", [album_id])?;
        Ok(())
    }

    async fn rename_album(&self, album_id: i64, new_name: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute(
            "UPDATE albums SET name = ?1 WHERE id = ?2",
            rusqlite::params![new_name, album_id],
        )?;
        if changed == 0 {
            return Err(Error::Validation(format!("album {} not found", album_id)));
        }
        Ok(())
    }

    async fn list_albums(&self) -> Result<Vec<Album>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT a.id, a.name, a.created_at,
                    (SELECT COUNT(*) FROM album_photos ap WHERE ap.album_id = a.id),
                    (SELECT p.path FROM album_photos ap2 JOIN photos p ON p.id = ap2.photo_id
                     WHERE ap2.album_id = a.id ORDER BY ap2.position LIMIT 1)
             FROM albums a ORDER BY a.created_at DESC",
        )?;
        let mut rows = stmt.query([])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let created: String = row.get(2)?;
            out.push(Album {
                id: row.get(0)?,
                name: row.get(1)?,
                created_at: parse_ts(&created)?,
                photo_count: row.get(3)?,
                cover_path: row.get(4)?,
            });
        }
        Ok(out)
    }

    async fn add_to_album(&self, album_id: i64, ids: &[i64]) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let max_pos: i64 = conn.query_row(
            "SELECT COALESCE(MAX(position), 0) FROM album_photos WHERE album_id = ?1",
            [album_id],
            |row| row.get(0),
        )?;
        for (i, id) in ids.iter().enumerate() {
            conn.execute(
                "INSERT OR IGNORE INTO album_photos (album_id, photo_id, position) VALUES (?1, ?2, ?3)",
                rusqlite::params![album_id, id, max_pos + 1 + i as i64],
            )?;
        }
        Ok(())
    }

    async fn remove_from_album(&self, album_id: i64, ids: &[i64]) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        for id in ids {
            conn.execute(
                "DELETE FROM album_photos WHERE album_id = ?1 AND photo_id = ?2",
                rusqlite::params![album_id, id],
            )?;
        }
        Ok(())
    }

    async fn album_photos(&self, album_id: i64) -> Result<Vec<Photo>> {
        let conn = self.conn.lock().unwrap();
        let sql = format!(
            "{} JOIN album_photos ap ON ap.photo_id = p.id
             WHERE ap.album_id = ?1 AND p.is_deleted = 0 ORDER BY ap.position",
            Self::photo_select()
        );
        Self::query_photos(&conn, &sql, &[&album_id])
    }
}

fn fmt_ts(t: DateTime<Utc>) -> String {
    t.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

fn parse_ts(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| Error::Fetch(format!("invalid timestamp {:?}: {}", s, e)))
}

fn media_type_str(t: MediaType) -> &'static str {
    match t {
        MediaType::Photo => "photo",
        MediaType::Video => "video",
    }
}

/// Source name shown in the UI: the root directory's basename
fn source_name(root_path: &str) -> String {
    Path::new(root_path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("Library")
        .to_string()
}

/// Escape LIKE metacharacters so user input matches literally
fn escape_like(query: &str) -> String {
    query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

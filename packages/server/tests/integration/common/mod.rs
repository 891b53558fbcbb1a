use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use serde_json::Value;
use tempfile::TempDir;

use mahasiswa_server::config::{
    AppConfig, CorsConfig, DEFAULT_MAX_UPLOAD_SIZE, DatabaseConfig, ServerConfig, UploadConfig,
};
use mahasiswa_server::entity::mahasiswa;
use mahasiswa_server::repository::{
    ListFilter, MahasiswaRepository, NewMahasiswa, SeaOrmRepository,
};
use mahasiswa_server::state::AppState;
use mahasiswa_server::uploads::{BoxReader, FilesystemUploadStore, UploadError, UploadStore};

/// Origin allowed by the test CORS configuration.
pub const FRONTEND_ORIGIN: &str = "http://localhost:5173";

pub mod routes {
    pub const HEALTH: &str = "/health";
    pub const OPENAPI: &str = "/api-docs/openapi.json";
    pub const MAHASISWA: &str = "/api/mahasiswa";

    pub fn mahasiswa(id: i64) -> String {
        format!("/api/mahasiswa/{id}")
    }

    pub fn list(query: &str) -> String {
        format!("/api/mahasiswa?{query}")
    }

    pub fn upload(name: &str) -> String {
        format!("/uploads/{name}")
    }
}

/// Replacements for the default SQLite repository or filesystem upload store.
#[derive(Default)]
pub struct Overrides {
    pub repo: Option<Arc<dyn MahasiswaRepository>>,
    pub uploads: Option<Arc<dyn UploadStore>>,
}

/// A running test server.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub upload_dir: PathBuf,
    _upload_root: TempDir,
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    pub headers: HeaderMap,
    /// Raw response body as text.
    pub text: String,
    /// Parsed JSON body, or `Null` if the response is not valid JSON.
    pub body: Value,
}

/// Where a `TestApp` spawned on `root` stores uploads.
pub fn upload_dir_for(root: &TempDir) -> PathBuf {
    root.path().join("uploads")
}

/// Single-connection in-memory SQLite database with the schema applied.
pub async fn memory_db() -> DatabaseConnection {
    let mut opts = ConnectOptions::new("sqlite::memory:");
    opts.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(opts)
        .await
        .expect("Failed to open in-memory database");
    mahasiswa_server::database::ensure_schema(&db)
        .await
        .expect("Failed to create schema");
    db
}

fn test_config(upload_dir: &Path) -> AppConfig {
    AppConfig {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors: CorsConfig {
                allow_origins: vec![FRONTEND_ORIGIN.to_string()],
            },
        },
        database: DatabaseConfig {
            url: Some("sqlite::memory:".to_string()),
            host: "127.0.0.1".to_string(),
            port: 3306,
            user: "root".to_string(),
            password: String::new(),
            name: "mahasiswa".to_string(),
            charset: "utf8mb4".to_string(),
        },
        upload: UploadConfig {
            dir: upload_dir.to_path_buf(),
            max_size: DEFAULT_MAX_UPLOAD_SIZE,
        },
    }
}

impl TestApp {
    pub async fn spawn() -> Self {
        let root = tempfile::tempdir().expect("Failed to create temp dir");
        Self::spawn_with(root, Overrides::default()).await
    }

    pub async fn spawn_with(root: TempDir, overrides: Overrides) -> Self {
        let upload_dir = upload_dir_for(&root);
        let config = test_config(&upload_dir);

        let repo = match overrides.repo {
            Some(repo) => repo,
            None => Arc::new(SeaOrmRepository::new(memory_db().await)),
        };
        let uploads = overrides.uploads.unwrap_or_else(|| {
            Arc::new(FilesystemUploadStore::new(
                upload_dir.clone(),
                DEFAULT_MAX_UPLOAD_SIZE,
            ))
        });

        let state = AppState {
            config,
            repo,
            uploads,
        };
        let app = mahasiswa_server::build_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            client: Client::new(),
            upload_dir,
            _upload_root: root,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn get_with_origin(&self, path: &str, origin: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .header("Origin", origin)
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn preflight(&self, path: &str, origin: &str) -> TestResponse {
        let res = self
            .client
            .request(Method::OPTIONS, self.url(path))
            .header("Origin", origin)
            .header("Access-Control-Request-Method", "PUT")
            .send()
            .await
            .expect("Failed to send OPTIONS request");

        TestResponse::from_response(res).await
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn put_json(&self, path: &str, body: &Value) -> TestResponse {
        let res = self
            .client
            .put(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to send PUT request");

        TestResponse::from_response(res).await
    }

    pub async fn post_form(&self, path: &str, form: Form) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .multipart(form)
            .send()
            .await
            .expect("Failed to send multipart POST request");

        TestResponse::from_response(res).await
    }

    pub async fn put_form(&self, path: &str, form: Form) -> TestResponse {
        let res = self
            .client
            .put(self.url(path))
            .multipart(form)
            .send()
            .await
            .expect("Failed to send multipart PUT request");

        TestResponse::from_response(res).await
    }

    pub async fn delete(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .delete(self.url(path))
            .send()
            .await
            .expect("Failed to send DELETE request");

        TestResponse::from_response(res).await
    }

    /// Create a record via the JSON API and return its `id`.
    pub async fn create_mahasiswa(&self, npm: &str, nama: &str, kelas: &str, minat: &str) -> i64 {
        let res = self
            .post_json(
                routes::MAHASISWA,
                &serde_json::json!({
                    "npm": npm,
                    "nama": nama,
                    "kelas": kelas,
                    "minat": minat,
                }),
            )
            .await;
        assert_eq!(res.status, 201, "create_mahasiswa failed: {}", res.text);
        res.id()
    }

    /// Create a record with an uploaded profile image and return `(id, profile)`.
    pub async fn create_with_image(&self, npm: &str, file_name: &str) -> (i64, String) {
        let form = student_form(npm, "Budi", "3IA01", "AI").part("profile", image(file_name, 64));
        let res = self.post_form(routes::MAHASISWA, form).await;
        assert_eq!(res.status, 201, "create_with_image failed: {}", res.text);
        (res.id(), res.profile().expect("profile should be set"))
    }

    /// Names of regular files directly inside the upload directory.
    pub fn uploaded_files(&self) -> Vec<String> {
        let mut names: Vec<String> = match std::fs::read_dir(&self.upload_dir) {
            Ok(entries) => entries
                .filter_map(Result::ok)
                .filter(|e| e.path().is_file())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect(),
            Err(_) => Vec::new(),
        };
        names.sort();
        names
    }
}

impl TestResponse {
    pub async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let headers = res.headers().clone();
        let text = res.text().await.unwrap_or_default();
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Self {
            status,
            headers,
            text,
            body,
        }
    }

    pub fn id(&self) -> i64 {
        self.body["data"]["id"]
            .as_i64()
            .expect("response body should contain 'data.id'")
    }

    pub fn profile(&self) -> Option<String> {
        self.body["data"]["profile"].as_str().map(String::from)
    }

    pub fn error(&self) -> &str {
        self.body["error"]
            .as_str()
            .expect("response body should contain 'error'")
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// `npm` values of a list response, in order.
    pub fn npms(&self) -> Vec<String> {
        self.body["data"]
            .as_array()
            .expect("response body should contain a 'data' array")
            .iter()
            .map(|m| m["npm"].as_str().unwrap().to_string())
            .collect()
    }
}

/// Multipart form with the four text fields.
pub fn student_form(npm: &str, nama: &str, kelas: &str, minat: &str) -> Form {
    Form::new()
        .text("npm", npm.to_string())
        .text("nama", nama.to_string())
        .text("kelas", kelas.to_string())
        .text("minat", minat.to_string())
}

/// A file part of `size` bytes named `file_name`.
pub fn image(file_name: &str, size: usize) -> Part {
    Part::bytes(vec![0xAB; size]).file_name(file_name.to_string())
}

/// Repository whose every call fails like a lost database connection.
pub struct FailingRepository;

fn unavailable() -> DbErr {
    DbErr::Custom("database unavailable".into())
}

#[async_trait]
impl MahasiswaRepository for FailingRepository {
    async fn find(&self, _id: i32) -> Result<Option<mahasiswa::Model>, DbErr> {
        Err(unavailable())
    }

    async fn list(&self, _filter: &ListFilter) -> Result<Vec<mahasiswa::Model>, DbErr> {
        Err(unavailable())
    }

    async fn count(&self, _query: Option<&str>) -> Result<u64, DbErr> {
        Err(unavailable())
    }

    async fn create(&self, _record: NewMahasiswa) -> Result<mahasiswa::Model, DbErr> {
        Err(unavailable())
    }

    async fn update(&self, _record: mahasiswa::Model) -> Result<mahasiswa::Model, DbErr> {
        Err(unavailable())
    }

    async fn delete(&self, _id: i32) -> Result<bool, DbErr> {
        Err(unavailable())
    }
}

/// SQLite repository whose `update` always fails, so a record can be created
/// and found but never modified.
pub struct UpdateFailingRepository {
    inner: SeaOrmRepository,
}

impl UpdateFailingRepository {
    pub async fn new() -> Self {
        Self {
            inner: SeaOrmRepository::new(memory_db().await),
        }
    }
}

#[async_trait]
impl MahasiswaRepository for UpdateFailingRepository {
    async fn find(&self, id: i32) -> Result<Option<mahasiswa::Model>, DbErr> {
        self.inner.find(id).await
    }

    async fn list(&self, filter: &ListFilter) -> Result<Vec<mahasiswa::Model>, DbErr> {
        self.inner.list(filter).await
    }

    async fn count(&self, query: Option<&str>) -> Result<u64, DbErr> {
        self.inner.count(query).await
    }

    async fn create(&self, record: NewMahasiswa) -> Result<mahasiswa::Model, DbErr> {
        self.inner.create(record).await
    }

    async fn update(&self, _record: mahasiswa::Model) -> Result<mahasiswa::Model, DbErr> {
        Err(unavailable())
    }

    async fn delete(&self, id: i32) -> Result<bool, DbErr> {
        self.inner.delete(id).await
    }
}

/// Filesystem upload store that counts `remove` calls and can be told to fail
/// them.
pub struct RecordingUploads {
    inner: FilesystemUploadStore,
    removes: AtomicUsize,
    fail_removes: bool,
}

impl RecordingUploads {
    pub fn new(dir: PathBuf, fail_removes: bool) -> Self {
        Self {
            inner: FilesystemUploadStore::new(dir, DEFAULT_MAX_UPLOAD_SIZE),
            removes: AtomicUsize::new(0),
            fail_removes,
        }
    }

    pub fn remove_calls(&self) -> usize {
        self.removes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UploadStore for RecordingUploads {
    async fn store(
        &self,
        file_name: &str,
        size: u64,
        reader: BoxReader,
    ) -> Result<String, UploadError> {
        self.inner.store(file_name, size, reader).await
    }

    async fn remove(&self, stored_name: &str) -> Result<bool, UploadError> {
        self.removes.fetch_add(1, Ordering::SeqCst);
        if self.fail_removes {
            return Err(UploadError::Io(std::io::Error::other("permission denied")));
        }
        self.inner.remove(stored_name).await
    }
}

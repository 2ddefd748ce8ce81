//! Server configuration constants.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// Default listen address (localhost only).
pub const DEFAULT_BIND_ADDRESS: SocketAddr =
    SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3001);

/// Default SQLite database file.
pub const DEFAULT_DATABASE_PATH: &str = "folio.db";

/// Default directory for uploaded images.
pub const DEFAULT_UPLOADS_DIR: &str = "uploads";

/// Default cap on a single uploaded file.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Config file read when `--config` is not given, if it exists.
pub const DEFAULT_CONFIG_FILE: &str = "folio.ron";

/// Multipart field carrying the image.
pub const UPLOAD_FIELD: &str = "image";

/// Accepted upload extensions and their MIME types.
pub const ALLOWED_IMAGE_TYPES: &[(&str, &str)] = &[
    ("jpeg", "image/jpeg"),
    ("jpg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
];

/// URL prefix uploaded files are served under.
pub const UPLOADS_ROUTE: &str = "/uploads";

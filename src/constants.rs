pub mod network {
    pub const DEFAULT_BIND: &str = "0.0.0.0:8787";
    pub const TIMEOUT_SPEC_FETCH_MS: u64 = 30_000;
    pub const TIMEOUT_UPSTREAM_MS: u64 = 120_000;
    pub const TIMEOUT_CONNECTION_MS: u64 = 10_000;
    pub const USER_AGENT: &str = "Form-Generator-Worker/1.0";
    pub const SPEC_ACCEPT: &str = "application/json, application/yaml, text/yaml, */*";
}

pub mod limits {
    pub const MAX_REQUEST_BYTES: usize = 25 * 1024 * 1024;
    pub const MAX_UPLOAD_FILE_BYTES: usize = 10 * 1024 * 1024;
    pub const DEFAULT_PAGE_LIMIT: i64 = 100;
    pub const MAX_PAGE_LIMIT: i64 = 1_000;
    pub const MAX_GENERATED_FUNCTIONS: usize = 64;
    pub const LOG_SUBSTRING_LENGTH: usize = 200;
}

pub mod uploads {
    pub const ALLOWED_FILE_TYPES: &[&str] = &[
        "image/png",
        "image/jpeg",
        "image/jpg",
        "image/gif",
        "image/webp",
        "application/pdf",
    ];
}

pub mod origins {
    pub const DEFAULT_ALLOWED: &[&str] = &["https://prompttoform.ai", "https://app.prompttoform.ai"];
}

pub mod email {
    pub const DEFAULT_SUBJECT: &str = "New Form Submission";
    pub const DEFAULT_FROM: &str = "noreply@yourdomain.com";
    pub const SEND_PATH: &str = "/api/v1/send";
    pub const SIGNATURE: &str = "Sent via Form Generator Worker";
}

pub mod netlify {
    pub const API_BASE: &str = "https://api.netlify.com";
    pub const AUTHORIZE_URL: &str = "https://app.netlify.com/authorize";
    pub const POST_AUTH_REDIRECT: &str = "https://demo.codeflowcanvas.io";
    pub const TOKEN_PATH: &str = "/oauth/token";
    pub const SITES_PATH: &str = "/api/v1/sites";
    pub const DEPLOY_ACTION_PREFIX: &str = "deploy-";
    pub const OAUTH_SCOPE: &str = "public";
}

pub mod tools {
    pub const OPENAPI_DOCS_FUNCTION: &str = "get_openapi_documentation";
    pub const ENABLE_FLAG: &str = "useOpenAPITool";
    pub const OPENAPI_URLS_FIELD: &str = "openApiUrls";
    pub const YAML_NOTE: &str =
        "YAML content returned as text. Consider converting to JSON for better parsing.";
    pub const SUMMARY_NOTE: &str =
        "Full specification available in JSON format. Use format: \"json\" to get complete details.";
}

pub mod storage {
    pub const DEFAULT_DATABASE_PATH: &str = "forms.db";
    pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
}

macro_rules! v1_path {
    ($path:literal) => {
        concat!("/api/v1", $path)
    };
}

/// Versioned API route definitions shared by the server and its clients
pub mod v1 {
    pub const ROOT: &str = "/api/v1";
    pub const VERSION: &str = "v1";

    pub const HEALTH: &str = v1_path!("/health");

    pub mod auth {
        pub const REGISTER: &str = v1_path!("/auth/register");
        pub const LOGIN: &str = v1_path!("/auth/login");
        pub const LOGOUT: &str = v1_path!("/auth/logout");
        pub const VERIFY_EMAIL: &str = v1_path!("/auth/verify-email");
        pub const RESEND_VERIFICATION: &str = v1_path!("/auth/resend-verification");

        pub mod password {
            pub const RESET: &str = v1_path!("/auth/password/reset");
            pub const RESET_CONFIRM: &str = v1_path!("/auth/password/reset/confirm");
        }
    }

    pub mod users {
        pub const PROFILE: &str = v1_path!("/users/me/profile");
        pub const STATUS: &str = v1_path!("/users/me/status");
        pub const AVAILABLE: &str = v1_path!("/users/available");
        pub const SEARCH: &str = v1_path!("/users/search");
        pub const ONLINE: &str = v1_path!("/users/online");
        pub const PUBLIC_PROFILE: &str = v1_path!("/users/{username}/profile");
    }

    pub mod dashboard {
        pub const STATS: &str = v1_path!("/dashboard/stats");
    }

    pub mod images {
        pub const COLLECTION: &str = v1_path!("/images");
        pub const ITEM: &str = v1_path!("/images/{id}");
        pub const UNASSIGNED: &str = v1_path!("/images/unassigned");
        pub const FILE: &str = v1_path!("/images/{id}/file");
        pub const SHARES: &str = v1_path!("/images/{id}/shares");
        pub const SHARE_RECIPIENT: &str = v1_path!("/images/{id}/shares/{user_id}");
        pub const COMMENTS: &str = v1_path!("/images/{id}/comments");
    }

    pub mod albums {
        pub const COLLECTION: &str = v1_path!("/albums");
        pub const ITEM: &str = v1_path!("/albums/{id}");
        pub const IMAGES: &str = v1_path!("/albums/{id}/images");
        pub const IMAGE_FILE: &str = v1_path!("/albums/{id}/images/{image_id}/file");
        pub const SHARES: &str = v1_path!("/albums/{id}/shares");
        pub const SHARE_RECIPIENT: &str = v1_path!("/albums/{id}/shares/{user_id}");
    }

    pub mod shares {
        pub const RECEIVED: &str = v1_path!("/shares/received");
        pub const SENT: &str = v1_path!("/shares/sent");
        pub const ITEM: &str = v1_path!("/shares/{id}");
        pub const COMMENTS: &str = v1_path!("/shares/{id}/comments");
    }

    pub mod comments {
        pub const COLLECTION: &str = v1_path!("/comments");
        pub const ITEM: &str = v1_path!("/comments/{id}");
    }

    pub mod admin {
        pub const USERS: &str = v1_path!("/admin/users");
        pub const USER: &str = v1_path!("/admin/users/{id}");
    }
}

/// Fill `{param}` placeholders in a route template.
pub fn fill(template: &str, params: &[(&str, &str)]) -> String {
    let mut path = template.to_string();
    for (name, value) in params {
        path = path.replace(&format!("{{{name}}}"), value);
    }
    path
}

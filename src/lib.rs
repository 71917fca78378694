pub mod config;
pub mod db;
pub mod error;
pub mod router;
pub mod state;

pub mod crypto {
    pub mod password;
}

pub mod models {
    pub mod session;
    pub mod user;
}

pub mod repositories {
    pub mod memory;
    pub mod session;
    pub mod user;
}

pub mod services {
    pub mod auth;
}

pub mod handlers {
    pub mod auth;
}

pub mod validation {
    pub mod auth;
}

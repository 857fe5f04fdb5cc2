pub mod error {
    pub mod client;
}

pub mod model {
    pub mod api_response;
    pub mod login_session;
    pub mod queued_course;
    pub mod saved_account;
    pub mod selection;
}

pub mod storage {
    pub mod local_store;
    pub mod schema;
}

pub mod http {
    pub mod auth_middleware;
    pub mod reauth;
    pub mod session_middleware;
}

pub mod core {
    pub mod accounts;
    pub mod app_state;
    pub mod chrome;
    pub mod connection;
    pub mod course_queue;
    pub mod hexagon;
    pub mod notify;
    pub mod route;
    pub mod settings;
    pub mod theme;
}

pub mod cli;

pub mod utils {
    pub mod input;
}

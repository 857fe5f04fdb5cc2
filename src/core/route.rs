use crate::storage::local_store::{KeyValueStore, keys};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    SelectClass,
    Browse,
    SelectedCourses,
    Settings,
}

impl Route {
    pub const ALL: [Route; 5] = [
        Route::Login,
        Route::SelectClass,
        Route::Browse,
        Route::SelectedCourses,
        Route::Settings,
    ];

    pub fn path(self) -> &'static str {
        match self {
            Route::Login => "/",
            Route::SelectClass => "/select-class",
            Route::Browse => "/browse",
            Route::SelectedCourses => "/selected-courses",
            Route::Settings => "/settings",
        }
    }

    pub fn from_path(path: &str) -> Option<Route> {
        Route::ALL.into_iter().find(|route| route.path() == path)
    }

    pub fn requires_auth(self) -> bool {
        self != Route::Login
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Proceed(Route),
    Redirect(Route),
}

impl Navigation {
    pub fn route(self) -> Route {
        match self {
            Navigation::Proceed(route) | Navigation::Redirect(route) => route,
        }
    }
}

pub fn is_logged_in(store: &dyn KeyValueStore) -> bool {
    matches!(store.get_item(keys::LOGIN_INFO), Ok(Some(ref info)) if !info.is_empty())
}

/// 除登录页外都需要登录信息；已登录时访问登录页跳到选课页
pub fn guard(target: Route, store: &dyn KeyValueStore) -> Navigation {
    let logged_in = is_logged_in(store);
    if target.requires_auth() && !logged_in {
        Navigation::Redirect(Route::Login)
    } else if target == Route::Login && logged_in {
        Navigation::Redirect(Route::SelectClass)
    } else {
        Navigation::Proceed(target)
    }
}

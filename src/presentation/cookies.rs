// Cookie-backed token store for graph preferences
use crate::application::preferences::TokenStore;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

pub struct CookieTokens {
    jar: CookieJar,
    max_age: time::Duration,
}

impl CookieTokens {
    pub fn new(jar: CookieJar, max_age_days: i64) -> Self {
        Self {
            jar,
            max_age: time::Duration::days(max_age_days),
        }
    }

    pub fn into_jar(self) -> CookieJar {
        self.jar
    }
}

impl TokenStore for CookieTokens {
    fn get(&self, name: &str) -> Option<String> {
        self.jar.get(name).map(|cookie| cookie.value().to_string())
    }

    fn set(&mut self, name: &str, value: &str) {
        let cookie = Cookie::build((name.to_string(), value.to_string()))
            .path("/")
            .max_age(self.max_age)
            .same_site(SameSite::Lax)
            .http_only(true)
            .build();
        self.jar = self.jar.clone().add(cookie);
    }
}

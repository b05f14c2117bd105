//! One-shot notices carried across a redirect in a cookie.
//!
//! The cookie holds a short code rather than the message itself so that its
//! value never needs escaping.

use actix_web::{http::Cookie, HttpMessage, HttpRequest};

pub const FLASH_COOKIE: &str = "flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flash {
    InvalidInput,
    ItemCreated,
    ItemUpdated,
    ItemDeleted,
    LoginSuccess,
    InvalidCredentials,
    Goodbye,
    SettingsUpdated,
}

impl Flash {
    const ALL: [Flash; 8] = [
        Flash::InvalidInput,
        Flash::ItemCreated,
        Flash::ItemUpdated,
        Flash::ItemDeleted,
        Flash::LoginSuccess,
        Flash::InvalidCredentials,
        Flash::Goodbye,
        Flash::SettingsUpdated,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Flash::InvalidInput => "invalid_input",
            Flash::ItemCreated => "item_created",
            Flash::ItemUpdated => "item_updated",
            Flash::ItemDeleted => "item_deleted",
            Flash::LoginSuccess => "login_success",
            Flash::InvalidCredentials => "invalid_credentials",
            Flash::Goodbye => "goodbye",
            Flash::SettingsUpdated => "settings_updated",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Flash::InvalidInput => "Invalid input.",
            Flash::ItemCreated => "Item created.",
            Flash::ItemUpdated => "Item updated.",
            Flash::ItemDeleted => "Item deleted.",
            Flash::LoginSuccess => "Login success.",
            Flash::InvalidCredentials => "Invalid username or password.",
            Flash::Goodbye => "Goodbye.",
            Flash::SettingsUpdated => "Settings updated.",
        }
    }

    pub fn from_code(code: &str) -> Option<Flash> {
        Flash::ALL.iter().copied().find(|flash| flash.code() == code)
    }

    /// The cookie that makes this flash show up on the next rendered page.
    pub fn cookie(self) -> Cookie<'static> {
        Cookie::build(FLASH_COOKIE, self.code())
            .path("/")
            .http_only(true)
            .finish()
    }
}

/// Reads the pending flash, if any. The caller is responsible for clearing
/// the cookie on its response (see [`removal_cookie`]).
pub fn pending(req: &HttpRequest) -> Option<Flash> {
    req.cookie(FLASH_COOKIE)
        .and_then(|cookie| Flash::from_code(cookie.value()))
}

pub fn removal_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::named(FLASH_COOKIE);
    cookie.set_path("/");
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn codes_are_unique() {
        for flash in Flash::ALL.iter() {
            assert_eq!(Flash::from_code(flash.code()), Some(*flash));
        }
        assert_eq!(Flash::from_code("nonsense"), None);
    }

    #[test]
    fn pending_reads_cookie() {
        let req = TestRequest::default()
            .cookie(Flash::ItemDeleted.cookie())
            .to_http_request();
        assert_eq!(pending(&req), Some(Flash::ItemDeleted));
        assert_eq!(pending(&TestRequest::default().to_http_request()), None);
    }
}

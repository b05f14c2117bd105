use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct User {
    pub name: String,
    pub username: String,
    pub password_hash: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Movie {
    pub title: String,
    pub year: String,
}

/// A stored record together with its key, as handed to templates.
#[derive(Serialize, Debug)]
pub struct Entry<T> {
    pub id: u64,
    #[serde(flatten)]
    pub data: T,
}

#[derive(Deserialize, Validate, Debug)]
pub struct MovieForm {
    #[serde(default)]
    #[validate(length(min = 1, max = 60))]
    pub title: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 4))]
    pub year: String,
}

impl From<MovieForm> for Movie {
    fn from(form: MovieForm) -> Self {
        Movie {
            title: form.title,
            year: form.year,
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Deserialize, Validate, Debug)]
pub struct SettingsForm {
    #[serde(default)]
    #[validate(length(min = 1, max = 20))]
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movie_form(title: &str, year: &str) -> MovieForm {
        MovieForm {
            title: title.to_owned(),
            year: year.to_owned(),
        }
    }

    #[test]
    fn movie_form_bounds() {
        assert!(movie_form("Arrival", "2016").validate().is_ok());
        assert!(movie_form("", "2016").validate().is_err());
        assert!(movie_form("Arrival", "").validate().is_err());
        assert!(movie_form("Arrival", "20161").validate().is_err());
        assert!(movie_form(&"x".repeat(60), "2016").validate().is_ok());
        assert!(movie_form(&"x".repeat(61), "2016").validate().is_err());
    }

    #[test]
    fn lengths_count_characters() {
        // 60 characters, 120 bytes
        assert!(movie_form(&"é".repeat(60), "年").validate().is_ok());
        let name = SettingsForm {
            name: "龍".repeat(20),
        };
        assert!(name.validate().is_ok());
    }

    #[test]
    fn settings_form_bounds() {
        let empty = SettingsForm {
            name: String::new(),
        };
        assert!(empty.validate().is_err());
        let long = SettingsForm {
            name: "x".repeat(21),
        };
        assert!(long.validate().is_err());
    }
}

use std::cmp::Ordering;

use bookshelf_db::Sortable;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::modules::books::models::Book;
use crate::modules::error::LibraryError;

/// What sort of user this is, serialized as the `user_type` field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "user_type", rename_all = "lowercase")]
pub enum UserKind {
    #[default]
    #[serde(rename = "user")]
    Regular,
    Student {
        year: String,
    },
    Professor {
        subject: String,
    },
}

/// Validated, mutable profile fields of a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub username: String,
    pub name: String,
    pub birthdate: NaiveDate,
    pub kind: UserKind,
}

/// A user and the books they own.
///
/// The collection never holds the same book twice and only changes through
/// [`User::add_book`] and [`User::remove_book`]. The password hash is never
/// serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    id: Option<i64>,
    pub username: String,
    pub name: String,
    pub birthdate: NaiveDate,
    #[serde(skip_serializing)]
    password_hash: String,
    #[serde(flatten)]
    pub kind: UserKind,
    books: Vec<Book>,
}

impl User {
    pub fn new(profile: UserProfile, password_hash: String) -> Self {
        Self {
            id: None,
            username: profile.username,
            name: profile.name,
            birthdate: profile.birthdate,
            password_hash,
            kind: profile.kind,
            books: Vec::new(),
        }
    }

    /// Rebuild a stored user.
    pub(crate) fn restore(
        id: i64,
        profile: UserProfile,
        password_hash: String,
        books: Vec<Book>,
    ) -> Self {
        Self {
            id: Some(id),
            books,
            ..Self::new(profile, password_hash)
        }
    }

    pub fn id(&self) -> Option<i64> {
        self.id
    }

    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    pub fn set_password_hash(&mut self, password_hash: String) {
        self.password_hash = password_hash;
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile {
            username: self.username.clone(),
            name: self.name.clone(),
            birthdate: self.birthdate,
            kind: self.kind.clone(),
        }
    }

    /// Replace the profile; the id, password, and books stay as they are.
    pub fn apply_profile(&mut self, profile: UserProfile) {
        self.username = profile.username;
        self.name = profile.name;
        self.birthdate = profile.birthdate;
        self.kind = profile.kind;
    }

    pub fn books(&self) -> &[Book] {
        &self.books
    }

    pub fn add_book(&mut self, book: Book) -> Result<(), LibraryError> {
        if self.books.contains(&book) {
            return Err(LibraryError::DuplicateOwnership {
                book_id: book.id().unwrap_or_default(),
            });
        }
        self.books.push(book);
        Ok(())
    }

    /// Drop every book with `book_id`. Unknown ids are ignored.
    pub fn remove_book(&mut self, book_id: i64) {
        self.books.retain(|book| book.id() != Some(book_id));
    }
}

impl Sortable for User {
    const SORT_FIELDS: &'static [&'static str] = &["id", "username", "name", "birthdate"];

    fn compare_by(&self, other: &Self, field: &str) -> Ordering {
        match field {
            "username" => self.username.cmp(&other.username),
            "name" => self.name.cmp(&other.name),
            "birthdate" => self.birthdate.cmp(&other.birthdate),
            _ => self.id.cmp(&other.id),
        }
    }
}

/// Request body for creating or replacing a user.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserPayload {
    pub id: Option<i64>,
    pub username: Option<String>,
    pub name: Option<String>,
    pub birthdate: Option<NaiveDate>,
    pub password: Option<String>,
    pub user_type: Option<String>,
    pub year: Option<String>,
    pub subject: Option<String>,
}

impl UserPayload {
    /// Validate the profile fields, plus `password` when it is required.
    pub fn profile(&self, password_required: bool) -> Result<UserProfile, LibraryError> {
        let mut missing = Vec::new();
        if self.username.is_none() {
            missing.push("username");
        }
        if self.name.is_none() {
            missing.push("name");
        }
        if self.birthdate.is_none() {
            missing.push("birthdate");
        }
        if password_required && self.password.is_none() {
            missing.push("password");
        }

        let kind = match self.user_type.as_deref() {
            None | Some("user") => Some(UserKind::Regular),
            Some("student") => match &self.year {
                Some(year) => Some(UserKind::Student { year: year.clone() }),
                None => {
                    missing.push("year");
                    None
                }
            },
            Some("professor") => match &self.subject {
                Some(subject) => Some(UserKind::Professor {
                    subject: subject.clone(),
                }),
                None => {
                    missing.push("subject");
                    None
                }
            },
            Some(other) => {
                return Err(LibraryError::InvalidRequest {
                    message: format!(
                        "unknown user_type '{}'; expected user, student, or professor",
                        other
                    ),
                    details: vec![json!({ "field": "user_type", "error": "unknown" })],
                })
            }
        };

        match (
            &self.username,
            &self.name,
            self.birthdate,
            kind,
            missing.is_empty(),
        ) {
            (Some(username), Some(name), Some(birthdate), Some(kind), true) => Ok(UserProfile {
                username: username.clone(),
                name: name.clone(),
                birthdate,
                kind,
            }),
            _ => Err(LibraryError::missing_fields(&missing)),
        }
    }
}

/// Filters for the user listing. Both birthdate bounds are inclusive.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserFilter {
    pub date_start: Option<NaiveDate>,
    pub date_end: Option<NaiveDate>,
    pub name_like: Option<String>,
}

impl UserFilter {
    pub fn matches(&self, user: &User) -> bool {
        let after_start = self.date_start.map_or(true, |start| user.birthdate >= start);
        let before_end = self.date_end.map_or(true, |end| user.birthdate <= end);
        let name_matches = self.name_like.as_deref().map_or(true, |needle| {
            user.name.to_lowercase().contains(&needle.to_lowercase())
        });
        after_start && before_end && name_matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::books::models::BookPayload;
    use bookshelf_db::Record;

    fn book(id: i64, title: &str) -> Book {
        let mut book = BookPayload {
            author: Some("Gabriel García Márquez".into()),
            image: Some("img".into()),
            title: Some(title.into()),
            subtitle: Some("-".into()),
            publisher: Some("Sudamericana".into()),
            year: Some("1967".into()),
            pages: Some("417".into()),
            isbn: Some(format!("isbn-{id}")),
            ..Default::default()
        }
        .into_book()
        .unwrap();
        book.assign_id(id);
        book
    }

    fn profile() -> UserProfile {
        UserProfile {
            username: "srincon".into(),
            name: "Sebastian Rincón".into(),
            birthdate: NaiveDate::from_ymd_opt(1997, 6, 5).unwrap(),
            kind: UserKind::Regular,
        }
    }

    #[test]
    fn adding_the_same_book_twice_fails() {
        let mut user = User::new(profile(), "hash".into());
        let solitude = book(1, "Cien años de soledad");

        user.add_book(solitude.clone()).unwrap();
        let err = user.add_book(solitude.clone()).unwrap_err();

        assert!(matches!(err, LibraryError::DuplicateOwnership { book_id: 1 }));
        assert_eq!(user.books(), [solitude]);
    }

    #[test]
    fn removing_is_idempotent() {
        let mut user = User::new(profile(), "hash".into());
        user.add_book(book(1, "A")).unwrap();
        user.add_book(book(2, "B")).unwrap();

        user.remove_book(1);
        assert_eq!(user.books().len(), 1);
        assert_eq!(user.books()[0].id(), Some(2));

        user.remove_book(1);
        user.remove_book(42);
        assert_eq!(user.books().len(), 1);
    }

    #[test]
    fn serialization_hides_the_password_and_tags_the_kind() {
        let mut user = User::restore(1, profile(), "secret-hash".into(), vec![]);
        user.kind = UserKind::Student { year: "3".into() };

        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["id"], 1);
        assert_eq!(json["user_type"], "student");
        assert_eq!(json["year"], "3");
        assert_eq!(json["birthdate"], "1997-06-05");
        assert!(json.get("password").is_none());
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["books"], serde_json::json!([]));

        user.kind = UserKind::Regular;
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["user_type"], "user");
    }

    #[test]
    fn payload_defaults_to_a_regular_user() {
        let payload = UserPayload {
            username: Some("srincon".into()),
            name: Some("Sebastian".into()),
            birthdate: NaiveDate::from_ymd_opt(1997, 6, 5),
            ..Default::default()
        };
        assert_eq!(payload.profile(false).unwrap().kind, UserKind::Regular);
        assert!(payload.profile(true).is_err());
    }

    #[test]
    fn variant_fields_are_required() {
        let payload = UserPayload {
            username: Some("prof".into()),
            name: Some("Professor".into()),
            birthdate: NaiveDate::from_ymd_opt(1960, 1, 1),
            user_type: Some("professor".into()),
            ..Default::default()
        };
        match payload.profile(false).unwrap_err() {
            LibraryError::InvalidRequest { details, .. } => {
                assert_eq!(details[0]["field"], "subject");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let payload = UserPayload {
            subject: Some("Algebra".into()),
            ..payload
        };
        assert_eq!(
            payload.profile(false).unwrap().kind,
            UserKind::Professor {
                subject: "Algebra".into()
            }
        );
    }

    #[test]
    fn unknown_user_type_is_rejected() {
        let payload = UserPayload {
            user_type: Some("admin".into()),
            ..Default::default()
        };
        assert!(matches!(
            payload.profile(false),
            Err(LibraryError::InvalidRequest { .. })
        ));
    }

    #[test]
    fn filter_uses_inclusive_dates_and_case_insensitive_names() {
        let user = User::new(profile(), "hash".into());
        let born = NaiveDate::from_ymd_opt(1997, 6, 5);

        assert!(UserFilter {
            date_start: born,
            date_end: born,
            name_like: Some("RINC".into()),
        }
        .matches(&user));
        assert!(!UserFilter {
            date_start: NaiveDate::from_ymd_opt(1998, 1, 1),
            ..Default::default()
        }
        .matches(&user));
        assert!(!UserFilter {
            name_like: Some("gómez".into()),
            ..Default::default()
        }
        .matches(&user));
    }
}

//! Object families and their key-naming convention.
//!
//! All families share one remote container. A family is recognised purely by
//! the key suffix: `main.app.config.json`, `<plantId>.plant.config.json`,
//! `<userId>.user.config.json`, `<serviceId>.sub.json`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Logical id of the application singleton object.
pub const APP_SINGLETON_ID: &str = "main";

/// One independently keyed family of objects inside a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectFamily {
    Application,
    User,
    Plant,
    Subscriber,
}

impl ObjectFamily {
    pub const ALL: [ObjectFamily; 4] = [
        ObjectFamily::Application,
        ObjectFamily::User,
        ObjectFamily::Plant,
        ObjectFamily::Subscriber,
    ];

    /// Key suffix identifying this family in a container listing.
    pub fn suffix(&self) -> &'static str {
        match self {
            ObjectFamily::Application => ".app.config.json",
            ObjectFamily::User => ".user.config.json",
            ObjectFamily::Plant => ".plant.config.json",
            ObjectFamily::Subscriber => ".sub.json",
        }
    }

    /// Remote key for a logical id.
    pub fn key_for(&self, id: &str) -> String {
        format!("{}{}", id, self.suffix())
    }

    /// Logical id for a remote key, `None` if the key belongs to another
    /// family or has an empty id.
    pub fn id_from_key<'a>(&self, key: &'a str) -> Option<&'a str> {
        key.strip_suffix(self.suffix()).filter(|id| !id.is_empty())
    }
}

impl fmt::Display for ObjectFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ObjectFamily::Application => "application",
            ObjectFamily::User => "user",
            ObjectFamily::Plant => "plant",
            ObjectFamily::Subscriber => "subscriber",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_naming_convention() {
        assert_eq!(
            ObjectFamily::Application.key_for(APP_SINGLETON_ID),
            "main.app.config.json"
        );
        assert_eq!(ObjectFamily::Plant.key_for("p1"), "p1.plant.config.json");
        assert_eq!(ObjectFamily::User.key_for("u1"), "u1.user.config.json");
        assert_eq!(ObjectFamily::Subscriber.key_for("svc"), "svc.sub.json");
    }

    #[test]
    fn test_id_from_key_only_matches_own_family() {
        assert_eq!(ObjectFamily::Plant.id_from_key("p1.plant.config.json"), Some("p1"));
        assert_eq!(ObjectFamily::User.id_from_key("p1.plant.config.json"), None);
        assert_eq!(ObjectFamily::Plant.id_from_key(".plant.config.json"), None);
        assert_eq!(ObjectFamily::Subscriber.id_from_key("a.b.sub.json"), Some("a.b"));
    }

    #[test]
    fn test_suffixes_are_distinct() {
        for a in ObjectFamily::ALL {
            for b in ObjectFamily::ALL {
                if a != b {
                    assert!(a.id_from_key(&b.key_for("x")).is_none(), "{a} matched {b}");
                }
            }
        }
    }
}

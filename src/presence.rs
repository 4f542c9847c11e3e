use serde::{Deserialize, Serialize};
use serde_json::json;

/// A single activity entry inside a presence descriptor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Activity {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Presence descriptor sent with the identify payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Presence {
    pub since: Option<u64>,
    pub activities: Vec<Activity>,
    pub status: String,
    pub afk: bool,
}

impl Default for Presence {
    fn default() -> Self {
        Self {
            since: None,
            activities: Vec::new(),
            status: "online".to_string(),
            afk: false,
        }
    }
}

impl Presence {
    /// Normalized wire form: activities projected down to `{name, type, url}`,
    /// an empty status falls back to `"online"`.
    pub fn to_payload(&self) -> serde_json::Value {
        let status = if self.status.is_empty() {
            "online"
        } else {
            self.status.as_str()
        };
        json!({
            "since": self.since,
            "activities": self.activities.iter().map(|a| {
                json!({ "name": a.name, "type": a.kind, "url": a.url })
            }).collect::<Vec<_>>(),
            "status": status,
            "afk": self.afk,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_presence_is_online() {
        let p = Presence::default();
        assert_eq!(p.status, "online");
        assert!(!p.afk);
        assert!(p.since.is_none());
    }

    #[test]
    fn empty_status_normalizes_to_online() {
        let p = Presence {
            status: String::new(),
            ..Presence::default()
        };
        assert_eq!(p.to_payload()["status"], "online");
    }

    #[test]
    fn activities_project_to_wire_shape() {
        let p = Presence {
            activities: vec![Activity {
                name: "with fire".to_string(),
                kind: 0,
                url: None,
            }],
            ..Presence::default()
        };
        let payload = p.to_payload();
        assert_eq!(payload["activities"][0]["name"], "with fire");
        assert_eq!(payload["activities"][0]["type"], 0);
        assert!(payload["activities"][0]["url"].is_null());
    }
}

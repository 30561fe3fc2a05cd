use ::serde_json::{Map, Value};

use super::collections::ACHIEVEMENTS;

#[derive(::serde::Serialize, Clone, Debug, PartialEq, Eq)]
pub struct SeedRecord {
    pub key: &'static str,
    pub title: &'static str,
    pub points: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'static str>,
}

impl SeedRecord {
    /// Full document written when the key is absent.
    pub fn to_document(&self) -> ::anyhow::Result<Map<String, Value>> {
        match ::serde_json::to_value(self)? {
            Value::Object(document) => Ok(document),
            other => ::anyhow::bail!("seed record is not an object: {}", other),
        }
    }
}

/// Reference rows for one collection, identified by `key_field`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeedSet {
    pub collection: &'static str,
    pub key_field: &'static str,
    pub records: Vec<SeedRecord>,
}

impl SeedSet {
    pub fn keys(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|record| record.key.to_string())
            .collect()
    }
}

pub fn achievements() -> SeedSet {
    SeedSet {
        collection: ACHIEVEMENTS,
        key_field: "key",
        records: vec![
            SeedRecord {
                key: "first_post",
                title: "Premier post",
                points: 10,
                description: Some("Publier une première photo"),
            },
            SeedRecord {
                key: "first_like",
                title: "Premier like",
                points: 2,
                description: Some("Liker une photo"),
            },
            SeedRecord {
                key: "ten_posts",
                title: "10 posts",
                points: 50,
                description: Some("Publier 10 photos"),
            },
            SeedRecord {
                key: "rare_spot",
                title: "Détection rare",
                points: 100,
                description: Some("Repérer un véhicule rare"),
            },
        ],
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Returned when a string does not name any variant of a categorical field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {kind}: {value:?}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// Declares a closed categorical enum together with its string codec.
///
/// Serde goes through `as_str` / `FromStr`, so the JSON form and the query
/// parameter form are always the same uppercase name.
macro_rules! categorical {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    _ => Err(UnknownVariant {
                        kind: stringify!($name),
                        value: s.to_string(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

categorical! {
    /// Broadcast format of a title.
    AnimeType {
        Movie => "MOVIE",
        Ona => "ONA",
        Ova => "OVA",
        Special => "SPECIAL",
        Tv => "TV",
    }
}

categorical! {
    AnimeStatus {
        Planned => "PLANNED",
        Airing => "AIRING",
        Finished => "FINISHED",
    }
}

categorical! {
    /// Age rating. The plus sign is part of the wire name.
    AnimeRating {
        G => "G",
        Pg12 => "PG12",
        R15Plus => "R15+",
        R18Plus => "R18+",
    }
}

categorical! {
    AnimeSeason {
        Spring => "SPRING",
        Summer => "SUMMER",
        Fall => "FALL",
        Winter => "WINTER",
    }
}

/// A single catalog record.
///
/// Optional fields that were absent in the source file are skipped on output,
/// so a served record has the same shape as the one that was loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anime {
    pub id: u32,
    pub mal_id: u32,
    #[serde(rename = "type")]
    pub anime_type: AnimeType,
    pub status: AnimeStatus,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternative_title: Option<String>,
    #[serde(default)]
    pub synonyms: Vec<String>,
    pub source: String,
    pub rating: AnimeRating,
    pub episodes: u32,
    pub episode_duration: u32,
    pub score: f32,
    pub synopsis: String,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub studios: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season: Option<AnimeSeason>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
}

impl Anime {
    #[must_use]
    pub fn has_genre(&self, genre: &str) -> bool {
        self.genres.iter().any(|g| g == genre)
    }

    /// Thumbnail path relative to the `/thumbs` mount.
    #[must_use]
    pub fn thumbnail(&self) -> String {
        format!("/thumbs/{}.jpg", self.id)
    }
}

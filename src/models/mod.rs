pub mod anime;

pub use anime::{Anime, AnimeRating, AnimeSeason, AnimeStatus, AnimeType};
